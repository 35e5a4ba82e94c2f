use std::path::Path;

use anyhow::Context;
use bob_bundle::{NormalizedBundle, Normalizer};
use bob_crypto::BundleHasher;
use bob_server::{BobServer, LogFormat, ServerConfig};
use colored::Colorize;
use serde_json::json;
use tracing_subscriber::EnvFilter;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Serve(args) => cmd_serve(args, cli.verbose),
        Command::Hash(args) => {
            init_tracing(cli.verbose, LogFormat::Text);
            cmd_hash(args, cli.format)
        }
        Command::Alias(args) => {
            init_tracing(cli.verbose, LogFormat::Text);
            cmd_alias(args, cli.format)
        }
        Command::Inspect(args) => {
            init_tracing(cli.verbose, LogFormat::Text);
            cmd_inspect(args, cli.format)
        }
    }
}

/// Install the global subscriber. `RUST_LOG` wins over the default level.
fn init_tracing(verbose: bool, format: LogFormat) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn cmd_serve(args: ServeArgs, verbose: bool) -> anyhow::Result<()> {
    let mut config = ServerConfig::load(args.config.as_deref())?;
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    init_tracing(verbose, config.log_format);

    let runtime = tokio::runtime::Runtime::new().context("failed to start the async runtime")?;
    runtime.block_on(async {
        let server = BobServer::from_config(config).await?;
        server.serve().await?;
        Ok::<(), anyhow::Error>(())
    })
}

fn read_bundle(path: &Path) -> anyhow::Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("cannot read {}", path.display()))
}

fn hash_report(path: &Path) -> anyhow::Result<serde_json::Value> {
    let bytes = read_bundle(path)?;
    let hash = BundleHasher::digest(&bytes);
    Ok(json!({
        "file": path.display().to_string(),
        "hash": hash.to_hex(),
        "size": bytes.len(),
    }))
}

fn cmd_hash(args: HashArgs, format: OutputFormat) -> anyhow::Result<()> {
    let report = hash_report(&args.file)?;
    match format {
        OutputFormat::Json => println!("{report}"),
        OutputFormat::Text => println!(
            "{}  {}",
            report["hash"].as_str().unwrap_or_default().yellow(),
            args.file.display()
        ),
    }
    Ok(())
}

fn alias_report(names: &[String]) -> serde_json::Value {
    let rows: Vec<serde_json::Value> = names
        .iter()
        .map(|name| match bob_alias::names::normalize(name) {
            Ok(alias) => json!({ "input": name, "alias": alias }),
            Err(e) => json!({ "input": name, "error": e.to_string() }),
        })
        .collect();
    json!(rows)
}

fn cmd_alias(args: AliasArgs, format: OutputFormat) -> anyhow::Result<()> {
    let report = alias_report(&args.names);
    if format == OutputFormat::Json {
        println!("{report}");
        return Ok(());
    }
    for row in report.as_array().into_iter().flatten() {
        let input = row["input"].as_str().unwrap_or_default();
        match row["alias"].as_str() {
            Some(alias) => println!("{input:?} → {}", alias.green().bold()),
            None => println!(
                "{input:?} → {} {}",
                "invalid".red().bold(),
                row["error"].as_str().unwrap_or_default().dimmed()
            ),
        }
    }
    Ok(())
}

fn inspect_bundle(path: &Path, declared: Option<&str>) -> anyhow::Result<NormalizedBundle> {
    let bytes = read_bundle(path)?;
    let declared = match declared {
        Some(hash) => hash.to_string(),
        None => BundleHasher::digest(&bytes).to_hex(),
    };
    Normalizer::default()
        .normalize(&bytes, &declared)
        .with_context(|| format!("{} is not a publishable bundle", path.display()))
}

fn inspect_report(bundle: &NormalizedBundle) -> serde_json::Value {
    let entries: Vec<serde_json::Value> = bundle
        .entries
        .iter()
        .map(|e| json!({ "path": e.path, "size": e.data.len(), "mediaType": e.media_type }))
        .collect();
    json!({
        "hash": bundle.hash.to_hex(),
        "size": bundle.size,
        "fileCount": bundle.file_count(),
        "unpackedBytes": bundle.unpacked_bytes(),
        "wrapper": bundle.wrapper,
        "entrypoint": bundle.entrypoint().map(|e| e.path.clone()),
        "entries": entries,
    })
}

fn cmd_inspect(args: InspectArgs, format: OutputFormat) -> anyhow::Result<()> {
    let bundle = inspect_bundle(&args.file, args.hash.as_deref())?;
    if format == OutputFormat::Json {
        println!("{}", inspect_report(&bundle));
        return Ok(());
    }

    println!("{} {}", "✓".green().bold(), args.file.display());
    println!("  Hash: {}", bundle.hash.to_hex().yellow());
    println!("  Size: {} bytes, {} files", bundle.size, bundle.file_count());
    match &bundle.wrapper {
        Some(wrapper) => println!("  Wrapper: {}/ {}", wrapper.cyan(), "(stripped)".dimmed()),
        None => println!("  Wrapper: {}", "none".dimmed()),
    }
    if let Some(entry) = bundle.entrypoint() {
        println!("  Entrypoint: {}", entry.path.green());
    }
    for entry in &bundle.entries {
        println!(
            "    {:>10}  {:<28} {}",
            entry.data.len(),
            entry.media_type.dimmed(),
            entry.path
        );
    }
    Ok(())
}
