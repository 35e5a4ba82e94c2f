use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use bob_bundle::ArchiveLimits;
use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};

/// Where artifact files are kept.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlobBackend {
    Memory,
    #[default]
    Filesystem,
}

/// Log output format of the binary.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub blob_backend: BlobBackend,
    /// Root of the filesystem blob store.
    pub data_dir: PathBuf,
    /// Postgres URL for artifact and deployment metadata. In-memory
    /// metadata when absent.
    pub database_url: Option<String>,
    /// Upload request body limit in bytes.
    pub max_bundle_size: usize,
    pub max_entries: usize,
    pub max_unpacked_bytes: u64,
    /// Mount point of the referrer-only asset route.
    pub static_prefix: String,
    pub log_format: LogFormat,
    /// Bearer token to principal map. Without it every bearer token is
    /// taken as the principal id.
    pub tokens: Option<BTreeMap<String, String>>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8787)),
            blob_backend: BlobBackend::Filesystem,
            data_dir: PathBuf::from("./bob-data"),
            database_url: None,
            max_bundle_size: 100 * 1024 * 1024,
            max_entries: 10_000,
            max_unpacked_bytes: 512 * 1024 * 1024,
            static_prefix: "/_static".into(),
            log_format: LogFormat::Text,
            tokens: None,
        }
    }
}

impl ServerConfig {
    /// Parse a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(s: &str) -> ServerResult<Self> {
        toml::from_str(s).map_err(|e| ServerError::Config(e.to_string()))
    }

    /// Load from an optional TOML file, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> ServerResult<Self> {
        let mut config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|e| {
                    ServerError::Config(format!("cannot read {}: {e}", path.display()))
                })?;
                Self::from_toml_str(&text)?
            }
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `BOB_BIND_ADDR`, `BOB_DATA_DIR` and `DATABASE_URL`.
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) -> ServerResult<()> {
        if let Some(addr) = var("BOB_BIND_ADDR") {
            self.bind_addr = addr
                .parse()
                .map_err(|e| ServerError::Config(format!("BOB_BIND_ADDR {addr:?}: {e}")))?;
        }
        if let Some(dir) = var("BOB_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(url) = var("DATABASE_URL").filter(|u| !u.trim().is_empty()) {
            self.database_url = Some(url);
        }
        Ok(())
    }

    /// Reject settings the router cannot be built from.
    pub fn validate(&self) -> ServerResult<()> {
        let prefix = &self.static_prefix;
        let invalid = |reason: &str| {
            Err(ServerError::Config(format!("static_prefix {prefix:?}: {reason}")))
        };
        if !prefix.starts_with('/') || prefix.len() < 2 {
            return invalid("must start with '/' and name a segment");
        }
        if prefix.ends_with('/') {
            return invalid("must not end with '/'");
        }
        if prefix.contains(['*', ':', '{', '}']) {
            return invalid("must not contain route parameters");
        }
        if prefix == "/api" || prefix.starts_with("/api/") {
            return invalid("collides with the API routes");
        }
        if self.max_entries == 0 || self.max_unpacked_bytes == 0 || self.max_bundle_size == 0 {
            return Err(ServerError::Config("size limits must be non-zero".into()));
        }
        Ok(())
    }

    pub fn archive_limits(&self) -> ArchiveLimits {
        ArchiveLimits {
            max_entries: self.max_entries,
            max_unpacked_bytes: self.max_unpacked_bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = ServerConfig::default();
        assert_eq!(c.bind_addr, "127.0.0.1:8787".parse::<SocketAddr>().unwrap());
        assert_eq!(c.blob_backend, BlobBackend::Filesystem);
        assert_eq!(c.max_bundle_size, 100 * 1024 * 1024);
        assert_eq!(c.static_prefix, "/_static");
        assert!(c.database_url.is_none());
        assert!(c.tokens.is_none());
        c.validate().unwrap();
    }

    #[test]
    fn toml_overrides_selected_keys() {
        let c = ServerConfig::from_toml_str(
            r#"
            bind_addr = "0.0.0.0:9000"
            blob_backend = "memory"
            log_format = "json"
            max_entries = 50

            [tokens]
            "secret-1" = "alice"
            "#,
        )
        .unwrap();
        assert_eq!(c.bind_addr.port(), 9000);
        assert_eq!(c.blob_backend, BlobBackend::Memory);
        assert_eq!(c.log_format, LogFormat::Json);
        assert_eq!(c.archive_limits().max_entries, 50);
        assert_eq!(c.archive_limits().max_unpacked_bytes, 512 * 1024 * 1024);
        assert_eq!(c.tokens.unwrap()["secret-1"], "alice");
    }

    #[test]
    fn unknown_backend_is_a_config_error() {
        let err = ServerConfig::from_toml_str(r#"blob_backend = "s3""#).unwrap_err();
        assert!(matches!(err, ServerError::Config(_)));
    }

    #[test]
    fn environment_wins_over_file() {
        let mut c = ServerConfig::default();
        c.apply_env(|key| match key {
            "BOB_BIND_ADDR" => Some("127.0.0.1:1234".into()),
            "BOB_DATA_DIR" => Some("/var/lib/bob".into()),
            "DATABASE_URL" => Some("postgres://localhost/bob".into()),
            _ => None,
        })
        .unwrap();
        assert_eq!(c.bind_addr.port(), 1234);
        assert_eq!(c.data_dir, PathBuf::from("/var/lib/bob"));
        assert_eq!(c.database_url.as_deref(), Some("postgres://localhost/bob"));
    }

    #[test]
    fn bad_bind_addr_in_environment_is_rejected() {
        let mut c = ServerConfig::default();
        let err = c
            .apply_env(|key| (key == "BOB_BIND_ADDR").then(|| "nope".to_string()))
            .unwrap_err();
        assert!(matches!(err, ServerError::Config(_)));
    }

    #[test]
    fn static_prefix_is_validated() {
        for prefix in ["", "/", "static", "/_static/", "/api", "/api/assets", "/*x"] {
            let c = ServerConfig {
                static_prefix: prefix.into(),
                ..ServerConfig::default()
            };
            assert!(c.validate().is_err(), "{prefix:?}");
        }
        let c = ServerConfig {
            static_prefix: "/assets/bob".into(),
            ..ServerConfig::default()
        };
        c.validate().unwrap();
    }
}
