use bob_alias::{AliasRegistry, Deployment};
use bob_bundle::{html, media, ENTRYPOINT};
use bob_store::ArtifactStore;
use bytes::Bytes;

use crate::error::ResolveResult;

/// `Cache-Control` value for every successful response. Artifacts are
/// immutable, so anything served once can be cached forever.
pub const CACHE_CONTROL: &str = "public, max-age=31536000, immutable";

/// Which route a request arrived on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Entry {
    /// `/{alias}/{path…}`: the alias comes from the path, or from the
    /// referrer for sub-resources requested without one.
    Primary,
    /// The static asset route: the alias only ever comes from the referrer
    /// and only paths with an extension are served.
    ReferrerOnly,
}

/// A file ready to be written to the response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServedFile {
    /// Stored alias of the deployment that served the file.
    pub alias: String,
    /// Path of the file inside the artifact.
    pub path: String,
    pub content_type: &'static str,
    pub body: Bytes,
    /// Whether the body is an HTML document with a rewritten base.
    pub html_rewritten: bool,
}

/// Why a request did not resolve.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Miss {
    /// The path has no alias segment.
    NoAlias,
    /// No deployment matches the alias candidate.
    UnknownAlias(String),
    /// The deployment exists but is not servable.
    NotServable(String),
    /// The alias had to come from the referrer and there is none.
    NoReferer,
    /// The referrer is not an absolute URL with a path segment.
    InvalidReferer(String),
    /// The static route only serves paths with an extension.
    NoExtension,
    /// The file path contains `.` or `..` segments.
    UnsafePath(String),
    /// The artifact has no such file.
    MissingFile(String),
}

impl Miss {
    pub fn reason(&self) -> &'static str {
        match self {
            Self::NoAlias => "no alias segment",
            Self::UnknownAlias(_) => "unknown alias",
            Self::NotServable(_) => "deployment not servable",
            Self::NoReferer => "no referer",
            Self::InvalidReferer(_) => "unusable referer",
            Self::NoExtension => "no extension",
            Self::UnsafePath(_) => "unsafe path",
            Self::MissingFile(_) => "file not in artifact",
        }
    }
}

/// Result of resolving one request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Found(ServedFile),
    NotFound(Miss),
}

/// A deployment together with the path segment that named it.
struct Target {
    deployment: Deployment,
    requested: String,
}

/// Turns a request path and optional `Referer` into a stored file.
#[derive(Clone, Debug)]
pub struct Resolver {
    registry: AliasRegistry,
}

impl Resolver {
    pub fn new(registry: AliasRegistry) -> Self {
        Self { registry }
    }

    fn artifacts(&self) -> &ArtifactStore {
        self.registry.artifacts()
    }

    /// Resolve `path` (with or without its leading `/`) arriving on `entry`.
    pub async fn resolve(
        &self,
        entry: Entry,
        path: &str,
        referer: Option<&str>,
    ) -> ResolveResult<Outcome> {
        let request_path = format!("/{}", path.trim_start_matches('/'));
        let last = request_path.rsplit('/').next().unwrap_or_default();
        let is_page = !media::has_extension(last);

        let target = match (entry, is_page) {
            (Entry::ReferrerOnly, true) => return Ok(Outcome::NotFound(Miss::NoExtension)),
            (Entry::ReferrerOnly, false) => self.from_referer(referer).await?,
            (Entry::Primary, true) => match first_segment(&request_path) {
                Some(segment) => self.from_segment(segment).await?,
                None => Err(Miss::NoAlias),
            },
            (Entry::Primary, false) => {
                let explicit = match first_segment(&request_path) {
                    Some(segment) => self.from_segment(segment).await?.ok(),
                    None => None,
                };
                match explicit {
                    Some(target) => Ok(target),
                    None => self.from_referer(referer).await?,
                }
            }
        };
        let target = match target {
            Ok(target) => target,
            Err(miss) => return Ok(Outcome::NotFound(miss)),
        };

        let deployment = &target.deployment;
        if !deployment.is_servable() {
            return Ok(Outcome::NotFound(Miss::NotServable(deployment.alias.clone())));
        }

        let remaining = strip_alias_prefix(&request_path, deployment, &target.requested);
        let file = match file_path(remaining) {
            Some(file) => file,
            None => return Ok(Outcome::NotFound(Miss::UnsafePath(remaining.to_string()))),
        };
        tracing::debug!(
            alias = %deployment.alias,
            request = %request_path,
            file = %file,
            "resolved request"
        );

        let Some(body) = self.fetch(deployment, &file).await? else {
            return Ok(Outcome::NotFound(Miss::MissingFile(file)));
        };
        Ok(Outcome::Found(assemble(deployment, file, body)))
    }

    async fn from_segment(&self, segment: &str) -> ResolveResult<Result<Target, Miss>> {
        Ok(match self.registry.resolve(segment).await? {
            Some(deployment) => Ok(Target {
                deployment,
                requested: segment.to_string(),
            }),
            None => Err(Miss::UnknownAlias(segment.to_string())),
        })
    }

    async fn from_referer(&self, referer: Option<&str>) -> ResolveResult<Result<Target, Miss>> {
        let Some(referer) = referer else {
            return Ok(Err(Miss::NoReferer));
        };
        let segment = url::Url::parse(referer)
            .ok()
            .and_then(|u| first_segment(u.path()).map(str::to_string));
        match segment {
            Some(segment) => {
                tracing::debug!(referer, alias = %segment, "alias taken from referer");
                self.from_segment(&segment).await
            }
            None => Ok(Err(Miss::InvalidReferer(referer.to_string()))),
        }
    }

    /// Read a file, retrying the entrypoint once on a miss or backend error.
    async fn fetch(&self, deployment: &Deployment, file: &str) -> ResolveResult<Option<Bytes>> {
        let hash = &deployment.artifact_id;
        let first = self.artifacts().read_file(hash, file).await;
        if file != ENTRYPOINT {
            return Ok(first?);
        }
        match first {
            Ok(Some(body)) => Ok(Some(body)),
            Ok(None) => {
                tracing::warn!(alias = %deployment.alias, "entrypoint missing, retrying");
                Ok(self.artifacts().read_file(hash, ENTRYPOINT).await?)
            }
            Err(e) => {
                tracing::warn!(alias = %deployment.alias, error = %e, "entrypoint read failed, retrying");
                Ok(self.artifacts().read_file(hash, ENTRYPOINT).await?)
            }
        }
    }
}

fn first_segment(path: &str) -> Option<&str> {
    path.split('/').find(|s| !s.is_empty())
}

/// Strip the first of `/{stored}`, `/{stored-without-suffix}`,
/// `/{requested}` that covers a whole leading segment of `path`.
fn strip_alias_prefix<'a>(path: &'a str, deployment: &Deployment, requested: &str) -> &'a str {
    let prefixes = [
        format!("/{}", deployment.alias),
        format!("/{}", deployment.short_alias()),
        format!("/{requested}"),
    ];
    for prefix in &prefixes {
        if let Some(rest) = path.strip_prefix(prefix.as_str()) {
            if rest.is_empty() || rest.starts_with('/') {
                return rest;
            }
        }
    }
    path
}

/// Map what is left of the request path onto a file inside the artifact.
/// Returns `None` for `.`/`..` segments.
fn file_path(remaining: &str) -> Option<String> {
    let trimmed = remaining.trim_start_matches('/');
    if trimmed.is_empty() {
        return Some(ENTRYPOINT.to_string());
    }
    if trimmed.split('/').any(|s| s == "." || s == "..") {
        return None;
    }
    Some(trimmed.to_string())
}

fn assemble(deployment: &Deployment, path: String, body: Bytes) -> ServedFile {
    if media::is_html(&path) {
        let text = String::from_utf8_lossy(&body);
        let rewrite = html::rewrite_base(&text, &deployment.base_href());
        tracing::debug!(alias = %deployment.alias, placement = ?rewrite.placement, "rewrote base");
        return ServedFile {
            alias: deployment.alias.clone(),
            path,
            content_type: media::HTML_UTF8,
            body: Bytes::from(rewrite.html),
            html_rewritten: true,
        };
    }
    ServedFile {
        alias: deployment.alias.clone(),
        content_type: media::media_type_for(&path),
        path,
        body,
        html_rewritten: false,
    }
}
