//! Extension → media type inference.
//!
//! A fixed table, no I/O and no failure mode: unknown extensions map to
//! [`OCTET_STREAM`].

/// Fallback for unknown extensions.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Content type of rewritten HTML responses.
pub const HTML_UTF8: &str = "text/html; charset=utf-8";

/// The extension of the final path segment, without the dot.
///
/// Dotfiles (`.nojekyll`) and trailing dots (`file.`) have no extension.
pub fn extension(path: &str) -> Option<&str> {
    let name = path.rsplit('/').next().unwrap_or(path);
    match name.rfind('.') {
        Some(idx) if idx > 0 && idx + 1 < name.len() => Some(&name[idx + 1..]),
        _ => None,
    }
}

/// Whether the final path segment carries an extension.
pub fn has_extension(path: &str) -> bool {
    extension(path).is_some()
}

/// Whether the path names an HTML document (`.html` / `.htm`).
pub fn is_html(path: &str) -> bool {
    matches!(
        extension(path).map(|e| e.to_ascii_lowercase()).as_deref(),
        Some("html" | "htm")
    )
}

/// Infer the media type of a file from its extension.
pub fn media_type_for(path: &str) -> &'static str {
    let Some(ext) = extension(path) else {
        return OCTET_STREAM;
    };
    match ext.to_ascii_lowercase().as_str() {
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "js" | "mjs" => "application/javascript",
        "json" => "application/json",
        "xml" => "application/xml",
        "webmanifest" => "application/manifest+json",
        "txt" => "text/plain",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "webp" => "image/webp",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "otf" => "font/otf",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "ogg" => "audio/ogg",
        "pdf" => "application/pdf",
        _ => OCTET_STREAM,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn common_web_types() {
        assert_eq!(media_type_for("index.html"), "text/html");
        assert_eq!(media_type_for("css/site.css"), "text/css");
        assert_eq!(media_type_for("app.js"), "application/javascript");
        assert_eq!(media_type_for("data/feed.json"), "application/json");
        assert_eq!(media_type_for("img/logo.svg"), "image/svg+xml");
        assert_eq!(media_type_for("fonts/a.woff2"), "font/woff2");
        assert_eq!(media_type_for("doc.pdf"), "application/pdf");
        assert_eq!(media_type_for("robots.txt"), "text/plain");
    }

    #[test]
    fn extension_is_case_insensitive() {
        assert_eq!(media_type_for("PHOTO.JPG"), "image/jpeg");
        assert!(is_html("INDEX.HTM"));
    }

    #[test]
    fn unknown_and_missing_extensions_are_binary() {
        assert_eq!(media_type_for("archive.tar.zst"), OCTET_STREAM);
        assert_eq!(media_type_for("LICENSE"), OCTET_STREAM);
        assert_eq!(media_type_for(".nojekyll"), OCTET_STREAM);
    }

    #[test]
    fn only_the_final_segment_counts() {
        assert_eq!(extension("my-site.bob/about"), None);
        assert_eq!(extension("my-site.bob/app.js"), Some("js"));
        assert_eq!(extension("my-site.bob"), Some("bob"));
        assert_eq!(extension("trailing."), None);
        assert!(!has_extension(""));
    }
}
