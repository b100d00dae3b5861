//! MIME type detection module
//!
//! Maps file extensions to a Content-Type. Extensions are compared without
//! regard to case, matching the resolver's tolerance for `LOGO.PNG`.

use std::path::Path;

/// Fallback for unknown or missing extensions
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Get MIME Content-Type for a file path
///
/// # Examples
/// ```
/// use std::path::Path;
/// use verify_devserver::http::mime::content_type_for;
/// assert_eq!(content_type_for(Path::new("hfestJ/index.html")), "text/html; charset=utf-8");
/// assert_eq!(content_type_for(Path::new("fonts/Atkinson.WOFF2")), "font/woff2");
/// assert_eq!(content_type_for(Path::new("README")), "application/octet-stream");
/// ```
pub fn content_type_for(path: &Path) -> &'static str {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map_or(DEFAULT_CONTENT_TYPE, |ext| {
            from_extension(&ext.to_ascii_lowercase())
        })
}

fn from_extension(extension: &str) -> &'static str {
    match extension {
        // Text
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "txt" | "md" => "text/plain; charset=utf-8",
        "csv" => "text/csv; charset=utf-8",
        "xml" => "application/xml",

        // Scripts and data
        "js" | "mjs" => "text/javascript; charset=utf-8",
        "json" | "map" => "application/json",
        "webmanifest" => "application/manifest+json",
        "wasm" => "application/wasm",

        // Images
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "webp" => "image/webp",
        "avif" => "image/avif",

        // Fonts
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "otf" => "font/otf",

        // Documents
        "pdf" => "application/pdf",
        "zip" => "application/zip",

        // Media
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mp3" => "audio/mpeg",

        _ => DEFAULT_CONTENT_TYPE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_site_assets() {
        assert_eq!(content_type_for(Path::new("index.html")), "text/html; charset=utf-8");
        assert_eq!(content_type_for(Path::new("style.css")), "text/css; charset=utf-8");
        assert_eq!(content_type_for(Path::new("script.js")), "text/javascript; charset=utf-8");
        assert_eq!(content_type_for(Path::new("data.json")), "application/json");
        assert_eq!(content_type_for(Path::new("cert.png")), "image/png");
    }

    #[test]
    fn test_extension_case_ignored() {
        assert_eq!(content_type_for(Path::new("Style.CSS")), "text/css; charset=utf-8");
        assert_eq!(content_type_for(Path::new("BADGE.JPG")), "image/jpeg");
    }

    #[test]
    fn test_unknown_extension() {
        assert_eq!(content_type_for(Path::new("archive.xyz")), DEFAULT_CONTENT_TYPE);
        assert_eq!(content_type_for(Path::new("Makefile")), DEFAULT_CONTENT_TYPE);
    }
}
