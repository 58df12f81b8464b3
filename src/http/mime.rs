//! MIME type detection module
//!
//! Looks up Content-Type from a file name and knows which types carry a
//! default charset.

use std::path::{Path, PathBuf};

/// Suffixes of pre-compressed files, checked case-insensitively
const ENCODING_SUFFIXES: &[&str] = &["gz", "gzip", "zlib", "bz2", "xz"];

/// MIME type for a file name, `application/octet-stream` when unknown
///
/// # Examples
/// ```
/// use static_file_middleware::http::mime::lookup;
/// assert_eq!(lookup("photo.jpg"), "image/jpeg");
/// assert_eq!(lookup("notes.txt"), "text/plain");
/// ```
pub fn lookup(path: impl AsRef<Path>) -> String {
    mime_guess::from_path(path).first_or_octet_stream().to_string()
}

/// Default charset for a MIME type
pub fn charset(mime_type: &str) -> Option<&'static str> {
    let essence = mime_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    if essence.starts_with("text/")
        || essence == "application/javascript"
        || essence == "application/json"
    {
        Some("UTF-8")
    } else {
        None
    }
}

/// Full `Content-Type` header value for a file name, charset included
pub fn content_type(path: impl AsRef<Path>) -> String {
    let mime_type = lookup(path);
    match charset(&mime_type) {
        Some(charset) => format!("{mime_type}; charset={charset}"),
        None => mime_type,
    }
}

/// Drop a trailing compression suffix: `foo.css.gz` -> `foo.css`
pub fn strip_encoding_suffix(path: &Path) -> PathBuf {
    let Some(extension) = path.extension().and_then(|e| e.to_str()) else {
        return path.to_path_buf();
    };

    if ENCODING_SUFFIXES
        .iter()
        .any(|suffix| suffix.eq_ignore_ascii_case(extension))
    {
        path.with_extension("")
    } else {
        path.to_path_buf()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_types() {
        assert_eq!(lookup("index.html"), "text/html");
        assert_eq!(lookup("style.css"), "text/css");
        assert_eq!(lookup("data.json"), "application/json");
        assert_eq!(lookup("foo.png"), "image/png");
        assert_eq!(lookup("clip.mp4"), "video/mp4");
    }

    #[test]
    fn test_unknown_extension() {
        assert_eq!(lookup("file.xyzzy"), "application/octet-stream");
        assert_eq!(lookup("README"), "application/octet-stream");
    }

    #[test]
    fn test_charset() {
        assert_eq!(charset("text/plain"), Some("UTF-8"));
        assert_eq!(charset("text/html; charset=iso-8859-1"), Some("UTF-8"));
        assert_eq!(charset("application/json"), Some("UTF-8"));
        assert_eq!(charset("image/jpeg"), None);
        assert_eq!(charset("application/octet-stream"), None);
    }

    #[test]
    fn test_content_type() {
        assert_eq!(content_type("foo.txt"), "text/plain; charset=UTF-8");
        assert_eq!(content_type("foo.jpg"), "image/jpeg");
    }

    #[test]
    fn test_strip_encoding_suffix() {
        assert_eq!(
            strip_encoding_suffix(Path::new("/srv/foo.txt.gz")),
            PathBuf::from("/srv/foo.txt")
        );
        assert_eq!(
            strip_encoding_suffix(Path::new("foo.css.GZIP")),
            PathBuf::from("foo.css")
        );
        assert_eq!(
            strip_encoding_suffix(Path::new("foo.tar.xz")),
            PathBuf::from("foo.tar")
        );
        assert_eq!(
            strip_encoding_suffix(Path::new("foo.bz2")),
            PathBuf::from("foo")
        );
        assert_eq!(
            strip_encoding_suffix(Path::new("foo.jpg")),
            PathBuf::from("foo.jpg")
        );
    }
}
