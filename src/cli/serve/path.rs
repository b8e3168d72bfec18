//! URL to mirror path resolution.

use std::path::{Path, PathBuf};

/// Resolve a request URL to a file inside the mirror, handling
/// `index.html` for directories.
pub fn resolve_path(url: &str, mirror_root: &Path) -> Option<PathBuf> {
    let clean = normalize_url(url);

    // Reject traversal attempts before touching the filesystem
    if clean.contains("..") {
        return None;
    }

    let local = mirror_root.join(&clean);

    // Canonicalize to resolve symlinks and confirm the target stays inside
    // the mirror root
    let canonical = local.canonicalize().ok()?;
    let root_canonical = mirror_root.canonicalize().ok()?;

    if !canonical.starts_with(&root_canonical) {
        return None;
    }

    if canonical.is_file() {
        return Some(canonical);
    }

    if canonical.is_dir() {
        let index = canonical.join("index.html");
        if index.is_file() {
            return Some(index);
        }
    }

    None
}

/// Normalize URL: decode, strip query string, trim slashes
fn normalize_url(url: &str) -> String {
    use percent_encoding::percent_decode_str;
    let decoded = percent_decode_str(url)
        .decode_utf8()
        .map(std::borrow::Cow::into_owned)
        .unwrap_or_default();

    let path = decoded.split('?').next().unwrap_or(&decoded);
    path.trim_matches('/').to_string()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn make_root() -> TempDir {
        let root = TempDir::new().unwrap();
        fs::write(root.path().join("index.html"), "<html>").unwrap();
        fs::create_dir_all(root.path().join("sub")).unwrap();
        fs::write(root.path().join("sub/page.html"), "<html>").unwrap();
        root
    }

    #[test]
    fn test_resolves_files_and_directory_index() {
        let root = make_root();

        let resolved = resolve_path("/sub/page.html", root.path()).unwrap();
        assert!(resolved.ends_with("sub/page.html"));

        let index = resolve_path("/", root.path()).unwrap();
        assert!(index.ends_with("index.html"));
    }

    #[test]
    fn test_query_string_stripped() {
        let root = make_root();
        assert!(resolve_path("/index.html?v=1", root.path()).is_some());
    }

    #[test]
    fn test_percent_decoding() {
        let root = make_root();
        fs::write(root.path().join("with space.txt"), "x").unwrap();
        assert!(resolve_path("/with%20space.txt", root.path()).is_some());
    }

    #[test]
    fn test_traversal_rejected() {
        let root = make_root();
        assert!(resolve_path("/../etc/passwd", root.path()).is_none());
        assert!(resolve_path("/%2e%2e/%2e%2e/etc/passwd", root.path()).is_none());
    }

    #[test]
    fn test_missing_file_is_none() {
        let root = make_root();
        assert!(resolve_path("/nope.html", root.path()).is_none());
    }
}
