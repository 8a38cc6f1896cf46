// ABOUTME: Utility functions for the hyperslide application
// ABOUTME: Path validation, safe static-file resolution, content types and directory copying

use crate::errors::{Result, SlideError};
use log::{debug, warn};
use std::fs;
use std::path::{Component, Path, PathBuf};
use url::Url;

/// Validate that a file exists
pub fn validate_file_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(SlideError::PathNotFoundError(path.to_path_buf()));
    }
    if !path.is_file() {
        return Err(SlideError::ValidationError(format!(
            "Path is not a file: {:?}",
            path
        )));
    }
    Ok(())
}

/// Ensure a directory exists, creating it if necessary
pub fn ensure_directory_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    } else if !path.is_dir() {
        return Err(SlideError::ValidationError(format!(
            "Path exists but is not a directory: {:?}",
            path
        )));
    }
    Ok(())
}

/// Validate write permissions for a directory
pub fn validate_directory_writable(path: &Path) -> Result<()> {
    ensure_directory_exists(path)?;

    let test_file = path.join(format!(".write_test_{}.tmp", uuid::Uuid::new_v4()));
    match fs::File::create(&test_file) {
        Ok(_) => {
            if let Err(e) = fs::remove_file(&test_file) {
                warn!("Failed to clean up test file {:?}: {}", test_file, e);
            }
            Ok(())
        }
        Err(e) => Err(SlideError::ValidationError(format!(
            "Directory is not writable: {:?} - {}",
            path, e
        ))),
    }
}

/// Get the canonical absolute path of an existing path
pub fn get_absolute_path(path: &Path) -> Result<PathBuf> {
    fs::canonicalize(path).map_err(|e| {
        SlideError::ValidationError(format!("Failed to get absolute path for {:?}: {}", path, e))
    })
}

/// Absolute form of a path that may not exist yet
pub fn absolute_path(path: &Path) -> PathBuf {
    if let Ok(canonical) = fs::canonicalize(path) {
        return canonical;
    }
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

/// Whether a file name is hidden (dot-prefixed)
pub fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().starts_with('.'))
        .unwrap_or(false)
}

/// Map a request path onto a file under `root`.
///
/// Percent-escapes and dot segments are resolved before the containment
/// check; anything escaping `root` yields `None`.
pub fn resolve_static_path(root: &Path, request_path: &str) -> Option<PathBuf> {
    let path = request_path.split(['?', '#']).next().unwrap_or_default();
    let base = Url::from_directory_path(root).ok()?;
    let url = base.join(path.trim_start_matches('/')).ok()?;
    let file = url.to_file_path().ok()?;

    // An encoded slash can smuggle `..` past URL normalization.
    let escapes = file.components().any(|c| matches!(c, Component::ParentDir));
    if escapes || !file.starts_with(root) {
        debug!("Rejected path outside root: {}", request_path);
        return None;
    }
    Some(file)
}

/// Content type for a served file, by extension
pub fn content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" | "mjs" => "application/javascript; charset=utf-8",
        "json" => "application/json",
        "md" | "txt" => "text/plain; charset=utf-8",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "ico" => "image/x-icon",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mp3" => "audio/mpeg",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}

/// Recursively copy `from` into `to`, skipping hidden entries and any path
/// in `exclude`. Returns the number of files copied.
pub fn copy_dir(from: &Path, to: &Path, exclude: &[PathBuf]) -> Result<usize> {
    ensure_directory_exists(to)?;
    let mut copied = 0;

    for entry in fs::read_dir(from)? {
        let path = entry?.path();
        if is_hidden(&path) || exclude.iter().any(|skip| path == *skip) {
            debug!("Skipping {:?}", path);
            continue;
        }
        let Some(name) = path.file_name() else {
            continue;
        };
        let target = to.join(name);

        if path.is_dir() {
            copied += copy_dir(&path, &target, exclude)?;
        } else {
            fs::copy(&path, &target)?;
            copied += 1;
        }
    }
    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_static_path() {
        let dir = TempDir::new().unwrap();
        let root = get_absolute_path(dir.path()).unwrap();

        assert_eq!(
            resolve_static_path(&root, "/styles/theme.css?v=2"),
            Some(root.join("styles").join("theme.css"))
        );
        assert_eq!(
            resolve_static_path(&root, "/my%20image.png"),
            Some(root.join("my image.png"))
        );
        // Dot segments resolve, but never above the root.
        assert_eq!(
            resolve_static_path(&root, "/a/../b.txt"),
            Some(root.join("b.txt"))
        );
        assert_eq!(resolve_static_path(&root, "/../secret.txt"), None);
        assert_eq!(resolve_static_path(&root, "/a/%2e%2e/%2e%2e/b.txt"), None);
        assert_eq!(resolve_static_path(&root, "/..%2F..%2Fetc%2Fpasswd"), None);
    }

    #[test]
    fn test_content_type() {
        assert_eq!(content_type(Path::new("a.CSS")), "text/css; charset=utf-8");
        assert_eq!(content_type(Path::new("a.png")), "image/png");
        assert_eq!(content_type(Path::new("noext")), "application/octet-stream");
    }

    #[test]
    fn test_copy_dir_skips_hidden_and_excluded() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        fs::create_dir(src.path().join("img")).unwrap();
        fs::write(src.path().join("img").join("a.png"), "png").unwrap();
        fs::write(src.path().join("slides.md"), "# hi").unwrap();
        fs::write(src.path().join(".env"), "secret").unwrap();
        fs::create_dir(src.path().join("dist")).unwrap();
        fs::write(src.path().join("dist").join("old.html"), "").unwrap();

        let exclude = vec![src.path().join("slides.md"), src.path().join("dist")];
        let copied = copy_dir(src.path(), dst.path(), &exclude).unwrap();

        assert_eq!(copied, 1);
        assert!(dst.path().join("img").join("a.png").exists());
        assert!(!dst.path().join(".env").exists());
        assert!(!dst.path().join("slides.md").exists());
        assert!(!dst.path().join("dist").exists());
    }

    #[test]
    fn test_validate_file_exists() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            validate_file_exists(&dir.path().join("nope.md")),
            Err(SlideError::PathNotFoundError(_))
        ));
        assert!(matches!(
            validate_file_exists(dir.path()),
            Err(SlideError::ValidationError(_))
        ));
    }
}
