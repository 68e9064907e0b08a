//! Disk cache directory selection.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use tracing::debug;

/// Subdirectory created under a shared storage root.
pub const SHARED_CACHE_DIR_NAME: &str = "ILImages_cache";

/// Picks the disk cache directory.
///
/// An explicit override wins. Otherwise a shared storage root is used when it
/// is present (mounted), falling back to the application's private cache
/// directory and finally to the system temp directory.
#[must_use]
pub fn resolve_cache_dir(explicit: Option<&Path>, shared_root: Option<&Path>) -> PathBuf {
    if let Some(dir) = explicit {
        return dir.to_path_buf();
    }

    if let Some(root) = shared_root.filter(|root| root.is_dir()) {
        let dir = root.join(SHARED_CACHE_DIR_NAME);
        debug!(path = %dir.display(), "Using shared storage for disk cache");
        return dir;
    }

    private_cache_dir()
}

fn private_cache_dir() -> PathBuf {
    ProjectDirs::from("com", "linuxmobile", "photogrid").map_or_else(
        || {
            std::env::temp_dir()
                .join("photogrid")
                .join("cache")
                .join("images")
        },
        |dirs| dirs.cache_dir().join("images"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_explicit_dir_wins() {
        let temp = TempDir::new().unwrap();
        let explicit = temp.path().join("mine");
        let resolved = resolve_cache_dir(Some(&explicit), Some(temp.path()));
        assert_eq!(resolved, explicit);
    }

    #[test]
    fn test_mounted_shared_root_is_preferred() {
        let temp = TempDir::new().unwrap();
        let resolved = resolve_cache_dir(None, Some(temp.path()));
        assert_eq!(resolved, temp.path().join(SHARED_CACHE_DIR_NAME));
    }

    #[test]
    fn test_unmounted_shared_root_falls_back() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("sdcard");
        let resolved = resolve_cache_dir(None, Some(&missing));
        assert!(!resolved.starts_with(&missing));
        assert!(resolved.ends_with("images"));
    }
}
