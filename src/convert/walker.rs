//! File system walker for enumerating the files of a repository
//!
//! Directory traversal supports:
//! - .gitignore rules (optional)
//! - ignored directory names such as VCS metadata
//! - extra gitignore-style patterns from configuration
//! - a maximum file size
//!
//! Language filtering is left to the detector.

use crate::config::ConversionConfig;
use crate::error::{ConversionError, ConversionResult};
use ignore::WalkBuilder;
use ignore::overrides::{Override, OverrideBuilder};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Walks a repository to find candidate source files
#[derive(Debug, Clone)]
pub struct FileWalker {
    config: Arc<ConversionConfig>,
}

impl FileWalker {
    pub fn new(config: Arc<ConversionConfig>) -> Self {
        Self { config }
    }

    /// Return every regular file under `root` that survives the ignore
    /// rules, sorted by path
    pub fn walk(&self, root: &Path) -> ConversionResult<Vec<PathBuf>> {
        let metadata = std::fs::metadata(root).map_err(|source| ConversionError::Enumeration {
            path: root.to_path_buf(),
            source,
        })?;
        if !metadata.is_dir() {
            return Err(ConversionError::NotADirectory {
                path: root.to_path_buf(),
            });
        }
        // The walker only logs an unreadable root; surface it instead
        std::fs::read_dir(root).map_err(|source| ConversionError::Enumeration {
            path: root.to_path_buf(),
            source,
        })?;

        let overrides = self.overrides(root)?;
        let ignored_dirs = self.config.ignored_dirs.clone();
        let respect_gitignore = self.config.respect_gitignore;

        let mut builder = WalkBuilder::new(root);
        builder
            .hidden(false) // Dotfiles are source too
            .git_ignore(respect_gitignore)
            .git_global(false)
            .git_exclude(respect_gitignore)
            .ignore(respect_gitignore)
            .parents(false)
            .follow_links(false)
            .require_git(false)
            .max_filesize(Some(self.config.max_file_size))
            .overrides(overrides)
            .filter_entry(move |entry| {
                let is_dir = entry.file_type().is_some_and(|ft| ft.is_dir());
                !(is_dir
                    && entry.depth() > 0
                    && entry
                        .file_name()
                        .to_str()
                        .is_some_and(|name| ignored_dirs.iter().any(|dir| dir == name)))
            });

        let mut files: Vec<PathBuf> = builder
            .build()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::debug!(repository = %root.display(), "skipping entry: {e}");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_some_and(|ft| ft.is_file()))
            .map(|entry| entry.into_path())
            .collect();

        // Traversal order depends on the file system
        files.sort();
        Ok(files)
    }

    /// Turn `ignore_patterns` into exclusion overrides
    fn overrides(&self, root: &Path) -> ConversionResult<Override> {
        let mut builder = OverrideBuilder::new(root);
        for pattern in &self.config.ignore_patterns {
            let glob = format!("!{}", pattern.trim_start_matches('!'));
            if let Err(e) = builder.add(&glob) {
                tracing::warn!(pattern = %pattern, "ignoring invalid ignore pattern: {e}");
            }
        }

        builder.build().map_err(|e| ConversionError::Enumeration {
            path: root.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn walker(configure: impl FnOnce(&mut ConversionConfig)) -> FileWalker {
        let mut config = ConversionConfig::default();
        configure(&mut config);
        FileWalker::new(Arc::new(config))
    }

    fn names(root: &Path, files: &[PathBuf]) -> Vec<String> {
        files
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect()
    }

    #[test]
    fn test_walk_directory() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::create_dir_all(root.join("src")).unwrap();
        fs::write(root.join("src/main.rs"), "fn main() {}").unwrap();
        fs::write(root.join("lib.py"), "def lib(): pass").unwrap();
        fs::write(root.join("README.md"), "# Test").unwrap();

        let files = walker(|_| {}).walk(root).unwrap();

        // Every regular file, sorted; language filtering happens later
        assert_eq!(names(root, &files), vec!["README.md", "lib.py", "src/main.rs"]);
    }

    #[test]
    fn test_ignored_dirs_are_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::create_dir_all(root.join(".git/objects")).unwrap();
        fs::write(root.join(".git/objects/blob.py"), "x = 1").unwrap();
        fs::write(root.join("visible.py"), "y = 2").unwrap();
        fs::write(root.join(".hidden.py"), "z = 3").unwrap();

        let files = walker(|_| {}).walk(root).unwrap();
        assert_eq!(names(root, &files), vec![".hidden.py", "visible.py"]);
    }

    #[test]
    fn test_gitignore_respected() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        // Works without git init due to require_git(false)
        fs::write(root.join(".gitignore"), "ignored.rs\n").unwrap();
        fs::write(root.join("ignored.rs"), "fn ignored() {}").unwrap();
        fs::write(root.join("included.rs"), "fn included() {}").unwrap();

        let files = walker(|_| {}).walk(root).unwrap();
        assert!(files.iter().any(|p| p.ends_with("included.rs")));
        assert!(!files.iter().any(|p| p.ends_with("ignored.rs")));

        let files = walker(|c| c.respect_gitignore = false).walk(root).unwrap();
        assert!(files.iter().any(|p| p.ends_with("ignored.rs")));
    }

    #[test]
    fn test_ignore_patterns_and_size_limit() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::create_dir_all(root.join("vendor")).unwrap();
        fs::write(root.join("vendor/dep.js"), "var dep;").unwrap();
        fs::write(root.join("bundle.min.js"), "var a;").unwrap();
        fs::write(root.join("app.js"), "var app;").unwrap();
        fs::write(root.join("huge.js"), "x".repeat(4096)).unwrap();

        let files = walker(|c| {
            c.ignore_patterns = vec!["vendor/".to_string(), "*.min.js".to_string()];
            c.max_file_size = 1024;
        })
        .walk(root)
        .unwrap();

        assert_eq!(names(root, &files), vec!["app.js"]);
    }

    #[test]
    fn test_missing_root() {
        let temp_dir = TempDir::new().unwrap();
        let err = walker(|_| {})
            .walk(&temp_dir.path().join("missing"))
            .unwrap_err();
        assert_eq!(err.status_code(), "ENUMERATION_ERROR");

        let file = temp_dir.path().join("file.rs");
        fs::write(&file, "").unwrap();
        let err = walker(|_| {}).walk(&file).unwrap_err();
        assert_eq!(err.status_code(), "NOT_A_DIRECTORY");
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_root_is_an_enumeration_error() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("locked");
        fs::create_dir(&root).unwrap();
        fs::write(root.join("main.py"), "x = 1").unwrap();
        fs::set_permissions(&root, fs::Permissions::from_mode(0o000)).unwrap();

        // Privileged users read through the mode bits; nothing to check then
        let readable = fs::read_dir(&root).is_ok();
        let result = walker(|_| {}).walk(&root);
        fs::set_permissions(&root, fs::Permissions::from_mode(0o755)).unwrap();
        if readable {
            return;
        }

        assert!(matches!(
            result,
            Err(ConversionError::Enumeration { .. })
        ));
    }
}
