//! Filesystem access for template files.
//!
//! The engine never touches the disk directly. It talks to a [`FileSystem`],
//! which lists template files and reads their content. Paths on both sides of
//! the trait are slash-separated and relative to the filesystem's base, e.g.
//! `"views/pages/home.tpl"`.
//!
//! Two implementations are provided:
//!
//! - [`DirFs`]: a directory on disk.
//! - [`MemoryFs`]: an in-memory map, for embedded templates and tests.
//!
//! A missing file must be reported as [`io::ErrorKind::NotFound`]; the engine
//! turns that into a "template not found" error and treats every other kind as
//! a real I/O failure.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use regex::Regex;

use crate::path::normalize_path;

/// Source of template files.
pub trait FileSystem: Send + Sync {
    /// Lists files under `root` (recursively) whose path matches `pattern`.
    ///
    /// `root` is relative to the filesystem base; `""` and `"."` mean the base
    /// itself. Returned paths are relative to the base and sorted.
    fn lookup(&self, root: &str, pattern: &Regex) -> io::Result<Vec<String>>;

    /// Reads the content of the file at `path`.
    fn read_file(&self, path: &str) -> io::Result<Vec<u8>>;
}

impl<T: FileSystem + ?Sized> FileSystem for &T {
    fn lookup(&self, root: &str, pattern: &Regex) -> io::Result<Vec<String>> {
        (**self).lookup(root, pattern)
    }

    fn read_file(&self, path: &str) -> io::Result<Vec<u8>> {
        (**self).read_file(path)
    }
}

impl<T: FileSystem + ?Sized> FileSystem for Box<T> {
    fn lookup(&self, root: &str, pattern: &Regex) -> io::Result<Vec<String>> {
        (**self).lookup(root, pattern)
    }

    fn read_file(&self, path: &str) -> io::Result<Vec<u8>> {
        (**self).read_file(path)
    }
}

impl<T: FileSystem + ?Sized> FileSystem for Arc<T> {
    fn lookup(&self, root: &str, pattern: &Regex) -> io::Result<Vec<String>> {
        (**self).lookup(root, pattern)
    }

    fn read_file(&self, path: &str) -> io::Result<Vec<u8>> {
        (**self).read_file(path)
    }
}

fn is_base(root: &str) -> bool {
    matches!(normalize_path(&[root]).as_str(), ".")
}

/// Template files in a directory on disk.
///
/// # Example
///
/// ```rust,ignore
/// use trellis::DirFs;
///
/// // Paths are relative to ./assets, e.g. "views/pages/home.tpl"
/// let fs = DirFs::new("./assets");
/// ```
#[derive(Debug, Clone)]
pub struct DirFs {
    base: PathBuf,
}

impl DirFs {
    /// Creates a filesystem rooted at `base`.
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// Returns the base directory.
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Maps a slash-separated path onto the base directory.
    ///
    /// Paths that leave the base, through `..` or a leading `/`, are reported
    /// as not found.
    fn resolve(&self, path: &str) -> io::Result<PathBuf> {
        let relative = normalize_path(&[path]);
        if relative == "." {
            return Ok(self.base.clone());
        }
        if relative.starts_with('/') || relative == ".." || relative.starts_with("../") {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} is outside {}", path, self.base.display()),
            ));
        }
        Ok(relative
            .split('/')
            .fold(self.base.clone(), |acc, segment| acc.join(segment)))
    }
}

impl FileSystem for DirFs {
    fn lookup(&self, root: &str, pattern: &Regex) -> io::Result<Vec<String>> {
        let dir = self.resolve(root)?;
        let mut files = Vec::new();
        walk_dir_recursive(&dir, &self.base, pattern, &mut files)?;
        files.sort();
        Ok(files)
    }

    fn read_file(&self, path: &str) -> io::Result<Vec<u8>> {
        std::fs::read(self.resolve(path)?)
    }
}

/// Recursive helper for directory walking.
fn walk_dir_recursive(
    current: &Path,
    base: &Path,
    pattern: &Regex,
    files: &mut Vec<String>,
) -> io::Result<()> {
    for entry in std::fs::read_dir(current)? {
        let path = entry?.path();

        if path.is_dir() {
            walk_dir_recursive(&path, base, pattern, files)?;
        } else if path.is_file() {
            let Ok(relative) = path.strip_prefix(base) else {
                continue;
            };
            let relative = relative
                .to_string_lossy()
                .replace(std::path::MAIN_SEPARATOR, "/");
            if pattern.is_match(&relative) {
                files.push(relative);
            }
        }
    }

    Ok(())
}

/// Template files held in memory.
///
/// Paths are normalized on insertion, so `"./views//home.tpl"` and
/// `"views/home.tpl"` address the same file. The map sits behind a lock, so
/// files can be added or removed while an engine holds the filesystem through
/// an [`Arc`].
///
/// # Example
///
/// ```rust
/// use trellis::MemoryFs;
/// use trellis::file_loader::FileSystem;
///
/// let fs = MemoryFs::from_entries(&[
///     ("views/layout.tpl", "<html>{{ view() }}</html>"),
///     ("views/pages/home.tpl", "{{ title }}"),
/// ]);
/// assert_eq!(fs.read_file("views/pages/home.tpl").unwrap(), b"{{ title }}");
/// ```
#[derive(Debug, Default)]
pub struct MemoryFs {
    files: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryFs {
    /// Creates an empty filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a filesystem from `(path, content)` pairs.
    pub fn from_entries(entries: &[(&str, &str)]) -> Self {
        let fs = Self::new();
        for (path, content) in entries {
            fs.insert(path, content.as_bytes());
        }
        fs
    }

    /// Adds a file, builder style.
    pub fn with_file(self, path: &str, content: impl Into<Vec<u8>>) -> Self {
        self.insert(path, content);
        self
    }

    /// Adds or replaces a file.
    pub fn insert(&self, path: &str, content: impl Into<Vec<u8>>) {
        self.files
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(normalize_path(&[path]), content.into());
    }

    /// Removes a file, returning its content.
    pub fn remove(&self, path: &str) -> Option<Vec<u8>> {
        self.files
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&normalize_path(&[path]))
    }

    /// Returns the number of files.
    pub fn len(&self) -> usize {
        self.files
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns true if there are no files.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FileSystem for MemoryFs {
    fn lookup(&self, root: &str, pattern: &Regex) -> io::Result<Vec<String>> {
        let prefix = if is_base(root) {
            String::new()
        } else {
            format!("{}/", normalize_path(&[root]))
        };
        let files = self.files.read().unwrap_or_else(PoisonError::into_inner);
        Ok(files
            .keys()
            .filter(|path| path.starts_with(&prefix) && pattern.is_match(path))
            .cloned()
            .collect())
    }

    fn read_file(&self, path: &str) -> io::Result<Vec<u8>> {
        let files = self.files.read().unwrap_or_else(PoisonError::into_inner);
        files.get(&normalize_path(&[path])).cloned().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("{} does not exist", path))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn create_file(dir: &Path, relative_path: &str, content: &str) {
        let full_path = dir.join(relative_path);
        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        let mut file = std::fs::File::create(full_path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
    }

    fn tpl_pattern() -> Regex {
        Regex::new(r".*\.tpl$").unwrap()
    }

    #[test]
    fn test_dir_fs_lookup_recursive() {
        let temp_dir = TempDir::new().unwrap();
        create_file(temp_dir.path(), "views/layout.tpl", "layout");
        create_file(temp_dir.path(), "views/pages/home.tpl", "home");
        create_file(temp_dir.path(), "views/pages/notes.txt", "ignored");
        create_file(temp_dir.path(), "other/x.tpl", "outside root");

        let fs = DirFs::new(temp_dir.path());
        let files = fs.lookup("views", &tpl_pattern()).unwrap();
        assert_eq!(files, vec!["views/layout.tpl", "views/pages/home.tpl"]);

        let all = fs.lookup(".", &tpl_pattern()).unwrap();
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn test_dir_fs_lookup_missing_root() {
        let temp_dir = TempDir::new().unwrap();
        let fs = DirFs::new(temp_dir.path());
        assert!(fs.lookup("nope", &tpl_pattern()).is_err());
    }

    #[test]
    fn test_dir_fs_read_file() {
        let temp_dir = TempDir::new().unwrap();
        create_file(temp_dir.path(), "views/pages/home.tpl", "home");

        let fs = DirFs::new(temp_dir.path());
        assert_eq!(fs.read_file("views/pages/home.tpl").unwrap(), b"home");

        let err = fs.read_file("views/pages/missing.tpl").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_dir_fs_stays_inside_base() {
        let temp_dir = TempDir::new().unwrap();
        create_file(temp_dir.path(), "secret.tpl", "secret");
        create_file(temp_dir.path(), "base/views/home.tpl", "home");

        let fs = DirFs::new(temp_dir.path().join("base"));
        assert_eq!(fs.read_file("views/../views/home.tpl").unwrap(), b"home");
        for path in ["../secret.tpl", "views/../../secret.tpl", "/etc/hostname"] {
            let err = fs.read_file(path).unwrap_err();
            assert_eq!(err.kind(), io::ErrorKind::NotFound, "{}", path);
        }
        assert!(fs.lookup("..", &tpl_pattern()).is_err());
    }

    #[test]
    fn test_memory_fs_lookup_under_root() {
        let fs = MemoryFs::from_entries(&[
            ("views/layout.tpl", "a"),
            ("views/partials/nav.tpl", "b"),
            ("views-old/layout.tpl", "c"),
            ("views/readme.md", "d"),
        ]);

        let files = fs.lookup("views", &tpl_pattern()).unwrap();
        assert_eq!(files, vec!["views/layout.tpl", "views/partials/nav.tpl"]);
        assert_eq!(fs.lookup("", &tpl_pattern()).unwrap().len(), 3);
    }

    #[test]
    fn test_memory_fs_normalizes_paths() {
        let fs = MemoryFs::new().with_file("./views//home.tpl", "home");
        assert_eq!(fs.read_file("views/home.tpl").unwrap(), b"home");
        assert_eq!(fs.remove("views/./home.tpl"), Some(b"home".to_vec()));
        assert!(fs.is_empty());
    }

    #[test]
    fn test_memory_fs_not_found() {
        let fs = MemoryFs::new();
        let err = fs.read_file("views/home.tpl").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_shared_handle_sees_updates() {
        let fs = Arc::new(MemoryFs::new());
        let shared: Box<dyn FileSystem> = Box::new(Arc::clone(&fs));
        fs.insert("a.tpl", "a");
        assert_eq!(shared.read_file("a.tpl").unwrap(), b"a");
    }
}
