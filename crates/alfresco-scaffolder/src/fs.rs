//! Staged file access
//!
//! Every generated or edited file goes through a `FileStore`. The `StagedFs`
//! implementation keeps writes and deletions in memory until `commit()`, so a
//! whole run either reaches disk together or not at all.

use crate::error::{Error, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// File access port used by the module manager
pub trait FileStore {
    /// File contents, `None` when the file does not exist
    fn read(&self, path: &Path) -> Result<Option<String>>;

    fn write(&mut self, path: &Path, contents: &str) -> Result<()>;

    /// True for a file or a folder, staged or on disk
    fn exists(&self, path: &Path) -> bool;

    /// True when staged writes exist at or below `path`
    fn exists_in_memory(&self, path: &Path) -> bool;

    /// Recursively delete a file or folder, both on disk and staged
    fn delete(&mut self, path: &Path) -> Result<()>;

    /// Copy every file below `from` to the same relative location below `to`
    fn copy_dir(&mut self, from: &Path, to: &Path) -> Result<()>;

    fn move_dir(&mut self, from: &Path, to: &Path) -> Result<()> {
        self.copy_dir(from, to)?;
        self.delete(from)
    }

    /// Flush staged changes to disk
    fn commit(&mut self) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Staged {
    Written(Vec<u8>),
    Deleted,
}

/// In-memory staging layer over the real filesystem
#[derive(Debug, Default)]
pub struct StagedFs {
    staged: BTreeMap<PathBuf, Staged>,
    /// Folders deleted since the last commit
    deleted_roots: BTreeSet<PathBuf>,
}

impl StagedFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Paths with pending writes or deletions
    pub fn pending_paths(&self) -> Vec<&Path> {
        self.staged.keys().map(PathBuf::as_path).collect()
    }

    fn is_deleted(&self, path: &Path) -> bool {
        matches!(self.staged.get(path), Some(Staged::Deleted))
            || self.deleted_roots.iter().any(|root| path.starts_with(root))
    }

    fn staged_writes_under<'a>(
        &'a self,
        path: &'a Path,
    ) -> impl Iterator<Item = (&'a PathBuf, &'a [u8])> {
        self.staged
            .range(path.to_path_buf()..)
            .take_while(move |(key, _)| key.starts_with(path))
            .filter_map(|(key, staged)| match staged {
                Staged::Written(bytes) => Some((key, bytes.as_slice())),
                Staged::Deleted => None,
            })
    }

    fn read_bytes(&self, path: &Path) -> Result<Option<Vec<u8>>> {
        match self.staged.get(path) {
            Some(Staged::Written(bytes)) => return Ok(Some(bytes.clone())),
            Some(Staged::Deleted) => return Ok(None),
            None => {}
        }
        if self.is_deleted(path) || !path.is_file() {
            return Ok(None);
        }
        match fs::read(path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::io("read", path, e)),
        }
    }

    /// Files below `root` keyed by their relative path; staged content wins over disk
    fn files_under(&self, root: &Path) -> Result<BTreeMap<PathBuf, Vec<u8>>> {
        let mut files = BTreeMap::new();
        if root.is_dir() && !self.is_deleted(root) {
            for entry in WalkDir::new(root)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
            {
                if self.is_deleted(entry.path()) {
                    continue;
                }
                let Ok(relative) = entry.path().strip_prefix(root) else {
                    continue;
                };
                let bytes = fs::read(entry.path()).map_err(|e| Error::io("read", entry.path(), e))?;
                files.insert(relative.to_path_buf(), bytes);
            }
        }
        for (path, bytes) in self.staged_writes_under(root) {
            if let Ok(relative) = path.strip_prefix(root) {
                if !relative.as_os_str().is_empty() {
                    files.insert(relative.to_path_buf(), bytes.to_vec());
                }
            }
        }
        Ok(files)
    }
}

impl FileStore for StagedFs {
    fn read(&self, path: &Path) -> Result<Option<String>> {
        match self.read_bytes(path)? {
            Some(bytes) => String::from_utf8(bytes).map(Some).map_err(|e| {
                Error::io(
                    "read",
                    path,
                    std::io::Error::new(ErrorKind::InvalidData, e.utf8_error()),
                )
            }),
            None => Ok(None),
        }
    }

    fn write(&mut self, path: &Path, contents: &str) -> Result<()> {
        tracing::debug!(path = %path.display(), "staging write");
        self.staged
            .insert(path.to_path_buf(), Staged::Written(contents.as_bytes().to_vec()));
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        if self.exists_in_memory(path) {
            return true;
        }
        !self.is_deleted(path) && path.exists()
    }

    fn exists_in_memory(&self, path: &Path) -> bool {
        self.staged_writes_under(path).next().is_some()
    }

    fn delete(&mut self, path: &Path) -> Result<()> {
        tracing::debug!(path = %path.display(), "staging delete");
        let staged: Vec<PathBuf> = self
            .staged
            .range(path.to_path_buf()..)
            .take_while(|(key, _)| key.starts_with(path))
            .map(|(key, _)| key.clone())
            .collect();
        for key in staged {
            self.staged.remove(&key);
        }
        if path.is_dir() {
            self.deleted_roots.insert(path.to_path_buf());
        } else if path.is_file() {
            self.staged.insert(path.to_path_buf(), Staged::Deleted);
        }
        Ok(())
    }

    fn copy_dir(&mut self, from: &Path, to: &Path) -> Result<()> {
        tracing::debug!(from = %from.display(), to = %to.display(), "staging copy");
        for (relative, bytes) in self.files_under(from)? {
            self.staged.insert(to.join(relative), Staged::Written(bytes));
        }
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        for root in std::mem::take(&mut self.deleted_roots) {
            match fs::remove_dir_all(&root) {
                Ok(()) => tracing::debug!(path = %root.display(), "removed folder"),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(Error::io("remove", root, e)),
            }
        }
        for (path, staged) in std::mem::take(&mut self.staged) {
            match staged {
                Staged::Deleted => match fs::remove_file(&path) {
                    Ok(()) => tracing::debug!(path = %path.display(), "removed file"),
                    Err(e) if e.kind() == ErrorKind::NotFound => {}
                    Err(e) => return Err(Error::io("remove", path, e)),
                },
                Staged::Written(bytes) => {
                    if let Some(parent) = path.parent() {
                        fs::create_dir_all(parent)
                            .map_err(|e| Error::io("create directory", parent, e))?;
                    }
                    fs::write(&path, bytes).map_err(|e| Error::io("write", &path, e))?;
                    tracing::debug!(path = %path.display(), "wrote file");
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        let template = dir.path().join("source_templates/repo-amp");
        fs::create_dir_all(template.join("src")).unwrap();
        fs::write(template.join("pom.xml"), "<project/>").unwrap();
        fs::write(template.join("src/a.txt"), "a").unwrap();
        dir
    }

    #[test]
    fn test_writes_stay_in_memory_until_commit() {
        let dir = tree();
        let mut store = StagedFs::new();
        let path = dir.path().join("new/file.txt");
        store.write(&path, "hello").unwrap();

        assert!(!path.exists());
        assert!(store.exists(&path));
        assert!(store.exists(&dir.path().join("new")));
        assert!(store.exists_in_memory(&dir.path().join("new")));
        assert_eq!(store.read(&path).unwrap().as_deref(), Some("hello"));

        store.commit().unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "hello");
        assert!(store.pending_paths().is_empty());
    }

    #[test]
    fn test_read_missing_file_is_none() {
        let dir = tree();
        let store = StagedFs::new();
        assert_eq!(store.read(&dir.path().join("missing.xml")).unwrap(), None);
    }

    #[test]
    fn test_copy_unions_disk_and_staged_files() {
        let dir = tree();
        let mut store = StagedFs::new();
        let template = dir.path().join("source_templates/repo-amp");
        store.write(&template.join("src/a.txt"), "staged").unwrap();
        store.write(&template.join("extra.txt"), "extra").unwrap();

        let target = dir.path().join("a-repo");
        store.copy_dir(&template, &target).unwrap();
        assert_eq!(
            store.read(&target.join("pom.xml")).unwrap().as_deref(),
            Some("<project/>")
        );
        assert_eq!(
            store.read(&target.join("src/a.txt")).unwrap().as_deref(),
            Some("staged")
        );
        assert!(store.exists(&target.join("extra.txt")));
    }

    #[test]
    fn test_delete_covers_disk_and_staged_files() {
        let dir = tree();
        let mut store = StagedFs::new();
        let module = dir.path().join("source_templates");
        store.write(&module.join("repo-amp/staged.txt"), "x").unwrap();
        store.delete(&module).unwrap();

        assert!(!store.exists(&module));
        assert!(!store.exists(&module.join("repo-amp/pom.xml")));
        assert_eq!(store.read(&module.join("repo-amp/staged.txt")).unwrap(), None);

        store.commit().unwrap();
        assert!(!module.exists());
    }

    #[test]
    fn test_move_dir() {
        let dir = tree();
        let mut store = StagedFs::new();
        let from = dir.path().join("source_templates/repo-amp/src");
        let to = dir.path().join("source_templates/repo-amp/main");
        store.move_dir(&from, &to).unwrap();
        assert!(!store.exists(&from.join("a.txt")));
        assert_eq!(store.read(&to.join("a.txt")).unwrap().as_deref(), Some("a"));

        store.commit().unwrap();
        assert!(!from.exists());
        assert!(to.join("a.txt").is_file());
    }

    #[test]
    fn test_deleted_file_is_removed_on_commit() {
        let dir = tree();
        let mut store = StagedFs::new();
        let pom = dir.path().join("source_templates/repo-amp/pom.xml");
        store.delete(&pom).unwrap();
        assert!(!store.exists(&pom));
        store.write(&pom, "<new/>").unwrap();
        assert_eq!(store.read(&pom).unwrap().as_deref(), Some("<new/>"));
        store.commit().unwrap();
        assert_eq!(fs::read_to_string(&pom).unwrap(), "<new/>");
    }
}
