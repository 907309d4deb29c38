use crate::core::Storage;
use crate::utils::error::{EtlError, Result};
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// In-memory storage for unit tests. Directories exist implicitly once a
/// file is put under them, or explicitly via `add_dir`.
#[derive(Default)]
pub struct MemoryStorage {
    files: RefCell<BTreeMap<PathBuf, Vec<u8>>>,
    dirs: RefCell<BTreeSet<PathBuf>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, path: &str, data: &[u8]) {
        self.files
            .borrow_mut()
            .insert(PathBuf::from(path), data.to_vec());
    }

    pub fn put_json(&self, path: &str, value: serde_json::Value) {
        self.put(path, value.to_string().as_bytes());
    }

    pub fn add_dir(&self, path: &str) {
        self.dirs.borrow_mut().insert(PathBuf::from(path));
    }

    pub fn get_string(&self, path: &str) -> Option<String> {
        self.files
            .borrow()
            .get(Path::new(path))
            .map(|data| String::from_utf8_lossy(data).into_owned())
    }
}

impl Storage for MemoryStorage {
    fn read_file(&self, path: &Path) -> Result<Vec<u8>> {
        self.files
            .borrow()
            .get(path)
            .cloned()
            .ok_or_else(|| EtlError::InputNotFound {
                path: path.to_path_buf(),
            })
    }

    fn write_file(&self, path: &Path, data: &[u8]) -> Result<()> {
        self.files
            .borrow_mut()
            .insert(path.to_path_buf(), data.to_vec());
        Ok(())
    }

    fn list_files(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let files: Vec<PathBuf> = self
            .files
            .borrow()
            .keys()
            .filter(|path| path.parent() == Some(dir))
            .cloned()
            .collect();
        if files.is_empty() && !self.dirs.borrow().contains(dir) {
            return Err(EtlError::InputNotFound {
                path: dir.to_path_buf(),
            });
        }
        Ok(files)
    }
}
