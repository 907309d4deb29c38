use crate::core::Storage;
use crate::utils::error::{EtlError, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Filesystem storage. Relative paths resolve against `base_path`;
/// absolute paths are used as given.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        self.base_path.join(path)
    }
}

fn read_error(path: &Path, source: std::io::Error) -> EtlError {
    if source.kind() == ErrorKind::NotFound {
        EtlError::InputNotFound {
            path: path.to_path_buf(),
        }
    } else {
        EtlError::ReadError {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl Storage for LocalStorage {
    fn read_file(&self, path: &Path) -> Result<Vec<u8>> {
        fs::read(self.resolve(path)).map_err(|e| read_error(path, e))
    }

    fn write_file(&self, path: &Path, data: &[u8]) -> Result<()> {
        let full_path = self.resolve(path);
        let write_error = |source| EtlError::WriteError {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).map_err(write_error)?;
        }

        fs::write(&full_path, data).map_err(write_error)?;
        Ok(())
    }

    fn list_files(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in fs::read_dir(self.resolve(dir)).map_err(|e| read_error(dir, e))? {
            let entry = entry.map_err(|e| read_error(dir, e))?;
            let file_type = entry.file_type().map_err(|e| read_error(dir, e))?;
            if file_type.is_file() {
                files.push(dir.join(entry.file_name()));
            }
        }
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_creates_parent_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp_dir.path());

        storage
            .write_file(Path::new("nested/out/1.csv"), b"token_id\n1\n")
            .unwrap();
        let data = storage.read_file(Path::new("nested/out/1.csv")).unwrap();
        assert_eq!(data, b"token_id\n1\n");
    }

    #[test]
    fn test_list_files_skips_directories() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp_dir.path());
        storage.write_file(Path::new("json/1.json"), b"{}").unwrap();
        storage.write_file(Path::new("json/sub/2.json"), b"{}").unwrap();

        let files = storage.list_files(Path::new("json")).unwrap();
        assert_eq!(files, vec![PathBuf::from("json/1.json")]);
    }

    #[test]
    fn test_missing_input_maps_to_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp_dir.path());

        let err = storage.read_file(Path::new("metadata.json")).unwrap_err();
        assert!(matches!(err, EtlError::InputNotFound { .. }));
        let err = storage.list_files(Path::new("json")).unwrap_err();
        assert!(matches!(err, EtlError::InputNotFound { .. }));
    }
}
