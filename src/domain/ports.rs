use crate::domain::model::{LoadSummary, MetadataRecord, TransformResult};
use crate::utils::error::Result;
use std::path::{Path, PathBuf};

pub trait Storage {
    fn read_file(&self, path: &Path) -> Result<Vec<u8>>;
    /// Creates missing parent directories before writing.
    fn write_file(&self, path: &Path, data: &[u8]) -> Result<()>;
    /// Regular files directly inside `dir`, in no particular order.
    fn list_files(&self, dir: &Path) -> Result<Vec<PathBuf>>;
}

pub trait Pipeline {
    fn extract(&self) -> Result<Vec<MetadataRecord>>;
    fn transform(&self, records: Vec<MetadataRecord>) -> Result<TransformResult>;
    fn load(&self, result: TransformResult) -> Result<LoadSummary>;
}
