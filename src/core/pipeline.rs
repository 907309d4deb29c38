use crate::config::ConvertConfig;
use crate::core::{flatten, loader, writer};
use crate::core::{MetadataRecord, Pipeline, Storage, TransformResult};
use crate::domain::model::LoadSummary;
use crate::utils::error::Result;

/// JSON metadata -> marketplace CSV.
pub struct ConvertPipeline<S: Storage> {
    storage: S,
    config: ConvertConfig,
}

impl<S: Storage> ConvertPipeline<S> {
    pub fn new(storage: S, config: ConvertConfig) -> Self {
        Self { storage, config }
    }
}

impl<S: Storage> Pipeline for ConvertPipeline<S> {
    fn extract(&self) -> Result<Vec<MetadataRecord>> {
        loader::load(&self.storage, &self.config)
    }

    fn transform(&self, records: Vec<MetadataRecord>) -> Result<TransformResult> {
        flatten::convert(&records, &self.config)
    }

    fn load(&self, result: TransformResult) -> Result<LoadSummary> {
        writer::write_outputs(&self.storage, &result, &self.config.destinations)
    }
}
