use crate::core::{Pipeline, TransformResult};
use crate::domain::model::LoadSummary;
use crate::utils::error::Result;

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub fn run(&self) -> Result<LoadSummary> {
        tracing::info!("🚀 Starting conversion");

        let result = self.extract_and_transform()?;

        tracing::info!("💾 Writing CSV output...");
        let summary = self.pipeline.load(result)?;

        Ok(summary)
    }

    /// Loads and flattens without writing anything.
    pub fn dry_run(&self) -> Result<TransformResult> {
        tracing::info!("🔍 Dry run: nothing will be written");
        self.extract_and_transform()
    }

    fn extract_and_transform(&self) -> Result<TransformResult> {
        tracing::info!("📥 Loading metadata...");
        let records = self.pipeline.extract()?;
        tracing::info!("Loaded {} records", records.len());

        tracing::info!("🔧 Flattening records...");
        let result = self.pipeline.transform(records)?;
        tracing::info!(
            "Flattened {} rows under {} columns",
            result.rows.len(),
            result.header.len()
        );

        Ok(result)
    }
}
