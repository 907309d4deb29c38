pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::CliConfig;

pub use crate::config::{
    cli::LocalStorage, toml_config::TomlConfig, ConvertConfig, ConvertSettings,
};
pub use crate::core::{
    etl::EtlEngine, flatten::convert, pipeline::ConvertPipeline, writer::write_outputs,
};
pub use crate::domain::model::{
    BaseField, Header, LoadSummary, MetadataRecord, Row, TransformResult,
};
pub use crate::utils::error::{EtlError, Result};
