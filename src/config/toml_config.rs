use crate::config::{ConvertSettings, IdSource};
use crate::utils::error::{EtlError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Conversion preset loaded with `--config`. Every key is optional;
/// command-line flags override what is set here.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub columns: ColumnsConfig,
    #[serde(default)]
    pub image: ImageConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceConfig {
    pub metadata: Option<PathBuf>,
    pub input_dir: Option<PathBuf>,
    pub id_from: Option<IdSource>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ColumnsConfig {
    pub fields: Option<Vec<String>>,
    pub only_traits: Option<bool>,
    pub filename_col: Option<String>,
    pub filename_template: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImageConfig {
    pub prefix: Option<String>,
    pub source_prefix: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    pub dir: Option<PathBuf>,
    pub aggregate: Option<PathBuf>,
    pub emit_per_file: Option<bool>,
    pub sort: Option<bool>,
    pub header: Option<bool>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                EtlError::InputNotFound {
                    path: path.to_path_buf(),
                }
            } else {
                EtlError::ReadError {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| EtlError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    pub fn into_settings(self) -> ConvertSettings {
        ConvertSettings {
            metadata: self.source.metadata,
            input_dir: self.source.input_dir,
            output_dir: self.output.dir,
            emit_per_file: self.output.emit_per_file,
            aggregate: self.output.aggregate,
            sort: self.output.sort,
            id_from: self.source.id_from,
            header: self.output.header,
            only_traits: self.columns.only_traits,
            fields: self.columns.fields,
            filename_col: self.columns.filename_col,
            filename_template: self.columns.filename_template,
            image_prefix: self.image.prefix,
            image_source_prefix: self.image.source_prefix,
        }
    }
}
