pub mod cli;
pub mod toml_config;

use crate::core::template::FilenameTemplate;
use crate::domain::model::BaseField;
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{self, Validate};
use serde::Deserialize;
use std::path::PathBuf;

pub const DEFAULT_INPUT_DIR: &str = "json";
pub const DEFAULT_OUTPUT_DIR: &str = "csv";
pub const DEFAULT_METADATA_CSV: &str = "metadata.csv";
pub const DEFAULT_FILENAME_TEMPLATE: &str = "{token_id}.png";
pub const DEFAULT_IMAGE_SOURCE_PREFIX: &str = "ipfs://";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// One JSON file per token.
    Directory(PathBuf),
    /// One document holding a list or a mapping of records.
    MetadataFile(PathBuf),
}

/// Where the token id comes from in directory mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum IdSource {
    /// JSON keys first, then digits in the filename.
    #[default]
    Auto,
    Filename,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilenameColumn {
    pub name: String,
    pub template: FilenameTemplate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePrefix {
    pub source: String,
    pub gateway: String,
}

impl ImagePrefix {
    pub fn new(gateway: impl Into<String>) -> Self {
        Self {
            source: DEFAULT_IMAGE_SOURCE_PREFIX.to_string(),
            gateway: gateway.into(),
        }
    }

    /// Swaps the source prefix for the gateway, joining with a single `/`.
    pub fn apply(&self, image: &str) -> String {
        match image.strip_prefix(self.source.as_str()) {
            Some(rest) => {
                let rest = rest.trim_start_matches('/');
                let rest = rest.strip_prefix("ipfs/").unwrap_or(rest);
                format!("{}/{}", self.gateway.trim_end_matches('/'), rest)
            }
            None => image.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destinations {
    /// Directory for one CSV per record.
    pub per_record_dir: Option<PathBuf>,
    pub aggregate: Option<PathBuf>,
    pub header: bool,
    /// Sort the aggregated CSV by token id instead of load order.
    pub sort: bool,
}

/// Everything a conversion run needs, resolved and validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertConfig {
    pub source: Source,
    pub id_from: IdSource,
    pub fields: Vec<BaseField>,
    pub only_traits: bool,
    pub filename_column: Option<FilenameColumn>,
    pub image_prefix: Option<ImagePrefix>,
    pub destinations: Destinations,
}

impl ConvertConfig {
    /// Defaults of the command line: every base field, per-record CSVs in
    /// `csv/` for directory mode, `metadata.csv` for single-file mode.
    pub fn new(source: Source) -> Self {
        let directory_mode = matches!(source, Source::Directory(_));
        Self {
            source,
            id_from: IdSource::Auto,
            fields: BaseField::ALL.to_vec(),
            only_traits: false,
            filename_column: None,
            image_prefix: None,
            destinations: Destinations {
                per_record_dir: directory_mode.then(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
                aggregate: (!directory_mode).then(|| PathBuf::from(DEFAULT_METADATA_CSV)),
                header: true,
                sort: true,
            },
        }
    }

    pub fn base_columns(&self) -> &[BaseField] {
        if self.only_traits {
            &[]
        } else {
            &self.fields
        }
    }
}

impl Validate for ConvertConfig {
    fn validate(&self) -> Result<()> {
        match &self.source {
            Source::Directory(dir) => validation::validate_path("input_dir", dir)?,
            Source::MetadataFile(file) => validation::validate_path("metadata", file)?,
        }
        if let Some(dir) = &self.destinations.per_record_dir {
            validation::validate_path("output_dir", dir)?;
        }
        if let Some(path) = &self.destinations.aggregate {
            validation::validate_path("aggregate", path)?;
        }

        if let Some(column) = &self.filename_column {
            validation::validate_column_name("filename_col", &column.name)?;
            if self.base_columns().iter().any(|f| f.key() == column.name) {
                return Err(EtlError::InvalidConfigValueError {
                    field: "filename_col".to_string(),
                    value: column.name.clone(),
                    reason: "Name is already used by a base field column".to_string(),
                });
            }
        }

        if let Some(prefix) = &self.image_prefix {
            validation::validate_url("image_prefix", &prefix.gateway)?;
            validation::validate_non_empty_string("image_source_prefix", &prefix.source)?;
        }

        Ok(())
    }
}

/// Unresolved options shared by the command line and the config file.
/// `None` means "not given here".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConvertSettings {
    pub metadata: Option<PathBuf>,
    pub input_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub emit_per_file: Option<bool>,
    pub aggregate: Option<PathBuf>,
    pub sort: Option<bool>,
    pub id_from: Option<IdSource>,
    pub header: Option<bool>,
    pub only_traits: Option<bool>,
    pub fields: Option<Vec<String>>,
    pub filename_col: Option<String>,
    pub filename_template: Option<String>,
    pub image_prefix: Option<String>,
    pub image_source_prefix: Option<String>,
}

impl ConvertSettings {
    /// Values set on `self` win over `fallback`.
    pub fn merge(self, fallback: ConvertSettings) -> Self {
        Self {
            metadata: self.metadata.or(fallback.metadata),
            input_dir: self.input_dir.or(fallback.input_dir),
            output_dir: self.output_dir.or(fallback.output_dir),
            emit_per_file: self.emit_per_file.or(fallback.emit_per_file),
            aggregate: self.aggregate.or(fallback.aggregate),
            sort: self.sort.or(fallback.sort),
            id_from: self.id_from.or(fallback.id_from),
            header: self.header.or(fallback.header),
            only_traits: self.only_traits.or(fallback.only_traits),
            fields: self.fields.or(fallback.fields),
            filename_col: self.filename_col.or(fallback.filename_col),
            filename_template: self.filename_template.or(fallback.filename_template),
            image_prefix: self.image_prefix.or(fallback.image_prefix),
            image_source_prefix: self.image_source_prefix.or(fallback.image_source_prefix),
        }
    }

    pub fn resolve(self) -> Result<ConvertConfig> {
        let source = match self.metadata {
            Some(path) => {
                if self.id_from.is_some() {
                    tracing::warn!("--id-from only applies to directory mode; ignoring it");
                }
                Source::MetadataFile(path)
            }
            None => Source::Directory(
                self.input_dir
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_INPUT_DIR)),
            ),
        };

        let mut config = ConvertConfig::new(source);
        config.id_from = self.id_from.unwrap_or_default();
        config.only_traits = self.only_traits.unwrap_or(false);

        if let Some(fields) = self.fields {
            if config.only_traits {
                tracing::warn!("--fields is ignored together with --only-traits");
            }
            config.fields = parse_fields(&fields)?;
        }

        let output_dir = self
            .output_dir
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));
        let directory_mode = matches!(config.source, Source::Directory(_));
        config.destinations.per_record_dir = (directory_mode
            || self.emit_per_file.unwrap_or(false))
        .then_some(output_dir);
        if let Some(aggregate) = self.aggregate {
            config.destinations.aggregate = Some(aggregate);
        }
        config.destinations.header = self.header.unwrap_or(true);
        config.destinations.sort = self.sort.unwrap_or(true);

        match (self.filename_col, self.filename_template) {
            (Some(name), template) => {
                let template = FilenameTemplate::parse(
                    template.as_deref().unwrap_or(DEFAULT_FILENAME_TEMPLATE),
                )?;
                config.filename_column = Some(FilenameColumn { name, template });
            }
            (None, Some(template)) => {
                tracing::warn!(
                    "--filename-template '{}' has no effect without --filename-col",
                    template
                );
            }
            (None, None) => {}
        }

        if let Some(gateway) = self.image_prefix {
            config.image_prefix = Some(ImagePrefix {
                source: self
                    .image_source_prefix
                    .unwrap_or_else(|| DEFAULT_IMAGE_SOURCE_PREFIX.to_string()),
                gateway,
            });
        }

        config.validate()?;
        Ok(config)
    }
}

/// Accepts repeated values as well as comma-separated lists; keeps the
/// given order and drops repeats.
fn parse_fields(values: &[String]) -> Result<Vec<BaseField>> {
    let mut fields = Vec::new();
    for value in values.iter().flat_map(|v| v.split(',')) {
        if value.trim().is_empty() {
            continue;
        }
        let field: BaseField = value.parse()?;
        if !fields.contains(&field) {
            fields.push(field);
        }
    }
    Ok(fields)
}

#[cfg(feature = "cli")]
pub use cli_args::CliConfig;

#[cfg(feature = "cli")]
mod cli_args {
    use super::{ConvertSettings, IdSource};
    use clap::Parser;
    use std::path::PathBuf;

    #[derive(Debug, Clone, Parser)]
    #[command(name = "nftcsv")]
    #[command(about = "Convert NFT metadata JSON into marketplace bulk-upload CSV")]
    pub struct CliConfig {
        /// Read one aggregated metadata JSON (list or mapping) instead of a directory
        #[arg(long)]
        pub metadata: Option<PathBuf>,

        /// Directory of per-token JSON files [default: json]
        #[arg(long)]
        pub input_dir: Option<PathBuf>,

        /// Directory for per-record CSV files [default: csv]
        #[arg(long)]
        pub output_dir: Option<PathBuf>,

        /// With --metadata, also write one CSV per record
        #[arg(long)]
        pub emit_per_file: bool,

        /// Write one combined CSV to this path (--metadata defaults to metadata.csv)
        #[arg(long)]
        pub aggregate: Option<PathBuf>,

        /// Keep load order in the aggregated CSV instead of sorting by token id
        #[arg(long)]
        pub no_sort: bool,

        /// Directory mode: where the token id comes from
        #[arg(long, value_enum)]
        pub id_from: Option<IdSource>,

        /// Do not write the header row
        #[arg(long)]
        pub no_header: bool,

        /// Write only trait columns (plus the filename column, if any)
        #[arg(long)]
        pub only_traits: bool,

        /// Subset of base columns, in output order
        #[arg(long, num_args = 1.., value_delimiter = ',')]
        pub fields: Option<Vec<String>>,

        /// Add a column mapping each row to its uploaded image file
        #[arg(long)]
        pub filename_col: Option<String>,

        /// Template for --filename-col [default: {token_id}.png]
        #[arg(long)]
        pub filename_template: Option<String>,

        /// Gateway URL substituted for the image source prefix
        #[arg(long)]
        pub image_prefix: Option<String>,

        /// Image prefix replaced by --image-prefix [default: ipfs://]
        #[arg(long)]
        pub image_source_prefix: Option<String>,

        /// TOML file supplying defaults for the options above
        #[arg(short, long)]
        pub config: Option<PathBuf>,

        /// Load and flatten, report the header, write nothing
        #[arg(long)]
        pub dry_run: bool,

        #[arg(short, long, help = "Enable verbose output")]
        pub verbose: bool,
    }

    impl CliConfig {
        /// Boolean flags only ever switch a feature on, so an unset flag
        /// leaves the config file's value in place.
        pub fn settings(&self) -> ConvertSettings {
            ConvertSettings {
                metadata: self.metadata.clone(),
                input_dir: self.input_dir.clone(),
                output_dir: self.output_dir.clone(),
                emit_per_file: self.emit_per_file.then_some(true),
                aggregate: self.aggregate.clone(),
                sort: self.no_sort.then_some(false),
                id_from: self.id_from,
                header: self.no_header.then_some(false),
                only_traits: self.only_traits.then_some(true),
                fields: self.fields.clone(),
                filename_col: self.filename_col.clone(),
                filename_template: self.filename_template.clone(),
                image_prefix: self.image_prefix.clone(),
                image_source_prefix: self.image_source_prefix.clone(),
            }
        }
    }

}
