use crate::utils::error::EtlError;
use indexmap::IndexMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Fixed top-level metadata keys, in the order they appear in the CSV.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseField {
    TokenId,
    Name,
    Description,
    Image,
    ExternalUrl,
    AnimationUrl,
    BackgroundColor,
    YoutubeUrl,
}

impl BaseField {
    pub const ALL: [BaseField; 8] = [
        BaseField::TokenId,
        BaseField::Name,
        BaseField::Description,
        BaseField::Image,
        BaseField::ExternalUrl,
        BaseField::AnimationUrl,
        BaseField::BackgroundColor,
        BaseField::YoutubeUrl,
    ];

    pub fn key(self) -> &'static str {
        match self {
            BaseField::TokenId => "token_id",
            BaseField::Name => "name",
            BaseField::Description => "description",
            BaseField::Image => "image",
            BaseField::ExternalUrl => "external_url",
            BaseField::AnimationUrl => "animation_url",
            BaseField::BackgroundColor => "background_color",
            BaseField::YoutubeUrl => "youtube_url",
        }
    }
}

impl fmt::Display for BaseField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for BaseField {
    type Err = EtlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BaseField::ALL
            .into_iter()
            .find(|field| field.key() == s.trim())
            .ok_or_else(|| EtlError::InvalidConfigValueError {
                field: "fields".to_string(),
                value: s.to_string(),
                reason: format!(
                    "Unknown base field. Allowed: {}",
                    BaseField::ALL.map(BaseField::key).join(", ")
                ),
            })
    }
}

/// Raw JSON object as read from the source. Only the loader looks inside it.
#[derive(Debug, Clone, Default)]
pub struct Record {
    pub data: serde_json::Map<String, serde_json::Value>,
}

/// One NFT's metadata after loading: the identifier is resolved and every
/// recognised key has been pulled out of the raw object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataRecord {
    pub identifier: String,
    /// File stem in directory mode, mapping key or 1-based position otherwise.
    pub stem: String,
    /// Where the record came from, for error messages.
    pub origin: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub external_url: Option<String>,
    pub animation_url: Option<String>,
    pub background_color: Option<String>,
    pub youtube_url: Option<String>,
    pub traits: IndexMap<String, String>,
}

impl MetadataRecord {
    pub fn field(&self, field: BaseField) -> Option<&str> {
        match field {
            BaseField::TokenId => Some(&self.identifier),
            BaseField::Name => self.name.as_deref(),
            BaseField::Description => self.description.as_deref(),
            BaseField::Image => self.image.as_deref(),
            BaseField::ExternalUrl => self.external_url.as_deref(),
            BaseField::AnimationUrl => self.animation_url.as_deref(),
            BaseField::BackgroundColor => self.background_color.as_deref(),
            BaseField::YoutubeUrl => self.youtube_url.as_deref(),
        }
    }

    pub fn set_field(&mut self, field: BaseField, value: String) {
        match field {
            BaseField::TokenId => self.identifier = value,
            BaseField::Name => self.name = Some(value),
            BaseField::Description => self.description = Some(value),
            BaseField::Image => self.image = Some(value),
            BaseField::ExternalUrl => self.external_url = Some(value),
            BaseField::AnimationUrl => self.animation_url = Some(value),
            BaseField::BackgroundColor => self.background_color = Some(value),
            BaseField::YoutubeUrl => self.youtube_url = Some(value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Column {
    Base(BaseField),
    Filename(String),
    Trait(String),
}

impl Column {
    pub fn name(&self) -> &str {
        match self {
            Column::Base(field) => field.key(),
            Column::Filename(name) | Column::Trait(name) => name,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Header {
    columns: Vec<Column>,
}

impl Header {
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(Column::name)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name() == name)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Cells aligned one-to-one with a [`Header`].
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub identifier: String,
    pub cells: Vec<String>,
}

impl Row {
    pub fn cell<'a>(&'a self, header: &Header, name: &str) -> Option<&'a str> {
        header
            .position(name)
            .and_then(|idx| self.cells.get(idx))
            .map(String::as_str)
    }
}

#[derive(Debug, Clone)]
pub struct TransformResult {
    pub header: Header,
    pub rows: Vec<Row>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadSummary {
    pub rows: usize,
    pub per_record_files: usize,
    pub aggregate_path: Option<PathBuf>,
}
