use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("Input not found: {}", path.display())]
    InputNotFound { path: PathBuf },

    #[error("Failed to read {}: {source}", path.display())]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed JSON in {}: {source}", path.display())]
    ParseError {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid metadata record {record}: {message}")]
    InvalidRecord { record: String, message: String },

    #[error("Cannot determine token id for {record}: {message}")]
    TokenIdError { record: String, message: String },

    #[error("Unknown placeholder {{{placeholder}}} in filename template \"{template}\"")]
    UnknownPlaceholder { placeholder: String, template: String },

    #[error("Malformed filename template \"{template}\": {reason}")]
    MalformedTemplate { template: String, reason: String },

    #[error("Filename template uses {{{placeholder}}} but {record} has no {field}")]
    MissingTemplateValue {
        placeholder: String,
        record: String,
        field: String,
    },

    #[error("Column \"{column}\" appears twice: {reason}")]
    ColumnConflict { column: String, reason: String },

    #[error("Per-record output {} would be written twice (token id {identifier})", path.display())]
    OutputCollision { path: PathBuf, identifier: String },

    #[error("Failed to write {}: {source}", path.display())]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("CSV serialization failed for {}: {source}", path.display())]
    CsvError { path: PathBuf, source: csv::Error },

    #[error("Invalid value for '{field}' ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },
}

/// Broad grouping used for the final CLI report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Template,
    Output,
    Configuration,
}

impl EtlError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::InputNotFound { .. }
            | EtlError::ReadError { .. }
            | EtlError::ParseError { .. }
            | EtlError::InvalidRecord { .. }
            | EtlError::TokenIdError { .. }
            | EtlError::ColumnConflict { .. } => ErrorCategory::Input,
            EtlError::UnknownPlaceholder { .. }
            | EtlError::MalformedTemplate { .. }
            | EtlError::MissingTemplateValue { .. } => ErrorCategory::Template,
            EtlError::OutputCollision { .. }
            | EtlError::WriteError { .. }
            | EtlError::CsvError { .. } => ErrorCategory::Output,
            EtlError::InvalidConfigValueError { .. }
            | EtlError::ConfigValidationError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            EtlError::InputNotFound { .. } => {
                "Check the path, or pass --metadata / --input-dir to point at your metadata"
            }
            EtlError::ReadError { .. } => "Check the file permissions and try again",
            EtlError::ParseError { .. } => "Fix the JSON syntax in the named file",
            EtlError::InvalidRecord { .. } => {
                "Each record must be a JSON object and 'attributes' must be a list of objects"
            }
            EtlError::TokenIdError { .. } => {
                "Add a token_id to the record, put the id in the filename, or change --id-from"
            }
            EtlError::UnknownPlaceholder { .. } | EtlError::MalformedTemplate { .. } => {
                "Allowed placeholders: {token_id}, {stem}, {image}, {image_name}, {image_ext}; use {{ and }} for literal braces"
            }
            EtlError::MissingTemplateValue { .. } => {
                "Add the missing field to the record or use a template that does not need it"
            }
            EtlError::ColumnConflict { .. } => {
                "Rename the trait or the filename column, or drop the base field with --fields / --only-traits"
            }
            EtlError::OutputCollision { .. } => {
                "Make token ids unique or write only the aggregated CSV"
            }
            EtlError::WriteError { .. } | EtlError::CsvError { .. } => {
                "Check that the output location exists and is writable"
            }
            EtlError::InvalidConfigValueError { .. }
            | EtlError::ConfigValidationError { .. } => {
                "Run with --help to review the available options"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        let prefix = match self.category() {
            ErrorCategory::Input => "Could not load metadata",
            ErrorCategory::Template => "Could not render the filename column",
            ErrorCategory::Output => "Could not write CSV output",
            ErrorCategory::Configuration => "Invalid configuration",
        };
        format!("{}: {}", prefix, self)
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_placeholder_message_names_placeholder() {
        let err = EtlError::UnknownPlaceholder {
            placeholder: "edition".into(),
            template: "{edition}.png".into(),
        };
        assert_eq!(
            err.to_string(),
            "Unknown placeholder {edition} in filename template \"{edition}.png\""
        );
        assert_eq!(err.category(), ErrorCategory::Template);
    }

    #[test]
    fn test_write_error_names_path() {
        let err = EtlError::WriteError {
            path: PathBuf::from("out/7.csv"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        let msg = err.user_friendly_message();
        assert!(msg.starts_with("Could not write CSV output"));
        assert!(msg.contains("out/7.csv"));
        assert_eq!(err.category(), ErrorCategory::Output);
    }

    #[test]
    fn test_config_errors_share_category() {
        let invalid = EtlError::InvalidConfigValueError {
            field: "fields".into(),
            value: "edition".into(),
            reason: "unknown base field".into(),
        };
        let unparsable = EtlError::ConfigValidationError {
            field: "toml".into(),
            message: "expected a table".into(),
        };
        assert_eq!(invalid.category(), ErrorCategory::Configuration);
        assert_eq!(unparsable.category(), ErrorCategory::Configuration);
        assert_eq!(invalid.recovery_suggestion(), unparsable.recovery_suggestion());
    }
}
