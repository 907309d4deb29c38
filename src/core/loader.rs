use crate::config::{ConvertConfig, IdSource, Source};
use crate::core::{MetadataRecord, Record, Storage};
use crate::domain::model::BaseField;
use crate::utils::error::{EtlError, Result};
use regex::Regex;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").expect("valid regex"));

/// Keys checked, in order, for a token id inside a record.
const TOKEN_ID_KEYS: [&str; 4] = ["token_id", "edition", "tokenId", "id"];
/// Keys checked, in order, for an attribute's trait type.
const TRAIT_TYPE_KEYS: [&str; 3] = ["trait_type", "trait", "type"];

pub fn load<S: Storage>(storage: &S, config: &ConvertConfig) -> Result<Vec<MetadataRecord>> {
    match &config.source {
        Source::Directory(dir) => load_directory(storage, dir, config.id_from),
        Source::MetadataFile(path) => load_metadata_file(storage, path),
    }
}

/// Reads every `*.json` file in `dir`, ordered by the number in the file stem.
pub fn load_directory<S: Storage>(
    storage: &S,
    dir: &Path,
    id_from: IdSource,
) -> Result<Vec<MetadataRecord>> {
    let mut files: Vec<PathBuf> = storage
        .list_files(dir)?
        .into_iter()
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
        })
        .collect();
    files.sort_by_cached_key(|path| file_sort_key(path));

    tracing::info!("📂 Found {} JSON file(s) in {}", files.len(), dir.display());

    let mut records = Vec::with_capacity(files.len());
    for path in &files {
        tracing::debug!("Reading {}", path.display());
        let origin = path.display().to_string();
        let record = into_record(read_json(storage, path)?, &origin)?;
        let stem = file_stem(path);

        let identifier = match id_from {
            IdSource::Json => token_id_from_json(&record, &TOKEN_ID_KEYS),
            IdSource::Filename => token_id_from_stem(&stem),
            IdSource::Auto => token_id_from_json(&record, &TOKEN_ID_KEYS)
                .or_else(|| token_id_from_stem(&stem)),
        }
        .ok_or_else(|| EtlError::TokenIdError {
            record: origin.clone(),
            message: match id_from {
                IdSource::Json => format!("no integer in any of {}", TOKEN_ID_KEYS.join(", ")),
                IdSource::Filename => format!("no digits in file name '{}'", stem),
                IdSource::Auto => format!(
                    "no integer in any of {} and no digits in file name '{}'",
                    TOKEN_ID_KEYS.join(", "),
                    stem
                ),
            },
        })?;

        records.push(parse_record(record, identifier, stem, origin)?);
    }

    Ok(records)
}

/// Reads one document holding either a list or a mapping of records.
/// The identifier doubles as the `{stem}` of each record.
pub fn load_metadata_file<S: Storage>(storage: &S, path: &Path) -> Result<Vec<MetadataRecord>> {
    let entries: Vec<(DocumentSlot, String, Value)> = match read_json(storage, path)? {
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(idx, value)| {
                let origin = format!("{} (item {})", path.display(), idx + 1);
                (DocumentSlot::Position(idx + 1), origin, value)
            })
            .collect(),
        Value::Object(map) => map
            .into_iter()
            .map(|(key, value)| {
                let origin = format!("{} (key \"{}\")", path.display(), key);
                (DocumentSlot::Key(key), origin, value)
            })
            .collect(),
        other => {
            return Err(EtlError::InvalidRecord {
                record: path.display().to_string(),
                message: format!(
                    "expected a list or a mapping of records, found {}",
                    json_kind(&other)
                ),
            })
        }
    };

    tracing::info!("📄 Found {} record(s) in {}", entries.len(), path.display());

    entries
        .into_iter()
        .map(|(slot, origin, value)| {
            let record = into_record(value, &origin)?;
            let identifier = match slot {
                // An explicit token_id beats the key; the key beats the
                // looser id keys.
                DocumentSlot::Key(key) => {
                    let from_key = normalize_token_id(&key);
                    token_id_from_json(&record, &TOKEN_ID_KEYS[..1])
                        .or(from_key)
                        .or_else(|| token_id_from_json(&record, &TOKEN_ID_KEYS[1..]))
                        .unwrap_or(key)
                }
                DocumentSlot::Position(position) => token_id_from_json(&record, &TOKEN_ID_KEYS)
                    .unwrap_or_else(|| position.to_string()),
            };
            parse_record(record, identifier.clone(), identifier, origin)
        })
        .collect()
}

/// Where a record sits in a single metadata document.
enum DocumentSlot {
    Key(String),
    /// 1-based.
    Position(usize),
}

fn read_json<S: Storage>(storage: &S, path: &Path) -> Result<Value> {
    let bytes = storage.read_file(path)?;
    serde_json::from_slice(&bytes).map_err(|source| EtlError::ParseError {
        path: path.to_path_buf(),
        source,
    })
}

fn into_record(value: Value, origin: &str) -> Result<Record> {
    match value {
        Value::Object(data) => Ok(Record { data }),
        other => Err(EtlError::InvalidRecord {
            record: origin.to_string(),
            message: format!("expected a JSON object, found {}", json_kind(&other)),
        }),
    }
}

/// Pulls the recognised keys out of a raw record. Everything else in the
/// object is ignored.
fn parse_record(
    record: Record,
    identifier: String,
    stem: String,
    origin: String,
) -> Result<MetadataRecord> {
    let mut metadata = MetadataRecord {
        identifier,
        stem,
        origin,
        ..Default::default()
    };

    for field in BaseField::ALL {
        if field == BaseField::TokenId {
            continue;
        }
        if let Some(value) = record.data.get(field.key()).filter(|v| !v.is_null()) {
            metadata.set_field(field, cell_text(value));
        }
    }

    match record.data.get("attributes") {
        None | Some(Value::Null) => {}
        Some(Value::Array(items)) => {
            for (idx, item) in items.iter().enumerate() {
                let Value::Object(attribute) = item else {
                    return Err(EtlError::InvalidRecord {
                        record: metadata.origin,
                        message: format!(
                            "attributes[{}] must be an object, found {}",
                            idx,
                            json_kind(item)
                        ),
                    });
                };

                let trait_type = TRAIT_TYPE_KEYS
                    .iter()
                    .filter_map(|key| attribute.get(*key))
                    .map(cell_text)
                    .find(|name| !name.trim().is_empty());

                match trait_type {
                    // Repeated trait types: the last value wins.
                    Some(name) => {
                        let value = attribute.get("value").map(cell_text).unwrap_or_default();
                        metadata.traits.insert(name, value);
                    }
                    None => tracing::warn!(
                        "⚠️ {}: attributes[{}] has no trait_type, skipping it",
                        metadata.origin,
                        idx
                    ),
                }
            }
        }
        Some(other) => {
            return Err(EtlError::InvalidRecord {
                record: metadata.origin,
                message: format!("attributes must be a list, found {}", json_kind(other)),
            })
        }
    }

    Ok(metadata)
}

/// CSV text for a JSON value: strings verbatim, null empty, containers as
/// compact JSON.
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

fn token_id_from_json(record: &Record, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| record.data.get(*key))
        .find_map(|value| match value {
            Value::Number(n) => n
                .as_u64()
                .map(|v| v.to_string())
                .or_else(|| n.as_i64().map(|v| v.to_string())),
            Value::String(s) => normalize_token_id(s),
            _ => None,
        })
}

/// `" 007 "` becomes `"7"`; anything that is not an integer is rejected.
fn normalize_token_id(raw: &str) -> Option<String> {
    let raw = raw.trim();
    raw.parse::<u64>()
        .map(|v| v.to_string())
        .or_else(|_| raw.parse::<i64>().map(|v| v.to_string()))
        .ok()
}

fn token_id_from_stem(stem: &str) -> Option<String> {
    DIGITS
        .find(stem)
        .and_then(|m| normalize_token_id(m.as_str()))
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Numeric stems first in numeric order, then the rest by file name.
fn file_sort_key(path: &Path) -> (bool, u64, String) {
    let number = token_id_from_stem(&file_stem(path)).and_then(|id| id.parse::<u64>().ok());
    let name = path
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    (number.is_none(), number.unwrap_or(0), name)
}
