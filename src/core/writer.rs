use crate::config::Destinations;
use crate::core::{Storage, TransformResult};
use crate::domain::model::{Header, LoadSummary, Row};
use crate::utils::error::{EtlError, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Serializes rows under `header`. `path` is only used in error messages.
/// A header without columns produces an empty document.
pub fn render_csv<'a, I>(header: &Header, rows: I, include_header: bool, path: &Path) -> Result<Vec<u8>>
where
    I: IntoIterator<Item = &'a Row>,
{
    if header.is_empty() {
        return Ok(Vec::new());
    }

    let csv_error = |source| EtlError::CsvError {
        path: path.to_path_buf(),
        source,
    };

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    if include_header {
        writer.write_record(header.names()).map_err(csv_error)?;
    }
    for row in rows {
        writer.write_record(&row.cells).map_err(csv_error)?;
    }

    writer
        .into_inner()
        .map_err(|e| csv_error(csv::Error::from(e.into_error())))
}

/// Writes per-record files and/or the aggregated file. Files written before
/// a failure are left in place.
pub fn write_outputs<S: Storage>(
    storage: &S,
    result: &TransformResult,
    destinations: &Destinations,
) -> Result<LoadSummary> {
    let mut summary = LoadSummary {
        rows: result.rows.len(),
        ..Default::default()
    };

    if let Some(dir) = &destinations.per_record_dir {
        let targets = per_record_targets(dir, &result.rows)?;
        for (path, row) in targets {
            let data = render_csv(&result.header, [row], destinations.header, &path)?;
            storage.write_file(&path, &data)?;
            tracing::debug!("Wrote {}", path.display());
            summary.per_record_files += 1;
        }
        tracing::info!(
            "💾 Wrote {} per-record CSV file(s) into {}",
            summary.per_record_files,
            dir.display()
        );
    }

    if let Some(path) = &destinations.aggregate {
        let mut rows: Vec<&Row> = result.rows.iter().collect();
        if destinations.sort {
            rows.sort_by_cached_key(|row| token_sort_key(&row.identifier));
        }
        let data = render_csv(&result.header, rows, destinations.header, path)?;
        storage.write_file(path, &data)?;
        tracing::info!(
            "📦 Aggregated CSV with {} row(s) written to {}",
            result.rows.len(),
            path.display()
        );
        summary.aggregate_path = Some(path.clone());
    }

    Ok(summary)
}

/// Resolves every per-record path first so a name collision fails the run
/// before anything is written.
fn per_record_targets<'a>(dir: &Path, rows: &'a [Row]) -> Result<Vec<(PathBuf, &'a Row)>> {
    let mut seen: HashMap<PathBuf, &str> = HashMap::new();
    let mut targets = Vec::with_capacity(rows.len());

    for row in rows {
        let path = dir.join(format!("{}.csv", file_safe(&row.identifier)));
        if let Some(previous) = seen.insert(path.clone(), &row.identifier) {
            return Err(EtlError::OutputCollision {
                path,
                identifier: if previous == row.identifier {
                    previous.to_string()
                } else {
                    format!("{} / {}", previous, row.identifier)
                },
            });
        }
        targets.push((path, row));
    }

    Ok(targets)
}

fn file_safe(identifier: &str) -> String {
    let name: String = identifier
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if name.is_empty() {
        "_".to_string()
    } else {
        name
    }
}

/// Integer ids ascending, then everything else lexically.
fn token_sort_key(identifier: &str) -> (bool, i128, String) {
    match identifier.parse::<i128>() {
        Ok(n) => (false, n, String::new()),
        Err(_) => (true, 0, identifier.to_string()),
    }
}
