use crate::config::ConvertConfig;
use crate::core::{MetadataRecord, TransformResult};
use crate::domain::model::{BaseField, Column, Header, Row};
use crate::utils::error::{EtlError, Result};
use indexmap::IndexMap;

/// Two passes: the header (base fields, filename column, trait union in
/// first-seen order) is fixed before any row is built, so every row has
/// exactly one cell per header column.
pub fn convert(records: &[MetadataRecord], config: &ConvertConfig) -> Result<TransformResult> {
    let header = build_header(records, config)?;
    tracing::debug!(
        "Header has {} column(s): {}",
        header.len(),
        header.names().collect::<Vec<_>>().join(", ")
    );

    let rows = records
        .iter()
        .map(|record| flatten_record(record, &header, config))
        .collect::<Result<Vec<_>>>()?;

    Ok(TransformResult { header, rows })
}

pub fn build_header(records: &[MetadataRecord], config: &ConvertConfig) -> Result<Header> {
    let mut columns: Vec<Column> = config
        .base_columns()
        .iter()
        .copied()
        .map(Column::Base)
        .collect();
    if let Some(filename_column) = &config.filename_column {
        columns.push(Column::Filename(filename_column.name.clone()));
    }

    // trait name -> origin of the first record that has it
    let mut traits: IndexMap<&str, &str> = IndexMap::new();
    for record in records {
        for name in record.traits.keys() {
            traits.entry(name.as_str()).or_insert(record.origin.as_str());
        }
    }

    for (name, origin) in &traits {
        if columns.iter().any(|column| column.name() == *name) {
            return Err(EtlError::ColumnConflict {
                column: name.to_string(),
                reason: format!(
                    "trait type in {} has the same name as a base or filename column",
                    origin
                ),
            });
        }
    }

    columns.extend(traits.keys().map(|name| Column::Trait(name.to_string())));
    Ok(Header::new(columns))
}

pub fn flatten_record(
    record: &MetadataRecord,
    header: &Header,
    config: &ConvertConfig,
) -> Result<Row> {
    let image = record
        .image
        .as_deref()
        .map(|image| match &config.image_prefix {
            Some(prefix) => prefix.apply(image),
            None => image.to_string(),
        });

    let cells = header
        .columns()
        .iter()
        .map(|column| match column {
            Column::Base(BaseField::Image) => Ok(image.clone().unwrap_or_default()),
            Column::Base(field) => Ok(record.field(*field).unwrap_or_default().to_string()),
            Column::Filename(_) => match &config.filename_column {
                Some(filename_column) => filename_column.template.render(record, image.as_deref()),
                None => Ok(String::new()),
            },
            Column::Trait(name) => Ok(record.traits.get(name).cloned().unwrap_or_default()),
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Row {
        identifier: record.identifier.clone(),
        cells,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FilenameColumn, ImagePrefix, Source};
    use crate::core::template::FilenameTemplate;
    use std::path::PathBuf;

    fn config() -> ConvertConfig {
        ConvertConfig::new(Source::MetadataFile(PathBuf::from("metadata.json")))
    }

    fn record(identifier: &str, traits: &[(&str, &str)]) -> MetadataRecord {
        MetadataRecord {
            identifier: identifier.to_string(),
            stem: identifier.to_string(),
            origin: format!("metadata.json (item {})", identifier),
            traits: traits
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_trait_union_backfills_empty_cells() {
        let mut config = config();
        config.fields = vec![BaseField::TokenId];
        let records = vec![
            record("1", &[("Background", "Night Time")]),
            record("2", &[("Filter", "Glass")]),
        ];

        let result = convert(&records, &config).unwrap();

        assert_eq!(
            result.header.names().collect::<Vec<_>>(),
            vec!["token_id", "Background", "Filter"]
        );
        assert_eq!(result.rows[0].cells, vec!["1", "Night Time", ""]);
        assert_eq!(result.rows[1].cells, vec!["2", "", "Glass"]);
    }

    #[test]
    fn test_row_width_matches_header() {
        let records = vec![
            record("1", &[("A", "a")]),
            record("2", &[]),
            record("3", &[("B", "b"), ("C", "c")]),
        ];
        let result = convert(&records, &config()).unwrap();
        for row in &result.rows {
            assert_eq!(row.cells.len(), result.header.len());
        }
    }

    #[test]
    fn test_missing_base_fields_are_empty() {
        let mut rec = record("4", &[]);
        rec.name = Some("Four".into());
        let result = convert(&[rec], &config()).unwrap();
        let row = &result.rows[0];

        assert_eq!(row.cell(&result.header, "name"), Some("Four"));
        assert_eq!(row.cell(&result.header, "description"), Some(""));
        assert_eq!(row.cell(&result.header, "youtube_url"), Some(""));
    }

    #[test]
    fn test_only_traits_has_no_base_columns() {
        let mut config = config();
        config.only_traits = true;
        config.filename_column = Some(FilenameColumn {
            name: "filename".into(),
            template: FilenameTemplate::parse("{token_id}.png").unwrap(),
        });

        let result = convert(&[record("7", &[("Eyes", "Laser")])], &config).unwrap();

        assert_eq!(
            result.header.names().collect::<Vec<_>>(),
            vec!["filename", "Eyes"]
        );
        assert_eq!(result.rows[0].cells, vec!["7.png", "Laser"]);
        assert_eq!(result.rows[0].identifier, "7");
    }

    #[test]
    fn test_image_prefix_and_image_name() {
        let mut config = config();
        config.fields = vec![BaseField::Image];
        config.image_prefix = Some(ImagePrefix::new("https://gw.example/ipfs/"));
        config.filename_column = Some(FilenameColumn {
            name: "filename".into(),
            template: FilenameTemplate::parse("{image_name}").unwrap(),
        });
        let mut rec = record("1", &[]);
        rec.image = Some("ipfs://CID/1.png".into());

        let result = convert(&[rec], &config).unwrap();

        assert_eq!(
            result.rows[0].cells,
            vec!["https://gw.example/ipfs/CID/1.png", "1.png"]
        );
    }

    #[test]
    fn test_trait_shadowing_base_column_is_rejected() {
        let records = vec![record("1", &[("name", "Shadow")])];
        let err = convert(&records, &config()).unwrap_err();
        match err {
            EtlError::ColumnConflict { column, reason } => {
                assert_eq!(column, "name");
                assert!(reason.contains("item 1"));
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let mut config = config();
        config.fields = vec![BaseField::TokenId];
        assert!(convert(&records, &config).is_ok());
    }

    #[test]
    fn test_empty_input_gives_base_header() {
        let result = convert(&[], &config()).unwrap();
        assert!(result.rows.is_empty());
        assert_eq!(result.header.len(), BaseField::ALL.len());
    }
}
