use anyhow::Result;
use nftcsv::{ConvertPipeline, ConvertSettings, EtlEngine, EtlError, LocalStorage};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write_json(dir: &Path, name: &str, value: serde_json::Value) -> Result<()> {
    fs::create_dir_all(dir)?;
    fs::write(dir.join(name), serde_json::to_vec_pretty(&value)?)?;
    Ok(())
}

fn settings(root: &Path) -> ConvertSettings {
    ConvertSettings {
        input_dir: Some(root.join("json")),
        output_dir: Some(root.join("csv")),
        ..Default::default()
    }
}

/// 一般資料夾模式：每個 JSON 產生一個 CSV，並輸出合併檔
#[test]
fn test_directory_mode_per_file_and_aggregate() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let root = temp_dir.path();
    let json_dir = root.join("json");

    write_json(
        &json_dir,
        "1.json",
        serde_json::json!({
            "name": "Moonlit #1",
            "description": "A quiet night, with \"stars\"",
            "image": "ipfs://QmCID/1.png",
            "attributes": [
                {"trait_type": "Background", "value": "Night Time"},
                {"trait_type": "Eyes", "value": "Sleepy"}
            ]
        }),
    )?;
    write_json(
        &json_dir,
        "2.json",
        serde_json::json!({
            "name": "Moonlit #2",
            "image": "ipfs://QmCID/2.png",
            "attributes": [
                {"trait_type": "Filter", "value": "Glass"}
            ]
        }),
    )?;

    let mut settings = settings(root);
    settings.aggregate = Some(root.join("nfts.csv"));
    settings.fields = Some(vec!["token_id,name,description,image".to_string()]);
    settings.filename_col = Some("filename".to_string());
    settings.image_prefix = Some("https://gw.example/ipfs/".to_string());
    let config = settings.resolve()?;

    let engine = EtlEngine::new(ConvertPipeline::new(LocalStorage::new("."), config));
    let summary = engine.run()?;

    assert_eq!(summary.rows, 2);
    assert_eq!(summary.per_record_files, 2);
    assert_eq!(summary.aggregate_path, Some(root.join("nfts.csv")));

    let aggregate = fs::read_to_string(root.join("nfts.csv"))?;
    assert_eq!(
        aggregate,
        "token_id,name,description,image,filename,Background,Eyes,Filter\n\
         1,Moonlit #1,\"A quiet night, with \"\"stars\"\"\",https://gw.example/ipfs/QmCID/1.png,1.png,Night Time,Sleepy,\n\
         2,Moonlit #2,,https://gw.example/ipfs/QmCID/2.png,2.png,,,Glass\n"
    );

    let per_file = fs::read_to_string(root.join("csv").join("2.csv"))?;
    assert_eq!(
        per_file,
        "token_id,name,description,image,filename,Background,Eyes,Filter\n\
         2,Moonlit #2,,https://gw.example/ipfs/QmCID/2.png,2.png,,,Glass\n"
    );

    Ok(())
}

#[test]
fn test_empty_directory_writes_header_only() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let root = temp_dir.path();
    fs::create_dir_all(root.join("json"))?;

    let mut settings = settings(root);
    settings.aggregate = Some(root.join("out").join("nfts.csv"));
    settings.fields = Some(vec!["token_id".into(), "name".into()]);
    let config = settings.resolve()?;

    let summary = EtlEngine::new(ConvertPipeline::new(LocalStorage::new("."), config)).run()?;

    assert_eq!(summary.rows, 0);
    assert_eq!(
        fs::read_to_string(root.join("out").join("nfts.csv"))?,
        "token_id,name\n"
    );
    Ok(())
}

#[test]
fn test_missing_directory_is_input_error() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let config = settings(temp_dir.path()).resolve()?;

    let err = EtlEngine::new(ConvertPipeline::new(LocalStorage::new("."), config))
        .run()
        .unwrap_err();

    match err {
        EtlError::InputNotFound { path } => assert_eq!(path, temp_dir.path().join("json")),
        other => panic!("unexpected error: {other:?}"),
    }
    Ok(())
}

#[test]
fn test_malformed_json_aborts_before_any_output() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let root = temp_dir.path();
    let json_dir = root.join("json");
    write_json(&json_dir, "1.json", serde_json::json!({"name": "ok"}))?;
    fs::write(json_dir.join("2.json"), "{\"name\": \"broken\",")?;

    let mut settings = settings(root);
    settings.aggregate = Some(root.join("nfts.csv"));
    let config = settings.resolve()?;

    let err = EtlEngine::new(ConvertPipeline::new(LocalStorage::new("."), config))
        .run()
        .unwrap_err();

    assert!(matches!(err, EtlError::ParseError { .. }));
    assert!(err.to_string().contains("2.json"));
    assert!(!root.join("csv").exists());
    assert!(!root.join("nfts.csv").exists());
    Ok(())
}

#[test]
fn test_id_from_filename_overrides_json() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let root = temp_dir.path();
    write_json(
        &root.join("json"),
        "token-8.json",
        serde_json::json!({"token_id": 800, "name": "Eight"}),
    )?;

    let mut settings = settings(root);
    settings.id_from = Some(nftcsv::config::IdSource::Filename);
    settings.fields = Some(vec!["token_id".into(), "name".into()]);
    let config = settings.resolve()?;

    EtlEngine::new(ConvertPipeline::new(LocalStorage::new("."), config)).run()?;

    let per_file: PathBuf = root.join("csv").join("8.csv");
    assert_eq!(fs::read_to_string(per_file)?, "token_id,name\n8,Eight\n");
    Ok(())
}
