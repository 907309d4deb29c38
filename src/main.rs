use anyhow::Context;
use clap::Parser;
use nftcsv::utils::logger;
use nftcsv::{CliConfig, ConvertPipeline, EtlEngine, LocalStorage, TomlConfig, TransformResult};

fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    logger::init_cli_logger(cli.verbose);

    tracing::info!("Starting nftcsv");
    tracing::debug!("CLI config: {:?}", cli);

    let mut settings = cli.settings();
    if let Some(path) = &cli.config {
        tracing::info!("📁 Loading configuration from: {}", path.display());
        let file = TomlConfig::from_file(path)
            .with_context(|| format!("failed to load config file '{}'", path.display()))?;
        settings = settings.merge(file.into_settings());
    }

    let config = match settings.resolve() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };
    tracing::debug!("Resolved config: {:?}", config);

    let pipeline = ConvertPipeline::new(LocalStorage::new("."), config);
    let engine = EtlEngine::new(pipeline);

    let outcome = if cli.dry_run {
        engine.dry_run().map(|result| display_dry_run(&result))
    } else {
        engine.run().map(|summary| {
            tracing::info!("✅ Conversion completed successfully!");
            println!("✅ Converted {} record(s)", summary.rows);
            if summary.per_record_files > 0 {
                println!("📁 Per-record CSV files: {}", summary.per_record_files);
            }
            match &summary.aggregate_path {
                Some(path) => println!("📦 Aggregated CSV: {}", path.display()),
                None => println!("No aggregated CSV requested (use --aggregate PATH)"),
            }
        })
    };

    if let Err(e) = outcome {
        tracing::error!(
            "❌ Conversion failed: {} (Category: {:?})",
            e,
            e.category()
        );
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 Suggestion: {}", e.recovery_suggestion());
        std::process::exit(1);
    }

    Ok(())
}

fn display_dry_run(result: &TransformResult) {
    println!("🔍 Dry Run Analysis:");
    println!("  Records: {}", result.rows.len());
    println!("  Columns: {}", result.header.len());
    for name in result.header.names() {
        println!("    - {}", name);
    }
}
