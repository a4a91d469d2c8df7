use clap::Parser;
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use inspection_record_service::inspection::{
    InspectionExtractor, InspectionRecord, MeasurementCatalog,
};
use inspection_record_service::services::{ImportOutcome, InspectionImportService};
use serde::Serialize;
use sqlx::postgres::PgPoolOptions;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "import-inspections")]
#[command(about = "Import inspection report files (CSV or Excel) into inspection_records", long_about = None)]
struct Cli {
    /// Report files to import
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Database connection string (not needed with --dry-run)
    #[arg(long, env)]
    database_url: Option<String>,

    /// Print the extracted records as JSON instead of storing them
    #[arg(long)]
    dry_run: bool,

    /// JSON measurement catalog replacing the built-in table
    #[arg(long, env = "MEASUREMENT_CATALOG_PATH")]
    catalog: Option<PathBuf>,

    /// Number of files imported concurrently
    #[arg(long, default_value = "4")]
    parallel: usize,

    /// Store only the file name instead of the path as given
    #[arg(long)]
    basename: bool,
}

#[derive(Serialize)]
struct DryRunOutput<'a> {
    filename: &'a str,
    records: Vec<InspectionRecord>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if it exists (ignore errors if not found)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let catalog = MeasurementCatalog::load(cli.catalog.as_deref())?;
    info!("Using measurement catalog with {} fields", catalog.len());
    let extractor = InspectionExtractor::new(catalog);

    if cli.dry_run {
        return dry_run(&cli, &extractor);
    }

    let database_url = cli
        .database_url
        .as_deref()
        .ok_or("--database-url (or DATABASE_URL) is required unless --dry-run is set")?;

    info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(cli.parallel.max(1) as u32)
        .connect(database_url)
        .await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let service = InspectionImportService::new(pool, extractor);
    import_all(&cli, &service).await
}

/// Extract every file and print the records, one JSON document per file
fn dry_run(cli: &Cli, extractor: &InspectionExtractor) -> Result<(), Box<dyn std::error::Error>> {
    let mut failed = 0;

    for path in &cli.files {
        let filename = record_filename(path, cli.basename);
        let result = std::fs::read(path)
            .map_err(|e| e.to_string())
            .and_then(|bytes| {
                extractor
                    .extract_bytes(&filename, &bytes)
                    .map_err(|e| e.to_string())
            });

        match result {
            Ok(records) => {
                info!("Parsed {} records from file: {}", records.len(), filename);
                let output = DryRunOutput {
                    filename: &filename,
                    records,
                };
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            Err(e) => {
                error!("Failed to read {}: {}", path.display(), e);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        return Err(format!("{failed} of {} files failed", cli.files.len()).into());
    }
    Ok(())
}

async fn import_all(
    cli: &Cli,
    service: &InspectionImportService,
) -> Result<(), Box<dyn std::error::Error>> {
    let start_time = Instant::now();
    let pb = ProgressBar::new(cli.files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")?
            .progress_chars("=>-"),
    );

    let results: Vec<(PathBuf, Result<ImportOutcome, String>)> = stream::iter(&cli.files)
        .map(|path| {
            let pb = pb.clone();
            async move {
                let filename = record_filename(path, cli.basename);
                let result = match tokio::fs::read(path).await {
                    Ok(bytes) => service
                        .import_file(&filename, bytes)
                        .await
                        .map_err(|e| e.to_string()),
                    Err(e) => Err(e.to_string()),
                };
                pb.inc(1);
                pb.set_message(filename);
                (path.clone(), result)
            }
        })
        .buffer_unordered(cli.parallel.max(1))
        .collect()
        .await;

    pb.finish_with_message("done");

    let mut stored = 0;
    let mut empty = 0;
    let mut failed = 0;
    let mut records = 0;
    for (path, result) in &results {
        match result {
            Ok(outcome) if outcome.is_empty() => {
                warn!("{}", outcome.message());
                empty += 1;
            }
            Ok(outcome) => {
                info!("{}", outcome.message());
                records += outcome.records_inserted;
                stored += 1;
            }
            Err(e) => {
                error!("Error processing {}: {}", path.display(), e);
                failed += 1;
            }
        }
    }

    info!(
        "Imported {} records from {} files in {:.1}s ({} without measurable records, {} failed)",
        records,
        stored,
        start_time.elapsed().as_secs_f64(),
        empty,
        failed
    );

    if failed > 0 {
        return Err(format!("{failed} of {} files failed", cli.files.len()).into());
    }
    Ok(())
}

/// Identifier stored with each record: the path verbatim unless `basename` is set
fn record_filename(path: &Path, basename: bool) -> String {
    let name = if basename { path.file_name() } else { None };
    name.unwrap_or(path.as_os_str()).to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_filename_is_verbatim_by_default() {
        let path = Path::new("reports/2024/line-3.csv");
        assert_eq!(record_filename(path, false), "reports/2024/line-3.csv");
    }

    #[test]
    fn test_record_filename_basename() {
        let path = Path::new("reports/2024/line-3.csv");
        assert_eq!(record_filename(path, true), "line-3.csv");
        assert_eq!(record_filename(Path::new(".."), true), "..");
    }

    #[test]
    fn test_cli_flags() {
        let cli = Cli::try_parse_from(["import-inspections", "--dry-run", "a/b.csv"]).unwrap();
        assert!(!cli.basename);
        assert_eq!(cli.files, vec![PathBuf::from("a/b.csv")]);

        let cli = Cli::try_parse_from(["import-inspections", "--basename", "a/b.csv"]).unwrap();
        assert!(cli.basename);
    }
}
