// src/main.rs
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use filing_items::batch::{self, BatchConfig, ManifestEntry};
use filing_items::config::{self, ExtractOptions, PartSeparationConfig};
use filing_items::edgar::{parse_filing_date, FormType};
use filing_items::storage::StorageManager;
use filing_items::utils::{self, AppError};
use filing_items::ItemExtractor;

/// Command Line Interface for the filing item extractor
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Filing documents to process (HTML or full submission text files)
    paths: Vec<PathBuf>,

    /// JSON manifest listing documents as {path, form_type, filing_date}
    #[arg(short, long)]
    manifest: Option<PathBuf>,

    /// Form type for documents that do not declare one (e.g. 10-K, 10-Q, 8-K)
    #[arg(short = 't', long)]
    form_type: Option<String>,

    /// Filing date for documents that do not declare one (YYYY-MM-DD or YYYYMMDD)
    #[arg(long)]
    filing_date: Option<String>,

    /// Only extract these section ids (comma separated, e.g. 1,1A,7 or part_2__1A)
    #[arg(short, long, value_delimiter = ',')]
    items: Vec<String>,

    /// Leave the SIGNATURE section out of the results
    #[arg(long)]
    no_signature: bool,

    /// Output directory for extracted content
    #[arg(short, long, default_value = "./output")]
    output_dir: PathBuf,

    /// Refuse to replace existing output files
    #[arg(long)]
    no_overwrite: bool,

    /// Debug mode - save annotated HTML of the normalized text
    #[arg(short, long)]
    debug: bool,

    /// Number of documents processed in parallel (default: FILING_ITEMS_JOBS or CPU count)
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let args = Args::parse();
    utils::logging::setup_logging(args.verbose);
    tracing::debug!("Starting with args: {:?}", args);

    let mut entries: Vec<ManifestEntry> = match &args.manifest {
        Some(manifest) => batch::load_manifest(manifest)?,
        None => Vec::new(),
    };
    entries.extend(args.paths.iter().map(|path| ManifestEntry::from_path(path.clone())));
    if entries.is_empty() {
        return Err(AppError::Config("No input documents: pass file paths or --manifest".to_string()));
    }

    let filing_date = args.filing_date.as_deref().map(parse_filing_date).transpose()?;
    let batch_config = BatchConfig {
        jobs: config::resolve_jobs(args.jobs)?,
        debug: args.debug,
        form_type: args.form_type.as_deref().map(FormType::from),
        filing_date,
    };

    let mut options = ExtractOptions::default().with_items(args.items.iter().cloned());
    if args.no_signature {
        options = options.without_signature();
    }
    let part_config = PartSeparationConfig::from_env()?;
    tracing::debug!("Part separation thresholds: {:?}", part_config);

    let extractor = Arc::new(ItemExtractor::new(options).with_part_config(part_config));
    let storage = Arc::new(StorageManager::new(&args.output_dir)?.with_overwrite(!args.no_overwrite));

    let summary = batch::run_batch(entries, extractor, storage, batch_config).await?;

    if summary.extracted == 0 && summary.failed > 0 {
        return Err(AppError::Processing(format!(
            "Failed to extract any sections from {} documents",
            summary.failed
        )));
    }

    Ok(())
}
