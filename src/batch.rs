// src/batch.rs

//! Runs the extraction engine over many files with a bounded pool of blocking workers.

use chrono::NaiveDate;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;

use crate::edgar::{parse_filing_date, parse_submission_header, FilingMetadata, FormType, RawDocument};
use crate::extractors::{normalize, ItemExtractor};
use crate::storage::StorageManager;
use crate::utils::error::AppError;
use crate::utils::html_debug;

/// One input file, optionally with its metadata.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ManifestEntry {
    pub path: PathBuf,
    #[serde(default)]
    pub form_type: Option<FormType>,
    #[serde(default)]
    pub filing_date: Option<String>,
}

impl ManifestEntry {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            form_type: None,
            filing_date: None,
        }
    }
}

/// Reads a manifest: a JSON array of `{path, form_type, filing_date}` objects.
/// Relative paths are resolved against the manifest's directory.
pub fn load_manifest(path: &Path) -> Result<Vec<ManifestEntry>, AppError> {
    let content = fs::read_to_string(path)?;
    let mut entries: Vec<ManifestEntry> = serde_json::from_str(&content)?;

    let base = path.parent().unwrap_or_else(|| Path::new(""));
    for entry in &mut entries {
        if entry.path.is_relative() {
            entry.path = base.join(&entry.path);
        }
    }
    tracing::info!("Loaded {} entries from manifest {}", entries.len(), path.display());
    Ok(entries)
}

#[derive(Debug, Clone, Default)]
pub struct BatchConfig {
    pub jobs: usize,
    pub debug: bool,
    /// Used for entries that carry no form type of their own.
    pub form_type: Option<FormType>,
    /// Used for entries that carry no filing date of their own.
    pub filing_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub processed: usize,
    pub extracted: usize,
    pub empty: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DocumentStatus {
    Extracted,
    Empty,
}

/// Builds the metadata for one entry: the entry's own values first, then the batch
/// defaults, then the submission header inside the document.
pub fn resolve_metadata(entry: &ManifestEntry, content: &str, config: &BatchConfig) -> Result<FilingMetadata, AppError> {
    let header = parse_submission_header(content);

    let form_type = entry
        .form_type
        .clone()
        .or_else(|| config.form_type.clone())
        .or(header.form_type)
        .ok_or_else(|| AppError::Processing(format!("No form type known for {}", entry.path.display())))?;

    let filing_date = match &entry.filing_date {
        Some(raw) => parse_filing_date(raw)?,
        None => config
            .filing_date
            .or(header.filing_date)
            .ok_or_else(|| AppError::Processing(format!("No filing date known for {}", entry.path.display())))?,
    };

    let filename = entry
        .path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| entry.path.display().to_string());

    Ok(FilingMetadata::new(form_type, filing_date, filename))
}

fn process_document(
    entry: &ManifestEntry,
    extractor: &ItemExtractor,
    storage: &StorageManager,
    config: &BatchConfig,
) -> Result<DocumentStatus, AppError> {
    let bytes = fs::read(&entry.path)?;
    let raw = RawDocument::from_bytes(&bytes);
    if raw.is_empty() {
        tracing::warn!("{} is empty", entry.path.display());
    }
    let metadata = resolve_metadata(entry, raw.as_str(), config)?;

    let outcome = extractor.extract(&metadata, &raw)?;
    let stem = StorageManager::stem_for(&metadata.filename);

    if config.debug {
        let normalized = normalize(&raw);
        let debug_path = storage.base_dir().join(format!("{}_annotated.html", stem));
        if let Err(e) = html_debug::create_debug_html(&normalized.text, &debug_path, outcome.grammar) {
            tracing::warn!("Failed to create debug HTML: {}", e);
        }
    }

    storage.save_report(&stem, &metadata, &outcome)?;
    match &outcome.result {
        Some(result) => {
            storage.save_result(&stem, result)?;
            Ok(DocumentStatus::Extracted)
        }
        None => Ok(DocumentStatus::Empty),
    }
}

/// Extracts every entry, at most `config.jobs` at a time. Per-document failures are
/// logged and counted; only a broken worker aborts the batch.
pub async fn run_batch(
    entries: Vec<ManifestEntry>,
    extractor: Arc<ItemExtractor>,
    storage: Arc<StorageManager>,
    config: BatchConfig,
) -> Result<BatchSummary, AppError> {
    let config = Arc::new(config);
    let semaphore = Arc::new(Semaphore::new(config.jobs.max(1)));
    let mut handles = Vec::with_capacity(entries.len());

    tracing::info!("Processing {} documents with {} workers", entries.len(), config.jobs.max(1));

    for entry in entries {
        let permit = semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| AppError::Processing(format!("Worker pool closed: {}", e)))?;
        let extractor = Arc::clone(&extractor);
        let storage = Arc::clone(&storage);
        let config = Arc::clone(&config);

        handles.push(tokio::task::spawn_blocking(move || {
            let _permit = permit;
            let status = process_document(&entry, &extractor, &storage, &config);
            (entry.path, status)
        }));
    }

    let mut summary = BatchSummary::default();
    for handle in handles {
        let (path, status) = handle.await?;
        summary.processed += 1;
        match status {
            Ok(DocumentStatus::Extracted) => summary.extracted += 1,
            Ok(DocumentStatus::Empty) => summary.empty += 1,
            Err(e) => {
                tracing::error!("Failed to process {}: {}", path.display(), e);
                summary.failed += 1;
            }
        }
    }

    tracing::info!(
        "Batch complete: {} processed, {} extracted, {} empty, {} failed",
        summary.processed,
        summary.extracted,
        summary.empty,
        summary.failed
    );
    Ok(summary)
}
