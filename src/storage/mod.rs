// src/storage/mod.rs
use std::fs;
use std::path::{Path, PathBuf};

use crate::edgar::FilingMetadata;
use crate::extractors::{ExtractionOutcome, ExtractionResult};
use crate::utils::error::StorageError;

pub struct StorageManager {
    base_dir: PathBuf,
    overwrite: bool,
}

impl StorageManager {
    /// Creates a new StorageManager with the specified base directory
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self, StorageError> {
        let base_path = base_dir.as_ref().to_path_buf();

        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(StorageError::IoError)?;
        }

        Ok(Self {
            base_dir: base_path,
            overwrite: true,
        })
    }

    /// When disabled, saving over an existing output file fails with `FileExists`.
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Output stem for an input file: its file name without the final extension.
    pub fn stem_for(filename: &str) -> String {
        Path::new(filename)
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| filename.to_string())
    }

    fn target(&self, file_name: String) -> Result<PathBuf, StorageError> {
        let file_path = self.base_dir.join(file_name);
        if !self.overwrite && file_path.exists() {
            return Err(StorageError::FileExists(file_path.display().to_string()));
        }
        Ok(file_path)
    }

    fn write_json(&self, file_path: &Path, value: &impl serde::Serialize) -> Result<(), StorageError> {
        let json = serde_json::to_string_pretty(value).map_err(|e| StorageError::SerializationError(e.to_string()))?;
        fs::write(file_path, json).map_err(StorageError::IoError)
    }

    /// Saves the extraction result as `<stem>.json`
    pub fn save_result(&self, stem: &str, result: &ExtractionResult) -> Result<PathBuf, StorageError> {
        let file_path = self.target(format!("{}.json", stem))?;
        self.write_json(&file_path, result)?;

        tracing::info!("Saved result to {}", file_path.display());
        Ok(file_path)
    }

    /// Saves diagnostics and section sizes of one extraction as `<stem>_report.json`
    pub fn save_report(
        &self,
        stem: &str,
        metadata: &FilingMetadata,
        outcome: &ExtractionOutcome,
    ) -> Result<PathBuf, StorageError> {
        let file_path = self.target(format!("{}_report.json", stem))?;

        let section_lengths: serde_json::Map<String, serde_json::Value> = outcome
            .result
            .iter()
            .flat_map(|result| result.sections())
            .map(|(key, text)| (key.to_string(), serde_json::Value::from(text.chars().count())))
            .collect();

        let report = serde_json::json!({
            "filename": metadata.filename,
            "form_type": metadata.form_type,
            "filing_date": metadata.filing_date_string(),
            "grammar": format!("{:?}", outcome.grammar),
            "is_html": outcome.is_html,
            "document_type": outcome.document_type,
            "extracted": outcome.result.is_some(),
            "diagnostics": outcome.diagnostics,
            "section_lengths": section_lengths,
            "extraction_timestamp": chrono::Utc::now().to_rfc3339(),
        });
        self.write_json(&file_path, &report)?;

        tracing::debug!("Saved report to {}", file_path.display());
        Ok(file_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExtractOptions;
    use crate::edgar::RawDocument;
    use crate::extractors::{Diagnostic, ItemExtractor};
    use chrono::NaiveDate;

    fn outcome(text: &str) -> (FilingMetadata, ExtractionOutcome) {
        let metadata = FilingMetadata::new("10-K", NaiveDate::from_ymd_opt(2021, 3, 1).unwrap(), "acme-10k.htm");
        let extractor = ItemExtractor::new(ExtractOptions::default().with_items(["1"]));
        let outcome = extractor.extract(&metadata, &RawDocument::from(text)).unwrap();
        (metadata, outcome)
    }

    #[test]
    fn test_stem_for() {
        assert_eq!(StorageManager::stem_for("0000320193-21-000010.txt"), "0000320193-21-000010");
        assert_eq!(StorageManager::stem_for("dir/report.htm"), "report");
    }

    #[test]
    fn test_save_result_and_report() {
        let dir = tempfile::tempdir().unwrap();
        let storage = StorageManager::new(dir.path().join("out")).unwrap();
        let (metadata, outcome) = outcome("ITEM 1. Business\nWidgets.\nITEM 2. Properties\nPlant");

        let result_path = storage.save_result("acme-10k", outcome.result.as_ref().unwrap()).unwrap();
        let saved: serde_json::Value = serde_json::from_str(&fs::read_to_string(&result_path).unwrap()).unwrap();
        assert_eq!(saved["item_1"], "Business\nWidgets.");
        assert_eq!(saved["filename"], "acme-10k.htm");

        let report_path = storage.save_report("acme-10k", &metadata, &outcome).unwrap();
        assert!(report_path.ends_with("acme-10k_report.json"));
        let report: serde_json::Value = serde_json::from_str(&fs::read_to_string(&report_path).unwrap()).unwrap();
        assert_eq!(report["form_type"], "10-K");
        assert_eq!(report["extracted"], true);
        assert_eq!(report["section_lengths"]["item_1"], 17);
        assert!(report["document_type"].is_null());
    }

    #[test]
    fn test_report_names_selected_sub_document() {
        let dir = tempfile::tempdir().unwrap();
        let storage = StorageManager::new(dir.path()).unwrap();
        let (metadata, outcome) = outcome(
            "<DOCUMENT>\n<TYPE>EX-21\n<TEXT>\nSubsidiaries\n</TEXT>\n</DOCUMENT>\n\
             <DOCUMENT>\n<TYPE>10-K\n<TEXT>\nITEM 1. Business\nWidgets.\nITEM 2. Properties\nPlant\n</TEXT>\n</DOCUMENT>",
        );
        assert_eq!(outcome.document_type.as_deref(), Some("10-K"));

        let report_path = storage.save_report("acme-10k", &metadata, &outcome).unwrap();
        let report: serde_json::Value = serde_json::from_str(&fs::read_to_string(&report_path).unwrap()).unwrap();
        assert_eq!(report["document_type"], "10-K");
        assert_eq!(report["extracted"], true);
    }

    #[test]
    fn test_report_carries_diagnostics() {
        let dir = tempfile::tempdir().unwrap();
        let storage = StorageManager::new(dir.path()).unwrap();
        let (metadata, outcome) = outcome("No headers at all.");
        assert_eq!(outcome.diagnostics, vec![Diagnostic::EmptyExtraction]);

        let report_path = storage.save_report("empty", &metadata, &outcome).unwrap();
        let report: serde_json::Value = serde_json::from_str(&fs::read_to_string(&report_path).unwrap()).unwrap();
        assert_eq!(report["extracted"], false);
        assert_eq!(report["diagnostics"][0]["kind"], "empty_extraction");
    }

    #[test]
    fn test_refuses_to_overwrite_when_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let storage = StorageManager::new(dir.path()).unwrap().with_overwrite(false);
        let (_, outcome) = outcome("ITEM 1. Business\nWidgets.");
        let result = outcome.result.unwrap();

        storage.save_result("acme", &result).unwrap();
        let err = storage.save_result("acme", &result).unwrap_err();
        assert!(matches!(err, StorageError::FileExists(_)));
    }
}
