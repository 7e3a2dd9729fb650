// src/extractors/assemble.rs

//! Drives one extraction call end to end and builds the ordered result mapping.

use serde::ser::{Serialize, SerializeMap, Serializer};
use std::sync::atomic::{AtomicUsize, Ordering};

use super::diagnostics::Diagnostic;
use super::grammar::{Grammar, SectionId};
use super::locator::{locate, ConsumedPositions};
use super::normalize::{collapse_whitespace, normalize};
use super::parts::separate_parts;
use crate::config::{ExtractOptions, PartSeparationConfig};
use crate::edgar::{FilingMetadata, RawDocument};
use crate::utils::error::ExtractError;

/// Ordered section texts of one filing plus its identifying metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionResult {
    pub filing_date: String,
    pub filename: String,
    sections: Vec<(String, String)>,
}

impl ExtractionResult {
    fn new(metadata: &FilingMetadata) -> Self {
        Self {
            filing_date: metadata.filing_date_string(),
            filename: metadata.filename.clone(),
            sections: Vec::new(),
        }
    }

    fn insert(&mut self, key: String, text: String) {
        match self.sections.iter_mut().find(|(existing, _)| *existing == key) {
            Some(entry) => entry.1 = text,
            None => self.sections.push((key, text)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.sections
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, text)| text.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Section keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|(key, _)| key.as_str())
    }

    pub fn sections(&self) -> impl Iterator<Item = (&str, &str)> {
        self.sections.iter().map(|(key, text)| (key.as_str(), text.as_str()))
    }
}

impl Serialize for ExtractionResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.sections.len() + 2))?;
        map.serialize_entry("filing_date", &self.filing_date)?;
        map.serialize_entry("filename", &self.filename)?;
        for (key, text) in &self.sections {
            map.serialize_entry(key, text)?;
        }
        map.end()
    }
}

/// What one call produced: the result (absent on empty extraction) and every diagnostic raised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionOutcome {
    pub result: Option<ExtractionResult>,
    pub diagnostics: Vec<Diagnostic>,
    pub grammar: Grammar,
    pub is_html: bool,
    /// `<TYPE>` of the sub-document that was scanned, for wrapped submissions.
    pub document_type: Option<String>,
}

/// Running totals across every call made through one extractor.
#[derive(Debug, Default)]
pub struct ScanStats {
    documents: AtomicUsize,
    locator_calls: AtomicUsize,
}

impl ScanStats {
    pub fn documents(&self) -> usize {
        self.documents.load(Ordering::Relaxed)
    }

    pub fn locator_calls(&self) -> usize {
        self.locator_calls.load(Ordering::Relaxed)
    }
}

/// The extraction engine. Holds options only; every call owns its own scan state, so
/// one extractor can be shared across worker threads.
#[derive(Debug, Default)]
pub struct ItemExtractor {
    options: ExtractOptions,
    parts_config: PartSeparationConfig,
    stats: ScanStats,
}

impl ItemExtractor {
    pub fn new(options: ExtractOptions) -> Self {
        Self {
            options,
            parts_config: PartSeparationConfig::default(),
            stats: ScanStats::default(),
        }
    }

    pub fn with_part_config(mut self, config: PartSeparationConfig) -> Self {
        self.parts_config = config;
        self
    }

    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    pub fn stats(&self) -> &ScanStats {
        &self.stats
    }

    /// Segments `raw` into the sections of `metadata.form_type`.
    ///
    /// Fails only when the requested ids do not intersect the form's grammar, which is
    /// checked before the document is touched. Malformed documents degrade to
    /// best-effort output plus diagnostics.
    pub fn extract(&self, metadata: &FilingMetadata, raw: &RawDocument) -> Result<ExtractionOutcome, ExtractError> {
        let grammar = Grammar::select(&metadata.form_type, metadata.filing_date);
        let requested = grammar.requested(&metadata.form_type, &self.options.items)?;

        self.stats.documents.fetch_add(1, Ordering::Relaxed);
        tracing::info!(
            "Extracting {} ({} filed {}, {:?}, {} bytes)",
            metadata.filename,
            metadata.form_type,
            metadata.filing_date_string(),
            grammar,
            raw.len()
        );

        let normalized = normalize(raw);
        let mut diagnostics = Vec::new();
        if normalized.document_missing {
            diagnostics.push(Diagnostic::NoDocumentFound.report(&metadata.filename));
        }

        let mut result = ExtractionResult::new(metadata);
        if !grammar.is_segmented() {
            result.insert(SectionId::WholeDocument.result_key(), normalized.text);
            return Ok(ExtractionOutcome {
                result: Some(result),
                diagnostics,
                grammar,
                is_html: normalized.is_html,
                document_type: normalized.document_type,
            });
        }

        let any_content = if grammar.has_parts() {
            self.extract_by_part(&normalized.text, grammar, &requested, &mut result, &mut diagnostics, metadata)
        } else {
            self.extract_flat(&normalized.text, grammar, &requested, &mut result)
        };

        let result = if any_content {
            tracing::info!("Extracted {} sections from {}", result.sections.len(), metadata.filename);
            Some(result)
        } else {
            diagnostics.push(Diagnostic::EmptyExtraction.report(&metadata.filename));
            None
        };

        Ok(ExtractionOutcome {
            result,
            diagnostics,
            grammar,
            is_html: normalized.is_html,
            document_type: normalized.document_type,
        })
    }

    /// Records `text` under `id` if it was requested; returns whether it had content.
    fn emit(&self, id: &SectionId, text: &str, requested: &[SectionId], result: &mut ExtractionResult) -> bool {
        if !requested.contains(id) {
            return false;
        }
        let text = collapse_whitespace(text);
        let has_content = !text.is_empty();
        if *id != SectionId::Signature || self.options.include_signature {
            result.insert(id.result_key(), text);
        }
        has_content
    }

    fn extract_flat(
        &self,
        text: &str,
        grammar: Grammar,
        requested: &[SectionId],
        result: &mut ExtractionResult,
    ) -> bool {
        let ids = grammar.ids();
        let mut consumed = ConsumedPositions::new();
        let mut any_content = false;

        // Every id is located, requested or not, so that omitted ids still bound their neighbours
        for (i, id) in ids.iter().enumerate() {
            self.stats.locator_calls.fetch_add(1, Ordering::Relaxed);
            let located = locate(text, id, &ids[i + 1..], consumed, 0);
            consumed = located.consumed;
            any_content |= self.emit(id, &located.text, requested, result);
        }
        any_content
    }

    fn extract_by_part(
        &self,
        text: &str,
        grammar: Grammar,
        requested: &[SectionId],
        result: &mut ExtractionResult,
        diagnostics: &mut Vec<Diagnostic>,
        metadata: &FilingMetadata,
    ) -> bool {
        self.stats.locator_calls.fetch_add(1, Ordering::Relaxed);
        let parts = separate_parts(text, &grammar.part_ids(), &self.parts_config);
        diagnostics.extend(
            parts
                .diagnostics
                .iter()
                .cloned()
                .map(|diagnostic| diagnostic.report(&metadata.filename)),
        );

        let ids = grammar.ids();
        let mut consumed = ConsumedPositions::new();
        let mut current_part: Option<u8> = None;
        let mut any_content = false;

        for (i, id) in ids.iter().enumerate() {
            let section = match id {
                SectionId::PartItem { part, .. } => {
                    let part_id = SectionId::Part(*part);
                    let part_text = parts.text(&part_id);
                    if current_part != Some(*part) {
                        // Positions are per part; item numbers restart
                        consumed = ConsumedPositions::new();
                        current_part = Some(*part);
                        result.insert(part_id.result_key(), collapse_whitespace(part_text));
                    }
                    self.stats.locator_calls.fetch_add(1, Ordering::Relaxed);
                    let located = locate(part_text, id, &ids[i + 1..], consumed, 0);
                    consumed = located.consumed;
                    located.text
                }
                other => parts.text(other).to_string(),
            };
            any_content |= self.emit(id, &section, requested, result);
        }
        any_content
    }
}
