// src/extractors/diagnostics.rs
use serde::Serialize;
use std::fmt;

/// Non-fatal, low-confidence signals raised while extracting one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// Sub-documents were present but none was a 10-x/8-x report; the whole payload was used.
    NoDocumentFound,
    /// Part I had no text of its own and was rebuilt from everything before Part II.
    PartOneReconstructed,
    /// Part I ended far from where Part II starts; Part I was widened to meet it.
    PartGapCorrected { gap: usize },
    /// Retrying with skipped part anchors did not fix the Part I/II length imbalance.
    PartSeparationAmbiguous { imbalance: usize, retries: usize },
    /// Every requested section came out empty.
    EmptyExtraction,
}

impl Diagnostic {
    /// Emits the diagnostic to the log and hands it back.
    pub fn report(self, filename: &str) -> Self {
        tracing::warn!("{} - {}", filename, self);
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::NoDocumentFound => f.write_str("No report document found, parsing the whole payload"),
            Diagnostic::PartOneReconstructed => {
                f.write_str("No PART I found, using all text before PART II as PART I")
            }
            Diagnostic::PartGapCorrected { gap } => write!(
                f,
                "End of PART I is {} chars from start of PART II, extracting all text between the two parts",
                gap
            ),
            Diagnostic::PartSeparationAmbiguous { imbalance, retries } => write!(
                f,
                "Could not separate PARTs correctly after {} retries (PART II longer by {} chars), likely PART I contains just ToC content",
                retries, imbalance
            ),
            Diagnostic::EmptyExtraction => f.write_str("Could not extract any item"),
        }
    }
}
