// src/edgar/mod.rs
pub mod document;
pub mod header;
pub mod models;

pub use document::{DocumentSelection, RawDocument};
pub use header::{parse_submission_header, SubmissionHeader};
pub use models::{parse_filing_date, FilingMetadata, FormType};
