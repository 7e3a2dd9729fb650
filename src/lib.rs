// src/lib.rs

//! Segments regulatory filings (10-K, 10-Q, 8-K) into their numbered disclosure sections.
//!
//! ```no_run
//! use chrono::NaiveDate;
//! use filing_items::{ExtractOptions, FilingMetadata, ItemExtractor, RawDocument};
//!
//! let extractor = ItemExtractor::new(ExtractOptions::default());
//! let metadata = FilingMetadata::new("10-K", NaiveDate::from_ymd_opt(2021, 3, 1).unwrap(), "acme.txt");
//! let outcome = extractor.extract(&metadata, &RawDocument::from("ITEM 1. Business\n...")).unwrap();
//! if let Some(result) = outcome.result {
//!     println!("{}", serde_json::to_string_pretty(&result).unwrap());
//! }
//! ```

pub mod batch;
pub mod config;
pub mod edgar;
pub mod extractors;
pub mod storage;
pub mod utils;

pub use config::{ExtractOptions, PartSeparationConfig};
pub use edgar::{FilingMetadata, FormType, RawDocument};
pub use extractors::{Diagnostic, ExtractionOutcome, ExtractionResult, Grammar, ItemExtractor};
pub use utils::error::{AppError, ExtractError, StorageError};
