// src/extractors/mod.rs
pub mod assemble;
pub mod diagnostics;
pub mod grammar;
pub mod locator;
pub mod normalize;
pub mod parts;

// Re-export key extraction types for convenience
pub use assemble::{ExtractionOutcome, ExtractionResult, ItemExtractor, ScanStats};
pub use diagnostics::Diagnostic;
pub use grammar::{Grammar, SectionId};
pub use locator::{locate, ConsumedPositions, Located, SectionSpan};
pub use normalize::{normalize, NormalizedDocument};
pub use parts::{separate_parts, SeparatedParts};
