// src/extractors/grammar.rs

//! Which sections a form type is made of, and how each section's header looks in text.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use std::fmt;

use crate::edgar::models::FormType;
use crate::utils::error::ExtractError;

const ITEMS_10K: &[&str] = &[
    "1", "1A", "1B", "1C", "2", "3", "4", "5", "6", "7", "7A", "8", "9", "9A", "9B", "9C", "10", "11", "12",
    "13", "14", "15", "16", "SIGNATURE",
];

const ITEMS_10Q: &[&str] = &[
    "part_1__1", "part_1__2", "part_1__3", "part_1__4", "part_2__1", "part_2__1A", "part_2__2", "part_2__3",
    "part_2__4", "part_2__5", "part_2__6", "SIGNATURE",
];

const ITEMS_8K: &[&str] = &[
    "1.01", "1.02", "1.03", "1.04", "1.05", "2.01", "2.02", "2.03", "2.04", "2.05", "2.06", "3.01", "3.02",
    "3.03", "4.01", "4.02", "5.01", "5.02", "5.03", "5.04", "5.05", "5.06", "5.07", "5.08", "6.01", "6.02",
    "6.03", "6.04", "6.05", "7.01", "8.01", "9.01", "SIGNATURE",
];

// Numbering used before the 2004 overhaul of Form 8-K
const ITEMS_8K_LEGACY: &[&str] = &["1", "2", "3", "4", "5", "6", "7", "8", "9", "10", "11", "12", "SIGNATURE"];

const WHOLE_DOCUMENT: &[&str] = &["content"];

/// 8-K filings made on or before this date use the legacy item numbering.
pub static EIGHT_K_CUTOFF: Lazy<NaiveDate> =
    Lazy::new(|| NaiveDate::from_ymd_opt(2004, 8, 23).unwrap_or(NaiveDate::MIN));

const ROMAN_NUMERALS: [&str; 20] = [
    "I", "II", "III", "IV", "V", "VI", "VII", "VIII", "IX", "X", "XI", "XII", "XIII", "XIV", "XV", "XVI", "XVII",
    "XVIII", "XIX", "XX",
];

fn roman(number: &str) -> Option<&'static str> {
    let n: usize = number.parse().ok()?;
    ROMAN_NUMERALS.get(n.checked_sub(1)?).copied()
}

/// The closed set of section layouts the engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Grammar {
    AnnualReport,
    QuarterlyReport,
    CurrentReport,
    CurrentReportLegacy,
    /// No segmentation, the whole document is one `content` section.
    WholeDocument,
}

impl Grammar {
    /// Total over every (form type, date) pair.
    pub fn select(form_type: &FormType, filing_date: NaiveDate) -> Self {
        match form_type {
            FormType::TenK => Grammar::AnnualReport,
            FormType::TenQ => Grammar::QuarterlyReport,
            FormType::EightK if filing_date > *EIGHT_K_CUTOFF => Grammar::CurrentReport,
            FormType::EightK => Grammar::CurrentReportLegacy,
            FormType::Other(_) => Grammar::WholeDocument,
        }
    }

    fn table(self) -> &'static [&'static str] {
        match self {
            Grammar::AnnualReport => ITEMS_10K,
            Grammar::QuarterlyReport => ITEMS_10Q,
            Grammar::CurrentReport => ITEMS_8K,
            Grammar::CurrentReportLegacy => ITEMS_8K_LEGACY,
            Grammar::WholeDocument => WHOLE_DOCUMENT,
        }
    }

    /// Raw identifiers in grammar order (`"1A"`, `"part_2__1A"`, `"SIGNATURE"`).
    pub fn raw_ids(self) -> &'static [&'static str] {
        self.table()
    }

    pub fn ids(self) -> Vec<SectionId> {
        self.table().iter().map(|raw| SectionId::parse(raw)).collect()
    }

    pub fn is_segmented(self) -> bool {
        self != Grammar::WholeDocument
    }

    /// Grammars whose items are numbered per part (10-Q).
    pub fn has_parts(self) -> bool {
        self == Grammar::QuarterlyReport
    }

    /// Part-level ids in order of first appearance, followed by SIGNATURE.
    pub fn part_ids(self) -> Vec<SectionId> {
        let mut parts: Vec<SectionId> = Vec::new();
        for id in self.ids() {
            let part_level = match id {
                SectionId::PartItem { part, .. } => SectionId::Part(part),
                other => other,
            };
            if !parts.contains(&part_level) {
                parts.push(part_level);
            }
        }
        parts
    }

    /// Intersects the caller's requested ids with this grammar.
    /// An empty request means every id; an empty intersection is a hard error.
    pub fn requested(self, form_type: &FormType, requested: &[String]) -> Result<Vec<SectionId>, ExtractError> {
        if requested.is_empty() {
            return Ok(self.ids());
        }

        let selected: Vec<SectionId> = self
            .table()
            .iter()
            .filter(|raw| requested.iter().any(|r| r == *raw))
            .map(|raw| SectionId::parse(raw))
            .collect();

        if selected.is_empty() {
            return Err(ExtractError::GrammarMismatch {
                form_type: form_type.to_string(),
                requested: requested.to_vec(),
            });
        }
        Ok(selected)
    }
}

/// One entry of a grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionId {
    /// `item_<id>` for single-part forms, e.g. "1A" or "5.02".
    Item(&'static str),
    /// An item namespaced by part, e.g. part 2 item "1A".
    PartItem { part: u8, item: &'static str },
    /// A whole part, used while separating 10-Q parts.
    Part(u8),
    Signature,
    WholeDocument,
}

impl SectionId {
    pub fn parse(raw: &'static str) -> Self {
        match raw {
            "SIGNATURE" => return SectionId::Signature,
            "content" => return SectionId::WholeDocument,
            _ => {}
        }
        if let Some(rest) = raw.strip_prefix("part_") {
            if let Some((part, item)) = rest.split_once("__") {
                if let Ok(part) = part.parse() {
                    return SectionId::PartItem { part, item };
                }
            } else if let Ok(part) = rest.parse() {
                return SectionId::Part(part);
            }
        }
        SectionId::Item(raw)
    }

    /// Part this id is scoped to, if any.
    pub fn part(&self) -> Option<u8> {
        match self {
            SectionId::PartItem { part, .. } | SectionId::Part(part) => Some(*part),
            _ => None,
        }
    }

    pub fn part_key(part: u8) -> String {
        format!("part_{}", part)
    }

    /// Key under which the section lands in the extraction result.
    pub fn result_key(&self) -> String {
        match self {
            SectionId::Item(item) => format!("item_{}", item),
            SectionId::PartItem { part, item } => format!("part_{}_item_{}", part, item),
            SectionId::Part(part) => Self::part_key(*part),
            SectionId::Signature => "SIGNATURE".to_string(),
            SectionId::WholeDocument => "content".to_string(),
        }
    }

    /// Regex fragment matching this section's header keyword and identifier.
    pub fn anchor_pattern(&self) -> String {
        match self {
            SectionId::Part(part) => {
                let number = part.to_string();
                match roman(&number) {
                    Some(numeral) => format!(r"PART\s*(?:{}|{})", numeral, number),
                    None => format!(r"PART\s*{}", number),
                }
            }
            SectionId::Signature => r"SIGNATURE(?:[Ss]|\([Ss]\))?".to_string(),
            SectionId::Item(item) | SectionId::PartItem { item, .. } => format!(r"ITEMS?\s*{}", item_pattern(item)),
            // Never searched for; matches nothing
            SectionId::WholeDocument => r"[^\s\S]".to_string(),
        }
    }
}

fn item_pattern(item: &str) -> String {
    if let Some(numeral) = roman(item) {
        // Rarely, reports number items with Roman numerals
        return format!("(?:{}|{})", numeral, item);
    }
    if item == "9A" {
        return r"9[^\S\r\n]*A(?:\(T\))?".to_string();
    }
    if let Some(number) = item.strip_suffix(&['A', 'B', 'C'][..]) {
        let suffix = &item[number.len()..];
        return format!(r"{}[^\S\r\n]*{}", regex::escape(number), suffix);
    }
    regex::escape(item)
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SectionId::Item(item) => f.write_str(item),
            SectionId::PartItem { part, item } => write!(f, "part_{}__{}", part, item),
            SectionId::Part(part) => write!(f, "part_{}", part),
            SectionId::Signature => f.write_str("SIGNATURE"),
            SectionId::WholeDocument => f.write_str("content"),
        }
    }
}
