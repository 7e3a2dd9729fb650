// src/edgar/models.rs
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::utils::error::ExtractError;

/// Form types the engine knows how to segment. Anything else is carried through
/// verbatim and extracted as a single `content` section.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FormType {
    TenK,
    TenQ,
    EightK,
    Other(String),
}

impl FormType {
    pub fn as_str(&self) -> &str {
        match self {
            FormType::TenK => "10-K",
            FormType::TenQ => "10-Q",
            FormType::EightK => "8-K",
            FormType::Other(name) => name,
        }
    }
}

impl FromStr for FormType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let form = match s.trim() {
            "10-K" => FormType::TenK,
            "10-Q" => FormType::TenQ,
            "8-K" => FormType::EightK,
            other => FormType::Other(other.to_string()),
        };
        Ok(form)
    }
}

impl From<&str> for FormType {
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(form) => form,
            Err(never) => match never {},
        }
    }
}

impl fmt::Display for FormType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for FormType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FormType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(FormType::from(raw.as_str()))
    }
}

/// Metadata supplied alongside each document. Immutable for the whole extraction call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilingMetadata {
    pub form_type: FormType,
    pub filing_date: NaiveDate,
    pub filename: String,
}

impl FilingMetadata {
    pub fn new(form_type: impl Into<FormType>, filing_date: NaiveDate, filename: impl Into<String>) -> Self {
        Self {
            form_type: form_type.into(),
            filing_date,
            filename: filename.into(),
        }
    }

    /// Output form of the filing date (`YYYY-MM-DD`).
    pub fn filing_date_string(&self) -> String {
        self.filing_date.format("%Y-%m-%d").to_string()
    }
}

/// Parses the two date shapes found around EDGAR: `2004-08-23` and `20040823`.
pub fn parse_filing_date(raw: &str) -> Result<NaiveDate, ExtractError> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y%m%d"))
        .map_err(|_| ExtractError::InvalidDate(raw.to_string()))
}
