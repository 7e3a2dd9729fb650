// src/edgar/header.rs
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use super::models::{parse_filing_date, FormType};

static SUBMISSION_TYPE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[^\S\r\n]*CONFORMED SUBMISSION TYPE:[^\S\r\n]*([^\r\n]+?)[^\S\r\n]*$")
        .expect("Failed to compile SUBMISSION_TYPE_RE")
});

static FILED_AS_OF_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[^\S\r\n]*FILED AS OF DATE:[^\S\r\n]*(\d{8})")
        .expect("Failed to compile FILED_AS_OF_RE")
});

/// The few fields of an SGML submission header needed to describe a filing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SubmissionHeader {
    pub form_type: Option<FormType>,
    pub filing_date: Option<NaiveDate>,
}

/// Reads `CONFORMED SUBMISSION TYPE` / `FILED AS OF DATE` from a full submission text file.
/// Only the part before the first `<DOCUMENT>` is searched.
pub fn parse_submission_header(content: &str) -> SubmissionHeader {
    let header = match content.find("<DOCUMENT>") {
        Some(end) => &content[..end],
        None => content,
    };

    let form_type = SUBMISSION_TYPE_RE
        .captures(header)
        .and_then(|caps| caps.get(1))
        .map(|m| FormType::from(m.as_str()));

    let filing_date = FILED_AS_OF_RE
        .captures(header)
        .and_then(|caps| caps.get(1))
        .and_then(|m| match parse_filing_date(m.as_str()) {
            Ok(date) => Some(date),
            Err(e) => {
                tracing::warn!("Ignoring malformed header date: {}", e);
                None
            }
        });

    SubmissionHeader { form_type, filing_date }
}
