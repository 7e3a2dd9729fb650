// src/config.rs

//! Engine tunables and per-call options.
//!
//! Defaults are the values downstream consumers expect; the environment can override
//! the part separation thresholds for experiments on difficult filing sets.

use crate::utils::error::AppError;

pub const GAP_SLACK_VAR: &str = "FILING_ITEMS_GAP_SLACK";
pub const IMBALANCE_SLACK_VAR: &str = "FILING_ITEMS_IMBALANCE_SLACK";
pub const MAX_RETRIES_VAR: &str = "FILING_ITEMS_MAX_RETRIES";
pub const JOBS_VAR: &str = "FILING_ITEMS_JOBS";

/// Thresholds of the 10-Q part separation heuristics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartSeparationConfig {
    /// Max characters between the end of Part I and the start of Part II before
    /// Part I is assumed to have matched inside a table of contents.
    pub gap_slack: usize,
    /// Max characters Part II may exceed Part I by before retrying with skipped anchors.
    pub imbalance_slack: usize,
    /// Hard cap on skip retries.
    pub max_retries: usize,
}

impl Default for PartSeparationConfig {
    fn default() -> Self {
        Self {
            gap_slack: 200,
            imbalance_slack: 5_000,
            max_retries: 10,
        }
    }
}

impl PartSeparationConfig {
    /// Defaults, overridden by any of the `FILING_ITEMS_*` variables that are set.
    pub fn from_env() -> Result<Self, AppError> {
        let defaults = Self::default();
        Ok(Self {
            gap_slack: parse_env_var(GAP_SLACK_VAR)?.unwrap_or(defaults.gap_slack),
            imbalance_slack: parse_env_var(IMBALANCE_SLACK_VAR)?.unwrap_or(defaults.imbalance_slack),
            max_retries: parse_env_var(MAX_RETRIES_VAR)?.unwrap_or(defaults.max_retries),
        })
    }
}

/// What the caller wants out of one extraction call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Subset of grammar ids to emit; empty means all of them.
    pub items: Vec<String>,
    pub include_signature: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            include_signature: true,
        }
    }
}

impl ExtractOptions {
    pub fn with_items<I, S>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.items = items.into_iter().map(Into::into).collect();
        self
    }

    pub fn without_signature(mut self) -> Self {
        self.include_signature = false;
        self
    }
}

/// Worker count: explicit value, then `FILING_ITEMS_JOBS`, then available cores.
pub fn resolve_jobs(explicit: Option<usize>) -> Result<usize, AppError> {
    if let Some(jobs) = explicit {
        return Ok(jobs.max(1));
    }
    if let Some(jobs) = parse_env_var::<usize>(JOBS_VAR)? {
        return Ok(jobs.max(1));
    }
    Ok(std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1))
}

fn parse_env_var<T: std::str::FromStr>(name: &str) -> Result<Option<T>, AppError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| AppError::Config(format!("Invalid value '{}' for {}: {}", value, name, e))),
        Err(_) => Ok(None),
    }
}
