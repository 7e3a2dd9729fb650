// src/extractors/parts.rs

//! Splits a quarterly report into Part I / Part II / SIGNATURE before items are located.
//!
//! 10-Q item numbers restart in every part, so items are only ever searched inside the
//! text of their own part. Getting the part boundaries right is the hard bit: many
//! filings reproduce "PART I ... PART II" inside a table of contents, which makes the
//! plain longest-span rule pick a tiny Part I and a Part II that swallows everything.
//! Three corrections are applied on top of the plain scan (see [`separate_parts`]).

use super::diagnostics::Diagnostic;
use super::grammar::SectionId;
use super::locator::{locate, ConsumedPositions, SectionSpan};
use crate::config::PartSeparationConfig;

/// One part-level section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartSection {
    pub id: SectionId,
    pub text: String,
    pub span: Option<SectionSpan>,
}

/// Final part split plus whatever corrections were needed to get there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeparatedParts {
    pub sections: Vec<PartSection>,
    pub diagnostics: Vec<Diagnostic>,
}

impl SeparatedParts {
    pub fn text(&self, id: &SectionId) -> &str {
        self.sections
            .iter()
            .find(|section| section.id == *id)
            .map(|section| section.text.as_str())
            .unwrap_or("")
    }
}

#[derive(Debug, Clone)]
struct PartPass {
    sections: Vec<PartSection>,
    diagnostics: Vec<Diagnostic>,
}

impl PartPass {
    fn scan(text: &str, part_ids: &[SectionId], skip: usize) -> Self {
        let mut consumed = ConsumedPositions::new();
        let mut sections = Vec::with_capacity(part_ids.len());
        for (i, id) in part_ids.iter().enumerate() {
            let located = locate(text, id, &part_ids[i + 1..], consumed, skip);
            consumed = located.consumed;
            sections.push(PartSection {
                id: *id,
                text: located.text,
                span: located.span,
            });
        }
        Self {
            sections,
            diagnostics: Vec::new(),
        }
    }

    /// Indices of the first two part sections (Part I, Part II).
    fn first_two_parts(&self) -> Option<(usize, usize)> {
        let mut parts = self
            .sections
            .iter()
            .enumerate()
            .filter(|(_, section)| matches!(section.id, SectionId::Part(_)))
            .map(|(i, _)| i);
        Some((parts.next()?, parts.next()?))
    }

    fn correct(&mut self, text: &str, config: &PartSeparationConfig) {
        let Some((first, second)) = self.first_two_parts() else { return };
        let Some(second_span) = self.sections[second].span else { return };

        if self.sections[first].text.trim().is_empty() {
            self.sections[first].text = text[..second_span.start].to_string();
            self.sections[first].span = Some(SectionSpan {
                start: 0,
                content_start: 0,
                content_end: second_span.start,
                to_end: false,
            });
            self.diagnostics.push(Diagnostic::PartOneReconstructed);
            return;
        }

        let Some(first_span) = self.sections[first].span else { return };
        if first_span.to_end || second_span.start <= first_span.content_end {
            return;
        }
        let gap = text[first_span.content_end..second_span.start].chars().count();
        if gap > config.gap_slack {
            // Part I most likely matched inside the table of contents
            self.sections[first].text = text[first_span.content_start..second_span.start].to_string();
            self.sections[first].span = Some(SectionSpan {
                content_end: second_span.start,
                ..first_span
            });
            self.diagnostics.push(Diagnostic::PartGapCorrected { gap });
        }
    }

    /// How many characters Part II exceeds Part I by (negative when Part I is longer).
    fn imbalance(&self) -> i64 {
        match self.first_two_parts() {
            Some((first, second)) => {
                self.sections[second].text.chars().count() as i64 - self.sections[first].text.chars().count() as i64
            }
            None => 0,
        }
    }

    fn clear_first_part(&mut self) {
        if let Some((first, _)) = self.first_two_parts() {
            self.sections[first].text.clear();
            self.sections[first].span = None;
        }
    }

    fn finish(self) -> SeparatedParts {
        SeparatedParts {
            sections: self.sections,
            diagnostics: self.diagnostics,
        }
    }
}

/// Locates the part-level sections of `text`.
///
/// After the plain scan:
/// - an empty Part I becomes everything before Part II;
/// - a Part I that ends more than `gap_slack` characters before Part II starts is
///   widened up to Part II;
/// - while Part II is longer than Part I by more than `imbalance_slack`, the scan is
///   redone ignoring the first 1, 2, ... part anchors. Retrying stops once the imbalance
///   stops shrinking or `max_retries` is hit, and the unskipped split is kept.
pub fn separate_parts(text: &str, part_ids: &[SectionId], config: &PartSeparationConfig) -> SeparatedParts {
    let mut baseline = PartPass::scan(text, part_ids, 0);
    baseline.correct(text, config);

    let mut diff = baseline.imbalance();
    if diff <= config.imbalance_slack as i64 {
        return baseline.finish();
    }

    let mut accepted: Option<PartPass> = None;
    let mut skip = 1;
    while diff > config.imbalance_slack as i64 {
        if skip > config.max_retries {
            return ambiguous(baseline, diff, skip - 1);
        }
        tracing::debug!("PART II longer than PART I by {} chars, retrying with skip={}", diff, skip);

        let mut retry = PartPass::scan(text, part_ids, skip);
        retry.clear_first_part();
        retry.correct(text, config);

        let new_diff = retry.imbalance();
        if new_diff >= diff {
            return ambiguous(baseline, diff, skip);
        }
        diff = new_diff;
        accepted = Some(retry);
        skip += 1;
    }

    accepted.unwrap_or(baseline).finish()
}

fn ambiguous(baseline: PartPass, imbalance: i64, retries: usize) -> SeparatedParts {
    let mut parts = baseline.finish();
    parts.diagnostics.push(Diagnostic::PartSeparationAmbiguous {
        imbalance: imbalance.max(0) as usize,
        retries,
    });
    parts
}
