// src/extractors/locator.rs

//! Finds where one section starts and ends in normalized filing text.
//!
//! A section's body is the text between its own header ("anchor") and the header of
//! whichever later section shows up first. Tables of contents produce many short
//! anchor-to-anchor spans, so among every candidate the *longest* one that starts
//! after the previously located section wins.

use regex::{Regex, RegexBuilder};

use super::grammar::SectionId;

// Characters allowed right after a header token ("ITEM 1.", "ITEM 1-", "PART II\n", "ITEM 2(a)")
const ANCHOR_END: &str = r"[.*~\-:\s\(]";
const SPAN_ANCHOR_END: &str = r"[.*~\-:\s\()]";
const TAIL_ANCHOR_END: &str = r"[.\-:\s]";

/// End offsets of sections already located in the current scan. Never decreases.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsumedPositions(Vec<usize>);

impl ConsumedPositions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<usize> {
        self.0.last().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    fn push(&mut self, position: usize) {
        debug_assert!(self.last().map_or(true, |last| position >= last));
        self.0.push(position);
    }
}

/// Offsets of a located section within the scanned text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionSpan {
    /// Start of the section's own header (the line break before it, if any).
    pub start: usize,
    /// First byte after the header.
    pub content_start: usize,
    /// Start of the following header, or end of text for tail extractions.
    pub content_end: usize,
    /// Whether the section ran to end of text instead of up to a following header.
    pub to_end: bool,
}

impl SectionSpan {
    pub fn len(&self) -> usize {
        self.content_end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Result of one locator call: the raw section text and the state to thread into the next call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Located {
    pub text: String,
    pub span: Option<SectionSpan>,
    pub consumed: ConsumedPositions,
}

fn compile(pattern: &str, case_insensitive: bool) -> Option<Regex> {
    match RegexBuilder::new(pattern)
        .case_insensitive(case_insensitive)
        .dot_matches_new_line(true)
        .build()
    {
        Ok(re) => Some(re),
        Err(e) => {
            tracing::error!("Could not compile section pattern '{}': {}", pattern, e);
            None
        }
    }
}

/// Regex for every header occurrence of `id`.
fn anchor_regex(id: &SectionId, end: &str) -> Option<Regex> {
    compile(&format!(r"(?:\A|\n)[^\S\r\n]*{}{}", id.anchor_pattern(), end), true)
}

/// Regex for `id`'s header followed (lazily) by `next`'s header.
fn span_regex(id: &SectionId, next: &SectionId, case_insensitive: bool) -> Option<Regex> {
    let pattern = format!(
        r"(?:\A|\n)[^\S\r\n]*{anchor}{end}(.+?)(\n[^\S\r\n]*{next}{next_end})",
        anchor = id.anchor_pattern(),
        end = SPAN_ANCHOR_END,
        next = next.anchor_pattern(),
        next_end = ANCHOR_END,
    );
    compile(&pattern, case_insensitive)
}

fn collect_spans(re: &Regex, text: &str, offset: usize) -> Vec<SectionSpan> {
    re.captures_iter(&text[offset..])
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let body = caps.get(1)?;
            let next = caps.get(2)?;
            Some(SectionSpan {
                start: offset + whole.start(),
                content_start: offset + body.start(),
                content_end: offset + next.start(),
                to_end: false,
            })
        })
        .collect()
}

/// Locates `id` in `text`.
///
/// `later` are the ids after `id` in grammar order; the first one that yields any
/// anchor-to-anchor span decides the boundary. `skip` ignores that many leading
/// occurrences of `id`'s anchor (part separation retries only).
pub fn locate(
    text: &str,
    id: &SectionId,
    later: &[SectionId],
    consumed: ConsumedPositions,
    skip: usize,
) -> Located {
    let mut consumed = consumed;
    let mut candidates: Vec<SectionSpan> = Vec::new();
    let mut last_in_scope = true;
    let mut lone_anchor = false;

    let occurrences: Vec<usize> = if later.is_empty() {
        Vec::new()
    } else {
        anchor_regex(id, ANCHOR_END)
            .map(|re| re.find_iter(text).map(|m| m.start()).skip(skip).collect())
            .unwrap_or_default()
    };

    for (i, next) in later.iter().enumerate() {
        last_in_scope = false;
        if !candidates.is_empty() {
            break;
        }
        let is_final_candidate = i + 1 == later.len();
        if is_final_candidate {
            last_in_scope = true;
        }

        // Items of the next part can never follow inside this part's text
        if let (SectionId::PartItem { part, .. }, SectionId::PartItem { part: next_part, .. }) = (id, next) {
            if part != next_part {
                last_in_scope = true;
                break;
            }
        }
        if occurrences.is_empty() {
            continue;
        }

        let Some(sensitive) = span_regex(id, next, false) else { continue };
        let mut insensitive: Option<Option<Regex>> = None;

        for &offset in &occurrences {
            // Headers are usually upper-case; the case-sensitive pass avoids body-text mentions
            let mut spans = collect_spans(&sensitive, text, offset);
            if spans.is_empty() {
                let fallback = insensitive.get_or_insert_with(|| span_regex(id, next, true));
                if let Some(re) = fallback {
                    spans = collect_spans(re, text, offset);
                }
            }

            if !spans.is_empty() {
                candidates.extend(spans);
            } else if is_final_candidate && candidates.is_empty() {
                // Anchor present but nothing after it; single-item reports (some 8-Ks)
                lone_anchor = true;
            }
        }
        tracing::trace!("{} -> {}: {} candidate spans", id, next, candidates.len());
    }

    let mut section = String::new();
    let mut span = None;
    if let Some(best) = select_longest(&candidates, &consumed) {
        section = text[best.content_start..best.content_end].to_string();
        consumed.push(best.content_end);
        span = Some(best);
        tracing::debug!("Located {} at {}..{}", id, best.start, best.content_end);
    }

    if !consumed.is_empty() {
        if section.is_empty() || *id == SectionId::Signature {
            if let Some((tail, tail_span)) = tail_section(text, id, &consumed) {
                section = tail;
                span = Some(tail_span);
            }
        }
    } else if lone_anchor || last_in_scope {
        if let Some((tail, tail_span)) = tail_section(text, id, &consumed) {
            section = tail;
            span = Some(tail_span);
        }
    }

    Located {
        text: section,
        span,
        consumed,
    }
}

/// Byte ranges of every header occurrence of `id`, leading line break excluded.
pub fn anchor_occurrences(text: &str, id: &SectionId) -> Vec<(usize, usize)> {
    let Some(re) = anchor_regex(id, ANCHOR_END) else { return Vec::new() };
    re.find_iter(text)
        .map(|m| {
            let header = m.as_str();
            let leading = header.len() - header.trim_start().len();
            (m.start() + leading, m.end())
        })
        .collect()
}

/// Longest candidate starting at or after the last consumed position; first one wins ties.
pub fn select_longest(candidates: &[SectionSpan], consumed: &ConsumedPositions) -> Option<SectionSpan> {
    let floor = consumed.last();
    let mut best: Option<SectionSpan> = None;
    for candidate in candidates {
        if floor.is_some_and(|floor| candidate.start < floor) {
            continue;
        }
        if best.map_or(true, |b| candidate.len() > b.len()) && !candidate.is_empty() {
            best = Some(*candidate);
        }
    }
    best
}

/// Everything from `id`'s header to the end of text, starting no earlier than the last
/// consumed position. SIGNATURE uses its last occurrence; earlier ones are usually the ToC.
pub fn tail_section(text: &str, id: &SectionId, consumed: &ConsumedPositions) -> Option<(String, SectionSpan)> {
    let re = compile(&format!(r"(?:\A|\n)[^\S\r\n]*{}{}.", id.anchor_pattern(), TAIL_ANCHOR_END), true)?;
    let starts: Vec<usize> = re.find_iter(text).map(|m| m.start()).collect();

    let candidates: &[usize] = if *id == SectionId::Signature {
        match starts.last() {
            Some(_) => &starts[starts.len() - 1..],
            None => &[],
        }
    } else {
        &starts
    };

    let start = candidates
        .iter()
        .copied()
        .find(|&start| consumed.last().map_or(true, |floor| start >= floor))?;

    let section = text[start..].trim();
    if section.is_empty() {
        return None;
    }
    tracing::debug!("Tail-extracted {} from offset {}", id, start);
    Some((
        section.to_string(),
        SectionSpan {
            start,
            content_start: start,
            content_end: text.len(),
            to_end: true,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::grammar::Grammar;

    const ANNUAL_REPORT_TEXT: &str = "ITEM 1. Business\nAlpha text.\nITEM 1A. Risk Factors\nBeta text.\nSIGNATURE\nJohn Doe";

    fn scan(text: &str, grammar: Grammar) -> Vec<(SectionId, Located)> {
        let ids = grammar.ids();
        let mut consumed = ConsumedPositions::new();
        let mut out = Vec::new();
        for (i, id) in ids.iter().enumerate() {
            let located = locate(text, id, &ids[i + 1..], consumed, 0);
            consumed = located.consumed.clone();
            out.push((*id, located));
        }
        out
    }

    fn section<'a>(results: &'a [(SectionId, Located)], id: SectionId) -> &'a str {
        results
            .iter()
            .find(|(candidate, _)| *candidate == id)
            .map(|(_, located)| located.text.trim())
            .unwrap_or("")
    }

    #[test]
    fn test_annual_report_items_and_signature() {
        let results = scan(ANNUAL_REPORT_TEXT, Grammar::AnnualReport);
        assert_eq!(section(&results, SectionId::Item("1")), "Business\nAlpha text.");
        assert_eq!(section(&results, SectionId::Item("1A")), "Risk Factors\nBeta text.");
        assert_eq!(section(&results, SectionId::Item("7")), "");
        assert_eq!(section(&results, SectionId::Signature), "SIGNATURE\nJohn Doe");
    }

    #[test]
    fn test_consumed_positions_never_decrease() {
        let results = scan(ANNUAL_REPORT_TEXT, Grammar::AnnualReport);
        let mut previous: Vec<usize> = Vec::new();
        for (_, located) in &results {
            let current = located.consumed.as_slice();
            assert!(current.starts_with(&previous));
            assert!(current.windows(2).all(|w| w[0] <= w[1]));
            previous = current.to_vec();
        }
        assert_eq!(previous.len(), 2);
    }

    #[test]
    fn test_longest_span_skips_table_of_contents() {
        let text = "Contents\nITEM 1. Business 3\nITEM 2. Properties 9\n\
                    ITEM 1. Business\nWe make widgets in many places around the world.\n\
                    ITEM 2. Properties\nOne plant.";
        let ids = [SectionId::Item("1"), SectionId::Item("2")];
        let located = locate(text, &ids[0], &ids[1..], ConsumedPositions::new(), 0);
        assert_eq!(located.text.trim(), "Business\nWe make widgets in many places around the world.");

        let second = locate(text, &ids[1], &[], located.consumed.clone(), 0);
        assert_eq!(second.text, "ITEM 2. Properties\nOne plant.");
        assert!(second.span.is_some_and(|s| s.to_end));
    }

    #[test]
    fn test_case_sensitive_pass_preferred() {
        // The lower-case mention in body text must not end Item 1 early
        let text = "ITEM 1. Business\nSee\nItem 2. for details, which are long and important.\nITEM 2. Properties\nPlant";
        let ids = [SectionId::Item("1"), SectionId::Item("2")];
        let located = locate(text, &ids[0], &ids[1..], ConsumedPositions::new(), 0);
        assert!(located.text.contains("for details"), "got: {:?}", located.text);
    }

    #[test]
    fn test_case_insensitive_fallback() {
        let text = "Item 1. Business\nWidgets.\nItem 2. Properties\nPlant";
        let ids = [SectionId::Item("1"), SectionId::Item("2")];
        let located = locate(text, &ids[0], &ids[1..], ConsumedPositions::new(), 0);
        assert_eq!(located.text.trim(), "Business\nWidgets.");
    }

    #[test]
    fn test_part_crossing_extracts_to_end_of_part() {
        let text = "ITEM 3. Market Risk\nRates.\nITEM 4. Controls\nEffective.";
        let ids = [
            SectionId::PartItem { part: 1, item: "4" },
            SectionId::PartItem { part: 2, item: "1" },
            SectionId::Signature,
        ];
        let consumed = ConsumedPositions::new();
        let located = locate(text, &ids[0], &ids[1..], consumed, 0);
        assert_eq!(located.text, "ITEM 4. Controls\nEffective.");
        assert!(located.consumed.is_empty());
    }

    #[test]
    fn test_skip_ignores_leading_occurrences() {
        let text = "PART I\nshort\nPART II\nx\nPART I\nthe real part one body\nPART II\nthe real part two";
        let ids = [SectionId::Part(1), SectionId::Part(2)];
        let unskipped = locate(text, &ids[0], &ids[1..], ConsumedPositions::new(), 0);
        let skipped = locate(text, &ids[0], &ids[1..], ConsumedPositions::new(), 1);
        assert_eq!(unskipped.text.trim(), "the real part one body");
        assert_eq!(skipped.text.trim(), "the real part one body");

        let all_skipped = locate(text, &ids[0], &ids[1..], ConsumedPositions::new(), 2);
        assert!(all_skipped.consumed.is_empty());
    }

    #[test]
    fn test_signature_uses_last_occurrence() {
        let text = "ITEM 1. Business\nSIGNATURE page 40\nWidgets.\nITEM 2. Properties\nPlant\nSIGNATURES\nJane Roe";
        let consumed = ConsumedPositions::new();
        let located = tail_section(text, &SectionId::Signature, &consumed).unwrap();
        assert_eq!(located.0, "SIGNATURES\nJane Roe");
    }

    #[test]
    fn test_lone_anchor_single_item_report() {
        let text = "ITEM 5.02 Departure of Directors\nThe CFO resigned.";
        let ids = Grammar::CurrentReport.ids();
        let position = ids.iter().position(|id| *id == SectionId::Item("5.02")).unwrap();
        let located = locate(text, &ids[position], &ids[position + 1..], ConsumedPositions::new(), 0);
        assert_eq!(located.text, "ITEM 5.02 Departure of Directors\nThe CFO resigned.");
    }

    #[test]
    fn test_select_longest_respects_floor() {
        let span = |start, end| SectionSpan { start, content_start: start + 1, content_end: end, to_end: false };
        let candidates = [span(0, 500), span(600, 700), span(800, 850)];
        let mut consumed = ConsumedPositions::new();
        assert_eq!(select_longest(&candidates, &consumed), Some(span(0, 500)));
        consumed.push(550);
        assert_eq!(select_longest(&candidates, &consumed), Some(span(600, 700)));
        consumed.push(900);
        assert_eq!(select_longest(&candidates, &consumed), None);
    }
}
