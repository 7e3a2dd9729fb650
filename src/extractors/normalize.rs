// src/extractors/normalize.rs

//! Turns a raw filing payload into the canonical plain text the locator scans.
//!
//! Markup removal has two strategies, picked by whether the selected document is
//! HTML: a DOM walk for HTML and regex stripping for legacy text submissions.
//! Character canonicalization, header repair and noise removal are shared.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use scraper::{ElementRef, Html};

use crate::edgar::document::{self, DocumentSelection, RawDocument};

// --- Plain-text strategy patterns ---
static HORIZONTAL_MARGIN_SPAN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<span[^>]*style="[^"]*(?:margin-left|margin-right):\s*[\d.]+pt[^"]*"[^>]*>.*?</span>"#)
        .expect("Failed to compile HORIZONTAL_MARGIN_SPAN_RE")
});

static VERTICAL_MARGIN_SPAN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<span[^>]*style="[^"]*(?:margin-top|margin-bottom):\s*[\d.]+pt[^"]*"[^>]*>.*?</span>"#)
        .expect("Failed to compile VERTICAL_MARGIN_SPAN_RE")
});

static BLOCK_CLOSE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(<\s*/\s*(?:div|tr|p|li)\s*>|<br\s*/?>)").expect("Failed to compile BLOCK_CLOSE_RE")
});

static CELL_CLOSE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(<\s*/\s*(?:th|td)\s*>)").expect("Failed to compile CELL_CLOSE_RE")
});

static COMMENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<!--.*?-->").expect("Failed to compile COMMENT_RE")
});

// Only things that look like tags; a bare "<" in legacy text ("< 5%") survives
static TAG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<[/!?]?[A-Za-z][^>]*>").expect("Failed to compile TAG_RE")
});

// --- Header repair ---
static PART_HEADER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)((?:\A|\n)[^\S\r\n]*)(P[^\S\r\n]*A[^\S\r\n]*R[^\S\r\n]*T)[^\S\r\n]+((?:\d{1,2}|[IV]{1,2})[AB]?)")
        .expect("Failed to compile PART_HEADER_RE")
});

static ITEM_HEADER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)((?:\A|\n)[^\S\r\n]*)(I[^\S\r\n]*T[^\S\r\n]*E[^\S\r\n]*M)[^\S\r\n]+(\d{1,2}[AB]?)")
        .expect("Failed to compile ITEM_HEADER_RE")
});

static SIGNATURE_HEADER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)((?:\A|\n)[^\S\r\n]*)(S[^\S\r\n]*I[^\S\r\n]*G[^\S\r\n]*N[^\S\r\n]*A[^\S\r\n]*T[^\S\r\n]*U[^\S\r\n]*R[^\S\r\n]*E(?:[^\S\r\n]*(?:S|\([^\S\r\n]*S[^\S\r\n]*\)))?)([^\S\r\n]+|\n|\z)",
    )
    .expect("Failed to compile SIGNATURE_HEADER_RE")
});

static HEADER_SEPARATOR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(ITEM|PART)(\s+\d{1,2}[AB]?)([\-•])").expect("Failed to compile HEADER_SEPARATOR_RE")
});

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[^\S\r\n]").expect("Failed to compile WHITESPACE_RE")
});

// --- Noise lines ---
// Line anchored and newline free, so back-to-back noise lines each match
static NOISE_HEADER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?mi)^[^\S\r\n]*(?:TABLE\s+OF\s+CONTENTS|INDEX\s+TO\s+FINANCIAL\s+STATEMENTS|BACK\s+TO\s+CONTENTS|QUICKLINKS)[^\S\r\n]*$",
    )
    .expect("Failed to compile NOISE_HEADER_RE")
});

static PAGE_NUMBER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[^\S\r\n]*[-‒–—]*[^\S\r\n]*\d+[^\S\r\n]*[-‒–—]*[^\S\r\n]*$").expect("Failed to compile PAGE_NUMBER_RE")
});

static PAGE_LABEL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?mi)^[^\S\r\n]*Page\s[\d*]+[^\S\r\n]*$").expect("Failed to compile PAGE_LABEL_RE")
});

static FOOTNOTE_MARKER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\s)F[-‒–—]+\d+\b").expect("Failed to compile FOOTNOTE_MARKER_RE")
});

// --- Whitespace collapsing ---
static BLANK_LINES_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:[^\S\n]*\n[^\S\n]*){2,}").expect("Failed to compile BLANK_LINES_RE")
});

static LINE_EDGE_SPACES_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[^\S\n]*\n[^\S\n]*").expect("Failed to compile LINE_EDGE_SPACES_RE")
});

static MULTI_SPACE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[^\S\n]{2,}").expect("Failed to compile MULTI_SPACE_RE")
});

/// Converts one document's markup into plain text, keeping visual line breaks.
pub trait MarkupStrategy {
    fn name(&self) -> &'static str;
    fn to_plain_text(&self, document: &str) -> String;
}

/// HTML documents: walks the parsed DOM.
#[derive(Debug, Default, Clone, Copy)]
pub struct DomStrategy;

/// Legacy text submissions (and HTML without tables): regex based.
#[derive(Debug, Default, Clone, Copy)]
pub struct RegexStrategy;

impl MarkupStrategy for DomStrategy {
    fn name(&self) -> &'static str {
        "dom"
    }

    fn to_plain_text(&self, document: &str) -> String {
        let html = Html::parse_document(document);
        let mut out = String::with_capacity(document.len() / 2);
        walk_element(html.root_element(), &mut out);
        out
    }
}

enum Frame<'a> {
    Open(ElementRef<'a>),
    Text(&'a str),
    Close(&'a str),
}

// Explicit stack: filings with thousands of unclosed block tags nest arbitrarily deep
fn walk_element(root: ElementRef<'_>, out: &mut String) {
    let mut stack = vec![Frame::Open(root)];

    while let Some(frame) = stack.pop() {
        let element = match frame {
            Frame::Text(text) => {
                out.push_str(text);
                continue;
            }
            Frame::Close(name) => {
                match name {
                    "p" | "div" | "li" | "tr" => out.push_str("\n\n"),
                    "td" | "th" => out.push(' '),
                    _ => {}
                }
                continue;
            }
            Frame::Open(element) => element,
        };

        let name = element.value().name();
        match name {
            "script" | "style" | "head" | "title" => continue,
            "br" => {
                out.push_str("\n\n");
                continue;
            }
            "span" => {
                let has_text = element.text().any(|t| !t.trim().is_empty());
                if !has_text {
                    // Empty spans are layout spacers; words split across spans are unwrapped below
                    let style = element.value().attr("style").unwrap_or("").to_ascii_lowercase();
                    if style.contains("margin-top") || style.contains("margin-bottom") {
                        out.push('\n');
                        continue;
                    }
                    if style.contains("margin-left") || style.contains("margin-right") {
                        out.push(' ');
                        continue;
                    }
                }
            }
            _ => {}
        }

        stack.push(Frame::Close(name));
        for child in element.children().rev() {
            if let Some(child_element) = ElementRef::wrap(child) {
                stack.push(Frame::Open(child_element));
            } else if let Some(text) = child.value().as_text() {
                stack.push(Frame::Text(&**text));
            }
        }
    }
}

impl MarkupStrategy for RegexStrategy {
    fn name(&self) -> &'static str {
        "regex"
    }

    fn to_plain_text(&self, document: &str) -> String {
        let text = HORIZONTAL_MARGIN_SPAN_RE.replace_all(document, " ");
        let text = VERTICAL_MARGIN_SPAN_RE.replace_all(&text, "\n");
        let text = COMMENT_RE.replace_all(&text, "");
        let text = BLOCK_CLOSE_RE.replace_all(&text, "$1\n\n");
        let text = CELL_CLOSE_RE.replace_all(&text, " $1 ");
        let text = TAG_RE.replace_all(&text, "");
        html_escape::decode_html_entities(&text).into_owned()
    }
}

/// Canonical text plus what the normalizer learned on the way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedDocument {
    pub text: String,
    pub is_html: bool,
    /// `<TYPE>` of the selected sub-document, if one was selected.
    pub document_type: Option<String>,
    /// Sub-documents existed but none carried a report type.
    pub document_missing: bool,
}

/// Runs the full normalization pipeline on one payload.
pub fn normalize(raw: &RawDocument) -> NormalizedDocument {
    let payload = document::strip_binary_payloads(raw.as_str());

    let selection = document::select_report_document(&payload);
    let (document_type, document_missing) = match &selection {
        DocumentSelection::Report { doc_type, .. } => (Some(doc_type.clone()), false),
        DocumentSelection::Unwrapped(_) => (None, false),
        DocumentSelection::NotFound(_) => (None, true),
    };
    let body = selection.body();

    let is_html = document::looks_like_html(body);
    let strategy: &dyn MarkupStrategy = if is_html { &DomStrategy } else { &RegexStrategy };
    tracing::debug!("Normalizing {} bytes with {} strategy", body.len(), strategy.name());

    let text = strategy.to_plain_text(body);
    let text = clean_text(&text);

    NormalizedDocument {
        text,
        is_html,
        document_type,
        document_missing,
    }
}

/// Shared passes applied after markup removal.
pub fn clean_text(text: &str) -> String {
    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    let text = canonicalize_chars(&text);
    let text = repair_headers(&text);
    let text = remove_noise(&text);
    collapse_whitespace(&text)
}

/// Maps exotic spaces, legacy CP-1252 control points and Unicode dashes to canonical characters.
pub fn canonicalize_chars(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{a0}' | '\u{200b}' | '\u{2009}' => ' ',
            '\u{91}' => '\u{2018}',
            '\u{92}' => '\u{2019}',
            '\u{93}' => '\u{201c}',
            '\u{94}' => '\u{201d}',
            '\u{95}' => '\u{2022}',
            '\u{96}' | '\u{97}' => '-',
            '\u{98}' => '\u{2dc}',
            '\u{99}' => '\u{2122}',
            '\u{2010}'..='\u{2015}' => '-',
            other => other,
        })
        .collect()
}

/// Glues section keywords back together ("I T E M  1" -> "ITEM 1") and spaces out
/// a separator glued to the item number ("ITEM 1-Business" -> "ITEM 1 - Business").
pub fn repair_headers(text: &str) -> String {
    let squeeze = |caps: &Captures<'_>| {
        format!("{}{} {}", &caps[1], WHITESPACE_RE.replace_all(&caps[2], ""), &caps[3])
    };
    let text = PART_HEADER_RE.replace_all(text, squeeze);
    let text = ITEM_HEADER_RE.replace_all(&text, squeeze);
    let text = SIGNATURE_HEADER_RE.replace_all(&text, |caps: &Captures<'_>| {
        format!("{}{}{}", &caps[1], WHITESPACE_RE.replace_all(&caps[2], ""), &caps[3])
    });
    HEADER_SEPARATOR_RE.replace_all(&text, "$1$2 $3 ").into_owned()
}

/// Drops table-of-contents headers, page numbers and `F-<n>` markers.
pub fn remove_noise(text: &str) -> String {
    let text = NOISE_HEADER_RE.replace_all(text, "");
    let text = PAGE_NUMBER_RE.replace_all(&text, "");
    let text = PAGE_LABEL_RE.replace_all(&text, "");
    FOOTNOTE_MARKER_RE.replace_all(&text, "$1").into_owned()
}

/// Blank-line runs become one newline, space runs one space, result trimmed.
/// Single newlines survive.
pub fn collapse_whitespace(text: &str) -> String {
    let text = BLANK_LINES_RE.replace_all(text, "\n");
    let text = LINE_EDGE_SPACES_RE.replace_all(&text, "\n");
    let text = MULTI_SPACE_RE.replace_all(&text, " ");
    text.trim().to_string()
}
