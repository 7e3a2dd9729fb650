// src/edgar/document.rs
use encoding_rs::WINDOWS_1252;
use once_cell::sync::Lazy;
use regex::Regex;

// Embedded PDFs show up in a few old .txt annual reports
static PDF_BLOCK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<PDF>.*?</PDF>").expect("Failed to compile PDF_BLOCK_RE")
});

// uuencoded graphics/zip payloads inside legacy submissions
static UUENCODED_BLOCK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?ms)^begin [0-7]{3,4} [^\r\n]+\r?\n.*?^end[ \t]*$")
        .expect("Failed to compile UUENCODED_BLOCK_RE")
});

static DOCUMENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<DOCUMENT>.*?</DOCUMENT>").expect("Failed to compile DOCUMENT_RE")
});

static DOCUMENT_TYPE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\n[^\S\r\n]*<TYPE>([^\r\n]*)").expect("Failed to compile DOCUMENT_TYPE_RE")
});

static TABLE_CELL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<td[\s>/]").expect("Failed to compile TABLE_CELL_RE")
});

static TABLE_ROW_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<tr[\s>/]").expect("Failed to compile TABLE_ROW_RE")
});

/// Raw filing payload exactly as handed over by the retrieval side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDocument {
    content: String,
}

impl RawDocument {
    /// Decodes bytes as UTF-8, falling back to Windows-1252 which is what pre-2000s
    /// submissions with smart quotes were written in.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let content = match std::str::from_utf8(bytes) {
            Ok(text) => text.to_string(),
            Err(_) => {
                let (decoded, _, had_errors) = WINDOWS_1252.decode(bytes);
                if had_errors {
                    tracing::debug!("Windows-1252 fallback replaced undecodable bytes");
                }
                decoded.into_owned()
            }
        };
        Self { content }
    }

    pub fn as_str(&self) -> &str {
        &self.content
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

impl From<String> for RawDocument {
    fn from(content: String) -> Self {
        Self { content }
    }
}

impl From<&str> for RawDocument {
    fn from(content: &str) -> Self {
        Self { content: content.to_string() }
    }
}

/// HTML means both a table cell and a table row marker are present.
pub fn looks_like_html(content: &str) -> bool {
    TABLE_CELL_RE.is_match(content) && TABLE_ROW_RE.is_match(content)
}

/// Drops embedded binary payloads (PDF blocks, uuencoded attachments).
pub fn strip_binary_payloads(content: &str) -> String {
    let without_pdf = PDF_BLOCK_RE.replace_all(content, "");
    UUENCODED_BLOCK_RE.replace_all(&without_pdf, "").into_owned()
}

/// Outcome of looking for the report body among wrapped sub-documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentSelection<'a> {
    /// A `<DOCUMENT>` whose `<TYPE>` starts with "10" or "8".
    Report { doc_type: String, body: &'a str },
    /// The payload has no `<DOCUMENT>` wrappers at all.
    Unwrapped(&'a str),
    /// Wrappers exist but none carries a report type; the whole payload is used.
    NotFound(&'a str),
}

impl<'a> DocumentSelection<'a> {
    pub fn body(&self) -> &'a str {
        match self {
            DocumentSelection::Report { body, .. } => body,
            DocumentSelection::Unwrapped(body) | DocumentSelection::NotFound(body) => body,
        }
    }
}

/// Picks the first wrapped sub-document that is a periodic/current report.
pub fn select_report_document(content: &str) -> DocumentSelection<'_> {
    let mut saw_documents = false;

    for document in DOCUMENT_RE.find_iter(content) {
        saw_documents = true;
        let body = document.as_str();
        let doc_type = match DOCUMENT_TYPE_RE.captures(body).and_then(|caps| caps.get(1)) {
            Some(m) => m.as_str().trim(),
            None => continue,
        };

        // Only the number is checked, some filers write '10K' instead of '10-K'
        if doc_type.starts_with("10") || doc_type.starts_with('8') {
            tracing::debug!("Selected sub-document of type '{}' ({} bytes)", doc_type, body.len());
            return DocumentSelection::Report {
                doc_type: doc_type.to_string(),
                body,
            };
        }
        tracing::trace!("Skipping sub-document of type '{}'", doc_type);
    }

    if saw_documents {
        DocumentSelection::NotFound(content)
    } else {
        DocumentSelection::Unwrapped(content)
    }
}
