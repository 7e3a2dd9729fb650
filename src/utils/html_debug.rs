// src/utils/html_debug.rs
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::extractors::grammar::{Grammar, SectionId};
use crate::extractors::locator::anchor_occurrences;
use crate::utils::error::AppError;

/// Saves normalized filing text as an HTML page with the given ranges highlighted.
/// Overlapping ranges keep the one that starts first.
pub fn save_debug_html(text: &str, path: &Path, highlights: &[(usize, usize, String)]) -> Result<(), AppError> {
    let mut file = File::create(path)?;

    let mut debug_html = String::from("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<style>\n");
    debug_html.push_str("body { font-family: monospace; white-space: pre-wrap; }\n");
    debug_html.push_str(".highlight-part { background-color: #ADD8E6; }\n");
    debug_html.push_str(".highlight-item { background-color: #FFFF00; }\n");
    debug_html.push_str(".highlight-signature { background-color: #90EE90; }\n");
    debug_html.push_str("</style>\n</head>\n<body>\n");

    let mut sorted_highlights = highlights.to_vec();
    sorted_highlights.sort_by_key(|h| (h.0, h.1));

    let mut last_pos = 0;
    for (start, end, label) in sorted_highlights {
        if start < last_pos || end > text.len() {
            continue;
        }
        debug_html.push_str(&html_escape::encode_text(&text[last_pos..start]));

        let css_class = if label.starts_with("part_") && !label.contains("__") {
            "highlight-part"
        } else if label == "SIGNATURE" {
            "highlight-signature"
        } else {
            "highlight-item"
        };
        debug_html.push_str(&format!(
            "<span class=\"{}\" title=\"{} at {}-{}\">",
            css_class,
            html_escape::encode_double_quoted_attribute(&label),
            start,
            end
        ));
        debug_html.push_str(&html_escape::encode_text(&text[start..end]));
        debug_html.push_str("</span>");

        last_pos = end;
    }
    debug_html.push_str(&html_escape::encode_text(&text[last_pos..]));
    debug_html.push_str("\n</body>\n</html>");

    file.write_all(debug_html.as_bytes())?;

    tracing::info!("Saved debug HTML to {}", path.display());
    Ok(())
}

/// Highlights every header occurrence of every id in `grammar`, labelled with the id it matched.
pub fn create_debug_html(text: &str, path: &Path, grammar: Grammar) -> Result<(), AppError> {
    let mut ids = grammar.ids();
    if grammar.has_parts() {
        ids.extend(grammar.part_ids().into_iter().filter(|id| matches!(id, SectionId::Part(_))));
    }

    let mut highlights: Vec<(usize, usize, String)> = Vec::new();
    for id in &ids {
        for (start, end) in anchor_occurrences(text, id) {
            // Item numbers repeat across parts; one label per range is enough
            if highlights.iter().any(|h| h.0 == start && h.1 == end) {
                continue;
            }
            highlights.push((start, end, id.to_string()));
        }
    }
    tracing::debug!("{} header occurrences to highlight", highlights.len());

    save_debug_html(text, path, &highlights)
}
