// tests/extraction.rs
use chrono::NaiveDate;

use filing_items::edgar::parse_submission_header;
use filing_items::{
    Diagnostic, ExtractError, ExtractOptions, FilingMetadata, Grammar, ItemExtractor, PartSeparationConfig,
    RawDocument,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

const ANNUAL_REPORT_HTML: &str = r#"<html><head><title>acme-10k</title></head><body>
<table>
<tr><td>Item 1.</td><td>Business</td><td>3</td></tr>
<tr><td>Item 1A.</td><td>Risk Factors</td><td>8</td></tr>
<tr><td>Item 2.</td><td>Properties</td><td>12</td></tr>
</table>
<p><b>Item 1. Business</b></p>
<p>Acme builds rockets.</p>
<p><span style="font-weight:bold">I</span><span style="font-weight:bold">tem 1A. Risk Factors</span></p>
<p>Rockets can explode.</p>
<p style="text-align:center">- 12 -</p>
<p><b>Item 2. Properties</b></p>
<p>One&nbsp;launch pad.</p>
<p><b>SIGNATURES</b></p>
<p>Pursuant to the requirements of the Act, Acme has signed this report.</p>
</body></html>"#;

#[test]
fn html_annual_report_skips_table_of_contents() {
    let extractor = ItemExtractor::new(ExtractOptions::default());
    let metadata = FilingMetadata::new("10-K", date(2022, 2, 28), "acme-10k.htm");
    let outcome = extractor
        .extract(&metadata, &RawDocument::from(ANNUAL_REPORT_HTML))
        .unwrap();

    assert!(outcome.is_html);
    assert_eq!(outcome.grammar, Grammar::AnnualReport);
    let result = outcome.result.expect("sections extracted");

    assert_eq!(result.get("item_1"), Some("Business\nAcme builds rockets."));
    assert_eq!(result.get("item_1A"), Some("Risk Factors\nRockets can explode."));
    assert_eq!(result.get("item_2"), Some("Properties\nOne launch pad."));
    assert_eq!(result.get("item_3"), Some(""));
    assert!(result
        .get("SIGNATURE")
        .is_some_and(|text| text.starts_with("SIGNATURES\nPursuant")));
}

#[test]
fn deeply_nested_html_is_extracted() {
    let depth = 30_000;
    let html = format!(
        "<html><body><table><tr><td>Item 1.</td><td>Business</td></tr>\
         <tr><td>Item 1A.</td><td>Risk Factors</td></tr></table>{}\
         <p>Item 1. Business</p><p>Widgets are made here.</p>\
         <p>Item 1A. Risk Factors</p><p>Widgets can break.</p><p>SIGNATURES</p><p>Jane Roe</p>{}</body></html>",
        "<div>".repeat(depth),
        "</div>".repeat(depth)
    );
    let extractor = ItemExtractor::new(ExtractOptions::default());
    let metadata = FilingMetadata::new("10-K", date(2022, 2, 28), "widgets-10k.htm");
    let outcome = extractor.extract(&metadata, &RawDocument::from(html)).unwrap();

    assert_eq!(outcome.document_type, None);
    let result = outcome.result.expect("sections extracted");
    assert_eq!(result.get("item_1"), Some("Business\nWidgets are made here."));
    assert_eq!(result.get("item_1A"), Some("Risk Factors\nWidgets can break."));
    assert_eq!(result.get("SIGNATURE"), Some("SIGNATURES\nJane Roe"));
}

const CURRENT_REPORT_SUBMISSION: &str = "<SEC-DOCUMENT>0000000000-05-000001.txt : 20050315\n\
<SEC-HEADER>0000000000-05-000001.hdr.sgml : 20050315\n\
CONFORMED SUBMISSION TYPE:\t8-K\n\
FILED AS OF DATE:\t\t20050315\n\
</SEC-HEADER>\n\
<DOCUMENT>\n<TYPE>EX-99.1\n<TEXT>\nAcme reports record quarter.\n</TEXT>\n</DOCUMENT>\n\
<DOCUMENT>\n<TYPE>8-K\n<TEXT>\n\
Item 2.02 Results of Operations and Financial Condition.\nRevenue rose.\n\
Item 9.01 Financial Statements and Exhibits.\nExhibit 99.1\n\
SIGNATURE\nAcme Corp\n</TEXT>\n</DOCUMENT>\n";

#[test]
fn full_submission_current_report() {
    let header = parse_submission_header(CURRENT_REPORT_SUBMISSION);
    let metadata = FilingMetadata::new(
        header.form_type.expect("form type in header"),
        header.filing_date.expect("filing date in header"),
        "0000000000-05-000001.txt",
    );

    let extractor = ItemExtractor::new(ExtractOptions::default().with_items(["2.02", "9.01"]).without_signature());
    let outcome = extractor
        .extract(&metadata, &RawDocument::from(CURRENT_REPORT_SUBMISSION))
        .unwrap();

    assert_eq!(outcome.grammar, Grammar::CurrentReport);
    assert_eq!(outcome.document_type.as_deref(), Some("8-K"));
    assert!(outcome.diagnostics.is_empty());
    let result = outcome.result.unwrap();
    assert_eq!(result.keys().collect::<Vec<_>>(), vec!["item_2.02", "item_9.01"]);
    assert_eq!(
        result.get("item_2.02"),
        Some("Results of Operations and Financial Condition.\nRevenue rose.")
    );
    assert_eq!(result.get("item_9.01"), Some("Financial Statements and Exhibits.\nExhibit 99.1"));

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["filing_date"], "2005-03-15");
    assert!(!result.contains_key("item_1.01"));
}

fn quarterly_report_with_toc() -> String {
    let filler = "The Company continued to operate normally during the quarter.\n".repeat(110);
    format!(
        "PART I\nITEM 1. Financial Statements\nITEM 2. Management's Discussion\n\
         PART II\nITEM 1. Legal Proceedings\nITEM 6. Exhibits\n\
         ITEM 1. Financial Statements\n{filler}\
         ITEM 2. Management's Discussion\nRevenue grew.\n\
         PART II\nITEM 1. Legal Proceedings\nNone.\nITEM 6. Exhibits\n31.1 Certification\n\
         SIGNATURES\nJane Roe"
    )
}

#[test]
fn quarterly_report_parts_are_recovered_from_toc() {
    let extractor = ItemExtractor::new(ExtractOptions::default());
    let metadata = FilingMetadata::new("10-Q", date(2020, 8, 7), "acme-10q.txt");
    let outcome = extractor
        .extract(&metadata, &RawDocument::from(quarterly_report_with_toc()))
        .unwrap();

    assert!(outcome.diagnostics.contains(&Diagnostic::PartOneReconstructed));
    let result = outcome.result.unwrap();

    let part_1 = result.get("part_1").unwrap();
    let part_2 = result.get("part_2").unwrap();
    assert!(part_1.contains("continued to operate normally"));
    assert!(!part_2.contains("continued to operate normally"));
    assert!(result
        .get("part_1_item_1")
        .is_some_and(|text| text.contains("continued to operate normally")));
    assert_eq!(result.get("part_2_item_1"), Some("Legal Proceedings\nNone."));
    assert_eq!(result.get("SIGNATURE"), Some("SIGNATURES\nJane Roe"));
}

#[test]
fn part_separation_thresholds_are_configurable() {
    let config = PartSeparationConfig {
        imbalance_slack: 1_000_000,
        ..PartSeparationConfig::default()
    };
    let extractor = ItemExtractor::new(ExtractOptions::default()).with_part_config(config);
    let metadata = FilingMetadata::new("10-Q", date(2020, 8, 7), "acme-10q.txt");
    let outcome = extractor
        .extract(&metadata, &RawDocument::from(quarterly_report_with_toc()))
        .unwrap();

    let result = outcome.result.unwrap();
    assert!(result.get("part_2").unwrap().contains("continued to operate normally"));
}

#[test]
fn requesting_foreign_items_fails_before_scanning() {
    let extractor = ItemExtractor::new(ExtractOptions::default().with_items(["part_2__1A"]));
    let metadata = FilingMetadata::new("10-K", date(2022, 2, 28), "acme-10k.htm");
    let err = extractor
        .extract(&metadata, &RawDocument::from(ANNUAL_REPORT_HTML))
        .unwrap_err();

    assert!(matches!(err, ExtractError::GrammarMismatch { .. }));
    assert_eq!(extractor.stats().documents(), 0);
}
