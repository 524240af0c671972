mod common;

use common::{CidFont, FixturePage, build_pdf, build_pdf_with, grid};
use packlist_core::pdf::PageSource;
use packlist_core::{
    Converter, Dataset, ExtractionMode, Outcome, PacklistError, PdfError, PdfExtractor, RuleSet,
    Strategy, TableSettings,
};
use pretty_assertions::assert_eq;

fn table_converter() -> Converter {
    Converter::new(ExtractionMode::table(TableSettings::default()).expect("default settings are valid"))
}

fn extracted(outcome: Outcome) -> Dataset {
    outcome.into_dataset().expect("expected data, got nothing")
}

#[test]
fn reads_tokens_at_expected_positions() {
    let pdf = build_pdf(vec![FixturePage::new().text(50, 700, "Carton")]).expect("fixture");
    let extractor = PdfExtractor::load(&pdf).expect("fixture should load");

    assert_eq!(extractor.page_numbers(), vec![1]);
    let page = extractor.page(1).expect("page 1 should read");
    assert_eq!(page.tokens.len(), 1);

    let token = &page.tokens[0];
    assert_eq!(token.text, "Carton");
    assert_eq!(token.x0, 50.0);
    assert!((token.x1 - 86.0).abs() < 1e-9, "x1 was {}", token.x1);
    assert_eq!(token.bottom, 92.0);
    assert!(page.text.contains("Carton"), "page text: {:?}", page.text);
}

#[test]
fn decodes_identity_h_text_through_to_unicode() {
    let page = FixturePage::new()
        .cid_text(50, 700, &[0x24, 0x25, 0x26])
        .cid_text(200, 700, &[0x27]);
    let pdf = build_pdf_with(vec![page], CidFont::Described).expect("fixture");

    let extractor = PdfExtractor::load(&pdf).expect("fixture should load");
    let page = extractor.page(1).expect("page 1 should read");
    let texts: Vec<&str> = page.tokens.iter().map(|t| t.text.as_str()).collect();
    assert_eq!(texts, vec!["ABC", "D"]);
    assert_eq!(page.tokens[0].x0, 50.0);
    assert_eq!(page.tokens[0].bottom, 92.0);
    assert!(page.text.contains("ABC"), "page text: {:?}", page.text);
    assert!(!page.text.contains('$'), "page text: {:?}", page.text);

    let outcome = table_converter().convert_document(&pdf).expect("readable");
    let dataset = outcome.dataset().expect("a table row");
    assert_eq!(dataset.to_string_rows(), vec![vec!["ABC", "D"]]);
}

#[test]
fn font_without_descriptor_does_not_abort_conversion() {
    let page = FixturePage::new()
        .text(50, 720, "Carton")
        .cid_text(50, 700, &[0x24, 0x25, 0x26]);
    let pdf = build_pdf_with(vec![page], CidFont::Undescribed).expect("fixture");

    let extractor = PdfExtractor::load(&pdf).expect("lopdf still opens the document");
    assert_eq!(extractor.page_numbers(), vec![1]);
    assert!(extractor.page(1).is_ok());

    let result = table_converter().convert_document(&pdf);
    assert!(result.is_ok(), "unexpected result: {result:?}");
}

#[test]
fn merges_rows_from_every_page() {
    let pdf = build_pdf(vec![
        grid(&[&["Carton", "Qty"], &["C-1", "4"]], 700),
        grid(&[&["C-2", "6"], &["C-3", "1"], &["C-4", "9"]], 720),
    ])
    .expect("fixture");

    let dataset = extracted(table_converter().convert_document(&pdf).expect("readable"));
    assert_eq!(dataset.len(), 5);
    assert_eq!(
        dataset.to_string_rows(),
        vec![
            vec!["Carton", "Qty"],
            vec!["C-1", "4"],
            vec!["C-2", "6"],
            vec!["C-3", "1"],
            vec!["C-4", "9"],
        ]
    );
    assert_eq!(dataset.header(false), None);
}

#[test]
fn keeps_ragged_page_widths() {
    let pdf = build_pdf(vec![
        grid(&[&["SKU", "Qty", "Carton"], &["HK-1", "2", "C-1"]], 700),
        grid(&[&["HK-2", "5"]], 700),
    ])
    .expect("fixture");

    let dataset = extracted(table_converter().convert_document(&pdf).expect("readable"));
    let Dataset::Rows { table } = &dataset else {
        panic!("table mode should produce rows");
    };
    assert_eq!(table.len(), 3);
    assert!(table.is_ragged());
    assert_eq!(table.rows()[2].len(), 2);
    assert_eq!(
        dataset.header(true),
        Some(vec!["col_1".to_string(), "col_2".to_string(), "col_3".to_string()])
    );
}

#[test]
fn blank_document_extracts_nothing() {
    let pdf = build_pdf(vec![FixturePage::new()]).expect("fixture");
    let outcome = table_converter().convert_document(&pdf).expect("readable");
    assert_eq!(outcome, Outcome::NothingExtracted);

    let fields = Converter::new(ExtractionMode::fields("carton-label").expect("built-in"));
    let outcome = fields.convert_document(&pdf).expect("readable");
    assert_eq!(outcome, Outcome::NothingExtracted);
}

#[test]
fn unreadable_bytes_are_a_hard_error() {
    let result = table_converter().convert_document(b"%PDF-1.4 this is not really a pdf");
    assert!(
        matches!(result, Err(PacklistError::Pdf(PdfError::Parse(_)))),
        "unexpected result: {result:?}"
    );
}

#[test]
fn ruled_table_uses_drawn_lines() {
    let page = FixturePage::new()
        .text(50, 750, "PACKING LIST")
        .rect(40, 660, 260, 40)
        .line(150, 660, 150, 700)
        .line(40, 680, 300, 680)
        .text(50, 686, "SKU")
        .text(160, 686, "Qty")
        .text(50, 666, "HK-1")
        .text(160, 666, "12");
    let pdf = build_pdf(vec![page]).expect("fixture");

    let settings = TableSettings::default()
        .with_strategies(Strategy::ByRulingLines, Strategy::ByRulingLines);
    let converter = Converter::new(ExtractionMode::table(settings).expect("valid"));

    let dataset = extracted(converter.convert_document(&pdf).expect("readable"));
    assert_eq!(
        dataset.to_string_rows(),
        vec![vec!["SKU", "Qty"], vec!["HK-1", "12"]]
    );
}

#[test]
fn fields_mode_reads_one_record_per_page() {
    let pdf = build_pdf(vec![
        FixturePage::new().lines(
            50,
            740,
            &["PO#: 7QX41LMB", "ASIN#: B07XJ8C8F5", "SKU: HK-RAF-001", "QTY: 12"],
        ),
        FixturePage::new().lines(50, 740, &["PO#: 8ZZ20QPA", "ASIN#: B00TESTXYZ"]),
    ])
    .expect("fixture");

    let rules = RuleSet::builtin("carton-label").expect("built-in");
    let converter = Converter::new(ExtractionMode::Fields(rules));
    let dataset = extracted(converter.convert_document(&pdf).expect("readable"));

    let Dataset::Records { columns, records } = dataset else {
        panic!("fields mode should produce records");
    };
    assert_eq!(columns[0], "PO #");
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].page, 1);
    assert_eq!(records[0].get("PO #"), Some("7QX41LMB"));
    assert_eq!(records[0].get("ASIN"), Some("B07XJ8C8F5"));
    assert_eq!(records[1].get("PO #"), Some("8ZZ20QPA"));
    assert_eq!(records[1].get("Carton ID"), Some("Not Found"));
}

#[test]
fn max_pages_limits_reading() {
    let pdf = build_pdf(vec![
        grid(&[&["a", "b"]], 700),
        grid(&[&["c", "d"]], 700),
    ])
    .expect("fixture");

    let mut config = packlist_core::PacklistConfig::default();
    config.pdf.max_pages = 1;
    let converter = Converter::from_config(&config).expect("valid config");

    let dataset = extracted(converter.convert_document(&pdf).expect("readable"));
    assert_eq!(dataset.to_string_rows(), vec![vec!["a", "b"]]);
}
