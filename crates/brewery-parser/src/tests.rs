use std::fs;
use std::path::PathBuf;

use chrono::NaiveDate;

use crate::errors::ParserError;
use crate::model::{SourceFile, SourceKind};
use crate::{detect_kind, parse_as, parse_source_file};

fn fixture(path: &str) -> String {
    let base = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let full_path = base.join("tests/data").join(path);
    fs::read_to_string(&full_path)
        .unwrap_or_else(|err| panic!("failed to read fixture {}: {}", full_path.display(), err))
}

#[test]
fn detects_and_parses_sales_file() {
    let parsed = parse_source_file(&fixture("mock_sales_data.csv")).expect("sales parse failed");
    assert_eq!(parsed.kind(), SourceKind::Sales);
    assert_eq!(parsed.kind().table_name(), "sales_data");

    let SourceFile::Sales(rows) = parsed else {
        panic!("expected sales rows");
    };
    assert_eq!(rows.len(), 6);

    let first = &rows[0];
    assert_eq!(first.date, NaiveDate::from_ymd_opt(2024, 1, 1));
    assert_eq!(first.product, "IPA");
    assert_eq!(first.region, "North");
    assert_eq!(first.units_sold, Some(100));
    assert_eq!(first.price_per_unit.as_deref(), Some("2.50"));

    // Currency text is preserved verbatim for the transform to normalize.
    assert_eq!(rows[2].price_per_unit.as_deref(), Some("$3.10"));
    assert_eq!(rows[5].price_per_unit.as_deref(), Some("n/a"));
}

#[test]
fn detects_and_parses_production_file() {
    let parsed =
        parse_source_file(&fixture("mock_production_data.csv")).expect("production parse failed");
    assert_eq!(parsed.kind(), SourceKind::Production);

    let SourceFile::Production(rows) = parsed else {
        panic!("expected production rows");
    };
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[0].units_produced, Some(100));
    assert_eq!(rows[0].spoiled_units, Some(10));
    assert_eq!(rows[0].cost_per_unit.as_deref(), Some("$1.20"));
    assert_eq!(rows[3].units_produced, Some(0));
}

#[test]
fn production_layout_parsed_as_sales_names_missing_columns() {
    let err = parse_as(SourceKind::Sales, &fixture("mock_production_data.csv"))
        .expect_err("production layout should not parse as sales");
    match err {
        ParserError::MissingColumns { kind, missing } => {
            assert_eq!(kind, SourceKind::Sales);
            assert_eq!(missing, vec!["region", "units_sold", "price_per_unit"]);
        }
        other => panic!("expected missing columns, got {other:?}"),
    }
}

#[test]
fn detects_layout_from_header_only() {
    assert_eq!(
        detect_kind("date,product,region,units_sold,price_per_unit\n").unwrap(),
        SourceKind::Sales
    );
    assert_eq!(
        detect_kind("product,cost_per_unit,date,spoiled_units,units_produced\n").unwrap(),
        SourceKind::Production
    );
}

#[test]
fn unknown_layout_lists_missing_columns_per_layout() {
    let err = parse_source_file(&fixture("unknown_layout.csv")).expect_err("should not parse");
    match &err {
        ParserError::UnrecognizedLayout {
            sales_missing,
            production_missing,
        } => {
            assert!(!sales_missing.is_empty());
            assert!(!production_missing.is_empty());
        }
        other => panic!("expected UnrecognizedLayout, got {other:?}"),
    }
    assert!(err.to_string().contains("neither layout"));
}

#[test]
fn bad_count_reports_row_and_column() {
    let err = parse_source_file(&fixture("bad_units_sales_data.csv")).expect_err("should fail");
    match err {
        ParserError::DataRow {
            row_index, column, ..
        } => {
            assert_eq!(row_index, 2);
            assert_eq!(column, "units_sold");
        }
        other => panic!("expected DataRow error, got {other:?}"),
    }
}

#[test]
fn header_matching_ignores_case_and_order() {
    let content = "Price_Per_Unit,Region,Product,Units_Sold,Date\n$4.00,West,Porter,12,2024-02-01\n";
    let parsed = parse_source_file(content).expect("reordered sales header should parse");

    let SourceFile::Sales(rows) = parsed else {
        panic!("expected sales rows");
    };
    assert_eq!(rows[0].product, "Porter");
    assert_eq!(rows[0].price_per_unit.as_deref(), Some("$4.00"));
    assert_eq!(rows[0].units_sold, Some(12));
}

#[test]
fn blank_cells_become_missing_values() {
    let content = "date,product,units_produced,spoiled_units,cost_per_unit\n,Porter,,3,\n";
    let SourceFile::Production(rows) = parse_source_file(content).expect("parse failed") else {
        panic!("expected production rows");
    };
    assert_eq!(rows[0].date, None);
    assert_eq!(rows[0].units_produced, None);
    assert_eq!(rows[0].spoiled_units, Some(3));
    assert_eq!(rows[0].cost_per_unit, None);
}

#[test]
fn header_only_file_is_empty_data() {
    let err = parse_source_file("date,product,region,units_sold,price_per_unit\n")
        .expect_err("header-only file should fail");
    assert!(matches!(
        err,
        ParserError::EmptyData {
            kind: SourceKind::Sales
        }
    ));
}

#[test]
fn negative_counts_are_rejected() {
    let content = "date,product,region,units_sold,price_per_unit\n2024-01-01,IPA,North,-4,2.50\n";
    let err = parse_source_file(content).expect_err("negative units should fail");
    assert!(matches!(
        err,
        ParserError::DataRow {
            column: "units_sold",
            ..
        }
    ));
}
