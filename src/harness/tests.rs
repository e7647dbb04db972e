use std::time::Duration;

use crate::{
    config::HarnessConfig,
    row,
    sqlite::{
        error::{ConnectionError, QueryError},
        record::CellValue,
        snapshot::SnapshotStore,
    },
    test_support::catalog_store,
};

use super::{
    case::{diff_row, diff_rows},
    catalog, Abort, CaseOutcome, Mismatch, QueryCase, Suite,
};

const TIMEOUT: Duration = Duration::from_secs(10);

fn synthetic_catalog_suite() -> Suite {
    Suite::new("synthetic catalog", "03", "04", TIMEOUT)
        .case(QueryCase::single_row(
            "free apps",
            catalog::FREE_APPS_QUERY,
            row! { "count" => 3 },
        ))
        .case(QueryCase::rows(
            "top categories",
            catalog::TOP_CATEGORIES_QUERY,
            vec![
                row! { "count" => 4, "category" => "Store design" },
                row! { "count" => 3, "category" => "Sales and conversion optimization" },
                row! { "count" => 2, "category" => "Marketing" },
            ],
        ))
        .case(QueryCase::rows(
            "top prices",
            catalog::TOP_PRICES_QUERY,
            vec![
                row! { "count" => 4, "price" => "$9.99/month", "casted_price" => 9.99 },
                row! { "count" => 2, "price" => "$5/month", "casted_price" => 5.0 },
                row! { "count" => 1, "price" => "$10/month", "casted_price" => 10.0 },
            ],
        ))
}

#[test]
fn suite_passes_on_matching_dataset() {
    let (_dir, store) = catalog_store();

    let report = synthetic_catalog_suite().run(&store);
    assert!(report.is_success(), "{report:?}");
    assert_eq!(report.passed(), 3);
    assert!(report.abort.is_none());

    // The suite works on its own copy of the source stage.
    assert!(store.locate("04").is_ok());
}

#[test]
fn failures_and_errors_do_not_stop_the_suite() {
    let (_dir, store) = catalog_store();
    let suite = Suite::new("mixed", "03", "04", TIMEOUT)
        .case(QueryCase::single_row(
            "wrong count",
            "SELECT COUNT(*) as count FROM apps",
            row! { "count" => 7 },
        ))
        .case(QueryCase::single_row(
            "bad column",
            "SELECT COUNT(nope) as count FROM apps",
            row! { "count" => 6 },
        ))
        .case(QueryCase::single_row(
            "too many rows",
            "SELECT id FROM apps",
            row! { "id" => 1 },
        ))
        .case(QueryCase::single_row(
            "right count",
            "SELECT COUNT(*) as count FROM apps",
            row! { "count" => 6 },
        ));

    let report = suite.run(&store);
    assert!(!report.is_success());
    assert_eq!(
        (report.passed(), report.failed(), report.errored(), report.skipped()),
        (1, 1, 2, 0)
    );

    match &report.case("wrong count").unwrap().outcome {
        CaseOutcome::Failed(Mismatch::Value {
            column,
            expected,
            actual,
            ..
        }) => {
            assert_eq!(column, "count");
            assert_eq!(expected, &CellValue::Int(7));
            assert_eq!(actual, &CellValue::Int(6));
        }
        other => panic!("unexpected outcome {other:?}"),
    }
    assert!(matches!(
        report.case("bad column").unwrap().outcome,
        CaseOutcome::Errored(QueryError::Execution { .. })
    ));
    assert!(matches!(
        report.case("too many rows").unwrap().outcome,
        CaseOutcome::Errored(QueryError::RowCount { actual: 6, .. })
    ));
}

#[test]
fn missing_snapshot_skips_every_case() {
    let dir = tempfile::tempdir().unwrap();
    let store = SnapshotStore::new(dir.path());

    let report = synthetic_catalog_suite().run(&store);
    assert!(!report.is_success());
    assert_eq!(report.skipped(), 3);
    assert!(matches!(report.abort, Some(Abort::Connection(_))));
}

#[test]
fn empty_snapshot_skips_every_case() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("03.db"), b"").unwrap();
    let store = SnapshotStore::new(dir.path());

    let report = synthetic_catalog_suite().run(&store);
    assert_eq!(report.skipped(), 3);
    assert!(matches!(
        report.abort,
        Some(Abort::Connection(ConnectionError::EmptySnapshot { .. }))
    ));
}

#[test]
fn timeout_aborts_remaining_cases() {
    let (_dir, store) = catalog_store();
    let suite = Suite::new("runaway", "03", "04", Duration::from_millis(200))
        .case(QueryCase::single_row(
            "endless",
            "WITH RECURSIVE counter(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM counter)
             SELECT COUNT(*) as count FROM counter",
            row! { "count" => 0 },
        ))
        .case(QueryCase::single_row(
            "never reached",
            "SELECT COUNT(*) as count FROM apps",
            row! { "count" => 6 },
        ));

    let report = suite.run(&store);
    assert!(matches!(
        report.case("endless").unwrap().outcome,
        CaseOutcome::Errored(QueryError::Timeout { .. })
    ));
    assert!(matches!(
        report.case("never reached").unwrap().outcome,
        CaseOutcome::Skipped
    ));
    assert!(matches!(report.abort, Some(Abort::CaseTimedOut { ref case }) if case == "endless"));
}

#[test]
fn report_renders_as_tree() {
    let (_dir, store) = catalog_store();
    let suite = synthetic_catalog_suite().case(QueryCase::single_row(
        "stale expectation",
        "SELECT COUNT(*) as count FROM categories",
        row! { "count" => 5 },
    ));

    let report = suite.run(&store);
    let mut out = Vec::new();
    report.write_to(&mut out).unwrap();
    let text = String::from_utf8(out).unwrap();

    assert!(text.contains("synthetic catalog (3 passed, 1 failed, 0 errored, 0 skipped"));
    assert!(text.contains("[PASS] free apps"));
    assert!(text.contains("[FAIL] stale expectation"));
    assert!(text.contains(r#"row 0, column "count": expected 5 (integer), got 4 (integer)"#));
}

#[test]
fn diff_spots_missing_and_extra_columns() {
    let expected = row! { "count" => 1, "category" => "Marketing" };

    assert_eq!(
        diff_row(0, &expected, &row! { "count" => 1 }),
        Some(Mismatch::MissingColumn {
            row: 0,
            column: "category".into()
        })
    );
    assert_eq!(
        diff_row(
            2,
            &expected,
            &row! { "count" => 1, "category" => "Marketing", "extra" => 0 }
        ),
        Some(Mismatch::UnexpectedColumn {
            row: 2,
            column: "extra".into()
        })
    );
    assert_eq!(
        diff_row(0, &expected, &row! { "category" => "Marketing", "count" => 1 }),
        None
    );
}

#[test]
fn repeated_alias_is_an_unexpected_column() {
    let expected = row! { "count" => 6 };
    let repeated = row! { "count" => 6, "count" => 7 };
    let unexpected = Some(Mismatch::UnexpectedColumn {
        row: 0,
        column: "count".into(),
    });

    assert_ne!(expected, repeated);
    assert_eq!(diff_row(0, &expected, &repeated), unexpected);
    assert_eq!(diff_rows(&[expected.clone()], &[repeated]), unexpected);

    let (_dir, store) = catalog_store();
    let report = Suite::new("aliases", "03", "04", TIMEOUT)
        .case(QueryCase::single_row(
            "repeated alias",
            "SELECT 6 as count, 7 as count",
            expected,
        ))
        .run(&store);
    assert!(matches!(
        report.case("repeated alias").unwrap().outcome,
        CaseOutcome::Failed(Mismatch::UnexpectedColumn { ref column, .. }) if column == "count"
    ));
}

#[test]
fn diff_distinguishes_order_from_content() {
    let a = row! { "count" => 2, "category" => "Marketing" };
    let b = row! { "count" => 1, "category" => "Inventory management" };

    assert_eq!(diff_rows(&[a.clone(), b.clone()], &[a.clone(), b.clone()]), None);
    assert_eq!(
        diff_rows(&[a.clone(), b.clone()], &[b.clone(), a.clone()]),
        Some(Mismatch::Order {
            row: 0,
            expected: a.clone(),
            actual: b.clone()
        })
    );
    assert_eq!(
        diff_rows(&[a.clone(), b.clone()], &[a.clone()]),
        Some(Mismatch::RowCount {
            expected: 2,
            actual: 1
        })
    );
    assert!(matches!(
        diff_rows(&[a.clone(), b], &[a, row! { "count" => 1, "category" => "Apps" }]),
        Some(Mismatch::Value { row: 1, .. })
    ));
}

#[test]
fn integer_and_real_are_not_interchangeable() {
    assert_eq!(
        diff_row(0, &row! { "casted_price" => 5 }, &row! { "casted_price" => 5.0 }),
        Some(Mismatch::Value {
            row: 0,
            column: "casted_price".into(),
            expected: CellValue::Int(5),
            actual: CellValue::Float(5.0),
        })
    );
}

#[test]
fn catalog_suite_declares_dataset_expectations() {
    let suite = catalog::queries_across_tables(TIMEOUT);
    assert_eq!(suite.source, catalog::SOURCE_STAGE);
    assert_eq!(suite.destination, catalog::DESTINATION_STAGE);
    assert_eq!(suite.cases.len(), 3);
    assert_eq!(
        suite.cases[0].expected,
        super::Expected::SingleRow(row! { "count" => 1112 })
    );
}

#[test]
#[ignore = "needs the production snapshots in APP_STORE_SNAPSHOT_DIR"]
fn production_catalog_suite_passes() {
    let config = HarnessConfig::from_env().unwrap();
    let store = SnapshotStore::new(&config.snapshot_dir);

    let report = catalog::queries_across_tables(config.case_timeout).run(&store);
    report.print().unwrap();
    assert!(report.is_success());
}
