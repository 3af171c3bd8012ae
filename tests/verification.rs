//! End-to-end verification runs against a seeded in-memory DuckDB table.

use dqverify::prelude::*;
use dqverify::property::Property;

fn seeded_orders() -> ConnectionHandle {
    let conn = ConnectionHandle::open(&ConnectionConfig::in_memory()).unwrap();
    conn.0
        .execute_batch(
            "CREATE TABLE orders (id INTEGER, amount DOUBLE, region VARCHAR);
             INSERT INTO orders VALUES
                (1, 10.0, 'A'),
                (2, 20.0, 'B'),
                (3, NULL, 'B'),
                (4, 40.0, 'C'),
                (5, NULL, 'C');",
        )
        .unwrap();
    conn
}

#[test]
fn completeness_reflects_null_ratio() {
    let conn = seeded_orders();
    let executor = DuckDbExecutor::new(conn, "orders");
    let suite = [CheckSpec::new("completeness", CheckLevel::Error).with_constraint(
        Property::Completeness {
            column: "amount".to_string(),
            filter: None,
        },
        Constraint::on_value("amount complete >= 0.5", |v| v >= 0.5),
    )];

    let repo = InMemoryMetadataRepository::new();
    let run = VerificationRun::new(&executor, &repo, "orders");
    let result = run.run(&suite).unwrap();

    assert_eq!(result.status, CheckStatus::Success);
    let metric = &result.check_results[0].constraint_results[0].metric;
    let value = metric.value.as_ref().unwrap().as_double().unwrap();
    assert!((value - 0.6).abs() < 1e-9, "expected 3/5 = 0.6, got {value}");
}

#[test]
fn filtered_maximum_over_zero_matching_rows_fails() {
    let conn = seeded_orders();
    let executor = DuckDbExecutor::new(conn, "orders");
    let suite = [CheckSpec::new("no orders above 1000", CheckLevel::Error).with_constraint(
        Property::Maximum {
            column: "amount".to_string(),
            filter: Some("amount > 1000".to_string()),
        },
        Constraint::on_value("max <= 2000", |v| v <= 2000.0),
    )];

    let repo = InMemoryMetadataRepository::new();
    let run = VerificationRun::new(&executor, &repo, "orders");
    let result = run.run(&suite).unwrap();

    // No row matches the filter, so the metric must fail rather than report
    // a spurious zero that would vacuously satisfy the constraint.
    assert_eq!(result.status, CheckStatus::Error);
    let metric = &result.check_results[0].constraint_results[0].metric;
    assert!(metric.value.is_err());
}

#[test]
fn empty_suite_succeeds_against_a_real_connection() {
    let conn = seeded_orders();
    let executor = DuckDbExecutor::new(conn, "orders");
    let repo = InMemoryMetadataRepository::new();
    let run = VerificationRun::new(&executor, &repo, "orders");
    let result = run.run(&[]).unwrap();
    assert_eq!(result.status, CheckStatus::Success);
    assert!(result.check_results.is_empty());
}

#[test]
fn warning_level_check_does_not_escalate_run_status_to_error() {
    let conn = seeded_orders();
    let executor = DuckDbExecutor::new(conn, "orders");
    let suite = [
        CheckSpec::new("strict completeness (warning)", CheckLevel::Warning).with_constraint(
            Property::Completeness {
                column: "amount".to_string(),
                filter: None,
            },
            Constraint::on_value("amount complete == 1.0", |v| v >= 0.999),
        ),
        CheckSpec::new("region present", CheckLevel::Error).with_constraint(
            Property::Completeness {
                column: "region".to_string(),
                filter: None,
            },
            Constraint::on_value("region complete == 1.0", |v| v >= 0.999),
        ),
    ];

    let repo = InMemoryMetadataRepository::new();
    let run = VerificationRun::new(&executor, &repo, "orders");
    let result = run.run(&suite).unwrap();

    assert_eq!(result.check_results[0].status, CheckStatus::Warning);
    assert_eq!(result.check_results[1].status, CheckStatus::Success);
    assert_eq!(result.status, CheckStatus::Warning);
}
