//! Partition equivalence: verifying each partition separately and merging
//! the persisted states should match verifying the union in one pass.

use dqverify::prelude::*;
use dqverify::property::Property;

fn open_with(sql: &str) -> ConnectionHandle {
    let conn = ConnectionHandle::open(&ConnectionConfig::in_memory()).unwrap();
    conn.0.execute_batch(sql).unwrap();
    conn
}

fn sum_suite() -> [CheckSpec; 1] {
    [CheckSpec::new("sum", CheckLevel::Error).with_constraint(
        Property::Sum {
            column: "amount".to_string(),
            filter: None,
        },
        Constraint::on_value("always true", |_| true),
    )]
}

#[test]
fn merging_two_partitions_matches_verifying_their_union() {
    // Partition 1 and partition 2, verified and merged incrementally.
    let part1 = open_with(
        "CREATE TABLE part1 (amount DOUBLE); INSERT INTO part1 VALUES (1.0), (2.0), (3.0);",
    );
    let part2 = open_with(
        "CREATE TABLE part2 (amount DOUBLE); INSERT INTO part2 VALUES (4.0), (5.0);",
    );
    let repo = DuckDbMetadataRepository::new(
        ConnectionHandle::open(&ConnectionConfig::in_memory()).unwrap(),
    )
    .unwrap();

    let executor1 = DuckDbExecutor::new(part1, "part1");
    let run1 = VerificationRun::new(&executor1, &repo, "amounts");
    run1.run(&sum_suite()).unwrap();

    let executor2 = DuckDbExecutor::new(part2, "part2");
    let run2 = VerificationRun::new(&executor2, &repo, "amounts");
    let merged_result = run2.run_incremental(&sum_suite()).unwrap();

    let merged_sum = merged_result.check_results[0].constraint_results[0]
        .metric
        .value
        .as_ref()
        .unwrap()
        .as_double()
        .unwrap();

    // Verifying the union directly.
    let union = open_with(
        "CREATE TABLE whole (amount DOUBLE); INSERT INTO whole VALUES (1.0), (2.0), (3.0), (4.0), (5.0);",
    );
    let union_executor = DuckDbExecutor::new(union, "whole");
    let union_repo = InMemoryMetadataRepository::new();
    let union_run = VerificationRun::new(&union_executor, &union_repo, "whole");
    let union_result = union_run.run(&sum_suite()).unwrap();
    let union_sum = union_result.check_results[0].constraint_results[0]
        .metric
        .value
        .as_ref()
        .unwrap()
        .as_double()
        .unwrap();

    assert!((merged_sum - union_sum).abs() < 1e-9, "merged={merged_sum} union={union_sum}");
    assert!((union_sum - 15.0).abs() < 1e-9);
}

#[test]
fn run_history_grows_with_each_run() {
    let conn = open_with("CREATE TABLE t (amount DOUBLE); INSERT INTO t VALUES (1.0);");
    let repo = DuckDbMetadataRepository::new(
        ConnectionHandle::open(&ConnectionConfig::in_memory()).unwrap(),
    )
    .unwrap();
    let executor = DuckDbExecutor::new(conn, "t");
    let run = VerificationRun::new(&executor, &repo, "t_dataset");

    run.run(&sum_suite()).unwrap();
    run.run(&sum_suite()).unwrap();

    assert_eq!(repo.run_history("t_dataset").unwrap().len(), 2);
}
