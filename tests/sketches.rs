//! Sketch-backed properties: quantile and approximate distinctness fold raw
//! column values client-side rather than riding the shared SQL scan.

use dqverify::prelude::*;
use dqverify::property::Property;

fn seeded_values() -> ConnectionHandle {
    let conn = ConnectionHandle::open(&ConnectionConfig::in_memory()).unwrap();
    conn.0
        .execute_batch(
            "CREATE TABLE measurements (reading DOUBLE, tag VARCHAR);
             INSERT INTO measurements
             SELECT i::DOUBLE, 'tag_' || (i % 10)::VARCHAR FROM range(1, 1001) t(i);",
        )
        .unwrap();
    conn
}

#[test]
fn quantile_sketch_estimates_median_within_tolerance() {
    let conn = seeded_values();
    let executor = DuckDbExecutor::new(conn, "measurements");
    let planner = AggregationPlanner::new(&executor, FrequencyTablePersistence::Temporary);

    let property = Property::Quantile {
        column: "reading".to_string(),
        quantile: 0.5,
        filter: None,
    };
    let (states, diagnostics) = planner.plan(&[property.clone()]).unwrap();
    assert_eq!(diagnostics.sketch_passes, 1);
    assert_eq!(states.len(), 1);

    let metric = dqverify::evaluate::evaluate_metric(&property, &states[0]);
    let median = metric.value.unwrap().as_double().unwrap();
    assert!((median - 500.0).abs() < 25.0, "median estimate {median} too far from 500");
}

#[test]
fn approx_distinctness_estimates_cardinality_within_tolerance() {
    let conn = seeded_values();
    let executor = DuckDbExecutor::new(conn, "measurements");
    let planner = AggregationPlanner::new(&executor, FrequencyTablePersistence::Temporary);

    let property = Property::ApproxDistinctness {
        columns: vec!["tag".to_string()],
        filter: None,
    };
    let (states, _diagnostics) = planner.plan(&[property.clone()]).unwrap();

    let metric = dqverify::evaluate::evaluate_metric(&property, &states[0]);
    let ratio = metric.value.unwrap().as_double().unwrap();
    // 10 distinct tags among 1000 rows; HyperLogLog should land close to
    // that cardinality, so the reported ratio should be near 10/1000.
    let expected = 10.0 / 1000.0;
    assert!((ratio - expected).abs() < 0.003, "distinctness ratio {ratio} too far from {expected}");
}
