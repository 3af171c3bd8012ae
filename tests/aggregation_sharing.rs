//! Verifies the aggregation planner actually shares work across properties
//! instead of issuing one query per property.

use dqverify::prelude::*;
use dqverify::property::Property;

fn seeded_events() -> ConnectionHandle {
    let conn = ConnectionHandle::open(&ConnectionConfig::in_memory()).unwrap();
    conn.0
        .execute_batch(
            "CREATE TABLE events (user_id VARCHAR, status VARCHAR, amount DOUBLE);
             INSERT INTO events VALUES
                ('u1', 'A', 1.0),
                ('u2', 'B', 2.0),
                ('u2', 'B', 3.0),
                ('u3', 'C', 4.0),
                ('u3', 'C', 5.0);",
        )
        .unwrap();
    conn
}

#[test]
fn scan_shareable_properties_collapse_into_one_query() {
    let conn = seeded_events();
    let executor = DuckDbExecutor::new(conn, "events");
    let planner = AggregationPlanner::new(&executor, FrequencyTablePersistence::Temporary);

    let properties = vec![
        Property::Completeness {
            column: "status".to_string(),
            filter: None,
        },
        Property::Sum {
            column: "amount".to_string(),
            filter: None,
        },
        Property::Mean {
            column: "amount".to_string(),
            filter: None,
        },
        Property::Minimum {
            column: "amount".to_string(),
            filter: None,
        },
        Property::Maximum {
            column: "amount".to_string(),
            filter: None,
        },
    ];

    let (states, diagnostics) = planner.plan(&properties).unwrap();
    assert_eq!(states.len(), properties.len());
    assert_eq!(diagnostics.scan_queries, 1, "five scan-shareable properties should ride a single shared scan");
    assert_eq!(diagnostics.grouping_buckets, 0);
}

#[test]
fn grouping_shareable_properties_over_same_key_share_one_frequency_table() {
    let conn = seeded_events();
    let executor = DuckDbExecutor::new(conn, "events");
    let planner = AggregationPlanner::new(&executor, FrequencyTablePersistence::Temporary);

    let properties = vec![
        Property::Uniqueness {
            columns: vec!["user_id".to_string()],
            filter: None,
        },
        Property::Distinctness {
            columns: vec!["user_id".to_string()],
            filter: None,
        },
        Property::UniqueValueRatio {
            columns: vec!["user_id".to_string()],
            filter: None,
        },
    ];

    let (states, diagnostics) = planner.plan(&properties).unwrap();
    assert_eq!(states.len(), 3);
    assert_eq!(
        diagnostics.grouping_buckets, 1,
        "three properties over the same (columns, filter) key should share one materialized frequency table"
    );
}

#[test]
fn distinct_grouping_keys_each_get_their_own_bucket() {
    let conn = seeded_events();
    let executor = DuckDbExecutor::new(conn, "events");
    let planner = AggregationPlanner::new(&executor, FrequencyTablePersistence::Temporary);

    let properties = vec![
        Property::Uniqueness {
            columns: vec!["user_id".to_string()],
            filter: None,
        },
        Property::Uniqueness {
            columns: vec!["status".to_string()],
            filter: None,
        },
    ];

    let (_states, diagnostics) = planner.plan(&properties).unwrap();
    assert_eq!(diagnostics.grouping_buckets, 2);
}
