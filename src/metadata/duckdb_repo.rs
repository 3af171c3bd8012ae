//! A [`MetadataRepository`] backed by DuckDB tables.

use crate::check::CheckStatus;
use crate::connection::ConnectionHandle;
use crate::error::DqResult;
use crate::metadata::repository::{MetadataRepository, RunId, RunRecord};
use crate::state::State;

const SCHEMA_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS dq_validation_runs (
    run_id VARCHAR PRIMARY KEY,
    dataset VARCHAR NOT NULL,
    started_at TIMESTAMP NOT NULL DEFAULT current_timestamp,
    status VARCHAR NOT NULL
);
CREATE TABLE IF NOT EXISTS dq_checks (
    run_id VARCHAR NOT NULL,
    check_name VARCHAR NOT NULL,
    level VARCHAR NOT NULL,
    status VARCHAR NOT NULL
);
CREATE TABLE IF NOT EXISTS dq_metrics (
    run_id VARCHAR NOT NULL,
    property_id VARCHAR NOT NULL,
    name VARCHAR NOT NULL,
    instance VARCHAR NOT NULL,
    entity VARCHAR NOT NULL,
    value_json VARCHAR NOT NULL
);
CREATE TABLE IF NOT EXISTS dq_states (
    run_id VARCHAR NOT NULL,
    dataset VARCHAR NOT NULL,
    property_id VARCHAR NOT NULL,
    state_json VARCHAR NOT NULL
);
"#;

/// A [`MetadataRepository`] backed by DuckDB tables living on a connection.
///
/// The connection may or may not be the same connection the verification
/// run's [`crate::sql::executor::DuckDbExecutor`] uses: when it is, grouping
/// frequency tables can be `TEMP` (see
/// [`crate::sql::aggregation::FrequencyTablePersistence`]), since both sides
/// of the run see the same session. When it isn't (e.g. a separate metadata
/// database file), they must be durable tables instead.
pub struct DuckDbMetadataRepository {
    connection: ConnectionHandle,
}

impl DuckDbMetadataRepository {
    pub fn new(connection: ConnectionHandle) -> DqResult<Self> {
        connection.0.execute_batch(SCHEMA_DDL)?;
        Ok(Self { connection })
    }

    pub fn connection_handle(&self) -> &ConnectionHandle {
        &self.connection
    }

    fn status_str(status: CheckStatus) -> &'static str {
        match status {
            CheckStatus::Success => "Success",
            CheckStatus::Warning => "Warning",
            CheckStatus::Error => "Error",
        }
    }
}

impl MetadataRepository for DuckDbMetadataRepository {
    fn save_run(&self, record: &RunRecord) -> DqResult<()> {
        let conn = &self.connection.0;
        conn.execute(
            "INSERT INTO dq_validation_runs (run_id, dataset, status) VALUES (?, ?, ?)",
            duckdb::params![
                record.run_id.0,
                record.dataset,
                Self::status_str(record.status)
            ],
        )?;

        for check in &record.checks {
            conn.execute(
                "INSERT INTO dq_checks (run_id, check_name, level, status) VALUES (?, ?, ?, ?)",
                duckdb::params![
                    record.run_id.0,
                    check.check_name,
                    format!("{:?}", check.level),
                    Self::status_str(check.status)
                ],
            )?;
        }

        let property_ids: Vec<String> = if record.metrics.len() == record.states.len() {
            record.states.iter().map(|s| s.id().to_string()).collect()
        } else {
            vec![String::new(); record.metrics.len()]
        };

        for (metric, property_id) in record.metrics.iter().zip(property_ids.iter()) {
            let value_json = serde_json::to_string(&metric.value)?;
            conn.execute(
                "INSERT INTO dq_metrics (run_id, property_id, name, instance, entity, value_json) VALUES (?, ?, ?, ?, ?, ?)",
                duckdb::params![
                    record.run_id.0,
                    property_id,
                    metric.name,
                    metric.instance,
                    format!("{:?}", metric.entity),
                    value_json
                ],
            )?;
        }

        for state in &record.states {
            let state_json = serde_json::to_string(state)?;
            conn.execute(
                "INSERT INTO dq_states (run_id, dataset, property_id, state_json) VALUES (?, ?, ?, ?)",
                duckdb::params![record.run_id.0, record.dataset, state.id().to_string(), state_json],
            )?;
        }

        Ok(())
    }

    fn latest_states(&self, dataset: &str) -> DqResult<Vec<State>> {
        let conn = &self.connection.0;
        let mut stmt = conn.prepare(
            "SELECT s.state_json FROM dq_states s
             JOIN dq_validation_runs r ON s.run_id = r.run_id
             WHERE s.dataset = ?
             AND r.started_at = (SELECT max(started_at) FROM dq_validation_runs WHERE dataset = ?)",
        )?;
        let rows = stmt.query_map(duckdb::params![dataset, dataset], |row| {
            let json: String = row.get(0)?;
            Ok(json)
        })?;
        let mut states = Vec::new();
        for row in rows {
            let json = row?;
            states.push(serde_json::from_str(&json)?);
        }
        Ok(states)
    }

    fn run_history(&self, dataset: &str) -> DqResult<Vec<RunId>> {
        let conn = &self.connection.0;
        let mut stmt = conn.prepare(
            "SELECT run_id FROM dq_validation_runs WHERE dataset = ? ORDER BY started_at",
        )?;
        let rows = stmt.query_map(duckdb::params![dataset], |row| {
            let id: String = row.get(0)?;
            Ok(id)
        })?;
        let mut ids = Vec::new();
        for row in rows {
            ids.push(RunId(row?));
        }
        Ok(ids)
    }
}

