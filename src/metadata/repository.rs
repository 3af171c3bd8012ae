//! The metadata repository: persists verification runs, check results,
//! metrics, and states so later runs can merge into prior state instead of
//! recomputing from scratch.
//!
//! Schema (one row per entity, `run_id` a UUID rendered with underscores in
//! place of hyphens so it's a valid SQL identifier suffix, `property_id` the
//! decimal string of [`crate::property::Property::property_identifier`]):
//!
//! - `dq_validation_runs(run_id, dataset, started_at, status)`
//! - `dq_checks(run_id, check_name, level, status)`
//! - `dq_metrics(run_id, property_id, name, instance, entity, value_json)`
//! - `dq_states(run_id, property_id, state_json)`
//! - `dq_state_freq_<hash>(grouping_cols..., num_rows)` — one per distinct
//!   grouping key, created by the aggregation planner itself.

use uuid::Uuid;

use crate::check::CheckResult;
use crate::error::DqResult;
use crate::metric::Metric;
use crate::state::State;

/// A run identifier: a UUID rendered with underscores so it can be embedded
/// directly in SQL identifiers (e.g. a per-run staging table name).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RunId(pub String);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string().replace('-', "_"))
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Everything persisted about one verification run.
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub run_id: RunId,
    pub dataset: String,
    pub status: crate::check::CheckStatus,
    pub checks: Vec<CheckResult>,
    pub metrics: Vec<Metric>,
    pub states: Vec<State>,
}

/// Persists and retrieves verification run metadata and intermediate
/// states, so a later run can merge into a prior run's state rather than
/// recompute it from scratch.
pub trait MetadataRepository {
    fn save_run(&self, record: &RunRecord) -> DqResult<()>;

    /// The states persisted by the most recent run over `dataset`, if any,
    /// keyed by the property ids they were computed for.
    fn latest_states(&self, dataset: &str) -> DqResult<Vec<State>>;

    fn run_history(&self, dataset: &str) -> DqResult<Vec<RunId>>;
}
