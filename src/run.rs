//! Verification run orchestration: ties the aggregation planner, the merge
//! algebra, and check evaluation into a single "verify this dataset"
//! operation, with an optional incremental path that merges into a prior
//! run's persisted state instead of recomputing it.

use std::collections::HashMap;

use crate::check::{Check, CheckResult, CheckStatus, Constraint, VerificationResult};
use crate::error::DqResult;
use crate::evaluate::evaluate_metric;
use crate::merge;
use crate::metadata::repository::{MetadataRepository, RunId, RunRecord};
use crate::metric::Metric;
use crate::property::Property;
use crate::sql::aggregation::{AggregationPlanner, FrequencyTablePersistence};
use crate::sql::executor::SqlExecutor;
use crate::state::State;

/// One constraint plus the property whose metric it asserts over.
pub struct ConstraintSpec {
    pub property: Property,
    pub constraint: Constraint,
}

/// A check as the caller declares it: a name, a level, and the
/// property-bound constraints it asserts.
pub struct CheckSpec {
    pub name: String,
    pub level: CheckLevel,
    pub constraints: Vec<ConstraintSpec>,
}

pub use crate::check::CheckLevel;

impl CheckSpec {
    pub fn new(name: impl Into<String>, level: CheckLevel) -> Self {
        Self {
            name: name.into(),
            level,
            constraints: Vec::new(),
        }
    }

    pub fn with_constraint(mut self, property: Property, constraint: Constraint) -> Self {
        self.constraints.push(ConstraintSpec { property, constraint });
        self
    }

    fn properties(&self) -> impl Iterator<Item = &Property> {
        self.constraints.iter().map(|c| &c.property)
    }
}

/// Runs a suite of [`CheckSpec`]s against a dataset, persisting the result.
pub struct VerificationRun<'a> {
    executor: &'a dyn SqlExecutor,
    repository: &'a dyn MetadataRepository,
    dataset: String,
}

impl<'a> VerificationRun<'a> {
    pub fn new(executor: &'a dyn SqlExecutor, repository: &'a dyn MetadataRepository, dataset: impl Into<String>) -> Self {
        Self {
            executor,
            repository,
            dataset: dataset.into(),
        }
    }

    /// Compute every property this suite needs from scratch and evaluate
    /// its checks. An empty suite trivially succeeds.
    pub fn run(&self, suite: &[CheckSpec]) -> DqResult<VerificationResult> {
        let (states, precondition_failures) = self.compute_states(suite)?;
        self.finish(suite, states, precondition_failures, RunId::new())
    }

    /// Like [`Self::run`], but merges newly computed states into the
    /// dataset's most recently persisted states before evaluating checks —
    /// the incremental path, for datasets verified repeatedly as new
    /// partitions arrive.
    pub fn run_incremental(&self, suite: &[CheckSpec]) -> DqResult<VerificationResult> {
        let (fresh_states, precondition_failures) = self.compute_states(suite)?;
        let prior_states = self.repository.latest_states(&self.dataset)?;

        let mut by_id: HashMap<u64, Vec<State>> = HashMap::new();
        for state in prior_states.into_iter().chain(fresh_states) {
            by_id.entry(state.id()).or_default().push(state);
        }

        let mut merged = Vec::with_capacity(by_id.len());
        for (_, states) in by_id {
            if let Some(state) = merge::merge_all(states)? {
                merged.push(state);
            }
        }

        self.finish(suite, merged, precondition_failures, RunId::new())
    }

    /// Compute states for every property this suite needs, first filtering
    /// out properties whose schema preconditions fail against the dataset:
    /// those never reach the aggregation planner at all, and instead get a
    /// `PreconditionNotMet` failure metric synthesized directly.
    fn compute_states(&self, suite: &[CheckSpec]) -> DqResult<(Vec<State>, HashMap<u64, Metric>)> {
        let mut properties: Vec<Property> = Vec::new();
        let mut seen = std::collections::HashSet::new();
        for check in suite {
            for property in check.properties() {
                if seen.insert(property.property_identifier()) {
                    properties.push(property.clone());
                }
            }
        }
        if properties.is_empty() {
            return Ok((Vec::new(), HashMap::new()));
        }

        let schema = self.executor.schema()?;
        let mut plannable = Vec::new();
        let mut precondition_failures = HashMap::new();
        for property in properties {
            let unmet = property.preconditions().into_iter().find(|p| !p.is_satisfied(&schema));
            match unmet {
                Some(precondition) => {
                    let metric = Metric::failure(
                        property.name(),
                        property.instance(),
                        property.entity(),
                        precondition.describe(),
                    );
                    precondition_failures.insert(property.property_identifier(), metric);
                }
                None => plannable.push(property),
            }
        }

        if plannable.is_empty() {
            return Ok((Vec::new(), precondition_failures));
        }
        let planner = AggregationPlanner::new(self.executor, FrequencyTablePersistence::Temporary);
        let (states, _diagnostics) = planner.plan(&plannable)?;
        Ok((states, precondition_failures))
    }

    fn finish(
        &self,
        suite: &[CheckSpec],
        states: Vec<State>,
        precondition_failures: HashMap<u64, Metric>,
        run_id: RunId,
    ) -> DqResult<VerificationResult> {
        let states_by_id: HashMap<u64, State> = states.into_iter().map(|s| (s.id(), s)).collect();

        let mut all_metrics: Vec<Metric> = Vec::new();
        let mut check_results: Vec<CheckResult> = Vec::new();

        for check in suite {
            let mut metrics = Vec::with_capacity(check.constraints.len());
            for spec in &check.constraints {
                let id = spec.property.property_identifier();
                let metric = if let Some(failure) = precondition_failures.get(&id) {
                    failure.clone()
                } else if let Some(state) = states_by_id.get(&id) {
                    evaluate_metric(&spec.property, state)
                } else {
                    Metric::failure(
                        spec.property.name(),
                        spec.property.instance(),
                        spec.property.entity(),
                        "no state was computed for this property",
                    )
                };
                metrics.push(metric);
            }

            let inner_check = Check {
                name: check.name.clone(),
                level: check.level,
                constraints: check.constraints.iter().map(|spec| spec.constraint.clone()).collect(),
            };
            let result = inner_check.evaluate(&metrics);
            all_metrics.extend(metrics);
            check_results.push(result);
        }

        let verification_result = VerificationResult::from_check_results(check_results.clone());

        let record = RunRecord {
            run_id,
            dataset: self.dataset.clone(),
            status: verification_result.status,
            checks: check_results,
            metrics: all_metrics,
            states: states_by_id.into_values().collect(),
        };
        self.repository.save_run(&record)?;

        Ok(verification_result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::memory::InMemoryMetadataRepository;
    use crate::metric::MetricValue;
    use crate::operator::{AggRow, AggValue};
    use crate::sql::query::Query;
    use std::cell::RefCell;

    /// A stub executor that reports a fixed schema and refuses every other
    /// operation, so precondition filtering can be tested without a real
    /// database connection.
    struct SchemaOnlyExecutor {
        connection: crate::connection::ConnectionHandle,
        schema: indexmap::IndexMap<String, String>,
        scan_calls: RefCell<usize>,
    }

    impl SqlExecutor for SchemaOnlyExecutor {
        fn connection_handle(&self) -> &crate::connection::ConnectionHandle {
            &self.connection
        }

        fn table(&self) -> &str {
            "t"
        }

        fn schema(&self) -> DqResult<indexmap::IndexMap<String, String>> {
            Ok(self.schema.clone())
        }

        fn execute_and_fetch(&self, _query: &Query) -> DqResult<Vec<AggRow>> {
            *self.scan_calls.borrow_mut() += 1;
            let mut row = AggRow::new();
            row.insert("dummy", AggValue::Int(0));
            Ok(vec![row])
        }

        fn execute_raw(&self, _query: &Query) -> DqResult<Vec<Vec<AggValue>>> {
            Ok(Vec::new())
        }

        fn materialize(&self, _table_name: &str, _query: Query, _temporary: bool) -> DqResult<()> {
            Ok(())
        }
    }

    #[test]
    fn precondition_failure_never_reaches_the_planner() {
        let connection =
            crate::connection::ConnectionHandle::open(&crate::connection::ConnectionConfig::in_memory()).unwrap();
        let executor = SchemaOnlyExecutor {
            connection,
            schema: indexmap::IndexMap::new(), // no columns at all
            scan_calls: RefCell::new(0),
        };
        let suite = [CheckSpec::new("completeness", CheckLevel::Error).with_constraint(
            Property::Completeness {
                column: "missing_col".to_string(),
                filter: None,
            },
            Constraint::on_value("always true", |_| true),
        )];

        let repo = InMemoryMetadataRepository::new();
        let run = VerificationRun::new(&executor, &repo, "t");
        let result = run.run(&suite).unwrap();

        assert_eq!(result.status, CheckStatus::Error);
        let metric = &result.check_results[0].constraint_results[0].metric;
        assert!(metric.value.is_err());
        assert_eq!(*executor.scan_calls.borrow(), 0, "precondition-failed property must never reach the planner");
    }

    #[test]
    fn property_with_satisfied_precondition_still_computes_normally() {
        let connection =
            crate::connection::ConnectionHandle::open(&crate::connection::ConnectionConfig::in_memory()).unwrap();
        let mut schema = indexmap::IndexMap::new();
        schema.insert("amount".to_string(), "DOUBLE".to_string());
        let executor = SchemaOnlyExecutor {
            connection,
            schema,
            scan_calls: RefCell::new(0),
        };

        // Completeness only requires HasColumn, satisfied here, so this
        // reaches the (stubbed) shared scan rather than failing.
        let suite = [CheckSpec::new("completeness", CheckLevel::Error).with_constraint(
            Property::Completeness {
                column: "amount".to_string(),
                filter: None,
            },
            Constraint::on_value("always true", |_| true),
        )];

        let repo = InMemoryMetadataRepository::new();
        let run = VerificationRun::new(&executor, &repo, "t");
        let result = run.run(&suite).unwrap();
        assert!(*executor.scan_calls.borrow() >= 1);
        let _ = result;
    }

    #[test]
    fn metric_success_helper_roundtrips() {
        let metric = Metric::success("m", "i", crate::metric::Entity::Dataset, MetricValue::Double(1.0));
        assert!(metric.is_success());
    }
}
