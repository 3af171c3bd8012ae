//! Checks: named groups of constraints evaluated at a severity level, and
//! the status-composition rules that roll constraint outcomes up into a
//! check status and a check status up into a verification-run status.

use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::metric::Metric;

/// The severity a check's constraints are evaluated at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CheckLevel {
    Warning,
    Error,
}

/// The outcome of evaluating a check (or an entire verification run).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckStatus {
    Success,
    Warning,
    Error,
}

impl CheckStatus {
    /// Compose two statuses, keeping the more severe. `Success` is the
    /// identity element: composing with it never changes the other side.
    pub fn compose(self, other: CheckStatus) -> CheckStatus {
        use CheckStatus::*;
        match (self, other) {
            (Error, _) | (_, Error) => Error,
            (Warning, _) | (_, Warning) => Warning,
            (Success, Success) => Success,
        }
    }
}

/// A single assertion over one metric's value.
///
/// The assertion is reference-counted rather than boxed so a
/// [`crate::run::CheckSpec`] built once can be evaluated by reference
/// without re-deriving its closures.
#[derive(Clone)]
pub struct Constraint {
    pub name: String,
    pub assertion: Rc<dyn Fn(&Metric) -> bool>,
}

impl std::fmt::Debug for Constraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Constraint").field("name", &self.name).finish()
    }
}

impl Constraint {
    pub fn new(name: impl Into<String>, assertion: impl Fn(&Metric) -> bool + 'static) -> Self {
        Self {
            name: name.into(),
            assertion: Rc::new(assertion),
        }
    }

    /// A constraint asserting a double-valued metric satisfies a predicate.
    pub fn on_value(name: impl Into<String>, predicate: impl Fn(f64) -> bool + 'static) -> Self {
        Self::new(name, move |metric| match &metric.value {
            Ok(value) => value.as_double().is_some_and(&predicate),
            Err(_) => false,
        })
    }

    pub fn evaluate(&self, metric: &Metric) -> ConstraintResult {
        ConstraintResult {
            name: self.name.clone(),
            status: if (self.assertion)(metric) {
                ConstraintStatus::Success
            } else {
                ConstraintStatus::Failure
            },
            metric: metric.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstraintStatus {
    Success,
    Failure,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstraintResult {
    pub name: String,
    pub status: ConstraintStatus,
    pub metric: Metric,
}

/// A named group of constraints evaluated together at one severity level.
pub struct Check {
    pub name: String,
    pub level: CheckLevel,
    pub constraints: Vec<Constraint>,
}

impl Check {
    pub fn new(name: impl Into<String>, level: CheckLevel) -> Self {
        Self {
            name: name.into(),
            level,
            constraints: Vec::new(),
        }
    }

    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// Evaluate every constraint against the metrics keyed by the
    /// constraint's metric index (by position). Callers build `metrics` to
    /// line up with `self.constraints`.
    pub fn evaluate(&self, metrics: &[Metric]) -> CheckResult {
        let results: Vec<ConstraintResult> = self
            .constraints
            .iter()
            .zip(metrics.iter())
            .map(|(c, m)| c.evaluate(m))
            .collect();

        let any_failure = results.iter().any(|r| r.status == ConstraintStatus::Failure);
        let status = if !any_failure {
            CheckStatus::Success
        } else {
            match self.level {
                CheckLevel::Warning => CheckStatus::Warning,
                CheckLevel::Error => CheckStatus::Error,
            }
        };

        CheckResult {
            check_name: self.name.clone(),
            level: self.level,
            status,
            constraint_results: results,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
    pub check_name: String,
    pub level: CheckLevel,
    pub status: CheckStatus,
    pub constraint_results: Vec<ConstraintResult>,
}

/// The outcome of running an entire suite of checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationResult {
    pub status: CheckStatus,
    pub check_results: Vec<CheckResult>,
}

impl VerificationResult {
    /// Compose a suite's overall status from its check results. An empty
    /// suite succeeds vacuously.
    pub fn from_check_results(check_results: Vec<CheckResult>) -> Self {
        let status = check_results
            .iter()
            .fold(CheckStatus::Success, |acc, r| acc.compose(r.status));
        Self {
            status,
            check_results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metric::{Entity, MetricValue};

    fn double_metric(value: f64) -> Metric {
        Metric::success("m", "i", Entity::Dataset, MetricValue::Double(value))
    }

    #[test]
    fn status_composition_promotes_warning_then_error() {
        let mut status = CheckStatus::Success;
        status = status.compose(CheckStatus::Warning);
        assert_eq!(status, CheckStatus::Warning);
        status = status.compose(CheckStatus::Error);
        assert_eq!(status, CheckStatus::Error);
    }

    #[test]
    fn empty_suite_succeeds() {
        let result = VerificationResult::from_check_results(vec![]);
        assert_eq!(result.status, CheckStatus::Success);
    }

    #[test]
    fn failing_warning_check_does_not_escalate_to_error() {
        let check = Check::new("completeness check", CheckLevel::Warning)
            .with_constraint(Constraint::on_value("completeness >= 0.9", |v| v >= 0.9));
        let result = check.evaluate(&[double_metric(0.8)]);
        assert_eq!(result.status, CheckStatus::Warning);
    }

    #[test]
    fn passing_check_succeeds() {
        let check = Check::new("completeness check", CheckLevel::Error)
            .with_constraint(Constraint::on_value("completeness >= 0.5", |v| v >= 0.5));
        let result = check.evaluate(&[double_metric(0.8)]);
        assert_eq!(result.status, CheckStatus::Success);
    }
}
