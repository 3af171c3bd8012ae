//! Metrics: the evaluated result of a [`crate::property::Property`] over a dataset.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// The entity a property describes: a whole dataset, a single column, a pair
/// of columns, or an arbitrary set of columns (grouping keys).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Entity {
    Dataset,
    Column(String),
    TwoColumn(String, String),
    MultiColumn(Vec<String>),
}

impl Entity {
    /// Columns referenced by this entity, in a stable order.
    pub fn columns(&self) -> Vec<&str> {
        match self {
            Entity::Dataset => Vec::new(),
            Entity::Column(c) => vec![c.as_str()],
            Entity::TwoColumn(a, b) => vec![a.as_str(), b.as_str()],
            Entity::MultiColumn(cols) => cols.iter().map(String::as_str).collect(),
        }
    }
}

/// The value carried by a [`Metric`]: either a single numeric measurement or
/// a schema snapshot (column name -> declared type).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MetricValue {
    Double(f64),
    Schema(IndexMap<String, String>),
}

impl MetricValue {
    /// Extract the numeric value, if this is a [`MetricValue::Double`].
    pub fn as_double(&self) -> Option<f64> {
        match self {
            MetricValue::Double(v) => Some(*v),
            MetricValue::Schema(_) => None,
        }
    }
}

/// A failure captured while evaluating a property into a metric, preserved so
/// that the failure itself can be reported rather than silently dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricFailure {
    pub message: String,
}

impl std::fmt::Display for MetricFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// The evaluated outcome of a property: a name, the entity/instance it
/// describes, and either a successfully computed value or a captured
/// failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub name: String,
    pub instance: String,
    pub entity: Entity,
    pub value: Result<MetricValue, MetricFailure>,
}

impl Metric {
    pub fn success(name: impl Into<String>, instance: impl Into<String>, entity: Entity, value: MetricValue) -> Self {
        Self {
            name: name.into(),
            instance: instance.into(),
            entity,
            value: Ok(value),
        }
    }

    pub fn failure(
        name: impl Into<String>,
        instance: impl Into<String>,
        entity: Entity,
        message: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            instance: instance.into(),
            entity,
            value: Err(MetricFailure {
                message: message.into(),
            }),
        }
    }

    pub fn is_success(&self) -> bool {
        self.value.is_ok()
    }
}
