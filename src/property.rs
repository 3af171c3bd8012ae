//! Properties: declarative descriptors of a single measurable quantity over
//! a dataset, independent of how that quantity is computed.
//!
//! A property's identity is the 4-tuple `(name, instance, entity, where)`.
//! Two properties with the same identity always reduce to the same SQL
//! aggregation fragment and may share a scan.

use sha1::{Digest, Sha1};

use crate::metric::Entity;
use crate::precondition::Precondition;

/// The shape of value a property's metric will carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricType {
    Double,
    Schema,
}

/// A closed set of measurable properties. Adding a new kind of measurement
/// means adding a variant here, not a string tag, so every consumer
/// (operator factory, state handler, merge algebra) is forced by the
/// compiler to account for it.
#[derive(Debug, Clone, PartialEq)]
pub enum Property {
    Schema,
    Size {
        filter: Option<String>,
    },
    Completeness {
        column: String,
        filter: Option<String>,
    },
    Uniqueness {
        columns: Vec<String>,
        filter: Option<String>,
    },
    Distinctness {
        columns: Vec<String>,
        filter: Option<String>,
    },
    UniqueValueRatio {
        columns: Vec<String>,
        filter: Option<String>,
    },
    Compliance {
        instance: String,
        predicate: String,
        filter: Option<String>,
    },
    PatternMatch {
        column: String,
        pattern: String,
        filter: Option<String>,
    },
    MinLength {
        column: String,
        filter: Option<String>,
    },
    MaxLength {
        column: String,
        filter: Option<String>,
    },
    Minimum {
        column: String,
        filter: Option<String>,
    },
    Maximum {
        column: String,
        filter: Option<String>,
    },
    Mean {
        column: String,
        filter: Option<String>,
    },
    Sum {
        column: String,
        filter: Option<String>,
    },
    StandardDeviation {
        column: String,
        filter: Option<String>,
    },
    Quantile {
        column: String,
        quantile: f64,
        filter: Option<String>,
    },
    ApproxDistinctness {
        columns: Vec<String>,
        filter: Option<String>,
    },
}

impl Property {
    /// The stable name of this property's kind, e.g. `"Completeness"`.
    pub fn name(&self) -> &'static str {
        match self {
            Property::Schema => "Schema",
            Property::Size { .. } => "Size",
            Property::Completeness { .. } => "Completeness",
            Property::Uniqueness { .. } => "Uniqueness",
            Property::Distinctness { .. } => "Distinctness",
            Property::UniqueValueRatio { .. } => "UniqueValueRatio",
            Property::Compliance { .. } => "Compliance",
            Property::PatternMatch { .. } => "PatternMatch",
            Property::MinLength { .. } => "MinLength",
            Property::MaxLength { .. } => "MaxLength",
            Property::Minimum { .. } => "Minimum",
            Property::Maximum { .. } => "Maximum",
            Property::Mean { .. } => "Mean",
            Property::Sum { .. } => "Sum",
            Property::StandardDeviation { .. } => "StandardDeviation",
            Property::Quantile { .. } => "Quantile",
            Property::ApproxDistinctness { .. } => "ApproxDistinctness",
        }
    }

    /// An instance discriminator distinguishing properties of the same kind
    /// and entity apart (e.g. the quantile fraction, or the compliance
    /// predicate's label). Defaults to the joined column list.
    pub fn instance(&self) -> String {
        match self {
            Property::Schema => String::new(),
            Property::Size { .. } => String::new(),
            Property::Completeness { column, .. }
            | Property::PatternMatch { column, .. }
            | Property::MinLength { column, .. }
            | Property::MaxLength { column, .. }
            | Property::Minimum { column, .. }
            | Property::Maximum { column, .. }
            | Property::Mean { column, .. }
            | Property::Sum { column, .. }
            | Property::StandardDeviation { column, .. } => column.clone(),
            Property::Uniqueness { columns, .. }
            | Property::Distinctness { columns, .. }
            | Property::UniqueValueRatio { columns, .. }
            | Property::ApproxDistinctness { columns, .. } => columns.join(","),
            Property::Compliance { instance, .. } => instance.clone(),
            Property::Quantile { column, quantile, .. } => format!("{column}:{quantile}"),
        }
    }

    /// The entity this property is measured over.
    pub fn entity(&self) -> Entity {
        match self {
            Property::Schema | Property::Size { .. } | Property::Compliance { .. } => {
                Entity::Dataset
            }
            Property::Completeness { column, .. }
            | Property::PatternMatch { column, .. }
            | Property::MinLength { column, .. }
            | Property::MaxLength { column, .. }
            | Property::Minimum { column, .. }
            | Property::Maximum { column, .. }
            | Property::Mean { column, .. }
            | Property::Sum { column, .. }
            | Property::StandardDeviation { column, .. }
            | Property::Quantile { column, .. } => Entity::Column(column.clone()),
            Property::Uniqueness { columns, .. }
            | Property::Distinctness { columns, .. }
            | Property::UniqueValueRatio { columns, .. }
            | Property::ApproxDistinctness { columns, .. } => {
                if columns.len() == 2 {
                    Entity::TwoColumn(columns[0].clone(), columns[1].clone())
                } else {
                    Entity::MultiColumn(columns.clone())
                }
            }
        }
    }

    /// The optional row filter (SQL boolean expression, rendered verbatim)
    /// restricting which rows this property considers.
    pub fn filter(&self) -> Option<&str> {
        match self {
            Property::Schema => None,
            Property::Size { filter }
            | Property::Completeness { filter, .. }
            | Property::Uniqueness { filter, .. }
            | Property::Distinctness { filter, .. }
            | Property::UniqueValueRatio { filter, .. }
            | Property::Compliance { filter, .. }
            | Property::PatternMatch { filter, .. }
            | Property::MinLength { filter, .. }
            | Property::MaxLength { filter, .. }
            | Property::Minimum { filter, .. }
            | Property::Maximum { filter, .. }
            | Property::Mean { filter, .. }
            | Property::Sum { filter, .. }
            | Property::StandardDeviation { filter, .. }
            | Property::Quantile { filter, .. }
            | Property::ApproxDistinctness { filter, .. } => filter.as_deref(),
        }
    }

    /// The shape of metric value this property evaluates to.
    pub fn metric_type(&self) -> MetricType {
        match self {
            Property::Schema => MetricType::Schema,
            _ => MetricType::Double,
        }
    }

    /// Schema-level requirements this property needs satisfied before it can
    /// be compiled into SQL.
    pub fn preconditions(&self) -> Vec<Precondition> {
        match self {
            Property::Schema | Property::Size { .. } | Property::Compliance { .. } => Vec::new(),
            Property::Completeness { column, .. }
            | Property::PatternMatch { column, .. }
            | Property::MinLength { column, .. }
            | Property::MaxLength { column, .. } => vec![Precondition::HasColumn(column.clone())],
            Property::Minimum { column, .. }
            | Property::Maximum { column, .. }
            | Property::Mean { column, .. }
            | Property::Sum { column, .. }
            | Property::StandardDeviation { column, .. }
            | Property::Quantile { column, .. } => vec![Precondition::IsNumeric(column.clone())],
            Property::Uniqueness { columns, .. }
            | Property::Distinctness { columns, .. }
            | Property::UniqueValueRatio { columns, .. }
            | Property::ApproxDistinctness { columns, .. } => columns
                .iter()
                .map(|c| Precondition::HasColumn(c.clone()))
                .collect(),
        }
    }

    /// A stable 64-bit identifier for this property, used as the join key
    /// between states and metrics across runs and processes.
    ///
    /// Deliberately independent of any language-provided `Hash` impl: those
    /// are allowed to change between compiler/std versions, which would
    /// silently orphan persisted state. Computed as the first 8 bytes of the
    /// SHA-1 digest of a canonical pipe-joined string, read big-endian.
    pub fn property_identifier(&self) -> u64 {
        let canonical = format!(
            "{}|{}|{}|{}",
            self.name(),
            self.instance(),
            entity_key(&self.entity()),
            self.filter().unwrap_or(""),
        );
        let digest = Sha1::digest(canonical.as_bytes());
        u64::from_be_bytes(digest[0..8].try_into().expect("sha1 digest is 20 bytes"))
    }
}

fn entity_key(entity: &Entity) -> String {
    match entity {
        Entity::Dataset => "dataset".to_string(),
        Entity::Column(c) => format!("column:{c}"),
        Entity::TwoColumn(a, b) => format!("two_column:{a},{b}"),
        Entity::MultiColumn(cols) => format!("multi_column:{}", cols.join(",")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_is_deterministic() {
        let p = Property::Completeness {
            column: "att1".into(),
            filter: None,
        };
        assert_eq!(p.property_identifier(), p.property_identifier());
    }

    #[test]
    fn identifier_distinguishes_filter() {
        let a = Property::Completeness {
            column: "att1".into(),
            filter: None,
        };
        let b = Property::Completeness {
            column: "att1".into(),
            filter: Some("att1 > 0".into()),
        };
        assert_ne!(a.property_identifier(), b.property_identifier());
    }

    #[test]
    fn identifier_distinguishes_entity() {
        let a = Property::Uniqueness {
            columns: vec!["a".into()],
            filter: None,
        };
        let b = Property::Uniqueness {
            columns: vec!["a".into(), "b".into()],
            filter: None,
        };
        assert_ne!(a.property_identifier(), b.property_identifier());
    }

    #[test]
    fn preconditions_require_numeric_for_mean() {
        let p = Property::Mean {
            column: "att1".into(),
            filter: None,
        };
        assert_eq!(p.preconditions(), vec![Precondition::IsNumeric("att1".into())]);
    }
}
