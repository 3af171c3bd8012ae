//! Dispatches a [`Property`] to the operator that computes it.

use crate::error::{DqError, DqResult};
use crate::operator::grouping::{GroupingMetric, GroupingOperator};
use crate::operator::scan::{
    CompletenessOperator, ComplianceOperator, LengthOperator, MaximumOperator, MeanOperator,
    MinimumOperator, SizeOperator, StandardDeviationOperator, SumOperator,
};
use crate::operator::{GroupingShareableOperator, ScanShareableOperator};
use crate::property::Property;

/// Properties whose computation rides the shared full-table scan.
pub fn scan_operator(property: &Property) -> DqResult<Option<Box<dyn ScanShareableOperator>>> {
    let id = property.property_identifier();
    let op: Box<dyn ScanShareableOperator> = match property {
        Property::Size { filter } => Box::new(SizeOperator {
            id,
            filter: filter.clone(),
        }),
        Property::Completeness { column, filter } => Box::new(CompletenessOperator {
            id,
            column: column.clone(),
            filter: filter.clone(),
        }),
        Property::Compliance { predicate, filter, .. } => Box::new(ComplianceOperator {
            id,
            predicate: predicate.clone(),
            filter: filter.clone(),
        }),
        Property::PatternMatch { column, pattern, filter } => Box::new(
            crate::operator::scan::pattern_match_operator(id, column, pattern, filter.clone())?,
        ),
        Property::Minimum { column, filter } => Box::new(MinimumOperator {
            id,
            column: column.clone(),
            filter: filter.clone(),
        }),
        Property::Maximum { column, filter } => Box::new(MaximumOperator {
            id,
            column: column.clone(),
            filter: filter.clone(),
        }),
        Property::Sum { column, filter } => Box::new(SumOperator {
            id,
            column: column.clone(),
            filter: filter.clone(),
        }),
        Property::Mean { column, filter } => Box::new(MeanOperator {
            id,
            column: column.clone(),
            filter: filter.clone(),
        }),
        Property::StandardDeviation { column, filter } => Box::new(StandardDeviationOperator {
            id,
            column: column.clone(),
            filter: filter.clone(),
        }),
        Property::MinLength { column, filter } => Box::new(LengthOperator {
            id,
            column: column.clone(),
            filter: filter.clone(),
            take_max: false,
        }),
        Property::MaxLength { column, filter } => Box::new(LengthOperator {
            id,
            column: column.clone(),
            filter: filter.clone(),
            take_max: true,
        }),
        // Schema, Quantile, and ApproxDistinctness do not ride the shared
        // aggregation scan: Schema is read from PRAGMA table_info and the
        // sketch-backed properties need a raw-value pass (see
        // crate::sql::aggregation::SketchPlan).
        Property::Schema | Property::Quantile { .. } | Property::ApproxDistinctness { .. } => {
            return Ok(None)
        }
        Property::Uniqueness { .. } | Property::Distinctness { .. } | Property::UniqueValueRatio { .. } => {
            return Ok(None)
        }
    };
    Ok(Some(op))
}

/// Properties whose computation needs a grouped frequency table.
pub fn grouping_operator(property: &Property) -> DqResult<Option<Box<dyn GroupingShareableOperator>>> {
    let id = property.property_identifier();
    let (columns, filter, metric) = match property {
        Property::Uniqueness { columns, filter } => (columns.clone(), filter.clone(), GroupingMetric::Uniqueness),
        Property::Distinctness { columns, filter } => {
            (columns.clone(), filter.clone(), GroupingMetric::Distinctness)
        }
        Property::UniqueValueRatio { columns, filter } => {
            (columns.clone(), filter.clone(), GroupingMetric::UniqueValueRatio)
        }
        _ => return Ok(None),
    };
    if columns.is_empty() {
        return Err(DqError::UnsupportedProperty(format!(
            "{} requires at least one grouping column",
            property.name()
        )));
    }
    Ok(Some(Box::new(GroupingOperator {
        id,
        columns,
        filter,
        metric,
    })))
}
