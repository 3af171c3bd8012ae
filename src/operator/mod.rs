//! Operators: the compilation target for a [`crate::property::Property`].
//!
//! A scan-shareable operator contributes one or more aggregate expressions
//! to a single full-table `SELECT`, so many properties over the same table
//! can be answered by one pass. A grouping-shareable operator instead needs
//! rows bucketed by a grouping key (columns, filter, row-count alias) and
//! is answered from a materialized frequency table, one query per distinct
//! bucket.

pub mod factory;
pub mod grouping;
pub mod scan;

use crate::error::DqResult;
use crate::sql::{Expr, SelectExpr};
use crate::state::State;

/// A single row of an aggregation result, keyed by column alias.
#[derive(Debug, Clone)]
pub struct AggRow {
    columns: indexmap::IndexMap<String, AggValue>,
}

/// A scalar value extracted from a DuckDB result row.
#[derive(Debug, Clone, PartialEq)]
pub enum AggValue {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    Null,
}

impl AggRow {
    pub fn new() -> Self {
        Self {
            columns: indexmap::IndexMap::new(),
        }
    }

    pub fn insert(&mut self, alias: impl Into<String>, value: AggValue) {
        self.columns.insert(alias.into(), value);
    }

    pub fn get(&self, alias: &str) -> Option<&AggValue> {
        self.columns.get(alias)
    }

    /// Numeric value at `alias`, or `NaN` when the aggregate produced `NULL`
    /// (e.g. `MIN`/`MAX`/`SUM` over zero matching rows) — callers that need
    /// to distinguish "no rows matched" from a real zero check
    /// `is_finite()` rather than treating a missing value as `0.0`.
    pub fn get_f64(&self, alias: &str) -> f64 {
        match self.columns.get(alias) {
            Some(AggValue::Int(i)) => *i as f64,
            Some(AggValue::Float(f)) => *f,
            Some(AggValue::Null) | None => f64::NAN,
            _ => f64::NAN,
        }
    }

    pub fn get_i64(&self, alias: &str) -> i64 {
        match self.columns.get(alias) {
            Some(AggValue::Int(i)) => *i,
            Some(AggValue::Float(f)) => *f as i64,
            _ => 0,
        }
    }

    pub fn get_str(&self, alias: &str) -> Option<&str> {
        match self.columns.get(alias) {
            Some(AggValue::Str(s)) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl Default for AggRow {
    fn default() -> Self {
        Self::new()
    }
}

/// An operator whose required aggregate expressions can be computed in a
/// single shared scan of the dataset, alongside every other scan-shareable
/// operator.
pub trait ScanShareableOperator {
    /// Stable identifier for this property instance; used to prefix result
    /// aliases so multiple operators' expressions don't collide in the
    /// shared SELECT list.
    fn property_id(&self) -> u64;

    /// The aggregate SELECT-list expressions this operator contributes.
    fn aggregation_expressions(&self) -> Vec<SelectExpr>;

    /// Extract this operator's [`State`] from the single result row of the
    /// shared scan.
    fn extract_state(&self, row: &AggRow) -> DqResult<State>;
}

/// An operator whose required computation needs rows bucketed by a grouping
/// key (columns + filter + row-count alias) rather than a single scan.
pub trait GroupingShareableOperator {
    fn property_id(&self) -> u64;

    /// The columns this operator groups by.
    fn grouping_columns(&self) -> Vec<String>;

    /// The row filter applied before grouping, if any.
    fn filter(&self) -> Option<&str>;

    /// Compute this operator's [`State`] from the materialized
    /// `(grouping_cols..., num_rows_alias)` frequency table rows.
    fn extract_state_from_frequencies(
        &self,
        frequencies: &[(Vec<AggValue>, i64)],
        num_rows: i64,
    ) -> DqResult<State>;
}

/// The key identifying a shareable grouping bucket: operators with the same
/// key can share one materialized frequency table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupingKey {
    pub columns: Vec<String>,
    pub filter: Option<String>,
}

/// A unique alias for an operator's contribution to the shared scan's
/// SELECT list, derived from its property id so it never collides with
/// another operator's alias.
pub fn alias_for(property_id: u64, suffix: &str) -> String {
    format!("p{property_id}_{suffix}")
}

pub fn col_expr(table_col: &str) -> Expr {
    crate::sql::col(table_col)
}
