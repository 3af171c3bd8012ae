//! Scan-shareable operators: one SELECT-list aggregate fragment per
//! property, all answerable from a single pass over the table.

use crate::error::{DqError, DqResult};
use crate::operator::{alias_for, col_expr, AggRow, ScanShareableOperator};
use crate::sql::expr::raw_sql;
use crate::sql::{col, count, count_star, func, max, min, sum, Expr, ExprExt, SelectExpr};
use crate::state::{
    MaxState, MeanState, MinState, NumMatches, NumMatchesAndCount, StandardDeviationState, SumState,
};

fn filtered(expr: Expr, filter: Option<&str>) -> Expr {
    match filter {
        Some(f) => Expr::Case {
            operand: None,
            when_clauses: vec![(raw_sql(f), expr)],
            else_clause: None,
        },
        None => expr,
    }
}

/// `COUNT(*)` (optionally filtered), backing [`crate::property::Property::Size`].
pub struct SizeOperator {
    pub id: u64,
    pub filter: Option<String>,
}

impl ScanShareableOperator for SizeOperator {
    fn property_id(&self) -> u64 {
        self.id
    }

    fn aggregation_expressions(&self) -> Vec<SelectExpr> {
        let alias = alias_for(self.id, "count");
        let expr = match &self.filter {
            Some(f) => count(filtered(crate::sql::lit_int(1), Some(f))),
            None => count_star(),
        };
        vec![SelectExpr::new(expr).with_alias(&alias)]
    }

    fn extract_state(&self, row: &AggRow) -> DqResult<crate::state::State> {
        let count = row.get_i64(&alias_for(self.id, "count"));
        Ok(crate::state::State::NumMatches(NumMatches {
            id: self.id,
            num_matches: count,
        }))
    }
}

/// `COUNT(col IS NOT NULL)` over `COUNT(*)`, backing
/// [`crate::property::Property::Completeness`].
pub struct CompletenessOperator {
    pub id: u64,
    pub column: String,
    pub filter: Option<String>,
}

impl ScanShareableOperator for CompletenessOperator {
    fn property_id(&self) -> u64 {
        self.id
    }

    fn aggregation_expressions(&self) -> Vec<SelectExpr> {
        let matches_alias = alias_for(self.id, "matches");
        let total_alias = alias_for(self.id, "total");
        let not_null = col(&self.column).is_not_null();
        let matches_expr = filtered(
            Expr::Case {
                operand: None,
                when_clauses: vec![(not_null, crate::sql::lit_int(1))],
                else_clause: Some(Box::new(crate::sql::lit_int(0))),
            },
            self.filter.as_deref(),
        );
        let total_expr = match &self.filter {
            Some(f) => count(filtered(crate::sql::lit_int(1), Some(f))),
            None => count_star(),
        };
        vec![
            SelectExpr::new(sum(matches_expr)).with_alias(&matches_alias),
            SelectExpr::new(total_expr).with_alias(&total_alias),
        ]
    }

    fn extract_state(&self, row: &AggRow) -> DqResult<crate::state::State> {
        Ok(crate::state::State::NumMatchesAndCount(NumMatchesAndCount {
            id: self.id,
            num_matches: row.get_i64(&alias_for(self.id, "matches")),
            count: row.get_i64(&alias_for(self.id, "total")),
        }))
    }
}

/// A predicate evaluated over `COUNT(*)`, backing
/// [`crate::property::Property::Compliance`] and
/// [`crate::property::Property::PatternMatch`].
pub struct ComplianceOperator {
    pub id: u64,
    /// A raw SQL boolean expression, e.g. `att1 > 0` or
    /// `regexp_full_match(att1, '^[0-9]+$')`.
    pub predicate: String,
    pub filter: Option<String>,
}

impl ScanShareableOperator for ComplianceOperator {
    fn property_id(&self) -> u64 {
        self.id
    }

    fn aggregation_expressions(&self) -> Vec<SelectExpr> {
        let matches_alias = alias_for(self.id, "matches");
        let total_alias = alias_for(self.id, "total");
        let matched = Expr::Case {
            operand: None,
            when_clauses: vec![(raw_sql(&self.predicate), crate::sql::lit_int(1))],
            else_clause: Some(Box::new(crate::sql::lit_int(0))),
        };
        let matches_expr = filtered(matched, self.filter.as_deref());
        let total_expr = match &self.filter {
            Some(f) => count(filtered(crate::sql::lit_int(1), Some(f))),
            None => count_star(),
        };
        vec![
            SelectExpr::new(sum(matches_expr)).with_alias(&matches_alias),
            SelectExpr::new(total_expr).with_alias(&total_alias),
        ]
    }

    fn extract_state(&self, row: &AggRow) -> DqResult<crate::state::State> {
        Ok(crate::state::State::NumMatchesAndCount(NumMatchesAndCount {
            id: self.id,
            num_matches: row.get_i64(&alias_for(self.id, "matches")),
            count: row.get_i64(&alias_for(self.id, "total")),
        }))
    }
}

/// `regexp_full_match(col, pattern)` over `COUNT(*)`, backing
/// [`crate::property::Property::PatternMatch`].
///
/// The pattern is validated client-side with [`regex`] before it ever
/// reaches DuckDB: an invalid pattern should fail with a clear
/// [`DqError::InvalidPattern`](crate::error::DqError::InvalidPattern), not a
/// cryptic `regexp_full_match` parse error surfacing from the executor.
pub fn pattern_match_operator(
    id: u64,
    column: &str,
    pattern: &str,
    filter: Option<String>,
) -> DqResult<ComplianceOperator> {
    regex::Regex::new(pattern).map_err(|source| crate::error::DqError::InvalidPattern {
        pattern: pattern.to_string(),
        source: source.to_string(),
    })?;
    let escaped = pattern.replace('\'', "''");
    Ok(ComplianceOperator {
        id,
        predicate: format!("regexp_full_match({column}, '{escaped}')"),
        filter,
    })
}

/// `MIN(...)`, backing [`crate::property::Property::Minimum`].
///
/// The filtered form is `MIN(CASE WHEN <filter> THEN col END)`: the CASE's
/// implicit `ELSE NULL` must stay implicit (an explicit `ELSE NULL` changes
/// nothing semantically, but wrapping the whole CASE in an extra layer of
/// parens before the aggregate collides with DuckDB's aggregate-FILTER
/// parsing on some dialect paths). `MIN` already ignores `NULL`, so no
/// second guard is needed beyond the CASE itself.
pub struct MinimumOperator {
    pub id: u64,
    pub column: String,
    pub filter: Option<String>,
}

impl ScanShareableOperator for MinimumOperator {
    fn property_id(&self) -> u64 {
        self.id
    }

    fn aggregation_expressions(&self) -> Vec<SelectExpr> {
        let alias = alias_for(self.id, "min");
        let expr = min(filtered(col_expr(&self.column), self.filter.as_deref()));
        vec![SelectExpr::new(expr).with_alias(&alias)]
    }

    fn extract_state(&self, row: &AggRow) -> DqResult<crate::state::State> {
        Ok(crate::state::State::Min(MinState {
            id: self.id,
            min_value: row.get_f64(&alias_for(self.id, "min")),
        }))
    }
}

/// `MAX(...)`, backing [`crate::property::Property::Maximum`].
pub struct MaximumOperator {
    pub id: u64,
    pub column: String,
    pub filter: Option<String>,
}

impl ScanShareableOperator for MaximumOperator {
    fn property_id(&self) -> u64 {
        self.id
    }

    fn aggregation_expressions(&self) -> Vec<SelectExpr> {
        let alias = alias_for(self.id, "max");
        let expr = max(filtered(col_expr(&self.column), self.filter.as_deref()));
        vec![SelectExpr::new(expr).with_alias(&alias)]
    }

    fn extract_state(&self, row: &AggRow) -> DqResult<crate::state::State> {
        Ok(crate::state::State::Max(MaxState {
            id: self.id,
            max_value: row.get_f64(&alias_for(self.id, "max")),
        }))
    }
}

/// `SUM(...)`, backing [`crate::property::Property::Sum`].
pub struct SumOperator {
    pub id: u64,
    pub column: String,
    pub filter: Option<String>,
}

impl ScanShareableOperator for SumOperator {
    fn property_id(&self) -> u64 {
        self.id
    }

    fn aggregation_expressions(&self) -> Vec<SelectExpr> {
        let alias = alias_for(self.id, "sum");
        let expr = sum(filtered(col_expr(&self.column), self.filter.as_deref()));
        vec![SelectExpr::new(expr).with_alias(&alias)]
    }

    fn extract_state(&self, row: &AggRow) -> DqResult<crate::state::State> {
        let sum = row.get_f64(&alias_for(self.id, "sum"));
        Ok(crate::state::State::Sum(SumState {
            id: self.id,
            sum: if sum.is_nan() { 0.0 } else { sum },
        }))
    }
}

/// `SUM(...)` over `COUNT(...)`, backing [`crate::property::Property::Mean`].
pub struct MeanOperator {
    pub id: u64,
    pub column: String,
    pub filter: Option<String>,
}

impl ScanShareableOperator for MeanOperator {
    fn property_id(&self) -> u64 {
        self.id
    }

    fn aggregation_expressions(&self) -> Vec<SelectExpr> {
        let sum_alias = alias_for(self.id, "sum");
        let count_alias = alias_for(self.id, "count");
        let value = filtered(col_expr(&self.column), self.filter.as_deref());
        let count_expr = match &self.filter {
            Some(_) => count(filtered(col_expr(&self.column), self.filter.as_deref())),
            None => count(col_expr(&self.column)),
        };
        vec![
            SelectExpr::new(sum(value)).with_alias(&sum_alias),
            SelectExpr::new(count_expr).with_alias(&count_alias),
        ]
    }

    fn extract_state(&self, row: &AggRow) -> DqResult<crate::state::State> {
        let total = row.get_f64(&alias_for(self.id, "sum"));
        Ok(crate::state::State::Mean(MeanState {
            id: self.id,
            total: if total.is_nan() { 0.0 } else { total },
            count: row.get_i64(&alias_for(self.id, "count")),
        }))
    }
}

/// `SUM(col)`, `SUM(col*col)`, `COUNT(col)`, analytically combined into a
/// Welford-shaped `(count, mean, M2)` triple, backing
/// [`crate::property::Property::StandardDeviation`].
///
/// `M2 = sum_sq - sum^2 / count` is algebraically identical to Welford's
/// running M2 for a single batch; computing it this way lets the whole
/// standard deviation property ride the shared scan instead of needing a
/// streaming aggregate UDF.
pub struct StandardDeviationOperator {
    pub id: u64,
    pub column: String,
    pub filter: Option<String>,
}

impl ScanShareableOperator for StandardDeviationOperator {
    fn property_id(&self) -> u64 {
        self.id
    }

    fn aggregation_expressions(&self) -> Vec<SelectExpr> {
        let sum_alias = alias_for(self.id, "sum");
        let sum_sq_alias = alias_for(self.id, "sum_sq");
        let count_alias = alias_for(self.id, "count");
        let value = filtered(col_expr(&self.column), self.filter.as_deref());
        let squared = filtered(col_expr(&self.column).mul(col_expr(&self.column)), self.filter.as_deref());
        let count_expr = count(filtered(col_expr(&self.column), self.filter.as_deref()));
        vec![
            SelectExpr::new(sum(value)).with_alias(&sum_alias),
            SelectExpr::new(sum(squared)).with_alias(&sum_sq_alias),
            SelectExpr::new(count_expr).with_alias(&count_alias),
        ]
    }

    fn extract_state(&self, row: &AggRow) -> DqResult<crate::state::State> {
        let count = row.get_i64(&alias_for(self.id, "count"));
        let sum = row.get_f64(&alias_for(self.id, "sum"));
        let sum = if sum.is_nan() { 0.0 } else { sum };
        let sum_sq = row.get_f64(&alias_for(self.id, "sum_sq"));
        let sum_sq = if sum_sq.is_nan() { 0.0 } else { sum_sq };
        let mean = if count > 0 { sum / count as f64 } else { 0.0 };
        let m2 = if count > 0 {
            sum_sq - sum * sum / count as f64
        } else {
            0.0
        };
        Ok(crate::state::State::StandardDeviation(StandardDeviationState {
            id: self.id,
            count,
            mean,
            m2,
        }))
    }
}

/// `MIN(length(col))` / `MAX(length(col))`, backing
/// [`crate::property::Property::MinLength`] and
/// [`crate::property::Property::MaxLength`].
pub struct LengthOperator {
    pub id: u64,
    pub column: String,
    pub filter: Option<String>,
    pub take_max: bool,
}

impl ScanShareableOperator for LengthOperator {
    fn property_id(&self) -> u64 {
        self.id
    }

    fn aggregation_expressions(&self) -> Vec<SelectExpr> {
        let alias = alias_for(self.id, if self.take_max { "max_len" } else { "min_len" });
        let length_expr = func("length", vec![col_expr(&self.column)]);
        let value = filtered(length_expr, self.filter.as_deref());
        let agg = if self.take_max { max(value) } else { min(value) };
        vec![SelectExpr::new(agg).with_alias(&alias)]
    }

    fn extract_state(&self, row: &AggRow) -> DqResult<crate::state::State> {
        let alias = alias_for(self.id, if self.take_max { "max_len" } else { "min_len" });
        let value = row.get_f64(&alias);
        Ok(if self.take_max {
            crate::state::State::Max(MaxState {
                id: self.id,
                max_value: value,
            })
        } else {
            crate::state::State::Min(MinState {
                id: self.id,
                min_value: value,
            })
        })
    }
}

/// Reports the dataset's column -> type schema, evaluated from
/// `PRAGMA table_info`, outside the shared-scan aggregation path entirely.
pub struct SchemaOperator {
    pub id: u64,
}

impl SchemaOperator {
    pub fn describe_error(&self, reason: &str) -> DqError {
        DqError::DataQuality(format!("failed to read schema: {reason}"))
    }
}

