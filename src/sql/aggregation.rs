//! The aggregation-sharing planner.
//!
//! Scan-shareable properties are answered from one full-table `SELECT`.
//! Grouping-shareable properties with the same `(columns, filter)` key
//! share one materialized frequency table `(grouping_cols..., num_rows)`.
//! Sketch-backed properties (quantile, approximate distinctness) fall
//! outside SQL aggregation entirely: their state is built by folding raw
//! column values through a mergeable sketch client-side, since DuckDB has
//! no native KLL/HyperLogLog aggregate compatible with this crate's
//! mergeable sketch format (see DESIGN.md).

use std::collections::HashMap;

use sha1::{Digest, Sha1};

use crate::error::{DqError, DqResult};
use crate::operator::{factory, AggValue, GroupingKey, GroupingShareableOperator, ScanShareableOperator};
use crate::property::Property;
use crate::sketch::{DistinctSketch, QuantileSketch};
use crate::sql::executor::SqlExecutor;
use crate::sql::expr::raw_sql;
use crate::sql::query::{Query, TableRef};
use crate::sql::{col, count_star, ExprExt, SelectExpr};
use crate::state::{ApproxDistinctState, QuantileState, SchemaState, State};

/// Whether grouping frequency tables should be materialized as `TEMP`
/// (dropped with the connection) or as durable tables a second connection
/// can read. Durable tables are only needed when the metadata repository
/// does *not* share a connection with the executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrequencyTablePersistence {
    Temporary,
    Durable,
}

/// Diagnostics describing how a planning pass shared work across
/// properties, useful for tests asserting the planner actually shares scans
/// rather than issuing one query per property.
#[derive(Debug, Default, Clone)]
pub struct PlanDiagnostics {
    pub scan_queries: usize,
    pub grouping_buckets: usize,
    pub sketch_passes: usize,
}

pub struct AggregationPlanner<'a> {
    executor: &'a dyn SqlExecutor,
    persistence: FrequencyTablePersistence,
}

impl<'a> AggregationPlanner<'a> {
    pub fn new(executor: &'a dyn SqlExecutor, persistence: FrequencyTablePersistence) -> Self {
        Self {
            executor,
            persistence,
        }
    }

    /// Compute the [`State`] for every property, sharing work across
    /// properties wherever the operator model allows it.
    pub fn plan(&self, properties: &[Property]) -> DqResult<(Vec<State>, PlanDiagnostics)> {
        let mut diagnostics = PlanDiagnostics::default();
        let mut states = Vec::new();

        self.plan_scan_shareable(properties, &mut states, &mut diagnostics)?;
        self.plan_grouping_shareable(properties, &mut states, &mut diagnostics)?;
        self.plan_sketches(properties, &mut states, &mut diagnostics)?;
        self.plan_schema(properties, &mut states)?;

        Ok((states, diagnostics))
    }

    fn plan_scan_shareable(
        &self,
        properties: &[Property],
        states: &mut Vec<State>,
        diagnostics: &mut PlanDiagnostics,
    ) -> DqResult<()> {
        let mut operators: Vec<Box<dyn ScanShareableOperator>> = Vec::new();
        let mut seen = std::collections::HashSet::new();
        for property in properties {
            if let Some(op) = factory::scan_operator(property)? {
                if seen.insert(op.property_id()) {
                    operators.push(op);
                }
            }
        }
        if operators.is_empty() {
            return Ok(());
        }

        let mut select: Vec<SelectExpr> = Vec::new();
        for op in &operators {
            select.extend(op.aggregation_expressions());
        }

        let query = Query::new()
            .select(select)
            .from(TableRef::new(self.executor.table()));
        let rows = self.executor.execute_and_fetch(&query)?;
        diagnostics.scan_queries += 1;

        let row = rows.first().ok_or_else(|| {
            DqError::DataQuality("shared scan returned no rows".to_string())
        })?;
        for op in &operators {
            states.push(op.extract_state(row)?);
        }
        Ok(())
    }

    fn plan_grouping_shareable(
        &self,
        properties: &[Property],
        states: &mut Vec<State>,
        diagnostics: &mut PlanDiagnostics,
    ) -> DqResult<()> {
        let mut buckets: HashMap<GroupingKey, Vec<Box<dyn GroupingShareableOperator>>> = HashMap::new();
        for property in properties {
            if let Some(op) = factory::grouping_operator(property)? {
                let key = GroupingKey {
                    columns: op.grouping_columns(),
                    filter: op.filter().map(str::to_string),
                };
                buckets.entry(key).or_default().push(op);
            }
        }

        for (key, ops) in buckets {
            let table_name = frequency_table_name(&key);
            let group_exprs: Vec<_> = key.columns.iter().map(|c| col(c)).collect();
            let select: Vec<SelectExpr> = key
                .columns
                .iter()
                .map(|c| SelectExpr::new(col(c)))
                .chain(std::iter::once(SelectExpr::new(count_star()).with_alias("num_rows")))
                .collect();

            let mut freq_query = Query::new()
                .select(select)
                .from(TableRef::new(self.executor.table()))
                .group_by(group_exprs);
            if let Some(filter) = &key.filter {
                freq_query = freq_query.filter(raw_sql(filter));
            }

            let temporary = matches!(self.persistence, FrequencyTablePersistence::Temporary);
            self.executor.materialize(&table_name, freq_query, temporary)?;

            let select_star = Query::new()
                .select(vec![SelectExpr::new(crate::sql::expr::star())])
                .from(TableRef::new(&table_name));
            let raw_rows = self.executor.execute_raw(&select_star)?;

            let mut frequencies = Vec::with_capacity(raw_rows.len());
            let mut num_rows = 0i64;
            for row in &raw_rows {
                let (key_values, count_value) = row.split_at(row.len() - 1);
                let count = match &count_value[0] {
                    AggValue::Int(i) => *i,
                    AggValue::Float(f) => *f as i64,
                    _ => 0,
                };
                num_rows += count;
                frequencies.push((key_values.to_vec(), count));
            }

            diagnostics.grouping_buckets += 1;
            for op in ops {
                states.push(op.extract_state_from_frequencies(&frequencies, num_rows)?);
            }
        }
        Ok(())
    }

    fn plan_sketches(
        &self,
        properties: &[Property],
        states: &mut Vec<State>,
        diagnostics: &mut PlanDiagnostics,
    ) -> DqResult<()> {
        for property in properties {
            match property {
                Property::Quantile { column, quantile, filter } => {
                    let values = self.fetch_column_values(column, filter.as_deref())?;
                    let mut sketch = QuantileSketch::new();
                    for value in values {
                        if let AggValue::Int(i) = value {
                            sketch.add(i as f64);
                        } else if let AggValue::Float(f) = value {
                            sketch.add(f);
                        }
                    }
                    diagnostics.sketch_passes += 1;
                    states.push(State::Quantile(QuantileState {
                        id: property.property_identifier(),
                        sketch_bytes: sketch.to_bytes()?,
                        q: *quantile,
                        sketch_type: "ddsketch_f64".to_string(),
                    }));
                }
                Property::ApproxDistinctness { columns, filter } => {
                    let column = columns.first().ok_or_else(|| {
                        DqError::UnsupportedProperty(
                            "ApproxDistinctness requires at least one column".to_string(),
                        )
                    })?;
                    let values = self.fetch_column_values(column, filter.as_deref())?;
                    let mut sketch = DistinctSketch::new();
                    let mut num_rows = 0i64;
                    for value in values {
                        sketch.add(&agg_value_to_string(&value));
                        num_rows += 1;
                    }
                    diagnostics.sketch_passes += 1;
                    let estimate = sketch.count();
                    states.push(State::ApproxDistinct(ApproxDistinctState {
                        id: property.property_identifier(),
                        sketch_bytes: sketch.to_bytes()?,
                        estimate,
                        num_rows,
                    }));
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn plan_schema(&self, properties: &[Property], states: &mut Vec<State>) -> DqResult<()> {
        for property in properties {
            if matches!(property, Property::Schema) {
                let schema = self.executor.schema()?;
                states.push(State::Schema(SchemaState {
                    id: property.property_identifier(),
                    columns: schema,
                }));
            }
        }
        Ok(())
    }

    fn fetch_column_values(&self, column: &str, filter: Option<&str>) -> DqResult<Vec<AggValue>> {
        let mut query = Query::new()
            .select(vec![SelectExpr::new(col(column))])
            .from(TableRef::new(self.executor.table()));
        if let Some(filter) = filter {
            query = query.filter(col(column).is_not_null().and(raw_sql(filter)));
        } else {
            query = query.filter(col(column).is_not_null());
        }
        let rows = self.executor.execute_raw(&query)?;
        Ok(rows.into_iter().filter_map(|mut r| r.pop()).collect())
    }
}

fn agg_value_to_string(value: &AggValue) -> String {
    match value {
        AggValue::Int(i) => i.to_string(),
        AggValue::Float(f) => f.to_string(),
        AggValue::Str(s) => s.clone(),
        AggValue::Bool(b) => b.to_string(),
        AggValue::Null => String::new(),
    }
}

fn frequency_table_name(key: &GroupingKey) -> String {
    let canonical = format!("{}|{}", key.columns.join(","), key.filter.as_deref().unwrap_or(""));
    let digest = Sha1::digest(canonical.as_bytes());
    let hash = u64::from_be_bytes(digest[0..8].try_into().expect("sha1 digest is 20 bytes"));
    format!("dq_state_freq_{hash:x}")
}
