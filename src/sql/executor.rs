//! The executor abstraction the aggregation planner compiles queries
//! against. Only a DuckDB backend exists today (see DESIGN.md), but the
//! trait keeps the planner itself backend-agnostic, the same way
//! [`crate::sql::dialect::SqlDialect`] keeps query rendering backend-agnostic.

use duckdb::types::Value as DuckValue;
use indexmap::IndexMap;

use crate::connection::ConnectionHandle;
use crate::error::{DqError, DqResult};
use crate::operator::{AggRow, AggValue};
use crate::sql::ddl::CreateTable;
use crate::sql::dialect::Dialect;
use crate::sql::query::Query;

/// Executes compiled queries against a dataset and reports its schema.
pub trait SqlExecutor {
    /// The connection this executor runs against. Used to detect whether
    /// the executor and a metadata repository share a connection (so
    /// frequency tables can be `TEMP`) or not (so they must be durable and
    /// visible from a second connection).
    fn connection_handle(&self) -> &ConnectionHandle;

    /// The table this executor evaluates properties over.
    fn table(&self) -> &str;

    /// The dataset's column -> DuckDB type name schema.
    fn schema(&self) -> DqResult<IndexMap<String, String>>;

    /// Execute a query expected to return exactly one row (the shared scan
    /// aggregation, or a single grouping bucket's frequency rows collapsed
    /// by the caller) and return every row it produces.
    fn execute_and_fetch(&self, query: &Query) -> DqResult<Vec<AggRow>>;

    /// Execute a query returning raw column values (for sketch
    /// construction), one `AggValue` per selected expression per row.
    fn execute_raw(&self, query: &Query) -> DqResult<Vec<Vec<AggValue>>>;

    /// Materialize a query's result into a table, `TEMP` when `temporary`
    /// is true.
    fn materialize(&self, table_name: &str, query: Query, temporary: bool) -> DqResult<()>;
}

/// A [`SqlExecutor`] backed by a DuckDB connection.
pub struct DuckDbExecutor {
    connection: ConnectionHandle,
    table: String,
    dialect: Dialect,
}

impl DuckDbExecutor {
    pub fn new(connection: ConnectionHandle, table: impl Into<String>) -> Self {
        Self {
            connection,
            table: table.into(),
            dialect: Dialect::DuckDb,
        }
    }

    fn value_to_agg(value: DuckValue) -> AggValue {
        match value {
            DuckValue::Null => AggValue::Null,
            DuckValue::Boolean(b) => AggValue::Bool(b),
            DuckValue::TinyInt(i) => AggValue::Int(i as i64),
            DuckValue::SmallInt(i) => AggValue::Int(i as i64),
            DuckValue::Int(i) => AggValue::Int(i as i64),
            DuckValue::BigInt(i) => AggValue::Int(i),
            DuckValue::HugeInt(i) => AggValue::Int(i as i64),
            DuckValue::UTinyInt(i) => AggValue::Int(i as i64),
            DuckValue::USmallInt(i) => AggValue::Int(i as i64),
            DuckValue::UInt(i) => AggValue::Int(i as i64),
            DuckValue::UBigInt(i) => AggValue::Int(i as i64),
            DuckValue::Float(f) => AggValue::Float(f as f64),
            DuckValue::Double(f) => AggValue::Float(f),
            DuckValue::Text(s) => AggValue::Str(s),
            other => AggValue::Str(format!("{other:?}")),
        }
    }

    fn run_query(&self, sql: &str) -> DqResult<Vec<Vec<AggValue>>> {
        let conn = &self.connection.0;
        let mut stmt = conn.prepare(sql)?;
        let column_count = stmt.column_count();
        let rows = stmt.query_map([], |row| {
            let mut values = Vec::with_capacity(column_count);
            for i in 0..column_count {
                let v: DuckValue = row.get(i)?;
                values.push(Self::value_to_agg(v));
            }
            Ok(values)
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }
}

impl SqlExecutor for DuckDbExecutor {
    fn connection_handle(&self) -> &ConnectionHandle {
        &self.connection
    }

    fn table(&self) -> &str {
        &self.table
    }

    fn schema(&self) -> DqResult<IndexMap<String, String>> {
        let sql = format!("PRAGMA table_info('{}')", self.table.replace('\'', "''"));
        let rows = self.run_query(&sql)?;
        let mut schema = IndexMap::new();
        for row in rows {
            // PRAGMA table_info columns: cid, name, type, notnull, dflt_value, pk
            let name = match row.get(1) {
                Some(AggValue::Str(s)) => s.clone(),
                _ => continue,
            };
            let ty = match row.get(2) {
                Some(AggValue::Str(s)) => s.clone(),
                _ => continue,
            };
            schema.insert(name, ty);
        }
        Ok(schema)
    }

    fn execute_and_fetch(&self, query: &Query) -> DqResult<Vec<AggRow>> {
        let aliases: Vec<String> = query
            .select
            .iter()
            .enumerate()
            .map(|(i, sel)| sel.alias.clone().unwrap_or_else(|| format!("col{i}")))
            .collect();
        let sql = query.to_sql(self.dialect);
        let raw_rows = self.run_query(&sql)?;
        Ok(raw_rows
            .into_iter()
            .map(|values| {
                let mut row = AggRow::new();
                for (alias, value) in aliases.iter().zip(values.into_iter()) {
                    row.insert(alias.clone(), value);
                }
                row
            })
            .collect())
    }

    fn execute_raw(&self, query: &Query) -> DqResult<Vec<Vec<AggValue>>> {
        let sql = query.to_sql(self.dialect);
        self.run_query(&sql)
    }

    fn materialize(&self, table_name: &str, query: Query, temporary: bool) -> DqResult<()> {
        let mut create = CreateTable::new(table_name).as_select(query);
        if temporary {
            create = create.temporary();
        }
        let sql = create.to_sql(self.dialect);
        self.connection
            .0
            .execute_batch(&sql)
            .map_err(DqError::Database)
    }
}
