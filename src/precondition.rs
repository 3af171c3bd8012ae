//! Preconditions: schema-level checks a property requires before it can be
//! compiled into SQL against a given dataset.

use indexmap::IndexMap;

/// A precondition over a dataset's schema.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Precondition {
    HasColumn(String),
    IsNumeric(String),
    IsString(String),
    AtLeastOne(Vec<Precondition>),
}

impl Precondition {
    /// Evaluate this precondition against a schema (column name -> DuckDB
    /// type name, as reported by `PRAGMA table_info`).
    pub fn is_satisfied(&self, schema: &IndexMap<String, String>) -> bool {
        match self {
            Precondition::HasColumn(col) => schema.contains_key(col),
            Precondition::IsNumeric(col) => schema
                .get(col)
                .map(|ty| is_numeric_type(ty))
                .unwrap_or(false),
            Precondition::IsString(col) => schema
                .get(col)
                .map(|ty| is_string_type(ty))
                .unwrap_or(false),
            Precondition::AtLeastOne(preconditions) => {
                preconditions.iter().any(|p| p.is_satisfied(schema))
            }
        }
    }

    /// A human-readable description, carried into the failure metric
    /// [`crate::run::VerificationRun`] synthesizes for a property whose
    /// precondition does not hold.
    pub fn describe(&self) -> String {
        match self {
            Precondition::HasColumn(col) => format!("column `{col}` must exist"),
            Precondition::IsNumeric(col) => format!("column `{col}` must be numeric"),
            Precondition::IsString(col) => format!("column `{col}` must be a string type"),
            Precondition::AtLeastOne(preconditions) => {
                let parts: Vec<String> = preconditions.iter().map(|p| p.describe()).collect();
                format!("at least one of: [{}]", parts.join(", "))
            }
        }
    }
}

fn is_numeric_type(ty: &str) -> bool {
    let ty = ty.to_uppercase();
    matches!(
        ty.as_str(),
        "TINYINT"
            | "SMALLINT"
            | "INTEGER"
            | "BIGINT"
            | "HUGEINT"
            | "UTINYINT"
            | "USMALLINT"
            | "UINTEGER"
            | "UBIGINT"
            | "FLOAT"
            | "DOUBLE"
            | "DECIMAL"
            | "REAL"
    ) || ty.starts_with("DECIMAL(")
}

fn is_string_type(ty: &str) -> bool {
    let ty = ty.to_uppercase();
    matches!(ty.as_str(), "VARCHAR" | "STRING" | "TEXT" | "CHAR" | "BPCHAR")
}
