//! A declarative data-quality verification engine.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │   Property (what to measure: Completeness, Mean, ...)    │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [operator factory]
//! ┌─────────────────────────────────────────────────────────┐
//! │     Operator (SQL aggregate fragment, or raw-value pass) │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [aggregation planner]
//! ┌─────────────────────────────────────────────────────────┐
//! │  State (reducible measurement: counts, sums, sketches)   │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [evaluate]
//! ┌─────────────────────────────────────────────────────────┐
//! │            Metric (a Double or Schema value)             │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [check]
//! ┌─────────────────────────────────────────────────────────┐
//! │     Check / Constraint / VerificationResult              │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! Properties with the same `(name, instance, entity, where)` identity
//! share a single scan or a single grouped frequency table
//! ([`sql::aggregation`]), and states persisted by [`metadata`] can be
//! merged across runs ([`merge`]) instead of recomputed.

pub mod check;
pub mod connection;
pub mod error;
pub mod evaluate;
pub mod merge;
pub mod metadata;
pub mod metric;
pub mod operator;
pub mod precondition;
pub mod property;
pub mod run;
pub mod sketch;
pub mod sql;
pub mod state;

// Re-export SQL submodules at crate level, mirroring how query generation
// was exposed before this crate had a single SQL-consuming domain.
pub use sql::ddl;
pub use sql::dialect;
pub use sql::expr;
pub use sql::query;
pub use sql::token;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::check::{
        Check, CheckLevel, CheckResult, CheckStatus, Constraint, ConstraintResult,
        ConstraintStatus, VerificationResult,
    };
    pub use crate::connection::{ConnectionConfig, ConnectionError, ConnectionHandle, Driver};
    pub use crate::error::{DqError, DqResult};
    pub use crate::metadata::{
        DuckDbMetadataRepository, InMemoryMetadataRepository, MetadataRepository, RunId, RunRecord,
    };
    pub use crate::metric::{Entity, Metric, MetricFailure, MetricValue};
    pub use crate::precondition::Precondition;
    pub use crate::property::{MetricType, Property};
    pub use crate::run::{CheckSpec, ConstraintSpec, VerificationRun};
    pub use crate::sql::aggregation::{AggregationPlanner, FrequencyTablePersistence};
    pub use crate::sql::executor::{DuckDbExecutor, SqlExecutor};
    pub use crate::state::State;
}
