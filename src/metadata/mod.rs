//! Metadata repository: persists verification runs, checks, metrics, and
//! states so later runs can merge into prior state instead of recomputing
//! it from scratch.

pub mod duckdb_repo;
pub mod memory;
pub mod repository;

pub use duckdb_repo::DuckDbMetadataRepository;
pub use memory::InMemoryMetadataRepository;
pub use repository::{MetadataRepository, RunId, RunRecord};
