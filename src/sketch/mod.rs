//! Mergeable probabilistic sketches backing the [`crate::property::Property::Quantile`]
//! and [`crate::property::Property::ApproxDistinctness`] properties.
//!
//! Both sketches are opaque byte blobs once serialized, so [`crate::state::State`]
//! never needs to know which sketch implementation produced them.

pub mod hll;
pub mod kll;

pub use hll::DistinctSketch;
pub use kll::QuantileSketch;
