//! Quantile sketch.
//!
//! Backed by [`sketches_ddsketch`]'s relative-error DDSketch rather than a
//! KLL sketch: no vetted KLL crate exists in the Rust ecosystem at the time
//! of writing (see DESIGN.md), and DDSketch satisfies the same contract
//! (rank-error bounded, mergeable, serializable) the quantile property
//! needs.

use sketches_ddsketch::{Config, DDSketch};

use crate::error::{DqError, DqResult};

/// A mergeable, serializable quantile sketch.
#[derive(Debug, Clone)]
pub struct QuantileSketch {
    inner: DDSketch,
}

impl QuantileSketch {
    pub fn new() -> Self {
        Self {
            inner: DDSketch::new(Config::defaults()),
        }
    }

    pub fn add(&mut self, value: f64) {
        self.inner.add(value);
    }

    /// The value at the given quantile in `[0.0, 1.0]`.
    pub fn quantile(&self, q: f64) -> Option<f64> {
        self.inner.quantile(q).ok().flatten()
    }

    pub fn merge(&mut self, other: &QuantileSketch) -> DqResult<()> {
        self.inner
            .merge(&other.inner)
            .map_err(|e| DqError::StateMerging {
                property: "Quantile".to_string(),
                reason: e.to_string(),
            })
    }

    pub fn to_bytes(&self) -> DqResult<Vec<u8>> {
        bincode::serialize(&self.inner).map_err(DqError::SketchEncoding)
    }

    pub fn from_bytes(bytes: &[u8]) -> DqResult<Self> {
        let inner: DDSketch = bincode::deserialize(bytes).map_err(DqError::SketchEncoding)?;
        Ok(Self { inner })
    }
}

impl Default for QuantileSketch {
    fn default() -> Self {
        Self::new()
    }
}
