//! States: reducible intermediate measurements produced by a single scan or
//! grouping pass, merged across partitions and runs by [`crate::merge`].

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// `COUNT(...)` over a single predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumMatches {
    pub id: u64,
    pub num_matches: i64,
}

/// `COUNT(matches)` paired with `COUNT(*)`, the shared shape behind ratio
/// metrics such as completeness and compliance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumMatchesAndCount {
    pub id: u64,
    pub num_matches: i64,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinState {
    pub id: u64,
    pub min_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaxState {
    pub id: u64,
    pub max_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SumState {
    pub id: u64,
    pub sum: f64,
}

/// Total and count, the minimal sufficient statistic for a mean that is
/// associatively mergeable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeanState {
    pub id: u64,
    pub total: f64,
    pub count: i64,
}

/// Welford's parallel-variance sufficient statistic: count, mean, and the
/// sum of squared deviations from the mean (`M2`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardDeviationState {
    pub id: u64,
    pub count: i64,
    pub mean: f64,
    pub m2: f64,
}

impl StandardDeviationState {
    pub fn sample_stddev(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            (self.m2 / (self.count as f64 - 1.0)).sqrt()
        }
    }
}

/// A serialized, mergeable quantile sketch. `sketch_type` records which
/// sketch implementation produced `sketch_bytes` (e.g. `"ddsketch_f64"`) so
/// a future version can detect incompatible sketch parameters before
/// attempting to merge or deserialize a persisted state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantileState {
    pub id: u64,
    pub sketch_bytes: Vec<u8>,
    pub q: f64,
    pub sketch_type: String,
}

/// A serialized, mergeable HyperLogLog distinctness sketch, plus the
/// estimate and row count needed to derive a distinctness ratio without
/// redeserializing the sketch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApproxDistinctState {
    pub id: u64,
    pub sketch_bytes: Vec<u8>,
    pub estimate: f64,
    pub num_rows: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaState {
    pub id: u64,
    pub columns: IndexMap<String, String>,
}

/// Per-bucket row counts keyed by a grouping column tuple. Deliberately not
/// mergeable: merging two frequency tables computed under different filters
/// or row counts would silently produce a wrong distinctness/uniqueness
/// ratio, so [`crate::merge`] rejects it outright.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequenciesAndNumRows {
    pub id: u64,
    /// (grouping key values, row count) pairs.
    pub frequencies: Vec<(Vec<String>, i64)>,
    pub num_rows: i64,
}

/// The intermediate measurement behind a metric, keyed by the property's
/// stable identifier so it can be persisted, retrieved, and merged across
/// runs without knowledge of the property itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum State {
    NumMatches(NumMatches),
    NumMatchesAndCount(NumMatchesAndCount),
    Min(MinState),
    Max(MaxState),
    Sum(SumState),
    Mean(MeanState),
    StandardDeviation(StandardDeviationState),
    Quantile(QuantileState),
    ApproxDistinct(ApproxDistinctState),
    Schema(SchemaState),
    FrequenciesAndNumRows(FrequenciesAndNumRows),
}

impl State {
    pub fn id(&self) -> u64 {
        match self {
            State::NumMatches(s) => s.id,
            State::NumMatchesAndCount(s) => s.id,
            State::Min(s) => s.id,
            State::Max(s) => s.id,
            State::Sum(s) => s.id,
            State::Mean(s) => s.id,
            State::StandardDeviation(s) => s.id,
            State::Quantile(s) => s.id,
            State::ApproxDistinct(s) => s.id,
            State::Schema(s) => s.id,
            State::FrequenciesAndNumRows(s) => s.id,
        }
    }

    /// The variant name, used in error messages and the `dq_states` table.
    pub fn kind(&self) -> &'static str {
        match self {
            State::NumMatches(_) => "NumMatches",
            State::NumMatchesAndCount(_) => "NumMatchesAndCount",
            State::Min(_) => "Min",
            State::Max(_) => "Max",
            State::Sum(_) => "Sum",
            State::Mean(_) => "Mean",
            State::StandardDeviation(_) => "StandardDeviation",
            State::Quantile(_) => "Quantile",
            State::ApproxDistinct(_) => "ApproxDistinct",
            State::Schema(_) => "Schema",
            State::FrequenciesAndNumRows(_) => "FrequenciesAndNumRows",
        }
    }
}
