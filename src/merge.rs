//! State merge algebra: each state variant has exactly one associative,
//! commutative combination rule, so that combining partition-local states
//! (or two runs' persisted states) is independent of order and grouping.
//!
//! `FrequenciesAndNumRows` is deliberately not mergeable: two frequency
//! tables may have been bucketed under different filters or row counts, and
//! naively unioning their rows would silently produce a wrong
//! uniqueness/distinctness ratio rather than fail loudly.

use crate::error::{DqError, DqResult};
use crate::sketch::{DistinctSketch, QuantileSketch};
use crate::state::State;

/// Merge two states of the same property into one. Both inputs must carry
/// the same property id and be the same variant.
pub fn merge(a: State, b: State) -> DqResult<State> {
    if a.id() != b.id() {
        return Err(DqError::StateMerging {
            property: format!("id {} vs {}", a.id(), b.id()),
            reason: "cannot merge states for different properties".to_string(),
        });
    }

    match (a, b) {
        (State::NumMatches(mut x), State::NumMatches(y)) => {
            x.num_matches += y.num_matches;
            Ok(State::NumMatches(x))
        }
        (State::NumMatchesAndCount(mut x), State::NumMatchesAndCount(y)) => {
            x.num_matches += y.num_matches;
            x.count += y.count;
            Ok(State::NumMatchesAndCount(x))
        }
        (State::Min(mut x), State::Min(y)) => {
            x.min_value = x.min_value.min(y.min_value);
            Ok(State::Min(x))
        }
        (State::Max(mut x), State::Max(y)) => {
            x.max_value = x.max_value.max(y.max_value);
            Ok(State::Max(x))
        }
        (State::Sum(mut x), State::Sum(y)) => {
            x.sum += y.sum;
            Ok(State::Sum(x))
        }
        (State::Mean(mut x), State::Mean(y)) => {
            x.total += y.total;
            x.count += y.count;
            Ok(State::Mean(x))
        }
        (State::StandardDeviation(x), State::StandardDeviation(y)) => {
            Ok(State::StandardDeviation(merge_variance(x, y)))
        }
        (State::Quantile(mut x), State::Quantile(y)) => {
            let mut sketch = QuantileSketch::from_bytes(&x.sketch_bytes)?;
            let other = QuantileSketch::from_bytes(&y.sketch_bytes)?;
            sketch.merge(&other)?;
            x.sketch_bytes = sketch.to_bytes()?;
            Ok(State::Quantile(x))
        }
        (State::ApproxDistinct(mut x), State::ApproxDistinct(y)) => {
            let mut sketch = DistinctSketch::from_bytes(&x.sketch_bytes)?;
            let other = DistinctSketch::from_bytes(&y.sketch_bytes)?;
            sketch.merge(&other)?;
            x.estimate = sketch.count();
            x.num_rows += y.num_rows;
            x.sketch_bytes = sketch.to_bytes()?;
            Ok(State::ApproxDistinct(x))
        }
        (State::Schema(x), State::Schema(_)) => {
            // Schema states describe the dataset's shape, not an
            // accumulable measurement; the most recent snapshot wins.
            Ok(State::Schema(x))
        }
        (State::FrequenciesAndNumRows(x), State::FrequenciesAndNumRows(_)) => {
            Err(DqError::StateMerging {
                property: x.id.to_string(),
                reason: "FrequenciesAndNumRows cannot be merged across partitions".to_string(),
            })
        }
        (a, b) => Err(DqError::StateMerging {
            property: a.id().to_string(),
            reason: format!("mismatched state kinds: {} vs {}", a.kind(), b.kind()),
        }),
    }
}

/// Merge two partitions' Welford statistics using Chan et al.'s parallel
/// variance formula.
fn merge_variance(
    x: crate::state::StandardDeviationState,
    y: crate::state::StandardDeviationState,
) -> crate::state::StandardDeviationState {
    if x.count == 0 {
        return y;
    }
    if y.count == 0 {
        return x;
    }
    let count = x.count + y.count;
    let delta = y.mean - x.mean;
    let mean = x.mean + delta * (y.count as f64) / (count as f64);
    let m2 = x.m2 + y.m2 + delta * delta * (x.count as f64) * (y.count as f64) / (count as f64);
    crate::state::StandardDeviationState {
        id: x.id,
        count,
        mean,
        m2,
    }
}

/// Fold many states for the same property into one via repeated pairwise
/// merge. Merge associativity (and the Chan-Welford formula's symmetry)
/// guarantees the result is independent of fold order.
pub fn merge_all(states: Vec<State>) -> DqResult<Option<State>> {
    let mut iter = states.into_iter();
    let Some(first) = iter.next() else {
        return Ok(None);
    };
    let mut acc = first;
    for state in iter {
        acc = merge(acc, state)?;
    }
    Ok(Some(acc))
}
