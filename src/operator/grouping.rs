//! Grouping-shareable operators: uniqueness, distinctness, and unique-value
//! ratio all reduce to the same shape once rows are bucketed by a grouping
//! key and counted — they differ only in which buckets they count.

use crate::error::DqResult;
use crate::operator::{AggValue, GroupingShareableOperator};
use crate::state::FrequenciesAndNumRows;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupingMetric {
    /// Fraction of rows whose bucket occurs exactly once.
    Uniqueness,
    /// Fraction of distinct buckets among all rows (`num_distinct / num_rows`).
    Distinctness,
    /// Fraction of buckets that occur exactly once, among distinct buckets
    /// (`num_unique / num_distinct`).
    UniqueValueRatio,
}

pub struct GroupingOperator {
    pub id: u64,
    pub columns: Vec<String>,
    pub filter: Option<String>,
    pub metric: GroupingMetric,
}

impl GroupingShareableOperator for GroupingOperator {
    fn property_id(&self) -> u64 {
        self.id
    }

    fn grouping_columns(&self) -> Vec<String> {
        self.columns.clone()
    }

    fn filter(&self) -> Option<&str> {
        self.filter.as_deref()
    }

    fn extract_state_from_frequencies(
        &self,
        frequencies: &[(Vec<AggValue>, i64)],
        num_rows: i64,
    ) -> DqResult<crate::state::State> {
        let frequencies = frequencies
            .iter()
            .map(|(key, count)| (key.iter().map(value_to_string).collect(), *count))
            .collect();
        Ok(crate::state::State::FrequenciesAndNumRows(
            FrequenciesAndNumRows {
                id: self.id,
                frequencies,
                num_rows,
            },
        ))
    }
}

fn value_to_string(value: &AggValue) -> String {
    match value {
        AggValue::Int(i) => i.to_string(),
        AggValue::Float(f) => f.to_string(),
        AggValue::Str(s) => s.clone(),
        AggValue::Bool(b) => b.to_string(),
        AggValue::Null => "\u{0}NULL".to_string(),
    }
}

/// Evaluate a grouping metric against a resolved `FrequenciesAndNumRows`
/// state, returning the ratio in `[0.0, 1.0]`.
pub fn evaluate(metric: GroupingMetric, state: &FrequenciesAndNumRows) -> f64 {
    if state.num_rows == 0 {
        return 0.0;
    }
    match metric {
        GroupingMetric::Uniqueness => {
            let unique_rows: i64 = state
                .frequencies
                .iter()
                .filter(|(_, count)| *count == 1)
                .map(|(_, count)| *count)
                .sum();
            unique_rows as f64 / state.num_rows as f64
        }
        GroupingMetric::Distinctness => state.frequencies.len() as f64 / state.num_rows as f64,
        GroupingMetric::UniqueValueRatio => {
            let unique_buckets = state.frequencies.iter().filter(|(_, count)| *count == 1).count();
            unique_buckets as f64 / state.frequencies.len().max(1) as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn freqs(counts: &[i64], num_rows: i64) -> FrequenciesAndNumRows {
        FrequenciesAndNumRows {
            id: 1,
            frequencies: counts
                .iter()
                .enumerate()
                .map(|(i, c)| (vec![i.to_string()], *c))
                .collect(),
            num_rows,
        }
    }

    /// `["A", "B", "B", "C", "C"]`: A appears once, B and C twice each.
    #[test]
    fn uniqueness_distinctness_and_uvr_on_textbook_example() {
        let state = freqs(&[1, 2, 2], 5);
        assert!((evaluate(GroupingMetric::Uniqueness, &state) - 0.2).abs() < 1e-9);
        assert!((evaluate(GroupingMetric::Distinctness, &state) - 0.6).abs() < 1e-9);
        assert!((evaluate(GroupingMetric::UniqueValueRatio, &state) - (1.0 / 3.0)).abs() < 1e-9);
    }
}
