//! Reduces a computed [`State`] into the [`Metric`] its owning
//! [`Property`] describes — the last step between the aggregation planner
//! and constraint evaluation.

use crate::metric::{Metric, MetricValue};
use crate::operator::grouping::{evaluate as evaluate_grouping, GroupingMetric};
use crate::property::Property;
use crate::sketch::QuantileSketch;
use crate::state::State;

pub fn evaluate_metric(property: &Property, state: &State) -> Metric {
    let name = property.name();
    let instance = property.instance();
    let entity = property.entity();

    match (property, state) {
        (Property::Size { .. }, State::NumMatches(s)) => {
            Metric::success(name, instance, entity, MetricValue::Double(s.num_matches as f64))
        }
        (Property::Completeness { .. }, State::NumMatchesAndCount(s))
        | (Property::Compliance { .. }, State::NumMatchesAndCount(s))
        | (Property::PatternMatch { .. }, State::NumMatchesAndCount(s)) => {
            if s.count == 0 {
                Metric::failure(name, instance, entity, "no rows matched the filter")
            } else {
                Metric::success(
                    name,
                    instance,
                    entity,
                    MetricValue::Double(s.num_matches as f64 / s.count as f64),
                )
            }
        }
        (Property::Minimum { .. } | Property::MinLength { .. }, State::Min(s)) => {
            if s.min_value.is_finite() {
                Metric::success(name, instance, entity, MetricValue::Double(s.min_value))
            } else {
                Metric::failure(name, instance, entity, "no rows matched the filter")
            }
        }
        (Property::Maximum { .. } | Property::MaxLength { .. }, State::Max(s)) => {
            if s.max_value.is_finite() {
                Metric::success(name, instance, entity, MetricValue::Double(s.max_value))
            } else {
                Metric::failure(name, instance, entity, "no rows matched the filter")
            }
        }
        (Property::Sum { .. }, State::Sum(s)) => {
            Metric::success(name, instance, entity, MetricValue::Double(s.sum))
        }
        (Property::Mean { .. }, State::Mean(s)) => {
            if s.count == 0 {
                Metric::failure(name, instance, entity, "no rows matched the filter")
            } else {
                Metric::success(name, instance, entity, MetricValue::Double(s.total / s.count as f64))
            }
        }
        (Property::StandardDeviation { .. }, State::StandardDeviation(s)) => {
            if s.count < 2 {
                Metric::failure(name, instance, entity, "fewer than two rows matched the filter")
            } else {
                Metric::success(name, instance, entity, MetricValue::Double(s.sample_stddev()))
            }
        }
        (Property::Quantile { quantile, .. }, State::Quantile(s)) => {
            match QuantileSketch::from_bytes(&s.sketch_bytes).ok().and_then(|sketch| sketch.quantile(*quantile)) {
                Some(value) => Metric::success(name, instance, entity, MetricValue::Double(value)),
                None => Metric::failure(name, instance, entity, "quantile sketch was empty"),
            }
        }
        (Property::ApproxDistinctness { .. }, State::ApproxDistinct(s)) => {
            if s.num_rows == 0 {
                Metric::failure(name, instance, entity, "no rows matched the filter")
            } else {
                let ratio = (s.estimate / s.num_rows as f64).min(1.0);
                Metric::success(name, instance, entity, MetricValue::Double(ratio))
            }
        }
        (Property::Uniqueness { .. }, State::FrequenciesAndNumRows(s)) => {
            Metric::success(
                name,
                instance,
                entity,
                MetricValue::Double(evaluate_grouping(GroupingMetric::Uniqueness, s)),
            )
        }
        (Property::Distinctness { .. }, State::FrequenciesAndNumRows(s)) => {
            Metric::success(
                name,
                instance,
                entity,
                MetricValue::Double(evaluate_grouping(GroupingMetric::Distinctness, s)),
            )
        }
        (Property::UniqueValueRatio { .. }, State::FrequenciesAndNumRows(s)) => {
            Metric::success(
                name,
                instance,
                entity,
                MetricValue::Double(evaluate_grouping(GroupingMetric::UniqueValueRatio, s)),
            )
        }
        (Property::Schema, State::Schema(s)) => {
            Metric::success(name, instance, entity, MetricValue::Schema(s.columns.clone()))
        }
        _ => Metric::failure(
            name,
            instance,
            entity,
            format!("state kind {} does not match property {}", state.kind(), name),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{MinState, NumMatchesAndCount, StandardDeviationState};

    #[test]
    fn completeness_example_from_ratio() {
        let property = Property::Completeness {
            column: "att1".into(),
            filter: None,
        };
        let state = State::NumMatchesAndCount(NumMatchesAndCount {
            id: property.property_identifier(),
            num_matches: 4,
            count: 5,
        });
        let metric = evaluate_metric(&property, &state);
        assert_eq!(metric.value.unwrap().as_double(), Some(0.8));
    }

    #[test]
    fn standard_deviation_matches_textbook_example() {
        // att1 = [1, 2, 3, 4, 5, 6]
        let property = Property::StandardDeviation {
            column: "att1".into(),
            filter: None,
        };
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        let m2 = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>();
        let state = State::StandardDeviation(StandardDeviationState {
            id: property.property_identifier(),
            count: values.len() as i64,
            mean,
            m2,
        });
        let metric = evaluate_metric(&property, &state);
        let stddev = metric.value.unwrap().as_double().unwrap();
        assert!((stddev - 1.870_829).abs() < 1e-5, "stddev was {stddev}");
    }

    #[test]
    fn distinctness_and_unique_value_ratio_on_textbook_example() {
        use crate::state::FrequenciesAndNumRows;
        // productName = ["A", "B", "B", "C", "C"]: 3 distinct buckets among
        // 5 rows, 1 of those 3 buckets occurs exactly once.
        let freq_state = FrequenciesAndNumRows {
            id: 0,
            frequencies: vec![(vec!["A".to_string()], 1), (vec!["B".to_string()], 2), (vec!["C".to_string()], 2)],
            num_rows: 5,
        };

        let distinctness = Property::Distinctness {
            columns: vec!["productName".into()],
            filter: None,
        };
        let state = State::FrequenciesAndNumRows(FrequenciesAndNumRows {
            id: distinctness.property_identifier(),
            ..freq_state.clone()
        });
        let metric = evaluate_metric(&distinctness, &state);
        assert!((metric.value.unwrap().as_double().unwrap() - 0.6).abs() < 1e-9);

        let unique_value_ratio = Property::UniqueValueRatio {
            columns: vec!["productName".into()],
            filter: None,
        };
        let state = State::FrequenciesAndNumRows(FrequenciesAndNumRows {
            id: unique_value_ratio.property_identifier(),
            ..freq_state
        });
        let metric = evaluate_metric(&unique_value_ratio, &state);
        assert!((metric.value.unwrap().as_double().unwrap() - (1.0 / 3.0)).abs() < 1e-9);
    }

    #[test]
    fn approx_distinctness_reports_a_ratio_not_a_raw_count() {
        use crate::state::ApproxDistinctState;
        let property = Property::ApproxDistinctness {
            columns: vec!["tag".into()],
            filter: None,
        };
        let state = State::ApproxDistinct(ApproxDistinctState {
            id: property.property_identifier(),
            sketch_bytes: Vec::new(),
            estimate: 10.0,
            num_rows: 1000,
        });
        let metric = evaluate_metric(&property, &state);
        assert!((metric.value.unwrap().as_double().unwrap() - 0.01).abs() < 1e-9);
    }

    #[test]
    fn minimum_with_no_matching_rows_fails_rather_than_reporting_zero() {
        let property = Property::Minimum {
            column: "att1".into(),
            filter: Some("att1 > 1000".into()),
        };
        let state = State::Min(MinState {
            id: property.property_identifier(),
            min_value: f64::INFINITY,
        });
        let metric = evaluate_metric(&property, &state);
        assert!(metric.value.is_err());
    }
}
