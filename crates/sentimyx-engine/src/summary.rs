//! Summary statistics over metric readings.

use sentimyx_common::Reducer;

use crate::record::{MetricValues, Reading, TermRecord};

/// Reduce `values` to one scalar, ignoring missing readings.
///
/// Returns `None` when no usable reading exists; an empty input is never
/// reported as zero.
pub fn reduce(values: &[Reading], reducer: Reducer) -> Reading {
    let usable: Vec<f64> = values
        .iter()
        .flatten()
        .copied()
        .filter(|v| !v.is_nan())
        .collect();
    if usable.is_empty() {
        return None;
    }

    Some(match reducer {
        Reducer::Mean => mean(&usable),
        Reducer::Median => median(usable),
    })
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn median(mut values: Vec<f64>) -> f64 {
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

/// Replace every series of `record` with its summary statistic.
/// Metrics that are already summarized are left untouched.
pub fn summarize(record: &mut TermRecord, reducer: Reducer) {
    for values in record.metrics.values_mut() {
        if let MetricValues::Series(series) = values {
            *values = MetricValues::Summary(reduce(series, reducer));
        }
    }
    record.provenance.clear();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_singleton_is_identity() {
        for x in [0.5, -1.25, 0.0] {
            assert_eq!(reduce(&[Some(x)], Reducer::Mean), Some(x));
            assert_eq!(reduce(&[Some(x)], Reducer::Median), Some(x));
        }
    }

    #[test]
    fn test_empty_and_all_missing_are_none() {
        for reducer in [Reducer::Mean, Reducer::Median] {
            assert_eq!(reduce(&[], reducer), None);
            assert_eq!(reduce(&[None, None], reducer), None);
        }
    }

    #[test]
    fn test_mean_ignores_missing() {
        let values = [Some(0.5), None, Some(1.0), Some(0.0)];
        assert_eq!(reduce(&values, Reducer::Mean), Some(0.5));
    }

    #[test]
    fn test_median_odd_and_even() {
        let odd = [Some(3.0), Some(-1.0), None, Some(2.0)];
        assert_eq!(reduce(&odd, Reducer::Median), Some(2.0));

        let even = [Some(4.0), Some(1.0), Some(3.0), Some(2.0)];
        assert_eq!(reduce(&even, Reducer::Median), Some(2.5));
    }

    #[test]
    fn test_nan_reading_is_not_usable() {
        assert_eq!(reduce(&[Some(f64::NAN)], Reducer::Mean), None);
    }

    #[test]
    fn test_summarize_record() {
        let mut record = TermRecord::new();
        record.engines = vec!["s1".into(), "s2".into()];
        record.extend_metric("polarity", 0, [Some(0.5)]);
        record.extend_metric("polarity", 1, [None]);
        record.extend_metric("sentiment", 1, [None, None]);

        summarize(&mut record, Reducer::Mean);
        assert_eq!(record.metrics["polarity"], MetricValues::Summary(Some(0.5)));
        assert_eq!(record.metrics["sentiment"], MetricValues::Summary(None));
        assert!(record.provenance.is_empty());

        // A second pass leaves summaries alone.
        summarize(&mut record, Reducer::Median);
        assert_eq!(record.metrics["polarity"], MetricValues::Summary(Some(0.5)));
    }
}
