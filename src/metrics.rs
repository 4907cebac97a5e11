//! Classification and throughput metrics derived from aggregated counts.

use aggregate::AggregatedRow;

/// An aggregated row with its derived metrics. A `None` metric had a zero
/// denominator.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnrichedRow {
    /// The aggregated measurements.
    pub row: AggregatedRow,
    /// Precision of the true class, `TP / (TP + FP)`.
    pub true_precision: Option<f64>,
    /// Recall of the true class, `TP / (TP + FN)`.
    pub true_recall: Option<f64>,
    /// Precision of the false class, `TN / (TN + FN)`.
    pub false_precision: Option<f64>,
    /// Recall of the false class, `TN / (TN + FP)`.
    pub false_recall: Option<f64>,
    /// F1-score of the true class.
    pub true_f1: Option<f64>,
    /// F1-score of the false class.
    pub false_f1: Option<f64>,
    /// Mean processing time per event (ms).
    pub time_per_event: Option<f64>,
}

impl EnrichedRow {
    /// Derives the metrics of one aggregated row.
    pub fn from_row(row: AggregatedRow) -> Self {
        let tp = row.true_positive;
        let tn = row.true_negative;
        let fp = row.false_positive;
        let fnn = row.false_negative;

        let true_precision = precision(tp, fp);
        let true_recall = recall(tp, fnn);
        let false_precision = precision(tn, fnn);
        let false_recall = recall(tn, fp);

        // Each window is counted once per class.
        let event_count = 2.0 * (tp + tn + fp + fnn);

        EnrichedRow {
            row: row,
            true_precision: true_precision,
            true_recall: true_recall,
            false_precision: false_precision,
            false_recall: false_recall,
            true_f1: f1(true_precision, true_recall),
            false_f1: f1(false_precision, false_recall),
            time_per_event: ratio(row.iter_time, event_count),
        }
    }

    /// Number of derived metrics that are undefined.
    pub fn undefined_count(&self) -> usize {
        [
            self.true_precision,
            self.true_recall,
            self.false_precision,
            self.false_recall,
            self.true_f1,
            self.false_f1,
            self.time_per_event,
        ].iter()
            .filter(|m| m.is_none())
            .count()
    }
}

/// Derives metrics for every row, keeping the order. Never fails: undefined
/// ratios stay `None`.
pub fn derive(rows: &[AggregatedRow]) -> Vec<EnrichedRow> {
    let enriched = rows.iter()
        .map(|&row| EnrichedRow::from_row(row))
        .collect::<Vec<_>>();

    for e in enriched.iter().filter(|e| e.undefined_count() > 0) {
        debug!(
            "epsilon {}: {} undefined metric(s)",
            e.row.epsilon,
            e.undefined_count()
        );
    }
    enriched
}

/// `numerator / denominator`, or `None` when the denominator is zero.
pub fn ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 {
        None
    } else {
        Some(numerator / denominator)
    }
}

/// Fraction of the positive predictions that were right.
pub fn precision(tp: f64, fp: f64) -> Option<f64> {
    ratio(tp, tp + fp)
}

/// Fraction of the positives that were found.
pub fn recall(tp: f64, fnn: f64) -> Option<f64> {
    ratio(tp, tp + fnn)
}

/// `2ab / (a + b)`, undefined when `a + b` is zero.
pub fn harmonic_mean(a: f64, b: f64) -> Option<f64> {
    ratio(2.0 * a * b, a + b)
}

/// F1-score from precision and recall; undefined if either input is.
pub fn f1(precision: Option<f64>, recall: Option<f64>) -> Option<f64> {
    match (precision, recall) {
        (Some(p), Some(r)) => harmonic_mean(p, r),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn agg(tp: f64, tn: f64, fp: f64, fnn: f64, iter_time: f64) -> AggregatedRow {
        AggregatedRow {
            epsilon: 0.1,
            true_positive: tp,
            true_negative: tn,
            false_positive: fp,
            false_negative: fnn,
            init_time: 0.0,
            iter_time: iter_time,
            nb_build: 0.0,
            mte: 0.0,
            members: 1,
        }
    }

    #[test]
    fn derives_all_metrics() {
        let e = EnrichedRow::from_row(agg(7.0, 7.0, 2.0, 2.0, 36.0));
        assert!((e.true_precision.unwrap() - 7.0 / 9.0).abs() < 1e-12);
        assert!((e.true_recall.unwrap() - 7.0 / 9.0).abs() < 1e-12);
        assert!((e.false_precision.unwrap() - 7.0 / 9.0).abs() < 1e-12);
        assert!((e.false_recall.unwrap() - 7.0 / 9.0).abs() < 1e-12);
        assert!((e.true_f1.unwrap() - 7.0 / 9.0).abs() < 1e-12);
        assert!((e.false_f1.unwrap() - 7.0 / 9.0).abs() < 1e-12);
        // 2 * (7 + 7 + 2 + 2) = 36 events
        assert_eq!(e.time_per_event, Some(1.0));
        assert_eq!(e.undefined_count(), 0);
    }

    #[test]
    fn asymmetric_counts() {
        let e = EnrichedRow::from_row(agg(6.0, 3.0, 2.0, 4.0, 1.0));
        assert_eq!(e.true_precision, Some(0.75));
        assert_eq!(e.true_recall, Some(0.6));
        assert!((e.false_precision.unwrap() - 3.0 / 7.0).abs() < 1e-12);
        assert_eq!(e.false_recall, Some(0.6));
        assert!((e.true_f1.unwrap() - 2.0 * 0.75 * 0.6 / 1.35).abs() < 1e-12);
    }

    #[test]
    fn zero_denominator_is_undefined_only_for_that_field() {
        let e = EnrichedRow::from_row(agg(0.0, 5.0, 0.0, 3.0, 16.0));
        assert_eq!(e.true_precision, None);
        assert_eq!(e.true_recall, Some(0.0));
        assert_eq!(e.true_f1, None);
        assert_eq!(e.false_precision, Some(5.0 / 8.0));
        assert_eq!(e.false_recall, Some(1.0));
        assert!(e.false_f1.is_some());
        assert_eq!(e.time_per_event, Some(1.0));
        assert_eq!(e.undefined_count(), 2);
    }

    #[test]
    fn zero_precision_and_recall_give_undefined_f1() {
        let e = EnrichedRow::from_row(agg(0.0, 4.0, 3.0, 3.0, 1.0));
        assert_eq!(e.true_precision, Some(0.0));
        assert_eq!(e.true_recall, Some(0.0));
        assert_eq!(e.true_f1, None);
    }

    #[test]
    fn empty_row_is_entirely_undefined() {
        let e = EnrichedRow::from_row(agg(0.0, 0.0, 0.0, 0.0, 3.0));
        assert_eq!(e.undefined_count(), 7);
    }

    #[test]
    fn derive_keeps_order() {
        let mut second = agg(1.0, 1.0, 1.0, 1.0, 1.0);
        second.epsilon = 0.2;
        let rows = derive(&[agg(0.0, 0.0, 0.0, 0.0, 0.0), second]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].row.epsilon, 0.1);
        assert_eq!(rows[1].row.epsilon, 0.2);
        assert_eq!(rows[1].true_precision, Some(0.5));
    }

    proptest! {
        #[test]
        fn harmonic_mean_of_equal_values(x in 1e-6f64..1e6) {
            let h = harmonic_mean(x, x).unwrap();
            prop_assert!((h - x).abs() <= 1e-9 * x);
        }

        #[test]
        fn harmonic_mean_is_symmetric(a in 0.0f64..1e6, b in 0.0f64..1e6) {
            prop_assert_eq!(harmonic_mean(a, b), harmonic_mean(b, a));
        }

        #[test]
        fn precision_recall_bounds(tp in 0u32..10_000, fp in 0u32..10_000, fnn in 0u32..10_000) {
            let (tp, fp, fnn) = (tp as f64, fp as f64, fnn as f64);
            prop_assume!(tp + fp > 0.0 && tp + fnn > 0.0);

            let p = precision(tp, fp).unwrap();
            let r = recall(tp, fnn).unwrap();
            prop_assert!(p >= 0.0 && p <= 1.0);
            prop_assert!(r >= 0.0 && r <= 1.0);

            if let Some(f) = f1(Some(p), Some(r)) {
                prop_assert!(f >= p.min(r) - 1e-12 && f <= p.max(r) + 1e-12);
            } else {
                prop_assert_eq!(tp, 0.0);
            }
        }
    }
}
