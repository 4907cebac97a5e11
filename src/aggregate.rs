//! Merges the trial sets of all seeds into one mean row per epsilon.

use average::Mean;
use itertools::Itertools;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use trial::{TrialRow, TrialSet};

/// Mean, across seeds, of every measurement at one epsilon value.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct AggregatedRow {
    /// Swept parameter value.
    pub epsilon: f64,
    /// Mean true positives.
    pub true_positive: f64,
    /// Mean true negatives.
    pub true_negative: f64,
    /// Mean false positives.
    pub false_positive: f64,
    /// Mean false negatives.
    pub false_negative: f64,
    /// Mean initialization time (ms).
    pub init_time: f64,
    /// Mean processing time (ms).
    pub iter_time: f64,
    /// Mean number of builds.
    pub nb_build: f64,
    /// Mean of the algorithm's MTE.
    pub mte: f64,
    /// Number of seed rows averaged into this row.
    #[serde(skip)]
    pub members: usize,
}

/// A data-integrity problem found while aggregating. Reported, never
/// repaired.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Anomaly {
    /// An epsilon value that not every seed produced.
    IncompleteGroup {
        /// The epsilon value.
        epsilon: f64,
        /// Distinct seeds that produced it.
        members: usize,
        /// Number of seeds in the sweep.
        expected: usize,
    },
    /// An epsilon value some seed produced more than once.
    DuplicateRows {
        /// The epsilon value.
        epsilon: f64,
        /// Rows found for it.
        rows: usize,
        /// Distinct seeds among those rows.
        seeds: usize,
    },
}

impl fmt::Display for Anomaly {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Anomaly::IncompleteGroup {
                epsilon,
                members,
                expected,
            } => write!(
                f,
                "epsilon {} produced by {} of {} seeds",
                epsilon,
                members,
                expected
            ),
            Anomaly::DuplicateRows {
                epsilon,
                rows,
                seeds,
            } => write!(f, "epsilon {} has {} rows from {} seeds", epsilon, rows, seeds),
        }
    }
}

/// Aggregated rows, ascending by epsilon, and what was wrong with them.
#[derive(Clone, Debug, Default)]
pub struct Aggregation {
    /// One row per distinct epsilon.
    pub rows: Vec<AggregatedRow>,
    /// Groups that were emitted but are suspect.
    pub anomalies: Vec<Anomaly>,
}

impl Aggregation {
    /// True if every epsilon had one row per seed.
    pub fn is_complete(&self) -> bool {
        self.anomalies.is_empty()
    }

    fn report(&mut self, anomaly: Anomaly) {
        warn!("{}", anomaly);
        self.anomalies.push(anomaly);
    }
}

/// Groups all rows by exact epsilon value and averages each group.
///
/// Epsilons are compared bit for bit. Within a sweep every seed emits the same
/// text for the same step, so equal steps parse to equal bits; a tolerance
/// would only hide a mismatch. A group is complete when every seed
/// contributed exactly one row; any other group is still averaged over the
/// rows it has, and is reported.
pub fn aggregate(sets: &BTreeMap<u64, TrialSet>) -> Aggregation {
    let expected = sets.len();

    let mut rows = sets.values()
        .flat_map(|set| set.rows().iter())
        .collect::<Vec<&TrialRow>>();
    rows.sort_by(|a, b| a.epsilon.partial_cmp(&b.epsilon).unwrap_or(Ordering::Equal));

    let mut aggregation = Aggregation::default();
    for (bits, group) in &rows.into_iter().group_by(|r| r.epsilon.to_bits()) {
        let group = group.collect::<Vec<&TrialRow>>();
        let row = mean_row(f64::from_bits(bits), &group);

        let seeds = group.iter().map(|r| r.seed).unique().count();
        if seeds != expected {
            aggregation.report(Anomaly::IncompleteGroup {
                epsilon: row.epsilon,
                members: seeds,
                expected: expected,
            });
        }
        if row.members != seeds {
            aggregation.report(Anomaly::DuplicateRows {
                epsilon: row.epsilon,
                rows: row.members,
                seeds: seeds,
            });
        }
        aggregation.rows.push(row);
    }

    debug!(
        "aggregated {} seeds into {} epsilon rows",
        expected,
        aggregation.rows.len()
    );
    aggregation
}

fn mean_row(epsilon: f64, group: &[&TrialRow]) -> AggregatedRow {
    AggregatedRow {
        epsilon: epsilon,
        true_positive: mean_of(group, |r| r.true_positive as f64),
        true_negative: mean_of(group, |r| r.true_negative as f64),
        false_positive: mean_of(group, |r| r.false_positive as f64),
        false_negative: mean_of(group, |r| r.false_negative as f64),
        init_time: mean_of(group, |r| r.init_time),
        iter_time: mean_of(group, |r| r.iter_time),
        nb_build: mean_of(group, |r| r.nb_build as f64),
        mte: mean_of(group, |r| r.mte),
        members: group.len(),
    }
}

#[inline]
fn mean_of<F: Fn(&TrialRow) -> f64>(group: &[&TrialRow], field: F) -> f64 {
    group.iter().map(|r| field(*r)).collect::<Mean>().mean()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(seed: u64, epsilon: f64, counts: (u64, u64, u64, u64), iter_time: f64) -> TrialRow {
        TrialRow {
            seed: seed,
            epsilon: epsilon,
            true_positive: counts.0,
            true_negative: counts.1,
            false_positive: counts.2,
            false_negative: counts.3,
            init_time: 1.0 + seed as f64,
            iter_time: iter_time,
            nb_build: 2,
            mte: 0.5,
        }
    }

    fn sets(sets: Vec<TrialSet>) -> BTreeMap<u64, TrialSet> {
        sets.into_iter().map(|s| (s.seed(), s)).collect()
    }

    #[test]
    fn single_seed_is_identity() {
        let set = TrialSet::new(
            4,
            vec![row(4, 0.1, (8, 8, 2, 2), 10.0), row(4, 0.2, (6, 7, 3, 1), 12.5)],
        );
        let agg = aggregate(&sets(vec![set.clone()]));

        assert!(agg.is_complete());
        assert_eq!(agg.rows.len(), 2);
        for (a, r) in agg.rows.iter().zip(set.rows()) {
            assert_eq!(a.epsilon, r.epsilon);
            assert_eq!(a.true_positive, r.true_positive as f64);
            assert_eq!(a.true_negative, r.true_negative as f64);
            assert_eq!(a.false_positive, r.false_positive as f64);
            assert_eq!(a.false_negative, r.false_negative as f64);
            assert_eq!(a.init_time, r.init_time);
            assert_eq!(a.iter_time, r.iter_time);
            assert_eq!(a.nb_build, r.nb_build as f64);
            assert_eq!(a.mte, r.mte);
            assert_eq!(a.members, 1);
        }
    }

    #[test]
    fn identical_seeds_equal_any_seed() {
        let make = |seed| {
            let mut r1 = row(seed, 0.1, (5, 6, 7, 8), 3.0);
            let mut r2 = row(seed, 0.2, (1, 2, 3, 4), 4.0);
            r1.init_time = 2.0;
            r2.init_time = 2.0;
            TrialSet::new(seed, vec![r1, r2])
        };
        let agg = aggregate(&sets(vec![make(0), make(1), make(2)]));

        assert!(agg.is_complete());
        let one = aggregate(&sets(vec![make(9)]));
        assert_eq!(agg.rows.len(), one.rows.len());
        for (a, b) in agg.rows.iter().zip(one.rows.iter()) {
            assert_eq!(a.epsilon, b.epsilon);
            assert!((a.true_positive - b.true_positive).abs() < 1e-12);
            assert!((a.false_negative - b.false_negative).abs() < 1e-12);
            assert!((a.iter_time - b.iter_time).abs() < 1e-12);
            assert_eq!(a.members, 3);
        }
    }

    #[test]
    fn means_across_seeds() {
        let s0 = TrialSet::new(0, vec![row(0, 0.1, (8, 8, 2, 2), 10.0), row(0, 0.2, (6, 6, 4, 4), 20.0)]);
        let s1 = TrialSet::new(1, vec![row(1, 0.1, (6, 6, 2, 2), 30.0), row(1, 0.2, (4, 4, 4, 4), 40.0)]);
        let agg = aggregate(&sets(vec![s1, s0]));

        assert_eq!(agg.rows.len(), 2);
        let first = agg.rows[0];
        assert_eq!(first.epsilon, 0.1);
        assert_eq!(
            (first.true_positive, first.true_negative, first.false_positive, first.false_negative),
            (7.0, 7.0, 2.0, 2.0)
        );
        assert_eq!(first.iter_time, 20.0);
        assert_eq!(first.init_time, 1.5);

        let second = agg.rows[1];
        assert_eq!(second.epsilon, 0.2);
        assert_eq!(
            (second.true_positive, second.true_negative, second.false_positive, second.false_negative),
            (5.0, 5.0, 4.0, 4.0)
        );
    }

    #[test]
    fn incomplete_group_is_flagged_not_dropped() {
        let s0 = TrialSet::new(0, vec![row(0, 0.1, (8, 8, 2, 2), 1.0), row(0, 0.2, (6, 6, 4, 4), 1.0)]);
        let s1 = TrialSet::new(1, vec![row(1, 0.1, (6, 6, 2, 2), 1.0)]);
        let agg = aggregate(&sets(vec![s0, s1]));

        assert_eq!(agg.rows.len(), 2);
        assert_eq!(agg.rows[1].members, 1);
        assert_eq!(agg.rows[1].true_positive, 6.0);
        assert_eq!(
            agg.anomalies,
            vec![Anomaly::IncompleteGroup {
                epsilon: 0.2,
                members: 1,
                expected: 2,
            }]
        );
    }

    #[test]
    fn nearly_equal_epsilons_are_not_merged() {
        let accumulated = 0.1 + 0.2;
        let s0 = TrialSet::new(0, vec![row(0, 0.3, (1, 1, 1, 1), 1.0)]);
        let s1 = TrialSet::new(1, vec![row(1, accumulated, (1, 1, 1, 1), 1.0)]);
        let agg = aggregate(&sets(vec![s0, s1]));

        assert_ne!(0.3f64.to_bits(), accumulated.to_bits());
        assert_eq!(agg.rows.len(), 2);
        assert_eq!(agg.anomalies.len(), 2);
    }

    #[test]
    fn repeated_rows_do_not_stand_in_for_a_missing_seed() {
        let s0 = TrialSet::new(
            0,
            vec![
                row(0, 0.1, (8, 8, 2, 2), 1.0),
                row(0, 0.2, (6, 6, 4, 4), 1.0),
                row(0, 0.2, (100, 6, 4, 4), 1.0),
            ],
        );
        let s1 = TrialSet::new(1, vec![row(1, 0.1, (6, 6, 2, 2), 1.0)]);
        let agg = aggregate(&sets(vec![s0, s1]));

        assert_eq!(agg.rows.len(), 2);
        assert_eq!(agg.rows[1].members, 2);
        assert!(!agg.is_complete());
        assert_eq!(
            agg.anomalies,
            vec![
                Anomaly::IncompleteGroup {
                    epsilon: 0.2,
                    members: 1,
                    expected: 2,
                },
                Anomaly::DuplicateRows {
                    epsilon: 0.2,
                    rows: 2,
                    seeds: 1,
                },
            ]
        );
    }

    #[test]
    fn duplicate_row_in_a_full_group_is_flagged() {
        let s0 = TrialSet::new(0, vec![row(0, 0.1, (8, 8, 2, 2), 1.0), row(0, 0.1, (8, 8, 2, 2), 1.0)]);
        let s1 = TrialSet::new(1, vec![row(1, 0.1, (6, 6, 2, 2), 1.0)]);
        let agg = aggregate(&sets(vec![s0, s1]));

        assert_eq!(
            agg.anomalies,
            vec![Anomaly::DuplicateRows {
                epsilon: 0.1,
                rows: 3,
                seeds: 2,
            }]
        );
    }

    #[test]
    fn empty_input() {
        let agg = aggregate(&BTreeMap::new());
        assert!(agg.rows.is_empty());
        assert!(agg.is_complete());
    }
}
