//! Raw per-seed results as emitted by the algorithm.
//!
//! Each line of a capture is one epsilon step of one seed:
//!
//! ```ignore
//! 0;0.01;812;790;13;9;12.5;304.2;17;0.031
//! 0;0.02;809;795;16;6;12.4;287.9;15;0.029
//! ```

use csv;
use errors::*;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Column order of a capture file.
pub const TRIAL_COLUMNS: [&str; 10] = [
    "seed",
    "epsilon",
    "TP",
    "TN",
    "FP",
    "FN",
    "init_time",
    "iter_time",
    "nb_build",
    "MTE",
];

/// One measurement for a (seed, epsilon) pair. Field order matches
/// `TRIAL_COLUMNS`.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq)]
pub struct TrialRow {
    /// Random seed of the run.
    pub seed: u64,
    /// Swept parameter value.
    pub epsilon: f64,
    /// True positives.
    pub true_positive: u64,
    /// True negatives.
    pub true_negative: u64,
    /// False positives.
    pub false_positive: u64,
    /// False negatives.
    pub false_negative: u64,
    /// Initialization time (ms).
    pub init_time: f64,
    /// Processing time (ms).
    pub iter_time: f64,
    /// Number of model (re)builds.
    pub nb_build: u64,
    /// Opaque per-trial scalar reported by the algorithm.
    pub mte: f64,
}

impl TrialRow {
    /// Total number of classified windows.
    pub fn total(&self) -> u64 {
        self.true_positive + self.true_negative + self.false_positive + self.false_negative
    }

    fn check(&self, seed: u64) -> ::std::result::Result<(), String> {
        if self.seed != seed {
            return Err(format!("expected seed {}, found {}", seed, self.seed));
        }
        if !(self.epsilon > 0.0 && self.epsilon <= 1.0) {
            return Err(format!("epsilon {} outside (0, 1]", self.epsilon));
        }
        for &(name, value) in &[("init_time", self.init_time), ("iter_time", self.iter_time)] {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("{} must be a non-negative number, found {}", name, value));
            }
        }
        Ok(())
    }
}

/// All rows of one seed's sweep, in emitted (increasing epsilon) order.
#[derive(Clone, Debug, PartialEq)]
pub struct TrialSet {
    seed: u64,
    rows: Vec<TrialRow>,
}

impl TrialSet {
    /// Creates a `TrialSet` from rows already known to belong to `seed`.
    pub fn new(seed: u64, rows: Vec<TrialRow>) -> Self {
        TrialSet {
            seed: seed,
            rows: rows,
        }
    }

    /// The seed that produced this set.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// The rows, one per epsilon step.
    pub fn rows(&self) -> &[TrialRow] {
        &self.rows
    }

    /// Number of epsilon steps.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Loads the capture file of `seed`.
    pub fn load<P: AsRef<Path>>(path: P, seed: u64) -> Result<TrialSet> {
        let path = path.as_ref();
        let file = File::open(path)
            .chain_err(|| format!("failed to open capture {}", path.display()))?;
        TrialSet::parse(file, seed, &path.display().to_string())
    }

    /// Parses a capture. `origin` names the source in errors.
    ///
    /// Rows are never coerced: a wrong column count, an unparsable field, a
    /// value outside its domain or an epsilon that does not strictly increase
    /// is a `Schema` error. An empty capture is an
    /// `Invocation` error, since it means the algorithm produced nothing.
    pub fn parse<R: Read>(rdr: R, seed: u64, origin: &str) -> Result<TrialSet> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .delimiter(b';')
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(rdr);

        let mut rows: Vec<TrialRow> = Vec::new();
        for (i, record) in reader.records().enumerate() {
            let fallback_line = i as u64 + 1;
            let record = record.map_err(|e| {
                let line = e.position().map_or(fallback_line, |p| p.line());
                Error::with_chain(e, ErrorKind::Schema(origin.to_string(), line, "unreadable record".to_string()))
            })?;
            let line = record.position().map_or(fallback_line, |p| p.line());

            if record.len() != TRIAL_COLUMNS.len() {
                bail!(ErrorKind::Schema(
                    origin.to_string(),
                    line,
                    format!("expected {} columns, found {}", TRIAL_COLUMNS.len(), record.len()),
                ));
            }

            let row: TrialRow = record.deserialize(None).map_err(|e| {
                ErrorKind::Schema(origin.to_string(), line, e.to_string())
            })?;
            row.check(seed)
                .map_err(|reason| ErrorKind::Schema(origin.to_string(), line, reason))?;
            if let Some(prev) = rows.last().map(|r| r.epsilon) {
                if row.epsilon == prev {
                    bail!(ErrorKind::Schema(
                        origin.to_string(),
                        line,
                        format!("epsilon {} repeated", row.epsilon),
                    ));
                }
                if row.epsilon < prev {
                    bail!(ErrorKind::Schema(
                        origin.to_string(),
                        line,
                        format!("epsilon {} follows {}", row.epsilon, prev),
                    ));
                }
            }
            trace!("{}:{} {:?}", origin, line, row);
            rows.push(row);
        }

        if rows.is_empty() {
            bail!(ErrorKind::Invocation(seed, format!("no parsable output in {}", origin)));
        }

        Ok(TrialSet::new(seed, rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema_reason(result: Result<TrialSet>) -> (u64, String) {
        match result {
            Err(Error(ErrorKind::Schema(_, line, reason), _)) => (line, reason),
            other => panic!("expected a schema violation, got {:?}", other),
        }
    }

    #[test]
    fn parses_capture() {
        let capture = "
3;0.1;8;8;2;2;1.5;20.0;4;0.25
3; 0.2 ;6;6;4;4;1.5;18.0;3;0.5";
        let set = TrialSet::parse(capture.as_bytes(), 3, "mem").unwrap();
        assert_eq!(set.seed(), 3);
        assert_eq!(set.len(), 2);

        let first = set.rows()[0];
        assert_eq!(first.epsilon, 0.1);
        assert_eq!(first.true_positive, 8);
        assert_eq!(first.false_negative, 2);
        assert_eq!(first.iter_time, 20.0);
        assert_eq!(first.nb_build, 4);
        assert_eq!(first.mte, 0.25);
        assert_eq!(first.total(), 20);
        assert_eq!(set.rows()[1].epsilon, 0.2);
    }

    #[test]
    fn empty_capture_is_an_invocation_failure() {
        match TrialSet::parse("".as_bytes(), 7, "mem") {
            Err(Error(ErrorKind::Invocation(seed, _), _)) => assert_eq!(seed, 7),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn wrong_column_count() {
        let capture = "0;0.1;8;8;2;2;1.5;20.0;4;0.25\n0;0.2;6;6;4;4;1.5;18.0;3";
        let (line, reason) = schema_reason(TrialSet::parse(capture.as_bytes(), 0, "mem"));
        assert_eq!(line, 2);
        assert!(reason.contains("expected 10 columns"));
    }

    #[test]
    fn unparsable_field() {
        let capture = "0;0.1;eight;8;2;2;1.5;20.0;4;0.25";
        schema_reason(TrialSet::parse(capture.as_bytes(), 0, "mem"));
    }

    #[test]
    fn negative_count_is_rejected() {
        let capture = "0;0.1;-8;8;2;2;1.5;20.0;4;0.25";
        schema_reason(TrialSet::parse(capture.as_bytes(), 0, "mem"));
    }

    #[test]
    fn seed_mismatch() {
        let capture = "1;0.1;8;8;2;2;1.5;20.0;4;0.25";
        let (_, reason) = schema_reason(TrialSet::parse(capture.as_bytes(), 0, "mem"));
        assert!(reason.contains("expected seed 0"));
    }

    #[test]
    fn epsilon_out_of_range() {
        let capture = "0;1.5;8;8;2;2;1.5;20.0;4;0.25";
        schema_reason(TrialSet::parse(capture.as_bytes(), 0, "mem"));
    }

    #[test]
    fn negative_time() {
        let capture = "0;0.5;8;8;2;2;1.5;-20.0;4;0.25";
        let (_, reason) = schema_reason(TrialSet::parse(capture.as_bytes(), 0, "mem"));
        assert!(reason.contains("iter_time"));
    }

    #[test]
    fn repeated_epsilon_is_rejected() {
        let capture = "0;0.1;8;8;2;2;1.5;20.0;4;0.25\n0;0.2;6;6;4;4;1.5;18.0;3;0.5\n0;0.2;100;6;4;4;1.5;18.0;3;0.5";
        let (line, reason) = schema_reason(TrialSet::parse(capture.as_bytes(), 0, "mem"));
        assert_eq!(line, 3);
        assert!(reason.contains("repeated"));
    }

    #[test]
    fn decreasing_epsilon_is_rejected() {
        let capture = "0;0.2;8;8;2;2;1.5;20.0;4;0.25\n0;0.1;6;6;4;4;1.5;18.0;3;0.5";
        let (line, reason) = schema_reason(TrialSet::parse(capture.as_bytes(), 0, "mem"));
        assert_eq!(line, 2);
        assert!(reason.contains("follows"));
    }
}
