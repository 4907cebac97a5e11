//! Evaluation harness for the sliding-window classifier benchmark.
//!
//! The harness runs the external algorithm once per seed over a sweep of
//! epsilon values, averages the per-seed measurements for each epsilon,
//! derives precision/recall/F1 and time-per-event, and writes the final
//! report and its two summary plots.
//!
//! ```text
//! TrialRunner => TrialSet (per seed) => aggregate => derive => report + plot
//! ```
#![recursion_limit = "1024"]
#![deny(missing_docs)]

extern crate average;
#[macro_use]
extern crate error_chain;
extern crate csv;
extern crate itertools;
#[macro_use]
extern crate log;
extern crate plotters;
extern crate rayon;
extern crate serde;
#[macro_use]
extern crate serde_derive;
extern crate toml;

#[cfg(test)]
#[macro_use]
extern crate proptest;

pub mod errors;
pub use errors::{Error, ErrorKind, Result, ResultExt};

mod epsilon;
pub use epsilon::{EpsilonRange, MAX_STEPS};

mod setting;
pub use setting::{AlgorithmSetting, OutputSetting, PlotSetting, RunSetting, Setting, SweepSetting};

mod trial;
pub use trial::{TrialRow, TrialSet, TRIAL_COLUMNS};

pub mod runner;
pub use runner::{Algorithm, ExternalAlgorithm, Invocation, Sweep, TrialRunner};

mod aggregate;
pub use aggregate::{aggregate, AggregatedRow, Aggregation, Anomaly};

mod metrics;
pub use metrics::{derive, f1, harmonic_mean, precision, ratio, recall, EnrichedRow};

pub mod report;
mod plot;
pub use plot::{PlotSpec, Series};

pub mod pipeline;
pub use pipeline::{Layout, Summary};
