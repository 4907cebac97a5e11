//! Runs the algorithm once per seed over the whole epsilon sweep.
//!
//! Every invocation writes its standard output straight into
//! `<temp_dir>/<seed>.csv`, so whatever finished before a crash stays on disk.
//! A seed is handed to the next stage only after its process has exited and
//! the capture has been parsed.

use epsilon::EpsilonRange;
use errors::*;
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs::{self, File};
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use trial::TrialSet;

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// What is being swept: seeds, epsilon range, and the parameter file.
#[derive(Debug, Clone)]
pub struct Sweep {
    /// Inclusive seed range.
    pub seeds: RangeInclusive<u64>,
    /// Epsilon range passed to every invocation.
    pub epsilon: EpsilonRange,
    /// Parameter file passed to every invocation.
    pub param_file: PathBuf,
    /// Algorithm selector.
    pub mode: u32,
    /// Whether the sliding-window flag is passed.
    pub sliding_window: bool,
}

impl Sweep {
    /// Number of seeds in the sweep.
    pub fn seed_count(&self) -> usize {
        let (lo, hi) = (*self.seeds.start(), *self.seeds.end());
        if lo > hi {
            0
        } else {
            (hi - lo) as usize + 1
        }
    }

    /// The invocation for one seed.
    pub fn invocation(&self, seed: u64) -> Invocation {
        Invocation {
            param_file: self.param_file.clone(),
            mode: self.mode,
            sliding_window: self.sliding_window,
            seed: seed,
            epsilon: self.epsilon,
        }
    }
}

/// Typed arguments of one algorithm run.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    /// `--param_file`
    pub param_file: PathBuf,
    /// `-a`
    pub mode: u32,
    /// `-c`
    pub sliding_window: bool,
    /// `-r`
    pub seed: u64,
    /// `-e`, `-f`, `-j`
    pub epsilon: EpsilonRange,
}

impl Invocation {
    /// The command line arguments, in the order the algorithm expects.
    pub fn args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "--param_file".into(),
            self.param_file.clone().into_os_string(),
            "-a".into(),
            self.mode.to_string().into(),
        ];
        if self.sliding_window {
            args.push("-c".into());
        }
        args.push("-r".into());
        args.push(self.seed.to_string().into());
        args.push("-e".into());
        args.push(self.epsilon.min().to_string().into());
        args.push("-f".into());
        args.push(self.epsilon.max().to_string().into());
        args.push("-j".into());
        args.push(self.epsilon.step().to_string().into());
        args
    }
}

/// Something that can run one invocation and write its rows into `output`.
///
/// Implementations must return only once the output is complete, and must
/// report a failed run as `ErrorKind::Invocation`.
pub trait Algorithm: Sync {
    /// Runs `invocation`, writing the semicolon-delimited rows to `output`.
    fn invoke(&self, invocation: &Invocation, output: File) -> Result<()>;
}

/// The algorithm as an external executable.
#[derive(Debug, Clone)]
pub struct ExternalAlgorithm {
    executable: PathBuf,
    timeout: Option<Duration>,
}

impl ExternalAlgorithm {
    /// Creates a new `ExternalAlgorithm`. Without a timeout a hung process
    /// blocks the sweep.
    pub fn new<P: Into<PathBuf>>(executable: P, timeout: Option<Duration>) -> Self {
        ExternalAlgorithm {
            executable: executable.into(),
            timeout: timeout,
        }
    }
}

impl Algorithm for ExternalAlgorithm {
    fn invoke(&self, invocation: &Invocation, output: File) -> Result<()> {
        let seed = invocation.seed;
        let mut child = Command::new(&self.executable)
            .args(invocation.args())
            .stdin(Stdio::null())
            .stdout(Stdio::from(output))
            .stderr(Stdio::inherit())
            .spawn()
            .chain_err(|| {
                ErrorKind::Invocation(seed, format!("failed to spawn {}", self.executable.display()))
            })?;

        let wait_failed = move || ErrorKind::Invocation(seed, "failed to wait for the process".to_string());
        let status = match self.timeout {
            None => child.wait().chain_err(wait_failed)?,
            Some(limit) => {
                let start = Instant::now();
                loop {
                    if let Some(status) = child.try_wait().chain_err(wait_failed)? {
                        break status;
                    }
                    if start.elapsed() >= limit {
                        // Reap the child so its stdout handle is released.
                        let _ = child.kill();
                        let _ = child.wait();
                        bail!(ErrorKind::Invocation(
                            seed,
                            format!(
                                "timed out after {}.{:03}s",
                                limit.as_secs(),
                                limit.subsec_millis()
                            ),
                        ));
                    }
                    thread::sleep(POLL_INTERVAL);
                }
            }
        };

        if !status.success() {
            bail!(ErrorKind::Invocation(seed, format!("exited with {}", status)));
        }
        Ok(())
    }
}

/// Drives the algorithm over every seed of a sweep.
pub struct TrialRunner<'a, A: Algorithm + 'a> {
    algorithm: &'a A,
    temp_dir: PathBuf,
    jobs: usize,
    resume: bool,
}

impl<'a, A: Algorithm + 'a> TrialRunner<'a, A> {
    /// Creates a serial runner that captures into `temp_dir`.
    pub fn new<P: Into<PathBuf>>(algorithm: &'a A, temp_dir: P) -> Self {
        TrialRunner {
            algorithm: algorithm,
            temp_dir: temp_dir.into(),
            jobs: 1,
            resume: false,
        }
    }

    /// Runs up to `jobs` seeds concurrently.
    pub fn jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    /// Reuses captures left by an earlier run.
    pub fn resume(mut self, resume: bool) -> Self {
        self.resume = resume;
        self
    }

    /// Where the capture of `seed` goes.
    pub fn capture_path(&self, seed: u64) -> PathBuf {
        capture_path(&self.temp_dir, seed)
    }

    /// Runs every seed and returns their trial sets keyed by seed. The first
    /// failing seed aborts the sweep.
    pub fn run_sweep(&self, sweep: &Sweep) -> Result<BTreeMap<u64, TrialSet>> {
        fs::create_dir_all(&self.temp_dir)
            .chain_err(|| format!("failed to create {}", self.temp_dir.display()))?;

        info!(
            "sweeping {} seeds ({}..={}), epsilon {}, {} job(s)",
            sweep.seed_count(),
            sweep.seeds.start(),
            sweep.seeds.end(),
            sweep.epsilon,
            self.jobs
        );

        let seeds = sweep.seeds.clone().collect::<Vec<u64>>();
        let sets = if self.jobs == 1 {
            let mut sets = Vec::with_capacity(seeds.len());
            for &seed in &seeds {
                sets.push(self.run_seed(sweep, seed)?);
            }
            sets
        } else {
            let pool = ThreadPoolBuilder::new()
                .num_threads(self.jobs)
                .build()
                .map_err(|e| Error::from(format!("failed to build worker pool: {}", e)))?;
            pool.install(|| {
                seeds
                    .par_iter()
                    .map(|&seed| self.run_seed(sweep, seed))
                    .collect::<Result<Vec<TrialSet>>>()
            })?
        };

        Ok(sets.into_iter().map(|set| (set.seed(), set)).collect())
    }

    fn run_seed(&self, sweep: &Sweep, seed: u64) -> Result<TrialSet> {
        let path = self.capture_path(seed);

        if self.resume && path.exists() {
            match TrialSet::load(&path, seed) {
                Ok(set) => {
                    info!("seed {}: reusing {}", seed, path.display());
                    return Ok(set);
                }
                Err(e) => warn!("seed {}: discarding {} ({})", seed, path.display(), e),
            }
        }

        let invocation = sweep.invocation(seed);
        debug!("seed {}: {:?}", seed, invocation.args());
        let start = Instant::now();

        let output = File::create(&path)
            .chain_err(|| format!("failed to create {}", path.display()))?;
        self.algorithm.invoke(&invocation, output)?;

        let set = TrialSet::load(&path, seed)?;
        let elapsed = start.elapsed();
        info!(
            "seed {}: {} rows in {}.{:03}s",
            seed,
            set.len(),
            elapsed.as_secs(),
            elapsed.subsec_millis()
        );
        if set.len() != sweep.epsilon.len() {
            warn!(
                "seed {}: {} rows for {} epsilon steps",
                seed,
                set.len(),
                sweep.epsilon.len()
            );
        }
        Ok(set)
    }
}

/// Capture file of `seed` under `dir`.
pub fn capture_path(dir: &Path, seed: u64) -> PathBuf {
    dir.join(format!("{}.csv", seed))
}
