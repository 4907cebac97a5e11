//! The sweep setting in TOML. Loaded once at startup and read-only after.

use epsilon::EpsilonRange;
use errors::*;
use std::fs::File;
use std::io::Read;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::time::Duration;
use toml;

/// The complete harness setting.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Setting {
    /// Seeds and epsilon sweep.
    #[serde(default)]
    pub sweep: SweepSetting,

    /// The external algorithm.
    pub algorithm: AlgorithmSetting,

    /// Output directory layout.
    #[serde(default)]
    pub output: OutputSetting,

    /// Plot appearance.
    #[serde(default)]
    pub plot: PlotSetting,

    /// Execution options.
    #[serde(default)]
    pub run: RunSetting,
}

/// Seed range and epsilon sweep.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SweepSetting {
    /// First seed (inclusive).
    pub seed_min: u64,
    /// Last seed (inclusive).
    pub seed_max: u64,
    /// Smallest epsilon.
    pub epsilon_min: f64,
    /// Largest epsilon.
    pub epsilon_max: f64,
    /// Epsilon step.
    pub epsilon_step: f64,
}

impl Default for SweepSetting {
    fn default() -> Self {
        SweepSetting {
            seed_min: 0,
            seed_max: 9,
            epsilon_min: 0.01,
            epsilon_max: 1.0,
            epsilon_step: 0.01,
        }
    }
}

/// How to invoke the algorithm.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct AlgorithmSetting {
    /// Path to the algorithm executable.
    pub executable: PathBuf,

    /// Path to the algorithm's parameter file. Its stem names the outputs.
    pub param_file: PathBuf,

    /// Algorithm selector (`-a`).
    #[serde(default = "default_mode")]
    pub mode: u32,

    /// Whether to pass the sliding-window flag (`-c`).
    #[serde(default = "default_true")]
    pub sliding_window: bool,

    /// Kill an invocation that runs longer than this many seconds.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// Directory layout under `results_dir`.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct OutputSetting {
    /// Root of all results.
    pub results_dir: PathBuf,
    /// Per-seed captures, under `results_dir/temp_dir/<config>`.
    pub temp_dir: String,
    /// Final reports, under `results_dir/final_dir`.
    pub final_dir: String,
    /// Plots, under `results_dir/images_dir/<config>`.
    pub images_dir: String,
}

impl Default for OutputSetting {
    fn default() -> Self {
        OutputSetting {
            results_dir: PathBuf::from("Results"),
            temp_dir: "temp".to_string(),
            final_dir: "final".to_string(),
            images_dir: "images".to_string(),
        }
    }
}

/// Plot appearance.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PlotSetting {
    /// Font size of labels and legend.
    pub font_size: u32,
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Whether to render plots at all.
    pub render: bool,
}

impl Default for PlotSetting {
    fn default() -> Self {
        PlotSetting {
            font_size: 20,
            width: 1024,
            height: 768,
            render: true,
        }
    }
}

/// Execution options.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct RunSetting {
    /// Number of concurrent invocations. 1 is strictly serial.
    pub jobs: usize,
    /// Reuse per-seed captures that already exist and parse.
    pub resume: bool,
}

impl Default for RunSetting {
    fn default() -> Self {
        RunSetting {
            jobs: 1,
            resume: false,
        }
    }
}

fn default_mode() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

impl Setting {
    /// Initialize from a file.
    pub fn init<P: AsRef<Path>>(path: P) -> Result<Setting> {
        let path = path.as_ref();
        let mut file = File::open(path)
            .chain_err(|| format!("failed to open setting {}", path.display()))?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        let setting = Setting::from_toml(&contents)
            .chain_err(|| format!("failed to load setting {}", path.display()))?;
        Ok(setting)
    }

    /// Parses and validates a setting from TOML text.
    pub fn from_toml(contents: &str) -> Result<Setting> {
        let setting: Setting = toml::from_str(contents)?;
        setting.validate()?;
        Ok(setting)
    }

    /// Checks cross-field constraints.
    pub fn validate(&self) -> Result<()> {
        if self.sweep.seed_min > self.sweep.seed_max {
            bail!(ErrorKind::Setting(format!(
                "seed range {}..={} is empty",
                self.sweep.seed_min,
                self.sweep.seed_max
            )));
        }
        if self.run.jobs == 0 {
            bail!(ErrorKind::Setting("jobs must be at least 1".to_string()));
        }
        if self.config_name().is_none() {
            bail!(ErrorKind::Setting(format!(
                "cannot derive a configuration name from {}",
                self.algorithm.param_file.display()
            )));
        }
        self.epsilon()?;
        Ok(())
    }

    /// The seeds to sweep.
    pub fn seeds(&self) -> RangeInclusive<u64> {
        self.sweep.seed_min..=self.sweep.seed_max
    }

    /// The epsilon sweep.
    pub fn epsilon(&self) -> Result<EpsilonRange> {
        EpsilonRange::new(
            self.sweep.epsilon_min,
            self.sweep.epsilon_max,
            self.sweep.epsilon_step,
        )
    }

    /// Name used for every output, i.e., the parameter file's stem.
    pub fn config_name(&self) -> Option<String> {
        self.algorithm
            .param_file
            .file_stem()
            .and_then(|s| s.to_str())
            .map(|s| s.to_string())
    }

    /// Per-invocation timeout.
    pub fn timeout(&self) -> Option<Duration> {
        self.algorithm.timeout_secs.map(Duration::from_secs)
    }
}
