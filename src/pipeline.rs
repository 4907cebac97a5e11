//! Sweep → aggregate → derive → report, driven by one `Setting`.

use aggregate::{self, Anomaly};
use errors::*;
use metrics::{self, EnrichedRow};
use plot::PlotSpec;
use report::{self, ReportFiles};
use runner::{Algorithm, ExternalAlgorithm, Sweep, TrialRunner};
use setting::Setting;
use std::fs;
use std::path::PathBuf;

/// Where a configuration's outputs go.
///
/// ```text
/// <results>/<temp>/<config>/<seed>.csv
/// <results>/<final>/<config>.csv
/// <results>/<images>/<config>/<config>_F1_score.png
/// <results>/<images>/<config>/<config>_iter_time.png
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    /// Configuration name, the parameter file's stem.
    pub config_name: String,
    /// Per-seed captures.
    pub temp_dir: PathBuf,
    /// The final report file.
    pub report_file: PathBuf,
    /// Plot directory.
    pub images_dir: PathBuf,
}

impl Layout {
    /// Derives the layout from a setting.
    pub fn new(setting: &Setting) -> Result<Layout> {
        let name = setting.config_name().ok_or_else(|| {
            Error::from(ErrorKind::Setting(format!(
                "cannot derive a configuration name from {}",
                setting.algorithm.param_file.display()
            )))
        })?;
        let out = &setting.output;
        let root = &out.results_dir;
        Ok(Layout {
            temp_dir: root.join(&out.temp_dir).join(&name),
            report_file: root.join(&out.final_dir).join(format!("{}.csv", name)),
            images_dir: root.join(&out.images_dir).join(&name),
            config_name: name,
        })
    }

    /// Creates every output directory.
    pub fn create(&self) -> Result<()> {
        let mut dirs = vec![self.temp_dir.as_path(), self.images_dir.as_path()];
        dirs.extend(self.report_file.parent());
        for dir in dirs {
            fs::create_dir_all(dir).chain_err(|| format!("failed to create {}", dir.display()))?;
        }
        Ok(())
    }
}

/// What a pipeline run produced.
#[derive(Debug, Clone)]
pub struct Summary {
    /// Number of seeds swept.
    pub seeds: usize,
    /// The derived rows, ascending by epsilon.
    pub rows: Vec<EnrichedRow>,
    /// Aggregation anomalies (incomplete epsilon groups).
    pub anomalies: Vec<Anomaly>,
    /// Written files.
    pub files: ReportFiles,
}

/// Plot appearance from the setting.
pub fn plot_spec(setting: &Setting, layout: &Layout) -> PlotSpec {
    let mut spec = PlotSpec::new(layout.config_name.as_str());
    spec.render = setting.plot.render;
    spec.font_size = setting.plot.font_size;
    spec.size = (setting.plot.width, setting.plot.height);
    spec
}

/// Runs the whole pipeline with the external executable from the setting.
pub fn run(setting: &Setting) -> Result<Summary> {
    let algorithm = ExternalAlgorithm::new(setting.algorithm.executable.clone(), setting.timeout());
    run_with(setting, &algorithm)
}

/// Runs the whole pipeline with `algorithm`.
///
/// Invocation and schema errors stop the run before aggregation; captures
/// written so far stay on disk. Anomalies and undefined metrics do not stop
/// it.
pub fn run_with<A: Algorithm>(setting: &Setting, algorithm: &A) -> Result<Summary> {
    setting.validate()?;
    let layout = Layout::new(setting)?;
    layout.create()?;

    let sweep = Sweep {
        seeds: setting.seeds(),
        epsilon: setting.epsilon()?,
        param_file: setting.algorithm.param_file.clone(),
        mode: setting.algorithm.mode,
        sliding_window: setting.algorithm.sliding_window,
    };

    let sets = TrialRunner::new(algorithm, layout.temp_dir.clone())
        .jobs(setting.run.jobs)
        .resume(setting.run.resume)
        .run_sweep(&sweep)?;

    let aggregation = aggregate::aggregate(&sets);
    if !aggregation.is_complete() {
        warn!(
            "{} of {} epsilon groups are incomplete",
            aggregation.anomalies.len(),
            aggregation.rows.len()
        );
    }

    let rows = metrics::derive(&aggregation.rows);
    let spec = plot_spec(setting, &layout);
    let files = report::write(&rows, &layout.report_file, &layout.images_dir, &spec)
        .chain_err(|| "failed to write report")?;

    Ok(Summary {
        seeds: sets.len(),
        rows: rows,
        anomalies: aggregation.anomalies,
        files: files,
    })
}

/// Re-renders the plots from an existing final report without invoking the
/// algorithm.
pub fn replot(setting: &Setting) -> Result<Vec<PathBuf>> {
    let layout = Layout::new(setting)?;
    let rows = report::read(&layout.report_file)?;
    info!("read {} rows from {}", rows.len(), layout.report_file.display());
    let mut spec = plot_spec(setting, &layout);
    spec.render = true;
    report::render(&rows, &layout.images_dir, &spec)
}
