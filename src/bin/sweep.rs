//! Runs the algorithm for every seed over the epsilon sweep, then writes the
//! aggregated report and its plots.
//!
//! ```ignore
//! RUST_LOG=debug sweep --setting Setting.toml --jobs 4
//! ```

extern crate chrono;
extern crate env_logger;
extern crate epsilon_sweep;
#[macro_use]
extern crate log;
extern crate structopt;

use env_logger::Env;
use epsilon_sweep::{pipeline, Setting};
use std::io::Write;
use std::path::PathBuf;
use std::process;
use structopt::StructOpt;

#[derive(StructOpt, Debug)]
#[structopt(name = "sweep")]
#[structopt(about = "Sweep seeds and epsilon, aggregate, and plot the results.")]
struct Opt {
    /// The TOML setting describing the sweep.
    #[structopt(short = "s", long = "setting", default_value = "Setting.toml", parse(from_os_str))]
    setting: PathBuf,

    /// Reuse per-seed captures left by an earlier run.
    #[structopt(long = "resume")]
    resume: bool,

    /// Number of concurrent invocations.
    #[structopt(short = "j", long = "jobs")]
    jobs: Option<usize>,

    /// Do not render plots.
    #[structopt(long = "no-plot")]
    no_plot: bool,

    /// Only re-render the plots of an existing final report.
    #[structopt(long = "report-only")]
    report_only: bool,
}

fn init_logger() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let t = chrono::Local::now();
            writeln!(
                buf,
                "{} {}:{}: {}",
                t.format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.module_path().unwrap_or(""),
                record.args()
            )
        })
        .init();
}

fn load(opt: &Opt) -> epsilon_sweep::Result<Setting> {
    let mut setting = Setting::init(&opt.setting)?;
    if opt.resume {
        setting.run.resume = true;
    }
    if let Some(jobs) = opt.jobs {
        setting.run.jobs = jobs;
    }
    if opt.no_plot {
        setting.plot.render = false;
    }
    setting.validate()?;
    Ok(setting)
}

fn run(opt: &Opt) -> epsilon_sweep::Result<()> {
    let setting = load(opt)?;
    debug!("{:?}", setting);

    if opt.report_only {
        for image in pipeline::replot(&setting)? {
            println!("{}", image.display());
        }
        return Ok(());
    }

    let summary = pipeline::run(&setting)?;
    for anomaly in &summary.anomalies {
        warn!("{}", anomaly);
    }
    info!(
        "{} seeds, {} epsilon values, {} incomplete",
        summary.seeds,
        summary.rows.len(),
        summary.anomalies.len()
    );
    println!("{}", summary.files.table.display());
    for image in &summary.files.images {
        println!("{}", image.display());
    }
    Ok(())
}

fn main() {
    init_logger();
    let opt = Opt::from_args();

    if let Err(ref e) = run(&opt) {
        error!("{}", e);
        for cause in e.iter().skip(1) {
            error!("caused by: {}", cause);
        }
        if let Some(seed) = e.seed() {
            error!("failed seed: {}; earlier captures are kept", seed);
        }
        process::exit(1);
    }
}
