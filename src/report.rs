//! The final report: one semicolon-delimited line per epsilon, ascending, no
//! header. Columns, in order:
//!
//! ```text
//! epsilon; TP; TN; FP; FN; init_time; iter_time; nb_build; MTE;
//! Tprec; Trec; Fprec; Frec; TF1; FF1; TPE
//! ```
//!
//! The first nine columns are means across seeds. An undefined metric (zero
//! denominator) is an empty field.

use aggregate::AggregatedRow;
use csv;
use errors::*;
use metrics::EnrichedRow;
use plot::{self, PlotSpec, Series};
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// Column names of the report, in file order.
pub const REPORT_COLUMNS: [&str; 16] = [
    "epsilon",
    "TP",
    "TN",
    "FP",
    "FN",
    "init_time",
    "iter_time",
    "nb_build",
    "MTE",
    "Tprec",
    "Trec",
    "Fprec",
    "Frec",
    "TF1",
    "FF1",
    "TPE",
];

/// A report line. Field order is the column order.
#[derive(Serialize, Deserialize, Debug)]
struct Record {
    epsilon: f64,
    true_positive: f64,
    true_negative: f64,
    false_positive: f64,
    false_negative: f64,
    init_time: f64,
    iter_time: f64,
    nb_build: f64,
    mte: f64,
    true_precision: Option<f64>,
    true_recall: Option<f64>,
    false_precision: Option<f64>,
    false_recall: Option<f64>,
    true_f1: Option<f64>,
    false_f1: Option<f64>,
    time_per_event: Option<f64>,
}

impl<'a> From<&'a EnrichedRow> for Record {
    fn from(e: &'a EnrichedRow) -> Record {
        Record {
            epsilon: e.row.epsilon,
            true_positive: e.row.true_positive,
            true_negative: e.row.true_negative,
            false_positive: e.row.false_positive,
            false_negative: e.row.false_negative,
            init_time: e.row.init_time,
            iter_time: e.row.iter_time,
            nb_build: e.row.nb_build,
            mte: e.row.mte,
            true_precision: e.true_precision,
            true_recall: e.true_recall,
            false_precision: e.false_precision,
            false_recall: e.false_recall,
            true_f1: e.true_f1,
            false_f1: e.false_f1,
            time_per_event: e.time_per_event,
        }
    }
}

impl From<Record> for EnrichedRow {
    fn from(r: Record) -> EnrichedRow {
        EnrichedRow {
            row: AggregatedRow {
                epsilon: r.epsilon,
                true_positive: r.true_positive,
                true_negative: r.true_negative,
                false_positive: r.false_positive,
                false_negative: r.false_negative,
                init_time: r.init_time,
                iter_time: r.iter_time,
                nb_build: r.nb_build,
                mte: r.mte,
                // not persisted
                members: 0,
            },
            true_precision: r.true_precision,
            true_recall: r.true_recall,
            false_precision: r.false_precision,
            false_recall: r.false_recall,
            true_f1: r.true_f1,
            false_f1: r.false_f1,
            time_per_event: r.time_per_event,
        }
    }
}

/// Files produced by `write`.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportFiles {
    /// The table.
    pub table: PathBuf,
    /// The images, empty when rendering is disabled.
    pub images: Vec<PathBuf>,
}

/// Writes the table to `table_path` and, if `spec.render`, both plots into
/// `image_dir`.
pub fn write(rows: &[EnrichedRow], table_path: &Path, image_dir: &Path, spec: &PlotSpec) -> Result<ReportFiles> {
    if let Some(parent) = table_path.parent() {
        fs::create_dir_all(parent)
            .chain_err(|| format!("failed to create {}", parent.display()))?;
    }
    let file = File::create(table_path)
        .chain_err(|| format!("failed to create {}", table_path.display()))?;
    write_table(rows, file)?;
    info!("wrote {} rows to {}", rows.len(), table_path.display());

    let images = if spec.render {
        render(rows, image_dir, spec)?
    } else {
        Vec::new()
    };

    Ok(ReportFiles {
        table: table_path.to_path_buf(),
        images: images,
    })
}

/// Writes the rows in report format.
pub fn write_table<W: Write>(rows: &[EnrichedRow], wtr: W) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .delimiter(b';')
        .from_writer(wtr);
    for row in rows {
        writer.serialize(Record::from(row))?;
    }
    writer.flush()?;
    Ok(())
}

/// Reads a report back. Empty fields become undefined metrics; `members` is
/// not stored and reads as 0.
pub fn read<P: AsRef<Path>>(path: P) -> Result<Vec<EnrichedRow>> {
    let path = path.as_ref();
    let file = File::open(path).chain_err(|| format!("failed to open report {}", path.display()))?;
    parse(file, &path.display().to_string())
}

/// Parses rows in report format. `origin` names the source in errors.
pub fn parse<R: Read>(rdr: R, origin: &str) -> Result<Vec<EnrichedRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .delimiter(b';')
        .flexible(true)
        .from_reader(rdr);

    let mut rows = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record?;
        let line = record.position().map_or(i as u64 + 1, |p| p.line());
        if record.len() != REPORT_COLUMNS.len() {
            bail!(ErrorKind::Schema(
                origin.to_string(),
                line,
                format!("expected {} columns, found {}", REPORT_COLUMNS.len(), record.len()),
            ));
        }
        let parsed: Record = record
            .deserialize(None)
            .map_err(|e| ErrorKind::Schema(origin.to_string(), line, e.to_string()))?;
        rows.push(parsed.into());
    }
    Ok(rows)
}

/// Renders the F1 chart (linear) and the time-per-event chart (log) into
/// `image_dir`. Returns the image paths.
pub fn render(rows: &[EnrichedRow], image_dir: &Path, spec: &PlotSpec) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(image_dir)
        .chain_err(|| format!("failed to create {}", image_dir.display()))?;

    let x_max = rows.iter()
        .map(|r| r.row.epsilon)
        .fold(0.0, f64::max);
    let x_max = if x_max > 0.0 { x_max } else { 1.0 };

    let f1 = Series::from_rows(&spec.f1_legend, rows, |r| r.true_f1);
    let f1_path = image_dir.join(spec.f1_file());
    plot::linear_chart(&f1_path, &f1, x_max, &spec.f1_y_desc, spec)?;

    let tpe = Series::from_rows(&spec.time_legend, rows, |r| r.time_per_event);
    let tpe_path = image_dir.join(spec.time_file());
    plot::log_chart(&tpe_path, &tpe, x_max, &spec.time_y_desc, spec)?;

    let skipped = rows.len() - f1.points.len();
    if skipped > 0 {
        debug!("{} rows without an F1-score left out of the plot", skipped);
    }
    info!("plotted {} and {}", f1_path.display(), tpe_path.display());
    Ok(vec![f1_path, tpe_path])
}
