//! # debench - Desktop Environment Benchmark Reporting
//!
//! Turns the raw per-sample metrics recorded during a desktop environment
//! benchmark run into a Markdown report and cross-run comparison charts.
//!
//! ## Architecture
//!
//! The library is a small pipeline, leaf first:
//!
//! - `metrics`: parses `raw_metrics.csv` into named phases
//! - `aggregate`: mean/peak statistics and the battery/AC buckets
//! - `report`: renders one run as a Markdown document
//! - `chart`: renders several runs as PNG bar charts
//! - `discovery`: finds the most recent result directories
//! - `workload`: synthetic CPU load used while a run is being recorded
//!
//! ## Example
//!
//! ```no_run
//! use debench::{parse_metrics_file, PowerBuckets, Metric, Schema};
//!
//! let parsed = parse_metrics_file("raw_metrics.csv", Schema::Core)?;
//! let buckets = PowerBuckets::from_phases(&parsed.phases);
//! println!("Battery average: {:.2}W", buckets.battery.mean(Metric::Power));
//! # Ok::<(), debench::BenchError>(())
//! ```

use std::path::PathBuf;
use thiserror::Error;

pub mod aggregate;
pub mod chart;
pub mod discovery;
pub mod metrics;
pub mod report;
pub mod system_info;
pub mod workload;

pub use aggregate::{classify_phase, mean, peak, summarize_run, PowerBuckets, PowerMode, RunSummary};
pub use chart::{collect_run_summaries, ChartRenderer, ComparisonSet};
pub use discovery::{find_latest_results, RunDir};
pub use metrics::{parse_metrics_file, parse_metrics_reader, Metric, MetricSeries, ParseOutcome, PhaseSet, Schema};
pub use report::{render_report, write_report, ReportInput};
pub use system_info::SystemInfo;
pub use workload::{MatrixWorkload, PrimeWorkload, Workload};

/// Raw metrics file written by the benchmark runner in each result directory
pub const RAW_METRICS_FILE: &str = "raw_metrics.csv";

/// Free-text system description written next to the raw metrics
pub const SYSTEM_INFO_FILE: &str = "system_info.txt";

/// Composite chart whose presence enables the report's graph section
pub const DASHBOARD_FILE: &str = "dashboard.png";

/// Comprehensive error type for all reporting operations
#[derive(Error, Debug)]
pub enum BenchError {
    /// IO errors (file access, directory creation, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV reader errors that affect the whole file (not individual rows)
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A required input file or directory does not exist
    #[error("Missing input: {}", resource.display())]
    MissingInput { resource: PathBuf },

    /// Run discovery found nothing to compare
    #[error("No results found in {}", base.display())]
    NoResults { base: PathBuf },

    /// Chart backend failures
    #[error("Chart rendering failed: {message}")]
    Chart { message: String },
}
