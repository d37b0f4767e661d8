//! debench - Desktop Environment Benchmark Reporting
//!
//! Builds Markdown reports and comparison charts from benchmark result
//! directories, and generates synthetic CPU load while a run is recorded.

use clap::{Parser, Subcommand, ValueEnum};
use debench::chart::{ChartRenderer, ComparisonSet, TRACKED_METRICS};
use debench::discovery::DEFAULT_RESULT_COUNT;
use debench::workload::{run_until, DEFAULT_MATRIX_SIZE};
use debench::{
    collect_run_summaries, find_latest_results, write_report, BenchError, MatrixWorkload, Metric,
    PrimeWorkload, RunSummary, Workload,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
    Table,
    Csv,
    Json,
}

#[derive(Debug, Clone, ValueEnum)]
enum WorkloadKind {
    /// Two-worker trial-division prime search
    Prime,
    /// Random matrix multiply plus eigenvalue estimate
    Matrix,
}

#[derive(Parser)]
#[command(name = "debench")]
#[command(version = VERSION)]
#[command(about = "Desktop environment benchmark reports and comparison charts")]
#[command(
    long_about = "Desktop environment benchmark reports and comparison charts.\n\
Each result directory holds raw_metrics.csv and system_info.txt.\n\n\
WORKFLOW:\n\
1. Record a run (battery phases, then AC phases), using 'debench stress' as load\n\
2. debench report <dir>/raw_metrics.csv <dir>/report.md <dir>/system_info.txt\n\
3. debench compare --all to chart the latest runs side by side"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a Markdown report for one run
    Report {
        /// Raw metrics CSV
        csv: PathBuf,
        /// Output Markdown file
        output: PathBuf,
        /// System info text file (optional content, may be missing)
        system_info: PathBuf,
    },
    /// Render comparison charts across result directories
    Compare {
        /// Result directories to compare
        dirs: Vec<PathBuf>,
        /// Compare the latest runs under a base directory
        #[arg(long, num_args = 0..=1, value_name = "BASE_DIR", conflicts_with = "dirs")]
        all: Option<Option<PathBuf>>,
        /// Number of latest runs picked by --all
        #[arg(long, default_value_t = DEFAULT_RESULT_COUNT)]
        count: usize,
        /// Output directory for the charts (default: <base>/comparison)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print bucket-level averages across result directories
    Summary {
        /// Result directories to summarize
        dirs: Vec<PathBuf>,
        /// Summarize the latest runs under a base directory
        #[arg(long, num_args = 0..=1, value_name = "BASE_DIR", conflicts_with = "dirs")]
        all: Option<Option<PathBuf>>,
        /// Number of latest runs picked by --all
        #[arg(long, default_value_t = DEFAULT_RESULT_COUNT)]
        count: usize,
        /// Output format
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List the latest result directories
    List {
        /// Base directory (default: ~/Documents/Optimization/benchmark_results)
        base: Option<PathBuf>,
        /// Maximum number of directories
        #[arg(long, default_value_t = DEFAULT_RESULT_COUNT)]
        count: usize,
    },
    /// Generate synthetic CPU load until interrupted
    Stress {
        /// Workload to run
        #[arg(value_enum)]
        workload: WorkloadKind,
        /// Stop after this many seconds
        #[arg(long)]
        duration: Option<u64>,
        /// Matrix dimension for the matrix workload
        #[arg(long, default_value_t = DEFAULT_MATRIX_SIZE)]
        size: usize,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Report {
            csv,
            output,
            system_info,
        } => cmd_report(&csv, &output, &system_info),
        Commands::Compare {
            dirs,
            all,
            count,
            output,
        } => cmd_compare(dirs, all, count, output),
        Commands::Summary {
            dirs,
            all,
            count,
            format,
            output,
        } => cmd_summary(dirs, all, count, &format, output.as_deref()),
        Commands::List { base, count } => cmd_list(base, count),
        Commands::Stress {
            workload,
            duration,
            size,
        } => cmd_stress(&workload, duration, size),
    }
}

/// Default results base: ~/Documents/Optimization/benchmark_results
fn default_results_base() -> PathBuf {
    let home = std::env::var_os("HOME").map(PathBuf::from).unwrap_or_default();
    home.join("Documents")
        .join("Optimization")
        .join("benchmark_results")
}

/// Generate the Markdown report for one run
fn cmd_report(csv: &Path, output: &Path, system_info: &Path) -> Result<(), Box<dyn std::error::Error>> {
    match write_report(csv, output, system_info) {
        Ok(()) => {
            println!("📄 Report generated: {}", output.display());
            Ok(())
        }
        Err(BenchError::MissingInput { resource }) => {
            eprintln!("❌ Metrics file not found: {}", resource.display());
            process::exit(1);
        }
        Err(e) => Err(e.into()),
    }
}

/// Resolve the result directories from explicit paths or `--all`
///
/// Returns the directories plus the base used for default outputs.
fn resolve_result_dirs(
    dirs: Vec<PathBuf>,
    all: Option<Option<PathBuf>>,
    count: usize,
) -> Result<(Vec<PathBuf>, PathBuf), Box<dyn std::error::Error>> {
    match all {
        Some(base) => {
            let base = base.unwrap_or_else(default_results_base);
            let found = find_latest_results(&base, count)?;
            if found.is_empty() {
                eprintln!("❌ {}", BenchError::NoResults { base });
                process::exit(1);
            }
            println!("🔍 Found {} result directories", found.len());
            Ok((found.into_iter().map(|r| r.path).collect(), base))
        }
        None => {
            if dirs.is_empty() {
                eprintln!("❌ Usage: debench compare <results_dir1> [results_dir2] ...");
                eprintln!("       debench compare --all [benchmark_base_dir]");
                process::exit(1);
            }
            Ok((dirs, default_results_base()))
        }
    }
}

/// Render comparison charts
fn cmd_compare(
    dirs: Vec<PathBuf>,
    all: Option<Option<PathBuf>>,
    count: usize,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let (dirs, base) = resolve_result_dirs(dirs, all, count)?;
    let output_dir = output.unwrap_or_else(|| base.join("comparison"));

    let set = ComparisonSet::from_summaries(collect_run_summaries(&dirs)?);
    if set.is_empty() {
        println!("⚠️  No data to compare");
        return Ok(());
    }

    let renderer = ChartRenderer::new(&output_dir)?;
    for path in renderer.render(&set)? {
        println!("📊 Created: {}", path.display());
    }

    println!("\n✅ Comparison charts saved to: {}", output_dir.display());
    Ok(())
}

/// Print bucket-level averages
fn cmd_summary(
    dirs: Vec<PathBuf>,
    all: Option<Option<PathBuf>>,
    count: usize,
    format: &OutputFormat,
    output_file: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let (dirs, _) = resolve_result_dirs(dirs, all, count)?;
    let set = ComparisonSet::from_summaries(collect_run_summaries(&dirs)?);

    if set.is_empty() {
        eprintln!("⚠️  No data to summarize");
        return Ok(());
    }

    let output = match format {
        OutputFormat::Table => generate_table_summary(set.entries()),
        OutputFormat::Csv => generate_csv_summary(set.entries())?,
        OutputFormat::Json => serde_json::to_string_pretty(set.entries())?,
    };

    match output_file {
        Some(path) => fs::write(path, output)?,
        None => println!("{}", output),
    }

    Ok(())
}

/// Generate table format summary
fn generate_table_summary(summaries: &[RunSummary]) -> String {
    let mut output = String::new();

    output.push_str(&format!("{:<24} {:<8}", "LABEL", "SAMPLES"));
    for tracked in &TRACKED_METRICS {
        output.push_str(&format!(" {:<11}", tracked.metric.key().to_uppercase()));
    }
    output.push('\n');
    output.push_str(&"-".repeat(33 + 12 * TRACKED_METRICS.len()));
    output.push('\n');

    for summary in summaries {
        let label = if summary.label.len() > 24 {
            summary.label.chars().take(21).collect::<String>() + "..."
        } else {
            summary.label.clone()
        };

        output.push_str(&format!("{:<24} {:<8}", label, summary.samples));
        for tracked in &TRACKED_METRICS {
            output.push_str(&format!(" {:<11.2}", summary.mean(tracked.metric)));
        }
        output.push('\n');
    }

    output
}

/// Generate CSV format summary
fn generate_csv_summary(summaries: &[RunSummary]) -> Result<String, Box<dyn std::error::Error>> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    let mut header = vec!["label", "desktop", "mode", "samples"];
    header.extend(Metric::ALL.iter().map(|m| m.key()));
    writer.write_record(&header)?;

    for summary in summaries {
        let mut record = vec![
            summary.label.clone(),
            summary.desktop.clone(),
            summary.mode.to_string(),
            summary.samples.to_string(),
        ];
        record.extend(Metric::ALL.iter().map(|m| format!("{:.3}", summary.mean(*m))));
        writer.write_record(&record)?;
    }

    Ok(String::from_utf8(writer.into_inner()?)?)
}

/// List the latest result directories
fn cmd_list(base: Option<PathBuf>, count: usize) -> Result<(), Box<dyn std::error::Error>> {
    let base = base.unwrap_or_else(default_results_base);
    let found = find_latest_results(&base, count)?;

    if found.is_empty() {
        println!("⚠️  No results found in {}", base.display());
        return Ok(());
    }

    println!("📋 Latest results in {}:", base.display());
    for run in found {
        let name = run
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        println!("  📁 {:<40} {}", name, run.modified.format("%Y-%m-%d %H:%M:%S UTC"));
    }

    Ok(())
}

/// Run a synthetic workload until Ctrl+C, SIGTERM or the duration elapses
fn cmd_stress(kind: &WorkloadKind, duration: Option<u64>, size: usize) -> Result<(), Box<dyn std::error::Error>> {
    let mut workload: Box<dyn Workload> = match kind {
        WorkloadKind::Prime => Box::new(PrimeWorkload::default()),
        WorkloadKind::Matrix => Box::new(MatrixWorkload::new(size)),
    };

    // Set up signal handler for graceful shutdown
    let stop = Arc::new(AtomicBool::new(false));
    let stop_clone = stop.clone();

    ctrlc::set_handler(move || {
        eprintln!("\n⏹️  Received stop signal, finishing current cycle...");
        stop_clone.store(true, Ordering::SeqCst);
    })?;

    println!("🔥 Running {} workload", workload.name());
    match duration {
        Some(secs) => println!("⏱️  Stopping after {} seconds", secs),
        None => println!("⏹️  Press Ctrl+C to stop"),
    }

    let cycles = run_until(workload.as_mut(), &stop, duration.map(Duration::from_secs));

    println!("✅ Workload stopped after {} cycles", cycles);
    Ok(())
}
