//! Markdown report for a single benchmark run
//!
//! Rendering is total: any phase set, including an empty one, yields a
//! complete document with placeholders in place of missing data.

use crate::aggregate::{PowerBuckets, PowerMode};
use crate::metrics::{parse_metrics_file, Metric, MetricSeries, PhaseSet, Schema};
use crate::system_info::SystemInfo;
use crate::{BenchError, DASHBOARD_FILE, RAW_METRICS_FILE};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

/// Canonical battery phases, in table order
pub const BATTERY_PHASES: [&str; 4] = ["light_bat", "medium_bat", "heavy_bat", "ultra_bat"];

/// Canonical AC phases, in table order
pub const AC_PHASES: [&str; 4] = ["light_ac", "medium_ac", "heavy_ac", "ultra_ac"];

const NOT_AVAILABLE: &str = "N/A";

const PHASE_TABLE_HEADER: &str = "| Phase | Avg Power (W) | Peak Power (W) | Avg CPU (%) | Avg Temp (°C) | Avg Mem (%) |\n\
|-------|--------------|----------------|-------------|---------------|-------------|\n";

const SUMMARY_TABLE_HEADER: &str = "| Metric | Battery | AC |\n|--------|---------|-----|\n";

/// Everything the renderer needs for one document
#[derive(Debug, Clone, Copy)]
pub struct ReportInput<'a> {
    pub phases: &'a PhaseSet,
    pub system_info: &'a SystemInfo,
    /// Whether `dashboard.png` sits next to the output file
    pub has_dashboard: bool,
}

/// Human-readable name of a canonical phase
pub fn phase_display_name(phase: &str) -> &str {
    match phase {
        "light_bat" => "Light (Battery)",
        "medium_bat" => "Medium-Heavy (Battery)",
        "heavy_bat" => "Heavy (Battery)",
        "ultra_bat" => "Ultra-Heavy (Battery)",
        "light_ac" => "Light (AC)",
        "medium_ac" => "Medium-Heavy (AC)",
        "heavy_ac" => "Heavy (AC)",
        "ultra_ac" => "Ultra-Heavy (AC)",
        other => other,
    }
}

/// Summary cell: formatted mean/peak, or `N/A` for an empty series
#[derive(Debug, Clone, Copy)]
enum Stat {
    Mean,
    Peak,
}

fn summary_cell(series: &MetricSeries, metric: Metric, stat: Stat, precision: usize) -> String {
    if series.series(metric).is_empty() {
        return NOT_AVAILABLE.to_string();
    }
    let value = match stat {
        Stat::Mean => series.mean(metric),
        Stat::Peak => series.peak(metric),
    };
    format!("{:.*}", precision, value)
}

/// Render the full Markdown document
pub fn render_report(input: &ReportInput<'_>) -> String {
    let buckets = PowerBuckets::from_phases(input.phases);
    let mut report = String::new();

    report.push_str("# Desktop Environment Benchmark Report\n\n");
    report.push_str("## System Information\n\n");
    let _ = writeln!(report, "```\n{}\n```\n", input.system_info.display_text());
    report.push_str("---\n\n");
    report.push_str("## Summary by Phase\n\n");

    report.push_str("### Battery Phases\n");
    push_phase_table(
        &mut report,
        input.phases,
        &buckets,
        PowerMode::Battery,
        "*(No battery phases recorded)*",
    );

    report.push_str("\n### AC Phases\n");
    push_phase_table(
        &mut report,
        input.phases,
        &buckets,
        PowerMode::Ac,
        "*(Skipped - validation mode)*",
    );

    report.push_str("\n---\n\n## Overall Summary\n\n");
    report.push_str(SUMMARY_TABLE_HEADER);
    let overall = [
        ("Avg Power (W)", Metric::Power, Stat::Mean, 2),
        ("Peak Power (W)", Metric::Power, Stat::Peak, 2),
        ("Avg CPU (%)", Metric::Cpu, Stat::Mean, 1),
        ("Avg Temp (°C)", Metric::Temp, Stat::Mean, 1),
        ("Avg Memory (%)", Metric::Mem, Stat::Mean, 1),
        ("Avg Load (1m)", Metric::Load, Stat::Mean, 2),
    ];
    push_summary_rows(&mut report, &buckets, &overall);

    report.push_str("\n---\n\n## I/O Summary\n\n");
    report.push_str(SUMMARY_TABLE_HEADER);
    let io = [
        ("Avg Disk Read (MB/s)", Metric::DiskRead, Stat::Mean, 2),
        ("Avg Disk Write (MB/s)", Metric::DiskWrite, Stat::Mean, 2),
        ("Avg Net RX (KB/s)", Metric::NetRx, Stat::Mean, 2),
        ("Avg Net TX (KB/s)", Metric::NetTx, Stat::Mean, 2),
    ];
    push_summary_rows(&mut report, &buckets, &io);

    report.push_str("\n---\n\n## Raw Data\n\n");
    let _ = writeln!(report, "Full metrics available in: `{}`", RAW_METRICS_FILE);

    if input.has_dashboard {
        report.push_str(
            "\n---\n\n## Comparison Graphs\n\n\
             ### Dashboard Overview\n\
             ![Dashboard](dashboard.png)\n\n\
             ### Individual Metrics\n\
             | Power | CPU | Memory |\n\
             |-------|-----|--------|\n\
             | ![Power](power_comparison.png) | ![CPU](cpu_comparison.png) | ![Memory](mem_comparison.png) |\n",
        );
    }

    report
}

fn push_phase_table(
    report: &mut String,
    phases: &PhaseSet,
    buckets: &PowerBuckets,
    mode: PowerMode,
    placeholder: &str,
) {
    report.push_str(PHASE_TABLE_HEADER);

    let canonical: &[&str] = match mode {
        PowerMode::Battery => &BATTERY_PHASES,
        PowerMode::Ac => &AC_PHASES,
    };

    for phase in canonical {
        if let Some(data) = phases.get(phase) {
            let _ = writeln!(
                report,
                "| {} | {:.2} | {:.2} | {:.1} | {:.1} | {:.1} |",
                phase_display_name(phase),
                data.mean(Metric::Power),
                data.peak(Metric::Power),
                data.mean(Metric::Cpu),
                data.mean(Metric::Temp),
                data.mean(Metric::Mem),
            );
        }
    }

    if buckets.phase_names(mode).is_empty() {
        let _ = writeln!(report, "| {} | - | - | - | - | - |", placeholder);
    }
}

fn push_summary_rows(report: &mut String, buckets: &PowerBuckets, rows: &[(&str, Metric, Stat, usize)]) {
    for &(name, metric, stat, precision) in rows {
        let _ = writeln!(
            report,
            "| {} | {} | {} |",
            name,
            summary_cell(&buckets.battery, metric, stat, precision),
            summary_cell(&buckets.ac, metric, stat, precision),
        );
    }
}

/// Parse `csv_path`, render the report and write it to `output_path`
///
/// The system info file is optional. The graph section is included when a
/// `dashboard.png` exists in the output file's directory.
///
/// # Errors
///
/// Returns `BenchError::MissingInput` if the CSV does not exist.
pub fn write_report(csv_path: &Path, output_path: &Path, system_info_path: &Path) -> Result<(), BenchError> {
    let parsed = parse_metrics_file(csv_path, Schema::Core)?;
    let system_info = SystemInfo::load(system_info_path)?;

    let output_dir = output_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let has_dashboard = output_dir.join(DASHBOARD_FILE).exists();

    let report = render_report(&ReportInput {
        phases: &parsed.phases,
        system_info: &system_info,
        has_dashboard,
    });

    fs::write(output_path, report)?;
    log::info!("report written to {}", output_path.display());
    Ok(())
}
