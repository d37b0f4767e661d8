//! Cross-run comparison charts
//!
//! Each result directory contributes up to two [`RunSummary`] entries, one
//! per non-empty power bucket. Entries are keyed by label
//! (`<desktop>_<mode>`); a later result set with the same label replaces the
//! earlier values but keeps the earlier position.
//!
//! PNG output needs the `charts` feature. Without it rendering logs a
//! warning and writes only `summary.json`.

use crate::aggregate::{summarize_run, PowerBuckets, PowerMode, RunSummary};
use crate::metrics::{parse_metrics_file, Metric, Schema};
use crate::system_info::SystemInfo;
use crate::{BenchError, DASHBOARD_FILE, RAW_METRICS_FILE, SYSTEM_INFO_FILE};
use std::fs;
use std::path::{Path, PathBuf};

/// Bar colors, assigned to labels in insertion order and cycled
pub const PALETTE: [(u8, u8, u8); 4] = [
    (0x34, 0x98, 0xdb), // blue
    (0x2e, 0xcc, 0x71), // green
    (0xe7, 0x4c, 0x3c), // red
    (0x9b, 0x59, 0xb6), // purple
];

/// Super-title of the dashboard image
pub const DASHBOARD_TITLE: &str = "Desktop Environment Benchmark Comparison";

/// Machine-readable copy of the compared summaries
pub const SUMMARY_JSON_FILE: &str = "summary.json";

/// A metric drawn as its own comparison chart
#[derive(Debug, Clone, Copy)]
pub struct TrackedMetric {
    pub metric: Metric,
    pub y_label: &'static str,
    pub title: &'static str,
}

/// Charted metrics; the first six make up the dashboard
pub const TRACKED_METRICS: [TrackedMetric; 7] = [
    TrackedMetric { metric: Metric::Power, y_label: "Average Power Draw (W)", title: "Power Consumption" },
    TrackedMetric { metric: Metric::Cpu, y_label: "Average CPU Usage (%)", title: "CPU Usage" },
    TrackedMetric { metric: Metric::Temp, y_label: "Average CPU Temperature (°C)", title: "Temperature" },
    TrackedMetric { metric: Metric::Mem, y_label: "Average Memory Usage (%)", title: "Memory Usage" },
    TrackedMetric { metric: Metric::Load, y_label: "Average Load (1m)", title: "System Load" },
    TrackedMetric { metric: Metric::DiskRead, y_label: "Average Disk Read (MB/s)", title: "Disk Read" },
    TrackedMetric { metric: Metric::DiskWrite, y_label: "Average Disk Write (MB/s)", title: "Disk Write" },
];

#[cfg_attr(not(feature = "charts"), allow(dead_code))]
const DASHBOARD_PANELS: usize = 6;

/// Color for the bar at `index`
pub fn palette_color(index: usize) -> (u8, u8, u8) {
    PALETTE[index % PALETTE.len()]
}

/// Upper y-axis bound: 120% of the largest value, or 1 when nothing is positive
pub fn axis_upper_bound(values: &[f64]) -> f64 {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max.is_finite() && max > 0.0 {
        max * 1.2
    } else {
        1.0
    }
}

/// File name of a metric's comparison chart
pub fn chart_file_name(metric: Metric) -> String {
    format!("{}_comparison.png", metric.key())
}

/// Summaries of several runs, one entry per distinct label
#[derive(Debug, Clone, Default)]
pub struct ComparisonSet {
    entries: Vec<RunSummary>,
}

impl ComparisonSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_summaries<I: IntoIterator<Item = RunSummary>>(summaries: I) -> Self {
        let mut set = Self::new();
        for summary in summaries {
            set.insert(summary);
        }
        set
    }

    /// Add a summary; an existing label is overwritten in place
    pub fn insert(&mut self, summary: RunSummary) {
        match self.entries.iter_mut().find(|e| e.label == summary.label) {
            Some(existing) => {
                log::debug!("label {} seen again, keeping latest values", summary.label);
                *existing = summary;
            }
            None => self.entries.push(summary),
        }
    }

    pub fn labels(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.label.clone()).collect()
    }

    /// Mean of `metric` for every label, in label order
    pub fn values(&self, metric: Metric) -> Vec<f64> {
        self.entries.iter().map(|e| e.mean(metric)).collect()
    }

    pub fn entries(&self) -> &[RunSummary] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Parse and summarize every result directory, in the given order
///
/// Directories without `raw_metrics.csv` are skipped. Each directory yields
/// a battery entry, then an AC entry, for whichever buckets hold samples.
/// A file where no row carries the CPU frequency and context switch columns
/// is re-read with the core columns only.
pub fn collect_run_summaries<P: AsRef<Path>>(result_dirs: &[P]) -> Result<Vec<RunSummary>, BenchError> {
    let mut summaries = Vec::new();

    for dir in result_dirs {
        let dir = dir.as_ref();
        let csv_path = dir.join(RAW_METRICS_FILE);
        if !csv_path.exists() {
            log::warn!("skipping {}: no {}", dir.display(), RAW_METRICS_FILE);
            continue;
        }

        let info = SystemInfo::load(dir.join(SYSTEM_INFO_FILE))?;
        let mut parsed = parse_metrics_file(&csv_path, Schema::Extended)?;
        if parsed.admitted == 0 && parsed.dropped > 0 {
            log::warn!(
                "{}: no row has numeric {} and {}, comparing core metrics only",
                csv_path.display(),
                Metric::CpuFreq.column(),
                Metric::ContextSwitches.column()
            );
            parsed = parse_metrics_file(&csv_path, Schema::Core)?;
        }
        let buckets = PowerBuckets::from_phases(&parsed.phases);

        for mode in [PowerMode::Battery, PowerMode::Ac] {
            if let Some(summary) = summarize_run(&info.desktop, mode, buckets.bucket(mode)) {
                summaries.push(summary);
            }
        }
    }

    Ok(summaries)
}

/// Rendering context for one output directory
#[derive(Debug, Clone)]
#[cfg_attr(not(feature = "charts"), allow(dead_code))]
pub struct ChartRenderer {
    output_dir: PathBuf,
    chart_size: (u32, u32),
    dashboard_size: (u32, u32),
}

impl ChartRenderer {
    /// Prepare the output directory, creating it if needed
    pub fn new<P: AsRef<Path>>(output_dir: P) -> Result<Self, BenchError> {
        let output_dir = output_dir.as_ref().to_path_buf();
        fs::create_dir_all(&output_dir)?;
        Ok(Self {
            output_dir,
            chart_size: (1500, 900),
            dashboard_size: (2250, 1500),
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Write `summary.json` plus every chart; returns the written paths
    ///
    /// `summary.json` is always written for a non-empty set. Without the
    /// `charts` feature it is the only file written.
    pub fn render(&self, set: &ComparisonSet) -> Result<Vec<PathBuf>, BenchError> {
        if set.is_empty() {
            log::warn!("no data to compare");
            return Ok(Vec::new());
        }

        let mut written = vec![self.write_summary_json(set)?];
        written.extend(self.render_charts(set)?);
        Ok(written)
    }

    fn write_summary_json(&self, set: &ComparisonSet) -> Result<PathBuf, BenchError> {
        let path = self.output_dir.join(SUMMARY_JSON_FILE);
        fs::write(&path, serde_json::to_string_pretty(set.entries())?)?;
        log::info!("wrote {}", path.display());
        Ok(path)
    }

    #[cfg(not(feature = "charts"))]
    fn render_charts(&self, _set: &ComparisonSet) -> Result<Vec<PathBuf>, BenchError> {
        log::warn!("built without the `charts` feature, skipping PNG output");
        Ok(Vec::new())
    }

    #[cfg(feature = "charts")]
    fn render_charts(&self, set: &ComparisonSet) -> Result<Vec<PathBuf>, BenchError> {
        use plotters::prelude::*;

        let labels = set.labels();
        let mut written = Vec::new();

        for tracked in &TRACKED_METRICS {
            let path = self.output_dir.join(chart_file_name(tracked.metric));
            {
                let root = BitMapBackend::new(&path, self.chart_size).into_drawing_area();
                root.fill(&WHITE).map_err(draw::chart_error)?;

                let bars = draw::Bars {
                    labels: &labels,
                    values: set.values(tracked.metric),
                    caption: format!("{} Comparison", tracked.title),
                    y_label: tracked.y_label,
                    precision: 2,
                    scale: draw::Scale::Full,
                };
                draw::bar_chart(&root, &bars)?;
                root.present().map_err(draw::chart_error)?;
            }
            log::info!("wrote {}", path.display());
            written.push(path);
        }

        let path = self.output_dir.join(DASHBOARD_FILE);
        {
            let root = BitMapBackend::new(&path, self.dashboard_size).into_drawing_area();
            root.fill(&WHITE).map_err(draw::chart_error)?;
            let body = root
                .titled(
                    DASHBOARD_TITLE,
                    plotters::style::FontDesc::new(
                        plotters::style::FontFamily::SansSerif,
                        44.0,
                        plotters::style::FontStyle::Bold,
                    ),
                )
                .map_err(draw::chart_error)?;

            let panels = body.split_evenly((2, 3));
            for (panel, tracked) in panels.iter().zip(TRACKED_METRICS.iter().take(DASHBOARD_PANELS)) {
                let bars = draw::Bars {
                    labels: &labels,
                    values: set.values(tracked.metric),
                    caption: tracked.title.to_string(),
                    y_label: tracked.y_label,
                    precision: 1,
                    scale: draw::Scale::Panel,
                };
                draw::bar_chart(panel, &bars)?;
            }
            root.present().map_err(draw::chart_error)?;
        }
        log::info!("wrote {}", path.display());
        written.push(path);

        Ok(written)
    }
}

#[cfg(feature = "charts")]
mod draw {
    use super::{axis_upper_bound, palette_color};
    use crate::BenchError;
    use plotters::coord::Shift;
    use plotters::prelude::*;
    use plotters::style::text_anchor::{HPos, Pos, VPos};

    pub(super) fn chart_error<E: std::fmt::Display>(err: E) -> BenchError {
        BenchError::Chart {
            message: err.to_string(),
        }
    }

    /// Font sizes for a stand-alone chart or a dashboard panel
    #[derive(Debug, Clone, Copy)]
    pub(super) enum Scale {
        Full,
        Panel,
    }

    impl Scale {
        fn caption(self) -> f64 {
            match self {
                Scale::Full => 40.0,
                Scale::Panel => 32.0,
            }
        }

        fn label(self) -> f64 {
            match self {
                Scale::Full => 22.0,
                Scale::Panel => 18.0,
            }
        }
    }

    pub(super) struct Bars<'a> {
        pub labels: &'a [String],
        pub values: Vec<f64>,
        pub caption: String,
        pub y_label: &'a str,
        pub precision: usize,
        pub scale: Scale,
    }

    pub(super) fn bar_chart<DB: DrawingBackend>(
        area: &DrawingArea<DB, Shift>,
        bars: &Bars<'_>,
    ) -> Result<(), BenchError> {
        let count = bars.labels.len();
        let upper = axis_upper_bound(&bars.values);

        let mut chart = ChartBuilder::on(area)
            .caption(&bars.caption, ("sans-serif", bars.scale.caption()))
            .margin(20)
            .x_label_area_size(60)
            .y_label_area_size(90)
            .build_cartesian_2d((0..count).into_segmented(), 0.0..upper)
            .map_err(chart_error)?;

        let label_for = |value: &SegmentValue<usize>| match value {
            SegmentValue::CenterOf(idx) | SegmentValue::Exact(idx) => {
                bars.labels.get(*idx).cloned().unwrap_or_default()
            }
            SegmentValue::Last => String::new(),
        };

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(count + 1)
            .x_label_formatter(&label_for)
            .y_desc(bars.y_label)
            .label_style(("sans-serif", bars.scale.label()))
            .draw()
            .map_err(chart_error)?;

        chart
            .draw_series(bars.values.iter().enumerate().map(|(idx, value)| {
                let (r, g, b) = palette_color(idx);
                let mut bar = Rectangle::new(
                    [
                        (SegmentValue::Exact(idx), 0.0),
                        (SegmentValue::Exact(idx + 1), *value),
                    ],
                    RGBColor(r, g, b).filled(),
                );
                bar.set_margin(0, 0, 10, 10);
                bar
            }))
            .map_err(chart_error)?;

        let value_style = TextStyle::from(("sans-serif", bars.scale.label()).into_font())
            .pos(Pos::new(HPos::Center, VPos::Bottom));
        chart
            .draw_series(bars.values.iter().enumerate().map(|(idx, value)| {
                Text::new(
                    format!("{:.*}", bars.precision, value),
                    (SegmentValue::CenterOf(idx), *value),
                    value_style.clone(),
                )
            }))
            .map_err(chart_error)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "phase,power_w,cpu_pct,cpu_temp_c,mem_pct,load_1m,disk_read_mbs,disk_write_mbs,net_rx_kbs,net_tx_kbs,cpu_freq_mhz,context_switches";

    fn write_run(base: &Path, name: &str, desktop: &str, rows: &[&str]) -> PathBuf {
        let dir = base.join(name);
        fs::create_dir_all(&dir).unwrap();
        let mut csv = format!("{}\n", HEADER);
        for row in rows {
            csv.push_str(row);
            csv.push('\n');
        }
        fs::write(dir.join(RAW_METRICS_FILE), csv).unwrap();
        fs::write(
            dir.join(SYSTEM_INFO_FILE),
            format!("Desktop: {}\nRun Type: full\n", desktop),
        )
        .unwrap();
        dir
    }

    #[test]
    fn test_axis_upper_bound() {
        assert_eq!(axis_upper_bound(&[10.0, 5.0]), 12.0);
        assert_eq!(axis_upper_bound(&[0.0, 0.0]), 1.0);
        assert_eq!(axis_upper_bound(&[]), 1.0);
    }

    #[test]
    fn test_palette_cycles() {
        assert_eq!(palette_color(0), PALETTE[0]);
        assert_eq!(palette_color(3), PALETTE[3]);
        assert_eq!(palette_color(4), PALETTE[0]);
        assert_eq!(palette_color(9), PALETTE[1]);
    }

    #[test]
    fn test_chart_file_names() {
        assert_eq!(chart_file_name(Metric::Power), "power_comparison.png");
        assert_eq!(chart_file_name(Metric::DiskWrite), "disk_write_comparison.png");
    }

    #[test]
    fn test_summaries_per_bucket_and_label_merge() {
        let base = tempfile::tempdir().unwrap();
        let bat_only = write_run(base.path(), "a", "KDE", &["light_bat,10,5,40,30,0.5,1,2,3,4,1800,100"]);
        let ac_only = write_run(base.path(), "b", "KDE", &["light_ac,20,5,40,30,0.5,1,2,3,4,1800,100"]);
        let both = write_run(
            base.path(),
            "c",
            "KDE",
            &[
                "heavy_bat,14,5,40,30,0.5,1,2,3,4,1800,100",
                "heavy_ac,26,5,40,30,0.5,1,2,3,4,1800,100",
            ],
        );

        let summaries = collect_run_summaries(&[bat_only, ac_only, both]).unwrap();
        let labels: Vec<&str> = summaries.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["KDE_Battery", "KDE_AC", "KDE_Battery", "KDE_AC"]);

        let set = ComparisonSet::from_summaries(summaries);
        assert_eq!(set.labels(), vec!["KDE_Battery", "KDE_AC"]);
        // The last result set wins for each label
        assert_eq!(set.values(Metric::Power), vec![14.0, 26.0]);
    }

    #[test]
    fn test_directories_without_metrics_are_skipped() {
        let base = tempfile::tempdir().unwrap();
        let empty = base.path().join("empty");
        fs::create_dir_all(&empty).unwrap();
        let gnome = write_run(base.path(), "g", "GNOME", &["idle_bat,7,5,40,30,0.5,1,2,3,4,1800,100"]);

        let summaries = collect_run_summaries(&[empty, gnome]).unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].label, "GNOME_Battery");
        assert_eq!(summaries[0].mean(Metric::CpuFreq), 1800.0);
    }

    #[test]
    fn test_files_without_extended_columns_fall_back_to_core() {
        let base = tempfile::tempdir().unwrap();
        let dir = base.path().join("x");
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join(RAW_METRICS_FILE),
            "phase,power_w,cpu_pct,cpu_temp_c,mem_pct,load_1m,disk_read_mbs,disk_write_mbs,net_rx_kbs,net_tx_kbs\n\
             light_bat,10,5,40,30,0.5,1,2,3,4\n\
             light_ac,20,7,45,30,0.5,1,2,3,4\n",
        )
        .unwrap();
        fs::write(dir.join(SYSTEM_INFO_FILE), "Desktop: XFCE\n").unwrap();

        let summaries = collect_run_summaries(&[dir]).unwrap();
        let labels: Vec<&str> = summaries.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["XFCE_Battery", "XFCE_AC"]);
        assert_eq!(summaries[1].mean(Metric::Power), 20.0);
        assert_eq!(summaries[0].mean(Metric::CpuFreq), 0.0);
    }

    #[test]
    fn test_extended_rows_preferred_when_present() {
        let base = tempfile::tempdir().unwrap();
        let dir = write_run(
            base.path(),
            "m",
            "LXQt",
            &[
                "light_bat,10,5,40,30,0.5,1,2,3,4,1800,100",
                "light_bat,30,5,40,30,0.5,1,2,3,4",
            ],
        );

        let summaries = collect_run_summaries(&[dir]).unwrap();
        assert_eq!(summaries.len(), 1);
        // The ragged row is dropped because one complete row exists
        assert_eq!(summaries[0].mean(Metric::Power), 10.0);
    }

    #[test]
    fn test_summary_json_lists_every_label() {
        let base = tempfile::tempdir().unwrap();
        let run = write_run(base.path(), "k", "KDE", &["light_bat,10,5,40,30,0.5,1,2,3,4,1800,100"]);
        let set = ComparisonSet::from_summaries(collect_run_summaries(&[run]).unwrap());
        let renderer = ChartRenderer::new(base.path().join("out")).unwrap();

        let path = renderer.write_summary_json(&set).unwrap();
        assert_eq!(path, base.path().join("out").join(SUMMARY_JSON_FILE));
        let written: Vec<RunSummary> = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, set.entries().to_vec());
    }

    #[test]
    fn test_empty_set_renders_nothing() {
        let base = tempfile::tempdir().unwrap();
        let out = base.path().join("comparison");
        let renderer = ChartRenderer::new(&out).unwrap();

        assert!(out.is_dir());
        assert_eq!(renderer.output_dir(), out.as_path());
        assert!(renderer.render(&ComparisonSet::new()).unwrap().is_empty());
        assert!(!out.join(SUMMARY_JSON_FILE).exists());
    }
}
