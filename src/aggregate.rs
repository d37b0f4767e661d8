//! Phase statistics and battery/AC bucketing
//!
//! Means and peaks are total: an empty sequence yields exactly `0.0` so that
//! report and chart formatting never has to deal with `NaN`.

use crate::metrics::{Metric, MetricSeries, PhaseSet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Arithmetic mean, `0.0` for an empty slice
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Maximum value, `0.0` for an empty slice
pub fn peak(values: &[f64]) -> f64 {
    values.iter().copied().reduce(f64::max).unwrap_or(0.0)
}

impl MetricSeries {
    pub fn mean(&self, metric: Metric) -> f64 {
        mean(self.series(metric))
    }

    pub fn peak(&self, metric: Metric) -> f64 {
        peak(self.series(metric))
    }
}

/// Power source a phase was recorded on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerMode {
    Battery,
    Ac,
}

impl PowerMode {
    /// Substring of a phase name that selects this mode
    pub fn marker(self) -> &'static str {
        match self {
            PowerMode::Battery => "_bat",
            PowerMode::Ac => "_ac",
        }
    }
}

impl fmt::Display for PowerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PowerMode::Battery => "Battery",
            PowerMode::Ac => "AC",
        })
    }
}

/// Power mode of a phase name
///
/// Exactly one of the `_bat`/`_ac` markers must be present; names carrying
/// both or neither belong to no bucket.
pub fn classify_phase(name: &str) -> Option<PowerMode> {
    let bat = name.contains(PowerMode::Battery.marker());
    let ac = name.contains(PowerMode::Ac.marker());
    match (bat, ac) {
        (true, false) => Some(PowerMode::Battery),
        (false, true) => Some(PowerMode::Ac),
        _ => None,
    }
}

/// All samples of a run split into battery and AC buckets
#[derive(Debug, Clone, Default)]
pub struct PowerBuckets {
    pub battery: MetricSeries,
    pub ac: MetricSeries,
    /// Phases that fed the battery bucket, in phase order
    pub battery_phases: Vec<String>,
    /// Phases that fed the AC bucket, in phase order
    pub ac_phases: Vec<String>,
}

impl PowerBuckets {
    pub fn from_phases(phases: &PhaseSet) -> Self {
        let mut buckets = PowerBuckets::default();
        for (name, series) in phases.iter() {
            match classify_phase(name) {
                Some(PowerMode::Battery) => {
                    buckets.battery.extend_from(series);
                    buckets.battery_phases.push(name.to_string());
                }
                Some(PowerMode::Ac) => {
                    buckets.ac.extend_from(series);
                    buckets.ac_phases.push(name.to_string());
                }
                None => {}
            }
        }
        buckets
    }

    pub fn bucket(&self, mode: PowerMode) -> &MetricSeries {
        match mode {
            PowerMode::Battery => &self.battery,
            PowerMode::Ac => &self.ac,
        }
    }

    pub fn phase_names(&self, mode: PowerMode) -> &[String] {
        match mode {
            PowerMode::Battery => &self.battery_phases,
            PowerMode::Ac => &self.ac_phases,
        }
    }
}

/// Bucket-level means of one result set, labelled `<desktop>_<mode>`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub label: String,
    pub desktop: String,
    pub mode: PowerMode,
    pub samples: usize,
    /// Mean per metric, keyed by `Metric::key`
    pub means: BTreeMap<String, f64>,
}

impl RunSummary {
    pub fn mean(&self, metric: Metric) -> f64 {
        self.means.get(metric.key()).copied().unwrap_or(0.0)
    }
}

/// Summarize one bucket of a run; `None` when the bucket holds no samples
pub fn summarize_run(desktop: &str, mode: PowerMode, bucket: &MetricSeries) -> Option<RunSummary> {
    if bucket.is_empty() {
        return None;
    }

    let means = Metric::ALL
        .iter()
        .map(|m| (m.key().to_string(), bucket.mean(*m)))
        .collect();

    Some(RunSummary {
        label: format!("{}_{}", desktop, mode),
        desktop: desktop.to_string(),
        mode,
        samples: bucket.power.len(),
        means,
    })
}
