//! Raw metrics parsing
//!
//! Reads the `raw_metrics.csv` time series recorded during a benchmark run
//! and groups its rows into named phases (`light_bat`, `heavy_ac`, ...).
//!
//! Row admission is all-or-nothing: a row whose phase column or any column
//! of the active [`Schema`] is missing or non-numeric is dropped entirely.
//! Dropped rows are counted but never surfaced as errors. A header that
//! lacks one of the schema's columns therefore drops every row.

use crate::BenchError;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Column holding the phase label of each row
pub const PHASE_COLUMN: &str = "phase";

/// One numeric field recorded for every sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    Power,
    Cpu,
    Temp,
    Mem,
    Load,
    DiskRead,
    DiskWrite,
    NetRx,
    NetTx,
    CpuFreq,
    ContextSwitches,
}

impl Metric {
    /// Every metric, in column order
    pub const ALL: [Metric; 11] = [
        Metric::Power,
        Metric::Cpu,
        Metric::Temp,
        Metric::Mem,
        Metric::Load,
        Metric::DiskRead,
        Metric::DiskWrite,
        Metric::NetRx,
        Metric::NetTx,
        Metric::CpuFreq,
        Metric::ContextSwitches,
    ];

    /// CSV header name (case-sensitive)
    pub fn column(self) -> &'static str {
        match self {
            Metric::Power => "power_w",
            Metric::Cpu => "cpu_pct",
            Metric::Temp => "cpu_temp_c",
            Metric::Mem => "mem_pct",
            Metric::Load => "load_1m",
            Metric::DiskRead => "disk_read_mbs",
            Metric::DiskWrite => "disk_write_mbs",
            Metric::NetRx => "net_rx_kbs",
            Metric::NetTx => "net_tx_kbs",
            Metric::CpuFreq => "cpu_freq_mhz",
            Metric::ContextSwitches => "context_switches",
        }
    }

    /// Short key used in chart file names and JSON output
    pub fn key(self) -> &'static str {
        match self {
            Metric::Power => "power",
            Metric::Cpu => "cpu",
            Metric::Temp => "temp",
            Metric::Mem => "mem",
            Metric::Load => "load",
            Metric::DiskRead => "disk_read",
            Metric::DiskWrite => "disk_write",
            Metric::NetRx => "net_rx",
            Metric::NetTx => "net_tx",
            Metric::CpuFreq => "cpu_freq",
            Metric::ContextSwitches => "context_switches",
        }
    }
}

/// Set of columns a row must carry to be admitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schema {
    /// Power, CPU, temperature, memory, load, disk and network (report)
    Core,
    /// Core plus CPU frequency and context switches (comparison)
    Extended,
}

impl Schema {
    pub fn metrics(self) -> &'static [Metric] {
        match self {
            Schema::Core => &Metric::ALL[..9],
            Schema::Extended => &Metric::ALL[..],
        }
    }
}

/// Per-metric sample sequences, in file order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricSeries {
    pub power: Vec<f64>,
    pub cpu: Vec<f64>,
    pub temp: Vec<f64>,
    pub mem: Vec<f64>,
    pub load: Vec<f64>,
    pub disk_read: Vec<f64>,
    pub disk_write: Vec<f64>,
    pub net_rx: Vec<f64>,
    pub net_tx: Vec<f64>,
    pub cpu_freq: Vec<f64>,
    pub context_switches: Vec<f64>,
}

impl MetricSeries {
    pub fn series(&self, metric: Metric) -> &[f64] {
        match metric {
            Metric::Power => &self.power,
            Metric::Cpu => &self.cpu,
            Metric::Temp => &self.temp,
            Metric::Mem => &self.mem,
            Metric::Load => &self.load,
            Metric::DiskRead => &self.disk_read,
            Metric::DiskWrite => &self.disk_write,
            Metric::NetRx => &self.net_rx,
            Metric::NetTx => &self.net_tx,
            Metric::CpuFreq => &self.cpu_freq,
            Metric::ContextSwitches => &self.context_switches,
        }
    }

    fn series_mut(&mut self, metric: Metric) -> &mut Vec<f64> {
        match metric {
            Metric::Power => &mut self.power,
            Metric::Cpu => &mut self.cpu,
            Metric::Temp => &mut self.temp,
            Metric::Mem => &mut self.mem,
            Metric::Load => &mut self.load,
            Metric::DiskRead => &mut self.disk_read,
            Metric::DiskWrite => &mut self.disk_write,
            Metric::NetRx => &mut self.net_rx,
            Metric::NetTx => &mut self.net_tx,
            Metric::CpuFreq => &mut self.cpu_freq,
            Metric::ContextSwitches => &mut self.context_switches,
        }
    }

    /// Append one admitted row
    pub fn push_row(&mut self, values: &[(Metric, f64)]) {
        for &(metric, value) in values {
            self.series_mut(metric).push(value);
        }
    }

    /// Concatenate another series onto this one, metric by metric
    pub fn extend_from(&mut self, other: &MetricSeries) {
        for metric in Metric::ALL {
            self.series_mut(metric)
                .extend_from_slice(other.series(metric));
        }
    }

    /// True when no metric holds any sample
    pub fn is_empty(&self) -> bool {
        Metric::ALL.iter().all(|m| self.series(*m).is_empty())
    }
}

/// Phases keyed by name, remembering first-appearance order
#[derive(Debug, Clone, Default)]
pub struct PhaseSet {
    order: Vec<String>,
    phases: HashMap<String, MetricSeries>,
}

impl PhaseSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a row to `phase`, creating the phase on first sight
    pub fn push_row(&mut self, phase: &str, values: &[(Metric, f64)]) {
        if !self.phases.contains_key(phase) {
            self.order.push(phase.to_string());
        }
        self.phases
            .entry(phase.to_string())
            .or_default()
            .push_row(values);
    }

    pub fn get(&self, phase: &str) -> Option<&MetricSeries> {
        self.phases.get(phase)
    }

    pub fn contains(&self, phase: &str) -> bool {
        self.phases.contains_key(phase)
    }

    /// Phase names in first-appearance order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Phases in first-appearance order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &MetricSeries)> {
        self.order
            .iter()
            .filter_map(|name| self.phases.get(name).map(|s| (name.as_str(), s)))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Result of parsing one metrics file
#[derive(Debug, Clone, Default)]
pub struct ParseOutcome {
    pub phases: PhaseSet,
    /// Rows that contributed to a phase
    pub admitted: usize,
    /// Malformed rows that were skipped
    pub dropped: usize,
}

/// Parse a metrics CSV file from disk
///
/// # Errors
///
/// Returns `BenchError::MissingInput` if the file does not exist, and
/// `BenchError::Io`/`BenchError::Csv` if it cannot be read. Malformed rows
/// are never errors.
pub fn parse_metrics_file<P: AsRef<Path>>(path: P, schema: Schema) -> Result<ParseOutcome, BenchError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(BenchError::MissingInput {
            resource: path.to_path_buf(),
        });
    }

    let outcome = parse_metrics_reader(File::open(path)?, schema)?;
    log::debug!(
        "parsed {}: {} phases, {} rows admitted, {} dropped",
        path.display(),
        outcome.phases.len(),
        outcome.admitted,
        outcome.dropped
    );
    Ok(outcome)
}

/// Parse metrics CSV data from any reader
pub fn parse_metrics_reader<R: Read>(reader: R, schema: Schema) -> Result<ParseOutcome, BenchError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let column_index = |name: &str| headers.iter().position(|h| h == name);

    let phase_idx = column_index(PHASE_COLUMN);
    let metric_idx: Vec<(Metric, Option<usize>)> = schema
        .metrics()
        .iter()
        .map(|m| (*m, column_index(m.column())))
        .collect();

    let mut outcome = ParseOutcome::default();
    let mut values = Vec::with_capacity(metric_idx.len());

    for result in rdr.records() {
        let record = match result {
            Ok(record) => record,
            Err(e) if e.is_io_error() => return Err(e.into()),
            Err(_) => {
                outcome.dropped += 1;
                continue;
            }
        };

        let phase = phase_idx.and_then(|idx| record.get(idx));
        values.clear();
        let complete = metric_idx.iter().all(|(metric, idx)| {
            match idx.and_then(|i| record.get(i)).and_then(parse_number) {
                Some(value) => {
                    values.push((*metric, value));
                    true
                }
                None => false,
            }
        });

        match phase {
            Some(phase) if complete => {
                outcome.phases.push_row(phase, &values);
                outcome.admitted += 1;
            }
            _ => outcome.dropped += 1,
        }
    }

    Ok(outcome)
}

fn parse_number(field: &str) -> Option<f64> {
    field.trim().parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "timestamp,phase,power_w,cpu_pct,cpu_temp_c,mem_pct,load_1m,disk_read_mbs,disk_write_mbs,net_rx_kbs,net_tx_kbs,cpu_freq_mhz,context_switches";

    fn parse(body: &str, schema: Schema) -> ParseOutcome {
        let data = format!("{}\n{}", HEADER, body);
        parse_metrics_reader(data.as_bytes(), schema).expect("parse failed")
    }

    #[test]
    fn test_rows_grouped_by_phase_in_file_order() {
        let outcome = parse(
            "1,light_bat,10,5,40,30,0.5,1,2,3,4,1800,100\n\
             2,heavy_ac,30,90,70,35,3.5,1,2,3,4,3200,900\n\
             3,light_bat,20,6,41,31,0.6,1,2,3,4,1900,120\n",
            Schema::Core,
        );

        assert_eq!(outcome.admitted, 3);
        assert_eq!(outcome.dropped, 0);
        let names: Vec<&str> = outcome.phases.names().collect();
        assert_eq!(names, vec!["light_bat", "heavy_ac"]);

        let light = outcome.phases.get("light_bat").unwrap();
        assert_eq!(light.power, vec![10.0, 20.0]);
        assert_eq!(light.cpu, vec![5.0, 6.0]);
        // Core schema never reads the extended columns
        assert!(light.cpu_freq.is_empty());
    }

    #[test]
    fn test_non_numeric_field_drops_whole_row() {
        let outcome = parse(
            "1,light_bat,10,5,40,30,0.5,1,2,3,4,1800,100\n\
             2,light_bat,15,abc,40,30,0.5,1,2,3,4,1800,100\n",
            Schema::Core,
        );

        assert_eq!(outcome.admitted, 1);
        assert_eq!(outcome.dropped, 1);
        let light = outcome.phases.get("light_bat").unwrap();
        for metric in Schema::Core.metrics() {
            assert_eq!(light.series(*metric).len(), 1, "{:?}", metric);
        }
        assert_eq!(light.power, vec![10.0]);
    }

    #[test]
    fn test_phase_only_created_by_valid_rows() {
        let outcome = parse("1,ultra_ac,N/A,5,40,30,0.5,1,2,3,4,1800,100\n", Schema::Core);
        assert!(outcome.phases.is_empty());
        assert_eq!(outcome.dropped, 1);
    }

    #[test]
    fn test_extended_schema_requires_extra_columns() {
        let outcome = parse("1,light_bat,10,5,40,30,0.5,1,2,3,4,,100\n", Schema::Extended);
        assert!(outcome.phases.is_empty());

        let outcome = parse("1,light_bat,10,5,40,30,0.5,1,2,3,4,1800,100\n", Schema::Extended);
        assert_eq!(outcome.phases.get("light_bat").unwrap().cpu_freq, vec![1800.0]);
    }

    #[test]
    fn test_header_mismatch_drops_every_row() {
        let data = "phase,Power_W,cpu_pct,cpu_temp_c,mem_pct,load_1m,disk_read_mbs,disk_write_mbs,net_rx_kbs,net_tx_kbs\n\
                    light_bat,10,5,40,30,0.5,1,2,3,4\n";
        let outcome = parse_metrics_reader(data.as_bytes(), Schema::Core).unwrap();
        assert!(outcome.phases.is_empty());
        assert_eq!(outcome.dropped, 1);
    }

    #[test]
    fn test_missing_phase_column_drops_rows() {
        let data = "power_w,cpu_pct,cpu_temp_c,mem_pct,load_1m,disk_read_mbs,disk_write_mbs,net_rx_kbs,net_tx_kbs\n\
                    10,5,40,30,0.5,1,2,3,4\n";
        let outcome = parse_metrics_reader(data.as_bytes(), Schema::Core).unwrap();
        assert!(outcome.phases.is_empty());
        assert_eq!(outcome.dropped, 1);
    }

    #[test]
    fn test_ragged_rows_and_whitespace() {
        let outcome = parse(
            "1,light_bat,10,5\n\
             2,light_bat, 12.5 ,5,40,30,0.5,1,2,3,4,1800,100\n",
            Schema::Core,
        );
        assert_eq!(outcome.dropped, 1);
        assert_eq!(outcome.phases.get("light_bat").unwrap().power, vec![12.5]);
    }

    #[test]
    fn test_unknown_phase_names_accepted() {
        let outcome = parse("1,warmup,10,5,40,30,0.5,1,2,3,4,1800,100\n", Schema::Core);
        assert!(outcome.phases.contains("warmup"));
    }

    #[test]
    fn test_empty_input_yields_no_phases() {
        let outcome = parse_metrics_reader("".as_bytes(), Schema::Core).unwrap();
        assert!(outcome.phases.is_empty());
        assert_eq!(outcome.admitted + outcome.dropped, 0);
    }

    #[test]
    fn test_missing_file_is_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let err = parse_metrics_file(dir.path().join("raw_metrics.csv"), Schema::Core).unwrap_err();
        assert!(matches!(err, BenchError::MissingInput { .. }));
    }

    #[test]
    fn test_extend_from_concatenates() {
        let mut a = MetricSeries::default();
        a.push_row(&[(Metric::Power, 1.0)]);
        let mut b = MetricSeries::default();
        b.push_row(&[(Metric::Power, 2.0), (Metric::Cpu, 50.0)]);

        a.extend_from(&b);
        assert_eq!(a.power, vec![1.0, 2.0]);
        assert_eq!(a.cpu, vec![50.0]);
        assert!(!a.is_empty());
        assert!(MetricSeries::default().is_empty());
    }
}
