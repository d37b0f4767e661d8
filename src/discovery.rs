//! Locate benchmark result directories by recency

use crate::{BenchError, RAW_METRICS_FILE};
use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};

/// Default number of result directories picked for comparison
pub const DEFAULT_RESULT_COUNT: usize = 4;

/// One result directory holding a `raw_metrics.csv`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunDir {
    pub path: PathBuf,
    pub modified: DateTime<Utc>,
}

/// Newest `count` subdirectories of `base` that contain raw metrics
///
/// A missing base directory yields an empty list.
pub fn find_latest_results(base: &Path, count: usize) -> Result<Vec<RunDir>, BenchError> {
    if !base.exists() {
        return Ok(Vec::new());
    }

    let mut dirs = Vec::new();
    for entry in fs::read_dir(base)? {
        let entry = entry?;
        let path = entry.path();

        if !path.is_dir() || !path.join(RAW_METRICS_FILE).exists() {
            continue;
        }

        let modified = entry.metadata()?.modified()?;
        dirs.push(RunDir {
            path,
            modified: DateTime::<Utc>::from(modified),
        });
    }

    // Newest first; name breaks ties so the order is stable
    dirs.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| a.path.cmp(&b.path)));
    dirs.truncate(count);

    Ok(dirs)
}
