//! Directory walk: one [`RunRecord`] per run subdirectory.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::record::{RunRecord, DEFAULT_PATH_MARKER};
use crate::table::{Column, SummaryTable};

/// What to do when a run cannot be merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Abort the whole aggregation on the first bad run.
    #[default]
    FailFast,
    /// Log the bad run, leave it out, and keep going.
    Skip,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateOptions {
    pub sort_by: Column,
    pub policy: FailurePolicy,
    pub path_marker: String,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self {
            sort_by: Column::TestMrr,
            policy: FailurePolicy::FailFast,
            path_marker: DEFAULT_PATH_MARKER.to_string(),
        }
    }
}

/// A run left out under [`FailurePolicy::Skip`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRun {
    pub run: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct Aggregation {
    /// Sorted by [`AggregateOptions::sort_by`].
    pub table: SummaryTable,
    pub skipped: Vec<SkippedRun>,
}

/// Subdirectories of `dir`, sorted by name.
///
/// Plain files (such as a previous `summary.csv`) are ignored.
pub fn discover_runs(dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    let entries = fs::read_dir(dir).map_err(|e| Error::file_access(dir, e))?;

    let mut runs = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| Error::file_access(dir, e))?;
        let path = entry.path();
        if path.is_dir() {
            runs.push(path);
        } else {
            debug!(path = %path.display(), "skipping non-directory entry");
        }
    }
    runs.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(runs)
}

/// Merge every run under `dir` and sort the result.
pub fn aggregate(dir: impl AsRef<Path>, options: &AggregateOptions) -> Result<Aggregation> {
    let dir = dir.as_ref();
    let runs = discover_runs(dir)?;
    info!(dir = %dir.display(), runs = runs.len(), "aggregating runs");

    let mut aggregation = Aggregation::default();
    for run_dir in runs {
        debug!(run = %run_dir.display(), "reading run");
        match RunRecord::load(&run_dir, &options.path_marker) {
            Ok(record) => aggregation.table.push(record),
            Err(err) if options.policy == FailurePolicy::Skip => {
                let run = run_dir
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                warn!(run = %run, error = %err, "skipping run");
                aggregation.skipped.push(SkippedRun {
                    run,
                    reason: err.to_string(),
                });
            }
            Err(err) => return Err(err),
        }
    }

    if aggregation.table.is_empty() {
        warn!(dir = %dir.display(), "no runs aggregated");
    }
    aggregation.table.sort_descending(options.sort_by)?;
    Ok(aggregation)
}
