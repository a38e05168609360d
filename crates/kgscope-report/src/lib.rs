//! Comparison tables over completed KGE training runs.
//!
//! Each run directory holds three JSON documents:
//!
//! | File | Keys used |
//! |------|-----------|
//! | `configuration.json` | model, full_storage_path, embedding_dim, normalization, num_epochs, batch_size, lr, callbacks, scoring_technique, path_dataset_folder, p, q |
//! | `report.json` | Runtime, NumParam |
//! | `eval_report.json` | Train / Val / Test, each with MRR, H@1, H@3, H@10 |
//!
//! [`aggregate`] merges them into one [`RunRecord`] per run, in sorted
//! directory order, and sorts the resulting [`SummaryTable`] by a metric
//! (test MRR unless told otherwise). The table renders as a LaTeX `tabular`
//! or as CSV.
//!
//! A run missing any of those keys fails the whole aggregation by default;
//! [`FailurePolicy::Skip`] leaves it out and reports it instead.

mod aggregate;
mod error;
mod record;
mod table;

pub use aggregate::{
    aggregate, discover_runs, AggregateOptions, Aggregation, FailurePolicy, SkippedRun,
};
pub use error::{Error, Result};
pub use record::{
    truncate_storage_path, RunRecord, SplitMetrics, CONFIGURATION_FILE, DEFAULT_PATH_MARKER,
    EVAL_REPORT_FILE, REPORT_FILE,
};
pub use table::{Cell, Column, SummaryTable};

/// File name of the CSV export.
pub const SUMMARY_FILE: &str = "summary.csv";
