use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur in kgscope-report.
#[derive(Error, Debug)]
pub enum Error {
    /// A run directory or artifact file could not be read.
    #[error("cannot read {path}: {source}")]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// An artifact file is not valid JSON.
    #[error("malformed JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// A document (or nested section) is not a JSON object.
    #[error("run '{run}': {document} is not a JSON object")]
    NotAnObject { run: String, document: String },
    /// A selected key is absent.
    #[error("run '{run}': {document} has no key '{key}'")]
    MissingField {
        run: String,
        document: String,
        key: String,
    },
    /// A selected key has the wrong type.
    #[error("run '{run}': key '{key}' in {document}: {source}")]
    InvalidField {
        run: String,
        document: String,
        key: String,
        #[source]
        source: serde_json::Error,
    },
    /// CSV export error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    /// Column name not in the summary table.
    #[error("Unknown column: {0}")]
    UnknownColumn(String),
    /// Sorting requested on a text column.
    #[error("column '{0}' is not numeric")]
    NotSortable(&'static str),
}

impl Error {
    pub(crate) fn file_access(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileAccess {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for kgscope-report.
pub type Result<T> = std::result::Result<T, Error>;
