use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Position of a name inside a query triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Head entity.
    Subject,
    /// Relation.
    Predicate,
    /// Tail entity.
    Object,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Subject => "subject",
            Self::Predicate => "predicate",
            Self::Object => "object",
        })
    }
}

/// Errors that can occur in kgscope-infer.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error while reading an experiment artifact.
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// JSON serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// Parquet decoding error.
    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),
    /// Safetensors decoding error.
    #[error("Safetensors error: {0}")]
    SafeTensors(#[from] safetensors::SafeTensorError),
    /// A query name is not in the vocabulary.
    #[error("Failed at mapping the {role}: '{name}' is not in the vocabulary")]
    UnresolvedName { role: Role, name: String },
    /// An id handed to the oracle is outside the embedding table.
    #[error("{kind} id {id} out of range (size {size})")]
    IdOutOfRange {
        kind: &'static str,
        id: usize,
        size: usize,
    },
    /// Model named in the configuration has no scoring function here.
    #[error("Unsupported model: {0}")]
    UnsupportedModel(String),
    /// Required artifact is missing from the experiment folder.
    #[error("Not found: {0}")]
    NotFound(String),
    /// Validation error.
    #[error("Validation error: {0}")]
    Validation(String),
}

impl Error {
    /// Role of the name that failed to resolve, if this is a lookup miss.
    pub fn unresolved_role(&self) -> Option<Role> {
        match self {
            Self::UnresolvedName { role, .. } => Some(*role),
            _ => None,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for kgscope-infer.
pub type Result<T> = std::result::Result<T, Error>;
