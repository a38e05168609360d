//! Score oracles: (subject, predicate) -> per-entity probabilities.
//!
//! The resolver and ranker only see the [`ScoreOracle`] trait. The one
//! concrete implementation here, [`EmbeddingOracle`], scores directly from
//! frozen embedding matrices; anything else (an ONNX session, a remote
//! model) can slot in behind the same two calls.

use std::path::Path;

use safetensors::{Dtype, SafeTensors};
use tracing::debug;

use crate::error::{Error, Result};
use crate::scoring::ScoringFunction;

/// Tensor holding entity embeddings, `[num_entities, dim]`.
pub const ENTITY_TENSOR: &str = "entity_embeddings.weight";
/// Tensor holding relation embeddings, `[num_relations, dim]`.
pub const RELATION_TENSOR: &str = "relation_embeddings.weight";

/// Logistic sigmoid.
pub fn sigmoid(logit: f32) -> f32 {
    1.0 / (1.0 + (-logit).exp())
}

/// Read-only scorer over a fixed entity set.
///
/// Implementations must not mutate state in either call; one instance is
/// shared by every request.
pub trait ScoreOracle: Send + Sync {
    /// Number of candidate entities; length of every [`score_all`](Self::score_all) result.
    fn num_entities(&self) -> usize;

    /// Number of relations the oracle accepts.
    fn num_relations(&self) -> usize;

    /// Score `(subject, predicate, e)` for every entity `e`, indexed by id.
    /// Values lie in `[0, 1]`.
    fn score_all(&self, subject: usize, predicate: usize) -> Result<Vec<f32>>;

    /// Score one triple. Value lies in `[0, 1]`.
    fn score_triple(&self, subject: usize, predicate: usize, object: usize) -> Result<f32> {
        let scores = self.score_all(subject, predicate)?;
        scores.get(object).copied().ok_or(Error::IdOutOfRange {
            kind: "entity",
            id: object,
            size: scores.len(),
        })
    }
}

/// Dense row-major `[rows, dim]` matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingTable {
    dim: usize,
    data: Vec<f32>,
}

impl EmbeddingTable {
    /// Wrap a flat row-major buffer.
    pub fn new(dim: usize, data: Vec<f32>) -> Result<Self> {
        if dim == 0 || data.len() % dim != 0 {
            return Err(Error::Validation(format!(
                "buffer of {} values is not a whole number of {dim}-dim rows",
                data.len()
            )));
        }
        Ok(Self { dim, data })
    }

    /// Build from equal-length rows.
    pub fn from_rows(rows: &[Vec<f32>]) -> Result<Self> {
        let dim = rows.first().map(Vec::len).unwrap_or(0);
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != dim) {
            return Err(Error::Validation(format!(
                "row {i} has dimension {} but expected {dim}",
                row.len()
            )));
        }
        Self::new(dim, rows.concat())
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn rows(&self) -> usize {
        self.data.len() / self.dim
    }

    pub fn row(&self, i: usize) -> Option<&[f32]> {
        let start = i.checked_mul(self.dim)?;
        self.data.get(start..start.checked_add(self.dim)?)
    }

    fn iter_rows(&self) -> std::slice::ChunksExact<'_, f32> {
        self.data.chunks_exact(self.dim)
    }

    fn from_view(tensors: &SafeTensors<'_>, name: &str) -> Result<Self> {
        let view = tensors
            .tensor(name)
            .map_err(|e| Error::NotFound(format!("tensor '{name}': {e}")))?;
        let [_, dim] = view.shape() else {
            return Err(Error::Validation(format!(
                "tensor '{name}' has shape {:?}, expected [rows, dim]",
                view.shape()
            )));
        };
        let bytes = view.data();
        let data = match view.dtype() {
            Dtype::F32 => bytes
                .chunks_exact(4)
                .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
                .collect(),
            Dtype::F64 => bytes
                .chunks_exact(8)
                .map(|b| {
                    let mut buf = [0u8; 8];
                    buf.copy_from_slice(b);
                    f64::from_le_bytes(buf) as f32
                })
                .collect(),
            other => {
                return Err(Error::Validation(format!(
                    "tensor '{name}' has dtype {other:?}, expected F32 or F64"
                )))
            }
        };
        Self::new(*dim, data)
    }
}

/// Oracle backed by frozen entity/relation embeddings.
#[derive(Debug, Clone)]
pub struct EmbeddingOracle {
    scoring: ScoringFunction,
    entities: EmbeddingTable,
    relations: EmbeddingTable,
}

impl EmbeddingOracle {
    pub fn new(
        scoring: ScoringFunction,
        entities: EmbeddingTable,
        relations: EmbeddingTable,
    ) -> Result<Self> {
        if entities.dim() != relations.dim() {
            return Err(Error::Validation(format!(
                "entity dimension {} differs from relation dimension {}",
                entities.dim(),
                relations.dim()
            )));
        }
        if scoring.is_complex() && entities.dim() % 2 != 0 {
            return Err(Error::Validation(format!(
                "{scoring} needs an even embedding width, got {}",
                entities.dim()
            )));
        }
        Ok(Self {
            scoring,
            entities,
            relations,
        })
    }

    /// Load `entity_embeddings.weight` / `relation_embeddings.weight` from a
    /// safetensors file.
    pub fn from_safetensors(path: impl AsRef<Path>, scoring: ScoringFunction) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| Error::io(path, e))?;
        let tensors = SafeTensors::deserialize(&bytes)?;

        let entities = EmbeddingTable::from_view(&tensors, ENTITY_TENSOR)?;
        let relations = EmbeddingTable::from_view(&tensors, RELATION_TENSOR)?;
        debug!(
            path = %path.display(),
            entities = entities.rows(),
            relations = relations.rows(),
            dim = entities.dim(),
            "loaded embeddings"
        );
        Self::new(scoring, entities, relations)
    }

    pub fn scoring(&self) -> ScoringFunction {
        self.scoring
    }

    pub fn embedding_dim(&self) -> usize {
        self.entities.dim()
    }

    fn entity(&self, id: usize) -> Result<&[f32]> {
        self.entities.row(id).ok_or(Error::IdOutOfRange {
            kind: "entity",
            id,
            size: self.entities.rows(),
        })
    }

    fn relation(&self, id: usize) -> Result<&[f32]> {
        self.relations.row(id).ok_or(Error::IdOutOfRange {
            kind: "relation",
            id,
            size: self.relations.rows(),
        })
    }
}

impl ScoreOracle for EmbeddingOracle {
    fn num_entities(&self) -> usize {
        self.entities.rows()
    }

    fn num_relations(&self) -> usize {
        self.relations.rows()
    }

    fn score_all(&self, subject: usize, predicate: usize) -> Result<Vec<f32>> {
        let h = self.entity(subject)?;
        let r = self.relation(predicate)?;
        Ok(self
            .entities
            .iter_rows()
            .map(|t| sigmoid(self.scoring.score(h, r, t)))
            .collect())
    }

    fn score_triple(&self, subject: usize, predicate: usize, object: usize) -> Result<f32> {
        let h = self.entity(subject)?;
        let r = self.relation(predicate)?;
        let t = self.entity(object)?;
        Ok(sigmoid(self.scoring.score(h, r, t)))
    }
}
