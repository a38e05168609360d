//! Loading a trained experiment folder for inference.
//!
//! A folder written by the training framework contains:
//!
//! ```text
//! configuration.json          training settings, `model` names the scorer
//! model.safetensors           entity_embeddings.weight, relation_embeddings.weight
//! entity_to_idx.gzip          entity name -> id (parquet; .parquet/.json also accepted)
//! relation_to_idx.gzip        relation name -> id
//! ```

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Error, Result};
use crate::oracle::EmbeddingOracle;
use crate::predictor::{Predictor, DEFAULT_TOP_K};
use crate::scoring::ScoringFunction;
use crate::vocab::Vocabulary;

pub const CONFIGURATION_FILE: &str = "configuration.json";
pub const WEIGHTS_FILE: &str = "model.safetensors";
pub const ENTITY_VOCAB_STEM: &str = "entity_to_idx";
pub const RELATION_VOCAB_STEM: &str = "relation_to_idx";

/// Subset of `configuration.json` needed at inference time.
///
/// Unknown keys are kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfiguration {
    pub model: String,
    #[serde(default)]
    pub embedding_dim: Option<usize>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl TrainingConfiguration {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| Error::io(path, e))?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    pub fn scoring_function(&self) -> Result<ScoringFunction> {
        self.model.parse()
    }
}

/// Runtime settings layered over the training configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeployConfig {
    pub top_k: usize,
    /// Listen on every interface instead of loopback only.
    pub share: bool,
    pub port: u16,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            share: false,
            port: 7860,
        }
    }
}

/// An experiment folder opened for serving.
#[derive(Debug)]
pub struct Experiment {
    pub path: PathBuf,
    pub training: TrainingConfiguration,
    pub deploy: DeployConfig,
    pub predictor: Arc<Predictor>,
}

impl Experiment {
    /// Read configuration, vocabularies and weights from `path`.
    pub fn load(path: impl AsRef<Path>, deploy: DeployConfig) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_dir() {
            return Err(Error::NotFound(format!(
                "experiment folder {}",
                path.display()
            )));
        }

        let training = TrainingConfiguration::from_file(path.join(CONFIGURATION_FILE))?;
        let scoring = training.scoring_function()?;

        let entities = Vocabulary::load(path, ENTITY_VOCAB_STEM, "entity")?;
        let relations = Vocabulary::load(path, RELATION_VOCAB_STEM, "relation")?;

        let weights = path.join(WEIGHTS_FILE);
        if !weights.is_file() {
            return Err(Error::NotFound(weights.display().to_string()));
        }
        let oracle = EmbeddingOracle::from_safetensors(&weights, scoring)?;
        if let Some(dim) = training.embedding_dim {
            // complex models store 2 * embedding_dim floats per row
            let expected = if scoring.is_complex() { 2 * dim } else { dim };
            if oracle.embedding_dim() != expected && oracle.embedding_dim() != dim {
                return Err(Error::Validation(format!(
                    "configuration embedding_dim {dim} does not match weights of width {}",
                    oracle.embedding_dim()
                )));
            }
        }

        let predictor = Predictor::new(entities, relations, Arc::new(oracle), deploy.top_k)?;
        info!(
            model = %training.model,
            entities = predictor.entities().len(),
            relations = predictor.relations().len(),
            "experiment loaded"
        );

        Ok(Self {
            path: path.to_path_buf(),
            training,
            deploy,
            predictor: Arc::new(predictor),
        })
    }

    /// Page title, `<model> Deployment`.
    pub fn title(&self) -> String {
        format!("{} Deployment", self.training.model)
    }
}
