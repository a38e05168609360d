//! Inference over pretrained knowledge graph embeddings.
//!
//! A trained model answers two questions about a triple `(s, p, o)`:
//!
//! - **Scoring**: how plausible is `(s, p, o)`? One value in `[0, 1]`.
//! - **Completion**: which `o` best completes `(s, p, ?)`? Every entity is
//!   scored ("k-vs-all") and the best `k` are returned.
//!
//! ## Pipeline
//!
//! ```text
//! names ──Resolver──▶ ids ──ScoreOracle──▶ scores ──rank──▶ top-k table
//! ```
//!
//! | Stage | Type | Fails with |
//! |-------|------|------------|
//! | Lookup | [`Vocabulary`], [`Resolver`] | [`Error::UnresolvedName`] |
//! | Scoring | [`ScoreOracle`] (e.g. [`EmbeddingOracle`]) | [`Error::IdOutOfRange`] |
//! | Ranking | [`rank`] | never |
//!
//! Scores are the logistic sigmoid of the scoring function's logit. Ranking
//! is descending by score; equal scores keep ascending entity-id order.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use kgscope_infer::{DeployConfig, Experiment, PredictRequest};
//!
//! let experiment = Experiment::load("Experiments/2022-03-09", DeployConfig::default())?;
//! let prediction = experiment
//!     .predictor
//!     .predict(&PredictRequest::new("einstein", "won", ""), &mut rand::thread_rng())?;
//! for row in &prediction.results {
//!     println!("{} {:.3}", row.entity, row.display_score());
//! }
//! ```

mod error;
mod experiment;
mod oracle;
mod predictor;
mod ranking;
mod resolver;
mod scoring;
mod vocab;

pub use error::{Error, Result, Role};
pub use experiment::{
    DeployConfig, Experiment, TrainingConfiguration, CONFIGURATION_FILE, ENTITY_VOCAB_STEM,
    RELATION_VOCAB_STEM, WEIGHTS_FILE,
};
pub use oracle::{
    sigmoid, EmbeddingOracle, EmbeddingTable, ScoreOracle, ENTITY_TENSOR, RELATION_TENSOR,
};
pub use predictor::{PredictRequest, Prediction, Predictor, DEFAULT_TOP_K};
pub use ranking::{compare_ranked, rank, round3, top_k_ids, LinkPrediction};
pub use resolver::{NamedTriple, ResolvedTriple, Resolver};
pub use scoring::ScoringFunction;
pub use vocab::{Vocabulary, VOCAB_EXTENSIONS};
