//! Request -> resolved triple -> scores -> ranked table.

use std::fmt;
use std::sync::Arc;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::oracle::ScoreOracle;
use crate::ranking::{rank, LinkPrediction};
use crate::resolver::{NamedTriple, ResolvedTriple, Resolver};
use crate::vocab::Vocabulary;

/// Default number of ranked entities returned.
pub const DEFAULT_TOP_K: usize = 25;

/// One user query.
///
/// With `random` set, the three names are ignored and a subject/predicate
/// pair is drawn from the vocabularies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictRequest {
    pub subject: String,
    pub predicate: String,
    /// Empty to rank every entity.
    pub object: String,
    pub random: bool,
    /// Overrides the predictor's `top_k` for this request.
    pub top_k: Option<usize>,
}

impl PredictRequest {
    pub fn new(
        subject: impl Into<String>,
        predicate: impl Into<String>,
        object: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
            ..Self::default()
        }
    }

    pub fn random() -> Self {
        Self {
            random: true,
            ..Self::default()
        }
    }
}

/// Answer to a [`PredictRequest`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    /// The triple that was scored, in name form.
    pub query: NamedTriple,
    /// Best-first. A single row when the query named an object.
    pub results: Vec<LinkPrediction>,
}

impl Prediction {
    /// `( s, p, o )` or `( s, p, ? )`.
    pub fn label(&self) -> String {
        self.query.to_string()
    }
}

/// Shared, read-only inference state.
pub struct Predictor {
    entities: Vocabulary,
    relations: Vocabulary,
    oracle: Arc<dyn ScoreOracle>,
    top_k: usize,
}

impl fmt::Debug for Predictor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Predictor")
            .field("entities", &self.entities.len())
            .field("relations", &self.relations.len())
            .field("top_k", &self.top_k)
            .finish_non_exhaustive()
    }
}

impl Predictor {
    /// Check that the vocabularies are non-empty and match the oracle.
    pub fn new(
        entities: Vocabulary,
        relations: Vocabulary,
        oracle: Arc<dyn ScoreOracle>,
        top_k: usize,
    ) -> Result<Self> {
        if entities.is_empty() || relations.is_empty() {
            return Err(Error::Validation(format!(
                "empty vocabulary ({} entities, {} relations)",
                entities.len(),
                relations.len()
            )));
        }
        if oracle.num_entities() != entities.len() {
            return Err(Error::Validation(format!(
                "model scores {} entities but the vocabulary has {}",
                oracle.num_entities(),
                entities.len()
            )));
        }
        if oracle.num_relations() != relations.len() {
            return Err(Error::Validation(format!(
                "model has {} relations but the vocabulary has {}",
                oracle.num_relations(),
                relations.len()
            )));
        }
        Ok(Self {
            entities,
            relations,
            oracle,
            top_k,
        })
    }

    pub fn entities(&self) -> &Vocabulary {
        &self.entities
    }

    pub fn relations(&self) -> &Vocabulary {
        &self.relations
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub fn resolver(&self) -> Resolver<'_> {
        Resolver::new(&self.entities, &self.relations)
    }

    /// Answer one request.
    ///
    /// Names are resolved before the oracle is consulted, so an
    /// [`Error::UnresolvedName`] never costs a forward pass.
    pub fn predict<R: Rng + ?Sized>(
        &self,
        request: &PredictRequest,
        rng: &mut R,
    ) -> Result<Prediction> {
        let k = request.top_k.unwrap_or(self.top_k);
        let (query, resolved) = if request.random {
            self.resolver()
                .sample(rng)
                .ok_or_else(|| Error::Validation("empty vocabulary".into()))?
        } else {
            let resolved =
                self.resolver()
                    .resolve(&request.subject, &request.predicate, &request.object)?;
            let query = NamedTriple {
                subject: request.subject.clone(),
                predicate: request.predicate.clone(),
                object: resolved.object.map(|_| request.object.clone()),
            };
            (query, resolved)
        };
        debug!(query = %query, "scoring");

        let results = self.score(&query, resolved, k)?;
        Ok(Prediction { query, results })
    }

    fn score(
        &self,
        query: &NamedTriple,
        resolved: ResolvedTriple,
        k: usize,
    ) -> Result<Vec<LinkPrediction>> {
        match (resolved.object, &query.object) {
            (Some(object), Some(name)) => {
                let score = self
                    .oracle
                    .score_triple(resolved.subject, resolved.predicate, object)?;
                Ok(vec![LinkPrediction {
                    entity: name.clone(),
                    score,
                    rank: 1,
                }])
            }
            _ => {
                let scores = self.oracle.score_all(resolved.subject, resolved.predicate)?;
                Ok(rank(&scores, &self.entities, k))
            }
        }
    }
}
