//! Top-k ranking of per-entity scores.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::vocab::Vocabulary;

/// Result of link prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkPrediction {
    /// Entity label.
    pub entity: String,
    /// Score in [0, 1] (higher = more plausible), full precision.
    pub score: f32,
    /// Rank (1 = best).
    pub rank: usize,
}

impl LinkPrediction {
    /// Score rounded to 3 decimals, for display only.
    pub fn display_score(&self) -> f32 {
        round3(self.score)
    }
}

pub fn round3(score: f32) -> f32 {
    (score * 1000.0).round() / 1000.0
}

/// Order `(entity_id, score)` pairs best-first.
///
/// Higher score first; equal scores by ascending entity id; NaN after every
/// number.
pub fn compare_ranked(a: (usize, f32), b: (usize, f32)) -> Ordering {
    let by_score = match (a.1.is_nan(), b.1.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal),
    };
    by_score.then_with(|| a.0.cmp(&b.0))
}

/// Ids of the `k` best scores, best-first. `k` is clamped to `scores.len()`.
pub fn top_k_ids(scores: &[f32], k: usize) -> Vec<(usize, f32)> {
    let mut ranked: Vec<(usize, f32)> = scores.iter().copied().enumerate().collect();
    ranked.sort_unstable_by(|&a, &b| compare_ranked(a, b));
    ranked.truncate(k);
    ranked
}

/// Attach names to the `k` best scores.
///
/// Requires `scores.len() <= entities.len()` (one score per entity id, as
/// [`Predictor`](crate::Predictor) guarantees); the result then has exactly
/// `min(k, scores.len())` rows.
pub fn rank(scores: &[f32], entities: &Vocabulary, k: usize) -> Vec<LinkPrediction> {
    debug_assert!(
        scores.len() <= entities.len(),
        "{} scores for {} entities",
        scores.len(),
        entities.len()
    );
    top_k_ids(scores, k)
        .into_iter()
        .filter_map(|(id, score)| entities.name(id).map(|name| (name, score)))
        .enumerate()
        .map(|(i, (name, score))| LinkPrediction {
            entity: name.to_string(),
            score,
            rank: i + 1,
        })
        .collect()
}
