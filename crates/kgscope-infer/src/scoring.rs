//! Scoring functions for knowledge graph embeddings.
//!
//! Complex-valued models (RotatE, ComplEx) store each embedding as a real
//! half followed by an imaginary half: `[re_0 .. re_{d-1}, im_0 .. im_{d-1}]`.
//! This is the layout the training framework writes, so rows can be scored
//! straight out of the weight file.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Common scoring functions for KGE models.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoringFunction {
    /// TransE: -||h + r - t||
    TransE,
    /// RotatE: -||h ∘ r - t|| (Complex space)
    RotatE,
    /// ComplEx: Re(<h, r, conj(t)>)
    ComplEx,
    /// DistMult: <h, r, t>
    DistMult,
}

impl ScoringFunction {
    /// Compute the raw compatibility logit for embeddings.
    ///
    /// Higher is more plausible. The value is unbounded; callers that need a
    /// probability apply [`sigmoid`](crate::sigmoid).
    pub fn score(&self, head: &[f32], relation: &[f32], tail: &[f32]) -> f32 {
        match self {
            Self::TransE => score_transe(head, relation, tail),
            Self::DistMult => score_distmult(head, relation, tail),
            Self::RotatE => score_rotate(head, relation, tail),
            Self::ComplEx => score_complex(head, relation, tail),
        }
    }

    /// Whether embeddings must have an even width (real + imaginary halves).
    pub fn is_complex(&self) -> bool {
        matches!(self, Self::RotatE | Self::ComplEx)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::TransE => "TransE",
            Self::RotatE => "RotatE",
            Self::ComplEx => "ComplEx",
            Self::DistMult => "DistMult",
        }
    }
}

impl fmt::Display for ScoringFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ScoringFunction {
    type Err = Error;

    /// Parse the `model` field of a training configuration.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "transe" => Ok(Self::TransE),
            "rotate" => Ok(Self::RotatE),
            "complex" => Ok(Self::ComplEx),
            "distmult" => Ok(Self::DistMult),
            _ => Err(Error::UnsupportedModel(s.to_string())),
        }
    }
}

/// TransE scoring: -||h + r - t||_2
fn score_transe(head: &[f32], relation: &[f32], tail: &[f32]) -> f32 {
    let sum_sq: f32 = head
        .iter()
        .zip(relation)
        .zip(tail)
        .map(|((h, r), t)| {
            let diff = h + r - t;
            diff * diff
        })
        .sum();
    -sum_sq.sqrt()
}

/// DistMult scoring: <h, r, t>
fn score_distmult(head: &[f32], relation: &[f32], tail: &[f32]) -> f32 {
    head.iter()
        .zip(relation)
        .zip(tail)
        .map(|((h, r), t)| h * r * t)
        .sum()
}

/// RotatE scoring: -||h ∘ r - t|| in complex space.
fn score_rotate(head: &[f32], relation: &[f32], tail: &[f32]) -> f32 {
    let dim = head.len() / 2;
    let (h_re, h_im) = head.split_at(dim);
    let (r_re, r_im) = relation.split_at(dim);
    let (t_re, t_im) = tail.split_at(dim);

    let mut sum_sq = 0.0;
    for i in 0..dim {
        // (a+bi)(c+di) = (ac-bd) + (ad+bc)i
        let rot_re = h_re[i] * r_re[i] - h_im[i] * r_im[i];
        let rot_im = h_re[i] * r_im[i] + h_im[i] * r_re[i];

        let diff_re = rot_re - t_re[i];
        let diff_im = rot_im - t_im[i];

        sum_sq += diff_re * diff_re + diff_im * diff_im;
    }
    -sum_sq.sqrt()
}

/// ComplEx scoring: Re(<h, r, conj(t)>).
fn score_complex(head: &[f32], relation: &[f32], tail: &[f32]) -> f32 {
    let dim = head.len() / 2;
    let (h_re, h_im) = head.split_at(dim);
    let (r_re, r_im) = relation.split_at(dim);
    let (t_re, t_im) = tail.split_at(dim);

    let mut score = 0.0;
    for i in 0..dim {
        // (h * r) = x + yi; Re((x + yi)(t_re - t_im i)) = x*t_re + y*t_im
        let x = h_re[i] * r_re[i] - h_im[i] * r_im[i];
        let y = h_re[i] * r_im[i] + h_im[i] * r_re[i];

        score += x * t_re[i] + y * t_im[i];
    }
    score
}
