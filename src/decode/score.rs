//! Objectness and class score decoding.

use crate::util::math::{argmax, sigmoid, softmax_in_place};

/// Per-class scores for one slot together with the winning class.
#[derive(Clone, Debug, PartialEq)]
pub struct ClassScores {
    /// `objectness * softmax(logits)[i]` for each class.
    pub scores: Vec<f32>,
    /// Index of the highest score, lowest index on ties.
    pub best_class_index: usize,
    /// Value at `best_class_index`.
    pub best_score: f32,
}

/// Objectness probability from its raw logit.
#[inline]
pub fn decode_objectness(logit: f32) -> f32 {
    sigmoid(logit)
}

/// Numerically stable softmax over the class logits.
pub fn class_probabilities(logits: &[f32]) -> Vec<f32> {
    let mut probs = logits.to_vec();
    softmax_in_place(&mut probs);
    probs
}

/// Weights the class probabilities by `objectness` and picks the best class.
///
/// Returns `None` when `logits` is empty.
pub fn decode_class_scores(objectness: f32, logits: &[f32]) -> Option<ClassScores> {
    let mut scores = class_probabilities(logits);
    for score in scores.iter_mut() {
        *score *= objectness;
    }
    let (best_class_index, best_score) = argmax(&scores)?;
    Some(ClassScores {
        scores,
        best_class_index,
        best_score,
    })
}
