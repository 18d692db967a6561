//! Decoded detections.
//!
//! A [`Detection`] owns a per-class score vector whose length is fixed at
//! construction. Suppression zeroes individual entries in place instead of
//! dropping the detection, because a box suppressed for one class may still
//! be the best box for another. The best class is computed once, from the
//! pre-suppression scores, so consumers must re-read [`Detection::best_score`]
//! after suppression.

mod rect;

pub use rect::{iou, Rect};

use crate::util::math::argmax;
use crate::util::{YoloPostError, YoloPostResult};

/// Grid slot a detection was decoded from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct SlotIndex {
    /// Grid column.
    pub cell_x: usize,
    /// Grid row.
    pub cell_y: usize,
    /// Anchor box index within the cell.
    pub box_index: usize,
}

/// One detected box with per-class confidences.
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    /// Box in the coordinate space chosen at decode time.
    pub rect: Rect,
    class_scores: Vec<f32>,
    best_class_index: usize,
    objectness: f32,
    slot: SlotIndex,
}

impl Detection {
    /// Creates a detection from a rectangle and its per-class scores.
    ///
    /// Scores must be non-empty and lie in [0, 1]; the best class is the
    /// highest score, ties going to the lowest index. Objectness defaults to
    /// the best score.
    pub fn new(rect: Rect, class_scores: Vec<f32>) -> YoloPostResult<Self> {
        let (best_class_index, best) = argmax(&class_scores).ok_or(
            YoloPostError::ClassCountMismatch {
                expected: 1,
                got: 0,
            },
        )?;
        if let Some(&value) = class_scores.iter().find(|v| !(0.0..=1.0).contains(*v)) {
            return Err(YoloPostError::InvalidThreshold {
                name: "class score",
                value,
            });
        }
        Ok(Self {
            rect,
            class_scores,
            best_class_index,
            objectness: best,
            slot: SlotIndex::default(),
        })
    }

    /// Assembles a decoded detection; scores are already validated by the
    /// score decoder.
    pub(crate) fn from_decoded(
        rect: Rect,
        class_scores: Vec<f32>,
        best_class_index: usize,
        objectness: f32,
        slot: SlotIndex,
    ) -> Self {
        debug_assert!(best_class_index < class_scores.len());
        Self {
            rect,
            class_scores,
            best_class_index,
            objectness,
            slot,
        }
    }

    /// Sets the grid slot this detection came from.
    pub fn with_slot(mut self, slot: SlotIndex) -> Self {
        self.slot = slot;
        self
    }

    /// Per-class scores (objectness x class probability).
    pub fn class_scores(&self) -> &[f32] {
        &self.class_scores
    }

    /// Score for class `class_index`, or `None` if out of range.
    pub fn class_score(&self, class_index: usize) -> Option<f32> {
        self.class_scores.get(class_index).copied()
    }

    /// Number of classes (N).
    pub fn num_classes(&self) -> usize {
        self.class_scores.len()
    }

    /// Best class at decode time.
    pub fn best_class_index(&self) -> usize {
        self.best_class_index
    }

    /// Current score of the decode-time best class; zero once suppressed.
    pub fn best_score(&self) -> f32 {
        self.class_scores[self.best_class_index]
    }

    /// Largest current score over all classes.
    pub fn max_score(&self) -> f32 {
        self.class_scores.iter().copied().fold(0.0, f32::max)
    }

    /// Sigmoid of the raw objectness logit.
    pub fn objectness(&self) -> f32 {
        self.objectness
    }

    /// Grid slot of origin.
    pub fn slot(&self) -> SlotIndex {
        self.slot
    }

    /// True if the best-class score is strictly above `threshold`.
    pub fn is_confident(&self, threshold: f32) -> bool {
        self.best_score() > threshold
    }

    /// True once every class score has been zeroed.
    pub fn is_fully_suppressed(&self) -> bool {
        self.class_scores.iter().all(|&v| v == 0.0)
    }

    pub(crate) fn suppress_class(&mut self, class_index: usize) {
        if let Some(score) = self.class_scores.get_mut(class_index) {
            *score = 0.0;
        }
    }
}
