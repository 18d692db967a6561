//! Per-class duplicate suppression (non-maximum suppression).
//!
//! Suppression runs independently for every class. For class `c` the
//! detections are ranked by `class_scores[c]` with a stable sort, then swept
//! once from the top: a detection survives unless its score is already zero
//! or a higher-ranked survivor overlaps it with IoU at or above the
//! threshold. Losers get `class_scores[c] = 0`; no detection is removed by
//! this step. [`compact`] is the separate, optional filtering pass.

mod order;

#[cfg(feature = "rayon")]
pub(crate) mod rayon;

pub use order::order_by_class_score;

use crate::detection::{iou, Detection};
use crate::trace::{trace_event, trace_span};
use crate::util::error::check_unit_threshold;
use crate::util::{YoloPostError, YoloPostResult};

/// Default IoU at or above which a lower-ranked box is suppressed.
pub const DEFAULT_IOU_THRESHOLD: f32 = 0.2;

/// Optional filtering applied after suppression.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Compaction {
    /// Keep every detection, including fully suppressed ones.
    #[default]
    None,
    /// Drop detections whose decode-time best class was zeroed.
    BestClass,
    /// Drop detections whose scores are zero for every class.
    AnyClass,
}

/// Configuration for duplicate suppression.
#[derive(Clone, Debug, PartialEq)]
pub struct NmsConfig {
    /// IoU in [0, 1] at or above which the lower-ranked box loses.
    pub iou_threshold: f32,
    /// Post-suppression filtering.
    pub compaction: Compaction,
    /// Suppress classes in parallel (requires the `rayon` feature; ignored
    /// otherwise).
    pub parallel: bool,
}

impl Default for NmsConfig {
    fn default() -> Self {
        Self {
            iou_threshold: DEFAULT_IOU_THRESHOLD,
            compaction: Compaction::None,
            parallel: false,
        }
    }
}

impl NmsConfig {
    /// Checks that the IoU threshold lies in [0, 1].
    pub fn validate(&self) -> YoloPostResult<()> {
        check_unit_threshold("iou_threshold", self.iou_threshold)
    }
}

/// Returns the indices whose score for `class_index` must be zeroed.
///
/// Reads only `class_scores[class_index]` and the rectangles, so separate
/// classes can be evaluated concurrently.
pub fn suppressed_for_class(
    detections: &[Detection],
    class_index: usize,
    iou_threshold: f32,
) -> Vec<usize> {
    let order = order_by_class_score(detections, class_index);
    let mut survivors: Vec<usize> = Vec::new();
    let mut suppressed = Vec::new();

    for idx in order {
        let score = detections[idx].class_score(class_index).unwrap_or(0.0);
        if score == 0.0 {
            continue;
        }
        let rect = &detections[idx].rect;
        let overlapped = survivors
            .iter()
            .any(|&kept| iou(&detections[kept].rect, rect) >= iou_threshold);
        if overlapped {
            suppressed.push(idx);
        } else {
            survivors.push(idx);
        }
    }

    suppressed
}

/// Zeroes duplicate scores in place for every class in `0..classes`.
///
/// Every detection must carry exactly `classes` scores. Returns the number
/// of scores that were zeroed. Empty input is a no-op.
pub fn suppress_duplicates(
    detections: &mut [Detection],
    classes: usize,
    config: &NmsConfig,
) -> YoloPostResult<usize> {
    config.validate()?;
    if let Some(det) = detections.iter().find(|d| d.num_classes() != classes) {
        return Err(YoloPostError::ClassCountMismatch {
            expected: classes,
            got: det.num_classes(),
        });
    }
    if detections.is_empty() {
        return Ok(0);
    }

    let _span = trace_span!(
        "suppress_duplicates",
        detections = detections.len(),
        classes = classes
    )
    .entered();

    #[cfg(feature = "rayon")]
    let per_class = if config.parallel {
        self::rayon::suppressed_per_class_par(detections, classes, config.iou_threshold)
    } else {
        suppressed_per_class(detections, classes, config.iou_threshold)
    };
    #[cfg(not(feature = "rayon"))]
    let per_class = suppressed_per_class(detections, classes, config.iou_threshold);

    let mut zeroed = 0usize;
    for (class_index, indices) in per_class.into_iter().enumerate() {
        for idx in indices {
            detections[idx].suppress_class(class_index);
            zeroed += 1;
        }
    }

    trace_event!("suppressed_scores", zeroed = zeroed);
    Ok(zeroed)
}

fn suppressed_per_class(
    detections: &[Detection],
    classes: usize,
    iou_threshold: f32,
) -> Vec<Vec<usize>> {
    (0..classes)
        .map(|class_index| suppressed_for_class(detections, class_index, iou_threshold))
        .collect()
}

/// Filters detections according to `mode`, preserving order.
pub fn compact(mut detections: Vec<Detection>, mode: Compaction) -> Vec<Detection> {
    let before = detections.len();
    match mode {
        Compaction::None => return detections,
        Compaction::BestClass => detections.retain(|d| d.best_score() > 0.0),
        Compaction::AnyClass => detections.retain(|d| !d.is_fully_suppressed()),
    }
    trace_event!("compacted", before = before, after = detections.len());
    detections
}

/// Suppression stage bound to a class count and configuration.
#[derive(Clone, Debug)]
pub struct DuplicateSuppressor {
    classes: usize,
    config: NmsConfig,
}

impl DuplicateSuppressor {
    /// Creates a suppressor for `classes` classes with default settings.
    pub fn new(classes: usize) -> Self {
        Self {
            classes,
            config: NmsConfig::default(),
        }
    }

    /// Replaces the configuration.
    pub fn with_config(mut self, config: NmsConfig) -> Self {
        self.config = config;
        self
    }

    /// Active configuration.
    pub fn config(&self) -> &NmsConfig {
        &self.config
    }

    /// Suppresses duplicates and applies the configured compaction.
    pub fn run(&self, mut detections: Vec<Detection>) -> YoloPostResult<Vec<Detection>> {
        suppress_duplicates(&mut detections, self.classes, &self.config)?;
        Ok(compact(detections, self.config.compaction))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::Rect;

    fn det(rect: Rect, class_index: usize, score: f32) -> Detection {
        let mut scores = vec![0.0; 3];
        scores[class_index] = score;
        Detection::new(rect, scores).unwrap()
    }

    #[test]
    fn chain_of_overlaps_is_resolved_greedily() {
        // a overlaps b, b overlaps c, a does not overlap c: b loses to a,
        // so c survives.
        let a = det(Rect::new(0.0, 0.0, 10.0, 10.0), 0, 0.9);
        let b = det(Rect::new(6.0, 0.0, 10.0, 10.0), 0, 0.8);
        let c = det(Rect::new(12.0, 0.0, 10.0, 10.0), 0, 0.7);
        let mut detections = vec![c, b, a];

        let zeroed = suppress_duplicates(&mut detections, 3, &NmsConfig::default()).unwrap();
        assert_eq!(zeroed, 1);
        assert_eq!(detections[0].best_score(), 0.7);
        assert_eq!(detections[1].best_score(), 0.0);
        assert_eq!(detections[2].best_score(), 0.9);
    }

    #[test]
    fn equal_scores_keep_first_in_decode_order() {
        let rect = Rect::new(0.0, 0.0, 4.0, 4.0);
        let mut detections = vec![det(rect, 1, 0.5), det(rect, 1, 0.5)];
        suppress_duplicates(&mut detections, 3, &NmsConfig::default()).unwrap();
        assert_eq!(detections[0].best_score(), 0.5);
        assert_eq!(detections[1].best_score(), 0.0);
    }

    #[test]
    fn class_count_mismatch_is_reported() {
        let mut detections = vec![det(Rect::new(0.0, 0.0, 1.0, 1.0), 0, 0.5)];
        let err = suppress_duplicates(&mut detections, 4, &NmsConfig::default()).unwrap_err();
        assert_eq!(
            err,
            YoloPostError::ClassCountMismatch {
                expected: 4,
                got: 3
            }
        );
    }

    #[test]
    fn compaction_modes_filter_as_documented() {
        let rect = Rect::new(0.0, 0.0, 4.0, 4.0);
        let mut partial = Detection::new(rect, vec![0.6, 0.2, 0.0]).unwrap();
        partial.suppress_class(0);
        let mut gone = det(rect, 2, 0.4);
        gone.suppress_class(2);
        let kept = det(rect, 1, 0.3);

        let all = vec![partial, gone, kept];
        assert_eq!(compact(all.clone(), Compaction::None).len(), 3);
        assert_eq!(compact(all.clone(), Compaction::BestClass).len(), 1);
        assert_eq!(compact(all, Compaction::AnyClass).len(), 2);
    }

    #[test]
    fn suppressor_runs_with_compaction() {
        let rect = Rect::new(0.0, 0.0, 4.0, 4.0);
        let suppressor = DuplicateSuppressor::new(3).with_config(NmsConfig {
            compaction: Compaction::AnyClass,
            ..NmsConfig::default()
        });
        let out = suppressor
            .run(vec![det(rect, 0, 0.9), det(rect, 0, 0.8)])
            .unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].best_score(), 0.9);
    }
}
