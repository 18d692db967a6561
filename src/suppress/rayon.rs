//! Class-parallel suppression (feature-gated).

use crate::detection::Detection;
use crate::suppress::suppressed_for_class;
use rayon::prelude::*;

/// Evaluates every class concurrently; results are returned in class order.
pub(crate) fn suppressed_per_class_par(
    detections: &[Detection],
    classes: usize,
    iou_threshold: f32,
) -> Vec<Vec<usize>> {
    (0..classes)
        .into_par_iter()
        .map(|class_index| suppressed_for_class(detections, class_index, iou_threshold))
        .collect()
}
