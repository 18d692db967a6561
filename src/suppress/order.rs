//! Per-class ranking of detections.

use crate::detection::Detection;

/// Indices of `detections` ordered by descending score for `class_index`.
///
/// The sort is stable, so equal scores keep their decode order and the
/// earlier detection wins ties during suppression. Scores are compared with
/// `total_cmp`; a detection without that class sorts as zero.
pub fn order_by_class_score(detections: &[Detection], class_index: usize) -> Vec<usize> {
    let score = |idx: usize| detections[idx].class_score(class_index).unwrap_or(0.0);
    let mut order: Vec<usize> = (0..detections.len()).collect();
    order.sort_by(|&a, &b| score(b).total_cmp(&score(a)));
    order
}
