//! Anchor priors, one (width, height) pair per box slot.

use crate::util::{YoloPostError, YoloPostResult};

/// Anchor priors of the tiny YOLOv2 model trained on Pascal VOC, in cells.
pub const TINY_YOLOV2_VOC_ANCHORS: [f32; 10] = [
    1.08, 1.19, 3.42, 4.41, 6.63, 11.38, 9.42, 5.11, 16.62, 10.52,
];

/// Fixed set of anchor priors, expressed in grid-cell units.
#[derive(Clone, Debug, PartialEq)]
pub struct AnchorSet {
    pairs: Vec<(f32, f32)>,
}

impl AnchorSet {
    /// Builds an anchor set from a flat `[w0, h0, w1, h1, ...]` list.
    pub fn from_flat(values: &[f32]) -> YoloPostResult<Self> {
        if values.is_empty() || values.len() % 2 != 0 {
            return Err(YoloPostError::AnchorCountMismatch {
                expected: values.len().div_ceil(2).max(1) * 2,
                got: values.len(),
            });
        }
        let pairs = values
            .chunks_exact(2)
            .map(|pair| (pair[0], pair[1]))
            .collect();
        Self::from_pairs(pairs)
    }

    /// Builds an anchor set from (width, height) pairs.
    pub fn from_pairs(pairs: Vec<(f32, f32)>) -> YoloPostResult<Self> {
        if pairs.is_empty() {
            return Err(YoloPostError::AnchorCountMismatch {
                expected: 2,
                got: 0,
            });
        }
        for (index, &(width, height)) in pairs.iter().enumerate() {
            let valid = width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0;
            if !valid {
                return Err(YoloPostError::InvalidAnchor {
                    index,
                    width,
                    height,
                });
            }
        }
        Ok(Self { pairs })
    }

    /// Anchors of the tiny YOLOv2 VOC model.
    pub fn tiny_yolov2_voc() -> Self {
        let pairs = TINY_YOLOV2_VOC_ANCHORS
            .chunks_exact(2)
            .map(|pair| (pair[0], pair[1]))
            .collect();
        Self { pairs }
    }

    /// Number of anchor boxes (B).
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Always false for a constructed set.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Returns the prior for box `box_index`.
    pub fn get(&self, box_index: usize) -> Option<(f32, f32)> {
        self.pairs.get(box_index).copied()
    }

    /// Iterates over (width, height) priors in box order.
    pub fn iter(&self) -> impl Iterator<Item = (f32, f32)> + '_ {
        self.pairs.iter().copied()
    }

    /// Flattens back to `[w0, h0, w1, h1, ...]`.
    pub fn to_flat(&self) -> Vec<f32> {
        self.pairs.iter().flat_map(|&(w, h)| [w, h]).collect()
    }
}
