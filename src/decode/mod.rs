//! Grid decoding: raw output tensor to raw detections.
//!
//! [`GridDecoder`] walks every (cell, box) slot in row-major cell order, then
//! box order, and turns each sufficiently confident slot into a
//! [`Detection`]. Slots whose objectness falls below the discard threshold are
//! skipped before the softmax is evaluated; this only saves work and never
//! changes which detections come out.

pub mod geometry;
pub mod score;

#[cfg(feature = "rayon")]
pub(crate) mod rayon;

use crate::detection::{Detection, SlotIndex};
use crate::layout::{CoordinateSpace, GridLayout};
use crate::output::{OutputView, SlotRecord};
use crate::trace::{trace_debug, trace_event, trace_span};
use crate::util::error::check_unit_threshold;
use crate::util::{YoloPostError, YoloPostResult};

use geometry::decode_rect_in;
use score::{decode_class_scores, decode_objectness};

/// Default objectness below which a slot is discarded.
pub const DEFAULT_DISCARD_THRESHOLD: f32 = 0.1;

/// Which value is compared against the discard threshold.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DiscardRule {
    /// Discard when `sigmoid(objectness) < threshold`.
    #[default]
    Objectness,
    /// Additionally discard when the best weighted class score is below the
    /// threshold. Implies the objectness rule, since no class score can
    /// exceed objectness.
    BestClassScore,
}

/// Configuration for grid decoding.
#[derive(Clone, Debug, PartialEq)]
pub struct DecodeConfig {
    /// Threshold in [0, 1] applied according to `discard_rule`.
    pub discard_threshold: f32,
    /// Value the threshold is compared against.
    pub discard_rule: DiscardRule,
    /// Coordinate space of the decoded rectangles.
    pub coordinate_space: CoordinateSpace,
    /// Decode grid rows in parallel (requires the `rayon` feature; ignored
    /// otherwise).
    pub parallel: bool,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            discard_threshold: DEFAULT_DISCARD_THRESHOLD,
            discard_rule: DiscardRule::Objectness,
            coordinate_space: CoordinateSpace::Pixels,
            parallel: false,
        }
    }
}

impl DecodeConfig {
    /// Checks that the threshold lies in [0, 1].
    pub fn validate(&self) -> YoloPostResult<()> {
        check_unit_threshold("discard_threshold", self.discard_threshold)
    }
}

/// Decodes output tensors laid out according to a [`GridLayout`].
#[derive(Clone, Debug)]
pub struct GridDecoder {
    layout: GridLayout,
    config: DecodeConfig,
}

impl GridDecoder {
    /// Creates a decoder with the default configuration.
    pub fn new(layout: GridLayout) -> Self {
        Self {
            layout,
            config: DecodeConfig::default(),
        }
    }

    /// Replaces the decode configuration.
    pub fn with_config(mut self, config: DecodeConfig) -> Self {
        self.config = config;
        self
    }

    /// Layout this decoder expects.
    pub fn layout(&self) -> &GridLayout {
        &self.layout
    }

    /// Active configuration.
    pub fn config(&self) -> &DecodeConfig {
        &self.config
    }

    /// Decodes a flat output buffer.
    ///
    /// Fails with `BufferLengthMismatch` before any slot is read when `output`
    /// does not match the layout.
    pub fn decode(&self, output: &[f32]) -> YoloPostResult<Vec<Detection>> {
        self.config.validate()?;
        let view = OutputView::new(output, &self.layout)?;
        self.decode_view(view)
    }

    /// Decodes an already validated view.
    ///
    /// The view must have been built against this decoder's layout.
    pub fn decode_view(&self, view: OutputView<'_>) -> YoloPostResult<Vec<Detection>> {
        if view.layout() != &self.layout {
            return Err(YoloPostError::InvalidLayout {
                reason: "output view layout differs from the decoder layout",
            });
        }
        let _span = trace_span!(
            "grid_decode",
            grid_width = self.layout.grid_width(),
            grid_height = self.layout.grid_height(),
            boxes = self.layout.boxes_per_cell(),
            classes = self.layout.classes()
        )
        .entered();

        #[cfg(feature = "rayon")]
        let detections = if self.config.parallel {
            self::rayon::decode_rows_par(self, view)
        } else {
            self.decode_sequential(view)
        };
        #[cfg(not(feature = "rayon"))]
        let detections = self.decode_sequential(view);

        trace_event!(
            "decoded_slots",
            kept = detections.len(),
            discarded = self.layout.slot_count().saturating_sub(detections.len())
        );
        Ok(detections)
    }

    fn decode_sequential(&self, view: OutputView<'_>) -> Vec<Detection> {
        view.slots().filter_map(|slot| self.decode_slot(slot)).collect()
    }

    #[cfg_attr(not(feature = "rayon"), allow(dead_code))]
    pub(crate) fn decode_row(&self, view: OutputView<'_>, cell_y: usize) -> Vec<Detection> {
        view.row_slots(cell_y)
            .filter_map(|slot| self.decode_slot(slot))
            .collect()
    }

    /// Decodes a single slot, or returns `None` if it is discarded.
    ///
    /// A `NaN` objectness is treated as below any threshold. Slots whose class
    /// count or box index does not fit this decoder's layout yield `None`.
    pub fn decode_slot(&self, slot: SlotRecord<'_>) -> Option<Detection> {
        if slot.class_logits().len() != self.layout.classes() {
            return None;
        }
        let threshold = self.config.discard_threshold;
        let objectness = decode_objectness(slot.objectness_logit());
        if objectness.is_nan() || objectness < threshold {
            return None;
        }

        let scores = decode_class_scores(objectness, slot.class_logits())?;
        if self.config.discard_rule == DiscardRule::BestClassScore
            && scores.best_score < threshold
        {
            return None;
        }

        let rect = decode_rect_in(
            slot.coords(),
            slot.cell_x,
            slot.cell_y,
            slot.box_index,
            &self.layout,
            self.config.coordinate_space,
        )?;
        trace_debug!(
            cell_x = slot.cell_x,
            cell_y = slot.cell_y,
            box_index = slot.box_index,
            objectness,
            best_class = scores.best_class_index,
            "decoded slot"
        );

        Some(Detection::from_decoded(
            rect,
            scores.scores,
            scores.best_class_index,
            objectness,
            SlotIndex {
                cell_x: slot.cell_x,
                cell_y: slot.cell_y,
                box_index: slot.box_index,
            },
        ))
    }
}
