//! Geometry of the detector output tensor.
//!
//! A [`GridLayout`] fixes everything about the flat output buffer that does
//! not change between frames: the grid size in cells, the anchor priors (one
//! per box slot), the number of classes and the cell size used to map cell
//! units back to network-input pixels. The buffer is row-major over cells,
//! then box index, then the per-box record
//! `[tx, ty, tw, th, objectness, class_0 .. class_{N-1}]`.

mod anchors;

pub use anchors::{AnchorSet, TINY_YOLOV2_VOC_ANCHORS};

use crate::util::{YoloPostError, YoloPostResult};

/// Number of leading values in a per-box record before the class logits.
pub const BOX_HEADER_LEN: usize = 5;
/// Offset of the objectness logit inside a per-box record.
pub const OBJECTNESS_OFFSET: usize = 4;

/// Pascal VOC class count used by the tiny YOLOv2 preset.
pub const VOC_CLASSES: usize = 20;

/// Coordinate convention for decoded rectangles.
///
/// `Pixels` is network-input pixel space: origin at the top-left of the
/// network input, y growing downward, one unit per input pixel.
/// `Normalized` divides x and width by the input width and y and height by the
/// input height, so the network input spans [0, 1] on both axes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CoordinateSpace {
    #[default]
    Pixels,
    Normalized,
}

/// Immutable description of a detector's output grid.
#[derive(Clone, Debug, PartialEq)]
pub struct GridLayout {
    grid_width: usize,
    grid_height: usize,
    classes: usize,
    anchors: AnchorSet,
    cell_size: f32,
}

impl GridLayout {
    /// Creates a layout with an explicit cell size in input pixels.
    ///
    /// The number of boxes per cell is taken from `anchors`.
    pub fn new(
        grid_width: usize,
        grid_height: usize,
        classes: usize,
        anchors: AnchorSet,
        cell_size: f32,
    ) -> YoloPostResult<Self> {
        if grid_width == 0 || grid_height == 0 {
            return Err(YoloPostError::InvalidLayout {
                reason: "grid dimensions must be > 0",
            });
        }
        if classes == 0 {
            return Err(YoloPostError::InvalidLayout {
                reason: "class count must be > 0",
            });
        }
        if anchors.is_empty() {
            return Err(YoloPostError::InvalidLayout {
                reason: "at least one anchor box per cell is required",
            });
        }
        if !cell_size.is_finite() || cell_size <= 0.0 {
            return Err(YoloPostError::InvalidLayout {
                reason: "cell size must be finite and > 0",
            });
        }

        let layout = Self {
            grid_width,
            grid_height,
            classes,
            anchors,
            cell_size,
        };
        layout.checked_expected_len()?;
        Ok(layout)
    }

    /// Creates a layout whose cell size is `input_resolution / grid_width`.
    ///
    /// The input is assumed square, so `grid_width` and `grid_height` must
    /// divide it into the same cell size.
    pub fn from_input_resolution(
        grid_width: usize,
        grid_height: usize,
        classes: usize,
        anchors: AnchorSet,
        input_resolution: usize,
    ) -> YoloPostResult<Self> {
        if grid_width == 0 || grid_height == 0 {
            return Err(YoloPostError::InvalidLayout {
                reason: "grid dimensions must be > 0",
            });
        }
        if input_resolution % grid_width != 0 || input_resolution % grid_height != 0 {
            return Err(YoloPostError::InvalidLayout {
                reason: "input resolution must be a multiple of the grid dimensions",
            });
        }
        if grid_width != grid_height {
            return Err(YoloPostError::InvalidLayout {
                reason: "square input requires a square grid; set cell_size for non-square grids",
            });
        }
        let cell_size = (input_resolution / grid_width) as f32;
        Self::new(grid_width, grid_height, classes, anchors, cell_size)
    }

    /// Tiny YOLOv2 on Pascal VOC: 13x13 grid, 5 boxes, 20 classes, 416 input.
    pub fn tiny_yolov2_voc() -> Self {
        Self {
            grid_width: 13,
            grid_height: 13,
            classes: VOC_CLASSES,
            anchors: AnchorSet::tiny_yolov2_voc(),
            cell_size: 32.0,
        }
    }

    /// Grid width in cells.
    pub fn grid_width(&self) -> usize {
        self.grid_width
    }

    /// Grid height in cells.
    pub fn grid_height(&self) -> usize {
        self.grid_height
    }

    /// Anchor boxes per cell (B).
    pub fn boxes_per_cell(&self) -> usize {
        self.anchors.len()
    }

    /// Number of classes (N).
    pub fn classes(&self) -> usize {
        self.classes
    }

    /// Anchor priors in cell units.
    pub fn anchors(&self) -> &AnchorSet {
        &self.anchors
    }

    /// Cell size in network-input pixels.
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Network input width in pixels.
    pub fn input_width(&self) -> f32 {
        self.grid_width as f32 * self.cell_size
    }

    /// Network input height in pixels.
    pub fn input_height(&self) -> f32 {
        self.grid_height as f32 * self.cell_size
    }

    /// Floats per box record: 4 coordinates, objectness, N class logits.
    pub fn record_len(&self) -> usize {
        BOX_HEADER_LEN + self.classes
    }

    /// Total number of (cell, box) slots.
    pub fn slot_count(&self) -> usize {
        self.grid_width * self.grid_height * self.boxes_per_cell()
    }

    /// Expected output buffer length in floats.
    pub fn expected_len(&self) -> usize {
        self.slot_count() * self.record_len()
    }

    /// Offset of the record for cell `(cell_y, cell_x)` and box `box_index`.
    pub fn slot_offset(&self, cell_y: usize, cell_x: usize, box_index: usize) -> usize {
        debug_assert!(cell_y < self.grid_height);
        debug_assert!(cell_x < self.grid_width);
        debug_assert!(box_index < self.boxes_per_cell());
        ((cell_y * self.grid_width + cell_x) * self.boxes_per_cell() + box_index)
            * self.record_len()
    }

    /// Fails with `BufferLengthMismatch` unless `len` matches the layout.
    pub fn check_buffer_len(&self, len: usize) -> YoloPostResult<()> {
        let expected = self.expected_len();
        if len != expected {
            return Err(YoloPostError::BufferLengthMismatch { expected, got: len });
        }
        Ok(())
    }

    fn checked_expected_len(&self) -> YoloPostResult<usize> {
        self.grid_width
            .checked_mul(self.grid_height)
            .and_then(|v| v.checked_mul(self.boxes_per_cell()))
            .and_then(|v| v.checked_mul(BOX_HEADER_LEN.checked_add(self.classes)?))
            .ok_or(YoloPostError::InvalidLayout {
                reason: "output size overflows usize",
            })
    }
}
