//! Borrowed view over the detector's flat output buffer.
//!
//! `OutputView` checks the buffer length against a [`GridLayout`] once, up
//! front, and then hands out per-slot records as zero-copy sub-slices. A
//! mismatched buffer never yields a view, so decoding cannot start on it.

use crate::layout::{GridLayout, BOX_HEADER_LEN, OBJECTNESS_OFFSET};
use crate::util::{YoloPostError, YoloPostResult};

/// Validated, read-only view of one output tensor.
#[derive(Copy, Clone, Debug)]
pub struct OutputView<'a> {
    data: &'a [f32],
    layout: &'a GridLayout,
}

impl<'a> OutputView<'a> {
    /// Wraps `data`, failing if its length does not match `layout`.
    pub fn new(data: &'a [f32], layout: &'a GridLayout) -> YoloPostResult<Self> {
        layout.check_buffer_len(data.len())?;
        Ok(Self { data, layout })
    }

    /// Layout the buffer was validated against.
    pub fn layout(&self) -> &'a GridLayout {
        self.layout
    }

    /// Backing slice.
    pub fn as_slice(&self) -> &'a [f32] {
        self.data
    }

    /// Returns the record for `(cell_y, cell_x, box_index)` if in bounds.
    pub fn slot(&self, cell_y: usize, cell_x: usize, box_index: usize) -> Option<SlotRecord<'a>> {
        if cell_y >= self.layout.grid_height()
            || cell_x >= self.layout.grid_width()
            || box_index >= self.layout.boxes_per_cell()
        {
            return None;
        }
        let start = self.layout.slot_offset(cell_y, cell_x, box_index);
        let end = start + self.layout.record_len();
        self.data.get(start..end).map(|values| SlotRecord {
            values,
            cell_x,
            cell_y,
            box_index,
        })
    }

    /// Returns all box records of grid row `cell_y`, in column-then-box order.
    pub fn row(&self, cell_y: usize) -> YoloPostResult<&'a [f32]> {
        let height = self.layout.grid_height();
        if cell_y >= height {
            return Err(YoloPostError::IndexOutOfBounds {
                index: cell_y,
                len: height,
                context: "grid row",
            });
        }
        let row_len =
            self.layout.grid_width() * self.layout.boxes_per_cell() * self.layout.record_len();
        let start = cell_y * row_len;
        Ok(&self.data[start..start + row_len])
    }

    /// Iterates over every slot in decode order: rows, columns, then boxes.
    pub fn slots(&self) -> impl Iterator<Item = SlotRecord<'a>> + 'a {
        let view = *self;
        (0..view.layout.grid_height()).flat_map(move |cell_y| view.row_slots(cell_y))
    }

    /// Iterates over the slots of one grid row.
    pub fn row_slots(&self, cell_y: usize) -> impl Iterator<Item = SlotRecord<'a>> + 'a {
        let view = *self;
        let width = view.layout.grid_width();
        let boxes = view.layout.boxes_per_cell();
        let cols = if cell_y < view.layout.grid_height() {
            width
        } else {
            0
        };
        (0..cols).flat_map(move |cell_x| {
            (0..boxes).filter_map(move |box_index| view.slot(cell_y, cell_x, box_index))
        })
    }
}

/// Raw values of one (cell, box) slot.
#[derive(Copy, Clone, Debug)]
pub struct SlotRecord<'a> {
    values: &'a [f32],
    /// Grid column.
    pub cell_x: usize,
    /// Grid row.
    pub cell_y: usize,
    /// Anchor box index within the cell.
    pub box_index: usize,
}

impl<'a> SlotRecord<'a> {
    /// Builds a record from a raw slice; `values` must hold at least the
    /// 5-value header.
    pub fn from_values(
        values: &'a [f32],
        cell_x: usize,
        cell_y: usize,
        box_index: usize,
    ) -> YoloPostResult<Self> {
        if values.len() <= BOX_HEADER_LEN {
            return Err(YoloPostError::InvalidLayout {
                reason: "box record needs 5 header values and at least one class",
            });
        }
        Ok(Self {
            values,
            cell_x,
            cell_y,
            box_index,
        })
    }

    /// `[tx, ty, tw, th]`.
    pub fn coords(&self) -> [f32; 4] {
        [self.values[0], self.values[1], self.values[2], self.values[3]]
    }

    /// Raw objectness logit.
    pub fn objectness_logit(&self) -> f32 {
        self.values[OBJECTNESS_OFFSET]
    }

    /// Raw class logits.
    pub fn class_logits(&self) -> &'a [f32] {
        &self.values[BOX_HEADER_LEN..]
    }

    /// Whole record.
    pub fn as_slice(&self) -> &'a [f32] {
        self.values
    }
}
