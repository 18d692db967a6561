//! Box geometry decoding.

use crate::detection::Rect;
use crate::layout::{CoordinateSpace, GridLayout};
use crate::util::math::sigmoid;

/// Decodes raw `[tx, ty, tw, th]` into a rectangle in input pixels.
///
/// The center is `(cell + sigmoid(t)) * cell_size` on each axis and the size
/// is `exp(t) * anchor * cell_size`. Large `tw`/`th` overflow to `inf`; that
/// is passed through untouched.
pub fn decode_rect(
    coords: [f32; 4],
    cell_x: usize,
    cell_y: usize,
    anchor: (f32, f32),
    cell_size: f32,
) -> Rect {
    let [tx, ty, tw, th] = coords;
    let (anchor_w, anchor_h) = anchor;

    let center_x = (cell_x as f32 + sigmoid(tx)) * cell_size;
    let center_y = (cell_y as f32 + sigmoid(ty)) * cell_size;
    let width = tw.exp() * anchor_w * cell_size;
    let height = th.exp() * anchor_h * cell_size;

    Rect::from_center(center_x, center_y, width, height)
}

/// Decodes a rectangle for `layout` and maps it into `space`.
pub fn decode_rect_in(
    coords: [f32; 4],
    cell_x: usize,
    cell_y: usize,
    box_index: usize,
    layout: &GridLayout,
    space: CoordinateSpace,
) -> Option<Rect> {
    let anchor = layout.anchors().get(box_index)?;
    let rect = decode_rect(coords, cell_x, cell_y, anchor, layout.cell_size());
    Some(match space {
        CoordinateSpace::Pixels => rect,
        CoordinateSpace::Normalized => {
            rect.scaled(1.0 / layout.input_width(), 1.0 / layout.input_height())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::AnchorSet;

    #[test]
    fn zero_offsets_center_box_in_cell() {
        let rect = decode_rect([0.0; 4], 2, 1, (1.0, 2.0), 32.0);
        // center (2.5 * 32, 1.5 * 32), size (32, 64)
        assert!((rect.x - 64.0).abs() < 1e-4);
        assert!((rect.y - 16.0).abs() < 1e-4);
        assert!((rect.width - 32.0).abs() < 1e-4);
        assert!((rect.height - 64.0).abs() < 1e-4);
    }

    #[test]
    fn log_size_scales_anchor() {
        let rect = decode_rect([0.0, 0.0, 2f32.ln(), 0.0], 0, 0, (1.5, 1.0), 10.0);
        assert!((rect.width - 30.0).abs() < 1e-4);
        assert!((rect.height - 10.0).abs() < 1e-4);
    }

    #[test]
    fn overflow_is_not_trapped() {
        let rect = decode_rect([0.0, 0.0, 1000.0, 0.0], 0, 0, (1.0, 1.0), 32.0);
        assert_eq!(rect.width, f32::INFINITY);
    }

    #[test]
    fn normalized_space_divides_by_input_size() {
        let layout = GridLayout::new(4, 2, 1, AnchorSet::from_flat(&[1.0, 1.0]).unwrap(), 8.0)
            .unwrap();
        let px = decode_rect_in([0.0; 4], 1, 1, 0, &layout, CoordinateSpace::Pixels).unwrap();
        let norm =
            decode_rect_in([0.0; 4], 1, 1, 0, &layout, CoordinateSpace::Normalized).unwrap();
        assert!((norm.x - px.x / 32.0).abs() < 1e-6);
        assert!((norm.y - px.y / 16.0).abs() < 1e-6);
        assert!((norm.width - 0.25).abs() < 1e-6);
        assert!((norm.height - 0.5).abs() < 1e-6);
        assert!(decode_rect_in([0.0; 4], 0, 0, 1, &layout, CoordinateSpace::Pixels).is_none());
    }
}
