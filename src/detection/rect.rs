//! Axis-aligned rectangles and intersection-over-union.

/// Axis-aligned rectangle stored as top-left corner plus size.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Width; may be `inf` or `NaN` for degenerate decodes.
    pub width: f32,
    /// Height; may be `inf` or `NaN` for degenerate decodes.
    pub height: f32,
}

impl Rect {
    /// Creates a rectangle from its top-left corner and size.
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Creates a rectangle centered on `(cx, cy)`.
    pub fn from_center(cx: f32, cy: f32, width: f32, height: f32) -> Self {
        Self::new(cx - width / 2.0, cy - height / 2.0, width, height)
    }

    /// Right edge.
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Bottom edge.
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Center point.
    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Area, with negative extents counted as zero.
    pub fn area(&self) -> f32 {
        extent(self.x, self.right()) * extent(self.y, self.bottom())
    }

    /// True when all four fields are finite.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.width.is_finite() && self.height.is_finite()
    }

    /// Scales x and width by `sx`, y and height by `sy`.
    pub fn scaled(&self, sx: f32, sy: f32) -> Self {
        Self::new(self.x * sx, self.y * sy, self.width * sx, self.height * sy)
    }

    /// Intersection-over-union with `other`; see [`iou`].
    pub fn iou(&self, other: &Rect) -> f32 {
        iou(self, other)
    }
}

fn extent(min: f32, max: f32) -> f32 {
    (max - min).max(0.0)
}

/// Intersection-over-union of two rectangles.
///
/// The intersection extent on each axis is the overlap of the two edge
/// intervals clamped to zero. The result is 0 whenever the union is zero
/// (two zero-area rectangles) or the arithmetic degenerates to a non-finite
/// value (infinite or `NaN` sizes), so callers never observe `NaN`.
/// Symmetric in its arguments, and exactly 1 for two identical rectangles of
/// positive area.
pub fn iou(a: &Rect, b: &Rect) -> f32 {
    let inter_w = extent(a.x.max(b.x), a.right().min(b.right()));
    let inter_h = extent(a.y.max(b.y), a.bottom().min(b.bottom()));
    let intersection = inter_w * inter_h;

    let union = a.area() + b.area() - intersection;
    if union.is_nan() || union <= 0.0 {
        return 0.0;
    }
    let ratio = intersection / union;
    if ratio.is_finite() {
        ratio.clamp(0.0, 1.0)
    } else {
        0.0
    }
}
