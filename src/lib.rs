//! yolopost decodes the raw output tensor of a grid-based single-shot
//! detector (YOLOv2 style) into boxes with per-class scores and removes
//! duplicates with per-class non-maximum suppression.
//!
//! The pipeline is CPU-only and synchronous: [`GridDecoder`] turns a flat
//! `f32` buffer into [`Detection`]s, [`suppress_duplicates`] zeroes
//! overlapping lower-ranked scores class by class, and [`Postprocessor`]
//! chains both. Rectangles are in network-input pixel space unless
//! [`CoordinateSpace::Normalized`] is selected. Optional parallelism is
//! available via the `rayon` feature and instrumentation via `tracing`.

pub mod decode;
pub mod detection;
pub mod labels;
pub mod layout;
pub mod lowlevel;
pub mod output;
pub mod pipeline;
pub mod suppress;
mod trace;
pub mod util;

pub use decode::{DecodeConfig, DiscardRule, GridDecoder, DEFAULT_DISCARD_THRESHOLD};
pub use detection::{iou, Detection, Rect, SlotIndex};
pub use labels::{ClassNames, VOC_CLASS_NAMES};
pub use layout::{AnchorSet, CoordinateSpace, GridLayout, TINY_YOLOV2_VOC_ANCHORS};
pub use pipeline::{PostprocessConfig, Postprocessor, DEFAULT_DISPLAY_THRESHOLD};
pub use suppress::{
    compact, suppress_duplicates, Compaction, DuplicateSuppressor, NmsConfig,
    DEFAULT_IOU_THRESHOLD,
};
pub use util::{YoloPostError, YoloPostResult};
