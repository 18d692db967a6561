//! Low-level building blocks for custom post-processing pipelines.
//!
//! These expose the individual decode and suppression stages behind
//! [`Postprocessor`](crate::Postprocessor). Most users should prefer the
//! top-level types.

pub use crate::decode::geometry::{decode_rect, decode_rect_in};
pub use crate::decode::score::{
    class_probabilities, decode_class_scores, decode_objectness, ClassScores,
};
pub use crate::output::{OutputView, SlotRecord};
pub use crate::suppress::{order_by_class_score, suppressed_for_class};
pub use crate::util::math::{argmax, sigmoid, softmax_in_place};
