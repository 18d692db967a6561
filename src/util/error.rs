//! Error types for yolopost.

use thiserror::Error;

/// Result alias for yolopost operations.
pub type YoloPostResult<T> = std::result::Result<T, YoloPostError>;

/// Errors that can occur when configuring or running the post-processor.
///
/// Every variant describes a configuration problem that is detected before
/// any decoding starts; numeric degeneracy in the decoded values (`inf` or
/// `NaN` box sizes) is not an error.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum YoloPostError {
    /// The output buffer does not match the configured grid layout.
    #[error("output buffer length mismatch: expected {expected} floats, got {got}")]
    BufferLengthMismatch { expected: usize, got: usize },
    /// The grid layout itself is unusable.
    #[error("invalid layout: {reason}")]
    InvalidLayout { reason: &'static str },
    /// The anchor list does not contain one (width, height) pair per box.
    #[error("anchor count mismatch: expected {expected} floats, got {got}")]
    AnchorCountMismatch { expected: usize, got: usize },
    /// An anchor prior is non-finite or not strictly positive.
    #[error("invalid anchor {index}: width={width}, height={height}")]
    InvalidAnchor { index: usize, width: f32, height: f32 },
    /// A threshold lies outside [0, 1] or is NaN.
    #[error("invalid threshold {name}: {value}")]
    InvalidThreshold { name: &'static str, value: f32 },
    /// A class-indexed table does not match the layout's class count.
    #[error("class count mismatch: expected {expected}, got {got}")]
    ClassCountMismatch { expected: usize, got: usize },
    /// An index was outside the valid range.
    #[error("index out of bounds: {context} index {index} (len {len})")]
    IndexOutOfBounds {
        index: usize,
        len: usize,
        context: &'static str,
    },
}

impl YoloPostError {
    /// Whether the error stems from caller-supplied configuration or input
    /// rather than an internal index fault.
    pub fn is_invalid_input(&self) -> bool {
        !matches!(self, YoloPostError::IndexOutOfBounds { .. })
    }
}

/// Checks that a threshold is a finite value in [0, 1].
pub(crate) fn check_unit_threshold(name: &'static str, value: f32) -> YoloPostResult<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(YoloPostError::InvalidThreshold { name, value });
    }
    Ok(())
}
