//! End-to-end post-processing: decode, then suppress duplicates.
//!
//! A [`Postprocessor`] is built once per model and holds only immutable
//! configuration, so one instance can serve frames from several threads.
//! Each [`Postprocessor::process`] call borrows one output buffer and returns
//! a detection list owned by the caller.

use crate::decode::{DecodeConfig, GridDecoder};
use crate::detection::Detection;
use crate::layout::GridLayout;
use crate::suppress::{compact, suppress_duplicates, NmsConfig};
use crate::trace::trace_span;
use crate::util::YoloPostResult;

/// Score a detection must exceed to be drawn.
pub const DEFAULT_DISPLAY_THRESHOLD: f32 = 0.3;

/// Combined decode and suppression settings.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PostprocessConfig {
    /// Grid decoding settings.
    pub decode: DecodeConfig,
    /// Duplicate suppression settings.
    pub nms: NmsConfig,
}

impl PostprocessConfig {
    /// Validates both stages.
    pub fn validate(&self) -> YoloPostResult<()> {
        self.decode.validate()?;
        self.nms.validate()
    }
}

/// Decodes and de-duplicates output tensors for one model.
#[derive(Clone, Debug)]
pub struct Postprocessor {
    decoder: GridDecoder,
    nms: NmsConfig,
}

impl Postprocessor {
    /// Creates a post-processor with default settings.
    pub fn new(layout: GridLayout) -> Self {
        Self {
            decoder: GridDecoder::new(layout),
            nms: NmsConfig::default(),
        }
    }

    /// Replaces both stage configurations.
    pub fn with_config(self, config: PostprocessConfig) -> Self {
        Self {
            decoder: self.decoder.with_config(config.decode),
            nms: config.nms,
        }
    }

    /// Layout expected by [`Self::process`].
    pub fn layout(&self) -> &GridLayout {
        self.decoder.layout()
    }

    /// Current configuration.
    pub fn config(&self) -> PostprocessConfig {
        PostprocessConfig {
            decode: self.decoder.config().clone(),
            nms: self.nms.clone(),
        }
    }

    /// Decodes `output`, suppresses duplicates and applies compaction.
    ///
    /// Configuration errors, including a buffer that does not match the
    /// layout, are reported before any decoding; no partial list is returned.
    pub fn process(&self, output: &[f32]) -> YoloPostResult<Vec<Detection>> {
        self.nms.validate()?;
        let _span = trace_span!("postprocess", len = output.len()).entered();

        let mut detections = self.decoder.decode(output)?;
        suppress_duplicates(&mut detections, self.layout().classes(), &self.nms)?;
        Ok(compact(detections, self.nms.compaction))
    }

    /// Keeps detections whose current best-class score exceeds `threshold`.
    pub fn confident(detections: &[Detection], threshold: f32) -> Vec<&Detection> {
        detections
            .iter()
            .filter(|d| d.is_confident(threshold))
            .collect()
    }
}
