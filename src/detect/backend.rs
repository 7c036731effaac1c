use async_trait::async_trait;

use crate::camera::capture::Frame;
use crate::camera::types::FrameSpec;
use crate::detect::error::Result;
use crate::detect::types::PredictionBatch;

/// Object detector consumed by the sampling pipeline.
///
/// Constructed once with a fixed label set and model; stateless per call.
/// Each call yields exactly one batch for the frame, or an error. There is no
/// streaming or partial result.
#[async_trait]
pub trait Detector: Send + Sync {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Label set fixed at initialisation.
    fn labels(&self) -> &[String];

    /// The frame contract this detector was built for.
    fn input_spec(&self) -> FrameSpec;

    /// Run detection on a frame.
    ///
    /// The frame is borrowed for the duration of the call only.
    async fn infer(&self, frame: &Frame) -> Result<PredictionBatch>;
}
