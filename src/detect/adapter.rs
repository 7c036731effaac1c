use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::camera::capture::Frame;
use crate::detect::backend::Detector;
use crate::detect::error::{DetectError, Result};
use crate::detect::types::PredictionBatch;

/// A batch together with how long the detector took to produce it.
#[derive(Debug, Clone)]
pub struct Inference {
    pub batch: PredictionBatch,
    pub latency: Duration,
}

/// Adapter between the sampling pipeline and a [`Detector`].
///
/// Takes ownership of the frame for the call and releases it once the
/// detector answers, successfully or not. No retries: a failed call is
/// reported and the next cycle gets a fresh chance.
#[derive(Clone)]
pub struct DetectorAdapter {
    detector: Arc<dyn Detector>,
}

impl DetectorAdapter {
    pub fn new(detector: Arc<dyn Detector>) -> Self {
        Self { detector }
    }

    /// Submit `frame` and wait for its batch.
    pub async fn infer(&self, frame: Frame) -> Result<Inference> {
        let started = Instant::now();
        let result = self.detector.infer(&frame).await;
        drop(frame);
        let batch = result?;
        check_batch(&batch)?;
        Ok(Inference {
            batch,
            latency: started.elapsed(),
        })
    }
}

/// Reject batches carrying probabilities or boxes outside the unit range.
fn check_batch(batch: &PredictionBatch) -> Result<()> {
    for prediction in batch {
        let p = prediction.probability;
        if !p.is_finite() || !(0.0..=1.0).contains(&p) {
            return Err(DetectError::Inference(format!(
                "malformed probability {p} for '{}'",
                prediction.label
            )));
        }
        if !prediction.bounding_box.is_normalized() {
            return Err(DetectError::Inference(format!(
                "malformed box {:?} for '{}'",
                prediction.bounding_box, prediction.label
            )));
        }
    }
    Ok(())
}
