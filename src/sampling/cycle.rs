use std::sync::Arc;

use parking_lot::Mutex;

use crate::camera::capture::CaptureAdapter;
use crate::detect::adapter::DetectorAdapter;
use crate::diagnostics::stats::SamplingStats;
use crate::overlay::thread::OverlayHandle;

/// How a single capture → infer → hand-off cycle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The overlay thread took the batch and finished drawing it.
    HandedOff,
    FrameGrabFailed,
    InferenceFailed,
    /// The overlay thread was gone; the batch was discarded.
    HandOffFailed,
}

/// One sampling cycle's collaborators.
///
/// Failures are contained here: each is logged and counted, and the cycle
/// simply produces nothing. The previous overlay stays visible because no
/// batch is handed off.
pub struct SamplingCycle {
    capture: CaptureAdapter,
    detector: DetectorAdapter,
    overlay: OverlayHandle,
    stats: Arc<Mutex<SamplingStats>>,
}

impl SamplingCycle {
    pub fn new(
        capture: CaptureAdapter,
        detector: DetectorAdapter,
        overlay: OverlayHandle,
        stats: Arc<Mutex<SamplingStats>>,
    ) -> Self {
        Self {
            capture,
            detector,
            overlay,
            stats,
        }
    }

    pub fn stats(&self) -> &Arc<Mutex<SamplingStats>> {
        &self.stats
    }

    /// Run one cycle to completion.
    pub async fn run(&self) -> CycleOutcome {
        let frame = match self.capture.grab_frame().await {
            Ok(frame) => frame,
            Err(e) => {
                self.stats.lock().record_grab_failure();
                tracing::warn!("frame grab failed: {e}");
                return CycleOutcome::FrameGrabFailed;
            }
        };
        let timestamp_us = frame.timestamp_us;

        let inference = match self.detector.infer(frame).await {
            Ok(inference) => inference,
            Err(e) => {
                self.stats.lock().record_inference_failure();
                tracing::warn!("inference failed for frame at {timestamp_us}us: {e}");
                return CycleOutcome::InferenceFailed;
            }
        };
        self.stats.lock().record_inference(inference.latency);
        tracing::trace!(
            "frame at {timestamp_us}us: {} predictions in {:?}",
            inference.batch.len(),
            inference.latency
        );

        match self.overlay.submit(inference.batch).await {
            Ok(()) => {
                self.stats.lock().record_handoff();
                CycleOutcome::HandedOff
            }
            Err(e) => {
                tracing::warn!("overlay hand-off failed: {e}");
                CycleOutcome::HandOffFailed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::detect::mock::MockDetector;
    use crate::overlay::types::DisplayBox;
    use crate::sampling::test_support::{confident_batch, harness, spec, vga_stream, wait_until};

    #[tokio::test]
    async fn successful_cycle_hands_batch_to_overlay() {
        let h = harness(MockDetector::new(spec()).with_batch(confident_batch()));

        assert_eq!(h.cycle.run().await, CycleOutcome::HandedOff);
        wait_until(|| h.surface.visible().len() == 1).await;

        assert_eq!(
            h.surface.visible()[0].rect,
            DisplayBox {
                x: 320,
                y: 120,
                width: 64,
                height: 96
            }
        );
        let snap = h.stats.lock().snapshot();
        assert_eq!(snap.handoff_count, 1);
        assert_eq!(h.detector.calls(), 1);
    }

    #[tokio::test]
    async fn cycle_finishes_only_after_the_overlay_is_drawn() {
        let h = harness(MockDetector::new(spec()).with_batch(confident_batch()));
        h.surface.slow_down(Duration::from_millis(30));

        assert_eq!(h.cycle.run().await, CycleOutcome::HandedOff);

        // No waiting: the draw is already on screen
        assert_eq!(h.surface.visible().len(), 1);
        let snap = h.stats.lock().snapshot();
        assert_eq!(snap.render_count, 1);
        assert_eq!(snap.handoff_count, 1);
    }

    #[tokio::test]
    async fn grab_failure_skips_detector() {
        let h = harness(MockDetector::new(spec()).with_batch(confident_batch()));
        h.backend.inject_grab_failures(1);

        assert_eq!(h.cycle.run().await, CycleOutcome::FrameGrabFailed);
        assert_eq!(h.detector.calls(), 0);
        let snap = h.stats.lock().snapshot();
        assert_eq!(snap.grab_failures, 1);
        assert_eq!(snap.handoff_count, 0);
    }

    #[tokio::test]
    async fn inference_failure_leaves_previous_overlay() {
        let h = harness(
            MockDetector::new(spec())
                .then_return(confident_batch())
                .then_fail("model crashed"),
        );

        assert_eq!(h.cycle.run().await, CycleOutcome::HandedOff);
        wait_until(|| h.stats.lock().snapshot().render_count == 1).await;

        assert_eq!(h.cycle.run().await, CycleOutcome::InferenceFailed);
        assert_eq!(h.surface.visible().len(), 1);
        assert_eq!(h.surface.clear_count(), 1);
        let snap = h.stats.lock().snapshot();
        assert_eq!(snap.inference_failures, 1);
        assert_eq!(snap.handoff_count, 1);
    }

    #[tokio::test]
    async fn closed_overlay_discards_batch() {
        let h = harness(MockDetector::new(spec()).with_batch(confident_batch()));
        let cycle = SamplingCycle::new(
            CaptureAdapter::new(vga_stream(&h.backend), spec()),
            DetectorAdapter::new(h.detector.clone()),
            OverlayHandle::closed(),
            Arc::clone(&h.stats),
        );

        assert_eq!(cycle.run().await, CycleOutcome::HandOffFailed);
        assert_eq!(h.stats.lock().snapshot().handoff_count, 0);
    }

    #[tokio::test]
    async fn overlay_thread_exits_when_cycle_is_dropped() {
        let h = harness(MockDetector::new(spec()));
        h.cycle.run().await;
        drop(h.cycle);
        tokio::task::spawn_blocking(move || h.overlay_thread.join())
            .await
            .unwrap()
            .unwrap();
    }
}
