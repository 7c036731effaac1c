//! Shared fixtures for sampling tests: a dummy stream, a mock detector and a
//! recording surface wired into one cycle.

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use parking_lot::Mutex;

use crate::camera::backend::{CaptureBackend, CaptureStream};
use crate::camera::capture::CaptureAdapter;
use crate::camera::dummy::DummyBackend;
use crate::camera::types::{FormatDescriptor, FrameSpec, PixelFormat};
use crate::detect::adapter::DetectorAdapter;
use crate::detect::mock::MockDetector;
use crate::detect::types::{NormalizedRect, Prediction, PredictionBatch};
use crate::diagnostics::stats::SamplingStats;
use crate::overlay::renderer::OverlayRenderer;
use crate::overlay::surface::RecordingSurface;
use crate::overlay::thread::spawn_overlay;
use crate::overlay::types::DisplayExtent;
use crate::sampling::cycle::SamplingCycle;

pub(crate) struct Harness {
    pub cycle: Arc<SamplingCycle>,
    pub detector: Arc<MockDetector>,
    pub backend: DummyBackend,
    pub surface: RecordingSurface,
    pub stats: Arc<Mutex<SamplingStats>>,
    pub overlay_thread: JoinHandle<()>,
}

pub(crate) fn spec() -> FrameSpec {
    FrameSpec::new(32, 32, PixelFormat::Bgra8)
}

/// One prediction well above the default threshold.
pub(crate) fn confident_batch() -> PredictionBatch {
    PredictionBatch::from(vec![Prediction::new(
        "tomato",
        0.9,
        NormalizedRect::new(0.5, 0.25, 0.1, 0.2),
    )])
}

/// A VGA stream from the first simulated device of `backend`.
pub(crate) fn vga_stream(backend: &DummyBackend) -> Box<dyn CaptureStream> {
    let format = FormatDescriptor {
        width: 640,
        height: 480,
        fps: 30.0,
        subtype: "NV12".to_string(),
    };
    backend
        .start_stream(&DummyBackend::device_id(0), &format)
        .unwrap()
}

pub(crate) fn harness(detector: MockDetector) -> Harness {
    let backend = DummyBackend::new();
    let stream = vga_stream(&backend);
    let detector = Arc::new(detector);
    let stats = Arc::new(Mutex::new(SamplingStats::new()));
    let surface = RecordingSurface::new();
    let (overlay, overlay_thread) = spawn_overlay(
        surface.clone(),
        OverlayRenderer::default(),
        DisplayExtent::new(640, 480),
        Arc::clone(&stats),
    )
    .unwrap();
    let cycle = Arc::new(SamplingCycle::new(
        CaptureAdapter::new(stream, spec()),
        DetectorAdapter::new(detector.clone()),
        overlay,
        Arc::clone(&stats),
    ));
    Harness {
        cycle,
        detector,
        backend,
        surface,
        stats,
        overlay_thread,
    }
}

/// Poll `condition` until it holds, failing the test after two seconds.
pub(crate) async fn wait_until(condition: impl Fn() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not reached within 2s"
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
