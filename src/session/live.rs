//! A running detection session.
//!
//! Start-up failures (no device, no usable format, stream or detector
//! problems, bad settings) are returned before any tick fires. Once running,
//! per-cycle failures only show up in the diagnostics.

use std::sync::Arc;
use std::thread::JoinHandle;

use parking_lot::Mutex;

use crate::camera::backend::CaptureBackend;
use crate::camera::capture::CaptureAdapter;
use crate::camera::selection::negotiate_format;
use crate::camera::types::{CameraDevice, FormatDescriptor};
use crate::detect::adapter::DetectorAdapter;
use crate::detect::backend::Detector;
use crate::diagnostics::stats::{SamplingSnapshot, SamplingStats};
use crate::overlay::surface::DrawingSurface;
use crate::overlay::thread::{spawn_overlay, OverlayHandle};
use crate::overlay::types::DisplayExtent;
use crate::sampling::cycle::SamplingCycle;
use crate::sampling::scheduler::{SamplingScheduler, SchedulerHandle};
use crate::session::error::{Result, SessionError};
use crate::settings::types::Settings;

pub struct Session {
    device: CameraDevice,
    format: FormatDescriptor,
    scheduler: SchedulerHandle,
    overlay: OverlayHandle,
    overlay_thread: JoinHandle<()>,
    stats: Arc<Mutex<SamplingStats>>,
}

impl Session {
    /// Negotiate capture, spawn the overlay thread and start sampling.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start<S: DrawingSurface + 'static>(
        settings: &Settings,
        backend: &dyn CaptureBackend,
        detector: Arc<dyn Detector>,
        surface: S,
    ) -> Result<Self> {
        settings.validate().map_err(SessionError::Settings)?;

        let spec = settings.frame_spec();
        if detector.input_spec() != spec {
            return Err(SessionError::FrameSpecMismatch {
                detector: detector.name().to_string(),
                expected: detector.input_spec().to_string(),
                requested: spec.to_string(),
            });
        }

        let devices = backend.enumerate_devices()?;
        let device = settings.device_selection.select(&devices)?.clone();
        let formats = backend.get_formats(&device.id)?;
        let format = negotiate_format(&formats, settings.display_width, settings.display_height)?;
        let stream = backend.start_stream(&device.id, &format)?;
        tracing::info!(
            "capturing from '{}' at {}x{} {}, inference frames {spec}",
            device.name,
            format.width,
            format.height,
            format.subtype
        );

        let stats = Arc::new(Mutex::new(SamplingStats::new()));
        let (overlay, overlay_thread) = spawn_overlay(
            surface,
            settings.renderer(),
            settings.display_extent(),
            Arc::clone(&stats),
        )?;

        let cycle = SamplingCycle::new(
            CaptureAdapter::new(stream, spec),
            DetectorAdapter::new(detector),
            overlay.clone(),
            Arc::clone(&stats),
        );
        let scheduler =
            Arc::new(SamplingScheduler::new(Arc::new(cycle))).start(settings.period());

        Ok(Self {
            device,
            format,
            scheduler,
            overlay,
            overlay_thread,
            stats,
        })
    }

    pub fn device(&self) -> &CameraDevice {
        &self.device
    }

    pub fn format(&self) -> &FormatDescriptor {
        &self.format
    }

    /// Current diagnostics.
    pub fn diagnostics(&self) -> SamplingSnapshot {
        self.stats.lock().snapshot()
    }

    /// Map later overlays onto a display of a different size.
    pub fn resize(&self, extent: DisplayExtent) -> Result<()> {
        self.overlay.resize(extent)?;
        Ok(())
    }

    /// Stop sampling and return the final diagnostics.
    ///
    /// The timer is stopped before this returns. A cycle still in flight is
    /// left to finish on its own; the overlay thread and capture stream shut
    /// down once it does.
    pub async fn stop(self) -> SamplingSnapshot {
        let Self {
            scheduler,
            overlay,
            overlay_thread,
            stats,
            ..
        } = self;

        let gate = Arc::clone(scheduler.scheduler().gate());
        scheduler.stop().await;
        drop(overlay);

        if gate.is_busy() {
            tracing::info!("cycle still in flight, overlay thread will exit after it");
        } else {
            match tokio::task::spawn_blocking(move || overlay_thread.join()).await {
                Ok(Ok(())) => {}
                Ok(Err(_)) => tracing::warn!("overlay thread panicked"),
                Err(e) => tracing::warn!("failed to join overlay thread: {e}"),
            }
        }

        let snapshot = stats.lock().snapshot();
        tracing::info!(
            "session stopped: {} ticks ({:.1}% dropped), {} cycles, {} grab failures, \
             {} inference failures, {} renders",
            snapshot.tick_count,
            snapshot.drop_rate,
            snapshot.cycle_count,
            snapshot.grab_failures,
            snapshot.inference_failures,
            snapshot.render_count
        );
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::backend::NullBackend;
    use crate::camera::dummy::DummyBackend;
    use crate::camera::error::CameraError;
    use crate::camera::selection::DeviceSelection;
    use crate::camera::types::{FrameSpec, PixelFormat};
    use crate::detect::luma::LumaDetector;
    use crate::detect::mock::MockDetector;
    use crate::overlay::surface::RecordingSurface;
    use crate::sampling::test_support::{confident_batch, wait_until};

    fn settings() -> Settings {
        Settings {
            sampling_period_ms: 10,
            frame_width: 64,
            frame_height: 64,
            ..Settings::default()
        }
    }

    fn mock(settings: &Settings) -> Arc<dyn Detector> {
        Arc::new(MockDetector::new(settings.frame_spec()).with_batch(confident_batch()))
    }

    #[tokio::test]
    async fn no_camera_device_is_fatal() {
        let settings = settings();
        let result = Session::start(
            &settings,
            &NullBackend,
            mock(&settings),
            RecordingSurface::new(),
        );
        assert!(matches!(
            result,
            Err(SessionError::Camera(CameraError::NoCameraDevice))
        ));
    }

    #[tokio::test]
    async fn invalid_settings_are_rejected_before_capture() {
        let settings = Settings {
            labels: Vec::new(),
            ..settings()
        };
        let result = Session::start(
            &settings,
            &NullBackend,
            mock(&settings),
            RecordingSurface::new(),
        );
        assert!(matches!(result, Err(SessionError::Settings(_))));
    }

    #[tokio::test]
    async fn detector_spec_must_match_frame_spec() {
        let settings = settings();
        let detector = Arc::new(MockDetector::new(FrameSpec::new(416, 416, PixelFormat::Bgra8)));
        let err = Session::start(&settings, &DummyBackend::new(), detector, RecordingSurface::new())
            .err()
            .unwrap();
        assert_eq!(
            err.to_string(),
            "detector 'mock' expects 416x416 BGRA8 frames, settings request 64x64 BGRA8"
        );
    }

    #[tokio::test]
    async fn unsupported_display_width_fails_negotiation() {
        let settings = Settings {
            display_width: 800,
            display_height: 600,
            ..settings()
        };
        let result = Session::start(
            &settings,
            &DummyBackend::new(),
            mock(&settings),
            RecordingSurface::new(),
        );
        assert!(matches!(
            result,
            Err(SessionError::Camera(CameraError::FormatQuery(_)))
        ));
    }

    #[tokio::test]
    async fn prefer_second_picks_second_device() {
        let settings = Settings {
            device_selection: DeviceSelection::PreferSecond,
            ..settings()
        };
        let session = Session::start(
            &settings,
            &DummyBackend::with_devices(2),
            mock(&settings),
            RecordingSurface::new(),
        )
        .unwrap();

        assert_eq!(session.device().id, DummyBackend::device_id(1));
        assert_eq!((session.format().width, session.format().height), (640, 480));
        session.stop().await;
    }

    #[tokio::test]
    async fn luma_pipeline_draws_the_moving_square() {
        let settings = settings();
        let detector = LumaDetector::init(
            settings.labels.clone(),
            None,
            settings.frame_spec(),
        )
        .unwrap();
        let surface = RecordingSurface::new();
        let session = Session::start(
            &settings,
            &DummyBackend::new(),
            Arc::new(detector),
            surface.clone(),
        )
        .unwrap();

        wait_until(|| session.diagnostics().render_count >= 2).await;
        let snapshot = session.stop().await;
        wait_until(|| surface.visible().len() == 1).await;

        // The square sits a third of the way down and is a quarter of the height
        let drawn = surface.visible()[0];
        assert!((144..=176).contains(&drawn.rect.y), "y = {}", drawn.rect.y);
        assert!((104..=136).contains(&drawn.rect.height), "h = {}", drawn.rect.height);
        assert!(snapshot.cycle_count >= 2);
        assert_eq!(snapshot.grab_failures, 0);
        assert_eq!(snapshot.inference_failures, 0);
    }

    #[tokio::test]
    async fn resize_changes_later_overlays() {
        let settings = settings();
        let surface = RecordingSurface::new();
        let session = Session::start(
            &settings,
            &DummyBackend::new(),
            mock(&settings),
            surface.clone(),
        )
        .unwrap();

        session.resize(DisplayExtent::new(1280, 960)).unwrap();
        wait_until(|| surface.visible().first().is_some_and(|d| d.rect.x == 640)).await;
        session.stop().await;
    }

    #[tokio::test]
    async fn no_cycles_start_after_stop() {
        let settings = settings();
        let session = Session::start(
            &settings,
            &DummyBackend::new(),
            mock(&settings),
            RecordingSurface::new(),
        )
        .unwrap();

        wait_until(|| session.diagnostics().cycle_count >= 1).await;
        let snapshot = session.stop().await;
        assert!(snapshot.tick_count >= snapshot.cycle_count);
        assert_eq!(snapshot.tick_count, snapshot.cycle_count + snapshot.drop_count);
    }
}
