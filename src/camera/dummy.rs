use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;

use crate::camera::backend::{CaptureBackend, CaptureStream};
use crate::camera::capture::Frame;
use crate::camera::error::{CameraError, Result};
use crate::camera::types::{CameraDevice, DeviceId, FormatDescriptor, FrameSpec, PixelFormat};

const DUMMY_DEVICE_PREFIX: &str = "dummy:test:camera-";
const DUMMY_DEVICE_NAME: &str = "Dummy Test Camera";

/// Stream formats every simulated device advertises.
const DUMMY_FORMATS: &[(u32, u32, &str)] = &[(1280, 720, "MJPG"), (640, 480, "NV12")];

/// Horizontal distance the test square travels per grabbed frame, in pixels.
const SWEEP_STEP: u32 = 16;

/// A fake capture backend for running without real hardware.
///
/// Frames show a dark gradient with a bright square sweeping left to right,
/// rendered at the stream resolution and scaled to the requested frame spec.
///
/// Enable via `DUMMY_CAMERA=1` environment variable.
pub struct DummyBackend {
    device_count: usize,
    pending_failures: Arc<AtomicUsize>,
}

impl DummyBackend {
    /// Create a backend with a single simulated device.
    pub fn new() -> Self {
        Self::with_devices(1)
    }

    /// Create a backend with `count` simulated devices.
    pub fn with_devices(count: usize) -> Self {
        Self {
            device_count: count,
            pending_failures: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Whether the dummy camera is enabled via environment variable.
    pub fn is_enabled() -> bool {
        std::env::var("DUMMY_CAMERA").is_ok_and(|v| v == "1" || v == "true")
    }

    /// The stable device ID for the simulated device at `index`.
    pub fn device_id(index: usize) -> DeviceId {
        DeviceId::new(format!("{DUMMY_DEVICE_PREFIX}{:03}", index + 1))
    }

    /// Make the next `count` frame grabs on any stream fail.
    pub fn inject_grab_failures(&self, count: usize) {
        self.pending_failures.fetch_add(count, Ordering::SeqCst);
    }

    fn device_index(&self, id: &DeviceId) -> Option<usize> {
        (0..self.device_count).find(|i| &Self::device_id(*i) == id)
    }
}

impl Default for DummyBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureBackend for DummyBackend {
    fn enumerate_devices(&self) -> Result<Vec<CameraDevice>> {
        Ok((0..self.device_count)
            .map(|i| CameraDevice {
                id: Self::device_id(i),
                name: format!("{DUMMY_DEVICE_NAME} {}", i + 1),
                device_path: format!("dummy://test-camera/{}", i + 1),
            })
            .collect())
    }

    fn get_formats(&self, id: &DeviceId) -> Result<Vec<FormatDescriptor>> {
        if self.device_index(id).is_none() {
            return Err(CameraError::DeviceNotFound(id.to_string()));
        }
        Ok(DUMMY_FORMATS
            .iter()
            .map(|(width, height, subtype)| FormatDescriptor {
                width: *width,
                height: *height,
                fps: 30.0,
                subtype: subtype.to_string(),
            })
            .collect())
    }

    fn start_stream(
        &self,
        id: &DeviceId,
        format: &FormatDescriptor,
    ) -> Result<Box<dyn CaptureStream>> {
        if self.device_index(id).is_none() {
            return Err(CameraError::DeviceNotFound(id.to_string()));
        }
        let advertised = DUMMY_FORMATS
            .iter()
            .any(|(w, h, _)| *w == format.width && *h == format.height);
        if !advertised {
            return Err(CameraError::StreamStart(format!(
                "{}x{} is not advertised by {id}",
                format.width, format.height
            )));
        }
        tracing::info!(
            "dummy stream started on {id} at {}x{} {}",
            format.width,
            format.height,
            format.subtype
        );
        Ok(Box::new(DummyStream {
            width: format.width,
            height: format.height,
            started: Instant::now(),
            sequence: AtomicU64::new(0),
            stopped: AtomicBool::new(false),
            pending_failures: Arc::clone(&self.pending_failures),
        }))
    }
}

/// Live stream produced by [`DummyBackend`].
struct DummyStream {
    width: u32,
    height: u32,
    started: Instant,
    sequence: AtomicU64,
    stopped: AtomicBool,
    pending_failures: Arc<AtomicUsize>,
}

impl DummyStream {
    fn take_injected_failure(&self) -> bool {
        self.pending_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl CaptureStream for DummyStream {
    async fn grab_frame(&self, spec: FrameSpec) -> Result<Frame> {
        if self.stopped.load(Ordering::Relaxed) {
            return Err(CameraError::FrameGrab("stream stopped".to_string()));
        }
        if self.take_injected_failure() {
            return Err(CameraError::FrameGrab("injected failure".to_string()));
        }

        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
        let timestamp_us = self.started.elapsed().as_micros() as u64;
        let (width, height) = (self.width, self.height);

        // Rendering and scaling are CPU work; keep them off the async workers.
        let data = tokio::task::spawn_blocking(move || {
            let source = render_test_pattern(width, height, seq);
            let scaled = scale_bgra(source, width, height, spec.width, spec.height)?;
            Ok::<_, CameraError>(convert_from_bgra(scaled, spec.pixel_format))
        })
        .await
        .map_err(|e| CameraError::FrameGrab(format!("frame render task failed: {e}")))??;

        Ok(Frame {
            data,
            width: spec.width,
            height: spec.height,
            pixel_format: spec.pixel_format,
            timestamp_us,
        })
    }

    fn stop(&self) {
        self.stopped.store(true, Ordering::Relaxed);
    }
}

/// Square side and top-left corner for frame `seq` at the given resolution.
pub fn test_square(width: u32, height: u32, seq: u64) -> (u32, u32, u32) {
    let side = (height / 4).max(1);
    let travel = width.saturating_sub(side).max(1);
    let x = ((seq * u64::from(SWEEP_STEP)) % u64::from(travel)) as u32;
    let y = height / 3;
    (side, x, y)
}

/// Render a BGRA test pattern: dark gradient plus one white square.
fn render_test_pattern(width: u32, height: u32, seq: u64) -> Vec<u8> {
    let (side, sx, sy) = test_square(width, height, seq);
    let mut data = Vec::with_capacity(width as usize * height as usize * 4);
    for y in 0..height {
        for x in 0..width {
            let inside = x >= sx && x < sx + side && y >= sy && y < sy + side;
            if inside {
                data.extend_from_slice(&[255, 255, 255, 255]);
            } else {
                let shade = ((x + y) % 64) as u8;
                data.extend_from_slice(&[shade, shade / 2, 32, 255]);
            }
        }
    }
    data
}

/// Scale a BGRA buffer with `fast_image_resize`.
fn scale_bgra(
    data: Vec<u8>,
    width: u32,
    height: u32,
    dst_width: u32,
    dst_height: u32,
) -> Result<Vec<u8>> {
    use fast_image_resize as fr;
    use fr::images::Image;

    if width == dst_width && height == dst_height {
        return Ok(data);
    }

    let src_image = Image::from_vec_u8(width, height, data, fr::PixelType::U8x4)
        .map_err(|e| CameraError::FrameGrab(format!("invalid source buffer: {e}")))?;
    let mut dst_image = Image::new(dst_width, dst_height, fr::PixelType::U8x4);

    let mut resizer = fr::Resizer::new();
    resizer
        .resize(&src_image, &mut dst_image, None)
        .map_err(|e| CameraError::FrameGrab(format!("resize failed: {e}")))?;

    Ok(dst_image.into_vec())
}

fn convert_from_bgra(data: Vec<u8>, format: PixelFormat) -> Vec<u8> {
    match format {
        PixelFormat::Bgra8 => data,
        PixelFormat::Rgb8 => data
            .chunks_exact(4)
            .flat_map(|px| [px[2], px[1], px[0]])
            .collect(),
    }
}
