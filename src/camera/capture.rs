use crate::camera::backend::CaptureStream;
use crate::camera::error::{CameraError, Result};
use crate::camera::types::{FrameSpec, PixelFormat};

/// A single captured frame.
pub struct Frame {
    /// Raw pixel data in `pixel_format` layout, row-major, no padding.
    pub data: Vec<u8>,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    pub pixel_format: PixelFormat,
    /// Capture timestamp in microseconds since the stream started.
    pub timestamp_us: u64,
}

impl Frame {
    /// The [`FrameSpec`] this frame actually satisfies.
    pub fn spec(&self) -> FrameSpec {
        FrameSpec::new(self.width, self.height, self.pixel_format)
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("pixel_format", &self.pixel_format)
            .field("bytes", &self.data.len())
            .field("timestamp_us", &self.timestamp_us)
            .finish()
    }
}

/// Adapter between the sampling pipeline and a running capture stream.
///
/// Asks for exactly one frame per call at the fixed inference spec and
/// rejects anything the source hands back that does not honour it.
pub struct CaptureAdapter {
    stream: Box<dyn CaptureStream>,
    spec: FrameSpec,
}

impl CaptureAdapter {
    pub fn new(stream: Box<dyn CaptureStream>, spec: FrameSpec) -> Self {
        Self { stream, spec }
    }

    pub fn spec(&self) -> FrameSpec {
        self.spec
    }

    /// Grab the current frame and check it against the frame contract.
    pub async fn grab_frame(&self) -> Result<Frame> {
        let frame = self.stream.grab_frame(self.spec).await?;
        check_frame(&frame, self.spec)?;
        Ok(frame)
    }
}

impl Drop for CaptureAdapter {
    fn drop(&mut self) {
        self.stream.stop();
    }
}

/// Verify dimensions, pixel format and buffer length of a frame.
fn check_frame(frame: &Frame, spec: FrameSpec) -> Result<()> {
    if frame.spec() != spec {
        return Err(CameraError::FrameMismatch {
            expected: spec.to_string(),
            actual: frame.spec().to_string(),
        });
    }
    if frame.data.len() != spec.buffer_len() {
        return Err(CameraError::FrameMismatch {
            expected: format!("{} bytes", spec.buffer_len()),
            actual: format!("{} bytes", frame.data.len()),
        });
    }
    Ok(())
}
