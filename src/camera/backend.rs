use async_trait::async_trait;

use crate::camera::capture::Frame;
use crate::camera::error::Result;
use crate::camera::types::{CameraDevice, DeviceId, FormatDescriptor, FrameSpec};

/// Platform-agnostic capture backend trait.
///
/// Implemented per-platform. Provides device enumeration, format queries and
/// stream start. Resolution negotiation happens once, before a stream is
/// started; after that the sampling pipeline only ever asks for frames.
pub trait CaptureBackend: Send + Sync {
    /// Enumerate all currently connected camera devices.
    fn enumerate_devices(&self) -> Result<Vec<CameraDevice>>;

    /// Get the stream formats a device advertises.
    fn get_formats(&self, id: &DeviceId) -> Result<Vec<FormatDescriptor>>;

    /// Start a live stream on a device with one of its advertised formats.
    fn start_stream(&self, id: &DeviceId, format: &FormatDescriptor)
        -> Result<Box<dyn CaptureStream>>;
}

/// A running live stream.
#[async_trait]
pub trait CaptureStream: Send + Sync {
    /// Grab the current frame, scaled and converted to `spec` by the source.
    ///
    /// Suspends only the calling task. Called at most once at a time by the
    /// sampling pipeline.
    async fn grab_frame(&self, spec: FrameSpec) -> Result<Frame>;

    /// Stop the stream. Idempotent.
    fn stop(&self) {}
}

/// Backend used when no capture platform is available. Reports no devices.
pub struct NullBackend;

impl CaptureBackend for NullBackend {
    fn enumerate_devices(&self) -> Result<Vec<CameraDevice>> {
        Ok(vec![])
    }

    fn get_formats(&self, _id: &DeviceId) -> Result<Vec<FormatDescriptor>> {
        Ok(vec![])
    }

    fn start_stream(
        &self,
        id: &DeviceId,
        _format: &FormatDescriptor,
    ) -> Result<Box<dyn CaptureStream>> {
        Err(crate::camera::error::CameraError::DeviceNotFound(
            id.to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::error::CameraError;

    #[test]
    fn null_backend_enumerates_nothing() {
        let backend = NullBackend;
        assert!(backend.enumerate_devices().unwrap().is_empty());
    }

    #[test]
    fn null_backend_refuses_to_start_streams() {
        let backend = NullBackend;
        let format = FormatDescriptor {
            width: 640,
            height: 480,
            fps: 30.0,
            subtype: "NV12".to_string(),
        };
        let result = backend.start_stream(&DeviceId::new("any"), &format);
        assert!(matches!(result, Err(CameraError::DeviceNotFound(_))));
    }

    #[test]
    fn trait_objects_are_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Box<dyn CaptureBackend>>();
        assert_send_sync::<Box<dyn CaptureStream>>();
    }
}
