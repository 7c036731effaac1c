//! Device selection and stream format negotiation.
//!
//! Both run once, before a stream starts. The sampling pipeline never sees
//! anything but the frame spec it asked for.

use serde::{Deserialize, Serialize};

use crate::camera::error::{CameraError, Result};
use crate::camera::types::{CameraDevice, FormatDescriptor};

/// Policy for choosing a capture device among those enumerated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DeviceSelection {
    /// The first enumerated device.
    #[default]
    First,
    /// The second device when more than one exists, otherwise the first.
    PreferSecond,
    /// The device at a zero-based enumeration index.
    Index(usize),
    /// The device with a specific ID.
    Id(String),
}

impl DeviceSelection {
    /// Pick a device from `devices` according to the policy.
    pub fn select<'a>(&self, devices: &'a [CameraDevice]) -> Result<&'a CameraDevice> {
        if devices.is_empty() {
            return Err(CameraError::NoCameraDevice);
        }
        match self {
            Self::First => Ok(&devices[0]),
            Self::PreferSecond => Ok(devices.get(1).unwrap_or(&devices[0])),
            Self::Index(index) => devices
                .get(*index)
                .ok_or_else(|| CameraError::DeviceNotFound(format!("index {index}"))),
            Self::Id(id) => devices
                .iter()
                .find(|d| d.id.as_str() == id)
                .ok_or_else(|| CameraError::DeviceNotFound(id.clone())),
        }
    }
}

/// Choose the advertised format to start a stream with.
///
/// Prefers an exact width and height match. Devices often advertise the same
/// width under several subtypes and heights, so the first format with the
/// requested width is accepted as a fallback.
pub fn negotiate_format(
    formats: &[FormatDescriptor],
    width: u32,
    height: u32,
) -> Result<FormatDescriptor> {
    formats
        .iter()
        .find(|f| f.width == width && f.height == height)
        .or_else(|| formats.iter().find(|f| f.width == width))
        .cloned()
        .ok_or_else(|| {
            CameraError::FormatQuery(format!(
                "no advertised format with width {width} (of {} formats)",
                formats.len()
            ))
        })
}
