use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::camera::selection::DeviceSelection;
use crate::camera::types::{FrameSpec, PixelFormat};
use crate::overlay::renderer::{OverlayRenderer, DEFAULT_THRESHOLD};
use crate::overlay::types::{Color, DisplayExtent, StrokeStyle};
use crate::sampling::scheduler::DEFAULT_PERIOD;

/// Top-level settings file structure.
///
/// Every field has a default, so a partial file only overrides what it names.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub sampling_period_ms: u64,
    pub confidence_threshold: f32,
    pub frame_width: u32,
    pub frame_height: u32,
    pub pixel_format: PixelFormat,
    pub display_width: u32,
    pub display_height: u32,
    pub device_selection: DeviceSelection,
    pub labels: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_path: Option<PathBuf>,
    pub stroke_color: Color,
    pub stroke_width: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sampling_period_ms: DEFAULT_PERIOD.as_millis() as u64,
            confidence_threshold: DEFAULT_THRESHOLD,
            frame_width: 416,
            frame_height: 416,
            pixel_format: PixelFormat::default(),
            display_width: 640,
            display_height: 480,
            device_selection: DeviceSelection::default(),
            labels: vec!["tomato".to_string()],
            model_path: None,
            stroke_color: Color::YELLOW,
            stroke_width: 2.0,
        }
    }
}

impl Settings {
    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), String> {
        if self.sampling_period_ms == 0 {
            return Err("samplingPeriodMs must be greater than zero".to_string());
        }
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(format!(
                "confidenceThreshold must be within [0, 1], got {}",
                self.confidence_threshold
            ));
        }
        if self.frame_width == 0 || self.frame_height == 0 {
            return Err(format!(
                "frame size must be non-zero, got {}x{}",
                self.frame_width, self.frame_height
            ));
        }
        if self.display_width == 0 || self.display_height == 0 {
            return Err(format!(
                "display size must be non-zero, got {}x{}",
                self.display_width, self.display_height
            ));
        }
        if self.labels.is_empty() {
            return Err("labels must not be empty".to_string());
        }
        if self.stroke_width.is_nan() || self.stroke_width <= 0.0 {
            return Err(format!(
                "strokeWidth must be positive, got {}",
                self.stroke_width
            ));
        }
        Ok(())
    }

    pub fn period(&self) -> Duration {
        Duration::from_millis(self.sampling_period_ms)
    }

    pub fn frame_spec(&self) -> FrameSpec {
        FrameSpec::new(self.frame_width, self.frame_height, self.pixel_format)
    }

    pub fn display_extent(&self) -> DisplayExtent {
        DisplayExtent::new(self.display_width, self.display_height)
    }

    pub fn renderer(&self) -> OverlayRenderer {
        OverlayRenderer::new(
            self.confidence_threshold,
            StrokeStyle {
                color: self.stroke_color,
                width: self.stroke_width,
            },
        )
    }
}
