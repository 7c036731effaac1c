use serde::{Deserialize, Serialize};

use crate::detect::types::NormalizedRect;

/// Size of the display surface in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayExtent {
    pub width: u32,
    pub height: u32,
}

impl DisplayExtent {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// A rectangle in destination pixels, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DisplayBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl DisplayBox {
    /// Map a normalized box onto a display, truncating to whole pixels.
    pub fn from_normalized(rect: &NormalizedRect, extent: DisplayExtent) -> Self {
        let w = f64::from(extent.width);
        let h = f64::from(extent.height);
        let scale = |v: f32, dim: f64| (f64::from(v) * dim).trunc() as i32;
        Self {
            x: scale(rect.left, w),
            y: scale(rect.top, h),
            width: scale(rect.width, w),
            height: scale(rect.height, h),
        }
    }
}

/// RGBA colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const YELLOW: Self = Self::rgb(255, 255, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }
}

/// Outline used for every overlay rectangle. Fill is always transparent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeStyle {
    pub color: Color,
    pub width: f32,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self {
            color: Color::YELLOW,
            width: 2.0,
        }
    }
}
