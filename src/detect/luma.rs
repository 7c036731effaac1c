use async_trait::async_trait;
use serde::Deserialize;

use crate::camera::capture::Frame;
use crate::camera::types::{FrameSpec, PixelFormat};
use crate::detect::backend::Detector;
use crate::detect::error::{DetectError, Result};
use crate::detect::types::{NormalizedRect, Prediction, PredictionBatch};

/// Tuning document accepted as the luma detector's model blob.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct LumaParams {
    /// Pixels with luma strictly above this count as foreground.
    pub luma_threshold: u8,
    /// Fewer foreground pixels than this yields an empty batch.
    pub min_pixels: usize,
}

impl Default for LumaParams {
    fn default() -> Self {
        Self {
            luma_threshold: 200,
            min_pixels: 16,
        }
    }
}

/// CPU detector reporting the bounding box of bright pixels.
///
/// Produces at most one prediction per frame, labelled with the first label.
/// Its probability is how much of the box the bright pixels fill, so a solid
/// bright object scores close to 1 and scattered highlights score low.
pub struct LumaDetector {
    labels: Vec<String>,
    spec: FrameSpec,
    params: LumaParams,
}

impl LumaDetector {
    /// Initialise with a fixed label set and an optional JSON tuning blob.
    pub fn init(labels: Vec<String>, model: Option<&[u8]>, spec: FrameSpec) -> Result<Self> {
        if labels.is_empty() {
            return Err(DetectError::ModelLoad("label set is empty".to_string()));
        }
        let params = match model {
            Some(blob) => serde_json::from_slice(blob)
                .map_err(|e| DetectError::ModelLoad(format!("invalid tuning document: {e}")))?,
            None => LumaParams::default(),
        };
        tracing::info!(
            "luma detector ready: labels={labels:?}, threshold={}, min_pixels={}",
            params.luma_threshold,
            params.min_pixels
        );
        Ok(Self {
            labels,
            spec,
            params,
        })
    }

    pub fn params(&self) -> LumaParams {
        self.params
    }

    fn detect(&self, frame: &Frame) -> PredictionBatch {
        let width = frame.width as usize;
        let height = frame.height as usize;
        let bpp = frame.pixel_format.bytes_per_pixel();
        if width == 0 || height == 0 {
            return PredictionBatch::empty();
        }

        let mut count = 0usize;
        let (mut min_x, mut min_y) = (usize::MAX, usize::MAX);
        let (mut max_x, mut max_y) = (0usize, 0usize);

        for (i, px) in frame.data.chunks_exact(bpp).enumerate() {
            if luma(px, frame.pixel_format) <= self.params.luma_threshold {
                continue;
            }
            let (x, y) = (i % width, i / width);
            count += 1;
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }

        if count == 0 || count < self.params.min_pixels {
            return PredictionBatch::empty();
        }

        let box_w = max_x - min_x + 1;
        let box_h = max_y - min_y + 1;
        let fill = (count as f32 / (box_w * box_h) as f32).min(1.0);
        let rect = NormalizedRect::new(
            min_x as f32 / width as f32,
            min_y as f32 / height as f32,
            box_w as f32 / width as f32,
            box_h as f32 / height as f32,
        );
        PredictionBatch::from(vec![Prediction::new(self.labels[0].clone(), fill, rect)])
    }
}

/// Integer BT.601 luma approximation.
fn luma(px: &[u8], format: PixelFormat) -> u8 {
    let (r, g, b) = match format {
        PixelFormat::Bgra8 => (px[2], px[1], px[0]),
        PixelFormat::Rgb8 => (px[0], px[1], px[2]),
    };
    ((77 * u32::from(r) + 150 * u32::from(g) + 29 * u32::from(b)) >> 8) as u8
}

#[async_trait]
impl Detector for LumaDetector {
    fn name(&self) -> &'static str {
        "luma"
    }

    fn labels(&self) -> &[String] {
        &self.labels
    }

    fn input_spec(&self) -> FrameSpec {
        self.spec
    }

    async fn infer(&self, frame: &Frame) -> Result<PredictionBatch> {
        if frame.spec() != self.spec {
            return Err(DetectError::InputMismatch {
                expected: self.spec.to_string(),
                actual: frame.spec().to_string(),
            });
        }
        Ok(self.detect(frame))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(width: u32, height: u32) -> FrameSpec {
        FrameSpec::new(width, height, PixelFormat::Bgra8)
    }

    /// Dark BGRA frame with a white rectangle at (x, y, w, h).
    fn frame_with_rect(width: u32, height: u32, rect: (u32, u32, u32, u32)) -> Frame {
        let (rx, ry, rw, rh) = rect;
        let mut data = Vec::with_capacity((width * height * 4) as usize);
        for y in 0..height {
            for x in 0..width {
                let inside = x >= rx && x < rx + rw && y >= ry && y < ry + rh;
                let v = if inside { 255 } else { 10 };
                data.extend_from_slice(&[v, v, v, 255]);
            }
        }
        Frame {
            data,
            width,
            height,
            pixel_format: PixelFormat::Bgra8,
            timestamp_us: 0,
        }
    }

    fn detector(width: u32, height: u32) -> LumaDetector {
        LumaDetector::init(vec!["tomato".to_string()], None, spec(width, height)).unwrap()
    }

    #[test]
    fn init_rejects_empty_labels() {
        let err = LumaDetector::init(vec![], None, spec(4, 4)).err().unwrap();
        assert!(matches!(err, DetectError::ModelLoad(_)));
    }

    #[test]
    fn init_parses_tuning_document() {
        let blob = br#"{"lumaThreshold": 128, "minPixels": 4}"#;
        let d = LumaDetector::init(vec!["a".to_string()], Some(&blob[..]), spec(4, 4)).unwrap();
        assert_eq!(
            d.params(),
            LumaParams {
                luma_threshold: 128,
                min_pixels: 4
            }
        );
    }

    #[test]
    fn init_rejects_invalid_tuning_document() {
        let err = LumaDetector::init(vec!["a".to_string()], Some(&b"not json"[..]), spec(4, 4))
            .err()
            .unwrap();
        assert!(matches!(err, DetectError::ModelLoad(_)));

        let unknown = br#"{"anchors": [1, 2]}"#;
        assert!(LumaDetector::init(vec!["a".to_string()], Some(&unknown[..]), spec(4, 4)).is_err());
    }

    #[tokio::test]
    async fn infer_finds_bright_rectangle() {
        let d = detector(100, 50);
        let batch = d.infer(&frame_with_rect(100, 50, (50, 10, 10, 20))).await.unwrap();

        assert_eq!(batch.len(), 1);
        let p = batch.iter().next().unwrap();
        assert_eq!(p.label, "tomato");
        assert_eq!(p.probability, 1.0);
        assert_eq!(p.bounding_box, NormalizedRect::new(0.5, 0.2, 0.1, 0.4));
    }

    #[tokio::test]
    async fn infer_returns_empty_batch_for_dark_frame() {
        let d = detector(20, 20);
        let batch = d.infer(&frame_with_rect(20, 20, (0, 0, 0, 0))).await.unwrap();
        assert!(batch.is_empty());
    }

    #[tokio::test]
    async fn infer_ignores_specks_below_min_pixels() {
        let d = detector(20, 20);
        let batch = d.infer(&frame_with_rect(20, 20, (5, 5, 2, 2))).await.unwrap();
        assert!(batch.is_empty());
    }

    #[tokio::test]
    async fn infer_rejects_frames_outside_contract() {
        let d = detector(20, 20);
        let err = d.infer(&frame_with_rect(10, 10, (0, 0, 5, 5))).await.unwrap_err();
        assert!(matches!(err, DetectError::InputMismatch { .. }));
    }

    #[test]
    fn luma_weights_green_highest() {
        let green = luma(&[0, 255, 0, 255], PixelFormat::Bgra8);
        let red = luma(&[0, 0, 255, 255], PixelFormat::Bgra8);
        assert!(green > red);
        assert_eq!(luma(&[255, 255, 255], PixelFormat::Rgb8), 255);
    }
}
