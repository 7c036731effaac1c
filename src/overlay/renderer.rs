use crate::detect::types::PredictionBatch;
use crate::overlay::error::Result;
use crate::overlay::surface::DrawingSurface;
use crate::overlay::types::{DisplayBox, DisplayExtent, StrokeStyle};

/// Default confidence cutoff. Predictions must score strictly above it.
pub const DEFAULT_THRESHOLD: f32 = 0.75;

/// Turns prediction batches into overlay rectangles.
#[derive(Debug, Clone, Copy)]
pub struct OverlayRenderer {
    threshold: f32,
    stroke: StrokeStyle,
}

impl OverlayRenderer {
    pub fn new(threshold: f32, stroke: StrokeStyle) -> Self {
        Self { threshold, stroke }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Replace whatever the surface shows with the qualifying boxes of `batch`.
    ///
    /// The surface is cleared even when nothing qualifies. If a rectangle
    /// cannot be drawn the surface is cleared again, so a failed render never
    /// leaves part of a batch on screen. Returns the number of rectangles
    /// drawn.
    pub fn render(
        &self,
        surface: &mut dyn DrawingSurface,
        batch: &PredictionBatch,
        extent: DisplayExtent,
    ) -> Result<usize> {
        surface.clear()?;
        let boxes = display_boxes(batch, extent, self.threshold);
        for rect in &boxes {
            if let Err(e) = surface.add_rectangle(*rect, self.stroke.color, self.stroke.width) {
                if let Err(clear) = surface.clear() {
                    tracing::warn!("failed to clear partial overlay: {clear}");
                }
                return Err(e);
            }
        }
        Ok(boxes.len())
    }
}

impl Default for OverlayRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD, StrokeStyle::default())
    }
}

/// Display boxes for every prediction scoring strictly above `threshold`.
pub fn display_boxes(
    batch: &PredictionBatch,
    extent: DisplayExtent,
    threshold: f32,
) -> Vec<DisplayBox> {
    batch
        .iter()
        .filter(|p| p.probability > threshold)
        .map(|p| DisplayBox::from_normalized(&p.bounding_box, extent))
        .collect()
}
