use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;

use crate::overlay::error::{RenderError, Result};
use crate::overlay::types::{Color, DisplayBox};

/// The drawing primitives the overlay needs from a display surface.
///
/// Owned by the overlay thread; never touched from the sampling tasks.
pub trait DrawingSurface: Send {
    /// Remove every rectangle previously drawn.
    fn clear(&mut self) -> Result<()>;

    /// Draw one outlined rectangle with a transparent fill.
    fn add_rectangle(&mut self, rect: DisplayBox, stroke: Color, stroke_width: f32) -> Result<()>;
}

/// One rectangle as it was drawn.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawnRect {
    pub rect: DisplayBox,
    pub stroke: Color,
    pub stroke_width: f32,
}

#[derive(Debug, Default)]
struct RecordingState {
    visible: Vec<DrawnRect>,
    clears: u64,
    pending_failures: usize,
    clear_delay: Duration,
}

/// In-memory surface that remembers what is currently visible.
///
/// Clones share state, so one clone can be moved to the overlay thread while
/// another is kept for inspection.
#[derive(Clone, Default)]
pub struct RecordingSurface {
    state: Arc<Mutex<RecordingState>>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rectangles currently visible.
    pub fn visible(&self) -> Vec<DrawnRect> {
        self.state.lock().visible.clone()
    }

    /// Number of times the surface has been cleared.
    pub fn clear_count(&self) -> u64 {
        self.state.lock().clears
    }

    /// Make the next `count` rectangle draws fail.
    pub fn fail_next_draws(&self, count: usize) {
        self.state.lock().pending_failures += count;
    }

    /// Make every later clear block the drawing thread for `delay`.
    pub fn slow_down(&self, delay: Duration) {
        self.state.lock().clear_delay = delay;
    }
}

impl DrawingSurface for RecordingSurface {
    fn clear(&mut self) -> Result<()> {
        let delay = self.state.lock().clear_delay;
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
        let mut state = self.state.lock();
        state.visible.clear();
        state.clears += 1;
        Ok(())
    }

    fn add_rectangle(&mut self, rect: DisplayBox, stroke: Color, stroke_width: f32) -> Result<()> {
        let mut state = self.state.lock();
        if state.pending_failures > 0 {
            state.pending_failures -= 1;
            return Err(RenderError::Surface("injected draw failure".to_string()));
        }
        state.visible.push(DrawnRect {
            rect,
            stroke,
            stroke_width,
        });
        Ok(())
    }
}

/// Surface that reports the overlay through the log instead of a window.
#[derive(Default)]
pub struct LoggingSurface {
    visible: usize,
}

impl LoggingSurface {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DrawingSurface for LoggingSurface {
    fn clear(&mut self) -> Result<()> {
        if self.visible > 0 {
            tracing::debug!("overlay cleared ({} rectangles)", self.visible);
        }
        self.visible = 0;
        Ok(())
    }

    fn add_rectangle(
        &mut self,
        rect: DisplayBox,
        _stroke: Color,
        _stroke_width: f32,
    ) -> Result<()> {
        self.visible += 1;
        tracing::info!(
            "overlay box at ({}, {}) {}x{}",
            rect.x,
            rect.y,
            rect.width,
            rect.height
        );
        Ok(())
    }
}
