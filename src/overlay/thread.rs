//! The overlay thread: the only execution context that touches the surface.
//!
//! Sampling cycles hand batches over through a channel and wait for the
//! thread to acknowledge the draw. A cycle therefore holds the sampling gate
//! until its overlay is on screen, and at most one batch is ever pending.
//! The thread exits once every handle has been dropped.

use std::sync::Arc;
use std::thread::JoinHandle;

use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};

use crate::detect::types::PredictionBatch;
use crate::diagnostics::stats::SamplingStats;
use crate::overlay::error::{RenderError, Result};
use crate::overlay::renderer::OverlayRenderer;
use crate::overlay::surface::DrawingSurface;
use crate::overlay::types::DisplayExtent;

/// Messages accepted by the overlay thread.
#[derive(Debug)]
pub enum OverlayCommand {
    /// Draw a batch, then signal `done`.
    Render {
        batch: PredictionBatch,
        done: oneshot::Sender<()>,
    },
    Resize(DisplayExtent),
}

/// Sending side of the overlay thread. Cheap to clone.
#[derive(Clone)]
pub struct OverlayHandle {
    tx: mpsc::UnboundedSender<OverlayCommand>,
}

impl OverlayHandle {
    /// Hand a batch to the overlay thread and wait until it has been drawn.
    ///
    /// Suspends only the calling task. A draw that fails on the surface still
    /// completes the hand-off; the failure is recorded by the overlay thread.
    pub async fn submit(&self, batch: PredictionBatch) -> Result<()> {
        let (done, drawn) = oneshot::channel();
        self.tx
            .send(OverlayCommand::Render { batch, done })
            .map_err(|_| RenderError::Closed)?;
        drawn.await.map_err(|_| RenderError::Closed)
    }

    /// Change the display extent used for subsequent renders.
    pub fn resize(&self, extent: DisplayExtent) -> Result<()> {
        self.tx
            .send(OverlayCommand::Resize(extent))
            .map_err(|_| RenderError::Closed)
    }
}

#[cfg(test)]
impl OverlayHandle {
    /// A handle whose receiving side is already gone.
    pub(crate) fn closed() -> Self {
        let (tx, _rx) = mpsc::unbounded_channel();
        Self { tx }
    }
}

/// Spawn the overlay thread, moving `surface` onto it.
pub fn spawn_overlay<S: DrawingSurface + 'static>(
    surface: S,
    renderer: OverlayRenderer,
    extent: DisplayExtent,
    stats: Arc<Mutex<SamplingStats>>,
) -> Result<(OverlayHandle, JoinHandle<()>)> {
    let (tx, rx) = mpsc::unbounded_channel();
    let thread = std::thread::Builder::new()
        .name("overlay".to_string())
        .spawn(move || {
            tracing::info!("overlay thread starting at {}x{}", extent.width, extent.height);
            run_overlay(surface, renderer, extent, rx, &stats);
            tracing::info!("overlay thread exiting");
        })
        .map_err(|e| RenderError::Surface(format!("failed to spawn overlay thread: {e}")))?;
    Ok((OverlayHandle { tx }, thread))
}

/// Command loop that runs on the overlay thread.
fn run_overlay<S: DrawingSurface>(
    mut surface: S,
    renderer: OverlayRenderer,
    mut extent: DisplayExtent,
    mut rx: mpsc::UnboundedReceiver<OverlayCommand>,
    stats: &Mutex<SamplingStats>,
) {
    while let Some(command) = rx.blocking_recv() {
        match command {
            OverlayCommand::Render { batch, done } => {
                match renderer.render(&mut surface, &batch, extent) {
                    Ok(drawn) => {
                        stats.lock().record_render();
                        tracing::debug!("overlay rendered {drawn} of {} predictions", batch.len());
                    }
                    Err(e) => {
                        stats.lock().record_render_failure();
                        tracing::warn!("overlay render failed: {e}");
                    }
                }
                // The submitting cycle may already be gone
                let _ = done.send(());
            }
            OverlayCommand::Resize(new_extent) => {
                tracing::debug!(
                    "overlay extent {}x{} -> {}x{}",
                    extent.width,
                    extent.height,
                    new_extent.width,
                    new_extent.height
                );
                extent = new_extent;
            }
        }
    }
}
