// SPDX-License-Identifier: GPL-3.0-only

//! Capture session controller.
//!
//! Drives one user-initiated live-capture session from overlay-open to
//! teardown: `Idle -> Selecting -> Finalizing -> {Completed | Cancelled}`.
//! The controller is reusable across sessions; terminal states always
//! return it to `Idle` with no overlay references or drag state left
//! behind.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::attachment::{make_preview, Attachment, CaptureEvent};
use crate::error::CaptureError;
use crate::gesture::DragTracker;
use crate::geometry::Rect;
use crate::rasterizer::Rasterizer;
use crate::readiness::{self, ResourceFetcher};
use crate::scene::{NodeId, Scene};
use crate::settings::CaptureSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Selecting,
    Finalizing,
}

/// How a finalized session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    Completed,
    Cancelled,
    Failed(String),
}

/// Flips the session's cancellation flag from outside the controller,
/// e.g. from an Escape-key handler while finalization is in flight.
#[derive(Debug, Clone)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

pub struct SessionController {
    rasterizer: Arc<dyn Rasterizer>,
    fetcher: Arc<dyn ResourceFetcher>,
    settings: CaptureSettings,
    events: mpsc::Sender<CaptureEvent>,
    tracker: DragTracker,
    phase: SessionPhase,
    overlay: Vec<NodeId>,
    cancelled: Arc<AtomicBool>,
    preselected: Option<Rect>,
}

impl SessionController {
    #[must_use]
    pub fn new(
        rasterizer: Arc<dyn Rasterizer>,
        fetcher: Arc<dyn ResourceFetcher>,
        settings: CaptureSettings,
        events: mpsc::Sender<CaptureEvent>,
    ) -> Self {
        Self {
            rasterizer,
            fetcher,
            settings,
            events,
            tracker: DragTracker::new(),
            phase: SessionPhase::Idle,
            overlay: Vec::new(),
            cancelled: Arc::new(AtomicBool::new(false)),
            preselected: None,
        }
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    #[must_use]
    pub fn settings(&self) -> &CaptureSettings {
        &self.settings
    }

    /// Handle for cancelling the current session from another task.
    /// Handles from earlier sessions keep working on their own session
    /// only; each `start` arms a fresh flag.
    #[must_use]
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle(Arc::clone(&self.cancelled))
    }

    /// Selection restored from a previous session, for overlay feedback.
    #[must_use]
    pub fn preselected(&self) -> Option<Rect> {
        self.preselected
    }

    /// Begin a session: the caller has shown the overlay and passes the
    /// overlay node ids so the rasterizer can exclude its own chrome.
    /// Starting over an active session cancels it first (toggle
    /// semantics).
    pub fn start(&mut self, scene: &Scene, overlay: Vec<NodeId>) {
        if self.phase != SessionPhase::Idle {
            log::debug!("capture restarted mid-session, cancelling previous");
            self.cancel();
        }
        self.cancelled = Arc::new(AtomicBool::new(false));
        self.overlay = overlay;
        self.preselected = self
            .settings
            .remember_selection_area
            .then_some(self.settings.last_selection_area)
            .flatten()
            .filter(|rect| rect.fits_within(&scene.viewport()));
        self.phase = SessionPhase::Selecting;
    }

    pub fn pointer_down(&mut self, x: f32, y: f32) {
        if self.phase == SessionPhase::Selecting {
            self.tracker.begin(x, y);
        }
    }

    /// Live rectangle for the overlay's visual feedback.
    pub fn pointer_moved(&mut self, x: f32, y: f32) -> Option<Rect> {
        if self.phase == SessionPhase::Selecting {
            self.tracker.update(x, y)
        } else {
            None
        }
    }

    /// Explicit cancel (Escape, or toggling capture off). Safe in any
    /// state, including mid-drag; no attachment is emitted.
    pub fn cancel(&mut self) {
        self.cancelled.store(true, Ordering::Relaxed);
        self.reset();
    }

    /// Pointer-up: finalize the rectangle, run the readiness gate, then
    /// rasterize. Returns `None` when no selection was in progress.
    ///
    /// A sub-threshold drag selects the full viewport. Cancellation is
    /// re-checked after every suspension point; a render that lands after
    /// cancellation is discarded and never reaches the composer.
    pub async fn finish(&mut self, scene: &mut Scene, x: f32, y: f32) -> Option<SessionOutcome> {
        if self.phase != SessionPhase::Selecting {
            return None;
        }
        let rect = self.tracker.end(x, y)?;
        self.phase = SessionPhase::Finalizing;

        let explicit = !rect.below_threshold(self.settings.min_drag_px);
        let region = if explicit { rect } else { scene.viewport() };
        log::debug!(
            "finalizing capture of {}x{} at ({}, {})",
            region.width,
            region.height,
            region.x,
            region.y
        );

        let report = readiness::prepare(scene, self.fetcher.as_ref(), self.settings.resource_wait()).await;
        if report.failed > 0 {
            log::warn!("{} resources unavailable, capturing best effort", report.failed);
        }
        if self.cancelled.load(Ordering::Relaxed) {
            self.reset();
            return Some(SessionOutcome::Cancelled);
        }

        let rendered = self
            .rasterizer
            .rasterize(scene, region, &self.overlay)
            .await;
        match rendered {
            Ok(frame) => {
                if self.cancelled.load(Ordering::Relaxed) {
                    log::debug!("render finished after cancellation, discarding");
                    self.reset();
                    return Some(SessionOutcome::Cancelled);
                }
                let attachment = match self.build_attachment(&frame) {
                    Ok(attachment) => attachment,
                    Err(err) => return Some(self.fail(err)),
                };
                if explicit && self.settings.remember_selection_area {
                    self.settings.last_selection_area = Some(rect);
                }
                self.emit(CaptureEvent::AttachmentReady(attachment)).await;
                self.reset();
                Some(SessionOutcome::Completed)
            }
            Err(err) => {
                let outcome = self.fail(err);
                if let SessionOutcome::Failed(message) = &outcome {
                    self.emit(CaptureEvent::CaptureFailed(message.clone())).await;
                }
                Some(outcome)
            }
        }
    }

    fn build_attachment(&self, frame: &crate::rasterizer::RasterFrame) -> Result<Attachment, CaptureError> {
        let image = frame.encode_png()?;
        let preview = match make_preview(&frame.pixels, self.settings.preview_height) {
            Ok(preview) => Some(preview),
            Err(err) => {
                log::warn!("preview generation failed: {err}");
                None
            }
        };
        Ok(Attachment { image, preview })
    }

    fn fail(&mut self, err: CaptureError) -> SessionOutcome {
        log::error!("capture attempt failed: {err}");
        let message = err.user_message().to_string();
        self.reset();
        SessionOutcome::Failed(message)
    }

    async fn emit(&self, event: CaptureEvent) {
        if self.events.send(event).await.is_err() {
            log::debug!("capture event receiver dropped");
        }
    }

    /// Teardown shared by every exit path: drag state gone, overlay
    /// references released, controller back to `Idle`.
    fn reset(&mut self) {
        self.tracker.cancel();
        self.overlay.clear();
        self.phase = SessionPhase::Idle;
    }
}
