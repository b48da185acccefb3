//! Boundary between the choreographer and the external map renderer.

use crate::error::RendererError;
use crate::path::Pose;

/// The map renderer as seen from the choreographer.
///
/// Implementations translate exceptions from the underlying engine into
/// [`RendererError::Rejected`] instead of panicking.
pub trait MapRenderer {
    fn set_pose(&mut self, pose: &Pose) -> Result<(), RendererError>;
}

/// Readiness of the underlying renderer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RendererStatus {
    /// Tiles/assets still loading; poses are dropped.
    #[default]
    Pending,
    Ready,
    /// Unrecoverable failure reported by the renderer; poses are dropped
    /// until it reports ready again.
    Failed(String),
}

/// Outcome of a single [`RendererAdapter::push`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    Applied,
    /// Renderer not ready; the pose was stale by the next frame anyway.
    Dropped,
    /// Renderer threw on this pose.
    Rejected,
}

/// Forwards poses to a [`MapRenderer`] only while it is ready.
///
/// Nothing is queued: a frame computed while the renderer is unavailable is
/// simply dropped, and the first pose computed after readiness goes through.
#[derive(Debug)]
pub struct RendererAdapter<R> {
    renderer: R,
    status: RendererStatus,
    dropped_frames: u64,
    applied_frames: u64,
}

impl<R: MapRenderer> RendererAdapter<R> {
    pub fn new(renderer: R) -> Self {
        Self {
            renderer,
            status: RendererStatus::Pending,
            dropped_frames: 0,
            applied_frames: 0,
        }
    }

    pub fn push(&mut self, pose: &Pose) -> PushOutcome {
        if self.status != RendererStatus::Ready {
            self.dropped_frames += 1;
            return PushOutcome::Dropped;
        }
        match self.renderer.set_pose(pose) {
            Ok(()) => {
                self.applied_frames += 1;
                PushOutcome::Applied
            }
            Err(RendererError::NotReady) => {
                self.dropped_frames += 1;
                PushOutcome::Dropped
            }
            Err(err) => {
                tracing::warn!(error = %err, ?pose, "map renderer rejected pose");
                PushOutcome::Rejected
            }
        }
    }

    /// The renderer became interactive (or recovered).
    pub fn mark_ready(&mut self) {
        if self.status != RendererStatus::Ready {
            tracing::info!(dropped = self.dropped_frames, "map renderer ready");
        }
        self.status = RendererStatus::Ready;
    }

    /// The renderer reported an unrecoverable failure.
    pub fn mark_failed(&mut self, diagnostic: impl Into<String>) {
        let diagnostic = diagnostic.into();
        tracing::error!(%diagnostic, "map renderer failed, holding last pose");
        self.status = RendererStatus::Failed(diagnostic);
    }

    pub fn status(&self) -> &RendererStatus {
        &self.status
    }

    pub fn is_ready(&self) -> bool {
        self.status == RendererStatus::Ready
    }

    pub fn dropped_frames(&self) -> u64 {
        self.dropped_frames
    }

    pub fn applied_frames(&self) -> u64 {
        self.applied_frames
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }
}
