//! Fakes for the renderer and frame-host boundaries.

use crate::error::RendererError;
use crate::frame::{FrameHandle, FrameHost};
use crate::path::Pose;
use crate::renderer::MapRenderer;

/// Records every pose it receives.
#[derive(Debug, Default)]
pub(crate) struct RecordingRenderer {
    pub poses: Vec<Pose>,
    pub reject_all: bool,
}

impl MapRenderer for RecordingRenderer {
    fn set_pose(&mut self, pose: &Pose) -> Result<(), RendererError> {
        if self.reject_all {
            return Err(RendererError::Rejected("invalid camera".into()));
        }
        self.poses.push(*pose);
        Ok(())
    }
}

/// Hands out sequential frame handles and tracks which are outstanding.
#[derive(Debug, Default)]
pub(crate) struct ManualFrameHost {
    next_id: i32,
    pub outstanding: Vec<FrameHandle>,
    pub cancelled: Vec<FrameHandle>,
    pub requested: usize,
}

impl FrameHost for ManualFrameHost {
    fn request_frame(&mut self) -> FrameHandle {
        self.next_id += 1;
        self.requested += 1;
        let handle = FrameHandle(self.next_id);
        self.outstanding.push(handle);
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        self.outstanding.retain(|h| *h != handle);
        self.cancelled.push(handle);
    }
}

impl ManualFrameHost {
    /// Simulates the browser running the pending callback.
    pub fn fire(&mut self) -> Option<FrameHandle> {
        if self.outstanding.is_empty() {
            None
        } else {
            Some(self.outstanding.remove(0))
        }
    }
}
