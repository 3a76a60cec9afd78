//! Per-frame contexts handed to render feature passes.

use crate::errors::{Result, VolumetricError};
use crate::renderer::frustum_rays::FrustumCorners;
use crate::renderer::graph::command::CommandQueue;
use crate::renderer::graph::transient_pool::{TargetBackend, TransientTargetPool};

/// Size of the camera color target for the frame being rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameDescriptor {
    pub width: u32,
    pub height: u32,
}

impl FrameDescriptor {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Rejects frames with a zero dimension.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(VolumetricError::InvalidFrameSize {
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }
}

/// Everything a pass needs while executing.
///
/// The pool is shared with the rest of the host pipeline; the queue replays
/// the recorded batch on the backend.
pub struct ExecuteContext<'a, B: TargetBackend> {
    pub pool: &'a mut TransientTargetPool<B>,
    pub queue: &'a mut dyn CommandQueue<B>,
    /// Rays published by the frustum provider for this tick.
    pub frustum: &'a FrustumCorners,
}
