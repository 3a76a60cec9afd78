//! Render Feature Pass Trait
//!
//! Defines the lifecycle a host pipeline drives for an injected pass.
//!
//! # Lifecycle
//! - The pass is created once when the feature is attached.
//! - Each frame it runs, the host calls `configure`, then `execute`, then
//!   `cleanup`.
//! - `cleanup` runs after every `configure`, whether or not `execute` ran or
//!   succeeded. [`run_lifecycle`] is the reference driver for that rule.

use super::context::{ExecuteContext, FrameDescriptor};
use crate::errors::Result;
use crate::renderer::frustum_rays::FrustumCorners;
use crate::renderer::graph::command::CommandQueue;
use crate::renderer::graph::transient_pool::{TargetBackend, TransientTargetPool};
use crate::resources::volumetric::RenderPassEvent;

/// A pass injected into the host pipeline.
pub trait RenderFeaturePass<B: TargetBackend> {
    /// Returns the pass name, used for logging and GPU debug labels.
    fn name(&self) -> &str;

    /// Where the host inserts this pass.
    fn event(&self) -> RenderPassEvent;

    /// Acquires the per-frame resources for a frame of the given size.
    fn configure(&mut self, pool: &mut TransientTargetPool<B>, desc: &FrameDescriptor)
    -> Result<()>;

    /// Records and submits the frame's GPU work.
    fn execute(&mut self, ctx: &mut ExecuteContext<'_, B>) -> Result<()>;

    /// Releases everything acquired since `configure`. Must not fail.
    fn cleanup(&mut self, pool: &mut TransientTargetPool<B>);
}

/// Drives one frame of `pass`: configure, execute, then cleanup on every
/// exit path.
///
/// Returns the first error from configure or execute after cleanup has run.
pub fn run_lifecycle<B, P>(
    pass: &mut P,
    pool: &mut TransientTargetPool<B>,
    queue: &mut dyn CommandQueue<B>,
    frustum: &FrustumCorners,
    desc: &FrameDescriptor,
) -> Result<()>
where
    B: TargetBackend,
    P: RenderFeaturePass<B> + ?Sized,
{
    let result = match pass.configure(pool, desc) {
        Ok(()) => {
            let mut ctx = ExecuteContext {
                pool: &mut *pool,
                queue,
                frustum,
            };
            pass.execute(&mut ctx)
        }
        Err(err) => Err(err),
    };

    pass.cleanup(pool);

    if let Err(err) = &result {
        log::error!("{} aborted this frame: {err}", pass.name());
    }
    result
}
