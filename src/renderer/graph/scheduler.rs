//! Volumetric Pass Scheduler
//!
//! Bridges the host's per-frame callbacks to [`BlurPyramidEngine`].
//!
//! ```text
//!            create()
//!               │
//!               ▼
//!          ┌─────────┐  configure  ┌────────────┐  execute  ┌───────────┐
//!          │ Created │────────────▶│ Configured │──────────▶│ Executing │
//!          └─────────┘             └────────────┘           └───────────┘
//!                                     ▲      │ cleanup            │ cleanup
//!                           configure │      ▼                    ▼
//!                                   ┌───────────────────────────────┐
//!                                   │           CleanedUp           │
//!                                   └───────────────────────────────┘
//! ```

use crate::errors::{Result, VolumetricError};
use crate::renderer::frustum_rays::FrustumCorners;
use crate::renderer::graph::command::CommandQueue;
use crate::renderer::graph::context::{ExecuteContext, FrameDescriptor};
use crate::renderer::graph::node::RenderFeaturePass;
use crate::renderer::graph::passes::volumetric::{
    BlurPyramidEngine, FrameTargets, PASS_LABEL, PyramidStats,
};
use crate::renderer::graph::transient_pool::{TargetBackend, TransientTargetPool};
use crate::resources::volumetric::{RenderPassEvent, VolumetricLightSettings};

/// Lifecycle state of a [`PassScheduler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassState {
    Created,
    Configured,
    Executing,
    CleanedUp,
}

impl PassState {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            PassState::Created => "created",
            PassState::Configured => "configured",
            PassState::Executing => "executing",
            PassState::CleanedUp => "cleaned up",
        }
    }
}

/// Per-frame owner of the volumetric pass resources.
#[derive(Debug)]
pub struct PassScheduler {
    event: RenderPassEvent,
    engine: BlurPyramidEngine,
    state: PassState,
    targets: FrameTargets,
    frame: Option<FrameDescriptor>,
    last_stats: Option<PyramidStats>,
    frames_executed: u64,
}

impl PassScheduler {
    /// Binds the pass to `settings`.
    ///
    /// Fails with [`VolumetricError::MissingMaterial`] when no material is
    /// set, rather than recording no-op blits every frame.
    pub fn create(settings: &VolumetricLightSettings) -> Result<Self> {
        let material = settings
            .material()
            .cloned()
            .ok_or(VolumetricError::MissingMaterial)?;

        log::debug!(
            "{PASS_LABEL} created: material '{}', {} iterations, inserted at {:?}",
            material.label(),
            settings.iterations(),
            settings.insertion_point(),
        );

        Ok(Self {
            event: settings.insertion_point(),
            engine: BlurPyramidEngine::new(material, settings.iterations()),
            state: PassState::Created,
            targets: FrameTargets::default(),
            frame: None,
            last_stats: None,
            frames_executed: 0,
        })
    }

    /// Picks up settings changes between frames.
    ///
    /// Ignored while a frame is in flight, so a frame always runs with the
    /// settings it was configured with.
    pub fn apply_settings(&mut self, settings: &VolumetricLightSettings) -> Result<()> {
        if matches!(self.state, PassState::Configured | PassState::Executing) {
            log::warn!("{PASS_LABEL}: settings change ignored mid-frame");
            return Ok(());
        }

        let material = settings
            .material()
            .ok_or(VolumetricError::MissingMaterial)?;
        if material != self.engine.material() {
            self.engine = BlurPyramidEngine::new(material.clone(), settings.iterations());
        } else {
            self.engine.set_iterations(settings.iterations());
        }
        self.event = settings.insertion_point();
        Ok(())
    }

    #[inline]
    #[must_use]
    pub fn state(&self) -> PassState {
        self.state
    }

    #[inline]
    #[must_use]
    pub fn engine(&self) -> &BlurPyramidEngine {
        &self.engine
    }

    #[inline]
    #[must_use]
    pub fn targets(&self) -> &FrameTargets {
        &self.targets
    }

    /// Frame currently configured, if any.
    #[inline]
    #[must_use]
    pub fn frame(&self) -> Option<FrameDescriptor> {
        self.frame
    }

    /// Stats of the most recent successful execute.
    #[inline]
    #[must_use]
    pub fn last_stats(&self) -> Option<&PyramidStats> {
        self.last_stats.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn frames_executed(&self) -> u64 {
        self.frames_executed
    }

    fn transition_error(&self, operation: &'static str) -> VolumetricError {
        VolumetricError::InvalidTransition {
            state: self.state.as_str(),
            operation,
        }
    }

    /// Runs the pyramid for the configured frame and returns what it did.
    pub fn execute_frame<B: TargetBackend>(
        &mut self,
        pool: &mut TransientTargetPool<B>,
        queue: &mut dyn CommandQueue<B>,
        frustum: &FrustumCorners,
    ) -> Result<PyramidStats> {
        if self.state != PassState::Configured {
            return Err(self.transition_error("execute"));
        }
        self.state = PassState::Executing;

        let stats = self.engine.run(&mut self.targets, frustum, pool, queue)?;
        self.frames_executed += 1;
        self.last_stats = Some(stats.clone());
        Ok(stats)
    }
}

impl<B: TargetBackend> RenderFeaturePass<B> for PassScheduler {
    fn name(&self) -> &str {
        PASS_LABEL
    }

    fn event(&self) -> RenderPassEvent {
        self.event
    }

    fn configure(
        &mut self,
        pool: &mut TransientTargetPool<B>,
        desc: &FrameDescriptor,
    ) -> Result<()> {
        if !matches!(self.state, PassState::Created | PassState::CleanedUp) {
            return Err(self.transition_error("configure"));
        }
        // Entering Configured before acquiring makes cleanup mandatory even
        // when an acquisition below fails.
        self.state = PassState::Configured;
        self.frame = Some(*desc);

        desc.validate()?;
        self.targets.acquire(pool, desc.width, desc.height)?;

        log::trace!("{PASS_LABEL} configured for {}x{}", desc.width, desc.height);
        Ok(())
    }

    fn execute(&mut self, ctx: &mut ExecuteContext<'_, B>) -> Result<()> {
        self.execute_frame(ctx.pool, ctx.queue, ctx.frustum)
            .map(|_| ())
    }

    fn cleanup(&mut self, pool: &mut TransientTargetPool<B>) {
        if !matches!(self.state, PassState::Configured | PassState::Executing) {
            log::warn!(
                "{PASS_LABEL}: cleanup called while {}",
                self.state.as_str()
            );
        }

        let released = self.targets.release_all(pool);
        self.state = PassState::CleanedUp;
        self.frame = None;
        log::trace!("{PASS_LABEL} cleaned up, {released} target(s) released");
    }
}
