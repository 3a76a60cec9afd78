//! Volumetric Light Feature
//!
//! Host-facing entry point. A pipeline attaches the feature once, then calls
//! [`VolumetricLightFeature::render_frame`] for every camera frame.
//!
//! ```rust,ignore
//! let mut feature = VolumetricLightFeature::create(settings)?;
//!
//! // every frame
//! let outcome = feature.render_frame(
//!     Some(&camera),
//!     &FrameDescriptor::new(width, height),
//!     &mut pool,
//!     &mut queue,
//! )?;
//! pool.end_frame();
//! ```

use crate::errors::{Result, VolumetricError};
use crate::renderer::frustum_rays::FrustumRayProvider;
use crate::renderer::graph::command::CommandQueue;
use crate::renderer::graph::context::FrameDescriptor;
use crate::renderer::graph::node::run_lifecycle;
use crate::renderer::graph::passes::volumetric::PyramidStats;
use crate::renderer::graph::scheduler::PassScheduler;
use crate::renderer::graph::transient_pool::{TargetBackend, TransientTargetPool};
use crate::resources::volumetric::{RenderPassEvent, VolumetricLightSettings};
use crate::scene::camera::Camera;

/// Result of one [`VolumetricLightFeature::render_frame`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameOutcome {
    /// The effect is disabled; nothing was recorded.
    Skipped,
    /// The pyramid ran and was submitted.
    Rendered(PyramidStats),
}

/// Settings, frustum rays and pass scheduler bundled for a host pipeline.
#[derive(Debug)]
pub struct VolumetricLightFeature {
    settings: VolumetricLightSettings,
    rays: FrustumRayProvider,
    pass: PassScheduler,
}

impl VolumetricLightFeature {
    /// Attaches the feature. Fails fast when `settings` has no material.
    pub fn create(settings: VolumetricLightSettings) -> Result<Self> {
        let pass = PassScheduler::create(&settings)?;
        Ok(Self {
            settings,
            rays: FrustumRayProvider::new(),
            pass,
        })
    }

    #[inline]
    #[must_use]
    pub fn settings(&self) -> &VolumetricLightSettings {
        &self.settings
    }

    #[inline]
    #[must_use]
    pub fn pass(&self) -> &PassScheduler {
        &self.pass
    }

    #[inline]
    #[must_use]
    pub fn rays(&self) -> &FrustumRayProvider {
        &self.rays
    }

    /// Whether the next frame will run the pass.
    #[inline]
    #[must_use]
    pub fn should_run(&self) -> bool {
        self.settings.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.settings.set_enabled(enabled);
    }

    pub fn set_iterations(&mut self, iterations: u32) {
        self.settings.set_iterations(iterations);
    }

    pub fn set_insertion_point(&mut self, event: RenderPassEvent) {
        self.settings.set_insertion_point(event);
    }

    #[must_use]
    pub fn insertion_point(&self) -> RenderPassEvent {
        self.settings.insertion_point()
    }

    /// Renders one frame of the effect.
    ///
    /// Disabled frames return [`FrameOutcome::Skipped`] without touching the
    /// pool. A missing camera fails the tick before anything is acquired.
    /// Any other failure happens after configure, so cleanup has already
    /// returned every target by the time the error is reported.
    pub fn render_frame<B: TargetBackend>(
        &mut self,
        camera: Option<&Camera>,
        desc: &FrameDescriptor,
        pool: &mut TransientTargetPool<B>,
        queue: &mut dyn CommandQueue<B>,
    ) -> Result<FrameOutcome> {
        if !self.should_run() {
            log::trace!("Volumetric light disabled, frame skipped");
            return Ok(FrameOutcome::Skipped);
        }

        let Some(camera) = camera else {
            log::error!("Volumetric light tick without an active camera");
            return Err(VolumetricError::MissingCamera);
        };
        let frustum = *self.rays.update(camera);

        self.pass.apply_settings(&self.settings)?;
        run_lifecycle(&mut self.pass, pool, queue, &frustum, desc)?;

        Ok(FrameOutcome::Rendered(
            self.pass.last_stats().cloned().unwrap_or_default(),
        ))
    }
}
