//! Volumetric Light Post-Processing Configuration
//!
//! This module defines volumetric light settings as pure data, following the
//! same pattern as the other post-processing settings structs: public fields
//! for flags the host toggles freely, private fields behind clamping setters
//! for values with a valid range.
//!
//! The settings are owned by the host pipeline (or its inspector). The pass
//! reads them once per frame and never writes to them.

use crate::resources::material::MaterialHandle;

/// Upper bound for blur iterations. Beyond this the pyramid floor is always
/// reached first for any realistic frame size.
pub const MAX_BLUR_ITERATIONS: u32 = 16;

// ============================================================================
// RenderPassEvent
// ============================================================================

/// Insertion point of a pass in the host pipeline.
///
/// The discriminants are the host's ordinals; passes injected at the same
/// frame stage are ordered by them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[repr(u32)]
pub enum RenderPassEvent {
    BeforeRendering = 0,
    BeforeRenderingShadows = 50,
    AfterRenderingShadows = 100,
    BeforeRenderingPrePasses = 150,
    AfterRenderingPrePasses = 200,
    BeforeRenderingOpaques = 250,
    AfterRenderingOpaques = 300,
    BeforeRenderingSkybox = 350,
    AfterRenderingSkybox = 400,
    BeforeRenderingTransparents = 450,
    AfterRenderingTransparents = 500,
    #[default]
    BeforeRenderingPostProcessing = 550,
    AfterRenderingPostProcessing = 600,
    AfterRendering = 1000,
}

impl RenderPassEvent {
    #[inline]
    #[must_use]
    pub fn ordinal(self) -> u32 {
        self as u32
    }

    /// Maps a host ordinal back to its event, if it names one.
    #[must_use]
    pub fn from_ordinal(ordinal: u32) -> Option<Self> {
        use RenderPassEvent::{
            AfterRendering, AfterRenderingOpaques, AfterRenderingPostProcessing,
            AfterRenderingPrePasses, AfterRenderingShadows, AfterRenderingSkybox,
            AfterRenderingTransparents, BeforeRendering, BeforeRenderingOpaques,
            BeforeRenderingPostProcessing, BeforeRenderingPrePasses, BeforeRenderingShadows,
            BeforeRenderingSkybox, BeforeRenderingTransparents,
        };
        [
            BeforeRendering,
            BeforeRenderingShadows,
            AfterRenderingShadows,
            BeforeRenderingPrePasses,
            AfterRenderingPrePasses,
            BeforeRenderingOpaques,
            AfterRenderingOpaques,
            BeforeRenderingSkybox,
            AfterRenderingSkybox,
            BeforeRenderingTransparents,
            AfterRenderingTransparents,
            BeforeRenderingPostProcessing,
            AfterRenderingPostProcessing,
            AfterRendering,
        ]
        .into_iter()
        .find(|e| e.ordinal() == ordinal)
    }
}

// ============================================================================
// VolumetricLightSettings
// ============================================================================

/// Volumetric light post-processing configuration.
///
/// # Usage
///
/// ```rust,ignore
/// let mut settings = VolumetricLightSettings::new(material);
/// settings.set_iterations(4);
/// settings.set_insertion_point(RenderPassEvent::BeforeRenderingPostProcessing);
/// ```
#[derive(Debug, Clone)]
pub struct VolumetricLightSettings {
    /// Whether the effect contributes to the frame.
    ///
    /// Default: `true`
    pub enabled: bool,

    /// Where the pass is inserted in the host pipeline.
    ///
    /// Default: [`RenderPassEvent::BeforeRenderingPostProcessing`]
    insertion_point: RenderPassEvent,

    /// Program providing the extraction, blur and composite techniques.
    material: Option<MaterialHandle>,

    /// Number of blur steps on the way down the pyramid.
    ///
    /// The actual count is limited by the frame size: halving stops once a
    /// dimension would drop below 2 pixels.
    ///
    /// Default: `4`
    iterations: u32,
}

impl Default for VolumetricLightSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            insertion_point: RenderPassEvent::default(),
            material: None,
            iterations: 4,
        }
    }
}

impl VolumetricLightSettings {
    /// Creates enabled settings bound to `material`.
    #[must_use]
    pub fn new(material: MaterialHandle) -> Self {
        Self {
            material: Some(material),
            ..Self::default()
        }
    }

    #[inline]
    #[must_use]
    pub fn insertion_point(&self) -> RenderPassEvent {
        self.insertion_point
    }

    #[inline]
    #[must_use]
    pub fn material(&self) -> Option<&MaterialHandle> {
        self.material.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn set_insertion_point(&mut self, event: RenderPassEvent) {
        self.insertion_point = event;
    }

    pub fn set_material(&mut self, material: Option<MaterialHandle>) {
        self.material = material;
    }

    /// Sets the number of blur iterations.
    ///
    /// Zero would leave the pyramid without its initial blur, so the value
    /// is clamped to `1..=MAX_BLUR_ITERATIONS`.
    pub fn set_iterations(&mut self, iterations: u32) {
        let clamped = iterations.clamp(1, MAX_BLUR_ITERATIONS);
        if clamped != iterations {
            log::warn!("Volumetric blur iterations {iterations} clamped to {clamped}");
        }
        self.iterations = clamped;
    }
}
