//! Volumetric Material Binding
//!
//! The volumetric effect drives one shared shader program with three
//! selectable techniques. The program itself is owned by the host (shader
//! source and asset definition live outside this crate); the pass only holds
//! an opaque [`MaterialHandle`] and passes [`ShaderParams`] explicitly to
//! every recorded blit.

use std::borrow::Cow;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::renderer::frustum_rays::FrustumCorners;
use crate::renderer::graph::transient_pool::TargetId;

/// Global unique ID generator for material handles.
static NEXT_MATERIAL_ID: AtomicU64 = AtomicU64::new(1);

/// Shader parameter name of the snapshot texture read by every technique.
pub const SOURCE_TEX_PARAM: &str = "_SourceTex";

/// Shader parameter names of the frustum rays, indexed like [`FrustumCorners`].
pub const FRUSTUM_RAY_PARAMS: [&str; 4] = ["_BL", "_TL", "_TR", "_BR"];

/// Opaque handle to the host's volumetric shader program.
///
/// Handles compare by identity: two handles created separately never match,
/// even with the same label.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MaterialHandle {
    id: u64,
    label: Cow<'static, str>,
}

impl MaterialHandle {
    /// Allocates a new handle with a fresh identity.
    #[must_use]
    pub fn new(label: impl Into<Cow<'static, str>>) -> Self {
        Self {
            id: NEXT_MATERIAL_ID.fetch_add(1, Ordering::Relaxed),
            label: label.into(),
        }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[inline]
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }
}

/// Technique selector within the shared volumetric program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum PassStage {
    /// Ray-marches the light contribution from depth and frustum rays.
    Extraction = 0,
    /// Blur used on both the down and up sweep.
    Blur = 1,
    /// Blends the blurred light buffer onto the camera target.
    Composite = 2,
}

impl PassStage {
    pub const ALL: [PassStage; 3] = [PassStage::Extraction, PassStage::Blur, PassStage::Composite];

    #[inline]
    #[must_use]
    pub fn index(self) -> u32 {
        self as u32
    }

    /// Fragment entry point used by GPU backends for this technique.
    #[must_use]
    pub fn entry_point(self) -> &'static str {
        match self {
            PassStage::Extraction => "fs_extract",
            PassStage::Blur => "fs_blur",
            PassStage::Composite => "fs_composite",
        }
    }
}

/// Named bindings handed to the volumetric program for one batch.
#[derive(Debug, Clone, PartialEq)]
pub struct ShaderParams {
    /// Snapshot of the camera color, bound as `_SourceTex`.
    pub source_texture: Option<TargetId>,
    /// World-space frustum rays, bound as `_BL`, `_TL`, `_TR`, `_BR`.
    pub frustum: FrustumCorners,
}

impl ShaderParams {
    #[must_use]
    pub fn new(frustum: FrustumCorners) -> Self {
        Self {
            source_texture: None,
            frustum,
        }
    }

    /// Looks up a bound ray by its shader parameter name.
    #[must_use]
    pub fn vector(&self, name: &str) -> Option<glam::Vec3> {
        FRUSTUM_RAY_PARAMS
            .iter()
            .position(|p| *p == name)
            .map(|i| self.frustum.rays()[i])
    }

    /// Looks up a bound texture by its shader parameter name.
    #[must_use]
    pub fn texture(&self, name: &str) -> Option<TargetId> {
        if name == SOURCE_TEX_PARAM {
            self.source_texture
        } else {
            None
        }
    }
}

impl Default for ShaderParams {
    fn default() -> Self {
        Self::new(FrustumCorners::default())
    }
}
