//! Resource definitions that do not depend on a GPU implementation:
//! - Material: opaque program handle, technique selector, shader parameters
//! - Volumetric: effect settings and pipeline insertion points

pub mod material;
pub mod volumetric;

pub use material::{FRUSTUM_RAY_PARAMS, MaterialHandle, PassStage, SOURCE_TEX_PARAM, ShaderParams};
pub use volumetric::{MAX_BLUR_ITERATIONS, RenderPassEvent, VolumetricLightSettings};
