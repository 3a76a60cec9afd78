//! Pool backends and command queues.
//!
//! - [`headless`]: size-only targets and a recording queue
//! - [`gpu`]: `wgpu` textures, pipelines and submission

pub mod gpu;
pub mod headless;

pub use gpu::{
    DEFAULT_TARGET_FORMAT, REFERENCE_WGSL, VolumetricPipelines, VolumetricUniforms, WgpuCommandQueue,
    WgpuTarget, WgpuTargetBackend,
};
pub use headless::{HeadlessBackend, HeadlessTexture, RecordingQueue};
