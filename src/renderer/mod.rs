//! Volumetric Light Renderer
//!
//! - [`frustum_rays`]: per-tick world-space far-plane corner rays
//! - [`graph`]: transient pool, command recording, pass lifecycle and the
//!   blur pyramid itself
//! - [`backend`]: headless and wgpu implementations of the pool backend and
//!   command queue
//! - [`feature`]: host-facing frame driver

pub mod backend;
pub mod feature;
pub mod frustum_rays;
pub mod graph;

pub use feature::{FrameOutcome, VolumetricLightFeature};
pub use frustum_rays::{DebugRay, FrustumCorners, FrustumRayProvider};
