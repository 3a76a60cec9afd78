//! Render pass implementations.

pub mod volumetric;

pub use volumetric::{BlurPyramidEngine, FrameTargets, PyramidStats, TargetStack};
