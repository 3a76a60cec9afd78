//! Scene-side inputs of the volumetric pass.

pub mod camera;

pub use camera::{Camera, ProjectionType};
