#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

pub mod errors;
pub mod renderer;
pub mod resources;
pub mod scene;

pub use errors::{Result, VolumetricError};
pub use renderer::backend::{HeadlessBackend, RecordingQueue};
pub use renderer::graph::{FrameDescriptor, PassScheduler, PassState, TransientTargetPool};
pub use renderer::graph::passes::{BlurPyramidEngine, PyramidStats};
pub use renderer::{FrameOutcome, FrustumCorners, FrustumRayProvider, VolumetricLightFeature};
pub use resources::{MaterialHandle, PassStage, RenderPassEvent, VolumetricLightSettings};
pub use scene::Camera;
