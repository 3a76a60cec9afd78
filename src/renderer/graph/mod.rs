//! Render pass organisation
//!
//! Provides:
//! - TransientTargetPool: pooled per-frame render targets
//! - CommandBatch / CommandQueue: recorded blits and their replay
//! - RenderFeaturePass: lifecycle trait driven by the host pipeline
//! - ExecuteContext / FrameDescriptor: per-frame contexts
//! - PassScheduler: lifecycle state machine of the volumetric pass
//! - passes: the blur pyramid engine

pub mod command;
pub mod context;
pub mod node;
pub mod passes;
pub mod scheduler;
pub mod transient_pool;

pub use command::{BlitCommand, BlitDest, BlitSource, CommandBatch, CommandQueue};
pub use context::{ExecuteContext, FrameDescriptor};
pub use node::{RenderFeaturePass, run_lifecycle};
pub use scheduler::{PassScheduler, PassState};
pub use transient_pool::{
    PoolStats, TargetBackend, TargetDesc, TargetId, TemporaryTarget, TransientTargetPool,
};
