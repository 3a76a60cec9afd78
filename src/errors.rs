//! Error Types
//!
//! This module defines the error types used throughout the volumetric pass.
//!
//! # Overview
//!
//! The main error type [`VolumetricError`] covers all failure modes including:
//! - Missing resources detected when the pass is created or ticked
//! - Per-frame resource exhaustion in the transient target pool
//! - Lifecycle misuse by the host pipeline
//! - Backend submission failures
//!
//! # Usage
//!
//! All public APIs return [`Result<T>`] which is an alias for `std::result::Result<T, VolumetricError>`.
//!
//! ```rust,ignore
//! use myth_volumetric::errors::{VolumetricError, Result};
//!
//! fn configure_frame() -> Result<()> {
//!     // Operations that may fail return Result
//!     Ok(())
//! }
//! ```

use thiserror::Error;

use crate::renderer::graph::transient_pool::TargetId;

/// The main error type for the volumetric light pass.
///
/// Missing-resource variants are fatal preconditions and are reported when the
/// pass is created (or when a frame is ticked without a camera). Allocation and
/// submission variants are frame-local: they abort the current frame only.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VolumetricError {
    // ========================================================================
    // Missing Resources
    // ========================================================================
    /// The settings carry no material, so every blit stage would be a no-op.
    #[error("Volumetric light material is not set")]
    MissingMaterial,

    /// No active camera was supplied for this tick.
    #[error("No active camera for the volumetric light pass")]
    MissingCamera,

    // ========================================================================
    // Frame Resources
    // ========================================================================
    /// The host described a frame with a zero dimension.
    #[error("Invalid frame size: {width}x{height}")]
    InvalidFrameSize {
        /// Requested frame width
        width: u32,
        /// Requested frame height
        height: u32,
    },

    /// The transient pool could not provide a target.
    #[error("Failed to allocate {width}x{height} transient target: {reason}")]
    TargetAllocation {
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
        /// Backend-provided reason
        reason: String,
    },

    /// A recorded command references a target the pool cannot resolve.
    #[error("Unknown transient target: {0:?}")]
    UnknownTarget(TargetId),

    // ========================================================================
    // Lifecycle Errors
    // ========================================================================
    /// A lifecycle method was called in a state that does not allow it.
    #[error("Cannot {operation} while the pass is {state}")]
    InvalidTransition {
        /// Current scheduler state
        state: &'static str,
        /// Rejected operation
        operation: &'static str,
    },

    /// Execute was reached without the per-frame targets in place.
    #[error("Pass executed without configured frame targets")]
    NotConfigured,

    // ========================================================================
    // Backend Errors
    // ========================================================================
    /// The batch was recorded for a different material than the backend holds.
    #[error("Command batch material does not match the backend pipelines")]
    MaterialMismatch,

    /// The backend cannot express the requested blit.
    #[error("Unsupported blit: {0}")]
    UnsupportedBlit(String),

    /// The backend rejected the submission.
    #[error("Command submission failed: {0}")]
    SubmitFailed(String),
}

/// Alias for `Result<T, VolumetricError>`.
pub type Result<T> = std::result::Result<T, VolumetricError>;
