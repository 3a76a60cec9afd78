//! Recorded Blit Commands
//!
//! A pass records its whole frame into one [`CommandBatch`]; the backend
//! replays it in order inside a single submission. Recording is infallible
//! and never touches the GPU, so the algorithm can be tested headless and the
//! batch reused across frames after [`CommandBatch::clear`].

use crate::errors::Result;
use crate::renderer::graph::transient_pool::{TargetBackend, TargetId, TransientTargetPool};
use crate::resources::material::{MaterialHandle, PassStage, ShaderParams};

/// Image read by a blit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlitSource {
    /// No upstream image; the technique derives its output from bindings.
    None,
    /// The camera's color target for this frame.
    CameraColor,
    Target(TargetId),
}

/// Image written by a blit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlitDest {
    CameraColor,
    Target(TargetId),
}

/// One copy or fullscreen draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlitCommand {
    pub source: BlitSource,
    pub dest: BlitDest,
    /// `None` is a plain copy; otherwise the technique to run.
    pub stage: Option<PassStage>,
}

impl BlitCommand {
    #[inline]
    #[must_use]
    pub fn is_copy(&self) -> bool {
        self.stage.is_none()
    }
}

/// Ordered list of blits plus the bindings they run with.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandBatch {
    label: &'static str,
    material: Option<MaterialHandle>,
    params: ShaderParams,
    commands: Vec<BlitCommand>,
}

impl CommandBatch {
    #[must_use]
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            material: None,
            params: ShaderParams::default(),
            commands: Vec::new(),
        }
    }

    /// Binds the program and parameters used by every staged blit in this batch.
    pub fn bind(&mut self, material: MaterialHandle, params: ShaderParams) {
        self.material = Some(material);
        self.params = params;
    }

    /// Records a plain copy.
    pub fn copy(&mut self, source: BlitSource, dest: BlitDest) {
        self.push(BlitCommand {
            source,
            dest,
            stage: None,
        });
    }

    /// Records a fullscreen draw with the given technique.
    pub fn blit(&mut self, source: BlitSource, dest: BlitDest, stage: PassStage) {
        self.push(BlitCommand {
            source,
            dest,
            stage: Some(stage),
        });
    }

    fn push(&mut self, command: BlitCommand) {
        log::trace!(
            "[{}] blit {:?} -> {:?} ({:?})",
            self.label,
            command.source,
            command.dest,
            command.stage
        );
        self.commands.push(command);
    }

    /// Drops recorded commands and bindings, keeping the allocation.
    pub fn clear(&mut self) {
        self.commands.clear();
        self.material = None;
        self.params = ShaderParams::default();
    }

    #[inline]
    #[must_use]
    pub fn label(&self) -> &'static str {
        self.label
    }

    #[inline]
    #[must_use]
    pub fn material(&self) -> Option<&MaterialHandle> {
        self.material.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn params(&self) -> &ShaderParams {
        &self.params
    }

    #[inline]
    #[must_use]
    pub fn commands(&self) -> &[BlitCommand] {
        &self.commands
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Every target referenced by the batch, commands first, then bindings.
    pub fn referenced_targets(&self) -> impl Iterator<Item = TargetId> + '_ {
        self.commands
            .iter()
            .flat_map(|c| {
                let src = match c.source {
                    BlitSource::Target(id) => Some(id),
                    _ => None,
                };
                let dst = match c.dest {
                    BlitDest::Target(id) => Some(id),
                    BlitDest::CameraColor => None,
                };
                src.into_iter().chain(dst)
            })
            .chain(self.params.source_texture)
    }
}

/// Replays a batch on a backend.
///
/// Implementations resolve target ids through the pool passed alongside the
/// batch and must submit all commands as one ordered unit of work.
pub trait CommandQueue<B: TargetBackend> {
    fn submit(&mut self, batch: &CommandBatch, pool: &TransientTargetPool<B>) -> Result<()>;
}
