//! Headless backend.
//!
//! Targets carry only their size; submitted batches are kept for inspection.
//! Useful for dry runs, tooling and tests that need the exact command stream
//! without a GPU.

use crate::errors::{Result, VolumetricError};
use crate::renderer::graph::command::{CommandBatch, CommandQueue};
use crate::renderer::graph::transient_pool::{TargetBackend, TargetDesc, TransientTargetPool};

/// Size-only stand-in for a GPU texture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadlessTexture {
    /// Creation order, unique per backend.
    pub serial: u64,
    pub width: u32,
    pub height: u32,
    pub label: &'static str,
}

/// Backend that creates [`HeadlessTexture`]s, optionally under a budget.
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    texture_budget: Option<usize>,
    created: u64,
}

impl HeadlessBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails every creation once `budget` textures exist.
    #[must_use]
    pub fn with_texture_budget(budget: usize) -> Self {
        Self {
            texture_budget: Some(budget),
            created: 0,
        }
    }

    pub fn set_texture_budget(&mut self, budget: Option<usize>) {
        self.texture_budget = budget;
    }

    #[must_use]
    pub fn created(&self) -> u64 {
        self.created
    }
}

impl TargetBackend for HeadlessBackend {
    type Texture = HeadlessTexture;

    fn create_target(&mut self, desc: &TargetDesc) -> Result<HeadlessTexture> {
        if desc.width == 0 || desc.height == 0 {
            return Err(VolumetricError::TargetAllocation {
                width: desc.width,
                height: desc.height,
                reason: "zero-sized target".to_string(),
            });
        }
        if let Some(budget) = self.texture_budget
            && self.created as usize >= budget
        {
            return Err(VolumetricError::TargetAllocation {
                width: desc.width,
                height: desc.height,
                reason: format!("texture budget of {budget} exhausted"),
            });
        }

        self.created += 1;
        Ok(HeadlessTexture {
            serial: self.created,
            width: desc.width,
            height: desc.height,
            label: desc.label,
        })
    }
}

/// Queue that validates and stores every submitted batch.
#[derive(Debug, Default)]
pub struct RecordingQueue {
    batches: Vec<CommandBatch>,
    fail_next: Option<String>,
}

impl RecordingQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next submit fail with `reason` without recording the batch.
    pub fn fail_next_submit(&mut self, reason: impl Into<String>) {
        self.fail_next = Some(reason.into());
    }

    #[must_use]
    pub fn batches(&self) -> &[CommandBatch] {
        &self.batches
    }

    #[must_use]
    pub fn last(&self) -> Option<&CommandBatch> {
        self.batches.last()
    }

    #[must_use]
    pub fn submit_count(&self) -> usize {
        self.batches.len()
    }

    pub fn take_batches(&mut self) -> Vec<CommandBatch> {
        std::mem::take(&mut self.batches)
    }
}

impl<B: TargetBackend> CommandQueue<B> for RecordingQueue {
    fn submit(&mut self, batch: &CommandBatch, pool: &TransientTargetPool<B>) -> Result<()> {
        if let Some(reason) = self.fail_next.take() {
            return Err(VolumetricError::SubmitFailed(reason));
        }

        if batch.material().is_none() && batch.commands().iter().any(|c| !c.is_copy()) {
            return Err(VolumetricError::MaterialMismatch);
        }
        if let Some(id) = batch
            .referenced_targets()
            .find(|id| pool.texture(*id).is_none())
        {
            return Err(VolumetricError::UnknownTarget(id));
        }

        log::trace!(
            "Recorded '{}' with {} commands",
            batch.label(),
            batch.commands().len()
        );
        self.batches.push(batch.clone());
        Ok(())
    }
}
