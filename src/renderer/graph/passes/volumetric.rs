//! Volumetric Light Blur Pyramid
//!
//! Records the full volumetric light effect for one frame into a single
//! [`CommandBatch`] and submits it.
//!
//! # Algorithm
//!
//! 1. **Snapshot**: camera color → `source` → camera color → `source`. The
//!    techniques sample `source` (bound as `_SourceTex`) and never the camera
//!    target itself, so the final composite cannot read what it writes.
//!
//! 2. **Extraction**: fullscreen draw with no input image into `src`. The
//!    light contribution comes entirely from the bindings (frustum rays,
//!    `_SourceTex`, scene depth).
//!
//! 3. **Downsample**: blur `src` → `dest` at full size, then keep halving
//!    and blurring into freshly acquired targets until the iteration count
//!    is reached or a dimension would drop below 2 pixels.
//!
//! 4. **Upsample**: walk the stored levels back toward full size, blurring
//!    each coarser level into the next finer one and releasing the coarser
//!    target as soon as it has been read.
//!
//! 5. **Composite**: the finest level is blended onto the camera target.
//!
//! # Data Flow
//!
//! ```text
//!  camera ──copy──▶ source ◀──copy── camera          (_SourceTex)
//!                                                         │
//!  ∅ ──extract──▶ src ──blur──▶ L0 ──blur──▶ L1 ─ … ─▶ Ln  (down)
//!                               ▲            │              │
//!                               └────blur────┴──── … ◀──────┘  (up)
//!                               │
//!                               └──composite──▶ camera
//! ```
//!
//! # Resource Lifetime
//!
//! Every target token lives inside [`FrameTargets`] whenever a fallible
//! call is in flight, so an allocation or submit failure leaves all of them
//! reachable for cleanup. Tokens are only held in locals across the
//! infallible upsample loop.

use smallvec::SmallVec;

use crate::errors::{Result, VolumetricError};
use crate::renderer::frustum_rays::FrustumCorners;
use crate::renderer::graph::command::{BlitDest, BlitSource, CommandBatch, CommandQueue};
use crate::renderer::graph::transient_pool::{
    TargetBackend, TargetDesc, TemporaryTarget, TransientTargetPool,
};
use crate::resources::material::{MaterialHandle, PassStage, ShaderParams};

/// Label of the recorded batch, shown in GPU debuggers.
pub const PASS_LABEL: &str = "Volumetric Light Pass";

/// Downsampling stops before either dimension drops below this.
pub const MIN_PYRAMID_SIZE: u32 = 2;

// ============================================================================
// TargetStack
// ============================================================================

/// Pyramid levels produced on the way down, finest first.
///
/// Levels are removed by position on the way up, driven by the step counter
/// rather than by whatever happens to be on top.
#[derive(Debug, Default)]
pub struct TargetStack {
    levels: Vec<TemporaryTarget>,
}

impl TargetStack {
    pub fn push(&mut self, target: TemporaryTarget) {
        self.levels.push(target);
    }

    pub fn pop(&mut self) -> Option<TemporaryTarget> {
        self.levels.pop()
    }

    /// Removes the level at `index`, counted from the finest.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn remove(&mut self, index: usize) -> TemporaryTarget {
        self.levels.remove(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub(crate) fn drain(&mut self) -> std::vec::Drain<'_, TemporaryTarget> {
        self.levels.drain(..)
    }
}

// ============================================================================
// FrameTargets
// ============================================================================

/// Every target the pass owns during one frame.
///
/// `source`, `src` and `dest` are acquired by configure; the stack grows and
/// shrinks during execute. [`FrameTargets::release_all`] returns whatever is
/// left, whichever step the frame stopped at.
#[derive(Debug, Default)]
pub struct FrameTargets {
    pub(crate) source: Option<TemporaryTarget>,
    pub(crate) src: Option<TemporaryTarget>,
    pub(crate) dest: Option<TemporaryTarget>,
    pub(crate) stack: TargetStack,
}

impl FrameTargets {
    /// Acquires `source`, `src` and `dest` at full frame size.
    ///
    /// Targets acquired before a failure stay stored so cleanup can return them.
    pub fn acquire<B: TargetBackend>(
        &mut self,
        pool: &mut TransientTargetPool<B>,
        width: u32,
        height: u32,
    ) -> Result<()> {
        debug_assert!(self.is_empty(), "frame targets acquired twice");

        self.source = Some(pool.acquire(&TargetDesc::new(width, height, "Volumetric Source"))?);
        self.src = Some(pool.acquire(&TargetDesc::new(width, height, "Volumetric Src"))?);
        self.dest = Some(pool.acquire(&TargetDesc::new(width, height, "Volumetric Dest"))?);
        Ok(())
    }

    /// Returns every held target to the pool. Returns how many were released.
    pub fn release_all<B: TargetBackend>(&mut self, pool: &mut TransientTargetPool<B>) -> usize {
        let mut released = 0;
        for target in [self.source.take(), self.src.take(), self.dest.take()]
            .into_iter()
            .flatten()
        {
            pool.release(target);
            released += 1;
        }
        for target in self.stack.drain() {
            pool.release(target);
            released += 1;
        }
        released
    }

    /// Number of targets currently held.
    #[must_use]
    pub fn held_count(&self) -> usize {
        usize::from(self.source.is_some())
            + usize::from(self.src.is_some())
            + usize::from(self.dest.is_some())
            + self.stack.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.held_count() == 0
    }

    #[must_use]
    pub fn stack(&self) -> &TargetStack {
        &self.stack
    }
}

// ============================================================================
// PyramidStats
// ============================================================================

/// What one execute did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PyramidStats {
    /// Blur steps on the way down, including the initial full-size blur.
    pub down_steps: u32,
    /// Blur steps on the way up.
    pub up_steps: u32,
    /// Stack depth when downsampling finished.
    pub max_stack_depth: usize,
    /// Size of every level, finest first.
    pub sizes: SmallVec<[(u32, u32); 8]>,
}

// ============================================================================
// BlurPyramidEngine
// ============================================================================

/// Records and submits the volumetric extraction, blur pyramid and composite.
#[derive(Debug)]
pub struct BlurPyramidEngine {
    material: MaterialHandle,
    iterations: u32,
    /// Reused every frame; empty between executes.
    batch: CommandBatch,
}

impl BlurPyramidEngine {
    #[must_use]
    pub fn new(material: MaterialHandle, iterations: u32) -> Self {
        Self {
            material,
            iterations: iterations.max(1),
            batch: CommandBatch::new(PASS_LABEL),
        }
    }

    #[inline]
    #[must_use]
    pub fn material(&self) -> &MaterialHandle {
        &self.material
    }

    #[inline]
    #[must_use]
    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    pub fn set_iterations(&mut self, iterations: u32) {
        self.iterations = iterations.max(1);
    }

    /// The batch being recorded; empty outside of [`run`](Self::run).
    #[must_use]
    pub fn batch(&self) -> &CommandBatch {
        &self.batch
    }

    /// Runs the whole pyramid for one frame and submits it.
    ///
    /// `frame` must hold the targets acquired by configure. On return, the
    /// stack is empty on success and the batch is cleared on every path.
    pub fn run<B: TargetBackend>(
        &mut self,
        frame: &mut FrameTargets,
        frustum: &FrustumCorners,
        pool: &mut TransientTargetPool<B>,
        queue: &mut dyn CommandQueue<B>,
    ) -> Result<PyramidStats> {
        let result = match self.record(frame, frustum, pool) {
            Ok(stats) => queue.submit(&self.batch, pool).map(|()| stats),
            Err(err) => Err(err),
        };
        self.batch.clear();
        result
    }

    fn record<B: TargetBackend>(
        &mut self,
        frame: &mut FrameTargets,
        frustum: &FrustumCorners,
        pool: &mut TransientTargetPool<B>,
    ) -> Result<PyramidStats> {
        let source = frame
            .source
            .as_ref()
            .ok_or(VolumetricError::NotConfigured)?
            .id();
        let first = frame
            .src
            .as_ref()
            .ok_or(VolumetricError::NotConfigured)?
            .id();
        let Some(dest) = frame.dest.take() else {
            return Err(VolumetricError::NotConfigured);
        };
        debug_assert!(frame.stack.is_empty(), "target stack not empty at execute");

        let batch = &mut self.batch;
        let mut stats = PyramidStats::default();

        let mut params = ShaderParams::new(*frustum);
        params.source_texture = Some(source);
        batch.bind(self.material.clone(), params);

        // 1. Snapshot
        batch.copy(BlitSource::CameraColor, BlitDest::Target(source));
        batch.copy(BlitSource::Target(source), BlitDest::CameraColor);
        batch.copy(BlitSource::CameraColor, BlitDest::Target(source));

        // 2. Extraction
        batch.blit(BlitSource::None, BlitDest::Target(first), PassStage::Extraction);

        // 3. Initial blur at full size
        batch.blit(
            BlitSource::Target(first),
            BlitDest::Target(dest.id()),
            PassStage::Blur,
        );
        let mut src = dest.id();
        let (mut width, mut height) = dest.size();
        stats.sizes.push((width, height));
        frame.stack.push(dest);
        if let Some(extracted) = frame.src.take() {
            pool.release(extracted);
        }
        let mut step_count: u32 = 1;

        // 4. Downsample
        while step_count < self.iterations {
            width /= 2;
            height /= 2;
            if width < MIN_PYRAMID_SIZE || height < MIN_PYRAMID_SIZE {
                break;
            }

            let dest = pool.acquire(&TargetDesc::new(width, height, "Volumetric Pyramid"))?;
            batch.blit(
                BlitSource::Target(src),
                BlitDest::Target(dest.id()),
                PassStage::Blur,
            );
            src = dest.id();
            stats.sizes.push((width, height));
            frame.stack.push(dest);
            step_count += 1;
        }
        stats.down_steps = step_count;
        stats.max_stack_depth = frame.stack.len();

        // 5. Upsample. The coarsest level is the first source; the remaining
        //    levels are removed by position, coarse to fine.
        let Some(mut src) = frame.stack.pop() else {
            return Err(VolumetricError::NotConfigured);
        };
        for i in (0..(step_count - 1) as usize).rev() {
            let dest = frame.stack.remove(i);
            batch.blit(
                BlitSource::Target(src.id()),
                BlitDest::Target(dest.id()),
                PassStage::Blur,
            );
            pool.release(src);
            src = dest;
            stats.up_steps += 1;
        }
        debug_assert!(frame.stack.is_empty(), "target stack not empty after upsample");

        // 6. Composite
        batch.blit(
            BlitSource::Target(src.id()),
            BlitDest::CameraColor,
            PassStage::Composite,
        );
        frame.src = Some(src);

        log::debug!(
            "Volumetric pyramid recorded: {} down, {} up, levels {:?}, {} commands",
            stats.down_steps,
            stats.up_steps,
            stats.sizes,
            batch.commands().len(),
        );

        Ok(stats)
    }
}
