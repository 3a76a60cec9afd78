//! Transient Target Pool
//!
//! Provides a pooled allocator for short-lived, per-frame render targets.
//! Passes acquire targets while recording a frame and release them as soon as
//! the recorded work no longer needs a *new* reference to them. At frame end,
//! every slot is returned to the free pool for reuse in subsequent frames.
//!
//! # Design
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                TransientTargetPool<B>                    │
//! │                                                          │
//! │  slots: [Slot]          ←── indexed by TargetId          │
//! │  free:  HashMap<Key, Vec<PooledTarget>>                  │
//! │                                                          │
//! │  acquire(desc) → TemporaryTarget   (owning token)        │
//! │  release(TemporaryTarget)          (consumes the token)  │
//! │  texture(TargetId)                 (submit phase)        │
//! │  end_frame()                       (frame boundary)      │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! # Ownership
//!
//! [`TemporaryTarget`] is neither `Clone` nor `Copy`: the only way to give a
//! target back is to move it into [`TransientTargetPool::release`], so a
//! double release does not compile. Recorded commands refer to targets by
//! [`TargetId`], which stays resolvable until [`TransientTargetPool::end_frame`]
//! even after release, because the batch is submitted after the recording
//! loop has already retired its intermediates.
//!
//! # Memory Strategy
//!
//! - Physical textures are **never** destroyed during normal rendering; they
//!   remain in the free pool for reuse.
//! - A released slot is not handed out again within the same frame, so two
//!   commands in one batch never alias the same physical texture by accident.
//! - Call [`TransientTargetPool::trim`] after resolution changes to release
//!   stale textures.

use rustc_hash::FxHashMap;

use crate::errors::Result;

// ─── Public Types ─────────────────────────────────────────────────────────────

/// Lightweight reference to a transient target, used by recorded commands.
///
/// Valid only for the frame it was acquired in; ids from earlier frames
/// resolve to nothing.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct TargetId {
    index: u32,
    generation: u32,
}

impl TargetId {
    /// Slot index inside the pool for the current frame.
    #[inline]
    #[must_use]
    pub fn index(self) -> u32 {
        self.index
    }

    /// Frame generation the id was issued in.
    #[inline]
    #[must_use]
    pub fn generation(self) -> u32 {
        self.generation
    }
}

/// Owning token for a live transient target.
///
/// Must be handed back through [`TransientTargetPool::release`] exactly once.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "transient targets must be released back to the pool"]
pub struct TemporaryTarget {
    id: TargetId,
    width: u32,
    height: u32,
}

impl TemporaryTarget {
    #[inline]
    #[must_use]
    pub fn id(&self) -> TargetId {
        self.id
    }

    #[inline]
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Descriptor for requesting a transient target.
#[derive(Clone, Debug)]
pub struct TargetDesc {
    pub width: u32,
    pub height: u32,
    pub label: &'static str,
}

impl TargetDesc {
    #[must_use]
    pub fn new(width: u32, height: u32, label: &'static str) -> Self {
        Self {
            width,
            height,
            label,
        }
    }
}

/// Creates the physical storage behind pooled targets.
///
/// Format and usage flags are backend decisions; the pool only keys on size.
pub trait TargetBackend {
    type Texture;

    fn create_target(&mut self, desc: &TargetDesc) -> Result<Self::Texture>;
}

/// Counters describing pool activity since creation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Successful acquisitions.
    pub acquired: u64,
    /// Releases.
    pub released: u64,
    /// Physical textures created by the backend.
    pub created: u64,
    /// Targets found still live at a frame boundary.
    pub leaked: u64,
}

// ─── Internal Types ───────────────────────────────────────────────────────────

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
struct PoolKey {
    width: u32,
    height: u32,
}

struct PooledTarget<T> {
    texture: T,
    key: PoolKey,
    /// Number of frames this target has been sitting in the free pool
    /// without being reused. Used by [`TransientTargetPool::trim`].
    idle_frames: u32,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum SlotState {
    Live,
    Released,
}

struct Slot<T> {
    target: PooledTarget<T>,
    state: SlotState,
}

// ─── Pool Implementation ──────────────────────────────────────────────────────

/// Pooled allocator for transient per-frame targets.
///
/// # Thread Safety
///
/// The pool is single-writer: one pass records into it at a time and the
/// host calls [`end_frame`](Self::end_frame) once the frame is submitted.
pub struct TransientTargetPool<B: TargetBackend> {
    backend: B,
    /// Targets handed out this frame (live or already released).
    slots: Vec<Slot<B::Texture>>,
    /// Free targets available for reuse, grouped by size.
    free: FxHashMap<PoolKey, Vec<PooledTarget<B::Texture>>>,
    /// Bumped by every [`end_frame`](Self::end_frame).
    generation: u32,
    stats: PoolStats,
}

impl<B: TargetBackend> TransientTargetPool<B> {
    /// Creates an empty pool on top of `backend`.
    #[must_use]
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            slots: Vec::new(),
            free: FxHashMap::default(),
            generation: 0,
            stats: PoolStats::default(),
        }
    }

    // ── Recording phase ────────────────────────────────────────────────────

    /// Acquire a transient target matching the given descriptor.
    ///
    /// If a free target of the same size exists it is reused; otherwise the
    /// backend creates a new one. Backend failures propagate unchanged and
    /// leave the pool untouched.
    pub fn acquire(&mut self, desc: &TargetDesc) -> Result<TemporaryTarget> {
        let key = PoolKey {
            width: desc.width,
            height: desc.height,
        };

        let reused = self.free.get_mut(&key).and_then(Vec::pop);
        let pooled = if let Some(mut t) = reused {
            t.idle_frames = 0;
            t
        } else {
            let texture = self.backend.create_target(desc)?;
            self.stats.created += 1;
            log::trace!(
                "Transient pool created '{}' {}x{}",
                desc.label,
                desc.width,
                desc.height
            );
            PooledTarget {
                texture,
                key,
                idle_frames: 0,
            }
        };

        let id = TargetId {
            index: self.slots.len() as u32,
            generation: self.generation,
        };
        self.slots.push(Slot {
            target: pooled,
            state: SlotState::Live,
        });
        self.stats.acquired += 1;

        Ok(TemporaryTarget {
            id,
            width: desc.width,
            height: desc.height,
        })
    }

    /// Return a target to the pool.
    ///
    /// The physical texture stays resolvable through [`texture`](Self::texture)
    /// until [`end_frame`](Self::end_frame).
    pub fn release(&mut self, target: TemporaryTarget) {
        match self.slot_mut(target.id) {
            Some(slot) if slot.state == SlotState::Live => {
                slot.state = SlotState::Released;
                self.stats.released += 1;
            }
            _ => {
                log::warn!(
                    "Transient pool received a token from a previous frame: {:?}",
                    target.id
                );
            }
        }
    }

    // ── Submit phase (requires &self only) ─────────────────────────────────

    /// Resolve the physical texture for a target recorded this frame.
    #[must_use]
    #[inline]
    pub fn texture(&self, id: TargetId) -> Option<&B::Texture> {
        self.slot(id).map(|s| &s.target.texture)
    }

    /// Size of a target recorded this frame.
    #[must_use]
    pub fn target_size(&self, id: TargetId) -> Option<(u32, u32)> {
        self.slot(id)
            .map(|s| (s.target.key.width, s.target.key.height))
    }

    /// Whether `id` is still held by its owner.
    #[must_use]
    pub fn is_live(&self, id: TargetId) -> bool {
        self.slot(id).is_some_and(|s| s.state == SlotState::Live)
    }

    /// Number of targets acquired this frame and not yet released.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| s.state == SlotState::Live)
            .count()
    }

    fn slot(&self, id: TargetId) -> Option<&Slot<B::Texture>> {
        if id.generation != self.generation {
            return None;
        }
        self.slots.get(id.index as usize)
    }

    fn slot_mut(&mut self, id: TargetId) -> Option<&mut Slot<B::Texture>> {
        if id.generation != self.generation {
            return None;
        }
        self.slots.get_mut(id.index as usize)
    }

    // ── Frame boundary ─────────────────────────────────────────────────────

    /// Return every slot to the free pool.
    ///
    /// Call this once per frame after submission. Targets still live at this
    /// point were leaked by their owner; they are reclaimed anyway and counted
    /// in [`PoolStats::leaked`]. Returns the number of leaked targets.
    pub fn end_frame(&mut self) -> usize {
        let mut leaked = 0;
        for slot in self.slots.drain(..) {
            if slot.state == SlotState::Live {
                leaked += 1;
            }
            let key = slot.target.key;
            self.free.entry(key).or_default().push(slot.target);
        }

        self.generation = self.generation.wrapping_add(1);

        if leaked > 0 {
            log::warn!("Transient pool reclaimed {leaked} target(s) that were never released");
            self.stats.leaked += leaked as u64;
        }
        leaked
    }

    /// Release free targets that have been idle for more than `max_idle_frames`.
    ///
    /// Call this periodically (e.g., after a resolution change) to avoid
    /// holding stale GPU memory.
    pub fn trim(&mut self, max_idle_frames: u32) {
        for bucket in self.free.values_mut() {
            for t in bucket.iter_mut() {
                t.idle_frames += 1;
            }
            bucket.retain(|t| t.idle_frames <= max_idle_frames);
        }
        self.free.retain(|_, bucket| !bucket.is_empty());
    }

    /// Returns the total number of physical targets managed by the pool
    /// (both in use this frame and free).
    #[must_use]
    pub fn total_texture_count(&self) -> usize {
        self.slots.len() + self.free.values().map(Vec::len).sum::<usize>()
    }

    /// Current frame generation.
    #[must_use]
    pub fn generation(&self) -> u32 {
        self.generation
    }

    #[must_use]
    pub fn stats(&self) -> PoolStats {
        self.stats
    }

    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}
