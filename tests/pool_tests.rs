//! Transient Target Pool Tests
//!
//! Tests for:
//! - Reuse across frames, no reuse within a frame
//! - Resolution of released targets until the frame boundary
//! - Leak accounting and stale tokens
//! - Trimming idle targets
//! - Backend failures

use myth_volumetric::VolumetricError;
use myth_volumetric::renderer::backend::HeadlessBackend;
use myth_volumetric::renderer::graph::transient_pool::{TargetDesc, TransientTargetPool};

fn pool() -> TransientTargetPool<HeadlessBackend> {
    TransientTargetPool::new(HeadlessBackend::new())
}

fn desc(width: u32, height: u32) -> TargetDesc {
    TargetDesc::new(width, height, "Test Target")
}

// ============================================================================
// Reuse Tests
// ============================================================================

#[test]
fn released_target_is_reused_next_frame() {
    let mut pool = pool();

    let a = pool.acquire(&desc(64, 64)).unwrap();
    let serial = pool.texture(a.id()).unwrap().serial;
    pool.release(a);
    pool.end_frame();

    let b = pool.acquire(&desc(64, 64)).unwrap();
    assert_eq!(pool.texture(b.id()).unwrap().serial, serial);
    assert_eq!(pool.stats().created, 1);
    pool.release(b);
}

#[test]
fn released_target_is_not_reused_within_frame() {
    let mut pool = pool();

    let a = pool.acquire(&desc(32, 32)).unwrap();
    let a_id = a.id();
    pool.release(a);
    let b = pool.acquire(&desc(32, 32)).unwrap();

    assert_ne!(
        pool.texture(a_id).unwrap().serial,
        pool.texture(b.id()).unwrap().serial
    );
    assert_eq!(pool.stats().created, 2);
    pool.release(b);
}

#[test]
fn sizes_are_pooled_separately() {
    let mut pool = pool();

    let a = pool.acquire(&desc(64, 64)).unwrap();
    pool.release(a);
    pool.end_frame();

    let b = pool.acquire(&desc(32, 32)).unwrap();
    assert_eq!(pool.stats().created, 2);
    assert_eq!(pool.target_size(b.id()), Some((32, 32)));
    assert_eq!(b.size(), (32, 32));
    pool.release(b);
}

// ============================================================================
// Resolution Tests
// ============================================================================

#[test]
fn released_target_resolves_until_end_frame() {
    let mut pool = pool();

    let a = pool.acquire(&desc(16, 8)).unwrap();
    let id = a.id();
    assert!(pool.is_live(id));

    pool.release(a);
    assert!(!pool.is_live(id));
    assert!(pool.texture(id).is_some());

    pool.end_frame();
    assert!(pool.texture(id).is_none());
    assert_eq!(pool.target_size(id), None);
}

#[test]
fn ids_from_previous_frames_never_resolve() {
    let mut pool = pool();

    let old = pool.acquire(&desc(8, 8)).unwrap();
    let old_id = old.id();
    pool.release(old);
    pool.end_frame();

    let fresh = pool.acquire(&desc(8, 8)).unwrap();
    assert_eq!(fresh.id().index(), old_id.index());
    assert_ne!(fresh.id(), old_id);
    assert!(pool.texture(old_id).is_none());
    assert!(pool.texture(fresh.id()).is_some());
    pool.release(fresh);
}

// ============================================================================
// Leak Tests
// ============================================================================

#[test]
fn end_frame_reclaims_and_counts_leaks() {
    let mut pool = pool();

    let kept = pool.acquire(&desc(8, 8)).unwrap();
    let released = pool.acquire(&desc(8, 8)).unwrap();
    pool.release(released);

    assert_eq!(pool.live_count(), 1);
    assert_eq!(pool.end_frame(), 1);
    assert_eq!(pool.stats().leaked, 1);
    assert_eq!(pool.live_count(), 0);

    // The leaked token is stale now and must not touch the new frame.
    let fresh = pool.acquire(&desc(8, 8)).unwrap();
    pool.release(kept);
    assert!(pool.is_live(fresh.id()));
    assert_eq!(pool.stats().released, 1);
    pool.release(fresh);
    assert_eq!(pool.end_frame(), 0);
}

#[test]
fn generation_advances_per_frame() {
    let mut pool = pool();
    let start = pool.generation();
    pool.end_frame();
    pool.end_frame();
    assert_eq!(pool.generation(), start + 2);
}

// ============================================================================
// Trim Tests
// ============================================================================

#[test]
fn trim_drops_idle_targets() {
    let mut pool = pool();

    let a = pool.acquire(&desc(64, 64)).unwrap();
    let b = pool.acquire(&desc(32, 32)).unwrap();
    pool.release(a);
    pool.release(b);
    pool.end_frame();
    assert_eq!(pool.total_texture_count(), 2);

    pool.trim(1);
    assert_eq!(pool.total_texture_count(), 2);
    pool.trim(1);
    assert_eq!(pool.total_texture_count(), 0);
}

#[test]
fn reuse_resets_idle_counter() {
    let mut pool = pool();

    let a = pool.acquire(&desc(64, 64)).unwrap();
    pool.release(a);
    pool.end_frame();
    pool.trim(1);

    let a = pool.acquire(&desc(64, 64)).unwrap();
    pool.release(a);
    pool.end_frame();
    pool.trim(1);
    assert_eq!(pool.total_texture_count(), 1);
}

// ============================================================================
// Backend Failure Tests
// ============================================================================

#[test]
fn budget_exhaustion_propagates_and_leaves_pool_unchanged() {
    let mut pool = TransientTargetPool::new(HeadlessBackend::with_texture_budget(1));

    let a = pool.acquire(&desc(64, 64)).unwrap();
    let err = pool.acquire(&desc(64, 64)).unwrap_err();

    assert!(matches!(
        err,
        VolumetricError::TargetAllocation {
            width: 64,
            height: 64,
            ..
        }
    ));
    assert_eq!(pool.stats().acquired, 1);
    assert_eq!(pool.live_count(), 1);
    pool.release(a);
}

#[test]
fn zero_sized_target_is_rejected() {
    let mut pool = pool();
    let err = pool.acquire(&desc(0, 16)).unwrap_err();
    assert!(matches!(err, VolumetricError::TargetAllocation { width: 0, .. }));
    assert_eq!(pool.backend().created(), 0);
}
