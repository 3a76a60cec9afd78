//! Blur Pyramid Tests
//!
//! Tests for:
//! - Downsample step count and level sizes
//! - Exact command stream of a frame
//! - Target stack and pool balance after a frame
//! - Failure paths (allocation, submit) leaving every target reachable

use myth_volumetric::renderer::backend::{HeadlessBackend, RecordingQueue};
use myth_volumetric::renderer::frustum_rays::FrustumCorners;
use myth_volumetric::renderer::graph::command::{BlitDest, BlitSource, CommandBatch};
use myth_volumetric::renderer::graph::passes::volumetric::{
    BlurPyramidEngine, FrameTargets, PASS_LABEL,
};
use myth_volumetric::renderer::graph::transient_pool::TransientTargetPool;
use myth_volumetric::resources::material::{MaterialHandle, PassStage, SOURCE_TEX_PARAM};
use myth_volumetric::{PyramidStats, VolumetricError};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Compact, id-independent view of a recorded command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Img {
    None,
    Camera,
    Slot(u32),
}

fn describe(batch: &CommandBatch) -> Vec<(Img, Img, Option<PassStage>)> {
    batch
        .commands()
        .iter()
        .map(|c| {
            let source = match c.source {
                BlitSource::None => Img::None,
                BlitSource::CameraColor => Img::Camera,
                BlitSource::Target(id) => Img::Slot(id.index()),
            };
            let dest = match c.dest {
                BlitDest::CameraColor => Img::Camera,
                BlitDest::Target(id) => Img::Slot(id.index()),
            };
            (source, dest, c.stage)
        })
        .collect()
}

/// Downsample steps for a `width`x`height` frame and `iterations`, counted
/// independently of the engine.
fn expected_steps(width: u32, height: u32, iterations: u32) -> u32 {
    let (mut w, mut h) = (width, height);
    let mut levels = 1;
    loop {
        w /= 2;
        h /= 2;
        if w < 2 || h < 2 {
            break;
        }
        levels += 1;
    }
    iterations.max(1).min(levels)
}

struct Harness {
    pool: TransientTargetPool<HeadlessBackend>,
    queue: RecordingQueue,
    engine: BlurPyramidEngine,
    frame: FrameTargets,
}

impl Harness {
    fn new(iterations: u32) -> Self {
        Self::with_backend(HeadlessBackend::new(), iterations)
    }

    fn with_backend(backend: HeadlessBackend, iterations: u32) -> Self {
        init_logger();
        Self {
            pool: TransientTargetPool::new(backend),
            queue: RecordingQueue::new(),
            engine: BlurPyramidEngine::new(MaterialHandle::new("Hidden/VolumetricLight"), iterations),
            frame: FrameTargets::default(),
        }
    }

    fn run(&mut self, width: u32, height: u32) -> Result<PyramidStats, VolumetricError> {
        self.frame.acquire(&mut self.pool, width, height)?;
        self.engine.run(
            &mut self.frame,
            &FrustumCorners::default(),
            &mut self.pool,
            &mut self.queue,
        )
    }

    fn finish(&mut self) -> usize {
        let released = self.frame.release_all(&mut self.pool);
        self.pool.end_frame();
        released
    }
}

// ============================================================================
// Step Count Tests
// ============================================================================

#[test]
fn single_iteration_composites_without_upsampling() {
    let mut h = Harness::new(1);
    let stats = h.run(64, 64).unwrap();

    assert_eq!(stats.down_steps, 1);
    assert_eq!(stats.up_steps, 0);
    assert_eq!(stats.max_stack_depth, 1);
    assert_eq!(stats.sizes.as_slice(), &[(64, 64)]);
    assert_eq!(h.queue.last().unwrap().commands().len(), 6);
}

#[test]
fn sixteen_square_four_iterations_builds_four_levels() {
    let mut h = Harness::new(4);
    let stats = h.run(16, 16).unwrap();

    assert_eq!(stats.sizes.as_slice(), &[(16, 16), (8, 8), (4, 4), (2, 2)]);
    assert_eq!(stats.down_steps, 4);
    assert_eq!(stats.max_stack_depth, 4);
    assert_eq!(stats.up_steps, 3);
}

#[test]
fn size_floor_stops_before_one_pixel_level() {
    let mut h = Harness::new(8);
    let stats = h.run(16, 16).unwrap();

    // 2x2 is the last level; halving again would give 1x1.
    assert_eq!(stats.sizes.last(), Some(&(2, 2)));
    assert_eq!(stats.down_steps, 4);
    assert_eq!(stats.up_steps, 3);
}

#[test]
fn odd_dimensions_use_floor_halving() {
    let mut h = Harness::new(10);
    let stats = h.run(100, 37).unwrap();

    assert_eq!(
        stats.sizes.as_slice(),
        &[(100, 37), (50, 18), (25, 9), (12, 4), (6, 2)]
    );
    assert_eq!(stats.down_steps, 5);
}

#[test]
fn tiny_frame_still_runs_one_step() {
    let mut h = Harness::new(6);
    let stats = h.run(1, 1).unwrap();

    assert_eq!(stats.down_steps, 1);
    assert_eq!(stats.up_steps, 0);
}

#[test]
fn step_count_matches_min_of_iterations_and_size_limit() {
    let sizes = [(1920, 1080), (640, 480), (17, 300), (3, 3), (2, 9), (256, 256)];
    for &(width, height) in &sizes {
        for iterations in [1, 2, 3, 5, 8, 16] {
            let mut h = Harness::new(iterations);
            let stats = h.run(width, height).unwrap();
            let expected = expected_steps(width, height, iterations);

            assert_eq!(
                stats.down_steps, expected,
                "{width}x{height} with {iterations} iterations"
            );
            assert_eq!(stats.up_steps, expected - 1);
            assert_eq!(stats.sizes.len(), expected as usize);
            assert_eq!(
                h.queue.last().unwrap().commands().len(),
                6 + 2 * (expected as usize - 1)
            );
        }
    }
}

// ============================================================================
// Command Stream Tests
// ============================================================================

#[test]
fn single_iteration_command_stream() {
    let mut h = Harness::new(1);
    h.run(64, 32).unwrap();

    // Slots: 0 source, 1 src, 2 dest.
    let expected = vec![
        (Img::Camera, Img::Slot(0), None),
        (Img::Slot(0), Img::Camera, None),
        (Img::Camera, Img::Slot(0), None),
        (Img::None, Img::Slot(1), Some(PassStage::Extraction)),
        (Img::Slot(1), Img::Slot(2), Some(PassStage::Blur)),
        (Img::Slot(2), Img::Camera, Some(PassStage::Composite)),
    ];
    assert_eq!(describe(h.queue.last().unwrap()), expected);
}

#[test]
fn four_iteration_command_stream() {
    let mut h = Harness::new(4);
    h.run(16, 16).unwrap();

    // Slots 3..=5 are the 8x8, 4x4 and 2x2 levels.
    let expected = vec![
        (Img::Camera, Img::Slot(0), None),
        (Img::Slot(0), Img::Camera, None),
        (Img::Camera, Img::Slot(0), None),
        (Img::None, Img::Slot(1), Some(PassStage::Extraction)),
        (Img::Slot(1), Img::Slot(2), Some(PassStage::Blur)),
        (Img::Slot(2), Img::Slot(3), Some(PassStage::Blur)),
        (Img::Slot(3), Img::Slot(4), Some(PassStage::Blur)),
        (Img::Slot(4), Img::Slot(5), Some(PassStage::Blur)),
        (Img::Slot(5), Img::Slot(4), Some(PassStage::Blur)),
        (Img::Slot(4), Img::Slot(3), Some(PassStage::Blur)),
        (Img::Slot(3), Img::Slot(2), Some(PassStage::Blur)),
        (Img::Slot(2), Img::Camera, Some(PassStage::Composite)),
    ];
    assert_eq!(describe(h.queue.last().unwrap()), expected);
}

#[test]
fn batch_binds_material_and_source_texture() {
    let mut h = Harness::new(3);
    h.run(32, 32).unwrap();

    let batch = h.queue.last().unwrap();
    assert_eq!(batch.label(), PASS_LABEL);
    assert_eq!(batch.material(), Some(h.engine.material()));

    let source = batch.params().texture(SOURCE_TEX_PARAM).unwrap();
    assert_eq!(source.index(), 0);
    assert_eq!(batch.params().frustum, FrustumCorners::default());
}

#[test]
fn composite_is_the_only_draw_into_camera() {
    let mut h = Harness::new(5);
    h.run(512, 256).unwrap();

    let draws_to_camera: Vec<_> = h
        .queue
        .last()
        .unwrap()
        .commands()
        .iter()
        .filter(|c| !c.is_copy() && c.dest == BlitDest::CameraColor)
        .collect();
    assert_eq!(draws_to_camera.len(), 1);
    assert_eq!(draws_to_camera[0].stage, Some(PassStage::Composite));
}

#[test]
fn engine_batch_is_empty_after_run() {
    let mut h = Harness::new(3);
    h.run(64, 64).unwrap();
    assert!(h.engine.batch().is_empty());
}

// ============================================================================
// Resource Balance Tests
// ============================================================================

#[test]
fn stack_is_empty_after_successful_run() {
    let mut h = Harness::new(6);
    h.run(256, 128).unwrap();

    assert!(h.frame.stack().is_empty());
    // source and the finest level stay with the frame until cleanup.
    assert_eq!(h.frame.held_count(), 2);
    assert_eq!(h.pool.live_count(), 2);
}

#[test]
fn every_acquisition_is_released() {
    for iterations in 1..=8 {
        let mut h = Harness::new(iterations);
        let stats = h.run(300, 200).unwrap();
        assert_eq!(h.finish(), 2);

        let pool_stats = h.pool.stats();
        let expected = 3 + u64::from(stats.down_steps - 1);
        assert_eq!(pool_stats.acquired, expected);
        assert_eq!(pool_stats.released, expected);
        assert_eq!(pool_stats.leaked, 0);
    }
}

#[test]
fn consecutive_frames_reuse_textures() {
    let mut h = Harness::new(4);
    h.run(64, 64).unwrap();
    h.finish();
    let created = h.pool.stats().created;

    h.run(64, 64).unwrap();
    h.finish();
    assert_eq!(h.pool.stats().created, created);
}

#[test]
fn set_iterations_clamps_to_one() {
    let mut h = Harness::new(3);
    h.engine.set_iterations(0);
    assert_eq!(h.engine.iterations(), 1);

    let stats = h.run(64, 64).unwrap();
    assert_eq!(stats.down_steps, 1);
}

// ============================================================================
// Failure Path Tests
// ============================================================================

#[test]
fn run_without_configured_targets_fails() {
    let mut h = Harness::new(2);
    let err = h
        .engine
        .run(
            &mut h.frame,
            &FrustumCorners::default(),
            &mut h.pool,
            &mut h.queue,
        )
        .unwrap_err();

    assert_eq!(err, VolumetricError::NotConfigured);
    assert_eq!(h.queue.submit_count(), 0);
}

#[test]
fn allocation_failure_mid_pyramid_keeps_targets_reachable() {
    // Three full-size targets fit; the first 8x8 level does not.
    let mut h = Harness::with_backend(HeadlessBackend::with_texture_budget(3), 4);
    let err = h.run(16, 16).unwrap_err();

    assert!(matches!(
        err,
        VolumetricError::TargetAllocation {
            width: 8,
            height: 8,
            ..
        }
    ));
    assert_eq!(h.queue.submit_count(), 0);
    assert!(h.engine.batch().is_empty());

    // source plus the full-size level on the stack; src was already released.
    assert_eq!(h.frame.held_count(), 2);
    assert_eq!(h.finish(), 2);
    assert_eq!(h.pool.stats().acquired, h.pool.stats().released);
    assert_eq!(h.pool.stats().leaked, 0);
}

#[test]
fn frame_after_allocation_failure_matches_clean_run() {
    let mut failing = Harness::with_backend(HeadlessBackend::with_texture_budget(3), 3);
    assert!(failing.run(32, 32).is_err());
    failing.finish();
    failing.pool.backend_mut().set_texture_budget(None);
    failing.run(32, 32).unwrap();

    let mut clean = Harness::new(3);
    clean.run(32, 32).unwrap();

    assert_eq!(
        describe(failing.queue.last().unwrap()),
        describe(clean.queue.last().unwrap())
    );
}

#[test]
fn submit_failure_releases_everything_on_cleanup() {
    let mut h = Harness::new(4);
    h.queue.fail_next_submit("device lost");
    let err = h.run(64, 64).unwrap_err();

    assert_eq!(err, VolumetricError::SubmitFailed("device lost".to_string()));
    assert!(h.engine.batch().is_empty());
    assert!(h.frame.stack().is_empty());
    assert_eq!(h.finish(), 2);
    assert_eq!(h.pool.live_count(), 0);
    assert_eq!(h.pool.stats().acquired, h.pool.stats().released);
}
