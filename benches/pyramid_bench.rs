use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use glam::{Affine3A, Quat, Vec3};

use myth_volumetric::renderer::backend::{HeadlessBackend, RecordingQueue};
use myth_volumetric::renderer::graph::TransientTargetPool;
use myth_volumetric::{
    Camera, FrameDescriptor, FrustumRayProvider, MaterialHandle, VolumetricLightFeature,
    VolumetricLightSettings,
};

fn camera() -> Camera {
    let mut cam = Camera::new_perspective(60.0, 16.0 / 9.0, 1000.0);
    cam.set_world_transform(&Affine3A::from_rotation_translation(
        Quat::from_rotation_y(0.5),
        Vec3::new(0.0, 2.0, 8.0),
    ));
    cam
}

fn bench_pyramid(c: &mut Criterion) {
    let cam = camera();
    let desc = FrameDescriptor::new(1920, 1080);

    let mut group = c.benchmark_group("Volumetric Pyramid");

    for iterations in [1, 4, 8] {
        let mut settings = VolumetricLightSettings::new(MaterialHandle::new("Hidden/VolumetricLight"));
        settings.set_iterations(iterations);
        let Ok(mut feature) = VolumetricLightFeature::create(settings) else {
            return;
        };
        let mut pool = TransientTargetPool::new(HeadlessBackend::new());
        let mut queue = RecordingQueue::new();

        group.bench_function(format!("1080p frame, {iterations} iterations"), |b| {
            b.iter(|| {
                let outcome = feature.render_frame(Some(&cam), &desc, &mut pool, &mut queue);
                black_box(outcome.is_ok());
                pool.end_frame();
                queue.take_batches();
            });
        });
    }

    group.bench_function("frustum ray update", |b| {
        let mut provider = FrustumRayProvider::new();
        b.iter(|| {
            black_box(provider.update(black_box(&cam)));
        });
    });

    group.finish();
}

criterion_group!(benches, bench_pyramid);
criterion_main!(benches);
