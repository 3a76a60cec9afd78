use glam::{Affine3A, Quat, Vec3};
use std::borrow::Cow;

/// Viewpoint the volumetric pass reconstructs world positions for.
///
/// Only what the frustum rays depend on is kept: the far-plane extent and
/// the world transform.
#[derive(Debug, Clone)]
pub struct Camera {
    pub name: Cow<'static, str>,

    // === Projection ===
    pub projection_type: ProjectionType,
    /// Vertical field of view in radians.
    pub fov: f32,
    pub aspect: f32,
    pub far: f32,
    /// Half-height of the orthographic view volume.
    pub ortho_size: f32,

    world_matrix: Affine3A,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionType {
    Perspective,
    Orthographic,
}

impl Camera {
    /// `fov` is the vertical field of view in degrees.
    #[must_use]
    pub fn new_perspective(fov: f32, aspect: f32, far: f32) -> Self {
        Self {
            name: Cow::Borrowed("Camera"),
            projection_type: ProjectionType::Perspective,
            fov: fov.to_radians(),
            aspect,
            far,
            ortho_size: 10.0,
            world_matrix: Affine3A::IDENTITY,
        }
    }

    #[must_use]
    pub fn new_orthographic(ortho_size: f32, aspect: f32, far: f32) -> Self {
        Self {
            projection_type: ProjectionType::Orthographic,
            ortho_size,
            ..Self::new_perspective(60.0, aspect, far)
        }
    }

    /// Places the camera. Scale in `world_transform` is ignored by the rays.
    pub fn set_world_transform(&mut self, world_transform: &Affine3A) {
        self.world_matrix = *world_transform;
    }

    #[inline]
    #[must_use]
    pub fn world_matrix(&self) -> &Affine3A {
        &self.world_matrix
    }

    #[must_use]
    pub fn position(&self) -> Vec3 {
        Vec3::from(self.world_matrix.translation)
    }

    /// Rotation part of the world transform, scale removed.
    #[must_use]
    pub fn rotation(&self) -> Quat {
        let (_, rotation, _) = self.world_matrix.to_scale_rotation_translation();
        rotation
    }

    /// View-space corners of the full-viewport rectangle at `depth`
    /// along the view direction.
    ///
    /// Order is bottom-left, top-left, top-right, bottom-right. The camera
    /// looks down -Z, so every corner has `z == -depth`.
    #[must_use]
    pub fn frustum_corners(&self, depth: f32) -> [Vec3; 4] {
        let (half_w, half_h) = match self.projection_type {
            ProjectionType::Perspective => {
                let half_h = (self.fov * 0.5).tan() * depth;
                (half_h * self.aspect, half_h)
            }
            ProjectionType::Orthographic => (self.ortho_size * self.aspect, self.ortho_size),
        };

        [
            Vec3::new(-half_w, -half_h, -depth),
            Vec3::new(-half_w, half_h, -depth),
            Vec3::new(half_w, half_h, -depth),
            Vec3::new(half_w, -half_h, -depth),
        ]
    }
}
