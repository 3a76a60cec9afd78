//! Frustum Ray Provider
//!
//! Every tick the provider turns the active camera into four unit-length,
//! world-space directions through the corners of the far plane. The volumetric
//! extraction technique interpolates them across the screen and scales by
//! linear depth to reconstruct world positions.
//!
//! ```text
//!   TL (1) ┌───────────┐ TR (2)
//!          │           │
//!          │   far     │
//!          │  plane    │
//!   BL (0) └───────────┘ BR (3)
//! ```

use glam::Vec3;

use crate::scene::camera::Camera;

pub const CORNER_BOTTOM_LEFT: usize = 0;
pub const CORNER_TOP_LEFT: usize = 1;
pub const CORNER_TOP_RIGHT: usize = 2;
pub const CORNER_BOTTOM_RIGHT: usize = 3;

/// Normalized world-space far-plane corner directions.
///
/// Always written as a whole; there is no per-corner setter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrustumCorners {
    rays: [Vec3; 4],
}

impl FrustumCorners {
    /// Builds corners from camera-relative directions, normalizing each.
    #[must_use]
    pub fn from_directions(directions: [Vec3; 4]) -> Self {
        Self {
            rays: directions.map(Vec3::normalize_or_zero),
        }
    }

    #[inline]
    #[must_use]
    pub fn rays(&self) -> &[Vec3; 4] {
        &self.rays
    }

    #[inline]
    #[must_use]
    pub fn bottom_left(&self) -> Vec3 {
        self.rays[CORNER_BOTTOM_LEFT]
    }

    #[inline]
    #[must_use]
    pub fn top_left(&self) -> Vec3 {
        self.rays[CORNER_TOP_LEFT]
    }

    #[inline]
    #[must_use]
    pub fn top_right(&self) -> Vec3 {
        self.rays[CORNER_TOP_RIGHT]
    }

    #[inline]
    #[must_use]
    pub fn bottom_right(&self) -> Vec3 {
        self.rays[CORNER_BOTTOM_RIGHT]
    }

    /// Packs the rays as `vec4<f32>` rows for a uniform buffer.
    #[must_use]
    pub fn to_uniform(&self) -> [[f32; 4]; 4] {
        self.rays.map(|r| r.extend(0.0).to_array())
    }
}

impl Default for FrustumCorners {
    /// Rays of an identity camera with a 90° square frustum.
    fn default() -> Self {
        Self::from_directions([
            Vec3::new(-1.0, -1.0, -1.0),
            Vec3::new(-1.0, 1.0, -1.0),
            Vec3::new(1.0, 1.0, -1.0),
            Vec3::new(1.0, -1.0, -1.0),
        ])
    }
}

/// Colored line used by editor gizmos to visualize one corner ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DebugRay {
    pub origin: Vec3,
    pub direction: Vec3,
    /// Linear RGBA.
    pub color: [f32; 4],
}

/// Gizmo colors per corner: red, blue, yellow, green.
pub const DEBUG_RAY_COLORS: [[f32; 4]; 4] = [
    [1.0, 0.0, 0.0, 1.0],
    [0.0, 0.0, 1.0, 1.0],
    [1.0, 0.92, 0.016, 1.0],
    [0.0, 1.0, 0.0, 1.0],
];

/// Publishes the camera's frustum corner rays once per tick.
#[derive(Debug, Clone, Default)]
pub struct FrustumRayProvider {
    corners: FrustumCorners,
}

impl FrustumRayProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Recomputes the rays from `camera`.
    ///
    /// The far-plane corners are rotated into world space (no translation)
    /// and normalized.
    pub fn update(&mut self, camera: &Camera) -> &FrustumCorners {
        let rotation = camera.rotation();
        let view_corners = camera.frustum_corners(camera.far);
        self.corners = FrustumCorners::from_directions(view_corners.map(|c| rotation * c));
        log::trace!(
            "Frustum rays: BL {:?} TL {:?} TR {:?} BR {:?}",
            self.corners.bottom_left(),
            self.corners.top_left(),
            self.corners.top_right(),
            self.corners.bottom_right()
        );
        &self.corners
    }

    /// Rays published by the last [`update`](Self::update).
    #[inline]
    #[must_use]
    pub fn corners(&self) -> &FrustumCorners {
        &self.corners
    }

    /// Gizmo lines from `origin` along each published ray.
    #[must_use]
    pub fn debug_rays(&self, origin: Vec3) -> [DebugRay; 4] {
        std::array::from_fn(|i| DebugRay {
            origin,
            direction: self.corners.rays[i],
            color: DEBUG_RAY_COLORS[i],
        })
    }
}
