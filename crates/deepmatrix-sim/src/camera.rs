use deepmatrix_core::constants::{
    CAMERA_FOV_DEG, CAMERA_MIN_FAR, CAMERA_NEAR, HARD_LIMIT_MARGIN, SOFT_LIMIT_FRACTION,
};
use glam::{EulerRot, Mat4, Quat, Vec2, Vec3, Vec4Swizzles};

/// Half extents of the visible area at the lattice's depth (z = 0), in world units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportBounds {
    pub half_width: f32,
    pub half_height: f32,
}

impl ViewportBounds {
    pub fn half_extents(&self) -> Vec2 {
        Vec2::new(self.half_width, self.half_height)
    }

    /// Start of the spring zone.
    pub fn soft_limit(&self) -> Vec2 {
        self.half_extents() * SOFT_LIMIT_FRACTION
    }

    /// Hard clamp: the bound minus the edge margin.
    pub fn hard_limit(&self) -> Vec2 {
        self.half_extents() * (1.0 - HARD_LIMIT_MARGIN)
    }

    pub fn min_half_extent(&self) -> f32 {
        self.half_width.min(self.half_height)
    }
}

/// Perspective camera on the +Z axis looking at the origin.
#[derive(Debug, Clone)]
pub struct LatticeCamera {
    pub fov_y_rad: f32,
    pub distance: f32,
    pub near: f32,
    pub far: f32,
    /// Surface size in CSS pixels.
    pub width: f32,
    pub height: f32,
    bounds: ViewportBounds,
}

impl LatticeCamera {
    pub fn new(distance: f32, width: f32, height: f32) -> Self {
        let mut camera = Self {
            fov_y_rad: CAMERA_FOV_DEG.to_radians(),
            distance: distance.max(CAMERA_NEAR * 2.0),
            near: CAMERA_NEAR,
            far: CAMERA_MIN_FAR,
            width: 1.0,
            height: 1.0,
            bounds: ViewportBounds {
                half_width: 1.0,
                half_height: 1.0,
            },
        };
        camera.set_distance(distance);
        camera.resize(width, height);
        camera
    }

    /// Move the camera along +Z. The far plane keeps the whole lattice in range.
    pub fn set_distance(&mut self, distance: f32) {
        self.distance = distance.max(CAMERA_NEAR * 2.0);
        self.far = (self.distance * 4.0).max(CAMERA_MIN_FAR);
        self.recompute_bounds();
    }

    /// Recompute aspect ratio and viewport bounds. Zero sizes are treated as one pixel.
    pub fn resize(&mut self, width: f32, height: f32) -> ViewportBounds {
        self.width = if width.is_finite() { width.max(1.0) } else { 1.0 };
        self.height = if height.is_finite() { height.max(1.0) } else { 1.0 };
        self.recompute_bounds();
        self.bounds
    }

    fn recompute_bounds(&mut self) {
        let half_height = (self.fov_y_rad / 2.0).tan() * self.distance;
        self.bounds = ViewportBounds {
            half_width: half_height * self.aspect(),
            half_height,
        };
    }

    pub fn aspect(&self) -> f32 {
        self.width / self.height
    }

    pub fn bounds(&self) -> ViewportBounds {
        self.bounds
    }

    pub fn eye(&self) -> Vec3 {
        Vec3::new(0.0, 0.0, self.distance)
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye(), Vec3::ZERO, Vec3::Y)
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y_rad, self.aspect(), self.near, self.far)
    }

    pub fn view_proj(&self) -> Mat4 {
        self.projection() * self.view()
    }

    /// Convert a surface-relative CSS pixel position to normalized device coordinates.
    pub fn pixel_to_ndc(&self, pixel: Vec2) -> Vec2 {
        Vec2::new(
            pixel.x / self.width * 2.0 - 1.0,
            1.0 - pixel.y / self.height * 2.0,
        )
    }

    /// World units covered by one CSS pixel at the lattice's depth.
    pub fn world_per_pixel(&self) -> Vec2 {
        Vec2::new(
            2.0 * self.bounds.half_width / self.width,
            2.0 * self.bounds.half_height / self.height,
        )
    }

    /// Ray from the camera through the given NDC point.
    pub fn ray_from_ndc(&self, ndc: Vec2) -> Ray {
        let inv = self.view_proj().inverse();
        let near = inv.project_point3(Vec3::new(ndc.x, ndc.y, 0.0));
        let far = inv.project_point3(Vec3::new(ndc.x, ndc.y, 1.0));
        Ray {
            origin: near,
            direction: (far - near).normalize_or_zero(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    /// True if the ray hits the sphere in front of its origin (or starts inside it).
    pub fn hits_sphere(&self, center: Vec3, radius: f32) -> bool {
        let oc = self.origin - center;
        let b = oc.dot(self.direction);
        let c = oc.length_squared() - radius * radius;
        if c <= 0.0 {
            return true;
        }
        let disc = b * b - c;
        disc >= 0.0 && -b + disc.sqrt() >= 0.0
    }
}

/// The transformable root of the lattice: rotation, view-plane translation and scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatticeGroup {
    /// Euler angles (XYZ order), radians.
    pub rotation: Vec3,
    pub position: Vec2,
    pub scale: f32,
}

impl Default for LatticeGroup {
    fn default() -> Self {
        Self {
            rotation: Vec3::ZERO,
            position: Vec2::ZERO,
            scale: 1.0,
        }
    }
}

impl LatticeGroup {
    pub fn model(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            Vec3::splat(self.scale),
            Quat::from_euler(EulerRot::XYZ, self.rotation.x, self.rotation.y, self.rotation.z),
            self.position.extend(0.0),
        )
    }
}

/// True if a group-local point lands inside the clip volume of `clip_from_local`.
pub fn clip_contains(clip_from_local: &Mat4, point: Vec3) -> bool {
    let clip = *clip_from_local * point.extend(1.0);
    if clip.w <= 0.0 {
        return false;
    }
    let w = clip.w;
    clip.xy().abs().cmple(glam::Vec2::splat(w)).all() && clip.z >= 0.0 && clip.z <= w
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_from_fov_and_distance() {
        let cam = LatticeCamera::new(100.0, 800.0, 400.0);
        let b = cam.bounds();
        let expected_h = (20.0f32).to_radians().tan() * 100.0;
        assert!((b.half_height - expected_h).abs() < 1e-3);
        assert!((b.half_width - expected_h * 2.0).abs() < 1e-3);
    }

    #[test]
    fn test_limits_ordering() {
        let cam = LatticeCamera::new(100.0, 640.0, 480.0);
        let b = cam.bounds();
        let soft = b.soft_limit();
        let hard = b.hard_limit();
        assert!(soft.x < hard.x && soft.y < hard.y);
        assert!(hard.x < b.half_width && hard.y < b.half_height);
    }

    #[test]
    fn test_resize_updates_aspect_and_bounds() {
        let mut cam = LatticeCamera::new(50.0, 100.0, 100.0);
        let before = cam.bounds();
        let after = cam.resize(200.0, 100.0);
        assert_eq!(cam.aspect(), 2.0);
        assert!((after.half_width - before.half_width * 2.0).abs() < 1e-4);
        assert_eq!(after.half_height, before.half_height);
    }

    #[test]
    fn test_zero_size_resize_is_safe() {
        let mut cam = LatticeCamera::new(50.0, 100.0, 100.0);
        let b = cam.resize(0.0, 0.0);
        assert!(b.half_width.is_finite() && b.half_height.is_finite());
    }

    #[test]
    fn test_center_ray_hits_origin_sphere() {
        let cam = LatticeCamera::new(100.0, 800.0, 600.0);
        let ray = cam.ray_from_ndc(Vec2::ZERO);
        assert!((ray.direction - Vec3::NEG_Z).length() < 1e-4);
        assert!(ray.hits_sphere(Vec3::ZERO, 5.0));
    }

    #[test]
    fn test_corner_ray_misses_small_sphere() {
        let cam = LatticeCamera::new(100.0, 800.0, 600.0);
        let ray = cam.ray_from_ndc(Vec2::new(0.95, 0.95));
        assert!(!ray.hits_sphere(Vec3::ZERO, 5.0));
    }

    #[test]
    fn test_sphere_behind_ray_missed() {
        let ray = Ray {
            origin: Vec3::ZERO,
            direction: Vec3::Z,
        };
        assert!(!ray.hits_sphere(Vec3::new(0.0, 0.0, -10.0), 2.0));
        assert!(ray.hits_sphere(Vec3::new(0.0, 0.0, 10.0), 2.0));
    }

    #[test]
    fn test_pixel_to_ndc() {
        let cam = LatticeCamera::new(10.0, 200.0, 100.0);
        assert_eq!(cam.pixel_to_ndc(Vec2::new(100.0, 50.0)), Vec2::ZERO);
        assert_eq!(cam.pixel_to_ndc(Vec2::new(0.0, 0.0)), Vec2::new(-1.0, 1.0));
        assert_eq!(cam.pixel_to_ndc(Vec2::new(200.0, 100.0)), Vec2::new(1.0, -1.0));
    }

    #[test]
    fn test_world_per_pixel_spans_viewport() {
        let cam = LatticeCamera::new(80.0, 400.0, 300.0);
        let wpp = cam.world_per_pixel();
        assert!((wpp.x * 400.0 - cam.bounds().half_width * 2.0).abs() < 1e-3);
        assert!((wpp.y * 300.0 - cam.bounds().half_height * 2.0).abs() < 1e-3);
    }

    #[test]
    fn test_clip_contains() {
        let cam = LatticeCamera::new(100.0, 800.0, 600.0);
        let m = cam.view_proj() * LatticeGroup::default().model();
        assert!(clip_contains(&m, Vec3::ZERO));
        assert!(!clip_contains(&m, Vec3::new(10_000.0, 0.0, 0.0)));
        // Behind the camera
        assert!(!clip_contains(&m, Vec3::new(0.0, 0.0, 200.0)));
    }

    #[test]
    fn test_group_model_applies_translation_and_scale() {
        let group = LatticeGroup {
            rotation: Vec3::ZERO,
            position: Vec2::new(3.0, -2.0),
            scale: 2.0,
        };
        let p = group.model().transform_point3(Vec3::new(1.0, 1.0, 1.0));
        assert!((p - Vec3::new(5.0, 0.0, 2.0)).length() < 1e-5);
    }
}
