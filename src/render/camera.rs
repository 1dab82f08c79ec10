use crate::config::CameraSettings;
use crate::scene::Aabb;
use glam::{EulerRot, Mat4, Vec2, Vec3};

const ORBIT_SENSITIVITY: f32 = 0.005;
const MIN_POLAR_ANGLE: f32 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    pub position: Vec3,
    pub target: Vec3,
}

impl CameraPose {
    pub fn new(position: [f32; 3], target: [f32; 3]) -> Self {
        Self {
            position: Vec3::from(position),
            target: Vec3::from(target),
        }
    }

    pub fn distance(&self) -> f32 {
        self.position.distance(self.target)
    }

    pub fn lerp(&self, other: &CameraPose, t: f32) -> CameraPose {
        CameraPose {
            position: self.position.lerp(other.position, t),
            target: self.target.lerp(other.target, t),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraMode {
    FreeFly,
    Orbit,
}

/// Perspective camera looking from `pose.position` at `pose.target`, +Z up.
#[derive(Debug, Clone, Copy)]
pub struct CameraRig {
    pub pose: CameraPose,
    pub fov_deg: f32,
    pub near: f32,
    pub far: f32,
    pub mode: CameraMode,
    min_distance: f32,
    max_distance: f32,
    max_polar_angle: f32,
}

impl CameraRig {
    pub fn new(pose: CameraPose, settings: &CameraSettings) -> Self {
        Self {
            pose,
            fov_deg: settings.fov_deg,
            near: settings.near,
            far: settings.far,
            mode: CameraMode::FreeFly,
            min_distance: settings.min_distance,
            max_distance: settings.max_distance,
            max_polar_angle: settings.max_polar_angle,
        }
    }

    /// Places the camera so the whole box is in view, looking at its center.
    pub fn frame_bounds(&mut self, bounds: &Aabb) {
        if bounds.is_empty() {
            return;
        }
        let center = bounds.center();
        let radius = bounds.extent().max_element();
        let distance = if radius > 0.0 { radius * 3.0 } else { 3.0 };
        let offset = Vec3::new(distance, -distance, distance * 0.6).normalize() * distance;
        self.pose = CameraPose {
            position: center + offset,
            target: center,
        };
        self.max_distance = self.max_distance.max(distance * 2.0);
    }

    pub fn toggle_mode(&mut self) -> CameraMode {
        self.mode = match self.mode {
            CameraMode::FreeFly => CameraMode::Orbit,
            CameraMode::Orbit => CameraMode::FreeFly,
        };
        self.mode
    }

    pub fn orbit_enabled(&self) -> bool {
        self.mode == CameraMode::Orbit
    }

    pub fn translate(&mut self, delta: Vec3) {
        self.pose.position += delta;
        self.pose.target += delta;
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.pose.position, self.pose.target, Vec3::Z)
    }

    pub fn projection(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(
            self.fov_deg.to_radians(),
            aspect.max(1e-3),
            self.near.max(1e-4),
            self.far.max(self.near + 1e-3),
        )
    }

    pub fn view_proj(&self, aspect: f32) -> Mat4 {
        self.projection(aspect) * self.view()
    }

    pub fn basis(&self) -> (Vec3, Vec3, Vec3) {
        let forward = (self.pose.target - self.pose.position).normalize_or_zero();
        let mut right = forward.cross(Vec3::Z);
        if right.length_squared() < 1e-8 {
            right = Vec3::X;
        }
        let right = right.normalize();
        let up = right.cross(forward).normalize_or_zero();
        (forward, right, up)
    }

    /// World-space ray through a point given in normalized device coordinates.
    pub fn pick_ray(&self, ndc: Vec2, aspect: f32) -> (Vec3, Vec3) {
        let (f, r, u) = self.basis();
        let t = (self.fov_deg.to_radians() * 0.5).tan();
        let dir = (f + r * (ndc.x * t * aspect) + u * (ndc.y * t)).normalize_or_zero();
        (self.pose.position, dir)
    }

    /// Projects a world point to pixel coordinates, `None` when behind the camera.
    pub fn project(&self, point: Vec3, viewport: Vec2) -> Option<Vec2> {
        let aspect = viewport.x / viewport.y.max(1.0);
        let clip = self.view_proj(aspect) * point.extend(1.0);
        if clip.w <= 1e-5 {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        Some(Vec2::new(
            (ndc.x * 0.5 + 0.5) * viewport.x,
            (0.5 - ndc.y * 0.5) * viewport.y,
        ))
    }

    /// Rotates the camera around its target by a pointer drag in pixels.
    pub fn orbit(&mut self, drag: Vec2) {
        let offset = self.pose.position - self.pose.target;
        let radius = offset.length().max(1e-4);
        let mut azimuth = offset.y.atan2(offset.x);
        let mut polar = (offset.z / radius).clamp(-1.0, 1.0).acos();

        azimuth -= drag.x * ORBIT_SENSITIVITY;
        polar = (polar - drag.y * ORBIT_SENSITIVITY).clamp(MIN_POLAR_ANGLE, self.max_polar_angle);

        let sin_polar = polar.sin();
        let offset = Vec3::new(
            radius * sin_polar * azimuth.cos(),
            radius * sin_polar * azimuth.sin(),
            radius * polar.cos(),
        );
        self.pose.position = self.pose.target + offset;
    }

    /// Moves toward (positive) or away from the target, clamped to the orbit range.
    pub fn dolly(&mut self, scroll: f32) {
        let offset = self.pose.position - self.pose.target;
        let distance = offset.length();
        if distance <= 1e-6 {
            return;
        }
        let scaled = (distance * 0.95f32.powf(scroll)).clamp(self.min_distance, self.max_distance);
        self.pose.position = self.pose.target + offset / distance * scaled;
    }

    /// Camera orientation as XYZ Euler angles in radians.
    pub fn rotation_euler(&self) -> Vec3 {
        let world = self.view().inverse();
        let (_, rotation, _) = world.to_scale_rotation_translation();
        let (x, y, z) = rotation.to_euler(EulerRot::XYZ);
        Vec3::new(x, y, z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rig() -> CameraRig {
        CameraRig::new(
            CameraPose::new([0.0, -5.0, 2.0], [0.0, 0.0, 0.0]),
            &CameraSettings::default(),
        )
    }

    #[test]
    fn frame_bounds_produces_finite_state() {
        let mut camera = rig();
        camera.frame_bounds(&Aabb {
            min: Vec3::new(-1.0, -2.0, -3.0),
            max: Vec3::new(4.0, 5.0, 6.0),
        });
        assert!(camera.pose.position.is_finite());
        assert_eq!(camera.pose.target, Vec3::new(1.5, 1.5, 1.5));
        assert!(camera.pose.distance() > 0.0);
    }

    #[test]
    fn translate_preserves_look_offset() {
        let mut camera = rig();
        let before = camera.pose.target - camera.pose.position;
        camera.translate(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(camera.pose.target - camera.pose.position, before);
        assert_eq!(camera.pose.position, Vec3::new(1.0, -3.0, 5.0));
    }

    #[test]
    fn toggle_mode_alternates() {
        let mut camera = rig();
        assert_eq!(camera.mode, CameraMode::FreeFly);
        assert_eq!(camera.toggle_mode(), CameraMode::Orbit);
        assert!(camera.orbit_enabled());
        assert_eq!(camera.toggle_mode(), CameraMode::FreeFly);
    }

    #[test]
    fn center_pick_ray_points_at_target() {
        let camera = rig();
        let (origin, dir) = camera.pick_ray(Vec2::ZERO, 16.0 / 9.0);
        let expected = (camera.pose.target - camera.pose.position).normalize();
        assert_eq!(origin, camera.pose.position);
        assert!((dir - expected).length() < 1e-5);
    }

    #[test]
    fn target_projects_to_viewport_center() {
        let camera = rig();
        let viewport = Vec2::new(800.0, 600.0);
        let screen = camera.project(camera.pose.target, viewport).unwrap();
        assert!((screen - viewport * 0.5).length() < 1e-3);
        let behind = camera.pose.position * 2.0 - camera.pose.target;
        assert!(camera.project(behind, viewport).is_none());
    }

    #[test]
    fn orbit_keeps_distance_and_clamps_polar() {
        let mut camera = rig();
        let distance = camera.pose.distance();
        camera.orbit(Vec2::new(120.0, -40.0));
        assert!((camera.pose.distance() - distance).abs() < 1e-4);
        camera.orbit(Vec2::new(0.0, -100_000.0));
        let offset = camera.pose.position - camera.pose.target;
        let polar = (offset.z / offset.length()).acos();
        assert!(polar <= CameraSettings::default().max_polar_angle + 1e-4);
    }

    #[test]
    fn dolly_clamps_distance() {
        let mut camera = rig();
        camera.dolly(1000.0);
        assert!((camera.pose.distance() - 1.0).abs() < 1e-4);
        camera.dolly(-1000.0);
        assert!((camera.pose.distance() - 20.0).abs() < 1e-3);
    }

    #[test]
    fn rotation_euler_is_finite() {
        let camera = rig();
        assert!(camera.rotation_euler().is_finite());
    }
}
