//! Orbiting camera that leans into beats, trends and predicted drops.

use glam::{Mat4, Vec3};

use crate::params::{CameraRig, ViewportConfig};

/// Camera pose handed to the render surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraState {
    pub position: Vec3,
    pub look_at: Vec3,
    /// Vertical field of view (degrees)
    pub fov_degrees: f32,
}

impl CameraState {
    /// Create view-projection matrix for rendering
    pub fn view_projection(&self, viewport: &ViewportConfig) -> Mat4 {
        // Y stays up, the camera never rolls
        let view = Mat4::look_at_rh(self.position, self.look_at, Vec3::Y);
        let proj = Mat4::perspective_rh(
            self.fov_degrees.to_radians(),
            viewport.aspect_ratio(),
            viewport.near_plane_m,
            viewport.far_plane_m,
        );
        proj * view
    }
}

/// Audio-derived inputs the camera responds to, each already clamped
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CameraDrive {
    pub amplitude: f32,
    pub beat_strength: f32,
    /// -1..1
    pub energy_trend: f32,
    pub drop_probability: f32,
    pub buildup_probability: f32,
    /// Height the look-at point should settle on (meters)
    pub focus_height_m: f32,
}

/// Field of view the camera is easing toward
pub fn target_fov(rig: &CameraRig, amplitude: f32, drop_probability: f32) -> f32 {
    rig.base_fov_degrees
        + amplitude.clamp(0.0, 1.0) * rig.amplitude_fov_degrees
        + drop_probability.clamp(0.0, 1.0) * rig.drop_fov_degrees
}

/// Eased orbit parameters
#[derive(Debug, Clone)]
pub struct OrbitCamera {
    rig: CameraRig,
    angle_rad: f32,
    radius_m: f32,
    height_m: f32,
    look_at_height_m: f32,
    fov_degrees: f32,
}

impl OrbitCamera {
    pub fn new(rig: CameraRig) -> Self {
        Self {
            angle_rad: 0.0,
            radius_m: rig.base_radius_m,
            height_m: rig.base_height_m,
            look_at_height_m: 0.0,
            fov_degrees: rig.base_fov_degrees,
            rig,
        }
    }

    pub fn advance(&mut self, dt: f32, drive: &CameraDrive) {
        let rig = &self.rig;
        let ease = (dt * rig.easing_rate_per_s).min(1.0);

        // Rising energy pulls the camera in and up
        let radius = rig.base_radius_m + drive.beat_strength * rig.beat_radius_m
            - drive.energy_trend * rig.trend_radius_m;
        let height = rig.base_height_m
            + drive.beat_strength * rig.beat_height_m
            + drive.energy_trend * rig.trend_height_m
            + drive.buildup_probability * rig.buildup_height_m;
        let look_at = drive.focus_height_m * rig.look_at_height_fraction;
        let fov = target_fov(rig, drive.amplitude, drive.drop_probability);

        self.radius_m += (radius.max(1.0) - self.radius_m) * ease;
        self.height_m += (height - self.height_m) * ease;
        self.look_at_height_m += (look_at - self.look_at_height_m) * ease;
        self.fov_degrees += (fov - self.fov_degrees) * ease;
        self.angle_rad =
            (self.angle_rad + dt * rig.orbit_speed_rad_per_s).rem_euclid(std::f32::consts::TAU);
    }

    pub fn state(&self) -> CameraState {
        CameraState {
            position: Vec3::new(
                self.angle_rad.cos() * self.radius_m,
                self.height_m,
                self.angle_rad.sin() * self.radius_m,
            ),
            look_at: Vec3::new(0.0, self.look_at_height_m, 0.0),
            fov_degrees: self.fov_degrees,
        }
    }
}
