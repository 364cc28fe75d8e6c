use glam::{Mat4, Vec3};

pub fn forward_from_yaw_pitch(yaw: f32, pitch: f32) -> Vec3 {
    let cp = pitch.cos();
    let sp = pitch.sin();
    let cy = yaw.cos();
    let sy = yaw.sin();
    Vec3::new(cy * cp, sp, -sy * cp)
}

/// GL-convention perspective projection (clip z in [-w, w]).
pub fn perspective(fov_y_degrees: f32, width: u32, height: u32, near: f32, far: f32) -> Mat4 {
    let aspect = (width.max(1) as f32) / (height.max(1) as f32);
    Mat4::perspective_rh_gl(fov_y_degrees.to_radians(), aspect, near, far)
}

/// View and projection matrices used for one render call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub view_matrix: Mat4,
    pub projection_matrix: Mat4,
}

impl Camera {
    pub fn new(view_matrix: Mat4, projection_matrix: Mat4) -> Self {
        Self {
            view_matrix,
            projection_matrix,
        }
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix * self.view_matrix
    }
}

/// Camera placed at `eye` looking at `target`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PerspectiveCamera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov_y_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl PerspectiveCamera {
    pub fn new(eye: Vec3, target: Vec3) -> Self {
        Self {
            eye,
            target,
            up: Vec3::Y,
            fov_y_degrees: 45.0,
            near: 0.1,
            far: 100.0,
        }
    }

    /// Looks along the direction given by yaw/pitch in radians. Pitch is
    /// clamped just short of straight up or down.
    pub fn from_yaw_pitch(eye: Vec3, yaw: f32, pitch: f32) -> Self {
        let max_pitch = std::f32::consts::FRAC_PI_2 - 0.01;
        let forward = forward_from_yaw_pitch(yaw, pitch.clamp(-max_pitch, max_pitch));
        Self::new(eye, eye + forward)
    }

    pub fn camera(&self, width: u32, height: u32) -> Camera {
        Camera::new(
            Mat4::look_at_rh(self.eye, self.target, self.up),
            perspective(self.fov_y_degrees, width, height, self.near, self.far),
        )
    }
}
