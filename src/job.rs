use anyhow::{Context, Result};
use glam::{EulerRot, Mat4, Quat, Vec3};
use lumen_camera::PerspectiveCamera;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize)]
pub struct OutputSection {
    pub width: u32,
    pub height: u32,
    /// RGB8 PNG of the color pass.
    pub color: Option<PathBuf>,
    /// 16-bit grayscale PNG of the raw depth buffer.
    pub depth: Option<PathBuf>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CameraSection {
    pub eye: [f32; 3],
    /// Look-at point. When absent the view direction comes from `yaw`/`pitch`.
    pub target: Option<[f32; 3]>,
    #[serde(default)]
    pub yaw: f32,
    #[serde(default)]
    pub pitch: f32,
    #[serde(default = "default_fov")]
    pub fov_y: f32,
    #[serde(default = "default_near")]
    pub near: f32,
    #[serde(default = "default_far")]
    pub far: f32,
}

fn default_fov() -> f32 {
    45.0
}

fn default_near() -> f32 {
    0.1
}

fn default_far() -> f32 {
    100.0
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum Shape {
    Cuboid {
        size: [f32; 3],
    },
    Plane {
        size: f32,
    },
    Sphere {
        radius: f32,
        #[serde(default = "default_segments")]
        segments: u32,
        #[serde(default = "default_rings")]
        rings: u32,
    },
    Gltf {
        path: PathBuf,
    },
}

fn default_segments() -> u32 {
    32
}

fn default_rings() -> u32 {
    16
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ObjectSection {
    #[serde(flatten)]
    pub shape: Shape,
    #[serde(default = "default_color")]
    pub color: [f32; 4],
    #[serde(default)]
    pub translation: [f32; 3],
    /// XYZ Euler angles in degrees.
    #[serde(default)]
    pub rotation: [f32; 3],
    #[serde(default = "default_scale")]
    pub scale: [f32; 3],
    #[serde(default)]
    pub smooth: bool,
}

fn default_color() -> [f32; 4] {
    [0.8, 0.8, 0.8, 1.0]
}

fn default_scale() -> [f32; 3] {
    [1.0; 3]
}

impl ObjectSection {
    pub fn model_matrix(&self) -> Mat4 {
        let [rx, ry, rz] = self.rotation.map(f32::to_radians);
        Mat4::from_scale_rotation_translation(
            Vec3::from(self.scale),
            Quat::from_euler(EulerRot::XYZ, rx, ry, rz),
            Vec3::from(self.translation),
        )
    }
}

/// A render job file: output size and paths, camera, and scene contents.
#[derive(Debug, Serialize, Deserialize)]
pub struct RenderJob {
    pub output: OutputSection,
    pub camera: CameraSection,
    #[serde(default)]
    pub objects: Vec<ObjectSection>,
}

impl RenderJob {
    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Loads a job and resolves its relative paths against the file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let mut job =
            Self::parse(&text).with_context(|| format!("failed to parse {}", path.display()))?;
        if let Some(base) = path.parent() {
            job.resolve_paths(base);
        }
        Ok(job)
    }

    fn resolve_paths(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        self.output.color.iter_mut().for_each(resolve);
        self.output.depth.iter_mut().for_each(resolve);
        for object in &mut self.objects {
            if let Shape::Gltf { path } = &mut object.shape {
                resolve(path);
            }
        }
    }

    pub fn perspective_camera(&self) -> PerspectiveCamera {
        let c = &self.camera;
        let eye = Vec3::from(c.eye);
        let mut camera = match c.target {
            Some(target) => PerspectiveCamera::new(eye, Vec3::from(target)),
            None => PerspectiveCamera::from_yaw_pitch(eye, c.yaw.to_radians(), c.pitch.to_radians()),
        };
        camera.fov_y_degrees = c.fov_y;
        camera.near = c.near;
        camera.far = c.far;
        camera
    }
}
