pub mod primitives;

use glam::Mat4;
use lumen_3d::Mesh;
use std::sync::{Arc, RwLock};

/// A mesh placed in the scene.
#[derive(Clone, Debug)]
pub struct Object {
    pub mesh: Arc<Mesh>,
    pub model_matrix: Mat4,
    /// Shade with interpolated vertex normals instead of per-face normals.
    pub smoothness: bool,
}

impl Object {
    pub fn new(mesh: Arc<Mesh>, model_matrix: Mat4) -> Self {
        Self {
            mesh,
            model_matrix,
            smoothness: false,
        }
    }

    pub fn with_smoothness(mut self, smoothness: bool) -> Self {
        self.smoothness = smoothness;
        self
    }

    pub fn num_faces(&self) -> usize {
        self.mesh.num_faces()
    }
}

#[derive(Clone, Debug, Default)]
pub struct Scene {
    pub objects: Vec<Object>,
}

/// Scene handle shared between the host and a renderer. The host takes the
/// write lock to edit between renders.
pub type SharedScene = Arc<RwLock<Scene>>;

impl Scene {
    pub fn new() -> Self {
        Self {
            objects: Vec::new(),
        }
    }

    /// Appends an object and returns its draw index.
    pub fn add(&mut self, object: Object) -> usize {
        self.objects.push(object);
        self.objects.len() - 1
    }

    pub fn add_mesh(&mut self, mesh: Arc<Mesh>, transform: Mat4) -> usize {
        self.add(Object::new(mesh, transform))
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn into_shared(self) -> SharedScene {
        Arc::new(RwLock::new(self))
    }
}
