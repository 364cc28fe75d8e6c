//! Procedural meshes centered on the origin, counter-clockwise front faces
//! with outward normals.

use glam::Vec3;
use lumen_3d::{Mesh, Vertex};

fn push_quad(vertices: &mut Vec<Vertex>, corners: [Vec3; 4], normal: Vec3, color: [f32; 4]) {
    for i in [0, 1, 2, 0, 2, 3] {
        vertices.push(Vertex::new(corners[i], normal, color));
    }
}

/// Axis-aligned box with edge lengths `size`.
pub fn cuboid(size: Vec3, color: [f32; 4]) -> Mesh {
    let h = size * 0.5;
    let mut vertices = Vec::with_capacity(36);
    let faces = [
        (Vec3::X, Vec3::Y),
        (Vec3::NEG_X, Vec3::Y),
        (Vec3::Y, Vec3::Z),
        (Vec3::NEG_Y, Vec3::Z),
        (Vec3::Z, Vec3::Y),
        (Vec3::NEG_Z, Vec3::Y),
    ];
    for (normal, up) in faces {
        // right x up == normal keeps the winding counter-clockwise seen from outside.
        let right = up.cross(normal);
        let center = normal * h;
        let u = right * h;
        let v = up * h;
        push_quad(
            &mut vertices,
            [center - u - v, center + u - v, center + u + v, center - u + v],
            normal,
            color,
        );
    }
    Mesh::new(vertices)
}

/// Square of side `size` in the XZ plane, facing +Y.
pub fn plane(size: f32, color: [f32; 4]) -> Mesh {
    let h = size * 0.5;
    let mut vertices = Vec::with_capacity(6);
    push_quad(
        &mut vertices,
        [
            Vec3::new(-h, 0.0, h),
            Vec3::new(h, 0.0, h),
            Vec3::new(h, 0.0, -h),
            Vec3::new(-h, 0.0, -h),
        ],
        Vec3::Y,
        color,
    );
    Mesh::new(vertices)
}

pub fn uv_sphere(radius: f32, segments: u32, rings: u32, color: [f32; 4]) -> Mesh {
    let segments = segments.max(3);
    let rings = rings.max(2);
    let point = |ring: u32, seg: u32| {
        let theta = std::f32::consts::PI * ring as f32 / rings as f32;
        let phi = std::f32::consts::TAU * seg as f32 / segments as f32;
        Vec3::new(theta.sin() * phi.cos(), theta.cos(), -theta.sin() * phi.sin())
    };

    let mut vertices = Vec::with_capacity((segments * rings * 6) as usize);
    for ring in 0..rings {
        for seg in 0..segments {
            let a = point(ring, seg);
            let b = point(ring + 1, seg);
            let c = point(ring + 1, seg + 1);
            let d = point(ring, seg + 1);
            let mut emit = |tri: [Vec3; 3]| {
                for n in tri {
                    vertices.push(Vertex::new(n * radius, n, color));
                }
            };
            // Skip the degenerate triangle at each pole.
            if ring != 0 {
                emit([a, b, d]);
            }
            if ring != rings - 1 {
                emit([b, c, d]);
            }
        }
    }
    Mesh::new(vertices)
}
