use std::path::Path;

use anyhow::{Context, Result, bail};
use glam::{Mat3, Mat4, Vec3};
use lumen_3d::Mesh;

/// Loads every triangle primitive reachable from the default scene, with node
/// transforms baked into positions and normals.
pub fn load_gltf_meshes(path: &Path) -> Result<Vec<Mesh>> {
    let (document, buffers, _images) =
        gltf::import(path).with_context(|| format!("failed to import {}", path.display()))?;

    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .with_context(|| format!("{} contains no scenes", path.display()))?;

    let mut meshes = Vec::new();
    for node in scene.nodes() {
        collect_node(&node, Mat4::IDENTITY, &buffers, &mut meshes)?;
    }

    if meshes.is_empty() {
        bail!("{} contains no triangle meshes", path.display());
    }
    log::info!("loaded {} meshes from {}", meshes.len(), path.display());
    Ok(meshes)
}

fn collect_node(
    node: &gltf::Node,
    parent: Mat4,
    buffers: &[gltf::buffer::Data],
    out: &mut Vec<Mesh>,
) -> Result<()> {
    let xform = parent * Mat4::from_cols_array_2d(&node.transform().matrix());

    if let Some(mesh) = node.mesh() {
        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                log::warn!(
                    "skipping {:?} primitive in mesh {:?}",
                    primitive.mode(),
                    mesh.name().unwrap_or("<unnamed>")
                );
                continue;
            }
            out.push(read_primitive(&primitive, xform, buffers)?);
        }
    }

    for child in node.children() {
        collect_node(&child, xform, buffers, out)?;
    }
    Ok(())
}

fn read_primitive(
    primitive: &gltf::Primitive,
    xform: Mat4,
    buffers: &[gltf::buffer::Data],
) -> Result<Mesh> {
    let reader = primitive.reader(|b| buffers.get(b.index()).map(|d| &d.0[..]));

    let positions: Vec<Vec3> = reader
        .read_positions()
        .context("primitive has no POSITION attribute")?
        .map(|p| xform.transform_point3(Vec3::from(p)))
        .collect();

    let normal_xform = Mat3::from_mat4(xform).inverse().transpose();
    let normals: Option<Vec<Vec3>> = reader
        .read_normals()
        .map(|it| {
            it.map(|n| (normal_xform * Vec3::from(n)).normalize_or_zero())
                .collect::<Vec<_>>()
        })
        .filter(|n| n.len() == positions.len());

    let indices: Vec<u32> = match reader.read_indices() {
        Some(it) => it.into_u32().collect(),
        None => (0..positions.len() as u32).collect(),
    };
    if let Some(&bad) = indices.iter().find(|&&i| i as usize >= positions.len()) {
        bail!("index {bad} out of range for {} vertices", positions.len());
    }

    let color = primitive
        .material()
        .pbr_metallic_roughness()
        .base_color_factor();

    Ok(Mesh::from_indexed(
        &positions,
        normals.as_deref(),
        &indices,
        color,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    // One triangle (0,0,0) (1,0,0) (0,1,0), no normals, no indices.
    const TRIANGLE_GLTF: &str = r#"{
  "asset": { "version": "2.0" },
  "scene": 0,
  "scenes": [{ "nodes": [0] }],
  "nodes": [{ "mesh": 0, "translation": [0.0, 0.0, -2.0] }],
  "meshes": [{ "primitives": [{ "attributes": { "POSITION": 0 }, "material": 0 }] }],
  "materials": [{ "pbrMetallicRoughness": { "baseColorFactor": [1.0, 0.5, 0.25, 1.0] } }],
  "buffers": [{
    "byteLength": 36,
    "uri": "data:application/octet-stream;base64,AAAAAAAAAAAAAAAAAACAPwAAAAAAAAAAAAAAAAAAgD8AAAAA"
  }],
  "bufferViews": [{ "buffer": 0, "byteOffset": 0, "byteLength": 36 }],
  "accessors": [{
    "bufferView": 0,
    "componentType": 5126,
    "count": 3,
    "type": "VEC3",
    "min": [0.0, 0.0, 0.0],
    "max": [1.0, 1.0, 0.0]
  }]
}"#;

    #[test]
    fn loads_triangle_with_baked_transform() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("triangle.gltf");
        std::fs::write(&path, TRIANGLE_GLTF).unwrap();

        let meshes = load_gltf_meshes(&path).unwrap();
        assert_eq!(meshes.len(), 1);
        let mesh = &meshes[0];
        assert_eq!(mesh.num_faces(), 1);
        assert_eq!(mesh.vertices[1].position, [1.0, 0.0, -2.0]);
        assert_relative_eq!(mesh.vertices[0].normal[2], 1.0);
        assert_eq!(mesh.vertices[2].color, [1.0, 0.5, 0.25, 1.0]);
    }

    // Same triangle, indexed as [0, 1, 5].
    const BAD_INDEX_GLTF: &str = r#"{
  "asset": { "version": "2.0" },
  "scene": 0,
  "scenes": [{ "nodes": [0] }],
  "nodes": [{ "mesh": 0 }],
  "meshes": [{ "primitives": [{ "attributes": { "POSITION": 0 }, "indices": 1 }] }],
  "buffers": [{
    "byteLength": 42,
    "uri": "data:application/octet-stream;base64,AAAAAAAAAAAAAAAAAACAPwAAAAAAAAAAAAAAAAAAgD8AAAAAAAABAAUA"
  }],
  "bufferViews": [
    { "buffer": 0, "byteOffset": 0, "byteLength": 36 },
    { "buffer": 0, "byteOffset": 36, "byteLength": 6 }
  ],
  "accessors": [
    {
      "bufferView": 0,
      "componentType": 5126,
      "count": 3,
      "type": "VEC3",
      "min": [0.0, 0.0, 0.0],
      "max": [1.0, 1.0, 0.0]
    },
    { "bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR" }
  ]
}"#;

    #[test]
    fn out_of_range_index_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad_index.gltf");
        std::fs::write(&path, BAD_INDEX_GLTF).unwrap();

        let err = load_gltf_meshes(&path).unwrap_err();
        assert!(err.to_string().contains("index 5 out of range for 3 vertices"));
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_gltf_meshes(&dir.path().join("nope.glb")).unwrap_err();
        assert!(format!("{err:#}").contains("nope.glb"));
    }
}
