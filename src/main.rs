mod job;
mod output;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use lumen_gltf::load_gltf_meshes;
use lumen_runtime::{Object, RenderStatus, Renderer, Scene};
use lumen_scene::primitives;

use crate::job::{RenderJob, Shape};

fn build_scene(job: &RenderJob) -> Result<Scene> {
    let mut scene = Scene::new();
    for object in &job.objects {
        let model = object.model_matrix();
        let meshes = match &object.shape {
            Shape::Cuboid { size } => vec![primitives::cuboid((*size).into(), object.color)],
            Shape::Plane { size } => vec![primitives::plane(*size, object.color)],
            Shape::Sphere {
                radius,
                segments,
                rings,
            } => vec![primitives::uv_sphere(*radius, *segments, *rings, object.color)],
            Shape::Gltf { path } => load_gltf_meshes(path)?,
        };
        for mesh in meshes {
            scene.add(Object::new(Arc::new(mesh), model).with_smoothness(object.smooth));
        }
    }
    Ok(scene)
}

fn run(job: &RenderJob) -> Result<()> {
    let (width, height) = (job.output.width, job.output.height);
    if job.output.color.is_none() && job.output.depth.is_none() {
        bail!("job requests neither a color nor a depth output");
    }

    let scene = build_scene(job)?;
    log::info!("rendering {} objects at {width}x{height}", scene.len());
    let mut renderer = Renderer::with_scene(scene.into_shared(), width, height)?;
    let camera = job.perspective_camera().camera(width, height);

    if let Some(path) = &job.output.color {
        let mut rgb = vec![0u8; width as usize * height as usize * 3];
        if renderer.render(&camera, &mut rgb)? == RenderStatus::Closed {
            bail!("renderer closed before the color pass");
        }
        output::write_color_png(path, width, height, rgb)?;
        log::info!("wrote {}", path.display());
    }

    if let Some(path) = &job.output.depth {
        let mut depth = vec![0f32; width as usize * height as usize];
        if renderer.render_depth_map(&camera, &mut depth)? == RenderStatus::Closed {
            bail!("renderer closed before the depth pass");
        }
        output::write_depth_png(path, width, height, &depth)?;
        log::info!("wrote {}", path.display());
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .context("usage: lumen <job.toml>")?;
    let job = RenderJob::load(&path)?;
    run(&job)
}
