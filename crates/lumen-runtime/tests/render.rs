//! End-to-end renders. These need a wgpu adapter (hardware or software) and
//! skip with a message when none is available.

use std::f32::consts::FRAC_PI_2;
use std::sync::Arc;

use approx::assert_relative_eq;
use glam::{Mat4, Vec3};
use lumen_runtime::{
    Camera, DepthReadMode, Object, RenderStatus, Renderer, RendererConfig, Scene, SharedScene,
};
use lumen_scene::primitives;

const W: u32 = 32;
const H: u32 = 32;

fn renderer() -> Option<Renderer> {
    renderer_with(RendererConfig::new(W, H))
}

fn renderer_with(config: RendererConfig) -> Option<Renderer> {
    match Renderer::with_config(config.clone()) {
        Ok(r) => return Some(r),
        Err(e) => println!("default adapter unavailable: {e:#}"),
    }
    let config = RendererConfig {
        force_fallback_adapter: true,
        ..config
    };
    match Renderer::with_config(config) {
        Ok(r) => Some(r),
        Err(e) => {
            println!("Skipping render test: could not create renderer: {e:#}");
            None
        }
    }
}

/// Identity view and projection: NDC equals view space, depth = (z + 1) / 2.
fn ndc_camera() -> Camera {
    Camera::new(Mat4::IDENTITY, Mat4::IDENTITY)
}

/// Quad facing +Z covering `x0..x1`, `y0..y1` in NDC at view depth -0.5.
fn quad(x0: f32, x1: f32, y0: f32, y1: f32) -> Object {
    let mesh = Arc::new(primitives::plane(1.0, [1.0, 1.0, 1.0, 1.0]));
    let model = Mat4::from_translation(Vec3::new((x0 + x1) * 0.5, (y0 + y1) * 0.5, -0.5))
        * Mat4::from_scale(Vec3::new(x1 - x0, y1 - y0, 1.0))
        * Mat4::from_rotation_x(FRAC_PI_2);
    Object::new(mesh, model)
}

fn scene_of(objects: Vec<Object>) -> SharedScene {
    Scene { objects }.into_shared()
}

fn pixel(rgb: &[u8], row: usize, col: usize) -> [u8; 3] {
    let i = (row * W as usize + col) * 3;
    [rgb[i], rgb[i + 1], rgb[i + 2]]
}

#[test]
fn empty_scene_renders_clear_values() {
    let Some(mut renderer) = renderer() else { return };
    renderer.set_scene(Scene::new().into_shared()).unwrap();

    let mut rgb = vec![7u8; (W * H * 3) as usize];
    assert_eq!(
        renderer.render(&ndc_camera(), &mut rgb).unwrap(),
        RenderStatus::Rendered
    );
    assert!(rgb.iter().all(|&c| c == 0));

    let mut depth = vec![0.0f32; (W * H) as usize];
    renderer.render_depth_map(&ndc_camera(), &mut depth).unwrap();
    assert!(depth.iter().all(|&d| d == 1.0));
}

#[test]
fn full_screen_quad_writes_gl_depth() {
    let Some(mut renderer) = renderer() else { return };
    let scene = scene_of(vec![quad(-1.25, 1.25, -1.25, 1.25)]);

    let mut depth = vec![0.0f32; (W * H) as usize];
    renderer
        .render_depth_map_with_scene(scene, &ndc_camera(), &mut depth)
        .unwrap();
    for d in depth {
        assert_relative_eq!(d, 0.25, epsilon = 1e-6);
    }

    let mut rgb = vec![0u8; (W * H * 3) as usize];
    renderer.render(&ndc_camera(), &mut rgb).unwrap();
    assert!(rgb.chunks_exact(3).all(|p| p[0] > 0 && p[0] == p[1] && p[1] == p[2]));
}

#[test]
fn output_rows_are_top_down() {
    let Some(mut renderer) = renderer() else { return };
    let scene = scene_of(vec![quad(-1.25, 1.25, 0.2, 1.25)]);

    let mut rgb = vec![0u8; (W * H * 3) as usize];
    renderer
        .render_with_scene(scene, &ndc_camera(), &mut rgb)
        .unwrap();
    assert_ne!(pixel(&rgb, 2, 16), [0, 0, 0]);
    assert_eq!(pixel(&rgb, H as usize - 3, 16), [0, 0, 0]);

    let mut depth = vec![0.0f32; (W * H) as usize];
    renderer.render_depth_map(&ndc_camera(), &mut depth).unwrap();
    assert!(depth[2 * W as usize + 16] < 1.0);
    assert_eq!(depth[(H as usize - 3) * W as usize + 16], 1.0);
}

#[test]
fn repeated_renders_are_identical() {
    let Some(mut renderer) = renderer() else { return };
    let mut sphere = Object::new(
        Arc::new(primitives::uv_sphere(0.6, 16, 12, [0.2, 0.6, 0.9, 1.0])),
        Mat4::from_translation(Vec3::new(0.0, 0.0, -3.0)),
    )
    .with_smoothness(true);
    sphere.model_matrix *= Mat4::from_rotation_y(0.3);
    renderer.set_scene(scene_of(vec![sphere])).unwrap();

    let camera = Camera::new(
        Mat4::IDENTITY,
        Mat4::perspective_rh_gl(60f32.to_radians(), 1.0, 0.1, 10.0),
    );
    let mut first = vec![0u8; (W * H * 3) as usize];
    let mut second = vec![0u8; (W * H * 3) as usize];
    renderer.render(&camera, &mut first).unwrap();
    renderer.render(&camera, &mut second).unwrap();
    assert_eq!(first, second);
    assert!(first.iter().any(|&c| c > 0));
}

#[test]
fn set_scene_replaces_previous_geometry() {
    let Some(mut renderer) = renderer() else { return };
    let left = scene_of(vec![quad(-1.25, 0.0, -1.25, 1.25)]);
    let right = scene_of(vec![quad(0.0, 1.25, -1.25, 1.25)]);

    renderer.set_scene(left).unwrap();
    renderer.set_scene(right).unwrap();

    let mut rgb = vec![0u8; (W * H * 3) as usize];
    renderer.render(&ndc_camera(), &mut rgb).unwrap();
    assert_eq!(pixel(&rgb, 16, 2), [0, 0, 0]);
    assert_ne!(pixel(&rgb, 16, W as usize - 3), [0, 0, 0]);
}

#[test]
fn objects_added_after_set_scene_are_drawn() {
    let Some(mut renderer) = renderer() else { return };
    let scene = Scene::new().into_shared();
    renderer.set_scene(scene.clone()).unwrap();

    scene.write().unwrap().add(quad(-1.25, 1.25, -1.25, 1.25));

    let mut rgb = vec![0u8; (W * H * 3) as usize];
    renderer.render(&ndc_camera(), &mut rgb).unwrap();
    assert_ne!(pixel(&rgb, 16, 16), [0, 0, 0]);
}

#[test]
fn wide_output_elements_receive_same_values() {
    let Some(mut renderer) = renderer() else { return };
    renderer
        .set_scene(scene_of(vec![quad(-1.25, 1.25, -1.25, 1.25)]))
        .unwrap();

    let mut bytes = vec![0u8; (W * H * 3) as usize];
    let mut words = vec![0u32; (W * H * 3) as usize];
    renderer.render(&ndc_camera(), &mut bytes).unwrap();
    renderer.render(&ndc_camera(), &mut words).unwrap();
    assert!(bytes.iter().zip(&words).all(|(&b, &w)| b as u32 == w));
}

#[test]
fn close_signal_leaves_outputs_untouched() {
    let Some(mut renderer) = renderer() else { return };
    renderer
        .set_scene(scene_of(vec![quad(-1.25, 1.25, -1.25, 1.25)]))
        .unwrap();

    let handle = renderer.close_handle();
    handle.request_close();
    assert!(renderer.is_closed());

    let mut rgb = vec![0u8; (W * H * 3) as usize];
    let mut depth = vec![0.0f32; (W * H) as usize];
    for _ in 0..2 {
        assert_eq!(
            renderer.render(&ndc_camera(), &mut rgb).unwrap(),
            RenderStatus::Closed
        );
        assert_eq!(
            renderer.render_depth_map(&ndc_camera(), &mut depth).unwrap(),
            RenderStatus::Closed
        );
    }
    assert!(rgb.iter().all(|&c| c == 0));
    assert!(depth.iter().all(|&d| d == 0.0));
    assert!(renderer.adapter_info().is_none());
}

#[test]
fn misuse_is_reported_as_errors() {
    let Some(mut renderer) = renderer() else { return };

    let mut rgb = vec![0u8; (W * H * 3) as usize];
    let err = renderer.render(&ndc_camera(), &mut rgb).unwrap_err();
    assert!(err.to_string().contains("no scene bound"));

    renderer.set_scene(Scene::new().into_shared()).unwrap();
    let mut short = vec![0u8; 10];
    assert!(renderer.render(&ndc_camera(), &mut short).is_err());
    let mut depth = vec![0.0f32; (W * H * 3) as usize];
    assert!(renderer.render_depth_map(&ndc_camera(), &mut depth).is_err());
}

#[test]
fn depth_through_color_target_matches_gl_depth() {
    let config = RendererConfig {
        depth_read: Some(DepthReadMode::ColorTarget),
        ..RendererConfig::new(W, H)
    };
    let Some(mut renderer) = renderer_with(config) else { return };

    renderer.set_scene(Scene::new().into_shared()).unwrap();
    let mut depth = vec![0.0f32; (W * H) as usize];
    renderer.render_depth_map(&ndc_camera(), &mut depth).unwrap();
    assert!(depth.iter().all(|&d| d == 1.0));

    // With identity matrices depth is (z + 1) / 2: a full-screen quad at
    // z = 0 (0.5), the upper half at z = -0.5 (0.25) and the upper-left
    // quarter at z = -0.75 (0.125). Nearer quads must win the depth test.
    let shifted = |mut object: Object, dz: f32| {
        object.model_matrix = Mat4::from_translation(Vec3::new(0.0, 0.0, dz)) * object.model_matrix;
        object
    };
    let scene = scene_of(vec![
        shifted(quad(-1.25, 1.25, -1.25, 1.25), 0.5),
        quad(-1.25, 1.25, 0.0, 1.25),
        shifted(quad(-1.25, 0.0, 0.0, 1.25), -0.25),
    ]);
    renderer
        .render_depth_map_with_scene(scene, &ndc_camera(), &mut depth)
        .unwrap();

    let at = |row: usize, col: usize| depth[row * W as usize + col];
    assert_relative_eq!(at(2, W as usize - 3), 0.25, epsilon = 1e-6);
    assert_relative_eq!(at(2, 2), 0.125, epsilon = 1e-6);
    assert_relative_eq!(at(H as usize - 3, 16), 0.5, epsilon = 1e-6);
}

#[test]
fn depth_readback_modes_agree() {
    let copy = RendererConfig {
        depth_read: Some(DepthReadMode::CopyAttachment),
        ..RendererConfig::new(W, H)
    };
    let Ok(mut direct) = Renderer::with_config(copy) else {
        println!("Skipping: adapter cannot copy depth textures");
        return;
    };
    let Some(mut via_color) = renderer_with(RendererConfig {
        depth_read: Some(DepthReadMode::ColorTarget),
        ..RendererConfig::new(W, H)
    }) else {
        return;
    };

    let sphere = Object::new(
        Arc::new(primitives::uv_sphere(0.6, 16, 12, [1.0; 4])),
        Mat4::from_translation(Vec3::new(0.2, -0.1, -2.5)),
    );
    let camera = Camera::new(
        Mat4::IDENTITY,
        Mat4::perspective_rh_gl(60f32.to_radians(), 1.0, 0.1, 10.0),
    );
    let scene = scene_of(vec![sphere]);

    let mut a = vec![0.0f32; (W * H) as usize];
    let mut b = vec![0.0f32; (W * H) as usize];
    direct
        .render_depth_map_with_scene(scene.clone(), &camera, &mut a)
        .unwrap();
    via_color
        .render_depth_map_with_scene(scene, &camera, &mut b)
        .unwrap();
    assert!(a.iter().any(|&d| d < 1.0));
    for (x, y) in a.iter().zip(&b) {
        assert_relative_eq!(*x, *y, epsilon = 1e-5);
    }
}

#[test]
fn scenes_larger_than_the_initial_uniform_ring_draw_every_object() {
    const COLUMNS: u32 = 40;
    const ROWS: u32 = 8;
    const QUADS: usize = 20;

    let Some(mut renderer) = renderer_with(RendererConfig::new(COLUMNS, ROWS)) else { return };

    let step = 2.0 / QUADS as f32;
    let quads = (0..QUADS)
        .map(|i| {
            let x0 = -1.0 + step * i as f32;
            quad(x0, x0 + step, -1.25, 1.25)
        })
        .collect();
    renderer.set_scene(scene_of(quads)).unwrap();

    let mut rgb = vec![0u8; (COLUMNS * ROWS * 3) as usize];
    renderer.render(&ndc_camera(), &mut rgb).unwrap();
    let row = ROWS as usize / 2;
    let dark: Vec<usize> = (0..COLUMNS as usize)
        .filter(|&col| {
            let i = (row * COLUMNS as usize + col) * 3;
            rgb[i..i + 3].iter().all(|&c| c == 0)
        })
        .collect();
    assert!(dark.is_empty(), "unlit columns: {dark:?}");
}
