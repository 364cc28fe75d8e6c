use anyhow::{Context, Result, anyhow, ensure};
use lumen_3d::{DrawCall, GeometryBinding, ObjectUniforms, PassKind, Renderer3D};
use lumen_camera::Camera;
use lumen_scene::{Scene, SharedScene};
use wgpu::CommandEncoderDescriptor;

use crate::context::{CloseHandle, GraphicsContext, RendererConfig};
use crate::export::{flip_depth, flip_rgb};

/// Outcome of a render call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStatus {
    /// The output buffer now holds the new frame.
    Rendered,
    /// The close signal was raised; the output buffer was not touched.
    Closed,
}

/// Builds the per-object draw list for `scene` seen through `camera`, in
/// scene order.
pub fn draw_calls(scene: &Scene, camera: &Camera) -> Vec<DrawCall> {
    scene
        .objects
        .iter()
        .enumerate()
        .map(|(slot, object)| DrawCall {
            slot,
            uniforms: ObjectUniforms::new(
                object.model_matrix,
                camera.view_matrix,
                camera.projection_matrix,
                object.smoothness,
            ),
            vertex_count: 3 * object.num_faces() as u32,
        })
        .collect()
}

struct Gpu {
    context: GraphicsContext,
    renderer: Renderer3D,
    binding: GeometryBinding,
}

/// Off-screen renderer with fixed output dimensions.
///
/// The scene is shared with the host through [`SharedScene`]; the renderer
/// holds a read lock only while a call runs. Readback storage is allocated
/// once here and reused by every render call.
pub struct Renderer {
    width: u32,
    height: u32,
    close: CloseHandle,
    /// `None` once the close signal has torn the GPU state down.
    gpu: Option<Gpu>,
    scene: Option<SharedScene>,
    depth_buffer: Vec<f32>,
    color_buffer: Vec<u8>,
}

impl Renderer {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        Self::with_config(RendererConfig::new(width, height))
    }

    pub fn with_scene(scene: SharedScene, width: u32, height: u32) -> Result<Self> {
        let mut renderer = Self::new(width, height)?;
        renderer.set_scene(scene)?;
        Ok(renderer)
    }

    pub fn with_config(config: RendererConfig) -> Result<Self> {
        let context = pollster::block_on(GraphicsContext::new(&config))
            .context("failed to initialize graphics context")?;

        let depth_read = context.depth_read_mode(config.depth_read)?;

        let (width, height) = (config.width, config.height);
        let guard = context.scope("renderer_init");
        let renderer = Renderer3D::new(&context.device, width, height, depth_read);
        guard.finish()?;

        let pixels = width as usize * height as usize;
        log::debug!("renderer ready at {width}x{height}");

        Ok(Self {
            width,
            height,
            close: CloseHandle::new(),
            gpu: Some(Gpu {
                context,
                renderer,
                binding: GeometryBinding::empty(),
            }),
            scene: None,
            depth_buffer: vec![0.0; pixels],
            color_buffer: vec![0; pixels * 3],
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn close_handle(&self) -> CloseHandle {
        self.close.clone()
    }

    pub fn request_close(&self) {
        self.close.request_close();
    }

    /// True once the close signal has been raised, whether or not a render
    /// call has observed it yet.
    pub fn is_closed(&self) -> bool {
        self.close.is_close_requested()
    }

    pub fn adapter_info(&self) -> Option<wgpu::AdapterInfo> {
        self.gpu.as_ref().map(|gpu| gpu.context.adapter_info())
    }

    /// Replaces the bound scene and rebuilds the geometry binding from it.
    pub fn set_scene(&mut self, scene: SharedScene) -> Result<()> {
        if let Some(Gpu {
            context, binding, ..
        }) = self.gpu.as_mut()
        {
            let guard = context.scope("set_scene");
            {
                let locked = scene.read().map_err(|_| anyhow!("scene lock poisoned"))?;
                *binding =
                    GeometryBinding::build(&context.device, locked.objects.iter().map(|o| &o.mesh));
            }
            guard.finish()?;
        } else {
            log::debug!("set_scene after shutdown; geometry not uploaded");
        }
        self.scene = Some(scene);
        Ok(())
    }

    pub fn scene(&self) -> Option<&SharedScene> {
        self.scene.as_ref()
    }

    /// Renders the depth attachment into `out` (`height * width` values,
    /// top row first). Values are raw depth in [0, 1].
    pub fn render_depth_map(&mut self, camera: &Camera, out: &mut [f32]) -> Result<RenderStatus> {
        if !self.check_open() {
            return Ok(RenderStatus::Closed);
        }
        let expected = self.width as usize * self.height as usize;
        ensure!(
            out.len() == expected,
            "depth output holds {} values, expected {expected} ({}x{})",
            out.len(),
            self.height,
            self.width
        );

        self.render_objects(camera, PassKind::Depth)?;
        flip_depth(
            &self.depth_buffer,
            self.width as usize,
            self.height as usize,
            out,
        );
        Ok(RenderStatus::Rendered)
    }

    /// Renders the color attachment into `out` (`height * width * 3`
    /// channels, top row first, RGB).
    pub fn render<T>(&mut self, camera: &Camera, out: &mut [T]) -> Result<RenderStatus>
    where
        T: From<u8> + Copy,
    {
        if !self.check_open() {
            return Ok(RenderStatus::Closed);
        }
        let expected = self.width as usize * self.height as usize * 3;
        ensure!(
            out.len() == expected,
            "color output holds {} values, expected {expected} ({}x{}x3)",
            out.len(),
            self.height,
            self.width
        );

        self.render_objects(camera, PassKind::Color)?;
        flip_rgb(
            &self.color_buffer,
            self.width as usize,
            self.height as usize,
            out,
        );
        Ok(RenderStatus::Rendered)
    }

    pub fn render_depth_map_with_scene(
        &mut self,
        scene: SharedScene,
        camera: &Camera,
        out: &mut [f32],
    ) -> Result<RenderStatus> {
        self.set_scene(scene)?;
        self.render_depth_map(camera, out)
    }

    pub fn render_with_scene<T>(
        &mut self,
        scene: SharedScene,
        camera: &Camera,
        out: &mut [T],
    ) -> Result<RenderStatus>
    where
        T: From<u8> + Copy,
    {
        self.set_scene(scene)?;
        self.render(camera, out)
    }

    /// Tears the GPU state down the first time the close signal is seen.
    fn check_open(&mut self) -> bool {
        if !self.close.is_close_requested() {
            return self.gpu.is_some();
        }
        if let Some(gpu) = self.gpu.take() {
            log::info!("close requested; releasing GPU resources");
            drop(gpu.binding);
            drop(gpu.renderer);
            gpu.context.shutdown();
        }
        false
    }

    /// Draws every object of the bound scene and reads the pass's attachment
    /// back into the internal buffer.
    fn render_objects(&mut self, camera: &Camera, kind: PassKind) -> Result<()> {
        let scene = self
            .scene
            .clone()
            .context("no scene bound; call set_scene first")?;
        let scene = scene.read().map_err(|_| anyhow!("scene lock poisoned"))?;
        let Gpu {
            context,
            renderer,
            binding,
        } = self.gpu.as_mut().context("renderer has been shut down")?;

        let guard = context.scope(kind.label());

        if !binding.matches(scene.objects.iter().map(|o| &o.mesh)) {
            log::debug!(
                "scene changed since set_scene ({} bound, {} now); rebuilding geometry",
                binding.len(),
                scene.len()
            );
            *binding = GeometryBinding::build(&context.device, scene.objects.iter().map(|o| &o.mesh));
        }

        let draws = draw_calls(&scene, camera);
        let mut encoder = context
            .device
            .create_command_encoder(&CommandEncoderDescriptor {
                label: Some(kind.label()),
            });
        renderer.encode(
            &context.device,
            &context.queue,
            &mut encoder,
            kind,
            binding,
            &draws,
        );
        context.queue.submit(Some(encoder.finish()));

        match kind {
            PassKind::Depth => renderer.read_depth(&context.device, &mut self.depth_buffer)?,
            PassKind::Color => renderer.read_rgb(&context.device, &mut self.color_buffer)?,
        }
        guard.finish()
    }
}
