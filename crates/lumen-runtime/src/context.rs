use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result, anyhow, ensure};
use lumen_3d::{DEPTH_VALUES_FORMAT, DepthReadMode};
use wgpu::{
    Adapter, AdapterInfo, Backends, Device, DownlevelFlags, ErrorFilter, ExperimentalFeatures,
    Features, Instance, InstanceDescriptor, Limits, MemoryHints, PowerPreference, Queue,
    RequestAdapterOptions, TextureUsages,
};

/// Construction parameters for a [`crate::Renderer`].
#[derive(Debug, Clone)]
pub struct RendererConfig {
    pub width: u32,
    pub height: u32,
    pub backends: Backends,
    pub power_preference: PowerPreference,
    /// Request a software adapter (e.g. for CI without a GPU).
    pub force_fallback_adapter: bool,
    /// How depth values are read back. `None` picks from the adapter's
    /// downlevel capabilities.
    pub depth_read: Option<DepthReadMode>,
}

impl RendererConfig {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            width: 256,
            height: 256,
            backends: Backends::all(),
            power_preference: PowerPreference::default(),
            force_fallback_adapter: false,
            depth_read: None,
        }
    }
}

/// Cooperative close signal. Clones share the same flag.
#[derive(Debug, Clone, Default)]
pub struct CloseHandle(Arc<AtomicBool>);

impl CloseHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_close(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_close_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Headless adapter, device and queue. Stands in for the hidden window and
/// its graphics context.
pub struct GraphicsContext {
    #[allow(dead_code)]
    instance: Instance,
    adapter: Adapter,
    pub device: Device,
    pub queue: Queue,
}

impl GraphicsContext {
    pub async fn new(config: &RendererConfig) -> Result<Self> {
        ensure!(
            config.width > 0 && config.height > 0,
            "render target must be non-empty, got {}x{}",
            config.width,
            config.height
        );

        let instance = Instance::new(&InstanceDescriptor {
            backends: config.backends,
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&RequestAdapterOptions {
                power_preference: config.power_preference,
                force_fallback_adapter: config.force_fallback_adapter,
                compatible_surface: None,
            })
            .await
            .context("failed to find a suitable GPU adapter")?;

        let limits = adapter.limits();
        let max_dim = limits.max_texture_dimension_2d;
        ensure!(
            config.width <= max_dim && config.height <= max_dim,
            "render target {}x{} exceeds adapter limit {max_dim}",
            config.width,
            config.height
        );

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("lumen device"),
                required_features: Features::empty(),
                required_limits: Limits::downlevel_defaults().using_resolution(limits),
                memory_hints: MemoryHints::Performance,
                trace: wgpu::Trace::Off,
                experimental_features: ExperimentalFeatures::disabled(),
            })
            .await
            .context("failed to create wgpu device/queue")?;

        let info = adapter.get_info();
        log::info!(
            "using adapter {} ({:?}, {:?})",
            info.name,
            info.backend,
            info.device_type
        );

        Ok(Self {
            instance,
            adapter,
            device,
            queue,
        })
    }

    pub fn adapter_info(&self) -> AdapterInfo {
        self.adapter.get_info()
    }

    /// Resolves how the depth pass reads back on this adapter, failing when the
    /// adapter supports neither the requested nor the automatic choice.
    pub fn depth_read_mode(&self, requested: Option<DepthReadMode>) -> Result<DepthReadMode> {
        let flags = self.adapter.get_downlevel_capabilities().flags;
        let mode = requested.unwrap_or_else(|| DepthReadMode::for_downlevel(flags));
        match mode {
            DepthReadMode::CopyAttachment => ensure!(
                flags.contains(DownlevelFlags::DEPTH_TEXTURE_AND_BUFFER_COPIES),
                "adapter cannot copy depth textures to buffers"
            ),
            DepthReadMode::ColorTarget => ensure!(
                self.adapter
                    .get_texture_format_features(DEPTH_VALUES_FORMAT)
                    .allowed_usages
                    .contains(TextureUsages::RENDER_ATTACHMENT),
                "adapter cannot render to {DEPTH_VALUES_FORMAT:?}, so depth cannot be read back"
            ),
        }
        log::debug!("depth readback mode: {mode:?}");
        Ok(mode)
    }

    /// Opens a validation scope for one public entry point.
    pub fn scope(&self, label: &'static str) -> ContextGuard<'_> {
        self.device.push_error_scope(ErrorFilter::Validation);
        ContextGuard {
            device: &self.device,
            label,
            finished: false,
        }
    }

    /// Waits for in-flight work so dropping the device is clean.
    pub fn shutdown(self) {
        if let Err(e) = self.device.poll(wgpu::PollType::wait_indefinitely()) {
            log::warn!("failed to poll device during shutdown: {e:?}");
        }
        log::info!("graphics context torn down");
    }
}

/// Validation scope around a group of GPU calls. `finish` reports errors
/// raised inside the scope; dropping an unfinished guard only logs them.
pub struct ContextGuard<'a> {
    device: &'a Device,
    label: &'static str,
    finished: bool,
}

impl ContextGuard<'_> {
    pub fn finish(mut self) -> Result<()> {
        self.finished = true;
        match pollster::block_on(self.device.pop_error_scope()) {
            Some(err) => Err(anyhow!("{}: {err}", self.label)),
            None => Ok(()),
        }
    }
}

impl Drop for ContextGuard<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        if let Some(err) = pollster::block_on(self.device.pop_error_scope()) {
            log::error!("{}: {err}", self.label);
        }
    }
}
