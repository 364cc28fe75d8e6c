//! Off-screen rendering of a [`lumen_scene::Scene`] into host-owned depth and
//! color buffers.

pub mod context;
pub mod export;
pub mod logging;
pub mod renderer;

pub use context::{CloseHandle, ContextGuard, GraphicsContext, RendererConfig};
pub use logging::{LoggingConfig, init_logging};
pub use renderer::{RenderStatus, Renderer, draw_calls};

pub use lumen_3d::DepthReadMode;
pub use lumen_camera::Camera;
pub use lumen_scene::{Object, Scene, SharedScene};
