pub mod binding;
pub mod depth;
pub mod model;
pub mod pipeline;
pub mod readback;
pub mod render;
pub mod target;
pub mod uniforms;

pub use binding::{GeometryBinding, GeometrySlot};
pub use depth::{DEPTH_FORMAT, create_depth};
pub use model::{Mesh, Vertex};
pub use pipeline::{Layouts, Pipelines, create_bind_group_layouts, create_pipelines};
pub use readback::{Readback, padded_bytes_per_row};
pub use render::{DrawCall, PassKind, Renderer3D};
pub use target::{COLOR_FORMAT, DEPTH_VALUES_FORMAT, DepthReadMode, RenderTarget};
pub use uniforms::{ObjectUniforms, UniformRing};
