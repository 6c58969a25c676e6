// VIEW: GPU setup, shader program and drawing
pub mod gpu_init;
pub mod render;
pub mod shader;
pub mod uniforms;

pub use gpu_init::{GpuContext, GpuError, WindowPresenter};
pub use render::{draw_frame, RenderResources};
pub use shader::{ShaderError, ShaderProgram};
pub use uniforms::{UniformBlock, UniformSink, UniformValue};
