pub mod geometry;
pub mod renderer;
pub mod uniforms;

pub use geometry::PointInstance;
pub use renderer::Renderer;
pub use uniforms::FrameUniforms;
