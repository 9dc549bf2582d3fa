//! The drawing surface the frame driver talks to
//!
//! [`RenderBackend`] is the only graphics API the simulation core sees. The
//! wgpu [`RenderEngine`](super::rendering::RenderEngine) implements it for the
//! real window; tests implement it with a recorder.

use super::rendering::vertex::VertexLayout;

/// Opaque handle to a vertex buffer owned by a backend
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub(crate) usize);

impl BufferHandle {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Named scalar uniforms understood by the point and trail shaders
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UniformScalar {
    /// World width mapped onto the full clip-space width
    ScreenWidth,
    /// World height mapped onto the full clip-space height
    ScreenHeight,
    /// Point sprite edge length in world units
    PointSize,
    /// 0 draws hard squares, 1 a soft circular falloff
    Glow,
    /// Multiplier on the fragment alpha
    Opacity,
}

/// Buffer upload and point draw submission
///
/// Uniform setters affect every draw issued after them, like GL uniform state.
pub trait RenderBackend {
    /// Allocates a vertex buffer holding `capacity_bytes` of `layout` vertices
    fn create_vertex_buffer(
        &mut self,
        label: &str,
        layout: VertexLayout,
        capacity_bytes: u64,
    ) -> BufferHandle;

    /// Writes `data` starting `offset` bytes into the buffer
    fn upload_buffer_data(&mut self, buffer: BufferHandle, offset: u64, data: &[f32]);

    fn set_uniform_colour(&mut self, r: f32, g: f32, b: f32);

    fn set_uniform_scalar(&mut self, uniform: UniformScalar, value: f32);

    /// Draws `count` points starting at vertex `start`
    fn draw_points(&mut self, buffer: BufferHandle, start: u32, count: u32);
}
