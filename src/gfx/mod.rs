//! # Graphics Module
//!
//! - [`backend`] - the [`RenderBackend`] trait the simulation draws through
//! - [`frame`] - per-frame flattening of particle state into float buffers
//! - [`rendering`] - the wgpu implementation: pipelines, shaders and the
//!   [`RenderEngine`]

pub mod backend;
pub mod frame;
pub mod rendering;

// Re-export commonly used types
pub use backend::{BufferHandle, RenderBackend, UniformScalar};
pub use frame::FrameBuffers;
pub use rendering::render_engine::RenderEngine;
