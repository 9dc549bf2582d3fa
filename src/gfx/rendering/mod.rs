// src/gfx/rendering/mod.rs
//! Core rendering functionality
//!
//! Handles render pipelines, vertex layouts and frame presentation.

pub mod pipeline_manager;
pub mod render_engine;
pub mod vertex;

// Re-export main types
pub use pipeline_manager::{PipelineConfig, PipelineManager};
pub use render_engine::{DrawUniforms, RenderEngine};
pub use vertex::{PointVertex, TrailVertex, VertexLayout};
