//! Event Horizon
//!
//! A 2D particle simulation of test bodies orbiting a central mass, drawn
//! with wgpu into a winit window.

pub mod app;
pub mod config;
pub mod error;
pub mod gfx;
pub mod performance;
pub mod simulation;
pub mod wgpu_utils;

// Re-export main types for convenience
pub use app::OrbitApp;
pub use config::{Config, Preset, RenderSettings};
pub use error::{ConfigError, InitializationError, ShaderBuildError};

/// Creates an application configured from the environment
pub fn from_env() -> anyhow::Result<OrbitApp> {
    let config = Config::from_env()?;
    Ok(OrbitApp::new(config)?)
}
