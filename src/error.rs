//! Error types for setup-time failures
//!
//! The frame loop itself never fails: numeric edge cases are clamped and a
//! lost surface is reconfigured. Everything that can go wrong happens while
//! building the configuration, the window or the GPU context.

use thiserror::Error;

/// Fatal failure while bringing up the window, GPU context or pipelines
#[derive(Debug, Error)]
pub enum InitializationError {
    #[error("failed to create event loop: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),

    #[error("failed to create rendering surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("no suitable GPU adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),

    #[error("failed to request GPU device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("surface reports no supported texture formats")]
    NoSurfaceFormat,

    #[error(transparent)]
    Shader(#[from] ShaderBuildError),
}

/// A WGSL module failed to compile, or a pipeline built from it failed validation
#[derive(Debug, Error)]
pub enum ShaderBuildError {
    #[error("shader '{label}' failed to compile:\n{log}")]
    Compile { label: String, log: String },

    #[error("pipeline '{label}' failed to link:\n{log}")]
    Link { label: String, log: String },

    #[error("pipeline '{pipeline}' references unknown shader '{shader}'")]
    MissingShader { pipeline: String, shader: String },
}

/// Rejected simulation parameters or environment overrides
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{name} must be {expected}, got {value}")]
    OutOfRange {
        name: &'static str,
        expected: &'static str,
        value: f32,
    },

    #[error("particle count must be at least 1")]
    NoParticles,

    #[error("particle count {count} exceeds the maximum of {max}")]
    TooManyParticles { count: usize, max: usize },

    #[error("trails would hold {points} points, more than the maximum of {max}")]
    TrailTooLong { points: usize, max: usize },

    #[error("seed radius range {min}..{max} is empty or not positive")]
    SeedRadius { min: f32, max: f32 },

    #[error("unknown preset '{0}', expected 'classic' or 'disk'")]
    UnknownPreset(String),

    #[error("environment variable {var}='{value}' is not valid")]
    InvalidOverride { var: &'static str, value: String },
}
