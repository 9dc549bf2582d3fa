//! Orbit simulation
//!
//! Everything here is plain CPU code with no graphics dependencies apart
//! from the [`RenderBackend`](crate::gfx::backend::RenderBackend) seam used by
//! the [`driver`].

pub mod colour;
pub mod driver;
pub mod forces;
pub mod integrator;
pub mod params;
pub mod particle;
pub mod seeding;

pub use driver::{FrameDriver, FrameHandles};
pub use params::{SimulationParams, SimulationParamsBuilder};
pub use particle::{Particle, Trail};
