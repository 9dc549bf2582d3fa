//! Physical and numerical parameters for the orbit simulation
//!
//! `SimulationParams` is immutable once built. It is passed by reference to
//! the force law, the integrator and the seeding code, so tests can run the
//! same physics under different constants.

use std::ops::Range;

use cgmath::Vector2;

use crate::error::ConfigError;

/// Largest accepted population
pub const MAX_PARTICLES: usize = 100_000;
/// Largest accepted `particle_count * trail_length`, the trail buffer's vertex count
pub const MAX_TRAIL_POINTS: usize = 5_000_000;

/// Immutable simulation constants
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationParams {
    /// Gravitational constant G
    pub gravitational_constant: f32,
    /// Mass of the central attractor M
    pub central_mass: f32,
    /// World-space position of the attractor
    pub center: Vector2<f32>,
    /// Floor applied to the radius used for direction normalisation
    pub min_radius: f32,
    /// Integration timestep
    pub dt: f32,
    pub particle_count: usize,
    /// Maximum trail length, 0 disables trails
    pub trail_length: usize,
    pub temperature_enabled: bool,
    /// Fraction of circular-orbit speed given to seeded particles
    pub orbit_damping: f32,
    /// Radii particles are seeded at
    pub seed_radius: Range<f32>,
    /// Distance inside which particles are coloured as part of the hot inner disk
    pub accretion_disk_radius: f32,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            gravitational_constant: 200.0,
            central_mass: 2000.0,
            center: Vector2::new(400.0, 300.0),
            min_radius: 5.0,
            dt: 0.008,
            particle_count: 100,
            trail_length: 50,
            temperature_enabled: true,
            orbit_damping: 0.9,
            seed_radius: 50.0..300.0,
            accretion_disk_radius: 80.0,
        }
    }
}

impl SimulationParams {
    /// Creates a builder starting from the default parameters
    pub fn builder() -> SimulationParamsBuilder {
        SimulationParamsBuilder::default()
    }

    /// G·M, the numerator of the force law
    pub fn gm(&self) -> f32 {
        self.gravitational_constant * self.central_mass
    }

    pub fn trails_enabled(&self) -> bool {
        self.trail_length > 0
    }

    /// Tangential speed of a stable circular orbit at `radius`
    pub fn circular_speed(&self, radius: f32) -> f32 {
        (self.gm() / radius).sqrt()
    }
}

/// Builder for [`SimulationParams`], validated on [`build`](Self::build)
#[derive(Default)]
pub struct SimulationParamsBuilder {
    params: SimulationParams,
}

impl SimulationParamsBuilder {
    pub fn with_gravity(mut self, gravitational_constant: f32, central_mass: f32) -> Self {
        self.params.gravitational_constant = gravitational_constant;
        self.params.central_mass = central_mass;
        self
    }

    pub fn with_center(mut self, x: f32, y: f32) -> Self {
        self.params.center = Vector2::new(x, y);
        self
    }

    pub fn with_min_radius(mut self, min_radius: f32) -> Self {
        self.params.min_radius = min_radius;
        self
    }

    pub fn with_dt(mut self, dt: f32) -> Self {
        self.params.dt = dt;
        self
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.params.particle_count = count;
        self
    }

    /// Sets the trail length; 0 turns trails off
    pub fn with_trail_length(mut self, length: usize) -> Self {
        self.params.trail_length = length;
        self
    }

    pub fn with_temperature(mut self, enabled: bool) -> Self {
        self.params.temperature_enabled = enabled;
        self
    }

    pub fn with_orbit_damping(mut self, damping: f32) -> Self {
        self.params.orbit_damping = damping;
        self
    }

    pub fn with_seed_radius(mut self, radius: Range<f32>) -> Self {
        self.params.seed_radius = radius;
        self
    }

    pub fn with_accretion_disk_radius(mut self, radius: f32) -> Self {
        self.params.accretion_disk_radius = radius;
        self
    }

    /// Validates and returns the parameters
    pub fn build(self) -> Result<SimulationParams, ConfigError> {
        let p = self.params;

        positive("gravitational constant", p.gravitational_constant)?;
        positive("central mass", p.central_mass)?;
        positive("minimum radius", p.min_radius)?;
        positive("dt", p.dt)?;
        positive("orbit damping", p.orbit_damping)?;

        if !(p.center.x.is_finite() && p.center.y.is_finite()) {
            return Err(ConfigError::OutOfRange {
                name: "center",
                expected: "finite",
                value: if p.center.x.is_finite() { p.center.y } else { p.center.x },
            });
        }
        if p.particle_count == 0 {
            return Err(ConfigError::NoParticles);
        }
        if p.particle_count > MAX_PARTICLES {
            return Err(ConfigError::TooManyParticles {
                count: p.particle_count,
                max: MAX_PARTICLES,
            });
        }
        let trail_points = p.particle_count.saturating_mul(p.trail_length);
        if trail_points > MAX_TRAIL_POINTS {
            return Err(ConfigError::TrailTooLong {
                points: trail_points,
                max: MAX_TRAIL_POINTS,
            });
        }
        let radius = &p.seed_radius;
        if !(radius.start > 0.0 && radius.start < radius.end && radius.end.is_finite()) {
            return Err(ConfigError::SeedRadius {
                min: radius.start,
                max: radius.end,
            });
        }

        Ok(p)
    }
}

fn positive(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            name,
            expected: "finite and positive",
            value,
        })
    }
}
