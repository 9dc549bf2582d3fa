//! Semi-implicit (symplectic) Euler stepping
//!
//! Velocity is kicked with the force at the pre-step position, then the
//! position drifts with the new velocity. Over long runs this keeps orbital
//! energy bounded where explicit Euler would spiral outward.

use cgmath::InnerSpace;

use super::forces::gravity;
use super::particle::Particle;
use super::params::SimulationParams;

/// Upper bound of the derived temperature
pub const MAX_TEMPERATURE: f32 = 3.0;

/// Advances one particle by `params.dt`
pub fn step(particle: &mut Particle, params: &SimulationParams) {
    if params.trails_enabled() {
        particle.trail.push(particle.position);
    }

    let dt = params.dt;
    let acceleration = gravity(particle.position, params);
    particle.velocity += acceleration * dt;
    particle.position += particle.velocity * dt;

    if params.temperature_enabled {
        particle.temperature = temperature(particle, params);
    }
}

/// Advances every particle by one step
pub fn step_all(particles: &mut [Particle], params: &SimulationParams) {
    for particle in particles.iter_mut() {
        step(particle, params);
    }
}

/// Temperature from current speed and distance to the centre, clamped to [`MAX_TEMPERATURE`]
pub fn temperature(particle: &Particle, params: &SimulationParams) -> f32 {
    let distance = (particle.position - params.center).magnitude();
    let t = particle.speed() * 0.01 + 200.0 / distance.max(10.0);
    t.min(MAX_TEMPERATURE)
}
