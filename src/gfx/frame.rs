//! Per-frame flattening of particle state into upload buffers
//!
//! The buffers are owned `Vec<f32>`s that are cleared and refilled every
//! frame, so their allocations are reused once they reach steady-state size.

use cgmath::InnerSpace;

use crate::simulation::colour::particle_colour;
use crate::simulation::particle::Particle;
use crate::simulation::params::SimulationParams;

/// Flat float buffers ready for upload
#[derive(Debug, Default)]
pub struct FrameBuffers {
    /// `(x, y)` per particle, then one `(x, y)` for the attractor marker
    pub positions: Vec<f32>,
    /// `(r, g, b)` per particle, empty when temperature colouring is off
    pub colours: Vec<f32>,
    /// `(x, y, alpha)` for every trail point of every particle
    pub trail: Vec<f32>,
}

impl FrameBuffers {
    pub fn with_capacity(params: &SimulationParams) -> Self {
        let n = params.particle_count;
        Self {
            positions: Vec::with_capacity((n + 1) * 2),
            colours: Vec::with_capacity(n * 3),
            trail: Vec::with_capacity(n * params.trail_length * 3),
        }
    }

    /// Refills every buffer from `particles`
    pub fn rebuild(&mut self, particles: &[Particle], params: &SimulationParams) {
        self.positions.clear();
        self.colours.clear();
        self.trail.clear();

        for particle in particles {
            self.positions
                .extend_from_slice(&[particle.position.x, particle.position.y]);

            if params.temperature_enabled {
                let distance = (particle.position - params.center).magnitude();
                let colour = particle_colour(
                    particle.temperature(),
                    distance,
                    params.accretion_disk_radius,
                );
                self.colours.extend_from_slice(&colour.rgb());
            }

            let len = particle.trail().len() as f32;
            for (j, point) in particle.trail().iter().enumerate() {
                self.trail.extend_from_slice(&[point.x, point.y, j as f32 / len]);
            }
        }

        self.positions
            .extend_from_slice(&[params.center.x, params.center.y]);
    }

    /// Number of particle points, excluding the marker
    pub fn particle_count(&self) -> usize {
        (self.positions.len() / 2).saturating_sub(1)
    }

    /// Vertex index of the attractor marker in `positions`
    pub fn marker_index(&self) -> usize {
        self.particle_count()
    }

    pub fn trail_point_count(&self) -> usize {
        self.trail.len() / 3
    }

    /// RGB of particle `index`, if temperature colouring produced one
    pub fn colour(&self, index: usize) -> Option<[f32; 3]> {
        self.colours
            .get(index * 3..index * 3 + 3)
            .map(|c| [c[0], c[1], c[2]])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::integrator::step;
    use crate::simulation::seeding::circular_orbit;

    #[test]
    fn test_positions_end_with_marker() {
        let params = SimulationParams::default();
        let particles = vec![
            circular_orbit(100.0, 0.0, 1.0, &params),
            circular_orbit(200.0, 1.0, 1.0, &params),
        ];

        let mut buffers = FrameBuffers::with_capacity(&params);
        buffers.rebuild(&particles, &params);

        assert_eq!(buffers.positions.len(), 6);
        assert_eq!(buffers.particle_count(), 2);
        assert_eq!(buffers.marker_index(), 2);
        assert_eq!(&buffers.positions[0..2], &[500.0, 300.0]);
        assert_eq!(&buffers.positions[4..6], &[params.center.x, params.center.y]);
    }

    #[test]
    fn test_trail_alpha_runs_oldest_to_newest() {
        let params = SimulationParams::builder().with_trail_length(4).build().unwrap();
        let mut particle = circular_orbit(120.0, 0.0, 1.0, &params);
        for _ in 0..4 {
            step(&mut particle, &params);
        }

        let mut buffers = FrameBuffers::default();
        buffers.rebuild(std::slice::from_ref(&particle), &params);

        assert_eq!(buffers.trail_point_count(), 4);
        let alphas: Vec<f32> = buffers.trail.chunks(3).map(|v| v[2]).collect();
        assert_eq!(alphas, vec![0.0, 0.25, 0.5, 0.75]);

        let oldest = particle.trail().iter().next().unwrap();
        assert_eq!(&buffers.trail[0..2], &[oldest.x, oldest.y]);
    }

    #[test]
    fn test_colours_follow_particles() {
        let params = SimulationParams::default();
        let particles = vec![
            circular_orbit(50.0, 0.0, 1.0, &params),
            circular_orbit(250.0, 0.0, 1.0, &params),
        ];

        let mut buffers = FrameBuffers::default();
        buffers.rebuild(&particles, &params);

        assert_eq!(buffers.colours.len(), 6);
        // inside the accretion disk
        assert_eq!(buffers.colour(0).unwrap()[2], 1.0);
        // initial temperature 1.0 is in the cool band
        let cool = buffers.colour(1).unwrap();
        assert_eq!(cool[0], 1.0);
        assert!((cool[1] - 0.7).abs() < 1e-6);
        assert_eq!(cool[2], 0.2);
        assert!(buffers.colour(2).is_none());
    }

    #[test]
    fn test_rebuild_replaces_previous_frame() {
        let params = SimulationParams::builder().with_temperature(false).build().unwrap();
        let particles = vec![circular_orbit(100.0, 0.0, 1.0, &params); 3];

        let mut buffers = FrameBuffers::default();
        buffers.rebuild(&particles, &params);
        buffers.rebuild(&particles[..1], &params);

        assert_eq!(buffers.particle_count(), 1);
        assert!(buffers.colours.is_empty());
    }
}
