//! Per-frame simulation driver
//!
//! [`FrameDriver`] owns the particle set. Every frame the application calls
//! [`tick`](FrameDriver::tick) to integrate all particles and rebuild the
//! upload buffers, then [`submit`](FrameDriver::submit) to hand them to a
//! [`RenderBackend`]. Draws are submitted trails first, then particles, then
//! the attractor marker, so the marker is always on top.

use rand::Rng;

use crate::config::RenderSettings;
use crate::gfx::backend::{BufferHandle, RenderBackend, UniformScalar};
use crate::gfx::frame::FrameBuffers;
use crate::gfx::rendering::vertex::VertexLayout;

use super::integrator::step_all;
use super::params::SimulationParams;
use super::particle::Particle;
use super::seeding::seed_particles;

/// Vertex buffers a driver draws into
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameHandles {
    pub points: BufferHandle,
    /// `None` when trails are disabled
    pub trail: Option<BufferHandle>,
}

pub struct FrameDriver {
    params: SimulationParams,
    particles: Vec<Particle>,
    buffers: FrameBuffers,
    steps: u64,
}

impl FrameDriver {
    /// Seeds a new particle set from the thread-local generator
    pub fn new(params: SimulationParams) -> Self {
        Self::with_rng(params, &mut rand::rng())
    }

    pub fn with_rng<R: Rng + ?Sized>(params: SimulationParams, rng: &mut R) -> Self {
        let particles = seed_particles(&params, rng);
        Self::from_particles(params, particles)
    }

    /// Wraps an existing particle set, serialising it once so that a frame
    /// can be drawn before the first tick
    pub fn from_particles(params: SimulationParams, particles: Vec<Particle>) -> Self {
        let mut buffers = FrameBuffers::with_capacity(&params);
        buffers.rebuild(&particles, &params);

        Self {
            params,
            particles,
            buffers,
            steps: 0,
        }
    }

    /// Replaces every particle with freshly seeded ones
    pub fn reseed<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.particles = seed_particles(&self.params, rng);
        self.buffers.rebuild(&self.particles, &self.params);
        log::info!("Reseeded {} particles", self.particles.len());
    }

    /// Advances every particle one step and rebuilds the upload buffers
    pub fn tick(&mut self) {
        step_all(&mut self.particles, &self.params);
        self.buffers.rebuild(&self.particles, &self.params);
        self.steps += 1;
    }

    /// Creates the vertex buffers this driver needs and sets the world size
    /// uniforms
    pub fn prepare<B: RenderBackend + ?Sized>(
        &self,
        backend: &mut B,
        render: &RenderSettings,
    ) -> FrameHandles {
        backend.set_uniform_scalar(UniformScalar::ScreenWidth, render.width as f32);
        backend.set_uniform_scalar(UniformScalar::ScreenHeight, render.height as f32);

        let point_bytes = (self.params.particle_count + 1) as u64 * VertexLayout::Point.stride();
        let points = backend.create_vertex_buffer("Particle Points", VertexLayout::Point, point_bytes);

        let trail = self.params.trails_enabled().then(|| {
            let trail_bytes = (self.params.particle_count * self.params.trail_length) as u64
                * VertexLayout::Trail.stride();
            backend.create_vertex_buffer("Particle Trails", VertexLayout::Trail, trail_bytes)
        });

        FrameHandles { points, trail }
    }

    /// Uploads the current frame and issues its draws, returning the number
    /// of draw calls
    pub fn submit<B: RenderBackend + ?Sized>(
        &self,
        backend: &mut B,
        handles: &FrameHandles,
        render: &RenderSettings,
    ) -> usize {
        let mut draws = 0;
        let buffers = &self.buffers;

        if let Some(trail) = handles.trail {
            let count = buffers.trail_point_count();
            if count > 0 {
                backend.upload_buffer_data(trail, 0, &buffers.trail);
                let [r, g, b] = render.trail_colour;
                backend.set_uniform_colour(r, g, b);
                backend.set_uniform_scalar(UniformScalar::PointSize, render.trail_point_size);
                backend.set_uniform_scalar(UniformScalar::Glow, 0.0);
                backend.set_uniform_scalar(UniformScalar::Opacity, render.trail_opacity);
                backend.draw_points(trail, 0, count as u32);
                draws += 1;
            }
        }

        backend.upload_buffer_data(handles.points, 0, &buffers.positions);
        backend.set_uniform_scalar(UniformScalar::PointSize, render.particle_point_size);
        backend.set_uniform_scalar(UniformScalar::Glow, render.glow);
        backend.set_uniform_scalar(UniformScalar::Opacity, 1.0);

        let count = buffers.particle_count();
        if self.params.temperature_enabled {
            for i in 0..count {
                let [r, g, b] = buffers.colour(i).unwrap_or(render.particle_colour);
                backend.set_uniform_colour(r, g, b);
                backend.draw_points(handles.points, i as u32, 1);
                draws += 1;
            }
        } else if count > 0 {
            let [r, g, b] = render.particle_colour;
            backend.set_uniform_colour(r, g, b);
            backend.draw_points(handles.points, 0, count as u32);
            draws += 1;
        }

        let [r, g, b] = render.marker_colour;
        backend.set_uniform_colour(r, g, b);
        backend.set_uniform_scalar(UniformScalar::PointSize, render.marker_point_size);
        backend.draw_points(handles.points, buffers.marker_index() as u32, 1);
        draws + 1
    }

    pub fn params(&self) -> &SimulationParams {
        &self.params
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn buffers(&self) -> &FrameBuffers {
        &self.buffers
    }

    /// Total integration steps since creation
    pub fn steps(&self) -> u64 {
        self.steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::simulation::seeding::circular_orbit;
    use rand::{rngs::StdRng, SeedableRng};

    #[derive(Clone, Debug, PartialEq)]
    enum Call {
        Create(VertexLayout, u64),
        Upload(usize, u64, usize),
        Colour([f32; 3]),
        Scalar(UniformScalar, f32),
        Draw(usize, u32, u32),
    }

    #[derive(Default)]
    struct RecordingBackend {
        calls: Vec<Call>,
        buffers: usize,
    }

    impl RecordingBackend {
        fn draws(&self) -> Vec<(usize, u32, u32)> {
            self.calls
                .iter()
                .filter_map(|c| match c {
                    Call::Draw(b, s, n) => Some((*b, *s, *n)),
                    _ => None,
                })
                .collect()
        }

        /// Colour in effect at each draw
        fn draw_colours(&self) -> Vec<[f32; 3]> {
            let mut current = [0.0; 3];
            let mut colours = Vec::new();
            for call in &self.calls {
                match call {
                    Call::Colour(c) => current = *c,
                    Call::Draw(..) => colours.push(current),
                    _ => {}
                }
            }
            colours
        }
    }

    impl RenderBackend for RecordingBackend {
        fn create_vertex_buffer(&mut self, _label: &str, layout: VertexLayout, capacity_bytes: u64) -> BufferHandle {
            self.calls.push(Call::Create(layout, capacity_bytes));
            self.buffers += 1;
            BufferHandle(self.buffers - 1)
        }

        fn upload_buffer_data(&mut self, buffer: BufferHandle, offset: u64, data: &[f32]) {
            self.calls.push(Call::Upload(buffer.index(), offset, data.len()));
        }

        fn set_uniform_colour(&mut self, r: f32, g: f32, b: f32) {
            self.calls.push(Call::Colour([r, g, b]));
        }

        fn set_uniform_scalar(&mut self, uniform: UniformScalar, value: f32) {
            self.calls.push(Call::Scalar(uniform, value));
        }

        fn draw_points(&mut self, buffer: BufferHandle, start: u32, count: u32) {
            self.calls.push(Call::Draw(buffer.index(), start, count));
        }
    }

    fn seeded(config: &Config) -> FrameDriver {
        let mut rng = StdRng::seed_from_u64(42);
        FrameDriver::with_rng(config.params.clone(), &mut rng)
    }

    #[test]
    fn test_prepare_sizes_buffers() {
        let config = Config::default();
        let driver = seeded(&config);
        let mut backend = RecordingBackend::default();

        let handles = driver.prepare(&mut backend, &config.render);

        assert_eq!(handles.points.index(), 0);
        assert_eq!(handles.trail.map(|h| h.index()), Some(1));
        assert!(backend.calls.contains(&Call::Scalar(UniformScalar::ScreenWidth, 800.0)));
        assert!(backend.calls.contains(&Call::Scalar(UniformScalar::ScreenHeight, 600.0)));
        assert!(backend.calls.contains(&Call::Create(VertexLayout::Point, 101 * 8)));
        assert!(backend.calls.contains(&Call::Create(VertexLayout::Trail, 100 * 50 * 12)));
    }

    #[test]
    fn test_classic_submits_one_batch_and_marker() {
        let config = Config::preset(crate::config::Preset::Classic);
        let mut driver = seeded(&config);
        let mut backend = RecordingBackend::default();
        let handles = driver.prepare(&mut backend, &config.render);
        assert!(handles.trail.is_none());

        driver.tick();
        backend.calls.clear();
        let draws = driver.submit(&mut backend, &handles, &config.render);

        assert_eq!(draws, 2);
        assert_eq!(backend.draws(), vec![(0, 0, 200), (0, 200, 1)]);
        assert_eq!(backend.draw_colours(), vec![[1.0, 1.0, 1.0], [1.0, 0.0, 0.0]]);
        assert_eq!(backend.calls[0], Call::Upload(0, 0, 402));
    }

    #[test]
    fn test_disk_draws_trails_then_particles_then_marker() {
        let config = Config::default();
        let mut driver = seeded(&config);
        let mut backend = RecordingBackend::default();
        let handles = driver.prepare(&mut backend, &config.render);

        for _ in 0..3 {
            driver.tick();
        }
        backend.calls.clear();
        let draws = driver.submit(&mut backend, &handles, &config.render);

        let recorded = backend.draws();
        assert_eq!(draws, recorded.len());
        assert_eq!(recorded.len(), 1 + 100 + 1);
        assert_eq!(recorded[0], (1, 0, 300));
        assert!(recorded[1..=100]
            .iter()
            .enumerate()
            .all(|(i, &d)| d == (0, i as u32, 1)));
        assert_eq!(recorded[101], (0, 100, 1));

        let colours = backend.draw_colours();
        assert_eq!(colours[0], config.render.trail_colour);
        assert_eq!(colours[1], driver.buffers().colour(0).unwrap());
        assert_eq!(colours[101], config.render.marker_colour);
    }

    #[test]
    fn test_empty_trails_are_not_drawn() {
        let config = Config::default();
        let driver = seeded(&config);
        let mut backend = RecordingBackend::default();
        let handles = driver.prepare(&mut backend, &config.render);

        backend.calls.clear();
        driver.submit(&mut backend, &handles, &config.render);

        assert!(backend.draws().iter().all(|&(buffer, _, _)| buffer == 0));
        assert!(!backend.calls.contains(&Call::Scalar(UniformScalar::Opacity, 0.3)));
    }

    #[test]
    fn test_tick_advances_every_particle() {
        let params = SimulationParams::builder().with_count(2).build().unwrap();
        let particles = vec![
            circular_orbit(100.0, 0.0, 1.0, &params),
            circular_orbit(150.0, 2.0, 1.0, &params),
        ];
        let mut driver = FrameDriver::from_particles(params, particles.clone());

        driver.tick();

        assert_eq!(driver.steps(), 1);
        for (before, after) in particles.iter().zip(driver.particles()) {
            assert_ne!(before.position, after.position);
            assert_eq!(after.trail().len(), 1);
        }
        assert_eq!(driver.buffers().positions[0], driver.particles()[0].position.x);
    }

    #[test]
    fn test_reseed_is_reproducible() {
        let config = Config::default();
        let mut a = seeded(&config);
        let b = seeded(&config);
        a.tick();

        a.reseed(&mut StdRng::seed_from_u64(42));

        let positions = |d: &FrameDriver| d.particles().iter().map(|p| p.position).collect::<Vec<_>>();
        assert_eq!(positions(&a), positions(&b));
        assert_eq!(a.buffers().positions, b.buffers().positions);
    }
}
