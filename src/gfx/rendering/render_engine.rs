//! WGPU-based rendering engine
//!
//! [`RenderEngine`] owns the surface, device, pipelines and vertex buffers and
//! implements [`RenderBackend`]. Draw calls are recorded together with a
//! snapshot of the uniform state at the time of the call; [`present`] writes
//! every snapshot into one dynamic-offset uniform buffer and replays the draws
//! in submission order inside a single render pass.
//!
//! [`present`]: RenderEngine::present

use std::sync::Arc;

use crate::error::InitializationError;
use crate::gfx::backend::{BufferHandle, RenderBackend, UniformScalar};
use crate::wgpu_utils::DynamicUniformBuffer;

use super::pipeline_manager::{PipelineConfig, PipelineManager};
use super::vertex::VertexLayout;

const POINTS_PIPELINE: &str = "points";
const TRAIL_PIPELINE: &str = "trail";

/// Uniform block shared by the point and trail shaders
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DrawUniforms {
    /// RGB plus opacity
    pub colour: [f32; 4],
    pub screen_size: [f32; 2],
    pub point_size: f32,
    pub glow: f32,
}

impl Default for DrawUniforms {
    fn default() -> Self {
        Self {
            colour: [1.0, 1.0, 1.0, 1.0],
            screen_size: [800.0, 600.0],
            point_size: 1.0,
            glow: 0.0,
        }
    }
}

impl DrawUniforms {
    pub fn set_scalar(&mut self, uniform: UniformScalar, value: f32) {
        match uniform {
            UniformScalar::ScreenWidth => self.screen_size[0] = value,
            UniformScalar::ScreenHeight => self.screen_size[1] = value,
            UniformScalar::PointSize => self.point_size = value,
            UniformScalar::Glow => self.glow = value,
            UniformScalar::Opacity => self.colour[3] = value,
        }
    }
}

struct VertexBuffer {
    label: String,
    layout: VertexLayout,
    buffer: wgpu::Buffer,
}

impl VertexBuffer {
    fn vertex_capacity(&self) -> u64 {
        self.buffer.size() / self.layout.stride()
    }
}

#[derive(Clone, Copy, Debug)]
struct RecordedDraw {
    buffer: BufferHandle,
    start: u32,
    count: u32,
    uniforms: DrawUniforms,
}

/// Core rendering engine managing GPU resources and draw calls
pub struct RenderEngine {
    surface: wgpu::Surface<'static>,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    config: wgpu::SurfaceConfiguration,
    background: wgpu::Color,
    pipeline_manager: PipelineManager,
    uniforms: DynamicUniformBuffer<DrawUniforms>,
    vertex_buffers: Vec<VertexBuffer>,
    current: DrawUniforms,
    draws: Vec<RecordedDraw>,
}

impl RenderEngine {
    /// Creates a new render engine for the given window
    ///
    /// Requests an adapter and device, configures the surface and builds the
    /// point and trail pipelines. Shader compile or pipeline validation
    /// failures are returned as [`InitializationError::Shader`].
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
        background: [f64; 3],
    ) -> Result<RenderEngine, InitializationError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;
        let info = adapter.get_info();
        log::info!("Using adapter '{}' ({:?})", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("WGPU Device"),
                required_features: wgpu::Features::default(),
                required_limits: wgpu::Limits::downlevel_defaults(),
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            })
            .await?;
        let device = Arc::new(device);
        let queue = Arc::new(queue);

        let surface_capabilities = surface.get_capabilities(&adapter);
        let format = surface_capabilities
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .or_else(|| surface_capabilities.formats.first().copied())
            .ok_or(InitializationError::NoSurfaceFormat)?;
        log::info!("Surface format {:?}", format);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_capabilities
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let uniforms = DynamicUniformBuffer::new(&device, 256);

        let mut pipeline_manager = PipelineManager::new(device.clone());
        pipeline_manager.load_shader(POINTS_PIPELINE, include_str!("points.wgsl"))?;
        pipeline_manager.load_shader(TRAIL_PIPELINE, include_str!("trail.wgsl"))?;
        pipeline_manager.register_pipeline(
            POINTS_PIPELINE,
            PipelineConfig::default_with_shader(POINTS_PIPELINE)
                .with_label("Points Pipeline")
                .with_vertex_layout(VertexLayout::Point)
                .with_bind_group_layouts(vec![uniforms.layout().clone()])
                .with_color_format(format),
        );
        pipeline_manager.register_pipeline(
            TRAIL_PIPELINE,
            PipelineConfig::default_with_shader(TRAIL_PIPELINE)
                .with_label("Trail Pipeline")
                .with_vertex_layout(VertexLayout::Trail)
                .with_bind_group_layouts(vec![uniforms.layout().clone()])
                .with_color_format(format),
        );
        pipeline_manager.create_all_pipelines()?;

        let [r, g, b] = background;
        Ok(Self {
            surface,
            device,
            queue,
            config,
            background: wgpu::Color { r, g, b, a: 1.0 },
            pipeline_manager,
            uniforms,
            vertex_buffers: Vec::new(),
            current: DrawUniforms::default(),
            draws: Vec::new(),
        })
    }

    /// Replays this frame's recorded draws and presents the surface
    ///
    /// A lost or outdated surface is reconfigured and the frame skipped.
    /// Other surface errors are returned; the recorded draws are discarded
    /// either way.
    pub fn present(&mut self) -> Result<(), wgpu::SurfaceError> {
        let draws = std::mem::take(&mut self.draws);

        let surface_texture = match self.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(error @ (wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated)) => {
                log::warn!("Surface {error}, reconfiguring and skipping frame");
                self.surface.configure(&self.device, &self.config);
                self.draws = recycle(draws);
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("Timed out acquiring surface texture, skipping frame");
                self.draws = recycle(draws);
                return Ok(());
            }
            Err(error) => return Err(error),
        };

        let snapshots: Vec<DrawUniforms> = draws.iter().map(|d| d.uniforms).collect();
        let written = self.uniforms.write_all(&self.device, &self.queue, &snapshots);

        let surface_texture_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Main Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &surface_texture_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.background),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            let mut bound_layout = None;
            for (slot, draw) in draws.iter().enumerate().take(written) {
                let Some(vertex_buffer) = self.vertex_buffers.get(draw.buffer.index()) else {
                    continue;
                };

                if bound_layout != Some(vertex_buffer.layout) {
                    let name = match vertex_buffer.layout {
                        VertexLayout::Point => POINTS_PIPELINE,
                        VertexLayout::Trail => TRAIL_PIPELINE,
                    };
                    let Some(pipeline) = self.pipeline_manager.get_pipeline(name) else {
                        continue;
                    };
                    render_pass.set_pipeline(pipeline);
                    bound_layout = Some(vertex_buffer.layout);
                }

                render_pass.set_bind_group(0, self.uniforms.bind_group(), &[self.uniforms.offset(slot)]);
                render_pass.set_vertex_buffer(0, vertex_buffer.buffer.slice(..));
                render_pass.draw(0..4, draw.start..draw.start + draw.count);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        surface_texture.present();
        self.draws = recycle(draws);
        Ok(())
    }

    /// Resizes the rendering surface
    ///
    /// Zero-sized requests (minimised windows) are ignored. The world-to-clip
    /// mapping is driven by the screen size uniforms, so the scene stretches
    /// with the window.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }

        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        log::debug!("Surface resized to {width}x{height}");
    }

    /// Releases GPU resources: buffers, then pipelines and shaders, then the
    /// surface, device and queue
    pub fn destroy(mut self) {
        self.draws.clear();
        let buffers = self.vertex_buffers.len();
        for vertex_buffer in self.vertex_buffers.drain(..) {
            vertex_buffer.buffer.destroy();
        }
        self.uniforms.destroy();
        log::info!("Released {} vertex buffers and the uniform buffer", buffers);

        self.pipeline_manager.destroy();
        log::info!("Released pipelines and shader modules");

        let Self {
            surface,
            device,
            queue,
            ..
        } = self;
        drop(surface);
        drop(queue);
        drop(device);
        log::info!("Released surface, queue and device");
    }
}

/// Clamps `size` to `max_size`, rounded down to whole vertices of `stride`
fn fit_buffer_size(size: u64, max_size: u64, stride: u64) -> u64 {
    if size <= max_size {
        size
    } else {
        max_size / stride * stride
    }
}

fn recycle(mut draws: Vec<RecordedDraw>) -> Vec<RecordedDraw> {
    draws.clear();
    draws
}

impl RenderBackend for RenderEngine {
    fn create_vertex_buffer(
        &mut self,
        label: &str,
        layout: VertexLayout,
        capacity_bytes: u64,
    ) -> BufferHandle {
        let size = fit_buffer_size(
            capacity_bytes.max(layout.stride()),
            self.device.limits().max_buffer_size,
            layout.stride(),
        );
        if size < capacity_bytes {
            log::error!(
                "Vertex buffer '{label}' needs {capacity_bytes} bytes, above the device limit; \
                 clamped to {size}"
            );
        }
        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        log::info!("Created vertex buffer '{label}' ({size} bytes, {layout:?})");

        self.vertex_buffers.push(VertexBuffer {
            label: label.to_string(),
            layout,
            buffer,
        });
        BufferHandle(self.vertex_buffers.len() - 1)
    }

    fn upload_buffer_data(&mut self, buffer: BufferHandle, offset: u64, data: &[f32]) {
        let Some(vertex_buffer) = self.vertex_buffers.get_mut(buffer.index()) else {
            log::error!("Upload to unknown vertex buffer {}", buffer.index());
            return;
        };
        if data.is_empty() {
            return;
        }

        let bytes: &[u8] = bytemuck::cast_slice(data);
        let end = offset + bytes.len() as u64;
        if end > vertex_buffer.buffer.size() {
            if offset != 0 {
                log::error!(
                    "Write of {} bytes at offset {} overflows '{}' ({} bytes)",
                    bytes.len(),
                    offset,
                    vertex_buffer.label,
                    vertex_buffer.buffer.size()
                );
                return;
            }

            let max_size = self.device.limits().max_buffer_size;
            if end > max_size {
                log::error!(
                    "Write of {} bytes to '{}' exceeds the device buffer limit of {} bytes",
                    bytes.len(),
                    vertex_buffer.label,
                    max_size
                );
                return;
            }

            let size = end.next_power_of_two().min(max_size);
            log::debug!(
                "Growing vertex buffer '{}' from {} to {} bytes",
                vertex_buffer.label,
                vertex_buffer.buffer.size(),
                size
            );
            vertex_buffer.buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(&vertex_buffer.label),
                size,
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
        }

        self.queue.write_buffer(&vertex_buffer.buffer, offset, bytes);
    }

    fn set_uniform_colour(&mut self, r: f32, g: f32, b: f32) {
        self.current.colour[0] = r;
        self.current.colour[1] = g;
        self.current.colour[2] = b;
    }

    fn set_uniform_scalar(&mut self, uniform: UniformScalar, value: f32) {
        self.current.set_scalar(uniform, value);
    }

    fn draw_points(&mut self, buffer: BufferHandle, start: u32, count: u32) {
        let Some(vertex_buffer) = self.vertex_buffers.get(buffer.index()) else {
            log::error!("Draw from unknown vertex buffer {}", buffer.index());
            return;
        };
        if count == 0 {
            return;
        }
        if u64::from(start) + u64::from(count) > vertex_buffer.vertex_capacity() {
            log::warn!(
                "Draw of {count} points from {start} exceeds '{}', skipped",
                vertex_buffer.label
            );
            return;
        }

        self.draws.push(RecordedDraw {
            buffer,
            start,
            count,
            uniforms: self.current,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_block_layout() {
        assert_eq!(std::mem::size_of::<DrawUniforms>(), 32);
    }

    #[test]
    fn test_fit_buffer_size() {
        let limit = wgpu::Limits::downlevel_defaults().max_buffer_size;
        assert_eq!(fit_buffer_size(1200, limit, 12), 1200);
        assert_eq!(fit_buffer_size(limit, limit, 12), limit);

        // 500 000 particles with 50-point trails
        let trail_bytes = 500_000 * 50 * 12;
        let size = fit_buffer_size(trail_bytes, limit, 12);
        assert!(size <= limit);
        assert_eq!(size % 12, 0);
        assert!(limit - size < 12);
    }

    #[test]
    fn test_scalars_map_to_fields() {
        let mut uniforms = DrawUniforms::default();
        uniforms.set_scalar(UniformScalar::ScreenWidth, 1024.0);
        uniforms.set_scalar(UniformScalar::ScreenHeight, 768.0);
        uniforms.set_scalar(UniformScalar::PointSize, 10.0);
        uniforms.set_scalar(UniformScalar::Glow, 1.0);
        uniforms.set_scalar(UniformScalar::Opacity, 0.3);

        assert_eq!(
            uniforms,
            DrawUniforms {
                colour: [1.0, 1.0, 1.0, 0.3],
                screen_size: [1024.0, 768.0],
                point_size: 10.0,
                glow: 1.0,
            }
        );
    }
}
