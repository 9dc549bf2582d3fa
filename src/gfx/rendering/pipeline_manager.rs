//! Render pipeline management for wgpu
//!
//! Shaders are compiled eagerly and checked for compilation errors; pipelines
//! are registered as [`PipelineConfig`]s and built together by
//! [`PipelineManager::create_all_pipelines`], which reports validation
//! failures as [`ShaderBuildError::Link`].

use std::{collections::HashMap, fmt::Write as _, sync::Arc};
use wgpu::*;

use super::vertex::VertexLayout;
use crate::error::ShaderBuildError;

/// Configuration for creating a render pipeline
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub label: String,
    pub shader: String,
    pub vertex_layout: VertexLayout,
    pub bind_group_layouts: Vec<BindGroupLayout>,
    pub primitive_topology: PrimitiveTopology,
    pub color_targets: Vec<Option<ColorTargetState>>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            label: "Default Pipeline".to_string(),
            shader: "points".to_string(),
            vertex_layout: VertexLayout::Point,
            bind_group_layouts: Vec::new(),
            primitive_topology: PrimitiveTopology::TriangleStrip,
            color_targets: vec![Some(ColorTargetState {
                format: TextureFormat::Bgra8Unorm,
                blend: Some(BlendState::ALPHA_BLENDING),
                write_mask: ColorWrites::ALL,
            })],
        }
    }
}

impl PipelineConfig {
    /// Creates a new config with a specific shader
    pub fn default_with_shader(shader: &str) -> Self {
        Self {
            shader: shader.to_string(),
            ..Default::default()
        }
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = label.to_owned();
        self
    }

    pub fn with_vertex_layout(mut self, layout: VertexLayout) -> Self {
        self.vertex_layout = layout;
        self
    }

    pub fn with_bind_group_layouts(mut self, layouts: Vec<BindGroupLayout>) -> Self {
        self.bind_group_layouts = layouts;
        self
    }

    /// Targets a single colour attachment of `format` with alpha blending
    pub fn with_color_format(mut self, format: TextureFormat) -> Self {
        self.color_targets = vec![Some(ColorTargetState {
            format,
            blend: Some(BlendState::ALPHA_BLENDING),
            write_mask: ColorWrites::ALL,
        })];
        self
    }
}

/// Owns shader modules and the pipelines built from them
pub struct PipelineManager {
    device: Arc<Device>,
    pipelines: HashMap<String, RenderPipeline>,
    pipeline_configs: HashMap<String, PipelineConfig>,
    shader_modules: HashMap<String, ShaderModule>,
    pending_pipelines: Vec<String>,
}

impl PipelineManager {
    pub fn new(device: Arc<Device>) -> Self {
        Self {
            device,
            pipelines: HashMap::new(),
            pipeline_configs: HashMap::new(),
            shader_modules: HashMap::new(),
            pending_pipelines: Vec::new(),
        }
    }

    /// Registers a pipeline configuration without creating it
    pub fn register_pipeline(&mut self, name: &str, config: PipelineConfig) {
        self.pipeline_configs.insert(name.to_string(), config);
        self.pending_pipelines.push(name.to_string());
    }

    /// Compiles a WGSL module
    ///
    /// Compiler diagnostics are logged; any error-level message fails the
    /// load with the full compiler log.
    pub fn load_shader(&mut self, name: &str, source: &str) -> Result<(), ShaderBuildError> {
        self.device.push_error_scope(ErrorFilter::Validation);
        let shader_module = self.device.create_shader_module(ShaderModuleDescriptor {
            label: Some(name),
            source: ShaderSource::Wgsl(source.into()),
        });
        let scope_error = pollster::block_on(self.device.pop_error_scope());
        let info = pollster::block_on(shader_module.get_compilation_info());

        let mut report = String::new();
        let mut failed = scope_error.is_some();
        for message in &info.messages {
            let location = message
                .location
                .as_ref()
                .map(|l| format!("{}:{}: ", l.line_number, l.line_position))
                .unwrap_or_default();
            match message.message_type {
                CompilationMessageType::Error => {
                    failed = true;
                    let _ = writeln!(report, "{location}error: {}", message.message);
                }
                CompilationMessageType::Warning => {
                    log::warn!("Shader '{name}': {location}{}", message.message);
                    let _ = writeln!(report, "{location}warning: {}", message.message);
                }
                CompilationMessageType::Info => {
                    log::debug!("Shader '{name}': {location}{}", message.message);
                }
            }
        }

        if failed {
            if let Some(error) = scope_error {
                let _ = writeln!(report, "{error}");
            }
            log::error!("Shader '{name}' failed to compile:\n{report}");
            return Err(ShaderBuildError::Compile {
                label: name.to_string(),
                log: report,
            });
        }

        log::info!("Loaded shader '{name}'");
        self.shader_modules.insert(name.to_string(), shader_module);
        Ok(())
    }

    /// Returns a created pipeline
    pub fn get_pipeline(&self, name: &str) -> Option<&RenderPipeline> {
        self.pipelines.get(name)
    }

    /// Creates all pending pipelines, stopping at the first failure
    pub fn create_all_pipelines(&mut self) -> Result<(), ShaderBuildError> {
        let pending = std::mem::take(&mut self.pending_pipelines);

        for name in pending {
            let Some(config) = self.pipeline_configs.get(&name) else {
                continue;
            };
            let pipeline = self.create_pipeline_from_config(&name, config)?;
            log::info!("Created pipeline '{name}'");
            self.pipelines.insert(name, pipeline);
        }

        Ok(())
    }

    /// Creates a render pipeline inside a validation error scope
    fn create_pipeline_from_config(
        &self,
        name: &str,
        config: &PipelineConfig,
    ) -> Result<RenderPipeline, ShaderBuildError> {
        let shader = self.shader_modules.get(&config.shader).ok_or_else(|| {
            ShaderBuildError::MissingShader {
                pipeline: name.to_string(),
                shader: config.shader.clone(),
            }
        })?;

        self.device.push_error_scope(ErrorFilter::Validation);

        let bind_group_layout_refs: Vec<&BindGroupLayout> =
            config.bind_group_layouts.iter().collect();
        let pipeline_layout = self
            .device
            .create_pipeline_layout(&PipelineLayoutDescriptor {
                label: Some(&format!("{} Layout", name)),
                bind_group_layouts: &bind_group_layout_refs,
                push_constant_ranges: &[],
            });

        let pipeline = self
            .device
            .create_render_pipeline(&RenderPipelineDescriptor {
                label: Some(&config.label),
                layout: Some(&pipeline_layout),
                vertex: VertexState {
                    module: shader,
                    entry_point: Some("vs_main"),
                    buffers: &[config.vertex_layout.desc()],
                    compilation_options: PipelineCompilationOptions::default(),
                },
                fragment: Some(FragmentState {
                    module: shader,
                    entry_point: Some("fs_main"),
                    targets: &config.color_targets,
                    compilation_options: PipelineCompilationOptions::default(),
                }),
                primitive: PrimitiveState {
                    topology: config.primitive_topology,
                    strip_index_format: None,
                    front_face: FrontFace::Ccw,
                    cull_mode: None,
                    polygon_mode: PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: None,
                multisample: MultisampleState::default(),
                multiview: None,
                cache: None,
            });

        if let Some(error) = pollster::block_on(self.device.pop_error_scope()) {
            let log = error.to_string();
            log::error!("Pipeline '{name}' failed validation:\n{log}");
            return Err(ShaderBuildError::Link {
                label: name.to_string(),
                log,
            });
        }

        Ok(pipeline)
    }

    /// Drops every pipeline, then every shader module
    pub fn destroy(&mut self) {
        let pipelines = self.pipelines.len();
        self.pipelines.clear();
        self.pipeline_configs.clear();
        self.pending_pipelines.clear();
        log::debug!("Released {pipelines} pipelines");

        let shaders = self.shader_modules.len();
        self.shader_modules.clear();
        log::debug!("Released {shaders} shader modules");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = PipelineConfig::default_with_shader("trail")
            .with_label("Trail Pipeline")
            .with_vertex_layout(VertexLayout::Trail)
            .with_color_format(TextureFormat::Rgba8UnormSrgb);

        assert_eq!(config.shader, "trail");
        assert_eq!(config.label, "Trail Pipeline");
        assert_eq!(config.vertex_layout, VertexLayout::Trail);
        assert_eq!(config.primitive_topology, PrimitiveTopology::TriangleStrip);

        let target = config.color_targets[0].as_ref().unwrap();
        assert_eq!(target.format, TextureFormat::Rgba8UnormSrgb);
        assert_eq!(target.blend, Some(BlendState::ALPHA_BLENDING));
    }
}
