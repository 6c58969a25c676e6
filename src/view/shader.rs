use std::borrow::Cow;
use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info};
use wgpu::naga;
use wgpu::naga::{AddressSpace, Binding, Scalar, ScalarKind, ShaderStage, TypeInner, VectorSize};

use crate::utils::Vertex;
use crate::view::uniforms::{UniformKind, UniformLayout, UniformSlot};

/// Name of the vertex attribute carrying the quad corner position
pub const POSITION_ATTRIBUTE: &str = "position";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Vertex,
    Fragment,
}

impl Stage {
    fn naga_stage(self) -> ShaderStage {
        match self {
            Stage::Vertex => ShaderStage::Vertex,
            Stage::Fragment => ShaderStage::Fragment,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Vertex => f.write_str("vertex"),
            Stage::Fragment => f.write_str("fragment"),
        }
    }
}

/// Problems found while building a program. They are logged and kept on the
/// program, never returned as a hard failure.
#[derive(Debug, thiserror::Error)]
pub enum ShaderError {
    #[error("could not read shader file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{stage} shader {} failed to compile:\n{diagnostic}", path.display())]
    Compile {
        stage: Stage,
        path: PathBuf,
        diagnostic: String,
    },
    #[error("failed to link program:\n{diagnostic}")]
    Link { diagnostic: String },
}

/// A parsed and validated shader stage
#[derive(Debug)]
pub struct CompiledStage {
    pub stage: Stage,
    pub path: PathBuf,
    pub source: String,
    pub module: naga::Module,
}

fn report(diagnostics: &mut Vec<ShaderError>, err: ShaderError) {
    error!("{err}");
    diagnostics.push(err);
}

/// Read a shader source file. A missing or unreadable file is reported and
/// yields empty source, which then fails to compile.
pub fn read_source(path: &Path, diagnostics: &mut Vec<ShaderError>) -> String {
    match std::fs::read_to_string(path) {
        Ok(source) => source,
        Err(source) => {
            report(
                diagnostics,
                ShaderError::Read {
                    path: path.to_path_buf(),
                    source,
                },
            );
            String::new()
        }
    }
}

/// Parse GLSL for one stage and validate the resulting module.
pub fn compile_stage(stage: Stage, path: &Path, source: &str) -> Result<CompiledStage, ShaderError> {
    let compile_error = |diagnostic: String| ShaderError::Compile {
        stage,
        path: path.to_path_buf(),
        diagnostic,
    };

    let mut frontend = naga::front::glsl::Frontend::default();
    let options = naga::front::glsl::Options::from(stage.naga_stage());
    let module = frontend
        .parse(&options, source)
        .map_err(|errors| compile_error(errors.emit_to_string(source)))?;

    if module.entry_points.is_empty() {
        return Err(compile_error("no entry point `main` defined".to_string()));
    }

    let mut validator = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    );
    validator
        .validate(&module)
        .map_err(|err| compile_error(err.emit_to_string(source)))?;

    Ok(CompiledStage {
        stage,
        path: path.to_path_buf(),
        source: source.to_string(),
        module,
    })
}

fn uniform_kind(inner: &TypeInner) -> Option<UniformKind> {
    const F32: Scalar = Scalar {
        kind: ScalarKind::Float,
        width: 4,
    };
    const I32: Scalar = Scalar {
        kind: ScalarKind::Sint,
        width: 4,
    };
    match *inner {
        TypeInner::Scalar(s) if s == I32 => Some(UniformKind::Int),
        TypeInner::Scalar(s) if s == F32 => Some(UniformKind::Float),
        TypeInner::Vector {
            size: VectorSize::Tri,
            scalar,
        } if scalar == F32 => Some(UniformKind::Vec3),
        TypeInner::Vector {
            size: VectorSize::Quad,
            scalar,
        } if scalar == F32 => Some(UniformKind::Vec4),
        _ => None,
    }
}

/// Collect the members of every uniform block in `module`, with their std140
/// offsets. Members of other types (matrices, arrays) are not addressable.
pub fn reflect_uniforms(module: &naga::Module) -> UniformLayout {
    let mut layout = UniformLayout::new(0);
    for (_, var) in module.global_variables.iter() {
        if var.space != AddressSpace::Uniform {
            continue;
        }
        let TypeInner::Struct { ref members, span } = module.types[var.ty].inner else {
            continue;
        };
        let mut block = UniformLayout::new(span);
        for member in members {
            let Some(name) = member.name.as_deref() else {
                continue;
            };
            match uniform_kind(&module.types[member.ty].inner) {
                Some(kind) => block.insert(
                    name,
                    UniformSlot {
                        offset: member.offset,
                        kind,
                    },
                ),
                None => debug!(name, "skipping uniform member of unsupported type"),
            }
        }
        layout.merge(&block);
    }
    layout
}

/// Location of the named vertex input, if the entry point declares it
pub fn attribute_location(module: &naga::Module, name: &str) -> Option<u32> {
    module
        .entry_points
        .iter()
        .flat_map(|ep| ep.function.arguments.iter())
        .find(|arg| arg.name.as_deref() == Some(name))
        .and_then(|arg| match arg.binding {
            Some(Binding::Location { location, .. }) => Some(location),
            _ => None,
        })
}

/// Both stages of a program after the CPU-side compile step.
#[derive(Debug)]
pub struct ProgramStages {
    pub vertex: Option<CompiledStage>,
    pub fragment: Option<CompiledStage>,
    pub uniforms: UniformLayout,
    pub diagnostics: Vec<ShaderError>,
}

impl ProgramStages {
    /// Read and compile the two stages from disk.
    pub fn load(vertex_path: &Path, fragment_path: &Path) -> Self {
        let mut diagnostics = Vec::new();
        let vertex_src = read_source(vertex_path, &mut diagnostics);
        let fragment_src = read_source(fragment_path, &mut diagnostics);
        Self::compile(
            (vertex_path, vertex_src.as_str()),
            (fragment_path, fragment_src.as_str()),
            diagnostics,
        )
    }

    pub fn compile(
        vertex: (&Path, &str),
        fragment: (&Path, &str),
        mut diagnostics: Vec<ShaderError>,
    ) -> Self {
        let mut compile = |stage: Stage, (path, source): (&Path, &str)| {
            match compile_stage(stage, path, source) {
                Ok(compiled) => Some(compiled),
                Err(err) => {
                    report(&mut diagnostics, err);
                    None
                }
            }
        };
        let vertex = compile(Stage::Vertex, vertex);
        let fragment = compile(Stage::Fragment, fragment);

        let mut uniforms = UniformLayout::new(0);
        for compiled in fragment.iter().chain(vertex.iter()) {
            uniforms.merge(&reflect_uniforms(&compiled.module));
        }

        Self {
            vertex,
            fragment,
            uniforms,
            diagnostics,
        }
    }

    pub fn is_compiled(&self) -> bool {
        self.vertex.is_some() && self.fragment.is_some()
    }

    pub fn position_location(&self) -> u32 {
        self.vertex
            .as_ref()
            .and_then(|v| attribute_location(&v.module, POSITION_ATTRIBUTE))
            .unwrap_or(0)
    }
}

/// The GPU program: a render pipeline for the full-screen quad plus the
/// uniform layout reflected from its stages.
///
/// Building never fails. A program whose stages did not compile or link has
/// no pipeline and draws nothing.
pub struct ShaderProgram {
    pipeline: Option<wgpu::RenderPipeline>,
    bind_group_layout: wgpu::BindGroupLayout,
    uniforms: UniformLayout,
    diagnostics: Vec<ShaderError>,
}

impl ShaderProgram {
    pub fn build(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        vertex_path: &Path,
        fragment_path: &Path,
    ) -> Self {
        let stages = ProgramStages::load(vertex_path, fragment_path);
        Self::link(device, format, stages)
    }

    pub fn link(device: &wgpu::Device, format: wgpu::TextureFormat, stages: ProgramStages) -> Self {
        let bind_group_layout = create_uniform_bind_group_layout(device);
        let ProgramStages {
            vertex,
            fragment,
            uniforms,
            mut diagnostics,
        } = stages;

        let pipeline = match (&vertex, &fragment) {
            (Some(vs), Some(fs)) => {
                let location = attribute_location(&vs.module, POSITION_ATTRIBUTE).unwrap_or(0);
                match create_pipeline(device, format, &bind_group_layout, vs, fs, location) {
                    Ok(pipeline) => Some(pipeline),
                    Err(err) => {
                        report(&mut diagnostics, err);
                        None
                    }
                }
            }
            _ => None,
        };

        if pipeline.is_some() {
            info!(uniforms = uniforms.len(), "shader program linked");
        }

        Self {
            pipeline,
            bind_group_layout,
            uniforms,
            diagnostics,
        }
    }

    pub fn pipeline(&self) -> Option<&wgpu::RenderPipeline> {
        self.pipeline.as_ref()
    }

    pub fn is_linked(&self) -> bool {
        self.pipeline.is_some()
    }

    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout
    }

    pub fn uniform_layout(&self) -> &UniformLayout {
        &self.uniforms
    }

    pub fn diagnostics(&self) -> &[ShaderError] {
        &self.diagnostics
    }
}

fn create_uniform_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("raymarch_bind_group_layout"),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
    })
}

fn create_module(device: &wgpu::Device, compiled: &CompiledStage) -> wgpu::ShaderModule {
    let label = compiled.path.display().to_string();
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(&label),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Borrowed(compiled.source.as_str()),
            stage: compiled.stage.naga_stage(),
            defines: &[],
        },
    })
}

/// Link both stages into a pipeline, capturing validation errors instead of
/// letting them reach the device's uncaptured error handler.
fn create_pipeline(
    device: &wgpu::Device,
    format: wgpu::TextureFormat,
    bind_group_layout: &wgpu::BindGroupLayout,
    vertex: &CompiledStage,
    fragment: &CompiledStage,
    position_location: u32,
) -> Result<wgpu::RenderPipeline, ShaderError> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);

    let vertex_module = create_module(device, vertex);
    let fragment_module = create_module(device, fragment);

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("raymarch_pipeline_layout"),
        bind_group_layouts: &[bind_group_layout],
        push_constant_ranges: &[],
    });

    let attributes = [wgpu::VertexAttribute {
        offset: 0,
        shader_location: position_location,
        format: wgpu::VertexFormat::Float32x2,
    }];

    let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("raymarch_pipeline"),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: &vertex_module,
            entry_point: Some("main"),
            buffers: &[wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &attributes,
            }],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &fragment_module,
            entry_point: Some("main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleStrip,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview: None,
        cache: None,
    });

    match pollster::block_on(device.pop_error_scope()) {
        Some(err) => Err(ShaderError::Link {
            diagnostic: err.to_string(),
        }),
        None => Ok(pipeline),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shipped(name: &str) -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("shaders").join(name)
    }

    #[test]
    fn shipped_shaders_compile_and_reflect_the_uniform_contract() {
        let stages = ProgramStages::load(&shipped("raymarch.vert"), &shipped("test.frag"));
        assert!(stages.diagnostics.is_empty(), "{:?}", stages.diagnostics);
        assert!(stages.is_compiled());
        assert_eq!(stages.position_location(), 0);

        let layout = &stages.uniforms;
        let expect = [
            ("camUp", 0, UniformKind::Vec3),
            ("near", 12, UniformKind::Float),
            ("camRight", 16, UniformKind::Vec3),
            ("far", 28, UniformKind::Float),
            ("camFront", 32, UniformKind::Vec3),
            ("aspectRatio", 44, UniformKind::Float),
            ("eye", 48, UniformKind::Vec3),
            ("focalLength", 60, UniformKind::Float),
            ("width", 64, UniformKind::Int),
            ("height", 68, UniformKind::Int),
            ("maxSteps", 72, UniformKind::Int),
            ("epsilon", 76, UniformKind::Float),
        ];
        for (name, offset, kind) in expect {
            assert_eq!(layout.slot(name), Some(UniformSlot { offset, kind }), "{name}");
        }
        assert_eq!(layout.len(), expect.len());
        assert_eq!(layout.size(), 80);
    }

    #[test]
    fn syntax_errors_are_reported_with_diagnostics() {
        let path = Path::new("broken.frag");
        let err = compile_stage(Stage::Fragment, path, "#version 450\nvoid main() { oops }\n")
            .expect_err("broken source must not compile");
        match err {
            ShaderError::Compile { stage, diagnostic, .. } => {
                assert_eq!(stage, Stage::Fragment);
                assert!(!diagnostic.is_empty());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn missing_files_continue_with_empty_source() {
        let stages = ProgramStages::load(
            Path::new("does/not/exist.vert"),
            Path::new("does/not/exist.frag"),
        );
        assert!(!stages.is_compiled());
        assert!(stages.uniforms.is_empty());

        let reads = stages
            .diagnostics
            .iter()
            .filter(|d| matches!(d, ShaderError::Read { .. }))
            .count();
        let compiles = stages
            .diagnostics
            .iter()
            .filter(|d| matches!(d, ShaderError::Compile { .. }))
            .count();
        assert_eq!(reads, 2);
        assert_eq!(compiles, 2);
    }

    #[test]
    fn one_bad_stage_keeps_the_other() {
        let stages = ProgramStages::compile(
            (shipped("raymarch.vert").as_path(), include_str!("../../shaders/raymarch.vert")),
            (Path::new("empty.frag"), ""),
            Vec::new(),
        );
        assert!(stages.vertex.is_some());
        assert!(stages.fragment.is_none());
        assert_eq!(stages.diagnostics.len(), 1);
    }

    #[test]
    fn error_messages_name_the_file() {
        let mut diagnostics = Vec::new();
        let source = read_source(Path::new("nowhere/raymarch.vert"), &mut diagnostics);
        assert!(source.is_empty());
        let message = diagnostics[0].to_string();
        assert!(message.starts_with("could not read shader file nowhere/raymarch.vert"));
    }
}
