use std::borrow::Cow;

use anyhow::anyhow;
use wgpu::naga::front::glsl::{Frontend, Options};
use wgpu::naga::valid::{Capabilities, ValidationFlags, Validator};
use wgpu::naga::{AddressSpace, Module, ResourceBinding, ShaderStage, TypeInner};

use crate::error::{RenderError, SetupContext, SetupStage};
use crate::pattern::{FRAGMENT_BODY, ZOOM_STEPS};

/// Name of the scalar time uniform.
pub const TIME_UNIFORM: &str = "iTime";
/// Name of the `vec3` resolution uniform.
pub const RESOLUTION_UNIFORM: &str = "iResolution";

const UNIFORM_BINDING: ResourceBinding = ResourceBinding {
    group: 0,
    binding: 0,
};

/// Byte offsets of the two uniforms inside the uniform block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformLocations {
    pub time: u32,
    pub resolution: u32,
}

/// Fragment source that passed naga's parser and validator.
#[derive(Debug, Clone)]
pub struct PreparedShader {
    pub source: String,
    pub uniforms: UniformLocations,
    /// Human-readable compile report, logged in diagnostics mode.
    pub info_log: String,
}

/// Wraps the pattern body into a complete fragment shader and checks it.
///
/// Parsing and validation run on the CPU through naga so compile errors
/// surface as a setup failure with the full diagnostic text, before any GPU
/// object exists.
pub fn prepare_fragment_shader() -> Result<PreparedShader, RenderError> {
    prepare(FRAGMENT_BODY)
}

pub(crate) fn prepare(body: &str) -> Result<PreparedShader, RenderError> {
    let source = wrap_fragment(body);
    let module = Frontend::default()
        .parse(&Options::from(ShaderStage::Fragment), &source)
        .map_err(|errors| anyhow!(errors.emit_to_string(&source)))
        .during(SetupStage::ShaderCompile)?;

    Validator::new(ValidationFlags::all(), Capabilities::all())
        .validate(&module)
        .map_err(|error| anyhow!(error.emit_to_string(&source)))
        .during(SetupStage::ShaderCompile)?;

    let uniforms = locate_uniforms(&module).during(SetupStage::UniformLookup)?;

    let info_log = compile_report(&module, uniforms, &source);

    Ok(PreparedShader {
        source,
        uniforms,
        info_log,
    })
}

fn compile_report(module: &Module, uniforms: UniformLocations, source: &str) -> String {
    let mut lines: Vec<String> = module
        .entry_points
        .iter()
        .map(|entry| format!("entry point `{}` ({:?})", entry.name, entry.stage))
        .collect();
    lines.push(format!(
        "uniforms: {RESOLUTION_UNIFORM}@{} {TIME_UNIFORM}@{}",
        uniforms.resolution, uniforms.time
    ));
    lines.push(format!("{} source lines", source.lines().count()));
    lines.join("\n")
}

/// Finds the byte offsets of `iTime` and `iResolution` in the bound uniform block.
fn locate_uniforms(module: &Module) -> anyhow::Result<UniformLocations> {
    let (_, block) = module
        .global_variables
        .iter()
        .find(|(_, var)| {
            matches!(var.space, AddressSpace::Uniform) && var.binding == Some(UNIFORM_BINDING)
        })
        .ok_or_else(|| anyhow!("no uniform block bound at set 0, binding 0"))?;

    let TypeInner::Struct { members, .. } = &module.types[block.ty].inner else {
        anyhow::bail!("uniform binding 0 is not a block");
    };

    let offset_of = |name: &str| {
        members
            .iter()
            .find(|member| member.name.as_deref() == Some(name))
            .map(|member| member.offset)
            .ok_or_else(|| anyhow!("uniform `{name}` not found"))
    };

    Ok(UniformLocations {
        time: offset_of(TIME_UNIFORM)?,
        resolution: offset_of(RESOLUTION_UNIFORM)?,
    })
}

pub(crate) fn fragment_module_descriptor(
    shader: &PreparedShader,
) -> wgpu::ShaderModuleDescriptor<'_> {
    wgpu::ShaderModuleDescriptor {
        label: Some("neonzoom fragment"),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Borrowed(shader.source.as_str()),
            stage: ShaderStage::Fragment,
            defines: &[],
        },
    }
}

pub(crate) fn vertex_module_descriptor() -> wgpu::ShaderModuleDescriptor<'static> {
    wgpu::ShaderModuleDescriptor {
        label: Some("fullscreen triangle vertex"),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Borrowed(VERTEX_SHADER_GLSL),
            stage: ShaderStage::Vertex,
            defines: &[],
        },
    }
}

/// Produces a self-contained GLSL 450 fragment shader from a `mainImage` body.
fn wrap_fragment(body: &str) -> String {
    format!("{HEADER}#define ZOOM_STEPS {ZOOM_STEPS}\n\n{body}\n{FOOTER}")
}

/// Uniform block layout must match `FrameUniforms` in `gpu/uniforms.rs`.
const HEADER: &str = r"#version 450
layout(location = 0) out vec4 outColor;

layout(std140, set = 0, binding = 0) uniform FrameParams {
    vec3 iResolution;
    float iTime;
};

";

/// Flips `gl_FragCoord` to a bottom-left origin and calls `mainImage`.
const FOOTER: &str = r"void main() {
    vec2 fragCoord = vec2(gl_FragCoord.x, iResolution.y - gl_FragCoord.y);
    vec4 color = vec4(0.0);
    mainImage(color, fragCoord);
    outColor = color;
}
";

/// Single triangle that covers clip space; no vertex buffers.
const VERTEX_SHADER_GLSL: &str = r"#version 450

const vec2 positions[3] = vec2[3](
    vec2(-1.0, -3.0),
    vec2(3.0, 1.0),
    vec2(-1.0, 1.0)
);

void main() {
    uint vertex_index = uint(gl_VertexIndex);
    gl_Position = vec4(positions[vertex_index], 0.0, 1.0);
}
";
