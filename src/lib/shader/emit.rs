//! GLSL text generation for a synthesized [Program].

use super::{synth::Program, types::OUTPUT_COLOR};

/// Vertex stage boilerplate: transforms and the mesh attributes every pipeline binds.
pub const VERTEX_PRELUDE: &str = r#"
#version 450
#extension GL_ARB_separate_shader_objects : enable

layout(push_constant) uniform PushConstants {
    mat4 projection;
    mat4 modelView;
} pc;

layout(set = 0, binding = 0) uniform WorldTransform{
    mat4 projectionInverse;
    mat4 viewInverse;
} wt;

layout(location = 0) in vec3 vsg_Vertex;
layout(location = 1) in vec3 vsg_Normal;

out gl_PerVertex{ vec4 gl_Position; };
"#;

/// Fragment stage boilerplate: transforms, material factors and light data.
pub const FRAGMENT_PRELUDE: &str = r#"
#version 450
#extension GL_ARB_separate_shader_objects : enable

layout(push_constant) uniform PushConstants {
    mat4 projection;
    mat4 modelView;
} pc;

layout(set = 0, binding = 0) uniform WorldTransform{
    mat4 projectionInverse;
    mat4 viewInverse;
} wt;

layout(set = 0, binding = 1) uniform PbrMaterial
{
    vec4 baseColorFactor;
    vec4 emissiveFactor;
    vec4 diffuseFactor;
    vec4 specularFactor;
    float metallicFactor;
    float roughnessFactor;
    float alphaMask;
    float alphaMaskCutoff;
} pbr;

// ViewDependentState
layout(constant_id = 3) const int lightDataSize = 256;
layout(set = 1, binding = 0) uniform LightData
{
    vec4 values[lightDataSize];
} lightData;

"#;

const INDENT: &str = "  ";

/// The `main` function: locals, defaults, then calls followed by varying assignments.
/// Empty sections are left out.
pub fn main_body(program: &Program) -> String {
    let locals: Vec<String> = program
        .locals
        .iter()
        .map(|local| format!("{local};"))
        .collect();
    let defaults: Vec<String> = program
        .defaults
        .iter()
        .map(|default| format!("{default};"))
        .collect();
    let statements: Vec<String> = program
        .calls
        .iter()
        .map(|call| call.statement.clone())
        .chain(program.epilogue.iter().cloned())
        .collect();

    let sections: Vec<String> = [locals, defaults, statements]
        .into_iter()
        .filter(|section| !section.is_empty())
        .map(|section| {
            section
                .iter()
                .map(|line| format!("{INDENT}{line}\n"))
                .collect::<String>()
        })
        .collect();

    format!("void main() {{\n{}}}\n", sections.join("\n"))
}

/// Vertex prelude followed by one output per varying.
pub fn vertex_header(program: &Program) -> String {
    let outputs: String = program
        .varyings
        .iter()
        .enumerate()
        .map(|(location, varying)| format!("layout(location = {location}) out {varying};\n"))
        .collect();

    format!("{VERTEX_PRELUDE}{outputs}")
}

/// Fragment prelude followed by one input per varying, at the vertex stage's locations,
/// and the color output.
pub fn fragment_header(program: &Program) -> String {
    let inputs: String = program
        .varyings
        .iter()
        .enumerate()
        .map(|(location, varying)| format!("layout(location = {location}) in {varying};\n"))
        .collect();

    format!("{FRAGMENT_PRELUDE}{inputs}layout(location = 0) out vec4 {OUTPUT_COLOR};\n")
}

/// Inlined function sources, in first-referenced order.
pub fn definitions(program: &Program) -> String {
    program
        .sources
        .iter()
        .map(|(_function, source)| format!("\n{source}\n"))
        .collect()
}

/// `header`, definitions and `main`.
pub fn stage_source(header: &str, program: &Program, main: &str) -> String {
    format!("{header}\n{}\n{main}", definitions(program))
}
