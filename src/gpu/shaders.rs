/// WGSL shader for the page meshes
///
/// Every page (static pages, cover, turning sheet) is a textured grid of
/// `PageVertex`es. The vertex stage projects it with a single view matrix,
/// the fragment stage samples the page texture and applies a soft
/// directional light so the curl of a turning sheet reads as depth.

pub const PAGE_SHADER: &str = r#"
struct Camera {
    view_proj: mat4x4<f32>,
    // xyz = direction towards the light, w = ambient term
    light: vec4<f32>,
}

@group(0) @binding(0) var page_texture: texture_2d<f32>;
@group(0) @binding(1) var page_sampler: sampler;
@group(1) @binding(0) var<uniform> camera: Camera;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
}

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) normal: vec3<f32>,
    @location(1) uv: vec2<f32>,
}

@vertex
fn vs_main(input: VertexInput) -> VertexOutput {
    var output: VertexOutput;
    output.clip_position = camera.view_proj * vec4<f32>(input.position, 1.0);
    output.normal = input.normal;
    output.uv = input.uv;
    return output;
}

@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    let color = textureSample(page_texture, page_sampler, input.uv);

    let ambient = camera.light.w;
    let diffuse = max(dot(normalize(input.normal), normalize(camera.light.xyz)), 0.0);
    let shade = ambient + (1.0 - ambient) * diffuse;

    return vec4<f32>(color.rgb * shade, color.a);
}
"#;

/// Shader source for the page pipeline
pub fn get_shader() -> &'static str {
    PAGE_SHADER
}
