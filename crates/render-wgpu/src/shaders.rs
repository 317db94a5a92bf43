/// WGSL source for the skinned avatar pipeline.
///
/// Group 0 is the per-draw uniform block, group 1 the skin texture and its
/// sampler. The bone index arrives as a float attribute.
pub const SKIN_SHADER: &str = r#"
struct Uniforms {
    model: mat4x4<f32>,
    view_proj: mat4x4<f32>,
    bones: array<mat4x4<f32>, 12>,
    alpha_test: f32,
};

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;

@group(1) @binding(0)
var skin_texture: texture_2d<f32>;
@group(1) @binding(1)
var skin_sampler: sampler;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) uv: vec2<f32>,
    @location(2) normal: vec3<f32>,
    @location(3) bone: f32,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
    @location(1) world_normal: vec3<f32>,
};

@vertex
fn vs_main(vertex: VertexInput) -> VertexOutput {
    let bone = uniforms.bones[u32(vertex.bone + 0.5)];
    let world = uniforms.model * bone;
    var out: VertexOutput;
    out.clip_position = uniforms.view_proj * world * vec4<f32>(vertex.position, 1.0);
    out.uv = vertex.uv;
    out.world_normal = normalize((world * vec4<f32>(vertex.normal, 0.0)).xyz);
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let color = textureSample(skin_texture, skin_sampler, in.uv);
    if color.a < uniforms.alpha_test {
        discard;
    }
    let light_dir = normalize(vec3<f32>(0.3, 1.0, 0.5));
    let ambient = 0.55;
    let diffuse = max(dot(in.world_normal, light_dir), 0.0);
    let lighting = ambient + diffuse * 0.45;
    return vec4<f32>(color.rgb * lighting, color.a);
}
"#;
