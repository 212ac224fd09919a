/// Instanced unit cubes. Writes lit colour to target 0 and the pick sample to target 1.
pub const CUBE_SHADER: &str = r#"
struct Uniforms {
    view_proj: mat4x4<f32>,
};

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) face: u32,
};

struct InstanceInput {
    @location(3) offset: vec3<f32>,
    @location(4) colour: vec3<f32>,
    @location(5) id: vec4<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) normal: vec3<f32>,
    @location(1) colour: vec3<f32>,
    @location(2) @interpolate(flat) pick: vec4<f32>,
};

struct FragmentOutput {
    @location(0) colour: vec4<f32>,
    @location(1) pick: vec4<f32>,
};

@vertex
fn vs_cube(vertex: VertexInput, instance: InstanceInput) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = uniforms.view_proj * vec4<f32>(vertex.position + instance.offset, 1.0);
    out.normal = vertex.normal;
    out.colour = instance.colour;
    out.pick = vec4<f32>(instance.id.rgb, f32(vertex.face) / 255.0);
    return out;
}

@fragment
fn fs_cube(in: VertexOutput) -> FragmentOutput {
    let light_dir = normalize(vec3<f32>(0.3, 1.0, 0.5));
    let ambient = 0.3;
    let diffuse = max(dot(normalize(in.normal), light_dir), 0.0);
    let lighting = ambient + diffuse * 0.7;

    var out: FragmentOutput;
    out.colour = vec4<f32>(in.colour * lighting, 1.0);
    out.pick = in.pick;
    return out;
}
"#;

/// Ground plane. The pick sample carries the cell under the fragment: |x| and
/// |z| in the first two bytes, sign and below-ground flags in the third, 255
/// in the face byte.
pub const GROUND_SHADER: &str = r#"
struct Uniforms {
    view_proj: mat4x4<f32>,
};

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;

struct GroundInput {
    @location(0) position: vec3<f32>,
};

struct GroundOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world: vec3<f32>,
};

struct FragmentOutput {
    @location(0) colour: vec4<f32>,
    @location(1) pick: vec4<f32>,
};

@vertex
fn vs_ground(vertex: GroundInput) -> GroundOutput {
    var out: GroundOutput;
    out.clip_position = uniforms.view_proj * vec4<f32>(vertex.position, 1.0);
    out.world = vertex.position;
    return out;
}

@fragment
fn fs_ground(in: GroundOutput, @builtin(front_facing) above: bool) -> FragmentOutput {
    let cell = round(in.world.xz);
    let edge = 0.5 - abs(fract(in.world.xz + 0.5) - 0.5);
    let line = select(0.0, 1.0, min(edge.x, edge.y) < 0.02);

    var flags = 0u;
    if (cell.x < 0.0) {
        flags = flags | 1u;
    }
    if (cell.y < 0.0) {
        flags = flags | 2u;
    }
    if (!above) {
        flags = flags | 4u;
    }

    var out: FragmentOutput;
    out.colour = vec4<f32>(vec3<f32>(0.55) * (1.0 - 0.35 * line), 1.0);
    out.pick = vec4<f32>(abs(cell.x) / 255.0, abs(cell.y) / 255.0, f32(flags) / 255.0, 1.0);
    return out;
}
"#;
