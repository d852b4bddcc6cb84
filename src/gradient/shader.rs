// GLSL ES 3.00 sources. The fragment program must stay in step with
// `noise.rs`.

pub const QUAD_VERTEX: &str = r#"#version 300 es
in vec2 a_position;
void main() {
    gl_Position = vec4(a_position, 0.0, 1.0);
}
"#;

pub const GRADIENT_FRAGMENT: &str = r#"#version 300 es
precision highp float;

uniform float u_time;
uniform vec2 u_resolution;
uniform vec2 u_mouse;
uniform vec3 u_colors[4];
uniform vec2 u_noiseOffset;
uniform float u_seed;

out vec4 fragColor;

float random(vec2 st) {
    return fract(sin(dot(st.xy, vec2(12.9898, 78.233))) * 43758.5453123 + u_seed);
}

float noise(vec2 st) {
    vec2 i = floor(st);
    vec2 f = fract(st);
    vec2 u = f * f * (3.0 - 2.0 * f);
    return mix(
        mix(random(i + vec2(0.0, 0.0)), random(i + vec2(1.0, 0.0)), u.x),
        mix(random(i + vec2(0.0, 1.0)), random(i + vec2(1.0, 1.0)), u.x),
        u.y
    );
}

void main() {
    vec2 st = gl_FragCoord.xy / u_resolution.xy;

    vec2 mouseInfluence = u_mouse * 0.5 - 1.0;
    vec2 pos = st * 3.0 + u_noiseOffset;
    pos += vec2(sin(u_time * 0.1), cos(u_time * 0.15)) * 0.2;

    float n = noise(pos + mouseInfluence * 0.5 * sin(u_time * 0.5)) * 0.5;

    vec3 color = mix(u_colors[0], u_colors[1], n);
    color = mix(color, u_colors[2], n * 0.5);
    color = mix(color, u_colors[3], n * 0.25);

    color += vec3(random(st) * 0.05);

    fragColor = vec4(color, 1.0);
}
"#;

pub const STAR_VERTEX: &str = r#"#version 300 es
in vec3 a_position;
in float a_size;
in float a_alpha;
out float v_alpha;
void main() {
    gl_Position = vec4(a_position, 1.0);
    gl_PointSize = a_size;
    v_alpha = a_alpha;
}
"#;

pub const STAR_FRAGMENT: &str = r#"#version 300 es
precision mediump float;
in float v_alpha;
out vec4 fragColor;
void main() {
    vec2 d = gl_PointCoord - vec2(0.5);
    if (dot(d, d) > 0.25) {
        discard;
    }
    fragColor = vec4(1.0, 1.0, 1.0, v_alpha);
}
"#;

/// Two triangles covering clip space.
pub const QUAD: [f32; 12] = [
    -1.0, -1.0, 1.0, -1.0, -1.0, 1.0, //
    -1.0, 1.0, 1.0, -1.0, 1.0, 1.0,
];
