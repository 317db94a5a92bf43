//! GLSL sources for the skinned avatar pipeline.
//!
//! No `#version` line: the renderer prepends one for the context profile.

pub const SKIN_VERTEX_SHADER: &str = r#"
layout(location = 0) in vec3 a_position;
layout(location = 1) in vec2 a_uv;
layout(location = 2) in vec3 a_normal;
layout(location = 3) in float a_bone;

uniform mat4 u_model;
uniform mat4 u_viewProj;
uniform mat4 u_bones[12];

out vec2 v_uv;
out vec3 v_normal;

void main() {
    mat4 world = u_model * u_bones[int(a_bone + 0.5)];
    v_uv = a_uv;
    v_normal = normalize((world * vec4(a_normal, 0.0)).xyz);
    gl_Position = u_viewProj * world * vec4(a_position, 1.0);
}
"#;

pub const SKIN_FRAGMENT_SHADER: &str = r#"
uniform sampler2D u_skin;
uniform float u_alphaTest;

in vec2 v_uv;
in vec3 v_normal;

out vec4 fragColor;

void main() {
    vec4 color = texture(u_skin, v_uv);
    if (color.a < u_alphaTest) {
        discard;
    }
    vec3 lightDir = normalize(vec3(0.3, 1.0, 0.5));
    float lighting = 0.55 + max(dot(v_normal, lightDir), 0.0) * 0.45;
    fragColor = vec4(color.rgb * lighting, color.a);
}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use skinview_common::{
        ALPHA_TEST_UNIFORM, BONE_COUNT, BONE_LOCATION, BONES_UNIFORM, MODEL_UNIFORM,
        POSITION_LOCATION, SKIN_TEXTURE, VIEW_PROJ_UNIFORM,
    };

    #[test]
    fn uniform_names_match_layout() {
        for name in [MODEL_UNIFORM, VIEW_PROJ_UNIFORM, BONES_UNIFORM] {
            assert!(SKIN_VERTEX_SHADER.contains(name), "{name}");
        }
        assert!(SKIN_FRAGMENT_SHADER.contains(ALPHA_TEST_UNIFORM));
        assert!(SKIN_FRAGMENT_SHADER.contains(&format!("sampler2D {SKIN_TEXTURE}")));
        assert!(SKIN_VERTEX_SHADER.contains(&format!("u_bones[{BONE_COUNT}]")));
    }

    #[test]
    fn attribute_locations_match_vertex_layout() {
        assert!(SKIN_VERTEX_SHADER.contains(&format!("location = {POSITION_LOCATION}) in vec3")));
        assert!(SKIN_VERTEX_SHADER.contains(&format!("location = {BONE_LOCATION}) in float")));
    }

    #[test]
    fn sources_leave_version_to_renderer() {
        assert!(!SKIN_VERTEX_SHADER.contains("#version"));
        assert!(!SKIN_FRAGMENT_SHADER.contains("#version"));
    }
}
