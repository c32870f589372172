use std::collections::HashMap;

use crate::renderer::device::Uniform;
use crate::renderer::gl;

/// The vertex attribute location of the POSITION attribute of glTF models.
pub const ATTR_LOC_POSITION: gl::types::GLuint = 0;
/// The vertex attribute location of the NORMAL attribute of glTF models.
pub const ATTR_LOC_NORMAL: gl::types::GLuint = 1;
/// The vertex attribute location of the TANGENT attribute of glTF models.
pub const ATTR_LOC_TANGENT: gl::types::GLuint = 2;
/// The vertex attribute location of the TEXCOORD_0 attribute of glTF models.
pub const ATTR_LOC_TEXCOORD_0: gl::types::GLuint = 3;

/// Attribute semantics the program consumes, in slot order.
pub const VERTEX_ATTRIBUTES: [(&str, gl::types::GLuint); 4] = [
    ("POSITION", ATTR_LOC_POSITION),
    ("NORMAL", ATTR_LOC_NORMAL),
    ("TANGENT", ATTR_LOC_TANGENT),
    ("TEXCOORD_0", ATTR_LOC_TEXCOORD_0),
];

pub const TEXTURE_UNIT_BASE_COLOR: u32 = 0;
pub const TEXTURE_UNIT_METALLIC_ROUGHNESS: u32 = 1;
pub const TEXTURE_UNIT_EMISSIVE: u32 = 2;
pub const TEXTURE_UNIT_OCCLUSION: u32 = 3;
pub const TEXTURE_UNIT_NORMAL: u32 = 4;

pub const DEFAULT_VERTEX_SHADER: &str = include_str!("../../../shaders/forward.vs.glsl");
pub const DEFAULT_FRAGMENT_SHADER: &str =
    include_str!("../../../shaders/pbr_directional_light.fs.glsl");

pub struct ShaderProgram {
    pub program: gl::types::GLuint,
    pub uniform_locations: HashMap<Uniform, gl::types::GLint>,
}

/// Compiles and links the program used to render glTF models, and points its
/// texture samplers at their fixed texture units.
pub fn create_program(
    vertex_source: &str,
    fragment_source: &str,
) -> anyhow::Result<ShaderProgram> {
    let vertex_shader = gl::create_shader(gl::VERTEX_SHADER, vertex_source)?;
    let fragment_shader = match gl::create_shader(gl::FRAGMENT_SHADER, fragment_source) {
        Ok(shader) => shader,
        Err(err) => {
            gl::call!(gl::DeleteShader(vertex_shader));
            return Err(err);
        }
    };
    let program = gl::create_program(&[vertex_shader, fragment_shader]);
    gl::call!(gl::DeleteShader(vertex_shader));
    gl::call!(gl::DeleteShader(fragment_shader));
    let program = program?;
    gl::call!(gl::UseProgram(program));

    let mut uniform_locations = HashMap::new();
    for uniform in Uniform::ALL {
        match gl::get_uniform_location(program, uniform.name()) {
            Some(location) => {
                uniform_locations.insert(uniform, location);
            }
            None => log::debug!("uniform {} is not active in the program", uniform.name()),
        }
    }

    for (uniform, unit) in [
        (Uniform::BaseColorTexture, TEXTURE_UNIT_BASE_COLOR),
        (Uniform::MetallicRoughnessTexture, TEXTURE_UNIT_METALLIC_ROUGHNESS),
        (Uniform::EmissiveTexture, TEXTURE_UNIT_EMISSIVE),
        (Uniform::OcclusionTexture, TEXTURE_UNIT_OCCLUSION),
        (Uniform::NormalTexture, TEXTURE_UNIT_NORMAL),
    ] {
        if let Some(&location) = uniform_locations.get(&uniform) {
            gl::call!(gl::Uniform1i(location, unit as gl::types::GLint));
        }
    }

    Ok(ShaderProgram {
        program,
        uniform_locations,
    })
}
