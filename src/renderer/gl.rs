#![allow(clippy::all, non_upper_case_globals, non_snake_case, dead_code, unused_parens)]

include!(concat!(env!("OUT_DIR"), "/bindings.rs"));

use anyhow::bail;

macro_rules! call {
    ($expr:expr) => {{
        #[allow(unused_unsafe)]
        let result = unsafe { $expr };
        if cfg!(debug_assertions) {
            let error = unsafe { $crate::renderer::gl::GetError() };
            if error != $crate::renderer::gl::NO_ERROR {
                let error_number_stringified;
                let error_name = match error {
                    $crate::renderer::gl::INVALID_ENUM => "INVALID_ENUM",
                    $crate::renderer::gl::INVALID_VALUE => "INVALID_VALUE",
                    $crate::renderer::gl::INVALID_OPERATION => "INVALID_OPERATION",
                    $crate::renderer::gl::OUT_OF_MEMORY => "OUT_OF_MEMORY",
                    $crate::renderer::gl::INVALID_FRAMEBUFFER_OPERATION => {
                        "INVALID_FRAMEBUFFER_OPERATION"
                    }
                    _ => {
                        error_number_stringified = format!("{error}");
                        &error_number_stringified
                    }
                };
                panic!(
                    "OpenGL error {error_name} at {}:{}:{}",
                    file!(),
                    line!(),
                    column!(),
                );
            }
        }
        result
    }};
}

pub(crate) use call;

/// Compiles a shader of the given type. The driver's info log is returned as
/// the error if compilation fails.
pub fn create_shader(shader_type: types::GLenum, source: &str) -> anyhow::Result<types::GLuint> {
    let shader = call!(CreateShader(shader_type));
    let sources = [source.as_bytes().as_ptr() as *const types::GLchar];
    let source_lens = [source.len() as types::GLint];
    call!(ShaderSource(
        shader,
        1,
        sources.as_ptr(),
        source_lens.as_ptr(),
    ));
    call!(CompileShader(shader));
    let mut compile_status = 0;
    call!(GetShaderiv(shader, COMPILE_STATUS, &mut compile_status));
    if compile_status == FALSE as types::GLint {
        let mut info_log = [0u8; 4096];
        let mut length = 0;
        call!(GetShaderInfoLog(
            shader,
            info_log.len() as types::GLsizei,
            &mut length,
            info_log.as_mut_ptr() as *mut types::GLchar,
        ));
        call!(DeleteShader(shader));
        let info_log = String::from_utf8_lossy(&info_log[..length as usize]);
        let stage = if shader_type == VERTEX_SHADER {
            "vertex"
        } else {
            "fragment"
        };
        bail!("compiling {stage} shader failed: {info_log}");
    }
    Ok(shader)
}

/// Links the shaders into a program. The shaders can be deleted afterwards.
pub fn create_program(shaders: &[types::GLuint]) -> anyhow::Result<types::GLuint> {
    let program = call!(CreateProgram());
    for &shader in shaders {
        call!(AttachShader(program, shader));
    }
    call!(LinkProgram(program));
    let mut link_status = 0;
    call!(GetProgramiv(program, LINK_STATUS, &mut link_status));
    if link_status == FALSE as types::GLint {
        let mut info_log = [0u8; 4096];
        let mut length = 0;
        call!(GetProgramInfoLog(
            program,
            info_log.len() as types::GLsizei,
            &mut length,
            info_log.as_mut_ptr() as *mut types::GLchar,
        ));
        call!(DeleteProgram(program));
        let info_log = String::from_utf8_lossy(&info_log[..length as usize]);
        bail!("linking shader program failed: {info_log}");
    }
    Ok(program)
}

/// Returns None for uniforms the linker optimized out or that don't exist.
pub fn get_uniform_location(program: types::GLuint, name: &str) -> Option<types::GLint> {
    let mut name = name.as_bytes().to_vec();
    name.push(0);
    let location = call!(GetUniformLocation(
        program,
        name.as_ptr() as *const types::GLchar
    ));
    (location != -1).then_some(location)
}
