use std::collections::HashMap;
use std::ffi::c_void;

use crate::renderer::device::{
    AttributeLayout, BufferHandle, Device, TextureHandle, TextureParams, Uniform, UniformValue,
    VertexArrayHandle,
};
use crate::renderer::gl;
use crate::renderer::gltf::program::ShaderProgram;
use crate::renderer::gltf::{ComponentType, Image, Mode};

/// [Device] on top of the current OpenGL ES 3.0 context.
pub struct GlDevice {
    program: gl::types::GLuint,
    uniform_locations: HashMap<Uniform, gl::types::GLint>,
}

impl GlDevice {
    pub fn new(program: ShaderProgram) -> GlDevice {
        GlDevice {
            program: program.program,
            uniform_locations: program.uniform_locations,
        }
    }

    pub fn viewport(&mut self, width: i32, height: i32) {
        gl::call!(gl::Viewport(0, 0, width, height));
    }

    pub fn begin_frame(&mut self) {
        gl::call!(gl::Enable(gl::DEPTH_TEST));
        gl::call!(gl::ClearColor(0.0, 0.0, 0.0, 1.0));
        gl::call!(gl::Clear(gl::COLOR_BUFFER_BIT | gl::DEPTH_BUFFER_BIT));
        gl::call!(gl::UseProgram(self.program));
    }

    /// Reads back the color buffer as tightly packed RGB8 rows, bottom row
    /// first.
    pub fn read_pixels_rgb(&mut self, width: u32, height: u32) -> Vec<u8> {
        let mut rgba = vec![0u8; width as usize * height as usize * 4];
        gl::call!(gl::PixelStorei(gl::PACK_ALIGNMENT, 1));
        gl::call!(gl::ReadPixels(
            0,
            0,
            width as i32,
            height as i32,
            gl::RGBA,
            gl::UNSIGNED_BYTE,
            rgba.as_mut_ptr() as *mut c_void,
        ));
        rgba.chunks_exact(4)
            .flat_map(|pixel| [pixel[0], pixel[1], pixel[2]])
            .collect()
    }
}

impl Device for GlDevice {
    fn create_buffer(&mut self, data: &[u8]) -> BufferHandle {
        let mut buffer = 0;
        gl::call!(gl::GenBuffers(1, &mut buffer));
        gl::call!(gl::BindBuffer(gl::ARRAY_BUFFER, buffer));
        gl::call!(gl::BufferData(
            gl::ARRAY_BUFFER,
            data.len() as isize,
            data.as_ptr() as *const c_void,
            gl::STATIC_DRAW,
        ));
        gl::call!(gl::BindBuffer(gl::ARRAY_BUFFER, 0));
        buffer
    }

    fn create_vertex_array(&mut self) -> VertexArrayHandle {
        let mut vao = 0;
        gl::call!(gl::GenVertexArrays(1, &mut vao));
        vao
    }

    fn enable_vertex_attribute(
        &mut self,
        vao: VertexArrayHandle,
        location: u32,
        buffer: BufferHandle,
        layout: AttributeLayout,
    ) {
        gl::call!(gl::BindVertexArray(vao));
        gl::call!(gl::EnableVertexAttribArray(location));
        gl::call!(gl::BindBuffer(gl::ARRAY_BUFFER, buffer));
        gl::call!(gl::VertexAttribPointer(
            location,
            layout.size,
            layout.component_type as gl::types::GLenum,
            if layout.normalized { gl::TRUE } else { gl::FALSE },
            layout.stride as gl::types::GLsizei,
            layout.offset as *const c_void,
        ));
        gl::call!(gl::BindVertexArray(0));
        gl::call!(gl::BindBuffer(gl::ARRAY_BUFFER, 0));
    }

    fn set_index_buffer(&mut self, vao: VertexArrayHandle, buffer: BufferHandle) {
        gl::call!(gl::BindVertexArray(vao));
        gl::call!(gl::BindBuffer(gl::ELEMENT_ARRAY_BUFFER, buffer));
        gl::call!(gl::BindVertexArray(0));
    }

    fn create_texture(&mut self, image: &Image, params: TextureParams) -> TextureHandle {
        let mut texture = 0;
        gl::call!(gl::GenTextures(1, &mut texture));
        gl::call!(gl::BindTexture(gl::TEXTURE_2D, texture));
        gl::call!(gl::TexImage2D(
            gl::TEXTURE_2D,
            0,
            gl::RGBA as gl::types::GLint,
            image.width as gl::types::GLsizei,
            image.height as gl::types::GLsizei,
            0,
            gl::RGBA,
            gl::UNSIGNED_BYTE,
            image.pixels.as_ptr() as *const c_void,
        ));
        for (parameter, value) in [
            (gl::TEXTURE_MIN_FILTER, params.min_filter as u32),
            (gl::TEXTURE_MAG_FILTER, params.mag_filter as u32),
            (gl::TEXTURE_WRAP_S, params.wrap_s as u32),
            (gl::TEXTURE_WRAP_T, params.wrap_t as u32),
            (gl::TEXTURE_WRAP_R, params.wrap_r as u32),
        ] {
            gl::call!(gl::TexParameteri(
                gl::TEXTURE_2D,
                parameter,
                value as gl::types::GLint
            ));
        }
        if params.generate_mipmaps {
            gl::call!(gl::GenerateMipmap(gl::TEXTURE_2D));
        }
        gl::call!(gl::BindTexture(gl::TEXTURE_2D, 0));
        texture
    }

    fn bind_texture(&mut self, unit: u32, texture: Option<TextureHandle>) {
        gl::call!(gl::ActiveTexture(gl::TEXTURE0 + unit));
        gl::call!(gl::BindTexture(gl::TEXTURE_2D, texture.unwrap_or(0)));
    }

    fn set_uniform(&mut self, uniform: Uniform, value: UniformValue) {
        let Some(&location) = self.uniform_locations.get(&uniform) else {
            return;
        };
        match value {
            UniformValue::Mat4(matrix) => gl::call!(gl::UniformMatrix4fv(
                location,
                1,
                gl::FALSE,
                bytemuck::cast_ref::<_, [f32; 16]>(&matrix).as_ptr()
            )),
            UniformValue::Mat3(matrix) => gl::call!(gl::UniformMatrix3fv(
                location,
                1,
                gl::FALSE,
                bytemuck::cast_ref::<_, [f32; 9]>(&matrix).as_ptr()
            )),
            UniformValue::Vec4(v) => gl::call!(gl::Uniform4f(location, v.x, v.y, v.z, v.w)),
            UniformValue::Vec3(v) => gl::call!(gl::Uniform3f(location, v.x, v.y, v.z)),
            UniformValue::Float(f) => gl::call!(gl::Uniform1f(location, f)),
            UniformValue::Bool(b) => gl::call!(gl::Uniform1i(location, b as gl::types::GLint)),
        }
    }

    fn draw_elements(
        &mut self,
        vao: VertexArrayHandle,
        mode: Mode,
        count: usize,
        index_type: ComponentType,
        byte_offset: usize,
    ) {
        gl::call!(gl::BindVertexArray(vao));
        gl::call!(gl::DrawElements(
            mode as gl::types::GLenum,
            count as gl::types::GLsizei,
            index_type as gl::types::GLenum,
            byte_offset as *const c_void,
        ));
    }

    fn draw_arrays(&mut self, vao: VertexArrayHandle, mode: Mode, count: usize) {
        gl::call!(gl::BindVertexArray(vao));
        gl::call!(gl::DrawArrays(
            mode as gl::types::GLenum,
            0,
            count as gl::types::GLsizei
        ));
    }

    fn delete_buffers(&mut self, buffers: &[BufferHandle]) {
        gl::call!(gl::DeleteBuffers(buffers.len() as i32, buffers.as_ptr()));
    }

    fn delete_vertex_arrays(&mut self, vaos: &[VertexArrayHandle]) {
        gl::call!(gl::DeleteVertexArrays(vaos.len() as i32, vaos.as_ptr()));
    }

    fn delete_textures(&mut self, textures: &[TextureHandle]) {
        gl::call!(gl::DeleteTextures(textures.len() as i32, textures.as_ptr()));
    }
}

impl Drop for GlDevice {
    fn drop(&mut self) {
        gl::call!(gl::DeleteProgram(self.program));
    }
}
