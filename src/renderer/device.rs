use glam::{Mat3, Mat4, Vec3, Vec4};

use crate::renderer::gltf::{ComponentType, Filter, Image, Mode, WrapMode};

pub type BufferHandle = u32;
pub type TextureHandle = u32;
pub type VertexArrayHandle = u32;

/// How a vertex attribute reads its data out of a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeLayout {
    pub size: i32,
    pub component_type: ComponentType,
    pub normalized: bool,
    pub stride: usize,
    pub offset: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureParams {
    pub min_filter: Filter,
    pub mag_filter: Filter,
    pub wrap_s: WrapMode,
    pub wrap_t: WrapMode,
    pub wrap_r: WrapMode,
    pub generate_mipmaps: bool,
}

/// The uniforms the glTF shader program is expected to declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Uniform {
    ModelViewProjMatrix,
    ModelViewMatrix,
    NormalMatrix,
    BaseColorTexture,
    BaseColorFactor,
    MetallicRoughnessTexture,
    MetallicFactor,
    RoughnessFactor,
    EmissiveTexture,
    EmissiveFactor,
    OcclusionTexture,
    OcclusionStrength,
    NormalTexture,
    NormalScale,
    HasMetallicRoughnessTexture,
    HasEmissiveTexture,
    HasOcclusionTexture,
    HasNormalMap,
}

impl Uniform {
    pub const ALL: [Uniform; 18] = [
        Uniform::ModelViewProjMatrix,
        Uniform::ModelViewMatrix,
        Uniform::NormalMatrix,
        Uniform::BaseColorTexture,
        Uniform::BaseColorFactor,
        Uniform::MetallicRoughnessTexture,
        Uniform::MetallicFactor,
        Uniform::RoughnessFactor,
        Uniform::EmissiveTexture,
        Uniform::EmissiveFactor,
        Uniform::OcclusionTexture,
        Uniform::OcclusionStrength,
        Uniform::NormalTexture,
        Uniform::NormalScale,
        Uniform::HasMetallicRoughnessTexture,
        Uniform::HasEmissiveTexture,
        Uniform::HasOcclusionTexture,
        Uniform::HasNormalMap,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Uniform::ModelViewProjMatrix => "uModelViewProjMatrix",
            Uniform::ModelViewMatrix => "uModelViewMatrix",
            Uniform::NormalMatrix => "uNormalMatrix",
            Uniform::BaseColorTexture => "uBaseColorTexture",
            Uniform::BaseColorFactor => "uBaseColorFactor",
            Uniform::MetallicRoughnessTexture => "uMetallicRoughnessTexture",
            Uniform::MetallicFactor => "uMetallicFactor",
            Uniform::RoughnessFactor => "uRoughnessFactor",
            Uniform::EmissiveTexture => "uEmissiveTexture",
            Uniform::EmissiveFactor => "uEmissiveFactor",
            Uniform::OcclusionTexture => "uOcclusionTexture",
            Uniform::OcclusionStrength => "uOcclusionStrength",
            Uniform::NormalTexture => "uNormalTexture",
            Uniform::NormalScale => "uNormalScale",
            Uniform::HasMetallicRoughnessTexture => "uHasMetallicRoughnessTexture",
            Uniform::HasEmissiveTexture => "uHasEmissiveTexture",
            Uniform::HasOcclusionTexture => "uHasOcclusionTexture",
            Uniform::HasNormalMap => "uHasNormalMap",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Mat4(Mat4),
    Mat3(Mat3),
    Vec4(Vec4),
    Vec3(Vec3),
    Float(f32),
    Bool(bool),
}

/// The GPU operations the glTF renderer needs. Handles are opaque to callers,
/// and all calls are synchronous from the caller's point of view.
pub trait Device {
    /// Allocates an immutable buffer holding exactly `data`.
    fn create_buffer(&mut self, data: &[u8]) -> BufferHandle;
    fn create_vertex_array(&mut self) -> VertexArrayHandle;
    /// Enables `location` on `vao`, sourcing it from `buffer` as described by
    /// `layout`.
    fn enable_vertex_attribute(
        &mut self,
        vao: VertexArrayHandle,
        location: u32,
        buffer: BufferHandle,
        layout: AttributeLayout,
    );
    fn set_index_buffer(&mut self, vao: VertexArrayHandle, buffer: BufferHandle);
    fn create_texture(&mut self, image: &Image, params: TextureParams) -> TextureHandle;
    /// Binds `texture` to the texture unit, or unbinds the unit with None.
    fn bind_texture(&mut self, unit: u32, texture: Option<TextureHandle>);
    fn set_uniform(&mut self, uniform: Uniform, value: UniformValue);
    /// Draws `count` indices of `index_type`, starting `byte_offset` bytes
    /// into the index buffer of `vao`.
    fn draw_elements(
        &mut self,
        vao: VertexArrayHandle,
        mode: Mode,
        count: usize,
        index_type: ComponentType,
        byte_offset: usize,
    );
    fn draw_arrays(&mut self, vao: VertexArrayHandle, mode: Mode, count: usize);

    fn delete_buffers(&mut self, buffers: &[BufferHandle]);
    fn delete_vertex_arrays(&mut self, vaos: &[VertexArrayHandle]);
    fn delete_textures(&mut self, textures: &[TextureHandle]);
}
