//! Test doubles: a [Device] that records instead of rendering, and a builder
//! for hand-made documents.

use crate::renderer::device::{
    AttributeLayout, BufferHandle, Device, TextureHandle, TextureParams, Uniform, UniformValue,
    VertexArrayHandle,
};
use crate::renderer::gltf::{
    Accessor, AccessorType, Buffer, BufferTarget, BufferView, ComponentType, Document, Image,
    Material, Mesh, Mode, Node, Primitive, Sampler, Scene, Texture, Transform,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    CreateBuffer {
        handle: BufferHandle,
        len: usize,
    },
    CreateVertexArray(VertexArrayHandle),
    EnableVertexAttribute {
        vao: VertexArrayHandle,
        location: u32,
        buffer: BufferHandle,
        layout: AttributeLayout,
    },
    SetIndexBuffer {
        vao: VertexArrayHandle,
        buffer: BufferHandle,
    },
    CreateTexture {
        handle: TextureHandle,
        width: u32,
        height: u32,
        params: TextureParams,
    },
    BindTexture {
        unit: u32,
        texture: Option<TextureHandle>,
    },
    SetUniform(Uniform, UniformValue),
    DrawElements {
        vao: VertexArrayHandle,
        mode: Mode,
        count: usize,
        index_type: ComponentType,
        byte_offset: usize,
    },
    DrawArrays {
        vao: VertexArrayHandle,
        mode: Mode,
        count: usize,
    },
    DeleteBuffers(Vec<BufferHandle>),
    DeleteVertexArrays(Vec<VertexArrayHandle>),
    DeleteTextures(Vec<TextureHandle>),
}

impl Command {
    pub fn is_draw(&self) -> bool {
        matches!(self, Command::DrawElements { .. } | Command::DrawArrays { .. })
    }
}

#[derive(Debug, Default)]
pub struct RecordingDevice {
    pub commands: Vec<Command>,
    next_handle: u32,
}

impl RecordingDevice {
    pub fn new() -> RecordingDevice {
        RecordingDevice::default()
    }

    pub fn draws(&self) -> Vec<&Command> {
        self.commands.iter().filter(|command| command.is_draw()).collect()
    }

    /// The last value set for the uniform, if any.
    pub fn uniform(&self, uniform: Uniform) -> Option<UniformValue> {
        self.commands.iter().rev().find_map(|command| match command {
            Command::SetUniform(u, value) if *u == uniform => Some(*value),
            _ => None,
        })
    }

    /// The texture last bound to the unit. None if never bound.
    pub fn bound_texture(&self, unit: u32) -> Option<Option<TextureHandle>> {
        self.commands.iter().rev().find_map(|command| match command {
            Command::BindTexture { unit: u, texture } if *u == unit => Some(*texture),
            _ => None,
        })
    }

    fn next(&mut self) -> u32 {
        self.next_handle += 1;
        self.next_handle
    }
}

impl Device for RecordingDevice {
    fn create_buffer(&mut self, data: &[u8]) -> BufferHandle {
        let handle = self.next();
        self.commands.push(Command::CreateBuffer {
            handle,
            len: data.len(),
        });
        handle
    }

    fn create_vertex_array(&mut self) -> VertexArrayHandle {
        let handle = self.next();
        self.commands.push(Command::CreateVertexArray(handle));
        handle
    }

    fn enable_vertex_attribute(
        &mut self,
        vao: VertexArrayHandle,
        location: u32,
        buffer: BufferHandle,
        layout: AttributeLayout,
    ) {
        self.commands.push(Command::EnableVertexAttribute {
            vao,
            location,
            buffer,
            layout,
        });
    }

    fn set_index_buffer(&mut self, vao: VertexArrayHandle, buffer: BufferHandle) {
        self.commands.push(Command::SetIndexBuffer { vao, buffer });
    }

    fn create_texture(&mut self, image: &Image, params: TextureParams) -> TextureHandle {
        let handle = self.next();
        self.commands.push(Command::CreateTexture {
            handle,
            width: image.width,
            height: image.height,
            params,
        });
        handle
    }

    fn bind_texture(&mut self, unit: u32, texture: Option<TextureHandle>) {
        self.commands.push(Command::BindTexture { unit, texture });
    }

    fn set_uniform(&mut self, uniform: Uniform, value: UniformValue) {
        self.commands.push(Command::SetUniform(uniform, value));
    }

    fn draw_elements(
        &mut self,
        vao: VertexArrayHandle,
        mode: Mode,
        count: usize,
        index_type: ComponentType,
        byte_offset: usize,
    ) {
        self.commands.push(Command::DrawElements {
            vao,
            mode,
            count,
            index_type,
            byte_offset,
        });
    }

    fn draw_arrays(&mut self, vao: VertexArrayHandle, mode: Mode, count: usize) {
        self.commands.push(Command::DrawArrays { vao, mode, count });
    }

    fn delete_buffers(&mut self, buffers: &[BufferHandle]) {
        self.commands.push(Command::DeleteBuffers(buffers.to_vec()));
    }

    fn delete_vertex_arrays(&mut self, vaos: &[VertexArrayHandle]) {
        self.commands.push(Command::DeleteVertexArrays(vaos.to_vec()));
    }

    fn delete_textures(&mut self, textures: &[TextureHandle]) {
        self.commands.push(Command::DeleteTextures(textures.to_vec()));
    }
}

/// Builds documents piece by piece. Starts out with a single zeroed 1 KiB
/// buffer.
pub struct DocumentBuilder {
    pub document: Document,
}

impl DocumentBuilder {
    pub fn new() -> DocumentBuilder {
        let mut document = Document::default();
        document.buffers.push(Buffer {
            data: vec![0; 1024],
        });
        DocumentBuilder { document }
    }

    pub fn buffer(&mut self, len: usize) -> usize {
        self.document.buffers.push(Buffer { data: vec![0; len] });
        self.document.buffers.len() - 1
    }

    pub fn buffer_view(
        &mut self,
        buffer: usize,
        byte_offset: usize,
        byte_length: usize,
        byte_stride: usize,
        target: Option<BufferTarget>,
    ) -> usize {
        self.document.buffer_views.push(BufferView {
            buffer,
            byte_offset,
            byte_length,
            byte_stride,
            target,
        });
        self.document.buffer_views.len() - 1
    }

    pub fn accessor(
        &mut self,
        buffer_view: usize,
        byte_offset: usize,
        component_type: ComponentType,
        accessor_type: AccessorType,
        count: usize,
    ) -> usize {
        self.document.accessors.push(Accessor {
            buffer_view,
            byte_offset,
            component_type,
            normalized: false,
            count,
            accessor_type,
            min: None,
            max: None,
        });
        self.document.accessors.len() - 1
    }

    pub fn mesh(&mut self, primitives: Vec<Primitive>) -> usize {
        self.document.meshes.push(Mesh { primitives });
        self.document.meshes.len() - 1
    }

    pub fn material(&mut self, material: Material) -> usize {
        self.document.materials.push(material);
        self.document.materials.len() - 1
    }

    pub fn image(&mut self, width: u32, height: u32) -> usize {
        self.document.images.push(Image {
            width,
            height,
            pixels: vec![255; width as usize * height as usize * 4],
        });
        self.document.images.len() - 1
    }

    pub fn sampler(&mut self, sampler: Sampler) -> usize {
        self.document.samplers.push(sampler);
        self.document.samplers.len() - 1
    }

    pub fn texture(&mut self, source: Option<usize>, sampler: Option<usize>) -> usize {
        self.document.textures.push(Texture { source, sampler });
        self.document.textures.len() - 1
    }

    pub fn node(
        &mut self,
        mesh: Option<usize>,
        transform: Transform,
        children: Vec<usize>,
    ) -> usize {
        self.document.nodes.push(Node {
            mesh,
            children,
            transform,
        });
        self.document.nodes.len() - 1
    }

    /// Adds a scene and makes it the default one.
    pub fn scene(&mut self, nodes: Vec<usize>) -> usize {
        self.document.scenes.push(Scene { nodes });
        self.document.default_scene = Some(self.document.scenes.len() - 1);
        self.document.scenes.len() - 1
    }

    pub fn finish(self) -> Document {
        self.document
    }
}

pub fn triangles(
    attributes: &[(&str, usize)],
    indices: Option<usize>,
    material: Option<usize>,
) -> Primitive {
    let mut attributes = attributes
        .iter()
        .map(|&(name, accessor)| (name.to_string(), accessor))
        .collect::<Vec<_>>();
    attributes.sort();
    Primitive {
        mode: Mode::Triangles,
        attributes,
        indices,
        material,
    }
}
