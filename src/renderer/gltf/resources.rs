use crate::renderer::device::{
    AttributeLayout, BufferHandle, Device, TextureHandle, TextureParams, VertexArrayHandle,
};
use crate::renderer::gltf::accessor::{resolve_accessor, BindingUsage};
use crate::renderer::gltf::material::unsupported_tex_coords;
use crate::renderer::gltf::program::VERTEX_ATTRIBUTES;
use crate::renderer::gltf::{Document, Filter, Image, Sampler};

/// The contiguous run of vertex arrays belonging to one mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VaoRange {
    pub offset: usize,
    pub count: usize,
}

/// Everything uploaded to the GPU for one document. Lives as long as the
/// render loop, and is released with [GpuResources::release].
#[derive(Debug)]
pub struct GpuResources {
    /// One per document buffer, in the same order.
    pub buffers: Vec<BufferHandle>,
    /// One per primitive, mesh by mesh.
    pub vertex_arrays: Vec<VertexArrayHandle>,
    /// One per mesh, indexing into `vertex_arrays`.
    pub mesh_ranges: Vec<VaoRange>,
    /// One per document texture, in the same order.
    pub textures: Vec<TextureHandle>,
    /// 1×1 opaque white, for materials without a base color texture.
    pub white_texture: TextureHandle,
}

impl GpuResources {
    pub fn new(device: &mut impl Device, document: &Document) -> GpuResources {
        let buffers = create_buffer_objects(device, document);
        let (vertex_arrays, mesh_ranges) = create_vertex_array_objects(device, document, &buffers);
        let textures = create_texture_objects(device, document);
        let white_texture = create_white_texture(device);
        for (material, set) in unsupported_tex_coords(document) {
            log::warn!("Material {material} uses TEXCOORD_{set}, drawing it with TEXCOORD_0");
        }
        log::info!(
            "Created {} buffers, {} vertex arrays for {} meshes, and {} textures",
            buffers.len(),
            vertex_arrays.len(),
            mesh_ranges.len(),
            textures.len(),
        );
        GpuResources {
            buffers,
            vertex_arrays,
            mesh_ranges,
            textures,
            white_texture,
        }
    }

    pub fn mesh_vertex_arrays(&self, mesh: usize) -> &[VertexArrayHandle] {
        let VaoRange { offset, count } = self.mesh_ranges[mesh];
        &self.vertex_arrays[offset..offset + count]
    }

    pub fn release(self, device: &mut impl Device) {
        device.delete_vertex_arrays(&self.vertex_arrays);
        device.delete_buffers(&self.buffers);
        let mut textures = self.textures;
        textures.push(self.white_texture);
        device.delete_textures(&textures);
    }
}

/// Uploads every document buffer in full, in document order.
pub fn create_buffer_objects(device: &mut impl Device, document: &Document) -> Vec<BufferHandle> {
    document
        .buffers
        .iter()
        .map(|buffer| device.create_buffer(&buffer.data))
        .collect()
}

/// Creates one vertex array per primitive, with the attribute slots of
/// [VERTEX_ATTRIBUTES] enabled for the semantics the primitive declares, and
/// returns them along with the range of vertex arrays of each mesh.
pub fn create_vertex_array_objects(
    device: &mut impl Device,
    document: &Document,
    buffers: &[BufferHandle],
) -> (Vec<VertexArrayHandle>, Vec<VaoRange>) {
    let mut vertex_arrays = Vec::with_capacity(document.primitive_count());
    let mut mesh_ranges = Vec::with_capacity(document.meshes.len());
    for (mesh_index, mesh) in document.meshes.iter().enumerate() {
        mesh_ranges.push(VaoRange {
            offset: vertex_arrays.len(),
            count: mesh.primitives.len(),
        });
        for (primitive_index, primitive) in mesh.primitives.iter().enumerate() {
            let vao = device.create_vertex_array();
            for (semantic, location) in VERTEX_ATTRIBUTES {
                let Some(accessor) = primitive.attribute(semantic) else {
                    if semantic == "TANGENT" {
                        log::debug!(
                            "Primitive {primitive_index} of mesh {mesh_index} has no tangents",
                        );
                    }
                    continue;
                };
                let resolved = resolve_accessor(document, accessor, BindingUsage::VertexAttribute);
                device.enable_vertex_attribute(
                    vao,
                    location,
                    buffers[resolved.buffer],
                    AttributeLayout {
                        size: resolved.accessor_type.component_count() as i32,
                        component_type: resolved.component_type,
                        normalized: resolved.normalized,
                        stride: resolved.byte_stride,
                        offset: resolved.byte_offset,
                    },
                );
            }
            if let Some(indices) = primitive.indices {
                let resolved = resolve_accessor(document, indices, BindingUsage::Index);
                device.set_index_buffer(vao, buffers[resolved.buffer]);
            }
            vertex_arrays.push(vao);
        }
    }
    (vertex_arrays, mesh_ranges)
}

/// Creates one texture per document texture, in document order.
pub fn create_texture_objects(device: &mut impl Device, document: &Document) -> Vec<TextureHandle> {
    document
        .textures
        .iter()
        .enumerate()
        .map(|(index, texture)| {
            let sampler = texture
                .sampler
                .map(|sampler| document.samplers[sampler])
                .unwrap_or_default();
            let params = texture_params(&sampler);
            match texture.source {
                Some(source) => device.create_texture(&document.images[source], params),
                None => {
                    log::warn!("Texture {index} has no image source, using white instead");
                    device.create_texture(&white_image(), params)
                }
            }
        })
        .collect()
}

pub fn create_white_texture(device: &mut impl Device) -> TextureHandle {
    device.create_texture(&white_image(), texture_params(&Sampler::default()))
}

/// Fills in unspecified filters with linear filtering, and decides whether
/// mipmaps are needed.
pub fn texture_params(sampler: &Sampler) -> TextureParams {
    let min_filter = sampler.min_filter.unwrap_or(Filter::Linear);
    let mag_filter = sampler.mag_filter.unwrap_or(Filter::Linear);
    TextureParams {
        min_filter,
        mag_filter,
        wrap_s: sampler.wrap_s,
        wrap_t: sampler.wrap_t,
        wrap_r: sampler.wrap_r,
        generate_mipmaps: min_filter.uses_mipmaps(),
    }
}

fn white_image() -> Image {
    Image {
        width: 1,
        height: 1,
        pixels: vec![255; 4],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::gltf::program::{
        ATTR_LOC_NORMAL, ATTR_LOC_POSITION, ATTR_LOC_TEXCOORD_0,
    };
    use crate::renderer::gltf::{AccessorType, BufferTarget, ComponentType, Texture, WrapMode};
    use crate::renderer::testing::{triangles, Command, DocumentBuilder, RecordingDevice};

    fn three_mesh_document() -> Document {
        let mut builder = DocumentBuilder::new();
        builder.buffer(512);
        let vertices = builder.buffer_view(0, 0, 512, 0, Some(BufferTarget::ArrayBuffer));
        let indices = builder.buffer_view(1, 64, 128, 0, Some(BufferTarget::ElementArrayBuffer));
        let position = builder.accessor(vertices, 0, ComponentType::Float, AccessorType::Vec3, 8);
        let normal = builder.accessor(vertices, 96, ComponentType::Float, AccessorType::Vec3, 8);
        let index =
            builder.accessor(indices, 4, ComponentType::UnsignedShort, AccessorType::Scalar, 36);
        builder.mesh(vec![
            triangles(&[("POSITION", position), ("NORMAL", normal)], Some(index), None),
            triangles(&[("POSITION", position)], None, None),
        ]);
        builder.mesh(vec![]);
        builder.mesh(vec![
            triangles(&[("POSITION", position)], Some(index), None),
            triangles(&[("POSITION", position)], Some(index), None),
            triangles(&[("POSITION", position)], Some(index), None),
        ]);
        builder.finish()
    }

    #[test]
    fn mesh_ranges_partition_the_vertex_arrays() {
        let document = three_mesh_document();
        let mut device = RecordingDevice::new();
        let resources = GpuResources::new(&mut device, &document);

        assert_eq!(resources.vertex_arrays.len(), document.primitive_count());
        let mut expected_offset = 0;
        for (mesh, range) in document.meshes.iter().zip(&resources.mesh_ranges) {
            assert_eq!(range.count, mesh.primitives.len());
            assert_eq!(range.offset, expected_offset);
            expected_offset += range.count;
        }
        assert_eq!(expected_offset, resources.vertex_arrays.len());
        assert!(resources.mesh_vertex_arrays(1).is_empty());
        assert_eq!(resources.mesh_vertex_arrays(2).len(), 3);
    }

    #[test]
    fn one_handle_per_buffer_and_texture_in_order() {
        let mut builder = DocumentBuilder::new();
        builder.buffer(10);
        builder.buffer(20);
        let image = builder.image(4, 2);
        let other_image = builder.image(8, 8);
        builder.texture(Some(image), None);
        builder.texture(Some(other_image), None);
        let document = builder.finish();

        let mut device = RecordingDevice::new();
        let resources = GpuResources::new(&mut device, &document);
        assert_eq!(resources.buffers.len(), 3);
        assert_eq!(resources.textures.len(), 2);

        let buffer_lens = device
            .commands
            .iter()
            .filter_map(|command| match command {
                Command::CreateBuffer { handle, len } => Some((*handle, *len)),
                _ => None,
            })
            .collect::<Vec<_>>();
        assert_eq!(
            buffer_lens,
            resources.buffers.iter().copied().zip([1024, 10, 20]).collect::<Vec<_>>(),
        );
        let texture_sizes = device
            .commands
            .iter()
            .filter_map(|command| match command {
                Command::CreateTexture { handle, width, .. } => Some((*handle, *width)),
                _ => None,
            })
            .collect::<Vec<_>>();
        assert_eq!(
            texture_sizes,
            vec![
                (resources.textures[0], 4),
                (resources.textures[1], 8),
                (resources.white_texture, 1),
            ],
        );
    }

    #[test]
    fn declared_attributes_are_bound_and_others_left_disabled() {
        let document = three_mesh_document();
        let mut device = RecordingDevice::new();
        let resources = GpuResources::new(&mut device, &document);
        let first_vao = resources.vertex_arrays[0];
        let second_vao = resources.vertex_arrays[1];

        let attributes = |vao| {
            device
                .commands
                .iter()
                .filter_map(move |command| match command {
                    Command::EnableVertexAttribute {
                        vao: v,
                        location,
                        buffer,
                        layout,
                    } if *v == vao => Some((*location, *buffer, *layout)),
                    _ => None,
                })
                .collect::<Vec<_>>()
        };
        let first = attributes(first_vao);
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].0, ATTR_LOC_POSITION);
        assert_eq!(first[0].1, resources.buffers[0]);
        assert_eq!(
            first[1].2,
            AttributeLayout {
                size: 3,
                component_type: ComponentType::Float,
                normalized: false,
                stride: 12,
                offset: 96,
            },
        );
        assert_eq!(first[1].0, ATTR_LOC_NORMAL);
        assert!(attributes(second_vao)
            .iter()
            .all(|(location, ..)| *location != ATTR_LOC_TEXCOORD_0));

        let index_bindings = device
            .commands
            .iter()
            .filter_map(|command| match command {
                Command::SetIndexBuffer { vao, buffer } => Some((*vao, *buffer)),
                _ => None,
            })
            .collect::<Vec<_>>();
        assert!(index_bindings.contains(&(first_vao, resources.buffers[1])));
        assert!(!index_bindings.iter().any(|(vao, _)| *vao == second_vao));
    }

    #[test]
    fn release_deletes_every_handle_once() {
        let mut document = three_mesh_document();
        document.images.push(white_image());
        document.textures.push(Texture {
            source: Some(0),
            sampler: None,
        });
        let mut device = RecordingDevice::new();
        let resources = GpuResources::new(&mut device, &document);
        let expected_buffers = resources.buffers.clone();
        let expected_vertex_arrays = resources.vertex_arrays.clone();
        let mut expected_textures = resources.textures.clone();
        expected_textures.push(resources.white_texture);
        let created = device.commands.len();

        resources.release(&mut device);

        let mut buffers: Vec<BufferHandle> = Vec::new();
        let mut vertex_arrays: Vec<VertexArrayHandle> = Vec::new();
        let mut textures: Vec<TextureHandle> = Vec::new();
        for command in &device.commands[created..] {
            match command {
                Command::DeleteBuffers(handles) => buffers.extend(handles),
                Command::DeleteVertexArrays(handles) => vertex_arrays.extend(handles),
                Command::DeleteTextures(handles) => textures.extend(handles),
                other => panic!("unexpected {other:?} while releasing"),
            }
        }
        buffers.sort();
        vertex_arrays.sort();
        textures.sort();
        expected_textures.sort();
        assert_eq!(buffers, expected_buffers);
        assert_eq!(vertex_arrays, expected_vertex_arrays);
        assert_eq!(textures, expected_textures);
    }

    #[test]
    fn sampler_resolution() {
        let default = texture_params(&Sampler::default());
        assert_eq!(default.min_filter, Filter::Linear);
        assert_eq!(default.wrap_r, WrapMode::Repeat);
        assert!(!default.generate_mipmaps);

        let unspecified = texture_params(&Sampler {
            min_filter: None,
            mag_filter: None,
            wrap_s: WrapMode::ClampToEdge,
            wrap_t: WrapMode::MirroredRepeat,
            wrap_r: WrapMode::Repeat,
        });
        assert_eq!(unspecified.min_filter, Filter::Linear);
        assert_eq!(unspecified.mag_filter, Filter::Linear);
        assert_eq!(unspecified.wrap_s, WrapMode::ClampToEdge);
        assert!(!unspecified.generate_mipmaps);

        let mipmapped = texture_params(&Sampler {
            min_filter: Some(Filter::LinearMipmapLinear),
            ..Sampler::default()
        });
        assert!(mipmapped.generate_mipmaps);
    }

    #[test]
    fn texture_without_sampler_uses_default_sampler() {
        let mut builder = DocumentBuilder::new();
        let image = builder.image(2, 2);
        let nearest = builder.sampler(Sampler {
            min_filter: Some(Filter::NearestMipmapNearest),
            mag_filter: Some(Filter::Nearest),
            ..Sampler::default()
        });
        builder.texture(Some(image), None);
        builder.texture(Some(image), Some(nearest));
        let document = builder.finish();

        let mut device = RecordingDevice::new();
        create_texture_objects(&mut device, &document);
        let params = device
            .commands
            .iter()
            .filter_map(|command| match command {
                Command::CreateTexture { params, .. } => Some(*params),
                _ => None,
            })
            .collect::<Vec<_>>();
        assert_eq!(params[0], texture_params(&Sampler::default()));
        assert_eq!(params[1].mag_filter, Filter::Nearest);
        assert!(params[1].generate_mipmaps);
    }
}
