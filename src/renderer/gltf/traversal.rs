use glam::{Mat3, Mat4};

use crate::renderer::device::{Device, Uniform, UniformValue, VertexArrayHandle};
use crate::renderer::gltf::accessor::{resolve_accessor, BindingUsage};
use crate::renderer::gltf::material::{bind_material, MaterialChannels};
use crate::renderer::gltf::resources::GpuResources;
use crate::renderer::gltf::{Document, Primitive};

/// The per-frame inputs shared by every node of the traversal.
pub struct Frame<'a> {
    pub document: &'a Document,
    pub resources: &'a GpuResources,
    pub channels: &'a MaterialChannels,
    pub view: Mat4,
    pub projection: Mat4,
}

/// Draws the default scene. Documents without a default scene draw nothing.
pub fn draw_scene(device: &mut impl Device, frame: &Frame) {
    let Some(scene) = frame.document.default_scene else {
        return;
    };
    for &node in &frame.document.scenes[scene].nodes {
        draw_node(device, frame, node, Mat4::IDENTITY);
    }
}

/// Draws the node and its descendants, `parent_matrix` being the parent's
/// local-to-world transform.
pub fn draw_node(device: &mut impl Device, frame: &Frame, node_index: usize, parent_matrix: Mat4) {
    let node = &frame.document.nodes[node_index];
    let model_matrix = parent_matrix * node.transform.matrix();

    if let Some(mesh_index) = node.mesh {
        let model_view = frame.view * model_matrix;
        let model_view_projection = frame.projection * model_view;
        let normal_matrix = Mat3::from_mat4(model_view.inverse().transpose());
        device.set_uniform(
            Uniform::ModelViewProjMatrix,
            UniformValue::Mat4(model_view_projection),
        );
        device.set_uniform(Uniform::ModelViewMatrix, UniformValue::Mat4(model_view));
        device.set_uniform(Uniform::NormalMatrix, UniformValue::Mat3(normal_matrix));

        let mesh = &frame.document.meshes[mesh_index];
        let vertex_arrays = frame.resources.mesh_vertex_arrays(mesh_index);
        for (primitive, &vao) in mesh.primitives.iter().zip(vertex_arrays) {
            bind_material(
                device,
                frame.document,
                frame.resources,
                primitive.material,
                frame.channels,
            );
            draw_primitive(device, frame.document, primitive, vao);
        }
    }

    for &child in &node.children {
        draw_node(device, frame, child, model_matrix);
    }
}

fn draw_primitive(
    device: &mut impl Device,
    document: &Document,
    primitive: &Primitive,
    vao: VertexArrayHandle,
) {
    if let Some(indices) = primitive.indices {
        let resolved = resolve_accessor(document, indices, BindingUsage::Index);
        device.draw_elements(
            vao,
            primitive.mode,
            resolved.count,
            resolved.component_type,
            resolved.byte_offset,
        );
    } else {
        let vertex_accessor = primitive
            .attribute("POSITION")
            .or_else(|| primitive.attributes.first().map(|&(_, accessor)| accessor));
        let Some(accessor) = vertex_accessor else {
            log::warn!("Skipping a primitive with neither indices nor attributes");
            return;
        };
        device.draw_arrays(vao, primitive.mode, document.accessors[accessor].count);
    }
}
