use crate::renderer::gltf::{AccessorType, BufferTarget, ComponentType, Document};

/// What the resolved accessor is going to be bound as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingUsage {
    VertexAttribute,
    Index,
}

impl BindingUsage {
    fn target(self) -> BufferTarget {
        match self {
            BindingUsage::VertexAttribute => BufferTarget::ArrayBuffer,
            BindingUsage::Index => BufferTarget::ElementArrayBuffer,
        }
    }
}

/// An accessor flattened into the numbers a vertex attribute or index buffer
/// binding needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedAccessor {
    pub buffer: usize,
    /// Offset from the start of the buffer, not the buffer view.
    pub byte_offset: usize,
    pub byte_stride: usize,
    pub count: usize,
    pub component_type: ComponentType,
    pub accessor_type: AccessorType,
    pub normalized: bool,
}

/// Resolves the accessor at `accessor_index` for the given usage.
///
/// Panics if the accessor's buffer view declares a target that doesn't match
/// `usage`. Buffer views without a target are accepted for either usage.
pub fn resolve_accessor(
    document: &Document,
    accessor_index: usize,
    usage: BindingUsage,
) -> ResolvedAccessor {
    let accessor = &document.accessors[accessor_index];
    let buffer_view = &document.buffer_views[accessor.buffer_view];
    if let Some(target) = buffer_view.target {
        assert_eq!(
            target,
            usage.target(),
            "accessor {accessor_index} is used as {usage:?} but its buffer view targets {target:?}",
        );
    }
    let byte_stride = if buffer_view.byte_stride != 0 {
        buffer_view.byte_stride
    } else {
        accessor.accessor_type.component_count() * accessor.component_type.size()
    };
    ResolvedAccessor {
        buffer: buffer_view.buffer,
        byte_offset: buffer_view.byte_offset + accessor.byte_offset,
        byte_stride,
        count: accessor.count,
        component_type: accessor.component_type,
        accessor_type: accessor.accessor_type,
        normalized: accessor.normalized,
    }
}
