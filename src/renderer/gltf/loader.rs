use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{anyhow, bail, ensure, Context};
use glam::{Mat4, Quat, Vec3, Vec4};
use tinyjson::JsonValue;

use crate::renderer::gltf::{
    Accessor, AccessorType, Buffer, BufferTarget, BufferView, ComponentType, Document, Filter,
    Image, Material, Mesh, Mode, Node, Primitive, Sampler, Scene, Texture, TextureInfo, Transform,
    WrapMode,
};

type Object = HashMap<String, JsonValue>;

const GLB_MAGIC: &[u8; 4] = b"glTF";
const GLB_CHUNK_JSON: u32 = 0x4E4F534A;
const GLB_CHUNK_BIN: u32 = 0x004E4942;

/// Loads a `.gltf` file and the files it refers to, or a binary `.glb` file.
pub fn load_gltf_file(path: &Path) -> anyhow::Result<Document> {
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let base_dir = path.parent().unwrap_or(Path::new("."));
    let read_uri = |uri: &str| -> anyhow::Result<Vec<u8>> {
        if uri.starts_with("data:") {
            bail!("data URIs are not supported");
        }
        let path = base_dir.join(uri);
        fs::read(&path).with_context(|| format!("failed to read {}", path.display()))
    };
    let document = if bytes.starts_with(GLB_MAGIC) {
        let (json, bin) = split_glb(&bytes)?;
        parse_gltf(json, bin, &read_uri)?
    } else {
        let json = std::str::from_utf8(&bytes).context("glTF JSON is not valid UTF-8")?;
        parse_gltf(json, None, &read_uri)?
    };
    log::info!(
        "Loaded {}: {} meshes, {} primitives, {} materials, {} textures",
        path.display(),
        document.meshes.len(),
        document.primitive_count(),
        document.materials.len(),
        document.textures.len(),
    );
    Ok(document)
}

/// Splits a GLB container into its JSON chunk and optional BIN chunk.
fn split_glb(bytes: &[u8]) -> anyhow::Result<(&str, Option<&[u8]>)> {
    let read_u32 = |offset: usize| -> anyhow::Result<u32> {
        let word = bytes
            .get(offset..offset + 4)
            .ok_or_else(|| anyhow!("GLB file is truncated"))?;
        Ok(u32::from_le_bytes([word[0], word[1], word[2], word[3]]))
    };
    let version = read_u32(4)?;
    ensure!(version == 2, "unsupported GLB version {version}");
    let total_length = (read_u32(8)? as usize).min(bytes.len());

    let mut json = None;
    let mut bin = None;
    let mut offset = 12;
    while offset + 8 <= total_length {
        let chunk_length = read_u32(offset)? as usize;
        let chunk_type = read_u32(offset + 4)?;
        let chunk = bytes
            .get(offset + 8..offset + 8 + chunk_length)
            .ok_or_else(|| anyhow!("GLB chunk runs past the end of the file"))?;
        match chunk_type {
            GLB_CHUNK_JSON if json.is_none() => {
                let text = std::str::from_utf8(chunk).context("GLB JSON chunk is not valid UTF-8")?;
                json = Some(text);
            }
            GLB_CHUNK_BIN if bin.is_none() => bin = Some(chunk),
            _ => log::debug!("Ignoring GLB chunk of type {chunk_type:#x}"),
        }
        offset += 8 + chunk_length;
    }
    let json = json.ok_or_else(|| anyhow!("GLB file has no JSON chunk"))?;
    Ok((json, bin))
}

/// Builds a document from glTF JSON. `glb_bin` is the BIN chunk of a GLB
/// file, `read_uri` loads external buffers and images.
pub fn parse_gltf(
    json: &str,
    glb_bin: Option<&[u8]>,
    read_uri: &dyn Fn(&str) -> anyhow::Result<Vec<u8>>,
) -> anyhow::Result<Document> {
    let gltf: JsonValue = json
        .parse()
        .map_err(|err| anyhow!("invalid glTF JSON: {err}"))?;
    let gltf = as_object(&gltf, "glTF root")?;

    if let Some(required) = array(gltf, "extensionsRequired")?.first() {
        log::warn!("Document requires unsupported extensions, starting with {required:?}");
    }

    let mut buffers = Vec::new();
    for (i, buffer) in array(gltf, "buffers")?.iter().enumerate() {
        let buffer = as_object(buffer, "buffer")?;
        let byte_length = required_usize(buffer, "byteLength")?;
        let mut data = match opt_str(buffer, "uri")? {
            Some(uri) => read_uri(uri).with_context(|| format!("failed to load buffer {i}"))?,
            None if i == 0 => glb_bin
                .ok_or_else(|| anyhow!("buffer 0 has no uri and there is no GLB BIN chunk"))?
                .to_vec(),
            None => bail!("buffer {i} has no uri"),
        };
        ensure!(
            data.len() >= byte_length,
            "buffer {i} is {} bytes, expected {byte_length}",
            data.len(),
        );
        data.truncate(byte_length);
        buffers.push(Buffer { data });
    }

    let mut buffer_views = Vec::new();
    for buffer_view in array(gltf, "bufferViews")? {
        let buffer_view = as_object(buffer_view, "buffer view")?;
        let target = match opt_usize(buffer_view, "target")? {
            None => None,
            Some(34962) => Some(BufferTarget::ArrayBuffer),
            Some(34963) => Some(BufferTarget::ElementArrayBuffer),
            Some(target) => bail!("unexpected buffer view target {target}"),
        };
        buffer_views.push(BufferView {
            buffer: required_usize(buffer_view, "buffer")?,
            byte_offset: opt_usize(buffer_view, "byteOffset")?.unwrap_or(0),
            byte_length: required_usize(buffer_view, "byteLength")?,
            byte_stride: opt_usize(buffer_view, "byteStride")?.unwrap_or(0),
            target,
        });
    }

    let mut accessors = Vec::new();
    for (i, accessor) in array(gltf, "accessors")?.iter().enumerate() {
        let accessor = as_object(accessor, "accessor")?;
        if accessor.contains_key("sparse") {
            bail!("accessor {i} is sparse, which is not supported");
        }
        let buffer_view = opt_usize(accessor, "bufferView")?
            .ok_or_else(|| anyhow!("accessor {i} has no buffer view, which is not supported"))?;
        let component_type = required_usize(accessor, "componentType")?;
        let component_type = ComponentType::from_gltf(component_type)
            .ok_or_else(|| anyhow!("accessor {i} has unknown component type {component_type}"))?;
        let accessor_type = required_str(accessor, "type")?;
        let accessor_type = AccessorType::from_gltf(accessor_type)
            .ok_or_else(|| anyhow!("accessor {i} has unknown type \"{accessor_type}\""))?;
        accessors.push(Accessor {
            buffer_view,
            byte_offset: opt_usize(accessor, "byteOffset")?.unwrap_or(0),
            component_type,
            normalized: opt_bool(accessor, "normalized")?.unwrap_or(false),
            count: required_usize(accessor, "count")?,
            accessor_type,
            min: opt_f32_array(accessor, "min")?,
            max: opt_f32_array(accessor, "max")?,
        });
    }

    let mut meshes = Vec::new();
    for mesh in array(gltf, "meshes")? {
        let mesh = as_object(mesh, "mesh")?;
        let mut primitives = Vec::new();
        for primitive in array(mesh, "primitives")? {
            let primitive = as_object(primitive, "primitive")?;
            let mode = opt_usize(primitive, "mode")?.unwrap_or(Mode::Triangles as usize);
            let mode =
                Mode::from_gltf(mode).ok_or_else(|| anyhow!("unknown primitive mode {mode}"))?;
            let mut attributes = Vec::new();
            if let Some(attribute_accessors) = opt_object(primitive, "attributes")? {
                for (semantic, accessor) in attribute_accessors {
                    attributes.push((semantic.clone(), take_usize(accessor, semantic)?));
                }
            }
            attributes.sort();
            primitives.push(Primitive {
                mode,
                attributes,
                indices: opt_usize(primitive, "indices")?,
                material: opt_usize(primitive, "material")?,
            });
        }
        meshes.push(Mesh { primitives });
    }

    let mut materials = Vec::new();
    for material in array(gltf, "materials")? {
        materials.push(parse_material(as_object(material, "material")?)?);
    }

    let mut samplers = Vec::new();
    for sampler in array(gltf, "samplers")? {
        let sampler = as_object(sampler, "sampler")?;
        let filter = |key: &str| -> anyhow::Result<Option<Filter>> {
            match opt_usize(sampler, key)? {
                None => Ok(None),
                Some(value) => Filter::from_gltf(value)
                    .map(Some)
                    .ok_or_else(|| anyhow!("unknown texture filter {value}")),
            }
        };
        let wrap = |key: &str| -> anyhow::Result<WrapMode> {
            match opt_usize(sampler, key)? {
                None => Ok(WrapMode::Repeat),
                Some(value) => {
                    WrapMode::from_gltf(value).ok_or_else(|| anyhow!("unknown wrap mode {value}"))
                }
            }
        };
        samplers.push(Sampler {
            min_filter: filter("minFilter")?,
            mag_filter: filter("magFilter")?,
            wrap_s: wrap("wrapS")?,
            wrap_t: wrap("wrapT")?,
            wrap_r: WrapMode::Repeat,
        });
    }

    let mut textures = Vec::new();
    for texture in array(gltf, "textures")? {
        let texture = as_object(texture, "texture")?;
        textures.push(Texture {
            source: opt_usize(texture, "source")?,
            sampler: opt_usize(texture, "sampler")?,
        });
    }

    let mut images = Vec::new();
    for (i, image) in array(gltf, "images")?.iter().enumerate() {
        let image = as_object(image, "image")?;
        let encoded = if let Some(uri) = opt_str(image, "uri")? {
            read_uri(uri)
        } else if let Some(view) = opt_usize(image, "bufferView")? {
            buffer_view_bytes(&buffers, &buffer_views, view).map(<[u8]>::to_vec)
        } else {
            Err(anyhow!("image has neither uri nor buffer view"))
        };
        let decoded = encoded.and_then(|bytes| {
            let rgba = image::load_from_memory(&bytes)?.into_rgba8();
            Ok(Image {
                width: rgba.width(),
                height: rgba.height(),
                pixels: rgba.into_raw(),
            })
        });
        match decoded {
            Ok(image) => images.push(image),
            Err(err) => {
                log::warn!("Could not load image {i}, using white instead: {err:#}");
                images.push(Image {
                    width: 1,
                    height: 1,
                    pixels: vec![255; 4],
                });
            }
        }
    }

    let mut nodes = Vec::new();
    for node in array(gltf, "nodes")? {
        let node = as_object(node, "node")?;
        let children = array(node, "children")?
            .iter()
            .map(|child| take_usize(child, "node child"))
            .collect::<anyhow::Result<Vec<_>>>()?;
        let transform = if let Some(matrix) = opt_f32_array(node, "matrix")? {
            ensure!(matrix.len() == 16, "node matrix has {} values", matrix.len());
            Transform::Matrix(Mat4::from_cols_slice(&matrix))
        } else {
            Transform::Trs {
                translation: opt_vec3(node, "translation")?.unwrap_or(Vec3::ZERO),
                rotation: match opt_f32_array(node, "rotation")? {
                    Some(q) if q.len() == 4 => Quat::from_xyzw(q[0], q[1], q[2], q[3]),
                    Some(q) => bail!("node rotation has {} values", q.len()),
                    None => Quat::IDENTITY,
                },
                scale: opt_vec3(node, "scale")?.unwrap_or(Vec3::ONE),
            }
        };
        nodes.push(Node {
            mesh: opt_usize(node, "mesh")?,
            children,
            transform,
        });
    }

    let mut scenes = Vec::new();
    for scene in array(gltf, "scenes")? {
        let scene = as_object(scene, "scene")?;
        let nodes = array(scene, "nodes")?
            .iter()
            .map(|node| take_usize(node, "scene node"))
            .collect::<anyhow::Result<Vec<_>>>()?;
        scenes.push(Scene { nodes });
    }

    let default_scene = opt_usize(gltf, "scene")?;
    if default_scene.is_none() {
        log::warn!("Document has no default scene, nothing will be drawn");
    }

    let document = Document {
        buffers,
        buffer_views,
        accessors,
        meshes,
        materials,
        textures,
        images,
        samplers,
        nodes,
        scenes,
        default_scene,
    };
    validate_references(&document)?;
    Ok(document)
}

fn parse_material(material: &Object) -> anyhow::Result<Material> {
    let defaults = Material::default();
    let pbr = opt_object(material, "pbrMetallicRoughness")?;
    let pbr_f32 = |key: &str, default: f32| -> anyhow::Result<f32> {
        Ok(match pbr {
            Some(pbr) => opt_f32(pbr, key)?.unwrap_or(default),
            None => default,
        })
    };
    let pbr_texture = |key: &str| -> anyhow::Result<Option<TextureInfo>> {
        match pbr {
            Some(pbr) => texture_info(pbr, key),
            None => Ok(None),
        }
    };
    let base_color_factor = match pbr.map(|pbr| opt_f32_array(pbr, "baseColorFactor")) {
        Some(Ok(Some(factor))) if factor.len() == 4 => Vec4::from_slice(&factor),
        Some(Ok(Some(factor))) => bail!("baseColorFactor has {} values", factor.len()),
        Some(Err(err)) => return Err(err),
        Some(Ok(None)) | None => defaults.base_color_factor,
    };
    Ok(Material {
        base_color_factor,
        base_color_texture: pbr_texture("baseColorTexture")?,
        metallic_factor: pbr_f32("metallicFactor", defaults.metallic_factor)?,
        roughness_factor: pbr_f32("roughnessFactor", defaults.roughness_factor)?,
        metallic_roughness_texture: pbr_texture("metallicRoughnessTexture")?,
        emissive_factor: opt_vec3(material, "emissiveFactor")?.unwrap_or(defaults.emissive_factor),
        emissive_texture: texture_info(material, "emissiveTexture")?,
        occlusion_strength: match opt_object(material, "occlusionTexture")? {
            Some(occlusion) => {
                opt_f32(occlusion, "strength")?.unwrap_or(defaults.occlusion_strength)
            }
            None => defaults.occlusion_strength,
        },
        occlusion_texture: texture_info(material, "occlusionTexture")?,
        normal_scale: match opt_object(material, "normalTexture")? {
            Some(normal) => opt_f32(normal, "scale")?.unwrap_or(defaults.normal_scale),
            None => defaults.normal_scale,
        },
        normal_texture: texture_info(material, "normalTexture")?,
    })
}

fn texture_info(object: &Object, key: &str) -> anyhow::Result<Option<TextureInfo>> {
    let Some(info) = opt_object(object, key)? else {
        return Ok(None);
    };
    Ok(Some(TextureInfo {
        index: required_usize(info, "index")?,
        tex_coord: opt_usize(info, "texCoord")?.unwrap_or(0) as u32,
    }))
}

fn buffer_view_bytes<'a>(
    buffers: &'a [Buffer],
    buffer_views: &[BufferView],
    view: usize,
) -> anyhow::Result<&'a [u8]> {
    let view = buffer_views
        .get(view)
        .ok_or_else(|| anyhow!("buffer view {view} does not exist"))?;
    buffers
        .get(view.buffer)
        .and_then(|buffer| buffer.data.get(view.byte_offset..view.byte_offset + view.byte_length))
        .ok_or_else(|| anyhow!("buffer view is out of bounds of buffer {}", view.buffer))
}

/// Makes sure every index in the document points at something.
fn validate_references(document: &Document) -> anyhow::Result<()> {
    let check = |index: usize, len: usize, what: &str| -> anyhow::Result<()> {
        ensure!(index < len, "{what} index {index} is out of range (there are {len})");
        Ok(())
    };
    for view in &document.buffer_views {
        check(view.buffer, document.buffers.len(), "buffer")?;
        let buffer_len = document.buffers[view.buffer].data.len();
        ensure!(
            view.byte_offset + view.byte_length <= buffer_len,
            "buffer view runs past the end of buffer {}",
            view.buffer,
        );
    }
    for accessor in &document.accessors {
        check(accessor.buffer_view, document.buffer_views.len(), "buffer view")?;
    }
    for mesh in &document.meshes {
        for primitive in &mesh.primitives {
            for &(_, accessor) in &primitive.attributes {
                check(accessor, document.accessors.len(), "accessor")?;
            }
            if let Some(indices) = primitive.indices {
                check(indices, document.accessors.len(), "accessor")?;
            }
            if let Some(material) = primitive.material {
                check(material, document.materials.len(), "material")?;
            }
        }
    }
    for material in &document.materials {
        for info in [
            material.base_color_texture,
            material.metallic_roughness_texture,
            material.emissive_texture,
            material.occlusion_texture,
            material.normal_texture,
        ]
        .into_iter()
        .flatten()
        {
            check(info.index, document.textures.len(), "texture")?;
        }
    }
    for texture in &document.textures {
        if let Some(source) = texture.source {
            check(source, document.images.len(), "image")?;
        }
        if let Some(sampler) = texture.sampler {
            check(sampler, document.samplers.len(), "sampler")?;
        }
    }
    for node in &document.nodes {
        if let Some(mesh) = node.mesh {
            check(mesh, document.meshes.len(), "mesh")?;
        }
        for &child in &node.children {
            check(child, document.nodes.len(), "node")?;
        }
    }
    for scene in &document.scenes {
        for &node in &scene.nodes {
            check(node, document.nodes.len(), "node")?;
        }
    }
    if let Some(scene) = document.default_scene {
        check(scene, document.scenes.len(), "scene")?;
    }
    Ok(())
}

fn as_object<'a>(value: &'a JsonValue, what: &str) -> anyhow::Result<&'a Object> {
    value
        .get::<Object>()
        .ok_or_else(|| anyhow!("{what} is not a JSON object"))
}

/// Returns the array under `key`, or an empty slice if there is none.
fn array<'a>(object: &'a Object, key: &str) -> anyhow::Result<&'a [JsonValue]> {
    match object.get(key) {
        None => Ok(&[]),
        Some(value) => value
            .get::<Vec<JsonValue>>()
            .map(Vec::as_slice)
            .ok_or_else(|| anyhow!("\"{key}\" is not an array")),
    }
}

fn take_usize(value: &JsonValue, what: &str) -> anyhow::Result<usize> {
    match value.get::<f64>() {
        Some(&number) if number >= 0.0 && number.fract() == 0.0 => Ok(number as usize),
        _ => bail!("{what} is not a non-negative integer"),
    }
}

fn opt_usize(object: &Object, key: &str) -> anyhow::Result<Option<usize>> {
    object.get(key).map(|value| take_usize(value, key)).transpose()
}

fn required_usize(object: &Object, key: &str) -> anyhow::Result<usize> {
    opt_usize(object, key)?.ok_or_else(|| anyhow!("missing \"{key}\""))
}

fn opt_f32(object: &Object, key: &str) -> anyhow::Result<Option<f32>> {
    match object.get(key) {
        None => Ok(None),
        Some(value) => match value.get::<f64>() {
            Some(&number) => Ok(Some(number as f32)),
            None => bail!("\"{key}\" is not a number"),
        },
    }
}

fn opt_bool(object: &Object, key: &str) -> anyhow::Result<Option<bool>> {
    match object.get(key) {
        None => Ok(None),
        Some(value) => match value.get::<bool>() {
            Some(&boolean) => Ok(Some(boolean)),
            None => bail!("\"{key}\" is not a boolean"),
        },
    }
}

fn opt_str<'a>(object: &'a Object, key: &str) -> anyhow::Result<Option<&'a str>> {
    match object.get(key) {
        None => Ok(None),
        Some(value) => match value.get::<String>() {
            Some(string) => Ok(Some(string.as_str())),
            None => bail!("\"{key}\" is not a string"),
        },
    }
}

fn required_str<'a>(object: &'a Object, key: &str) -> anyhow::Result<&'a str> {
    opt_str(object, key)?.ok_or_else(|| anyhow!("missing \"{key}\""))
}

fn opt_object<'a>(object: &'a Object, key: &str) -> anyhow::Result<Option<&'a Object>> {
    object.get(key).map(|value| as_object(value, key)).transpose()
}

fn opt_f32_array(object: &Object, key: &str) -> anyhow::Result<Option<Vec<f32>>> {
    let values = match object.get(key) {
        None => return Ok(None),
        Some(value) => value
            .get::<Vec<JsonValue>>()
            .ok_or_else(|| anyhow!("\"{key}\" is not an array"))?,
    };
    values
        .iter()
        .map(|value| match value.get::<f64>() {
            Some(&number) => Ok(number as f32),
            None => bail!("\"{key}\" contains a non-number"),
        })
        .collect::<anyhow::Result<Vec<_>>>()
        .map(Some)
}

fn opt_vec3(object: &Object, key: &str) -> anyhow::Result<Option<Vec3>> {
    match opt_f32_array(object, key)? {
        None => Ok(None),
        Some(values) if values.len() == 3 => Ok(Some(Vec3::from_slice(&values))),
        Some(values) => bail!("\"{key}\" has {} values, expected 3", values.len()),
    }
}
