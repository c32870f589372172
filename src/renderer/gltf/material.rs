use glam::{Vec3, Vec4};

use crate::renderer::device::{Device, TextureHandle, Uniform, UniformValue};
use crate::renderer::gltf::program::{
    TEXTURE_UNIT_BASE_COLOR, TEXTURE_UNIT_EMISSIVE, TEXTURE_UNIT_METALLIC_ROUGHNESS,
    TEXTURE_UNIT_NORMAL, TEXTURE_UNIT_OCCLUSION,
};
use crate::renderer::gltf::resources::GpuResources;
use crate::renderer::gltf::{Document, TextureInfo};

/// Which material channels are allowed to use the material's values. A
/// disabled channel renders as if the material didn't specify it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaterialChannels {
    pub base_color: bool,
    pub metallic_roughness: bool,
    pub emissive: bool,
    pub occlusion: bool,
    pub normal_map: bool,
}

impl Default for MaterialChannels {
    fn default() -> MaterialChannels {
        MaterialChannels {
            base_color: true,
            metallic_roughness: true,
            emissive: true,
            occlusion: true,
            normal_map: true,
        }
    }
}

/// The concrete textures and factors one primitive is drawn with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialBinding {
    pub base_color_texture: TextureHandle,
    pub base_color_factor: Vec4,
    pub metallic_roughness_texture: Option<TextureHandle>,
    pub metallic_factor: f32,
    pub roughness_factor: f32,
    pub emissive_texture: Option<TextureHandle>,
    pub emissive_factor: Vec3,
    pub occlusion_texture: Option<TextureHandle>,
    pub occlusion_strength: f32,
    pub normal_texture: Option<TextureHandle>,
    pub normal_scale: f32,
}

impl MaterialBinding {
    pub fn default_for(resources: &GpuResources) -> MaterialBinding {
        MaterialBinding {
            base_color_texture: resources.white_texture,
            base_color_factor: Vec4::ONE,
            metallic_roughness_texture: None,
            metallic_factor: 1.0,
            roughness_factor: 1.0,
            emissive_texture: None,
            emissive_factor: Vec3::ZERO,
            occlusion_texture: None,
            occlusion_strength: 1.0,
            normal_texture: None,
            normal_scale: 1.0,
        }
    }

    pub fn has_normal_map(&self) -> bool {
        self.normal_texture.is_some()
    }
}

pub fn resolve_material(
    document: &Document,
    resources: &GpuResources,
    material: Option<usize>,
    channels: &MaterialChannels,
) -> MaterialBinding {
    let mut binding = MaterialBinding::default_for(resources);
    let Some(material) = material.map(|index| &document.materials[index]) else {
        return binding;
    };
    let texture = |info: Option<TextureInfo>| info.map(|info| resources.textures[info.index]);

    if channels.base_color {
        binding.base_color_factor = material.base_color_factor;
        if let Some(texture) = texture(material.base_color_texture) {
            binding.base_color_texture = texture;
        }
    }
    if channels.metallic_roughness {
        binding.metallic_factor = material.metallic_factor;
        binding.roughness_factor = material.roughness_factor;
        binding.metallic_roughness_texture = texture(material.metallic_roughness_texture);
    }
    if channels.emissive {
        binding.emissive_factor = material.emissive_factor;
        binding.emissive_texture = texture(material.emissive_texture);
    }
    if channels.occlusion {
        binding.occlusion_strength = material.occlusion_strength;
        binding.occlusion_texture = texture(material.occlusion_texture);
    }
    if channels.normal_map {
        binding.normal_scale = material.normal_scale;
        binding.normal_texture = texture(material.normal_texture);
    }
    binding
}

/// Texture references that sample a texture coordinate set other than
/// TEXCOORD_0, as (material index, set) pairs. Those are drawn with
/// TEXCOORD_0 instead.
pub fn unsupported_tex_coords(document: &Document) -> Vec<(usize, u32)> {
    let mut unsupported = Vec::new();
    for (index, material) in document.materials.iter().enumerate() {
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
            if info.tex_coord != 0 {
                unsupported.push((index, info.tex_coord));
            }
        }
    }
    unsupported
}

/// Binds the textures and sets the uniforms for drawing with `material`, or
/// with the defaults if there is no material.
pub fn bind_material(
    device: &mut impl Device,
    document: &Document,
    resources: &GpuResources,
    material: Option<usize>,
    channels: &MaterialChannels,
) {
    let binding = resolve_material(document, resources, material, channels);

    device.bind_texture(TEXTURE_UNIT_BASE_COLOR, Some(binding.base_color_texture));
    device.set_uniform(
        Uniform::BaseColorFactor,
        UniformValue::Vec4(binding.base_color_factor),
    );

    device.bind_texture(
        TEXTURE_UNIT_METALLIC_ROUGHNESS,
        binding.metallic_roughness_texture,
    );
    device.set_uniform(
        Uniform::MetallicFactor,
        UniformValue::Float(binding.metallic_factor),
    );
    device.set_uniform(
        Uniform::RoughnessFactor,
        UniformValue::Float(binding.roughness_factor),
    );
    device.set_uniform(
        Uniform::HasMetallicRoughnessTexture,
        UniformValue::Bool(binding.metallic_roughness_texture.is_some()),
    );

    device.bind_texture(TEXTURE_UNIT_EMISSIVE, binding.emissive_texture);
    device.set_uniform(
        Uniform::EmissiveFactor,
        UniformValue::Vec3(binding.emissive_factor),
    );
    device.set_uniform(
        Uniform::HasEmissiveTexture,
        UniformValue::Bool(binding.emissive_texture.is_some()),
    );

    device.bind_texture(TEXTURE_UNIT_OCCLUSION, binding.occlusion_texture);
    device.set_uniform(
        Uniform::OcclusionStrength,
        UniformValue::Float(binding.occlusion_strength),
    );
    device.set_uniform(
        Uniform::HasOcclusionTexture,
        UniformValue::Bool(binding.occlusion_texture.is_some()),
    );

    device.bind_texture(TEXTURE_UNIT_NORMAL, binding.normal_texture);
    device.set_uniform(Uniform::NormalScale, UniformValue::Float(binding.normal_scale));
    device.set_uniform(
        Uniform::HasNormalMap,
        UniformValue::Bool(binding.has_normal_map()),
    );
}
