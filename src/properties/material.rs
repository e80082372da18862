//! Metallic-roughness materials.

use super::{attr_bool, attr_f64, attr_floats, attr_str, Texture, TextureInfo};
use crate::document::Document;
use crate::graph::{channel, ColorSpace, EdgeAttributes};
use crate::util::Result;

property_handle! {
    /// PBR metallic-roughness material.
    Material => Material
}

/// How alpha is interpreted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AlphaMode {
    #[default]
    Opaque,
    Mask,
    Blend,
}

impl AlphaMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Opaque => "OPAQUE",
            Self::Mask => "MASK",
            Self::Blend => "BLEND",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "OPAQUE" => Some(Self::Opaque),
            "MASK" => Some(Self::Mask),
            "BLEND" => Some(Self::Blend),
            _ => None,
        }
    }
}

/// Texture slots of a core material.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextureSlot {
    BaseColor,
    Emissive,
    Normal,
    Occlusion,
    MetallicRoughness,
}

impl TextureSlot {
    pub const ALL: [TextureSlot; 5] = [
        Self::BaseColor,
        Self::Emissive,
        Self::Normal,
        Self::Occlusion,
        Self::MetallicRoughness,
    ];

    /// Reference slot holding the texture; also the glTF property name.
    pub const fn texture_attr(self) -> &'static str {
        match self {
            Self::BaseColor => "baseColorTexture",
            Self::Emissive => "emissiveTexture",
            Self::Normal => "normalTexture",
            Self::Occlusion => "occlusionTexture",
            Self::MetallicRoughness => "metallicRoughnessTexture",
        }
    }

    /// Reference slot holding the owned [`TextureInfo`].
    pub const fn info_attr(self) -> &'static str {
        match self {
            Self::BaseColor => "baseColorTextureInfo",
            Self::Emissive => "emissiveTextureInfo",
            Self::Normal => "normalTextureInfo",
            Self::Occlusion => "occlusionTextureInfo",
            Self::MetallicRoughness => "metallicRoughnessTextureInfo",
        }
    }

    /// Channels read from the texture in this slot.
    pub const fn channels(self) -> u8 {
        match self {
            Self::BaseColor => channel::RGBA,
            Self::Emissive | Self::Normal => channel::RGB,
            Self::Occlusion => channel::R,
            Self::MetallicRoughness => channel::G | channel::B,
        }
    }

    pub const fn color_space(self) -> ColorSpace {
        match self {
            Self::BaseColor | Self::Emissive => ColorSpace::Srgb,
            _ => ColorSpace::Linear,
        }
    }

    /// Whether the slot lives under `pbrMetallicRoughness` in JSON.
    pub const fn is_pbr(self) -> bool {
        matches!(self, Self::BaseColor | Self::MetallicRoughness)
    }
}

macro_rules! scalar_attr {
    ($get:ident, $set:ident, $key:literal, $default:expr) => {
        pub fn $get(self, doc: &Document) -> f64 {
            attr_f64(doc, self.0, $key, $default)
        }

        pub fn $set(self, doc: &mut Document, value: f64) -> Result<Self> {
            doc.graph_mut().set_attr(self.0, $key, value)?;
            Ok(self)
        }
    };
}

impl Material {
    pub fn alpha_mode(self, doc: &Document) -> AlphaMode {
        attr_str(doc, self.0, "alphaMode")
            .and_then(AlphaMode::parse)
            .unwrap_or_default()
    }

    pub fn set_alpha_mode(self, doc: &mut Document, mode: AlphaMode) -> Result<Self> {
        doc.graph_mut().set_attr(self.0, "alphaMode", mode.as_str())?;
        Ok(self)
    }

    scalar_attr!(alpha_cutoff, set_alpha_cutoff, "alphaCutoff", 0.5);
    scalar_attr!(metallic_factor, set_metallic_factor, "metallicFactor", 1.0);
    scalar_attr!(roughness_factor, set_roughness_factor, "roughnessFactor", 1.0);
    scalar_attr!(normal_scale, set_normal_scale, "normalScale", 1.0);
    scalar_attr!(occlusion_strength, set_occlusion_strength, "occlusionStrength", 1.0);

    pub fn double_sided(self, doc: &Document) -> bool {
        attr_bool(doc, self.0, "doubleSided", false)
    }

    pub fn set_double_sided(self, doc: &mut Document, double_sided: bool) -> Result<Self> {
        doc.graph_mut().set_attr(self.0, "doubleSided", double_sided)?;
        Ok(self)
    }

    /// Linear RGBA multiplier.
    pub fn base_color_factor(self, doc: &Document) -> [f64; 4] {
        attr_floats(doc, self.0, "baseColorFactor", [1.0; 4])
    }

    pub fn set_base_color_factor(self, doc: &mut Document, factor: [f64; 4]) -> Result<Self> {
        doc.graph_mut().set_attr(self.0, "baseColorFactor", factor)?;
        Ok(self)
    }

    pub fn emissive_factor(self, doc: &Document) -> [f64; 3] {
        attr_floats(doc, self.0, "emissiveFactor", [0.0; 3])
    }

    pub fn set_emissive_factor(self, doc: &mut Document, factor: [f64; 3]) -> Result<Self> {
        doc.graph_mut().set_attr(self.0, "emissiveFactor", factor)?;
        Ok(self)
    }

    pub fn texture(self, doc: &Document, slot: TextureSlot) -> Option<Texture> {
        doc.graph().get_ref(self.0, slot.texture_attr()).map(Texture)
    }

    /// Assign a texture to `slot`. The edge records the channels the
    /// slot reads and its color space.
    pub fn set_texture(self, doc: &mut Document, slot: TextureSlot, texture: Option<Texture>) -> Result<Self> {
        doc.graph_mut().set_ref(
            self.0,
            slot.texture_attr(),
            texture.map(Texture::id),
            EdgeAttributes::texture(slot.channels(), slot.color_space()),
        )?;
        Ok(self)
    }

    /// Sampling parameters of `slot`.
    pub fn texture_info(self, doc: &Document, slot: TextureSlot) -> Option<TextureInfo> {
        doc.graph().get_ref(self.0, slot.info_attr()).map(TextureInfo)
    }

    /// Textures used by any slot, in slot order, without repeats.
    pub fn list_textures(self, doc: &Document) -> Vec<Texture> {
        let mut out: Vec<Texture> = Vec::new();
        for slot in TextureSlot::ALL {
            if let Some(t) = self.texture(doc, slot) {
                if !out.contains(&t) {
                    out.push(t);
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_creates_texture_infos() {
        let mut doc = Document::new();
        let mat = doc.create_material("m");
        for slot in TextureSlot::ALL {
            assert!(mat.texture_info(&doc, slot).is_some());
        }
    }

    #[test]
    fn test_texture_edges_carry_channels() {
        let mut doc = Document::new();
        let mat = doc.create_material("m");
        let tex = doc.create_texture("t");
        mat.set_texture(&mut doc, TextureSlot::Occlusion, Some(tex)).unwrap();
        let edge = doc.graph().ref_edge(mat.id(), "occlusionTexture").unwrap();
        assert_eq!(edge.attributes().channels, Some(channel::R));
        assert_eq!(edge.attributes().color_space, Some(ColorSpace::Linear));
    }

    #[test]
    fn test_dispose_takes_texture_infos() {
        let mut doc = Document::new();
        let mat = doc.create_material("m");
        let info = mat.texture_info(&doc, TextureSlot::BaseColor).unwrap();
        mat.dispose(&mut doc).unwrap();
        assert!(info.is_disposed(&doc));
    }

    #[test]
    fn test_clone_gets_own_texture_infos() {
        let mut doc = Document::new();
        let mat = doc.create_material("m");
        let tex = doc.create_texture("t");
        mat.set_texture(&mut doc, TextureSlot::BaseColor, Some(tex)).unwrap();
        let copy = mat.clone_in(&mut doc).unwrap();
        assert_eq!(copy.texture(&doc, TextureSlot::BaseColor), Some(tex));
        assert_ne!(
            copy.texture_info(&doc, TextureSlot::BaseColor),
            mat.texture_info(&doc, TextureSlot::BaseColor)
        );
        assert!(mat.equals(&doc, copy));
    }
}
