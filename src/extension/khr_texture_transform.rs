//! `KHR_texture_transform`: UV offset, rotation and scale per texture
//! reference.

use serde::{Deserialize, Serialize};

use super::{Extension, ExtensionType};
use crate::document::Document;
use crate::io::{ReaderContext, WriterContext};
use crate::properties::{attr_floats, extension_handle, ExtensionProperty, TextureSlot};
use crate::property::{ExtensionMeta, Literal, PropertyType};
use crate::util::Result;

pub const NAME: &str = "KHR_texture_transform";

const META: ExtensionMeta = ExtensionMeta {
    extension_name: NAME,
    parent_types: &[PropertyType::TextureInfo],
};

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransformDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    offset: Option<[f64; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    rotation: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    scale: Option<[f64; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tex_coord: Option<u32>,
}

extension_handle! {
    /// UV transform applied to one material texture slot.
    TextureTransform
}

impl TextureTransform {
    pub fn offset(self, doc: &Document) -> [f64; 2] {
        attr_floats(doc, self.id(), "offset", [0.0, 0.0])
    }

    pub fn set_offset(self, doc: &mut Document, offset: [f64; 2]) -> Result<Self> {
        self.0.set(doc, "offset", offset)?;
        Ok(self)
    }

    /// Rotation in radians, counter-clockwise.
    pub fn rotation(self, doc: &Document) -> f64 {
        self.0.get(doc, "rotation").and_then(Literal::as_f64).unwrap_or(0.0)
    }

    pub fn set_rotation(self, doc: &mut Document, rotation: f64) -> Result<Self> {
        self.0.set(doc, "rotation", rotation)?;
        Ok(self)
    }

    pub fn scale(self, doc: &Document) -> [f64; 2] {
        attr_floats(doc, self.id(), "scale", [1.0, 1.0])
    }

    pub fn set_scale(self, doc: &mut Document, scale: [f64; 2]) -> Result<Self> {
        self.0.set(doc, "scale", scale)?;
        Ok(self)
    }

    /// UV set overriding the texture info's own, if any.
    pub fn tex_coord(self, doc: &Document) -> Option<u32> {
        self.0
            .get(doc, "texCoord")
            .and_then(Literal::as_i64)
            .and_then(|v| u32::try_from(v).ok())
    }

    pub fn set_tex_coord(self, doc: &mut Document, tex_coord: Option<u32>) -> Result<Self> {
        match tex_coord {
            Some(t) => self.0.set(doc, "texCoord", t)?,
            None => self.0.set(doc, "texCoord", Literal::Null)?,
        };
        Ok(self)
    }

    fn to_def(self, doc: &Document) -> TransformDef {
        let offset = self.offset(doc);
        let rotation = self.rotation(doc);
        let scale = self.scale(doc);
        TransformDef {
            offset: (offset != [0.0, 0.0]).then_some(offset),
            rotation: (rotation != 0.0).then_some(rotation),
            scale: (scale != [1.0, 1.0]).then_some(scale),
            tex_coord: self.tex_coord(doc),
        }
    }
}

/// The `KHR_texture_transform` extension.
#[derive(Debug, Default)]
pub struct TextureTransformExtension;

impl ExtensionType for TextureTransformExtension {
    const NAME: &'static str = NAME;

    fn create() -> Self {
        Self
    }
}

impl TextureTransformExtension {
    pub fn create_texture_transform(&self, doc: &mut Document) -> TextureTransform {
        TextureTransform(doc.create_extension_property(META, "TextureTransform"))
    }
}

impl Extension for TextureTransformExtension {
    fn name(&self) -> &'static str {
        NAME
    }

    fn read(&self, ctx: &mut ReaderContext<'_>, doc: &mut Document) -> Result<()> {
        let found: Vec<_> = ctx
            .texture_infos
            .iter()
            .filter_map(|(info, def)| def.extensions.get(NAME).map(|v| (*info, v.clone())))
            .collect();
        for (info, value) in found {
            let def: TransformDef = match serde_json::from_value(value) {
                Ok(def) => def,
                Err(err) => {
                    ctx.logger().warn(&format!("{}: skipping malformed transform: {}", NAME, err));
                    continue;
                }
            };
            let transform = self.create_texture_transform(doc);
            if let Some(offset) = def.offset {
                transform.set_offset(doc, offset)?;
            }
            if let Some(rotation) = def.rotation {
                transform.set_rotation(doc, rotation)?;
            }
            if let Some(scale) = def.scale {
                transform.set_scale(doc, scale)?;
            }
            transform.set_tex_coord(doc, def.tex_coord)?;
            info.set_extension(doc, NAME, Some(transform.id()))?;
        }
        Ok(())
    }

    fn write(&self, ctx: &mut WriterContext, doc: &Document) -> Result<()> {
        for material in doc.root().list_materials(doc) {
            for slot in TextureSlot::ALL {
                let Some(info) = material.texture_info(doc, slot) else {
                    continue;
                };
                let Some(id) = info.get_extension(doc, NAME) else {
                    continue;
                };
                let value = serde_json::to_value(TextureTransform(ExtensionProperty(id)).to_def(doc))?;
                if let Some(def) = ctx.texture_info_def_mut(info) {
                    def.extensions.insert(NAME.to_string(), value);
                }
            }
        }
        Ok(())
    }
}
