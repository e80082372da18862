//! `KHR_materials_unlit`: constant shading.

use serde_json::json;

use super::{Extension, ExtensionType};
use crate::document::Document;
use crate::io::{ReaderContext, WriterContext};
use crate::properties::extension_handle;
use crate::property::{ExtensionMeta, PropertyType};
use crate::util::Result;

pub const NAME: &str = "KHR_materials_unlit";

const META: ExtensionMeta = ExtensionMeta {
    extension_name: NAME,
    parent_types: &[PropertyType::Material],
};

extension_handle! {
    /// Marks a material as unlit. Carries no data.
    Unlit
}

/// The `KHR_materials_unlit` extension.
#[derive(Debug, Default)]
pub struct MaterialsUnlit;

impl ExtensionType for MaterialsUnlit {
    const NAME: &'static str = NAME;

    fn create() -> Self {
        Self
    }
}

impl MaterialsUnlit {
    pub fn create_unlit(&self, doc: &mut Document) -> Unlit {
        Unlit(doc.create_extension_property(META, "Unlit"))
    }
}

impl Extension for MaterialsUnlit {
    fn name(&self) -> &'static str {
        NAME
    }

    fn read(&self, ctx: &mut ReaderContext<'_>, doc: &mut Document) -> Result<()> {
        let json = ctx.json;
        for (index, def) in json.materials.iter().enumerate() {
            if !def.extensions.contains_key(NAME) {
                continue;
            }
            let unlit = self.create_unlit(doc);
            ctx.materials[index].set_extension(doc, NAME, Some(unlit.id()))?;
        }
        Ok(())
    }

    fn write(&self, ctx: &mut WriterContext, doc: &Document) -> Result<()> {
        for material in doc.root().list_materials(doc) {
            if material.get_extension(doc, NAME).is_none() {
                continue;
            }
            if let Some(extensions) = ctx.extensions_mut_for(material) {
                extensions.insert(NAME.to_string(), json!({}));
            }
        }
        Ok(())
    }
}
