//! `KHR_materials_emissive_strength`: emissive intensity beyond 1.0.

use serde_json::json;

use super::{Extension, ExtensionType};
use crate::document::Document;
use crate::io::{ReaderContext, WriterContext};
use crate::properties::extension_handle;
use crate::property::{ExtensionMeta, Literal, PropertyType};
use crate::util::Result;

pub const NAME: &str = "KHR_materials_emissive_strength";

const META: ExtensionMeta = ExtensionMeta {
    extension_name: NAME,
    parent_types: &[PropertyType::Material],
};

extension_handle! {
    /// Scalar multiplier on a material's emissive factor.
    EmissiveStrength
}

impl EmissiveStrength {
    pub fn emissive_strength(self, doc: &Document) -> f64 {
        self.0
            .get(doc, "emissiveStrength")
            .and_then(Literal::as_f64)
            .unwrap_or(1.0)
    }

    pub fn set_emissive_strength(self, doc: &mut Document, strength: f64) -> Result<Self> {
        self.0.set(doc, "emissiveStrength", strength)?;
        Ok(self)
    }
}

/// The `KHR_materials_emissive_strength` extension.
#[derive(Debug, Default)]
pub struct MaterialsEmissiveStrength;

impl ExtensionType for MaterialsEmissiveStrength {
    const NAME: &'static str = NAME;

    fn create() -> Self {
        Self
    }
}

impl MaterialsEmissiveStrength {
    pub fn create_emissive_strength(&self, doc: &mut Document) -> EmissiveStrength {
        EmissiveStrength(doc.create_extension_property(META, "EmissiveStrength"))
    }
}

impl Extension for MaterialsEmissiveStrength {
    fn name(&self) -> &'static str {
        NAME
    }

    fn read(&self, ctx: &mut ReaderContext<'_>, doc: &mut Document) -> Result<()> {
        let json = ctx.json;
        for (index, def) in json.materials.iter().enumerate() {
            let Some(value) = def.extensions.get(NAME) else {
                continue;
            };
            let strength = self.create_emissive_strength(doc);
            if let Some(s) = value.get("emissiveStrength").and_then(|v| v.as_f64()) {
                strength.set_emissive_strength(doc, s)?;
            }
            ctx.materials[index].set_extension(doc, NAME, Some(strength.id()))?;
        }
        Ok(())
    }

    fn write(&self, ctx: &mut WriterContext, doc: &Document) -> Result<()> {
        for material in doc.root().list_materials(doc) {
            let Some(id) = material.get_extension(doc, NAME) else {
                continue;
            };
            let strength = doc
                .graph()
                .get_attr(id, "emissiveStrength")
                .and_then(Literal::as_f64)
                .unwrap_or(1.0);
            if let Some(extensions) = ctx.extensions_mut_for(material) {
                extensions.insert(NAME.to_string(), json!({ "emissiveStrength": strength }));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_materials_accept_it() {
        let mut doc = Document::new();
        let ext = doc.create_extension::<MaterialsEmissiveStrength>();
        let strength = ext.create_emissive_strength(&mut doc);
        strength.set_emissive_strength(&mut doc, 4.0).unwrap();

        let node = doc.create_node("n");
        let err = node.set_extension(&mut doc, NAME, Some(strength.id()));
        assert!(matches!(err, Err(crate::util::Error::InvalidParent { .. })));

        let mat = doc.create_material("m");
        mat.set_extension(&mut doc, NAME, Some(strength.id())).unwrap();
        assert_eq!(mat.get_extension(&doc, NAME), Some(strength.id()));
        assert_eq!(strength.emissive_strength(&doc), 4.0);
    }
}
