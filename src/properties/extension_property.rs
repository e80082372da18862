//! Extension-defined properties.

use crate::document::Document;
use crate::graph::PropertyId;
use crate::property::{ExtensionMeta, Literal, PropertyType};
use crate::util::{Error, Result};

/// Handle to a property created by an extension.
///
/// The core knows these only through their [`ExtensionMeta`]: the owning
/// extension's name and the host kinds they may be attached to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExtensionProperty(pub(crate) PropertyId);

impl ExtensionProperty {
    /// Wrap an id after checking it was created by an extension.
    pub fn from_id(doc: &Document, id: PropertyId) -> Result<Self> {
        let data = doc.graph().data(id)?;
        if data.extension().is_none() {
            return Err(Error::mismatch("extension property", data.property_type().name()));
        }
        Ok(Self(id))
    }

    #[inline]
    pub fn id(self) -> PropertyId {
        self.0
    }

    pub fn property_type(self, doc: &Document) -> Option<PropertyType> {
        doc.graph().property_type(self.0).ok()
    }

    pub fn meta(self, doc: &Document) -> Option<ExtensionMeta> {
        doc.graph().data(self.0).ok().and_then(|d| d.extension().copied())
    }

    /// Name of the owning extension, e.g. `KHR_materials_unlit`.
    pub fn extension_name(self, doc: &Document) -> &'static str {
        self.meta(doc).map_or("", |m| m.extension_name)
    }

    /// Host kinds this property may be attached to.
    pub fn parent_types(self, doc: &Document) -> &'static [PropertyType] {
        self.meta(doc).map(|m| m.parent_types).unwrap_or(&[])
    }

    pub fn get<'d>(self, doc: &'d Document, attr: &str) -> Option<&'d Literal> {
        doc.graph().get_attr(self.0, attr)
    }

    pub fn set(self, doc: &mut Document, attr: &str, value: impl Into<Literal>) -> Result<Self> {
        doc.graph_mut().set_attr(self.0, attr, value)?;
        Ok(self)
    }

    pub fn is_disposed(self, doc: &Document) -> bool {
        doc.graph().is_disposed(self.0)
    }

    pub fn dispose(self, doc: &mut Document) -> Result<()> {
        doc.graph_mut().dispose(self.0)
    }

    /// Hosts this property is attached to.
    pub fn list_hosts(self, doc: &Document) -> Vec<PropertyId> {
        doc.graph().list_parents(self.0)
    }
}

impl From<ExtensionProperty> for PropertyId {
    fn from(handle: ExtensionProperty) -> Self {
        handle.0
    }
}

/// Typed newtype over an [`ExtensionProperty`] of one extension.
macro_rules! extension_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub(crate) $crate::properties::ExtensionProperty);

        impl $name {
            #[inline]
            pub fn id(self) -> $crate::graph::PropertyId {
                self.0.id()
            }

            #[inline]
            pub fn as_property(self) -> $crate::properties::ExtensionProperty {
                self.0
            }

            pub fn is_disposed(self, doc: &$crate::document::Document) -> bool {
                self.0.is_disposed(doc)
            }
        }

        impl From<$name> for $crate::graph::PropertyId {
            fn from(handle: $name) -> Self {
                handle.0.id()
            }
        }
    };
}
pub(crate) use extension_handle;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extension::MaterialsEmissiveStrength;

    #[test]
    fn test_get_borrows_from_document() {
        let mut doc = Document::new();
        let ext = doc.create_extension::<MaterialsEmissiveStrength>();
        let strength = ext.create_emissive_strength(&mut doc).as_property();
        strength.set(&mut doc, "emissiveStrength", 2.5).unwrap();

        let attr = String::from("emissiveStrength");
        let value = strength.get(&doc, &attr);
        drop(attr);
        assert_eq!(value, Some(&Literal::Float(2.5)));
        assert_eq!(strength.extension_name(&doc), "KHR_materials_emissive_strength");
        assert_eq!(strength.parent_types(&doc), &[PropertyType::Material]);
    }
}
