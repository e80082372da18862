//! Extension mechanism.
//!
//! An extension is a per-document singleton identified by its glTF
//! extension name. It may define [`ExtensionProperty`] kinds that attach
//! to core properties under the `extensions` reference map, and it takes
//! part in reading and writing through hooks that receive the reader or
//! writer context.
//!
//! The core never sees concrete extension types: the registry maps the
//! extension name to an `Rc<dyn Extension>`, and each extension property
//! carries an [`ExtensionMeta`] naming its extension and legal hosts.
//!
//! [`ExtensionProperty`]: crate::properties::ExtensionProperty
//! [`ExtensionMeta`]: crate::property::ExtensionMeta

mod registry;
pub mod khr_lights_punctual;
pub mod khr_materials_emissive_strength;
pub mod khr_materials_unlit;
pub mod khr_texture_transform;

use std::any::Any;

use crate::document::Document;
use crate::io::{ReaderContext, WriterContext};
use crate::property::PropertyType;
use crate::util::Result;

pub use registry::ExtensionRegistry;
pub use khr_lights_punctual::{Light, LightType, LightsPunctual};
pub use khr_materials_emissive_strength::{EmissiveStrength, MaterialsEmissiveStrength};
pub use khr_materials_unlit::{MaterialsUnlit, Unlit};
pub use khr_texture_transform::{TextureTransform, TextureTransformExtension};

/// Serialization hooks and identity of one extension.
pub trait Extension: Any {
    /// glTF extension name, e.g. `KHR_materials_unlit`.
    fn name(&self) -> &'static str;

    /// Property kinds whose reconstruction the `preread` hook precedes.
    fn preread_types(&self) -> &'static [PropertyType] {
        &[]
    }

    /// Property kinds whose packing the `prewrite` hook precedes.
    fn prewrite_types(&self) -> &'static [PropertyType] {
        &[]
    }

    /// Runs before the reader reconstructs `property_type`.
    fn preread(&self, _ctx: &mut ReaderContext<'_>, _doc: &mut Document, _property_type: PropertyType) -> Result<()> {
        Ok(())
    }

    /// Runs before the writer packs `property_type`; may claim accessors
    /// with [`WriterContext::skip_accessor`] to supply their data itself.
    fn prewrite(&self, _ctx: &mut WriterContext, _doc: &Document, _property_type: PropertyType) -> Result<()> {
        Ok(())
    }

    /// Reconstruct this extension's properties once every core property
    /// exists.
    fn read(&self, ctx: &mut ReaderContext<'_>, doc: &mut Document) -> Result<()>;

    /// Emit this extension's JSON once every core property has an index.
    fn write(&self, ctx: &mut WriterContext, doc: &Document) -> Result<()>;
}

/// Extensions that can be instantiated by type.
pub trait ExtensionType: Extension + Sized {
    const NAME: &'static str;

    fn create() -> Self;
}

/// Type-erased constructor for an extension, used to register known
/// extensions with a reader or to re-create them in a cloned document.
#[derive(Clone, Copy)]
pub struct ExtensionClass {
    name: &'static str,
    install: fn(&mut Document),
}

impl ExtensionClass {
    pub fn of<E: ExtensionType>() -> Self {
        fn install<E: ExtensionType>(doc: &mut Document) {
            doc.create_extension::<E>();
        }
        Self {
            name: E::NAME,
            install: install::<E>,
        }
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Create (or fetch) the extension on `doc`.
    pub fn install(&self, doc: &mut Document) {
        (self.install)(doc)
    }
}

impl std::fmt::Debug for ExtensionClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ExtensionClass").field(&self.name).finish()
    }
}

/// Every extension implemented by this crate.
pub fn khronos_extensions() -> Vec<ExtensionClass> {
    vec![
        ExtensionClass::of::<MaterialsEmissiveStrength>(),
        ExtensionClass::of::<MaterialsUnlit>(),
        ExtensionClass::of::<TextureTransformExtension>(),
        ExtensionClass::of::<LightsPunctual>(),
    ]
}
