//! Typed property handles.
//!
//! Each handle is a `Copy` newtype over [`PropertyId`]. Handles do not
//! borrow the document; their methods take `&Document` to read and
//! `&mut Document` to mutate, the way arena-indexed trees are used.
//! Setters return the handle again so calls can be chained:
//!
//! ```ignore
//! let node = doc.create_node("arm");
//! node.set_translation(&mut doc, [0.0, 1.0, 0.0])?
//!     .set_mesh(&mut doc, Some(mesh))?;
//! ```

use serde_json::Value;

use crate::document::Document;
use crate::graph::PropertyId;
use crate::property::Literal;

/// Recursion bound used by the handle-level `equals`.
pub const DEFAULT_EQUALS_DEPTH: usize = 32;

pub(crate) static NO_EXTRAS: Value = Value::Null;

macro_rules! property_handle {
    ($(#[$meta:meta])* $name:ident => $kind:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub(crate) $crate::graph::PropertyId);

        impl $name {
            pub const PROPERTY_TYPE: $crate::property::PropertyType =
                $crate::property::PropertyType::$kind;

            /// Wrap an id after checking its kind.
            pub fn from_id(
                doc: &$crate::document::Document,
                id: $crate::graph::PropertyId,
            ) -> $crate::util::Result<Self> {
                let actual = doc.graph().property_type(id)?;
                if actual != Self::PROPERTY_TYPE {
                    return Err($crate::util::Error::mismatch(Self::PROPERTY_TYPE.name(), actual.name()));
                }
                Ok(Self(id))
            }

            #[inline]
            pub fn id(self) -> $crate::graph::PropertyId {
                self.0
            }

            pub fn name(self, doc: &$crate::document::Document) -> &str {
                doc.graph().name(self.0)
            }

            pub fn set_name(
                self,
                doc: &mut $crate::document::Document,
                name: impl Into<String>,
            ) -> $crate::util::Result<Self> {
                doc.graph_mut().set_name(self.0, name)?;
                Ok(self)
            }

            pub fn extras(self, doc: &$crate::document::Document) -> &serde_json::Value {
                doc.graph().extras(self.0).unwrap_or(&$crate::properties::NO_EXTRAS)
            }

            pub fn set_extras(
                self,
                doc: &mut $crate::document::Document,
                extras: serde_json::Value,
            ) -> $crate::util::Result<Self> {
                doc.graph_mut().set_extras(self.0, extras)?;
                Ok(self)
            }

            pub fn is_disposed(self, doc: &$crate::document::Document) -> bool {
                doc.graph().is_disposed(self.0)
            }

            /// Dispose this property and drop every edge touching it.
            pub fn dispose(self, doc: &mut $crate::document::Document) -> $crate::util::Result<()> {
                doc.graph_mut().dispose(self.0)
            }

            /// Remove this property from all of its parents.
            pub fn detach(self, doc: &mut $crate::document::Document) -> $crate::util::Result<Self> {
                doc.graph_mut().detach_property(self.0)?;
                Ok(self)
            }

            pub fn list_parents(self, doc: &$crate::document::Document) -> Vec<$crate::graph::PropertyId> {
                doc.graph().list_parents(self.0)
            }

            /// Shallow clone; references point at the same children.
            pub fn clone_in(self, doc: &mut $crate::document::Document) -> $crate::util::Result<Self> {
                Ok(Self(doc.clone_property(self.0)?))
            }

            /// Structural equality, following references.
            pub fn equals(self, doc: &$crate::document::Document, other: Self) -> bool {
                doc.graph().equals(self.0, other.0, &[], $crate::properties::DEFAULT_EQUALS_DEPTH)
            }

            /// Extension property attached under `extension`.
            pub fn get_extension(
                self,
                doc: &$crate::document::Document,
                extension: &str,
            ) -> Option<$crate::graph::PropertyId> {
                doc.graph().get_extension(self.0, extension)
            }

            /// Attach or clear an extension property.
            pub fn set_extension(
                self,
                doc: &mut $crate::document::Document,
                extension: &str,
                property: Option<$crate::graph::PropertyId>,
            ) -> $crate::util::Result<Self> {
                doc.graph_mut().set_extension(self.0, extension, property)?;
                Ok(self)
            }
        }

        impl From<$name> for $crate::graph::PropertyId {
            fn from(handle: $name) -> Self {
                handle.0
            }
        }
    };
}

mod root;
mod scene;
mod node;
mod mesh;
mod accessor;
mod buffer;
mod texture;
mod material;
mod animation;
mod skin;
mod camera;
mod extension_property;

pub use root::Root;
pub(crate) use root::root_slot;
pub use scene::Scene;
pub use node::Node;
pub use mesh::{Mesh, Primitive, PrimitiveMode, PrimitiveTarget};
pub use accessor::{Accessor, ElementType};
pub use buffer::Buffer;
pub use texture::{image_size, mime_from_bytes, sampler, Texture, TextureInfo};
pub use material::{AlphaMode, Material, TextureSlot};
pub use animation::{Animation, AnimationChannel, AnimationSampler, Interpolation, TargetPath};
pub use skin::Skin;
pub use camera::{Camera, CameraType};
pub use extension_property::ExtensionProperty;
pub(crate) use extension_property::extension_handle;

// ----------------------------------------------------------------------
// Literal helpers shared by the handles
// ----------------------------------------------------------------------

pub(crate) fn attr<'d>(doc: &'d Document, id: PropertyId, key: &str) -> Option<&'d Literal> {
    doc.graph().get_attr(id, key)
}

pub(crate) fn attr_f64(doc: &Document, id: PropertyId, key: &str, default: f64) -> f64 {
    attr(doc, id, key).and_then(Literal::as_f64).unwrap_or(default)
}

pub(crate) fn attr_opt_f64(doc: &Document, id: PropertyId, key: &str) -> Option<f64> {
    attr(doc, id, key).and_then(Literal::as_f64)
}

pub(crate) fn attr_bool(doc: &Document, id: PropertyId, key: &str, default: bool) -> bool {
    attr(doc, id, key).and_then(Literal::as_bool).unwrap_or(default)
}

pub(crate) fn attr_i64(doc: &Document, id: PropertyId, key: &str) -> Option<i64> {
    attr(doc, id, key).and_then(Literal::as_i64)
}

pub(crate) fn attr_str<'d>(doc: &'d Document, id: PropertyId, key: &str) -> Option<&'d str> {
    attr(doc, id, key).and_then(Literal::as_str)
}

/// Fixed-size float array; falls back to `default` when unset or the
/// stored array has another length.
pub(crate) fn attr_floats<const N: usize>(doc: &Document, id: PropertyId, key: &str, default: [f64; N]) -> [f64; N] {
    attr(doc, id, key)
        .and_then(Literal::as_floats)
        .and_then(|v| <[f64; N]>::try_from(v).ok())
        .unwrap_or(default)
}

pub(crate) fn attr_json<'d>(doc: &'d Document, id: PropertyId, key: &str) -> Option<&'d Value> {
    attr(doc, id, key).and_then(Literal::as_json)
}
