//! Per-entity storage held in the graph arena.

use std::collections::BTreeMap;

use serde_json::Value;

use super::array::AccessorArray;
use super::literal::Literal;
use super::property_type::PropertyType;

/// Binary payload owned by an entity.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Payload {
    #[default]
    None,
    /// Accessor element data.
    Array(AccessorArray),
    /// Encoded image bytes of a texture.
    Image(Vec<u8>),
}

/// Identifies the extension an extension property belongs to and the
/// kinds it may be attached to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExtensionMeta {
    pub extension_name: &'static str,
    pub parent_types: &'static [PropertyType],
}

/// Everything an entity stores apart from its edges.
#[derive(Clone, Debug)]
pub struct PropertyData {
    pub(crate) property_type: PropertyType,
    pub(crate) name: String,
    pub(crate) attrs: BTreeMap<String, Literal>,
    pub(crate) extras: Value,
    /// Extension objects with no registered implementation, kept verbatim.
    pub(crate) unknown_extensions: BTreeMap<String, Value>,
    pub(crate) payload: Payload,
    pub(crate) extension: Option<ExtensionMeta>,
}

impl PropertyData {
    pub fn new(property_type: PropertyType, name: impl Into<String>) -> Self {
        Self {
            property_type,
            name: name.into(),
            attrs: BTreeMap::new(),
            extras: Value::Null,
            unknown_extensions: BTreeMap::new(),
            payload: Payload::None,
            extension: None,
        }
    }

    #[inline]
    pub fn property_type(&self) -> PropertyType {
        self.property_type
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn attr(&self, key: &str) -> Option<&Literal> {
        self.attrs.get(key)
    }

    /// All literal attributes, sorted by key.
    pub fn attrs(&self) -> impl Iterator<Item = (&str, &Literal)> {
        self.attrs.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[inline]
    pub fn extras(&self) -> &Value {
        &self.extras
    }

    #[inline]
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    #[inline]
    pub fn extension(&self) -> Option<&ExtensionMeta> {
        self.extension.as_ref()
    }

    pub fn unknown_extensions(&self) -> &BTreeMap<String, Value> {
        &self.unknown_extensions
    }
}
