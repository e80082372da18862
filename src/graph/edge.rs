//! Directed, named reference edges.

use super::id::{EdgeId, PropertyId};

/// Color space hint carried by material → texture edges.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ColorSpace {
    Srgb,
    Linear,
}

impl ColorSpace {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Srgb => "srgb",
            Self::Linear => "srgb-linear",
        }
    }
}

/// Texture channel bits used in [`EdgeAttributes::channels`].
pub mod channel {
    pub const R: u8 = 0x1;
    pub const G: u8 = 0x2;
    pub const B: u8 = 0x4;
    pub const A: u8 = 0x8;
    pub const RGB: u8 = R | G | B;
    pub const RGBA: u8 = RGB | A;
}

/// Optional attributes attached to an edge.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct EdgeAttributes {
    /// Slot name inside a reference map (e.g. `POSITION`).
    pub key: Option<String>,
    /// Texture channel mask, see [`channel`].
    pub channels: Option<u8>,
    /// Color space of the referenced texture.
    pub color_space: Option<ColorSpace>,
}

impl EdgeAttributes {
    /// Attributes for a reference-map slot.
    pub fn keyed(key: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            ..Self::default()
        }
    }

    /// Attributes for a texture slot.
    pub fn texture(channels: u8, color_space: ColorSpace) -> Self {
        Self {
            channels: Some(channels),
            color_space: Some(color_space),
            ..Self::default()
        }
    }
}

/// A directed link from `parent` to `child` under attribute `name`.
#[derive(Clone, Debug, PartialEq)]
pub struct Edge {
    pub(crate) id: EdgeId,
    pub(crate) parent: PropertyId,
    pub(crate) child: PropertyId,
    pub(crate) name: String,
    pub(crate) attributes: EdgeAttributes,
}

impl Edge {
    #[inline]
    pub fn id(&self) -> EdgeId {
        self.id
    }

    #[inline]
    pub fn parent(&self) -> PropertyId {
        self.parent
    }

    #[inline]
    pub fn child(&self) -> PropertyId {
        self.child
    }

    /// Attribute name on the parent, e.g. `mesh` or `children`.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn attributes(&self) -> &EdgeAttributes {
        &self.attributes
    }

    /// Reference-map key, if this edge lives in a map slot.
    #[inline]
    pub fn key(&self) -> Option<&str> {
        self.attributes.key.as_deref()
    }
}
