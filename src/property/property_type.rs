//! Property type tags.

use std::fmt;

/// Discriminates the concrete kind of an entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PropertyType {
    Root,
    Scene,
    Node,
    Mesh,
    Primitive,
    PrimitiveTarget,
    Accessor,
    Buffer,
    Material,
    Texture,
    TextureInfo,
    Animation,
    AnimationChannel,
    AnimationSampler,
    Skin,
    Camera,
    /// Extension-defined kind, tagged with its own name (e.g. `Light`).
    Extension(&'static str),
}

impl PropertyType {
    /// Display name of this kind.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Root => "Root",
            Self::Scene => "Scene",
            Self::Node => "Node",
            Self::Mesh => "Mesh",
            Self::Primitive => "Primitive",
            Self::PrimitiveTarget => "PrimitiveTarget",
            Self::Accessor => "Accessor",
            Self::Buffer => "Buffer",
            Self::Material => "Material",
            Self::Texture => "Texture",
            Self::TextureInfo => "TextureInfo",
            Self::Animation => "Animation",
            Self::AnimationChannel => "AnimationChannel",
            Self::AnimationSampler => "AnimationSampler",
            Self::Skin => "Skin",
            Self::Camera => "Camera",
            Self::Extension(tag) => tag,
        }
    }

    /// Kinds owned by exactly one parent; a shallow clone of the parent
    /// copies them instead of sharing them.
    pub const fn is_owned_child(self) -> bool {
        matches!(self, Self::TextureInfo)
    }

    /// Kinds listed directly on the root.
    pub const fn is_top_level(self) -> bool {
        matches!(
            self,
            Self::Scene
                | Self::Node
                | Self::Mesh
                | Self::Accessor
                | Self::Buffer
                | Self::Material
                | Self::Texture
                | Self::Animation
                | Self::Skin
                | Self::Camera
        )
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
