//! Document root.

use super::{attr_str, Accessor, Animation, Buffer, Camera, Material, Mesh, Node, Scene, Skin, Texture};
use crate::document::Document;
use crate::graph::{EdgeAttributes, PropertyId};
use crate::property::PropertyType;
use crate::util::Result;

property_handle! {
    /// The single parentless property. Lists every top-level property
    /// and points at the default scene.
    Root => Root
}

/// Reference-list slot on the root holding each top-level kind.
pub(crate) const fn root_slot(property_type: PropertyType) -> Option<&'static str> {
    match property_type {
        PropertyType::Scene => Some("scenes"),
        PropertyType::Node => Some("nodes"),
        PropertyType::Mesh => Some("meshes"),
        PropertyType::Accessor => Some("accessors"),
        PropertyType::Buffer => Some("buffers"),
        PropertyType::Material => Some("materials"),
        PropertyType::Texture => Some("textures"),
        PropertyType::Animation => Some("animations"),
        PropertyType::Skin => Some("skins"),
        PropertyType::Camera => Some("cameras"),
        _ => None,
    }
}

macro_rules! root_list {
    ($fn:ident, $ty:ident, $slot:literal) => {
        pub fn $fn(self, doc: &Document) -> Vec<$ty> {
            doc.graph().list_refs(self.0, $slot).into_iter().map($ty).collect()
        }
    };
}

impl Root {
    root_list!(list_scenes, Scene, "scenes");
    root_list!(list_nodes, Node, "nodes");
    root_list!(list_meshes, Mesh, "meshes");
    root_list!(list_accessors, Accessor, "accessors");
    root_list!(list_buffers, Buffer, "buffers");
    root_list!(list_materials, Material, "materials");
    root_list!(list_textures, Texture, "textures");
    root_list!(list_animations, Animation, "animations");
    root_list!(list_skins, Skin, "skins");
    root_list!(list_cameras, Camera, "cameras");

    /// Ids listed under the root slot of `property_type`.
    pub fn list_of_type(self, doc: &Document, property_type: PropertyType) -> Vec<PropertyId> {
        match root_slot(property_type) {
            Some(slot) => doc.graph().list_refs(self.0, slot),
            None => Vec::new(),
        }
    }

    pub fn default_scene(self, doc: &Document) -> Option<Scene> {
        doc.graph().get_ref(self.0, "defaultScene").map(Scene)
    }

    pub fn set_default_scene(self, doc: &mut Document, scene: Option<Scene>) -> Result<Self> {
        doc.graph_mut()
            .set_ref(self.0, "defaultScene", scene.map(Scene::id), EdgeAttributes::default())?;
        Ok(self)
    }

    /// Asset `version` string; `2.0` for documents this crate creates.
    pub fn asset_version(self, doc: &Document) -> &str {
        attr_str(doc, self.0, "version").unwrap_or("2.0")
    }

    pub fn generator(self, doc: &Document) -> Option<&str> {
        attr_str(doc, self.0, "generator")
    }

    pub fn set_generator(self, doc: &mut Document, generator: &str) -> Result<Self> {
        doc.graph_mut().set_attr(self.0, "generator", generator)?;
        Ok(self)
    }

    pub fn copyright(self, doc: &Document) -> Option<&str> {
        attr_str(doc, self.0, "copyright")
    }

    pub fn set_copyright(self, doc: &mut Document, copyright: &str) -> Result<Self> {
        doc.graph_mut().set_attr(self.0, "copyright", copyright)?;
        Ok(self)
    }

    pub fn min_version(self, doc: &Document) -> Option<&str> {
        attr_str(doc, self.0, "minVersion")
    }

    /// Attach a top-level property to its root list.
    pub(crate) fn adopt(self, doc: &mut Document, id: PropertyId) -> Result<()> {
        let property_type = doc.graph().property_type(id)?;
        if let Some(slot) = root_slot(property_type) {
            doc.graph_mut().add_ref(self.0, slot, id)?;
        }
        Ok(())
    }
}
