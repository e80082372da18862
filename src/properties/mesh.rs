//! Meshes, primitives and morph targets.

use super::{attr, attr_i64, Accessor, Material};
use crate::document::Document;
use crate::graph::EdgeAttributes;
use crate::property::Literal;
use crate::util::Result;

property_handle! {
    /// A set of primitives drawn together.
    Mesh => Mesh
}

property_handle! {
    /// Geometry drawn with one material.
    Primitive => Primitive
}

property_handle! {
    /// Morph target: attribute displacements for a primitive.
    PrimitiveTarget => PrimitiveTarget
}

/// Topology of a primitive, by its glTF enum value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum PrimitiveMode {
    Points = 0,
    Lines = 1,
    LineLoop = 2,
    LineStrip = 3,
    #[default]
    Triangles = 4,
    TriangleStrip = 5,
    TriangleFan = 6,
}

impl PrimitiveMode {
    pub const fn from_gl_enum(value: u32) -> Option<Self> {
        match value {
            0 => Some(Self::Points),
            1 => Some(Self::Lines),
            2 => Some(Self::LineLoop),
            3 => Some(Self::LineStrip),
            4 => Some(Self::Triangles),
            5 => Some(Self::TriangleStrip),
            6 => Some(Self::TriangleFan),
            _ => None,
        }
    }
}

fn weights_of(doc: &Document, id: crate::graph::PropertyId) -> Vec<f64> {
    attr(doc, id, "weights")
        .and_then(Literal::as_floats)
        .map(<[f64]>::to_vec)
        .unwrap_or_default()
}

impl Mesh {
    pub fn add_primitive(self, doc: &mut Document, primitive: Primitive) -> Result<Self> {
        doc.graph_mut().add_ref(self.0, "primitives", primitive.0)?;
        Ok(self)
    }

    pub fn remove_primitive(self, doc: &mut Document, primitive: Primitive) -> Result<Self> {
        doc.graph_mut().remove_ref(self.0, "primitives", primitive.0)?;
        Ok(self)
    }

    pub fn list_primitives(self, doc: &Document) -> Vec<Primitive> {
        doc.graph().list_refs(self.0, "primitives").into_iter().map(Primitive).collect()
    }

    pub fn weights(self, doc: &Document) -> Vec<f64> {
        weights_of(doc, self.0)
    }

    pub fn set_weights(self, doc: &mut Document, weights: &[f64]) -> Result<Self> {
        doc.graph_mut().set_attr(self.0, "weights", weights)?;
        Ok(self)
    }
}

impl Primitive {
    pub fn mode(self, doc: &Document) -> PrimitiveMode {
        attr_i64(doc, self.0, "mode")
            .and_then(|v| u32::try_from(v).ok())
            .and_then(PrimitiveMode::from_gl_enum)
            .unwrap_or_default()
    }

    pub fn set_mode(self, doc: &mut Document, mode: PrimitiveMode) -> Result<Self> {
        doc.graph_mut().set_attr(self.0, "mode", mode as u32)?;
        Ok(self)
    }

    pub fn indices(self, doc: &Document) -> Option<Accessor> {
        doc.graph().get_ref(self.0, "indices").map(Accessor)
    }

    pub fn set_indices(self, doc: &mut Document, indices: Option<Accessor>) -> Result<Self> {
        doc.graph_mut()
            .set_ref(self.0, "indices", indices.map(Accessor::id), EdgeAttributes::default())?;
        Ok(self)
    }

    /// Vertex attribute by semantic, e.g. `POSITION` or `TEXCOORD_0`.
    pub fn attribute(self, doc: &Document, semantic: &str) -> Option<Accessor> {
        doc.graph().get_ref_map(self.0, "attributes", semantic).map(Accessor)
    }

    /// Set or clear one vertex attribute.
    pub fn set_attribute(self, doc: &mut Document, semantic: &str, accessor: Option<Accessor>) -> Result<Self> {
        doc.graph_mut()
            .set_ref_map(self.0, "attributes", semantic, accessor.map(Accessor::id))?;
        Ok(self)
    }

    pub fn list_semantics(self, doc: &Document) -> Vec<String> {
        doc.graph().list_ref_map_keys(self.0, "attributes")
    }

    pub fn list_attributes(self, doc: &Document) -> Vec<(String, Accessor)> {
        doc.graph()
            .list_ref_map(self.0, "attributes")
            .into_iter()
            .map(|(k, id)| (k, Accessor(id)))
            .collect()
    }

    pub fn material(self, doc: &Document) -> Option<Material> {
        doc.graph().get_ref(self.0, "material").map(Material)
    }

    pub fn set_material(self, doc: &mut Document, material: Option<Material>) -> Result<Self> {
        doc.graph_mut()
            .set_ref(self.0, "material", material.map(Material::id), EdgeAttributes::default())?;
        Ok(self)
    }

    pub fn add_target(self, doc: &mut Document, target: PrimitiveTarget) -> Result<Self> {
        doc.graph_mut().add_ref(self.0, "targets", target.0)?;
        Ok(self)
    }

    pub fn remove_target(self, doc: &mut Document, target: PrimitiveTarget) -> Result<Self> {
        doc.graph_mut().remove_ref(self.0, "targets", target.0)?;
        Ok(self)
    }

    pub fn list_targets(self, doc: &Document) -> Vec<PrimitiveTarget> {
        doc.graph().list_refs(self.0, "targets").into_iter().map(PrimitiveTarget).collect()
    }
}

impl PrimitiveTarget {
    pub fn attribute(self, doc: &Document, semantic: &str) -> Option<Accessor> {
        doc.graph().get_ref_map(self.0, "attributes", semantic).map(Accessor)
    }

    pub fn set_attribute(self, doc: &mut Document, semantic: &str, accessor: Option<Accessor>) -> Result<Self> {
        doc.graph_mut()
            .set_ref_map(self.0, "attributes", semantic, accessor.map(Accessor::id))?;
        Ok(self)
    }

    pub fn list_attributes(self, doc: &Document) -> Vec<(String, Accessor)> {
        doc.graph()
            .list_ref_map(self.0, "attributes")
            .into_iter()
            .map(|(k, id)| (k, Accessor(id)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_map() {
        let mut doc = Document::new();
        let prim = doc.create_primitive();
        let position = doc.create_accessor("p");
        let normal = doc.create_accessor("n");
        prim.set_attribute(&mut doc, "POSITION", Some(position)).unwrap();
        prim.set_attribute(&mut doc, "NORMAL", Some(normal)).unwrap();
        prim.set_attribute(&mut doc, "POSITION", Some(normal)).unwrap();
        assert_eq!(prim.attribute(&doc, "POSITION"), Some(normal));
        assert_eq!(prim.list_semantics(&doc).len(), 2);

        prim.set_attribute(&mut doc, "NORMAL", None).unwrap();
        assert_eq!(prim.list_semantics(&doc), vec!["POSITION".to_string()]);
    }

    #[test]
    fn test_mode_default() {
        let mut doc = Document::new();
        let prim = doc.create_primitive();
        assert_eq!(prim.mode(&doc), PrimitiveMode::Triangles);
        prim.set_mode(&mut doc, PrimitiveMode::Lines).unwrap();
        assert_eq!(prim.mode(&doc), PrimitiveMode::Lines);
    }

    #[test]
    fn test_disposing_primitive_empties_mesh() {
        let mut doc = Document::new();
        let mesh = doc.create_mesh("m");
        let prim = doc.create_primitive();
        mesh.add_primitive(&mut doc, prim).unwrap();
        prim.dispose(&mut doc).unwrap();
        assert!(mesh.list_primitives(&doc).is_empty());
        assert!(prim.set_mode(&mut doc, PrimitiveMode::Points).is_err());
    }
}
