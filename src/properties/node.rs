//! Scene graph nodes.

use std::collections::HashSet;

use super::{attr, attr_floats, Camera, Mesh, Skin};
use crate::document::Document;
use crate::graph::EdgeAttributes;
use crate::property::{Literal, PropertyType};
use crate::util::{compose_matrix, decompose_matrix, DMat4, IDENTITY_ROTATION, UNIT_SCALE, ZERO_TRANSLATION};
use crate::util::Result;

property_handle! {
    /// A transform in the node hierarchy, optionally instancing a mesh,
    /// camera or skin.
    Node => Node
}

impl Node {
    pub fn translation(self, doc: &Document) -> [f64; 3] {
        attr_floats(doc, self.0, "translation", ZERO_TRANSLATION)
    }

    /// Store a copy of `translation`.
    pub fn set_translation(self, doc: &mut Document, translation: [f64; 3]) -> Result<Self> {
        doc.graph_mut().set_attr(self.0, "translation", translation)?;
        Ok(self)
    }

    /// Rotation quaternion as `[x, y, z, w]`.
    pub fn rotation(self, doc: &Document) -> [f64; 4] {
        attr_floats(doc, self.0, "rotation", IDENTITY_ROTATION)
    }

    pub fn set_rotation(self, doc: &mut Document, rotation: [f64; 4]) -> Result<Self> {
        doc.graph_mut().set_attr(self.0, "rotation", rotation)?;
        Ok(self)
    }

    pub fn scale(self, doc: &Document) -> [f64; 3] {
        attr_floats(doc, self.0, "scale", UNIT_SCALE)
    }

    pub fn set_scale(self, doc: &mut Document, scale: [f64; 3]) -> Result<Self> {
        doc.graph_mut().set_attr(self.0, "scale", scale)?;
        Ok(self)
    }

    /// Local matrix composed from translation, rotation and scale.
    pub fn local_matrix(self, doc: &Document) -> DMat4 {
        compose_matrix(self.translation(doc), self.rotation(doc), self.scale(doc))
    }

    /// Local matrix as a column-major array.
    pub fn matrix(self, doc: &Document) -> [f64; 16] {
        self.local_matrix(doc).to_cols_array()
    }

    /// Decompose a column-major matrix into translation, rotation and scale.
    pub fn set_matrix(self, doc: &mut Document, matrix: [f64; 16]) -> Result<Self> {
        let (t, r, s) = decompose_matrix(&DMat4::from_cols_array(&matrix));
        self.set_translation(doc, t)?.set_rotation(doc, r)?.set_scale(doc, s)
    }

    /// Product of the local matrices from the topmost ancestor down to
    /// this node. Stops climbing if the parent chain loops.
    pub fn world_matrix(self, doc: &Document) -> DMat4 {
        let mut chain = vec![self];
        let mut seen = HashSet::from([self]);
        let mut current = self;
        while let Some(parent) = current.parent_node(doc) {
            if !seen.insert(parent) {
                break;
            }
            chain.push(parent);
            current = parent;
        }
        chain
            .iter()
            .rev()
            .fold(DMat4::IDENTITY, |world, node| world * node.local_matrix(doc))
    }

    /// Default morph target weights for the instanced mesh.
    pub fn weights(self, doc: &Document) -> Vec<f64> {
        attr(doc, self.0, "weights")
            .and_then(Literal::as_floats)
            .map(<[f64]>::to_vec)
            .unwrap_or_default()
    }

    pub fn set_weights(self, doc: &mut Document, weights: &[f64]) -> Result<Self> {
        doc.graph_mut().set_attr(self.0, "weights", weights)?;
        Ok(self)
    }

    pub fn mesh(self, doc: &Document) -> Option<Mesh> {
        doc.graph().get_ref(self.0, "mesh").map(Mesh)
    }

    pub fn set_mesh(self, doc: &mut Document, mesh: Option<Mesh>) -> Result<Self> {
        doc.graph_mut()
            .set_ref(self.0, "mesh", mesh.map(Mesh::id), EdgeAttributes::default())?;
        Ok(self)
    }

    pub fn camera(self, doc: &Document) -> Option<Camera> {
        doc.graph().get_ref(self.0, "camera").map(Camera)
    }

    pub fn set_camera(self, doc: &mut Document, camera: Option<Camera>) -> Result<Self> {
        doc.graph_mut()
            .set_ref(self.0, "camera", camera.map(Camera::id), EdgeAttributes::default())?;
        Ok(self)
    }

    pub fn skin(self, doc: &Document) -> Option<Skin> {
        doc.graph().get_ref(self.0, "skin").map(Skin)
    }

    pub fn set_skin(self, doc: &mut Document, skin: Option<Skin>) -> Result<Self> {
        doc.graph_mut()
            .set_ref(self.0, "skin", skin.map(Skin::id), EdgeAttributes::default())?;
        Ok(self)
    }

    /// Make `child` a child of this node. A node has at most one parent
    /// node, so `child` is first removed from any other node.
    pub fn add_child(self, doc: &mut Document, child: Node) -> Result<Self> {
        if let Some(previous) = child.parent_node(doc) {
            previous.remove_child(doc, child)?;
        }
        doc.graph_mut().add_ref(self.0, "children", child.0)?;
        Ok(self)
    }

    pub fn remove_child(self, doc: &mut Document, child: Node) -> Result<Self> {
        doc.graph_mut().remove_ref(self.0, "children", child.0)?;
        Ok(self)
    }

    pub fn list_children(self, doc: &Document) -> Vec<Node> {
        doc.graph().list_refs(self.0, "children").into_iter().map(Node).collect()
    }

    /// The node listing this one among its children, if any.
    pub fn parent_node(self, doc: &Document) -> Option<Node> {
        doc.graph()
            .list_parent_edges(self.0)
            .into_iter()
            .find(|e| {
                e.name() == "children"
                    && doc.graph().property_type(e.parent()).ok() == Some(PropertyType::Node)
            })
            .map(|e| Node(e.parent()))
    }

    /// Visit this node and its descendants depth first. Nodes reached a
    /// second time (a cycle or a shared child) are not revisited.
    pub fn traverse(self, doc: &Document, mut visit: impl FnMut(Node)) {
        let mut seen = HashSet::new();
        self.traverse_guarded(doc, &mut seen, &mut visit);
    }

    pub(crate) fn traverse_guarded(self, doc: &Document, seen: &mut HashSet<Node>, visit: &mut impl FnMut(Node)) {
        if !seen.insert(self) {
            return;
        }
        visit(self);
        for child in self.list_children(doc) {
            child.traverse_guarded(doc, seen, visit);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::approx_eq;

    #[test]
    fn test_translation_is_copied() {
        let mut doc = Document::new();
        let node = doc.create_node("n");
        let mut source = [1.0, 2.0, 3.0];
        node.set_translation(&mut doc, source).unwrap();
        source[0] = 9.0;
        assert_eq!(source[0], 9.0);
        assert_eq!(node.translation(&doc), [1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_reparenting() {
        let mut doc = Document::new();
        let a = doc.create_node("a");
        let b = doc.create_node("b");
        let c = doc.create_node("c");
        a.add_child(&mut doc, c).unwrap();
        b.add_child(&mut doc, c).unwrap();
        assert!(a.list_children(&doc).is_empty());
        assert_eq!(c.parent_node(&doc), Some(b));
    }

    #[test]
    fn test_world_matrix() {
        let mut doc = Document::new();
        let parent = doc.create_node("p");
        let child = doc.create_node("c");
        parent.set_translation(&mut doc, [1.0, 0.0, 0.0]).unwrap();
        child.set_translation(&mut doc, [0.0, 2.0, 0.0]).unwrap();
        parent.add_child(&mut doc, child).unwrap();
        let world = child.world_matrix(&doc);
        assert!(approx_eq(&world.w_axis.to_array()[..3], &[1.0, 2.0, 0.0], 1e-12));
    }

    #[test]
    fn test_traverse_survives_cycle() {
        let mut doc = Document::new();
        let a = doc.create_node("a");
        let b = doc.create_node("b");
        doc.graph_mut().add_ref(a.id(), "children", b.id()).unwrap();
        doc.graph_mut().add_ref(b.id(), "children", a.id()).unwrap();
        let mut visited = Vec::new();
        a.traverse(&doc, |n| visited.push(n));
        assert_eq!(visited, vec![a, b]);
        let _ = a.world_matrix(&doc);
    }

    #[test]
    fn test_matrix_round_trip() {
        let mut doc = Document::new();
        let node = doc.create_node("n");
        node.set_translation(&mut doc, [1.0, 2.0, 3.0]).unwrap();
        let m = node.matrix(&doc);
        let other = doc.create_node("o");
        other.set_matrix(&mut doc, m).unwrap();
        assert!(approx_eq(&other.translation(&doc), &[1.0, 2.0, 3.0], 1e-9));
    }
}
