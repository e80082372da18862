//! Scenes.

use std::collections::HashSet;

use super::Node;
use crate::document::Document;
use crate::util::Result;

property_handle! {
    /// Ordered set of root nodes rendered together.
    Scene => Scene
}

impl Scene {
    /// Append a root node. Repeated nodes are kept as given.
    pub fn add_child(self, doc: &mut Document, node: Node) -> Result<Self> {
        doc.graph_mut().add_ref(self.0, "children", node.id())?;
        Ok(self)
    }

    /// Remove the first occurrence of `node`.
    pub fn remove_child(self, doc: &mut Document, node: Node) -> Result<Self> {
        doc.graph_mut().remove_ref(self.0, "children", node.id())?;
        Ok(self)
    }

    pub fn list_children(self, doc: &Document) -> Vec<Node> {
        doc.graph().list_refs(self.0, "children").into_iter().map(Node).collect()
    }

    /// Visit every node under this scene, depth first, each node once.
    pub fn traverse(self, doc: &Document, mut visit: impl FnMut(Node)) {
        let mut seen = HashSet::new();
        for child in self.list_children(doc) {
            child.traverse_guarded(doc, &mut seen, &mut visit);
        }
    }
}
