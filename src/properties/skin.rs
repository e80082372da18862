//! Skins.

use super::{Accessor, Node};
use crate::document::Document;
use crate::graph::EdgeAttributes;
use crate::util::Result;

property_handle! {
    /// Joint hierarchy and inverse bind matrices for vertex skinning.
    Skin => Skin
}

impl Skin {
    pub fn skeleton(self, doc: &Document) -> Option<Node> {
        doc.graph().get_ref(self.0, "skeleton").map(Node)
    }

    pub fn set_skeleton(self, doc: &mut Document, skeleton: Option<Node>) -> Result<Self> {
        doc.graph_mut()
            .set_ref(self.0, "skeleton", skeleton.map(Node::id), EdgeAttributes::default())?;
        Ok(self)
    }

    /// MAT4 accessor with one matrix per joint.
    pub fn inverse_bind_matrices(self, doc: &Document) -> Option<Accessor> {
        doc.graph().get_ref(self.0, "inverseBindMatrices").map(Accessor)
    }

    pub fn set_inverse_bind_matrices(self, doc: &mut Document, accessor: Option<Accessor>) -> Result<Self> {
        doc.graph_mut().set_ref(
            self.0,
            "inverseBindMatrices",
            accessor.map(Accessor::id),
            EdgeAttributes::default(),
        )?;
        Ok(self)
    }

    pub fn add_joint(self, doc: &mut Document, joint: Node) -> Result<Self> {
        doc.graph_mut().add_ref(self.0, "joints", joint.0)?;
        Ok(self)
    }

    pub fn remove_joint(self, doc: &mut Document, joint: Node) -> Result<Self> {
        doc.graph_mut().remove_ref(self.0, "joints", joint.0)?;
        Ok(self)
    }

    pub fn list_joints(self, doc: &Document) -> Vec<Node> {
        doc.graph().list_refs(self.0, "joints").into_iter().map(Node).collect()
    }
}
