//! Change notifications emitted by a graph.

use super::id::{EdgeId, PropertyId};

/// Something happened to an entity or an edge.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GraphEvent {
    /// Entity inserted.
    Create { id: PropertyId },
    /// Literal attribute or reference slot changed.
    Change { id: PropertyId, attr: String },
    /// Entity about to be disposed; its edges are still present.
    Dispose { id: PropertyId },
    EdgeAdd { edge: EdgeId, parent: PropertyId, child: PropertyId },
    EdgeRemove { edge: EdgeId, parent: PropertyId, child: PropertyId },
}

impl GraphEvent {
    /// Entity the event is about (the parent, for edge events).
    pub fn target(&self) -> PropertyId {
        match self {
            Self::Create { id } | Self::Change { id, .. } | Self::Dispose { id } => *id,
            Self::EdgeAdd { parent, .. } | Self::EdgeRemove { parent, .. } => *parent,
        }
    }
}

pub(crate) type Listener = Box<dyn FnMut(&GraphEvent)>;
