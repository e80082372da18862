//! Entity graph with bidirectional edge tracking.
//!
//! [`Graph`] is an arena of entity values plus a symmetric edge index:
//! every edge is visible from its parent (outgoing) and from its child
//! (incoming). The property layer builds reference slots on top of it.
//!
//! ```text
//!   parent ──"mesh"──▶ child        list_child_edges(parent)
//!                                   list_parent_edges(child)
//! ```

mod id;
mod edge;
mod event;
mod arena;

pub use id::{EdgeId, GraphId, ListenerId, PropertyId};
pub use edge::{channel, ColorSpace, Edge, EdgeAttributes};
pub use event::GraphEvent;
pub use arena::Graph;
