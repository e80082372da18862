//! Identities for graphs, entities and edges.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

static NEXT_GRAPH_ID: AtomicU32 = AtomicU32::new(1);

/// Process-unique graph identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GraphId(u32);

impl GraphId {
    /// Allocate a fresh id.
    pub(crate) fn next() -> Self {
        Self(NEXT_GRAPH_ID.fetch_add(1, Ordering::Relaxed))
    }

    #[inline]
    pub fn get(self) -> u32 {
        self.0
    }
}

/// Identity of one entity in one graph.
///
/// Ids are never reused: a disposed entity keeps its slot, so a stale id
/// resolves to a disposed entity rather than to a newer one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PropertyId {
    pub(crate) graph: GraphId,
    pub(crate) index: u32,
}

impl PropertyId {
    /// Graph this entity belongs to.
    #[inline]
    pub fn graph(self) -> GraphId {
        self.graph
    }

    /// Slot index inside the owning graph.
    #[inline]
    pub fn index(self) -> usize {
        self.index as usize
    }
}

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}:{}", self.graph.0, self.index)
    }
}

/// Identity of one edge in one graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId(pub(crate) u32);

impl EdgeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Handle returned when registering a graph listener.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(pub(crate) u32);
