//! Arena-backed graph with symmetric edge indices.

use smallvec::SmallVec;

use super::edge::{Edge, EdgeAttributes};
use super::event::{GraphEvent, Listener};
use super::id::{EdgeId, GraphId, ListenerId, PropertyId};
use crate::util::{Error, Result};

/// One arena slot.
struct Slot<T> {
    value: T,
    disposed: bool,
    /// Incoming edges, in registration order.
    parents: SmallVec<[EdgeId; 4]>,
    /// Outgoing edges, in registration order.
    children: Vec<EdgeId>,
}

/// Registry of entities and the edges between them.
///
/// The graph stores entity values in an arena and keeps, for every
/// entity, the list of incoming and outgoing edges. Adding or removing an
/// edge always updates both lists. Entities belong to exactly one graph;
/// edges to an entity of another graph are rejected.
pub struct Graph<T> {
    id: GraphId,
    slots: Vec<Slot<T>>,
    edges: Vec<Option<Edge>>,
    /// Removed edge slots, reused before the edge table grows.
    free_edges: Vec<u32>,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener: u32,
}

impl<T> Default for Graph<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Graph<T> {
    /// Create an empty graph with a fresh identity.
    pub fn new() -> Self {
        Self {
            id: GraphId::next(),
            slots: Vec::new(),
            edges: Vec::new(),
            free_edges: Vec::new(),
            listeners: Vec::new(),
            next_listener: 0,
        }
    }

    #[inline]
    pub fn id(&self) -> GraphId {
        self.id
    }

    /// Number of entities ever inserted, disposed ones included.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of live (not disposed) entities.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| !s.disposed).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate over live entity ids in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = PropertyId> + '_ {
        let graph = self.id;
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| !s.disposed)
            .map(move |(i, _)| PropertyId { graph, index: i as u32 })
    }

    /// Number of live edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len() - self.free_edges.len()
    }

    /// Size of the edge table, removed slots included.
    #[inline]
    pub fn edge_capacity(&self) -> usize {
        self.edges.len()
    }

    // ------------------------------------------------------------------
    // Entities
    // ------------------------------------------------------------------

    /// Insert a new entity.
    pub fn insert(&mut self, value: T) -> PropertyId {
        let id = PropertyId {
            graph: self.id,
            index: self.slots.len() as u32,
        };
        self.slots.push(Slot {
            value,
            disposed: false,
            parents: SmallVec::new(),
            children: Vec::new(),
        });
        self.emit(&GraphEvent::Create { id });
        id
    }

    fn slot(&self, id: PropertyId) -> Result<&Slot<T>> {
        if id.graph != self.id {
            return Err(Error::UnknownEntity(id.to_string()));
        }
        self.slots
            .get(id.index())
            .ok_or_else(|| Error::UnknownEntity(id.to_string()))
    }

    fn live_slot(&self, id: PropertyId) -> Result<&Slot<T>> {
        let slot = self.slot(id)?;
        if slot.disposed {
            return Err(Error::Disposed { kind: format!("Entity {id}") });
        }
        Ok(slot)
    }

    fn live_slot_mut(&mut self, id: PropertyId) -> Result<&mut Slot<T>> {
        self.live_slot(id)?;
        Ok(&mut self.slots[id.index()])
    }

    /// True if `id` belongs to this graph.
    pub fn contains(&self, id: PropertyId) -> bool {
        self.slot(id).is_ok()
    }

    /// True if the entity has been disposed (or is unknown).
    pub fn is_disposed(&self, id: PropertyId) -> bool {
        self.slot(id).map(|s| s.disposed).unwrap_or(true)
    }

    /// Read an entity value. Disposed entities remain readable.
    pub fn value(&self, id: PropertyId) -> Result<&T> {
        Ok(&self.slot(id)?.value)
    }

    /// Mutable access to a live entity value.
    pub fn value_mut(&mut self, id: PropertyId) -> Result<&mut T> {
        Ok(&mut self.live_slot_mut(id)?.value)
    }

    /// Remove every edge touching `id` and mark it disposed.
    ///
    /// Fails if the entity is already disposed.
    pub fn dispose_entity(&mut self, id: PropertyId) -> Result<()> {
        let slot = self.live_slot(id)?;
        let touching: Vec<EdgeId> = slot
            .parents
            .iter()
            .chain(slot.children.iter())
            .copied()
            .collect();
        for edge in touching {
            self.remove_edge(edge);
        }
        self.slots[id.index()].disposed = true;
        Ok(())
    }

    /// Remove every incoming edge of `id`, leaving its children intact.
    pub fn detach(&mut self, id: PropertyId) -> Result<()> {
        let parents: Vec<EdgeId> = self.live_slot(id)?.parents.to_vec();
        for edge in parents {
            self.remove_edge(edge);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Edges
    // ------------------------------------------------------------------

    /// Register a directed edge from `parent` to `child`.
    ///
    /// Duplicate parent/child/name triples are accepted; cardinality is
    /// enforced by callers.
    pub fn add_edge(
        &mut self,
        parent: PropertyId,
        child: PropertyId,
        name: impl Into<String>,
        attributes: EdgeAttributes,
    ) -> Result<EdgeId> {
        if parent.graph != self.id || child.graph != self.id {
            return Err(Error::CrossGraph {
                parent: parent.to_string(),
                child: child.to_string(),
            });
        }
        self.live_slot(parent)?;
        self.live_slot(child)?;

        let id = match self.free_edges.pop() {
            Some(index) => EdgeId(index),
            None => {
                self.edges.push(None);
                EdgeId(self.edges.len() as u32 - 1)
            }
        };
        self.edges[id.index()] = Some(Edge {
            id,
            parent,
            child,
            name: name.into(),
            attributes,
        });
        self.slots[parent.index()].children.push(id);
        self.slots[child.index()].parents.push(id);
        self.emit(&GraphEvent::EdgeAdd { edge: id, parent, child });
        Ok(id)
    }

    /// Remove an edge from both of its endpoints.
    ///
    /// Returns `false` if the edge was already removed.
    pub fn remove_edge(&mut self, edge: EdgeId) -> bool {
        let Some(removed) = self.edges.get_mut(edge.index()).and_then(Option::take) else {
            return false;
        };
        self.free_edges.push(edge.0);
        let parent = &mut self.slots[removed.parent.index()];
        parent.children.retain(|e| *e != edge);
        let child = &mut self.slots[removed.child.index()];
        child.parents.retain(|e| *e != edge);
        self.emit(&GraphEvent::EdgeRemove {
            edge,
            parent: removed.parent,
            child: removed.child,
        });
        true
    }

    /// Point an existing edge at a different child, keeping its position
    /// in the parent's outgoing list.
    pub fn swap_child(&mut self, edge: EdgeId, new_child: PropertyId) -> Result<()> {
        if new_child.graph != self.id {
            return Err(Error::CrossGraph {
                parent: format!("edge {}", edge.index()),
                child: new_child.to_string(),
            });
        }
        self.live_slot(new_child)?;
        let old_child = match self.edges.get_mut(edge.index()).and_then(Option::as_mut) {
            Some(e) => std::mem::replace(&mut e.child, new_child),
            None => return Err(Error::other(format!("edge {} was removed", edge.index()))),
        };
        self.slots[old_child.index()].parents.retain(|e| *e != edge);
        self.slots[new_child.index()].parents.push(edge);
        Ok(())
    }

    /// Look up a live edge.
    pub fn edge(&self, edge: EdgeId) -> Option<&Edge> {
        self.edges.get(edge.index()).and_then(Option::as_ref)
    }

    /// Incoming edges of `id`, in registration order.
    pub fn list_parent_edges(&self, id: PropertyId) -> Vec<&Edge> {
        match self.slot(id) {
            Ok(slot) => slot.parents.iter().filter_map(|e| self.edge(*e)).collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Outgoing edges of `id`, in registration order.
    pub fn list_child_edges(&self, id: PropertyId) -> Vec<&Edge> {
        match self.slot(id) {
            Ok(slot) => slot.children.iter().filter_map(|e| self.edge(*e)).collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Distinct parents of `id`, in first-edge order.
    pub fn list_parents(&self, id: PropertyId) -> Vec<PropertyId> {
        let mut out: Vec<PropertyId> = Vec::new();
        for edge in self.list_parent_edges(id) {
            if !out.contains(&edge.parent) {
                out.push(edge.parent);
            }
        }
        out
    }

    /// Distinct children of `id`, in first-edge order.
    pub fn list_children(&self, id: PropertyId) -> Vec<PropertyId> {
        let mut out: Vec<PropertyId> = Vec::new();
        for edge in self.list_child_edges(id) {
            if !out.contains(&edge.child) {
                out.push(edge.child);
            }
        }
        out
    }

    /// Number of incoming edges.
    pub fn parent_edge_count(&self, id: PropertyId) -> usize {
        self.slot(id).map(|s| s.parents.len()).unwrap_or(0)
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    /// Register a listener for every subsequent event.
    pub fn on_event(&mut self, listener: impl FnMut(&GraphEvent) + 'static) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener. Returns `false` if it was not registered.
    pub fn off_event(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(l, _)| *l != id);
        before != self.listeners.len()
    }

    /// Deliver an event to every listener, synchronously.
    pub fn emit(&mut self, event: &GraphEvent) {
        for (_, listener) in self.listeners.iter_mut() {
            listener(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn graph_with(n: usize) -> (Graph<&'static str>, Vec<PropertyId>) {
        let mut g = Graph::new();
        let ids = (0..n).map(|_| g.insert("entity")).collect();
        (g, ids)
    }

    #[test]
    fn test_symmetric_edges() {
        let (mut g, ids) = graph_with(2);
        let e = g.add_edge(ids[0], ids[1], "child", EdgeAttributes::default()).unwrap();

        assert_eq!(g.list_child_edges(ids[0]).len(), 1);
        assert_eq!(g.list_parent_edges(ids[1]).len(), 1);
        assert_eq!(g.list_parents(ids[1]), vec![ids[0]]);

        assert!(g.remove_edge(e));
        assert!(!g.remove_edge(e));
        assert!(g.list_child_edges(ids[0]).is_empty());
        assert!(g.list_parent_edges(ids[1]).is_empty());
    }

    #[test]
    fn test_duplicate_edges_allowed() {
        let (mut g, ids) = graph_with(2);
        g.add_edge(ids[0], ids[1], "list", EdgeAttributes::default()).unwrap();
        g.add_edge(ids[0], ids[1], "list", EdgeAttributes::default()).unwrap();
        assert_eq!(g.list_child_edges(ids[0]).len(), 2);
        assert_eq!(g.list_children(ids[0]), vec![ids[1]]);
    }

    #[test]
    fn test_reattach_changes_order() {
        let (mut g, ids) = graph_with(3);
        let first = g.add_edge(ids[0], ids[1], "a", EdgeAttributes::default()).unwrap();
        g.add_edge(ids[0], ids[2], "a", EdgeAttributes::default()).unwrap();
        g.remove_edge(first);
        g.add_edge(ids[0], ids[1], "a", EdgeAttributes::default()).unwrap();
        let order: Vec<_> = g.list_child_edges(ids[0]).iter().map(|e| e.child()).collect();
        assert_eq!(order, vec![ids[2], ids[1]]);
    }

    #[test]
    fn test_dispose_removes_all_edges() {
        let (mut g, ids) = graph_with(3);
        g.add_edge(ids[0], ids[1], "a", EdgeAttributes::default()).unwrap();
        g.add_edge(ids[1], ids[2], "b", EdgeAttributes::default()).unwrap();

        g.dispose_entity(ids[1]).unwrap();
        assert!(g.is_disposed(ids[1]));
        assert!(g.list_child_edges(ids[0]).is_empty());
        assert!(g.list_parent_edges(ids[2]).is_empty());
        assert_eq!(g.edge_count(), 0);

        assert!(matches!(g.dispose_entity(ids[1]), Err(Error::Disposed { .. })));
        assert!(matches!(
            g.add_edge(ids[0], ids[1], "a", EdgeAttributes::default()),
            Err(Error::Disposed { .. })
        ));
        assert_eq!(g.len(), 2);
    }

    #[test]
    fn test_removed_edge_slots_are_reused() {
        let (mut g, ids) = graph_with(3);
        g.add_edge(ids[0], ids[2], "keep", EdgeAttributes::default()).unwrap();
        for _ in 0..100 {
            let e = g.add_edge(ids[0], ids[1], "slot", EdgeAttributes::default()).unwrap();
            assert!(g.remove_edge(e));
        }
        assert_eq!(g.edge_capacity(), 2);
        assert_eq!(g.edge_count(), 1);

        let a = g.add_edge(ids[1], ids[2], "a", EdgeAttributes::default()).unwrap();
        let b = g.add_edge(ids[1], ids[0], "b", EdgeAttributes::default()).unwrap();
        assert_ne!(a, b);
        assert_eq!(g.edge_capacity(), 3);
        assert_eq!(g.edge(a).map(|e| e.child()), Some(ids[2]));
        assert_eq!(g.list_children(ids[1]), vec![ids[2], ids[0]]);
    }

    #[test]
    fn test_cross_graph_rejected() {
        let (mut a, a_ids) = graph_with(1);
        let (_b, b_ids) = graph_with(1);
        let result = a.add_edge(a_ids[0], b_ids[0], "x", EdgeAttributes::default());
        assert!(matches!(result, Err(Error::CrossGraph { .. })));
    }

    #[test]
    fn test_detach_keeps_children() {
        let (mut g, ids) = graph_with(3);
        g.add_edge(ids[0], ids[1], "a", EdgeAttributes::default()).unwrap();
        g.add_edge(ids[1], ids[2], "b", EdgeAttributes::default()).unwrap();
        g.detach(ids[1]).unwrap();
        assert!(g.list_parent_edges(ids[1]).is_empty());
        assert_eq!(g.list_children(ids[1]), vec![ids[2]]);
        assert!(!g.is_disposed(ids[1]));
    }

    #[test]
    fn test_swap_child_keeps_position() {
        let (mut g, ids) = graph_with(4);
        let e = g.add_edge(ids[0], ids[1], "a", EdgeAttributes::default()).unwrap();
        g.add_edge(ids[0], ids[2], "a", EdgeAttributes::default()).unwrap();
        g.swap_child(e, ids[3]).unwrap();
        let order: Vec<_> = g.list_child_edges(ids[0]).iter().map(|e| e.child()).collect();
        assert_eq!(order, vec![ids[3], ids[2]]);
        assert!(g.list_parent_edges(ids[1]).is_empty());
        assert_eq!(g.list_parents(ids[3]), vec![ids[0]]);
    }

    #[test]
    fn test_events() {
        let (mut g, ids) = graph_with(2);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let listener = g.on_event(move |event| sink.borrow_mut().push(event.clone()));

        let e = g.add_edge(ids[0], ids[1], "a", EdgeAttributes::default()).unwrap();
        g.remove_edge(e);
        assert_eq!(seen.borrow().len(), 2);
        assert!(matches!(seen.borrow()[0], GraphEvent::EdgeAdd { .. }));

        assert!(g.off_event(listener));
        g.insert("late");
        assert_eq!(seen.borrow().len(), 2);
    }
}
