//! Shallow and deep property copies.

use std::collections::{HashMap, HashSet, VecDeque};

use super::ops::PropertyGraph;
use crate::graph::PropertyId;
use crate::util::{Error, Result};

/// Maps source ids to their copies during a deep copy.
pub type IdentityMap = HashMap<PropertyId, PropertyId>;

impl PropertyGraph {
    /// Clone one property inside this graph.
    ///
    /// Literal attributes, extras and payload are copied; every reference
    /// points at the same children as the original. Owned children
    /// (texture infos) are cloned alongside so they keep a single parent.
    pub fn clone_property(&mut self, id: PropertyId) -> Result<PropertyId> {
        self.ensure_live(id)?;
        let data = self.data(id)?.clone();
        let copy = self.insert(data);

        let edges: Vec<_> = self
            .list_child_edges(id)
            .into_iter()
            .map(|e| (e.name().to_string(), e.child(), e.attributes().clone()))
            .collect();
        for (name, child, attributes) in edges {
            let owned = self.property_type(child)?.is_owned_child();
            let target = if owned { self.clone_property(child)? } else { child };
            self.add_edge(copy, target, name, attributes)?;
        }
        Ok(copy)
    }

    /// Every live property reachable from `start` through outgoing edges,
    /// `start` included, in breadth-first edge order.
    pub fn collect_reachable(&self, start: PropertyId) -> Vec<PropertyId> {
        let mut seen = HashSet::new();
        let mut order = Vec::new();
        let mut queue = VecDeque::from([start]);
        while let Some(id) = queue.pop_front() {
            if self.is_disposed(id) || !seen.insert(id) {
                continue;
            }
            order.push(id);
            for edge in self.list_child_edges(id) {
                queue.push_back(edge.child());
            }
        }
        order
    }
}

/// Copy `ids` from `source` into `target`, rewriting references.
///
/// Phase one allocates a copy for every id not already in `map`; phase
/// two recreates each copied property's outgoing edges against the
/// mapped children. Entries already present in `map` (for example a
/// root mapped onto the target's root) are reused, not copied. Every
/// child of a copied property must be covered by `map` after phase one.
pub fn copy_properties(
    source: &PropertyGraph,
    target: &mut PropertyGraph,
    ids: &[PropertyId],
    map: &mut IdentityMap,
) -> Result<Vec<PropertyId>> {
    let mut created = Vec::new();
    for &id in ids {
        if map.contains_key(&id) {
            continue;
        }
        source.ensure_live(id)?;
        let copy = target.insert(source.data(id)?.clone());
        map.insert(id, copy);
        created.push(id);
    }

    for &id in &created {
        let parent = map[&id];
        for edge in source.list_child_edges(id) {
            let child = map.get(&edge.child()).copied().ok_or_else(|| {
                Error::other(format!(
                    "{} references {} which is not part of the copy",
                    id,
                    edge.child()
                ))
            })?;
            target.add_edge(parent, child, edge.name(), edge.attributes().clone())?;
        }
    }
    Ok(created.into_iter().map(|id| map[&id]).collect())
}
