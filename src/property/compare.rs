//! Structural equality and hashing.

use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, HashMap};
use std::hash::{Hash, Hasher};

use super::data::{Payload, PropertyData};
use super::ops::PropertyGraph;
use crate::graph::{Edge, PropertyId};

/// Per-pass memo of property hashes. Invalidate after any mutation.
pub type HashCache = HashMap<PropertyId, u64>;

/// Attributes always compared unless listed in `skip`.
const NAME: &str = "name";
const EXTRAS: &str = "extras";

/// Outgoing edges grouped by attribute name; map slots sorted by key,
/// list slots left in order.
fn grouped_edges<'a>(graph: &'a PropertyGraph, id: PropertyId, skip: &[&str]) -> BTreeMap<&'a str, Vec<&'a Edge>> {
    let mut groups: BTreeMap<&str, Vec<&Edge>> = BTreeMap::new();
    for edge in graph.list_child_edges(id) {
        if skip.contains(&edge.name()) {
            continue;
        }
        groups.entry(edge.name()).or_default().push(edge);
    }
    for edges in groups.values_mut() {
        edges.sort_by(|a, b| a.key().cmp(&b.key()));
    }
    groups
}

fn literals_equal(a: &PropertyData, b: &PropertyData, skip: &[&str]) -> bool {
    let left: Vec<_> = a.attrs.iter().filter(|(k, _)| !skip.contains(&k.as_str())).collect();
    let right: Vec<_> = b.attrs.iter().filter(|(k, _)| !skip.contains(&k.as_str())).collect();
    left == right
}

impl PropertyGraph {
    /// Structural equality of two properties.
    ///
    /// Literals, extras and payloads compare by value. References compare
    /// by identity when `depth` is zero and recursively, one level
    /// shallower, otherwise. `skip` names attributes and reference slots
    /// to ignore (`"name"` and `"extras"` included).
    pub fn equals(&self, a: PropertyId, b: PropertyId, skip: &[&str], depth: usize) -> bool {
        if a == b {
            return true;
        }
        let (Ok(da), Ok(db)) = (self.data(a), self.data(b)) else {
            return false;
        };
        if da.property_type != db.property_type || da.extension != db.extension {
            return false;
        }
        if !skip.contains(&NAME) && da.name != db.name {
            return false;
        }
        if !skip.contains(&EXTRAS) && da.extras != db.extras {
            return false;
        }
        if !literals_equal(da, db, skip)
            || da.payload != db.payload
            || da.unknown_extensions != db.unknown_extensions
        {
            return false;
        }

        let (ga, gb) = (grouped_edges(self, a, skip), grouped_edges(self, b, skip));
        if ga.len() != gb.len() {
            return false;
        }
        for ((name_a, edges_a), (name_b, edges_b)) in ga.iter().zip(gb.iter()) {
            if name_a != name_b || edges_a.len() != edges_b.len() {
                return false;
            }
            for (ea, eb) in edges_a.iter().zip(edges_b.iter()) {
                if ea.attributes() != eb.attributes() {
                    return false;
                }
                let same = if depth == 0 {
                    ea.child() == eb.child()
                } else {
                    self.equals(ea.child(), eb.child(), skip, depth - 1)
                };
                if !same {
                    return false;
                }
            }
        }
        true
    }

    /// Fast structural hash. Equal properties hash equally; equal hashes
    /// must still be confirmed with [`equals`](Self::equals).
    pub fn to_hash(&self, id: PropertyId, skip: &[&str], cache: &mut HashCache) -> u64 {
        if let Some(hash) = cache.get(&id) {
            return *hash;
        }
        // Placeholder guards against cycles.
        cache.insert(id, 0);

        let Ok(data) = self.data(id) else {
            return 0;
        };
        let mut hasher = DefaultHasher::new();
        data.property_type.hash(&mut hasher);
        if !skip.contains(&NAME) {
            data.name.hash(&mut hasher);
        }
        if !skip.contains(&EXTRAS) {
            data.extras.to_string().hash(&mut hasher);
        }
        for (key, value) in data.attrs.iter() {
            if skip.contains(&key.as_str()) {
                continue;
            }
            key.hash(&mut hasher);
            value.hash_into(&mut hasher);
        }
        match &data.payload {
            Payload::None => 0u8.hash(&mut hasher),
            Payload::Array(array) => {
                array.component_type().hash(&mut hasher);
                array.as_bytes().hash(&mut hasher);
            }
            Payload::Image(bytes) => bytes.hash(&mut hasher),
        }
        let mut hash = hasher.finish();

        let edges: Vec<_> = self
            .list_child_edges(id)
            .into_iter()
            .filter(|e| !skip.contains(&e.name()))
            .map(|e| (e.name().to_string(), e.key().map(str::to_string), e.child()))
            .collect();
        for (name, key, child) in edges {
            let child_hash = self.to_hash(child, skip, cache);
            let mut edge_hasher = DefaultHasher::new();
            name.hash(&mut edge_hasher);
            key.hash(&mut edge_hasher);
            child_hash.hash(&mut edge_hasher);
            hash ^= edge_hasher.finish();
        }

        cache.insert(id, hash);
        hash
    }
}
