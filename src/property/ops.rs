//! Attribute and reference-slot operations shared by every property kind.
//!
//! References are graph edges named after the attribute. Three slot
//! shapes sit on top of that:
//!
//! - single reference: at most one keyless edge named `attr`
//! - reference list: any number of keyless edges named `attr`, ordered
//! - reference map: at most one edge named `attr` per `EdgeAttributes::key`

use serde_json::Value;

use super::data::{Payload, PropertyData};
use super::literal::Literal;
use super::property_type::PropertyType;
use crate::graph::{Edge, EdgeAttributes, EdgeId, Graph, GraphEvent, PropertyId};
use crate::util::{Error, Result};

/// Graph specialized to glTF properties.
pub type PropertyGraph = Graph<PropertyData>;

/// Reference-map slot holding extension properties.
pub const EXTENSIONS_SLOT: &str = "extensions";

impl PropertyGraph {
    /// Insert a new, empty property.
    pub fn create(&mut self, property_type: PropertyType, name: impl Into<String>) -> PropertyId {
        self.insert(PropertyData::new(property_type, name))
    }

    /// Read a property's data.
    pub fn data(&self, id: PropertyId) -> Result<&PropertyData> {
        self.value(id)
    }

    /// Mutable data of a live property; disposed properties report their kind.
    pub fn data_mut(&mut self, id: PropertyId) -> Result<&mut PropertyData> {
        self.ensure_live(id)?;
        self.value_mut(id)
    }

    /// Fail with [`Error::Disposed`] if `id` is disposed.
    pub fn ensure_live(&self, id: PropertyId) -> Result<()> {
        let data = self.value(id)?;
        if self.is_disposed(id) {
            return Err(Error::Disposed {
                kind: data.property_type.name().to_string(),
            });
        }
        Ok(())
    }

    pub fn property_type(&self, id: PropertyId) -> Result<PropertyType> {
        Ok(self.value(id)?.property_type)
    }

    fn changed(&mut self, id: PropertyId, attr: &str) {
        self.emit(&GraphEvent::Change {
            id,
            attr: attr.to_string(),
        });
    }

    // ------------------------------------------------------------------
    // Literals
    // ------------------------------------------------------------------

    pub fn name(&self, id: PropertyId) -> &str {
        self.value(id).map(|d| d.name.as_str()).unwrap_or("")
    }

    pub fn set_name(&mut self, id: PropertyId, name: impl Into<String>) -> Result<()> {
        self.data_mut(id)?.name = name.into();
        self.changed(id, "name");
        Ok(())
    }

    pub fn get_attr(&self, id: PropertyId, attr: &str) -> Option<&Literal> {
        self.value(id).ok().and_then(|d| d.attrs.get(attr))
    }

    /// Store a literal attribute. Setting [`Literal::Null`] clears it.
    pub fn set_attr(&mut self, id: PropertyId, attr: &str, value: impl Into<Literal>) -> Result<()> {
        let value = value.into();
        let data = self.data_mut(id)?;
        if value.is_null() {
            data.attrs.remove(attr);
        } else {
            data.attrs.insert(attr.to_string(), value);
        }
        self.changed(id, attr);
        Ok(())
    }

    pub fn extras(&self, id: PropertyId) -> Option<&Value> {
        self.value(id).ok().map(|d| &d.extras)
    }

    pub fn set_extras(&mut self, id: PropertyId, extras: Value) -> Result<()> {
        self.data_mut(id)?.extras = extras;
        self.changed(id, "extras");
        Ok(())
    }

    pub fn payload(&self, id: PropertyId) -> Option<&Payload> {
        self.value(id).ok().map(|d| &d.payload)
    }

    /// Live access to the payload, returned by reference.
    pub fn payload_mut(&mut self, id: PropertyId) -> Result<&mut Payload> {
        Ok(&mut self.data_mut(id)?.payload)
    }

    pub fn set_payload(&mut self, id: PropertyId, payload: Payload) -> Result<()> {
        self.data_mut(id)?.payload = payload;
        self.changed(id, "payload");
        Ok(())
    }

    /// Store an unrecognized extension object for pass-through.
    pub fn set_unknown_extension(&mut self, id: PropertyId, name: &str, value: Value) -> Result<()> {
        self.data_mut(id)?
            .unknown_extensions
            .insert(name.to_string(), value);
        self.changed(id, EXTENSIONS_SLOT);
        Ok(())
    }

    // ------------------------------------------------------------------
    // References
    // ------------------------------------------------------------------

    /// Validate both endpoints before any edge is touched.
    fn check_link(&self, parent: PropertyId, child: PropertyId) -> Result<()> {
        if parent.graph() != self.id() || child.graph() != self.id() {
            return Err(Error::CrossGraph {
                parent: parent.to_string(),
                child: child.to_string(),
            });
        }
        self.ensure_live(parent)?;
        self.ensure_live(child)
    }

    fn matching_edges(&self, id: PropertyId, attr: &str, key: Option<&str>) -> Vec<EdgeId> {
        self.list_child_edges(id)
            .into_iter()
            .filter(|e| e.name() == attr && e.key() == key)
            .map(Edge::id)
            .collect()
    }

    /// Single-reference slot.
    pub fn get_ref(&self, id: PropertyId, attr: &str) -> Option<PropertyId> {
        self.ref_edge(id, attr).map(Edge::child)
    }

    /// The edge behind a single-reference slot, for its attributes.
    pub fn ref_edge(&self, id: PropertyId, attr: &str) -> Option<&Edge> {
        self.list_child_edges(id)
            .into_iter()
            .find(|e| e.name() == attr && e.key().is_none())
    }

    /// Replace the single reference under `attr`; `None` clears it.
    pub fn set_ref(
        &mut self,
        id: PropertyId,
        attr: &str,
        child: Option<PropertyId>,
        attributes: EdgeAttributes,
    ) -> Result<()> {
        match child {
            Some(child) => self.check_link(id, child)?,
            None => self.ensure_live(id)?,
        }
        for edge in self.matching_edges(id, attr, None) {
            self.remove_edge(edge);
        }
        if let Some(child) = child {
            self.add_edge(id, child, attr, attributes)?;
        }
        self.changed(id, attr);
        Ok(())
    }

    /// Append to the reference list under `attr`. Duplicates are kept.
    pub fn add_ref(&mut self, id: PropertyId, attr: &str, child: PropertyId) -> Result<()> {
        self.check_link(id, child)?;
        self.add_edge(id, child, attr, EdgeAttributes::default())?;
        self.changed(id, attr);
        Ok(())
    }

    /// Remove the first occurrence of `child` from the list under `attr`.
    pub fn remove_ref(&mut self, id: PropertyId, attr: &str, child: PropertyId) -> Result<bool> {
        self.ensure_live(id)?;
        let edge = self
            .list_child_edges(id)
            .into_iter()
            .find(|e| e.name() == attr && e.key().is_none() && e.child() == child)
            .map(Edge::id);
        match edge {
            Some(edge) => {
                self.remove_edge(edge);
                self.changed(id, attr);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Children of the reference list under `attr`, in order.
    pub fn list_refs(&self, id: PropertyId, attr: &str) -> Vec<PropertyId> {
        self.list_child_edges(id)
            .into_iter()
            .filter(|e| e.name() == attr && e.key().is_none())
            .map(Edge::child)
            .collect()
    }

    /// Child stored under `key` of the reference map `attr`.
    pub fn get_ref_map(&self, id: PropertyId, attr: &str, key: &str) -> Option<PropertyId> {
        self.list_child_edges(id)
            .into_iter()
            .find(|e| e.name() == attr && e.key() == Some(key))
            .map(Edge::child)
    }

    /// Replace the child under `key` of the reference map `attr`.
    pub fn set_ref_map(
        &mut self,
        id: PropertyId,
        attr: &str,
        key: &str,
        child: Option<PropertyId>,
    ) -> Result<()> {
        match child {
            Some(child) => self.check_link(id, child)?,
            None => self.ensure_live(id)?,
        }
        for edge in self.matching_edges(id, attr, Some(key)) {
            self.remove_edge(edge);
        }
        if let Some(child) = child {
            self.add_edge(id, child, attr, EdgeAttributes::keyed(key))?;
        }
        self.changed(id, attr);
        Ok(())
    }

    /// Keys of the reference map `attr`, in insertion order.
    pub fn list_ref_map_keys(&self, id: PropertyId, attr: &str) -> Vec<String> {
        self.list_ref_map(id, attr).into_iter().map(|(k, _)| k).collect()
    }

    /// Key/child pairs of the reference map `attr`, in insertion order.
    pub fn list_ref_map(&self, id: PropertyId, attr: &str) -> Vec<(String, PropertyId)> {
        self.list_child_edges(id)
            .into_iter()
            .filter(|e| e.name() == attr)
            .filter_map(|e| e.key().map(|k| (k.to_string(), e.child())))
            .collect()
    }

    // ------------------------------------------------------------------
    // Extensions
    // ------------------------------------------------------------------

    /// Attach (or clear) the extension property stored under `name`.
    ///
    /// The child must be an extension property of that extension and must
    /// declare the host's kind among its legal parents.
    pub fn set_extension(
        &mut self,
        host: PropertyId,
        name: &str,
        property: Option<PropertyId>,
    ) -> Result<()> {
        if let Some(property) = property {
            let host_type = self.property_type(host)?;
            let data = self.data(property)?;
            let meta = data.extension.ok_or_else(|| {
                Error::mismatch("extension property", data.property_type.name())
            })?;
            if meta.extension_name != name {
                return Err(Error::mismatch(name, meta.extension_name));
            }
            if !meta.parent_types.contains(&host_type) {
                return Err(Error::InvalidParent {
                    extension: name.to_string(),
                    parent: host_type.name().to_string(),
                });
            }
        }
        self.set_ref_map(host, EXTENSIONS_SLOT, name, property)
    }

    pub fn get_extension(&self, host: PropertyId, name: &str) -> Option<PropertyId> {
        self.get_ref_map(host, EXTENSIONS_SLOT, name)
    }

    pub fn list_extensions(&self, host: PropertyId) -> Vec<(String, PropertyId)> {
        self.list_ref_map(host, EXTENSIONS_SLOT)
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Dispose a property: notify, drop every touching edge, release its
    /// payload. Owned children (texture infos) go with it.
    pub fn dispose(&mut self, id: PropertyId) -> Result<()> {
        self.ensure_live(id)?;
        let owned: Vec<PropertyId> = self
            .list_children(id)
            .into_iter()
            .filter(|c| {
                self.property_type(*c).map(PropertyType::is_owned_child).unwrap_or(false)
                    && self.list_parents(*c) == vec![id]
            })
            .collect();

        self.emit(&GraphEvent::Dispose { id });
        self.data_mut(id)?.payload = Payload::None;
        self.dispose_entity(id)?;

        for child in owned {
            if !self.is_disposed(child) {
                self.dispose(child)?;
            }
        }
        Ok(())
    }

    /// Remove the property from all of its parents; its children stay.
    pub fn detach_property(&mut self, id: PropertyId) -> Result<()> {
        self.ensure_live(id)?;
        let parents = self.list_parents(id);
        self.detach(id)?;
        for parent in parents {
            if !self.is_disposed(parent) {
                self.changed(parent, "detach");
            }
        }
        Ok(())
    }

    /// Parents that are not the given root.
    pub fn list_users(&self, id: PropertyId, root: PropertyId) -> Vec<PropertyId> {
        self.list_parents(id).into_iter().filter(|p| *p != root).collect()
    }

    /// Live ids of one kind, in creation order.
    pub fn ids_of_type(&self, property_type: PropertyType) -> Vec<PropertyId> {
        self.ids()
            .filter(|id| self.property_type(*id).ok() == Some(property_type))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::ExtensionMeta;

    fn pair() -> (PropertyGraph, PropertyId, PropertyId) {
        let mut g = PropertyGraph::new();
        let a = g.create(PropertyType::Node, "a");
        let b = g.create(PropertyType::Mesh, "b");
        (g, a, b)
    }

    #[test]
    fn test_literal_copy_on_set() {
        let (mut g, a, _) = pair();
        let mut t = vec![1.0, 2.0, 3.0];
        g.set_attr(a, "translation", t.as_slice()).unwrap();
        t[0] = 9.0;
        assert_eq!(g.get_attr(a, "translation").and_then(Literal::as_floats), Some(&[1.0, 2.0, 3.0][..]));
    }

    #[test]
    fn test_single_ref_replaces() {
        let (mut g, a, b) = pair();
        let c = g.create(PropertyType::Mesh, "c");
        g.set_ref(a, "mesh", Some(b), EdgeAttributes::default()).unwrap();
        g.set_ref(a, "mesh", Some(c), EdgeAttributes::default()).unwrap();
        assert_eq!(g.get_ref(a, "mesh"), Some(c));
        assert!(g.list_parents(b).is_empty());
        g.set_ref(a, "mesh", None, EdgeAttributes::default()).unwrap();
        assert_eq!(g.get_ref(a, "mesh"), None);
        assert!(g.list_child_edges(a).is_empty());
    }

    #[test]
    fn test_ref_list_remove_first_only() {
        let (mut g, a, b) = pair();
        g.add_ref(a, "children", b).unwrap();
        g.add_ref(a, "children", b).unwrap();
        assert_eq!(g.list_refs(a, "children"), vec![b, b]);
        assert!(g.remove_ref(a, "children", b).unwrap());
        assert_eq!(g.list_refs(a, "children"), vec![b]);
        assert_eq!(g.list_parent_edges(b).len(), 1);
    }

    #[test]
    fn test_ref_map() {
        let (mut g, a, b) = pair();
        let c = g.create(PropertyType::Accessor, "c");
        g.set_ref_map(a, "attributes", "POSITION", Some(b)).unwrap();
        g.set_ref_map(a, "attributes", "NORMAL", Some(c)).unwrap();
        g.set_ref_map(a, "attributes", "POSITION", Some(c)).unwrap();
        assert_eq!(g.list_ref_map_keys(a, "attributes"), vec!["NORMAL", "POSITION"]);
        assert_eq!(g.get_ref_map(a, "attributes", "POSITION"), Some(c));
        assert_eq!(g.get_ref(a, "attributes"), None);
    }

    #[test]
    fn test_repeated_set_ref_reuses_edges() {
        let (mut g, a, b) = pair();
        let c = g.create(PropertyType::Mesh, "c");
        for i in 0..50 {
            let child = if i % 2 == 0 { b } else { c };
            g.set_ref(a, "mesh", Some(child), EdgeAttributes::default()).unwrap();
        }
        assert_eq!(g.get_ref(a, "mesh"), Some(c));
        assert_eq!(g.edge_count(), 1);
        assert_eq!(g.edge_capacity(), 1);
    }

    #[test]
    fn test_unknown_extension_emits_change() {
        use std::cell::RefCell;
        use std::rc::Rc;

        let (mut g, a, _) = pair();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        g.on_event(move |event| sink.borrow_mut().push(event.clone()));

        g.set_unknown_extension(a, "EXT_thing", serde_json::json!({"x": 1})).unwrap();
        assert_eq!(
            seen.borrow().as_slice(),
            &[GraphEvent::Change { id: a, attr: EXTENSIONS_SLOT.to_string() }]
        );
        assert_eq!(g.data(a).unwrap().unknown_extensions()["EXT_thing"]["x"], 1);
    }

    #[test]
    fn test_disposed_mutation_fails() {
        let (mut g, a, b) = pair();
        g.set_ref(a, "mesh", Some(b), EdgeAttributes::default()).unwrap();
        g.dispose(b).unwrap();
        assert!(g.is_disposed(b));
        assert_eq!(g.get_ref(a, "mesh"), None);
        assert!(matches!(g.set_name(b, "x"), Err(Error::Disposed { kind }) if kind == "Mesh"));
        assert!(g.dispose(b).is_err());
        assert!(g.add_ref(a, "children", b).is_err());
    }

    #[test]
    fn test_extension_parent_types() {
        static PARENTS: [PropertyType; 1] = [PropertyType::Material];
        let (mut g, node, _) = pair();
        let material = g.create(PropertyType::Material, "m");
        let ext = g.create(PropertyType::Extension("Thing"), "");
        g.data_mut(ext).unwrap().extension = Some(ExtensionMeta {
            extension_name: "EXT_thing",
            parent_types: &PARENTS,
        });

        assert!(matches!(
            g.set_extension(node, "EXT_thing", Some(ext)),
            Err(Error::InvalidParent { .. })
        ));
        g.set_extension(material, "EXT_thing", Some(ext)).unwrap();
        assert_eq!(g.get_extension(material, "EXT_thing"), Some(ext));
        assert!(g.set_extension(material, "EXT_other", Some(ext)).is_err());
    }
}
