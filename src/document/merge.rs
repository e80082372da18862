//! Whole-document copies.

use super::Document;
use crate::graph::PropertyId;
use crate::property::{copy_properties, IdentityMap};
use crate::util::Result;

impl Document {
    /// Deep copy into an independent document with its own graph.
    ///
    /// Every property reachable from the root is copied once and every
    /// reference is rewritten to the copy. Unreachable properties are
    /// left behind. Extensions are registered anew on the copy.
    pub fn clone_document(&self) -> Result<Document> {
        let mut out = Document::with_config(self.config.clone());
        out.adopt_extensions(self);

        let (source_root, target_root) = (self.root.id(), out.root.id());
        let mut map = IdentityMap::new();
        map.insert(source_root, target_root);
        let ids = self.graph.collect_reachable(source_root);
        copy_properties(&self.graph, &mut out.graph, &ids, &mut map)?;

        *out.graph.data_mut(target_root)? = self.graph.data(source_root)?.clone();
        for edge in self.graph.list_child_edges(source_root) {
            out.graph.add_edge(
                target_root,
                map[&edge.child()],
                edge.name(),
                edge.attributes().clone(),
            )?;
        }
        Ok(out)
    }

    /// Import everything reachable from `other`'s root.
    ///
    /// Copies are appended to this document's root lists; this document's
    /// default scene and asset metadata are kept. Extensions registered
    /// on `other` are registered here too. Returns the map from `other`'s
    /// ids to the new ones.
    pub fn merge(&mut self, other: &Document) -> Result<IdentityMap> {
        self.adopt_extensions(other);

        let (source_root, target_root) = (other.root.id(), self.root.id());
        let mut map = IdentityMap::new();
        map.insert(source_root, target_root);
        let ids = other.graph.collect_reachable(source_root);
        let created = copy_properties(&other.graph, &mut self.graph, &ids, &mut map)?;

        for edge in other.graph.list_child_edges(source_root) {
            let child: PropertyId = map[&edge.child()];
            match edge.key() {
                Some(key) => {
                    if self.graph.get_ref_map(target_root, edge.name(), key).is_none() {
                        self.graph.set_ref_map(target_root, edge.name(), key, Some(child))?;
                    }
                }
                None if edge.name() == "defaultScene" => {}
                None => self.graph.add_ref(target_root, edge.name(), child)?,
            }
        }

        self.config
            .logger
            .info(&format!("merged {} properties", created.len()));
        Ok(map)
    }

    fn adopt_extensions(&mut self, other: &Document) {
        for (class, required) in other.extensions.classes() {
            class.install(self);
            if required {
                self.extensions.set_required(class.name(), true);
            }
        }
        let deps: Vec<_> = other
            .extensions
            .dependencies()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        for (key, value) in deps {
            if !self.extensions.has_dependency(&key) {
                self.extensions.register_dependency(key, value);
            }
        }
    }
}
