//! Disposal of properties nothing uses.

use futures::future::LocalBoxFuture;

use crate::document::{Document, Transform};
use crate::graph::PropertyId;
use crate::property::PropertyType;
use crate::util::Result;

/// Pipeline step running [`prune`].
#[derive(Clone, Copy, Debug, Default)]
pub struct Prune;

impl Transform for Prune {
    fn name(&self) -> &str {
        "prune"
    }

    fn apply<'a>(&'a self, doc: &'a mut Document) -> LocalBoxFuture<'a, Result<()>> {
        Box::pin(async move { prune(doc).map(|_| ()) })
    }
}

/// Whether `id` should go in this round.
///
/// Scenes and animations are always kept. Other top-level properties need
/// a user besides the root; nested ones need any parent. The last buffer
/// is kept so textures can still be embedded.
fn is_unused(doc: &Document, id: PropertyId, property_type: PropertyType) -> bool {
    let graph = doc.graph();
    let root = doc.root().id();
    match property_type {
        PropertyType::Root | PropertyType::Scene | PropertyType::Animation => false,
        t if t.is_top_level() => graph.list_users(id, root).is_empty(),
        _ => graph.list_parents(id).is_empty(),
    }
}

/// Dispose every property unreachable from a scene, an animation or a
/// used property, repeating until a round disposes nothing. Returns the
/// number of properties disposed.
pub fn prune(doc: &mut Document) -> Result<usize> {
    let mut total = 0;
    loop {
        let mut unused: Vec<PropertyId> = doc
            .graph()
            .ids()
            .filter(|id| {
                doc.graph()
                    .property_type(*id)
                    .is_ok_and(|t| is_unused(doc, *id, t))
            })
            .collect();

        let buffers = doc.root().list_buffers(doc);
        let unused_buffers = buffers.iter().filter(|b| unused.contains(&b.id())).count();
        if !buffers.is_empty() && unused_buffers == buffers.len() {
            let keep = buffers[0].id();
            unused.retain(|id| *id != keep);
        }

        if unused.is_empty() {
            break;
        }
        for id in unused {
            // Owned children may already have gone with their parent.
            if !doc.graph().is_disposed(id) {
                doc.graph_mut().dispose(id)?;
                total += 1;
            }
        }
    }
    doc.logger().info(&format!("prune: disposed {} properties", total));
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::properties::ElementType;

    #[test]
    fn test_keeps_used_graph() {
        let mut doc = Document::new();
        let buffer = doc.create_buffer("");
        let accessor = doc.create_accessor("");
        accessor
            .set_element_type(&mut doc, ElementType::Vec3)
            .unwrap()
            .set_array(&mut doc, vec![0.0f32; 3])
            .unwrap()
            .set_buffer(&mut doc, Some(buffer))
            .unwrap();
        let primitive = doc.create_primitive();
        primitive.set_attribute(&mut doc, "POSITION", Some(accessor)).unwrap();
        let mesh = doc.create_mesh("");
        mesh.add_primitive(&mut doc, primitive).unwrap();
        let node = doc.create_node("");
        node.set_mesh(&mut doc, Some(mesh)).unwrap();
        let scene = doc.create_scene("");
        scene.add_child(&mut doc, node).unwrap();

        assert_eq!(prune(&mut doc).unwrap(), 0);
        assert!(!accessor.is_disposed(&doc));
    }

    #[test]
    fn test_cascades_and_is_idempotent() {
        let mut doc = Document::new();
        let accessor = doc.create_accessor("");
        let primitive = doc.create_primitive();
        primitive.set_indices(&mut doc, Some(accessor)).unwrap();
        let mesh = doc.create_mesh("");
        mesh.add_primitive(&mut doc, primitive).unwrap();
        let orphan = doc.create_node("orphan");
        orphan.set_mesh(&mut doc, Some(mesh)).unwrap();
        doc.create_scene("empty");

        // node, mesh, primitive, accessor: one per round
        assert_eq!(prune(&mut doc).unwrap(), 4);
        assert!(orphan.is_disposed(&doc));
        assert!(mesh.is_disposed(&doc));
        assert!(accessor.is_disposed(&doc));
        assert_eq!(doc.root().list_scenes(&doc).len(), 1);
        assert_eq!(prune(&mut doc).unwrap(), 0);
    }

    #[test]
    fn test_last_buffer_kept() {
        let mut doc = Document::new();
        let a = doc.create_buffer("a");
        let b = doc.create_buffer("b");
        prune(&mut doc).unwrap();
        assert!(!a.is_disposed(&doc));
        assert!(b.is_disposed(&doc));
    }
}
