//! Integration tests for the document model: reference symmetry,
//! disposal, cloning, merging and extension properties.

use std::cell::RefCell;
use std::rc::Rc;

use gltf_graph::extension::{LightsPunctual, MaterialsEmissiveStrength};
use gltf_graph::graph::GraphEvent;
use gltf_graph::prelude::*;
use gltf_graph::transforms::{dedup, prune};

#[test]
fn test_reference_symmetry() {
    let mut doc = Document::new();
    let mesh = doc.create_mesh("shared");
    let a = doc.create_node("a");
    let b = doc.create_node("b");
    a.set_mesh(&mut doc, Some(mesh)).unwrap();
    b.set_mesh(&mut doc, Some(mesh)).unwrap();

    let root = doc.root().id();
    let mut users = doc.graph().list_users(mesh.id(), root);
    users.sort();
    assert_eq!(users, vec![a.id(), b.id()]);

    for edge in doc.graph().list_parent_edges(mesh.id()) {
        let outgoing = doc.graph().list_child_edges(edge.parent());
        assert!(outgoing.iter().any(|e| e.id() == edge.id()));
    }

    b.set_mesh(&mut doc, None).unwrap();
    assert_eq!(doc.graph().list_users(mesh.id(), root), vec![a.id()]);
}

#[test]
fn test_node_has_one_parent_node() {
    let mut doc = Document::new();
    let first = doc.create_node("first");
    let second = doc.create_node("second");
    let child = doc.create_node("child");
    first.add_child(&mut doc, child).unwrap();
    second.add_child(&mut doc, child).unwrap();
    assert!(first.list_children(&doc).is_empty());
    assert_eq!(child.parent_node(&doc), Some(second));
}

#[test]
fn test_dispose_removes_every_edge() {
    let mut doc = Document::new();
    let accessor = doc.create_accessor("");
    let primitive = doc.create_primitive();
    primitive.set_attribute(&mut doc, "POSITION", Some(accessor)).unwrap();
    primitive.set_indices(&mut doc, Some(accessor)).unwrap();

    accessor.dispose(&mut doc).unwrap();
    assert!(accessor.is_disposed(&doc));
    assert_eq!(primitive.attribute(&doc, "POSITION"), None);
    assert_eq!(primitive.indices(&doc), None);
    assert!(doc.root().list_accessors(&doc).is_empty());
    assert!(matches!(
        accessor.set_name(&mut doc, "again"),
        Err(Error::Disposed { .. })
    ));
}

#[test]
fn test_dispose_events() {
    let mut doc = Document::new();
    let node = doc.create_node("n");
    let scene = doc.create_scene("s");
    scene.add_child(&mut doc, node).unwrap();

    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = events.clone();
    doc.graph_mut().on_event(move |e| sink.borrow_mut().push(e.clone()));
    node.dispose(&mut doc).unwrap();

    let events = events.borrow();
    assert_eq!(events.first(), Some(&GraphEvent::Dispose { id: node.id() }));
    let removed = events
        .iter()
        .filter(|e| matches!(e, GraphEvent::EdgeRemove { child, .. } if *child == node.id()))
        .count();
    // root list and scene
    assert_eq!(removed, 2);
}

#[test]
fn test_clone_is_shallow_and_independent() {
    let mut doc = Document::new();
    let mesh = doc.create_mesh("m");
    let node = doc.create_node("n");
    node.set_translation(&mut doc, [1.0, 2.0, 3.0])
        .unwrap()
        .set_mesh(&mut doc, Some(mesh))
        .unwrap();

    let copy = node.clone_in(&mut doc).unwrap();
    assert_ne!(copy, node);
    assert_eq!(copy.mesh(&doc), Some(mesh));
    assert!(copy.equals(&doc, node));

    copy.set_translation(&mut doc, [9.0, 9.0, 9.0]).unwrap();
    assert_eq!(node.translation(&doc), [1.0, 2.0, 3.0]);
    assert!(!copy.equals(&doc, node));
    assert_eq!(doc.root().list_nodes(&doc), vec![node, copy]);
}

#[test]
fn test_array_copy_on_set() {
    let mut doc = Document::new();
    let accessor = doc.create_accessor("");
    let mut data = vec![1.0f32, 2.0, 3.0];
    accessor.set_array(&mut doc, data.clone()).unwrap();
    data[0] = 100.0;
    assert_eq!(accessor.get_element(&doc, 0).unwrap(), vec![1.0]);

    // Live reference: edits through array_mut are visible to readers.
    accessor.array_mut(&mut doc).unwrap().set(1, 5.0).unwrap();
    assert_eq!(accessor.get_element(&doc, 1).unwrap(), vec![5.0]);
}

#[test]
fn test_clone_document_is_deep() {
    let mut doc = Document::new();
    let node = doc.create_node("n");
    let scene = doc.create_scene("s");
    scene.add_child(&mut doc, node).unwrap();
    doc.root().set_default_scene(&mut doc, Some(scene)).unwrap();

    let mut copy = doc.clone_document().unwrap();
    let copied_scene = copy.root().default_scene(&copy).unwrap();
    let copied_node = copied_scene.list_children(&copy)[0];
    assert_eq!(copied_node.name(&copy), "n");
    copied_node.set_name(&mut copy, "renamed").unwrap();
    assert_eq!(node.name(&doc), "n");
}

#[test]
fn test_cross_document_reference_fails() {
    let mut first = Document::new();
    let mut second = Document::new();
    let mesh = first.create_mesh("m");
    let node = second.create_node("n");
    assert!(matches!(
        node.set_mesh(&mut second, Some(mesh)),
        Err(Error::CrossGraph { .. })
    ));
}

#[test]
fn test_merge_then_dedup_renames_uris() {
    fn part(value: f32) -> Document {
        let mut doc = Document::new();
        let buffer = doc.create_buffer("default");
        buffer.set_uri(&mut doc, "default.bin").unwrap();
        let accessor = doc.create_accessor("");
        accessor
            .set_array(&mut doc, vec![value, value])
            .unwrap()
            .set_buffer(&mut doc, Some(buffer))
            .unwrap();
        let primitive = doc.create_primitive();
        primitive.set_attribute(&mut doc, "POSITION", Some(accessor)).unwrap();
        let mesh = doc.create_mesh("");
        mesh.add_primitive(&mut doc, primitive).unwrap();
        doc
    }

    let mut same = part(1.0);
    same.merge(&part(1.0)).unwrap();
    assert_eq!(same.root().list_buffers(&same).len(), 2);
    dedup(&mut same).unwrap();
    assert_eq!(same.root().list_buffers(&same).len(), 1);
    assert_eq!(same.root().list_accessors(&same).len(), 1);

    let mut different = part(1.0);
    different.merge(&part(2.0)).unwrap();
    dedup(&mut different).unwrap();
    let uris: Vec<String> = different
        .root()
        .list_buffers(&different)
        .iter()
        .map(|b| b.uri(&different).to_string())
        .collect();
    assert_eq!(uris, vec!["default.bin".to_string(), "default_2.bin".to_string()]);
}

#[test]
fn test_prune_is_idempotent() {
    let mut doc = Document::new();
    let used = doc.create_material("used");
    let unused = doc.create_material("unused");
    let primitive = doc.create_primitive();
    primitive.set_material(&mut doc, Some(used)).unwrap();
    let mesh = doc.create_mesh("");
    mesh.add_primitive(&mut doc, primitive).unwrap();
    let node = doc.create_node("");
    node.set_mesh(&mut doc, Some(mesh)).unwrap();
    let scene = doc.create_scene("");
    scene.add_child(&mut doc, node).unwrap();

    assert!(prune(&mut doc).unwrap() > 0);
    assert!(unused.is_disposed(&doc));
    assert!(!used.is_disposed(&doc));
    assert_eq!(prune(&mut doc).unwrap(), 0);
}

#[test]
fn test_extension_dispose_detaches_hosts() {
    let mut doc = Document::new();
    let lights = doc.create_extension::<LightsPunctual>();
    let light = lights.create_light(&mut doc, "key").unwrap();
    let node = doc.create_node("lamp");
    node.set_extension(&mut doc, "KHR_lights_punctual", Some(light.id()))
        .unwrap();

    assert!(doc.dispose_extension("KHR_lights_punctual").unwrap());
    assert!(light.is_disposed(&doc));
    assert_eq!(node.get_extension(&doc, "KHR_lights_punctual"), None);
    assert!(!doc.extensions().contains("KHR_lights_punctual"));
}

#[test]
fn test_extension_survives_clone() {
    let mut doc = Document::new();
    let ext = doc.create_extension::<MaterialsEmissiveStrength>();
    let strength = ext.create_emissive_strength(&mut doc);
    strength.set_emissive_strength(&mut doc, 4.0).unwrap();
    let material = doc.create_material("hot");
    material
        .set_extension(&mut doc, "KHR_materials_emissive_strength", Some(strength.id()))
        .unwrap();

    let copy = doc.clone_document().unwrap();
    assert!(copy.extension::<MaterialsEmissiveStrength>().is_some());
    let copied = copy.root().list_materials(&copy)[0];
    let id = copied
        .get_extension(&copy, "KHR_materials_emissive_strength")
        .unwrap();
    assert_ne!(id, strength.id());
}
