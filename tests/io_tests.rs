//! Integration tests for reading and writing `.gltf` and `.glb`.

use std::sync::Arc;

use gltf_graph::extension::{LightType, LightsPunctual, MaterialsUnlit, TextureTransformExtension};
use gltf_graph::io::{
    write_document, ContainerFormat, GltfRoot, JsonDocument, PlatformIo, ReaderOptions, UriCollision, WriterOptions,
};
use gltf_graph::prelude::*;
use gltf_graph::util::{MemoryLogger, Verbosity};
use gltf_graph::DocumentConfig;

use serde_json::{json, Value};
use tempfile::tempdir;

/// 1x1 PNG.
const PNG: [u8; 67] = [
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52,
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F, 0x15, 0xC4,
    0x89, 0x00, 0x00, 0x00, 0x0A, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00, 0x01, 0x00, 0x00,
    0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE,
    0x42, 0x60, 0x82,
];

/// Scene with a textured, skinned, animated triangle and a camera.
fn sample_document() -> Document {
    let mut doc = Document::new();
    let buffer = doc.create_buffer("geometry");

    let position = doc.create_accessor("position");
    position
        .set_element_type(&mut doc, ElementType::Vec3)
        .unwrap()
        .set_array(&mut doc, vec![0.0f32, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0])
        .unwrap()
        .set_buffer(&mut doc, Some(buffer))
        .unwrap();
    let indices = doc.create_accessor("indices");
    indices
        .set_array(&mut doc, vec![0u16, 1, 2])
        .unwrap()
        .set_buffer(&mut doc, Some(buffer))
        .unwrap();

    let texture = doc.create_texture("checker");
    texture.set_image(&mut doc, &PNG).unwrap();
    let material = doc.create_material("paint");
    material
        .set_base_color_factor(&mut doc, [1.0, 0.5, 0.5, 1.0])
        .unwrap()
        .set_texture(&mut doc, TextureSlot::BaseColor, Some(texture))
        .unwrap()
        .set_double_sided(&mut doc, true)
        .unwrap();

    let primitive = doc.create_primitive();
    primitive
        .set_attribute(&mut doc, "POSITION", Some(position))
        .unwrap()
        .set_indices(&mut doc, Some(indices))
        .unwrap()
        .set_material(&mut doc, Some(material))
        .unwrap();
    let mesh = doc.create_mesh("triangle");
    mesh.add_primitive(&mut doc, primitive).unwrap();

    let times = doc.create_accessor("times");
    times
        .set_array(&mut doc, vec![0.0f32, 1.0])
        .unwrap()
        .set_buffer(&mut doc, Some(buffer))
        .unwrap();
    let offsets = doc.create_accessor("offsets");
    offsets
        .set_element_type(&mut doc, ElementType::Vec3)
        .unwrap()
        .set_array(&mut doc, vec![0.0f32, 0.0, 0.0, 0.0, 2.0, 0.0])
        .unwrap()
        .set_buffer(&mut doc, Some(buffer))
        .unwrap();

    let camera = doc.create_camera("eye");
    camera.set_yfov(&mut doc, 0.8).unwrap().set_znear(&mut doc, 0.1).unwrap();

    let parent = doc.create_node("parent");
    parent
        .set_translation(&mut doc, [0.0, 1.0, 0.0])
        .unwrap()
        .set_camera(&mut doc, Some(camera))
        .unwrap();
    let child = doc.create_node("child");
    child.set_mesh(&mut doc, Some(mesh)).unwrap();
    parent.add_child(&mut doc, child).unwrap();

    let sampler = doc.create_animation_sampler();
    sampler
        .set_input(&mut doc, Some(times))
        .unwrap()
        .set_output(&mut doc, Some(offsets))
        .unwrap();
    let channel = doc.create_animation_channel();
    channel
        .set_target_node(&mut doc, Some(child))
        .unwrap()
        .set_target_path(&mut doc, TargetPath::Translation)
        .unwrap()
        .set_sampler(&mut doc, Some(sampler))
        .unwrap();
    let animation = doc.create_animation("bounce");
    animation
        .add_sampler(&mut doc, sampler)
        .unwrap()
        .add_channel(&mut doc, channel)
        .unwrap();

    let scene = doc.create_scene("main");
    scene.add_child(&mut doc, parent).unwrap();
    doc.root().set_default_scene(&mut doc, Some(scene)).unwrap();
    doc
}

fn assert_sample(doc: &Document) {
    let root = doc.root();
    let scene = root.default_scene(doc).unwrap();
    assert_eq!(scene.name(doc), "main");
    let parent = scene.list_children(doc)[0];
    assert_eq!(parent.translation(doc), [0.0, 1.0, 0.0]);
    assert_eq!(parent.camera(doc).unwrap().yfov(doc), 0.8);

    let child = parent.list_children(doc)[0];
    let mesh = child.mesh(doc).unwrap();
    assert_eq!(mesh.name(doc), "triangle");
    let primitive = mesh.list_primitives(doc)[0];
    let position = primitive.attribute(doc, "POSITION").unwrap();
    assert_eq!(position.element_type(doc), ElementType::Vec3);
    assert_eq!(position.get_element(doc, 1).unwrap(), vec![1.0, 0.0, 0.0]);
    assert_eq!(position.min(doc).unwrap(), vec![0.0, 0.0, 0.0]);
    let indices = primitive.indices(doc).unwrap();
    assert_eq!(indices.array(doc), Some(&AccessorArray::U16(vec![0, 1, 2])));

    let material = primitive.material(doc).unwrap();
    assert!(material.double_sided(doc));
    assert_eq!(material.base_color_factor(doc), [1.0, 0.5, 0.5, 1.0]);
    let texture = material.texture(doc, TextureSlot::BaseColor).unwrap();
    assert_eq!(texture.image(doc), Some(&PNG[..]));
    assert_eq!(texture.mime_type(doc), "image/png");
    assert_eq!(texture.size(doc), Some((1, 1)));

    let animation = root.list_animations(doc)[0];
    let channel = animation.list_channels(doc)[0];
    assert_eq!(channel.target_node(doc), Some(child));
    assert_eq!(channel.target_path(doc), Some(TargetPath::Translation));
    let output = channel.sampler(doc).unwrap().output(doc).unwrap();
    assert_eq!(output.get_element(doc, 1).unwrap(), vec![0.0, 2.0, 0.0]);
}

#[test]
fn test_glb_roundtrip() {
    let io = PlatformIo::new();
    let bytes = io.write_glb_bytes(&sample_document()).unwrap();
    assert_eq!(&bytes[0..4], b"glTF");
    assert_eq!(bytes.len() % 4, 0);

    let doc = io.read_glb_bytes(&bytes).unwrap();
    assert_sample(&doc);
    assert_eq!(doc.root().list_buffers(&doc).len(), 1);
}

#[test]
fn test_gltf_roundtrip_on_disk() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("sample.gltf");
    let io = PlatformIo::new();
    io.write(&path, &sample_document()).unwrap();
    assert!(dir.path().join("geometry.bin").exists());
    assert!(dir.path().join("checker.png").exists());

    let doc = io.read(&path).unwrap();
    assert_sample(&doc);

    // A second write of the re-read document is byte-identical.
    let first = io.write_json(&doc).unwrap();
    let again = io.read_json(&first).unwrap();
    assert_eq!(io.write_json(&again).unwrap(), first);
}

#[test]
fn test_index_assignment_is_deterministic() {
    let doc = sample_document();
    let a = write_document(&doc, &WriterOptions::default()).unwrap();
    let b = write_document(&doc, &WriterOptions::default()).unwrap();
    assert_eq!(a, b);

    // Shared references get one index.
    let json = &a.json;
    assert_eq!(json.meshes.len(), 1);
    assert_eq!(json.nodes.len(), 2);
    assert_eq!(json.nodes[0].children, vec![1]);
    assert_eq!(json.nodes[1].mesh, Some(0));
    assert_eq!(json.scene, Some(0));
    assert_eq!(json.accessors.len(), 4);
}

#[test]
fn test_glb_rejects_second_buffer() {
    let mut doc = sample_document();
    let extra = doc.create_buffer("extra");
    let accessor = doc.create_accessor("stray");
    accessor
        .set_array(&mut doc, vec![1.0f32])
        .unwrap()
        .set_buffer(&mut doc, Some(extra))
        .unwrap();
    let primitive = doc.root().list_meshes(&doc)[0].list_primitives(&doc)[0];
    primitive.set_attribute(&mut doc, "_EXTRA", Some(accessor)).unwrap();

    let options = WriterOptions::default().with_format(ContainerFormat::Glb);
    assert!(matches!(write_document(&doc, &options), Err(Error::WriteFailed(_))));
    assert!(write_document(&doc, &WriterOptions::default()).is_ok());
}

#[test]
fn test_duplicate_uri_policy() {
    let mut doc = sample_document();
    let textures = doc.root().list_textures(&doc);
    textures[0].set_uri(&mut doc, "geometry.bin").unwrap();

    let renamed = PlatformIo::new().write_json(&doc).unwrap();
    assert!(renamed.resources.contains_key("geometry.bin"));
    assert!(renamed.resources.contains_key("geometry_2.bin"));

    let strict = PlatformIo::new().with_uri_collision(UriCollision::Fail);
    assert!(matches!(strict.write_json(&doc), Err(Error::DuplicateUri(_))));
}

#[test]
fn test_extensions_roundtrip() {
    let mut doc = sample_document();
    let lights = doc.create_extension::<LightsPunctual>();
    let sun = lights.create_light(&mut doc, "sun").unwrap();
    sun.set_light_type(&mut doc, LightType::Directional)
        .unwrap()
        .set_intensity(&mut doc, 3.0)
        .unwrap();
    let parent = doc.root().list_nodes(&doc)[0];
    parent
        .set_extension(&mut doc, "KHR_lights_punctual", Some(sun.id()))
        .unwrap();

    let unlit = doc.create_extension::<MaterialsUnlit>();
    let marker = unlit.create_unlit(&mut doc);
    let material = doc.root().list_materials(&doc)[0];
    material
        .set_extension(&mut doc, "KHR_materials_unlit", Some(marker.id()))
        .unwrap();
    doc.extensions_mut().set_required("KHR_materials_unlit", true);

    let transforms = doc.create_extension::<TextureTransformExtension>();
    let transform = transforms.create_texture_transform(&mut doc);
    transform.set_scale(&mut doc, [2.0, 2.0]).unwrap();
    let info = material.texture_info(&doc, TextureSlot::BaseColor).unwrap();
    info.set_extension(&mut doc, "KHR_texture_transform", Some(transform.id()))
        .unwrap();

    let io = PlatformIo::new();
    let json_doc = io.write_json(&doc).unwrap();
    assert_eq!(json_doc.json.extensions_required, vec!["KHR_materials_unlit".to_string()]);
    assert_eq!(json_doc.json.extensions_used.len(), 3);

    let back = io.read_json(&json_doc).unwrap();
    assert!(back.extensions().is_required("KHR_materials_unlit"));
    let node = back.root().list_nodes(&back)[0];
    let light_id = node.get_extension(&back, "KHR_lights_punctual").unwrap();
    let light = back.list_extension_properties("KHR_lights_punctual");
    assert_eq!(light.len(), 1);
    assert_eq!(light[0].id(), light_id);
    assert_eq!(light[0].get(&back, "type").and_then(|v| v.as_str()), Some("directional"));

    let material = back.root().list_materials(&back)[0];
    assert!(material.get_extension(&back, "KHR_materials_unlit").is_some());
    let info = material.texture_info(&back, TextureSlot::BaseColor).unwrap();
    assert!(info.get_extension(&back, "KHR_texture_transform").is_some());
}

#[test]
fn test_unsupported_required_extension_fails() {
    let mut json_doc = PlatformIo::new().write_json(&sample_document()).unwrap();
    json_doc.json.extensions_used.push("EXT_meshopt_compression".into());
    json_doc.json.extensions_required.push("EXT_meshopt_compression".into());
    let err = PlatformIo::new().read_json(&json_doc).unwrap_err();
    assert!(matches!(err, Error::MissingExtension(name) if name == "EXT_meshopt_compression"));
}

#[test]
fn test_missing_image_is_logged_and_skipped() {
    let mut json_doc = PlatformIo::new().write_json(&sample_document()).unwrap();
    json_doc.resources.remove("checker.png");

    let logger = Arc::new(MemoryLogger::new(Verbosity::Debug));
    let options = ReaderOptions {
        config: DocumentConfig::default().with_logger(logger.clone()),
        ..ReaderOptions::default()
    };
    let doc = PlatformIo::new()
        .with_reader_options(options)
        .read_json(&json_doc)
        .unwrap();
    let texture = doc.root().list_textures(&doc)[0];
    assert!(texture.image(&doc).is_none());
    assert!(logger
        .messages(Verbosity::Warn)
        .iter()
        .any(|m| m.contains("checker.png")));
}

/// One float accessor over a 16-byte `data.bin`, patched by `edit`.
fn float_asset(edit: impl FnOnce(&mut Value)) -> JsonDocument {
    let mut json = json!({
        "asset": {"version": "2.0"},
        "buffers": [{"uri": "data.bin", "byteLength": 16}],
        "bufferViews": [{"buffer": 0, "byteLength": 16}],
        "accessors": [{"bufferView": 0, "componentType": 5126, "count": 4, "type": "SCALAR"}],
    });
    edit(&mut json);
    let root: GltfRoot = serde_json::from_value(json).unwrap();
    let mut json_doc = JsonDocument {
        json: root,
        ..JsonDocument::default()
    };
    json_doc.resources.insert("data.bin".into(), vec![0u8; 16]);
    json_doc
}

#[test]
fn test_well_formed_accessor_reads() {
    let doc = PlatformIo::new().read_json(&float_asset(|_| {})).unwrap();
    assert_eq!(doc.root().list_accessors(&doc)[0].count(&doc), 4);
}

#[test]
fn test_oversized_accessor_count_fails() {
    let huge = 2_305_843_009_213_693_952u64;
    let io = PlatformIo::new();

    let viewed = float_asset(|j| j["accessors"][0]["count"] = json!(huge));
    assert!(matches!(io.read_json(&viewed), Err(Error::InvalidStructure(_))));

    let zeroed = float_asset(|j| {
        j["accessors"][0]["count"] = json!(huge);
        j["accessors"][0].as_object_mut().unwrap().remove("bufferView");
    });
    assert!(matches!(io.read_json(&zeroed), Err(Error::InvalidStructure(_))));
}

#[test]
fn test_dangling_view_and_buffer_indices_fail() {
    let io = PlatformIo::new();
    let no_view = float_asset(|j| j["accessors"][0]["bufferView"] = json!(7));
    assert!(matches!(io.read_json(&no_view), Err(Error::InvalidStructure(_))));

    let no_buffer = float_asset(|j| j["bufferViews"][0]["buffer"] = json!(3));
    assert!(matches!(io.read_json(&no_buffer), Err(Error::InvalidStructure(_))));
}

#[test]
fn test_ranges_past_buffer_end_fail() {
    let io = PlatformIo::new();
    let offset = float_asset(|j| {
        j["accessors"][0]["count"] = json!(2);
        j["accessors"][0]["byteOffset"] = json!(12);
    });
    assert!(matches!(io.read_json(&offset), Err(Error::UnexpectedEof(20))));

    let too_many = float_asset(|j| j["accessors"][0]["count"] = json!(5));
    assert!(matches!(io.read_json(&too_many), Err(Error::UnexpectedEof(20))));

    let long_view = float_asset(|j| j["bufferViews"][0]["byteLength"] = json!(32));
    assert!(matches!(io.read_json(&long_view), Err(Error::UnexpectedEof(32))));

    let far_view = float_asset(|j| j["bufferViews"][0]["byteOffset"] = json!(u64::MAX));
    assert!(matches!(io.read_json(&far_view), Err(Error::InvalidStructure(_))));
}

#[test]
fn test_escaping_image_uri_is_renamed() {
    let logger = Arc::new(MemoryLogger::new(Verbosity::Warn));
    let options = ReaderOptions {
        config: DocumentConfig::default().with_logger(logger.clone()),
        ..ReaderOptions::default()
    };
    let written = PlatformIo::new().write_json(&sample_document()).unwrap();
    let mut doc = PlatformIo::new()
        .with_reader_options(options)
        .read_json(&written)
        .unwrap();
    let texture = doc.root().list_textures(&doc)[0];
    texture.set_uri(&mut doc, "../../outside.png").unwrap();

    let json_doc = PlatformIo::new().write_json(&doc).unwrap();
    assert!(json_doc.resources.contains_key("checker.png"));
    assert!(json_doc.resources.keys().all(|uri| !uri.contains("..")));
    assert_eq!(json_doc.json.images[0].uri.as_deref(), Some("checker.png"));
    assert!(logger
        .messages(Verbosity::Warn)
        .iter()
        .any(|m| m.contains("../../outside.png")));
}

/// Material whose textures carry an image-bearing vendor extension, once
/// with a PNG fallback and once without a core `source`.
fn webp_asset() -> JsonDocument {
    let webp = b"RIFF\x04\x00\x00\x00WEBPVP8 ".to_vec();
    let root: GltfRoot = serde_json::from_value(json!({
        "asset": {"version": "2.0"},
        "extensionsUsed": ["EXT_texture_webp"],
        "images": [
            {"uri": "base.png"},
            {"uri": "base.webp", "mimeType": "image/webp"},
        ],
        "textures": [
            {"source": 0, "extensions": {"EXT_texture_webp": {"source": 1}}, "extras": {"tag": "fallback"}},
            {"extensions": {"EXT_texture_webp": {"source": 1}}},
        ],
        "materials": [{
            "pbrMetallicRoughness": {"baseColorTexture": {"index": 0}},
            "emissiveTexture": {"index": 1},
        }],
    }))
    .unwrap();
    let mut json_doc = JsonDocument {
        json: root,
        ..JsonDocument::default()
    };
    json_doc.resources.insert("base.png".into(), PNG.to_vec());
    json_doc.resources.insert("base.webp".into(), webp);
    json_doc
}

#[test]
fn test_texture_extensions_roundtrip() {
    let io = PlatformIo::new();
    let doc = io.read_json(&webp_asset()).unwrap();
    let material = doc.root().list_materials(&doc)[0];
    let textures = doc.root().list_textures(&doc);

    let base = material.texture_info(&doc, TextureSlot::BaseColor).unwrap();
    assert_eq!(material.texture(&doc, TextureSlot::BaseColor), Some(textures[0]));
    assert_eq!(base.extension_source(&doc, "EXT_texture_webp"), Some(textures[1]));
    assert!(!base.extension_source_only(&doc));
    assert_eq!(base.texture_extras(&doc), json!({"tag": "fallback"}));

    let emissive = material.texture_info(&doc, TextureSlot::Emissive).unwrap();
    assert_eq!(material.texture(&doc, TextureSlot::Emissive), Some(textures[1]));
    assert!(emissive.extension_source_only(&doc));
    assert!(emissive.texture_extensions(&doc).contains_key("EXT_texture_webp"));

    let out = io.write_json(&doc).unwrap();
    let json = &out.json;
    assert!(json.extensions_used.contains(&"EXT_texture_webp".to_string()));
    assert_eq!(json.textures.len(), 2);
    assert_eq!(json.textures[0].source, Some(0));
    assert_eq!(json.textures[0].extensions["EXT_texture_webp"], json!({"source": 1}));
    assert_eq!(json.textures[0].extras, json!({"tag": "fallback"}));
    assert_eq!(json.textures[1].source, None);
    assert_eq!(json.textures[1].extensions["EXT_texture_webp"], json!({"source": 1}));
    assert_eq!(json.materials[0].emissive_texture.as_ref().map(|t| t.index), Some(1));

    let again = io.read_json(&out).unwrap();
    assert_eq!(io.write_json(&again).unwrap(), out);
}

#[test]
fn test_texture_extension_without_written_image_is_dropped() {
    let io = PlatformIo::new();
    let mut source = webp_asset();
    source.resources.remove("base.webp");
    let mut doc = io.read_json(&source).unwrap();
    let webp = doc.root().list_textures(&doc)[1];
    webp.set_uri(&mut doc, "").unwrap();

    let out = io.write_json(&doc).unwrap();
    assert_eq!(out.json.images.len(), 1);
    assert!(out.json.textures[0].extensions.is_empty());
    assert_eq!(out.json.textures[0].source, Some(0));
}
