//! gltf-graph CLI - inspect and rewrite glTF/GLB files.

use std::env;
use std::process::exit;

use gltf_graph::prelude::*;
use gltf_graph::transforms;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let args: Vec<String> = env::args().collect();

    // Parse global flags
    let mut level = "warn";
    let mut filtered_args: Vec<&str> = Vec::new();
    for arg in &args[1..] {
        match arg.as_str() {
            "-v" | "--verbose" => level = "info",
            "-vv" | "--trace" => level = "debug",
            "-q" | "--quiet" => level = "error",
            _ => filtered_args.push(arg),
        }
    }
    init_logging(level);

    if filtered_args.is_empty() {
        print_help();
        return;
    }

    match filtered_args[0] {
        "info" | "i" => {
            let Some(path) = filtered_args.get(1) else {
                eprintln!("Error: missing file argument");
                eprintln!("Usage: gltf-graph info <file>");
                exit(1);
            };
            cmd_info(path);
        }
        "tree" | "t" => {
            let Some(path) = filtered_args.get(1) else {
                eprintln!("Error: missing file argument");
                eprintln!("Usage: gltf-graph tree <file>");
                exit(1);
            };
            cmd_tree(path);
        }
        "copy" | "c" => {
            if filtered_args.len() < 3 {
                eprintln!("Error: missing arguments");
                eprintln!("Usage: gltf-graph copy <in> <out> [--dedup] [--prune]");
                exit(1);
            }
            let dedup = filtered_args.contains(&"--dedup");
            let prune = filtered_args.contains(&"--prune");
            cmd_copy(filtered_args[1], filtered_args[2], dedup, prune);
        }
        "help" | "h" | "--help" | "-h" => print_help(),
        other => {
            eprintln!("Unknown command: {}", other);
            print_help();
            exit(1);
        }
    }
}

fn print_help() {
    println!("gltf-graph - glTF 2.0 document toolkit");
    println!();
    println!("USAGE:");
    println!("    gltf-graph [OPTIONS] <COMMAND> [ARGS]");
    println!();
    println!("COMMANDS:");
    println!("    i, info  <file>               Show asset info and property counts");
    println!("    t, tree  <file>               Show scene hierarchy");
    println!("    c, copy  <in> <out>           Read and rewrite (.glb or .gltf by extension)");
    println!("             [--dedup] [--prune]  Clean up before writing");
    println!("    h, help                       Show this help");
    println!();
    println!("OPTIONS:");
    println!("    -v, --verbose    Show info output");
    println!("    -vv, --trace     Show debug output");
    println!("    -q, --quiet      Errors only");
    println!();
    println!("RUST_LOG overrides the level when set.");
}

fn open(path: &str) -> Document {
    info!("reading {}", path);
    match PlatformIo::new().read(path) {
        Ok(doc) => doc,
        Err(e) => {
            eprintln!("Failed to open {}: {}", path, e);
            exit(1);
        }
    }
}

fn cmd_info(path: &str) {
    let doc = open(path);
    let root = doc.root();

    println!("File: {}", path);
    println!("Version: {}", root.asset_version(&doc));
    if let Some(generator) = root.generator(&doc) {
        println!("Generator: {}", generator);
    }
    println!();

    let vertices: usize = root
        .list_meshes(&doc)
        .iter()
        .flat_map(|m| m.list_primitives(&doc))
        .filter_map(|p| p.attribute(&doc, "POSITION"))
        .map(|a| a.count(&doc))
        .sum();
    let buffer_bytes: usize = root.list_accessors(&doc).iter().map(|a| a.byte_length(&doc)).sum();

    println!("Properties:");
    println!("  Scenes:     {}", root.list_scenes(&doc).len());
    println!("  Nodes:      {}", root.list_nodes(&doc).len());
    println!("  Meshes:     {} ({} vertices)", root.list_meshes(&doc).len(), vertices);
    println!("  Materials:  {}", root.list_materials(&doc).len());
    println!("  Textures:   {}", root.list_textures(&doc).len());
    println!("  Accessors:  {} ({} bytes)", root.list_accessors(&doc).len(), buffer_bytes);
    println!("  Buffers:    {}", root.list_buffers(&doc).len());
    println!("  Animations: {}", root.list_animations(&doc).len());
    println!("  Skins:      {}", root.list_skins(&doc).len());
    println!("  Cameras:    {}", root.list_cameras(&doc).len());

    let extensions = doc.extensions().names();
    if !extensions.is_empty() {
        println!();
        println!("Extensions:");
        for name in extensions {
            let required = if doc.extensions().is_required(name) { " (required)" } else { "" };
            println!("  {}{}", name, required);
        }
    }
}

fn print_node(doc: &Document, node: Node, depth: usize) {
    let indent = "  ".repeat(depth);
    let name = if node.name(doc).is_empty() { "<unnamed>" } else { node.name(doc) };
    let mut tags = Vec::new();
    if let Some(mesh) = node.mesh(doc) {
        tags.push(format!("mesh {}", mesh.name(doc)));
    }
    if node.camera(doc).is_some() {
        tags.push("camera".to_string());
    }
    if node.skin(doc).is_some() {
        tags.push("skin".to_string());
    }
    if tags.is_empty() {
        println!("{}{}", indent, name);
    } else {
        println!("{}{} [{}]", indent, name, tags.join(", "));
    }
    for child in node.list_children(doc) {
        print_node(doc, child, depth + 1);
    }
}

fn cmd_tree(path: &str) {
    let doc = open(path);
    let default_scene = doc.root().default_scene(&doc);
    for scene in doc.root().list_scenes(&doc) {
        let marker = if Some(scene) == default_scene { " (default)" } else { "" };
        println!("Scene {}{}", scene.name(&doc), marker);
        for node in scene.list_children(&doc) {
            print_node(&doc, node, 1);
        }
    }
}

fn cmd_copy(input: &str, output: &str, dedup: bool, prune: bool) {
    let mut doc = open(input);
    if dedup {
        match transforms::dedup(&mut doc) {
            Ok(report) => debug!("dedup: {:?}", report),
            Err(e) => {
                eprintln!("Dedup failed: {}", e);
                exit(1);
            }
        }
    }
    if prune {
        if let Err(e) = transforms::prune(&mut doc) {
            eprintln!("Prune failed: {}", e);
            exit(1);
        }
    }
    info!("writing {}", output);
    if let Err(e) = PlatformIo::new().write(output, &doc) {
        eprintln!("Failed to write {}: {}", output, e);
        exit(1);
    }
    println!("Copied {} -> {}", input, output);
}
