//! File-system reading and writing of `.glb` and `.gltf` assets.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::ops::Deref;
use std::path::{Path, PathBuf};

use memmap2::Mmap;

use super::format::{decode_glb, encode_glb, is_glb};
use super::reader::read_document;
use super::writer::write_document;
use super::{ContainerFormat, GltfRoot, JsonDocument, ReaderOptions, UriCollision, WriterOptions, GLB_BUFFER};
use crate::document::Document;
use crate::util::{Error, Result};

/// Reads and writes documents on disk.
///
/// Reading detects GLB by its magic bytes and resolves side files
/// relative to the asset's directory. Writing picks the container from
/// the output extension: `.glb` packs everything into one file, anything
/// else writes JSON plus `.bin` and image files named after the output
/// stem.
#[derive(Clone, Default)]
pub struct PlatformIo {
    reader: ReaderOptions,
    writer: WriterOptions,
}

/// Read-only view of a file, memory-mapped unless empty.
enum Mapped {
    Mmap(Mmap),
    Empty,
}

impl Deref for Mapped {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            Mapped::Mmap(mmap) => mmap,
            Mapped::Empty => &[],
        }
    }
}

fn map_file(path: &Path) -> Result<Mapped> {
    let file = File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::FileNotFound(path.to_path_buf())
        } else {
            Error::Io(e)
        }
    })?;
    if file.metadata()?.len() == 0 {
        return Ok(Mapped::Empty);
    }
    // Safety: the file is opened read-only and the map only lives while
    // the file is parsed.
    let mmap = unsafe { Mmap::map(&file) }.map_err(|e| Error::MmapFailed(e.to_string()))?;
    Ok(Mapped::Mmap(mmap))
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    let file = OpenOptions::new().write(true).create(true).truncate(true).open(path)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(bytes)?;
    writer.flush()?;
    Ok(())
}

/// Decode `%XX` escapes in a relative URI.
fn decode_uri(uri: &str) -> String {
    let bytes = uri.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok();
            if let Some(value) = hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                out.push(value);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Only plain relative URIs name side files.
fn is_file_uri(uri: &str) -> bool {
    !uri.starts_with("data:") && !uri.contains("://")
}

/// True if `uri`, raw or percent-decoded, names a file at or below the
/// asset's directory: no root, no drive prefix, no `..` segment.
pub(crate) fn is_contained_uri(uri: &str) -> bool {
    let contained = |path: &str| {
        !path.is_empty()
            && !path.starts_with(['/', '\\'])
            && !path.contains(':')
            && path.split(['/', '\\']).all(|segment| segment != "..")
    };
    contained(uri) && contained(&decode_uri(uri))
}

impl PlatformIo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reader_options(mut self, options: ReaderOptions) -> Self {
        self.reader = options;
        self
    }

    pub fn with_writer_options(mut self, options: WriterOptions) -> Self {
        self.writer = options;
        self
    }

    pub fn with_uri_collision(mut self, policy: UriCollision) -> Self {
        self.writer.uri_collision = policy;
        self
    }

    pub fn reader_options(&self) -> &ReaderOptions {
        &self.reader
    }

    /// Read a `.glb` or `.gltf` file.
    pub fn read(&self, path: impl AsRef<Path>) -> Result<Document> {
        let path = path.as_ref();
        let json_doc = self.read_json_document(path)?;
        self.read_json(&json_doc)
    }

    /// Read a file into its JSON and resources without building a
    /// document.
    pub fn read_json_document(&self, path: impl AsRef<Path>) -> Result<JsonDocument> {
        let path = path.as_ref();
        let data = map_file(path)?;
        let mut json_doc = if is_glb(&data) {
            split_glb(&data)?
        } else {
            JsonDocument {
                json: serde_json::from_slice(&data)?,
                ..JsonDocument::default()
            }
        };
        let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        self.load_side_files(&dir, &mut json_doc)?;
        Ok(json_doc)
    }

    /// Read a GLB held in memory. External URIs are left unresolved.
    pub fn read_glb_bytes(&self, bytes: &[u8]) -> Result<Document> {
        if !is_glb(bytes) {
            return Err(Error::InvalidMagic);
        }
        self.read_json(&split_glb(bytes)?)
    }

    pub fn read_json(&self, json_doc: &JsonDocument) -> Result<Document> {
        read_document(json_doc, &self.reader)
    }

    fn load_side_files(&self, dir: &Path, json_doc: &mut JsonDocument) -> Result<()> {
        let uris: Vec<String> = json_doc
            .json
            .buffers
            .iter()
            .filter_map(|b| b.uri.clone())
            .chain(json_doc.json.images.iter().filter_map(|i| i.uri.clone()))
            .filter(|uri| is_file_uri(uri))
            .collect();
        let logger = &self.reader.config.logger;
        for uri in uris {
            if json_doc.resources.contains_key(&uri) {
                continue;
            }
            if !is_contained_uri(&uri) {
                logger.warn(&format!("side file {} is outside the asset directory, not loaded", uri));
                continue;
            }
            let file = dir.join(decode_uri(&uri));
            match map_file(&file) {
                Ok(data) => {
                    json_doc.resources.insert(uri, data.to_vec());
                }
                Err(Error::FileNotFound(missing)) => {
                    logger.debug(&format!("side file {} not found", missing.display()));
                }
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }

    /// Write `doc` to `path`. Every byte is produced before the first
    /// file is created.
    pub fn write(&self, path: impl AsRef<Path>, doc: &Document) -> Result<()> {
        let path = path.as_ref();
        let is_glb_path = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("glb"));
        let basename = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.writer.basename)
            .to_string();
        let format = if is_glb_path { ContainerFormat::Glb } else { ContainerFormat::Gltf };
        let options = self.writer.clone().with_format(format).with_basename(basename);
        let json_doc = write_document(doc, &options)?;

        let mut files: Vec<(PathBuf, Vec<u8>)> = Vec::new();
        let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        match format {
            ContainerFormat::Glb => files.push((path.to_path_buf(), pack_glb(&json_doc)?)),
            ContainerFormat::Gltf => {
                files.push((path.to_path_buf(), serde_json::to_vec_pretty(&json_doc.json)?));
            }
        }
        for (uri, bytes) in &json_doc.resources {
            if uri == GLB_BUFFER {
                continue;
            }
            if !is_contained_uri(uri) {
                return Err(Error::WriteFailed(format!("resource {} is outside the output directory", uri)));
            }
            files.push((dir.join(uri), bytes.clone()));
        }
        for (file, bytes) in &files {
            if let Some(parent) = file.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            write_file(file, bytes)?;
        }
        doc.logger()
            .debug(&format!("wrote {} ({} files)", path.display(), files.len()));
        Ok(())
    }

    /// Serialize `doc` as a GLB byte stream.
    pub fn write_glb_bytes(&self, doc: &Document) -> Result<Vec<u8>> {
        let options = self.writer.clone().with_format(ContainerFormat::Glb);
        pack_glb(&write_document(doc, &options)?)
    }

    /// Serialize `doc` as JSON plus named side resources.
    pub fn write_json(&self, doc: &Document) -> Result<JsonDocument> {
        let options = self.writer.clone().with_format(ContainerFormat::Gltf);
        write_document(doc, &options)
    }
}

fn split_glb(bytes: &[u8]) -> Result<JsonDocument> {
    let (json, bin) = decode_glb(bytes)?;
    let root: GltfRoot = serde_json::from_slice(&json)?;
    let mut json_doc = JsonDocument {
        json: root,
        ..JsonDocument::default()
    };
    if let Some(bin) = bin {
        json_doc.resources.insert(GLB_BUFFER.to_string(), bin);
    }
    Ok(json_doc)
}

fn pack_glb(json_doc: &JsonDocument) -> Result<Vec<u8>> {
    let json = serde_json::to_vec(&json_doc.json)?;
    let bin = json_doc.resources.get(GLB_BUFFER).map(Vec::as_slice);
    encode_glb(&json, bin)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::properties::ElementType;
    use tempfile::tempdir;

    fn triangle() -> Document {
        let mut doc = Document::new();
        let buffer = doc.create_buffer("");
        let position = doc.create_accessor("position");
        position
            .set_element_type(&mut doc, ElementType::Vec3)
            .unwrap()
            .set_array(&mut doc, vec![0.0f32, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0])
            .unwrap()
            .set_buffer(&mut doc, Some(buffer))
            .unwrap();
        let primitive = doc.create_primitive();
        primitive.set_attribute(&mut doc, "POSITION", Some(position)).unwrap();
        let mesh = doc.create_mesh("tri");
        mesh.add_primitive(&mut doc, primitive).unwrap();
        let node = doc.create_node("n");
        node.set_mesh(&mut doc, Some(mesh)).unwrap();
        let scene = doc.create_scene("s");
        scene.add_child(&mut doc, node).unwrap();
        doc
    }

    #[test]
    fn test_decode_uri() {
        assert_eq!(decode_uri("my%20file.bin"), "my file.bin");
        assert_eq!(decode_uri("plain.bin"), "plain.bin");
        assert_eq!(decode_uri("bad%zz"), "bad%zz");
        assert_eq!(decode_uri("end%2"), "end%2");
    }

    #[test]
    fn test_contained_uri() {
        assert!(is_contained_uri("tri.bin"));
        assert!(is_contained_uri("textures/wood.png"));
        assert!(is_contained_uri("a..b.bin"));
        assert!(!is_contained_uri(""));
        assert!(!is_contained_uri("../escaped.bin"));
        assert!(!is_contained_uri("textures/../../escaped.bin"));
        assert!(!is_contained_uri("..\\escaped.bin"));
        assert!(!is_contained_uri("%2e%2e/escaped.bin"));
        assert!(!is_contained_uri("/etc/passwd"));
        assert!(!is_contained_uri("C:\\temp\\x.bin"));
    }

    #[test]
    fn test_escaping_side_file_not_read() {
        let root = tempdir().unwrap();
        let assets = root.path().join("assets");
        fs::create_dir(&assets).unwrap();
        fs::write(root.path().join("secret.bin"), [0u8; 36]).unwrap();

        let io = PlatformIo::new();
        let mut json_doc = io.write_json(&triangle()).unwrap();
        json_doc.json.buffers[0].uri = Some("../secret.bin".into());
        let path = assets.join("tri.gltf");
        fs::write(&path, serde_json::to_vec(&json_doc.json).unwrap()).unwrap();

        let loaded = io.read_json_document(&path).unwrap();
        assert!(loaded.resources.is_empty());
        assert!(matches!(io.read(&path), Err(Error::MissingResource(_))));
    }

    #[test]
    fn test_escaping_buffer_uri_stays_in_output_directory() {
        let root = tempdir().unwrap();
        let out = root.path().join("out");
        let mut doc = triangle();
        let buffer = doc.root().list_buffers(&doc)[0];
        buffer.set_uri(&mut doc, "../escaped.bin").unwrap();

        let io = PlatformIo::new();
        io.write(out.join("tri.gltf"), &doc).unwrap();
        assert!(!root.path().join("escaped.bin").exists());
        assert!(out.join("tri.bin").exists());

        let back = io.read(out.join("tri.gltf")).unwrap();
        assert_eq!(back.root().list_buffers(&back)[0].uri(&back), "tri.bin");
    }

    #[test]
    fn test_gltf_side_files() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tri.gltf");
        let io = PlatformIo::new();
        io.write(&path, &triangle()).unwrap();
        assert!(dir.path().join("tri.bin").exists());

        let doc = io.read(&path).unwrap();
        let accessor = doc.root().list_accessors(&doc)[0];
        assert_eq!(accessor.count(&doc), 3);
        assert_eq!(doc.root().list_buffers(&doc)[0].uri(&doc), "tri.bin");
    }

    #[test]
    fn test_glb_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tri.glb");
        let io = PlatformIo::new();
        io.write(&path, &triangle()).unwrap();
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);

        let bytes = fs::read(&path).unwrap();
        assert!(is_glb(&bytes));
        let doc = io.read_glb_bytes(&bytes).unwrap();
        assert_eq!(doc.root().list_meshes(&doc)[0].name(&doc), "tri");
    }

    #[test]
    fn test_missing_file() {
        let err = PlatformIo::new().read("/nonexistent/scene.glb").unwrap_err();
        assert!(matches!(err, Error::FileNotFound(_)));
    }
}
