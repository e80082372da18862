//! Container I/O.
//!
//! A [`Document`](crate::document::Document) is serialized into a
//! [`JsonDocument`]: the glTF JSON plus named binary resources. The GLB
//! container packs both into one byte stream; the `.gltf` form writes the
//! JSON next to its side files. [`PlatformIo`] does the file work for
//! either form.
//!
//! # Example
//!
//! ```ignore
//! use gltf_graph::io::PlatformIo;
//!
//! let io = PlatformIo::new();
//! let doc = io.read("scene.glb")?;
//! io.write("scene.gltf", &doc)?;
//! ```

mod context;
mod format;
mod platform;
mod reader;
mod schema;
mod writer;

use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

pub use context::{ReaderContext, WriterContext};
pub(crate) use context::DefSlot;
pub use format::{decode_glb, encode_glb, is_glb, GLB_MAGIC, GLB_VERSION};
pub use platform::PlatformIo;
pub use reader::read_document;
pub use schema::*;
pub use writer::write_document;

use crate::document::DocumentConfig;
use crate::extension::{khronos_extensions, ExtensionClass};
use crate::util::SharedLogger;

/// Resource key of the GLB binary chunk.
pub const GLB_BUFFER: &str = "@glb.bin";

/// glTF JSON plus the binary resources it refers to, keyed by URI.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct JsonDocument {
    pub json: GltfRoot,
    pub resources: BTreeMap<String, Vec<u8>>,
}

/// Container form produced by the writer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ContainerFormat {
    /// JSON plus external `.bin` and image files.
    #[default]
    Gltf,
    /// Single binary container; one buffer becomes the BIN chunk.
    Glb,
}

/// What to do when two resources would be written to the same URI.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum UriCollision {
    /// Append `_2`, `_3`, ... to later URIs and log a warning.
    #[default]
    Rename,
    /// Abort the write with [`Error::DuplicateUri`](crate::util::Error::DuplicateUri).
    Fail,
}

/// Writer settings.
#[derive(Clone, Debug)]
pub struct WriterOptions {
    pub format: ContainerFormat,
    /// Stem for generated resource URIs.
    pub basename: String,
    pub uri_collision: UriCollision,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            format: ContainerFormat::Gltf,
            basename: "scene".to_string(),
            uri_collision: UriCollision::Rename,
        }
    }
}

impl WriterOptions {
    pub fn with_format(mut self, format: ContainerFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_basename(mut self, basename: impl Into<String>) -> Self {
        self.basename = basename.into();
        self
    }

    pub fn with_uri_collision(mut self, policy: UriCollision) -> Self {
        self.uri_collision = policy;
        self
    }
}

/// Reader settings: the document configuration to read into, the
/// extensions known to the reader and dependencies injected for them.
#[derive(Clone)]
pub struct ReaderOptions {
    pub config: DocumentConfig,
    pub extensions: Vec<ExtensionClass>,
    pub dependencies: HashMap<String, Rc<dyn Any>>,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            config: DocumentConfig::default(),
            extensions: khronos_extensions(),
            dependencies: HashMap::new(),
        }
    }
}

impl ReaderOptions {
    pub fn with_logger(mut self, logger: SharedLogger) -> Self {
        self.config.logger = logger;
        self
    }

    /// Replace the set of known extensions.
    pub fn with_extensions(mut self, extensions: Vec<ExtensionClass>) -> Self {
        self.extensions = extensions;
        self
    }

    pub fn register_extensions(mut self, extensions: &[ExtensionClass]) -> Self {
        for class in extensions {
            if !self.extensions.iter().any(|c| c.name() == class.name()) {
                self.extensions.push(*class);
            }
        }
        self
    }

    pub fn register_dependency(mut self, key: impl Into<String>, value: Rc<dyn Any>) -> Self {
        self.dependencies.insert(key.into(), value);
        self
    }
}
