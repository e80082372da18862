//! # gltf-graph
//!
//! Editable in-memory model of glTF 2.0 assets.
//!
//! Every scene, node, mesh, accessor, texture and material is a property
//! in one arena graph. References between properties are graph edges
//! tracked in both directions, so disposing, detaching and cloning keep
//! every parent and child consistent. Documents are read from and written
//! to `.gltf` (JSON plus side files) and `.glb` (binary container).
//!
//! ## Modules
//!
//! - [`util`] - Errors, logging, math and content digests
//! - [`graph`] - Arena graph with symmetric edges and change events
//! - [`property`] - Property storage: literals, references, arrays, clone and compare
//! - [`properties`] - Typed handles (Node, Mesh, Accessor, ...)
//! - [`document`] - Document, factories, transform pipeline, merge
//! - [`extension`] - Extension mechanism and the built-in KHR extensions
//! - [`io`] - GLB codec, JSON schema, reader, writer and file I/O
//! - [`transforms`] - Prune and dedup passes
//!
//! ## Example
//!
//! ```ignore
//! use gltf_graph::prelude::*;
//!
//! let io = PlatformIo::new();
//! let mut doc = io.read("scene.glb")?;
//! for node in doc.root().list_nodes(&doc) {
//!     println!("{}", node.name(&doc));
//! }
//! doc.transform_blocking(&[&Dedup, &Prune])?;
//! io.write("scene.gltf", &doc)?;
//! ```

pub mod util;
pub mod graph;
pub mod property;
pub mod properties;
pub mod document;
pub mod extension;
pub mod io;
pub mod transforms;

// Re-export commonly used types
pub use document::{Document, DocumentConfig};
pub use util::{Error, Result};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::document::{Document, DocumentConfig, Transform, TransformFn};
    pub use crate::extension::{Extension, ExtensionType};
    pub use crate::io::{PlatformIo, ReaderOptions, UriCollision, WriterOptions};
    pub use crate::properties::*;
    pub use crate::property::{AccessorArray, ComponentType, PropertyType};
    pub use crate::transforms::{Dedup, Prune};
    pub use crate::util::{Error, Logger, Result};
}
