//! Whole-document cleanup passes.
//!
//! Each pass is a plain function over a [`Document`](crate::document::Document)
//! and a unit struct implementing [`Transform`](crate::document::Transform)
//! for use in a pipeline:
//!
//! ```ignore
//! use gltf_graph::transforms::{Dedup, Prune};
//!
//! doc.transform_blocking(&[&Dedup, &Prune])?;
//! ```

mod dedup;
mod prune;

pub use dedup::{dedup, Dedup, DedupReport};
pub use prune::{prune, Prune};
