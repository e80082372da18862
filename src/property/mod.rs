//! Property base layer: the behavior every glTF entity shares.
//!
//! Entities live in a [`PropertyGraph`] (a [`Graph`](crate::graph::Graph)
//! of [`PropertyData`]). This module adds literal attributes, the three
//! reference-slot shapes, extension attachment, disposal, cloning,
//! structural equality and hashing on top of the raw graph.

mod property_type;
mod literal;
mod array;
mod data;
mod ops;
mod clone;
mod compare;

pub use property_type::PropertyType;
pub use literal::Literal;
pub use array::{AccessorArray, ComponentType};
pub use data::{ExtensionMeta, Payload, PropertyData};
pub use ops::{PropertyGraph, EXTENSIONS_SLOT};
pub use clone::{copy_properties, IdentityMap};
pub use compare::HashCache;
