//! Utility types shared across the crate.
//!
//! - [`Error`] / [`Result`] - Error handling
//! - [`Logger`] - Injected diagnostics sink
//! - Math helpers over `glam`
//! - Content digests for deduplication

mod error;
mod logger;
mod math;
mod digest;

pub use error::*;
pub use logger::*;
pub use math::*;
pub use digest::*;
