//! Buffers.

use super::attr_str;
use crate::document::Document;
use crate::util::Result;

property_handle! {
    /// Binary storage destination for accessors. Holds no bytes itself;
    /// the writer packs accessor arrays into it.
    Buffer => Buffer
}

impl Buffer {
    /// External URI, or empty when the buffer is the GLB binary chunk or
    /// has not been named yet.
    pub fn uri(self, doc: &Document) -> &str {
        attr_str(doc, self.0, "uri").unwrap_or("")
    }

    pub fn set_uri(self, doc: &mut Document, uri: &str) -> Result<Self> {
        doc.graph_mut().set_attr(self.0, "uri", uri)?;
        Ok(self)
    }
}
