//! Accessors: typed element arrays.
//!
//! The backing [`AccessorArray`] lives inside the graph and is handed out
//! by reference. `array_mut` edits it in place; callers holding large
//! vertex buffers never pay for a copy. Literal attributes elsewhere are
//! copied on entry, accessor arrays are the one exception.

use std::fmt;

use super::{attr_bool, attr_str, Buffer};
use crate::document::Document;
use crate::graph::EdgeAttributes;
use crate::property::{AccessorArray, ComponentType, Payload};
use crate::util::{Error, Result};

property_handle! {
    /// Typed view over an array of elements, stored in a buffer.
    Accessor => Accessor
}

/// Number of components per element.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ElementType {
    #[default]
    Scalar,
    Vec2,
    Vec3,
    Vec4,
    Mat2,
    Mat3,
    Mat4,
}

impl ElementType {
    pub const fn size(self) -> usize {
        match self {
            Self::Scalar => 1,
            Self::Vec2 => 2,
            Self::Vec3 => 3,
            Self::Vec4 | Self::Mat2 => 4,
            Self::Mat3 => 9,
            Self::Mat4 => 16,
        }
    }

    /// glTF `type` string.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Scalar => "SCALAR",
            Self::Vec2 => "VEC2",
            Self::Vec3 => "VEC3",
            Self::Vec4 => "VEC4",
            Self::Mat2 => "MAT2",
            Self::Mat3 => "MAT3",
            Self::Mat4 => "MAT4",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Some(match value {
            "SCALAR" => Self::Scalar,
            "VEC2" => Self::Vec2,
            "VEC3" => Self::Vec3,
            "VEC4" => Self::Vec4,
            "MAT2" => Self::Mat2,
            "MAT3" => Self::Mat3,
            "MAT4" => Self::Mat4,
            _ => return None,
        })
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Accessor {
    pub fn element_type(self, doc: &Document) -> ElementType {
        attr_str(doc, self.0, "type")
            .and_then(ElementType::parse)
            .unwrap_or_default()
    }

    /// Change the element type. An existing array must still divide into
    /// whole elements.
    pub fn set_element_type(self, doc: &mut Document, element_type: ElementType) -> Result<Self> {
        if let Some(array) = self.array(doc) {
            check_length(array.len(), element_type)?;
        }
        doc.graph_mut().set_attr(self.0, "type", element_type.as_str())?;
        Ok(self)
    }

    /// Components per element.
    pub fn element_size(self, doc: &Document) -> usize {
        self.element_type(doc).size()
    }

    /// Component type of the stored array; `Float` when there is none.
    pub fn component_type(self, doc: &Document) -> ComponentType {
        self.array(doc).map(AccessorArray::component_type).unwrap_or_default()
    }

    /// Whether integer components map to `[0, 1]` / `[-1, 1]`.
    pub fn normalized(self, doc: &Document) -> bool {
        attr_bool(doc, self.0, "normalized", false)
    }

    pub fn set_normalized(self, doc: &mut Document, normalized: bool) -> Result<Self> {
        doc.graph_mut().set_attr(self.0, "normalized", normalized)?;
        Ok(self)
    }

    /// Whether the writer should store this accessor sparsely. Does not
    /// change the values seen through `get_element`.
    pub fn sparse(self, doc: &Document) -> bool {
        attr_bool(doc, self.0, "sparse", false)
    }

    pub fn set_sparse(self, doc: &mut Document, sparse: bool) -> Result<Self> {
        doc.graph_mut().set_attr(self.0, "sparse", sparse)?;
        Ok(self)
    }

    pub fn buffer(self, doc: &Document) -> Option<Buffer> {
        doc.graph().get_ref(self.0, "buffer").map(Buffer)
    }

    pub fn set_buffer(self, doc: &mut Document, buffer: Option<Buffer>) -> Result<Self> {
        doc.graph_mut()
            .set_ref(self.0, "buffer", buffer.map(Buffer::id), EdgeAttributes::default())?;
        Ok(self)
    }

    /// Live reference to the backing array.
    pub fn array(self, doc: &Document) -> Option<&AccessorArray> {
        match doc.graph().payload(self.0) {
            Some(Payload::Array(array)) => Some(array),
            _ => None,
        }
    }

    /// Mutable live reference; edits are visible to every reader.
    pub fn array_mut(self, doc: &mut Document) -> Result<&mut AccessorArray> {
        match doc.graph_mut().payload_mut(self.0)? {
            Payload::Array(array) => Ok(array),
            _ => Err(Error::InvalidArray("accessor has no array".into())),
        }
    }

    /// Replace the backing array. Its length must be a multiple of the
    /// element size.
    pub fn set_array(self, doc: &mut Document, array: impl Into<AccessorArray>) -> Result<Self> {
        let array = array.into();
        check_length(array.len(), self.element_type(doc))?;
        doc.graph_mut().set_payload(self.0, Payload::Array(array))?;
        Ok(self)
    }

    /// Drop the backing array.
    pub fn clear_array(self, doc: &mut Document) -> Result<Self> {
        doc.graph_mut().set_payload(self.0, Payload::None)?;
        Ok(self)
    }

    /// Number of elements.
    pub fn count(self, doc: &Document) -> usize {
        self.array(doc).map_or(0, |a| a.len() / self.element_size(doc))
    }

    pub fn byte_length(self, doc: &Document) -> usize {
        self.array(doc).map_or(0, AccessorArray::byte_len)
    }

    /// Element `index`, denormalized when the accessor is normalized.
    pub fn get_element(self, doc: &Document, index: usize) -> Result<Vec<f64>> {
        let size = self.element_size(doc);
        let count = self.count(doc);
        let array = self
            .array(doc)
            .ok_or_else(|| Error::InvalidArray("accessor has no array".into()))?;
        if index >= count {
            return Err(Error::ElementOutOfBounds { index, count });
        }
        let normalized = self.normalized(doc);
        let ct = array.component_type();
        Ok((0..size)
            .filter_map(|i| array.get(index * size + i))
            .map(|c| if normalized { ct.denormalize(c) } else { c })
            .collect())
    }

    /// Overwrite element `index`, normalizing when the accessor is
    /// normalized. `value` must have exactly one entry per component.
    pub fn set_element(self, doc: &mut Document, index: usize, value: &[f64]) -> Result<Self> {
        let size = self.element_size(doc);
        let count = self.count(doc);
        if value.len() != size {
            return Err(Error::InvalidArray(format!(
                "element has {} components, expected {}",
                value.len(),
                size
            )));
        }
        if index >= count {
            return Err(Error::ElementOutOfBounds { index, count });
        }
        let normalized = self.normalized(doc);
        let array = self.array_mut(doc)?;
        let ct = array.component_type();
        for (i, v) in value.iter().enumerate() {
            let stored = if normalized { ct.normalize(*v) } else { *v };
            array.set(index * size + i, stored)?;
        }
        Ok(self)
    }

    /// Per-component minimum over all elements.
    pub fn min(self, doc: &Document) -> Result<Vec<f64>> {
        self.bounds(doc).map(|(min, _)| min)
    }

    /// Per-component maximum over all elements.
    pub fn max(self, doc: &Document) -> Result<Vec<f64>> {
        self.bounds(doc).map(|(_, max)| max)
    }

    /// Raw (not denormalized) component bounds, as written to `min`/`max`.
    pub(crate) fn raw_bounds(self, doc: &Document) -> Option<(Vec<f64>, Vec<f64>)> {
        let array = self.array(doc)?;
        let size = self.element_size(doc);
        if array.is_empty() {
            return None;
        }
        let mut min = vec![f64::INFINITY; size];
        let mut max = vec![f64::NEG_INFINITY; size];
        for (i, c) in array.to_f64_vec().into_iter().enumerate() {
            let k = i % size;
            min[k] = min[k].min(c);
            max[k] = max[k].max(c);
        }
        Some((min, max))
    }

    fn bounds(self, doc: &Document) -> Result<(Vec<f64>, Vec<f64>)> {
        let size = self.element_size(doc);
        let mut min = vec![f64::INFINITY; size];
        let mut max = vec![f64::NEG_INFINITY; size];
        for index in 0..self.count(doc) {
            for (k, v) in self.get_element(doc, index)?.into_iter().enumerate() {
                min[k] = min[k].min(v);
                max[k] = max[k].max(v);
            }
        }
        Ok((min, max))
    }
}

fn check_length(len: usize, element_type: ElementType) -> Result<()> {
    if len % element_type.size() != 0 {
        return Err(Error::InvalidArray(format!(
            "{} components do not divide into {} elements",
            len, element_type
        )));
    }
    Ok(())
}
