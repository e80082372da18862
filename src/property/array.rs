//! Typed numeric arrays backing accessors.

use std::fmt;

use crate::util::{Error, Result};

/// Numeric component type of an accessor, by its glTF enum value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u32)]
pub enum ComponentType {
    Byte = 5120,
    UnsignedByte = 5121,
    Short = 5122,
    UnsignedShort = 5123,
    UnsignedInt = 5125,
    #[default]
    Float = 5126,
}

impl ComponentType {
    /// Size of one component in bytes.
    #[inline]
    pub const fn num_bytes(self) -> usize {
        match self {
            Self::Byte | Self::UnsignedByte => 1,
            Self::Short | Self::UnsignedShort => 2,
            Self::UnsignedInt | Self::Float => 4,
        }
    }

    /// glTF enum value.
    #[inline]
    pub const fn gl_enum(self) -> u32 {
        self as u32
    }

    /// Parse from the glTF enum value.
    pub const fn from_gl_enum(value: u32) -> Option<Self> {
        match value {
            5120 => Some(Self::Byte),
            5121 => Some(Self::UnsignedByte),
            5122 => Some(Self::Short),
            5123 => Some(Self::UnsignedShort),
            5125 => Some(Self::UnsignedInt),
            5126 => Some(Self::Float),
            _ => None,
        }
    }

    /// Decode a normalized integer into `[-1, 1]` or `[0, 1]`.
    pub fn denormalize(self, c: f64) -> f64 {
        match self {
            Self::Float => c,
            Self::UnsignedInt => c / 4294967295.0,
            Self::UnsignedShort => c / 65535.0,
            Self::UnsignedByte => c / 255.0,
            Self::Short => (c / 32767.0).max(-1.0),
            Self::Byte => (c / 127.0).max(-1.0),
        }
    }

    /// Encode a float in `[-1, 1]` / `[0, 1]` as a normalized integer.
    pub fn normalize(self, f: f64) -> f64 {
        match self {
            Self::Float => f,
            Self::UnsignedInt => (f * 4294967295.0).round(),
            Self::UnsignedShort => (f * 65535.0).round(),
            Self::UnsignedByte => (f * 255.0).round(),
            Self::Short => (f * 32767.0).round(),
            Self::Byte => (f * 127.0).round(),
        }
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Byte => "int8",
            Self::UnsignedByte => "uint8",
            Self::Short => "int16",
            Self::UnsignedShort => "uint16",
            Self::UnsignedInt => "uint32",
            Self::Float => "float32",
        };
        f.write_str(name)
    }
}

/// Flat typed storage for accessor elements.
#[derive(Clone, Debug, PartialEq)]
pub enum AccessorArray {
    I8(Vec<i8>),
    U8(Vec<u8>),
    I16(Vec<i16>),
    U16(Vec<u16>),
    U32(Vec<u32>),
    F32(Vec<f32>),
}

macro_rules! dispatch {
    ($self:expr, $v:ident => $body:expr) => {
        match $self {
            AccessorArray::I8($v) => $body,
            AccessorArray::U8($v) => $body,
            AccessorArray::I16($v) => $body,
            AccessorArray::U16($v) => $body,
            AccessorArray::U32($v) => $body,
            AccessorArray::F32($v) => $body,
        }
    };
}

impl AccessorArray {
    /// Zero-filled array of `len` components.
    pub fn zeros(component_type: ComponentType, len: usize) -> Self {
        match component_type {
            ComponentType::Byte => Self::I8(vec![0; len]),
            ComponentType::UnsignedByte => Self::U8(vec![0; len]),
            ComponentType::Short => Self::I16(vec![0; len]),
            ComponentType::UnsignedShort => Self::U16(vec![0; len]),
            ComponentType::UnsignedInt => Self::U32(vec![0; len]),
            ComponentType::Float => Self::F32(vec![0.0; len]),
        }
    }

    /// Reinterpret little-endian bytes as components.
    pub fn from_bytes(component_type: ComponentType, bytes: &[u8]) -> Result<Self> {
        if bytes.len() % component_type.num_bytes() != 0 {
            return Err(Error::InvalidArray(format!(
                "{} bytes is not a whole number of {} components",
                bytes.len(),
                component_type
            )));
        }
        Ok(match component_type {
            ComponentType::Byte => Self::I8(bytemuck::pod_collect_to_vec(bytes)),
            ComponentType::UnsignedByte => Self::U8(bytes.to_vec()),
            ComponentType::Short => Self::I16(bytemuck::pod_collect_to_vec(bytes)),
            ComponentType::UnsignedShort => Self::U16(bytemuck::pod_collect_to_vec(bytes)),
            ComponentType::UnsignedInt => Self::U32(bytemuck::pod_collect_to_vec(bytes)),
            ComponentType::Float => Self::F32(bytemuck::pod_collect_to_vec(bytes)),
        })
    }

    pub fn component_type(&self) -> ComponentType {
        match self {
            Self::I8(_) => ComponentType::Byte,
            Self::U8(_) => ComponentType::UnsignedByte,
            Self::I16(_) => ComponentType::Short,
            Self::U16(_) => ComponentType::UnsignedShort,
            Self::U32(_) => ComponentType::UnsignedInt,
            Self::F32(_) => ComponentType::Float,
        }
    }

    /// Number of components (not elements).
    pub fn len(&self) -> usize {
        dispatch!(self, v => v.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Raw bytes in platform (little-endian) order.
    pub fn as_bytes(&self) -> &[u8] {
        dispatch!(self, v => bytemuck::cast_slice(v))
    }

    /// Byte length.
    pub fn byte_len(&self) -> usize {
        self.len() * self.component_type().num_bytes()
    }

    /// Component at `index`, widened to f64.
    pub fn get(&self, index: usize) -> Option<f64> {
        dispatch!(self, v => v.get(index).map(|c| *c as f64))
    }

    /// Store `value` at `index`, rounding and saturating for integer types.
    pub fn set(&mut self, index: usize, value: f64) -> Result<()> {
        let len = self.len();
        if index >= len {
            return Err(Error::ElementOutOfBounds { index, count: len });
        }
        match self {
            Self::I8(v) => v[index] = value.round() as i8,
            Self::U8(v) => v[index] = value.round() as u8,
            Self::I16(v) => v[index] = value.round() as i16,
            Self::U16(v) => v[index] = value.round() as u16,
            Self::U32(v) => v[index] = value.round() as u32,
            Self::F32(v) => v[index] = value as f32,
        }
        Ok(())
    }

    /// All components widened to f64.
    pub fn to_f64_vec(&self) -> Vec<f64> {
        dispatch!(self, v => v.iter().map(|c| *c as f64).collect())
    }
}

impl From<Vec<f32>> for AccessorArray {
    fn from(v: Vec<f32>) -> Self {
        Self::F32(v)
    }
}

impl From<Vec<u32>> for AccessorArray {
    fn from(v: Vec<u32>) -> Self {
        Self::U32(v)
    }
}

impl From<Vec<u16>> for AccessorArray {
    fn from(v: Vec<u16>) -> Self {
        Self::U16(v)
    }
}

impl From<Vec<u8>> for AccessorArray {
    fn from(v: Vec<u8>) -> Self {
        Self::U8(v)
    }
}

impl From<Vec<i16>> for AccessorArray {
    fn from(v: Vec<i16>) -> Self {
        Self::I16(v)
    }
}

impl From<Vec<i8>> for AccessorArray {
    fn from(v: Vec<i8>) -> Self {
        Self::I8(v)
    }
}
