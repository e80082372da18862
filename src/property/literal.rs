//! Literal attribute values.

use std::hash::{Hash, Hasher};

use serde_json::Value;

/// A non-reference attribute value.
///
/// Arrays are owned; setters copy caller data on entry so later changes
/// to the caller's buffer never reach the stored value.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Literal {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Floats(Vec<f64>),
    Ints(Vec<i64>),
    /// Nested object or any other JSON-shaped value.
    Json(Value),
}

impl Literal {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric value; integers widen to float.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_floats(&self) -> Option<&[f64]> {
        match self {
            Self::Floats(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_ints(&self) -> Option<&[i64]> {
        match self {
            Self::Ints(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Feed this value into a hasher. Floats hash by bit pattern.
    pub fn hash_into<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::Null => {}
            Self::Bool(b) => b.hash(state),
            Self::Int(i) => i.hash(state),
            Self::Float(f) => f.to_bits().hash(state),
            Self::Str(s) => s.hash(state),
            Self::Floats(v) => {
                v.len().hash(state);
                for f in v {
                    f.to_bits().hash(state);
                }
            }
            Self::Ints(v) => v.hash(state),
            Self::Json(v) => v.to_string().hash(state),
        }
    }
}

impl From<bool> for Literal {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Literal {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<u32> for Literal {
    fn from(v: u32) -> Self {
        Self::Int(v as i64)
    }
}

impl From<f64> for Literal {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Literal {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for Literal {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<&[f64]> for Literal {
    fn from(v: &[f64]) -> Self {
        Self::Floats(v.to_vec())
    }
}

impl From<Vec<f64>> for Literal {
    fn from(v: Vec<f64>) -> Self {
        Self::Floats(v)
    }
}

impl<const N: usize> From<[f64; N]> for Literal {
    fn from(v: [f64; N]) -> Self {
        Self::Floats(v.to_vec())
    }
}

impl From<Value> for Literal {
    fn from(v: Value) -> Self {
        Self::Json(v)
    }
}
