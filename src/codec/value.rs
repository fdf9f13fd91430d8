//! Typed in-memory values produced by the codec.

use half::f16;
use std::fmt;

use super::WideDecimal;
use crate::datatype::DatatypeClass;
use crate::reference::ReferenceToken;

/// Per-element conversion failure.
///
/// Carried inside [`Value::Error`] so that one bad element never aborts its
/// siblings in an array or compound.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConversionError {
    #[error("no {class} conversion for size {size}")]
    UnsupportedSize { class: DatatypeClass, size: usize },

    #[error("no conversion for {0} class")]
    UnsupportedClass(DatatypeClass),

    #[error("truncated element: need {needed} bytes, have {available}")]
    Truncated { needed: usize, available: usize },

    #[error("variable-length data cannot be decoded from fixed-width bytes")]
    VarLenInFixed,

    #[error("{0} datatype has no base type")]
    MissingBase(DatatypeClass),

    #[error("element not present in the source buffer")]
    Missing,
}

/// A named member value of a compound.
#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    pub name: String,
    pub value: Value,
}

impl Field {
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Self { name: name.into(), value }
    }
}

/// A decoded element.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Int8(i8),
    UInt8(u8),
    Int16(i16),
    UInt16(u16),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Float16(f16),
    Float32(f32),
    Float64(f64),
    /// 16-byte float.
    WideDecimal(WideDecimal),
    String(String),
    /// Raw bytes (bitfields, or text when string conversion is off).
    Bytes(Vec<u8>),
    /// Enum value with its member name when the table has one.
    Enum { value: i128, name: Option<String> },
    /// 8-byte reference read as a raw integer.
    Reference(u64),
    /// Reference token of any other width.
    Token(ReferenceToken),
    Array(Vec<Value>),
    Compound(Vec<Field>),
    VarLen(Vec<Value>),
    /// Element that could not be converted.
    Error(ConversionError),
}

impl Value {
    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    /// Integer view of numeric values (enums yield their underlying value).
    pub fn as_i128(&self) -> Option<i128> {
        Some(match *self {
            Value::Int8(v) => v as i128,
            Value::UInt8(v) => v as i128,
            Value::Int16(v) => v as i128,
            Value::UInt16(v) => v as i128,
            Value::Int32(v) => v as i128,
            Value::UInt32(v) => v as i128,
            Value::Int64(v) => v as i128,
            Value::UInt64(v) => v as i128,
            Value::Enum { value, .. } => value,
            Value::Reference(v) => v as i128,
            _ => return None,
        })
    }

    /// Floating view of numeric values.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::Float16(v) => Some(v.to_f64()),
            Value::Float32(v) => Some(v as f64),
            Value::Float64(v) => Some(v),
            Value::WideDecimal(v) => Some(v.to_f64()),
            _ => self.as_i128().map(|v| v as f64),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            Value::Enum { name: Some(name), .. } => Some(name),
            _ => None,
        }
    }

    /// Member of a compound value by name.
    pub fn field(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Compound(fields) => fields.iter().find(|f| f.name == name).map(|f| &f.value),
            _ => None,
        }
    }

    /// Elements of an array or vlen value.
    pub fn elements(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) | Value::VarLen(items) => Some(items),
            _ => None,
        }
    }

    /// Short name of the variant.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Int8(_) => "int8",
            Value::UInt8(_) => "uint8",
            Value::Int16(_) => "int16",
            Value::UInt16(_) => "uint16",
            Value::Int32(_) => "int32",
            Value::UInt32(_) => "uint32",
            Value::Int64(_) => "int64",
            Value::UInt64(_) => "uint64",
            Value::Float16(_) => "float16",
            Value::Float32(_) => "float32",
            Value::Float64(_) => "float64",
            Value::WideDecimal(_) => "float128",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Enum { .. } => "enum",
            Value::Reference(_) | Value::Token(_) => "reference",
            Value::Array(_) => "array",
            Value::Compound(_) => "compound",
            Value::VarLen(_) => "vlen",
            Value::Error(_) => "error",
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[Value], open: &str, close: &str) -> fmt::Result {
    write!(f, "{}", open)?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    write!(f, "{}", close)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int8(v) => write!(f, "{}", v),
            Value::UInt8(v) => write!(f, "{}", v),
            Value::Int16(v) => write!(f, "{}", v),
            Value::UInt16(v) => write!(f, "{}", v),
            Value::Int32(v) => write!(f, "{}", v),
            Value::UInt32(v) => write!(f, "{}", v),
            Value::Int64(v) => write!(f, "{}", v),
            Value::UInt64(v) => write!(f, "{}", v),
            Value::Float16(v) => write!(f, "{}", v),
            Value::Float32(v) => write!(f, "{}", v),
            Value::Float64(v) => write!(f, "{}", v),
            Value::WideDecimal(v) => write!(f, "{}", v),
            Value::String(s) => write!(f, "{}", s),
            Value::Bytes(bytes) => {
                for b in bytes {
                    write!(f, "{:02x}", b)?;
                }
                Ok(())
            }
            Value::Enum { name: Some(name), .. } => write!(f, "{}", name),
            Value::Enum { value, name: None } => write!(f, "{}", value),
            Value::Reference(v) => write!(f, "{}", v),
            Value::Token(token) => write!(f, "{:?}", token),
            Value::Array(items) => write_list(f, items, "[", "]"),
            Value::VarLen(items) => write_list(f, items, "(", ")"),
            Value::Compound(fields) => {
                write!(f, "{{")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}={}", field.name, field.value)?;
                }
                write!(f, "}}")
            }
            Value::Error(e) => write!(f, "<error: {}>", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_views() {
        assert_eq!(Value::UInt64(u64::MAX).as_i128(), Some(u64::MAX as i128));
        assert_eq!(Value::Enum { value: 3, name: None }.as_i128(), Some(3));
        assert_eq!(Value::Float16(f16::from_f32(1.5)).as_f64(), Some(1.5));
        assert_eq!(Value::String("x".into()).as_i128(), None);
    }

    #[test]
    fn test_display() {
        let v = Value::Compound(vec![
            Field::new("a", Value::Int32(1)),
            Field::new("b", Value::Array(vec![Value::UInt8(2), Value::UInt8(3)])),
        ]);
        assert_eq!(v.to_string(), "{a=1, b=[2, 3]}");
        assert_eq!(
            Value::Error(ConversionError::UnsupportedClass(DatatypeClass::Opaque)).to_string(),
            "<error: no conversion for opaque class>"
        );
    }

    #[test]
    fn test_field_lookup() {
        let v = Value::Compound(vec![Field::new("x", Value::Int8(-1))]);
        assert_eq!(v.field("x"), Some(&Value::Int8(-1)));
        assert_eq!(v.field("y"), None);
        assert_eq!(Value::Int8(0).field("x"), None);
    }
}
