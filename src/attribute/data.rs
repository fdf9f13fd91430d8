//! Typed attribute buffers.

use bytemuck::Pod;
use half::f16;

use super::selection::{select_frame, Selection};
use crate::codec::{ConversionError, Value, WideDecimal};
use crate::datatype::ByteOrder;
use crate::reference::ReferenceToken;

/// All elements of an attribute in their natural in-memory form.
///
/// Primitive numeric data is kept in flat typed vectors. Structured data
/// (compound, enum, array, vlen, bitfield) is kept as decoded [`Value`]s,
/// one per element.
#[derive(Clone, Debug, PartialEq)]
pub enum AttributeData {
    Int8(Vec<i8>),
    UInt8(Vec<u8>),
    Int16(Vec<i16>),
    UInt16(Vec<u16>),
    Int32(Vec<i32>),
    UInt32(Vec<u32>),
    Int64(Vec<i64>),
    UInt64(Vec<u64>),
    Float16(Vec<f16>),
    Float32(Vec<f32>),
    Float64(Vec<f64>),
    /// 16-byte floats, flattened when the attribute is an array of them.
    WideDecimal(Vec<WideDecimal>),
    Strings(Vec<String>),
    /// Raw fixed-width element bytes, back to back.
    Bytes(Vec<u8>),
    References(Vec<ReferenceToken>),
    Values(Vec<Value>),
}

impl AttributeData {
    /// Number of items held (bytes for `Bytes`).
    pub fn len(&self) -> usize {
        match self {
            Self::Int8(v) => v.len(),
            Self::UInt8(v) => v.len(),
            Self::Int16(v) => v.len(),
            Self::UInt16(v) => v.len(),
            Self::Int32(v) => v.len(),
            Self::UInt32(v) => v.len(),
            Self::Int64(v) => v.len(),
            Self::UInt64(v) => v.len(),
            Self::Float16(v) => v.len(),
            Self::Float32(v) => v.len(),
            Self::Float64(v) => v.len(),
            Self::WideDecimal(v) => v.len(),
            Self::Strings(v) => v.len(),
            Self::Bytes(v) => v.len(),
            Self::References(v) => v.len(),
            Self::Values(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Short name of the buffer kind.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Int8(_) => "int8",
            Self::UInt8(_) => "uint8",
            Self::Int16(_) => "int16",
            Self::UInt16(_) => "uint16",
            Self::Int32(_) => "int32",
            Self::UInt32(_) => "uint32",
            Self::Int64(_) => "int64",
            Self::UInt64(_) => "uint64",
            Self::Float16(_) => "float16",
            Self::Float32(_) => "float32",
            Self::Float64(_) => "float64",
            Self::WideDecimal(_) => "float128",
            Self::Strings(_) => "strings",
            Self::Bytes(_) => "bytes",
            Self::References(_) => "references",
            Self::Values(_) => "values",
        }
    }

    /// Reference tokens held by this buffer (8-byte references come back as
    /// little-endian address tokens).
    pub fn reference_tokens(&self) -> Option<Vec<ReferenceToken>> {
        match self {
            Self::References(tokens) => Some(tokens.clone()),
            Self::UInt64(raw) => Some(raw.iter().map(|&r| ReferenceToken::from_u64(r)).collect()),
            _ => None,
        }
    }

    /// The `height x width` view of the selected frame.
    ///
    /// `group` is the number of items per element (bytes per element for
    /// `Bytes`, array length for flattened wide floats).
    pub fn select(&self, selection: &Selection, group: usize) -> Self {
        match self {
            Self::Int8(v) => Self::Int8(select_frame(v, group, selection, 0)),
            Self::UInt8(v) => Self::UInt8(select_frame(v, group, selection, 0)),
            Self::Int16(v) => Self::Int16(select_frame(v, group, selection, 0)),
            Self::UInt16(v) => Self::UInt16(select_frame(v, group, selection, 0)),
            Self::Int32(v) => Self::Int32(select_frame(v, group, selection, 0)),
            Self::UInt32(v) => Self::UInt32(select_frame(v, group, selection, 0)),
            Self::Int64(v) => Self::Int64(select_frame(v, group, selection, 0)),
            Self::UInt64(v) => Self::UInt64(select_frame(v, group, selection, 0)),
            Self::Float16(v) => Self::Float16(select_frame(v, group, selection, f16::ZERO)),
            Self::Float32(v) => Self::Float32(select_frame(v, group, selection, 0.0)),
            Self::Float64(v) => Self::Float64(select_frame(v, group, selection, 0.0)),
            Self::WideDecimal(v) => {
                Self::WideDecimal(select_frame(v, group, selection, WideDecimal::default()))
            }
            Self::Strings(v) => Self::Strings(select_frame(v, group, selection, String::new())),
            Self::Bytes(v) => Self::Bytes(select_frame(v, group, selection, 0)),
            Self::References(v) => {
                let width = v.first().map_or(0, ReferenceToken::len);
                Self::References(select_frame(v, group, selection, ReferenceToken::null(width)))
            }
            Self::Values(v) => {
                Self::Values(select_frame(v, group, selection, Value::Error(ConversionError::Missing)))
            }
        }
    }
}

/// True when data in `order` must be byte-swapped to or from native order.
pub(crate) fn needs_swap(order: ByteOrder) -> bool {
    match order {
        ByteOrder::Little => cfg!(target_endian = "big"),
        ByteOrder::Big => cfg!(target_endian = "little"),
        ByteOrder::None => false,
    }
}

fn swap_each(bytes: &mut [u8], width: usize) {
    if width > 1 {
        for chunk in bytes.chunks_exact_mut(width) {
            chunk.reverse();
        }
    }
}

/// Typed values from packed element bytes in `order`.
pub(crate) fn pod_from_bytes<T: Pod>(raw: &[u8], order: ByteOrder) -> Vec<T> {
    let width = std::mem::size_of::<T>();
    if needs_swap(order) {
        let mut owned = raw.to_vec();
        swap_each(&mut owned, width);
        bytemuck::pod_collect_to_vec(&owned)
    } else {
        bytemuck::pod_collect_to_vec(raw)
    }
}

/// Packed element bytes in `order` from typed values.
pub(crate) fn pod_to_bytes<T: Pod>(values: &[T], order: ByteOrder) -> Vec<u8> {
    let mut bytes = bytemuck::cast_slice::<T, u8>(values).to_vec();
    if needs_swap(order) {
        swap_each(&mut bytes, std::mem::size_of::<T>());
    }
    bytes
}
