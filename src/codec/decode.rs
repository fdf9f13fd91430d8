//! Bytes to values.

use byteorder::{BigEndian, LittleEndian};
use half::f16;

use super::{CodecOptions, ConversionError, Field, Value, WideDecimal};
use crate::datatype::{join_member_path, ByteOrder, Datatype, DatatypeClass, StringPad};
use crate::reference::{ReferenceToken, OBJECT_REF_SIZE};

/// Decode one element of `dtype` from the front of `bytes`.
///
/// Never fails: an element that cannot be converted comes back as
/// [`Value::Error`] and does not affect its siblings.
pub fn decode(dtype: &Datatype, bytes: &[u8], opts: &CodecOptions) -> Value {
    decode_member(dtype, bytes, opts, "")
}

/// Decode `count` consecutive elements of `dtype`.
pub fn decode_elements(
    dtype: &Datatype,
    bytes: &[u8],
    count: usize,
    opts: &CodecOptions,
) -> Vec<Value> {
    let size = dtype.size();
    (0..count)
        .map(|i| {
            let start = i * size;
            match bytes.get(start..) {
                Some(rest) => decode(dtype, rest, opts),
                None => Value::Error(ConversionError::Truncated {
                    needed: start + size,
                    available: bytes.len(),
                }),
            }
        })
        .collect()
}

fn decode_member(dtype: &Datatype, bytes: &[u8], opts: &CodecOptions, path: &str) -> Value {
    let size = dtype.size();
    if bytes.len() < size {
        return Value::Error(ConversionError::Truncated { needed: size, available: bytes.len() });
    }
    let bytes = &bytes[..size];

    match dtype.class() {
        DatatypeClass::Integer => decode_integer(bytes, dtype.order(), dtype.is_signed()),
        DatatypeClass::Float => decode_float(bytes, dtype.order()),
        DatatypeClass::String if dtype.is_var_str() => Value::Error(ConversionError::VarLenInFixed),
        DatatypeClass::String => decode_text(bytes, dtype.pad(), opts),
        DatatypeClass::Bitfield => Value::Bytes(bytes.to_vec()),
        DatatypeClass::Enum => decode_enum(dtype, bytes),
        DatatypeClass::Reference => decode_reference(bytes, dtype.order()),
        DatatypeClass::Array => decode_array(dtype, bytes, opts, path),
        DatatypeClass::Compound => decode_compound(dtype, bytes, opts, path),
        DatatypeClass::VarLen => Value::Error(ConversionError::VarLenInFixed),
        DatatypeClass::Opaque | DatatypeClass::Time | DatatypeClass::NoClass => {
            tracing::debug!("no conversion for {} element", dtype.class());
            Value::Error(ConversionError::UnsupportedClass(dtype.class()))
        }
    }
}

/// Integer of 1, 2, 4 or 8 bytes in the given order.
pub(crate) fn decode_integer(bytes: &[u8], order: ByteOrder, signed: bool) -> Value {
    match order {
        ByteOrder::Big => decode_integer_as::<BigEndian>(bytes, signed),
        ByteOrder::Little | ByteOrder::None => decode_integer_as::<LittleEndian>(bytes, signed),
    }
}

fn decode_integer_as<B: byteorder::ByteOrder>(bytes: &[u8], signed: bool) -> Value {
    match (bytes.len(), signed) {
        (1, true) => Value::Int8(bytes[0] as i8),
        (1, false) => Value::UInt8(bytes[0]),
        (2, true) => Value::Int16(B::read_i16(bytes)),
        (2, false) => Value::UInt16(B::read_u16(bytes)),
        (4, true) => Value::Int32(B::read_i32(bytes)),
        (4, false) => Value::UInt32(B::read_u32(bytes)),
        (8, true) => Value::Int64(B::read_i64(bytes)),
        (8, false) => Value::UInt64(B::read_u64(bytes)),
        (size, _) => Value::Error(ConversionError::UnsupportedSize {
            class: DatatypeClass::Integer,
            size,
        }),
    }
}

fn decode_float(bytes: &[u8], order: ByteOrder) -> Value {
    match order {
        ByteOrder::Big => decode_float_as::<BigEndian>(bytes),
        ByteOrder::Little | ByteOrder::None => decode_float_as::<LittleEndian>(bytes),
    }
}

fn decode_float_as<B: byteorder::ByteOrder>(bytes: &[u8]) -> Value {
    match bytes.len() {
        2 => Value::Float16(f16::from_bits(B::read_u16(bytes))),
        4 => Value::Float32(B::read_f32(bytes)),
        8 => Value::Float64(B::read_f64(bytes)),
        16 => Value::WideDecimal(WideDecimal::from_bits(B::read_u128(bytes))),
        size => Value::Error(ConversionError::UnsupportedSize {
            class: DatatypeClass::Float,
            size,
        }),
    }
}

/// Fixed-width text with its padding removed, or `None` when the content
/// is not UTF-8.
pub(crate) fn trim_text(bytes: &[u8], pad: StringPad) -> Option<String> {
    let end = match pad {
        StringPad::NullTerminate | StringPad::NullPad => {
            bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len())
        }
        StringPad::SpacePad => bytes
            .iter()
            .rposition(|&b| b != b' ' && b != 0)
            .map_or(0, |p| p + 1),
    };
    std::str::from_utf8(&bytes[..end]).ok().map(str::to_string)
}

fn decode_text(bytes: &[u8], pad: StringPad, opts: &CodecOptions) -> Value {
    if opts.convert_byte_to_string {
        match trim_text(bytes, pad) {
            Some(text) => Value::String(text),
            None => {
                tracing::debug!("fixed-width text is not UTF-8, keeping raw bytes");
                Value::Bytes(bytes.to_vec())
            }
        }
    } else {
        Value::Bytes(bytes.to_vec())
    }
}

fn decode_enum(dtype: &Datatype, bytes: &[u8]) -> Value {
    match decode_integer(bytes, dtype.order(), dtype.is_signed()).as_i128() {
        Some(value) => Value::Enum {
            value,
            name: dtype.enum_name(value).map(str::to_string),
        },
        None => Value::Error(ConversionError::UnsupportedSize {
            class: DatatypeClass::Enum,
            size: bytes.len(),
        }),
    }
}

fn decode_reference(bytes: &[u8], order: ByteOrder) -> Value {
    if bytes.len() == OBJECT_REF_SIZE {
        let raw = match order {
            ByteOrder::Big => <BigEndian as byteorder::ByteOrder>::read_u64(bytes),
            ByteOrder::Little | ByteOrder::None => {
                <LittleEndian as byteorder::ByteOrder>::read_u64(bytes)
            }
        };
        Value::Reference(raw)
    } else {
        Value::Token(ReferenceToken::from_slice(bytes))
    }
}

fn decode_array(dtype: &Datatype, bytes: &[u8], opts: &CodecOptions, path: &str) -> Value {
    let Some(base) = dtype.base() else {
        return Value::Error(ConversionError::MissingBase(DatatypeClass::Array));
    };
    let count: usize = dtype.array_dims().iter().product();
    let step = base.size();
    tracing::trace!("array of {} x {} bytes", count, step);

    let items = (0..count)
        .map(|i| decode_member(base, &bytes[(i * step).min(bytes.len())..], opts, path))
        .collect();
    Value::Array(items)
}

fn decode_compound(dtype: &Datatype, bytes: &[u8], opts: &CodecOptions, path: &str) -> Value {
    let mut fields = Vec::with_capacity(dtype.members().len());
    let mut cursor = 0usize;

    for member in dtype.members() {
        let offset = cursor;
        cursor += member.datatype.size();

        let member_path = join_member_path(path, &member.name);
        let nested = member.datatype.leaf_base().is_compound();
        if !nested && !opts.members.is_selected(&member_path) {
            tracing::trace!("skipping unselected member {}", member_path);
            continue;
        }

        let value = decode_member(&member.datatype, &bytes[offset.min(bytes.len())..], opts, &member_path);
        fields.push(Field::new(member.name.clone(), value));
    }
    Value::Compound(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::MemberSelection;
    use crate::datatype::{CompoundMember, EnumMember, ReferenceFlavor};

    fn opts() -> CodecOptions {
        CodecOptions::default()
    }

    #[test]
    fn test_integers() {
        assert_eq!(decode(&Datatype::INT8, &[0xff], &opts()), Value::Int8(-1));
        assert_eq!(decode(&Datatype::UINT8, &[0xff], &opts()), Value::UInt8(255));
        assert_eq!(decode(&Datatype::INT16, &[0x34, 0x12], &opts()), Value::Int16(0x1234));
        let be = Datatype::UINT32.with_order(ByteOrder::Big);
        assert_eq!(decode(&be, &[0, 0, 1, 2], &opts()), Value::UInt32(0x0102));
    }

    #[test]
    fn test_odd_integer_size_is_sentinel() {
        let dt = Datatype::integer(3, true);
        assert_eq!(
            decode(&dt, &[1, 2, 3], &opts()),
            Value::Error(ConversionError::UnsupportedSize { class: DatatypeClass::Integer, size: 3 })
        );
    }

    #[test]
    fn test_floats() {
        assert_eq!(decode(&Datatype::FLOAT32, &1.5f32.to_le_bytes(), &opts()), Value::Float32(1.5));
        assert_eq!(decode(&Datatype::FLOAT64, &(-2.0f64).to_le_bytes(), &opts()), Value::Float64(-2.0));
        let half = f16::from_f32(0.5);
        assert_eq!(decode(&Datatype::FLOAT16, &half.to_le_bytes(), &opts()), Value::Float16(half));
        let wide = WideDecimal::from_f64(4.0);
        assert_eq!(decode(&Datatype::FLOAT128, &wide.to_le_bytes(), &opts()), Value::WideDecimal(wide));
    }

    #[test]
    fn test_text() {
        let dt = Datatype::fixed_string(6);
        assert_eq!(decode(&dt, b"abc\0\0\0", &opts()), Value::String("abc".into()));
        let raw = CodecOptions { convert_byte_to_string: false, ..opts() };
        assert_eq!(decode(&dt, b"abc\0\0\0", &raw), Value::Bytes(b"abc\0\0\0".to_vec()));
        let spaced = Datatype::fixed_string(5).with_pad(StringPad::SpacePad);
        assert_eq!(decode(&spaced, b"hi   ", &opts()), Value::String("hi".into()));
        assert_eq!(
            decode(&Datatype::var_string(), &[0; 8], &opts()),
            Value::Error(ConversionError::VarLenInFixed)
        );
    }

    #[test]
    fn test_enum() {
        let dt = Datatype::enumeration(
            Datatype::INT16,
            vec![EnumMember::new("LOW", -1), EnumMember::new("HIGH", 1)],
        );
        assert_eq!(
            decode(&dt, &(-1i16).to_le_bytes(), &opts()),
            Value::Enum { value: -1, name: Some("LOW".into()) }
        );
        assert_eq!(
            decode(&dt, &7i16.to_le_bytes(), &opts()),
            Value::Enum { value: 7, name: None }
        );
    }

    #[test]
    fn test_references() {
        let obj = Datatype::reference(ReferenceFlavor::Object);
        assert_eq!(decode(&obj, &42u64.to_le_bytes(), &opts()), Value::Reference(42));
        let region = Datatype::reference(ReferenceFlavor::DatasetRegion);
        let bytes = [1u8; 12];
        assert_eq!(
            decode(&region, &bytes, &opts()),
            Value::Token(ReferenceToken::from_slice(&bytes))
        );
    }

    #[test]
    fn test_opaque_is_terminal_sentinel() {
        let dt = Datatype::compound(vec![
            CompoundMember::new("blob", Datatype::opaque(2)),
            CompoundMember::new("n", Datatype::UINT8),
        ]);
        let v = decode(&dt, &[9, 9, 7], &opts());
        assert!(v.field("blob").is_some_and(Value::is_error));
        assert_eq!(v.field("n"), Some(&Value::UInt8(7)));
    }

    #[test]
    fn test_nested_array() {
        let dt = Datatype::array(Datatype::array(Datatype::UINT8, &[2]), &[2]);
        let v = decode(&dt, &[1, 2, 3, 4], &opts());
        assert_eq!(
            v,
            Value::Array(vec![
                Value::Array(vec![Value::UInt8(1), Value::UInt8(2)]),
                Value::Array(vec![Value::UInt8(3), Value::UInt8(4)]),
            ])
        );
    }

    #[test]
    fn test_compound_selection_keeps_nested() {
        let inner = Datatype::compound(vec![
            CompoundMember::new("x", Datatype::UINT8),
            CompoundMember::new("y", Datatype::UINT8),
        ]);
        let dt = Datatype::compound(vec![
            CompoundMember::new("a", Datatype::UINT8),
            CompoundMember::new("pos", inner),
            CompoundMember::new("b", Datatype::UINT8),
        ]);
        let sel = opts().with_members(MemberSelection::only(["b", "pos.y"]));
        let v = decode(&dt, &[1, 2, 3, 4], &sel);
        assert_eq!(v.field("a"), None);
        assert_eq!(v.field("b"), Some(&Value::UInt8(4)));
        let pos = v.field("pos").cloned().unwrap_or(Value::Int8(0));
        assert_eq!(pos, Value::Compound(vec![Field::new("y", Value::UInt8(3))]));
    }

    #[test]
    fn test_truncated_elements() {
        let values = decode_elements(&Datatype::UINT16, &[1, 0, 2], 3, &opts());
        assert_eq!(values[0], Value::UInt16(1));
        assert!(values[1].is_error());
        assert!(values[2].is_error());
    }
}
