//! Values to bytes.

use byteorder::{BigEndian, LittleEndian};
use half::f16;

use super::{CodecOptions, Value};
use crate::datatype::{join_member_path, ByteOrder, Datatype, DatatypeClass, StringPad};
use crate::util::{Error, Result};

/// Encode one element into a fresh buffer of exactly `dtype.size()` bytes.
pub fn encode(dtype: &Datatype, value: &Value, opts: &CodecOptions) -> Result<Vec<u8>> {
    let mut buf = vec![0u8; dtype.size()];
    encode_into(dtype, value, &mut buf, opts)?;
    Ok(buf)
}

/// Encode one element into the front of `buf`.
///
/// Wide floats and variable-length data are always rejected. Elements that
/// are error sentinels, or whose class has no conversion, are written as
/// zeros.
pub fn encode_into(dtype: &Datatype, value: &Value, buf: &mut [u8], opts: &CodecOptions) -> Result<()> {
    let size = dtype.size();
    if buf.len() < size {
        return Err(Error::SizeMismatch { expected: size, actual: buf.len() });
    }
    encode_member(dtype, value, &mut buf[..size], opts, "")
}

/// Encode a run of elements back to back.
pub fn encode_elements(dtype: &Datatype, values: &[Value], opts: &CodecOptions) -> Result<Vec<u8>> {
    let size = dtype.size();
    let mut buf = vec![0u8; size * values.len()];
    for (i, value) in values.iter().enumerate() {
        encode_member(dtype, value, &mut buf[i * size..(i + 1) * size], opts, "")?;
    }
    Ok(buf)
}

fn encode_member(
    dtype: &Datatype,
    value: &Value,
    buf: &mut [u8],
    opts: &CodecOptions,
    path: &str,
) -> Result<()> {
    if dtype.is_wide_float() || matches!(value, Value::WideDecimal(_)) {
        return Err(Error::unsupported("writing 16-byte floating-point data"));
    }
    if dtype.is_vlen() || dtype.is_var_str() {
        return Err(Error::unsupported(format!(
            "writing variable-length data through fixed-width encode ({})",
            dtype
        )));
    }
    if let Value::Error(e) = value {
        tracing::warn!("writing zeros for unconvertible element: {}", e);
        buf.fill(0);
        return Ok(());
    }

    match dtype.class() {
        DatatypeClass::Integer => encode_integer(dtype, value, buf),
        DatatypeClass::Float => encode_float(dtype, value, buf),
        DatatypeClass::String => encode_text(dtype, value, buf),
        DatatypeClass::Bitfield => match value {
            Value::Bytes(bytes) => {
                copy_padded(bytes, buf, 0);
                Ok(())
            }
            _ => encode_integer(dtype, value, buf),
        },
        DatatypeClass::Enum => encode_enum(dtype, value, buf),
        DatatypeClass::Reference => encode_reference(dtype, value, buf),
        DatatypeClass::Array => encode_array(dtype, value, buf, opts, path),
        DatatypeClass::Compound => encode_compound(dtype, value, buf, opts, path),
        DatatypeClass::VarLen => Err(Error::unsupported("writing variable-length data")),
        DatatypeClass::Opaque | DatatypeClass::Time | DatatypeClass::NoClass => {
            tracing::warn!("no conversion for {} element, writing zeros", dtype.class());
            buf.fill(0);
            Ok(())
        }
    }
}

fn mismatch(dtype: &Datatype, value: &Value) -> Error {
    Error::mismatch(dtype.class().name(), value.kind_name())
}

/// Integer of 1, 2, 4 or 8 bytes, range-checked against the target width.
pub(crate) fn write_integer(buf: &mut [u8], order: ByteOrder, signed: bool, v: i128) -> Result<()> {
    let size = buf.len();
    let (min, max): (i128, i128) = match (size, signed) {
        (1 | 2 | 4 | 8, true) => {
            let bits = size as u32 * 8;
            (-(1i128 << (bits - 1)), (1i128 << (bits - 1)) - 1)
        }
        (1 | 2 | 4 | 8, false) => (0, (1i128 << (size as u32 * 8)) - 1),
        _ => {
            tracing::warn!("no conversion for {}-byte integer, writing zeros", size);
            buf.fill(0);
            return Ok(());
        }
    };
    if v < min || v > max {
        return Err(Error::conversion(format!(
            "{} does not fit a {}-byte {} integer",
            v,
            size,
            if signed { "signed" } else { "unsigned" }
        )));
    }
    // two's complement truncation to the target width
    let raw = v as u64;
    match order {
        ByteOrder::Big => <BigEndian as byteorder::ByteOrder>::write_uint(buf, mask(raw, size), size),
        ByteOrder::Little | ByteOrder::None => {
            <LittleEndian as byteorder::ByteOrder>::write_uint(buf, mask(raw, size), size)
        }
    }
    Ok(())
}

fn mask(raw: u64, size: usize) -> u64 {
    if size >= 8 {
        raw
    } else {
        raw & ((1u64 << (size * 8)) - 1)
    }
}

fn encode_integer(dtype: &Datatype, value: &Value, buf: &mut [u8]) -> Result<()> {
    let v = value.as_i128().ok_or_else(|| mismatch(dtype, value))?;
    write_integer(buf, dtype.order(), dtype.is_signed(), v)
}

fn encode_float(dtype: &Datatype, value: &Value, buf: &mut [u8]) -> Result<()> {
    let v = value.as_f64().ok_or_else(|| mismatch(dtype, value))?;
    match dtype.order() {
        ByteOrder::Big => write_float::<BigEndian>(buf, value, v),
        ByteOrder::Little | ByteOrder::None => write_float::<LittleEndian>(buf, value, v),
    }
    Ok(())
}

fn write_float<B: byteorder::ByteOrder>(buf: &mut [u8], value: &Value, v: f64) {
    match buf.len() {
        2 => {
            let h = match value {
                Value::Float16(h) => *h,
                _ => f16::from_f64(v),
            };
            B::write_u16(buf, h.to_bits());
        }
        4 => {
            let f = match value {
                Value::Float32(f) => *f,
                _ => v as f32,
            };
            B::write_f32(buf, f);
        }
        8 => B::write_f64(buf, v),
        size => {
            tracing::warn!("no conversion for {}-byte float, writing zeros", size);
            buf.fill(0);
        }
    }
}

/// Copy `src` into `dst`, truncating or filling the tail with `fill`.
fn copy_padded(src: &[u8], dst: &mut [u8], fill: u8) {
    let n = src.len().min(dst.len());
    dst[..n].copy_from_slice(&src[..n]);
    dst[n..].fill(fill);
}

fn encode_text(dtype: &Datatype, value: &Value, buf: &mut [u8]) -> Result<()> {
    let bytes = match value {
        Value::String(s) => s.as_bytes(),
        Value::Bytes(b) => b.as_slice(),
        _ => return Err(mismatch(dtype, value)),
    };
    pad_text(bytes, buf, dtype.pad());
    Ok(())
}

/// Fixed-width text slot: fill per `pad`, and only a null-terminated slot
/// gives up its last byte to the terminator.
pub(crate) fn pad_text(src: &[u8], slot: &mut [u8], pad: StringPad) {
    match pad {
        StringPad::SpacePad => copy_padded(src, slot, b' '),
        StringPad::NullPad => copy_padded(src, slot, 0),
        StringPad::NullTerminate => {
            copy_padded(src, slot, 0);
            if let Some(last) = slot.last_mut() {
                *last = 0;
            }
        }
    }
}

fn encode_enum(dtype: &Datatype, value: &Value, buf: &mut [u8]) -> Result<()> {
    let v = match value {
        Value::String(name) => dtype
            .enum_value(name)
            .ok_or_else(|| Error::conversion(format!("'{}' is not a member of {}", name, dtype)))?,
        Value::Enum { value, .. } => *value,
        other => other.as_i128().ok_or_else(|| mismatch(dtype, value))?,
    };
    write_integer(buf, dtype.order(), dtype.is_signed(), v)
}

fn encode_reference(dtype: &Datatype, value: &Value, buf: &mut [u8]) -> Result<()> {
    match value {
        Value::Reference(raw) if buf.len() == 8 => {
            write_integer(buf, dtype.order(), false, *raw as i128)
        }
        Value::Token(token) if token.len() == buf.len() => {
            buf.copy_from_slice(token.as_bytes());
            Ok(())
        }
        Value::Token(token) => Err(Error::SizeMismatch { expected: buf.len(), actual: token.len() }),
        _ => Err(mismatch(dtype, value)),
    }
}

fn encode_array(
    dtype: &Datatype,
    value: &Value,
    buf: &mut [u8],
    opts: &CodecOptions,
    path: &str,
) -> Result<()> {
    let base = dtype
        .base()
        .ok_or_else(|| Error::InvalidDatatype("array without base type".into()))?;
    let items = match value {
        Value::Array(items) => items,
        _ => return Err(mismatch(dtype, value)),
    };
    let count: usize = dtype.array_dims().iter().product();
    if items.len() != count {
        return Err(Error::SizeMismatch { expected: count, actual: items.len() });
    }

    let step = base.size();
    for (i, item) in items.iter().enumerate() {
        encode_member(base, item, &mut buf[i * step..(i + 1) * step], opts, path)?;
    }
    Ok(())
}

fn encode_compound(
    dtype: &Datatype,
    value: &Value,
    buf: &mut [u8],
    opts: &CodecOptions,
    path: &str,
) -> Result<()> {
    let fields = match value {
        Value::Compound(fields) => fields,
        _ => return Err(mismatch(dtype, value)),
    };

    let mut cursor = 0usize;
    for member in dtype.members() {
        let offset = cursor;
        let end = offset + member.datatype.size();
        cursor = end;

        let member_path = join_member_path(path, &member.name);
        let nested = member.datatype.leaf_base().is_compound();
        if !nested && !opts.members.is_selected(&member_path) {
            continue;
        }
        match fields.iter().find(|f| f.name == member.name) {
            Some(field) => {
                encode_member(&member.datatype, &field.value, &mut buf[offset..end], opts, &member_path)?
            }
            None => tracing::trace!("no value for member {}, leaving zeros", member_path),
        }
    }
    Ok(())
}
