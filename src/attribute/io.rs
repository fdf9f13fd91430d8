//! Read/write transactions against one attribute.

use half::f16;

use super::data::{pod_from_bytes, pod_to_bytes};
use super::{AttributeData, Selection};
use crate::codec::{
    decode_elements, encode_elements, pad_text, trim_text, CodecOptions, Value, WideDecimal,
};
use crate::datatype::{Datatype, DatatypeClass, ReferenceFlavor};
use crate::native::{acquire, AttributeSource, HandleKind, ScopedHandle};
use crate::reference::ReferenceToken;
use crate::util::{Error, Result};

/// Direction of one transaction.
#[derive(Clone, Copy, Debug)]
pub enum IoKind<'a> {
    Read,
    Write(&'a AttributeData),
}

/// Run one transaction: `Some(data)` for reads, `None` for writes.
///
/// The attribute and native type handles are held for the whole call and
/// released on every exit path.
pub fn perform<S>(source: &S, io: IoKind<'_>, opts: &CodecOptions) -> Result<Option<AttributeData>>
where
    S: AttributeSource + ?Sized,
{
    match io {
        IoKind::Read => read(source, opts).map(Some),
        IoKind::Write(data) => write(source, data, opts).map(|()| None),
    }
}

/// Number of elements in the attribute's dataspace (1 for a scalar space).
pub fn element_count<S: AttributeSource + ?Sized>(source: &S) -> usize {
    source.dimensions().num_points()
}

fn open_handles<S: AttributeSource + ?Sized>(
    source: &S,
) -> Result<(ScopedHandle<'_, S>, ScopedHandle<'_, S>)> {
    let attr = acquire(source, HandleKind::Attribute, |s| s.open_attribute())?;
    let attr_id = attr.id();
    let mem_type = acquire(source, HandleKind::Datatype, |s| s.open_native_type(attr_id))?;
    Ok((attr, mem_type))
}

/// Read every element of the attribute.
///
/// Unlike reference resolution, a read does not degrade when the attribute
/// or its native type cannot be opened: the failure is logged and returned
/// as [`Error::HandleOpen`], so an unreadable attribute is never mistaken
/// for an empty one.
#[tracing::instrument(skip_all, fields(attribute = source.name()))]
pub fn read<S: AttributeSource + ?Sized>(source: &S, opts: &CodecOptions) -> Result<AttributeData> {
    let dtype = source.datatype();
    let count = element_count(source);
    let (attr, mem_type) = open_handles(source).inspect_err(|e| {
        tracing::warn!("attribute unavailable: {}", e);
    })?;

    if dtype.is_var_str() {
        tracing::trace!("reading {} variable-length strings", count);
        let strings = source.read_var_strings(attr.id(), mem_type.id(), count)?;
        return Ok(AttributeData::Strings(strings));
    }
    if dtype.is_vlen() {
        tracing::trace!("reading {} variable-length elements", count);
        let runs = source.read_var_len(attr.id(), mem_type.id(), count)?;
        return Ok(AttributeData::Values(decode_var_len(dtype, &runs, opts)));
    }

    let mut raw = vec![0u8; count * dtype.size()];
    source.read_raw(attr.id(), mem_type.id(), &mut raw)?;
    tracing::trace!("read {} bytes for {} elements", raw.len(), count);
    Ok(convert_after_read(dtype, &raw, count, opts))
}

fn decode_var_len(dtype: &Datatype, runs: &[Vec<u8>], opts: &CodecOptions) -> Vec<Value> {
    let Some(base) = dtype.base() else {
        return vec![Value::Error(crate::codec::ConversionError::MissingBase(DatatypeClass::VarLen)); runs.len()];
    };
    runs.iter()
        .map(|run| {
            let n = if base.size() == 0 { 0 } else { run.len() / base.size() };
            Value::VarLen(decode_elements(base, run, n, opts))
        })
        .collect()
}

/// Turn the bulk-read bytes into the natural buffer for `dtype`.
fn convert_after_read(dtype: &Datatype, raw: &[u8], count: usize, opts: &CodecOptions) -> AttributeData {
    let order = dtype.order();
    match (dtype.class(), dtype.size()) {
        (DatatypeClass::Integer, size) => match (size, dtype.is_signed()) {
            (1, true) => AttributeData::Int8(pod_from_bytes(raw, order)),
            (1, false) => AttributeData::UInt8(pod_from_bytes(raw, order)),
            (2, true) => AttributeData::Int16(pod_from_bytes(raw, order)),
            (2, false) => AttributeData::UInt16(pod_from_bytes(raw, order)),
            (4, true) => AttributeData::Int32(pod_from_bytes(raw, order)),
            (4, false) => AttributeData::UInt32(pod_from_bytes(raw, order)),
            (8, true) => AttributeData::Int64(pod_from_bytes(raw, order)),
            (8, false) => AttributeData::UInt64(pod_from_bytes(raw, order)),
            _ => AttributeData::Values(decode_elements(dtype, raw, count, opts)),
        },
        (DatatypeClass::Float, 2) => AttributeData::Float16(pod_from_bytes::<f16>(raw, order)),
        (DatatypeClass::Float, 4) => AttributeData::Float32(pod_from_bytes(raw, order)),
        (DatatypeClass::Float, 8) => AttributeData::Float64(pod_from_bytes(raw, order)),
        (DatatypeClass::Float, 16) => AttributeData::WideDecimal(pod_from_bytes::<WideDecimal>(raw, order)),
        (DatatypeClass::Array, _) if dtype.leaf_base().is_wide_float() => {
            // flattened: count x array length wide floats
            AttributeData::WideDecimal(pod_from_bytes::<WideDecimal>(raw, dtype.leaf_base().order()))
        }
        (DatatypeClass::String, size) => {
            let strings = opts.convert_byte_to_string.then(|| {
                raw.chunks_exact(size.max(1))
                    .take(count)
                    .map(|chunk| trim_text(chunk, dtype.pad()))
                    .collect::<Option<Vec<_>>>()
            });
            match strings.flatten() {
                Some(strings) => AttributeData::Strings(strings),
                None => {
                    if opts.convert_byte_to_string {
                        tracing::debug!("text is not UTF-8, returning raw bytes");
                    }
                    AttributeData::Bytes(raw.to_vec())
                }
            }
        }
        (DatatypeClass::Reference, 8) => AttributeData::UInt64(pod_from_bytes(raw, order)),
        (DatatypeClass::Reference, size) => AttributeData::References(ReferenceToken::split(raw, size)),
        (
            DatatypeClass::Float
            | DatatypeClass::Time
            | DatatypeClass::Bitfield
            | DatatypeClass::Opaque
            | DatatypeClass::Compound
            | DatatypeClass::Enum
            | DatatypeClass::VarLen
            | DatatypeClass::Array
            | DatatypeClass::NoClass,
            _,
        ) => AttributeData::Values(decode_elements(dtype, raw, count, opts)),
    }
}

/// The frame view of `full` for rank > 2, `full` itself otherwise.
pub fn apply_selection(dtype: &Datatype, full: &AttributeData, selection: &Selection) -> AttributeData {
    if selection.rank() <= 2 {
        return full.clone();
    }
    let group = match full {
        AttributeData::Bytes(_) => dtype.size(),
        AttributeData::WideDecimal(_) if dtype.is_array() => dtype.array_len(),
        _ => 1,
    };
    tracing::trace!(
        "selecting frame {} ({} x {})",
        selection.frame(),
        selection.height(),
        selection.width()
    );
    full.select(selection, group)
}

/// Reject writes that can never succeed, before any handle is opened.
fn preflight<S: AttributeSource + ?Sized>(source: &S, data: &AttributeData) -> Result<()> {
    let dtype = source.datatype();
    if source.is_read_only() {
        return Err(Error::ReadOnly);
    }
    if dtype.leaf_base().is_wide_float() || matches!(data, AttributeData::WideDecimal(_)) {
        return Err(Error::unsupported("writing 16-byte floating-point data"));
    }
    if dtype.is_vlen() {
        return Err(Error::unsupported("writing variable-length non-text data"));
    }
    if dtype.is_region_ref() {
        return Err(Error::unsupported("writing dataset-region references"));
    }
    if dtype.is_array() && dtype.leaf_base().is_compound() {
        return Err(Error::unsupported(format!("writing {}", dtype)));
    }
    Ok(())
}

/// What actually goes to the native write call.
enum WritePayload {
    Raw(Vec<u8>),
    VarStrings(Vec<String>),
}

/// Write every element of the attribute.
#[tracing::instrument(skip_all, fields(attribute = source.name(), kind = data.kind_name()))]
pub fn write<S: AttributeSource + ?Sized>(source: &S, data: &AttributeData, opts: &CodecOptions) -> Result<()> {
    preflight(source, data)?;

    let count = element_count(source);
    let (attr, mem_type) = open_handles(source)?;
    match convert_for_write(source, data, count, opts)? {
        WritePayload::Raw(bytes) => {
            tracing::trace!("writing {} bytes for {} elements", bytes.len(), count);
            source.write_raw(attr.id(), mem_type.id(), &bytes)
        }
        WritePayload::VarStrings(strings) => source.write_var_strings(attr.id(), mem_type.id(), &strings),
    }
}

fn check_count(expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(Error::SizeMismatch { expected, actual });
    }
    Ok(())
}

fn narrow<A, B>(values: &[A]) -> Result<Vec<B>>
where
    A: Copy + std::fmt::Display,
    B: TryFrom<A>,
{
    values
        .iter()
        .map(|&v| {
            B::try_from(v).map_err(|_| {
                Error::conversion(format!("{} out of range for {}", v, std::any::type_name::<B>()))
            })
        })
        .collect()
}

fn convert_for_write<S: AttributeSource + ?Sized>(
    source: &S,
    data: &AttributeData,
    count: usize,
    opts: &CodecOptions,
) -> Result<WritePayload> {
    let dtype = source.datatype();
    let order = dtype.order();
    let size = dtype.size();

    if let AttributeData::Values(values) = data {
        check_count(count, values.len())?;
        return Ok(WritePayload::Raw(encode_elements(dtype, values, opts)?));
    }
    if let AttributeData::Bytes(bytes) = data {
        check_count(count * size, bytes.len())?;
        return Ok(WritePayload::Raw(bytes.clone()));
    }

    let payload = match dtype.class() {
        DatatypeClass::Integer | DatatypeClass::Bitfield => {
            check_count(count, data.len())?;
            integer_bytes(dtype, data)?
        }
        DatatypeClass::Float => {
            check_count(count, data.len())?;
            match (size, data) {
                (2, AttributeData::Float16(v)) => pod_to_bytes(v, order),
                (4, AttributeData::Float32(v)) => pod_to_bytes(v, order),
                (8, AttributeData::Float64(v)) => pod_to_bytes(v, order),
                (4, AttributeData::Float64(v)) => {
                    let narrowed: Vec<f32> = v.iter().map(|&x| x as f32).collect();
                    pod_to_bytes(&narrowed, order)
                }
                _ => return Err(Error::mismatch(dtype.to_string(), data.kind_name())),
            }
        }
        DatatypeClass::String if dtype.is_var_str() => match data {
            AttributeData::Strings(strings) => {
                check_count(count, strings.len())?;
                return Ok(WritePayload::VarStrings(strings.clone()));
            }
            _ => return Err(Error::mismatch(dtype.to_string(), data.kind_name())),
        },
        DatatypeClass::String => match data {
            AttributeData::Strings(strings) => {
                check_count(count, strings.len())?;
                let mut bytes = vec![0u8; count * size];
                for (s, slot) in strings.iter().zip(bytes.chunks_exact_mut(size.max(1))) {
                    pad_text(s.as_bytes(), slot, dtype.pad());
                }
                bytes
            }
            _ => return Err(Error::mismatch(dtype.to_string(), data.kind_name())),
        },
        DatatypeClass::Enum => {
            check_count(count, data.len())?;
            match data {
                AttributeData::Strings(names) => {
                    let values = names
                        .iter()
                        .map(|name| {
                            dtype
                                .enum_value(name)
                                .map(|value| Value::Enum { value, name: None })
                                .ok_or_else(|| {
                                    Error::conversion(format!("'{}' is not a member of {}", name, dtype))
                                })
                        })
                        .collect::<Result<Vec<_>>>()?;
                    encode_elements(dtype, &values, opts)?
                }
                _ => integer_bytes(dtype, data)?,
            }
        }
        DatatypeClass::Reference => {
            check_count(count, data.len())?;
            reference_bytes(source, dtype, data)?
        }
        DatatypeClass::Array
        | DatatypeClass::Compound
        | DatatypeClass::VarLen
        | DatatypeClass::Opaque
        | DatatypeClass::Time
        | DatatypeClass::NoClass => {
            return Err(Error::mismatch(dtype.to_string(), data.kind_name()));
        }
    };
    Ok(WritePayload::Raw(payload))
}

/// Integer buffers, narrowing a wider signed buffer into an unsigned type
/// one size down (int16 -> uint8, int32 -> uint16, int64 -> uint32).
fn integer_bytes(dtype: &Datatype, data: &AttributeData) -> Result<Vec<u8>> {
    let order = dtype.order();
    let unsigned = !dtype.is_signed();
    Ok(match (dtype.size(), data) {
        (1, AttributeData::Int8(v)) => pod_to_bytes(v, order),
        (1, AttributeData::UInt8(v)) => pod_to_bytes(v, order),
        (1, AttributeData::Int16(v)) if unsigned => pod_to_bytes(&narrow::<i16, u8>(v)?, order),
        (2, AttributeData::Int16(v)) => pod_to_bytes(v, order),
        (2, AttributeData::UInt16(v)) => pod_to_bytes(v, order),
        (2, AttributeData::Int32(v)) if unsigned => pod_to_bytes(&narrow::<i32, u16>(v)?, order),
        (4, AttributeData::Int32(v)) => pod_to_bytes(v, order),
        (4, AttributeData::UInt32(v)) => pod_to_bytes(v, order),
        (4, AttributeData::Int64(v)) if unsigned => pod_to_bytes(&narrow::<i64, u32>(v)?, order),
        (8, AttributeData::Int64(v)) => pod_to_bytes(v, order),
        (8, AttributeData::UInt64(v)) => pod_to_bytes(v, order),
        _ => return Err(Error::mismatch(dtype.to_string(), data.kind_name())),
    })
}

/// Reference buffers: tokens as-is, raw 8-byte addresses, or one object
/// path per element turned into a new token.
fn reference_bytes<S: AttributeSource + ?Sized>(
    source: &S,
    dtype: &Datatype,
    data: &AttributeData,
) -> Result<Vec<u8>> {
    let size = dtype.size();
    let flavor = dtype.reference_flavor().unwrap_or(ReferenceFlavor::Standard);
    let tokens = match data {
        AttributeData::References(tokens) => tokens.clone(),
        AttributeData::UInt64(raw) if size == 8 => return Ok(pod_to_bytes(raw, dtype.order())),
        AttributeData::Strings(paths) => paths
            .iter()
            .map(|path| {
                tracing::trace!("creating reference to {}", path);
                source.create_reference(path, flavor)
            })
            .collect::<Result<Vec<_>>>()?,
        _ => return Err(Error::mismatch(dtype.to_string(), data.kind_name())),
    };

    let mut bytes = Vec::with_capacity(tokens.len() * size);
    for token in &tokens {
        check_count(size, token.len())?;
        bytes.extend_from_slice(token.as_bytes());
    }
    Ok(bytes)
}
