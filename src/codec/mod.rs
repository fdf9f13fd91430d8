//! Byte/value codec.
//!
//! Walks a [`Datatype`](crate::datatype::Datatype) tree to turn raw element
//! bytes into [`Value`]s and back.
//!
//! Decoding is total: an element with no conversion becomes a
//! [`Value::Error`] and its siblings are still decoded. Encoding returns a
//! `Result` and rejects 16-byte floats and variable-length data outright.
//!
//! Compound members are laid out at the cumulative size of the members
//! declared before them; both directions track that offset with a running
//! cursor.

mod decode;
mod encode;
mod options;
mod value;
mod wide;

pub use decode::{decode, decode_elements};
pub use encode::{encode, encode_elements, encode_into};
pub use options::{CodecOptions, MemberSelection};
pub use value::{ConversionError, Field, Value};
pub use wide::WideDecimal;

pub(crate) use decode::trim_text;
pub(crate) use encode::pad_text;
