//! Datatype descriptors.
//!
//! A [`Datatype`] is an immutable tree describing the binary layout of one
//! attribute element: its [`DatatypeClass`], byte size, order and sign, and
//! for composite classes the nested base or member descriptors.

mod class;
mod descriptor;

pub use class::{ByteOrder, DatatypeClass, ReferenceFlavor, StringPad};
pub use descriptor::{
    join_member_path, CompoundMember, Datatype, EnumMember, VAR_LEN_SIZE, VAR_STRING_SIZE,
};
