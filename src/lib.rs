//! # h5attr
//!
//! Typed attribute values for HDF5-style hierarchical containers.
//!
//! Attribute payloads are self-describing: their byte layout follows a
//! recursive datatype descriptor (primitive, array, compound, variable-length,
//! enum or reference). This crate decodes and encodes those payloads, runs
//! read/write transactions against a native attribute handle, and resolves
//! reference tokens into readable descriptions of what they point at.
//!
//! ## Modules
//!
//! - [`util`] - Errors, dataspace extents, settings
//! - [`datatype`] - Datatype descriptor tree
//! - [`codec`] - Byte/value codec
//! - [`native`] - Scoped native handles and the attribute collaborator trait
//! - [`attribute`] - Attribute I/O orchestration and the attribute value object
//! - [`reference`] - Reference tokens, records and the resolver
//! - [`memory`] - In-memory backend
//!
//! ## Example
//!
//! ```ignore
//! use std::rc::Rc;
//! use h5attr::prelude::*;
//!
//! let file = Rc::new(MemoryFile::new("/data/run.h5"));
//! let source = MemoryAttribute::new(file, "scale", Datatype::FLOAT64, Dimensions::d1(3));
//! let mut attr = Attribute::new(source);
//! attr.write(&AttributeData::Float64(vec![1.0, 2.0, 4.0]))?;
//! assert_eq!(attr.read()?, &AttributeData::Float64(vec![1.0, 2.0, 4.0]));
//! ```

pub mod attribute;
pub mod codec;
pub mod datatype;
pub mod memory;
pub mod native;
pub mod reference;
pub mod util;

// Re-export commonly used types
pub use util::{Error, Result};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::attribute::{Attribute, AttributeData, IoKind, Selection};
    pub use crate::codec::{decode, encode, CodecOptions, MemberSelection, Value, WideDecimal};
    pub use crate::datatype::{CompoundMember, Datatype, DatatypeClass, EnumMember, ReferenceFlavor};
    pub use crate::memory::{MemoryAttribute, MemoryFile, RegionSelection};
    pub use crate::native::AttributeSource;
    pub use crate::reference::{ReferenceRecord, ReferenceResolver, ReferenceToken};
    pub use crate::util::{Dimensions, Error, Result, Settings};
}
