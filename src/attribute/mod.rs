//! Attribute I/O.
//!
//! [`perform`] runs one read or write transaction against an
//! [`AttributeSource`](crate::native::AttributeSource): it sizes the buffer
//! from the dataspace, holds scoped attribute and type handles, dispatches
//! to the codec and applies post-read and pre-write conversions.
//! [`Attribute`] wraps a source with lazy materialization, a [`Selection`]
//! and a per-attribute reference cache.

mod data;
mod io;
mod object;
mod selection;

pub use data::AttributeData;
pub use io::{apply_selection, element_count, perform, read, write, IoKind};
pub use object::Attribute;
pub use selection::{select_frame, Selection};
