//! In-memory backend.
//!
//! [`MemoryFile`] implements the reference primitives over objects and
//! tokens registered in memory; [`MemoryAttribute`] implements the
//! attribute source on top of it. Both count open handles and primitive
//! calls and accept injected failures, which makes them the natural backend
//! for embedding and tests. No on-disk format is involved.

mod attribute;
mod file;

pub use attribute::MemoryAttribute;
pub use file::{MemoryFile, ObjectId, RegionSelection};
