//! Reference tokens and their resolution.
//!
//! - [`ReferenceToken`] - opaque fixed-size token bytes
//! - [`ReferenceRecord`] - what a token points at, with text renderings
//! - [`ReferencePrimitives`] - lookups the resolver is built on
//! - [`ReferenceResolver`] - cached, best-effort token resolution

mod cache;
mod primitives;
mod record;
mod region;
mod resolver;
mod token;

pub use cache::TokenCache;
pub use primitives::ReferencePrimitives;
pub use record::{ObjectType, ReferenceKind, ReferenceRecord, RegionType, SelectionType, NULL};
pub use region::{format_blocks, format_points};
pub use resolver::ReferenceResolver;
pub use token::{ReferenceToken, DATASET_REGION_REF_SIZE, OBJECT_REF_SIZE, STD_REF_SIZE};
