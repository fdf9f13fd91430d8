//! Reference primitives consumed by the resolver.

use super::{ObjectType, ReferenceKind, ReferenceToken, SelectionType};
use crate::native::{HandleId, HandleRelease};
use crate::util::Result;

/// Low-level queries on reference tokens and the spaces they select.
///
/// Any of these may fail; the resolver degrades the affected field instead
/// of propagating. Handles returned by the `open_*` methods are closed
/// through [`HandleRelease`].
pub trait ReferencePrimitives: HandleRelease {
    /// Kind of a standard reference token.
    fn reference_kind(&self, token: &ReferenceToken) -> Result<ReferenceKind>;

    /// Full path of the file holding the referenced object.
    fn file_name(&self, token: &ReferenceToken) -> Result<String>;

    /// Absolute path of the referenced object.
    fn object_name(&self, token: &ReferenceToken) -> Result<String>;

    /// Name of the referenced attribute (attribute references only).
    fn attribute_name(&self, token: &ReferenceToken) -> Result<String>;

    fn object_type(&self, token: &ReferenceToken) -> Result<ObjectType>;

    /// Open the referenced object.
    fn open_object(&self, token: &ReferenceToken) -> Result<HandleId>;

    /// Open the dataspace carrying the referenced region selection.
    fn open_region(&self, token: &ReferenceToken) -> Result<HandleId>;

    /// Open the referenced attribute.
    fn open_attribute(&self, token: &ReferenceToken) -> Result<HandleId>;

    /// Open the dataspace of an open attribute.
    fn attribute_space(&self, attr: HandleId) -> Result<HandleId>;

    fn space_rank(&self, space: HandleId) -> Result<usize>;

    fn selection_type(&self, space: HandleId) -> Result<SelectionType>;

    /// Selected points, `rank` coordinates per point, flattened.
    fn selection_points(&self, space: HandleId) -> Result<Vec<u64>>;

    /// Selected blocks, start then end corner (`2 * rank` values) per block, flattened.
    fn selection_blocks(&self, space: HandleId) -> Result<Vec<u64>>;
}
