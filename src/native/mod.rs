//! Native handle discipline and the attribute collaborator interface.
//!
//! Every native handle is owned by a [`ScopedHandle`] for the duration of a
//! single call and released when the guard drops, on success and error
//! paths alike. Release failures are logged, never propagated.

use std::fmt;

use crate::datatype::{Datatype, ReferenceFlavor};
use crate::reference::ReferenceToken;
use crate::util::{Dimensions, Error, Result};

/// Identifier of an open native handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandleId(pub i64);

impl HandleId {
    pub const INVALID: HandleId = HandleId(-1);

    #[inline]
    pub fn is_valid(self) -> bool {
        self.0 >= 0
    }
}

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What a handle refers to, which decides how it is closed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HandleKind {
    Attribute,
    Datatype,
    Dataspace,
    Object,
    Region,
}

impl HandleKind {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Attribute => "attribute",
            Self::Datatype => "datatype",
            Self::Dataspace => "dataspace",
            Self::Object => "object",
            Self::Region => "region",
        }
    }
}

impl fmt::Display for HandleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Closes native handles.
pub trait HandleRelease {
    fn release(&self, kind: HandleKind, id: HandleId) -> Result<()>;
}

/// A native handle released on drop.
pub struct ScopedHandle<'a, R: HandleRelease + ?Sized> {
    owner: &'a R,
    kind: HandleKind,
    id: HandleId,
}

impl<'a, R: HandleRelease + ?Sized> ScopedHandle<'a, R> {
    #[inline]
    pub fn id(&self) -> HandleId {
        self.id
    }

    #[inline]
    pub fn kind(&self) -> HandleKind {
        self.kind
    }
}

impl<R: HandleRelease + ?Sized> Drop for ScopedHandle<'_, R> {
    fn drop(&mut self) {
        tracing::trace!("releasing {} handle {}", self.kind, self.id);
        if let Err(e) = self.owner.release(self.kind, self.id) {
            tracing::warn!("failed to release {} handle {}: {}", self.kind, self.id, e);
        }
    }
}

impl<R: HandleRelease + ?Sized> fmt::Debug for ScopedHandle<'_, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedHandle")
            .field("kind", &self.kind)
            .field("id", &self.id)
            .finish()
    }
}

/// Open a handle through `open` and tie its lifetime to the returned guard.
///
/// Open failures and invalid ids become [`Error::HandleOpen`]; nothing is
/// released in that case since nothing was acquired.
pub fn acquire<'a, R, F>(owner: &'a R, kind: HandleKind, open: F) -> Result<ScopedHandle<'a, R>>
where
    R: HandleRelease + ?Sized,
    F: FnOnce(&'a R) -> Result<HandleId>,
{
    let id = open(owner).map_err(|e| match e {
        e @ Error::HandleOpen { .. } => e,
        other => Error::HandleOpen {
            kind: kind.to_string(),
            reason: other.to_string(),
        },
    })?;
    if !id.is_valid() {
        return Err(Error::HandleOpen {
            kind: kind.to_string(),
            reason: format!("invalid id {}", id),
        });
    }
    tracing::trace!("acquired {} handle {}", kind, id);
    Ok(ScopedHandle { owner, kind, id })
}

/// The attribute-side collaborator: metadata plus raw I/O on one attribute.
///
/// Write and variable-length operations default to `Unsupported` so a
/// read-only backend only implements the read path.
pub trait AttributeSource: HandleRelease {
    fn name(&self) -> &str;

    fn datatype(&self) -> &Datatype;

    /// Dataspace extents (empty for a scalar space).
    fn dimensions(&self) -> Dimensions;

    fn is_read_only(&self) -> bool {
        false
    }

    /// Open the attribute itself.
    fn open_attribute(&self) -> Result<HandleId>;

    /// Create the in-memory native type matching the attribute datatype.
    fn open_native_type(&self, attr: HandleId) -> Result<HandleId>;

    /// Bulk read of all elements into `buf` (`count * datatype.size()` bytes).
    fn read_raw(&self, attr: HandleId, mem_type: HandleId, buf: &mut [u8]) -> Result<()>;

    /// One string per element of a variable-length string attribute.
    fn read_var_strings(&self, attr: HandleId, mem_type: HandleId, count: usize) -> Result<Vec<String>> {
        let _ = (attr, mem_type, count);
        Err(Error::unsupported(format!("{}: variable-length string read", self.name())))
    }

    /// One packed run of base elements per element of a vlen attribute.
    fn read_var_len(&self, attr: HandleId, mem_type: HandleId, count: usize) -> Result<Vec<Vec<u8>>> {
        let _ = (attr, mem_type, count);
        Err(Error::unsupported(format!("{}: variable-length read", self.name())))
    }

    fn write_raw(&self, attr: HandleId, mem_type: HandleId, buf: &[u8]) -> Result<()> {
        let _ = (attr, mem_type, buf);
        Err(Error::unsupported(format!("{}: raw write", self.name())))
    }

    fn write_var_strings(&self, attr: HandleId, mem_type: HandleId, values: &[String]) -> Result<()> {
        let _ = (attr, mem_type, values);
        Err(Error::unsupported(format!("{}: variable-length string write", self.name())))
    }

    /// Create a reference token of `flavor` to the object at `path`.
    fn create_reference(&self, path: &str, flavor: ReferenceFlavor) -> Result<ReferenceToken> {
        let _ = flavor;
        Err(Error::unsupported(format!("{}: create reference to {}", self.name(), path)))
    }
}
