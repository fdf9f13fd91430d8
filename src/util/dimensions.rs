//! Dataspace extents.
//!
//! An attribute's dataspace is either scalar (no extents, one element) or
//! simple (one extent per rank). Selections and buffer sizing work from the
//! element count.

use smallvec::SmallVec;

/// Extents of an attribute dataspace.
///
/// A scalar space has rank 0 and holds exactly one element. Attribute values
/// normalize it to rank 1 with a single element (see [`Dimensions::normalized`]).
/// A zero extent is a valid empty space.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Dimensions {
    /// Current extent per rank, slowest-varying first. Empty for a scalar space.
    dims: SmallVec<[usize; 4]>,
}

impl Dimensions {
    /// Scalar dataspace.
    pub fn scalar() -> Self {
        Self { dims: SmallVec::new() }
    }

    /// Simple dataspace of rank 1.
    pub fn d1(size: usize) -> Self {
        Self { dims: smallvec::smallvec![size] }
    }

    /// Simple dataspace of rank 2, row extent first.
    pub fn d2(rows: usize, cols: usize) -> Self {
        Self { dims: smallvec::smallvec![rows, cols] }
    }

    /// Simple dataspace with the given extents; an empty slice is scalar.
    pub fn from_slice(extents: &[usize]) -> Self {
        Self { dims: SmallVec::from_slice(extents) }
    }

    #[inline]
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Extent along `axis`, `None` past the rank.
    pub fn size(&self, axis: usize) -> Option<usize> {
        self.dims.get(axis).copied()
    }

    pub fn sizes(&self) -> &[usize] {
        &self.dims
    }

    /// Element count of the dataspace: 1 for scalar, 0 when any extent is 0.
    pub fn num_points(&self) -> usize {
        self.dims.iter().product()
    }

    #[inline]
    pub fn is_scalar(&self) -> bool {
        self.dims.is_empty()
    }

    /// Rank 0 becomes rank 1 with one element; a simple space is unchanged.
    pub fn normalized(&self) -> Self {
        if self.is_scalar() {
            Self::d1(1)
        } else {
            self.clone()
        }
    }
}

impl From<usize> for Dimensions {
    fn from(size: usize) -> Self {
        Self::d1(size)
    }
}

impl From<Vec<usize>> for Dimensions {
    fn from(extents: Vec<usize>) -> Self {
        Self { dims: SmallVec::from_vec(extents) }
    }
}

/// `scalar` or the extents joined by `x`, e.g. `[2 x 3]`.
impl std::fmt::Display for Dimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_scalar() {
            return write!(f, "scalar");
        }
        write!(f, "[")?;
        for (i, s) in self.dims.iter().enumerate() {
            if i > 0 {
                write!(f, " x ")?;
            }
            write!(f, "{}", s)?;
        }
        write!(f, "]")
    }
}
