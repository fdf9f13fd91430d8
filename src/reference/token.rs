//! Opaque reference tokens.

use smallvec::SmallVec;
use std::fmt;

/// Width of a standard reference token.
pub const STD_REF_SIZE: usize = 64;
/// Width of a legacy object reference (an object address).
pub const OBJECT_REF_SIZE: usize = 8;
/// Width of a legacy dataset-region reference.
pub const DATASET_REGION_REF_SIZE: usize = 12;

/// Fixed-size opaque bytes identifying an object, attribute or region.
///
/// All-zero bytes mean "no reference".
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReferenceToken {
    bytes: SmallVec<[u8; STD_REF_SIZE]>,
}

impl ReferenceToken {
    pub fn from_slice(bytes: &[u8]) -> Self {
        Self { bytes: SmallVec::from_slice(bytes) }
    }

    /// All-zero token of the given width.
    pub fn null(size: usize) -> Self {
        Self { bytes: smallvec::smallvec![0; size] }
    }

    /// 8-byte token holding a little-endian object address.
    pub fn from_u64(raw: u64) -> Self {
        Self::from_slice(&raw.to_le_bytes())
    }

    /// Little-endian integer view of an 8-byte token.
    pub fn as_u64(&self) -> Option<u64> {
        let bytes: [u8; OBJECT_REF_SIZE] = self.bytes.as_slice().try_into().ok()?;
        Some(u64::from_le_bytes(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Byte-by-byte check for the unset sentinel.
    pub fn is_null(&self) -> bool {
        self.bytes.iter().all(|&b| b == 0)
    }

    /// Split a packed buffer into tokens of `size` bytes (a trailing partial token is dropped).
    pub fn split(buffer: &[u8], size: usize) -> Vec<Self> {
        if size == 0 {
            return Vec::new();
        }
        buffer.chunks_exact(size).map(Self::from_slice).collect()
    }
}

impl fmt::Debug for ReferenceToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token(")?;
        for b in self.bytes.iter() {
            write!(f, "{:02x}", b)?;
        }
        write!(f, ")")
    }
}

impl From<&[u8]> for ReferenceToken {
    fn from(bytes: &[u8]) -> Self {
        Self::from_slice(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null() {
        assert!(ReferenceToken::null(STD_REF_SIZE).is_null());
        let mut bytes = [0u8; STD_REF_SIZE];
        bytes[63] = 1;
        assert!(!ReferenceToken::from_slice(&bytes).is_null());
    }

    #[test]
    fn test_u64() {
        let t = ReferenceToken::from_u64(0x1234);
        assert_eq!(t.len(), OBJECT_REF_SIZE);
        assert_eq!(t.as_u64(), Some(0x1234));
        assert_eq!(ReferenceToken::null(12).as_u64(), None);
    }

    #[test]
    fn test_split() {
        let buf = [1u8, 1, 2, 2, 3];
        let tokens = ReferenceToken::split(&buf, 2);
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[1].as_bytes(), &[2, 2]);
        assert_eq!(format!("{:?}", tokens[0]), "Token(0101)");
    }
}
