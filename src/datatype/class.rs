//! Datatype classes and per-class properties.

use std::fmt;

/// Datatype class tag.
///
/// The set is closed: every match over it is exhaustive, so a new class
/// cannot silently fall into a default arm.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum DatatypeClass {
    /// Fixed-point integer
    Integer = 0,
    /// IEEE floating point
    Float = 1,
    /// Date/time (no conversion defined)
    Time = 2,
    /// Fixed-width or variable-width text
    String = 3,
    /// Bit field
    Bitfield = 4,
    /// Uninterpreted bytes
    Opaque = 5,
    /// Record with named, ordered members
    Compound = 6,
    /// Reference to an object, attribute or region
    Reference = 7,
    /// Named integer values
    Enum = 8,
    /// Variable-length sequence
    VarLen = 9,
    /// Fixed-size array of a base type
    Array = 10,
    /// Missing or unrecognized class
    #[default]
    NoClass = 255,
}

impl DatatypeClass {
    /// Returns the name of this class.
    #[inline]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Time => "time",
            Self::String => "string",
            Self::Bitfield => "bitfield",
            Self::Opaque => "opaque",
            Self::Compound => "compound",
            Self::Reference => "reference",
            Self::Enum => "enum",
            Self::VarLen => "vlen",
            Self::Array => "array",
            Self::NoClass => "no-class",
        }
    }

    /// Convert from the numeric class code used in datatype messages.
    pub const fn from_code(code: i32) -> Self {
        match code {
            0 => Self::Integer,
            1 => Self::Float,
            2 => Self::Time,
            3 => Self::String,
            4 => Self::Bitfield,
            5 => Self::Opaque,
            6 => Self::Compound,
            7 => Self::Reference,
            8 => Self::Enum,
            9 => Self::VarLen,
            10 => Self::Array,
            _ => Self::NoClass,
        }
    }

    /// Returns true for classes that carry a base or member descriptors.
    #[inline]
    pub const fn is_composite(self) -> bool {
        matches!(self, Self::Compound | Self::Array | Self::VarLen | Self::Enum)
    }
}

impl fmt::Display for DatatypeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Byte order of numeric data.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ByteOrder {
    /// Little-endian (the native order on every supported target)
    #[default]
    Little,
    /// Big-endian
    Big,
    /// Not applicable (strings, opaque, compound)
    None,
}

/// Padding of fixed-width text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum StringPad {
    /// Text ends at the first NUL
    NullTerminate,
    /// Trailing NUL bytes are padding
    #[default]
    NullPad,
    /// Trailing spaces are padding
    SpacePad,
}

/// Encoding family of a reference datatype.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReferenceFlavor {
    /// Legacy object reference (8-byte address)
    Object,
    /// Legacy dataset-region reference (12 bytes)
    DatasetRegion,
    /// Opaque standard reference token (object, region or attribute)
    Standard,
}

impl ReferenceFlavor {
    /// Size in bytes of one token of this flavor.
    pub const fn token_size(self) -> usize {
        match self {
            Self::Object => crate::reference::OBJECT_REF_SIZE,
            Self::DatasetRegion => crate::reference::DATASET_REGION_REF_SIZE,
            Self::Standard => crate::reference::STD_REF_SIZE,
        }
    }
}
