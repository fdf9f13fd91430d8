//! Immutable datatype descriptor tree.

use std::fmt;

use super::{ByteOrder, DatatypeClass, ReferenceFlavor, StringPad};
use crate::util::{Error, Result};

/// Size of a variable-length string slot (one pointer).
pub const VAR_STRING_SIZE: usize = 8;

/// Size of a variable-length sequence slot (length + pointer).
pub const VAR_LEN_SIZE: usize = 16;

/// A named member of a compound datatype.
#[derive(Clone, Debug, PartialEq)]
pub struct CompoundMember {
    pub name: String,
    pub datatype: Datatype,
}

impl CompoundMember {
    pub fn new(name: impl Into<String>, datatype: Datatype) -> Self {
        Self { name: name.into(), datatype }
    }
}

/// A named value of an enum datatype.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnumMember {
    pub name: String,
    /// Underlying integer, wide enough for any signed or unsigned base.
    pub value: i128,
}

impl EnumMember {
    pub fn new(name: impl Into<String>, value: i128) -> Self {
        Self { name: name.into(), value }
    }
}

/// Self-describing datatype: class, byte size, order, sign and, for
/// composite classes, the nested base or member descriptors.
///
/// Compound members are packed: each member starts at the cumulative size
/// of the members declared before it, so a compound's size is the sum of its
/// member sizes. An array's size is its element count times the base size.
#[derive(Clone, Debug, PartialEq)]
pub struct Datatype {
    class: DatatypeClass,
    size: usize,
    order: ByteOrder,
    signed: bool,
    base: Option<Box<Datatype>>,
    members: Vec<CompoundMember>,
    enum_members: Vec<EnumMember>,
    array_dims: Vec<usize>,
    var_str: bool,
    pad: StringPad,
    ref_flavor: Option<ReferenceFlavor>,
}

impl Datatype {
    const fn primitive(class: DatatypeClass, size: usize, signed: bool) -> Self {
        Self {
            class,
            size,
            order: ByteOrder::Little,
            signed,
            base: None,
            members: Vec::new(),
            enum_members: Vec::new(),
            array_dims: Vec::new(),
            var_str: false,
            pad: StringPad::NullPad,
            ref_flavor: None,
        }
    }

    // === Common predefined types ===

    pub const INT8: Self = Self::primitive(DatatypeClass::Integer, 1, true);
    pub const UINT8: Self = Self::primitive(DatatypeClass::Integer, 1, false);
    pub const INT16: Self = Self::primitive(DatatypeClass::Integer, 2, true);
    pub const UINT16: Self = Self::primitive(DatatypeClass::Integer, 2, false);
    pub const INT32: Self = Self::primitive(DatatypeClass::Integer, 4, true);
    pub const UINT32: Self = Self::primitive(DatatypeClass::Integer, 4, false);
    pub const INT64: Self = Self::primitive(DatatypeClass::Integer, 8, true);
    pub const UINT64: Self = Self::primitive(DatatypeClass::Integer, 8, false);
    pub const FLOAT16: Self = Self::primitive(DatatypeClass::Float, 2, true);
    pub const FLOAT32: Self = Self::primitive(DatatypeClass::Float, 4, true);
    pub const FLOAT64: Self = Self::primitive(DatatypeClass::Float, 8, true);
    /// 16-byte float, surfaced as a wide decimal.
    pub const FLOAT128: Self = Self::primitive(DatatypeClass::Float, 16, true);

    /// Integer of arbitrary byte size (sizes other than 1/2/4/8 do not convert).
    pub fn integer(size: usize, signed: bool) -> Self {
        Self::primitive(DatatypeClass::Integer, size, signed)
    }

    /// Float of arbitrary byte size (2, 4, 8 and 16 convert).
    pub fn float(size: usize) -> Self {
        Self::primitive(DatatypeClass::Float, size, true)
    }

    /// Zero-padded fixed-width text.
    pub fn fixed_string(size: usize) -> Self {
        Self {
            order: ByteOrder::None,
            ..Self::primitive(DatatypeClass::String, size, false)
        }
    }

    /// Variable-width text.
    pub fn var_string() -> Self {
        Self {
            order: ByteOrder::None,
            var_str: true,
            pad: StringPad::NullTerminate,
            ..Self::primitive(DatatypeClass::String, VAR_STRING_SIZE, false)
        }
    }

    pub fn bitfield(size: usize) -> Self {
        Self::primitive(DatatypeClass::Bitfield, size, false)
    }

    pub fn opaque(size: usize) -> Self {
        Self {
            order: ByteOrder::None,
            ..Self::primitive(DatatypeClass::Opaque, size, false)
        }
    }

    pub fn time(size: usize) -> Self {
        Self::primitive(DatatypeClass::Time, size, false)
    }

    /// Descriptor with no usable class.
    pub fn no_class() -> Self {
        Self::primitive(DatatypeClass::NoClass, 0, false)
    }

    /// Packed record; size is the sum of the member sizes.
    pub fn compound(members: Vec<CompoundMember>) -> Self {
        let size = members.iter().map(|m| m.datatype.size).sum();
        Self {
            order: ByteOrder::None,
            members,
            ..Self::primitive(DatatypeClass::Compound, size, false)
        }
    }

    /// Row-major array of `base` with the given extents.
    pub fn array(base: Datatype, dims: &[usize]) -> Self {
        let size = dims.iter().product::<usize>() * base.size;
        Self {
            order: base.order,
            base: Some(Box::new(base)),
            array_dims: dims.to_vec(),
            ..Self::primitive(DatatypeClass::Array, size, false)
        }
    }

    /// Variable-length sequence of `base`.
    pub fn var_len(base: Datatype) -> Self {
        Self {
            base: Some(Box::new(base)),
            ..Self::primitive(DatatypeClass::VarLen, VAR_LEN_SIZE, false)
        }
    }

    /// Enum over an integer base.
    pub fn enumeration(base: Datatype, members: Vec<EnumMember>) -> Self {
        Self {
            order: base.order,
            signed: base.signed,
            enum_members: members,
            ..Self::primitive(DatatypeClass::Enum, base.size, base.signed)
        }
        .with_base(base)
    }

    /// Reference of the given flavor.
    pub fn reference(flavor: ReferenceFlavor) -> Self {
        Self {
            order: ByteOrder::None,
            ref_flavor: Some(flavor),
            ..Self::primitive(DatatypeClass::Reference, flavor.token_size(), false)
        }
    }

    fn with_base(mut self, base: Datatype) -> Self {
        self.base = Some(Box::new(base));
        self
    }

    /// Same descriptor with a different byte order.
    pub fn with_order(mut self, order: ByteOrder) -> Self {
        self.order = order;
        self
    }

    /// Same descriptor with a different string padding.
    pub fn with_pad(mut self, pad: StringPad) -> Self {
        self.pad = pad;
        self
    }

    // === Accessors ===

    #[inline]
    pub fn class(&self) -> DatatypeClass {
        self.class
    }

    /// Size in bytes of one element.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn order(&self) -> ByteOrder {
        self.order
    }

    #[inline]
    pub fn is_signed(&self) -> bool {
        self.signed
    }

    #[inline]
    pub fn pad(&self) -> StringPad {
        self.pad
    }

    /// Base descriptor of an array, vlen or enum.
    pub fn base(&self) -> Option<&Datatype> {
        self.base.as_deref()
    }

    /// Compound members in declared order.
    pub fn members(&self) -> &[CompoundMember] {
        &self.members
    }

    pub fn enum_members(&self) -> &[EnumMember] {
        &self.enum_members
    }

    pub fn array_dims(&self) -> &[usize] {
        &self.array_dims
    }

    pub fn reference_flavor(&self) -> Option<ReferenceFlavor> {
        self.ref_flavor
    }

    // === Predicates ===

    pub fn is_compound(&self) -> bool {
        self.class == DatatypeClass::Compound
    }

    pub fn is_array(&self) -> bool {
        self.class == DatatypeClass::Array
    }

    pub fn is_text(&self) -> bool {
        self.class == DatatypeClass::String
    }

    pub fn is_var_str(&self) -> bool {
        self.class == DatatypeClass::String && self.var_str
    }

    /// True for variable-length sequences that are not text.
    pub fn is_vlen(&self) -> bool {
        self.class == DatatypeClass::VarLen
    }

    pub fn is_unsigned(&self) -> bool {
        matches!(self.class, DatatypeClass::Integer | DatatypeClass::Enum) && !self.signed
    }

    pub fn is_reference(&self) -> bool {
        self.class == DatatypeClass::Reference
    }

    pub fn is_region_ref(&self) -> bool {
        self.ref_flavor == Some(ReferenceFlavor::DatasetRegion)
    }

    pub fn is_std_ref(&self) -> bool {
        self.ref_flavor == Some(ReferenceFlavor::Standard)
    }

    /// 16-byte float, which has no native machine representation.
    pub fn is_wide_float(&self) -> bool {
        self.class == DatatypeClass::Float && self.size == 16
    }

    /// Innermost non-array descriptor.
    pub fn leaf_base(&self) -> &Datatype {
        let mut current = self;
        while current.is_array() {
            match current.base() {
                Some(base) => current = base,
                None => break,
            }
        }
        current
    }

    /// Number of base elements in one array element (1 for non-arrays).
    pub fn array_len(&self) -> usize {
        let mut len = 1;
        let mut current = self;
        while current.is_array() {
            len *= current.array_dims.iter().product::<usize>();
            match current.base() {
                Some(base) => current = base,
                None => break,
            }
        }
        len
    }

    /// True when this descriptor or anything below it is of `class`.
    pub fn contains(&self, class: DatatypeClass) -> bool {
        self.class == class
            || self.base().is_some_and(|b| b.contains(class))
            || self.members.iter().any(|m| m.datatype.contains(class))
    }

    // === Compound layout ===

    /// Byte offset of each member, accumulated with a running cursor.
    pub fn member_offsets(&self) -> Vec<usize> {
        let mut cursor = 0;
        self.members
            .iter()
            .map(|m| {
                let offset = cursor;
                cursor += m.datatype.size;
                offset
            })
            .collect()
    }

    /// Dotted paths of every non-compound member, depth first.
    pub fn flat_member_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        collect_member_names(self, "", &mut names);
        names
    }

    // === Enum lookups ===

    pub fn enum_name(&self, value: i128) -> Option<&str> {
        self.enum_members
            .iter()
            .find(|m| m.value == value)
            .map(|m| m.name.as_str())
    }

    pub fn enum_value(&self, name: &str) -> Option<i128> {
        self.enum_members.iter().find(|m| m.name == name).map(|m| m.value)
    }

    /// Check the structural invariants of the whole tree.
    pub fn validate(&self) -> Result<()> {
        match self.class {
            DatatypeClass::Compound => {
                let sum: usize = self.members.iter().map(|m| m.datatype.size).sum();
                if sum != self.size {
                    return Err(Error::InvalidDatatype(format!(
                        "compound size {} != sum of member sizes {}",
                        self.size, sum
                    )));
                }
                for m in &self.members {
                    m.datatype.validate()?;
                }
            }
            DatatypeClass::Array => {
                let base = self.base().ok_or_else(|| {
                    Error::InvalidDatatype("array without base type".into())
                })?;
                if self.array_dims.is_empty() {
                    return Err(Error::InvalidDatatype("array without extents".into()));
                }
                let expected = self.array_dims.iter().product::<usize>() * base.size;
                if expected != self.size {
                    return Err(Error::InvalidDatatype(format!(
                        "array size {} != {} elements x {} bytes",
                        self.size,
                        self.array_dims.iter().product::<usize>(),
                        base.size
                    )));
                }
                base.validate()?;
            }
            DatatypeClass::VarLen => {
                self.base()
                    .ok_or_else(|| Error::InvalidDatatype("vlen without base type".into()))?
                    .validate()?;
            }
            DatatypeClass::Enum => {
                let base = self.base().ok_or_else(|| {
                    Error::InvalidDatatype("enum without base type".into())
                })?;
                if base.class != DatatypeClass::Integer {
                    return Err(Error::InvalidDatatype(format!(
                        "enum base must be an integer, got {}",
                        base.class
                    )));
                }
            }
            DatatypeClass::Reference => {
                if self.ref_flavor.is_none() {
                    return Err(Error::InvalidDatatype("reference without flavor".into()));
                }
            }
            DatatypeClass::Integer
            | DatatypeClass::Float
            | DatatypeClass::Time
            | DatatypeClass::String
            | DatatypeClass::Bitfield
            | DatatypeClass::Opaque
            | DatatypeClass::NoClass => {}
        }
        Ok(())
    }
}

fn collect_member_names(dtype: &Datatype, prefix: &str, out: &mut Vec<String>) {
    for m in &dtype.members {
        let path = join_member_path(prefix, &m.name);
        let inner = m.datatype.leaf_base();
        if inner.is_compound() {
            collect_member_names(inner, &path, out);
        } else {
            out.push(path);
        }
    }
}

/// Dotted path of a member below `prefix`.
pub fn join_member_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", prefix, name)
    }
}

impl fmt::Display for Datatype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.class {
            DatatypeClass::Integer => {
                let sign = if self.signed { "" } else { "unsigned " };
                write!(f, "{}-bit {}integer", self.size * 8, sign)
            }
            DatatypeClass::Float => write!(f, "{}-bit floating-point", self.size * 8),
            DatatypeClass::String if self.var_str => write!(f, "String, length = variable"),
            DatatypeClass::String => write!(f, "String, length = {}", self.size),
            DatatypeClass::Bitfield => write!(f, "{}-bit bitfield", self.size * 8),
            DatatypeClass::Opaque => write!(f, "{}-byte opaque", self.size),
            DatatypeClass::Time => write!(f, "time"),
            DatatypeClass::NoClass => write!(f, "no class"),
            DatatypeClass::Compound => {
                write!(f, "Compound {{")?;
                for (i, m) in self.members.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", m.name, m.datatype)?;
                }
                write!(f, "}}")
            }
            DatatypeClass::Array => {
                write!(f, "Array [")?;
                for (i, d) in self.array_dims.iter().enumerate() {
                    if i > 0 {
                        write!(f, "x")?;
                    }
                    write!(f, "{}", d)?;
                }
                match self.base() {
                    Some(base) => write!(f, "] of {}", base),
                    None => write!(f, "] of ?"),
                }
            }
            DatatypeClass::VarLen => match self.base() {
                Some(base) => write!(f, "Variable-length of {}", base),
                None => write!(f, "Variable-length of ?"),
            },
            DatatypeClass::Enum => {
                write!(f, "{}-bit enum (", self.size * 8)?;
                for (i, m) in self.enum_members.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}={}", m.name, m.value)?;
                }
                write!(f, ")")
            }
            DatatypeClass::Reference => match self.ref_flavor {
                Some(ReferenceFlavor::Object) => write!(f, "Object reference"),
                Some(ReferenceFlavor::DatasetRegion) => write!(f, "Dataset region reference"),
                Some(ReferenceFlavor::Standard) | None => write!(f, "Standard reference"),
            },
        }
    }
}
