//! Resolved reference descriptions.

use serde::Serialize;
use std::fmt;

use super::ReferenceToken;

/// Placeholder for any field that is unset or could not be resolved.
pub const NULL: &str = "NULL";

/// Kind of a reference token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum ReferenceKind {
    /// Kind could not be determined
    BadType,
    /// Legacy object reference
    Object1,
    /// Legacy dataset-region reference
    DatasetRegion1,
    /// Standard object reference
    Object2,
    /// Standard dataset-region reference
    DatasetRegion2,
    /// Standard attribute reference
    Attribute,
    /// Any other kind
    Other,
}

impl ReferenceKind {
    pub const fn name(self) -> &'static str {
        match self {
            Self::BadType => "H5R_BADTYPE",
            Self::Object1 => "H5R_OBJECT1",
            Self::DatasetRegion1 => "H5R_DATASET_REGION1",
            Self::Object2 => "H5R_OBJECT2",
            Self::DatasetRegion2 => "H5R_DATASET_REGION2",
            Self::Attribute => "H5R_ATTR",
            Self::Other => "H5R_OTHER",
        }
    }

    pub const fn is_object(self) -> bool {
        matches!(self, Self::Object1 | Self::Object2)
    }

    pub const fn is_region(self) -> bool {
        matches!(self, Self::DatasetRegion1 | Self::DatasetRegion2)
    }
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Type of the object a reference points at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum ObjectType {
    Group,
    Dataset,
    NamedDatatype,
    Unknown(i32),
}

impl Default for ObjectType {
    fn default() -> Self {
        ObjectType::Unknown(-1)
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectType::Group => write!(f, "GROUP"),
            ObjectType::Dataset => write!(f, "DATASET"),
            ObjectType::NamedDatatype => write!(f, "DATATYPE"),
            ObjectType::Unknown(code) => write!(f, "UNKNOWN {}", code),
        }
    }
}

/// Classification recorded for the region part of a reference.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub enum RegionType {
    /// Nothing resolved
    #[default]
    Null,
    /// Point-list selection
    Point,
    /// Hyperslab block selection
    Block,
    /// Region whose selection is neither points nor blocks
    RegionUnknown,
    /// Plain object reference, no region
    ObjectRef,
    /// Attribute reference
    Attribute,
    /// Unrecognized reference kind
    Unknown,
}

impl RegionType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Null => NULL,
            Self::Point => "REGION_TYPE POINT",
            Self::Block => "REGION_TYPE BLOCK",
            Self::RegionUnknown => "REGION_TYPE UNKNOWN",
            Self::ObjectRef => "H5O_TYPE_OBJ_REF",
            Self::Attribute => "H5R_ATTR",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for RegionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Shape of a dataspace selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SelectionType {
    None,
    Points,
    Hyperslabs,
    All,
}

/// Everything known about one reference token.
///
/// Text fields hold [`NULL`] when unset or unresolved. Built once per token
/// and read-only afterwards.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReferenceRecord {
    #[serde(skip)]
    pub token: ReferenceToken,
    pub file_path: String,
    pub file_name: String,
    pub object_name: String,
    pub attribute_name: String,
    pub kind: ReferenceKind,
    pub object_type: ObjectType,
    pub region_type: RegionType,
    pub region_desc: String,
    /// Rank of the referenced dataspace, when it was opened.
    pub region_rank: Option<usize>,
}

fn is_set(field: &str) -> bool {
    field != NULL
}

/// Append `part` to `out`, preceded by `sep` when `out` is not empty.
fn push_part(out: &mut String, sep: &str, part: &str) {
    if !out.is_empty() {
        out.push_str(sep);
    }
    out.push_str(part);
}

impl ReferenceRecord {
    /// Record with every field unset.
    pub fn null(token: ReferenceToken) -> Self {
        Self {
            token,
            file_path: NULL.to_string(),
            file_name: NULL.to_string(),
            object_name: NULL.to_string(),
            attribute_name: NULL.to_string(),
            kind: ReferenceKind::BadType,
            object_type: ObjectType::default(),
            region_type: RegionType::Null,
            region_desc: NULL.to_string(),
            region_rank: None,
        }
    }

    /// True when nothing was resolved (the zero-token record).
    pub fn is_null(&self) -> bool {
        !is_set(&self.file_path)
            && !is_set(&self.object_name)
            && !is_set(&self.attribute_name)
            && self.region_type == RegionType::Null
            && !is_set(&self.region_desc)
    }

    /// `object[/attribute][ region]`
    pub fn object_reference_name(&self) -> String {
        let mut out = String::new();
        if is_set(&self.object_name) {
            out.push_str(&self.object_name);
        }
        if is_set(&self.attribute_name) {
            push_part(&mut out, "/", &self.attribute_name);
        }
        if is_set(&self.region_desc) {
            push_part(&mut out, " ", &self.region_desc);
        }
        out
    }

    /// `file/object[/attribute][ region]`
    pub fn full_reference_name(&self) -> String {
        let mut out = String::new();
        if is_set(&self.file_name) {
            out.push_str(&self.file_name);
        }
        if is_set(&self.object_name) {
            push_part(&mut out, "/", &self.object_name);
        }
        if is_set(&self.attribute_name) {
            push_part(&mut out, "/", &self.attribute_name);
        }
        if is_set(&self.region_desc) {
            push_part(&mut out, " ", &self.region_desc);
        }
        out
    }

    /// `region-type[ description]`
    pub fn region_dataset(&self) -> String {
        let mut out = self.region_type.as_str().to_string();
        if is_set(&self.region_desc) {
            push_part(&mut out, " ", &self.region_desc);
        }
        out
    }

    /// Object part then region part, or `NULL` when both are empty.
    ///
    /// The object path is appended directly to the file name since object
    /// paths are absolute.
    pub fn reference_region(&self) -> String {
        let mut object = String::new();
        if is_set(&self.file_name) {
            object.push_str(&self.file_name);
        }
        if is_set(&self.object_name) {
            object.push_str(&self.object_name);
        }
        if is_set(&self.attribute_name) {
            push_part(&mut object, "/", &self.attribute_name);
        }

        let mut region = String::new();
        if self.region_type != RegionType::Null {
            region.push_str(self.region_type.as_str());
        }
        if is_set(&self.region_desc) {
            push_part(&mut region, " ", &self.region_desc);
        }

        let mut out = object;
        if !region.is_empty() {
            out.push(' ');
            out.push_str(&region);
        }
        if out.is_empty() {
            NULL.to_string()
        } else {
            out
        }
    }
}
