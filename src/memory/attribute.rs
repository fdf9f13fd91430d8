//! In-memory attribute storage.

use std::cell::RefCell;
use std::rc::Rc;

use super::file::{MemoryFile, OpenHandleSpec};
use crate::datatype::{Datatype, ReferenceFlavor};
use crate::native::{AttributeSource, HandleId, HandleKind, HandleRelease};
use crate::reference::{ObjectType, ReferenceKind, ReferencePrimitives, ReferenceToken, SelectionType};
use crate::util::{Dimensions, Error, Result};

#[derive(Clone, Debug, PartialEq)]
enum Storage {
    Raw(Vec<u8>),
    VarStrings(Vec<String>),
    VarLen(Vec<Vec<u8>>),
}

/// One attribute stored in memory, attached to a [`MemoryFile`].
///
/// Fixed-width data is held as packed element bytes; variable-length
/// strings and sequences are held per element.
pub struct MemoryAttribute {
    file: Rc<MemoryFile>,
    name: String,
    datatype: Datatype,
    dims: Dimensions,
    read_only: bool,
    storage: RefCell<Storage>,
}

impl MemoryAttribute {
    /// Zero-filled attribute.
    pub fn new(file: Rc<MemoryFile>, name: impl Into<String>, datatype: Datatype, dims: Dimensions) -> Self {
        let count = dims.num_points();
        let storage = if datatype.is_var_str() {
            Storage::VarStrings(vec![String::new(); count])
        } else if datatype.is_vlen() {
            Storage::VarLen(vec![Vec::new(); count])
        } else {
            Storage::Raw(vec![0u8; count * datatype.size()])
        };
        Self {
            file,
            name: name.into(),
            datatype,
            dims,
            read_only: false,
            storage: RefCell::new(storage),
        }
    }

    /// Replace the packed element bytes.
    pub fn with_raw(self, bytes: Vec<u8>) -> Self {
        *self.storage.borrow_mut() = Storage::Raw(bytes);
        self
    }

    pub fn with_var_strings(self, strings: Vec<String>) -> Self {
        *self.storage.borrow_mut() = Storage::VarStrings(strings);
        self
    }

    /// One packed run of base elements per element.
    pub fn with_var_len(self, runs: Vec<Vec<u8>>) -> Self {
        *self.storage.borrow_mut() = Storage::VarLen(runs);
        self
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn file(&self) -> &MemoryFile {
        &self.file
    }

    /// Stored packed bytes (empty for variable-length storage).
    pub fn raw_bytes(&self) -> Vec<u8> {
        match &*self.storage.borrow() {
            Storage::Raw(bytes) => bytes.clone(),
            Storage::VarStrings(_) | Storage::VarLen(_) => Vec::new(),
        }
    }

    /// Stored variable-length strings (empty for other storage).
    pub fn var_strings(&self) -> Vec<String> {
        match &*self.storage.borrow() {
            Storage::VarStrings(strings) => strings.clone(),
            Storage::Raw(_) | Storage::VarLen(_) => Vec::new(),
        }
    }

    fn check_io_handles(&self, attr: HandleId, mem_type: HandleId) -> Result<()> {
        self.file.check_handle(attr, HandleKind::Attribute)?;
        self.file.check_handle(mem_type, HandleKind::Datatype)
    }
}

impl HandleRelease for MemoryAttribute {
    fn release(&self, kind: HandleKind, id: HandleId) -> Result<()> {
        self.file.release(kind, id)
    }
}

impl AttributeSource for MemoryAttribute {
    fn name(&self) -> &str {
        &self.name
    }

    fn datatype(&self) -> &Datatype {
        &self.datatype
    }

    fn dimensions(&self) -> Dimensions {
        self.dims.clone()
    }

    fn is_read_only(&self) -> bool {
        self.read_only
    }

    fn open_attribute(&self) -> Result<HandleId> {
        self.file.enter("open_attribute")?;
        Ok(self.file.open_handle(
            HandleKind::Attribute,
            OpenHandleSpec::Attribute { rank: self.dims.rank() },
        ))
    }

    fn open_native_type(&self, attr: HandleId) -> Result<HandleId> {
        self.file.enter("open_native_type")?;
        self.file.check_handle(attr, HandleKind::Attribute)?;
        Ok(self.file.open_handle(HandleKind::Datatype, OpenHandleSpec::NativeType))
    }

    fn read_raw(&self, attr: HandleId, mem_type: HandleId, buf: &mut [u8]) -> Result<()> {
        self.file.enter("read_raw")?;
        self.check_io_handles(attr, mem_type)
            .map_err(|e| Error::ReadFailed(e.to_string()))?;
        match &*self.storage.borrow() {
            Storage::Raw(bytes) if bytes.len() == buf.len() => {
                buf.copy_from_slice(bytes);
                Ok(())
            }
            Storage::Raw(bytes) => Err(Error::ReadFailed(format!(
                "{}: stored {} bytes, requested {}",
                self.name,
                bytes.len(),
                buf.len()
            ))),
            Storage::VarStrings(_) | Storage::VarLen(_) => Err(Error::ReadFailed(format!(
                "{}: variable-length data read as fixed-width",
                self.name
            ))),
        }
    }

    fn read_var_strings(&self, attr: HandleId, mem_type: HandleId, count: usize) -> Result<Vec<String>> {
        self.file.enter("read_var_strings")?;
        self.check_io_handles(attr, mem_type)
            .map_err(|e| Error::ReadFailed(e.to_string()))?;
        match &*self.storage.borrow() {
            Storage::VarStrings(strings) => {
                let mut out = strings.clone();
                out.resize(count, String::new());
                Ok(out)
            }
            _ => Err(Error::ReadFailed(format!("{}: not a variable-length string", self.name))),
        }
    }

    fn read_var_len(&self, attr: HandleId, mem_type: HandleId, count: usize) -> Result<Vec<Vec<u8>>> {
        self.file.enter("read_var_len")?;
        self.check_io_handles(attr, mem_type)
            .map_err(|e| Error::ReadFailed(e.to_string()))?;
        match &*self.storage.borrow() {
            Storage::VarLen(runs) => {
                let mut out = runs.clone();
                out.resize(count, Vec::new());
                Ok(out)
            }
            _ => Err(Error::ReadFailed(format!("{}: not a variable-length sequence", self.name))),
        }
    }

    fn write_raw(&self, attr: HandleId, mem_type: HandleId, buf: &[u8]) -> Result<()> {
        self.file.enter("write_raw")?;
        self.check_io_handles(attr, mem_type)
            .map_err(|e| Error::WriteFailed(e.to_string()))?;
        let expected = self.dims.num_points() * self.datatype.size();
        if buf.len() != expected {
            return Err(Error::WriteFailed(format!(
                "{}: expected {} bytes, got {}",
                self.name,
                expected,
                buf.len()
            )));
        }
        *self.storage.borrow_mut() = Storage::Raw(buf.to_vec());
        Ok(())
    }

    fn write_var_strings(&self, attr: HandleId, mem_type: HandleId, values: &[String]) -> Result<()> {
        self.file.enter("write_var_strings")?;
        self.check_io_handles(attr, mem_type)
            .map_err(|e| Error::WriteFailed(e.to_string()))?;
        *self.storage.borrow_mut() = Storage::VarStrings(values.to_vec());
        Ok(())
    }

    fn create_reference(&self, path: &str, flavor: ReferenceFlavor) -> Result<ReferenceToken> {
        self.file.enter("create_reference")?;
        let object = self
            .file
            .find(path)
            .ok_or_else(|| Error::NotFound(path.to_string()))?;
        match flavor {
            ReferenceFlavor::Standard => Ok(self.file.object_reference(object)),
            ReferenceFlavor::Object => Ok(self.file.legacy_object_reference(object)),
            ReferenceFlavor::DatasetRegion => Err(Error::unsupported("region reference from a path")),
        }
    }
}

impl ReferencePrimitives for MemoryAttribute {
    fn reference_kind(&self, token: &ReferenceToken) -> Result<ReferenceKind> {
        self.file.reference_kind(token)
    }

    fn file_name(&self, token: &ReferenceToken) -> Result<String> {
        self.file.file_name(token)
    }

    fn object_name(&self, token: &ReferenceToken) -> Result<String> {
        self.file.object_name(token)
    }

    fn attribute_name(&self, token: &ReferenceToken) -> Result<String> {
        self.file.attribute_name(token)
    }

    fn object_type(&self, token: &ReferenceToken) -> Result<ObjectType> {
        self.file.object_type(token)
    }

    fn open_object(&self, token: &ReferenceToken) -> Result<HandleId> {
        self.file.open_object(token)
    }

    fn open_region(&self, token: &ReferenceToken) -> Result<HandleId> {
        self.file.open_region(token)
    }

    fn open_attribute(&self, token: &ReferenceToken) -> Result<HandleId> {
        ReferencePrimitives::open_attribute(&*self.file, token)
    }

    fn attribute_space(&self, attr: HandleId) -> Result<HandleId> {
        self.file.attribute_space(attr)
    }

    fn space_rank(&self, space: HandleId) -> Result<usize> {
        self.file.space_rank(space)
    }

    fn selection_type(&self, space: HandleId) -> Result<SelectionType> {
        self.file.selection_type(space)
    }

    fn selection_points(&self, space: HandleId) -> Result<Vec<u64>> {
        self.file.selection_points(space)
    }

    fn selection_blocks(&self, space: HandleId) -> Result<Vec<u64>> {
        self.file.selection_blocks(space)
    }
}
