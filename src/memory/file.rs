//! In-memory container with reference bookkeeping.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};

use crate::native::{HandleId, HandleKind, HandleRelease};
use crate::reference::{
    ObjectType, ReferenceKind, ReferencePrimitives, ReferenceToken, SelectionType,
    DATASET_REGION_REF_SIZE, OBJECT_REF_SIZE, STD_REF_SIZE,
};
use crate::util::{Error, Result};

/// Index of an object registered in a [`MemoryFile`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ObjectId(usize);

/// Selection held by a region reference.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RegionSelection {
    /// One coordinate tuple per point.
    Points(Vec<Vec<u64>>),
    /// Start and end corner per block.
    Blocks(Vec<(Vec<u64>, Vec<u64>)>),
    /// Whole extent.
    All,
}

impl RegionSelection {
    fn selection_type(&self) -> SelectionType {
        match self {
            RegionSelection::Points(_) => SelectionType::Points,
            RegionSelection::Blocks(_) => SelectionType::Hyperslabs,
            RegionSelection::All => SelectionType::All,
        }
    }
}

#[derive(Clone, Debug)]
struct MemoryObject {
    path: String,
    object_type: ObjectType,
    dims: Vec<usize>,
}

#[derive(Clone, Debug)]
enum Target {
    Object(ObjectId),
    Region(ObjectId, RegionSelection),
    Attribute { object: ObjectId, name: String, rank: usize },
    Other(ObjectId),
}

#[derive(Clone, Debug)]
struct StoredReference {
    kind: ReferenceKind,
    target: Target,
}

#[derive(Clone, Debug)]
enum OpenHandle {
    Attribute { rank: usize },
    NativeType,
    Object(ObjectId),
    Region { selection: RegionSelection, rank: usize },
    Space { rank: usize },
}

#[derive(Default)]
struct HandleTable {
    next: i64,
    open: HashMap<HandleId, (HandleKind, OpenHandle)>,
    acquired: usize,
}

impl HandleTable {
    fn open(&mut self, kind: HandleKind, handle: OpenHandle) -> HandleId {
        let id = HandleId(self.next);
        self.next += 1;
        self.acquired += 1;
        self.open.insert(id, (kind, handle));
        id
    }

    fn get(&self, id: HandleId) -> Result<&OpenHandle> {
        self.open
            .get(&id)
            .map(|(_, h)| h)
            .ok_or_else(|| Error::Resolution(format!("handle {} is not open", id)))
    }
}

/// A container held entirely in memory.
///
/// Objects are registered by path; references to them are minted as tokens
/// and recorded so the [`ReferencePrimitives`] can answer for them. Every
/// handle handed out is tracked, and any primitive can be made to fail by
/// name with [`fail`](Self::fail).
pub struct MemoryFile {
    path: String,
    objects: RefCell<Vec<MemoryObject>>,
    references: RefCell<HashMap<ReferenceToken, StoredReference>>,
    handles: RefCell<HandleTable>,
    faults: RefCell<HashSet<String>>,
    calls: Cell<usize>,
    next_token: Cell<u64>,
}

impl MemoryFile {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            objects: RefCell::new(Vec::new()),
            references: RefCell::new(HashMap::new()),
            handles: RefCell::new(HandleTable::default()),
            faults: RefCell::new(HashSet::new()),
            calls: Cell::new(0),
            next_token: Cell::new(1),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    // === Objects ===

    pub fn add_object(&self, path: impl Into<String>, object_type: ObjectType, dims: &[usize]) -> ObjectId {
        let mut objects = self.objects.borrow_mut();
        objects.push(MemoryObject {
            path: path.into(),
            object_type,
            dims: dims.to_vec(),
        });
        ObjectId(objects.len() - 1)
    }

    pub fn add_group(&self, path: impl Into<String>) -> ObjectId {
        self.add_object(path, ObjectType::Group, &[])
    }

    pub fn add_dataset(&self, path: impl Into<String>, dims: &[usize]) -> ObjectId {
        self.add_object(path, ObjectType::Dataset, dims)
    }

    pub fn find(&self, path: &str) -> Option<ObjectId> {
        self.objects
            .borrow()
            .iter()
            .position(|o| o.path == path)
            .map(ObjectId)
    }

    fn object(&self, id: ObjectId) -> Result<MemoryObject> {
        self.objects
            .borrow()
            .get(id.0)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("object {:?}", id)))
    }

    // === Reference minting ===

    fn mint(&self, size: usize, kind: ReferenceKind, target: Target) -> ReferenceToken {
        let seq = self.next_token.get();
        self.next_token.set(seq + 1);

        let mut bytes = vec![0u8; size];
        let n = size.min(8);
        bytes[..n].copy_from_slice(&seq.to_le_bytes()[..n]);
        if size > 8 {
            bytes[8] = kind_code(kind);
        }
        let token = ReferenceToken::from_slice(&bytes);
        self.references
            .borrow_mut()
            .insert(token.clone(), StoredReference { kind, target });
        token
    }

    /// Standard object reference.
    pub fn object_reference(&self, object: ObjectId) -> ReferenceToken {
        self.mint(STD_REF_SIZE, ReferenceKind::Object2, Target::Object(object))
    }

    /// Standard dataset-region reference.
    pub fn region_reference(&self, object: ObjectId, selection: RegionSelection) -> ReferenceToken {
        self.mint(STD_REF_SIZE, ReferenceKind::DatasetRegion2, Target::Region(object, selection))
    }

    /// Standard attribute reference to attribute `name` of rank `rank` on `object`.
    pub fn attribute_reference(&self, object: ObjectId, name: impl Into<String>, rank: usize) -> ReferenceToken {
        self.mint(
            STD_REF_SIZE,
            ReferenceKind::Attribute,
            Target::Attribute { object, name: name.into(), rank },
        )
    }

    /// Standard token of a kind no resolver understands.
    pub fn other_reference(&self, object: ObjectId) -> ReferenceToken {
        self.mint(STD_REF_SIZE, ReferenceKind::Other, Target::Other(object))
    }

    /// Legacy 8-byte object reference.
    pub fn legacy_object_reference(&self, object: ObjectId) -> ReferenceToken {
        self.mint(OBJECT_REF_SIZE, ReferenceKind::Object1, Target::Object(object))
    }

    /// Legacy 12-byte dataset-region reference.
    pub fn legacy_region_reference(&self, object: ObjectId, selection: RegionSelection) -> ReferenceToken {
        self.mint(
            DATASET_REGION_REF_SIZE,
            ReferenceKind::DatasetRegion1,
            Target::Region(object, selection),
        )
    }

    fn lookup(&self, token: &ReferenceToken) -> Result<StoredReference> {
        self.references
            .borrow()
            .get(token)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("reference {:?}", token)))
    }

    fn target_object(&self, token: &ReferenceToken) -> Result<MemoryObject> {
        let id = match self.lookup(token)?.target {
            Target::Object(id) | Target::Region(id, _) | Target::Other(id) => id,
            Target::Attribute { object, .. } => object,
        };
        self.object(id)
    }

    // === Accounting and faults ===

    /// Make the primitive called `name` fail until [`heal`](Self::heal).
    pub fn fail(&self, name: &str) {
        self.faults.borrow_mut().insert(name.to_string());
    }

    pub fn heal(&self, name: &str) {
        self.faults.borrow_mut().remove(name);
    }

    /// Count a primitive call and apply any injected fault.
    pub(crate) fn enter(&self, name: &str) -> Result<()> {
        self.calls.set(self.calls.get() + 1);
        if self.faults.borrow().contains(name) {
            tracing::debug!("injected failure in {}", name);
            return Err(Error::Resolution(format!("{} failed", name)));
        }
        Ok(())
    }

    /// Primitive calls made so far.
    pub fn primitive_calls(&self) -> usize {
        self.calls.get()
    }

    /// Handles currently open.
    pub fn open_handles(&self) -> usize {
        self.handles.borrow().open.len()
    }

    /// Handles opened over the file's lifetime.
    pub fn acquired_handles(&self) -> usize {
        self.handles.borrow().acquired
    }

    pub(crate) fn open_handle(&self, kind: HandleKind, handle: OpenHandleSpec) -> HandleId {
        let handle = match handle {
            OpenHandleSpec::Attribute { rank } => OpenHandle::Attribute { rank },
            OpenHandleSpec::NativeType => OpenHandle::NativeType,
        };
        self.handles.borrow_mut().open(kind, handle)
    }

    /// Check that `id` is an open handle of `kind`.
    pub(crate) fn check_handle(&self, id: HandleId, kind: HandleKind) -> Result<()> {
        match self.handles.borrow().open.get(&id) {
            Some((k, _)) if *k == kind => Ok(()),
            Some((k, _)) => Err(Error::other(format!("handle {} is a {} handle, not {}", id, k, kind))),
            None => Err(Error::other(format!("handle {} is not open", id))),
        }
    }
}

/// Handles the attribute side may open.
pub(crate) enum OpenHandleSpec {
    Attribute { rank: usize },
    NativeType,
}

fn kind_code(kind: ReferenceKind) -> u8 {
    match kind {
        ReferenceKind::BadType => 0xff,
        ReferenceKind::Object1 => 0,
        ReferenceKind::DatasetRegion1 => 1,
        ReferenceKind::Object2 => 2,
        ReferenceKind::DatasetRegion2 => 3,
        ReferenceKind::Attribute => 4,
        ReferenceKind::Other => 5,
    }
}

impl HandleRelease for MemoryFile {
    fn release(&self, kind: HandleKind, id: HandleId) -> Result<()> {
        let mut table = self.handles.borrow_mut();
        match table.open.get(&id) {
            Some((k, _)) if *k == kind => {
                table.open.remove(&id);
                Ok(())
            }
            Some((k, _)) => Err(Error::other(format!("handle {} is a {} handle, not {}", id, k, kind))),
            None => Err(Error::other(format!("handle {} is not open", id))),
        }
    }
}

impl ReferencePrimitives for MemoryFile {
    fn reference_kind(&self, token: &ReferenceToken) -> Result<ReferenceKind> {
        self.enter("reference_kind")?;
        Ok(self.lookup(token)?.kind)
    }

    fn file_name(&self, token: &ReferenceToken) -> Result<String> {
        self.enter("file_name")?;
        self.lookup(token)?;
        Ok(self.path.clone())
    }

    fn object_name(&self, token: &ReferenceToken) -> Result<String> {
        self.enter("object_name")?;
        Ok(self.target_object(token)?.path)
    }

    fn attribute_name(&self, token: &ReferenceToken) -> Result<String> {
        self.enter("attribute_name")?;
        match self.lookup(token)?.target {
            Target::Attribute { name, .. } => Ok(name),
            _ => Err(Error::Resolution("not an attribute reference".into())),
        }
    }

    fn object_type(&self, token: &ReferenceToken) -> Result<ObjectType> {
        self.enter("object_type")?;
        Ok(self.target_object(token)?.object_type)
    }

    fn open_object(&self, token: &ReferenceToken) -> Result<HandleId> {
        self.enter("open_object")?;
        let id = match self.lookup(token)?.target {
            Target::Object(id) | Target::Region(id, _) | Target::Other(id) => id,
            Target::Attribute { object, .. } => object,
        };
        Ok(self.handles.borrow_mut().open(HandleKind::Object, OpenHandle::Object(id)))
    }

    fn open_region(&self, token: &ReferenceToken) -> Result<HandleId> {
        self.enter("open_region")?;
        match self.lookup(token)?.target {
            Target::Region(id, selection) => {
                let rank = self.object(id)?.dims.len();
                Ok(self
                    .handles
                    .borrow_mut()
                    .open(HandleKind::Region, OpenHandle::Region { selection, rank }))
            }
            _ => Err(Error::Resolution("not a region reference".into())),
        }
    }

    fn open_attribute(&self, token: &ReferenceToken) -> Result<HandleId> {
        self.enter("open_attribute")?;
        match self.lookup(token)?.target {
            Target::Attribute { rank, .. } => Ok(self
                .handles
                .borrow_mut()
                .open(HandleKind::Attribute, OpenHandle::Attribute { rank })),
            _ => Err(Error::Resolution("not an attribute reference".into())),
        }
    }

    fn attribute_space(&self, attr: HandleId) -> Result<HandleId> {
        self.enter("attribute_space")?;
        let rank = match self.handles.borrow().get(attr)? {
            OpenHandle::Attribute { rank } => *rank,
            _ => return Err(Error::Resolution(format!("handle {} is not an attribute", attr))),
        };
        Ok(self
            .handles
            .borrow_mut()
            .open(HandleKind::Dataspace, OpenHandle::Space { rank }))
    }

    fn space_rank(&self, space: HandleId) -> Result<usize> {
        self.enter("space_rank")?;
        match self.handles.borrow().get(space)? {
            OpenHandle::Region { rank, .. } | OpenHandle::Space { rank } => Ok(*rank),
            _ => Err(Error::Resolution(format!("handle {} is not a dataspace", space))),
        }
    }

    fn selection_type(&self, space: HandleId) -> Result<SelectionType> {
        self.enter("selection_type")?;
        match self.handles.borrow().get(space)? {
            OpenHandle::Region { selection, .. } => Ok(selection.selection_type()),
            OpenHandle::Space { .. } => Ok(SelectionType::All),
            _ => Err(Error::Resolution(format!("handle {} is not a dataspace", space))),
        }
    }

    fn selection_points(&self, space: HandleId) -> Result<Vec<u64>> {
        self.enter("selection_points")?;
        match self.handles.borrow().get(space)? {
            OpenHandle::Region { selection: RegionSelection::Points(points), .. } => {
                Ok(points.iter().flatten().copied().collect())
            }
            _ => Err(Error::Resolution("selection is not a point list".into())),
        }
    }

    fn selection_blocks(&self, space: HandleId) -> Result<Vec<u64>> {
        self.enter("selection_blocks")?;
        match self.handles.borrow().get(space)? {
            OpenHandle::Region { selection: RegionSelection::Blocks(blocks), .. } => Ok(blocks
                .iter()
                .flat_map(|(start, end)| start.iter().chain(end.iter()).copied())
                .collect()),
            _ => Err(Error::Resolution("selection is not a block list".into())),
        }
    }
}
