//! Best-effort reference resolution.
//!
//! A token moves through four steps: the zero check, name lookups, region
//! resolution by kind, and finally the cache. Each lookup may fail on its
//! own and only the field it feeds is left at `NULL`; nothing is raised to
//! the caller.

use super::region::{format_blocks, format_points};
use super::{
    ObjectType, ReferenceKind, ReferencePrimitives, ReferenceRecord, ReferenceToken, RegionType,
    SelectionType, TokenCache,
};
use crate::datatype::ReferenceFlavor;
use crate::native::{acquire, HandleKind};
use crate::util::{Result, Settings};

/// Log a failed lookup and drop the error.
fn degrade<T>(result: Result<T>, what: &str) -> Option<T> {
    match result {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::debug!("reference {} unavailable: {}", what, e);
            None
        }
    }
}

/// Last `/`-separated segment of a path.
fn short_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Resolves tokens of one reference flavor into cached [`ReferenceRecord`]s.
///
/// The cache belongs to the resolver and only grows until its capacity is
/// reached; there is no per-token invalidation.
pub struct ReferenceResolver<'a, P: ReferencePrimitives + ?Sized> {
    primitives: &'a P,
    flavor: ReferenceFlavor,
    cache: TokenCache,
}

impl<'a, P: ReferencePrimitives + ?Sized> ReferenceResolver<'a, P> {
    pub fn new(primitives: &'a P, flavor: ReferenceFlavor) -> Self {
        Self::with_cache(primitives, flavor, TokenCache::default())
    }

    /// Resolver keeping at most `capacity` records (0 = unbounded).
    pub fn with_capacity(primitives: &'a P, flavor: ReferenceFlavor, capacity: usize) -> Self {
        Self::with_cache(primitives, flavor, TokenCache::new(capacity))
    }

    pub fn from_settings(primitives: &'a P, flavor: ReferenceFlavor, settings: &Settings) -> Self {
        Self::with_capacity(primitives, flavor, settings.reference_cache_capacity)
    }

    /// Resolver reusing an existing cache.
    pub fn with_cache(primitives: &'a P, flavor: ReferenceFlavor, cache: TokenCache) -> Self {
        Self { primitives, flavor, cache }
    }

    /// Give the cache back, e.g. to keep it across calls.
    pub fn into_cache(self) -> TokenCache {
        self.cache
    }

    pub fn flavor(&self) -> ReferenceFlavor {
        self.flavor
    }

    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    /// Record for `token`, resolved on first use and cached afterwards.
    pub fn record(&mut self, token: &ReferenceToken) -> ReferenceRecord {
        if let Some(record) = self.cache.get(token) {
            return record.clone();
        }
        let record = self.resolve(token);
        self.cache.insert(record.clone());
        record
    }

    /// Region description text for `token` (`NULL` when there is none).
    pub fn region_description(&mut self, token: &ReferenceToken) -> String {
        self.record(token).region_desc
    }

    /// Resolve every token of a reference buffer up front.
    #[tracing::instrument(skip_all, fields(count = tokens.len()))]
    pub fn init(&mut self, tokens: &[ReferenceToken]) {
        for token in tokens {
            if !self.cache.contains(token) {
                let record = self.resolve(token);
                self.cache.insert(record);
            }
        }
    }

    /// One rendering per token joined with `", "`, each cut to `max_items`
    /// characters when `max_items > 0`.
    pub fn display(&mut self, tokens: &[ReferenceToken], max_items: usize) -> String {
        let mut out = String::new();
        for (i, token) in tokens.iter().enumerate() {
            let mut text = self.record(token).reference_region();
            if max_items > 0 && text.chars().count() > max_items {
                text = text.chars().take(max_items).collect();
            }
            if i > 0 {
                out.push_str(", ");
            }
            out.push_str(&text);
        }
        out
    }

    fn resolve(&self, token: &ReferenceToken) -> ReferenceRecord {
        let mut record = ReferenceRecord::null(token.clone());
        if token.is_null() {
            tracing::trace!("zero reference token");
            return record;
        }

        match self.flavor {
            ReferenceFlavor::Standard => {
                self.resolve_names(&mut record);
                self.resolve_standard_region(&mut record);
            }
            ReferenceFlavor::DatasetRegion => {
                self.resolve_location(&mut record);
                record.kind = ReferenceKind::DatasetRegion1;
                record.object_type = ObjectType::Dataset;
                self.resolve_dataset_region(&mut record);
            }
            ReferenceFlavor::Object => {
                self.resolve_location(&mut record);
                record.kind = ReferenceKind::Object1;
                if let Some(t) = degrade(self.primitives.object_type(token), "object type") {
                    record.object_type = t;
                }
                record.region_type = RegionType::ObjectRef;
            }
        }
        record
    }

    /// File path, short file name and object path.
    fn resolve_location(&self, record: &mut ReferenceRecord) {
        let p = self.primitives;
        let token = &record.token;

        if let Some(path) = degrade(p.file_name(token), "file name") {
            record.file_name = short_name(&path).to_string();
            record.file_path = path;
        }
        if let Some(name) = degrade(p.object_name(token), "object name") {
            record.object_name = name;
        }
    }

    fn resolve_names(&self, record: &mut ReferenceRecord) {
        self.resolve_location(record);
        let p = self.primitives;
        let token = &record.token;

        if let Some(kind) = degrade(p.reference_kind(token), "kind") {
            record.kind = kind;
        }
        if record.kind == ReferenceKind::Attribute {
            if let Some(name) = degrade(p.attribute_name(&record.token), "attribute name") {
                record.attribute_name = name;
            }
        }
    }

    fn resolve_standard_region(&self, record: &mut ReferenceRecord) {
        if record.kind == ReferenceKind::BadType {
            return;
        }
        if let Some(t) = degrade(self.primitives.object_type(&record.token), "object type") {
            record.object_type = t;
        }

        match record.kind {
            ReferenceKind::BadType => {}
            ReferenceKind::Object1 | ReferenceKind::Object2 => {
                record.region_type = RegionType::ObjectRef;
            }
            ReferenceKind::DatasetRegion1 | ReferenceKind::DatasetRegion2 => {
                self.resolve_dataset_region(record);
            }
            ReferenceKind::Attribute => {
                record.region_type = RegionType::Attribute;
                self.resolve_attribute_region(record);
            }
            ReferenceKind::Other => {
                record.region_type = RegionType::Unknown;
            }
        }
    }

    fn resolve_dataset_region(&self, record: &mut ReferenceRecord) {
        let p = self.primitives;
        let token = record.token.clone();

        let Some(_object) = degrade(acquire(p, HandleKind::Object, |p| p.open_object(&token)), "object")
        else {
            return;
        };
        let Some(space) = degrade(acquire(p, HandleKind::Region, |p| p.open_region(&token)), "region")
        else {
            return;
        };

        let Some(selection) = degrade(p.selection_type(space.id()), "selection type") else {
            return;
        };
        let rank = degrade(p.space_rank(space.id()), "region rank");
        record.region_rank = rank;

        match selection {
            SelectionType::Points => {
                record.region_type = RegionType::Point;
                if let (Some(rank), Some(coords)) =
                    (rank, degrade(p.selection_points(space.id()), "point list"))
                {
                    record.region_desc = format_points(&coords, rank);
                }
            }
            SelectionType::Hyperslabs => {
                record.region_type = RegionType::Block;
                if let (Some(rank), Some(coords)) =
                    (rank, degrade(p.selection_blocks(space.id()), "block list"))
                {
                    record.region_desc = format_blocks(&coords, rank);
                }
            }
            SelectionType::None | SelectionType::All => {
                record.region_type = RegionType::RegionUnknown;
            }
        }
    }

    fn resolve_attribute_region(&self, record: &mut ReferenceRecord) {
        let p = self.primitives;
        let token = record.token.clone();

        let Some(attr) = degrade(acquire(p, HandleKind::Attribute, |p| p.open_attribute(&token)), "attribute")
        else {
            return;
        };
        let Some(space) = degrade(
            acquire(p, HandleKind::Dataspace, |p| p.attribute_space(attr.id())),
            "attribute space",
        ) else {
            return;
        };
        record.region_rank = degrade(p.space_rank(space.id()), "attribute rank");
    }
}
