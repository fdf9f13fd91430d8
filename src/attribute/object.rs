//! Attribute value object.

use super::io::{self, apply_selection};
use super::{AttributeData, Selection};
use crate::codec::{CodecOptions, MemberSelection};
use crate::datatype::Datatype;
use crate::native::AttributeSource;
use crate::reference::{ReferencePrimitives, ReferenceRecord, ReferenceResolver, ReferenceToken, TokenCache};
use crate::util::{Dimensions, Error, Result, Settings};

/// A named, typed attribute with lazily materialized data.
///
/// The full buffer is read on first access and kept until the selection or
/// member selection changes, the attribute is written, or [`clear`](Self::clear)
/// is called. Resolved references are cached per attribute.
pub struct Attribute<S: AttributeSource> {
    source: S,
    settings: Settings,
    selection: Selection,
    members: MemberSelection,
    data: Option<AttributeData>,
    ref_cache: TokenCache,
}

impl<S: AttributeSource> Attribute<S> {
    pub fn new(source: S) -> Self {
        Self::with_settings(source, Settings::default())
    }

    pub fn with_settings(source: S, settings: Settings) -> Self {
        let selection = Selection::for_dims(&source.dimensions());
        let ref_cache = TokenCache::new(settings.reference_cache_capacity);
        Self {
            source,
            settings,
            selection,
            members: MemberSelection::All,
            data: None,
            ref_cache,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn name(&self) -> &str {
        self.source.name()
    }

    pub fn datatype(&self) -> &Datatype {
        self.source.datatype()
    }

    /// Extents with rank 0 normalized to one element of rank 1.
    pub fn dimensions(&self) -> Dimensions {
        self.source.dimensions().normalized()
    }

    pub fn rank(&self) -> usize {
        self.dimensions().rank()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Replace the selection and drop the materialized data.
    pub fn set_selection(&mut self, selection: Selection) {
        self.selection = selection;
        self.clear();
    }

    /// Restrict compound decode/encode to `members` and drop the materialized data.
    pub fn select_members(&mut self, members: MemberSelection) {
        self.members = members;
        self.clear();
    }

    pub fn codec_options(&self) -> CodecOptions {
        self.settings.codec_options().with_members(self.members.clone())
    }

    pub fn is_loaded(&self) -> bool {
        self.data.is_some()
    }

    /// Drop the materialized data; the next read goes back to the source.
    pub fn clear(&mut self) {
        self.data = None;
    }

    /// All elements, read once and cached.
    pub fn read(&mut self) -> Result<&AttributeData> {
        if self.data.is_none() {
            let opts = self.codec_options();
            self.data = Some(io::read(&self.source, &opts)?);
        }
        self.data
            .as_ref()
            .ok_or_else(|| Error::ReadFailed(format!("{}: no data", self.source.name())))
    }

    /// The current selection's view of the data.
    pub fn read_selection(&mut self) -> Result<AttributeData> {
        let selection = self.selection.clone();
        let dtype = self.source.datatype().clone();
        let full = self.read()?;
        Ok(apply_selection(&dtype, full, &selection))
    }

    /// Write all elements; the cached data is dropped on success.
    pub fn write(&mut self, data: &AttributeData) -> Result<()> {
        let opts = self.codec_options();
        io::write(&self.source, data, &opts)?;
        self.clear();
        Ok(())
    }
}

impl<S: AttributeSource + ReferencePrimitives> Attribute<S> {
    fn with_resolver<T>(&mut self, f: impl FnOnce(&mut ReferenceResolver<'_, S>) -> T) -> Result<T> {
        let flavor = self.source.datatype().reference_flavor().ok_or_else(|| {
            Error::mismatch("reference", self.source.datatype().class().name())
        })?;
        let cache = std::mem::take(&mut self.ref_cache);
        let mut resolver = ReferenceResolver::with_cache(&self.source, flavor, cache);
        let out = f(&mut resolver);
        self.ref_cache = resolver.into_cache();
        Ok(out)
    }

    /// Resolved description of one token of this reference attribute.
    pub fn reference_record(&mut self, token: &ReferenceToken) -> Result<ReferenceRecord> {
        self.with_resolver(|r| r.record(token))
    }

    /// Region text for one token (`NULL` when it has none).
    pub fn region_description(&mut self, token: &ReferenceToken) -> Result<String> {
        self.with_resolver(|r| r.region_description(token))
    }

    /// Tokens held by this attribute.
    pub fn reference_tokens(&mut self) -> Result<Vec<ReferenceToken>> {
        let data = self.read()?;
        data.reference_tokens()
            .ok_or_else(|| Error::mismatch("reference", data.kind_name()))
    }

    /// Records for every token of this attribute, resolved in one pass.
    pub fn reference_records(&mut self) -> Result<Vec<ReferenceRecord>> {
        let tokens = self.reference_tokens()?;
        self.with_resolver(|r| {
            r.init(&tokens);
            tokens.iter().map(|t| r.record(t)).collect()
        })
    }

    /// All tokens rendered and joined, truncated per `Settings::max_display_items`.
    pub fn display_references(&mut self) -> Result<String> {
        let tokens = self.reference_tokens()?;
        let max_items = self.settings.max_display_items;
        self.with_resolver(|r| r.display(&tokens, max_items))
    }
}
