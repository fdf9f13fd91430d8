//! Codec options and compound member selection.

use std::collections::BTreeSet;

/// Which compound leaf members take part in decode/encode.
///
/// Keys are dotted paths (`"pos.x"`). Members whose type is itself a
/// compound are always walked, only their leaves are filtered.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum MemberSelection {
    #[default]
    All,
    Only(BTreeSet<String>),
}

impl MemberSelection {
    /// Select only the given member paths.
    pub fn only<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        MemberSelection::Only(names.into_iter().map(Into::into).collect())
    }

    pub fn is_selected(&self, path: &str) -> bool {
        match self {
            MemberSelection::All => true,
            MemberSelection::Only(names) => names.contains(path),
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, MemberSelection::All)
    }
}

/// Knobs for one decode/encode call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CodecOptions {
    /// Decode fixed-width text to `Value::String` instead of `Value::Bytes`.
    pub convert_byte_to_string: bool,
    pub members: MemberSelection,
}

impl Default for CodecOptions {
    fn default() -> Self {
        Self {
            convert_byte_to_string: true,
            members: MemberSelection::All,
        }
    }
}

impl CodecOptions {
    pub fn with_members(mut self, members: MemberSelection) -> Self {
        self.members = members;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection() {
        let sel = MemberSelection::only(["a", "pos.x"]);
        assert!(sel.is_selected("pos.x"));
        assert!(!sel.is_selected("pos.y"));
        assert!(MemberSelection::default().is_selected("anything"));
        assert!(CodecOptions::default().convert_byte_to_string);
    }
}
