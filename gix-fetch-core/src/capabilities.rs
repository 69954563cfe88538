//! The capability set advertised by the server and echoed back by the client.

use bstr::{BStr, BString, ByteSlice};
use std::collections::BTreeMap;

/// A set of protocol capabilities, each optionally carrying a value.
///
/// On the wire a capability is either a bare name (`side-band-64k`) or a
/// `name=value` pair (`agent=git/2.46.0`); a bare name is equivalent to the
/// boolean `true`.
#[derive(Clone, Default, Debug, PartialEq, Eq)]
pub struct CapabilitySet {
    entries: BTreeMap<BString, Option<BString>>,
}

impl CapabilitySet {
    /// Parse the capability segment of the first ref-advertisement line, a
    /// space-separated list of `name[=value]` tokens.
    pub fn parse(segment: &BStr) -> Self {
        let mut set = CapabilitySet::default();
        for token in segment.split_str(b" ").filter(|t| !t.is_empty()) {
            match token.find_byte(b'=') {
                Some(pos) => set.insert(&token[..pos], Some(&token[pos + 1..])),
                None => set.insert(token, None::<&BStr>),
            }
        }
        set
    }

    /// Return `true` if the named capability was advertised, with or without
    /// a value.
    pub fn contains(&self, name: impl AsRef<[u8]>) -> bool {
        self.entries.contains_key(name.as_ref().as_bstr())
    }

    /// The value of `name`, if it was advertised as a `name=value` pair.
    pub fn value_of(&self, name: impl AsRef<[u8]>) -> Option<&BStr> {
        self.entries
            .get(name.as_ref().as_bstr())
            .and_then(|value| value.as_ref().map(|v| v.as_bstr()))
    }

    /// Add a capability.
    pub fn insert(&mut self, name: impl Into<BString>, value: Option<impl Into<BString>>) {
        self.entries.insert(name.into(), value.map(Into::into));
    }

    /// Return `true` if no capability is present.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The number of capabilities in the set.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Iterate over `(name, value)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&BStr, Option<&BStr>)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_bstr(), value.as_ref().map(|v| v.as_bstr())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_mixes_flags_and_values() {
        let caps = CapabilitySet::parse(b"side-band-64k agent=git/2.46.0 ofs-delta".as_bstr());
        assert_eq!(caps.len(), 3);
        assert!(caps.contains("side-band-64k"));
        assert!(caps.contains("ofs-delta"));
        assert_eq!(caps.value_of("agent").unwrap(), "git/2.46.0");
        assert_eq!(caps.value_of("side-band-64k"), None, "bare names have no value");
        assert!(!caps.contains("side-band"));
    }

    #[test]
    fn parse_of_empty_segment_is_empty() {
        let caps = CapabilitySet::parse(b"".as_bstr());
        assert!(caps.is_empty());
    }
}
