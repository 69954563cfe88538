//! Materialization of hydrated object records into typed git objects.
//!
//! The pack decoder delivers `(id, kind, data)` records; this module parses
//! each payload according to its kind's layout. Commits and trees are
//! line/record structured, blobs are opaque. All scans are bounds-checked:
//! a payload that ends mid-entry or mid-header fails with a decode error
//! instead of reading past the buffer.

use bstr::{BString, ByteSlice};
use gix_hash::ObjectId;
use smallvec::SmallVec;

use crate::{
    error::{Error, Result},
    types::{HydratedObject, ObjectKind},
};

pub mod cache;

/// A typed git object reconstructed from the pack stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GitObject {
    /// A commit.
    Commit(Commit),
    /// A tree.
    Tree(Tree),
    /// A blob.
    Blob(Blob),
}

impl GitObject {
    /// The id of the materialized object.
    pub fn id(&self) -> ObjectId {
        match self {
            GitObject::Commit(commit) => commit.id,
            GitObject::Tree(tree) => tree.id,
            GitObject::Blob(blob) => blob.id,
        }
    }
}

/// A parsed commit object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    /// The commit's own id.
    pub id: ObjectId,
    /// The id of the tree this commit points to.
    pub tree: ObjectId,
    /// Parent commit ids in declaration order; empty for root commits.
    pub parents: SmallVec<[ObjectId; 1]>,
    /// The `author` header line, verbatim.
    pub author: Option<BString>,
    /// The `committer` header line, verbatim.
    pub committer: Option<BString>,
    /// Remaining header lines as `(key, value)`, a later same-named key
    /// overwriting an earlier one.
    pub extra_headers: Vec<(BString, BString)>,
    /// Everything after the first blank line, verbatim.
    pub message: BString,
}

/// A parsed tree object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tree {
    /// The tree's own id.
    pub id: ObjectId,
    /// The tree's entries in on-wire order.
    pub entries: Vec<TreeEntry>,
}

/// One entry of a [`Tree`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    /// The entry mode, parsed from its octal ASCII form; `0o40000` is a
    /// directory, `0o100644` a regular file.
    pub mode: u32,
    /// The path component, as stored.
    pub path: BString,
    /// The id of the object the entry points to.
    pub oid: ObjectId,
}

/// An opaque blob object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    /// The blob's own id.
    pub id: ObjectId,
    /// The payload, unchanged.
    pub data: BString,
}

/// Parse `object`'s payload according to its kind.
///
/// Tag objects have no materialized form here and fail with a decode error.
pub fn materialize(object: &HydratedObject) -> Result<GitObject> {
    match object.kind {
        ObjectKind::Commit => parse_commit(object.id, &object.data).map(GitObject::Commit),
        ObjectKind::Tree => parse_tree(object.id, &object.data).map(GitObject::Tree),
        ObjectKind::Blob => Ok(GitObject::Blob(Blob {
            id: object.id,
            data: object.data.clone(),
        })),
        ObjectKind::Tag => Err(Error::decode(format!(
            "object {} is a tag, which this client does not materialize",
            object.id
        ))),
    }
}

/// Parse a tree payload: a sequence of `<octal mode> <path>\0<20 raw hash bytes>`
/// records with no further delimiter between entries.
fn parse_tree(id: ObjectId, data: &[u8]) -> Result<Tree> {
    let mut entries = Vec::new();
    let mut cursor = data;
    while !cursor.is_empty() {
        let space = cursor
            .find_byte(b' ')
            .ok_or_else(|| Error::decode(format!("tree {id}: entry mode lacks a space terminator")))?;
        let mode = parse_octal(&cursor[..space])
            .ok_or_else(|| Error::decode(format!("tree {id}: entry mode is not octal")))?;
        cursor = &cursor[space + 1..];
        let nul = cursor
            .find_byte(b'\0')
            .ok_or_else(|| Error::decode(format!("tree {id}: entry path is not NUL terminated")))?;
        let path = BString::from(&cursor[..nul]);
        cursor = &cursor[nul + 1..];
        if cursor.len() < 20 {
            return Err(Error::decode(format!(
                "tree {id}: entry {path:?} is truncated before its hash"
            )));
        }
        let oid = ObjectId::from_bytes_or_panic(&cursor[..20]);
        cursor = &cursor[20..];
        entries.push(TreeEntry { mode, path, oid });
    }
    Ok(Tree { id, entries })
}

fn parse_octal(digits: &[u8]) -> Option<u32> {
    if digits.is_empty() {
        return None;
    }
    digits.iter().try_fold(0u32, |value, digit| match digit {
        b'0'..=b'7' => value
            .checked_mul(8)
            .and_then(|v| v.checked_add(u32::from(digit - b'0'))),
        _ => None,
    })
}

/// Parse a commit payload: `<key> <value>\n` header lines up to the first
/// blank line, then the message verbatim.
fn parse_commit(id: ObjectId, data: &[u8]) -> Result<Commit> {
    let mut tree = None;
    let mut parents = SmallVec::new();
    let mut author = None;
    let mut committer = None;
    let mut extra_headers: Vec<(BString, BString)> = Vec::new();
    let mut cursor = data;
    loop {
        if cursor.is_empty() {
            return Err(Error::decode(format!(
                "commit {id}: payload ended before the blank line separating headers from the message"
            )));
        }
        if cursor[0] == b'\n' {
            let message = BString::from(&cursor[1..]);
            let tree = tree
                .ok_or_else(|| Error::decode(format!("commit {id}: missing the tree header")))?;
            return Ok(Commit {
                id,
                tree,
                parents,
                author,
                committer,
                extra_headers,
                message,
            });
        }
        let space = cursor
            .find_byte(b' ')
            .ok_or_else(|| Error::decode(format!("commit {id}: header key lacks a space terminator")))?;
        let key = &cursor[..space];
        cursor = &cursor[space + 1..];
        let newline = cursor
            .find_byte(b'\n')
            .ok_or_else(|| Error::decode(format!("commit {id}: header value lacks a newline")))?;
        let value = &cursor[..newline];
        cursor = &cursor[newline + 1..];
        match key {
            b"tree" => tree = Some(ObjectId::from_hex(value)?),
            b"parent" => parents.push(ObjectId::from_hex(value)?),
            b"author" => author = Some(BString::from(value)),
            b"committer" => committer = Some(BString::from(value)),
            _ => match extra_headers.iter_mut().find(|(k, _)| k.as_slice() == key) {
                Some((_, existing)) => *existing = BString::from(value),
                None => extra_headers.push((BString::from(key), BString::from(value))),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const H1: &str = "9ec967f164af38b7ddeb8f126cfba166ae5fab71";
    const H2: &str = "0123456789abcdef0123456789abcdef01234567";

    fn oid(hex: &str) -> ObjectId {
        ObjectId::from_hex(hex.as_bytes()).unwrap()
    }

    fn hydrated(kind: ObjectKind, data: impl Into<BString>) -> HydratedObject {
        HydratedObject {
            id: oid(H1),
            kind,
            data: data.into(),
        }
    }

    #[test]
    fn blobs_pass_through_unchanged() {
        let raw = hydrated(ObjectKind::Blob, &b"\x00binary\xff"[..]);
        match materialize(&raw).unwrap() {
            GitObject::Blob(blob) => assert_eq!(blob.data, raw.data),
            other => panic!("expected a blob, got {other:?}"),
        }
    }

    #[test]
    fn tree_entries_preserve_order_modes_and_hashes() {
        let mut data = Vec::new();
        data.extend_from_slice(b"100644 foo\0");
        data.extend_from_slice(oid(H1).as_slice());
        data.extend_from_slice(b"40000 bar\0");
        data.extend_from_slice(oid(H2).as_slice());
        let tree = parse_tree(oid(H1), &data).unwrap();
        assert_eq!(tree.entries.len(), 2);
        assert_eq!(tree.entries[0].mode, 33188, "0o100644 in decimal");
        assert_eq!(tree.entries[0].path, "foo");
        assert_eq!(tree.entries[0].oid, oid(H1));
        assert_eq!(tree.entries[1].mode, 16384, "0o40000 in decimal");
        assert_eq!(tree.entries[1].path, "bar");
        assert_eq!(tree.entries[1].oid, oid(H2));
    }

    #[test]
    fn truncated_tree_fails_instead_of_reading_past_the_end() {
        let mut data = Vec::new();
        data.extend_from_slice(b"100644 foo\0");
        data.extend_from_slice(&oid(H1).as_slice()[..10]);
        let err = parse_tree(oid(H1), &data).unwrap_err();
        assert!(matches!(err, Error::Decode { .. }), "{err}");

        let err = parse_tree(oid(H1), b"100644 foo-without-nul").unwrap_err();
        assert!(matches!(err, Error::Decode { .. }), "{err}");

        let err = parse_tree(oid(H1), b"12q644 foo\0").unwrap_err();
        assert!(matches!(err, Error::Decode { .. }), "{err}");
    }

    #[test]
    fn commit_headers_and_message_are_parsed() {
        let data = format!("tree {H1}\nparent {H2}\nauthor A <a@x> 0 +0000\n\nhello\n");
        let commit = parse_commit(oid(H2), data.as_bytes()).unwrap();
        assert_eq!(commit.tree, oid(H1));
        assert_eq!(commit.parents.as_slice(), &[oid(H2)]);
        assert_eq!(commit.author.as_deref().unwrap().as_bstr(), "A <a@x> 0 +0000");
        assert_eq!(commit.committer, None);
        assert_eq!(commit.message, "hello\n");
    }

    #[test]
    fn root_commits_have_no_parents_and_merges_have_many() {
        let root = format!("tree {H1}\n\n");
        assert!(parse_commit(oid(H1), root.as_bytes()).unwrap().parents.is_empty());

        let merge = format!("tree {H1}\nparent {H1}\nparent {H2}\n\nmerged\n");
        let commit = parse_commit(oid(H1), merge.as_bytes()).unwrap();
        assert_eq!(commit.parents.as_slice(), &[oid(H1), oid(H2)]);
    }

    #[test]
    fn unknown_headers_are_kept_with_last_value_winning() {
        let data = format!("tree {H1}\nencoding utf-8\nencoding latin1\n\nmsg");
        let commit = parse_commit(oid(H1), data.as_bytes()).unwrap();
        assert_eq!(
            commit.extra_headers,
            vec![(BString::from("encoding"), BString::from("latin1"))]
        );
        assert_eq!(commit.message, "msg");
    }

    #[test]
    fn commit_without_message_separator_is_a_decode_error() {
        let data = format!("tree {H1}\nauthor A <a@x> 0 +0000\n");
        let err = parse_commit(oid(H1), data.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::Decode { .. }), "{err}");
    }

    #[test]
    fn tags_are_not_materialized() {
        let raw = hydrated(ObjectKind::Tag, &b"object ..."[..]);
        assert!(matches!(materialize(&raw), Err(Error::Decode { .. })));
    }
}
