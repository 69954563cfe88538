//! Common types used throughout the fetch-pack implementation.

use bstr::BString;
use gix_hash::ObjectId;
use std::collections::BTreeMap;

// Re-export the protocol primitives so dependents rarely need gix-fetch-core
// directly.
pub use gix_fetch_core::{CapabilitySet, Channel, Frame, FrameSource};

/// The ref table assembled from the advertisement: ref name to object id,
/// last write per name winning.
pub type RefMap = BTreeMap<BString, ObjectId>;

/// The phases of one fetch, in the order they are entered.
///
/// Transitions are strictly forward, except that [`Failed`](Self::Failed) is
/// reachable from every state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum NegotiationState {
    /// The connection exists, nothing has been sent yet.
    Connecting,
    /// The service request went out; ref-advertisement lines are expected.
    AwaitingRefs,
    /// The advertisement ended with a flush-pkt.
    RefsComplete,
    /// The `want`/`done` request went out.
    RequestSent,
    /// The pack stream is being consumed.
    AwaitingPack,
    /// The pack stream ended with every reference resolved.
    Done,
    /// A fatal error aborted the fetch.
    Failed,
}

/// One item on the outgoing request stream, framed by the transport writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestFrame {
    /// A request line, sent as a data pkt-line.
    Data(BString),
    /// A flush-pkt, ending the current request section.
    Flush,
}

/// The kind of a packed git object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    /// A commit object.
    Commit,
    /// A tree object.
    Tree,
    /// A blob object.
    Blob,
    /// An annotated tag object.
    Tag,
}

impl ObjectKind {
    /// The kind as it is spelled inside git objects.
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectKind::Commit => "commit",
            ObjectKind::Tree => "tree",
            ObjectKind::Blob => "blob",
            ObjectKind::Tag => "tag",
        }
    }
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A raw object record as produced by the pack decoder: fully hydrated, but
/// not yet parsed into its typed form.
///
/// Immutable once produced; the resolution cache hands out shared references
/// to it for as long as the fetch lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HydratedObject {
    /// The object id.
    pub id: ObjectId,
    /// The kind of object `data` encodes.
    pub kind: ObjectKind,
    /// The object payload, delta-resolved and decompressed.
    pub data: BString,
}
