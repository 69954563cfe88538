//! Error types for fetch-pack operations.

use bstr::BString;
use gix_hash::ObjectId;

/// Result type alias for fetch-pack operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The error type for one fetch operation.
///
/// Every variant is fatal to the in-progress fetch; nothing is retried
/// internally. Retry, if desired, is a caller-level policy of re-invoking
/// the whole operation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The input does not look like an anonymous git daemon URL.
    #[error("invalid git daemon url: {url:?}")]
    MalformedUrl {
        /// The rejected input.
        url: String,
    },

    /// The underlying connection failed while reading or writing.
    #[error("transport error: {0}")]
    Io(#[from] std::io::Error),

    /// The outgoing request pipe was closed underneath the session.
    #[error("request stream closed: {0}")]
    RequestStream(#[from] gix_fetch_core::pipe::Closed),

    /// A negotiation line did not match the expected grammar.
    #[error("protocol decode error: {0}")]
    Line(#[from] gix_fetch_core::line::Error),

    /// An advertised or referenced object id was not valid hexadecimal.
    #[error("protocol decode error: {0}")]
    Id(#[from] gix_hash::decode::Error),

    /// A frame, tree entry or commit header did not match the expected
    /// grammar.
    #[error("protocol decode error: {message}")]
    Decode {
        /// What was being decoded and how it failed.
        message: String,
    },

    /// The server sent a payload on the error sideband channel.
    #[error("server reported: {message}")]
    ServerReported {
        /// The error text as sent by the server.
        message: BString,
    },

    /// The pack stream ended while objects were still waiting on hashes that
    /// never arrived.
    #[error("pack stream ended with {} unresolved reference(s), first: {first}", .remaining + 1)]
    DanglingReference {
        /// One of the hashes that never arrived.
        first: ObjectId,
        /// How many more besides `first` remained unresolved.
        remaining: usize,
    },

    /// The ref advertisement did not contain `HEAD`, so no `want` line can
    /// be formed.
    #[error("the server did not advertise HEAD")]
    MissingHead,

    /// The pack stream delivered the same object id twice.
    #[error("object {id} was delivered more than once by the pack stream")]
    DuplicateObject {
        /// The offending object id.
        id: ObjectId,
    },
}

impl Error {
    /// Create a decode error with a message.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }
}
