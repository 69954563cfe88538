//! Client side of the git smart protocol for fetching from an anonymous git daemon.
//!
//! This crate drives one `clone`-style fetch against a `git://` server: it
//! sends the `git-upload-pack` service request, consumes the
//! ref-advertisement, negotiates capabilities, emits the `want`/`done`
//! request, and reconstructs typed git objects (commit, tree, blob) from the
//! resulting pack stream, resolving forward references between objects as
//! they arrive.
//!
//! The byte-level collaborators stay outside: the pkt-line deframer feeds
//! this crate through [`gix_fetch_core::FrameSource`], the pack-stream
//! decompressor implements [`PackDecoder`], and the transport drains the
//! outgoing request pipe. See `gix-upload-pack` for the server half of the
//! same exchange.
//!
//! # Example
//!
//! ```no_run
//! use gix_fetch_pack::{client, url::DaemonUrl};
//! use gix_fetch_core::pipe;
//!
//! let url: DaemonUrl = "git://localhost/repo.git".parse()?;
//! let (requests, to_transport) = pipe::new();
//! # let frames = std::collections::VecDeque::new();
//! # let mut decoder = gix_fetch_pack::pack::NoObjects;
//! # let _ = to_transport;
//! let mut client = client::Client::new(client::Options::default());
//! let outcome = client.fetch(&url, frames, &requests, &mut decoder, &mut ())?;
//! # Ok::<(), gix_fetch_pack::Error>(())
//! ```
#![deny(rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod client;
pub mod error;
pub mod objects;
pub mod pack;
pub mod url;
mod types;

pub use client::{Client, Delegate, Options, Outcome};
pub use error::{Error, Result};
pub use pack::PackDecoder;
pub use types::*;

/// The version of this crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
