//! gix-fetch-core: Client-side protocol primitives for fetching from a git daemon.
//!
//! This crate provides the reusable building blocks of the `git://` fetch
//! client implemented by `gix-fetch-pack`: a backpressure-aware
//! single-producer/single-consumer [`pipe`], a [`demux`]-based splitter that
//! fans one framed input stream out into per-channel sub-streams, the
//! ref-advertisement [`line`] codec, and the [`capabilities`] set exchanged
//! during negotiation.
//!
//! Byte-level pkt-line framing is out of scope here; consumers hand this
//! crate already-framed logical items through the [`frame::FrameSource`]
//! boundary.
#![deny(missing_docs, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod capabilities;
pub mod demux;
pub mod frame;
pub mod line;
pub mod pipe;

pub use capabilities::CapabilitySet;
pub use frame::{Channel, Frame, FrameSource};
