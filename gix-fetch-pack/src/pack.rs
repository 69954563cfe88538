//! The boundary to the external pack-stream decoder.

use gix_fetch_core::demux::SubStream;
use gix_fetch_core::FrameSource;

use crate::{error::Result, objects::cache::ResolutionCache, types::HydratedObject};

/// The contract the fetch client requires from a pack decoder.
///
/// The decoder owns the binary pack/delta format: it pulls raw frames off the
/// pack sub-stream, decompresses entries, and resolves inter-object
/// dependencies by looking previously-seen objects up through the
/// [`ResolutionCache`]. The client owns the consumption loop and records each
/// produced object in the cache itself.
pub trait PackDecoder<S: FrameSource> {
    /// Produce the next fully hydrated object, or `Ok(None)` once the pack
    /// stream has ended.
    fn next_object(
        &mut self,
        frames: &mut SubStream<S>,
        cache: &mut ResolutionCache,
    ) -> Result<Option<HydratedObject>>;
}

impl<S: FrameSource, D: PackDecoder<S> + ?Sized> PackDecoder<S> for &mut D {
    fn next_object(
        &mut self,
        frames: &mut SubStream<S>,
        cache: &mut ResolutionCache,
    ) -> Result<Option<HydratedObject>> {
        (**self).next_object(frames, cache)
    }
}

/// A decoder for pack streams that are expected to carry zero objects, e.g.
/// when probing a server's advertisement.
///
/// It reads the pack sub-stream to completion, discarding the pack header
/// and trailer, and produces nothing.
pub struct NoObjects;

impl<S: FrameSource> PackDecoder<S> for NoObjects {
    fn next_object(
        &mut self,
        frames: &mut SubStream<S>,
        _cache: &mut ResolutionCache,
    ) -> Result<Option<HydratedObject>> {
        while frames.next()?.is_some() {}
        Ok(None)
    }
}
