//! The state machine driving one fetch against a git daemon.

use bstr::{BStr, ByteSlice};
use gix_fetch_core::demux::Streams;
use gix_fetch_core::pipe;

use crate::{
    error::{Error, Result},
    objects::{self, cache::ResolutionCache, GitObject},
    pack::PackDecoder,
    types::*,
    url::DaemonUrl,
};
use gix_hash::ObjectId;

pub mod negotiation;

/// Options shaping one fetch.
#[derive(Debug, Clone)]
pub struct Options {
    /// Ask the server to multiplex pack data, progress text and error text
    /// over one stream, when it offers to.
    pub sideband: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options { sideband: true }
    }
}

/// Observer of a fetch in progress. All methods default to doing nothing.
///
/// The client additionally mirrors these events to `tracing`, so a delegate
/// is only needed when the caller wants the data itself.
pub trait Delegate {
    /// The advertisement phase completed with these refs and capabilities.
    fn advertised_refs(&mut self, _refs: &RefMap, _capabilities: &CapabilitySet) {}

    /// A materialized object arrived on the pack stream.
    fn object(&mut self, _object: GitObject) {}

    /// The server sent human-readable progress text.
    fn progress(&mut self, _text: &BStr) {}
}

impl Delegate for () {}

/// What a completed fetch produced.
#[derive(Debug, Clone)]
pub struct Outcome {
    /// The advertised refs, by name.
    pub refs: RefMap,
    /// The capability set the server advertised on its first ref line.
    pub capabilities: CapabilitySet,
    /// How many objects the pack stream delivered.
    pub objects: usize,
}

/// A fetch client for one `git://` connection.
pub struct Client {
    options: Options,
    state: NegotiationState,
}

impl Client {
    /// Create a client with `options`.
    pub fn new(options: Options) -> Self {
        Client {
            options,
            state: NegotiationState::Connecting,
        }
    }

    /// The phase the current (or last) fetch is in.
    pub fn state(&self) -> NegotiationState {
        self.state
    }

    /// Run one fetch to completion.
    ///
    /// `source` yields the deframed incoming stream; request lines go out on
    /// `requests`, to be framed and written by the transport. `decoder` is
    /// the external pack decompressor, `delegate` observes the session.
    ///
    /// On error the request pipe is closed and all sub-streams are shut
    /// down, so neither side of the transport is left blocked; the first
    /// fatal error is the one returned.
    pub fn fetch<S, D, L>(
        &mut self,
        url: &DaemonUrl,
        source: S,
        requests: &pipe::Writer<RequestFrame>,
        decoder: &mut D,
        delegate: &mut L,
    ) -> Result<Outcome>
    where
        S: FrameSource,
        D: PackDecoder<S>,
        L: Delegate,
    {
        self.state = NegotiationState::Connecting;
        let mut streams = Streams::split(source);
        match self.run(url, &mut streams, requests, decoder, delegate) {
            Ok(outcome) => {
                self.state = NegotiationState::Done;
                requests.end();
                Ok(outcome)
            }
            Err(err) => {
                self.state = NegotiationState::Failed;
                tracing::error!(error = %err, "fetch aborted");
                requests.close(err.to_string());
                streams.shutdown();
                Err(err)
            }
        }
    }

    fn run<S, D, L>(
        &mut self,
        url: &DaemonUrl,
        streams: &mut Streams<S>,
        requests: &pipe::Writer<RequestFrame>,
        decoder: &mut D,
        delegate: &mut L,
    ) -> Result<Outcome>
    where
        S: FrameSource,
        D: PackDecoder<S>,
        L: Delegate,
    {
        tracing::debug!(url = %url, "sending upload-pack request");
        requests.write(RequestFrame::Data(negotiation::service_request(url)))?;
        self.state = NegotiationState::AwaitingRefs;

        let (refs, capabilities) = read_advertisement(&mut streams.line)?;
        self.state = NegotiationState::RefsComplete;
        tracing::info!(capabilities = ?capabilities, "server capabilities");
        tracing::info!(refs = ?refs, "remote refs");
        delegate.advertised_refs(&refs, &capabilities);

        let head = *refs.get(b"HEAD".as_bstr()).ok_or(Error::MissingHead)?;
        tracing::info!(head = %head, "asking for HEAD");
        let chosen = negotiation::choose_capabilities(&capabilities, self.options.sideband);
        requests.write(RequestFrame::Data(negotiation::want_line(&head, &chosen)))?;
        requests.write(RequestFrame::Flush)?;
        requests.write(RequestFrame::Data(negotiation::DONE.into()))?;
        self.state = NegotiationState::RequestSent;

        self.state = NegotiationState::AwaitingPack;
        let mut cache = ResolutionCache::new();
        let mut objects = 0;
        loop {
            // Payloads routed to the other channels while the decoder pumped
            // the pack channel: progress is observational, error is fatal.
            if let Some(message) = first_error_payload(&mut streams.error) {
                return Err(Error::ServerReported { message });
            }
            while let Some(text) = streams.progress.try_next() {
                emit_progress(delegate, &text);
            }
            let Some(raw) = decoder.next_object(&mut streams.pack, &mut cache)? else {
                break;
            };
            let raw = cache.insert(raw)?;
            tracing::debug!(id = %raw.id, kind = %raw.kind, "object");
            delegate.object(objects::materialize(&raw)?);
            objects += 1;
        }

        // The pack channel ended; read the remaining sub-streams to
        // completion so nothing stalls the shared upstream.
        while let Some(message) = streams.error.next()? {
            if !message.is_empty() {
                return Err(Error::ServerReported { message });
            }
        }
        cache.finish()?;
        while let Some(text) = streams.progress.next()? {
            emit_progress(delegate, &text);
        }
        streams.line.drain()?;

        Ok(Outcome {
            refs,
            capabilities,
            objects,
        })
    }
}

/// Consume ref-advertisement lines until the flush-pkt, returning the ref
/// table and the capability set attached to the first line.
fn read_advertisement<S: FrameSource>(
    line: &mut gix_fetch_core::demux::SubStream<S>,
) -> Result<(RefMap, CapabilitySet)> {
    let mut refs = RefMap::new();
    let mut capabilities = None;
    loop {
        let Some(payload) = line.next()? else {
            return Err(Error::decode("ref advertisement ended without a flush-pkt"));
        };
        if payload.is_empty() {
            // flush-pkt
            break;
        }
        let decoded = gix_fetch_core::line::DecodedLine::parse(&payload);
        let id = ObjectId::from_hex(decoded.hash()?)?;
        let name = decoded.ref_name()?.to_owned();
        if capabilities.is_none() {
            capabilities = Some(decoded.capabilities.unwrap_or_default());
        }
        // Last write per name wins; well-formed servers do not send
        // duplicates.
        refs.insert(name, id);
    }
    Ok((refs, capabilities.unwrap_or_default()))
}

fn first_error_payload<S: FrameSource>(
    error: &mut gix_fetch_core::demux::SubStream<S>,
) -> Option<bstr::BString> {
    while let Some(payload) = error.try_next() {
        if !payload.is_empty() {
            return Some(payload);
        }
    }
    None
}

fn emit_progress(delegate: &mut impl Delegate, text: &bstr::BString) {
    tracing::trace!(text = %text, "progress");
    delegate.progress(text.as_bstr());
}
