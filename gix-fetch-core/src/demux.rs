//! Fan one framed input stream out into independently readable sub-streams.
//!
//! Each [`Frame`] carries a [`Channel`] tag; its payload is routed to the
//! matching sub-stream. The upstream [`FrameSource`] is only pulled while
//! some sub-stream has an outstanding read, so a producer that races ahead
//! of its consumers is held back instead of filling unbounded buffers.

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex};

use bstr::BString;

use crate::frame::{Channel, FrameSource};

struct State<S> {
    /// Taken by whichever sub-stream is currently pumping upstream.
    source: Option<S>,
    queues: [VecDeque<BString>; 4],
    /// Upstream returned end-of-stream.
    eof: bool,
    /// [`Streams::shutdown()`] was called.
    shut: bool,
}

struct Shared<S> {
    state: Mutex<State<S>>,
    cond: Condvar,
}

/// One independently readable channel of a demultiplexed stream.
pub struct SubStream<S> {
    shared: Arc<Shared<S>>,
    channel: Channel,
}

/// The four sub-streams of one fetch connection.
pub struct Streams<S> {
    /// Ref-advertisement and negotiation lines.
    pub line: SubStream<S>,
    /// Packfile data.
    pub pack: SubStream<S>,
    /// Progress text.
    pub progress: SubStream<S>,
    /// Server-reported error text.
    pub error: SubStream<S>,
}

impl<S: FrameSource> Streams<S> {
    /// Split `source` into per-channel sub-streams.
    pub fn split(source: S) -> Self {
        let shared = Arc::new(Shared {
            state: Mutex::new(State {
                source: Some(source),
                queues: Default::default(),
                eof: false,
                shut: false,
            }),
            cond: Condvar::new(),
        });
        let stream = |channel| SubStream {
            shared: Arc::clone(&shared),
            channel,
        };
        Streams {
            line: stream(Channel::Line),
            pack: stream(Channel::Pack),
            progress: stream(Channel::Progress),
            error: stream(Channel::Error),
        }
    }

    /// Release every blocked reader with end-of-stream and stop pulling
    /// upstream. Frames already routed remain readable via
    /// [`SubStream::try_next()`] but blocking reads return `Ok(None)`.
    pub fn shutdown(&self) {
        self.line.close();
    }
}

impl<S: FrameSource> SubStream<S> {
    /// Block until the next payload for this channel arrives.
    ///
    /// Returns `Ok(None)` once upstream has ended or the streams were shut
    /// down. While waiting, this sub-stream pumps the shared upstream and
    /// routes frames belonging to other channels into their queues.
    pub fn next(&mut self) -> std::io::Result<Option<BString>> {
        let mut state = self.shared.state.lock().expect("demux lock poisoned");
        loop {
            if let Some(data) = state.queues[self.channel.index()].pop_front() {
                return Ok(Some(data));
            }
            if state.eof || state.shut {
                return Ok(None);
            }
            if let Some(mut source) = state.source.take() {
                // Pump upstream without holding the lock; concurrent readers
                // find `source` taken and wait on the condvar instead.
                drop(state);
                let outcome = source.next_frame();
                state = self.shared.state.lock().expect("demux lock poisoned");
                match outcome {
                    Ok(Some(frame)) => {
                        state.source = Some(source);
                        state.queues[frame.channel.index()].push_back(frame.data);
                    }
                    Ok(None) => state.eof = true,
                    Err(err) => {
                        state.source = Some(source);
                        self.shared.cond.notify_all();
                        return Err(err);
                    }
                }
                self.shared.cond.notify_all();
            } else {
                state = self.shared.cond.wait(state).expect("demux lock poisoned");
            }
        }
    }

    /// Pop the next already-routed payload without pulling upstream.
    pub fn try_next(&mut self) -> Option<BString> {
        let mut state = self.shared.state.lock().expect("demux lock poisoned");
        state.queues[self.channel.index()].pop_front()
    }

    /// Read and discard everything remaining on this channel.
    ///
    /// Every produced sub-stream has to be consumed to completion or closed,
    /// otherwise a reader of another channel ends up buffering this one's
    /// frames forever.
    pub fn drain(&mut self) -> std::io::Result<()> {
        while self.next()?.is_some() {}
        Ok(())
    }

    /// The channel this sub-stream reads.
    pub fn channel(&self) -> Channel {
        self.channel
    }

    /// Shut down all sub-streams sharing this upstream, releasing blocked
    /// readers with end-of-stream.
    pub fn close(&self) {
        let mut state = self.shared.state.lock().expect("demux lock poisoned");
        state.shut = true;
        state.source = None;
        self.shared.cond.notify_all();
    }
}
