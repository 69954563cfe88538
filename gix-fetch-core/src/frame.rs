//! The framed-stream boundary between the byte-level transport and this crate.

use bstr::BString;

/// The channel a [`Frame`] belongs to.
///
/// Before the pack phase every data frame is a negotiation line; once the
/// server starts streaming with sideband enabled, each frame carries a
/// leading type byte that the deframer maps onto [`Channel::Pack`],
/// [`Channel::Progress`] or [`Channel::Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Ref-advertisement and negotiation lines.
    Line,
    /// Packfile data (sideband channel 1).
    Pack,
    /// Human-readable progress text (sideband channel 2).
    Progress,
    /// Server-reported error text (sideband channel 3).
    Error,
}

impl Channel {
    /// All channels, in the order sub-streams are handed out.
    pub const ALL: [Channel; 4] = [Channel::Line, Channel::Pack, Channel::Progress, Channel::Error];

    pub(crate) fn index(self) -> usize {
        match self {
            Channel::Line => 0,
            Channel::Pack => 1,
            Channel::Progress => 2,
            Channel::Error => 3,
        }
    }
}

/// One logical item read from the deframed transport stream.
///
/// The outer pkt-line length prefix has already been stripped; `data` is the
/// payload as it appeared on the wire. An empty payload on [`Channel::Line`]
/// represents a flush-pkt, i.e. the end of a logical section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// The sub-stream this frame belongs to.
    pub channel: Channel,
    /// The frame payload.
    pub data: BString,
}

impl Frame {
    /// Create a frame on `channel` carrying `data`.
    pub fn new(channel: Channel, data: impl Into<BString>) -> Self {
        Frame {
            channel,
            data: data.into(),
        }
    }

    /// A flush-pkt, ending the current section of the line channel.
    pub fn flush() -> Self {
        Frame::new(Channel::Line, BString::default())
    }
}

/// A blocking source of deframed protocol items, implemented by the
/// transport-facing pkt-line reader.
///
/// Reads are pull-driven: implementations must not buffer ahead on their own
/// account, as the demultiplexer only asks for the next frame when some
/// consumer is actually waiting for one.
pub trait FrameSource {
    /// Read the next frame, blocking until one is available.
    ///
    /// Returns `Ok(None)` once the underlying stream has ended.
    fn next_frame(&mut self) -> std::io::Result<Option<Frame>>;
}

impl<T: FrameSource + ?Sized> FrameSource for &mut T {
    fn next_frame(&mut self) -> std::io::Result<Option<Frame>> {
        (**self).next_frame()
    }
}

impl FrameSource for std::collections::VecDeque<Frame> {
    /// Treat a pre-recorded queue of frames as a source, mainly for tests.
    fn next_frame(&mut self) -> std::io::Result<Option<Frame>> {
        Ok(self.pop_front())
    }
}
