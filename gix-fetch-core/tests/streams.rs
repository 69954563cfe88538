//! Cross-thread behavior of the pipe and the demultiplexer.

use std::collections::VecDeque;
use std::sync::mpsc;

use bstr::BString;
use gix_fetch_core::demux::Streams;
use gix_fetch_core::{pipe, Channel, Frame, FrameSource};

#[test]
fn a_transport_thread_drains_the_pipe_in_write_order() {
    let (writer, reader) = pipe::new::<BString>();
    let drain = std::thread::spawn(move || {
        let mut sent = Vec::new();
        while let Some(item) = reader.read().expect("pipe not closed abruptly") {
            sent.push(item);
        }
        sent
    });
    writer.write("git-upload-pack /repo.git\0host=localhost\0".into()).unwrap();
    writer.write("want 9ec967f164af38b7ddeb8f126cfba166ae5fab71\n".into()).unwrap();
    writer.write("done".into()).unwrap();
    writer.end();
    let sent = drain.join().unwrap();
    assert_eq!(sent.len(), 3);
    assert_eq!(sent[2], "done");
}

/// A source that blocks on a channel, so frame arrival can be scripted from
/// the test body while a reader is already waiting.
struct Feed(mpsc::Receiver<Option<Frame>>);

impl FrameSource for Feed {
    fn next_frame(&mut self) -> std::io::Result<Option<Frame>> {
        Ok(self.0.recv().unwrap_or(None))
    }
}

#[test]
fn a_blocked_substream_reader_wakes_on_frame_arrival() {
    let (feed, source) = mpsc::channel();
    let mut streams = Streams::split(Feed(source));
    let mut pack = streams.pack;
    let reader = std::thread::spawn(move || pack.next().unwrap());
    feed.send(Some(Frame::new(Channel::Progress, "resolving deltas"))).unwrap();
    feed.send(Some(Frame::new(Channel::Pack, "PACK\x00\x00\x00\x02"))).unwrap();
    assert_eq!(reader.join().unwrap().unwrap(), "PACK\x00\x00\x00\x02");
    // The progress frame that arrived first was routed, not dropped.
    assert_eq!(streams.progress.try_next().unwrap(), "resolving deltas");
    drop(feed);
    assert_eq!(streams.progress.next().unwrap(), None);
}

#[test]
fn scripted_sources_end_cleanly() {
    let frames: VecDeque<Frame> = vec![Frame::flush()].into_iter().collect();
    let mut streams = Streams::split(frames);
    assert_eq!(streams.line.next().unwrap().unwrap(), "");
    assert_eq!(streams.line.next().unwrap(), None);
    assert_eq!(streams.error.next().unwrap(), None);
}
