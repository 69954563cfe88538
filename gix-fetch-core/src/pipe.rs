//! An order-preserving single-producer/single-consumer pipe with explicit close.
//!
//! The fetch client queues outgoing request lines here; a transport-facing
//! writer drains them at its own pace. Writes never block, reads block until
//! an item, end-of-stream, or a close reason arrives.

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex};

/// The error returned by reads and writes on a pipe that was closed abruptly.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("pipe closed: {reason}")]
pub struct Closed {
    /// The reason passed to [`Writer::close()`] or [`Reader::close()`].
    pub reason: String,
}

struct State<T> {
    queue: VecDeque<T>,
    ended: bool,
    closed: Option<Closed>,
}

struct Shared<T> {
    state: Mutex<State<T>>,
    cond: Condvar,
}

/// Create a new pipe, returning its two endpoints.
pub fn new<T>() -> (Writer<T>, Reader<T>) {
    let shared = Arc::new(Shared {
        state: Mutex::new(State {
            queue: VecDeque::new(),
            ended: false,
            closed: None,
        }),
        cond: Condvar::new(),
    });
    (
        Writer {
            shared: Arc::clone(&shared),
        },
        Reader { shared },
    )
}

/// The producing endpoint of a pipe.
pub struct Writer<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Writer<T> {
    /// Enqueue `item` without blocking.
    ///
    /// Once accepted, the item is guaranteed to reach the reader in write
    /// order unless the pipe is closed abruptly.
    pub fn write(&self, item: T) -> Result<(), Closed> {
        let mut state = self.shared.state.lock().expect("pipe lock poisoned");
        if let Some(closed) = &state.closed {
            return Err(closed.clone());
        }
        debug_assert!(!state.ended, "write after end()");
        state.queue.push_back(item);
        self.shared.cond.notify_all();
        Ok(())
    }

    /// Mark the end of the stream. Queued items are still delivered, after
    /// which reads resolve with end-of-stream.
    pub fn end(&self) {
        let mut state = self.shared.state.lock().expect("pipe lock poisoned");
        state.ended = true;
        self.shared.cond.notify_all();
    }

    /// Terminate the pipe abruptly: queued items are discarded and all
    /// subsequent reads and writes resolve with `reason`.
    pub fn close(&self, reason: impl Into<String>) {
        close(&self.shared, reason);
    }
}

impl<T> Drop for Writer<T> {
    fn drop(&mut self) {
        // A writer that vanishes without end() must not leave the reader
        // blocked forever.
        let state = self.shared.state.lock().expect("pipe lock poisoned");
        let open = !state.ended && state.closed.is_none();
        drop(state);
        if open {
            self.close("pipe writer dropped");
        }
    }
}

/// The consuming endpoint of a pipe.
pub struct Reader<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Reader<T> {
    /// Block until the next item is available.
    ///
    /// Returns `Ok(Some(item))` in exact write order, `Ok(None)` once the
    /// queue is drained past an [`Writer::end()`], or `Err(Closed)` after an
    /// abrupt close, regardless of data still queued at that point.
    pub fn read(&self) -> Result<Option<T>, Closed> {
        let mut state = self.shared.state.lock().expect("pipe lock poisoned");
        loop {
            if let Some(closed) = &state.closed {
                return Err(closed.clone());
            }
            if let Some(item) = state.queue.pop_front() {
                return Ok(Some(item));
            }
            if state.ended {
                return Ok(None);
            }
            state = self.shared.cond.wait(state).expect("pipe lock poisoned");
        }
    }

    /// Like [`read()`](Self::read) but never blocks; `Ok(None)` means nothing
    /// is queued right now or the stream has ended.
    pub fn try_read(&self) -> Result<Option<T>, Closed> {
        let mut state = self.shared.state.lock().expect("pipe lock poisoned");
        if let Some(closed) = &state.closed {
            return Err(closed.clone());
        }
        Ok(state.queue.pop_front())
    }

    /// Terminate the pipe abruptly from the consuming side, releasing a
    /// blocked writer-side observer and rejecting further writes.
    pub fn close(&self, reason: impl Into<String>) {
        close(&self.shared, reason);
    }
}

fn close<T>(shared: &Shared<T>, reason: impl Into<String>) {
    let mut state = shared.state.lock().expect("pipe lock poisoned");
    if state.closed.is_none() {
        state.closed = Some(Closed {
            reason: reason.into(),
        });
        state.queue.clear();
    }
    shared.cond.notify_all();
}
