//! Backing-store boundary traits.
//!
//! The [`BackingStore`] trait is everything the read path needs from the
//! storage client:
//! - a blocking positional read, used when no completion queue is available
//! - an event/submit/poll triple for the completion-queue path
//!
//! The [`EventQueueProvider`] trait decides which of the two a caller gets.
//! Both are object-safe so the read path can hold them as `Arc<dyn ...>`.

use std::marker::PhantomData;

use ioshim_types::{EventId, FileEntry, NativeStatus, QueueHandle};

/// Result of a non-blocking completion test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventPoll {
    /// The store has not finished the transfer yet.
    Pending,
    /// The transfer finished; `Ok` carries the bytes transferred.
    Complete(Result<usize, NativeStatus>),
}

/// A read that has been submitted and not yet observed complete.
///
/// Holds the destination buffer's mutable borrow for as long as the store
/// may still write into it, so the caller cannot touch the buffer until the
/// `InFlight` is dropped.
#[derive(Debug)]
pub struct InFlight<'buf> {
    event: u64,
    len: usize,
    _buf: PhantomData<&'buf mut [u8]>,
}

impl<'buf> InFlight<'buf> {
    /// Ties `event` to `buf` until the returned value is dropped.
    pub fn new(event: &EventId, buf: &'buf mut [u8]) -> Self {
        Self {
            event: event.as_u64(),
            len: buf.len(),
            _buf: PhantomData,
        }
    }

    /// Raw id of the event the read was tagged with.
    pub fn event(&self) -> u64 {
        self.event
    }

    /// Length of the destination buffer.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// The storage client operations consumed by the read path.
///
/// All methods are non-blocking except [`BackingStore::blocking_read`].
pub trait BackingStore: Send + Sync {
    /// Reads into `buf` at `offset`, waiting for the transfer to finish.
    ///
    /// Returns the number of bytes read; fewer than `buf.len()` only at
    /// end-of-file.
    fn blocking_read(
        &self,
        file: &FileEntry,
        buf: &mut [u8],
        offset: u64,
    ) -> Result<usize, NativeStatus>;

    /// Creates an event bound to `queue`.
    fn event_create(&self, queue: QueueHandle) -> Result<EventId, NativeStatus>;

    /// Submits a read tagged with `event` without waiting for it.
    ///
    /// An `Err` means the request was rejected before any transfer started.
    fn submit_read<'buf>(
        &self,
        file: &FileEntry,
        buf: &'buf mut [u8],
        offset: u64,
        event: &EventId,
    ) -> Result<InFlight<'buf>, NativeStatus>;

    /// Tests the event without blocking.
    ///
    /// An `Err` means the test itself failed, not the transfer.
    fn event_poll(&self, in_flight: &InFlight<'_>) -> Result<EventPoll, NativeStatus>;

    /// Releases an event. Never fails; unknown ids are ignored.
    fn event_destroy(&self, event: EventId);
}

/// Supplies a completion queue for the calling thread, if it has one.
///
/// `None` is a routing decision, not an error: the read falls back to the
/// blocking path. Implementations must not block and must not allocate
/// per-call state.
pub trait EventQueueProvider: Send + Sync {
    fn acquire_queue(&self) -> Option<QueueHandle>;
}
