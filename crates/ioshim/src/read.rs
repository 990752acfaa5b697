//! Single-buffer reads.
//!
//! One read either goes through a completion queue (create event, submit,
//! poll until done) or, when the calling thread has no queue, through the
//! store's blocking read. Both paths return the same bytes and the same
//! errno for the same input.

use ioshim_io::BackingStore;
use ioshim_types::{EventId, FileEntry, QueueHandle};

use crate::{ReadContext, ReadError, poll};

/// Owns one event for the duration of one read and destroys it on drop.
struct EventGuard<'a> {
    store: &'a dyn BackingStore,
    id: Option<EventId>,
}

impl<'a> EventGuard<'a> {
    fn create(store: &'a dyn BackingStore, queue: QueueHandle) -> Result<Self, ReadError> {
        let id = store.event_create(queue).map_err(ReadError::event_init)?;
        Ok(Self {
            store,
            id: Some(id),
        })
    }

    fn id(&self) -> &EventId {
        self.id.as_ref().expect("event is present until drop")
    }
}

impl Drop for EventGuard<'_> {
    fn drop(&mut self) {
        if let Some(id) = self.id.take() {
            self.store.event_destroy(id);
        }
    }
}

/// Reads into `buf` at `offset`, POSIX `pread` style.
///
/// Returns the number of bytes read. A count below `buf.len()` means the
/// file ended; `0` means `offset` is at or past the end. An empty buffer
/// returns `0` without touching the store.
pub fn read_one(
    ctx: &ReadContext,
    buf: &mut [u8],
    offset: u64,
    file: &FileEntry,
) -> Result<usize, ReadError> {
    let len = buf.len();
    if len == 0 {
        return Ok(0);
    }

    tracing::debug!(
        file = %file,
        "{:#x}-{:#x}",
        offset,
        offset.saturating_add(len as u64 - 1)
    );

    let result = match ctx.queues().acquire_queue() {
        Some(queue) => read_queued(ctx, queue, buf, offset, file),
        None => ctx
            .store()
            .blocking_read(file, buf, offset)
            .map_err(ReadError::blocking),
    }
    .and_then(|n| {
        if n > len {
            Err(ReadError::Overrun {
                reported: n,
                requested: len,
            })
        } else {
            Ok(n)
        }
    });

    if let Err(err) = &result {
        tracing::error!(
            file = %file,
            offset,
            len,
            stage = err.stage(),
            native = ?err.native(),
            errno = %err.errno(),
            "read failed"
        );
    }
    result
}

fn read_queued(
    ctx: &ReadContext,
    queue: QueueHandle,
    buf: &mut [u8],
    offset: u64,
    file: &FileEntry,
) -> Result<usize, ReadError> {
    let store = ctx.store();
    let event = EventGuard::create(store, queue)?;
    let in_flight = store
        .submit_read(file, buf, offset, event.id())
        .map_err(ReadError::submit)?;
    poll::wait_for_completion(store, &in_flight, ctx.poll_mode())
}
