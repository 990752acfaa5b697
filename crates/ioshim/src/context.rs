//! The per-session dependencies of every read.

use std::fmt::Debug;
use std::io::IoSliceMut;
use std::sync::Arc;

use ioshim_io::{BackingStore, EventQueueProvider, NoQueues};
use ioshim_types::FileEntry;

use crate::{PollMode, ReadError, read, vectored};

/// Everything a read needs besides its arguments.
///
/// Passed explicitly into each entry point instead of being looked up from
/// process-wide state. Cheap to clone; clones share the store and the
/// queue provider.
#[derive(Clone)]
pub struct ReadContext {
    store: Arc<dyn BackingStore>,
    queues: Arc<dyn EventQueueProvider>,
    poll_mode: PollMode,
}

impl ReadContext {
    /// Creates a context that uses `queues` to pick the submission path.
    pub fn new(store: Arc<dyn BackingStore>, queues: Arc<dyn EventQueueProvider>) -> Self {
        Self {
            store,
            queues,
            poll_mode: PollMode::default(),
        }
    }

    /// Creates a context that always takes the blocking path.
    pub fn blocking(store: Arc<dyn BackingStore>) -> Self {
        Self::new(store, Arc::new(NoQueues))
    }

    pub fn with_poll_mode(mut self, poll_mode: PollMode) -> Self {
        self.poll_mode = poll_mode;
        self
    }

    pub fn store(&self) -> &dyn BackingStore {
        self.store.as_ref()
    }

    pub fn queues(&self) -> &dyn EventQueueProvider {
        self.queues.as_ref()
    }

    pub fn poll_mode(&self) -> PollMode {
        self.poll_mode
    }

    /// `pread`: see [`read::read_one`].
    pub fn read_one(
        &self,
        buf: &mut [u8],
        offset: u64,
        file: &FileEntry,
    ) -> Result<usize, ReadError> {
        read::read_one(self, buf, offset, file)
    }

    /// `preadv`: see [`vectored::read_vectored`].
    pub fn read_vectored(
        &self,
        bufs: &mut [IoSliceMut<'_>],
        offset: u64,
        file: &FileEntry,
    ) -> Result<usize, ReadError> {
        vectored::read_vectored(self, bufs, offset, file)
    }
}

impl Debug for ReadContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadContext")
            .field("poll_mode", &self.poll_mode)
            .finish_non_exhaustive()
    }
}
