//! In-memory backing store with fault injection.
//!
//! Objects are immutable byte strings registered up front. Completion can be
//! delayed by a number of pending polls, and failures can be injected at
//! each stage of a read so callers can exercise every error path.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError, RwLock};

use bytes::Bytes;
use ioshim_types::{
    ContainerHandle, EventId, FileEntry, NativeStatus, ObjectHandle, QueueHandle, der,
};

use crate::backend::{BackingStore, EventPoll, InFlight};
use crate::events::EventTable;

/// Stage of a read at which a [`Fault`] fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultSite {
    /// Event creation is refused.
    EventCreate,
    /// Submission is rejected before any transfer starts.
    Submit,
    /// The completion test itself fails.
    Poll,
    /// The transfer fails, on both the blocking and the queue path.
    Transfer,
}

/// A failure to inject into a [`MemStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fault {
    site: FaultSite,
    status: NativeStatus,
    offset: Option<u64>,
}

impl Fault {
    pub fn new(site: FaultSite, status: NativeStatus) -> Self {
        Self {
            site,
            status,
            offset: None,
        }
    }

    /// Restricts the fault to reads starting at `offset`.
    ///
    /// Ignored for [`FaultSite::EventCreate`] and [`FaultSite::Poll`], which
    /// do not know the offset of the read they serve.
    pub fn at_offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    fn matches(&self, site: FaultSite, offset: Option<u64>) -> bool {
        if self.site != site {
            return false;
        }
        match (self.offset, offset) {
            (Some(wanted), Some(actual)) => wanted == actual,
            _ => true,
        }
    }
}

/// Backing store holding whole objects in memory.
#[derive(Debug)]
pub struct MemStore {
    container: ContainerHandle,
    objects: RwLock<HashMap<ObjectHandle, Bytes>>,
    next_object: AtomicU64,
    events: EventTable,
    faults: Mutex<Vec<Fault>>,
    completion_delay: AtomicU32,
    reads_issued: AtomicU64,
}

impl MemStore {
    pub fn new() -> Self {
        Self {
            container: ContainerHandle::new(1),
            objects: RwLock::new(HashMap::new()),
            next_object: AtomicU64::new(1),
            events: EventTable::new(),
            faults: Mutex::new(Vec::new()),
            completion_delay: AtomicU32::new(0),
            reads_issued: AtomicU64::new(0),
        }
    }

    /// Registers an object and returns an open entry for it.
    pub fn insert(&self, data: impl Into<Bytes>) -> FileEntry {
        let object = ObjectHandle::new(self.next_object.fetch_add(1, Ordering::Relaxed));
        self.objects
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(object, data.into());
        FileEntry::new(self.container, object)
    }

    /// Creates a completion queue, as the session would.
    pub fn create_queue(&self) -> QueueHandle {
        self.events.create_queue()
    }

    pub fn destroy_queue(&self, queue: QueueHandle) -> Result<(), NativeStatus> {
        self.events.destroy_queue(queue)
    }

    /// Number of pending polls every submitted read reports before completing.
    pub fn set_completion_delay(&self, polls: u32) {
        self.completion_delay.store(polls, Ordering::Relaxed);
    }

    pub fn inject(&self, fault: Fault) {
        self.faults
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(fault);
    }

    pub fn clear_faults(&self) {
        self.faults
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Reads that reached the store, on either path.
    pub fn reads_issued(&self) -> u64 {
        self.reads_issued.load(Ordering::Relaxed)
    }

    /// Events created and not yet destroyed.
    pub fn live_events(&self) -> usize {
        self.events.live_events()
    }

    fn fault(&self, site: FaultSite, offset: Option<u64>) -> Result<(), NativeStatus> {
        let faults = self.faults.lock().unwrap_or_else(PoisonError::into_inner);
        match faults.iter().find(|fault| fault.matches(site, offset)) {
            Some(fault) => Err(fault.status),
            None => Ok(()),
        }
    }

    fn transfer(
        &self,
        file: &FileEntry,
        buf: &mut [u8],
        offset: u64,
    ) -> Result<usize, NativeStatus> {
        self.fault(FaultSite::Transfer, Some(offset))?;

        if file.container != self.container {
            return Err(NativeStatus::der(der::NO_HDL));
        }
        let objects = self.objects.read().unwrap_or_else(PoisonError::into_inner);
        let data = objects
            .get(&file.object)
            .ok_or_else(|| NativeStatus::der(der::NO_HDL))?;

        let Ok(start) = usize::try_from(offset) else {
            return Ok(0);
        };
        if start >= data.len() {
            return Ok(0);
        }
        let n = buf.len().min(data.len() - start);
        buf[..n].copy_from_slice(&data[start..start + n]);
        Ok(n)
    }
}

impl Default for MemStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BackingStore for MemStore {
    fn blocking_read(
        &self,
        file: &FileEntry,
        buf: &mut [u8],
        offset: u64,
    ) -> Result<usize, NativeStatus> {
        self.reads_issued.fetch_add(1, Ordering::Relaxed);
        self.transfer(file, buf, offset)
    }

    fn event_create(&self, queue: QueueHandle) -> Result<EventId, NativeStatus> {
        self.fault(FaultSite::EventCreate, None)?;
        self.events.create_event(queue)
    }

    fn submit_read<'buf>(
        &self,
        file: &FileEntry,
        buf: &'buf mut [u8],
        offset: u64,
        event: &EventId,
    ) -> Result<InFlight<'buf>, NativeStatus> {
        self.fault(FaultSite::Submit, Some(offset))?;
        self.reads_issued.fetch_add(1, Ordering::Relaxed);

        // The copy happens now; only the completion report is deferred.
        let result = self.transfer(file, buf, offset);
        self.events
            .arm(event, result, self.completion_delay.load(Ordering::Relaxed))?;
        Ok(InFlight::new(event, buf))
    }

    fn event_poll(&self, in_flight: &InFlight<'_>) -> Result<EventPoll, NativeStatus> {
        self.fault(FaultSite::Poll, None)?;
        self.events.poll(in_flight.event())
    }

    fn event_destroy(&self, event: EventId) {
        self.events.destroy(event);
    }
}
