//! Event bookkeeping shared by the in-process stores.
//!
//! Models the storage client's queue/event objects closely enough to
//! exercise the read path: events must be bound to a live queue, carry at
//! most one request at a time, and report completion only after a
//! configurable number of pending polls.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use ioshim_types::{EventId, NativeStatus, QueueHandle, der};

use crate::backend::EventPoll;

#[derive(Debug)]
enum EventState {
    Idle,
    InFlight {
        result: Result<usize, NativeStatus>,
        pending_polls: u32,
    },
    Complete(Result<usize, NativeStatus>),
}

#[derive(Debug)]
struct EventSlot {
    queue: QueueHandle,
    state: EventState,
}

#[derive(Debug)]
pub(crate) struct EventTable {
    next_event: AtomicU64,
    next_queue: AtomicU64,
    queues: Mutex<HashSet<QueueHandle>>,
    events: Mutex<HashMap<u64, EventSlot>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl EventTable {
    pub(crate) fn new() -> Self {
        Self {
            next_event: AtomicU64::new(1),
            next_queue: AtomicU64::new(1),
            queues: Mutex::new(HashSet::new()),
            events: Mutex::new(HashMap::new()),
        }
    }

    pub(crate) fn create_queue(&self) -> QueueHandle {
        let queue = QueueHandle::new(self.next_queue.fetch_add(1, Ordering::Relaxed));
        lock(&self.queues).insert(queue);
        queue
    }

    /// Destroys a queue; refused while events are still bound to it.
    pub(crate) fn destroy_queue(&self, queue: QueueHandle) -> Result<(), NativeStatus> {
        let events = lock(&self.events);
        if events.values().any(|slot| slot.queue == queue) {
            return Err(NativeStatus::der(der::EQ_BUSY));
        }
        if !lock(&self.queues).remove(&queue) {
            return Err(NativeStatus::der(der::NO_HDL));
        }
        Ok(())
    }

    pub(crate) fn create_event(&self, queue: QueueHandle) -> Result<EventId, NativeStatus> {
        if !lock(&self.queues).contains(&queue) {
            return Err(NativeStatus::der(der::NO_HDL));
        }
        let id = self.next_event.fetch_add(1, Ordering::Relaxed);
        lock(&self.events).insert(
            id,
            EventSlot {
                queue,
                state: EventState::Idle,
            },
        );
        Ok(EventId::new(id))
    }

    /// Attaches a finished-but-unreported result to an idle event.
    pub(crate) fn arm(
        &self,
        event: &EventId,
        result: Result<usize, NativeStatus>,
        pending_polls: u32,
    ) -> Result<(), NativeStatus> {
        let mut events = lock(&self.events);
        let slot = events
            .get_mut(&event.as_u64())
            .ok_or_else(|| NativeStatus::der(der::NO_HDL))?;
        if !matches!(slot.state, EventState::Idle) {
            return Err(NativeStatus::der(der::INVAL));
        }
        slot.state = EventState::InFlight {
            result,
            pending_polls,
        };
        Ok(())
    }

    pub(crate) fn poll(&self, event: u64) -> Result<EventPoll, NativeStatus> {
        let mut events = lock(&self.events);
        let slot = events
            .get_mut(&event)
            .ok_or_else(|| NativeStatus::der(der::NO_HDL))?;

        match &mut slot.state {
            EventState::Idle => Err(NativeStatus::der(der::INVAL)),
            EventState::InFlight {
                result,
                pending_polls,
            } => {
                if *pending_polls > 0 {
                    *pending_polls -= 1;
                    return Ok(EventPoll::Pending);
                }
                let result = *result;
                slot.state = EventState::Complete(result);
                Ok(EventPoll::Complete(result))
            }
            EventState::Complete(result) => Ok(EventPoll::Complete(*result)),
        }
    }

    pub(crate) fn destroy(&self, event: EventId) {
        lock(&self.events).remove(&event.as_u64());
    }

    pub(crate) fn live_events(&self) -> usize {
        lock(&self.events).len()
    }
}
