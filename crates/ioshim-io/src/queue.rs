//! Completion-queue providers.
//!
//! Queues are created and destroyed by the session; providers only decide
//! which one (if any) a calling thread uses.

use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use ioshim_types::QueueHandle;

use crate::backend::EventQueueProvider;

/// Provider for contexts that never opted into the queue path.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoQueues;

impl EventQueueProvider for NoQueues {
    fn acquire_queue(&self) -> Option<QueueHandle> {
        None
    }
}

static NEXT_POOL_ID: AtomicU64 = AtomicU64::new(1);

/// A thread's queue in one pool, and a handle that dies with the pool.
type Assignment = (Weak<()>, QueueHandle);

thread_local! {
    /// Queue assigned to this thread, per pool id.
    static ASSIGNED: RefCell<HashMap<u64, Assignment>> = RefCell::new(HashMap::new());
}

/// A fixed set of session-owned queues shared out one per thread.
///
/// The first time a thread asks, it is assigned the next queue round-robin
/// and keeps it for the life of the pool. Later calls are a thread-local
/// lookup; nothing here takes a lock.
///
/// Dropping the pool clears the dropping thread's entry. Entries other
/// threads hold for a dropped pool are pruned the next time those threads
/// are assigned a queue from any pool.
#[derive(Debug)]
pub struct QueuePool {
    id: u64,
    queues: Vec<QueueHandle>,
    cursor: AtomicUsize,
    alive: Arc<()>,
}

impl QueuePool {
    /// Creates a pool over queues the caller has already created.
    ///
    /// An empty pool never supplies a queue.
    pub fn new(queues: Vec<QueueHandle>) -> Self {
        Self {
            id: NEXT_POOL_ID.fetch_add(1, Ordering::Relaxed),
            queues,
            cursor: AtomicUsize::new(0),
            alive: Arc::new(()),
        }
    }

    pub fn len(&self) -> usize {
        self.queues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queues.is_empty()
    }

    /// The queues in the pool, in assignment order.
    pub fn queues(&self) -> &[QueueHandle] {
        &self.queues
    }

    fn next_queue(&self) -> QueueHandle {
        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % self.queues.len();
        self.queues[index]
    }

    fn assign(&self, assigned: &mut HashMap<u64, Assignment>) -> QueueHandle {
        if let Some((_, queue)) = assigned.get(&self.id) {
            return *queue;
        }

        assigned.retain(|_, (alive, _)| alive.strong_count() > 0);
        let queue = self.next_queue();
        assigned.insert(self.id, (Arc::downgrade(&self.alive), queue));
        tracing::debug!(pool = self.id, queue = %queue, "assigned completion queue to thread");
        queue
    }
}

impl EventQueueProvider for QueuePool {
    fn acquire_queue(&self) -> Option<QueueHandle> {
        if self.queues.is_empty() {
            return None;
        }

        let queue = ASSIGNED
            .try_with(|assigned| self.assign(&mut assigned.borrow_mut()))
            // Thread-local storage is gone during thread teardown; hand out a
            // queue without caching it.
            .unwrap_or_else(|_| self.next_queue());

        Some(queue)
    }
}

impl Drop for QueuePool {
    fn drop(&mut self) {
        let _ = ASSIGNED.try_with(|assigned| assigned.borrow_mut().remove(&self.id));
    }
}

/// Pools this thread still holds a cached assignment for.
#[cfg(test)]
fn cached_assignments() -> usize {
    ASSIGNED.with(|assigned| assigned.borrow().len())
}
