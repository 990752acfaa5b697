//! # ioshim-io: Backing-store boundary for the read path
//!
//! This crate defines what the read path consumes from the storage client
//! and the session layer, plus two in-process stores:
//!
//! - **[`BackingStore`]**: blocking reads, and the event/submit/poll triple
//!   of the completion-queue path
//! - **[`EventQueueProvider`]**: whether the calling thread has a queue
//!   ([`QueuePool`], [`NoQueues`])
//! - **[`MemStore`]**: in-memory objects with delayed completion and
//!   injectable faults
//! - **[`FileStore`]**: local files via `std::fs`
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────┐
//! │            ioshim            │
//! │ (read_one / read_vectored)   │
//! └───────┬──────────────┬───────┘
//!         │              │
//! ┌───────┴──────┐ ┌─────┴──────────────┐
//! │ BackingStore │ │ EventQueueProvider │
//! └──────────────┘ └────────────────────┘
//! ```

mod backend;
mod error;
mod events;
mod file_store;
mod mem_store;
mod queue;

pub use backend::{BackingStore, EventPoll, EventQueueProvider, InFlight};
pub use error::IoError;
pub use file_store::FileStore;
pub use mem_store::{Fault, FaultSite, MemStore};
pub use queue::{NoQueues, QueuePool};
