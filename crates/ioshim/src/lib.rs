//! # ioshim: POSIX reads over a completion-queue storage client
//!
//! The read path of an interception shim. Intercepted `pread`/`preadv` calls
//! land here and are served from a backing store whose native primitive is
//! asynchronous: submit a read tagged with an event, then test the event
//! until it completes.
//!
//! - [`read_one`]: one buffer, through a completion queue if the calling
//!   thread has one, otherwise through the store's blocking read
//! - [`read_vectored`]: several buffers read in sequence at one advancing
//!   offset
//! - [`translate`]: native status to errno
//!
//! Results are `Result<usize, ReadError>`; [`ReadError::errno`] is what the
//! intercepted caller sees.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use ioshim::ReadContext;
//! use ioshim_io::{MemStore, QueuePool};
//!
//! let store = Arc::new(MemStore::new());
//! let file = store.insert(vec![7u8; 10_000]);
//! let queues = QueuePool::new(vec![store.create_queue()]);
//! let ctx = ReadContext::new(store, Arc::new(queues));
//!
//! let mut buf = vec![0u8; 4096];
//! assert_eq!(ctx.read_one(&mut buf, 8192, &file), Ok(1808));
//! ```

mod context;
mod error;
mod poll;
mod read;
mod translate;
mod vectored;

pub use context::ReadContext;
pub use error::ReadError;
pub use poll::PollMode;
pub use read::read_one;
pub use translate::{is_known, translate};
pub use vectored::read_vectored;
