//! Completion polling for the queue path.
//!
//! The storage client only offers a non-blocking completion test, so the
//! caller's thread spins on it. There is no timeout: a store that never
//! completes keeps the caller spinning.

use ioshim_io::{BackingStore, EventPoll, InFlight};

use crate::ReadError;

/// What the polling thread does between pending completion tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PollMode {
    /// Yield the scheduling turn after every pending test.
    #[default]
    Yield,
    /// Busy-spin for up to `spins_per_yield` pending tests, then yield once.
    Spin { spins_per_yield: u32 },
}

/// Tracks the idle strategy across iterations of one wait.
#[derive(Debug)]
struct Idle {
    mode: PollMode,
    spins: u32,
}

impl Idle {
    fn new(mode: PollMode) -> Self {
        Self { mode, spins: 0 }
    }

    fn pause(&mut self) {
        match self.mode {
            PollMode::Yield => std::thread::yield_now(),
            PollMode::Spin { spins_per_yield } => {
                if self.spins < spins_per_yield {
                    self.spins += 1;
                    std::hint::spin_loop();
                } else {
                    self.spins = 0;
                    std::thread::yield_now();
                }
            }
        }
    }
}

/// Polls `in_flight` until the store reports it complete.
///
/// Only the completion test repeats; the read itself is never resubmitted.
pub(crate) fn wait_for_completion(
    store: &dyn BackingStore,
    in_flight: &InFlight<'_>,
    mode: PollMode,
) -> Result<usize, ReadError> {
    let mut idle = Idle::new(mode);
    let mut pending: u64 = 0;

    loop {
        match store.event_poll(in_flight).map_err(ReadError::poll)? {
            EventPoll::Pending => {
                pending += 1;
                idle.pause();
            }
            EventPoll::Complete(result) => {
                tracing::trace!(event = in_flight.event(), pending, "event completed");
                return result.map_err(ReadError::completion);
            }
        }
    }
}
