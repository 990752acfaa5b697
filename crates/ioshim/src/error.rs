//! Read path error types.

use ioshim_types::{Errno, NativeStatus};

use crate::translate::translate;

/// Why a read failed, with the errno the caller sees.
///
/// Every variant carrying a native status was translated once, at the
/// point of failure. The same native status yields the same errno on the
/// queue path and the blocking path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ReadError {
    /// No event could be created; no I/O was issued.
    #[error("event creation failed: {native}: {errno}")]
    EventInit { native: NativeStatus, errno: Errno },

    /// The store rejected the request before any transfer began.
    #[error("read submission rejected: {native}: {errno}")]
    Submit { native: NativeStatus, errno: Errno },

    /// Testing the event for completion failed.
    #[error("completion test failed: {native}: {errno}")]
    Poll { native: NativeStatus, errno: Errno },

    /// The store attempted the transfer and reported a failure.
    #[error("read failed: {native}: {errno}")]
    Completion { native: NativeStatus, errno: Errno },

    /// The blocking fallback read failed.
    #[error("blocking read failed: {native}: {errno}")]
    Blocking { native: NativeStatus, errno: Errno },

    /// The store claimed more bytes than the buffer holds.
    #[error("store reported {reported} bytes for a {requested}-byte buffer")]
    Overrun { reported: usize, requested: usize },
}

impl ReadError {
    pub(crate) fn event_init(native: NativeStatus) -> Self {
        Self::EventInit {
            native,
            errno: translate(native),
        }
    }

    pub(crate) fn submit(native: NativeStatus) -> Self {
        Self::Submit {
            native,
            errno: translate(native),
        }
    }

    pub(crate) fn poll(native: NativeStatus) -> Self {
        Self::Poll {
            native,
            errno: translate(native),
        }
    }

    pub(crate) fn completion(native: NativeStatus) -> Self {
        Self::Completion {
            native,
            errno: translate(native),
        }
    }

    pub(crate) fn blocking(native: NativeStatus) -> Self {
        Self::Blocking {
            native,
            errno: translate(native),
        }
    }

    /// The POSIX error code surfaced to the intercepted caller.
    pub fn errno(&self) -> Errno {
        match self {
            Self::EventInit { errno, .. }
            | Self::Submit { errno, .. }
            | Self::Poll { errno, .. }
            | Self::Completion { errno, .. }
            | Self::Blocking { errno, .. } => *errno,
            Self::Overrun { .. } => Errno::EIO,
        }
    }

    /// The backing-store status behind this error, if there was one.
    pub fn native(&self) -> Option<NativeStatus> {
        match self {
            Self::EventInit { native, .. }
            | Self::Submit { native, .. }
            | Self::Poll { native, .. }
            | Self::Completion { native, .. }
            | Self::Blocking { native, .. } => Some(*native),
            Self::Overrun { .. } => None,
        }
    }

    /// Short name of the stage that failed, for logs.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::EventInit { .. } => "event_create",
            Self::Submit { .. } => "submit",
            Self::Poll { .. } => "event_poll",
            Self::Completion { .. } => "completion",
            Self::Blocking { .. } => "blocking_read",
            Self::Overrun { .. } => "overrun",
        }
    }
}

impl From<ReadError> for std::io::Error {
    fn from(err: ReadError) -> Self {
        err.errno().to_io_error()
    }
}
