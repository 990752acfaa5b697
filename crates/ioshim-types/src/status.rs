//! Native status codes reported by the backing storage stack.
//!
//! The storage stack reports failures in two shapes:
//! - negative values: its own error codes (`-DER_*`, see [`der`])
//! - positive values: plain POSIX errnos, reported as-is by the file API
//!
//! Zero is success and is never a [`NativeStatus`].

use std::fmt::{Debug, Display};
use std::num::NonZeroI32;

use serde::{Deserialize, Serialize};

/// A non-success status from the backing store.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct NativeStatus(NonZeroI32);

impl NativeStatus {
    /// Wraps a raw status, returning `None` for success (zero).
    pub fn from_raw(raw: i32) -> Option<Self> {
        NonZeroI32::new(raw).map(Self)
    }

    /// Converts a raw return code into a `Result`, the way callers of the
    /// storage API check `rc`.
    pub fn check(raw: i32) -> Result<(), Self> {
        match Self::from_raw(raw) {
            None => Ok(()),
            Some(status) => Err(status),
        }
    }

    /// Builds the status for a storage error code (`DER_*`, given positive).
    ///
    /// # Panics
    ///
    /// Panics if `code` is not positive.
    pub fn der(code: i32) -> Self {
        assert!(code > 0, "DER codes are positive, got {code}");
        Self::from_raw(-code).expect("negated positive code is non-zero")
    }

    /// Builds the status for an errno the storage stack reports directly.
    ///
    /// # Panics
    ///
    /// Panics if `errno` is not positive.
    pub fn errno(errno: i32) -> Self {
        assert!(errno > 0, "errno values are positive, got {errno}");
        Self::from_raw(errno).expect("positive code is non-zero")
    }

    /// Returns the raw signed value.
    pub fn raw(self) -> i32 {
        self.0.get()
    }

    /// Returns the `DER_*` code if this is a storage-native error.
    pub fn der_code(self) -> Option<i32> {
        let raw = self.raw();
        // i32::MIN has no positive counterpart and is not a DER code.
        (raw < 0).then(|| raw.checked_neg()).flatten()
    }

    /// Returns the errno if the store reported one directly.
    pub fn passthrough_errno(self) -> Option<i32> {
        let raw = self.raw();
        (raw > 0).then_some(raw)
    }
}

impl Debug for NativeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "NativeStatus({self})")
    }
}

impl Display for NativeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.der_code() {
            Some(code) => match der::name(code) {
                Some(name) => write!(f, "-{name}({})", self.raw()),
                None => write!(f, "-DER_UNKNOWN({})", self.raw()),
            },
            None if self.raw() < 0 => write!(f, "-DER_UNKNOWN({})", self.raw()),
            None => write!(f, "errno({})", self.raw()),
        }
    }
}

impl TryFrom<i32> for NativeStatus {
    type Error = &'static str;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::from_raw(value).ok_or("native status cannot be zero")
    }
}

impl From<NativeStatus> for i32 {
    fn from(status: NativeStatus) -> Self {
        status.raw()
    }
}

/// Storage error codes, as positive values (reported negated).
pub mod der {
    const GURT_BASE: i32 = 1000;
    const DAOS_BASE: i32 = 2000;

    pub const NO_PERM: i32 = GURT_BASE + 1;
    pub const NO_HDL: i32 = GURT_BASE + 2;
    pub const INVAL: i32 = GURT_BASE + 3;
    pub const EXIST: i32 = GURT_BASE + 4;
    pub const NONEXIST: i32 = GURT_BASE + 5;
    pub const UNREACH: i32 = GURT_BASE + 6;
    pub const NOSPACE: i32 = GURT_BASE + 7;
    pub const ALREADY: i32 = GURT_BASE + 8;
    pub const NOMEM: i32 = GURT_BASE + 9;
    pub const NOSYS: i32 = GURT_BASE + 10;
    pub const TIMEDOUT: i32 = GURT_BASE + 11;
    pub const BUSY: i32 = GURT_BASE + 12;
    pub const AGAIN: i32 = GURT_BASE + 13;
    pub const PROTO: i32 = GURT_BASE + 14;
    pub const UNINIT: i32 = GURT_BASE + 15;
    pub const TRUNC: i32 = GURT_BASE + 16;
    pub const OVERFLOW: i32 = GURT_BASE + 17;
    pub const CANCELED: i32 = GURT_BASE + 18;
    pub const BADPATH: i32 = GURT_BASE + 26;
    pub const NOTDIR: i32 = GURT_BASE + 27;

    pub const IO: i32 = DAOS_BASE + 1;
    pub const FREE_MEM: i32 = DAOS_BASE + 2;
    pub const ENOENT: i32 = DAOS_BASE + 3;
    pub const NOTYPE: i32 = DAOS_BASE + 4;
    pub const NOSCHEMA: i32 = DAOS_BASE + 5;
    pub const NOLOCAL: i32 = DAOS_BASE + 6;
    pub const STALE: i32 = DAOS_BASE + 7;
    pub const EP_RO: i32 = DAOS_BASE + 10;
    pub const EP_OLD: i32 = DAOS_BASE + 11;
    pub const KEY2BIG: i32 = DAOS_BASE + 12;
    pub const REC2BIG: i32 = DAOS_BASE + 13;
    pub const IO_INVAL: i32 = DAOS_BASE + 14;
    pub const EQ_BUSY: i32 = DAOS_BASE + 15;

    /// Symbolic name of a known code, for logs.
    pub fn name(code: i32) -> Option<&'static str> {
        let name = match code {
            NO_PERM => "DER_NO_PERM",
            NO_HDL => "DER_NO_HDL",
            INVAL => "DER_INVAL",
            EXIST => "DER_EXIST",
            NONEXIST => "DER_NONEXIST",
            UNREACH => "DER_UNREACH",
            NOSPACE => "DER_NOSPACE",
            ALREADY => "DER_ALREADY",
            NOMEM => "DER_NOMEM",
            NOSYS => "DER_NOSYS",
            TIMEDOUT => "DER_TIMEDOUT",
            BUSY => "DER_BUSY",
            AGAIN => "DER_AGAIN",
            PROTO => "DER_PROTO",
            UNINIT => "DER_UNINIT",
            TRUNC => "DER_TRUNC",
            OVERFLOW => "DER_OVERFLOW",
            CANCELED => "DER_CANCELED",
            BADPATH => "DER_BADPATH",
            NOTDIR => "DER_NOTDIR",
            IO => "DER_IO",
            FREE_MEM => "DER_FREE_MEM",
            ENOENT => "DER_ENOENT",
            NOTYPE => "DER_NOTYPE",
            NOSCHEMA => "DER_NOSCHEMA",
            NOLOCAL => "DER_NOLOCAL",
            STALE => "DER_STALE",
            EP_RO => "DER_EP_RO",
            EP_OLD => "DER_EP_OLD",
            KEY2BIG => "DER_KEY2BIG",
            REC2BIG => "DER_REC2BIG",
            IO_INVAL => "DER_IO_INVAL",
            EQ_BUSY => "DER_EQ_BUSY",
            _ => return None,
        };
        Some(name)
    }
}
