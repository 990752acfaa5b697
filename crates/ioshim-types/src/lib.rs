//! # ioshim-types: Core types for `ioshim`
//!
//! This crate contains shared types used across the read path:
//! - Backing-store handles ([`ContainerHandle`], [`ObjectHandle`], [`QueueHandle`], [`EventId`])
//! - The open-file context consumed by reads ([`FileEntry`])
//! - Status spaces ([`NativeStatus`] from the storage stack, [`Errno`] for callers)

use std::fmt::Display;

use serde::{Deserialize, Serialize};

mod errno;
mod status;

pub use errno::Errno;
pub use status::{NativeStatus, der};

// ============================================================================
// Backing-store handles - All Copy (cheap 8-byte values)
// ============================================================================

/// Handle to an open container (the session-side context reads are issued in).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ContainerHandle(u64);

impl ContainerHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

impl Display for ContainerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "cont:{:#x}", self.0)
    }
}

impl From<u64> for ContainerHandle {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<ContainerHandle> for u64 {
    fn from(handle: ContainerHandle) -> Self {
        handle.0
    }
}

/// Handle to an open file object inside a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectHandle(u64);

impl ObjectHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

impl Display for ObjectHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "obj:{:#x}", self.0)
    }
}

impl From<u64> for ObjectHandle {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<ObjectHandle> for u64 {
    fn from(handle: ObjectHandle) -> Self {
        handle.0
    }
}

/// Handle to a completion queue owned by the surrounding session.
///
/// The read path never creates or destroys queues; it only binds
/// per-call events to one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct QueueHandle(u64);

impl QueueHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

impl Display for QueueHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "eq:{:#x}", self.0)
    }
}

impl From<u64> for QueueHandle {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<QueueHandle> for u64 {
    fn from(handle: QueueHandle) -> Self {
        handle.0
    }
}

/// Identifier of one asynchronous event, unique within its backing store.
///
/// Not `Copy`: an event is owned by exactly one read
/// invocation and handed back to the store when that invocation ends.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct EventId(u64);

impl EventId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ev:{}", self.0)
    }
}

// ============================================================================
// File entry
// ============================================================================

/// An already-open backing-store file plus the container it lives in.
///
/// Owned by the descriptor table of the interception layer; reads only
/// ever borrow it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileEntry {
    pub container: ContainerHandle,
    pub object: ObjectHandle,
}

impl FileEntry {
    pub fn new(container: ContainerHandle, object: ObjectHandle) -> Self {
        Self { container, object }
    }
}

impl Display for FileEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.container, self.object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_roundtrip_through_u64() {
        assert_eq!(u64::from(ObjectHandle::from(42)), 42);
        assert_eq!(u64::from(ContainerHandle::from(7)), 7);
        assert_eq!(u64::from(QueueHandle::from(3)), 3);
    }

    #[test]
    fn file_entry_display() {
        let entry = FileEntry::new(ContainerHandle::new(1), ObjectHandle::new(0xff));
        assert_eq!(entry.to_string(), "cont:0x1/obj:0xff");
    }

    #[test]
    fn file_entry_serializes() {
        let entry = FileEntry::new(ContainerHandle::new(1), ObjectHandle::new(2));
        let json = serde_json::to_string(&entry).unwrap();
        let back: FileEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(back, entry);
    }
}
