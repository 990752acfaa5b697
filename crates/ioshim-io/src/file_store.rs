//! Backing store over local files using `std::fs`.
//!
//! Useful for running the read path against real data without a storage
//! cluster. The queue path is emulated: the transfer runs at submission and
//! the event reports it on the first poll.

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

use ioshim_types::{
    ContainerHandle, EventId, FileEntry, NativeStatus, ObjectHandle, QueueHandle, der,
};

use crate::IoError;
use crate::backend::{BackingStore, EventPoll, InFlight};
use crate::events::EventTable;

/// Backing store serving reads from open local files.
#[derive(Debug)]
pub struct FileStore {
    container: ContainerHandle,
    files: RwLock<HashMap<ObjectHandle, File>>,
    next_object: AtomicU64,
    events: EventTable,
}

impl FileStore {
    pub fn new() -> Self {
        Self {
            container: ContainerHandle::new(1),
            files: RwLock::new(HashMap::new()),
            next_object: AtomicU64::new(1),
            events: EventTable::new(),
        }
    }

    /// Opens a file read-only and returns its entry.
    pub fn open(&self, path: &Path) -> Result<FileEntry, IoError> {
        let file = File::open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => IoError::NotFound {
                path: path.to_path_buf(),
            },
            _ => IoError::Io { source: e },
        })?;

        let object = ObjectHandle::new(self.next_object.fetch_add(1, Ordering::Relaxed));
        self.files
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(object, file);

        tracing::debug!(path = %path.display(), object = %object, "opened local file");
        Ok(FileEntry::new(self.container, object))
    }

    /// Closes a file opened with [`FileStore::open`].
    pub fn close(&self, file: FileEntry) -> Result<(), IoError> {
        self.files
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&file.object)
            .map(drop)
            .ok_or(IoError::UnknownObject {
                object: file.object,
            })
    }

    pub fn create_queue(&self) -> QueueHandle {
        self.events.create_queue()
    }

    pub fn destroy_queue(&self, queue: QueueHandle) -> Result<(), NativeStatus> {
        self.events.destroy_queue(queue)
    }

    /// Events created and not yet destroyed.
    pub fn live_events(&self) -> usize {
        self.events.live_events()
    }

    fn transfer(
        &self,
        file: &FileEntry,
        buf: &mut [u8],
        offset: u64,
    ) -> Result<usize, NativeStatus> {
        if file.container != self.container {
            return Err(NativeStatus::der(der::NO_HDL));
        }
        let files = self.files.read().unwrap_or_else(PoisonError::into_inner);
        let handle = files
            .get(&file.object)
            .ok_or_else(|| NativeStatus::der(der::NO_HDL))?;
        read_full_at(handle, buf, offset).map_err(|e| native_status(&e))
    }
}

impl Default for FileStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Reads until `buf` is full or the file ends, so a short count always
/// means end-of-file.
fn read_full_at(file: &File, buf: &mut [u8], offset: u64) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        let pos = offset.saturating_add(filled as u64);
        match positional_read(file, &mut buf[filled..], pos) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

fn positional_read(file: &File, buf: &mut [u8], offset: u64) -> std::io::Result<usize> {
    // Use pread on Unix for positional read without seeking
    #[cfg(unix)]
    {
        use std::os::unix::fs::FileExt;
        file.read_at(buf, offset)
    }

    #[cfg(not(unix))]
    {
        use std::os::windows::fs::FileExt;
        file.seek_read(buf, offset)
    }
}

/// OS errors are reported as errnos, the way the storage file API does.
fn native_status(err: &std::io::Error) -> NativeStatus {
    err.raw_os_error()
        .and_then(NativeStatus::from_raw)
        .filter(|status| status.passthrough_errno().is_some())
        .unwrap_or_else(|| NativeStatus::der(der::IO))
}

impl BackingStore for FileStore {
    fn blocking_read(
        &self,
        file: &FileEntry,
        buf: &mut [u8],
        offset: u64,
    ) -> Result<usize, NativeStatus> {
        self.transfer(file, buf, offset)
    }

    fn event_create(&self, queue: QueueHandle) -> Result<EventId, NativeStatus> {
        self.events.create_event(queue)
    }

    fn submit_read<'buf>(
        &self,
        file: &FileEntry,
        buf: &'buf mut [u8],
        offset: u64,
        event: &EventId,
    ) -> Result<InFlight<'buf>, NativeStatus> {
        let result = self.transfer(file, buf, offset);
        self.events.arm(event, result, 0)?;
        Ok(InFlight::new(event, buf))
    }

    fn event_poll(&self, in_flight: &InFlight<'_>) -> Result<EventPoll, NativeStatus> {
        self.events.poll(in_flight.event())
    }

    fn event_destroy(&self, event: EventId) {
        self.events.destroy(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_store_read_at() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test_read_at.dat");
        std::fs::write(&path, b"0123456789").unwrap();

        let store = FileStore::new();
        let file = store.open(&path).unwrap();

        let mut buf = [0u8; 5];
        assert_eq!(store.blocking_read(&file, &mut buf, 3), Ok(5));
        assert_eq!(&buf, b"34567");

        // Near the end: short read
        assert_eq!(store.blocking_read(&file, &mut buf, 8), Ok(2));
        assert_eq!(&buf[..2], b"89");

        store.close(file).unwrap();
    }

    #[test]
    fn open_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new();
        let err = store.open(&dir.path().join("missing")).unwrap_err();
        assert!(matches!(err, IoError::NotFound { .. }));
    }

    #[test]
    fn closed_file_reads_fail() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("closed.dat");
        std::fs::write(&path, b"data").unwrap();

        let store = FileStore::new();
        let file = store.open(&path).unwrap();
        store.close(file).unwrap();

        let mut buf = [0u8; 4];
        assert_eq!(
            store.blocking_read(&file, &mut buf, 0),
            Err(NativeStatus::der(der::NO_HDL))
        );
        assert!(matches!(
            store.close(file),
            Err(IoError::UnknownObject { .. })
        ));
    }

    #[test]
    fn os_errors_pass_through_as_errno() {
        let err = std::io::Error::from_raw_os_error(libc::EISDIR);
        assert_eq!(native_status(&err), NativeStatus::errno(libc::EISDIR));

        let err = std::io::Error::other("no os code");
        assert_eq!(native_status(&err), NativeStatus::der(der::IO));
    }
}
