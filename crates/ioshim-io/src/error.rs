//! I/O error types.

use std::path::PathBuf;

use ioshim_types::ObjectHandle;

/// Errors from managing backing-store objects (not from reads, which report
/// [`ioshim_types::NativeStatus`]).
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// Underlying OS I/O error.
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// File not found.
    #[error("file not found: {path}")]
    NotFound { path: PathBuf },

    /// The object is not open in this store.
    #[error("unknown object: {object}")]
    UnknownObject { object: ObjectHandle },
}
