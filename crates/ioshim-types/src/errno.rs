//! POSIX error codes surfaced to intercepted callers.

use std::fmt::{Debug, Display};

use serde::{Deserialize, Serialize};

/// A positive POSIX `errno` value.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Errno(i32);

impl Errno {
    pub const EPERM: Errno = Errno(libc::EPERM);
    pub const ENOENT: Errno = Errno(libc::ENOENT);
    pub const EIO: Errno = Errno(libc::EIO);
    pub const E2BIG: Errno = Errno(libc::E2BIG);
    pub const EBADF: Errno = Errno(libc::EBADF);
    pub const EAGAIN: Errno = Errno(libc::EAGAIN);
    pub const ENOMEM: Errno = Errno(libc::ENOMEM);
    pub const EFAULT: Errno = Errno(libc::EFAULT);
    pub const EBUSY: Errno = Errno(libc::EBUSY);
    pub const EEXIST: Errno = Errno(libc::EEXIST);
    pub const ENOTDIR: Errno = Errno(libc::ENOTDIR);
    pub const EINVAL: Errno = Errno(libc::EINVAL);
    pub const ENOSPC: Errno = Errno(libc::ENOSPC);
    pub const ENOSYS: Errno = Errno(libc::ENOSYS);
    pub const EPROTO: Errno = Errno(libc::EPROTO);
    pub const EOVERFLOW: Errno = Errno(libc::EOVERFLOW);
    pub const ETIMEDOUT: Errno = Errno(libc::ETIMEDOUT);
    pub const EHOSTUNREACH: Errno = Errno(libc::EHOSTUNREACH);
    pub const EALREADY: Errno = Errno(libc::EALREADY);
    pub const ESTALE: Errno = Errno(libc::ESTALE);
    pub const ECANCELED: Errno = Errno(libc::ECANCELED);

    /// Wraps a raw errno.
    ///
    /// # Panics
    ///
    /// Panics if `code` is not positive.
    pub fn new(code: i32) -> Self {
        assert!(code > 0, "errno must be positive, got {code}");
        Self(code)
    }

    pub fn raw(self) -> i32 {
        self.0
    }

    /// Converts into a `std::io::Error` carrying the same OS code.
    pub fn to_io_error(self) -> std::io::Error {
        std::io::Error::from_raw_os_error(self.0)
    }
}

impl Debug for Errno {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Errno({})", self.0)
    }
}

impl Display for Errno {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_io_error())
    }
}

impl From<Errno> for i32 {
    fn from(errno: Errno) -> Self {
        errno.0
    }
}

impl From<Errno> for std::io::Error {
    fn from(errno: Errno) -> Self {
        errno.to_io_error()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_keeps_code() {
        let err: std::io::Error = Errno::ENOENT.into();
        assert_eq!(err.raw_os_error(), Some(libc::ENOENT));
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }

    #[test]
    fn display_includes_os_code() {
        assert!(Errno::EIO.to_string().contains("os error 5"));
    }

    #[test]
    #[should_panic(expected = "errno must be positive")]
    fn zero_errno_rejected() {
        let _ = Errno::new(0);
    }
}
