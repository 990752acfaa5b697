//! # ioshim FFI
//!
//! C-compatible entry points for the syscall interposition layer.
//!
//! The interposer resolves a file descriptor to an [`IoshimFile`] and calls
//! [`ioshim_pread`] or [`ioshim_preadv`] with the [`IoshimContext`] of the
//! session that owns it. Conventions:
//!
//! - Every read returns an [`IoshimReadResult`]: a status tag, and either a
//!   byte count or an errno. There are no out-parameters.
//! - NULL pointers where memory is required yield `EFAULT`
//! - Negative offsets and bad `iovcnt` values yield `EINVAL`
//! - Panics never unwind into C; they surface as `EIO`
//!
//! ## Memory Management
//!
//! - Contexts are built in Rust ([`IoshimContext::into_raw`]) and released
//!   with [`ioshim_context_free`]
//! - Buffers are always caller-owned
//!
//! ## Thread Safety
//!
//! A context may be shared by any number of threads; each call runs an
//! independent read.

use std::ffi::c_void;
use std::io::IoSliceMut;
use std::os::raw::c_int;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::slice;

use ioshim::{ReadContext, ReadError};
use ioshim_types::{ContainerHandle, Errno, FileEntry, ObjectHandle};

/// Largest `iovcnt` accepted by [`ioshim_preadv`] (Linux `IOV_MAX`).
pub const IOSHIM_IOV_MAX: c_int = 1024;

/// Outcome tag of a read.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoshimStatus {
    /// `bytes` holds the count read; `errno` is 0.
    IoshimOk = 0,
    /// `errno` holds the error; `bytes` is 0.
    IoshimErr = 1,
}

/// Result of [`ioshim_pread`] and [`ioshim_preadv`].
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IoshimReadResult {
    pub status: IoshimStatus,
    pub bytes: usize,
    pub errno: c_int,
}

impl IoshimReadResult {
    fn ok(bytes: usize) -> Self {
        Self {
            status: IoshimStatus::IoshimOk,
            bytes,
            errno: 0,
        }
    }

    fn err(errno: Errno) -> Self {
        Self {
            status: IoshimStatus::IoshimErr,
            bytes: 0,
            errno: errno.raw(),
        }
    }
}

impl From<Result<usize, ReadError>> for IoshimReadResult {
    fn from(result: Result<usize, ReadError>) -> Self {
        match result {
            Ok(n) => Self::ok(n),
            Err(e) => Self::err(e.errno()),
        }
    }
}

/// An open backing-store file, as tracked by the descriptor table.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IoshimFile {
    pub container: u64,
    pub object: u64,
}

impl From<IoshimFile> for FileEntry {
    fn from(file: IoshimFile) -> Self {
        FileEntry::new(
            ContainerHandle::new(file.container),
            ObjectHandle::new(file.object),
        )
    }
}

/// Opaque handle to a session's read context.
pub struct IoshimContext {
    ctx: ReadContext,
}

impl IoshimContext {
    /// Moves `ctx` to the heap for C callers.
    ///
    /// Release with [`ioshim_context_free`].
    pub fn into_raw(ctx: ReadContext) -> *mut IoshimContext {
        Box::into_raw(Box::new(Self { ctx }))
    }
}

fn guarded(f: impl FnOnce() -> IoshimReadResult) -> IoshimReadResult {
    catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|_| {
        tracing::error!("panic in read path");
        IoshimReadResult::err(Errno::EIO)
    })
}

fn checked_offset(offset: libc::off_t) -> Result<u64, Errno> {
    u64::try_from(offset).map_err(|_| Errno::EINVAL)
}

/// Positional read into one buffer (`pread`).
///
/// # Safety
/// - `ctx` must come from [`IoshimContext::into_raw`] and not be freed
/// - `buf` must be valid for writes of `len` bytes (may be NULL if `len` is 0)
#[unsafe(no_mangle)]
pub unsafe extern "C" fn ioshim_pread(
    ctx: *const IoshimContext,
    file: IoshimFile,
    buf: *mut c_void,
    len: usize,
    offset: libc::off_t,
) -> IoshimReadResult {
    if ctx.is_null() || (buf.is_null() && len > 0) {
        return IoshimReadResult::err(Errno::EFAULT);
    }
    let offset = match checked_offset(offset) {
        Ok(offset) => offset,
        Err(errno) => return IoshimReadResult::err(errno),
    };

    // SAFETY: non-null, and the caller guarantees it is a live context.
    let ctx = unsafe { &(*ctx).ctx };
    let buf: &mut [u8] = if len == 0 {
        &mut []
    } else {
        // SAFETY: the caller guarantees `buf` is writable for `len` bytes.
        unsafe { slice::from_raw_parts_mut(buf.cast::<u8>(), len) }
    };

    guarded(|| ctx.read_one(buf, offset, &file.into()).into())
}

/// Positional read into several buffers (`preadv`).
///
/// # Safety
/// - `ctx` must come from [`IoshimContext::into_raw`] and not be freed
/// - `iov` must point to `iovcnt` valid `iovec`s (may be NULL if `iovcnt` is 0)
/// - each `iov_base` must be valid for writes of `iov_len` bytes
#[unsafe(no_mangle)]
pub unsafe extern "C" fn ioshim_preadv(
    ctx: *const IoshimContext,
    file: IoshimFile,
    iov: *const libc::iovec,
    iovcnt: c_int,
    offset: libc::off_t,
) -> IoshimReadResult {
    if !(0..=IOSHIM_IOV_MAX).contains(&iovcnt) {
        return IoshimReadResult::err(Errno::EINVAL);
    }
    if ctx.is_null() || (iov.is_null() && iovcnt > 0) {
        return IoshimReadResult::err(Errno::EFAULT);
    }
    let offset = match checked_offset(offset) {
        Ok(offset) => offset,
        Err(errno) => return IoshimReadResult::err(errno),
    };

    // SAFETY: non-null, and the caller guarantees it is a live context.
    let ctx = unsafe { &(*ctx).ctx };
    let iovs: &[libc::iovec] = if iovcnt == 0 {
        &[]
    } else {
        // SAFETY: the caller guarantees `iovcnt` readable entries.
        unsafe { slice::from_raw_parts(iov, iovcnt as usize) }
    };

    let mut bufs = Vec::with_capacity(iovs.len());
    for v in iovs {
        if v.iov_len == 0 {
            bufs.push(IoSliceMut::new(&mut []));
        } else if v.iov_base.is_null() {
            return IoshimReadResult::err(Errno::EFAULT);
        } else {
            // SAFETY: the caller guarantees each base is writable for its length.
            let buf = unsafe { slice::from_raw_parts_mut(v.iov_base.cast::<u8>(), v.iov_len) };
            bufs.push(IoSliceMut::new(buf));
        }
    }

    guarded(|| ctx.read_vectored(&mut bufs, offset, &file.into()).into())
}

/// Releases a context.
///
/// # Safety
/// - `ctx` must come from [`IoshimContext::into_raw`] and not be used afterwards
#[unsafe(no_mangle)]
pub unsafe extern "C" fn ioshim_context_free(ctx: *mut IoshimContext) {
    if ctx.is_null() {
        return;
    }
    // SAFETY: produced by `Box::into_raw` in `IoshimContext::into_raw`.
    drop(unsafe { Box::from_raw(ctx) });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ptr;
    use std::sync::Arc;

    use ioshim_io::{Fault, FaultSite, MemStore, QueuePool};
    use ioshim_types::{NativeStatus, der};

    fn setup(data: Vec<u8>) -> (Arc<MemStore>, IoshimFile, *mut IoshimContext) {
        let store = Arc::new(MemStore::new());
        let entry = store.insert(data);
        let pool = QueuePool::new(vec![store.create_queue()]);
        let ctx = IoshimContext::into_raw(ReadContext::new(store.clone(), Arc::new(pool)));
        let file = IoshimFile {
            container: entry.container.into(),
            object: entry.object.into(),
        };
        (store, file, ctx)
    }

    #[test]
    fn test_pread() {
        let (_store, file, ctx) = setup((0..=255).collect());
        let mut buf = [0u8; 16];

        unsafe {
            let res = ioshim_pread(ctx, file, buf.as_mut_ptr().cast(), buf.len(), 250);
            assert_eq!(res, IoshimReadResult::ok(6));
            assert_eq!(&buf[..6], &[250, 251, 252, 253, 254, 255]);

            let res = ioshim_pread(ctx, file, buf.as_mut_ptr().cast(), buf.len(), 256);
            assert_eq!(res, IoshimReadResult::ok(0));

            ioshim_context_free(ctx);
        }
    }

    #[test]
    fn test_pread_argument_errors() {
        let (_store, file, ctx) = setup(vec![0u8; 8]);
        let mut buf = [0u8; 4];

        unsafe {
            let res = ioshim_pread(ptr::null(), file, buf.as_mut_ptr().cast(), 4, 0);
            assert_eq!(res.errno, libc::EFAULT);

            let res = ioshim_pread(ctx, file, ptr::null_mut(), 4, 0);
            assert_eq!(res.status, IoshimStatus::IoshimErr);
            assert_eq!(res.errno, libc::EFAULT);

            let res = ioshim_pread(ctx, file, ptr::null_mut(), 0, 0);
            assert_eq!(res, IoshimReadResult::ok(0));

            let res = ioshim_pread(ctx, file, buf.as_mut_ptr().cast(), 4, -1);
            assert_eq!(res.errno, libc::EINVAL);

            ioshim_context_free(ctx);
        }
    }

    #[test]
    fn test_preadv_short_and_error() {
        let (store, file, ctx) = setup(vec![9u8; 250]);
        let mut a = [0u8; 100];
        let mut b = [0u8; 100];
        let mut c = [0u8; 100];
        let iov = [
            libc::iovec {
                iov_base: a.as_mut_ptr().cast(),
                iov_len: a.len(),
            },
            libc::iovec {
                iov_base: b.as_mut_ptr().cast(),
                iov_len: b.len(),
            },
            libc::iovec {
                iov_base: c.as_mut_ptr().cast(),
                iov_len: c.len(),
            },
        ];

        unsafe {
            let res = ioshim_preadv(ctx, file, iov.as_ptr(), 3, 0);
            assert_eq!(res, IoshimReadResult::ok(250));

            store.inject(
                Fault::new(FaultSite::Transfer, NativeStatus::der(der::IO)).at_offset(100),
            );
            let res = ioshim_preadv(ctx, file, iov.as_ptr(), 3, 0);
            assert_eq!(
                res,
                IoshimReadResult {
                    status: IoshimStatus::IoshimErr,
                    bytes: 0,
                    errno: libc::EIO,
                }
            );

            ioshim_context_free(ctx);
        }
    }

    #[test]
    fn test_preadv_argument_errors() {
        let (_store, file, ctx) = setup(vec![0u8; 8]);

        unsafe {
            assert_eq!(
                ioshim_preadv(ctx, file, ptr::null(), -1, 0).errno,
                libc::EINVAL
            );
            assert_eq!(
                ioshim_preadv(ctx, file, ptr::null(), IOSHIM_IOV_MAX + 1, 0).errno,
                libc::EINVAL
            );
            assert_eq!(
                ioshim_preadv(ctx, file, ptr::null(), 1, 0).errno,
                libc::EFAULT
            );
            assert_eq!(
                ioshim_preadv(ctx, file, ptr::null(), 0, 0),
                IoshimReadResult::ok(0)
            );

            let iov = [libc::iovec {
                iov_base: ptr::null_mut(),
                iov_len: 4,
            }];
            assert_eq!(
                ioshim_preadv(ctx, file, iov.as_ptr(), 1, 0).errno,
                libc::EFAULT
            );

            ioshim_context_free(ctx);
        }
    }

    #[test]
    fn test_context_free_null_is_noop() {
        unsafe { ioshim_context_free(ptr::null_mut()) };
    }
}
