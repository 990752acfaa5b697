//! Native status to errno translation.
//!
//! Total and side-effect free: every [`NativeStatus`] maps to exactly one
//! [`Errno`]. Positive statuses are errnos already and pass through;
//! storage codes without an entry become `EIO`.

use ioshim_types::{Errno, NativeStatus, der};

/// Maps a backing-store status into the POSIX error space.
pub fn translate(status: NativeStatus) -> Errno {
    if let Some(errno) = status.passthrough_errno() {
        return Errno::new(errno);
    }
    status.der_code().and_then(lookup).unwrap_or(Errno::EIO)
}

/// Returns `true` if `status` has an explicit mapping (or is an errno).
pub fn is_known(status: NativeStatus) -> bool {
    status.passthrough_errno().is_some() || status.der_code().and_then(lookup).is_some()
}

fn lookup(code: i32) -> Option<Errno> {
    let errno = match code {
        der::NO_PERM | der::EP_RO | der::EP_OLD => Errno::EPERM,
        der::ENOENT | der::NONEXIST => Errno::ENOENT,
        der::INVAL | der::NOTYPE | der::NOSCHEMA | der::NOLOCAL | der::NO_HDL | der::IO_INVAL => {
            Errno::EINVAL
        }
        der::KEY2BIG | der::REC2BIG => Errno::E2BIG,
        der::EXIST => Errno::EEXIST,
        der::UNREACH => Errno::EHOSTUNREACH,
        der::NOSPACE => Errno::ENOSPC,
        der::ALREADY => Errno::EALREADY,
        der::NOMEM => Errno::ENOMEM,
        der::TIMEDOUT => Errno::ETIMEDOUT,
        der::BUSY | der::EQ_BUSY => Errno::EBUSY,
        der::AGAIN => Errno::EAGAIN,
        der::PROTO => Errno::EPROTO,
        der::IO => Errno::EIO,
        der::CANCELED => Errno::ECANCELED,
        der::OVERFLOW => Errno::EOVERFLOW,
        der::BADPATH | der::NOTDIR => Errno::ENOTDIR,
        der::STALE => Errno::ESTALE,
        _ => return None,
    };
    Some(errno)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use test_case::test_case;

    #[test_case(der::NO_PERM, Errno::EPERM; "no perm")]
    #[test_case(der::EP_RO, Errno::EPERM; "read-only epoch")]
    #[test_case(der::NONEXIST, Errno::ENOENT; "nonexistent")]
    #[test_case(der::ENOENT, Errno::ENOENT; "enoent")]
    #[test_case(der::NO_HDL, Errno::EINVAL; "bad handle")]
    #[test_case(der::IO_INVAL, Errno::EINVAL; "invalid io")]
    #[test_case(der::REC2BIG, Errno::E2BIG; "record too big")]
    #[test_case(der::UNREACH, Errno::EHOSTUNREACH; "unreachable")]
    #[test_case(der::NOMEM, Errno::ENOMEM; "out of memory")]
    #[test_case(der::TIMEDOUT, Errno::ETIMEDOUT; "timed out")]
    #[test_case(der::EQ_BUSY, Errno::EBUSY; "queue busy")]
    #[test_case(der::AGAIN, Errno::EAGAIN; "again")]
    #[test_case(der::IO, Errno::EIO; "io")]
    #[test_case(der::CANCELED, Errno::ECANCELED; "canceled")]
    #[test_case(der::BADPATH, Errno::ENOTDIR; "bad path")]
    #[test_case(der::STALE, Errno::ESTALE; "stale")]
    fn known_codes(code: i32, expected: Errno) {
        let status = NativeStatus::der(code);
        assert_eq!(translate(status), expected);
        assert!(is_known(status));
    }

    #[test_case(der::NOSYS; "nosys has no entry")]
    #[test_case(der::TRUNC; "trunc has no entry")]
    #[test_case(9999; "unassigned code")]
    fn unknown_codes_are_eio(code: i32) {
        let status = NativeStatus::der(code);
        assert_eq!(translate(status), Errno::EIO);
        assert!(!is_known(status));
    }

    #[test]
    fn errno_passes_through() {
        assert_eq!(translate(NativeStatus::errno(Errno::EBADF.raw())), Errno::EBADF);
    }

    #[test]
    fn min_value_is_eio() {
        let status = NativeStatus::from_raw(i32::MIN).unwrap();
        assert_eq!(translate(status), Errno::EIO);
    }

    proptest! {
        /// Property: translation is total and always yields a positive errno
        #[test]
        fn prop_translate_total(raw in any::<i32>().prop_filter("non-zero", |r| *r != 0)) {
            let status = NativeStatus::from_raw(raw).unwrap();
            let errno = translate(status);
            prop_assert!(errno.raw() > 0);
            if raw > 0 {
                prop_assert_eq!(errno.raw(), raw);
            }
            if !is_known(status) {
                prop_assert_eq!(errno, Errno::EIO);
            }
        }
    }
}
