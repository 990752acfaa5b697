//! Vectored reads as a sequence of single-buffer reads.

use std::io::IoSliceMut;

use ioshim_types::FileEntry;

use crate::{ReadContext, ReadError, read::read_one};

/// Reads into `bufs` in order starting at `offset`, POSIX `preadv` style.
///
/// Buffers are read strictly one after another; each starts where the
/// previous one's bytes ended, not where its requested length would have
/// ended. Iteration stops at the first read that returns `0`.
///
/// A failure on any buffer is returned as is: bytes already read into
/// earlier buffers are not reported. Some `preadv` implementations report
/// the partial count instead.
pub fn read_vectored(
    ctx: &ReadContext,
    bufs: &mut [IoSliceMut<'_>],
    offset: u64,
    file: &FileEntry,
) -> Result<usize, ReadError> {
    let mut position = offset;
    let mut total: usize = 0;

    for (index, buf) in bufs.iter_mut().enumerate() {
        let n = read_one(ctx, buf, position, file).inspect_err(|_| {
            tracing::debug!(file = %file, index, discarded = total, "vectored read aborted");
        })?;

        if n == 0 {
            break;
        }
        total += n;
        position = position.saturating_add(n as u64);
    }

    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use ioshim_io::MemStore;

    #[test]
    fn empty_vector_reads_nothing() {
        let store = Arc::new(MemStore::new());
        let file = store.insert(vec![1u8; 16]);
        let ctx = ReadContext::blocking(store.clone());

        assert_eq!(read_vectored(&ctx, &mut [], 0, &file), Ok(0));
        assert_eq!(store.reads_issued(), 0);
    }

    #[test]
    fn zero_length_buffer_ends_vector() {
        let store = Arc::new(MemStore::new());
        let file = store.insert(vec![1u8; 16]);
        let ctx = ReadContext::blocking(store.clone());

        let mut a = [0u8; 4];
        let mut empty = [0u8; 0];
        let mut c = [0u8; 4];
        let mut bufs = [
            IoSliceMut::new(&mut a),
            IoSliceMut::new(&mut empty),
            IoSliceMut::new(&mut c),
        ];

        assert_eq!(read_vectored(&ctx, &mut bufs, 0, &file), Ok(4));
        assert_eq!(store.reads_issued(), 1);
    }
}
