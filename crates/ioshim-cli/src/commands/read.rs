//! Read commands.

use std::io::IoSliceMut;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use ioshim::ReadContext;
use ioshim_config::ShimConfig;
use ioshim_io::{FileStore, QueuePool};
use ioshim_types::{FileEntry, QueueHandle};

/// A file opened on a local store, with the queues created for it.
///
/// Queues and the object are released on drop.
struct Session {
    store: Arc<FileStore>,
    file: FileEntry,
    queues: Vec<QueueHandle>,
    ctx: ReadContext,
}

impl Session {
    fn open(config: &ShimConfig, path: &Path, blocking: bool) -> Result<Self> {
        let store = Arc::new(FileStore::new());
        let file = store
            .open(path)
            .with_context(|| format!("Failed to open {}", path.display()))?;

        let (queues, ctx) = if blocking || !config.queues_enabled() {
            (Vec::new(), ReadContext::blocking(store.clone()))
        } else {
            let queues: Vec<QueueHandle> =
                (0..config.queues.max_eq).map(|_| store.create_queue()).collect();
            let pool = QueuePool::new(queues.clone());
            let ctx = ReadContext::new(store.clone(), Arc::new(pool))
                .with_poll_mode(config.poll.poll_mode());
            (queues, ctx)
        };
        tracing::debug!(%file, queues = queues.len(), "session opened");

        Ok(Self {
            store,
            file,
            queues,
            ctx,
        })
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        for queue in self.queues.drain(..) {
            if let Err(status) = self.store.destroy_queue(queue) {
                tracing::warn!(%queue, %status, "failed to destroy queue");
            }
        }
        if let Err(e) = self.store.close(self.file) {
            tracing::warn!(file = %self.file, error = %e, "failed to close file");
        }
    }
}

/// Read one buffer and report the byte count.
pub fn read(
    config: &ShimConfig,
    path: &Path,
    offset: u64,
    len: usize,
    blocking: bool,
    hex: bool,
) -> Result<()> {
    let session = Session::open(config, path, blocking)?;
    let mut buf = vec![0u8; len];

    let n = match session.ctx.read_one(&mut buf, offset, &session.file) {
        Ok(n) => n,
        Err(e) => bail!("read of {} failed: {e} (errno {})", path.display(), e.errno().raw()),
    };

    println!("read {n} bytes at offset {offset}");
    if hex {
        print!("{}", hex_dump(&buf[..n], offset));
    }
    Ok(())
}

/// Read into several buffers and report how each was filled.
pub fn readv(
    config: &ShimConfig,
    path: &Path,
    sizes: &[usize],
    offset: u64,
    blocking: bool,
) -> Result<()> {
    let session = Session::open(config, path, blocking)?;
    let mut storage: Vec<Vec<u8>> = sizes.iter().map(|&size| vec![0u8; size]).collect();
    let mut bufs: Vec<IoSliceMut<'_>> = storage
        .iter_mut()
        .map(|buf| IoSliceMut::new(buf.as_mut_slice()))
        .collect();

    let n = match session.ctx.read_vectored(&mut bufs, offset, &session.file) {
        Ok(n) => n,
        Err(e) => bail!("readv of {} failed: {e} (errno {})", path.display(), e.errno().raw()),
    };

    println!("read {n} bytes into {} buffers at offset {offset}", sizes.len());
    for (i, filled) in fill_counts(sizes, n).into_iter().enumerate() {
        println!("  [{i}] {filled}/{}", sizes[i]);
    }
    Ok(())
}

/// Bytes landing in each buffer when `total` bytes are read in order.
fn fill_counts(sizes: &[usize], total: usize) -> Vec<usize> {
    let mut remaining = total;
    sizes
        .iter()
        .map(|&size| {
            let filled = size.min(remaining);
            remaining -= filled;
            filled
        })
        .collect()
}

/// 16 bytes per line, prefixed with the file offset.
fn hex_dump(data: &[u8], base: u64) -> String {
    let mut out = String::new();
    for (line, chunk) in data.chunks(16).enumerate() {
        let addr = base + (line as u64) * 16;
        let bytes: Vec<String> = chunk.iter().map(|b| format!("{b:02x}")).collect();
        out.push_str(&format!("{addr:08x}  {}\n", bytes.join(" ")));
    }
    out
}
