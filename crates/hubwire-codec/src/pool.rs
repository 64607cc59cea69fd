use std::ops::{Deref, DerefMut};
use std::sync::{Mutex, OnceLock, PoisonError};

use bytes::BytesMut;
use tracing::trace;

use crate::writer::MessageWriter;

/// Default number of idle buffers kept by a pool.
pub const DEFAULT_MAX_POOLED: usize = 64;

/// Default capacity of a freshly created buffer.
pub const DEFAULT_INITIAL_CAPACITY: usize = 256;

/// Default capacity above which a returned buffer is dropped instead of kept.
pub const DEFAULT_MAX_RETAINED_CAPACITY: usize = 64 * 1024;

/// Configuration for a [`BufferPool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    /// Maximum number of idle buffers kept for reuse.
    pub max_pooled: usize,
    /// Capacity reserved when the pool has to allocate a new buffer.
    pub initial_capacity: usize,
    /// Buffers that grew beyond this are released to the allocator.
    pub max_retained_capacity: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_pooled: DEFAULT_MAX_POOLED,
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            max_retained_capacity: DEFAULT_MAX_RETAINED_CAPACITY,
        }
    }
}

/// Thread-safe free list of output buffers.
///
/// Buffers leave the pool through [`BufferPool::acquire`] and come back when
/// the returned [`PooledWriter`] is dropped, on every exit path.
#[derive(Debug)]
pub struct BufferPool {
    free: Mutex<Vec<BytesMut>>,
    config: PoolConfig,
}

impl BufferPool {
    /// Create an empty pool with default configuration.
    pub fn new() -> Self {
        Self::with_config(PoolConfig::default())
    }

    /// Create an empty pool with explicit configuration.
    pub fn with_config(config: PoolConfig) -> Self {
        Self {
            free: Mutex::new(Vec::with_capacity(config.max_pooled)),
            config,
        }
    }

    /// The process-wide pool used by the frame encoders.
    pub fn global() -> &'static BufferPool {
        static GLOBAL: OnceLock<BufferPool> = OnceLock::new();
        GLOBAL.get_or_init(BufferPool::new)
    }

    /// Take an empty writer, reusing an idle buffer when one is available.
    pub fn acquire(&self) -> PooledWriter<'_> {
        let buf = self
            .lock()
            .pop()
            .unwrap_or_else(|| BytesMut::with_capacity(self.config.initial_capacity));
        PooledWriter {
            writer: MessageWriter::from_buffer(buf),
            pool: self,
        }
    }

    /// Number of idle buffers currently held.
    pub fn idle(&self) -> usize {
        self.lock().len()
    }

    /// Current pool configuration.
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    fn release(&self, mut buf: BytesMut) {
        if buf.capacity() > self.config.max_retained_capacity {
            trace!(capacity = buf.capacity(), "dropping oversized pooled buffer");
            return;
        }
        buf.clear();

        let mut free = self.lock();
        if free.len() >= self.config.max_pooled {
            trace!(idle = free.len(), "pool full, dropping buffer");
            return;
        }
        free.push(buf);
    }

    // A panic while holding the lock cannot leave the free list inconsistent.
    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<BytesMut>> {
        self.free.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new()
    }
}

/// A [`MessageWriter`] on loan from a [`BufferPool`].
///
/// Dropping it clears the buffer and hands it back to the pool.
#[derive(Debug)]
pub struct PooledWriter<'a> {
    writer: MessageWriter,
    pool: &'a BufferPool,
}

impl PooledWriter<'_> {
    /// Copy the written bytes out. The buffer itself stays with the pool.
    pub fn to_owned_bytes(&self) -> Vec<u8> {
        self.as_slice().to_vec()
    }
}

impl Deref for PooledWriter<'_> {
    type Target = MessageWriter;

    fn deref(&self) -> &MessageWriter {
        &self.writer
    }
}

impl DerefMut for PooledWriter<'_> {
    fn deref_mut(&mut self) -> &mut MessageWriter {
        &mut self.writer
    }
}

impl Drop for PooledWriter<'_> {
    fn drop(&mut self) {
        let writer = std::mem::take(&mut self.writer);
        self.pool.release(writer.into_buffer());
    }
}

/// Take a writer from the process-wide pool.
pub fn acquire() -> PooledWriter<'static> {
    BufferPool::global().acquire()
}
