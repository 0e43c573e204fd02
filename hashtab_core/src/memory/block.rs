//! Fixed-size I/O blocks and their RAII guard

use super::BlockPool;
use std::fmt;
use std::sync::Arc;

/// A zero-initialized buffer of the pool's block size
///
/// A bare `Block` carries no release obligation; it only moves between the
/// allocator, the retry queue and a [`BlockGuard`].
pub struct Block {
    data: Box<[u8]>,
}

impl Block {
    pub(crate) fn zeroed(size: usize) -> Self {
        Self {
            data: vec![0u8; size].into_boxed_slice(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }
}

/// Exclusive ownership of one block, released to its pool on drop
///
/// While a block is being hashed it is shared read-only as `Arc<BlockGuard>`;
/// whoever drops the last reference returns it.
pub struct BlockGuard {
    block: Option<Block>,
    filled: usize,
    pool: Arc<BlockPool>,
}

impl BlockGuard {
    pub(crate) fn new(block: Block, pool: Arc<BlockPool>) -> Self {
        Self {
            block: Some(block),
            filled: 0,
            pool,
        }
    }

    /// Bytes of valid data, as set by the last read
    pub fn data(&self) -> &[u8] {
        match &self.block {
            Some(block) => &block.data[..self.filled],
            None => &[],
        }
    }

    /// Writable prefix of `len` bytes for the next read
    ///
    /// Resets the filled length; call [`set_filled`](Self::set_filled) once
    /// the read completes.
    pub fn buffer_mut(&mut self, len: usize) -> &mut [u8] {
        self.filled = 0;
        match &mut self.block {
            Some(block) => {
                let len = len.min(block.data.len());
                &mut block.data[..len]
            }
            None => &mut [],
        }
    }

    /// Record how many bytes of the buffer hold data
    pub fn set_filled(&mut self, filled: usize) {
        self.filled = filled.min(self.capacity());
    }

    pub fn capacity(&self) -> usize {
        self.block.as_ref().map_or(0, Block::capacity)
    }

    /// Take the block out without releasing it
    pub(crate) fn into_block(mut self) -> Option<Block> {
        self.block.take()
    }
}

impl fmt::Debug for BlockGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockGuard")
            .field("capacity", &self.capacity())
            .field("filled", &self.filled)
            .finish()
    }
}

impl Drop for BlockGuard {
    fn drop(&mut self) {
        if let Some(block) = self.block.take() {
            self.pool.release(block);
        }
    }
}
