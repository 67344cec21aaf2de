//! Reusable block buffers and hash-table slabs.
//!
//! The frame engine churns through large allocations at a high rate: one
//! staging buffer and one compressed buffer per data block, plus a 64K-entry
//! hash table per encoder invocation. Four pools (one per frame block size)
//! and a hash-table pool amortize those allocations across blocks, writers,
//! and readers.
//!
//! Discipline:
//! - block buffers are handed out and returned with `len == capacity`;
//! - hash-table slabs are zeroed when acquired, never when returned, so the
//!   cost is only paid for slabs that are actually reused (a stale slot would
//!   otherwise be read back as a valid match position).

use std::sync::Mutex;

use crate::block::types::HT_SIZE;

struct BufferPool {
    capacity: usize,
    free: Mutex<Vec<Vec<u8>>>,
}

impl BufferPool {
    const fn new(capacity: usize) -> Self {
        BufferPool {
            capacity,
            free: Mutex::new(Vec::new()),
        }
    }

    fn get(&self) -> Vec<u8> {
        let recycled = self.free.lock().unwrap().pop();
        match recycled {
            Some(buf) => {
                debug_assert_eq!(buf.len(), self.capacity);
                buf
            }
            None => vec![0u8; self.capacity],
        }
    }

    fn put(&self, mut buf: Vec<u8>) {
        if buf.capacity() < self.capacity {
            // Not one of ours; let it drop.
            return;
        }
        // Restore the full length before the buffer is handed out again.
        buf.resize(self.capacity, 0);
        self.free.lock().unwrap().push(buf);
    }
}

static BLOCK_64K: BufferPool = BufferPool::new(64 * 1024);
static BLOCK_256K: BufferPool = BufferPool::new(256 * 1024);
static BLOCK_1M: BufferPool = BufferPool::new(1024 * 1024);
static BLOCK_4M: BufferPool = BufferPool::new(4 * 1024 * 1024);

fn pool_for(size: usize) -> Option<&'static BufferPool> {
    match size {
        s if s == BLOCK_64K.capacity => Some(&BLOCK_64K),
        s if s == BLOCK_256K.capacity => Some(&BLOCK_256K),
        s if s == BLOCK_1M.capacity => Some(&BLOCK_1M),
        s if s == BLOCK_4M.capacity => Some(&BLOCK_4M),
        _ => None,
    }
}

/// Returns a buffer of exactly `size` bytes, recycled when `size` matches one
/// of the four frame block sizes and freshly allocated otherwise (legacy
/// frames use 8 MiB blocks, which are not pooled).
pub(crate) fn get_block(size: usize) -> Vec<u8> {
    match pool_for(size) {
        Some(pool) => pool.get(),
        None => vec![0u8; size],
    }
}

/// Returns `buf` to the pool serving `size`, or drops it when `size` is not
/// pooled.
pub(crate) fn put_block(size: usize, buf: Vec<u8>) {
    if let Some(pool) = pool_for(size) {
        pool.put(buf);
    }
}

static HASH_TABLES: Mutex<Vec<Vec<u32>>> = Mutex::new(Vec::new());

/// Returns a zeroed hash-table slab of [`HT_SIZE`] slots.
pub(crate) fn get_hash_table() -> Vec<u32> {
    let recycled = HASH_TABLES.lock().unwrap().pop();
    match recycled {
        Some(mut table) => {
            // Zero on acquisition: slot values are positions from a previous
            // block and must not survive into the next encoding.
            table.fill(0);
            table
        }
        None => vec![0u32; HT_SIZE],
    }
}

/// Returns a hash-table slab to the pool. Undersized slabs are dropped.
pub(crate) fn put_hash_table(table: Vec<u32>) {
    if table.len() != HT_SIZE {
        return;
    }
    HASH_TABLES.lock().unwrap().push(table);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_buffer_full_length() {
        let buf = get_block(64 * 1024);
        assert_eq!(buf.len(), 64 * 1024);
        put_block(64 * 1024, buf);
        // A recycled buffer comes back with its length restored.
        let buf = get_block(64 * 1024);
        assert_eq!(buf.len(), 64 * 1024);
        put_block(64 * 1024, buf);
    }

    #[test]
    fn truncated_buffer_is_restored_on_return() {
        let mut buf = get_block(256 * 1024);
        buf.truncate(17);
        put_block(256 * 1024, buf);
        let buf = get_block(256 * 1024);
        assert_eq!(buf.len(), 256 * 1024);
        put_block(256 * 1024, buf);
    }

    #[test]
    fn unpooled_size_allocates_fresh() {
        let buf = get_block(8 << 20);
        assert_eq!(buf.len(), 8 << 20);
        // Returning it is a no-op; must not panic.
        put_block(8 << 20, buf);
    }

    #[test]
    fn hash_table_zeroed_on_reuse() {
        let mut table = get_hash_table();
        table[0] = 7;
        table[HT_SIZE - 1] = 9;
        put_hash_table(table);
        let table = get_hash_table();
        assert_eq!(table.len(), HT_SIZE);
        assert!(table.iter().all(|&slot| slot == 0));
        put_hash_table(table);
    }
}
