//! Reusable string builders for query text

use parking_lot::Mutex;
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, LazyLock};

/// Idle builders kept by [`StringPool::shared`].
pub const DEFAULT_CAPACITY: usize = 64;

static SHARED: LazyLock<Arc<StringPool>> =
    LazyLock::new(|| Arc::new(StringPool::new(DEFAULT_CAPACITY)));

/// Pool of `String` buffers for generating statement text.
///
/// Safe to share across threads. Buffers come back cleared but keep their
/// allocation; at most `capacity` idle buffers are kept, extras are dropped.
#[derive(Debug)]
pub struct StringPool {
    free: Mutex<Vec<String>>,
    capacity: usize,
}

impl StringPool {
    pub fn new(capacity: usize) -> Self {
        Self {
            free: Mutex::new(Vec::with_capacity(capacity)),
            capacity,
        }
    }

    /// Process-wide pool.
    pub fn shared() -> Arc<StringPool> {
        Arc::clone(&SHARED)
    }

    /// Takes an empty buffer, reusing an idle one when available.
    pub fn acquire(&self) -> PooledString<'_> {
        let buf = self.free.lock().pop().unwrap_or_default();
        PooledString { buf, pool: self }
    }

    /// Number of idle buffers.
    pub fn idle(&self) -> usize {
        self.free.lock().len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn release(&self, mut buf: String) {
        buf.clear();
        let mut free = self.free.lock();
        if free.len() < self.capacity {
            free.push(buf);
        }
    }
}

impl Default for StringPool {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// A buffer on loan from a [`StringPool`]; goes back when dropped.
#[derive(Debug)]
pub struct PooledString<'a> {
    buf: String,
    pool: &'a StringPool,
}

impl Deref for PooledString<'_> {
    type Target = String;

    fn deref(&self) -> &String {
        &self.buf
    }
}

impl DerefMut for PooledString<'_> {
    fn deref_mut(&mut self) -> &mut String {
        &mut self.buf
    }
}

impl Drop for PooledString<'_> {
    fn drop(&mut self) {
        self.pool.release(std::mem::take(&mut self.buf));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn released_buffer_is_reused_and_cleared() {
        let pool = StringPool::new(4);
        let ptr = {
            let mut buf = pool.acquire();
            buf.push_str("SELECT 1");
            buf.as_ptr()
        };
        assert_eq!(pool.idle(), 1);

        let buf = pool.acquire();
        assert!(buf.is_empty());
        assert!(buf.capacity() >= "SELECT 1".len());
        assert_eq!(buf.as_ptr(), ptr);
        assert_eq!(pool.idle(), 0);
    }

    #[test]
    fn keeps_at_most_capacity() {
        let pool = StringPool::new(2);
        let held: Vec<_> = (0..5).map(|_| pool.acquire()).collect();
        drop(held);
        assert_eq!(pool.idle(), 2);
    }

    #[test]
    fn returned_on_error_path() {
        fn fails(pool: &StringPool) -> Result<(), ()> {
            let mut buf = pool.acquire();
            buf.push_str("partial");
            Err(())
        }
        let pool = StringPool::new(1);
        assert!(fails(&pool).is_err());
        assert_eq!(pool.idle(), 1);
    }

    #[test]
    fn concurrent_acquire_release() {
        let pool = Arc::new(StringPool::new(8));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let pool = Arc::clone(&pool);
                thread::spawn(move || {
                    for n in 0..200 {
                        let mut buf = pool.acquire();
                        assert!(buf.is_empty());
                        buf.push_str(&format!("{i}:{n}"));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert!(pool.idle() <= 8);
        assert!(pool.idle() >= 1);
    }

    #[test]
    fn shared_is_one_instance() {
        assert!(Arc::ptr_eq(&StringPool::shared(), &StringPool::shared()));
    }
}
