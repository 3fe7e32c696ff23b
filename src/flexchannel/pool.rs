/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 16/10/26
******************************************************************************/

//! Envelope reuse pool.
//!
//! Every accepted send wraps its payload in a boxed [`Envelope`]. The pool
//! keeps a bounded free list of empty envelopes so that high-frequency sends
//! recycle allocations instead of hitting the allocator each time. It is a
//! pure performance concern: a pool that always misses behaves identically.

use super::envelope::Envelope;
use crossbeam::queue::ArrayQueue;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of pool counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    /// Acquisitions served from the free list.
    pub hits: u64,

    /// Acquisitions that had to allocate.
    pub misses: u64,

    /// Envelopes returned to the free list.
    pub recycled: u64,

    /// Envelopes dropped on release (free list full or payload still set).
    pub discarded: u64,
}

/// Lock-free pool of boxed envelopes, safe to share between tasks.
///
/// # Examples
///
/// ```
/// use flexchannel_rs::flexchannel::EnvelopePool;
///
/// let pool: EnvelopePool<u32> = EnvelopePool::with_capacity(4);
/// let mut envelope = pool.acquire();
/// envelope.fill(0, 10);
/// let _ = envelope.take();
/// pool.release(envelope);
///
/// assert_eq!(pool.idle(), 1);
/// let _reused = pool.acquire();
/// assert_eq!(pool.stats().hits, 1);
/// ```
#[derive(Debug)]
pub struct EnvelopePool<T> {
    free: ArrayQueue<Box<Envelope<T>>>,
    hits: AtomicU64,
    misses: AtomicU64,
    recycled: AtomicU64,
    discarded: AtomicU64,
}

impl<T> EnvelopePool<T> {
    /// Creates a pool holding at most `capacity` idle envelopes.
    ///
    /// A capacity of zero is raised to one.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            free: ArrayQueue::new(capacity.max(1)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            recycled: AtomicU64::new(0),
            discarded: AtomicU64::new(0),
        }
    }

    /// Takes an empty envelope from the free list, allocating on a miss.
    pub fn acquire(&self) -> Box<Envelope<T>> {
        match self.free.pop() {
            Some(envelope) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                envelope
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                Box::new(Envelope::new())
            }
        }
    }

    /// Returns an envelope to the free list.
    ///
    /// Envelopes that still hold a payload are dropped rather than recycled,
    /// so a pooled envelope never keeps a payload alive.
    pub fn release(&self, envelope: Box<Envelope<T>>) {
        if !envelope.is_empty() {
            self.discarded.fetch_add(1, Ordering::Relaxed);
            return;
        }
        match self.free.push(envelope) {
            Ok(()) => {
                self.recycled.fetch_add(1, Ordering::Relaxed);
            }
            Err(_full) => {
                self.discarded.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Number of envelopes currently idle in the pool.
    #[must_use]
    pub fn idle(&self) -> usize {
        self.free.len()
    }

    /// Maximum number of idle envelopes retained.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.free.capacity()
    }

    /// Returns a snapshot of the pool counters.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            recycled: self.recycled.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
        }
    }
}
