/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 16/10/26
******************************************************************************/

//! Reorder buffer for out-of-order arrivals.
//!
//! Delivery tasks race each other into the transport, so envelopes reach the
//! reorder worker in arbitrary order. [`ReorderBuffer`] parks each payload
//! under its submission index and releases the contiguous prefix starting at
//! the delivery cursor.
//!
//! # Example
//!
//! ```
//! use flexchannel_rs::flexchannel::{InsertResult, ReorderBuffer};
//!
//! let mut buffer = ReorderBuffer::new();
//! assert_eq!(buffer.insert(1, "b"), InsertResult::Accepted);
//! assert_eq!(buffer.pop_ready(), None);
//!
//! assert_eq!(buffer.insert(0, "a"), InsertResult::Accepted);
//! assert_eq!(buffer.pop_ready(), Some("a"));
//! assert_eq!(buffer.pop_ready(), Some("b"));
//! assert_eq!(buffer.cursor(), 2);
//! ```

use std::collections::HashMap;

/// Outcome of inserting a payload into the reorder buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertResult {
    /// Payload was buffered.
    Accepted,
    /// An entry for this index is already pending.
    Duplicate,
    /// Index is below the cursor and was delivered already.
    TooOld,
}

/// Single-owner buffer keyed by submission index.
///
/// Owned exclusively by the reorder worker, so it carries no synchronization.
#[derive(Debug)]
pub struct ReorderBuffer<T> {
    /// Next index to hand out. Equals the number of payloads delivered.
    cursor: u64,

    /// Arrived payloads waiting for the cursor to reach them.
    pending: HashMap<u64, T>,
}

impl<T> ReorderBuffer<T> {
    /// Creates an empty buffer with the cursor at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty buffer pre-sized for `capacity` pending entries.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            cursor: 0,
            pending: HashMap::with_capacity(capacity),
        }
    }

    /// Buffers `payload` under `index`.
    ///
    /// Rejected payloads are dropped.
    pub fn insert(&mut self, index: u64, payload: T) -> InsertResult {
        if index < self.cursor {
            return InsertResult::TooOld;
        }
        if self.pending.contains_key(&index) {
            return InsertResult::Duplicate;
        }
        self.pending.insert(index, payload);
        InsertResult::Accepted
    }

    /// Removes the payload at the cursor, advancing the cursor by one.
    pub fn pop_ready(&mut self) -> Option<T> {
        let payload = self.pending.remove(&self.cursor)?;
        self.cursor += 1;
        Some(payload)
    }

    /// Hands every ready payload to `deliver` in index order.
    ///
    /// Returns how many payloads were delivered.
    pub fn drain_ready<F>(&mut self, mut deliver: F) -> usize
    where
        F: FnMut(T),
    {
        let mut delivered = 0;
        while let Some(payload) = self.pop_ready() {
            deliver(payload);
            delivered += 1;
        }
        delivered
    }

    /// Index the buffer is waiting for.
    #[inline]
    #[must_use]
    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    /// Number of payloads parked ahead of the cursor.
    #[inline]
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Returns `true` if nothing is parked.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Smallest parked index, if any.
    #[must_use]
    pub fn lowest_pending(&self) -> Option<u64> {
        self.pending.keys().min().copied()
    }
}

impl<T> Default for ReorderBuffer<T> {
    fn default() -> Self {
        Self::new()
    }
}
