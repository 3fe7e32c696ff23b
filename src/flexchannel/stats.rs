/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 16/10/26
******************************************************************************/

//! Channel statistics.

use super::pool::PoolStats;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time view of a channel's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FlexChannelStats {
    /// Sends that were assigned a submission index.
    pub accepted: u64,

    /// Payloads handed to the handler.
    pub delivered: u64,

    /// Sends absorbed without an index because the channel was closed.
    pub dropped: u64,

    /// Accepted sends whose transport write found the worker gone.
    pub failed_writes: u64,

    /// Payloads that reached the transport or the reorder buffer but were
    /// discarded when the worker stopped (a panicking handler).
    pub lost: u64,

    /// Whether the reorder worker was launched.
    pub started: bool,

    /// Whether the channel is closed.
    pub closed: bool,

    /// Envelope pool counters.
    pub pool: PoolStats,
}

impl FlexChannelStats {
    /// Accepted payloads that may still reach the handler.
    ///
    /// Reaches zero once the worker has stopped and every delivery task has
    /// finished, whether the worker drained or its handler panicked.
    #[inline]
    #[must_use]
    pub fn pending(&self) -> u64 {
        self.accepted
            .saturating_sub(self.delivered)
            .saturating_sub(self.failed_writes)
            .saturating_sub(self.lost)
    }
}

/// Shared counters updated by callers, delivery tasks and the worker.
#[derive(Debug, Default)]
pub(crate) struct Counters {
    pub(crate) accepted: AtomicU64,
    pub(crate) delivered: AtomicU64,
    pub(crate) dropped: AtomicU64,
    pub(crate) failed_writes: AtomicU64,
    pub(crate) received: AtomicU64,
    pub(crate) lost: AtomicU64,
}

impl Counters {
    #[inline]
    pub(crate) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self, started: bool, closed: bool, pool: PoolStats) -> FlexChannelStats {
        FlexChannelStats {
            accepted: self.accepted.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            failed_writes: self.failed_writes.load(Ordering::Relaxed),
            lost: self.lost.load(Ordering::Relaxed),
            started,
            closed,
            pool,
        }
    }
}
