/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 16/10/26
******************************************************************************/

//! Transport envelope.
//!
//! An [`Envelope`] pairs a submission index with its payload for a single
//! transit from a delivery task to the reorder worker. Envelopes are boxed and
//! recycled through the [`EnvelopePool`](super::pool::EnvelopePool).

/// Transient wrapper carrying `(index, payload)` through the transport.
///
/// # Examples
///
/// ```
/// use flexchannel_rs::flexchannel::Envelope;
///
/// let mut envelope = Envelope::new();
/// envelope.fill(7, "payload");
/// assert_eq!(envelope.index(), 7);
///
/// let (index, payload) = envelope.take();
/// assert_eq!((index, payload), (7, Some("payload")));
/// assert!(envelope.is_empty());
/// ```
#[derive(Debug)]
pub struct Envelope<T> {
    /// Submission index assigned by the sequencer.
    index: u64,

    /// Payload in transit, `None` while the envelope sits in the pool.
    payload: Option<T>,
}

impl<T> Envelope<T> {
    /// Creates an empty envelope.
    #[must_use]
    pub fn new() -> Self {
        Self {
            index: 0,
            payload: None,
        }
    }

    /// Populates the envelope for transport.
    pub fn fill(&mut self, index: u64, payload: T) {
        self.index = index;
        self.payload = Some(payload);
    }

    /// Extracts the index and payload, leaving the envelope empty.
    pub fn take(&mut self) -> (u64, Option<T>) {
        let index = std::mem::take(&mut self.index);
        (index, self.payload.take())
    }

    /// Returns the submission index.
    #[inline]
    #[must_use]
    pub fn index(&self) -> u64 {
        self.index
    }

    /// Returns `true` if the envelope carries no payload.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.payload.is_none()
    }
}

impl<T> Default for Envelope<T> {
    fn default() -> Self {
        Self::new()
    }
}
