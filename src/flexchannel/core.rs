/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 16/10/26
******************************************************************************/

//! Core FlexChannel implementation.
//!
//! This module provides the [`FlexChannel`] primitive: callers sequence items
//! under a short critical section, each accepted item travels through its own
//! delivery task into a bounded transport, and a single reorder worker hands
//! items to the handler in submission order.

use super::config::{FlexChannelBuilder, FlexChannelConfig};
use super::envelope::Envelope;
use super::error::FlexChannelError;
use super::pool::EnvelopePool;
use super::reorder::{InsertResult, ReorderBuffer};
use super::stats::{Counters, FlexChannelStats};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, trace, warn};

/// Type alias for the transport sender (many delivery tasks).
type TransportSender<T> = mpsc::Sender<Box<Envelope<T>>>;

/// Type alias for the transport receiver (the reorder worker).
type TransportReceiver<T> = mpsc::Receiver<Box<Envelope<T>>>;

/// Accepted send parked until a runtime is available to deliver it.
struct Parked<T> {
    index: u64,
    payload: T,
    sender: TransportSender<T>,
}

/// Sequencer and lifecycle state, guarded by a single mutex.
struct SequencerState<T> {
    /// Next submission index to assign.
    next_index: u64,

    /// Set once the reorder worker has been launched.
    started: bool,

    /// Transport entry point. Taken on close.
    sender: Option<TransportSender<T>>,

    /// Transport exit point. Taken by the worker on start.
    receiver: Option<TransportReceiver<T>>,

    /// Runtime that delivery tasks and the worker are spawned on.
    runtime: Option<Handle>,

    /// Sends accepted while no runtime was reachable, in index order.
    backlog: Vec<Parked<T>>,
}

impl<T> SequencerState<T> {
    fn runtime(&self) -> Option<Handle> {
        self.runtime.clone().or_else(|| Handle::try_current().ok())
    }
}

/// State shared by the channel, its delivery tasks and the reorder worker.
struct Shared<T> {
    name: String,
    state: Mutex<SequencerState<T>>,

    /// Fast pre-check for `send`; mirrors shutdown without taking the lock.
    closed: AtomicBool,

    pool: EnvelopePool<T>,
    counters: Counters,
}

impl<T> Shared<T> {
    fn lock_state(&self) -> MutexGuard<'_, SequencerState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// An unbounded, never-blocking, order-preserving delivery channel.
///
/// `send` never blocks and never fails observably, even after [`close`]. A
/// single handler registered with [`start`] receives every accepted item
/// exactly once, in the order the items were sent.
///
/// [`close`]: FlexChannel::close
/// [`start`]: FlexChannel::start
///
/// # Examples
///
/// ```
/// use flexchannel_rs::FlexChannel;
/// use std::sync::{Arc, Mutex};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let channel = FlexChannel::new();
/// let received = Arc::new(Mutex::new(Vec::new()));
/// let sink = Arc::clone(&received);
///
/// let handle = channel
///     .start(move |n: u32| sink.lock().unwrap().push(n))
///     .unwrap();
///
/// for n in 0..10 {
///     channel.send(n);
/// }
/// channel.close();
/// handle.wait().await.unwrap();
///
/// assert_eq!(*received.lock().unwrap(), (0..10).collect::<Vec<_>>());
/// # }
/// ```
pub struct FlexChannel<T> {
    shared: Arc<Shared<T>>,
    config: FlexChannelConfig,
}

impl<T: Send + 'static> FlexChannel<T> {
    /// Creates an idle channel with the default configuration.
    ///
    /// If called inside a Tokio runtime, that runtime is remembered and used
    /// for every task the channel spawns, so `send` also works from plain
    /// threads afterwards.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(FlexChannelConfig::default())
    }

    /// Creates an idle channel with the given configuration.
    #[must_use]
    pub fn with_config(config: FlexChannelConfig) -> Self {
        let config = config.sanitized();
        let (sender, receiver) = mpsc::channel(config.transport_capacity);

        let shared = Shared {
            name: config.name.clone(),
            state: Mutex::new(SequencerState {
                next_index: 0,
                started: false,
                sender: Some(sender),
                receiver: Some(receiver),
                runtime: Handle::try_current().ok(),
                backlog: Vec::new(),
            }),
            closed: AtomicBool::new(false),
            pool: EnvelopePool::with_capacity(config.pool_capacity),
            counters: Counters::default(),
        };

        Self {
            shared: Arc::new(shared),
            config,
        }
    }

    /// Launches the reorder worker that feeds `handler`.
    ///
    /// The handler runs synchronously on the worker, once per item, in
    /// submission order. It is a required argument, so a channel can never
    /// run without one.
    ///
    /// # Errors
    ///
    /// - [`FlexChannelError::AlreadyStarted`] if a worker was launched before;
    ///   no second worker is created.
    /// - [`FlexChannelError::NoRuntime`] if no Tokio runtime is reachable; the
    ///   channel stays idle and may be started later.
    pub fn start<F>(&self, handler: F) -> Result<FlexChannelHandle, FlexChannelError>
    where
        F: FnMut(T) + Send + 'static,
    {
        let mut state = self.shared.lock_state();
        if state.started {
            return Err(FlexChannelError::AlreadyStarted);
        }
        let Some(runtime) = state.runtime() else {
            warn!(channel = %self.shared.name, "start called outside of a tokio runtime");
            return Err(FlexChannelError::NoRuntime);
        };
        let Some(receiver) = state.receiver.take() else {
            return Err(FlexChannelError::AlreadyStarted);
        };
        state.started = true;
        state.runtime = Some(runtime.clone());
        let backlog = std::mem::take(&mut state.backlog);
        drop(state);

        let shared = Arc::clone(&self.shared);
        let reorder_capacity = self.config.reorder_capacity;
        let handle = runtime.spawn(run_loop(shared, receiver, handler, reorder_capacity));

        debug!(
            channel = %self.shared.name,
            parked = backlog.len(),
            "reorder worker started"
        );
        for parked in backlog {
            runtime.spawn(deliver(
                Arc::clone(&self.shared),
                parked.sender,
                parked.index,
                parked.payload,
            ));
        }
        Ok(FlexChannelHandle { handle })
    }

    /// Enqueues `payload` for ordered delivery.
    ///
    /// Never blocks and never fails observably. After [`close`] the payload
    /// is silently discarded. Sends made while no Tokio runtime is reachable
    /// are kept in order and delivered once [`start`] runs inside one.
    ///
    /// [`start`]: FlexChannel::start
    ///
    /// [`close`]: FlexChannel::close
    pub fn send(&self, payload: T) {
        if self.shared.closed.load(Ordering::Acquire) {
            Counters::bump(&self.shared.counters.dropped);
            trace!(channel = %self.shared.name, "send after close absorbed");
            return;
        }

        let (index, sender, runtime) = {
            let mut state = self.shared.lock_state();
            let Some(sender) = state.sender.clone() else {
                Counters::bump(&self.shared.counters.dropped);
                trace!(channel = %self.shared.name, "send raced with close, absorbed");
                return;
            };
            let index = state.next_index;
            state.next_index += 1;
            Counters::bump(&self.shared.counters.accepted);

            // No runtime yet: park the send, `start` spawns its delivery.
            let Some(runtime) = state.runtime() else {
                trace!(channel = %self.shared.name, index, "no runtime, send parked until start");
                state.backlog.push(Parked {
                    index,
                    payload,
                    sender,
                });
                return;
            };
            (index, sender, runtime)
        };

        runtime.spawn(deliver(Arc::clone(&self.shared), sender, index, payload));
    }

    /// Shuts the channel down.
    ///
    /// Further sends are absorbed. Items already accepted are still delivered;
    /// the worker exits once the last in-flight delivery task has written.
    /// Calling `close` more than once has no further effect.
    pub fn close(&self) {
        self.shared.closed.store(true, Ordering::Release);
        let sender = self.shared.lock_state().sender.take();
        match sender {
            Some(sender) => {
                drop(sender);
                debug!(channel = %self.shared.name, "channel closed");
            }
            None => {
                debug!(channel = %self.shared.name, "close on already closed channel ignored");
            }
        }
    }

    /// Returns `true` once the reorder worker has been launched.
    #[must_use]
    pub fn is_started(&self) -> bool {
        self.shared.lock_state().started
    }

    /// Returns `true` once the channel is closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::Acquire)
    }

    /// Returns a snapshot of the channel counters.
    #[must_use]
    pub fn stats(&self) -> FlexChannelStats {
        let started = self.is_started();
        self.shared
            .counters
            .snapshot(started, self.is_closed(), self.shared.pool.stats())
    }

    /// Returns the configuration the channel was built with.
    #[must_use]
    pub fn config(&self) -> &FlexChannelConfig {
        &self.config
    }

    /// Returns the channel name used in log records.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.config.name
    }
}

impl FlexChannel<()> {
    /// Returns a builder for a customised channel.
    ///
    /// The payload type is picked by [`FlexChannelBuilder::build`].
    #[must_use]
    pub fn builder() -> FlexChannelBuilder {
        FlexChannelBuilder::new()
    }
}

impl<T: Send + 'static> Default for FlexChannel<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for FlexChannel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlexChannel")
            .field("name", &self.config.name)
            .field("closed", &self.shared.closed.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl<T> Drop for FlexChannel<T> {
    fn drop(&mut self) {
        self.shared.closed.store(true, Ordering::Release);
        let mut state = self.shared.lock_state();
        state.sender.take();
        // Never started: nobody will read the transport, so release any
        // delivery task waiting on it.
        state.receiver.take();
        state.backlog.clear();
    }
}

/// Handle to a running reorder worker.
#[derive(Debug)]
pub struct FlexChannelHandle {
    handle: JoinHandle<()>,
}

impl FlexChannelHandle {
    /// Waits for the worker to exit.
    ///
    /// Resolves with `Ok(())` once the channel is closed and drained, or with
    /// the [`JoinError`] carrying a panic raised by the handler.
    pub async fn wait(self) -> Result<(), JoinError> {
        self.handle.await
    }

    /// Returns `true` if the worker has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

/// Writes one sequenced payload into the transport.
async fn deliver<T>(shared: Arc<Shared<T>>, sender: TransportSender<T>, index: u64, payload: T)
where
    T: Send + 'static,
{
    let mut envelope = shared.pool.acquire();
    envelope.fill(index, payload);

    if let Err(mpsc::error::SendError(mut envelope)) = sender.send(envelope).await {
        let _ = envelope.take();
        shared.pool.release(envelope);
        Counters::bump(&shared.counters.failed_writes);
        trace!(channel = %shared.name, index, "transport closed, delivery absorbed");
    }
}

/// Owns the transport receiver for the worker. On exit, including unwind,
/// marks the channel closed and accounts for every payload that will never
/// reach the handler.
struct WorkerGuard<T: Send + 'static> {
    shared: Arc<Shared<T>>,
    receiver: Option<TransportReceiver<T>>,

    /// Set once the transport reported end of stream.
    drained: bool,
}

impl<T: Send + 'static> WorkerGuard<T> {
    async fn recv(&mut self) -> Option<Box<Envelope<T>>> {
        self.receiver.as_mut()?.recv().await
    }
}

impl<T: Send + 'static> Drop for WorkerGuard<T> {
    fn drop(&mut self) {
        self.shared.closed.store(true, Ordering::Release);

        let counters = &self.shared.counters;
        let received = counters.received.load(Ordering::Relaxed);
        let delivered = counters.delivered.load(Ordering::Relaxed);
        let stranded = received.saturating_sub(delivered);
        counters.lost.fetch_add(stranded, Ordering::Relaxed);

        if std::thread::panicking() {
            warn!(channel = %self.shared.name, stranded, "handler panicked, reorder worker stopped");
        }
        if self.drained {
            return;
        }
        let Some(mut receiver) = self.receiver.take() else {
            return;
        };

        // Refuse new writes; writers already holding a permit still land in
        // the queue, so keep reading until the transport reports empty.
        receiver.close();
        match Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(discard_remaining(Arc::clone(&self.shared), receiver));
            }
            Err(_) => {
                while let Ok(mut envelope) = receiver.try_recv() {
                    let _ = envelope.take();
                    self.shared.pool.release(envelope);
                    Counters::bump(&self.shared.counters.lost);
                }
            }
        }
    }
}

/// Counts and recycles whatever is still queued after the worker stopped.
async fn discard_remaining<T>(shared: Arc<Shared<T>>, mut receiver: TransportReceiver<T>)
where
    T: Send + 'static,
{
    while let Some(mut envelope) = receiver.recv().await {
        let _ = envelope.take();
        shared.pool.release(envelope);
        Counters::bump(&shared.counters.lost);
    }
    debug!(channel = %shared.name, "transport discarded after worker stop");
}

/// Reorder worker: drains the transport and feeds the handler in index order.
async fn run_loop<T, F>(
    shared: Arc<Shared<T>>,
    receiver: TransportReceiver<T>,
    mut handler: F,
    reorder_capacity: usize,
) where
    T: Send + 'static,
    F: FnMut(T) + Send + 'static,
{
    let mut guard = WorkerGuard {
        shared: Arc::clone(&shared),
        receiver: Some(receiver),
        drained: false,
    };
    let mut buffer = ReorderBuffer::with_capacity(reorder_capacity);

    while let Some(mut envelope) = guard.recv().await {
        let (index, payload) = envelope.take();
        shared.pool.release(envelope);
        Counters::bump(&shared.counters.received);

        let Some(payload) = payload else {
            warn!(channel = %shared.name, index, "empty envelope received");
            continue;
        };
        let inserted = buffer.insert(index, payload);
        if inserted != InsertResult::Accepted {
            warn!(channel = %shared.name, index, ?inserted, "envelope rejected by reorder buffer");
            continue;
        }

        buffer.drain_ready(|payload| {
            handler(payload);
            Counters::bump(&shared.counters.delivered);
        });
    }

    guard.drained = true;
    debug!(
        channel = %shared.name,
        delivered = buffer.cursor(),
        stranded = buffer.pending(),
        "transport drained, reorder worker exiting"
    );
}
