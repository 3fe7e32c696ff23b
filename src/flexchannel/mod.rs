/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 16/10/26
******************************************************************************/

//! FlexChannel module for unbounded, order-preserving delivery.
//!
//! A [`FlexChannel`] accepts items without ever blocking the producer and
//! hands them to a single handler in exactly the order they were sent, even
//! though each item is dispatched through its own independently scheduled
//! task.
//!
//! # Architecture
//!
//! - `send` assigns a dense, monotonic submission index under a short lock
//! - Each accepted item is wrapped in a pooled [`Envelope`] by its own
//!   delivery task and written into a bounded Tokio channel
//! - A single reorder worker parks arrivals in a [`ReorderBuffer`] and calls
//!   the handler for every contiguous prefix starting at the cursor
//! - `close` stops new sends; already accepted items still drain
//!
//! # Examples
//!
//! ```no_run
//! use flexchannel_rs::flexchannel::FlexChannel;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let channel = FlexChannel::new();
//!
//! // Register the handler and launch the worker
//! let handle = channel.start(|event: String| {
//!     println!("event: {event}");
//! })?;
//!
//! // Send from anywhere, never blocks
//! channel.send("first".to_string());
//! channel.send("second".to_string());
//!
//! // Stop accepting, then wait for the drain
//! channel.close();
//! handle.wait().await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod core;
pub mod envelope;
pub mod error;
pub mod pool;
pub mod reorder;
pub mod stats;

#[cfg(test)]
mod tests;

// Re-export main types
pub use config::{FlexChannelBuilder, FlexChannelConfig};
pub use self::core::{FlexChannel, FlexChannelHandle};
pub use envelope::Envelope;
pub use error::FlexChannelError;
pub use pool::{EnvelopePool, PoolStats};
pub use reorder::{InsertResult, ReorderBuffer};
pub use stats::FlexChannelStats;
