/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 16/10/26
******************************************************************************/

//! # flexchannel-rs
//!
//! An unbounded, never-blocking, order-preserving delivery channel for Tokio.
//!
//! - `send` never blocks the caller and never panics, even after `close`
//! - A single handler receives every accepted item exactly once, in the order
//!   the items were sent
//! - Items travel through independently scheduled tasks and are put back in
//!   order by a dedicated reorder worker
//! - Transport envelopes are recycled through a lock-free pool
//!
//! See [`flexchannel`] for the architecture and [`FlexChannel`] for the API.

pub mod flexchannel;

pub use flexchannel::{
    FlexChannel, FlexChannelBuilder, FlexChannelConfig, FlexChannelError, FlexChannelHandle,
    FlexChannelStats,
};
