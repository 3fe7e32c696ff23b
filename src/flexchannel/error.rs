/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 16/10/26
******************************************************************************/

//! FlexChannel error types.
//!
//! Only [`FlexChannel::start`](super::FlexChannel::start) reports errors.
//! Sends and closes absorb every anomaly internally.

use thiserror::Error;

/// Errors returned when starting a [`FlexChannel`](super::FlexChannel).
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum FlexChannelError {
    /// The reorder worker was already launched for this channel.
    #[error("already started")]
    AlreadyStarted,

    /// No Tokio runtime was reachable to spawn the reorder worker.
    #[error("no tokio runtime available to spawn the reorder worker")]
    NoRuntime,
}
