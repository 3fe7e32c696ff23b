/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 16/10/26
******************************************************************************/

//! FlexChannel configuration.
//!
//! None of these knobs bound what a producer may enqueue. They only size the
//! internal transport, the envelope pool and the reorder buffer.

use serde::{Deserialize, Serialize};

/// Default bound of the internal transport between delivery tasks and the
/// reorder worker.
pub const DEFAULT_TRANSPORT_CAPACITY: usize = 64;

/// Default number of idle envelopes kept for reuse.
pub const DEFAULT_POOL_CAPACITY: usize = 1024;

/// Default initial capacity of the reorder buffer.
pub const DEFAULT_REORDER_CAPACITY: usize = 64;

/// Tuning parameters for a [`FlexChannel`](super::FlexChannel).
///
/// # Examples
///
/// ```
/// use flexchannel_rs::flexchannel::FlexChannelConfig;
///
/// let config: FlexChannelConfig =
///     serde_json::from_str(r#"{ "name": "fills", "pool_capacity": 16 }"#).unwrap();
/// assert_eq!(config.name, "fills");
/// assert_eq!(config.pool_capacity, 16);
/// assert_eq!(config.transport_capacity, 64);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlexChannelConfig {
    /// Name attached to log records.
    pub name: String,

    /// Bound of the internal transport. Delivery tasks wait on it; callers
    /// of `send` never do.
    pub transport_capacity: usize,

    /// Maximum number of idle envelopes retained by the pool.
    pub pool_capacity: usize,

    /// Initial capacity of the reorder buffer.
    pub reorder_capacity: usize,
}

impl FlexChannelConfig {
    /// Returns a copy with zero capacities raised to one.
    #[must_use]
    pub fn sanitized(mut self) -> Self {
        if self.transport_capacity == 0 {
            tracing::warn!(channel = %self.name, "transport_capacity of 0 raised to 1");
            self.transport_capacity = 1;
        }
        if self.pool_capacity == 0 {
            tracing::warn!(channel = %self.name, "pool_capacity of 0 raised to 1");
            self.pool_capacity = 1;
        }
        self
    }
}

impl Default for FlexChannelConfig {
    fn default() -> Self {
        Self {
            name: "flexchannel".to_string(),
            transport_capacity: DEFAULT_TRANSPORT_CAPACITY,
            pool_capacity: DEFAULT_POOL_CAPACITY,
            reorder_capacity: DEFAULT_REORDER_CAPACITY,
        }
    }
}

/// Builder for [`FlexChannel`](super::FlexChannel).
///
/// # Examples
///
/// ```
/// use flexchannel_rs::flexchannel::FlexChannel;
///
/// let channel: FlexChannel<u64> = FlexChannel::builder()
///     .name("trades")
///     .transport_capacity(8)
///     .build();
/// assert_eq!(channel.name(), "trades");
/// ```
#[derive(Debug, Clone, Default)]
pub struct FlexChannelBuilder {
    config: FlexChannelConfig,
}

impl FlexChannelBuilder {
    /// Creates a builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the name attached to log records.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    /// Sets the internal transport bound.
    #[must_use]
    pub fn transport_capacity(mut self, capacity: usize) -> Self {
        self.config.transport_capacity = capacity;
        self
    }

    /// Sets the number of idle envelopes retained.
    #[must_use]
    pub fn pool_capacity(mut self, capacity: usize) -> Self {
        self.config.pool_capacity = capacity;
        self
    }

    /// Sets the initial reorder buffer capacity.
    #[must_use]
    pub fn reorder_capacity(mut self, capacity: usize) -> Self {
        self.config.reorder_capacity = capacity;
        self
    }

    /// Returns the accumulated configuration.
    #[must_use]
    pub fn config(&self) -> &FlexChannelConfig {
        &self.config
    }

    /// Builds an idle channel.
    #[must_use]
    pub fn build<T: Send + 'static>(self) -> super::FlexChannel<T> {
        super::FlexChannel::with_config(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::{FlexChannelBuilder, FlexChannelConfig};

    #[test]
    fn test_default_values() {
        let config = FlexChannelConfig::default();
        assert_eq!(config.name, "flexchannel");
        assert_eq!(config.transport_capacity, 64);
        assert_eq!(config.pool_capacity, 1024);
        assert_eq!(config.reorder_capacity, 64);
    }

    #[test]
    fn test_sanitized_clamps_zero_capacities() {
        let config = FlexChannelConfig {
            transport_capacity: 0,
            pool_capacity: 0,
            reorder_capacity: 0,
            ..FlexChannelConfig::default()
        }
        .sanitized();

        assert_eq!(config.transport_capacity, 1);
        assert_eq!(config.pool_capacity, 1);
        assert_eq!(config.reorder_capacity, 0);
    }

    #[test]
    fn test_builder_sets_fields() {
        let builder = FlexChannelBuilder::new()
            .name("quotes")
            .transport_capacity(2)
            .pool_capacity(3)
            .reorder_capacity(4);

        let config = builder.config();
        assert_eq!(config.name, "quotes");
        assert_eq!(config.transport_capacity, 2);
        assert_eq!(config.pool_capacity, 3);
        assert_eq!(config.reorder_capacity, 4);
    }

    #[test]
    fn test_serde_roundtrip_keeps_values() {
        let config = FlexChannelBuilder::new().name("book").pool_capacity(7);
        let json = serde_json::to_string(config.config()).unwrap();
        let parsed: FlexChannelConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(&parsed, config.config());
    }
}
