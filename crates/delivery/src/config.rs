//! Delivery timing configuration.

use std::time::Duration;

/// Timing knobs for the two delivery transports.
///
/// Defaults suit a small single-node deployment; the API binary overrides
/// them from environment variables. Tests shrink them to milliseconds.
#[derive(Debug, Clone)]
pub struct DeliveryConfig {
    /// Pause between store queries while a long-poll request waits.
    pub poll_interval: Duration,
    /// Upper bound on one long-poll request before it returns empty.
    pub max_wait: Duration,
    /// Pause between store queries on an open event stream.
    pub stream_interval: Duration,
    /// How often an open stream emits a heartbeat.
    pub heartbeat_interval: Duration,
    /// Hard cap on one stream connection; clients reconnect past it.
    pub max_stream_lifetime: Duration,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
            max_wait: Duration::from_secs(30),
            stream_interval: Duration::from_secs(1),
            heartbeat_interval: Duration::from_secs(15),
            max_stream_lifetime: Duration::from_secs(300),
        }
    }
}

impl DeliveryConfig {
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = max_wait;
        self
    }

    pub fn with_stream_interval(mut self, interval: Duration) -> Self {
        self.stream_interval = interval;
        self
    }

    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    pub fn with_max_stream_lifetime(mut self, lifetime: Duration) -> Self {
        self.max_stream_lifetime = lifetime;
        self
    }
}
