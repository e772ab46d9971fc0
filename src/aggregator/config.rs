//! Aggregator configuration

use std::time::Duration;

/// Default publish rate in Hz
pub const DEFAULT_PUBLISH_RATE_HZ: u32 = 10;

/// Aggregator configuration options
#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    /// Merged clouds published per second
    pub publish_rate_hz: u32,

    /// Frame id attached to published clouds
    pub robot_frame: String,

    /// Channel name prefix; the remainder of a channel name is the source index
    pub channel_prefix: String,

    /// Capacity of the outgoing broadcast channel
    pub broadcast_capacity: usize,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            publish_rate_hz: DEFAULT_PUBLISH_RATE_HZ,
            robot_frame: "base_link".to_string(),
            channel_prefix: "pointcloud".to_string(),
            broadcast_capacity: 16,
        }
    }
}

impl AggregatorConfig {
    /// Set the publish rate (at least 1 Hz)
    pub fn publish_rate(mut self, hz: u32) -> Self {
        self.publish_rate_hz = hz.max(1);
        self
    }

    /// Set the frame id of published clouds
    pub fn robot_frame(mut self, frame: impl Into<String>) -> Self {
        self.robot_frame = frame.into();
        self
    }

    /// Set the channel name prefix
    pub fn channel_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.channel_prefix = prefix.into();
        self
    }

    /// Set the broadcast channel capacity (at least 1)
    pub fn broadcast_capacity(mut self, capacity: usize) -> Self {
        self.broadcast_capacity = capacity.max(1);
        self
    }

    /// Time between two published clouds
    pub fn publish_period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.publish_rate_hz.max(1) as f64)
    }
}
