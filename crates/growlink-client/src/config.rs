use std::time::Duration;

use growlink_frame::FrameConfig;

/// Default pause between reconnection attempts.
pub const DEFAULT_RECONNECT_INTERVAL: Duration = Duration::from_secs(1);

/// Default time budget for one reconnection sequence.
pub const DEFAULT_RECONNECT_CEILING: Duration = Duration::from_secs(30);

/// Pacing of the reconnection sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Fixed delay between attempts. Default: 1s.
    pub interval: Duration,
    /// Once this much time has passed since the sequence started, the
    /// manager stops retrying and stays disconnected. Default: 30s.
    pub ceiling: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_RECONNECT_INTERVAL,
            ceiling: DEFAULT_RECONNECT_CEILING,
        }
    }
}

/// Connection manager configuration.
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    pub reconnect: ReconnectPolicy,
    pub frame: FrameConfig,
}

impl ClientConfig {
    pub fn with_reconnect(mut self, reconnect: ReconnectPolicy) -> Self {
        self.reconnect = reconnect;
        self
    }

    pub fn with_reconnect_interval(mut self, interval: Duration) -> Self {
        self.reconnect.interval = interval;
        self
    }

    pub fn with_reconnect_ceiling(mut self, ceiling: Duration) -> Self {
        self.reconnect.ceiling = ceiling;
        self
    }

    pub fn with_max_frame_len(mut self, max_frame_len: usize) -> Self {
        self.frame.max_frame_len = max_frame_len;
        self
    }
}
