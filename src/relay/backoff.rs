//! Reconnect delay schedule.

use super::config::RelayConfig;
use std::time::Duration;

/// Exponential reconnect schedule with a ceiling and an attempt budget.
///
/// ```
/// use deskrelay::relay::ReconnectPolicy;
/// use std::time::Duration;
///
/// let policy = ReconnectPolicy::default();
/// assert_eq!(policy.delay_for(0), Duration::from_millis(1000));
/// assert_eq!(policy.delay_for(4), Duration::from_millis(16_000));
/// assert_eq!(policy.delay_for(9), Duration::from_millis(30_000));
/// assert!(policy.should_retry(4));
/// assert!(!policy.should_retry(5));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    base_ms: u64,
    max_ms: u64,
    max_attempts: u32,
}

impl ReconnectPolicy {
    pub fn new(base_ms: u64, max_ms: u64, max_attempts: u32) -> Self {
        Self {
            base_ms,
            max_ms,
            max_attempts,
        }
    }

    /// Delay before the reconnect that follows `attempts` consecutive failures:
    /// `min(base * 2^attempts, max)`.
    pub fn delay_for(&self, attempts: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempts);
        Duration::from_millis(self.base_ms.saturating_mul(factor).min(self.max_ms))
    }

    /// Whether another automatic attempt is allowed after `attempts` failures.
    pub fn should_retry(&self, attempts: u32) -> bool {
        attempts < self.max_attempts
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::from(&RelayConfig::default())
    }
}

impl From<&RelayConfig> for ReconnectPolicy {
    fn from(config: &RelayConfig) -> Self {
        Self::new(
            config.reconnect_base_delay_ms,
            config.reconnect_max_delay_ms,
            config.max_reconnect_attempts,
        )
    }
}
