//! When to try the live channel again after it drops.

use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconnectPolicy {
    Never,
    /// Exponential backoff: `initial`, doubling up to `max`.
    Backoff {
        initial: Duration,
        max: Duration,
        max_attempts: Option<u32>,
    },
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        ReconnectPolicy::Backoff {
            initial: Duration::from_secs(1),
            max: Duration::from_secs(64),
            max_attempts: None,
        }
    }
}

impl ReconnectPolicy {
    /// Delay before reconnect attempt number `attempt` (0-based), or `None`
    /// to give up.
    pub fn delay(&self, attempt: u32) -> Option<Duration> {
        match *self {
            ReconnectPolicy::Never => None,
            ReconnectPolicy::Backoff {
                initial,
                max,
                max_attempts,
            } => {
                if max_attempts.is_some_and(|limit| attempt >= limit) {
                    return None;
                }
                let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
                Some(initial.saturating_mul(factor).min(max))
            }
        }
    }
}
