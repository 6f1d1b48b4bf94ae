//! Reconnect pacing for the session supervisor.

use std::time::Duration;

/// How long the supervisor waits between session attempts.
///
/// Currently only a fixed-interval, unbounded policy exists; keeping the
/// policy as an explicit value leaves room for backoff or bounded-attempt
/// variants without touching the supervisor loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RetryPolicy {
    /// Wait the same delay before every attempt, forever.
    Fixed {
        /// Delay between attempts.
        delay: Duration,
    },
}

impl RetryPolicy {
    /// Fixed-interval policy with the given delay.
    pub fn fixed(delay: Duration) -> Self {
        RetryPolicy::Fixed { delay }
    }

    /// Delay to wait before the given retry attempt (0-based).
    pub fn next_delay(&self, _attempt: u32) -> Duration {
        match self {
            RetryPolicy::Fixed { delay } => *delay,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy::Fixed {
            delay: Duration::from_secs(10),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_delay_is_ten_seconds() {
        assert_eq!(
            RetryPolicy::default().next_delay(0),
            Duration::from_secs(10)
        );
    }

    #[test]
    fn fixed_delay_does_not_grow() {
        let policy = RetryPolicy::fixed(Duration::from_secs(3));
        assert_eq!(policy.next_delay(0), Duration::from_secs(3));
        assert_eq!(policy.next_delay(100), Duration::from_secs(3));
    }
}
