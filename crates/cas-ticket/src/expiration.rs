//! Expiration policies and ticket usage counters.
//!
//! Policies are pure strategies: all mutable state (timestamps and use
//! counts) lives on the ticket itself, in [`TicketUsage`]. A policy
//! answers "is this usage expired" and nothing else, so the same policy
//! value can be shared by any number of tickets.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Usage counters carried by every ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketUsage {
    /// When the ticket was created. Set once, never updated.
    pub created_at: DateTime<Utc>,
    /// When the ticket was last used.
    pub last_used_at: DateTime<Utc>,
    /// When the ticket was used before that.
    pub previous_used_at: Option<DateTime<Utc>>,
    /// Number of state-changing uses.
    pub use_count: u32,
}

impl TicketUsage {
    /// Creates fresh counters stamped with the current time.
    #[must_use]
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            created_at: now,
            last_used_at: now,
            previous_used_at: None,
            use_count: 0,
        }
    }

    /// Records a state-changing use: rotates the timestamps and bumps
    /// the use count.
    pub fn update(&mut self) {
        self.previous_used_at = Some(self.last_used_at);
        self.last_used_at = Utc::now();
        self.use_count += 1;
    }

    /// Age of the ticket in seconds.
    #[must_use]
    pub fn age_seconds(&self) -> i64 {
        (Utc::now() - self.created_at).num_seconds()
    }

    /// Seconds since the last use.
    #[must_use]
    pub fn idle_seconds(&self) -> i64 {
        (Utc::now() - self.last_used_at).num_seconds()
    }
}

impl Default for TicketUsage {
    fn default() -> Self {
        Self::new()
    }
}

/// Expiration policy attached to a ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "kebab-case")]
pub enum ExpirationPolicy {
    /// The ticket never expires on its own.
    NeverExpires,
    /// Expires a fixed duration after creation, regardless of use.
    HardTimeout {
        /// Maximum lifetime in seconds.
        max_lifetime_secs: i64,
    },
    /// Expires after a number of uses or a duration, whichever first.
    MultiTimeUseOrTimeout {
        /// Maximum number of uses.
        max_uses: u32,
        /// Maximum lifetime in seconds.
        max_lifetime_secs: i64,
    },
    /// Sliding expiration, reset on each use.
    SlidingWindow {
        /// Maximum idle time in seconds.
        idle_timeout_secs: i64,
    },
    /// Expires after an idle period or a hard lifetime, whichever
    /// first. The usual policy for ticket-granting tickets.
    IdleAndLifetime {
        /// Maximum idle time in seconds.
        idle_timeout_secs: i64,
        /// Maximum lifetime in seconds. Zero disables the hard bound.
        max_lifetime_secs: i64,
    },
}

impl ExpirationPolicy {
    /// Whether a ticket with the given usage counters is expired under
    /// this policy.
    #[must_use]
    pub fn is_expired(&self, usage: &TicketUsage) -> bool {
        match *self {
            Self::NeverExpires => false,
            Self::HardTimeout { max_lifetime_secs } => usage.age_seconds() >= max_lifetime_secs,
            Self::MultiTimeUseOrTimeout {
                max_uses,
                max_lifetime_secs,
            } => usage.use_count >= max_uses || usage.age_seconds() >= max_lifetime_secs,
            Self::SlidingWindow { idle_timeout_secs } => usage.idle_seconds() >= idle_timeout_secs,
            Self::IdleAndLifetime {
                idle_timeout_secs,
                max_lifetime_secs,
            } => {
                usage.idle_seconds() >= idle_timeout_secs
                    || (max_lifetime_secs > 0 && usage.age_seconds() >= max_lifetime_secs)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_rotates_timestamps() {
        let mut usage = TicketUsage::new();
        assert_eq!(usage.use_count, 0);
        assert!(usage.previous_used_at.is_none());

        let before = usage.last_used_at;
        usage.update();
        assert_eq!(usage.use_count, 1);
        assert_eq!(usage.previous_used_at, Some(before));
    }

    #[test]
    fn never_expires() {
        let usage = TicketUsage::new();
        assert!(!ExpirationPolicy::NeverExpires.is_expired(&usage));
    }

    #[test]
    fn hard_timeout() {
        let usage = TicketUsage::new();
        let generous = ExpirationPolicy::HardTimeout {
            max_lifetime_secs: 3600,
        };
        let exhausted = ExpirationPolicy::HardTimeout {
            max_lifetime_secs: 0,
        };
        assert!(!generous.is_expired(&usage));
        assert!(exhausted.is_expired(&usage));
    }

    #[test]
    fn multi_time_use_counts_uses() {
        let mut usage = TicketUsage::new();
        let policy = ExpirationPolicy::MultiTimeUseOrTimeout {
            max_uses: 2,
            max_lifetime_secs: 3600,
        };

        assert!(!policy.is_expired(&usage));
        usage.update();
        assert!(!policy.is_expired(&usage));
        usage.update();
        assert!(policy.is_expired(&usage));
    }

    #[test]
    fn sliding_window_tracks_last_use() {
        let usage = TicketUsage::new();
        let policy = ExpirationPolicy::SlidingWindow {
            idle_timeout_secs: 1800,
        };
        assert!(!policy.is_expired(&usage));

        let idle = ExpirationPolicy::SlidingWindow {
            idle_timeout_secs: 0,
        };
        assert!(idle.is_expired(&usage));
    }

    #[test]
    fn idle_and_lifetime_zero_disables_hard_bound() {
        let usage = TicketUsage::new();
        let policy = ExpirationPolicy::IdleAndLifetime {
            idle_timeout_secs: 1800,
            max_lifetime_secs: 0,
        };
        assert!(!policy.is_expired(&usage));
    }
}
