//! Configuration for the CAS ticket server.
//!
//! Supports loading configuration from environment variables or files
//! through serde; all fields carry sensible defaults.

use serde::{Deserialize, Serialize};

/// Main configuration structure for the ticket server.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CasConfig {
    /// Ticket lifecycle configuration.
    #[serde(default)]
    pub ticket: TicketConfig,
    /// Single logout configuration.
    #[serde(default)]
    pub logout: LogoutConfig,
}

/// Ticket lifecycle configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketConfig {
    /// Idle timeout for ticket-granting tickets, in seconds. A session
    /// that sees no ticket activity for this long ends.
    #[serde(default = "default_tgt_idle_timeout")]
    pub tgt_idle_timeout_secs: i64,

    /// Maximum lifetime for ticket-granting tickets, in seconds,
    /// regardless of activity. Zero disables the hard bound.
    #[serde(default = "default_tgt_max_lifetime")]
    pub tgt_max_lifetime_secs: i64,

    /// Number of times a service ticket may be used before it expires.
    #[serde(default = "default_st_max_uses")]
    pub st_max_uses: u32,

    /// Time a service ticket stays valid after issuance, in seconds.
    #[serde(default = "default_st_time_to_live")]
    pub st_time_to_live_secs: i64,

    /// When true, granting a service ticket for a service that already
    /// has one recorded on the session replaces the older entry.
    #[serde(default = "default_true")]
    pub only_track_most_recent_session: bool,

    /// Whether the expired-ticket cleaner runs.
    #[serde(default = "default_true")]
    pub cleaner_enabled: bool,

    /// Interval between cleaner sweeps, in seconds.
    #[serde(default = "default_cleaner_interval")]
    pub cleaner_interval_secs: u64,

    /// Length of the random component of generated ticket ids.
    #[serde(default = "default_ticket_id_length")]
    pub ticket_id_length: usize,
}

impl Default for TicketConfig {
    fn default() -> Self {
        Self {
            tgt_idle_timeout_secs: default_tgt_idle_timeout(),
            tgt_max_lifetime_secs: default_tgt_max_lifetime(),
            st_max_uses: default_st_max_uses(),
            st_time_to_live_secs: default_st_time_to_live(),
            only_track_most_recent_session: true,
            cleaner_enabled: true,
            cleaner_interval_secs: default_cleaner_interval(),
            ticket_id_length: default_ticket_id_length(),
        }
    }
}

/// Single logout configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogoutConfig {
    /// Disables single logout entirely. Services are still cleared from
    /// the session so a lingering ticket cannot be re-notified later.
    #[serde(default)]
    pub disable_single_logout: bool,

    /// Whether front-channel (browser-driven) logout is available. When
    /// false, services requiring it are recorded as failed instead of
    /// staged.
    #[serde(default = "default_true")]
    pub front_channel_enabled: bool,

    /// Timeout for back-channel logout HTTP calls, in milliseconds.
    #[serde(default = "default_logout_timeout")]
    pub http_timeout_ms: u64,

    /// Maximum number of back-channel notifications in flight at once.
    #[serde(default = "default_logout_concurrency")]
    pub concurrency: usize,
}

impl Default for LogoutConfig {
    fn default() -> Self {
        Self {
            disable_single_logout: false,
            front_channel_enabled: true,
            http_timeout_ms: default_logout_timeout(),
            concurrency: default_logout_concurrency(),
        }
    }
}

const fn default_tgt_idle_timeout() -> i64 {
    7200
}

const fn default_tgt_max_lifetime() -> i64 {
    28_800
}

const fn default_st_max_uses() -> u32 {
    1
}

const fn default_st_time_to_live() -> i64 {
    10
}

const fn default_true() -> bool {
    true
}

const fn default_cleaner_interval() -> u64 {
    120
}

const fn default_ticket_id_length() -> usize {
    32
}

const fn default_logout_timeout() -> u64 {
    5000
}

const fn default_logout_concurrency() -> usize {
    4
}
