//! # cas-registry-redis
//!
//! Redis-backed ticket registry.
//!
//! Tickets are stored as JSON values under prefixed keys, with a Redis
//! TTL derived from the ticket's hard expiry bound where one exists.
//! Redis hands out disconnected snapshots, so this backend reports
//! `needs_callback()` and relies on the access layer for cascading
//! expiration.

#![forbid(unsafe_code)]
#![deny(warnings)]
#![deny(missing_docs)]

pub mod config;
pub mod error;
pub mod registry;

pub use config::RedisConfig;
pub use registry::RedisTicketRegistry;
