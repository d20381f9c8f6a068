//! Ticket id generation.
//!
//! Ids have the form `PREFIX-<sequence>-<random>[-<suffix>]`. The
//! random component comes from a cryptographically secure generator
//! and is long enough to make ids unguessable; the sequence number
//! only guarantees uniqueness within a process. The optional suffix
//! identifies the issuing node in a cluster.

use std::sync::atomic::{AtomicU64, Ordering};

use rand::distr::{Alphanumeric, SampleString};

/// Default length of the random id component. 32 alphanumeric
/// characters carry roughly 190 bits of entropy.
pub const DEFAULT_RANDOM_LENGTH: usize = 32;

/// Generates unique, unguessable ticket ids.
#[derive(Debug)]
pub struct TicketIdGenerator {
    counter: AtomicU64,
    random_length: usize,
    suffix: Option<String>,
}

impl TicketIdGenerator {
    /// Creates a generator with the default random length and no node
    /// suffix.
    #[must_use]
    pub fn new() -> Self {
        Self {
            counter: AtomicU64::new(0),
            random_length: DEFAULT_RANDOM_LENGTH,
            suffix: None,
        }
    }

    /// Sets the length of the random component.
    #[must_use]
    pub const fn with_random_length(mut self, length: usize) -> Self {
        self.random_length = length;
        self
    }

    /// Sets the node suffix appended to every id.
    #[must_use]
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = Some(suffix.into());
        self
    }

    /// Mints a new id with the given prefix.
    #[must_use]
    pub fn new_id(&self, prefix: &str) -> String {
        let sequence = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        let random = Alphanumeric.sample_string(&mut rand::rng(), self.random_length);
        match &self.suffix {
            Some(suffix) => format!("{prefix}-{sequence}-{random}-{suffix}"),
            None => format!("{prefix}-{sequence}-{random}"),
        }
    }
}

impl Default for TicketIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
