//! Registry error types.

use cas_ticket::{TicketError, TicketKind};
use thiserror::Error;

/// Errors that can occur during registry operations.
///
/// Storage faults (`Backend`, `Serialization`, `Timeout`) are kept
/// distinct from absent tickets: a lookup of an unknown id is
/// `Ok(None)`, never an error, so callers can tell a backend outage
/// apart from a session that simply ended.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A mutating operation referenced a ticket id the registry does
    /// not hold.
    #[error("ticket not found: {0}")]
    NotFound(String),

    /// The ticket exists but is expired, directly or through its
    /// granting chain.
    #[error("ticket expired: {0}")]
    Expired(String),

    /// The stored ticket is not of the kind the caller asked for.
    #[error("ticket {id} is a {actual} ticket, expected {expected}")]
    TypeMismatch {
        /// The ticket id.
        id: String,
        /// The kind the caller expected.
        expected: TicketKind,
        /// The kind actually stored.
        actual: TicketKind,
    },

    /// A service ticket was validated against a service it was not
    /// granted for.
    #[error("service ticket {0} does not match the presented service")]
    ServiceMismatch(String),

    /// A ticket state transition was rejected.
    #[error(transparent)]
    Ticket(#[from] TicketError),

    /// The storage backend failed.
    #[error("registry backend error: {0}")]
    Backend(String),

    /// A ticket could not be serialized or deserialized.
    #[error("ticket serialization error: {0}")]
    Serialization(String),

    /// The storage backend did not answer in time.
    #[error("registry operation timed out")]
    Timeout,
}

impl RegistryError {
    /// Whether this error means the ticket does not exist.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Whether this error means the ticket is expired.
    #[must_use]
    pub const fn is_expired(&self) -> bool {
        matches!(self, Self::Expired(_))
    }

    /// Whether this error comes from the storage layer rather than
    /// from ticket semantics.
    #[must_use]
    pub const fn is_storage_failure(&self) -> bool {
        matches!(
            self,
            Self::Backend(_) | Self::Serialization(_) | Self::Timeout
        )
    }
}

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;
