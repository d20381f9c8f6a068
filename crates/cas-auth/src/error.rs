//! Authentication service error types.

use cas_registry::RegistryError;
use cas_ticket::TicketError;
use thiserror::Error;

/// Errors surfaced by the central authentication service.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The referenced ticket does not exist.
    #[error("invalid ticket: {0}")]
    InvalidTicket(String),

    /// The referenced ticket exists but is expired, directly or
    /// through its granting chain. Equivalent to [`Self::InvalidTicket`]
    /// for authorization purposes, kept distinct for auditing.
    #[error("ticket expired: {0}")]
    ExpiredTicket(String),

    /// The presented service is unknown or barred from using tickets.
    #[error("service {0} is not registered or not allowed")]
    UnauthorizedService(String),

    /// The service requires fresh credentials and may not join an
    /// established single sign-on session.
    #[error("service {0} may not join an existing single sign-on session")]
    SsoParticipationDenied(String),

    /// The service is not authorized to proxy.
    #[error("service {0} is not authorized to proxy")]
    ProxyingNotAllowed(String),

    /// A service ticket was validated against the wrong service.
    #[error("service ticket {0} was not issued to the presented service")]
    ServiceMismatch(String),

    /// A ticket state transition was rejected, such as a second
    /// proxy-grant attempt on the same service ticket.
    #[error(transparent)]
    Ticket(#[from] TicketError),

    /// The registry storage layer failed.
    #[error(transparent)]
    Registry(RegistryError),
}

impl AuthError {
    /// Maps a registry error onto this taxonomy.
    #[must_use]
    pub fn from_registry(error: RegistryError) -> Self {
        match error {
            RegistryError::NotFound(id) => Self::InvalidTicket(id),
            RegistryError::Expired(id) => Self::ExpiredTicket(id),
            RegistryError::ServiceMismatch(id) => Self::ServiceMismatch(id),
            RegistryError::Ticket(e) => Self::Ticket(e),
            other => Self::Registry(other),
        }
    }

    /// Whether the caller presented a ticket that is unknown or
    /// expired.
    #[must_use]
    pub const fn is_ticket_rejected(&self) -> bool {
        matches!(self, Self::InvalidTicket(_) | Self::ExpiredTicket(_))
    }
}

/// Result type for authentication service operations.
pub type AuthResult<T> = Result<T, AuthError>;
