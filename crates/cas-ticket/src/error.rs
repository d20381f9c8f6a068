//! Ticket error types.

use thiserror::Error;

/// Errors raised by ticket state transitions.
#[derive(Debug, Error)]
pub enum TicketError {
    /// The one-shot proxy-grant latch on a service ticket has already
    /// been consumed.
    #[error("a proxy-granting ticket was already issued for service ticket {0}")]
    ProxyAlreadyGranted(String),
}

/// Result type for ticket operations.
pub type TicketResult<T> = Result<T, TicketError>;
