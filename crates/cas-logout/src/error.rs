//! Logout error types.

use thiserror::Error;

/// Errors raised while delivering a logout notification.
///
/// These never leave the logout coordinator as failures of the overall
/// flow; the manager downgrades them to a recorded
/// [`Failure`](crate::request::LogoutRequestStatus::Failure) status.
#[derive(Debug, Error)]
pub enum LogoutError {
    /// The HTTP client could not be constructed.
    #[error("logout http client error: {0}")]
    Client(String),

    /// A back-channel notification could not be delivered.
    #[error("logout notification failed: {0}")]
    Notification(String),

    /// The service has no resolvable logout endpoint.
    #[error("service {0} has no logout URL")]
    MissingUrl(String),
}

/// Result type for logout operations.
pub type LogoutResult<T> = Result<T, LogoutError>;
