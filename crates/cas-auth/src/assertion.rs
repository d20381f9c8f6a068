//! Validation assertions.

use cas_ticket::{Authentication, Service};

/// The result of a successful service ticket validation, handed to the
/// protocol layer to answer the service.
#[derive(Debug, Clone)]
pub struct Assertion {
    /// The authentication the session was originally established with.
    pub primary_authentication: Authentication,
    /// Authentications along the proxy chain, the closest first and
    /// the original login last.
    pub chained_authentications: Vec<Authentication>,
    /// Whether the validated ticket came from fresh credential
    /// validation rather than an established session.
    pub from_new_login: bool,
    /// The service the ticket was validated for.
    pub service: Service,
}

impl Assertion {
    /// The principal the assertion vouches for.
    #[must_use]
    pub fn principal(&self) -> &str {
        &self.primary_authentication.principal
    }
}
