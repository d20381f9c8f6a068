//! Authentication model.
//!
//! The ticket core stores and forwards authentications produced by the
//! authentication subsystem; it never inspects them beyond principal
//! equality for chaining.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A successful authentication: the principal, its resolved attributes,
/// and the chain of handlers that vouched for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Authentication {
    /// Principal identifier.
    pub principal: String,
    /// Resolved principal attributes.
    pub attributes: HashMap<String, serde_json::Value>,
    /// When the credentials were validated.
    pub authenticated_at: DateTime<Utc>,
    /// Names of the handlers that successfully validated credentials.
    pub successful_handlers: Vec<String>,
}

impl Authentication {
    /// Creates a new authentication for the given principal.
    #[must_use]
    pub fn new(principal: impl Into<String>) -> Self {
        Self {
            principal: principal.into(),
            attributes: HashMap::new(),
            authenticated_at: Utc::now(),
            successful_handlers: Vec::new(),
        }
    }

    /// Adds a principal attribute.
    #[must_use]
    pub fn with_attribute(
        mut self,
        name: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Records a handler that validated the credentials.
    #[must_use]
    pub fn with_handler(mut self, name: impl Into<String>) -> Self {
        self.successful_handlers.push(name.into());
        self
    }

    /// Whether this authentication belongs to the same principal as
    /// another one.
    #[must_use]
    pub fn same_principal(&self, other: &Self) -> bool {
        self.principal == other.principal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_records_attributes_and_handlers() {
        let authentication = Authentication::new("alice")
            .with_attribute("mail", "alice@example.org")
            .with_handler("ldap");

        assert_eq!(authentication.principal, "alice");
        assert_eq!(
            authentication.attributes.get("mail"),
            Some(&serde_json::Value::from("alice@example.org"))
        );
        assert_eq!(authentication.successful_handlers, vec!["ldap"]);
    }

    #[test]
    fn same_principal_ignores_attributes() {
        let a = Authentication::new("alice").with_attribute("mail", "a@example.org");
        let b = Authentication::new("alice");
        let c = Authentication::new("bob");

        assert!(a.same_principal(&b));
        assert!(!a.same_principal(&c));
    }
}
