//! Service model.
//!
//! A service is the opaque identifier of an application participating
//! in single sign-on, usually a URL. Services are compared with
//! business equality, not byte equality: casing, query strings and
//! container session path parameters do not distinguish two services.

use serde::{Deserialize, Serialize};

/// An application participating in single sign-on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Service {
    /// The service identifier as presented, usually a URL.
    pub id: String,
}

impl Service {
    /// Creates a service from its identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    /// The identifier normalized for business comparison: lowercased,
    /// with the query string and any `;jsessionid=` path parameter
    /// removed.
    #[must_use]
    pub fn normalized_id(&self) -> String {
        let id = self.id.to_lowercase();
        let id = id.split('?').next().unwrap_or_default();
        let id = id.split(";jsessionid=").next().unwrap_or_default();
        id.trim_end_matches('/').to_string()
    }

    /// Whether two services identify the same application.
    #[must_use]
    pub fn matches(&self, other: &Self) -> bool {
        self.normalized_id() == other.normalized_id()
    }
}

impl std::fmt::Display for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.id)
    }
}
