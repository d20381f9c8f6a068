//! Registered service policy.
//!
//! The ticket core consults a service registry to decide whether a
//! presented service may use tickets at all, whether it may join an
//! existing single sign-on session, whether it may proxy, and how it is
//! told about logout.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::service::Service;

/// How a service is notified of single logout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LogoutKind {
    /// Server-to-server HTTP notification.
    #[default]
    BackChannel,
    /// Browser-redirect-driven notification.
    FrontChannel,
    /// The service is never notified.
    None,
}

/// Access policy for a registered service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisteredService {
    /// Identifier prefix the registered entry covers. A presented
    /// service matches when its normalized id starts with this value.
    pub service_id: String,
    /// Display name.
    pub name: String,
    /// Whether the service may use tickets at all.
    pub access_enabled: bool,
    /// Whether the service may join an existing single sign-on session
    /// without fresh credentials.
    pub sso_participant: bool,
    /// Whether the service may exchange a validated service ticket for
    /// a proxy-granting ticket.
    pub proxy_allowed: bool,
    /// How the service is notified of logout.
    pub logout_kind: LogoutKind,
    /// Logout endpoint, when it differs from the service identifier.
    pub logout_url: Option<Url>,
}

impl RegisteredService {
    /// Creates a registered service with open access, single sign-on
    /// participation, no proxying, and back-channel logout.
    #[must_use]
    pub fn new(service_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            service_id: service_id.into(),
            name: name.into(),
            access_enabled: true,
            sso_participant: true,
            proxy_allowed: false,
            logout_kind: LogoutKind::BackChannel,
            logout_url: None,
        }
    }

    /// Sets whether the service may use tickets.
    #[must_use]
    pub const fn with_access_enabled(mut self, enabled: bool) -> Self {
        self.access_enabled = enabled;
        self
    }

    /// Sets whether the service may join an existing session.
    #[must_use]
    pub const fn with_sso_participant(mut self, participant: bool) -> Self {
        self.sso_participant = participant;
        self
    }

    /// Sets whether the service may proxy.
    #[must_use]
    pub const fn with_proxy_allowed(mut self, allowed: bool) -> Self {
        self.proxy_allowed = allowed;
        self
    }

    /// Sets the logout notification kind.
    #[must_use]
    pub const fn with_logout_kind(mut self, kind: LogoutKind) -> Self {
        self.logout_kind = kind;
        self
    }

    /// Sets the logout endpoint.
    #[must_use]
    pub fn with_logout_url(mut self, url: Url) -> Self {
        self.logout_url = Some(url);
        self
    }

    /// Whether a presented service falls under this registration.
    #[must_use]
    pub fn covers(&self, service: &Service) -> bool {
        service
            .normalized_id()
            .starts_with(&self.service_id.to_lowercase())
    }
}

/// Resolves presented services to their registered policy.
#[async_trait]
pub trait ServicesManager: Send + Sync {
    /// Finds the registration covering a presented service, if any.
    async fn find_service(&self, service: &Service) -> Option<RegisteredService>;
}

/// In-memory service registry.
///
/// Registrations are matched in insertion order; the first entry that
/// covers the presented service wins.
#[derive(Debug, Default)]
pub struct InMemoryServicesManager {
    services: RwLock<Vec<RegisteredService>>,
}

impl InMemoryServicesManager {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a registration.
    pub fn register(&self, service: RegisteredService) {
        self.services.write().push(service);
    }
}

#[async_trait]
impl ServicesManager for InMemoryServicesManager {
    async fn find_service(&self, service: &Service) -> Option<RegisteredService> {
        self.services
            .read()
            .iter()
            .find(|registered| registered.covers(service))
            .cloned()
    }
}
