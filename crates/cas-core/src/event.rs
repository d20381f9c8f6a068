//! Audit event logging.
//!
//! Structured events for security-relevant ticket operations. Every
//! event carries a timestamp, the operation, its outcome, and the
//! principal/ticket/service it touched when known.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Event type categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    /// A single sign-on session was established.
    TicketGrantingTicketCreated,
    /// A service ticket was granted from a session.
    ServiceTicketGranted,
    /// A service ticket was validated by a service.
    ServiceTicketValidated,
    /// A proxy-granting ticket was issued from a service ticket.
    ProxyGrantingTicketCreated,
    /// A single sign-on session was destroyed.
    Logout,
    /// A single-logout notification was sent to a service.
    LogoutNotification,
    /// A ticket was removed after expiring.
    TicketExpired,
}

/// Outcome of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventOutcome {
    /// Operation succeeded.
    Success,
    /// Operation failed.
    Failure,
}

/// A security event for audit logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Unique event identifier.
    pub id: Uuid,
    /// Timestamp of the event.
    pub timestamp: DateTime<Utc>,
    /// Type of event.
    pub event_type: EventType,
    /// Outcome of the event.
    pub outcome: EventOutcome,
    /// Principal associated with the event.
    pub principal: Option<String>,
    /// Ticket id associated with the event.
    pub ticket_id: Option<String>,
    /// Service id associated with the event.
    pub service: Option<String>,
}

impl Event {
    /// Creates a new event.
    #[must_use]
    pub fn new(event_type: EventType, outcome: EventOutcome) -> Self {
        Self {
            id: Uuid::now_v7(),
            timestamp: Utc::now(),
            event_type,
            outcome,
            principal: None,
            ticket_id: None,
            service: None,
        }
    }

    /// Sets the principal.
    #[must_use]
    pub fn with_principal(mut self, principal: impl Into<String>) -> Self {
        self.principal = Some(principal.into());
        self
    }

    /// Sets the ticket id.
    #[must_use]
    pub fn with_ticket(mut self, ticket_id: impl Into<String>) -> Self {
        self.ticket_id = Some(ticket_id.into());
        self
    }

    /// Sets the service id.
    #[must_use]
    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = Some(service.into());
        self
    }

    /// Emits the event to the audit log.
    pub fn record(&self) {
        tracing::info!(
            target: "cas::audit",
            event = ?self.event_type,
            outcome = ?self.outcome,
            principal = self.principal.as_deref().unwrap_or("-"),
            ticket = self.ticket_id.as_deref().unwrap_or("-"),
            service = self.service.as_deref().unwrap_or("-"),
            "audit"
        );
    }
}
