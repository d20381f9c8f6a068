//! Ticket-granting ticket model.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::authentication::Authentication;
use crate::expiration::{ExpirationPolicy, TicketUsage};
use crate::service::Service;
use crate::service_ticket::ServiceTicket;

/// A ticket-granting ticket: proof of an active single sign-on session.
///
/// A root TGT is created when credentials are validated; an interior
/// (proxy-granting) TGT is created when a service exchanges a validated
/// service ticket to act on the user's behalf. The `services` map
/// records every service granted a ticket from this session and drives
/// single-logout fan-out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketGrantingTicket {
    /// Ticket id.
    pub id: String,
    /// The authentication this session was established with.
    pub authentication: Authentication,
    /// Id of the parent ticket-granting ticket, for proxy-granting
    /// tickets. `None` on roots.
    pub granting_ticket_id: Option<String>,
    /// The service that requested proxying, for proxy-granting tickets.
    pub proxied_by: Option<Service>,
    /// Service-ticket id to service, for every service ticket minted
    /// from this session. Grows monotonically until
    /// [`remove_all_services`](Self::remove_all_services).
    pub services: HashMap<String, Service>,
    /// Ids of proxy-granting tickets issued beneath this session, used
    /// to cascade destruction.
    pub proxy_granting_tickets: Vec<String>,
    /// Whether the ticket was explicitly expired.
    pub expired: bool,
    /// Usage counters.
    pub usage: TicketUsage,
    /// Attached expiration policy.
    pub expiration_policy: ExpirationPolicy,
}

impl TicketGrantingTicket {
    /// Creates a root ticket-granting ticket.
    #[must_use]
    pub fn new(id: String, authentication: Authentication, policy: ExpirationPolicy) -> Self {
        Self {
            id,
            authentication,
            granting_ticket_id: None,
            proxied_by: None,
            services: HashMap::new(),
            proxy_granting_tickets: Vec::new(),
            expired: false,
            usage: TicketUsage::new(),
            expiration_policy: policy,
        }
    }

    /// Creates a proxy-granting ticket attached to an existing session.
    #[must_use]
    pub fn proxy(
        id: String,
        authentication: Authentication,
        granting_ticket_id: String,
        proxied_by: Service,
        policy: ExpirationPolicy,
    ) -> Self {
        Self {
            id,
            authentication,
            granting_ticket_id: Some(granting_ticket_id),
            proxied_by: Some(proxied_by),
            services: HashMap::new(),
            proxy_granting_tickets: Vec::new(),
            expired: false,
            usage: TicketUsage::new(),
            expiration_policy: policy,
        }
    }

    /// Whether this is a root of the ticket graph.
    #[must_use]
    pub const fn is_root(&self) -> bool {
        self.granting_ticket_id.is_none()
    }

    /// Grants a service ticket from this session.
    ///
    /// The new ticket is from a new login iff this is the session's
    /// first grant or fresh credentials were just re-validated. Counts
    /// as a use of this ticket. When `only_track_most_recent` is set,
    /// an earlier entry for a business-equal service is dropped from
    /// the `services` map before the new one is recorded.
    pub fn grant_service_ticket(
        &mut self,
        id: String,
        service: Service,
        policy: ExpirationPolicy,
        credentials_provided: bool,
        only_track_most_recent: bool,
    ) -> ServiceTicket {
        let from_new_login = self.usage.use_count == 0 || credentials_provided;
        self.usage.update();

        if only_track_most_recent {
            self.services.retain(|_, existing| !existing.matches(&service));
        }
        self.services.insert(id.clone(), service.clone());

        ServiceTicket::new(id, self.id.clone(), service, from_new_login, policy)
    }

    /// Records a proxy-granting ticket issued beneath this session.
    pub fn add_proxy_granting_ticket(&mut self, id: impl Into<String>) {
        self.proxy_granting_tickets.push(id.into());
    }

    /// Clears the services map, after a logout episode has notified
    /// everyone. Prevents re-notification if the ticket lingers before
    /// physical deletion.
    pub fn remove_all_services(&mut self) {
        self.services.clear();
    }

    /// Explicitly expires the ticket.
    pub const fn mark_expired(&mut self) {
        self.expired = true;
    }

    /// Whether the ticket is expired on its own account, by policy or
    /// explicit expiration.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expired || self.expiration_policy.is_expired(&self.usage)
    }
}
