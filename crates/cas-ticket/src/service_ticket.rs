//! Service ticket model.

use serde::{Deserialize, Serialize};

use crate::error::{TicketError, TicketResult};
use crate::expiration::{ExpirationPolicy, TicketUsage};
use crate::service::Service;

/// A service ticket: a short-lived token bound to exactly one service
/// and one granting ticket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceTicket {
    /// Ticket id.
    pub id: String,
    /// Id of the ticket-granting ticket this was minted from.
    pub ticket_granting_ticket_id: String,
    /// The service this ticket was granted for.
    pub service: Service,
    /// True only when minted at the moment of fresh credential
    /// validation, false when minted from an established session.
    pub from_new_login: bool,
    /// One-shot latch: a service ticket may be exchanged for a
    /// proxy-granting ticket at most once.
    pub proxy_granted: bool,
    /// Whether the ticket was explicitly expired.
    pub expired: bool,
    /// Usage counters.
    pub usage: TicketUsage,
    /// Attached expiration policy.
    pub expiration_policy: ExpirationPolicy,
}

impl ServiceTicket {
    /// Creates a service ticket. Normally reached through
    /// [`TicketGrantingTicket::grant_service_ticket`](crate::granting::TicketGrantingTicket::grant_service_ticket).
    #[must_use]
    pub fn new(
        id: String,
        ticket_granting_ticket_id: String,
        service: Service,
        from_new_login: bool,
        policy: ExpirationPolicy,
    ) -> Self {
        Self {
            id,
            ticket_granting_ticket_id,
            service,
            from_new_login,
            proxy_granted: false,
            expired: false,
            usage: TicketUsage::new(),
            expiration_policy: policy,
        }
    }

    /// Validates the presented service against the one this ticket was
    /// granted for.
    ///
    /// This is a check *and* a use: the usage counters are updated even
    /// when the comparison fails, so a mismatched validation still
    /// consumes the ticket under a use-counting policy.
    pub fn is_valid_for(&mut self, presented: &Service) -> bool {
        self.usage.update();
        self.service.matches(presented)
    }

    /// Trips the one-shot proxy-grant latch.
    ///
    /// The second and every subsequent call fails; the caller decides
    /// what to build from a successful first call.
    pub fn consume_proxy_grant(&mut self) -> TicketResult<()> {
        if self.proxy_granted {
            return Err(TicketError::ProxyAlreadyGranted(self.id.clone()));
        }
        self.proxy_granted = true;
        self.usage.update();
        Ok(())
    }

    /// Explicitly expires the ticket.
    pub const fn mark_expired(&mut self) {
        self.expired = true;
    }

    /// Whether the ticket is expired on its own account, by policy or
    /// explicit expiration. Expiration of the granting chain is
    /// computed by the registry access layer.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expired || self.expiration_policy.is_expired(&self.usage)
    }
}
