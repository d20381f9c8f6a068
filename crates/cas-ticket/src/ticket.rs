//! The ticket sum type and kind dispatch.

use serde::{Deserialize, Serialize};

use crate::expiration::{ExpirationPolicy, TicketUsage};
use crate::granting::TicketGrantingTicket;
use crate::service_ticket::ServiceTicket;

/// Id prefix for ticket-granting tickets.
pub const TICKET_GRANTING_TICKET_PREFIX: &str = "TGT";
/// Id prefix for proxy-granting tickets.
pub const PROXY_GRANTING_TICKET_PREFIX: &str = "PGT";
/// Id prefix for service tickets.
pub const SERVICE_TICKET_PREFIX: &str = "ST";
/// Id prefix for proxy tickets.
pub const PROXY_TICKET_PREFIX: &str = "PT";

/// The kind of a ticket.
///
/// Ticket ids are opaque beyond their prefix; the prefix decides the
/// kind and nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TicketKind {
    /// A ticket-granting ticket, root or interior node of the graph.
    TicketGranting,
    /// A service ticket, leaf node bound to one service.
    Service,
}

impl TicketKind {
    /// The id prefix minted for new tickets of this kind.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::TicketGranting => TICKET_GRANTING_TICKET_PREFIX,
            Self::Service => SERVICE_TICKET_PREFIX,
        }
    }

    /// Determines the kind of a ticket id from its prefix.
    #[must_use]
    pub fn from_id(id: &str) -> Option<Self> {
        let prefix = id.split('-').next().unwrap_or_default();
        match prefix {
            TICKET_GRANTING_TICKET_PREFIX | PROXY_GRANTING_TICKET_PREFIX => {
                Some(Self::TicketGranting)
            }
            SERVICE_TICKET_PREFIX | PROXY_TICKET_PREFIX => Some(Self::Service),
            _ => None,
        }
    }
}

impl std::fmt::Display for TicketKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TicketGranting => f.write_str("ticket-granting"),
            Self::Service => f.write_str("service"),
        }
    }
}

/// A ticket stored in the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Ticket {
    /// A ticket-granting ticket.
    TicketGranting(TicketGrantingTicket),
    /// A service ticket.
    Service(ServiceTicket),
}

impl Ticket {
    /// The ticket id.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::TicketGranting(ticket) => &ticket.id,
            Self::Service(ticket) => &ticket.id,
        }
    }

    /// The kind discriminant.
    #[must_use]
    pub const fn kind(&self) -> TicketKind {
        match self {
            Self::TicketGranting(_) => TicketKind::TicketGranting,
            Self::Service(_) => TicketKind::Service,
        }
    }

    /// The usage counters.
    #[must_use]
    pub const fn usage(&self) -> &TicketUsage {
        match self {
            Self::TicketGranting(ticket) => &ticket.usage,
            Self::Service(ticket) => &ticket.usage,
        }
    }

    /// The attached expiration policy.
    #[must_use]
    pub const fn expiration_policy(&self) -> &ExpirationPolicy {
        match self {
            Self::TicketGranting(ticket) => &ticket.expiration_policy,
            Self::Service(ticket) => &ticket.expiration_policy,
        }
    }

    /// Id of the granting ticket this ticket descends from, when it is
    /// not a root.
    #[must_use]
    pub fn granting_ticket_id(&self) -> Option<&str> {
        match self {
            Self::TicketGranting(ticket) => ticket.granting_ticket_id.as_deref(),
            Self::Service(ticket) => Some(&ticket.ticket_granting_ticket_id),
        }
    }

    /// Whether this ticket is expired on its own account: by its policy
    /// or because it was explicitly expired. Cascading expiration
    /// through the granting chain is computed by the registry access
    /// layer, which can resolve parent ids.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        match self {
            Self::TicketGranting(ticket) => ticket.is_expired(),
            Self::Service(ticket) => ticket.is_expired(),
        }
    }

    /// Explicitly expires the ticket. Expiration is monotonic: there is
    /// no way back.
    pub fn mark_expired(&mut self) {
        match self {
            Self::TicketGranting(ticket) => ticket.mark_expired(),
            Self::Service(ticket) => ticket.mark_expired(),
        }
    }
}
