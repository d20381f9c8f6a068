//! Expired-ticket cleanup.
//!
//! Registries do not expire entries on their own; a periodic sweep
//! walks the stored tickets and removes the expired ones. Expired
//! ticket-granting tickets are reported to a listener first so single
//! logout can run before the session disappears.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use cas_ticket::{Ticket, TicketGrantingTicket};

use crate::access::TicketAccess;
use crate::error::RegistryResult;

/// Notified when the cleaner finds an expired single sign-on session,
/// before the session is deleted.
#[async_trait]
pub trait ExpiredTicketListener: Send + Sync {
    /// Called once per expired ticket-granting ticket per sweep.
    async fn on_session_expired(&self, ticket: &TicketGrantingTicket);
}

/// Periodic sweep over the registry.
pub struct RegistryCleaner {
    access: Arc<TicketAccess>,
    listener: Option<Arc<dyn ExpiredTicketListener>>,
    interval: Duration,
}

impl RegistryCleaner {
    /// Creates a cleaner sweeping at the given interval.
    #[must_use]
    pub fn new(access: Arc<TicketAccess>, interval: Duration) -> Self {
        Self {
            access,
            listener: None,
            interval,
        }
    }

    /// Attaches a listener for expired sessions.
    #[must_use]
    pub fn with_listener(mut self, listener: Arc<dyn ExpiredTicketListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    /// Runs one sweep. Returns the number of tickets removed.
    pub async fn clean_once(&self) -> RegistryResult<u64> {
        let mut removed = 0;
        for ticket in self.access.registry().tickets().await? {
            if !self.access.is_expired(&ticket).await? {
                continue;
            }
            if let Ticket::TicketGranting(tgt) = &ticket {
                tracing::debug!(id = %tgt.id, "cleaning up expired ticket-granting ticket");
                if let Some(listener) = &self.listener {
                    listener.on_session_expired(tgt).await;
                }
            } else {
                tracing::debug!(id = ticket.id(), "cleaning up expired service ticket");
            }
            // A child swept earlier in the same pass may already be
            // gone by the time its parent cascades; that counts once.
            if self.access.delete_ticket(ticket.id()).await? {
                removed += 1;
            }
        }
        if removed > 0 {
            tracing::info!(removed, "registry cleaner removed expired tickets");
        }
        Ok(removed)
    }

    /// Spawns the sweep loop on the runtime. The first sweep happens
    /// one interval after start.
    pub fn spawn(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let start = tokio::time::Instant::now() + self.interval;
            let mut ticker = tokio::time::interval_at(start, self.interval);
            loop {
                ticker.tick().await;
                if let Err(error) = self.clean_once().await {
                    tracing::warn!(%error, "registry cleanup sweep failed");
                }
            }
        })
    }
}
