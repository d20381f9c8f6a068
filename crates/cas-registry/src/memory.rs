//! In-memory ticket registry.

use async_trait::async_trait;
use cas_ticket::{Ticket, TicketKind};
use dashmap::DashMap;

use crate::error::RegistryResult;
use crate::provider::TicketRegistry;

/// The reference registry backend: a concurrent keyed map with
/// lock-free reads and atomic per-key insert and remove.
///
/// Values handed out are clones, so this backend behaves like a
/// distributed one from the caller's point of view and reports
/// `needs_callback() == true`.
#[derive(Debug, Default)]
pub struct InMemoryTicketRegistry {
    tickets: DashMap<String, Ticket>,
}

impl InMemoryTicketRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored tickets of any kind.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tickets.len()
    }

    /// Whether the registry holds no tickets.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tickets.is_empty()
    }

    fn count_kind(&self, kind: TicketKind) -> u64 {
        self.tickets
            .iter()
            .filter(|entry| entry.value().kind() == kind)
            .count() as u64
    }
}

#[async_trait]
impl TicketRegistry for InMemoryTicketRegistry {
    async fn add_ticket(&self, ticket: Ticket) -> RegistryResult<()> {
        tracing::debug!(id = ticket.id(), "adding ticket to registry");
        self.tickets.insert(ticket.id().to_string(), ticket);
        Ok(())
    }

    async fn get_ticket(&self, id: &str) -> RegistryResult<Option<Ticket>> {
        Ok(self.tickets.get(id).map(|entry| entry.value().clone()))
    }

    async fn update_ticket(&self, ticket: &Ticket) -> RegistryResult<()> {
        self.tickets
            .insert(ticket.id().to_string(), ticket.clone());
        Ok(())
    }

    async fn delete_single_ticket(&self, id: &str) -> RegistryResult<bool> {
        let removed = self.tickets.remove(id).is_some();
        if removed {
            tracing::debug!(id, "removed ticket from registry");
        }
        Ok(removed)
    }

    async fn tickets(&self) -> RegistryResult<Vec<Ticket>> {
        Ok(self
            .tickets
            .iter()
            .map(|entry| entry.value().clone())
            .collect())
    }

    fn needs_callback(&self) -> bool {
        true
    }

    async fn session_count(&self) -> RegistryResult<Option<u64>> {
        Ok(Some(self.count_kind(TicketKind::TicketGranting)))
    }

    async fn service_ticket_count(&self) -> RegistryResult<Option<u64>> {
        Ok(Some(self.count_kind(TicketKind::Service)))
    }
}
