//! The ticket registry storage contract.

use async_trait::async_trait;
use cas_ticket::Ticket;

use crate::error::RegistryResult;

/// Durable keyed storage for tickets.
///
/// Implementations must be thread-safe and provide at least per-key
/// atomicity for `add_ticket`, `update_ticket` and
/// `delete_single_ticket`: two concurrent writes to the same id must
/// serialize, not interleave. Distributed backends additionally make a
/// stored write visible to every node before the call returns.
///
/// A backend stores tickets; it does not interpret them. Cascading
/// expiration, type-checked fetches and mutation semantics live in
/// [`TicketAccess`](crate::access::TicketAccess).
#[async_trait]
pub trait TicketRegistry: Send + Sync {
    /// Inserts a ticket, keyed by its id.
    async fn add_ticket(&self, ticket: Ticket) -> RegistryResult<()>;

    /// Returns the ticket stored under an id, or `None` when the id is
    /// unknown. Absence is not an error; storage faults are.
    async fn get_ticket(&self, id: &str) -> RegistryResult<Option<Ticket>>;

    /// Replaces the stored state of a ticket with the given snapshot.
    async fn update_ticket(&self, ticket: &Ticket) -> RegistryResult<()>;

    /// Removes the entry under an id. Returns whether something was
    /// actually removed; deleting an absent id is not an error.
    async fn delete_single_ticket(&self, id: &str) -> RegistryResult<bool>;

    /// Returns a snapshot of all stored tickets, valid or not. Used by
    /// cleanup and administrative jobs, not by the hot path.
    async fn tickets(&self) -> RegistryResult<Vec<Ticket>>;

    /// Whether tickets fetched from this backend need their granting
    /// chain re-fetched to compute cascading expiration. True for
    /// key-value stores that hand out disconnected snapshots.
    fn needs_callback(&self) -> bool;

    /// Best-effort count of ticket-granting tickets. `None` means the
    /// backend cannot compute this cheaply.
    async fn session_count(&self) -> RegistryResult<Option<u64>> {
        Ok(None)
    }

    /// Best-effort count of service tickets. `None` means the backend
    /// cannot compute this cheaply.
    async fn service_ticket_count(&self) -> RegistryResult<Option<u64>> {
        Ok(None)
    }
}
