//! Registry access layer.
//!
//! Backends hand out disconnected ticket snapshots; this layer makes
//! them behave like live tickets. Every state-changing operation locks
//! the ticket id, fetches a fresh snapshot, applies the mutation, and
//! flushes the result back through
//! [`TicketRegistry::update_ticket`] before returning, so a caller
//! never observes a successful mutation that is not yet durable. When the
//! flush fails the snapshot is discarded, so the store and the
//! caller's view cannot diverge.

use std::collections::HashSet;
use std::sync::Arc;

use cas_ticket::{
    Authentication, ExpirationPolicy, Service, ServiceTicket, Ticket, TicketGrantingTicket,
    TicketKind,
};
use dashmap::DashMap;
use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::sync::Mutex;

use crate::error::{RegistryError, RegistryResult};
use crate::provider::TicketRegistry;

/// Live view over a ticket registry.
///
/// Mutations on a single ticket id are serialized through a keyed
/// lock, which upholds the one-shot and use-count invariants on a
/// single node; a distributed backend contributes per-key atomicity
/// for the write itself.
pub struct TicketAccess {
    registry: Arc<dyn TicketRegistry>,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl TicketAccess {
    /// Creates an access layer over a registry backend.
    #[must_use]
    pub fn new(registry: Arc<dyn TicketRegistry>) -> Self {
        Self {
            registry,
            locks: DashMap::new(),
        }
    }

    /// The underlying registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<dyn TicketRegistry> {
        &self.registry
    }

    fn lock_for(&self, id: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Runs a mutation against the stored ticket under the id's lock
    /// and flushes the new state before returning. `None` when the id
    /// is unknown. Operations that need async checks between fetch and
    /// mutation hold the lock themselves instead.
    async fn with_persistence<T, F>(&self, id: &str, mutate: F) -> RegistryResult<Option<T>>
    where
        F: FnOnce(&mut Ticket) -> T + Send,
    {
        let lock = self.lock_for(id);
        let _guard = lock.lock().await;

        let Some(mut ticket) = self.registry.get_ticket(id).await? else {
            return Ok(None);
        };
        let out = mutate(&mut ticket);
        self.registry.update_ticket(&ticket).await?;
        Ok(Some(out))
    }

    /// Fetches a ticket of any kind.
    pub async fn ticket(&self, id: &str) -> RegistryResult<Option<Ticket>> {
        self.registry.get_ticket(id).await
    }

    /// Fetches a ticket-granting ticket. An id that stores a different
    /// kind is a type mismatch, not an absence.
    pub async fn ticket_granting_ticket(
        &self,
        id: &str,
    ) -> RegistryResult<Option<TicketGrantingTicket>> {
        match self.registry.get_ticket(id).await? {
            None => Ok(None),
            Some(Ticket::TicketGranting(ticket)) => Ok(Some(ticket)),
            Some(other) => Err(RegistryError::TypeMismatch {
                id: id.to_string(),
                expected: TicketKind::TicketGranting,
                actual: other.kind(),
            }),
        }
    }

    /// Fetches a service ticket. An id that stores a different kind is
    /// a type mismatch, not an absence.
    pub async fn service_ticket(&self, id: &str) -> RegistryResult<Option<ServiceTicket>> {
        match self.registry.get_ticket(id).await? {
            None => Ok(None),
            Some(Ticket::Service(ticket)) => Ok(Some(ticket)),
            Some(other) => Err(RegistryError::TypeMismatch {
                id: id.to_string(),
                expected: TicketKind::Service,
                actual: other.kind(),
            }),
        }
    }

    async fn require_granting(&self, id: &str) -> RegistryResult<TicketGrantingTicket> {
        self.ticket_granting_ticket(id)
            .await?
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))
    }

    async fn require_service(&self, id: &str) -> RegistryResult<ServiceTicket> {
        self.service_ticket(id)
            .await?
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))
    }

    /// Whether a ticket is expired, including through its granting
    /// chain.
    ///
    /// When the backend does not need a callback its snapshots already
    /// reflect chain expiration and the local answer stands. Otherwise
    /// ancestors are re-fetched by id; an id that no longer resolves
    /// counts as expired.
    pub async fn is_expired(&self, ticket: &Ticket) -> RegistryResult<bool> {
        if ticket.is_expired() {
            return Ok(true);
        }
        if !self.registry.needs_callback() {
            return Ok(false);
        }
        self.is_chain_expired(ticket.granting_ticket_id()).await
    }

    /// Chain-aware expiration check for a ticket-granting ticket.
    pub async fn is_granting_ticket_expired(
        &self,
        ticket: &TicketGrantingTicket,
    ) -> RegistryResult<bool> {
        if ticket.is_expired() {
            return Ok(true);
        }
        if !self.registry.needs_callback() {
            return Ok(false);
        }
        self.is_chain_expired(ticket.granting_ticket_id.as_deref())
            .await
    }

    /// Chain-aware expiration check for a service ticket.
    pub async fn is_service_ticket_expired(&self, ticket: &ServiceTicket) -> RegistryResult<bool> {
        if ticket.is_expired() {
            return Ok(true);
        }
        if !self.registry.needs_callback() {
            return Ok(false);
        }
        self.is_chain_expired(Some(&ticket.ticket_granting_ticket_id))
            .await
    }

    async fn is_chain_expired(&self, parent: Option<&str>) -> RegistryResult<bool> {
        let mut seen = HashSet::new();
        let mut next = parent.map(str::to_string);
        while let Some(id) = next {
            if !seen.insert(id.clone()) {
                tracing::warn!(%id, "granting chain loops; treating as expired");
                return Ok(true);
            }
            match self.registry.get_ticket(&id).await? {
                None => return Ok(true),
                Some(Ticket::TicketGranting(ancestor)) => {
                    if ancestor.is_expired() {
                        return Ok(true);
                    }
                    next = ancestor.granting_ticket_id;
                }
                Some(_) => {
                    tracing::warn!(%id, "granting chain points at a non-granting ticket");
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    /// The authentications along the granting chain, this ticket's
    /// first, the root's last.
    pub async fn chained_authentications(
        &self,
        ticket: &TicketGrantingTicket,
    ) -> RegistryResult<Vec<Authentication>> {
        let mut chain = vec![ticket.authentication.clone()];
        let mut seen = HashSet::new();
        seen.insert(ticket.id.clone());

        let mut next = ticket.granting_ticket_id.clone();
        while let Some(id) = next {
            if !seen.insert(id.clone()) {
                break;
            }
            match self.registry.get_ticket(&id).await? {
                Some(Ticket::TicketGranting(ancestor)) => {
                    chain.push(ancestor.authentication);
                    next = ancestor.granting_ticket_id;
                }
                _ => break,
            }
        }
        Ok(chain)
    }

    /// Grants a service ticket from a stored ticket-granting ticket.
    ///
    /// The granting ticket's new state (use count, services map) is
    /// flushed before this returns. The returned service ticket is not
    /// persisted; the caller adds it to the registry.
    pub async fn grant_service_ticket(
        &self,
        tgt_id: &str,
        st_id: String,
        service: Service,
        policy: ExpirationPolicy,
        credentials_provided: bool,
        only_track_most_recent: bool,
    ) -> RegistryResult<ServiceTicket> {
        let lock = self.lock_for(tgt_id);
        let _guard = lock.lock().await;

        let mut ticket = self.require_granting(tgt_id).await?;
        if self.is_granting_ticket_expired(&ticket).await? {
            return Err(RegistryError::Expired(tgt_id.to_string()));
        }

        let service_ticket = ticket.grant_service_ticket(
            st_id,
            service,
            policy,
            credentials_provided,
            only_track_most_recent,
        );
        self.registry
            .update_ticket(&Ticket::TicketGranting(ticket))
            .await?;

        Ok(service_ticket)
    }

    /// Validates a service ticket against the presented service.
    ///
    /// Validation is also a use: the ticket's usage counters are
    /// updated and flushed even when the services do not match, so a
    /// use-counting policy sees the attempt either way.
    pub async fn validate_service_ticket(
        &self,
        st_id: &str,
        presented: &Service,
    ) -> RegistryResult<ServiceTicket> {
        let lock = self.lock_for(st_id);
        let _guard = lock.lock().await;

        let mut ticket = self.require_service(st_id).await?;
        if self.is_service_ticket_expired(&ticket).await? {
            return Err(RegistryError::Expired(st_id.to_string()));
        }

        let valid = ticket.is_valid_for(presented);
        self.registry
            .update_ticket(&Ticket::Service(ticket.clone()))
            .await?;

        if valid {
            Ok(ticket)
        } else {
            tracing::debug!(
                id = st_id,
                presented = %presented,
                "service ticket does not match presented service"
            );
            Err(RegistryError::ServiceMismatch(st_id.to_string()))
        }
    }

    /// Exchanges a service ticket for a proxy-granting ticket.
    ///
    /// The one-shot latch is checked and tripped under the service
    /// ticket's lock, so concurrent attempts produce exactly one
    /// winner. The new proxy-granting ticket attaches to the service
    /// ticket's own granting ticket, keeping the authentication chain
    /// flat, and is recorded on that parent for cascaded destruction.
    /// The returned ticket is not persisted; the caller adds it.
    pub async fn grant_proxy_granting_ticket(
        &self,
        st_id: &str,
        pgt_id: String,
        authentication: Authentication,
        policy: ExpirationPolicy,
    ) -> RegistryResult<TicketGrantingTicket> {
        let lock = self.lock_for(st_id);
        let _guard = lock.lock().await;

        let mut service_ticket = self.require_service(st_id).await?;
        if self.is_service_ticket_expired(&service_ticket).await? {
            return Err(RegistryError::Expired(st_id.to_string()));
        }

        service_ticket.consume_proxy_grant()?;
        self.registry
            .update_ticket(&Ticket::Service(service_ticket.clone()))
            .await?;

        let proxy_ticket = TicketGrantingTicket::proxy(
            pgt_id,
            authentication,
            service_ticket.ticket_granting_ticket_id.clone(),
            service_ticket.service.clone(),
            policy,
        );

        let parent_id = service_ticket.ticket_granting_ticket_id.clone();
        let parent_lock = self.lock_for(&parent_id);
        let _parent_guard = parent_lock.lock().await;
        match self.ticket_granting_ticket(&parent_id).await? {
            Some(mut parent) => {
                parent.add_proxy_granting_ticket(&proxy_ticket.id);
                self.registry
                    .update_ticket(&Ticket::TicketGranting(parent))
                    .await?;
            }
            None => return Err(RegistryError::Expired(st_id.to_string())),
        }

        Ok(proxy_ticket)
    }

    /// Explicitly expires a stored ticket. A no-op for unknown ids.
    pub async fn mark_ticket_expired(&self, id: &str) -> RegistryResult<()> {
        self.with_persistence(id, Ticket::mark_expired).await?;
        Ok(())
    }

    /// Clears the services map of a stored ticket-granting ticket. A
    /// no-op for unknown ids and ids of other kinds.
    pub async fn remove_all_services(&self, tgt_id: &str) -> RegistryResult<()> {
        self.with_persistence(tgt_id, |ticket| {
            if let Ticket::TicketGranting(tgt) = ticket {
                tgt.remove_all_services();
            }
        })
        .await?;
        Ok(())
    }

    /// Deletes a ticket, cascading through the graph: a
    /// ticket-granting ticket takes its service tickets and descendant
    /// proxy-granting tickets with it. Returns whether the root entry
    /// existed.
    pub async fn delete_ticket(&self, id: &str) -> RegistryResult<bool> {
        self.delete_recursive(id).await
    }

    fn delete_recursive<'a>(&'a self, id: &'a str) -> BoxFuture<'a, RegistryResult<bool>> {
        async move {
            let Some(ticket) = self.registry.get_ticket(id).await? else {
                return Ok(false);
            };

            if let Ticket::TicketGranting(tgt) = &ticket {
                tracing::debug!(id, "removing children of ticket from the registry");
                for st_id in tgt.services.keys() {
                    self.registry.delete_single_ticket(st_id).await?;
                    self.locks.remove(st_id);
                }
                for pgt_id in &tgt.proxy_granting_tickets {
                    self.delete_recursive(pgt_id).await?;
                }
            }

            tracing::debug!(id, "removing ticket from the registry");
            let removed = self.registry.delete_single_ticket(id).await?;
            self.locks.remove(id);
            Ok(removed)
        }
        .boxed()
    }
}
