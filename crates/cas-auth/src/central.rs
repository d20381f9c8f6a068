//! The central authentication service.

use std::sync::Arc;

use cas_core::{Event, EventOutcome, EventType, TicketConfig};
use cas_logout::{LogoutManager, LogoutRequest};
use cas_registry::TicketAccess;
use cas_ticket::{
    Authentication, ExpirationPolicy, PROXY_GRANTING_TICKET_PREFIX, RegisteredService,
    SERVICE_TICKET_PREFIX, Service, ServicesManager, TICKET_GRANTING_TICKET_PREFIX, Ticket,
    TicketGrantingTicket, TicketIdGenerator,
};

use crate::assertion::Assertion;
use crate::error::{AuthError, AuthResult};

/// Issues, validates and destroys tickets.
///
/// Every collaborator is injected: the registry access layer for
/// storage, the services manager for per-service policy, and the
/// logout manager for session termination.
pub struct CentralAuthenticationService {
    access: Arc<TicketAccess>,
    services: Arc<dyn ServicesManager>,
    logout: Arc<LogoutManager>,
    ticket_ids: TicketIdGenerator,
    config: TicketConfig,
}

impl CentralAuthenticationService {
    /// Creates the service.
    #[must_use]
    pub fn new(
        access: Arc<TicketAccess>,
        services: Arc<dyn ServicesManager>,
        logout: Arc<LogoutManager>,
        config: TicketConfig,
    ) -> Self {
        let ticket_ids = TicketIdGenerator::new().with_random_length(config.ticket_id_length);
        Self {
            access,
            services,
            logout,
            ticket_ids,
            config,
        }
    }

    fn granting_ticket_policy(&self) -> ExpirationPolicy {
        ExpirationPolicy::IdleAndLifetime {
            idle_timeout_secs: self.config.tgt_idle_timeout_secs,
            max_lifetime_secs: self.config.tgt_max_lifetime_secs,
        }
    }

    fn service_ticket_policy(&self) -> ExpirationPolicy {
        ExpirationPolicy::MultiTimeUseOrTimeout {
            max_uses: self.config.st_max_uses,
            max_lifetime_secs: self.config.st_time_to_live_secs,
        }
    }

    async fn registered_service(&self, service: &Service) -> AuthResult<RegisteredService> {
        let Some(registered) = self.services.find_service(service).await else {
            tracing::debug!(%service, "service not found in the service registry");
            return Err(AuthError::UnauthorizedService(service.id.clone()));
        };
        if !registered.access_enabled {
            tracing::debug!(%service, "service access is disabled");
            return Err(AuthError::UnauthorizedService(service.id.clone()));
        }
        Ok(registered)
    }

    /// Establishes a single sign-on session from a successful
    /// authentication and returns the new ticket-granting ticket id.
    pub async fn create_ticket_granting_ticket(
        &self,
        authentication: Authentication,
    ) -> AuthResult<String> {
        let id = self.ticket_ids.new_id(TICKET_GRANTING_TICKET_PREFIX);
        let principal = authentication.principal.clone();
        let ticket =
            TicketGrantingTicket::new(id.clone(), authentication, self.granting_ticket_policy());

        self.access
            .registry()
            .add_ticket(Ticket::TicketGranting(ticket))
            .await
            .map_err(AuthError::from_registry)?;

        tracing::info!(
            "established single sign-on session [{id}] for principal [{principal}]"
        );
        Event::new(EventType::TicketGrantingTicketCreated, EventOutcome::Success)
            .with_principal(principal)
            .with_ticket(id.clone())
            .record();
        Ok(id)
    }

    /// Grants a service ticket from an active session.
    ///
    /// `credentials_provided` is true when the user just re-validated
    /// fresh credentials on top of the existing session.
    pub async fn grant_service_ticket(
        &self,
        tgt_id: &str,
        service: &Service,
        credentials_provided: bool,
    ) -> AuthResult<String> {
        let Some(ticket) = self
            .access
            .ticket_granting_ticket(tgt_id)
            .await
            .map_err(AuthError::from_registry)?
        else {
            return Err(AuthError::InvalidTicket(tgt_id.to_string()));
        };

        if self
            .access
            .is_granting_ticket_expired(&ticket)
            .await
            .map_err(AuthError::from_registry)?
        {
            // Expired sessions are removed on first touch.
            self.access
                .delete_ticket(tgt_id)
                .await
                .map_err(AuthError::from_registry)?;
            Event::new(EventType::TicketExpired, EventOutcome::Failure)
                .with_ticket(tgt_id)
                .record();
            return Err(AuthError::ExpiredTicket(tgt_id.to_string()));
        }

        let registered = self.registered_service(service).await?;
        if !registered.sso_participant && !credentials_provided && ticket.usage.use_count > 0 {
            return Err(AuthError::SsoParticipationDenied(service.id.clone()));
        }

        let st_id = self.ticket_ids.new_id(SERVICE_TICKET_PREFIX);
        let service_ticket = self
            .access
            .grant_service_ticket(
                tgt_id,
                st_id,
                service.clone(),
                self.service_ticket_policy(),
                credentials_provided,
                self.config.only_track_most_recent_session,
            )
            .await
            .map_err(AuthError::from_registry)?;

        self.access
            .registry()
            .add_ticket(Ticket::Service(service_ticket.clone()))
            .await
            .map_err(AuthError::from_registry)?;

        tracing::info!(
            "granted service ticket [{}] for service [{}] and principal [{}]",
            service_ticket.id,
            service.id,
            ticket.authentication.principal
        );
        Event::new(EventType::ServiceTicketGranted, EventOutcome::Success)
            .with_principal(ticket.authentication.principal)
            .with_ticket(service_ticket.id.clone())
            .with_service(service.id.clone())
            .record();
        Ok(service_ticket.id)
    }

    /// Validates a service ticket presented by a service and builds
    /// the assertion to answer with.
    pub async fn validate_service_ticket(
        &self,
        st_id: &str,
        service: &Service,
    ) -> AuthResult<Assertion> {
        self.registered_service(service).await?;

        let service_ticket = self
            .access
            .validate_service_ticket(st_id, service)
            .await
            .map_err(AuthError::from_registry)?;

        // Validation counted as a use; a now-exhausted ticket is
        // consumed.
        if service_ticket
            .expiration_policy
            .is_expired(&service_ticket.usage)
        {
            self.access
                .delete_ticket(st_id)
                .await
                .map_err(AuthError::from_registry)?;
        }

        let Some(granting) = self
            .access
            .ticket_granting_ticket(&service_ticket.ticket_granting_ticket_id)
            .await
            .map_err(AuthError::from_registry)?
        else {
            return Err(AuthError::InvalidTicket(
                service_ticket.ticket_granting_ticket_id.clone(),
            ));
        };

        let chained = self
            .access
            .chained_authentications(&granting)
            .await
            .map_err(AuthError::from_registry)?;
        let Some(primary) = chained.last().cloned() else {
            return Err(AuthError::InvalidTicket(service_ticket.id.clone()));
        };

        tracing::info!(
            "validated service ticket [{}] for service [{}] and principal [{}]",
            service_ticket.id,
            service.id,
            primary.principal
        );
        Event::new(EventType::ServiceTicketValidated, EventOutcome::Success)
            .with_principal(primary.principal.clone())
            .with_ticket(service_ticket.id.clone())
            .with_service(service.id.clone())
            .record();

        Ok(Assertion {
            primary_authentication: primary,
            chained_authentications: chained,
            from_new_login: service_ticket.from_new_login,
            service: service_ticket.service,
        })
    }

    /// Exchanges a validated service ticket for a proxy-granting
    /// ticket, letting the service act on the user's behalf.
    pub async fn delegate_ticket_granting_ticket(
        &self,
        st_id: &str,
        authentication: Authentication,
    ) -> AuthResult<String> {
        let Some(service_ticket) = self
            .access
            .service_ticket(st_id)
            .await
            .map_err(AuthError::from_registry)?
        else {
            return Err(AuthError::InvalidTicket(st_id.to_string()));
        };

        let registered = self.registered_service(&service_ticket.service).await?;
        if !registered.proxy_allowed {
            return Err(AuthError::ProxyingNotAllowed(
                service_ticket.service.id.clone(),
            ));
        }

        let pgt_id = self.ticket_ids.new_id(PROXY_GRANTING_TICKET_PREFIX);
        let principal = authentication.principal.clone();
        let proxy_ticket = self
            .access
            .grant_proxy_granting_ticket(
                st_id,
                pgt_id,
                authentication,
                self.granting_ticket_policy(),
            )
            .await
            .map_err(AuthError::from_registry)?;

        let id = proxy_ticket.id.clone();
        self.access
            .registry()
            .add_ticket(Ticket::TicketGranting(proxy_ticket))
            .await
            .map_err(AuthError::from_registry)?;

        tracing::info!(
            "delegated proxy-granting ticket [{id}] from service ticket [{st_id}]"
        );
        Event::new(EventType::ProxyGrantingTicketCreated, EventOutcome::Success)
            .with_principal(principal)
            .with_ticket(id.clone())
            .with_service(service_ticket.service.id)
            .record();
        Ok(id)
    }

    /// Destroys a single sign-on session: expires the ticket, runs
    /// single logout for every service it touched, and removes the
    /// whole ticket graph from the registry.
    ///
    /// Returns the logout requests with their delivery status; an
    /// unknown id yields an empty episode.
    pub async fn destroy_ticket_granting_ticket(
        &self,
        tgt_id: &str,
    ) -> AuthResult<Vec<LogoutRequest>> {
        let Some(mut ticket) = self
            .access
            .ticket_granting_ticket(tgt_id)
            .await
            .map_err(AuthError::from_registry)?
        else {
            tracing::debug!(id = tgt_id, "no session to destroy");
            return Ok(Vec::new());
        };

        self.access
            .mark_ticket_expired(tgt_id)
            .await
            .map_err(AuthError::from_registry)?;
        ticket.mark_expired();

        let requests = self.logout.perform_logout(&ticket).await;

        self.access
            .delete_ticket(tgt_id)
            .await
            .map_err(AuthError::from_registry)?;

        tracing::info!(
            "destroyed single sign-on session [{}] for principal [{}]",
            tgt_id,
            ticket.authentication.principal
        );
        Event::new(EventType::Logout, EventOutcome::Success)
            .with_principal(ticket.authentication.principal.clone())
            .with_ticket(tgt_id)
            .record();
        Ok(requests)
    }
}
