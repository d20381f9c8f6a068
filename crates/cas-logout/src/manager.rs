//! The logout coordinator.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use cas_core::{Event, EventOutcome, EventType, LogoutConfig};
use cas_registry::{ExpiredTicketListener, TicketAccess};
use cas_ticket::{LogoutKind, RegisteredService, ServicesManager, TicketGrantingTicket};
use futures::StreamExt;
use url::Url;

use crate::error::LogoutResult;
use crate::handler::{DefaultSingleLogoutMessageHandler, SingleLogoutMessageHandler};
use crate::message::{SamlLogoutMessageCreator, SingleLogoutMessageCreator};
use crate::request::{LogoutChannel, LogoutRequest, LogoutRequestStatus};

/// Drives single logout for a terminating session.
///
/// For every service recorded on the ticket-granting ticket, the
/// manager resolves the registered policy, builds a logout message,
/// and either delivers it over the back channel or stages it for the
/// front-channel redirect sequence. Afterwards the session's services
/// map is cleared so a lingering ticket cannot be re-notified.
pub struct LogoutManager {
    access: Arc<TicketAccess>,
    services: Arc<dyn ServicesManager>,
    creator: Arc<dyn SingleLogoutMessageCreator>,
    handlers: Vec<Arc<dyn SingleLogoutMessageHandler>>,
    config: LogoutConfig,
}

impl LogoutManager {
    /// Creates a manager with the default SAML message creator and the
    /// default back-channel handler.
    ///
    /// ## Errors
    ///
    /// Returns an error if the back-channel HTTP client cannot be
    /// built.
    pub fn new(
        access: Arc<TicketAccess>,
        services: Arc<dyn ServicesManager>,
        config: LogoutConfig,
    ) -> LogoutResult<Self> {
        let handler =
            DefaultSingleLogoutMessageHandler::new(Duration::from_millis(config.http_timeout_ms))?;
        Ok(Self {
            access,
            services,
            creator: Arc::new(SamlLogoutMessageCreator),
            handlers: vec![Arc::new(handler)],
            config,
        })
    }

    /// Replaces the message creator.
    #[must_use]
    pub fn with_creator(mut self, creator: Arc<dyn SingleLogoutMessageCreator>) -> Self {
        self.creator = creator;
        self
    }

    /// Adds a handler to the chain. Handlers are consulted in `order`,
    /// lowest first; insertion order breaks ties.
    #[must_use]
    pub fn with_handler(mut self, handler: Arc<dyn SingleLogoutMessageHandler>) -> Self {
        self.handlers.push(handler);
        self.handlers.sort_by_key(|h| h.order());
        self
    }

    /// Runs a logout episode for a terminating session.
    ///
    /// Returns one request per notified service with its final (or
    /// staged) status. Best-effort: failures are recorded, never
    /// raised. The session's services map is cleared before this
    /// returns, whether or not notifications succeeded.
    pub async fn perform_logout(&self, ticket: &TicketGrantingTicket) -> Vec<LogoutRequest> {
        let mut completed = Vec::new();

        if self.config.disable_single_logout {
            tracing::debug!(id = %ticket.id, "single logout is disabled");
        } else {
            let mut back = Vec::new();
            let mut front = Vec::new();

            for (st_id, service) in &ticket.services {
                let Some(registered) = self.services.find_service(service).await else {
                    tracing::debug!(%service, "service not registered, skipping logout");
                    continue;
                };
                let channel = match registered.logout_kind {
                    LogoutKind::None => continue,
                    LogoutKind::BackChannel => LogoutChannel::BackChannel,
                    LogoutKind::FrontChannel => LogoutChannel::FrontChannel,
                };
                let logout_url = registered
                    .logout_url
                    .clone()
                    .or_else(|| Url::parse(&service.id).ok());
                let request =
                    LogoutRequest::new(st_id.clone(), service.clone(), logout_url, channel);
                match channel {
                    LogoutChannel::BackChannel => back.push((request, registered)),
                    LogoutChannel::FrontChannel => front.push(request),
                }
            }

            let notified: Vec<LogoutRequest> = futures::stream::iter(back)
                .map(|(request, registered)| self.notify(request, registered))
                .buffer_unordered(self.config.concurrency.max(1))
                .collect()
                .await;
            completed.extend(notified);

            for mut request in front {
                if self.config.front_channel_enabled {
                    tracing::debug!(
                        service = %request.service,
                        "staged front-channel logout for browser delivery"
                    );
                } else {
                    tracing::debug!(
                        service = %request.service,
                        "front-channel logout disabled, recording failure"
                    );
                    request.mark(LogoutRequestStatus::Failure);
                }
                completed.push(request);
            }
        }

        if let Err(error) = self.access.remove_all_services(&ticket.id).await {
            tracing::warn!(%error, id = %ticket.id, "failed to clear services after logout");
        }

        completed
    }

    async fn notify(
        &self,
        mut request: LogoutRequest,
        registered: RegisteredService,
    ) -> LogoutRequest {
        let Some(handler) = self.handlers.iter().find(|h| h.supports(&registered)) else {
            tracing::warn!(service = %request.service, "no logout handler supports service");
            request.mark(LogoutRequestStatus::Failure);
            return request;
        };

        let message = self.creator.create(&request);
        let outcome = match handler.send(&request, &message).await {
            Ok(()) => {
                tracing::debug!(service = %request.service, "logout notification delivered");
                request.mark(LogoutRequestStatus::Success);
                EventOutcome::Success
            }
            Err(error) => {
                tracing::warn!(%error, service = %request.service, "logout notification failed");
                request.mark(LogoutRequestStatus::Failure);
                EventOutcome::Failure
            }
        };
        Event::new(EventType::LogoutNotification, outcome)
            .with_ticket(request.service_ticket_id.clone())
            .with_service(request.service.id.clone())
            .record();

        request
    }
}

#[async_trait]
impl ExpiredTicketListener for LogoutManager {
    async fn on_session_expired(&self, ticket: &TicketGrantingTicket) {
        tracing::info!(id = %ticket.id, "single logout for timed-out session");
        self.perform_logout(ticket).await;
    }
}

#[cfg(test)]
mod tests {
    use cas_registry::InMemoryTicketRegistry;
    use cas_ticket::{
        Authentication, ExpirationPolicy, InMemoryServicesManager, Service, Ticket,
    };
    use parking_lot::Mutex;

    use super::*;
    use crate::message::SingleLogoutMessage;

    /// Records sends instead of going over the network.
    struct RecordingHandler {
        sent: Mutex<Vec<String>>,
        fail: bool,
    }

    impl RecordingHandler {
        fn new(fail: bool) -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                fail,
            }
        }
    }

    #[async_trait]
    impl SingleLogoutMessageHandler for RecordingHandler {
        fn supports(&self, _service: &RegisteredService) -> bool {
            true
        }

        fn order(&self) -> i32 {
            -10
        }

        async fn send(
            &self,
            _request: &LogoutRequest,
            message: &SingleLogoutMessage,
        ) -> LogoutResult<()> {
            self.sent.lock().push(message.session_index.clone());
            if self.fail {
                Err(crate::error::LogoutError::Notification(
                    "connection refused".to_string(),
                ))
            } else {
                Ok(())
            }
        }
    }

    struct Fixture {
        access: Arc<TicketAccess>,
        manager: LogoutManager,
        handler: Arc<RecordingHandler>,
    }

    async fn fixture(fail: bool, config: LogoutConfig) -> (Fixture, TicketGrantingTicket) {
        let access = Arc::new(TicketAccess::new(Arc::new(InMemoryTicketRegistry::new())));
        let services = Arc::new(InMemoryServicesManager::new());
        services.register(RegisteredService::new("https://app1.example", "app1"));
        services.register(RegisteredService::new("https://app2.example", "app2"));

        let handler = Arc::new(RecordingHandler::new(fail));
        let manager = LogoutManager::new(access.clone(), services, config)
            .unwrap()
            .with_handler(handler.clone());

        let mut tgt = TicketGrantingTicket::new(
            "TGT-1-abc".to_string(),
            Authentication::new("alice"),
            ExpirationPolicy::NeverExpires,
        );
        tgt.grant_service_ticket(
            "ST-1-aaa".to_string(),
            Service::new("https://app1.example"),
            ExpirationPolicy::NeverExpires,
            false,
            true,
        );
        tgt.grant_service_ticket(
            "ST-2-bbb".to_string(),
            Service::new("https://app2.example"),
            ExpirationPolicy::NeverExpires,
            false,
            true,
        );
        access
            .registry()
            .add_ticket(Ticket::TicketGranting(tgt.clone()))
            .await
            .unwrap();

        (
            Fixture {
                access,
                manager,
                handler,
            },
            tgt,
        )
    }

    #[tokio::test]
    async fn notifies_every_service_and_clears_the_map() {
        let (fx, tgt) = fixture(false, LogoutConfig::default()).await;

        let requests = fx.manager.perform_logout(&tgt).await;
        assert_eq!(requests.len(), 2);
        assert!(
            requests
                .iter()
                .all(|r| r.status == LogoutRequestStatus::Success)
        );

        let mut notified = fx.handler.sent.lock().clone();
        notified.sort();
        assert_eq!(notified, vec!["ST-1-aaa", "ST-2-bbb"]);

        let stored = fx
            .access
            .ticket_granting_ticket("TGT-1-abc")
            .await
            .unwrap()
            .unwrap();
        assert!(stored.services.is_empty());
    }

    #[tokio::test]
    async fn one_failure_does_not_block_the_rest() {
        let (fx, tgt) = fixture(true, LogoutConfig::default()).await;

        let requests = fx.manager.perform_logout(&tgt).await;
        assert_eq!(requests.len(), 2);
        // Every service was attempted and recorded as failed.
        assert!(
            requests
                .iter()
                .all(|r| r.status == LogoutRequestStatus::Failure)
        );
        assert_eq!(fx.handler.sent.lock().len(), 2);
    }

    #[tokio::test]
    async fn disabled_single_logout_still_clears_services() {
        let config = LogoutConfig {
            disable_single_logout: true,
            ..LogoutConfig::default()
        };
        let (fx, tgt) = fixture(false, config).await;

        let requests = fx.manager.perform_logout(&tgt).await;
        assert!(requests.is_empty());
        assert!(fx.handler.sent.lock().is_empty());

        let stored = fx
            .access
            .ticket_granting_ticket("TGT-1-abc")
            .await
            .unwrap()
            .unwrap();
        assert!(stored.services.is_empty());
    }

    #[tokio::test]
    async fn front_channel_requests_stay_staged() {
        let access = Arc::new(TicketAccess::new(Arc::new(InMemoryTicketRegistry::new())));
        let services = Arc::new(InMemoryServicesManager::new());
        services.register(
            RegisteredService::new("https://app1.example", "app1")
                .with_logout_kind(LogoutKind::FrontChannel),
        );

        let manager =
            LogoutManager::new(access.clone(), services, LogoutConfig::default()).unwrap();

        let mut tgt = TicketGrantingTicket::new(
            "TGT-1-abc".to_string(),
            Authentication::new("alice"),
            ExpirationPolicy::NeverExpires,
        );
        tgt.grant_service_ticket(
            "ST-1-aaa".to_string(),
            Service::new("https://app1.example"),
            ExpirationPolicy::NeverExpires,
            false,
            true,
        );
        access
            .registry()
            .add_ticket(Ticket::TicketGranting(tgt.clone()))
            .await
            .unwrap();

        let requests = manager.perform_logout(&tgt).await;
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].channel, LogoutChannel::FrontChannel);
        assert_eq!(requests[0].status, LogoutRequestStatus::NotAttempted);
        assert!(requests[0].logout_url.is_some());
    }

    #[tokio::test]
    async fn unregistered_services_are_skipped() {
        let access = Arc::new(TicketAccess::new(Arc::new(InMemoryTicketRegistry::new())));
        let services = Arc::new(InMemoryServicesManager::new());

        let handler = Arc::new(RecordingHandler::new(false));
        let manager = LogoutManager::new(access.clone(), services, LogoutConfig::default())
            .unwrap()
            .with_handler(handler.clone());

        let mut tgt = TicketGrantingTicket::new(
            "TGT-1-abc".to_string(),
            Authentication::new("alice"),
            ExpirationPolicy::NeverExpires,
        );
        tgt.grant_service_ticket(
            "ST-1-aaa".to_string(),
            Service::new("https://unknown.example"),
            ExpirationPolicy::NeverExpires,
            false,
            true,
        );

        let requests = manager.perform_logout(&tgt).await;
        assert!(requests.is_empty());
        assert!(handler.sent.lock().is_empty());
    }
}
