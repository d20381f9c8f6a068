//! Common test utilities and fixtures.

use std::sync::Arc;

use async_trait::async_trait;
use cas_auth::CentralAuthenticationService;
use cas_core::{LogoutConfig, TicketConfig};
use cas_logout::{
    LogoutManager, LogoutRequest, LogoutResult, SingleLogoutMessage, SingleLogoutMessageHandler,
};
use cas_registry::{InMemoryTicketRegistry, TicketAccess};
use cas_ticket::{InMemoryServicesManager, RegisteredService};
use parking_lot::Mutex;

/// Back-channel handler that records deliveries instead of going over
/// the network.
#[derive(Default)]
pub struct RecordingHandler {
    /// Delivered messages as (session index, rendered XML) pairs.
    pub sent: Mutex<Vec<(String, String)>>,
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
        self.sent
            .lock()
            .push((message.session_index.clone(), message.to_xml()));
        Ok(())
    }
}

/// In-process test environment wiring the whole stack together.
pub struct TestEnv {
    /// The central authentication service under test.
    pub cas: Arc<CentralAuthenticationService>,
    /// Registry access layer, for direct state inspection.
    pub access: Arc<TicketAccess>,
    /// The service registry.
    pub services: Arc<InMemoryServicesManager>,
    /// The logout manager, also usable as a cleaner listener.
    pub logout: Arc<LogoutManager>,
    /// Records back-channel logout deliveries.
    pub handler: Arc<RecordingHandler>,
    /// The ticket configuration in effect.
    pub config: TicketConfig,
}

impl TestEnv {
    /// Builds a fresh environment on the in-memory registry.
    pub fn new() -> anyhow::Result<Self> {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("cas_auth=debug,cas_registry=debug,cas_logout=debug")
            .try_init();

        let access = Arc::new(TicketAccess::new(Arc::new(InMemoryTicketRegistry::new())));
        let services = Arc::new(InMemoryServicesManager::new());
        let handler = Arc::new(RecordingHandler::default());
        let logout = Arc::new(
            LogoutManager::new(access.clone(), services.clone(), LogoutConfig::default())?
                .with_handler(handler.clone()),
        );
        let config = TicketConfig::default();
        let cas = Arc::new(CentralAuthenticationService::new(
            access.clone(),
            services.clone(),
            logout.clone(),
            config.clone(),
        ));

        Ok(Self {
            cas,
            access,
            services,
            logout,
            handler,
            config,
        })
    }
}
