//! Logout message handlers.

use std::time::Duration;

use async_trait::async_trait;
use cas_ticket::{LogoutKind, RegisteredService};

use crate::error::{LogoutError, LogoutResult};
use crate::message::SingleLogoutMessage;
use crate::request::LogoutRequest;

/// Delivers logout messages for the services it supports.
///
/// Handlers form an ordered chain; the first one that supports a
/// service's protocol handles it.
#[async_trait]
pub trait SingleLogoutMessageHandler: Send + Sync {
    /// Whether this handler can notify the given service.
    fn supports(&self, service: &RegisteredService) -> bool;

    /// Position in the handler chain; lower runs first.
    fn order(&self) -> i32 {
        0
    }

    /// Delivers a back-channel notification.
    async fn send(
        &self,
        request: &LogoutRequest,
        message: &SingleLogoutMessage,
    ) -> LogoutResult<()>;
}

/// The default back-channel handler: POSTs the logout message as a
/// `logoutRequest` form parameter to the service's logout URL.
pub struct DefaultSingleLogoutMessageHandler {
    http: reqwest::Client,
}

impl DefaultSingleLogoutMessageHandler {
    /// Creates the handler with the given per-request timeout.
    ///
    /// ## Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(timeout: Duration) -> LogoutResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LogoutError::Client(e.to_string()))?;
        Ok(Self { http })
    }
}

#[async_trait]
impl SingleLogoutMessageHandler for DefaultSingleLogoutMessageHandler {
    fn supports(&self, service: &RegisteredService) -> bool {
        !matches!(service.logout_kind, LogoutKind::None)
    }

    async fn send(
        &self,
        request: &LogoutRequest,
        message: &SingleLogoutMessage,
    ) -> LogoutResult<()> {
        let url = request
            .logout_url
            .clone()
            .ok_or_else(|| LogoutError::MissingUrl(request.service.id.clone()))?;

        let response = self
            .http
            .post(url)
            .form(&[("logoutRequest", message.to_xml())])
            .send()
            .await
            .map_err(|e| LogoutError::Notification(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(LogoutError::Notification(format!(
                "service returned status {}",
                response.status()
            )))
        }
    }
}
