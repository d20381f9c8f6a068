//! Logout request bookkeeping.

use cas_ticket::Service;
use serde::{Deserialize, Serialize};
use url::Url;

/// How a notification reaches the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LogoutChannel {
    /// Server-to-server HTTP POST.
    BackChannel,
    /// Browser-redirect-driven delivery.
    FrontChannel,
}

/// Delivery status of one logout notification.
///
/// `NotAttempted` is the only non-terminal state; once a request is
/// marked `Success` or `Failure` it stays there for the rest of the
/// logout episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogoutRequestStatus {
    /// No delivery attempt has completed yet.
    #[default]
    NotAttempted,
    /// The service acknowledged the notification.
    Success,
    /// Delivery failed; logout proceeds regardless.
    Failure,
}

/// One service's entry in a logout episode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogoutRequest {
    /// The service ticket that bound the service to the session.
    pub service_ticket_id: String,
    /// The service to notify.
    pub service: Service,
    /// Where the notification goes.
    pub logout_url: Option<Url>,
    /// Delivery channel.
    pub channel: LogoutChannel,
    /// Delivery status.
    pub status: LogoutRequestStatus,
}

impl LogoutRequest {
    /// Creates a pending request.
    #[must_use]
    pub const fn new(
        service_ticket_id: String,
        service: Service,
        logout_url: Option<Url>,
        channel: LogoutChannel,
    ) -> Self {
        Self {
            service_ticket_id,
            service,
            logout_url,
            channel,
            status: LogoutRequestStatus::NotAttempted,
        }
    }

    /// Records a terminal status. Once terminal, further marks are
    /// ignored.
    pub fn mark(&mut self, status: LogoutRequestStatus) {
        if self.status == LogoutRequestStatus::NotAttempted {
            self.status = status;
        }
    }
}
