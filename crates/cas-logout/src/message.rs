//! Logout message creation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::request::LogoutRequest;

/// A single logout message addressed to one service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SingleLogoutMessage {
    /// Message identifier.
    pub id: String,
    /// When the message was created.
    pub issue_instant: DateTime<Utc>,
    /// The service-ticket id the service originally validated, which
    /// is how it finds the session to terminate.
    pub session_index: String,
}

impl SingleLogoutMessage {
    /// Creates a message for a logout request.
    #[must_use]
    pub fn new(request: &LogoutRequest) -> Self {
        Self {
            id: format!("LR-{}", Uuid::now_v7().simple()),
            issue_instant: Utc::now(),
            session_index: request.service_ticket_id.clone(),
        }
    }

    /// Renders the message as a SAML `LogoutRequest` document.
    #[must_use]
    pub fn to_xml(&self) -> String {
        format!(
            r#"<samlp:LogoutRequest xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol" ID="{}" Version="2.0" IssueInstant="{}">
<saml:NameID xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion">@NOT_USED@</saml:NameID>
<samlp:SessionIndex>{}</samlp:SessionIndex>
</samlp:LogoutRequest>"#,
            self.id,
            self.issue_instant.format("%Y-%m-%dT%H:%M:%SZ"),
            self.session_index
        )
    }
}

/// Builds protocol-specific logout messages.
pub trait SingleLogoutMessageCreator: Send + Sync {
    /// Creates the message for a logout request.
    fn create(&self, request: &LogoutRequest) -> SingleLogoutMessage;
}

/// The default creator, producing SAML logout requests.
#[derive(Debug, Default)]
pub struct SamlLogoutMessageCreator;

impl SingleLogoutMessageCreator for SamlLogoutMessageCreator {
    fn create(&self, request: &LogoutRequest) -> SingleLogoutMessage {
        SingleLogoutMessage::new(request)
    }
}
