//! Redis ticket registry implementation.

use async_trait::async_trait;
use cas_registry::{RegistryError, RegistryResult, TicketRegistry};
use cas_ticket::{ExpirationPolicy, Ticket};
use fred::prelude::*;
use fred::types::scan::Scanner;
use futures::TryStreamExt;

use crate::config::RedisConfig;
use crate::error::{from_redis_error, from_serde_error};

/// Redis-based ticket registry.
pub struct RedisTicketRegistry {
    client: Client,
    config: RedisConfig,
}

impl RedisTicketRegistry {
    /// Connects to Redis and creates the registry.
    ///
    /// ## Errors
    ///
    /// Returns an error if the connection cannot be established.
    pub async fn new(config: RedisConfig) -> RegistryResult<Self> {
        let redis_config = Config::from_url(&config.connection_url())
            .map_err(|e| RegistryError::Backend(e.to_string()))?;

        let client = Client::new(
            redis_config,
            None,
            None,
            Some(ReconnectPolicy::new_exponential(0, 1000, 30_000, 2)),
        );

        client.init().await.map_err(from_redis_error)?;

        Ok(Self { client, config })
    }

    /// Returns the underlying Redis client.
    #[must_use]
    pub const fn client(&self) -> &Client {
        &self.client
    }

    fn key(&self, ticket_id: &str) -> String {
        self.config.prefixed_key(&format!("ticket:{ticket_id}"))
    }

    /// Collects keys matching a scan pattern.
    async fn scan_keys(&self, pattern: &str) -> RegistryResult<Vec<String>> {
        let mut scanner = self.client.scan(pattern, None, None);
        let mut keys = Vec::new();

        while let Some(result) = scanner.try_next().await.map_err(from_redis_error)? {
            if let Some(page) = result.results() {
                for value in page {
                    if let Some(s) = value.as_str() {
                        keys.push(s.to_string());
                    }
                }
            }
        }

        Ok(keys)
    }

    async fn store(&self, ticket: &Ticket) -> RegistryResult<()> {
        let key = self.key(ticket.id());
        let serialized = serde_json::to_string(ticket).map_err(from_serde_error)?;

        match ticket_ttl(ticket) {
            Some(seconds) => self
                .client
                .set::<(), _, _>(&key, serialized, Some(Expiration::EX(seconds)), None, false)
                .await
                .map_err(from_redis_error),
            None => self
                .client
                .set::<(), _, _>(&key, serialized, None, None, false)
                .await
                .map_err(from_redis_error),
        }
    }
}

/// Remaining seconds until the ticket's hard expiry bound, used as the
/// Redis key TTL. Sliding policies refresh their window on every
/// update; the TTL is a backstop, the policy itself stays the source
/// of truth.
fn ticket_ttl(ticket: &Ticket) -> Option<i64> {
    let age = ticket.usage().age_seconds();
    match *ticket.expiration_policy() {
        ExpirationPolicy::NeverExpires => None,
        ExpirationPolicy::HardTimeout { max_lifetime_secs }
        | ExpirationPolicy::MultiTimeUseOrTimeout {
            max_lifetime_secs, ..
        } => Some((max_lifetime_secs - age).max(1)),
        ExpirationPolicy::SlidingWindow { idle_timeout_secs } => Some(idle_timeout_secs.max(1)),
        ExpirationPolicy::IdleAndLifetime {
            idle_timeout_secs,
            max_lifetime_secs,
        } => {
            if max_lifetime_secs > 0 {
                Some(idle_timeout_secs.min(max_lifetime_secs - age).max(1))
            } else {
                Some(idle_timeout_secs.max(1))
            }
        }
    }
}

#[async_trait]
impl TicketRegistry for RedisTicketRegistry {
    async fn add_ticket(&self, ticket: Ticket) -> RegistryResult<()> {
        tracing::debug!(id = ticket.id(), "adding ticket to redis registry");
        self.store(&ticket).await
    }

    async fn get_ticket(&self, id: &str) -> RegistryResult<Option<Ticket>> {
        let key = self.key(id);
        let value: Option<String> = self.client.get(&key).await.map_err(from_redis_error)?;

        match value {
            Some(v) => {
                let ticket: Ticket = serde_json::from_str(&v).map_err(from_serde_error)?;
                Ok(Some(ticket))
            }
            None => Ok(None),
        }
    }

    async fn update_ticket(&self, ticket: &Ticket) -> RegistryResult<()> {
        self.store(ticket).await
    }

    async fn delete_single_ticket(&self, id: &str) -> RegistryResult<bool> {
        let key = self.key(id);
        let removed: i64 = self.client.del(&key).await.map_err(from_redis_error)?;
        Ok(removed > 0)
    }

    async fn tickets(&self) -> RegistryResult<Vec<Ticket>> {
        let pattern = self.config.prefixed_key("ticket:*");
        let keys = self.scan_keys(&pattern).await?;

        let mut tickets = Vec::with_capacity(keys.len());
        for key in keys {
            let value: Option<String> = self.client.get(&key).await.map_err(from_redis_error)?;
            // A key may expire between the scan and the fetch.
            if let Some(v) = value {
                tickets.push(serde_json::from_str(&v).map_err(from_serde_error)?);
            }
        }
        Ok(tickets)
    }

    fn needs_callback(&self) -> bool {
        true
    }
}
