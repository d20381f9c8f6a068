//! Full ticket lifecycle: issuance, validation, proxying, cleanup.

use std::time::Duration;

use cas_auth::AuthError;
use cas_registry::RegistryCleaner;
use cas_ticket::{Authentication, RegisteredService, Service};

use crate::common::TestEnv;

const APP1: &str = "https://app1.example";

#[tokio::test]
async fn full_sso_round_trip() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    env.services
        .register(RegisteredService::new(APP1, "app1"));

    let tgt_id = env
        .cas
        .create_ticket_granting_ticket(Authentication::new("alice"))
        .await?;

    let st_id = env
        .cas
        .grant_service_ticket(&tgt_id, &Service::new(APP1), false)
        .await?;

    let assertion = env
        .cas
        .validate_service_ticket(&st_id, &Service::new(APP1))
        .await?;
    assert_eq!(assertion.principal(), "alice");
    assert!(assertion.from_new_login);
    assert_eq!(assertion.chained_authentications.len(), 1);

    // The single-use ticket is gone; the session lives on.
    assert!(env.access.ticket(&st_id).await?.is_none());
    assert!(env.access.ticket(&tgt_id).await?.is_some());
    Ok(())
}

#[tokio::test]
async fn concurrent_proxy_delegation_has_one_winner() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    env.services
        .register(RegisteredService::new(APP1, "app1").with_proxy_allowed(true));

    let tgt_id = env
        .cas
        .create_ticket_granting_ticket(Authentication::new("alice"))
        .await?;
    let st_id = env
        .cas
        .grant_service_ticket(&tgt_id, &Service::new(APP1), false)
        .await?;

    let first = {
        let cas = env.cas.clone();
        let st_id = st_id.clone();
        tokio::spawn(async move {
            cas.delegate_ticket_granting_ticket(&st_id, Authentication::new("app1"))
                .await
        })
    };
    let second = {
        let cas = env.cas.clone();
        let st_id = st_id.clone();
        tokio::spawn(async move {
            cas.delegate_ticket_granting_ticket(&st_id, Authentication::new("app1"))
                .await
        })
    };

    let outcomes = [first.await?, second.await?];
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    assert_eq!(
        outcomes
            .iter()
            .filter(|r| matches!(r, Err(AuthError::Ticket(_))))
            .count(),
        1
    );

    // Exactly one proxy-granting ticket exists under the session.
    let tgt = env.access.ticket_granting_ticket(&tgt_id).await?.unwrap();
    assert_eq!(tgt.proxy_granting_tickets.len(), 1);
    Ok(())
}

#[tokio::test]
async fn proxy_validation_reports_the_chain() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    env.services
        .register(RegisteredService::new(APP1, "app1").with_proxy_allowed(true));
    env.services
        .register(RegisteredService::new("https://backend.example", "backend"));

    let tgt_id = env
        .cas
        .create_ticket_granting_ticket(Authentication::new("alice"))
        .await?;
    let st_id = env
        .cas
        .grant_service_ticket(&tgt_id, &Service::new(APP1), false)
        .await?;
    let pgt_id = env
        .cas
        .delegate_ticket_granting_ticket(&st_id, Authentication::new("app1"))
        .await?;

    let backend_st = env
        .cas
        .grant_service_ticket(&pgt_id, &Service::new("https://backend.example"), false)
        .await?;
    let assertion = env
        .cas
        .validate_service_ticket(&backend_st, &Service::new("https://backend.example"))
        .await?;

    // The proxying service comes first, the original login last.
    assert_eq!(assertion.chained_authentications.len(), 2);
    assert_eq!(assertion.chained_authentications[0].principal, "app1");
    assert_eq!(assertion.principal(), "alice");
    Ok(())
}

#[tokio::test]
async fn cleaner_sweeps_expired_sessions_through_logout() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    env.services
        .register(RegisteredService::new(APP1, "app1"));

    let tgt_id = env
        .cas
        .create_ticket_granting_ticket(Authentication::new("alice"))
        .await?;
    let st_id = env
        .cas
        .grant_service_ticket(&tgt_id, &Service::new(APP1), false)
        .await?;

    env.access.mark_ticket_expired(&tgt_id).await?;

    assert!(env.config.cleaner_enabled);
    let cleaner = RegistryCleaner::new(
        env.access.clone(),
        Duration::from_secs(env.config.cleaner_interval_secs),
    )
    .with_listener(env.logout.clone());
    cleaner.clean_once().await?;

    assert!(env.access.ticket(&tgt_id).await?.is_none());
    assert!(env.access.ticket(&st_id).await?.is_none());

    // The swept session went through single logout first.
    let sent = env.handler.sent.lock();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, st_id);
    Ok(())
}
