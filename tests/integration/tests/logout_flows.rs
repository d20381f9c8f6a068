//! Single logout episodes across multiple services.

use cas_logout::{LogoutChannel, LogoutRequestStatus};
use cas_ticket::{Authentication, LogoutKind, RegisteredService, Service};

use crate::common::TestEnv;

const APP1: &str = "https://app1.example";
const APP2: &str = "https://app2.example";

#[tokio::test]
async fn logout_notifies_every_visited_service() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    env.services.register(RegisteredService::new(APP1, "app1"));
    env.services.register(RegisteredService::new(APP2, "app2"));

    let tgt_id = env
        .cas
        .create_ticket_granting_ticket(Authentication::new("alice"))
        .await?;
    let st1 = env
        .cas
        .grant_service_ticket(&tgt_id, &Service::new(APP1), false)
        .await?;
    let st2 = env
        .cas
        .grant_service_ticket(&tgt_id, &Service::new(APP2), false)
        .await?;

    let requests = env.cas.destroy_ticket_granting_ticket(&tgt_id).await?;

    assert_eq!(requests.len(), 2);
    assert!(
        requests
            .iter()
            .all(|r| r.status != LogoutRequestStatus::NotAttempted)
    );
    assert!(
        requests
            .iter()
            .all(|r| r.status == LogoutRequestStatus::Success)
    );

    let mut notified: Vec<String> = env
        .handler
        .sent
        .lock()
        .iter()
        .map(|(session_index, _)| session_index.clone())
        .collect();
    notified.sort();
    let mut expected = vec![st1.clone(), st2.clone()];
    expected.sort();
    assert_eq!(notified, expected);

    // The delivered messages identify the session by service ticket.
    for (session_index, xml) in env.handler.sent.lock().iter() {
        assert!(xml.contains(&format!(
            "<samlp:SessionIndex>{session_index}</samlp:SessionIndex>"
        )));
    }

    // The whole graph is gone.
    assert!(env.access.ticket(&tgt_id).await?.is_none());
    assert!(env.access.ticket(&st1).await?.is_none());
    assert!(env.access.ticket(&st2).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn front_channel_services_are_staged_not_sent() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    env.services.register(RegisteredService::new(APP1, "app1"));
    env.services.register(
        RegisteredService::new(APP2, "app2").with_logout_kind(LogoutKind::FrontChannel),
    );

    let tgt_id = env
        .cas
        .create_ticket_granting_ticket(Authentication::new("alice"))
        .await?;
    env.cas
        .grant_service_ticket(&tgt_id, &Service::new(APP1), false)
        .await?;
    env.cas
        .grant_service_ticket(&tgt_id, &Service::new(APP2), false)
        .await?;

    let requests = env.cas.destroy_ticket_granting_ticket(&tgt_id).await?;
    assert_eq!(requests.len(), 2);

    let back = requests
        .iter()
        .find(|r| r.channel == LogoutChannel::BackChannel)
        .unwrap();
    assert_eq!(back.status, LogoutRequestStatus::Success);

    let front = requests
        .iter()
        .find(|r| r.channel == LogoutChannel::FrontChannel)
        .unwrap();
    assert_eq!(front.status, LogoutRequestStatus::NotAttempted);
    assert!(front.logout_url.is_some());

    // Only the back-channel service was actually called.
    assert_eq!(env.handler.sent.lock().len(), 1);
    Ok(())
}

#[tokio::test]
async fn logout_episode_clears_the_services_map() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    env.services.register(RegisteredService::new(APP1, "app1"));

    let tgt_id = env
        .cas
        .create_ticket_granting_ticket(Authentication::new("alice"))
        .await?;
    env.cas
        .grant_service_ticket(&tgt_id, &Service::new(APP1), false)
        .await?;

    let tgt = env.access.ticket_granting_ticket(&tgt_id).await?.unwrap();
    assert_eq!(tgt.services.len(), 1);

    let requests = env.logout.perform_logout(&tgt).await;
    assert_eq!(requests.len(), 1);
    assert_ne!(requests[0].status, LogoutRequestStatus::NotAttempted);

    // The stored session no longer lists the service, so a second
    // episode has nothing to notify.
    let stored = env.access.ticket_granting_ticket(&tgt_id).await?.unwrap();
    assert!(stored.services.is_empty());

    let again = env.logout.perform_logout(&stored).await;
    assert!(again.is_empty());
    Ok(())
}
