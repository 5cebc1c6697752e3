//! # Gateway Master Election
//!
//! Several nodes run master checks for the same gateway address over the
//! hub. Time is paused, so a check's deadline only elapses once every frame
//! in flight has been handled.

#[cfg(test)]
mod tests {
    use crate::fixtures::plain_node;
    use node_runtime::adapters::LoopbackHub;
    use peer_manager::{ElectionState, GatewayElectionApi};
    use shared_bus::{EventFilter, EventTopic, PeerEvent};
    use shared_types::PeerId;
    use std::time::Duration;

    const GATEWAY: &str = "0xgateway-chain-a";
    const DEADLINE: Duration = Duration::from_millis(500);

    fn gw(name: &str) -> PeerId {
        PeerId::new(name)
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_check_self_elects() {
        let hub = LoopbackHub::new();
        let a = plain_node(&hub, "a");
        let _b = plain_node(&hub, "b");
        let _c = plain_node(&hub, "c");
        let mut events = a.subscribe(EventFilter::topics(vec![EventTopic::Election]));

        let outcome = a
            .service()
            .check_master(GATEWAY, gw("gw-a"), DEADLINE)
            .await
            .unwrap();

        assert!(outcome.self_elected);
        assert_eq!(outcome.master, gw("gw-a"));
        assert_eq!(
            a.service().election_state(GATEWAY),
            ElectionState::HasMaster(gw("gw-a"))
        );

        match events.recv().await {
            Some(PeerEvent::MasterResolved {
                address,
                master,
                self_elected,
            }) => {
                assert_eq!(address, GATEWAY);
                assert_eq!(master, gw("gw-a"));
                assert!(self_elected);
            }
            other => panic!("expected MasterResolved, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_later_check_adopts_existing_master() {
        let hub = LoopbackHub::new();
        let a = plain_node(&hub, "a");
        let b = plain_node(&hub, "b");

        a.service()
            .check_master(GATEWAY, gw("gw-a"), DEADLINE)
            .await
            .unwrap();

        let outcome = b
            .service()
            .check_master(GATEWAY, gw("gw-b"), DEADLINE)
            .await
            .unwrap();

        assert!(!outcome.self_elected);
        assert_eq!(outcome.master, gw("gw-a"));
        assert_eq!(
            b.service().election_state(GATEWAY),
            ElectionState::HasMaster(gw("gw-a"))
        );
        assert_eq!(
            a.service().election_state(GATEWAY),
            ElectionState::HasMaster(gw("gw-a"))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_established_master_beats_lower_candidate() {
        let hub = LoopbackHub::new();
        let a = plain_node(&hub, "a");
        let b = plain_node(&hub, "b");

        a.service()
            .check_master(GATEWAY, gw("gw-m"), DEADLINE)
            .await
            .unwrap();

        let outcome = b
            .service()
            .check_master(GATEWAY, gw("gw-a"), DEADLINE)
            .await
            .unwrap();

        assert_eq!(outcome.master, gw("gw-m"));
        assert!(!outcome.self_elected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_checks_agree() {
        let hub = LoopbackHub::new();
        let a = plain_node(&hub, "a");
        let b = plain_node(&hub, "b");
        let _c = plain_node(&hub, "c");

        let service_a = a.service().clone();
        let service_b = b.service().clone();
        let check_b = tokio::spawn(async move {
            service_b.check_master(GATEWAY, gw("gw-b"), DEADLINE).await
        });
        let check_a = tokio::spawn(async move {
            service_a.check_master(GATEWAY, gw("gw-a"), DEADLINE).await
        });

        let outcome_a = check_a.await.unwrap().unwrap();
        let outcome_b = check_b.await.unwrap().unwrap();

        assert_eq!(outcome_a.master, gw("gw-a"));
        assert_eq!(outcome_b.master, gw("gw-a"));
        assert!(outcome_a.self_elected);
        assert!(!outcome_b.self_elected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_removed_master_triggers_fresh_election() {
        let hub = LoopbackHub::new();
        let a = plain_node(&hub, "a");
        let b = plain_node(&hub, "b");

        a.service()
            .check_master(GATEWAY, gw("gw-a"), DEADLINE)
            .await
            .unwrap();
        a.service().remove_gateway(GATEWAY, &gw("gw-a"));
        assert_eq!(a.service().election_state(GATEWAY), ElectionState::Unknown);

        let outcome = b
            .service()
            .check_master(GATEWAY, gw("gw-b"), DEADLINE)
            .await
            .unwrap();

        assert!(outcome.self_elected);
        assert_eq!(outcome.master, gw("gw-b"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_departed_master_is_not_kept_alive_by_adopters() {
        let hub = LoopbackHub::new();
        let a = plain_node(&hub, "a");
        let b = plain_node(&hub, "b");
        let c = plain_node(&hub, "c");

        a.service()
            .check_master(GATEWAY, gw("gw-a"), DEADLINE)
            .await
            .unwrap();
        let adopted = b
            .service()
            .check_master(GATEWAY, gw("gw-b"), DEADLINE)
            .await
            .unwrap();
        assert_eq!(adopted.master, gw("gw-a"));

        a.service().remove_gateway(GATEWAY, &gw("gw-a"));

        let outcome = c
            .service()
            .check_master(GATEWAY, gw("gw-c"), DEADLINE)
            .await
            .unwrap();
        assert!(outcome.self_elected);
        assert_eq!(outcome.master, gw("gw-c"));

        b.service().remove_gateway(GATEWAY, &gw("gw-b"));
        let recheck = b
            .service()
            .check_master(GATEWAY, gw("gw-b"), DEADLINE)
            .await
            .unwrap();
        assert_eq!(recheck.master, gw("gw-c"));
        assert!(!recheck.self_elected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_detached_peer_does_not_block_check() {
        let hub = LoopbackHub::new();
        let a = plain_node(&hub, "a");
        let b = plain_node(&hub, "b");

        b.service()
            .check_master(GATEWAY, gw("gw-b"), DEADLINE)
            .await
            .unwrap();
        b.shutdown();

        let outcome = a
            .service()
            .check_master(GATEWAY, gw("gw-a"), DEADLINE)
            .await
            .unwrap();

        assert!(outcome.self_elected);
        assert_eq!(outcome.master, gw("gw-a"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_separate_addresses_are_independent() {
        let hub = LoopbackHub::new();
        let a = plain_node(&hub, "a");
        let b = plain_node(&hub, "b");

        a.service()
            .check_master("0xgateway-one", gw("gw-a"), DEADLINE)
            .await
            .unwrap();

        let outcome = b
            .service()
            .check_master("0xgateway-two", gw("gw-b"), DEADLINE)
            .await
            .unwrap();

        assert!(outcome.self_elected);
        assert_eq!(
            b.service().election_state("0xgateway-one"),
            ElectionState::Unknown
        );
    }
}
