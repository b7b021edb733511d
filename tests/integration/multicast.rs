//! Self-discovery over the real multicast group.
//!
//! Containers and CI runners often have no multicast route. These tests
//! print SKIP and return when the group cannot be joined or used.

use std::time::Duration;

use beacon_core::config::BeaconConfig;
use libbeacon::{ApiRegistry, RegistryError};

use crate::eventually;

/// Group config on a port unlikely to collide with a running daemon.
fn test_config() -> BeaconConfig {
    let mut config = BeaconConfig::default();
    config.network.port = 40_000 + (std::process::id() % 20_000) as u16;
    config.network.loopback = true;
    config
}

#[tokio::test]
async fn own_announcement_loops_back_through_group() {
    let config = test_config();
    let registry = match ApiRegistry::start(&config) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("SKIP: cannot join multicast group: {e:#}");
            return;
        }
    };

    match registry.register_api("search", "1.0", 8080).await {
        Ok(()) => {}
        Err(RegistryError::NetworkSend(e)) => {
            eprintln!("SKIP: multicast send not possible: {e}");
            registry.shutdown().await;
            return;
        }
        Err(e) => panic!("unexpected registration error: {e}"),
    }

    let seen = eventually(Duration::from_secs(3), || async {
        let apis = registry.get_apis_by_name("search").await;
        (!apis.is_empty()).then_some(apis)
    })
    .await;

    match seen {
        Some(apis) => {
            assert_eq!(apis[0].name(), "search");
            assert_eq!(apis[0].version(), "1.0");
            assert_eq!(apis[0].host_port(), 8080);
        }
        None => eprintln!("SKIP: multicast loopback not delivered on this host"),
    }

    registry.shutdown().await;
}

#[tokio::test]
async fn invalid_registration_sends_nothing_on_group() {
    let config = test_config();
    let registry = match ApiRegistry::start(&config) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("SKIP: cannot join multicast group: {e:#}");
            return;
        }
    };

    assert!(matches!(
        registry.register_api("", "1.0", 8080).await,
        Err(RegistryError::InvalidArgument(_))
    ));
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(registry.get_available_apis().await.is_empty());
    assert!(registry.owned_apis().await.is_empty());

    registry.shutdown().await;
}
