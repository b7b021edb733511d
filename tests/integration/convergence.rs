//! Two registries converging over loopback.

use std::net::{IpAddr, Ipv4Addr, UdpSocket};
use std::time::Duration;

use beacon_core::config::TimingConfig;
use beacon_core::wire::Announcement;

use crate::{eventually, fast_timing, loopback_pair};

#[tokio::test]
async fn peers_discover_each_other() {
    let (a, b) = loopback_pair(TimingConfig::default()).unwrap();

    a.register_api("search", "1.0", 8080).await.unwrap();
    b.register_api("billing", "2.1", 9090).await.unwrap();

    let seen_by_b = eventually(Duration::from_secs(2), || async {
        let apis = b.get_apis_by_name("search").await;
        (!apis.is_empty()).then_some(apis)
    })
    .await
    .expect("b never saw search");
    assert_eq!(seen_by_b.len(), 1);
    assert_eq!(seen_by_b[0].version(), "1.0");
    assert_eq!(seen_by_b[0].host_ip(), IpAddr::V4(Ipv4Addr::LOCALHOST));
    assert_eq!(seen_by_b[0].host_port(), 8080);

    let seen_by_a = eventually(Duration::from_secs(2), || async {
        let apis = a.get_apis_by_name("billing").await;
        (!apis.is_empty()).then_some(apis)
    })
    .await
    .expect("a never saw billing");
    assert_eq!(seen_by_a[0].host_port(), 9090);

    // Nothing is reflected back to the announcer.
    assert!(a.get_apis_by_name("search").await.is_empty());
    assert!(b.get_apis_by_name("billing").await.is_empty());

    a.shutdown().await;
    b.shutdown().await;
}

#[tokio::test]
async fn resend_keeps_registration_alive_past_lifespan() {
    let (a, b) = loopback_pair(fast_timing()).unwrap();
    a.register_api("search", "1.0", 8080).await.unwrap();

    eventually(Duration::from_secs(2), || async {
        (!b.get_apis_by_name("search").await.is_empty()).then_some(())
    })
    .await
    .expect("b never saw search");

    // Two full lifespans; only the resend loop can keep it visible.
    tokio::time::sleep(Duration::from_secs(4)).await;
    assert_eq!(b.get_apis_by_name("search").await.len(), 1);
    assert_eq!(b.get_available_apis().await.len(), 1);

    a.shutdown().await;
    b.shutdown().await;
}

#[tokio::test]
async fn registration_expires_once_announcer_stops() {
    let (a, b) = loopback_pair(fast_timing()).unwrap();
    a.register_api("search", "1.0", 8080).await.unwrap();

    eventually(Duration::from_secs(2), || async {
        (!b.get_apis_by_name("search").await.is_empty()).then_some(())
    })
    .await
    .expect("b never saw search");

    a.shutdown().await;

    // Hidden from queries once the lifespan passes.
    eventually(Duration::from_secs(4), || async {
        b.get_apis_by_name("search").await.is_empty().then_some(())
    })
    .await
    .expect("search never expired");
    assert!(b.get_available_apis().await.is_empty());

    // And physically removed by the next sweep.
    eventually(Duration::from_secs(3), || async {
        (b.store().remote_len().await == 0).then_some(())
    })
    .await
    .expect("sweep never removed search");

    b.shutdown().await;
}

#[tokio::test]
async fn foreign_announcements_are_deduplicated_by_tuple() {
    let (a, b) = loopback_pair(TimingConfig::default()).unwrap();
    let b_addr = a.channel().target();

    // A peer speaking the wire format directly.
    let peer = UdpSocket::bind("127.0.0.1:0").unwrap();
    let send = |name: &str, version: &str, port: u16| {
        let bytes = Announcement::new(name, version, port, Duration::from_secs(90))
            .encode()
            .unwrap();
        peer.send_to(&bytes, b_addr).unwrap();
    };

    send("search", "1.0", 8080);
    send("search", "1.0", 8080);
    send("search", "2.0", 8080);
    send("search", "1.0", 8081);
    peer.send_to(b"garbage", b_addr).unwrap();

    let apis = eventually(Duration::from_secs(2), || async {
        let apis = b.get_apis_by_name("search").await;
        (apis.len() >= 3).then_some(apis)
    })
    .await
    .expect("b never saw all three registrations");

    // Let any straggling duplicate arrive before counting.
    tokio::time::sleep(Duration::from_millis(200)).await;
    let apis_after = b.get_apis_by_name("search").await;
    assert_eq!(apis_after, apis);

    let tuples: Vec<(&str, u16)> = apis.iter().map(|a| (a.version(), a.host_port())).collect();
    assert_eq!(tuples, vec![("1.0", 8080), ("2.0", 8080), ("1.0", 8081)]);
    assert_eq!(b.store().remote_len().await, 1);

    a.shutdown().await;
    b.shutdown().await;
}
