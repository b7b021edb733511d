//! Announcement listener.
//!
//! Receives datagrams on the joined multicast socket and upserts every valid
//! announcement into the remote half of the registration store. This loop is
//! the only writer to that half.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::net::UdpSocket;
use tokio::sync::broadcast;

use beacon_core::wire::{Announcement, MAX_MESSAGE_SIZE};
use beacon_services::{Api, RegistrationStore, Upsert};

/// Pause after a transient receive error so a flapping socket cannot spin.
const RECEIVE_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Receive announcements until shutdown or a non-recoverable socket error.
pub async fn listener_loop(
    store: Arc<RegistrationStore>,
    socket: UdpSocket,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<()> {
    let mut buf = vec![0u8; MAX_MESSAGE_SIZE];

    tracing::info!(addr = ?socket.local_addr().ok(), "registry listener starting");

    loop {
        let received = tokio::select! {
            _ = shutdown.recv() => {
                tracing::info!("registry listener stopping");
                return Ok(());
            }
            r = socket.recv_from(&mut buf) => r,
        };

        let (len, source) = match received {
            Ok(r) => r,
            Err(e) if is_fatal(&e) => {
                tracing::error!(error = %e, "multicast receive failed permanently");
                return Err(e).context("multicast receive failed");
            }
            Err(e) => {
                tracing::warn!(error = %e, "recv_from failed");
                tokio::time::sleep(RECEIVE_RETRY_DELAY).await;
                continue;
            }
        };

        handle_datagram(&store, &buf[..len], source).await;
    }
}

/// Decode one datagram and apply it to the store.
///
/// Returns `None` when the datagram was discarded.
pub async fn handle_datagram(
    store: &RegistrationStore,
    bytes: &[u8],
    source: SocketAddr,
) -> Option<Upsert> {
    let announcement = match Announcement::decode(bytes) {
        Ok(a) => a,
        Err(e) => {
            tracing::warn!(source = %source, len = bytes.len(), error = %e, "discarding datagram");
            return None;
        }
    };

    if announcement.name.is_empty() || announcement.version.is_empty() {
        tracing::warn!(source = %source, "discarding announcement without name or version");
        return None;
    }

    let lifespan = announcement.lifespan();
    // The advertised port wins over the UDP source port.
    let api = Api::new(
        announcement.name,
        announcement.version,
        source.ip(),
        announcement.port,
    );

    tracing::debug!(api = %api, lifespan_secs = lifespan.as_secs(), "announcement received");
    let outcome = store.upsert_remote(api.clone(), lifespan).await;
    if outcome == Upsert::Inserted {
        tracing::info!(api = %api, "discovered service");
    }
    Some(outcome)
}

/// Receive errors after which the socket will never deliver again.
fn is_fatal(e: &io::Error) -> bool {
    if e.raw_os_error() == Some(libc::EBADF) {
        return true;
    }
    matches!(
        e.kind(),
        io::ErrorKind::NotConnected
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::InvalidInput
            | io::ErrorKind::Unsupported
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    fn source(port: u16) -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::new(192, 168, 1, 20)), port)
    }

    fn datagram(name: &str, version: &str, port: u16) -> Vec<u8> {
        Announcement::new(name, version, port, Duration::from_secs(90))
            .encode()
            .unwrap()
    }

    #[tokio::test]
    async fn advertised_port_is_authoritative() {
        let store = RegistrationStore::new();
        let outcome = handle_datagram(&store, &datagram("search", "1.0", 8080), source(53211)).await;
        assert_eq!(outcome, Some(Upsert::Inserted));

        let found = store.active_by_name("search").await;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].host_ip(), IpAddr::V4(Ipv4Addr::new(192, 168, 1, 20)));
        assert_eq!(found[0].host_port(), 8080);
    }

    #[tokio::test]
    async fn source_port_does_not_split_registrations() {
        let store = RegistrationStore::new();
        handle_datagram(&store, &datagram("search", "1.0", 8080), source(40000)).await;
        let outcome = handle_datagram(&store, &datagram("search", "1.0", 8080), source(40001)).await;
        assert_eq!(outcome, Some(Upsert::Refreshed));
        assert_eq!(store.active_by_name("search").await.len(), 1);
    }

    #[tokio::test]
    async fn malformed_datagram_leaves_store_unchanged() {
        let store = RegistrationStore::new();
        assert_eq!(handle_datagram(&store, b"{\"ApiName\":", source(1)).await, None);
        assert_eq!(handle_datagram(&store, &[0xff; 32], source(1)).await, None);
        assert_eq!(store.remote_len().await, 0);
    }

    #[tokio::test]
    async fn nameless_announcement_is_discarded() {
        let store = RegistrationStore::new();
        assert_eq!(handle_datagram(&store, &datagram("", "1.0", 1), source(1)).await, None);
        assert_eq!(handle_datagram(&store, &datagram("a", "", 1), source(1)).await, None);
        assert_eq!(store.remote_len().await, 0);
    }

    #[tokio::test]
    async fn loop_survives_garbage_and_stops_on_shutdown() {
        let store = Arc::new(RegistrationStore::new());
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = socket.local_addr().unwrap();
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let task = tokio::spawn(listener_loop(store.clone(), socket, shutdown_rx));

        let sender = std::net::UdpSocket::bind("127.0.0.1:0").unwrap();
        sender.send_to(b"definitely not an announcement", addr).unwrap();
        sender.send_to(&datagram("search", "1.0", 8080), addr).unwrap();

        let found = tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                let apis = store.active_by_name("search").await;
                if !apis.is_empty() {
                    return apis;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("announcement never reached the store");

        assert_eq!(found[0].host_ip(), IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert_eq!(store.remote_len().await, 1);

        shutdown_tx.send(()).unwrap();
        let result = tokio::time::timeout(Duration::from_secs(2), task)
            .await
            .expect("listener did not stop")
            .unwrap();
        assert!(result.is_ok());
    }

    #[test]
    fn fatal_errors_are_classified() {
        assert!(is_fatal(&io::Error::from_raw_os_error(libc::EBADF)));
        assert!(is_fatal(&io::Error::from(io::ErrorKind::NotConnected)));
        assert!(!is_fatal(&io::Error::from(io::ErrorKind::Interrupted)));
        assert!(!is_fatal(&io::Error::from(io::ErrorKind::ConnectionRefused)));
        assert!(!is_fatal(&io::Error::from(io::ErrorKind::WouldBlock)));
    }
}
