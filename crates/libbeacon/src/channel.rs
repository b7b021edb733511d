//! Multicast channel.
//!
//! Receiving uses one long-lived socket joined to the group. Sending opens a
//! fresh socket per announcement, writes one datagram and drops it. Sends are
//! never retried here; the resend loop covers losses on its next tick.

use std::io;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

use anyhow::{Context, Result};
use socket2::{Domain, Protocol, Socket, Type};

use beacon_core::config::NetworkConfig;

/// Outbound side of the channel.
#[derive(Debug, Clone)]
pub struct MulticastChannel {
    target: SocketAddr,
    interface: Ipv4Addr,
    ttl: u32,
    loopback: bool,
}

impl MulticastChannel {
    /// Channel announcing to the configured group.
    pub fn from_config(net: &NetworkConfig) -> Self {
        Self {
            target: net.group_addr(),
            interface: net.interface,
            ttl: net.ttl,
            loopback: net.loopback,
        }
    }

    /// Channel announcing to an arbitrary address. A unicast target skips all
    /// multicast socket options.
    pub fn to_addr(target: SocketAddr) -> Self {
        Self {
            target,
            interface: Ipv4Addr::UNSPECIFIED,
            ttl: 1,
            loopback: true,
        }
    }

    pub fn target(&self) -> SocketAddr {
        self.target
    }

    /// Send one encoded announcement.
    pub fn send(&self, payload: &[u8]) -> io::Result<usize> {
        let socket = self.outbound_socket()?;
        let sent = socket.send_to(payload, &self.target.into())?;
        if sent != payload.len() {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("short datagram write: {sent} of {} bytes", payload.len()),
            ));
        }
        tracing::trace!(target_addr = %self.target, bytes = sent, "announcement sent");
        Ok(sent)
    }

    fn outbound_socket(&self) -> io::Result<Socket> {
        let socket = Socket::new(
            Domain::for_address(self.target),
            Type::DGRAM,
            Some(Protocol::UDP),
        )?;

        if let SocketAddr::V4(v4) = self.target {
            if v4.ip().is_multicast() {
                socket.set_multicast_ttl_v4(self.ttl)?;
                socket.set_multicast_loop_v4(self.loopback)?;
                if !self.interface.is_unspecified() {
                    socket.set_multicast_if_v4(&self.interface)?;
                }
            }
        }
        Ok(socket)
    }
}

/// Create the receiving socket: bound to the group port on all addresses and
/// joined to the group on the configured interface.
pub fn bind_listener(net: &NetworkConfig) -> Result<std::net::UdpSocket> {
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP)).context("socket()")?;

    socket.set_reuse_address(true).context("SO_REUSEADDR")?;
    socket.set_nonblocking(true).context("set_nonblocking")?;

    let bind_addr = SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, net.port);
    socket
        .bind(&bind_addr.into())
        .with_context(|| format!("bind({bind_addr})"))?;

    socket
        .join_multicast_v4(&net.group, &net.interface)
        .with_context(|| format!("IP_ADD_MEMBERSHIP {} on {}", net.group, net.interface))?;
    socket
        .set_multicast_loop_v4(net.loopback)
        .context("IP_MULTICAST_LOOP")?;

    tracing::debug!(group = %net.group, port = net.port, "joined multicast group");
    Ok(socket.into())
}
