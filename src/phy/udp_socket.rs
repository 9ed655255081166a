use std::io;
use std::net::{Ipv6Addr, SocketAddr, SocketAddrV6, UdpSocket};

use crate::phy::{sys, Transport};
use crate::time::Duration;
use crate::wire::{Side, DHCPV6_ALL_AGENTS, DHCPV6_CLIENT_PORT, DHCPV6_SERVER_PORT};

/// Shortest receive timeout handed to the socket; zero would mean "block".
const MIN_TIMEOUT: Duration = Duration::from_millis(1);

/// A UDP socket bound to one interface.
#[derive(Debug)]
pub struct UdpTransport {
    socket: UdpSocket,
    ifname: String,
    ifindex: u32,
}

impl UdpTransport {
    /// Open the socket for `side` on the interface called `ifname`.
    ///
    /// A client binds to the interface's link-local address on the client
    /// port, or to `[::]` if it has none yet. A server binds to `[::]` on the
    /// server port and has to [join](Self::join_multicast) the agents group.
    pub fn new(ifname: &str, side: Side) -> io::Result<UdpTransport> {
        let ifindex = sys::if_nametoindex(ifname)?;
        net_debug!("interface {} has index {}", ifname, ifindex);

        let local = match side {
            Side::Server => SocketAddrV6::new(Ipv6Addr::UNSPECIFIED, DHCPV6_SERVER_PORT, 0, 0),
            Side::Client => match sys::link_local_address(ifname)? {
                Some((addr, scope_id)) => {
                    net_info!("binding {} to {}%{}", ifname, addr, scope_id);
                    SocketAddrV6::new(addr, DHCPV6_CLIENT_PORT, 0, scope_id)
                }
                None => {
                    net_debug!("no link-local address on {}, binding to [::]", ifname);
                    SocketAddrV6::new(Ipv6Addr::UNSPECIFIED, DHCPV6_CLIENT_PORT, 0, 0)
                }
            },
        };

        let socket = UdpSocket::bind(local)?;
        sys::set_multicast_interface(&socket, ifindex)?;
        if let Err(err) = sys::bind_to_device(&socket, ifname) {
            net_warn!("cannot bind to device {}: {}", ifname, err);
        }

        Ok(UdpTransport {
            socket,
            ifname: ifname.to_string(),
            ifindex,
        })
    }

    /// Join `ff02::1:2` on the interface.
    pub fn join_multicast(&self) -> io::Result<()> {
        self.socket
            .join_multicast_v6(&DHCPV6_ALL_AGENTS, self.ifindex)
    }

    /// Where a client sends: the agents group on this interface.
    pub fn server_address(&self) -> SocketAddrV6 {
        SocketAddrV6::new(DHCPV6_ALL_AGENTS, DHCPV6_SERVER_PORT, 0, self.ifindex)
    }

    pub fn ifname(&self) -> &str {
        &self.ifname
    }

    pub fn ifindex(&self) -> u32 {
        self.ifindex
    }
}

impl Transport for UdpTransport {
    fn send(&mut self, payload: &[u8], destination: SocketAddrV6) -> io::Result<()> {
        let len = self.socket.send_to(payload, destination)?;
        if len != payload.len() {
            net_warn!("short send to {}: {} of {} octets", destination, len, payload.len());
        }
        Ok(())
    }

    fn recv(
        &mut self,
        buffer: &mut [u8],
        timeout: Duration,
    ) -> io::Result<Option<(usize, SocketAddrV6)>> {
        let timeout = if timeout < MIN_TIMEOUT { MIN_TIMEOUT } else { timeout };
        self.socket.set_read_timeout(Some(timeout.into()))?;

        match self.socket.recv_from(buffer) {
            Ok((len, SocketAddr::V6(source))) => Ok(Some((len, source))),
            Ok((_, SocketAddr::V4(source))) => {
                net_debug!("ignoring datagram from {}", source);
                Ok(None)
            }
            Err(err)
                if matches!(
                    err.kind(),
                    io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
                ) =>
            {
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    fn interface_up(&self) -> bool {
        sys::interface_exists(self.ifindex)
    }
}
