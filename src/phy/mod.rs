/*! Access to the network.

The `phy` module deals with the datagram transport the run loops of the
[socket](crate::socket) engines are driven by. It provides the [Transport]
trait, and with the `phy-udp_socket` feature an implementation over a UDP
socket bound to a single interface.

# Examples

A transport that never receives anything:

```rust
use std::io;
use std::net::SocketAddrV6;
use tdhcp::phy::Transport;
use tdhcp::time::Duration;

struct Silent;

impl Transport for Silent {
    fn send(&mut self, _payload: &[u8], _destination: SocketAddrV6) -> io::Result<()> {
        Ok(())
    }

    fn recv(
        &mut self,
        _buffer: &mut [u8],
        _timeout: Duration,
    ) -> io::Result<Option<(usize, SocketAddrV6)>> {
        Ok(None)
    }
}
```
*/

use core::net::SocketAddrV6;
use std::io;

use crate::time::Duration;

#[cfg(feature = "phy-udp_socket")]
pub mod sys;

#[cfg(feature = "phy-udp_socket")]
mod udp_socket;

#[cfg(feature = "phy-udp_socket")]
pub use self::udp_socket::UdpTransport;

/// A datagram transport.
pub trait Transport {
    /// Send one datagram to `destination`.
    fn send(&mut self, payload: &[u8], destination: SocketAddrV6) -> io::Result<()>;

    /// Wait up to `timeout` for one datagram and copy it into `buffer`.
    ///
    /// Returns the length and sender, or `None` when nothing arrived in
    /// time.
    fn recv(
        &mut self,
        buffer: &mut [u8],
        timeout: Duration,
    ) -> io::Result<Option<(usize, SocketAddrV6)>>;

    /// Returns false once the underlying interface is gone.
    fn interface_up(&self) -> bool {
        true
    }
}
