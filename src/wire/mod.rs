/*! Low-level packet access and construction.

The `wire` module deals with the packet *representation*. It provides two levels
of functionality.

 * First, it provides functions to extract fields from sequences of octets,
   and to insert fields into sequences of octets. This happens `Packet` family of
   structures, e.g. [Dhcpv6Packet].
 * Second, in cases where the space of valid field values is much smaller than the space
   of possible field values, it provides a compact, high-level representation
   of packet data that can be parsed from and emitted into a sequence of octets.
   This happens through the `Repr` family of structs and enums, e.g. [Dhcpv6Repr]
   and [Dhcpv6OptionRepr].

[Dhcpv6Packet]: struct.Dhcpv6Packet.html
[Dhcpv6Repr]: struct.Dhcpv6Repr.html
[Dhcpv6OptionRepr]: enum.Dhcpv6OptionRepr.html

The functions in the `wire` module are designed for use together with `-Cpanic=abort`.

The `Packet` family of data structures guarantees that, if the `Packet::check_len()` method
returned `Ok(())`, then no accessor or setter method will panic. A DHCPv6 message
is a variable-length sequence of options, so `Repr::parse` walks them with
bounds checks of its own: an option that claims more octets than remain is
never dereferenced.

The `Repr` family of data structures guarantees that, if the `Repr::emit()` method
is called on a buffer of at least `Repr::buffer_len()` octets, it will not panic.
*/

mod field {
    pub type Field = ::core::ops::Range<usize>;
    pub type Rest = ::core::ops::RangeFrom<usize>;
}

pub mod dhcpv6;
pub mod duid;

use core::fmt;

pub use self::dhcpv6::{
    is_link_local, is_valid_domain, MessageType as Dhcpv6MessageType, OptionKind as Dhcpv6OptionKind,
    OptionRepr as Dhcpv6OptionRepr, OptionWriter as Dhcpv6OptionWriter, Packet as Dhcpv6Packet,
    RawOption as Dhcpv6RawOption, Repr as Dhcpv6Repr, ReprIa as Dhcpv6ReprIa,
    ReprIaAddr as Dhcpv6ReprIaAddr, ReprIaPrefix as Dhcpv6ReprIaPrefix,
    ReprStatusCode as Dhcpv6ReprStatusCode, StatusCode as Dhcpv6StatusCode,
    ALL_DHCP_AGENTS as DHCPV6_ALL_AGENTS, CLIENT_PORT as DHCPV6_CLIENT_PORT,
    INFINITE_LIFETIME as DHCPV6_INFINITE_LIFETIME, MAX_MESSAGE_LEN as DHCPV6_MAX_MESSAGE_LEN,
    SERVER_PORT as DHCPV6_SERVER_PORT,
};

pub use self::duid::{Duid, Side};

/// Parsing a packet failed.
///
/// Either it is malformed, or it is not supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Error;

#[cfg(feature = "std")]
impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "wire::Error")
    }
}

pub type Result<T> = core::result::Result<T, Error>;
