/*! Exchange engines.

A DHCPv6 engine does not own a network handle. Outgoing datagrams are handed to
an `emit` closure and incoming ones are fed in with `process`; with the `std`
feature both engines also provide a blocking `run` loop over a
[Transport](crate::phy::Transport).

Engines are gated behind Cargo features:

| Feature         | Engine                              |
|-----------------|-------------------------------------|
| `socket-client` | [client::Client], the requesting end |
| `socket-server` | [server::Server], the stateless responder |
*/

use core::fmt;
use core::net::Ipv6Addr;
use core::str::FromStr;

use crate::time::Duration;
use crate::wire::{is_link_local, Dhcpv6MessageType, Dhcpv6Repr};

#[cfg(feature = "socket-client")]
pub mod client;
#[cfg(feature = "socket-server")]
pub mod server;

/// Cap on each kind of resource an engine collects or hands out.
pub const MAX_ITEMS: usize = 16;

/// Cap on the number of message types a [Filter] accepts at once.
pub const MAX_FILTER_TYPES: usize = 8;

/// How long a run loop waits for one datagram before moving on.
pub const RECEIVE_TIMEOUT: Duration = Duration::from_secs(1);

/// Which incoming messages an engine is prepared to accept.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Filter {
    types: heapless::Vec<Dhcpv6MessageType, MAX_FILTER_TYPES>,
    transaction_id: Option<u32>,
}

impl Filter {
    pub fn new() -> Filter {
        Filter::default()
    }

    /// Stop accepting every message type.
    pub fn clear(&mut self) {
        self.types.clear();
    }

    /// Accept `message_type` in addition to the types already accepted.
    pub fn accept(&mut self, message_type: Dhcpv6MessageType) {
        if !self.types.contains(&message_type) && self.types.push(message_type).is_err() {
            net_error!("DHCPv6 filter full, cannot accept {}", message_type);
        }
    }

    pub fn accepts(&self, message_type: Dhcpv6MessageType) -> bool {
        self.types.contains(&message_type)
    }

    /// Require incoming messages to carry this transaction ID, or lift the
    /// requirement with `None`.
    pub fn set_transaction_id(&mut self, transaction_id: Option<u32>) {
        self.transaction_id = transaction_id.map(|xid| xid & 0xff_ffff);
    }

    pub fn transaction_id(&self) -> Option<u32> {
        self.transaction_id
    }

    /// Decode a datagram received from `source`, dropping it unless it
    /// passes the filter.
    pub fn decode(&self, source: &Ipv6Addr, payload: &[u8]) -> Option<Dhcpv6Repr> {
        if !is_link_local(source) {
            net_warn!("DHCPv6 ignoring message from non link-local address {}", source);
            return None;
        }
        Dhcpv6Repr::decode(payload, &self.types, self.transaction_id)
    }
}

/// An IPv6 prefix, written `address/len`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Prefix {
    pub address: Ipv6Addr,
    pub len: u8,
}

impl Prefix {
    pub const DEFAULT_LEN: u8 = 64;

    /// Returns `Err` unless `len` is between 1 and 128.
    pub fn new(address: Ipv6Addr, len: u8) -> Result<Prefix, ConfigError> {
        if len == 0 || len > 128 {
            return Err(ConfigError::InvalidPrefixLength);
        }
        Ok(Prefix { address, len })
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{}", self.address, self.len)
    }
}

impl FromStr for Prefix {
    type Err = ConfigError;

    /// Parse `address/len`. Without a length, `/64` is assumed.
    fn from_str(s: &str) -> Result<Prefix, ConfigError> {
        let (address, len) = match s.split_once('/') {
            Some((address, len)) => {
                let len = len.parse().map_err(|_| ConfigError::InvalidPrefixLength)?;
                (address, len)
            }
            None => {
                net_warn!("prefix {} has no length, assuming /{}", s, Prefix::DEFAULT_LEN);
                (s, Prefix::DEFAULT_LEN)
            }
        };
        let address = address.parse().map_err(|_| ConfigError::InvalidAddress)?;
        Prefix::new(address, len)
    }
}

/// A configuration value was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Not an IPv6 address.
    InvalidAddress,
    /// Prefix length missing its digits or outside 1..=128.
    InvalidPrefixLength,
    /// `::` cannot be handed out.
    UnspecifiedAddress,
    EmptyDomain,
    /// A label of the domain is empty or longer than 63 octets.
    InvalidDomain,
    /// The list already holds [MAX_ITEMS] entries.
    Full,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::InvalidAddress => write!(f, "invalid IPv6 address"),
            ConfigError::InvalidPrefixLength => write!(f, "prefix length must be 1 to 128"),
            ConfigError::UnspecifiedAddress => write!(f, "the unspecified address is not allowed"),
            ConfigError::EmptyDomain => write!(f, "empty domain name"),
            ConfigError::InvalidDomain => {
                write!(f, "domain labels must be 1 to 63 octets long")
            }
            ConfigError::Full => write!(f, "too many entries, at most {MAX_ITEMS} are allowed"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

/// Push `item` unless an equal one is already present.
///
/// Returns `Ok(true)` if it was added, `Ok(false)` for a duplicate and
/// `Err(ConfigError::Full)` when there is no room left.
pub(crate) fn insert_unique<T: PartialEq, const N: usize>(
    items: &mut heapless::Vec<T, N>,
    item: T,
) -> Result<bool, ConfigError> {
    if items.contains(&item) {
        return Ok(false);
    }
    items.push(item).map_err(|_| ConfigError::Full)?;
    Ok(true)
}
