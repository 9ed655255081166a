use alloc::string::{String, ToString};
use alloc::vec::Vec as AllocVec;
use core::net::{Ipv6Addr, SocketAddrV6};
use heapless::Vec;

#[cfg(feature = "std")]
use crate::phy::Transport;
use crate::socket::{insert_unique, ConfigError, Filter, Prefix, MAX_ITEMS};
#[cfg(feature = "std")]
use crate::socket::RECEIVE_TIMEOUT;
use crate::wire::{
    is_valid_domain, Duid, Dhcpv6MessageType, Dhcpv6OptionKind, Dhcpv6OptionRepr, Dhcpv6Repr,
    Dhcpv6ReprIa, Dhcpv6ReprIaAddr, Dhcpv6ReprIaPrefix, DHCPV6_INFINITE_LIFETIME,
};
#[cfg(feature = "std")]
use crate::wire::DHCPV6_MAX_MESSAGE_LEN;

/// What the server hands out, to every client alike.
#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct Config {
    pub addresses: Vec<Ipv6Addr, MAX_ITEMS>,
    pub prefixes: Vec<Prefix, MAX_ITEMS>,
    pub dns_servers: Vec<Ipv6Addr, MAX_ITEMS>,
    pub domains: Vec<String, MAX_ITEMS>,
}

impl Config {
    /// Add an address to hand out in IA_NA. Returns `Ok(false)` for a
    /// duplicate.
    pub fn add_address(&mut self, address: Ipv6Addr) -> Result<bool, ConfigError> {
        if address.is_unspecified() {
            return Err(ConfigError::UnspecifiedAddress);
        }
        insert_unique(&mut self.addresses, address)
    }

    /// Add a prefix to delegate in IA_PD.
    pub fn add_prefix(&mut self, prefix: Prefix) -> Result<bool, ConfigError> {
        if prefix.address.is_unspecified() {
            return Err(ConfigError::UnspecifiedAddress);
        }
        insert_unique(&mut self.prefixes, prefix)
    }

    pub fn add_dns_server(&mut self, address: Ipv6Addr) -> Result<bool, ConfigError> {
        if address.is_unspecified() {
            return Err(ConfigError::UnspecifiedAddress);
        }
        insert_unique(&mut self.dns_servers, address)
    }

    /// Add a search domain. Names that cannot be encoded are rejected here,
    /// so they never make a reply fail.
    pub fn add_domain(&mut self, domain: &str) -> Result<bool, ConfigError> {
        if domain.is_empty() || domain == "." {
            return Err(ConfigError::EmptyDomain);
        }
        if !is_valid_domain(domain) {
            return Err(ConfigError::InvalidDomain);
        }
        insert_unique(&mut self.domains, domain.to_string())
    }
}

/// DHCPv6 server.
///
/// Every Solicit, Request or Information-request gets one reply built from
/// the configuration alone. Nothing is remembered between requests, so
/// every client is offered the same resources.
#[derive(Debug)]
pub struct Server {
    config: Config,
    duid: Duid,
    filter: Filter,
}

impl Server {
    pub fn new(config: Config, duid: Duid) -> Server {
        let mut filter = Filter::new();
        filter.accept(Dhcpv6MessageType::Solicit);
        filter.accept(Dhcpv6MessageType::Request);
        filter.accept(Dhcpv6MessageType::InformationRequest);
        Server {
            config,
            duid,
            filter,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn duid(&self) -> &Duid {
        &self.duid
    }

    /// Build the reply to `request`.
    pub fn reply(&self, request: &Dhcpv6Repr) -> Dhcpv6Repr {
        let message_type = match request.message_type {
            Dhcpv6MessageType::Solicit if !request.rapid_commit() => Dhcpv6MessageType::Advertise,
            _ => Dhcpv6MessageType::Reply,
        };

        let mut reply = Dhcpv6Repr::new(message_type, request.transaction_id);
        reply.add_option(Dhcpv6OptionRepr::ServerId(self.duid.as_bytes().to_vec()));
        if let Some(client_id) = request.find_option(Dhcpv6OptionKind::ClientId) {
            reply.add_option(client_id.clone());
        }
        if request.rapid_commit() {
            reply.add_option(Dhcpv6OptionRepr::RapidCommit);
        }

        let config = &self.config;
        if !config.dns_servers.is_empty()
            && request.has_option_request(Dhcpv6OptionKind::DnsServers)
        {
            reply.add_option(Dhcpv6OptionRepr::DnsServers(
                config.dns_servers.iter().copied().collect(),
            ));
        }
        if !config.domains.is_empty() && request.has_option_request(Dhcpv6OptionKind::DomainList)
        {
            reply.add_option(Dhcpv6OptionRepr::DomainList(
                config.domains.iter().cloned().collect(),
            ));
        }

        if let (false, Some(ia_pd)) = (config.prefixes.is_empty(), request.ia_pd()) {
            let options: AllocVec<_> = config
                .prefixes
                .iter()
                .map(|prefix| {
                    let mut repr = Dhcpv6ReprIaPrefix::new(prefix.address, prefix.len);
                    repr.preferred_lifetime = DHCPV6_INFINITE_LIFETIME;
                    repr.valid_lifetime = DHCPV6_INFINITE_LIFETIME;
                    Dhcpv6OptionRepr::IaPrefix(repr)
                })
                .collect();
            reply.add_option(Dhcpv6OptionRepr::IaPd(Dhcpv6ReprIa {
                options,
                ..Dhcpv6ReprIa::new(ia_pd.iaid)
            }));
        }

        if let (false, Some(ia_na)) = (config.addresses.is_empty(), request.ia_na()) {
            let options: AllocVec<_> = config
                .addresses
                .iter()
                .map(|address| {
                    let mut repr = Dhcpv6ReprIaAddr::new(*address);
                    repr.preferred_lifetime = DHCPV6_INFINITE_LIFETIME;
                    repr.valid_lifetime = DHCPV6_INFINITE_LIFETIME;
                    Dhcpv6OptionRepr::IaAddr(repr)
                })
                .collect();
            reply.add_option(Dhcpv6OptionRepr::IaNa(Dhcpv6ReprIa {
                options,
                ..Dhcpv6ReprIa::new(ia_na.iaid)
            }));
        }

        reply
    }

    /// Answer a datagram received from `source`, handing the reply to
    /// `emit` along with its destination.
    ///
    /// Returns `Ok(false)` if the datagram was dropped or the reply could
    /// not be encoded.
    pub fn process<F, E>(
        &mut self,
        source: SocketAddrV6,
        payload: &[u8],
        emit: F,
    ) -> Result<bool, E>
    where
        F: FnOnce(&[u8], SocketAddrV6) -> Result<(), E>,
    {
        let request = match self.filter.decode(source.ip(), payload) {
            Some(request) => request,
            None => return Ok(false),
        };
        net_debug!("DHCPv6 recv from {}: {}", source, request);

        let reply = self.reply(&request);
        let payload = match reply.encode(None) {
            Ok(payload) => payload,
            Err(_) => {
                net_error!("DHCPv6 cannot encode {} to {}", reply.message_type, source);
                return Ok(false);
            }
        };

        net_debug!("DHCPv6 send to {}: {}", source, reply);
        emit(&payload[..], source)?;
        Ok(true)
    }

    /// Answer requests until the interface goes away or `transport` fails.
    ///
    /// Never returns `Ok`. Failing to send a reply is only logged.
    #[cfg(feature = "std")]
    pub fn run<T: Transport>(&mut self, transport: &mut T) -> std::io::Result<()> {
        use std::io;

        let mut buffer = alloc::vec![0; DHCPV6_MAX_MESSAGE_LEN];
        loop {
            if !transport.interface_up() {
                net_error!("DHCPv6 interface is gone, stopping");
                return Err(io::Error::new(io::ErrorKind::NotFound, "interface is gone"));
            }

            match transport.recv(&mut buffer, RECEIVE_TIMEOUT) {
                Ok(Some((len, source))) => {
                    let sent = self.process(source, &buffer[..len], |payload, destination| {
                        transport.send(payload, destination)
                    });
                    if let Err(err) = sent {
                        net_warn!("DHCPv6 send to {} failed: {}", source, err);
                    }
                }
                Ok(None) => {}
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => {
                    net_error!("DHCPv6 receive failed: {}", err);
                    return Err(err);
                }
            }
        }
    }
}
