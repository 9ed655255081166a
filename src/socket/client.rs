use alloc::string::{String, ToString};
use alloc::vec::Vec as AllocVec;
use core::fmt::{self, Write};
use core::net::{Ipv6Addr, SocketAddrV6};
use heapless::Vec;

#[cfg(feature = "std")]
use crate::phy::Transport;
use crate::socket::{insert_unique, Filter, Prefix, MAX_ITEMS};
#[cfg(feature = "std")]
use crate::socket::RECEIVE_TIMEOUT;
use crate::time::Instant;
use crate::wire::{
    Duid, Dhcpv6MessageType, Dhcpv6OptionKind, Dhcpv6OptionRepr, Dhcpv6Repr, Dhcpv6ReprIa,
};
#[cfg(feature = "std")]
use crate::wire::DHCPV6_MAX_MESSAGE_LEN;

bitflags::bitflags! {
    /// What the client asks the server for.
    pub struct Request: u8 {
        /// Non-temporary addresses, through an IA_NA.
        const ADDRESS = 0b001;
        /// Delegated prefixes, through an IA_PD.
        const PREFIX = 0b010;
        /// Recursive DNS servers and the domain search list.
        const DNS = 0b100;
    }
}

impl Request {
    /// Returns true if the exchange has to go through a Solicit, that is if
    /// an address or a prefix is asked for.
    pub fn wants_lease(&self) -> bool {
        self.intersects(Request::ADDRESS | Request::PREFIX)
    }
}

/// Client configuration.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct Config {
    pub request: Request,
    /// Offer a two-message exchange to the server.
    pub rapid_commit: bool,
    /// Number of times the message is sent before giving up.
    pub retries: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            request: Request::DNS,
            rapid_commit: true,
            retries: 10,
        }
    }
}

/// Progress of the exchange.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum State {
    /// Nothing sent yet.
    Start,
    /// Solicit sent, waiting for an Advertise (or a Reply with rapid commit).
    AwaitFirstReply,
    /// Request sent, waiting for the Reply.
    AwaitSecondReply,
    /// Information-request sent, waiting for the Reply.
    AwaitReply,
    Done,
}

/// Everything the client collected from the server.
#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct Lease {
    /// Address of the last server that answered.
    pub server: Option<Ipv6Addr>,
    pub addresses: Vec<Ipv6Addr, MAX_ITEMS>,
    pub prefixes: Vec<Prefix, MAX_ITEMS>,
    pub dns_servers: Vec<Ipv6Addr, MAX_ITEMS>,
    pub domains: Vec<String, MAX_ITEMS>,
}

impl Lease {
    /// Record an address. Returns false for `::`, a duplicate, or when the
    /// list is full.
    pub fn add_address(&mut self, address: Ipv6Addr) -> bool {
        !address.is_unspecified() && insert_unique(&mut self.addresses, address) == Ok(true)
    }

    /// Record a delegated prefix. Prefixes are keyed by address.
    pub fn add_prefix(&mut self, prefix: Prefix) -> bool {
        if prefix.address.is_unspecified()
            || self.prefixes.iter().any(|p| p.address == prefix.address)
        {
            return false;
        }
        self.prefixes.push(prefix).is_ok()
    }

    pub fn add_dns_server(&mut self, address: Ipv6Addr) -> bool {
        !address.is_unspecified() && insert_unique(&mut self.dns_servers, address) == Ok(true)
    }

    pub fn add_domain(&mut self, domain: &str) -> bool {
        !domain.is_empty() && insert_unique(&mut self.domains, domain.to_string()) == Ok(true)
    }

    /// Returns true if no address, prefix, DNS server or domain was received.
    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
            && self.prefixes.is_empty()
            && self.dns_servers.is_empty()
            && self.domains.is_empty()
    }

    /// The lease as environment variables for a configuration script.
    ///
    /// Lists are separated by single spaces. Empty variables are left out,
    /// except `DHCPSRV` which is always present.
    pub fn environment(&self, device: &str) -> AllocVec<(&'static str, String)> {
        let mut env: AllocVec<_> = [
            ("IPADDR", join(&self.addresses)),
            ("PREFIX", join(&self.prefixes)),
            ("DNSSRV", join(&self.dns_servers)),
            ("DNSDOM", join(&self.domains)),
            ("DEVICE", device.to_string()),
        ]
        .into_iter()
        .filter(|(_, value)| !value.is_empty())
        .collect();
        env.push(("DHCPSRV", join(&self.server)));
        env
    }

    /// Run `script` through `/bin/sh -c` with [environment](Self::environment)
    /// set. Returns whether it exited successfully.
    #[cfg(feature = "std")]
    pub fn run_script(&self, script: &str, device: &str) -> std::io::Result<bool> {
        net_debug!("running {} for {}", script, device);
        let status = std::process::Command::new("/bin/sh")
            .arg("-c")
            .arg(script)
            .envs(self.environment(device))
            .status()?;
        if !status.success() {
            net_warn!("{} failed: {}", script, status);
        }
        Ok(status.success())
    }
}

fn join<T: fmt::Display>(items: impl IntoIterator<Item = T>) -> String {
    let mut joined = String::new();
    for (i, item) in items.into_iter().enumerate() {
        if i != 0 {
            joined.push(' ');
        }
        let _ = write!(joined, "{item}");
    }
    joined
}

/// DHCPv6 client.
///
/// The client owns one outbound message for the whole exchange. It starts as
/// a Solicit, or an Information-request when neither addresses nor prefixes
/// are wanted, and is turned into a Request when an Advertise comes back.
/// Call [dispatch](Self::dispatch) to (re)send it and
/// [process](Self::process) with every datagram received.
#[derive(Debug)]
pub struct Client {
    config: Config,
    state: State,
    /// The message being sent, updated in place between rounds.
    message: Dhcpv6Repr,
    /// When `message` was created, for the elapsed time option.
    created_at: Instant,
    filter: Filter,
    lease: Lease,
}

impl Client {
    /// Create a client identifying itself with `duid` and starting with
    /// `transaction_id`.
    pub fn new(config: Config, duid: &Duid, transaction_id: u32, now: Instant) -> Client {
        let request = config.request;
        let message_type = if request.wants_lease() {
            Dhcpv6MessageType::Solicit
        } else {
            Dhcpv6MessageType::InformationRequest
        };

        let mut message = Dhcpv6Repr::new(message_type, transaction_id);
        message.add_option(Dhcpv6OptionRepr::ClientId(duid.as_bytes().to_vec()));
        if request.contains(Request::DNS) {
            message.add_option_request(Dhcpv6OptionKind::DnsServers);
            message.add_option_request(Dhcpv6OptionKind::DomainList);
        }
        if request.contains(Request::ADDRESS) {
            message.add_option(Dhcpv6OptionRepr::IaNa(Dhcpv6ReprIa::new(0)));
        }
        if request.contains(Request::PREFIX) {
            message.add_option(Dhcpv6OptionRepr::IaPd(Dhcpv6ReprIa::new(0)));
        }
        let rapid_commit = config.rapid_commit && request.wants_lease();
        if rapid_commit {
            message.add_option(Dhcpv6OptionRepr::RapidCommit);
        }

        let mut filter = Filter::new();
        if request.wants_lease() {
            filter.accept(Dhcpv6MessageType::Advertise);
            if rapid_commit {
                filter.accept(Dhcpv6MessageType::Reply);
            }
        } else {
            filter.accept(Dhcpv6MessageType::Reply);
        }
        filter.set_transaction_id(Some(message.transaction_id));

        Client {
            config,
            state: State::Start,
            message,
            created_at: now,
            filter,
            lease: Lease::default(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn is_done(&self) -> bool {
        self.state == State::Done
    }

    /// The message the next [dispatch](Self::dispatch) sends.
    pub fn message(&self) -> &Dhcpv6Repr {
        &self.message
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    pub fn lease(&self) -> &Lease {
        &self.lease
    }

    pub fn into_lease(self) -> Lease {
        self.lease
    }

    /// Encode the current message and hand it to `emit`.
    ///
    /// The transaction ID the filter requires only changes once `emit`
    /// succeeds. If the message cannot be encoded nothing is emitted.
    pub fn dispatch<F, E>(&mut self, now: Instant, emit: F) -> Result<(), E>
    where
        F: FnOnce(&[u8]) -> Result<(), E>,
    {
        if self.state == State::Done {
            return Ok(());
        }

        let elapsed = (now - self.created_at).total_centis_u16();
        let payload = match self.message.encode(Some(elapsed)) {
            Ok(payload) => payload,
            Err(_) => {
                net_error!("DHCPv6 cannot encode {}, not sending", self.message.message_type);
                return Ok(());
            }
        };

        net_debug!("DHCPv6 send {}", self.message);
        emit(&payload[..])?;

        self.filter
            .set_transaction_id(Some(self.message.transaction_id));
        if self.state == State::Start {
            self.state = if self.config.request.wants_lease() {
                State::AwaitFirstReply
            } else {
                State::AwaitReply
            };
        }
        Ok(())
    }

    /// Feed a datagram received from `source`. Returns true if it was
    /// accepted.
    pub fn process(&mut self, source: SocketAddrV6, payload: &[u8]) -> bool {
        if self.state == State::Done {
            return false;
        }
        net_trace!("DHCPv6 {} octets from {}", payload.len(), source);
        match self.filter.decode(source.ip(), payload) {
            Some(reply) => {
                net_debug!("DHCPv6 recv from {}: {}", source, reply);
                self.handle(*source.ip(), &reply);
                true
            }
            None => false,
        }
    }

    fn handle(&mut self, source: Ipv6Addr, reply: &Dhcpv6Repr) {
        self.collect(reply);
        self.lease.server = Some(source);

        if reply.message_type == Dhcpv6MessageType::Reply || reply.rapid_commit() {
            net_info!("DHCPv6 {} from {} completes the exchange", reply.message_type, source);
            self.state = State::Done;
            return;
        }

        self.filter.clear();
        self.filter.accept(Dhcpv6MessageType::Reply);

        self.message.message_type = if self.config.request.wants_lease() {
            Dhcpv6MessageType::Request
        } else {
            Dhcpv6MessageType::InformationRequest
        };
        self.message.transaction_id = self.message.transaction_id.wrapping_add(1) & 0xff_ffff;
        self.message.remove_option(Dhcpv6OptionKind::RapidCommit);
        match reply.find_option(Dhcpv6OptionKind::ServerId) {
            Some(server_id) => {
                self.message.add_option(server_id.clone());
            }
            None => net_warn!("DHCPv6 {} from {} has no server id", reply.message_type, source),
        }
        self.state = State::AwaitSecondReply;
    }

    fn collect(&mut self, reply: &Dhcpv6Repr) {
        let request = self.config.request;
        if request.contains(Request::DNS) {
            for address in reply.dns_servers().into_iter().flatten() {
                self.lease.add_dns_server(*address);
            }
            for domain in reply.domain_list().into_iter().flatten() {
                self.lease.add_domain(domain);
            }
        }

        for option in reply.options.iter() {
            match option {
                Dhcpv6OptionRepr::IaPd(ia) if request.contains(Request::PREFIX) => {
                    for prefix in ia.prefixes() {
                        match Prefix::new(prefix.prefix, prefix.prefix_len) {
                            Ok(prefix) => {
                                self.lease.add_prefix(prefix);
                            }
                            Err(_) => net_warn!(
                                "DHCPv6 ignoring prefix {} with length {}",
                                prefix.prefix,
                                prefix.prefix_len
                            ),
                        }
                    }
                }
                Dhcpv6OptionRepr::IaNa(ia) if request.contains(Request::ADDRESS) => {
                    for address in ia.addresses() {
                        self.lease.add_address(address.addr);
                    }
                }
                _ => {}
            }
        }
    }

    /// Run the exchange over `transport`, sending to `destination`.
    ///
    /// Each round sends the current message and waits up to
    /// [RECEIVE_TIMEOUT] for one datagram. Returns once the exchange is
    /// done or `retries` rounds have passed; only a receive error other
    /// than an interruption is returned.
    #[cfg(feature = "std")]
    pub fn run<T: Transport>(
        &mut self,
        transport: &mut T,
        destination: SocketAddrV6,
    ) -> std::io::Result<()> {
        let mut buffer = alloc::vec![0; DHCPV6_MAX_MESSAGE_LEN];
        for _ in 0..self.config.retries {
            if self.is_done() {
                break;
            }

            let sent = self.dispatch(Instant::now(), |payload| {
                transport.send(payload, destination)
            });
            if let Err(err) = sent {
                net_warn!("DHCPv6 send to {} failed: {}", destination, err);
            }

            match transport.recv(&mut buffer, RECEIVE_TIMEOUT) {
                Ok(Some((len, source))) => {
                    self.process(source, &buffer[..len]);
                }
                Ok(None) => net_debug!("DHCPv6 nothing received within {}", RECEIVE_TIMEOUT),
                Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(err) => {
                    net_error!("DHCPv6 receive failed: {}", err);
                    return Err(err);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::wire::{
        Dhcpv6ReprIaAddr, Dhcpv6ReprIaPrefix, Side, DHCPV6_INFINITE_LIFETIME, DHCPV6_SERVER_PORT,
    };
    #[cfg(feature = "std")]
    use crate::socket::mock::Canned;
    use alloc::vec;

    const SERVER_LL: Ipv6Addr = Ipv6Addr::new(0xfe80, 0, 0, 0, 0, 0, 0, 1);
    const DNS_1: Ipv6Addr = Ipv6Addr::new(0x2001, 0xdb8, 0, 0, 0, 0, 0, 0x53);
    const ADDR_1: Ipv6Addr = Ipv6Addr::new(0x2001, 0xdb8, 0, 0, 0, 0, 0, 2);
    const PREFIX_1: Ipv6Addr = Ipv6Addr::new(0x2001, 0xdb8, 1, 0, 0, 0, 0, 0);

    const SERVER_ID: [u8; 4] = [0xaa, 0xbb, 0xcc, 0xdd];

    fn server() -> SocketAddrV6 {
        SocketAddrV6::new(SERVER_LL, DHCPV6_SERVER_PORT, 0, 0)
    }

    fn client(request: Request, rapid_commit: bool) -> Client {
        let config = Config {
            request,
            rapid_commit,
            retries: 10,
        };
        let duid = Duid::from_local_id("client", Side::Client);
        Client::new(config, &duid, 0x123456, Instant::from_secs(100))
    }

    fn send(client: &mut Client, now: Instant) -> Dhcpv6Repr {
        let mut sent = None;
        client
            .dispatch(now, |payload| {
                sent = Some(payload.to_vec());
                Ok::<(), ()>(())
            })
            .unwrap();
        let sent = sent.expect("nothing sent");
        Dhcpv6Repr::decode(&sent, &[client.message().message_type], None).unwrap()
    }

    fn response(message_type: Dhcpv6MessageType, transaction_id: u32) -> Dhcpv6Repr {
        let mut repr = Dhcpv6Repr::new(message_type, transaction_id);
        repr.add_option(Dhcpv6OptionRepr::ServerId(SERVER_ID.to_vec()));
        repr.add_option(Dhcpv6OptionRepr::DnsServers(vec![DNS_1]));
        repr.add_option(Dhcpv6OptionRepr::DomainList(vec![
            String::from("example.org"),
            String::new(),
        ]));

        let mut prefix = Dhcpv6ReprIaPrefix::new(PREFIX_1, 56);
        prefix.valid_lifetime = DHCPV6_INFINITE_LIFETIME;
        let mut ia_pd = Dhcpv6OptionRepr::IaPd(Dhcpv6ReprIa::new(0));
        ia_pd.add_sub_option(Dhcpv6OptionRepr::IaPrefix(prefix)).unwrap();
        repr.add_option(ia_pd);

        let mut ia_na = Dhcpv6OptionRepr::IaNa(Dhcpv6ReprIa::new(0));
        ia_na
            .add_sub_option(Dhcpv6OptionRepr::IaAddr(Dhcpv6ReprIaAddr::new(ADDR_1)))
            .unwrap();
        repr.add_option(ia_na);
        repr
    }

    #[test]
    fn test_initial_message() {
        let mut client = client(Request::all(), true);
        assert_eq!(client.state(), State::Start);

        let sent = send(&mut client, Instant::from_millis(101_500));
        assert_eq!(sent.message_type, Dhcpv6MessageType::Solicit);
        assert_eq!(sent.transaction_id, 0x123456);
        let kinds: alloc::vec::Vec<_> = sent.options.iter().map(|o| o.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                Dhcpv6OptionKind::ClientId,
                Dhcpv6OptionKind::RequestOptions,
                Dhcpv6OptionKind::IaNa,
                Dhcpv6OptionKind::IaPd,
                Dhcpv6OptionKind::RapidCommit,
                Dhcpv6OptionKind::ElapsedTime,
            ]
        );
        assert_eq!(sent.elapsed_time(), Some(150));
        assert_eq!(sent.client_id().map(|id| id.len()), Some(25));
        assert!(sent.has_option_request(Dhcpv6OptionKind::DnsServers));
        assert!(sent.has_option_request(Dhcpv6OptionKind::DomainList));
        assert_eq!(client.state(), State::AwaitFirstReply);
        assert!(client.filter().accepts(Dhcpv6MessageType::Advertise));
        assert!(client.filter().accepts(Dhcpv6MessageType::Reply));
    }

    #[test]
    fn test_rapid_commit() {
        let mut client = client(Request::all(), true);
        send(&mut client, Instant::from_secs(100));

        let mut reply = response(Dhcpv6MessageType::Reply, 0x123456);
        reply.add_option(Dhcpv6OptionRepr::RapidCommit);
        assert!(client.process(server(), &reply.encode(None).unwrap()));

        assert!(client.is_done());
        let lease = client.lease();
        assert_eq!(lease.server, Some(SERVER_LL));
        assert_eq!(&lease.addresses[..], &[ADDR_1]);
        assert_eq!(
            &lease.prefixes[..],
            &[Prefix {
                address: PREFIX_1,
                len: 56
            }]
        );
        assert_eq!(&lease.dns_servers[..], &[DNS_1]);
        assert_eq!(&lease.domains[..], &[String::from("example.org")]);
    }

    #[test]
    fn test_advertise_with_rapid_commit_completes() {
        let mut client = client(Request::PREFIX | Request::DNS, true);
        send(&mut client, Instant::from_secs(100));

        let mut advertise = response(Dhcpv6MessageType::Advertise, 0x123456);
        advertise.add_option(Dhcpv6OptionRepr::RapidCommit);
        assert!(client.process(server(), &advertise.encode(None).unwrap()));

        assert!(client.is_done());
        assert_eq!(client.message().message_type, Dhcpv6MessageType::Solicit);
        assert_eq!(client.lease().server, Some(SERVER_LL));
        assert_eq!(
            &client.lease().prefixes[..],
            &[Prefix {
                address: PREFIX_1,
                len: 56
            }]
        );
        assert_eq!(&client.lease().dns_servers[..], &[DNS_1]);
        assert!(client.lease().addresses.is_empty());
    }

    #[test]
    fn test_plain_reply_to_rapid_solicit_completes() {
        let mut client = client(Request::ADDRESS, true);
        let solicit = send(&mut client, Instant::from_secs(100));
        assert!(solicit.rapid_commit());

        let reply = response(Dhcpv6MessageType::Reply, 0x123456);
        assert!(!reply.rapid_commit());
        assert!(client.process(server(), &reply.encode(None).unwrap()));

        assert!(client.is_done());
        assert_eq!(client.lease().server, Some(SERVER_LL));
        assert_eq!(&client.lease().addresses[..], &[ADDR_1]);
        assert!(client.lease().dns_servers.is_empty());
    }

    #[test]
    fn test_invalid_prefix_length_dropped() {
        let mut client = client(Request::PREFIX, false);
        send(&mut client, Instant::from_secs(100));

        let mut reply = Dhcpv6Repr::new(Dhcpv6MessageType::Advertise, 0x123456);
        reply.add_option(Dhcpv6OptionRepr::ServerId(SERVER_ID.to_vec()));
        let mut ia_pd = Dhcpv6OptionRepr::IaPd(Dhcpv6ReprIa::new(0));
        for (address, len) in [(ADDR_1, 0), (DNS_1, 200), (PREFIX_1, 48)] {
            ia_pd
                .add_sub_option(Dhcpv6OptionRepr::IaPrefix(Dhcpv6ReprIaPrefix::new(
                    address, len,
                )))
                .unwrap();
        }
        reply.add_option(ia_pd);
        assert!(client.process(server(), &reply.encode(None).unwrap()));

        assert_eq!(
            &client.lease().prefixes[..],
            &[Prefix {
                address: PREFIX_1,
                len: 48
            }]
        );
    }

    #[test]
    fn test_four_message_flow() {
        let mut client = client(Request::ADDRESS | Request::DNS, false);
        let solicit = send(&mut client, Instant::from_secs(100));
        assert!(!solicit.rapid_commit());
        assert!(!client.filter().accepts(Dhcpv6MessageType::Reply));

        let advertise = response(Dhcpv6MessageType::Advertise, 0x123456);
        assert!(client.process(server(), &advertise.encode(None).unwrap()));
        assert_eq!(client.state(), State::AwaitSecondReply);
        assert_eq!(&client.lease().addresses[..], &[ADDR_1]);
        assert!(client.lease().prefixes.is_empty());

        let request = send(&mut client, Instant::from_secs(101));
        assert_eq!(request.message_type, Dhcpv6MessageType::Request);
        assert_eq!(request.transaction_id, 0x123457);
        assert_eq!(request.server_id(), Some(&SERVER_ID[..]));
        assert_eq!(request.elapsed_time(), Some(100));
        assert_eq!(client.filter().transaction_id(), Some(0x123457));
        assert!(!client.filter().accepts(Dhcpv6MessageType::Advertise));

        let stale = response(Dhcpv6MessageType::Reply, 0x123456);
        assert!(!client.process(server(), &stale.encode(None).unwrap()));
        let advertise = response(Dhcpv6MessageType::Advertise, 0x123457);
        assert!(!client.process(server(), &advertise.encode(None).unwrap()));
        assert_eq!(client.state(), State::AwaitSecondReply);

        let reply = response(Dhcpv6MessageType::Reply, 0x123457);
        assert!(client.process(server(), &reply.encode(None).unwrap()));
        assert!(client.is_done());
        assert_eq!(client.lease().addresses.len(), 1);

        // nothing more is sent or accepted
        assert!(!client.process(server(), &reply.encode(None).unwrap()));
        let mut emitted = false;
        client
            .dispatch(Instant::from_secs(102), |_| {
                emitted = true;
                Ok::<(), ()>(())
            })
            .unwrap();
        assert!(!emitted);
    }

    #[test]
    fn test_transaction_id_wraps() {
        let duid = Duid::from_local_id("client", Side::Client);
        let mut client = Client::new(
            Config {
                request: Request::PREFIX,
                rapid_commit: false,
                retries: 1,
            },
            &duid,
            0xff_ffff,
            Instant::ZERO,
        );
        send(&mut client, Instant::ZERO);
        let advertise = response(Dhcpv6MessageType::Advertise, 0xff_ffff);
        assert!(client.process(server(), &advertise.encode(None).unwrap()));
        assert_eq!(client.message().transaction_id, 0);
    }

    #[test]
    fn test_failed_send_keeps_filter() {
        let mut client = client(Request::ADDRESS, false);
        send(&mut client, Instant::from_secs(100));
        let advertise = response(Dhcpv6MessageType::Advertise, 0x123456);
        client.process(server(), &advertise.encode(None).unwrap());

        assert_eq!(
            client.dispatch(Instant::from_secs(101), |_| Err("unreachable")),
            Err("unreachable")
        );
        assert_eq!(client.filter().transaction_id(), Some(0x123456));
        let reply = response(Dhcpv6MessageType::Reply, 0x123457);
        assert!(!client.process(server(), &reply.encode(None).unwrap()));
    }

    #[test]
    fn test_information_request() {
        let mut client = client(Request::DNS, true);
        let sent = send(&mut client, Instant::from_secs(100));
        assert_eq!(sent.message_type, Dhcpv6MessageType::InformationRequest);
        assert!(!sent.rapid_commit());
        assert!(sent.ia_na().is_none());
        assert_eq!(client.state(), State::AwaitReply);
        assert!(!client.filter().accepts(Dhcpv6MessageType::Advertise));

        let reply = response(Dhcpv6MessageType::Reply, 0x123456);
        assert!(client.process(server(), &reply.encode(None).unwrap()));
        assert!(client.is_done());
        assert_eq!(&client.lease().dns_servers[..], &[DNS_1]);
        assert!(client.lease().addresses.is_empty());
        assert!(client.lease().prefixes.is_empty());
    }

    #[test]
    fn test_ignores_off_link_source() {
        let mut client = client(Request::DNS, true);
        send(&mut client, Instant::from_secs(100));
        let reply = response(Dhcpv6MessageType::Reply, 0x123456);
        let source = SocketAddrV6::new(DNS_1, DHCPV6_SERVER_PORT, 0, 0);
        assert!(!client.process(source, &reply.encode(None).unwrap()));
        assert!(!client.is_done());
    }

    #[test]
    fn test_lease_limits() {
        let mut lease = Lease::default();
        assert!(lease.add_address(ADDR_1));
        assert!(!lease.add_address(ADDR_1));
        assert!(!lease.add_address(Ipv6Addr::UNSPECIFIED));
        assert!(!lease.add_domain(""));
        assert!(lease.add_domain("example.org"));
        assert!(!lease.add_domain("example.org"));
        assert!(lease.add_prefix(Prefix {
            address: PREFIX_1,
            len: 56
        }));
        assert!(!lease.add_prefix(Prefix {
            address: PREFIX_1,
            len: 64
        }));

        for i in 0..20 {
            lease.add_dns_server(Ipv6Addr::new(0x2001, 0xdb8, 0, 0, 0, 0, 0, i + 1));
        }
        assert_eq!(lease.dns_servers.len(), MAX_ITEMS);
        assert_eq!(lease.addresses.len(), 1);
    }

    #[test]
    fn test_environment() {
        let mut lease = Lease::default();
        assert!(lease.is_empty());
        lease.server = Some(SERVER_LL);
        lease.add_address(ADDR_1);
        lease.add_prefix(Prefix {
            address: PREFIX_1,
            len: 56,
        });
        lease.add_dns_server(DNS_1);
        lease.add_dns_server(ADDR_1);
        lease.add_domain("example.org");
        assert!(!lease.is_empty());

        let env = lease.environment("ppp0");
        assert_eq!(env[0], ("IPADDR", String::from("2001:db8::2")));
        assert_eq!(env[1], ("PREFIX", String::from("2001:db8:1::/56")));
        assert_eq!(env[2], ("DNSSRV", String::from("2001:db8::53 2001:db8::2")));
        assert_eq!(env[3], ("DNSDOM", String::from("example.org")));
        assert_eq!(env[4], ("DEVICE", String::from("ppp0")));
        assert_eq!(env[5], ("DHCPSRV", String::from("fe80::1")));

        assert_eq!(
            Lease::default().environment("eth0"),
            vec![("DEVICE", String::from("eth0")), ("DHCPSRV", String::new())]
        );

        let mut lease = Lease::default();
        lease.add_domain("example.org");
        let names: alloc::vec::Vec<_> = lease.environment("").iter().map(|(k, _)| *k).collect();
        assert_eq!(names, vec!["DNSDOM", "DHCPSRV"]);
    }

    #[test]
    #[cfg(feature = "std")]
    fn test_run_script() {
        let mut lease = Lease::default();
        lease.add_dns_server(DNS_1);
        let script = r#"test "$DNSSRV" = 2001:db8::53 && test "$DEVICE" = tun0"#;
        assert!(lease.run_script(script, "tun0").unwrap());
        assert!(!lease.run_script("exit 3", "tun0").unwrap());
    }

    #[test]
    #[cfg(feature = "std")]
    fn test_run_retries_until_reply() {
        use std::io;

        let destination = SocketAddrV6::new(crate::wire::DHCPV6_ALL_AGENTS, DHCPV6_SERVER_PORT, 0, 3);
        let mut transport = Canned::default();
        transport.inbox.push_back(Ok(None));
        transport
            .inbox
            .push_back(Err(io::Error::from(io::ErrorKind::Interrupted)));
        transport.inbox.push_back(Ok(Some((
            response(Dhcpv6MessageType::Reply, 0x123456).encode(None).unwrap(),
            server(),
        ))));

        let mut client = client(Request::DNS, true);
        client.run(&mut transport, destination).unwrap();
        assert!(client.is_done());
        assert_eq!(transport.sent.len(), 3);
        assert!(transport.sent.iter().all(|(_, dst)| *dst == destination));
        assert_eq!(client.into_lease().server, Some(SERVER_LL));
    }

    #[test]
    #[cfg(feature = "std")]
    fn test_run_gives_up() {
        let destination = SocketAddrV6::new(crate::wire::DHCPV6_ALL_AGENTS, DHCPV6_SERVER_PORT, 0, 3);
        let mut transport = Canned::default();
        let duid = Duid::from_local_id("client", Side::Client);
        let mut client = Client::new(
            Config {
                retries: 3,
                ..Config::default()
            },
            &duid,
            1,
            Instant::now(),
        );
        client.run(&mut transport, destination).unwrap();
        assert!(!client.is_done());
        assert_eq!(transport.sent.len(), 3);
        assert!(client.lease().is_empty());
    }

    #[test]
    #[cfg(feature = "std")]
    fn test_run_fatal_error() {
        use std::io;

        let destination = SocketAddrV6::new(crate::wire::DHCPV6_ALL_AGENTS, DHCPV6_SERVER_PORT, 0, 3);
        let mut transport = Canned::default();
        transport
            .inbox
            .push_back(Err(io::Error::from(io::ErrorKind::PermissionDenied)));

        let mut client = client(Request::DNS, true);
        let err = client.run(&mut transport, destination).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
        assert_eq!(transport.sent.len(), 1);
    }
}
