// See https://datatracker.ietf.org/doc/html/rfc8415 for the DHCPv6 specification.

use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;
use byteorder::{ByteOrder, NetworkEndian};
use core::net::Ipv6Addr;
use core::{fmt, iter};

use super::{Error, Result};

pub const SERVER_PORT: u16 = 547;
pub const CLIENT_PORT: u16 = 546;

/// `All_DHCP_Relay_Agents_and_Servers`, the link-scoped multicast address
/// clients send to.
pub const ALL_DHCP_AGENTS: Ipv6Addr = Ipv6Addr::new(0xff02, 0, 0, 0, 0, 0, 1, 2);

/// Size of the largest message the codec will produce.
pub const MAX_MESSAGE_LEN: usize = 65536;

/// Upper bound on a decoded domain name, in dotted notation.
pub const MAX_DOMAIN_NAME_LEN: usize = 1024;

/// Longest label allowed in a domain name.
pub const MAX_LABEL_LEN: usize = 63;

/// Lifetime value meaning "forever".
pub const INFINITE_LIFETIME: u32 = 0xffff_ffff;

/// Returns true if `addr` is in `fe80::/10`.
pub fn is_link_local(addr: &Ipv6Addr) -> bool {
    addr.segments()[0] & 0xffc0 == 0xfe80
}

enum_with_unknown! {
    /// The possible message types of a DHCP packet.
    pub enum MessageType(u8) {
        Solicit = 1,
        Advertise = 2,
        Request = 3,
        Confirm = 4,
        Renew = 5,
        Rebind = 6,
        Reply = 7,
        Release = 8,
        Decline = 9,
        Reconfigure = 10,
        InformationRequest = 11,
        RelayForw = 12,
        RelayRepl = 13,
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::Solicit => write!(f, "solicit"),
            Self::Advertise => write!(f, "advertise"),
            Self::Request => write!(f, "request"),
            Self::Confirm => write!(f, "confirm"),
            Self::Renew => write!(f, "renew"),
            Self::Rebind => write!(f, "rebind"),
            Self::Reply => write!(f, "reply"),
            Self::Release => write!(f, "release"),
            Self::Decline => write!(f, "decline"),
            Self::Reconfigure => write!(f, "reconfigure"),
            Self::InformationRequest => write!(f, "information-request"),
            Self::RelayForw => write!(f, "relay-forw"),
            Self::RelayRepl => write!(f, "relay-repl"),
            Self::Unknown(a) => write!(f, "unknown({a})"),
        }
    }
}

enum_with_unknown! {
    /// Option codes the codec knows how to parse.
    pub enum OptionKind(u16) {
        ClientId = 1,
        ServerId = 2,
        IaNa = 3,
        IaAddr = 5,
        RequestOptions = 6,
        ElapsedTime = 8,
        StatusCode = 13,
        RapidCommit = 14,
        DnsServers = 23,
        DomainList = 24,
        IaPd = 25,
        IaPrefix = 26,
    }
}

impl fmt::Display for OptionKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::ClientId => write!(f, "client-id"),
            Self::ServerId => write!(f, "server-id"),
            Self::IaNa => write!(f, "ia-na"),
            Self::IaAddr => write!(f, "ia-addr"),
            Self::RequestOptions => write!(f, "oro"),
            Self::ElapsedTime => write!(f, "elapsed-time"),
            Self::StatusCode => write!(f, "status-code"),
            Self::RapidCommit => write!(f, "rapid-commit"),
            Self::DnsServers => write!(f, "dns-servers"),
            Self::DomainList => write!(f, "domain-list"),
            Self::IaPd => write!(f, "ia-pd"),
            Self::IaPrefix => write!(f, "ia-prefix"),
            Self::Unknown(a) => write!(f, "unknown({a})"),
        }
    }
}

enum_with_unknown! {
    /// Status codes carried by the status code option.
    pub enum StatusCode(u16) {
        Success = 0,
        UnspecFail = 1,
        NoAddrsAvail = 2,
        NoBinding = 3,
        NotOnLink = 4,
        UseMulticast = 5,
        NoPrefixAvail = 6,
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::Success => write!(f, "success"),
            Self::UnspecFail => write!(f, "unspec-fail"),
            Self::NoAddrsAvail => write!(f, "no-addrs-avail"),
            Self::NoBinding => write!(f, "no-binding"),
            Self::NotOnLink => write!(f, "not-on-link"),
            Self::UseMulticast => write!(f, "use-multicast"),
            Self::NoPrefixAvail => write!(f, "no-prefix-avail"),
            Self::Unknown(a) => write!(f, "unknown({a})"),
        }
    }
}

/// A buffer for DHCP options.
#[derive(Debug)]
pub struct OptionWriter<'a> {
    /// The underlying buffer, directly from the DHCP packet representation.
    buffer: &'a mut [u8],
}

impl<'a> OptionWriter<'a> {
    pub fn new(buffer: &'a mut [u8]) -> Self {
        Self { buffer }
    }

    /// Number of octets still available.
    pub fn remaining(&self) -> usize {
        self.buffer.len()
    }

    fn take(&mut self, len: usize) -> Result<&'a mut [u8]> {
        if self.buffer.len() < len {
            return Err(Error);
        }

        let (buf, rest) = core::mem::take(&mut self.buffer).split_at_mut(len);
        self.buffer = rest;
        Ok(buf)
    }

    /// Emit an [`OptionRepr`], followed by its sub-options, into the buffer.
    ///
    /// Options of unknown kind are skipped.
    pub fn emit(&mut self, option: &OptionRepr) -> Result<()> {
        let kind = option.kind();
        if let OptionKind::Unknown(code) = kind {
            net_debug!("DHCPv6 skipping unknown option {} while encoding", code);
            return Ok(());
        }

        let data_len = option.data_len();
        if data_len > u16::MAX as usize {
            net_error!("DHCPv6 option {} too big ({} octets)", kind, data_len);
            return Err(Error);
        }

        let header = self.take(field::OPT_DATA.start)?;
        NetworkEndian::write_u16(&mut header[field::OPT_CODE], kind.into());
        NetworkEndian::write_u16(&mut header[field::OPT_LEN], data_len as u16);

        match option {
            OptionRepr::ClientId(duid) | OptionRepr::ServerId(duid) => {
                self.take(duid.len())?.copy_from_slice(duid);
            }
            OptionRepr::IaNa(ia) | OptionRepr::IaPd(ia) => {
                let buf = self.take(field::IA_OPTIONS.start)?;
                NetworkEndian::write_u32(&mut buf[field::IA_IAID], ia.iaid);
                NetworkEndian::write_u32(&mut buf[field::IA_T1], ia.t1);
                NetworkEndian::write_u32(&mut buf[field::IA_T2], ia.t2);
                self.emit_all(&ia.options)?;
            }
            OptionRepr::IaAddr(addr) => {
                let buf = self.take(field::IAADDR_OPTIONS.start)?;
                buf[field::IAADDR_ADDR].copy_from_slice(&addr.addr.octets());
                NetworkEndian::write_u32(&mut buf[field::IAADDR_PREFERRED], addr.preferred_lifetime);
                NetworkEndian::write_u32(&mut buf[field::IAADDR_VALID], addr.valid_lifetime);
                self.emit_all(&addr.options)?;
            }
            OptionRepr::IaPrefix(prefix) => {
                let buf = self.take(field::IAPREFIX_OPTIONS.start)?;
                NetworkEndian::write_u32(
                    &mut buf[field::IAPREFIX_PREFERRED],
                    prefix.preferred_lifetime,
                );
                NetworkEndian::write_u32(&mut buf[field::IAPREFIX_VALID], prefix.valid_lifetime);
                buf[field::IAPREFIX_LEN] = prefix.prefix_len;
                buf[field::IAPREFIX_PREFIX].copy_from_slice(&prefix.prefix.octets());
                self.emit_all(&prefix.options)?;
            }
            OptionRepr::DnsServers(addrs) => {
                for addr in addrs {
                    self.take(16)?.copy_from_slice(&addr.octets());
                }
            }
            OptionRepr::DomainList(names) => {
                for name in names {
                    emit_domain(name, self.take(domain_len(name))?)?;
                }
            }
            OptionRepr::ElapsedTime(centis) => {
                NetworkEndian::write_u16(self.take(2)?, *centis);
            }
            OptionRepr::StatusCode(status) => {
                let buf = self.take(status.data_len())?;
                NetworkEndian::write_u16(&mut buf[field::STATUS_CODE], status.status_code.into());
                buf[field::STATUS_MESSAGE].copy_from_slice(status.status_message.as_bytes());
            }
            OptionRepr::RequestOptions(kinds) => {
                for kind in kinds {
                    NetworkEndian::write_u16(self.take(2)?, (*kind).into());
                }
            }
            OptionRepr::RapidCommit | OptionRepr::Unknown(_) => {}
        }

        Ok(())
    }

    fn emit_all(&mut self, options: &[OptionRepr]) -> Result<()> {
        for option in options {
            self.emit(option)?;
        }
        Ok(())
    }
}

/// A raw DHCPv6 option, as found in a packet.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct RawOption<'a> {
    pub kind: u16,
    pub data: &'a [u8],
}

/// A read/write wrapper around a Dynamic Host Configuration Protocol for IPv6 packet buffer.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct Packet<T: AsRef<[u8]>> {
    buffer: T,
}

pub(crate) mod field {
    #![allow(non_snake_case)]
    #![allow(unused)]

    use crate::wire::field::*;

    //     0                   1                   2                   3
    //     0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
    //    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    //    |    msg-type   |               transaction-id                  |
    //    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    //    .                            options                            .
    //    .                 (variable number and length)                  .
    //    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    pub const MTYPE: usize = 0;
    pub const XID: Field = 1..4;
    pub const OPTIONS: Rest = 4..;

    //    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    //    |          option-code          |           option-len          |
    //    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    //    |                          option-data                          |
    //    |                      (option-len octets)                      |
    //    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    pub const OPT_CODE: Field = 0..2;
    pub const OPT_LEN: Field = 2..4;
    pub const OPT_DATA: Rest = 4..;

    // Offsets below are relative to option-data.

    // IA_NA and IA_PD: IAID, T1, T2, then IA_NA-options / IA_PD-options.
    pub const IA_IAID: Field = 0..4;
    pub const IA_T1: Field = 4..8;
    pub const IA_T2: Field = 8..12;
    pub const IA_OPTIONS: Rest = 12..;

    //    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    //    |                         IPv6-address                          |
    //    |                          (16 octets)                          |
    //    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    //    |                      preferred-lifetime                       |
    //    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    //    |                        valid-lifetime                         |
    //    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    //    .                        IAaddr-options                         .
    //    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    pub const IAADDR_ADDR: Field = 0..16;
    pub const IAADDR_PREFERRED: Field = 16..20;
    pub const IAADDR_VALID: Field = 20..24;
    pub const IAADDR_OPTIONS: Rest = 24..;

    //    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    //    |                      preferred-lifetime                       |
    //    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    //    |                        valid-lifetime                         |
    //    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    //    | prefix-length |                                               |
    //    +-+-+-+-+-+-+-+-+          IPv6-prefix                          |
    //    |                           (16 octets)                         |
    //    |               +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    //    |               |                                               .
    //    +-+-+-+-+-+-+-+-+                                               .
    //    .                       IAprefix-options                        .
    //    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    pub const IAPREFIX_PREFERRED: Field = 0..4;
    pub const IAPREFIX_VALID: Field = 4..8;
    pub const IAPREFIX_LEN: usize = 8;
    pub const IAPREFIX_PREFIX: Field = 9..25;
    pub const IAPREFIX_OPTIONS: Rest = 25..;

    pub const STATUS_CODE: Field = 0..2;
    pub const STATUS_MESSAGE: Rest = 2..;
}

impl<T: AsRef<[u8]>> Packet<T> {
    /// Imbue a raw octet buffer with DHCP packet structure.
    pub const fn new_unchecked(buffer: T) -> Packet<T> {
        Packet { buffer }
    }

    /// Shorthand for a combination of [new_unchecked] and [check_len].
    ///
    /// [new_unchecked]: #method.new_unchecked
    /// [check_len]: #method.check_len
    pub fn new_checked(buffer: T) -> Result<Packet<T>> {
        let packet = Self::new_unchecked(buffer);
        packet.check_len()?;
        Ok(packet)
    }

    /// Ensure that no accessor method will panic if called.
    /// Returns `Err(Error)` if the buffer is shorter than the fixed header.
    pub fn check_len(&self) -> Result<()> {
        let len = self.buffer.as_ref().len();
        if len < field::OPTIONS.start {
            Err(Error)
        } else {
            Ok(())
        }
    }

    /// Consume the packet, returning the underlying buffer.
    pub fn into_inner(self) -> T {
        self.buffer
    }

    /// Returns the message type.
    pub fn msg_type(&self) -> MessageType {
        MessageType::from(self.buffer.as_ref()[field::MTYPE])
    }

    /// Returns the transaction ID.
    ///
    /// The transaction ID (called `xid` in the specification) is a random number used to
    /// associate messages and responses between client and server. The number is chosen by
    /// the client.
    pub fn transaction_id(&self) -> u32 {
        let field = &self.buffer.as_ref()[field::XID];
        NetworkEndian::read_u24(field)
    }

    /// Return an iterator over the options.
    #[inline]
    pub fn options(&self) -> impl Iterator<Item = RawOption<'_>> + '_ {
        parse_options(&self.buffer.as_ref()[field::OPTIONS])
    }
}

/// Return an iterator over the options in `buf`.
///
/// Iteration stops at the first option whose declared length runs past the
/// end of `buf`; trailing octets too short to hold an option header are
/// ignored.
#[inline]
pub fn parse_options(mut buf: &[u8]) -> impl Iterator<Item = RawOption<'_>> + '_ {
    iter::from_fn(move || {
        if buf.len() < field::OPT_DATA.start {
            return None;
        }

        let kind = NetworkEndian::read_u16(&buf[field::OPT_CODE]);
        let len = NetworkEndian::read_u16(&buf[field::OPT_LEN]) as usize;
        if buf.len() < field::OPT_DATA.start + len {
            net_debug!(
                "DHCPv6 option {} claims {} octets but only {} remain, ignoring the rest",
                kind,
                len,
                buf.len() - field::OPT_DATA.start
            );
            buf = &[];
            return None;
        }

        let (option, rest) = buf.split_at(field::OPT_DATA.start + len);
        buf = rest;
        Some(RawOption {
            kind,
            data: &option[field::OPT_DATA],
        })
    })
}

impl<T: AsRef<[u8]> + AsMut<[u8]>> Packet<T> {
    /// Sets the message type.
    pub fn set_msg_type(&mut self, value: MessageType) {
        let field = &mut self.buffer.as_mut()[field::MTYPE];
        *field = value.into();
    }

    /// Sets the transaction ID.
    ///
    /// Only the low 24 bits of `value` are stored.
    pub fn set_transaction_id(&mut self, value: u32) {
        let value = value & 0xff_ffff;
        let field = &mut self.buffer.as_mut()[field::XID];
        NetworkEndian::write_u24(field, value)
    }

    /// Return a writer positioned at the start of the options.
    #[inline]
    pub fn options_mut(&mut self) -> OptionWriter<'_> {
        OptionWriter::new(&mut self.buffer.as_mut()[field::OPTIONS])
    }
}

/// A high-level representation of a DHCPv6 option.
///
/// The variant determines both the payload and whether the option may carry
/// sub-options: only the identity associations and the address and prefix
/// options they contain own child options.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum OptionRepr {
    ClientId(Vec<u8>),
    ServerId(Vec<u8>),
    IaNa(ReprIa),
    IaPd(ReprIa),
    IaAddr(ReprIaAddr),
    IaPrefix(ReprIaPrefix),
    DnsServers(Vec<Ipv6Addr>),
    DomainList(Vec<String>),
    /// Hundredths of a second since the client began the exchange.
    ElapsedTime(u16),
    StatusCode(ReprStatusCode),
    RapidCommit,
    RequestOptions(Vec<OptionKind>),
    /// An option this crate does not understand. Only the code is kept.
    Unknown(u16),
}

impl OptionRepr {
    /// Create an option of the given kind with an empty payload.
    pub fn empty(kind: OptionKind) -> OptionRepr {
        match kind {
            OptionKind::ClientId => OptionRepr::ClientId(Vec::new()),
            OptionKind::ServerId => OptionRepr::ServerId(Vec::new()),
            OptionKind::IaNa => OptionRepr::IaNa(ReprIa::default()),
            OptionKind::IaPd => OptionRepr::IaPd(ReprIa::default()),
            OptionKind::IaAddr => OptionRepr::IaAddr(ReprIaAddr::new(Ipv6Addr::UNSPECIFIED)),
            OptionKind::IaPrefix => {
                OptionRepr::IaPrefix(ReprIaPrefix::new(Ipv6Addr::UNSPECIFIED, 0))
            }
            OptionKind::RequestOptions => OptionRepr::RequestOptions(Vec::new()),
            OptionKind::ElapsedTime => OptionRepr::ElapsedTime(0),
            OptionKind::StatusCode => OptionRepr::StatusCode(ReprStatusCode {
                status_code: StatusCode::Success,
                status_message: String::new(),
            }),
            OptionKind::RapidCommit => OptionRepr::RapidCommit,
            OptionKind::DnsServers => OptionRepr::DnsServers(Vec::new()),
            OptionKind::DomainList => OptionRepr::DomainList(Vec::new()),
            OptionKind::Unknown(code) => OptionRepr::Unknown(code),
        }
    }

    pub fn kind(&self) -> OptionKind {
        match self {
            OptionRepr::ClientId(_) => OptionKind::ClientId,
            OptionRepr::ServerId(_) => OptionKind::ServerId,
            OptionRepr::IaNa(_) => OptionKind::IaNa,
            OptionRepr::IaPd(_) => OptionKind::IaPd,
            OptionRepr::IaAddr(_) => OptionKind::IaAddr,
            OptionRepr::IaPrefix(_) => OptionKind::IaPrefix,
            OptionRepr::DnsServers(_) => OptionKind::DnsServers,
            OptionRepr::DomainList(_) => OptionKind::DomainList,
            OptionRepr::ElapsedTime(_) => OptionKind::ElapsedTime,
            OptionRepr::StatusCode(_) => OptionKind::StatusCode,
            OptionRepr::RapidCommit => OptionKind::RapidCommit,
            OptionRepr::RequestOptions(_) => OptionKind::RequestOptions,
            OptionRepr::Unknown(code) => OptionKind::Unknown(*code),
        }
    }

    /// Length of the option-data field, including encoded sub-options.
    pub fn data_len(&self) -> usize {
        match self {
            OptionRepr::ClientId(duid) | OptionRepr::ServerId(duid) => duid.len(),
            OptionRepr::IaNa(ia) | OptionRepr::IaPd(ia) => ia.data_len(),
            OptionRepr::IaAddr(addr) => addr.data_len(),
            OptionRepr::IaPrefix(prefix) => prefix.data_len(),
            OptionRepr::DnsServers(addrs) => addrs.len() * 16,
            OptionRepr::DomainList(names) => names.iter().map(|name| domain_len(name)).sum(),
            OptionRepr::ElapsedTime(_) => 2,
            OptionRepr::StatusCode(status) => status.data_len(),
            OptionRepr::RequestOptions(kinds) => kinds.len() * 2,
            OptionRepr::RapidCommit | OptionRepr::Unknown(_) => 0,
        }
    }

    /// Number of octets this option occupies when emitted.
    pub fn buffer_len(&self) -> usize {
        match self {
            OptionRepr::Unknown(_) => 0,
            _ => field::OPT_DATA.start + self.data_len(),
        }
    }

    /// Parse a raw option. Fails if the payload is shorter than the fixed
    /// part its kind requires.
    pub fn parse(option: RawOption<'_>) -> Result<OptionRepr> {
        let data = option.data;
        let repr = match OptionKind::from(option.kind) {
            OptionKind::ClientId => OptionRepr::ClientId(data.to_vec()),
            OptionKind::ServerId => OptionRepr::ServerId(data.to_vec()),
            OptionKind::IaNa => OptionRepr::IaNa(ReprIa::parse(data)?),
            OptionKind::IaPd => OptionRepr::IaPd(ReprIa::parse(data)?),
            OptionKind::IaAddr => OptionRepr::IaAddr(ReprIaAddr::parse(data)?),
            OptionKind::IaPrefix => OptionRepr::IaPrefix(ReprIaPrefix::parse(data)?),
            OptionKind::DnsServers => {
                OptionRepr::DnsServers(data.chunks_exact(16).map(ipv6_from_bytes).collect())
            }
            OptionKind::DomainList => OptionRepr::DomainList(parse_domain_list(data)),
            OptionKind::ElapsedTime => {
                if data.len() < 2 {
                    return Err(Error);
                }
                OptionRepr::ElapsedTime(NetworkEndian::read_u16(data))
            }
            OptionKind::StatusCode => OptionRepr::StatusCode(ReprStatusCode::parse(data)?),
            OptionKind::RapidCommit => OptionRepr::RapidCommit,
            OptionKind::RequestOptions => OptionRepr::RequestOptions(
                data.chunks_exact(2)
                    .map(|code| OptionKind::from(NetworkEndian::read_u16(code)))
                    .collect(),
            ),
            OptionKind::Unknown(code) => {
                net_debug!(
                    "DHCPv6 unknown option {} ({} octets), keeping it without payload",
                    code,
                    data.len()
                );
                OptionRepr::Unknown(code)
            }
        };
        Ok(repr)
    }

    /// The sub-options of this option. Always empty for kinds that cannot
    /// have any.
    pub fn sub_options(&self) -> &[OptionRepr] {
        match self {
            OptionRepr::IaNa(ia) | OptionRepr::IaPd(ia) => &ia.options,
            OptionRepr::IaAddr(addr) => &addr.options,
            OptionRepr::IaPrefix(prefix) => &prefix.options,
            _ => &[],
        }
    }

    pub fn sub_options_mut(&mut self) -> Option<&mut Vec<OptionRepr>> {
        match self {
            OptionRepr::IaNa(ia) | OptionRepr::IaPd(ia) => Some(&mut ia.options),
            OptionRepr::IaAddr(addr) => Some(&mut addr.options),
            OptionRepr::IaPrefix(prefix) => Some(&mut prefix.options),
            _ => None,
        }
    }

    /// Append a sub-option, returning its index.
    ///
    /// Returns `Err(Error)` if this kind of option cannot carry sub-options.
    pub fn add_sub_option(&mut self, option: OptionRepr) -> Result<usize> {
        let options = self.sub_options_mut().ok_or(Error)?;
        options.push(option);
        Ok(options.len() - 1)
    }

    /// Returns true if this is an option request option listing `kind`.
    pub fn requests(&self, kind: OptionKind) -> bool {
        match self {
            OptionRepr::RequestOptions(kinds) => kinds.contains(&kind),
            _ => false,
        }
    }
}

impl fmt::Display for OptionRepr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            OptionRepr::ClientId(duid) => write!(f, "client-id={duid:X?}"),
            OptionRepr::ServerId(duid) => write!(f, "server-id={duid:X?}"),
            OptionRepr::IaNa(ia) => write!(f, "ia-na {ia}"),
            OptionRepr::IaPd(ia) => write!(f, "ia-pd {ia}"),
            OptionRepr::IaAddr(addr) => write!(f, "{addr}"),
            OptionRepr::IaPrefix(prefix) => write!(f, "{prefix}"),
            OptionRepr::DnsServers(addrs) => {
                write!(f, "dns-servers=")?;
                for addr in addrs {
                    write!(f, "{addr},")?;
                }
                Ok(())
            }
            OptionRepr::DomainList(names) => {
                write!(f, "domain-list=")?;
                for name in names {
                    write!(f, "{name},")?;
                }
                Ok(())
            }
            OptionRepr::ElapsedTime(centis) => write!(f, "elapsed-time={centis}/100s"),
            OptionRepr::StatusCode(status) => write!(f, "{status}"),
            OptionRepr::RapidCommit => write!(f, "rapid-commit"),
            OptionRepr::RequestOptions(kinds) => {
                write!(f, "oro=")?;
                for kind in kinds {
                    write!(f, "{kind},")?;
                }
                Ok(())
            }
            OptionRepr::Unknown(code) => write!(f, "unknown({code})"),
        }
    }
}

fn ipv6_from_bytes(data: &[u8]) -> Ipv6Addr {
    let mut octets = [0; 16];
    octets.copy_from_slice(&data[..16]);
    Ipv6Addr::from(octets)
}

fn options_len(options: &[OptionRepr]) -> usize {
    options.iter().map(OptionRepr::buffer_len).sum()
}

fn parse_option_list<'a>(options: impl Iterator<Item = RawOption<'a>>) -> Vec<OptionRepr> {
    options
        .filter_map(|option| match OptionRepr::parse(option) {
            Ok(repr) => Some(repr),
            Err(_) => {
                net_warn!(
                    "DHCPv6 option {} is too short ({} octets), dropping it",
                    option.kind,
                    option.data.len()
                );
                None
            }
        })
        .collect()
}

fn trim_domain(name: &str) -> &str {
    name.strip_suffix('.').unwrap_or(name)
}

/// Encoded length of `name` in DNS wire format.
fn domain_len(name: &str) -> usize {
    let name = trim_domain(name);
    if name.is_empty() {
        1
    } else {
        name.len() + 2
    }
}

/// Returns true if `name` can be written in DNS wire format: every label
/// between the dots holds 1 to 63 octets. A trailing dot is allowed.
pub fn is_valid_domain(name: &str) -> bool {
    let name = trim_domain(name);
    name.is_empty()
        || name
            .split('.')
            .all(|label| !label.is_empty() && label.len() <= MAX_LABEL_LEN)
}

/// Write `name` into `buf`, which must be exactly `domain_len(name)` long.
fn emit_domain(name: &str, buf: &mut [u8]) -> Result<()> {
    if !is_valid_domain(name) {
        net_error!("DHCPv6 cannot encode domain name {:?}", name);
        return Err(Error);
    }
    let name = trim_domain(name);
    let mut pos = 0;
    if !name.is_empty() {
        for label in name.split('.') {
            buf[pos] = label.len() as u8;
            buf[pos + 1..pos + 1 + label.len()].copy_from_slice(label.as_bytes());
            pos += 1 + label.len();
        }
    }
    buf[pos] = 0;
    Ok(())
}

/// Parse a single domain name from the start of `data`, returning it with
/// the number of octets consumed.
fn parse_domain(data: &[u8]) -> Option<(String, usize)> {
    let mut name = String::new();
    let mut pos = 0;
    while pos < data.len() {
        let len = data[pos] as usize;
        pos += 1;
        if len == 0 {
            return Some((name, pos));
        }
        if !name.is_empty() {
            name.push('.');
        }
        if name.len() + len >= MAX_DOMAIN_NAME_LEN || pos + len >= data.len() {
            return None;
        }
        name.push_str(&String::from_utf8_lossy(&data[pos..pos + len]));
        pos += len;
    }
    None
}

fn parse_domain_list(data: &[u8]) -> Vec<String> {
    let mut names = Vec::new();
    let mut pos = 0;
    while pos < data.len() {
        match parse_domain(&data[pos..]) {
            Some((name, len)) => {
                names.push(name);
                pos += len;
            }
            None => {
                net_warn!("DHCPv6 error while parsing domain name, skipping remainder");
                break;
            }
        }
    }
    names
}

/// An identity association, used by both IA_NA and IA_PD.
#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct ReprIa {
    /// The unique identifier for this IA
    pub iaid: u32,
    /// Time interval
    pub t1: u32,
    /// Time interval
    pub t2: u32,
    /// Addresses, prefixes, status codes
    pub options: Vec<OptionRepr>,
}

impl ReprIa {
    pub fn new(iaid: u32) -> Self {
        ReprIa {
            iaid,
            ..ReprIa::default()
        }
    }

    pub fn data_len(&self) -> usize {
        field::IA_OPTIONS.start + options_len(&self.options)
    }

    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < field::IA_OPTIONS.start {
            return Err(Error);
        }
        Ok(ReprIa {
            iaid: NetworkEndian::read_u32(&data[field::IA_IAID]),
            t1: NetworkEndian::read_u32(&data[field::IA_T1]),
            t2: NetworkEndian::read_u32(&data[field::IA_T2]),
            options: parse_option_list(parse_options(&data[field::IA_OPTIONS])),
        })
    }

    /// The IA_Address sub-options.
    pub fn addresses(&self) -> impl Iterator<Item = &ReprIaAddr> + '_ {
        self.options.iter().filter_map(|option| match option {
            OptionRepr::IaAddr(addr) => Some(addr),
            _ => None,
        })
    }

    /// The IA_Prefix sub-options.
    pub fn prefixes(&self) -> impl Iterator<Item = &ReprIaPrefix> + '_ {
        self.options.iter().filter_map(|option| match option {
            OptionRepr::IaPrefix(prefix) => Some(prefix),
            _ => None,
        })
    }

    pub fn status_code(&self) -> Option<&ReprStatusCode> {
        self.options.iter().find_map(|option| match option {
            OptionRepr::StatusCode(status) => Some(status),
            _ => None,
        })
    }
}

impl fmt::Display for ReprIa {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "iaid={} t1={} t2={}", self.iaid, self.t1, self.t2)?;
        for option in self.options.iter() {
            write!(f, " [{option}]")?;
        }
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ReprIaAddr {
    /// An IPv6 address
    pub addr: Ipv6Addr,
    /// The preferred lifetime in seconds
    pub preferred_lifetime: u32,
    /// The valid lifetime in seconds
    pub valid_lifetime: u32,
    pub options: Vec<OptionRepr>,
}

impl ReprIaAddr {
    pub fn new(addr: Ipv6Addr) -> Self {
        ReprIaAddr {
            addr,
            preferred_lifetime: 0,
            valid_lifetime: 0,
            options: Vec::new(),
        }
    }

    pub fn data_len(&self) -> usize {
        field::IAADDR_OPTIONS.start + options_len(&self.options)
    }

    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < field::IAADDR_OPTIONS.start {
            return Err(Error);
        }
        Ok(ReprIaAddr {
            addr: ipv6_from_bytes(&data[field::IAADDR_ADDR]),
            preferred_lifetime: NetworkEndian::read_u32(&data[field::IAADDR_PREFERRED]),
            valid_lifetime: NetworkEndian::read_u32(&data[field::IAADDR_VALID]),
            options: parse_option_list(parse_options(&data[field::IAADDR_OPTIONS])),
        })
    }
}

impl fmt::Display for ReprIaAddr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "ia-addr addr={} preferred={} valid={}",
            self.addr, self.preferred_lifetime, self.valid_lifetime
        )
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ReprIaPrefix {
    pub preferred_lifetime: u32,
    pub valid_lifetime: u32,
    /// Number of leading bits of `prefix` that are significant
    pub prefix_len: u8,
    pub prefix: Ipv6Addr,
    pub options: Vec<OptionRepr>,
}

impl ReprIaPrefix {
    pub fn new(prefix: Ipv6Addr, prefix_len: u8) -> Self {
        ReprIaPrefix {
            preferred_lifetime: 0,
            valid_lifetime: 0,
            prefix_len,
            prefix,
            options: Vec::new(),
        }
    }

    pub fn data_len(&self) -> usize {
        field::IAPREFIX_OPTIONS.start + options_len(&self.options)
    }

    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < field::IAPREFIX_OPTIONS.start {
            return Err(Error);
        }
        Ok(ReprIaPrefix {
            preferred_lifetime: NetworkEndian::read_u32(&data[field::IAPREFIX_PREFERRED]),
            valid_lifetime: NetworkEndian::read_u32(&data[field::IAPREFIX_VALID]),
            prefix_len: data[field::IAPREFIX_LEN],
            prefix: ipv6_from_bytes(&data[field::IAPREFIX_PREFIX]),
            options: parse_option_list(parse_options(&data[field::IAPREFIX_OPTIONS])),
        })
    }
}

impl fmt::Display for ReprIaPrefix {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "ia-prefix prefix={}/{} preferred={} valid={}",
            self.prefix, self.prefix_len, self.preferred_lifetime, self.valid_lifetime
        )
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ReprStatusCode {
    pub status_code: StatusCode,
    /// Human readable text, decoded lossily from UTF-8.
    pub status_message: String,
}

impl ReprStatusCode {
    pub fn data_len(&self) -> usize {
        field::STATUS_MESSAGE.start + self.status_message.len()
    }

    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < field::STATUS_MESSAGE.start {
            return Err(Error);
        }
        Ok(ReprStatusCode {
            status_code: StatusCode::from(NetworkEndian::read_u16(&data[field::STATUS_CODE])),
            status_message: String::from_utf8_lossy(&data[field::STATUS_MESSAGE]).into_owned(),
        })
    }
}

impl fmt::Display for ReprStatusCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "status={} msg={:?}", self.status_code, self.status_message)
    }
}

/// A high-level representation of a DHCPv6 message.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Repr {
    /// This field is also known as `msg-type` in the RFC.
    pub message_type: MessageType,
    /// This field is also known as `xid` in the RFC. Only the low 24 bits are
    /// carried on the wire.
    pub transaction_id: u32,
    /// Top-level options in the order they appear on the wire.
    pub options: Vec<OptionRepr>,
}

impl Repr {
    pub fn new(message_type: MessageType, transaction_id: u32) -> Self {
        Repr {
            message_type,
            transaction_id: transaction_id & 0xff_ffff,
            options: Vec::new(),
        }
    }

    /// Return the length of a packet that will be emitted from this high-level representation.
    pub fn buffer_len(&self) -> usize {
        field::OPTIONS.start + options_len(&self.options)
    }

    /// Parse a DHCPv6 packet and return a high-level representation.
    ///
    /// Options are decoded up to the first one that overruns the packet; a
    /// message type of zero is rejected.
    pub fn parse<T>(packet: &Packet<&T>) -> Result<Self>
    where
        T: AsRef<[u8]> + ?Sized,
    {
        packet.check_len()?;
        let message_type = packet.msg_type();
        if message_type == MessageType::Unknown(0) {
            return Err(Error);
        }

        Ok(Repr {
            message_type,
            transaction_id: packet.transaction_id(),
            options: parse_option_list(packet.options()),
        })
    }

    /// Decode `buffer` if its message type is one of `accepted` and, when
    /// `transaction_id` is given, its transaction ID matches.
    pub fn decode(
        buffer: &[u8],
        accepted: &[MessageType],
        transaction_id: Option<u32>,
    ) -> Option<Self> {
        let packet = match Packet::new_checked(buffer) {
            Ok(packet) => packet,
            Err(_) => {
                net_debug!("DHCPv6 message too short ({} octets), dropping it", buffer.len());
                return None;
            }
        };

        let message_type = packet.msg_type();
        if message_type == MessageType::Unknown(0) {
            net_debug!("DHCPv6 message with type 0, dropping it");
            return None;
        }
        if !accepted.contains(&message_type) {
            net_debug!("DHCPv6 ignoring {}: not expected now", message_type);
            return None;
        }
        if let Some(expected) = transaction_id {
            if packet.transaction_id() != expected & 0xff_ffff {
                net_debug!(
                    "DHCPv6 ignoring {}: transaction id {:#08x}, expected {:#08x}",
                    message_type,
                    packet.transaction_id(),
                    expected
                );
                return None;
            }
        }

        Self::parse(&packet).ok()
    }

    /// Emit a high-level representation into a DHCPv6 packet.
    ///
    /// The packet must be at least `buffer_len()` octets long.
    pub fn emit<T>(&self, packet: &mut Packet<&mut T>) -> Result<()>
    where
        T: AsRef<[u8]> + AsMut<[u8]> + ?Sized,
    {
        packet.set_msg_type(self.message_type);
        packet.set_transaction_id(self.transaction_id);

        let mut options = packet.options_mut();
        for option in self.options.iter() {
            options.emit(option)?;
        }
        Ok(())
    }

    /// Serialize into a freshly allocated buffer.
    ///
    /// With `elapsed_time`, an elapsed time option is appended after all
    /// other options, as clients do. Fails without producing anything if the
    /// result would exceed [`MAX_MESSAGE_LEN`].
    pub fn encode(&self, elapsed_time: Option<u16>) -> Result<Vec<u8>> {
        let trailer = elapsed_time.map(OptionRepr::ElapsedTime);
        let len = self.buffer_len() + trailer.as_ref().map_or(0, OptionRepr::buffer_len);
        if len > MAX_MESSAGE_LEN {
            net_error!(
                "DHCPv6 internal problem: {} would take {} octets, limit is {}",
                self.message_type,
                len,
                MAX_MESSAGE_LEN
            );
            return Err(Error);
        }

        let mut buffer = vec![0; len];
        let mut packet = Packet::new_unchecked(&mut buffer[..]);
        self.emit(&mut packet)?;
        if let Some(option) = trailer.as_ref() {
            OptionWriter::new(&mut buffer[self.buffer_len()..]).emit(option)?;
        }
        Ok(buffer)
    }

    /// Append a top-level option, returning its index.
    pub fn add_option(&mut self, option: OptionRepr) -> usize {
        self.options.push(option);
        self.options.len() - 1
    }

    /// Find the first top-level option of the given kind.
    pub fn find_option(&self, kind: OptionKind) -> Option<&OptionRepr> {
        self.options.iter().find(|option| option.kind() == kind)
    }

    pub fn find_option_mut(&mut self, kind: OptionKind) -> Option<&mut OptionRepr> {
        self.options.iter_mut().find(|option| option.kind() == kind)
    }

    /// Remove the first top-level option of the given kind, along with its
    /// sub-options.
    pub fn remove_option(&mut self, kind: OptionKind) -> Option<OptionRepr> {
        let index = self.options.iter().position(|option| option.kind() == kind)?;
        Some(self.options.remove(index))
    }

    /// Add `kind` to the option request option, creating it if needed.
    pub fn add_option_request(&mut self, kind: OptionKind) {
        match self.find_option_mut(OptionKind::RequestOptions) {
            Some(OptionRepr::RequestOptions(kinds)) => kinds.push(kind),
            _ => {
                self.add_option(OptionRepr::RequestOptions(vec![kind]));
            }
        }
    }

    /// Returns true if the option request option lists `kind`.
    pub fn has_option_request(&self, kind: OptionKind) -> bool {
        self.find_option(OptionKind::RequestOptions)
            .map_or(false, |option| option.requests(kind))
    }

    pub fn client_id(&self) -> Option<&[u8]> {
        match self.find_option(OptionKind::ClientId) {
            Some(OptionRepr::ClientId(duid)) => Some(duid),
            _ => None,
        }
    }

    pub fn server_id(&self) -> Option<&[u8]> {
        match self.find_option(OptionKind::ServerId) {
            Some(OptionRepr::ServerId(duid)) => Some(duid),
            _ => None,
        }
    }

    pub fn ia_na(&self) -> Option<&ReprIa> {
        match self.find_option(OptionKind::IaNa) {
            Some(OptionRepr::IaNa(ia)) => Some(ia),
            _ => None,
        }
    }

    pub fn ia_pd(&self) -> Option<&ReprIa> {
        match self.find_option(OptionKind::IaPd) {
            Some(OptionRepr::IaPd(ia)) => Some(ia),
            _ => None,
        }
    }

    pub fn dns_servers(&self) -> Option<&[Ipv6Addr]> {
        match self.find_option(OptionKind::DnsServers) {
            Some(OptionRepr::DnsServers(addrs)) => Some(addrs),
            _ => None,
        }
    }

    pub fn domain_list(&self) -> Option<&[String]> {
        match self.find_option(OptionKind::DomainList) {
            Some(OptionRepr::DomainList(names)) => Some(names),
            _ => None,
        }
    }

    pub fn elapsed_time(&self) -> Option<u16> {
        match self.find_option(OptionKind::ElapsedTime) {
            Some(OptionRepr::ElapsedTime(centis)) => Some(*centis),
            _ => None,
        }
    }

    pub fn status_code(&self) -> Option<&ReprStatusCode> {
        match self.find_option(OptionKind::StatusCode) {
            Some(OptionRepr::StatusCode(status)) => Some(status),
            _ => None,
        }
    }

    pub fn rapid_commit(&self) -> bool {
        self.find_option(OptionKind::RapidCommit).is_some()
    }
}

impl<'a, T: AsRef<[u8]> + ?Sized> fmt::Display for Packet<&'a T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match Repr::parse(self) {
            Ok(repr) => write!(f, "{repr}"),
            Err(err) => {
                write!(f, "DHCPv6 ({err})")
            }
        }
    }
}

impl fmt::Display for Repr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "DHCPv6 msg-type={} trans-id={:#08x}",
            self.message_type, self.transaction_id
        )?;
        for option in self.options.iter() {
            write!(f, " {option}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const ADDR_1: Ipv6Addr = Ipv6Addr::new(0x2001, 0xdb8, 0, 0, 0, 0, 0, 1);
    const PREFIX_1: Ipv6Addr = Ipv6Addr::new(0x2001, 0xdb8, 0, 0, 0, 0, 0, 0);
    const DNS_1: Ipv6Addr = Ipv6Addr::new(0x2001, 0xdb8, 0, 0, 0, 0, 0, 0x53);

    static SOLICIT_BYTES: &[u8] = &[
        0x01, 0x12, 0x34, 0x56, // solicit, xid
        0x00, 0x01, 0x00, 0x04, 0x00, 0x01, 0x02, 0x03, // client-id
        0x00, 0x06, 0x00, 0x04, 0x00, 0x17, 0x00, 0x18, // oro: dns-servers, domain-list
        0x00, 0x0e, 0x00, 0x00, // rapid-commit
    ];

    static IA_PD_BYTES: &[u8] = &[
        0x00, 0x19, 0x00, 0x29, // ia-pd, 41 octets
        0x00, 0x00, 0x00, 0x07, // iaid
        0x00, 0x00, 0x00, 0x00, // t1
        0x00, 0x00, 0x00, 0x00, // t2
        0x00, 0x1a, 0x00, 0x19, // ia-prefix, 25 octets
        0xff, 0xff, 0xff, 0xff, // preferred
        0xff, 0xff, 0xff, 0xff, // valid
        0x40, // prefix length
        0x20, 0x01, 0x0d, 0xb8, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00,
    ];

    fn solicit_repr() -> Repr {
        let mut repr = Repr::new(MessageType::Solicit, 0x123456);
        repr.add_option(OptionRepr::ClientId(vec![0, 1, 2, 3]));
        repr.add_option_request(OptionKind::DnsServers);
        repr.add_option_request(OptionKind::DomainList);
        repr.add_option(OptionRepr::RapidCommit);
        repr
    }

    fn ia_pd_repr() -> OptionRepr {
        let mut prefix = ReprIaPrefix::new(PREFIX_1, 64);
        prefix.preferred_lifetime = INFINITE_LIFETIME;
        prefix.valid_lifetime = INFINITE_LIFETIME;
        let mut ia = ReprIa::new(7);
        ia.options.push(OptionRepr::IaPrefix(prefix));
        OptionRepr::IaPd(ia)
    }

    #[test]
    fn test_deconstruct() {
        let packet = Packet::new_checked(SOLICIT_BYTES).unwrap();
        assert_eq!(packet.msg_type(), MessageType::Solicit);
        assert_eq!(packet.transaction_id(), 0x123456);

        let mut options = packet.options();
        assert_eq!(
            options.next(),
            Some(RawOption {
                kind: 1,
                data: &[0, 1, 2, 3]
            })
        );
        assert_eq!(
            options.next(),
            Some(RawOption {
                kind: 6,
                data: &[0x00, 0x17, 0x00, 0x18]
            })
        );
        assert_eq!(options.next(), Some(RawOption { kind: 14, data: &[] }));
        assert_eq!(options.next(), None);
    }

    #[test]
    fn test_parse() {
        let packet = Packet::new_checked(SOLICIT_BYTES).unwrap();
        let repr = Repr::parse(&packet).unwrap();
        assert_eq!(repr, solicit_repr());
        assert_eq!(repr.client_id(), Some(&[0u8, 1, 2, 3][..]));
        assert!(repr.has_option_request(OptionKind::DnsServers));
        assert!(repr.has_option_request(OptionKind::DomainList));
        assert!(!repr.has_option_request(OptionKind::IaPd));
        assert!(repr.rapid_commit());
    }

    #[test]
    fn test_emit() {
        let repr = solicit_repr();
        assert_eq!(repr.buffer_len(), SOLICIT_BYTES.len());

        let mut bytes = vec![0xa5; repr.buffer_len()];
        let mut packet = Packet::new_unchecked(&mut bytes[..]);
        repr.emit(&mut packet).unwrap();
        assert_eq!(&bytes[..], SOLICIT_BYTES);
    }

    #[test]
    fn test_emit_nested() {
        let option = ia_pd_repr();
        assert_eq!(option.buffer_len(), IA_PD_BYTES.len());

        let mut bytes = vec![0; option.buffer_len()];
        OptionWriter::new(&mut bytes).emit(&option).unwrap();
        assert_eq!(&bytes[..], IA_PD_BYTES);
    }

    #[test]
    fn test_parse_nested() {
        let raw = parse_options(IA_PD_BYTES).next().unwrap();
        let option = OptionRepr::parse(raw).unwrap();
        assert_eq!(option, ia_pd_repr());

        let OptionRepr::IaPd(ia) = option else {
            panic!("expected ia-pd");
        };
        let prefixes: Vec<_> = ia.prefixes().collect();
        assert_eq!(prefixes.len(), 1);
        assert_eq!(prefixes[0].prefix, PREFIX_1);
        assert_eq!(prefixes[0].prefix_len, 64);
    }

    #[test]
    fn test_round_trip() {
        let mut status = OptionRepr::empty(OptionKind::StatusCode);
        if let OptionRepr::StatusCode(status) = &mut status {
            status.status_code = StatusCode::NoAddrsAvail;
            status.status_message = String::from("sorry, all gone");
        }

        let mut addr = ReprIaAddr::new(ADDR_1);
        addr.preferred_lifetime = 3600;
        addr.valid_lifetime = 7200;
        let mut ia_na = OptionRepr::IaNa(ReprIa {
            iaid: 1,
            t1: 100,
            t2: 200,
            options: Vec::new(),
        });
        ia_na.add_sub_option(OptionRepr::IaAddr(addr)).unwrap();
        ia_na.add_sub_option(status).unwrap();

        let mut repr = Repr::new(MessageType::Reply, 0xabcdef);
        repr.add_option(OptionRepr::ServerId(vec![0, 2, 0, 0, 0x86, 0x38]));
        repr.add_option(OptionRepr::ClientId(vec![9; 25]));
        repr.add_option(OptionRepr::RapidCommit);
        repr.add_option(OptionRepr::DnsServers(vec![DNS_1, ADDR_1]));
        repr.add_option(OptionRepr::DomainList(vec![
            String::from("example.org"),
            String::from("lab.example.net"),
        ]));
        repr.add_option(ia_pd_repr());
        repr.add_option(ia_na);
        repr.add_option(OptionRepr::ElapsedTime(42));

        let bytes = repr.encode(None).unwrap();
        assert_eq!(bytes.len(), repr.buffer_len());
        let decoded = Repr::decode(&bytes, &[MessageType::Reply], Some(0xabcdef)).unwrap();
        assert_eq!(decoded, repr);
    }

    #[test]
    fn test_encode_appends_elapsed_time_last() {
        let repr = solicit_repr();
        let bytes = repr.encode(Some(250)).unwrap();
        assert_eq!(bytes.len(), SOLICIT_BYTES.len() + 6);
        assert_eq!(&bytes[..SOLICIT_BYTES.len()], SOLICIT_BYTES);
        assert_eq!(&bytes[SOLICIT_BYTES.len()..], &[0x00, 0x08, 0x00, 0x02, 0x00, 0xfa]);

        let decoded = Repr::decode(&bytes, &[MessageType::Solicit], None).unwrap();
        assert_eq!(decoded.options.last(), Some(&OptionRepr::ElapsedTime(250)));
        assert_eq!(decoded.elapsed_time(), Some(250));
    }

    #[test]
    fn test_domain_list_round_trip() {
        let names = vec![
            String::from("example.org"),
            String::new(),
            String::from("a.b.c.d"),
            String::from("x"),
        ];
        let option = OptionRepr::DomainList(names.clone());
        let mut bytes = vec![0; option.buffer_len()];
        OptionWriter::new(&mut bytes).emit(&option).unwrap();

        assert_eq!(
            &bytes[4..18],
            &[7, b'e', b'x', b'a', b'm', b'p', b'l', b'e', 3, b'o', b'r', b'g', 0, 0]
        );

        let raw = parse_options(&bytes).next().unwrap();
        assert_eq!(OptionRepr::parse(raw).unwrap(), OptionRepr::DomainList(names));
    }

    #[test]
    fn test_domain_trailing_dot() {
        let option = OptionRepr::DomainList(vec![String::from("example.org.")]);
        let mut bytes = vec![0; option.buffer_len()];
        OptionWriter::new(&mut bytes).emit(&option).unwrap();
        assert_eq!(
            parse_domain_list(&bytes[4..]),
            vec![String::from("example.org")]
        );
    }

    #[test]
    fn test_domain_invalid_labels() {
        let mut buf = [0; 16];
        assert_eq!(emit_domain("a..b", &mut buf[..domain_len("a..b")]), Err(Error));

        let long = "x".repeat(64);
        let mut buf = vec![0; domain_len(&long)];
        assert_eq!(emit_domain(&long, &mut buf), Err(Error));

        assert!(!is_valid_domain("a..b"));
        assert!(!is_valid_domain(".example.org"));
        assert!(!is_valid_domain(&long));
        assert!(is_valid_domain(&long[1..]));
        assert!(is_valid_domain("example.org."));
        assert!(is_valid_domain(""));
    }

    #[test]
    fn test_domain_overrun_keeps_earlier_names() {
        // "ok", then a label claiming 9 octets with only 3 present
        let data = [2, b'o', b'k', 0, 9, b'a', b'b', b'c'];
        assert_eq!(parse_domain_list(&data), vec![String::from("ok")]);
    }

    #[test]
    fn test_domain_too_long() {
        let mut data = Vec::new();
        for _ in 0..20 {
            data.push(60);
            data.extend_from_slice(&[b'z'; 60]);
        }
        data.push(0);
        data.extend_from_slice(&[3, b'n', b'e', b't', 0]);
        assert_eq!(parse_domain_list(&data), Vec::<String>::new());
    }

    #[test]
    fn test_transaction_filtering() {
        let bytes = solicit_repr().encode(None).unwrap();
        assert!(Repr::decode(&bytes, &[MessageType::Solicit], Some(0x123456)).is_some());
        assert!(Repr::decode(&bytes, &[MessageType::Solicit], Some(0x123457)).is_none());
        assert!(Repr::decode(&bytes, &[MessageType::Solicit], None).is_some());
    }

    #[test]
    fn test_decode_rejects() {
        assert!(Repr::decode(&[0x01, 0x00, 0x00], &[MessageType::Solicit], None).is_none());
        assert!(Repr::decode(&[0x00, 0x00, 0x00, 0x00], &[MessageType::Unknown(0)], None).is_none());
        assert!(Repr::decode(SOLICIT_BYTES, &[MessageType::Reply], None).is_none());
        assert!(Repr::decode(SOLICIT_BYTES, &[], None).is_none());

        let header_only = Repr::decode(&[0x07, 0, 0, 1], &[MessageType::Reply], Some(1)).unwrap();
        assert!(header_only.options.is_empty());
    }

    #[test]
    fn test_truncated_option() {
        let mut bytes = SOLICIT_BYTES[..12].to_vec();
        // server-id claiming 200 octets, only 3 present
        bytes.extend_from_slice(&[0x00, 0x02, 0x00, 0xc8, 1, 2, 3]);

        let repr = Repr::decode(&bytes, &[MessageType::Solicit], None).unwrap();
        assert_eq!(repr.options, vec![OptionRepr::ClientId(vec![0, 1, 2, 3])]);
    }

    #[test]
    fn test_sub_options_bounded_by_parent() {
        let mut bytes = vec![0x07, 0x00, 0x00, 0x01];
        // ia-na with 16 octets: iaid, t1, t2, then a sub-option header
        // claiming 8 octets that lie outside the ia-na.
        bytes.extend_from_slice(&[0x00, 0x03, 0x00, 0x10]);
        bytes.extend_from_slice(&[0, 0, 0, 5, 0, 0, 0, 0, 0, 0, 0, 0]);
        bytes.extend_from_slice(&[0x00, 0x05, 0x00, 0x08]);
        bytes.extend_from_slice(&[0x00, 0x0e, 0x00, 0x00]);

        let repr = Repr::decode(&bytes, &[MessageType::Reply], None).unwrap();
        assert_eq!(repr.ia_na(), Some(&ReprIa::new(5)));
        assert!(repr.rapid_commit());
    }

    #[test]
    fn test_short_payloads_dropped() {
        let mut bytes = vec![0x07, 0x00, 0x00, 0x01];
        bytes.extend_from_slice(&[0x00, 0x19, 0x00, 0x04, 0, 0, 0, 1]); // ia-pd, too short
        bytes.extend_from_slice(&[0x00, 0x08, 0x00, 0x01, 0]); // elapsed time, too short
        bytes.extend_from_slice(&[0x00, 0x02, 0x00, 0x01, 0xaa]);

        let repr = Repr::decode(&bytes, &[MessageType::Reply], None).unwrap();
        assert_eq!(repr.options, vec![OptionRepr::ServerId(vec![0xaa])]);
    }

    #[test]
    fn test_unknown_option() {
        let mut bytes = vec![0x07, 0x00, 0x00, 0x01];
        bytes.extend_from_slice(&[0x00, 0x27, 0x00, 0x02, 0xbe, 0xef]);
        bytes.extend_from_slice(&[0x00, 0x0e, 0x00, 0x00]);

        let repr = Repr::decode(&bytes, &[MessageType::Reply], None).unwrap();
        assert_eq!(
            repr.options,
            vec![OptionRepr::Unknown(0x27), OptionRepr::RapidCommit]
        );

        // unknown options are skipped on the way out
        assert_eq!(repr.buffer_len(), 8);
        assert_eq!(
            repr.encode(None).unwrap(),
            vec![0x07, 0x00, 0x00, 0x01, 0x00, 0x0e, 0x00, 0x00]
        );
    }

    #[test]
    fn test_encode_too_big() {
        let mut repr = Repr::new(MessageType::Reply, 1);
        repr.add_option(OptionRepr::ClientId(vec![0; 40000]));
        repr.add_option(OptionRepr::ServerId(vec![0; 40000]));
        assert_eq!(repr.encode(None), Err(Error));

        let mut repr = Repr::new(MessageType::Reply, 1);
        repr.add_option(OptionRepr::ClientId(vec![0; 65530]));
        assert_eq!(repr.encode(None), Err(Error));
    }

    #[test]
    fn test_option_model() {
        let mut repr = solicit_repr();
        assert_eq!(repr.options.len(), 3);

        assert_eq!(
            repr.remove_option(OptionKind::RequestOptions),
            Some(OptionRepr::RequestOptions(vec![
                OptionKind::DnsServers,
                OptionKind::DomainList
            ]))
        );
        assert_eq!(repr.options.len(), 2);
        assert_eq!(repr.options[1], OptionRepr::RapidCommit);
        assert_eq!(repr.remove_option(OptionKind::RequestOptions), None);
        assert!(repr.find_option(OptionKind::ServerId).is_none());

        let mut dns = OptionRepr::empty(OptionKind::DnsServers);
        assert_eq!(dns.add_sub_option(OptionRepr::RapidCommit), Err(Error));
        assert!(dns.sub_options().is_empty());
    }

    #[test]
    fn test_template_clones_are_independent() {
        let template = OptionRepr::IaPrefix(ReprIaPrefix::new(PREFIX_1, 48));
        let mut first = OptionRepr::empty(OptionKind::IaPd);
        let mut second = OptionRepr::empty(OptionKind::IaPd);
        first.add_sub_option(template.clone()).unwrap();
        second.add_sub_option(template.clone()).unwrap();

        if let Some(OptionRepr::IaPrefix(prefix)) = first.sub_options_mut().unwrap().get_mut(0) {
            prefix.prefix_len = 56;
        }
        assert_eq!(second.sub_options()[0], template);
        assert_ne!(first.sub_options()[0], template);
    }

    #[test]
    fn test_link_local() {
        assert!(is_link_local(&Ipv6Addr::new(0xfe80, 0, 0, 0, 0, 0, 0, 1)));
        assert!(is_link_local(&Ipv6Addr::new(0xfebf, 0, 0, 0, 0, 0, 0, 1)));
        assert!(!is_link_local(&Ipv6Addr::new(0xfec0, 0, 0, 0, 0, 0, 0, 1)));
        assert!(!is_link_local(&ADDR_1));
    }

    #[test]
    fn test_display() {
        let repr = solicit_repr();
        assert_eq!(
            format!("{repr}"),
            "DHCPv6 msg-type=solicit trans-id=0x123456 client-id=[0, 1, 2, 3] \
             oro=dns-servers,domain-list, rapid-commit"
        );
    }
}
