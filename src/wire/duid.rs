use alloc::vec::Vec;
use core::fmt;
use md5::{Digest, Md5};

use super::{Error, Result};

/// DUID-EN, identifier based on an enterprise number.
const DUID_TYPE_EN: u16 = 2;

/// Private enterprise number the identifiers are scoped under.
const ENTERPRISE_NUMBER: u32 = 34360;

/// Longest DUID accepted from the command line.
pub const MAX_DUID_LEN: usize = 130;

/// Which end of the exchange an identifier belongs to.
///
/// Client and server on the same host derive their identifiers from the same
/// seed, so the side is mixed into the DUID to keep them distinct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Server,
    Client,
}

impl Side {
    pub fn tag(self) -> u8 {
        match self {
            Side::Server => 0x00,
            Side::Client => 0x01,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Side::Server => write!(f, "server"),
            Side::Client => write!(f, "client"),
        }
    }
}

/// A DHCP Unique Identifier.
///
/// Treated as an opaque sequence of octets once built.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Duid(Vec<u8>);

impl Duid {
    /// Build a DUID-EN from an arbitrary seed string.
    ///
    /// The identifier is the DUID type, the enterprise number, two zero
    /// octets, the side tag, then the MD5 digest of `seed`: 25 octets in all.
    pub fn from_seed(seed: &[u8], side: Side) -> Duid {
        let mut octets = Vec::with_capacity(25);
        octets.extend_from_slice(&DUID_TYPE_EN.to_be_bytes());
        octets.extend_from_slice(&ENTERPRISE_NUMBER.to_be_bytes());
        octets.extend_from_slice(&[0, 0, side.tag()]);
        octets.extend_from_slice(&Md5::digest(seed));
        Duid(octets)
    }

    /// Build a DUID-EN from a host name and domain name, joined by a NUL
    /// octet.
    pub fn from_host(host_name: &str, domain_name: &str, side: Side) -> Duid {
        let mut seed = Vec::with_capacity(host_name.len() + domain_name.len() + 1);
        seed.extend_from_slice(host_name.as_bytes());
        seed.push(0);
        seed.extend_from_slice(domain_name.as_bytes());
        Self::from_seed(&seed, side)
    }

    /// Build a DUID-EN from a local identifier string.
    pub fn from_local_id(local_id: &str, side: Side) -> Duid {
        Self::from_seed(local_id.as_bytes(), side)
    }

    /// Parse a DUID given as hexadecimal digits.
    ///
    /// Characters that are not hex digits are skipped, so `00-02-00-00` and
    /// `00:02:00:00` are both accepted. A trailing unpaired digit is
    /// dropped and at most [`MAX_DUID_LEN`] octets are kept.
    pub fn from_hex(text: &str) -> Result<Duid> {
        let mut octets = Vec::new();
        let mut high = None;
        for digit in text.chars().filter_map(|c| c.to_digit(16)) {
            match high.take() {
                None => high = Some(digit as u8),
                Some(high) => {
                    if octets.len() == MAX_DUID_LEN {
                        break;
                    }
                    octets.push(high << 4 | digit as u8);
                }
            }
        }

        if octets.is_empty() {
            return Err(Error);
        }
        Ok(Duid(octets))
    }

    pub fn from_bytes(octets: &[u8]) -> Duid {
        Duid(octets.to_vec())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for Duid {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Duid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, octet) in self.0.iter().enumerate() {
            if i != 0 {
                write!(f, "-")?;
            }
            write!(f, "{octet:02x}")?;
        }
        Ok(())
    }
}
