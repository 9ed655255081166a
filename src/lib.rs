#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![deny(unsafe_code)]

//! The _tdhcp_ library is a minimal DHCPv6 client and server for links where
//! a single router hands out addresses, delegated prefixes and DNS settings
//! to its peer, such as tunnels and point-to-point connections.
//!
//! The crate is split the same way a small network stack would be:
//!
//! # The wire layer
//! The `wire` module contains the DHCPv6 message codec. Like the rest of the
//! crate it is built around two concepts: a _packet_, a view over a byte
//! buffer with field accessors, and a _representation_, a high level owned
//! structure that can be parsed from a packet and emitted into one. The
//! representation of a DHCPv6 message is a tree of options, since addresses
//! and prefixes are nested inside identity associations.
//!
//! # The socket layer
//! The `socket` module contains the client and server exchange engines. They
//! do not perform I/O themselves: outgoing datagrams are handed to an `emit`
//! closure and incoming datagrams are fed to `process`. With the `std`
//! feature, both engines also provide a blocking `run` loop on top of a
//! [phy::Transport].
//!
//! # The phy layer
//! The `phy` module defines the datagram transport the run loops use, and
//! provides an implementation over a UDP socket bound to one interface.
//!
//! # Minimum Supported Rust Version (MSRV)
//!
//! This crate is guaranteed to compile on stable Rust 1.77 and up with any valid set of features.

extern crate alloc;

#[macro_use]
mod macros;

#[cfg(feature = "std")]
pub mod phy;
pub mod socket;
pub mod time;
pub mod wire;
