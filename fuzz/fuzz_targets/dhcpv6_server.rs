#![no_main]
use libfuzzer_sys::fuzz_target;
use std::net::{Ipv6Addr, SocketAddrV6};
use tdhcp::socket::server::{Config, Server};
use tdhcp::socket::Prefix;
use tdhcp::wire::{Duid, Side};

fuzz_target!(|data: &[u8]| {
    let mut config = Config::default();
    let _ = config.add_prefix(Prefix::new(Ipv6Addr::new(0x2001, 0xdb8, 0, 0, 0, 0, 0, 0), 64).unwrap());
    let _ = config.add_dns_server(Ipv6Addr::new(0x2001, 0xdb8, 0, 0, 0, 0, 0, 0x53));
    let _ = config.add_domain("example.org");

    let mut server = Server::new(config, Duid::from_local_id("fuzz", Side::Server));
    let source = SocketAddrV6::new(Ipv6Addr::new(0xfe80, 0, 0, 0, 0, 0, 0, 1), 546, 0, 1);
    let _ = server.process(source, data, |_, _| Ok::<(), ()>(()));
});
