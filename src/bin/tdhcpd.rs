mod utils;

use std::net::Ipv6Addr;
use std::{env, fs, process};

use log::{error, info, warn};

use tdhcp::phy::{sys, UdpTransport};
use tdhcp::socket::server::{Config, Server};
use tdhcp::socket::{ConfigError, Prefix};
use tdhcp::wire::Side;

fn report(what: &str, value: &str, result: Result<bool, ConfigError>) {
    match result {
        Ok(true) => info!("serving {} {}", what, value),
        Ok(false) => warn!("duplicate {} {} ignored", what, value),
        Err(err) => warn!("ignoring {} {}: {}", what, value, err),
    }
}

fn parse_address(value: &str) -> Result<Ipv6Addr, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidAddress)
}

fn main() {
    let (mut opts, mut free) = utils::create_options();
    opts.optmulti("p", "prefix", "delegate this prefix", "PREFIX/LEN");
    opts.optmulti("a", "address", "hand out this address", "ADDR");
    opts.optmulti("d", "dns", "announce this DNS server", "ADDR");
    opts.optmulti("D", "domain", "announce this search domain", "DOMAIN");
    opts.optflag("f", "foreground", "do not detach from the terminal");
    opts.optopt("P", "pidfile", "write the process id to FILE", "FILE");
    free.push("DEVICE");

    let matches = utils::parse_options(&opts, free);
    utils::setup_logging(utils::log_level(&matches));

    let mut config = Config::default();
    for value in matches.opt_strs("p") {
        let result = value
            .parse::<Prefix>()
            .and_then(|prefix| config.add_prefix(prefix));
        report("prefix", &value, result);
    }
    for value in matches.opt_strs("a") {
        let result = parse_address(&value).and_then(|address| config.add_address(address));
        report("address", &value, result);
    }
    for value in matches.opt_strs("d") {
        let result = parse_address(&value).and_then(|address| config.add_dns_server(address));
        report("DNS server", &value, result);
    }
    for value in matches.opt_strs("D") {
        let result = config.add_domain(&value);
        report("domain", &value, result);
    }

    let device = &matches.free[0];
    let duid = utils::local_duid(&matches, Side::Server);
    info!("server DUID is {}", duid);

    let mut transport = UdpTransport::new(device, Side::Server).unwrap_or_else(|err| {
        error!("cannot open a socket on {}: {}", device, err);
        process::exit(1)
    });
    if let Err(err) = transport.join_multicast() {
        error!("cannot join the DHCPv6 group on {}: {}", device, err);
        process::exit(1);
    }

    if !matches.opt_present("f") {
        if let Err(err) = sys::daemonize() {
            error!("cannot detach: {}", err);
            process::exit(1);
        }
        utils::setup_syslog(Side::Server);
    }
    if let Some(path) = matches.opt_str("P") {
        if let Err(err) = fs::write(&path, format!("{}\n", process::id())) {
            warn!("cannot write pid file {}: {}", path, err);
        }
    }
    if let Err(err) = env::set_current_dir("/") {
        warn!("cannot change directory to /: {}", err);
    }

    let mut server = Server::new(config, duid);
    if let Err(err) = server.run(&mut transport) {
        error!("serving {} failed: {}", device, err);
    }
    process::exit(1);
}
