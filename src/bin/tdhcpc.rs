mod utils;

use std::process;

use log::{error, info, warn};

use tdhcp::phy::UdpTransport;
use tdhcp::socket::client::{Client, Config, Request};
use tdhcp::time::Instant;
use tdhcp::wire::Side;

fn main() {
    let (mut opts, mut free) = utils::create_options();
    opts.optflagmulti("p", "prefix", "request a delegated prefix");
    opts.optflagmulti("P", "no-prefix", "do not request a prefix (default)");
    opts.optflagmulti("a", "address", "request an address");
    opts.optflagmulti("A", "no-address", "do not request an address (default)");
    opts.optflagmulti("d", "dns", "request DNS servers and search domains (default)");
    opts.optflagmulti("D", "no-dns", "do not request DNS settings");
    opts.optflagmulti("c", "rapid-commit", "offer rapid commit (default)");
    opts.optflagmulti("C", "no-rapid-commit", "always use the four message exchange");
    opts.optopt("r", "retries", "give up after N attempts (default: 10)", "N");
    free.push("DEVICE");
    free.push("SCRIPT");

    let matches = utils::parse_options(&opts, free);
    utils::setup_logging(utils::log_level(&matches));

    let defaults = Config::default();
    let mut request = Request::empty();
    request.set(Request::PREFIX, utils::toggle(&matches, "p", "P", false));
    request.set(Request::ADDRESS, utils::toggle(&matches, "a", "A", false));
    request.set(
        Request::DNS,
        utils::toggle(&matches, "d", "D", defaults.request.contains(Request::DNS)),
    );
    let retries = matches
        .opt_get_default("r", defaults.retries)
        .unwrap_or_else(|err| {
            eprintln!("invalid retry count: {err}");
            process::exit(1)
        });
    let config = Config {
        request,
        rapid_commit: utils::toggle(&matches, "c", "C", defaults.rapid_commit),
        retries,
    };

    let device = &matches.free[0];
    let script = &matches.free[1];
    if request.is_empty() {
        warn!("nothing to request on {}", device);
        process::exit(1);
    }

    let duid = utils::local_duid(&matches, Side::Client);
    info!("client DUID is {}", duid);

    let mut transport = UdpTransport::new(device, Side::Client).unwrap_or_else(|err| {
        error!("cannot open a socket on {}: {}", device, err);
        process::exit(1)
    });
    let destination = transport.server_address();

    let transaction_id = rand::random::<u32>() & 0xff_ffff;
    let mut client = Client::new(config, &duid, transaction_id, Instant::now());
    if let Err(err) = client.run(&mut transport, destination) {
        error!("exchange on {} failed: {}", device, err);
        process::exit(1);
    }

    let lease = client.into_lease();
    if lease.is_empty() {
        warn!("no configuration received on {}", device);
        process::exit(1);
    }

    match lease.run_script(script, device) {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(err) => {
            error!("cannot run {}: {}", script, err);
            process::exit(1)
        }
    }
}
