#![allow(dead_code)]

use std::env;
use std::io::Write;
use std::process;
use std::sync::{Mutex, OnceLock};

use env_logger::Builder;
use getopts::{Matches, Options};
use log::{Level, LevelFilter, Log, Metadata, Record};
use syslog::{Facility, Formatter3164, LoggerBackend};

use tdhcp::phy::sys;
use tdhcp::time::Instant;
use tdhcp::wire::{Duid, Side};

type SyslogWriter = syslog::Logger<LoggerBackend, Formatter3164>;

/// Writes to stderr until [setup_syslog] redirects it.
struct Logger {
    stderr: env_logger::Logger,
    syslog: Mutex<Option<SyslogWriter>>,
}

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.stderr.enabled(metadata)
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        if let Ok(mut syslog) = self.syslog.lock() {
            if let Some(writer) = syslog.as_mut() {
                let message = record.args().to_string();
                let _ = match record.level() {
                    Level::Error => writer.err(message),
                    Level::Warn => writer.warning(message),
                    Level::Info => writer.notice(message),
                    Level::Debug | Level::Trace => writer.debug(message),
                };
                return;
            }
        }
        self.stderr.log(record)
    }

    fn flush(&self) {
        self.stderr.flush()
    }
}

static LOGGER: OnceLock<Logger> = OnceLock::new();

pub fn setup_logging(level: LevelFilter) {
    let startup_at = Instant::now();
    let stderr = Builder::new()
        .format(move |buf, record| {
            let elapsed = Instant::now() - startup_at;
            let timestamp = format!("[{elapsed}]");
            if record.target().starts_with("tdhcp::") {
                writeln!(
                    buf,
                    "{} {} ({}): {}",
                    timestamp,
                    record.level(),
                    record.target().replace("tdhcp::", ""),
                    record.args()
                )
            } else if record.level() == Level::Trace {
                let message = format!("{}", record.args());
                writeln!(buf, "{} {}", timestamp, message.replace('\n', "\n             "))
            } else {
                writeln!(buf, "{} {}: {}", timestamp, record.level(), record.args())
            }
        })
        .filter(None, level)
        .parse_env("RUST_LOG")
        .build();
    let max_level = stderr.filter();
    let logger = LOGGER.get_or_init(|| Logger {
        stderr,
        syslog: Mutex::new(None),
    });
    if log::set_logger(logger).is_ok() {
        log::set_max_level(max_level);
    }
}

/// Send every further log line to syslog, as `tdhcpd` under `LOG_DAEMON`
/// or `tdhcpc` under `LOG_USER`. Call after detaching, so the pid is right.
pub fn setup_syslog(side: Side) {
    match (syslog::unix(syslog_formatter(side)), LOGGER.get()) {
        (Ok(writer), Some(logger)) => {
            if let Ok(mut syslog) = logger.syslog.lock() {
                *syslog = Some(writer);
            }
        }
        (Ok(_), None) => {}
        (Err(err), _) => log::error!("cannot connect to syslog: {}", err),
    }
}

fn syslog_formatter(side: Side) -> Formatter3164 {
    let (ident, facility) = match side {
        Side::Server => ("tdhcpd", Facility::LOG_DAEMON),
        Side::Client => ("tdhcpc", Facility::LOG_USER),
    };
    Formatter3164 {
        facility,
        hostname: None,
        process: ident.to_string(),
        pid: process::id(),
    }
}

pub fn create_options() -> (Options, Vec<&'static str>) {
    let mut opts = Options::new();
    opts.optflag("h", "help", "print this help menu");
    opts.optopt(
        "L",
        "log-level",
        "none, error, warn, info or debug (default: warn)",
        "LEVEL",
    );
    opts.optopt("l", "local-id", "derive the DUID from ID instead of the host name", "ID");
    opts.optopt("u", "duid", "use this DUID, given in hex", "DUID");
    (opts, Vec::new())
}

pub fn parse_options(options: &Options, free: Vec<&str>) -> Matches {
    match options.parse(env::args().skip(1)) {
        Err(err) => {
            eprintln!("{err}");
            process::exit(1)
        }
        Ok(matches) => {
            if matches.opt_present("h") || matches.free.len() != free.len() {
                let program = env::args().next().unwrap_or_else(|| String::from("tdhcp"));
                let brief = format!("Usage: {} [OPTION]... {}", program, free.join(" "));
                print!("{}", options.usage(&brief));
                process::exit(if matches.free.len() != free.len() {
                    1
                } else {
                    0
                })
            }
            matches
        }
    }
}

pub fn parse_log_level(level: &str) -> Option<LevelFilter> {
    match level.to_ascii_lowercase().as_str() {
        "none" => Some(LevelFilter::Off),
        "error" | "err" => Some(LevelFilter::Error),
        "warn" | "warning" => Some(LevelFilter::Warn),
        "info" => Some(LevelFilter::Info),
        "debug" => Some(LevelFilter::Debug),
        _ => None,
    }
}

pub fn log_level(matches: &Matches) -> LevelFilter {
    match matches.opt_str("L") {
        None => LevelFilter::Warn,
        Some(level) => parse_log_level(&level).unwrap_or_else(|| {
            eprintln!("unknown log level {level}");
            process::exit(1)
        }),
    }
}

/// The DUID to identify as: given with `-u`, seeded with `-l`, or derived
/// from the host and domain names.
pub fn local_duid(matches: &Matches, side: Side) -> Duid {
    if let Some(hex) = matches.opt_str("u") {
        return Duid::from_hex(&hex).unwrap_or_else(|_| {
            eprintln!("invalid DUID {hex}");
            process::exit(1)
        });
    }
    if let Some(local_id) = matches.opt_str("l") {
        return Duid::from_local_id(&local_id, side);
    }

    let host_name = sys::host_name().unwrap_or_else(|err| {
        log::warn!("cannot get host name: {}", err);
        String::new()
    });
    let domain_name = sys::domain_name().unwrap_or_else(|err| {
        log::warn!("cannot get domain name: {}", err);
        String::new()
    });
    Duid::from_host(&host_name, &domain_name, side)
}

/// Resolve a pair of opposing flags; the one given last wins.
pub fn toggle(matches: &Matches, on: &str, off: &str, default: bool) -> bool {
    let on = matches.opt_positions(on).last().copied();
    let off = matches.opt_positions(off).last().copied();
    match (on, off) {
        (None, None) => default,
        (on, off) => on > off,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_syslog_identity() {
        let server = syslog_formatter(Side::Server);
        assert_eq!(server.process, "tdhcpd");
        assert_eq!(server.facility, Facility::LOG_DAEMON);
        assert_eq!(server.pid, process::id());

        let client = syslog_formatter(Side::Client);
        assert_eq!(client.process, "tdhcpc");
        assert_eq!(client.facility, Facility::LOG_USER);
    }

    #[test]
    fn test_parse_log_level() {
        assert_eq!(parse_log_level("ERR"), Some(LevelFilter::Error));
        assert_eq!(parse_log_level("warning"), Some(LevelFilter::Warn));
        assert_eq!(parse_log_level("none"), Some(LevelFilter::Off));
        assert_eq!(parse_log_level("loud"), None);
    }
}
