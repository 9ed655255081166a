#![allow(unsafe_code)]

use std::ffi::{CStr, CString};
use std::net::Ipv6Addr;
use std::os::unix::io::{AsRawFd, RawFd};
use std::{io, mem, ptr};

use crate::wire::is_link_local;

fn c_string(name: &str) -> io::Result<CString> {
    CString::new(name).map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "embedded NUL"))
}

fn c_buffer_to_string(buffer: &[u8]) -> String {
    match CStr::from_bytes_until_nul(buffer) {
        Ok(name) => name.to_string_lossy().into_owned(),
        Err(_) => String::from_utf8_lossy(buffer).into_owned(),
    }
}

/// Resolve an interface name to its index.
pub fn if_nametoindex(name: &str) -> io::Result<u32> {
    let name = c_string(name)?;
    let index = unsafe { libc::if_nametoindex(name.as_ptr()) };
    if index == 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(index)
}

/// Returns true if an interface with this index currently exists.
pub fn interface_exists(index: u32) -> bool {
    let mut name = [0 as libc::c_char; libc::IF_NAMESIZE];
    let res = unsafe { libc::if_indextoname(index, name.as_mut_ptr()) };
    !res.is_null()
}

/// Find a link-local address of the interface called `name`, with its
/// scope ID.
pub fn link_local_address(name: &str) -> io::Result<Option<(Ipv6Addr, u32)>> {
    let mut addrs: *mut libc::ifaddrs = ptr::null_mut();
    if unsafe { libc::getifaddrs(&mut addrs) } < 0 {
        return Err(io::Error::last_os_error());
    }

    let mut found = None;
    let mut cursor = addrs;
    while !cursor.is_null() {
        let ifa = unsafe { &*cursor };
        cursor = ifa.ifa_next;

        if ifa.ifa_addr.is_null() || ifa.ifa_name.is_null() {
            continue;
        }
        let ifa_name = unsafe { CStr::from_ptr(ifa.ifa_name) };
        let family = unsafe { (*ifa.ifa_addr).sa_family };
        if ifa_name.to_bytes() != name.as_bytes() || family as libc::c_int != libc::AF_INET6 {
            continue;
        }

        let sin6 = unsafe { &*(ifa.ifa_addr as *const libc::sockaddr_in6) };
        let addr = Ipv6Addr::from(sin6.sin6_addr.s6_addr);
        if is_link_local(&addr) {
            found = Some((addr, sin6.sin6_scope_id));
            break;
        }
    }

    unsafe { libc::freeifaddrs(addrs) };
    Ok(found)
}

fn setsockopt<T>(fd: RawFd, level: libc::c_int, name: libc::c_int, value: &T) -> io::Result<()> {
    let res = unsafe {
        libc::setsockopt(
            fd,
            level,
            name,
            value as *const T as *const libc::c_void,
            mem::size_of::<T>() as libc::socklen_t,
        )
    };
    if res < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

/// Send multicast datagrams out of the interface with this index.
pub fn set_multicast_interface<S: AsRawFd>(socket: &S, index: u32) -> io::Result<()> {
    let index = index as libc::c_uint;
    setsockopt(
        socket.as_raw_fd(),
        libc::IPPROTO_IPV6,
        libc::IPV6_MULTICAST_IF,
        &index,
    )
}

/// The host name, as `gethostname(2)` reports it.
pub fn host_name() -> io::Result<String> {
    let mut buffer = [0u8; 256];
    let res = unsafe { libc::gethostname(buffer.as_mut_ptr() as *mut libc::c_char, buffer.len()) };
    if res < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(c_buffer_to_string(&buffer))
}

cfg_if::cfg_if! {
    if #[cfg(target_os = "linux")] {
        /// Restrict the socket to the interface called `name`.
        pub fn bind_to_device<S: AsRawFd>(socket: &S, name: &str) -> io::Result<()> {
            let res = unsafe {
                libc::setsockopt(
                    socket.as_raw_fd(),
                    libc::SOL_SOCKET,
                    libc::SO_BINDTODEVICE,
                    name.as_ptr() as *const libc::c_void,
                    name.len() as libc::socklen_t,
                )
            };
            if res < 0 {
                return Err(io::Error::last_os_error());
            }
            Ok(())
        }

        /// The NIS domain name, as `getdomainname(2)` reports it.
        pub fn domain_name() -> io::Result<String> {
            let mut buffer = [0u8; 256];
            let res = unsafe {
                libc::getdomainname(buffer.as_mut_ptr() as *mut libc::c_char, buffer.len())
            };
            if res < 0 {
                return Err(io::Error::last_os_error());
            }
            Ok(c_buffer_to_string(&buffer))
        }
    } else {
        pub fn bind_to_device<S: AsRawFd>(_socket: &S, _name: &str) -> io::Result<()> {
            Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "binding to a device is not supported on this platform",
            ))
        }

        pub fn domain_name() -> io::Result<String> {
            Ok(String::new())
        }
    }
}

fn fork_and_exit_parent() -> io::Result<()> {
    match unsafe { libc::fork() } {
        -1 => Err(io::Error::last_os_error()),
        0 => Ok(()),
        _ => unsafe { libc::_exit(0) },
    }
}

/// Detach from the controlling terminal.
///
/// Forks twice with a `setsid` in between and points the standard streams at
/// `/dev/null`. Only the grandchild returns. The working directory is left
/// alone, so relative paths given on the command line keep working until
/// the caller moves.
pub fn daemonize() -> io::Result<()> {
    fork_and_exit_parent()?;
    if unsafe { libc::setsid() } < 0 {
        return Err(io::Error::last_os_error());
    }
    fork_and_exit_parent()?;
    unsafe { libc::umask(0o022) };

    let null = std::fs::OpenOptions::new()
        .read(true)
        .write(true)
        .open("/dev/null")?;
    for fd in 0..3 {
        if unsafe { libc::dup2(null.as_raw_fd(), fd) } < 0 {
            return Err(io::Error::last_os_error());
        }
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    #[cfg(target_os = "linux")]
    fn test_loopback_index() {
        let index = if_nametoindex("lo").unwrap();
        assert!(index > 0);
        assert!(interface_exists(index));
    }

    #[test]
    fn test_missing_interface() {
        assert!(if_nametoindex("tdhcp-none0").is_err());
        assert!(if_nametoindex("bad\0name").is_err());
        assert!(!interface_exists(u32::MAX));
    }

    #[test]
    fn test_host_name() {
        assert!(host_name().is_ok());
        assert!(domain_name().is_ok());
    }

    #[test]
    fn test_c_buffer_to_string() {
        assert_eq!(c_buffer_to_string(b"gw\0junk"), "gw");
        assert_eq!(c_buffer_to_string(b"full"), "full");
    }
}
