//
// Copyright (c) The Slp Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::{Ipv4Addr, SocketAddr};
use std::os::raw::{c_int, c_void};
use std::os::unix::io::AsRawFd;

use libc::ip_mreqn;
// Re-export standard socket types.
pub use {socket2::Socket, tokio::net::UdpSocket};

// Useful type definition.
type Result<T> = std::io::Result<T>;

// Extension methods for all socket types.
//
// Multicast memberships and the outgoing multicast interface are keyed by
// the interface's IPv4 address rather than its ifindex, since that is how
// interfaces are identified throughout the service-location subsystem.
pub trait SocketExt: Sized + AsRawFd {
    // Sets the value of the IP_MULTICAST_IF option for this socket.
    fn set_multicast_ifaddr_v4(&self, ifaddr: &Ipv4Addr) -> Result<()> {
        let ifaddr: u32 = (*ifaddr).into();

        let optval = ip_mreqn {
            imr_multiaddr: libc::in_addr { s_addr: 0 },
            imr_address: libc::in_addr {
                s_addr: ifaddr.to_be(),
            },
            imr_ifindex: 0,
        };

        setsockopt(
            self,
            libc::IPPROTO_IP,
            libc::IP_MULTICAST_IF,
            &optval as *const _ as *const c_void,
            std::mem::size_of::<ip_mreqn>() as libc::socklen_t,
        )
    }

    // Executes an operation of the IP_ADD_MEMBERSHIP type.
    fn join_multicast_ifaddr_v4(
        &self,
        multiaddr: &Ipv4Addr,
        ifaddr: &Ipv4Addr,
    ) -> Result<()> {
        let multiaddr: u32 = (*multiaddr).into();
        let ifaddr: u32 = (*ifaddr).into();

        let optval = ip_mreqn {
            imr_multiaddr: libc::in_addr {
                s_addr: multiaddr.to_be(),
            },
            imr_address: libc::in_addr {
                s_addr: ifaddr.to_be(),
            },
            imr_ifindex: 0,
        };

        setsockopt(
            self,
            libc::IPPROTO_IP,
            libc::IP_ADD_MEMBERSHIP,
            &optval as *const _ as *const c_void,
            std::mem::size_of::<ip_mreqn>() as libc::socklen_t,
        )
    }

}

// Extension methods for UdpSocket.
pub trait UdpSocketExt: SocketExt {
    // Creates a UDP socket bound to the given address.
    //
    // This is the same as [`UdpSocket::bind`], except that the `SO_REUSEADDR`
    // option is set before binding.
    fn bind_reuseaddr(addr: SocketAddr) -> Result<UdpSocket>;
}

// ===== impl UdpSocket =====

impl SocketExt for UdpSocket {}

impl UdpSocketExt for UdpSocket {
    fn bind_reuseaddr(addr: SocketAddr) -> Result<UdpSocket> {
        use socket2::{Domain, Type};

        let socket = Socket::new(Domain::IPV4, Type::DGRAM, None)?;
        socket.set_nonblocking(true)?;
        socket.set_reuse_address(true)?;
        socket.bind(&addr.into())?;
        UdpSocket::from_std(socket.into())
    }
}

// ===== global functions =====

fn setsockopt<F: AsRawFd>(
    sock: &F,
    level: c_int,
    optname: c_int,
    optval: *const c_void,
    optlen: libc::socklen_t,
) -> Result<()> {
    let ret = unsafe {
        libc::setsockopt(sock.as_raw_fd(), level, optname, optval, optlen)
    };
    if ret == -1 {
        return Err(std::io::Error::last_os_error());
    }

    Ok(())
}
