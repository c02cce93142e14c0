//! Socket construction with an optional fixed source address.

use ferrous_stub_domain::UpstreamEndpoint;
use socket2::{Domain, Protocol, Socket, Type};
use std::io;
use std::net::SocketAddr;
use tokio::net::{TcpSocket, UdpSocket};

const UDP_RECV_BUFFER_SIZE: usize = 256 * 1024;
const UDP_SEND_BUFFER_SIZE: usize = 128 * 1024;

fn domain_for(addr: SocketAddr) -> Domain {
    if addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    }
}

/// Datagram socket bound to the endpoint's source (or an ephemeral wildcard).
/// Not yet connected.
pub(crate) fn bind_udp(endpoint: &UpstreamEndpoint) -> io::Result<UdpSocket> {
    let bind_addr = endpoint.bind_addr();
    let socket = Socket::new(domain_for(bind_addr), Type::DGRAM, Some(Protocol::UDP))?;

    if endpoint.source.is_some() {
        socket.set_reuse_address(true)?;
    }
    socket.set_recv_buffer_size(UDP_RECV_BUFFER_SIZE)?;
    socket.set_send_buffer_size(UDP_SEND_BUFFER_SIZE)?;

    socket.bind(&bind_addr.into())?;
    socket.set_nonblocking(true)?;

    let std_socket: std::net::UdpSocket = socket.into();
    UdpSocket::from_std(std_socket)
}

/// Stream socket bound to the endpoint's source, ready for `connect`.
pub(crate) fn bind_tcp(endpoint: &UpstreamEndpoint) -> io::Result<TcpSocket> {
    let bind_addr = endpoint.bind_addr();
    let socket = Socket::new(domain_for(bind_addr), Type::STREAM, Some(Protocol::TCP))?;

    if endpoint.source.is_some() {
        socket.set_reuse_address(true)?;
        socket.bind(&bind_addr.into())?;
    }
    socket.set_nonblocking(true)?;

    let std_stream: std::net::TcpStream = socket.into();
    Ok(TcpSocket::from_std_stream(std_stream))
}
