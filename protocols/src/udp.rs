use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;

use thiserror::Error;
use tokio::net::UdpSocket;
use tracing::debug;

use crate::dns;

/// EDNS-less DNS over UDP never exceeds this, but leave room for sloppy servers.
const RECV_BUF_LEN: usize = 4096;

#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("no reply from {0} before timeout")]
    Timeout(SocketAddr),
    #[error("socket error talking to {addr}: {source}")]
    Io {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
}

impl ExchangeError {
    /// ICMP port/host unreachable surfaced by a connected socket.
    pub fn is_unreachable(&self) -> bool {
        match self {
            ExchangeError::Io { source, .. } => matches!(
                source.kind(),
                io::ErrorKind::ConnectionRefused
                    | io::ErrorKind::HostUnreachable
                    | io::ErrorKind::NetworkUnreachable
                    | io::ErrorKind::AddrNotAvailable
            ),
            ExchangeError::Timeout(_) => false,
        }
    }
}

/// Sends one query and waits for the datagram carrying the same transaction id.
///
/// Datagrams with a different id or without the QR bit are dropped; the timeout covers
/// the whole exchange.
pub async fn exchange(
    server: SocketAddr,
    payload: &[u8],
    expected_id: u16,
    timeout: Duration,
) -> Result<Vec<u8>, ExchangeError> {
    let io_err = |source| ExchangeError::Io { addr: server, source };

    let bind_addr: SocketAddr = match server {
        SocketAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
        SocketAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
    };
    let socket = UdpSocket::bind(bind_addr).await.map_err(io_err)?;
    socket.connect(server).await.map_err(io_err)?;
    socket.send(payload).await.map_err(io_err)?;

    match tokio::time::timeout(timeout, recv_matching(&socket, server, expected_id)).await {
        Ok(result) => result.map_err(io_err),
        Err(_) => Err(ExchangeError::Timeout(server)),
    }
}

async fn recv_matching(socket: &UdpSocket, server: SocketAddr, expected_id: u16) -> io::Result<Vec<u8>> {
    let mut buf = vec![0u8; RECV_BUF_LEN];
    loop {
        let len = socket.recv(&mut buf).await?;
        let datagram = &buf[..len];
        match dns::peek_id(datagram) {
            Some(id) if id == expected_id && dns::is_response(datagram) => {
                buf.truncate(len);
                return Ok(buf);
            }
            Some(id) if id == expected_id => debug!("dropping echoed query from {server}"),
            other => debug!("dropping stray datagram from {server} (id {other:?})"),
        }
    }
}
