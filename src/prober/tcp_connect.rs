use std::io;
use std::net::SocketAddr;
use std::os::fd::IntoRawFd;

use anyhow::{Context, Result};
use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::{TcpSocket, TcpStream};
use tracing::debug;

use super::reply::{excerpt, read_reply};
use super::{ProbeOutcome, ProbeResult};
use crate::timestamp::WallClock;

pub async fn probe_tcp(
    target: SocketAddr,
    source: Option<SocketAddr>,
    verbose: bool,
    seq: u64,
) -> Result<ProbeOutcome> {
    let socket = open_socket(source)?;

    let start = WallClock::now();
    let stream = match socket.connect(target).await {
        Ok(stream) => stream,
        Err(e) => {
            // socket was consumed by connect and is already closed
            debug!(seq, %target, error = %e, "connect failed");
            return Ok(ProbeOutcome::failed(seq, start));
        }
    };

    let reply = if verbose {
        read_reply(&stream).await.map(|bytes| excerpt(&bytes))
    } else {
        None
    };

    let closed_cleanly = match close_stream(stream) {
        Ok(()) => true,
        Err(e) => {
            debug!(seq, %target, error = %e, "close reported an error");
            false
        }
    };
    let end = WallClock::now();

    Ok(ProbeOutcome {
        seq,
        start,
        end: Some(end),
        result: ProbeResult::Connected,
        closed_cleanly,
        reply,
    })
}

/// Fresh IPv4 stream socket with SO_REUSEADDR, bound to `source` if given.
fn open_socket(source: Option<SocketAddr>) -> Result<TcpSocket> {
    let socket = Socket::new(Domain::IPV4, Type::STREAM, Some(Protocol::TCP))
        .context("can not assign socket")?;
    socket
        .set_reuse_address(true)
        .context("can not set sockopt")?;
    if let Some(src) = source {
        socket
            .bind(&src.into())
            .with_context(|| format!("can not bind source {}", src))?;
    }
    socket
        .set_nonblocking(true)
        .context("can not set sockopt")?;

    let std_stream: std::net::TcpStream = socket.into();
    Ok(TcpSocket::from_std_stream(std_stream))
}

/// Close through close(2) so an error on close is visible to the caller.
fn close_stream(stream: TcpStream) -> io::Result<()> {
    let fd = stream.into_std()?.into_raw_fd();
    if unsafe { libc::close(fd) } == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}
