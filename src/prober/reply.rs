use std::io;

use tokio::net::TcpStream;
use tokio::time::{Duration, timeout};
use tracing::debug;

pub const REPLY_BUFFER_SIZE: usize = 4096;
pub const READINESS_TIMEOUT: Duration = Duration::from_secs(1);
/// Replies are shown on a single line, anything past this is dropped.
pub const EXCERPT_MAX: usize = 70;

/// Wait up to one second for the server to say something, then take
/// whatever a single read returns. `None` when nothing arrived in time.
pub async fn read_reply(stream: &TcpStream) -> Option<Vec<u8>> {
    let mut buf = vec![0u8; REPLY_BUFFER_SIZE];

    let read = async {
        loop {
            if let Err(e) = stream.readable().await {
                return Err(e);
            }
            match stream.try_read(&mut buf) {
                Ok(n) => return Ok(n),
                // spurious wakeup or EINTR, wait again within the same window
                Err(e)
                    if e.kind() == io::ErrorKind::WouldBlock
                        || e.kind() == io::ErrorKind::Interrupted =>
                {
                    continue;
                }
                Err(e) => return Err(e),
            }
        }
    };
    let res: Result<io::Result<usize>, _> = timeout(READINESS_TIMEOUT, read).await;

    match res {
        Ok(Ok(0)) => None,
        Ok(Ok(n)) => {
            buf.truncate(n);
            Some(buf)
        }
        Ok(Err(e)) => {
            debug!(error = %e, "reading reply failed");
            None
        }
        Err(_) => {
            debug!("no reply within {:?}", READINESS_TIMEOUT);
            None
        }
    }
}

/// Leading printable run of `bytes`, capped at [`EXCERPT_MAX`] characters.
/// The payload is not interpreted in any other way.
pub fn excerpt(bytes: &[u8]) -> String {
    bytes
        .iter()
        .take(EXCERPT_MAX)
        .take_while(|b| is_printable(**b))
        .map(|&b| b as char)
        .collect()
}

fn is_printable(b: u8) -> bool {
    b == b' ' || b.is_ascii_graphic()
}
