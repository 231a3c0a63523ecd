// Helpers for turning the user's host/port into something connectable.

use std::net::{IpAddr, Ipv4Addr};

use anyhow::{Result, anyhow, bail};
use once_cell::sync::OnceCell;
use trust_dns_resolver::TokioAsyncResolver;

static RESOLVER: OnceCell<TokioAsyncResolver> = OnceCell::new();

fn resolver() -> Result<&'static TokioAsyncResolver> {
    RESOLVER.get_or_try_init(|| {
        TokioAsyncResolver::tokio_from_system_conf()
            .map_err(|e| anyhow!("can not load resolver configuration: {}", e))
    })
}

/// Split the two positional arguments into (host, port). The argument made
/// only of digits is the port, whichever order they come in.
pub fn parse_target(a: &str, b: &str) -> Result<(String, u16)> {
    let is_port = |s: &str| s.bytes().all(|c| c.is_ascii_digit());
    let (host, port) = match (is_port(a), is_port(b)) {
        (false, true) => (a, b),
        (true, false) => (b, a),
        _ => bail!("invalid host and port"),
    };
    let port = port
        .parse::<u16>()
        .map_err(|_| anyhow!("invalid host and port"))?;
    Ok((host.to_string(), port))
}

pub async fn resolve_ipv4(host: &str) -> Result<Ipv4Addr> {
    // Literal addresses skip DNS entirely
    if let Ok(ip) = host.parse::<Ipv4Addr>() {
        return Ok(ip);
    }

    let lookup = resolver()?.lookup_ip(host).await?;
    lookup
        .iter()
        .find_map(|ip| match ip {
            IpAddr::V4(v4) => Some(v4),
            IpAddr::V6(_) => None,
        })
        .ok_or_else(|| anyhow!("Could not resolve hostname to IPv4: {}", host))
}
