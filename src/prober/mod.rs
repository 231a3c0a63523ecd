use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

use crate::config::RunConfig;
use crate::timestamp::{RoundTrip, WallClock};

pub mod reply;
pub mod tcp_connect;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProbeResult {
    Connected,
    ConnectFailed,
}

/// What one probe produced. Built fresh per tick and not retained.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeOutcome {
    pub seq: u64,
    pub start: WallClock,
    /// Taken after the socket is released; absent when the connect failed.
    pub end: Option<WallClock>,
    pub result: ProbeResult,
    /// The close after a successful connect reported no error.
    pub closed_cleanly: bool,
    /// Printable excerpt of what the server sent, verbose mode only.
    pub reply: Option<String>,
}

impl ProbeOutcome {
    pub fn failed(seq: u64, start: WallClock) -> Self {
        Self {
            seq,
            start,
            end: None,
            result: ProbeResult::ConnectFailed,
            closed_cleanly: false,
            reply: None,
        }
    }

    pub fn round_trip(&self) -> Option<RoundTrip> {
        self.end.map(|end| RoundTrip::between(&self.start, &end))
    }

    pub fn elapsed_ms(&self) -> Option<f64> {
        self.end
            .map(|end| end.since(&self.start).as_secs_f64() * 1000.0)
    }

    pub fn is_success(&self) -> bool {
        self.result == ProbeResult::Connected && self.closed_cleanly
    }
}

/// Connect-based prober for one target, optionally bound to a source address.
#[derive(Debug, Clone)]
pub struct Prober {
    target: SocketAddr,
    source: Option<SocketAddr>,
    verbose: bool,
}

impl Prober {
    pub fn new(target: SocketAddr, source: Option<SocketAddr>, verbose: bool) -> Self {
        Self {
            target,
            source,
            verbose,
        }
    }

    pub fn from_config(config: &RunConfig) -> Self {
        Self::new(config.target.addr, config.source, config.verbose)
    }

    /// One probe. `Err` is reserved for fatal local failures (socket
    /// creation, source bind); an unreachable target is an `Ok` outcome.
    pub async fn probe(&self, seq: u64) -> anyhow::Result<ProbeOutcome> {
        tcp_connect::probe_tcp(self.target, self.source, self.verbose, seq).await
    }
}
