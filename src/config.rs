use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

use anyhow::{Result, bail};
use clap::Parser;
use serde::Serialize;
use tracing::level_filters::LevelFilter;

use crate::util::{parse_target, resolve_ipv4};

pub const MAX_COUNT: u32 = 30_000;
pub const PROBE_INTERVAL_MS: u64 = 1_000;

/// Measure TCP handshake latency by opening and closing connections.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "tcping",
    version,
    about = "Open a TCP session by 3-way handshake and send nothing more than that.",
    long_about = None
)]
pub struct Cli {
    /// Quiet mode, don't print progress and statistics.
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Verbose mode, print the reply if it is printable.
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Debug logging.
    #[arg(short = 'd', long)]
    pub debug: bool,

    /// Source host to bind before connecting.
    #[arg(short = 'i', long = "source", value_name = "SOURCE")]
    pub source: Option<String>,

    /// Ping N times (1-30000).
    #[arg(short = 'c', long, value_name = "COUNT")]
    pub count: Option<u32>,

    /// Endless loop mode.
    #[arg(short = 's', long)]
    pub endless: bool,

    /// Emit probe results and statistics as JSON lines.
    #[arg(long)]
    pub json: bool,

    /// Serve Prometheus metrics on this address while running.
    #[arg(long = "metrics-addr", value_name = "ADDR")]
    pub metrics_addr: Option<SocketAddr>,

    /// Log level: off, trace, debug, info, warn, error (default from TCPING_LOG_LEVEL, else warn).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Target host and port, in either order.
    #[arg(value_name = "TARGET PORT", num_args = 2, required = true)]
    pub endpoints: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "mode", content = "count")]
pub enum LoopPolicy {
    Count(u32),
    Endless,
}

impl Default for LoopPolicy {
    fn default() -> Self {
        LoopPolicy::Count(1)
    }
}

/// Validated command line, nothing resolved yet.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeOptions {
    pub host: String,
    pub port: u16,
    pub source: Option<String>,
    pub verbose: bool,
    pub quiet: bool,
    pub json: bool,
    pub loop_policy: LoopPolicy,
    pub log_level: LevelFilter,
    pub metrics_addr: Option<SocketAddr>,
}

impl ProbeOptions {
    pub fn from_cli(cli: Cli) -> Result<Self> {
        let loop_policy = match (cli.count, cli.endless) {
            (Some(_), true) => bail!("can not give both of the option, -c and -s"),
            (Some(n), false) if n == 0 || n > MAX_COUNT => bail!("invalid count"),
            (Some(n), false) => LoopPolicy::Count(n),
            (None, true) => LoopPolicy::Endless,
            (None, false) => LoopPolicy::default(),
        };

        let [first, second] = cli.endpoints.as_slice() else {
            bail!("not specified host and port");
        };
        let (host, port) = parse_target(first, second)?;

        let configured = cli
            .log_level
            .or_else(|| std::env::var("TCPING_LOG_LEVEL").ok())
            .unwrap_or_else(default_log_level);
        let log_level = if cli.debug {
            LevelFilter::DEBUG
        } else if cli.quiet {
            LevelFilter::OFF
        } else {
            parse_log_level(&configured)?
        };

        Ok(Self {
            host,
            port,
            source: cli.source,
            verbose: cli.verbose,
            quiet: cli.quiet,
            json: cli.json,
            loop_policy,
            log_level,
            metrics_addr: cli.metrics_addr,
        })
    }

    /// Directive handed to the `EnvFilter`.
    pub fn log_directive(&self) -> String {
        format!("tcping={}", self.log_level.to_string().to_lowercase())
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

pub fn parse_log_level(level: &str) -> Result<LevelFilter> {
    match level.to_lowercase().as_str() {
        "off" => Ok(LevelFilter::OFF),
        "trace" => Ok(LevelFilter::TRACE),
        "debug" => Ok(LevelFilter::DEBUG),
        "info" => Ok(LevelFilter::INFO),
        "warn" | "warning" => Ok(LevelFilter::WARN),
        "error" => Ok(LevelFilter::ERROR),
        _ => bail!(
            "Invalid log level: {}. Valid levels are: off, trace, debug, info, warn, error",
            level
        ),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub host: String,
    pub port: u16,
    pub addr: SocketAddr,
}

/// Immutable configuration of one run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub target: Target,
    pub source: Option<SocketAddr>,
    pub verbose: bool,
    pub quiet: bool,
    pub json: bool,
    pub loop_policy: LoopPolicy,
}

impl RunConfig {
    pub async fn resolve(options: &ProbeOptions) -> Result<Self> {
        let ip = resolve_ipv4(&options.host)
            .await
            .map_err(|e| e.context("invalid target host"))?;
        let source = match &options.source {
            Some(host) => {
                let ip = resolve_ipv4(host)
                    .await
                    .map_err(|e| e.context("invalid source host"))?;
                Some(SocketAddr::V4(SocketAddrV4::new(ip, 0)))
            }
            None => None,
        };

        Ok(Self {
            target: Target {
                host: options.host.clone(),
                port: options.port,
                addr: SocketAddr::V4(SocketAddrV4::new(ip, options.port)),
            },
            source,
            verbose: options.verbose,
            quiet: options.quiet,
            json: options.json,
            loop_policy: options.loop_policy,
        })
    }

    /// Configuration for an already-resolved target, mostly for embedding.
    pub fn for_addr(addr: SocketAddrV4, loop_policy: LoopPolicy) -> Self {
        Self {
            target: Target {
                host: addr.ip().to_string(),
                port: addr.port(),
                addr: SocketAddr::V4(addr),
            },
            source: None,
            verbose: false,
            quiet: true,
            json: false,
            loop_policy,
        }
    }

    pub fn target_ip(&self) -> Ipv4Addr {
        match self.target.addr {
            SocketAddr::V4(v4) => *v4.ip(),
            SocketAddr::V6(_) => Ipv4Addr::UNSPECIFIED,
        }
    }
}
