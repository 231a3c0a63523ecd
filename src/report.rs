use std::io::Write;

use serde::Serialize;

use crate::config::RunConfig;
use crate::prober::{ProbeOutcome, ProbeResult};
use crate::stats::Summary;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Quiet,
    Human,
    Json,
}

#[derive(Serialize)]
struct ProbeRecord<'a> {
    seq: u64,
    result: ProbeResult,
    round_trip_ms: Option<f64>,
    reply: Option<&'a str>,
}

/// Renders progress lines and the final statistics to stdout.
#[derive(Debug, Clone, Copy)]
pub struct Reporter {
    mode: OutputMode,
}

impl Reporter {
    pub fn new(mode: OutputMode) -> Self {
        Self { mode }
    }

    pub fn from_config(config: &RunConfig) -> Self {
        let mode = if config.quiet {
            OutputMode::Quiet
        } else if config.json {
            OutputMode::Json
        } else {
            OutputMode::Human
        };
        Self::new(mode)
    }

    pub fn header(&self, config: &RunConfig) {
        if self.mode == OutputMode::Human {
            self.emit(&[format!(
                "tcp pinging to {}:{} ({})",
                config.target.host,
                config.target.port,
                config.target_ip()
            )]);
        }
    }

    pub fn probe(&self, outcome: &ProbeOutcome) {
        self.emit(&self.probe_lines(outcome));
    }

    pub fn summary(&self, summary: &Summary) {
        self.emit(&self.summary_lines(summary));
    }

    pub fn probe_lines(&self, outcome: &ProbeOutcome) -> Vec<String> {
        match self.mode {
            OutputMode::Quiet => Vec::new(),
            OutputMode::Json => {
                let record = ProbeRecord {
                    seq: outcome.seq,
                    result: outcome.result,
                    round_trip_ms: outcome.elapsed_ms(),
                    reply: outcome.reply.as_deref(),
                };
                serde_json::to_string(&record).map(|s| vec![s]).unwrap_or_default()
            }
            OutputMode::Human => {
                let mut lines = Vec::with_capacity(2);
                match outcome.round_trip() {
                    Some(rt) => lines.push(format!(" seq {}, RRT: {}", outcome.seq, rt)),
                    None => lines.push("can not connect target".to_string()),
                }
                if let Some(reply) = &outcome.reply {
                    lines.push(format!("  --> {}", reply));
                }
                lines
            }
        }
    }

    pub fn summary_lines(&self, summary: &Summary) -> Vec<String> {
        match self.mode {
            OutputMode::Quiet => Vec::new(),
            OutputMode::Json => serde_json::to_string(summary)
                .map(|s| vec![s])
                .unwrap_or_default(),
            OutputMode::Human => vec![
                String::new(),
                format!("--- {} tcp ping statistics ---", summary.target),
                format!(
                    "{} packet(s) transmitted, {:.1}% tcp ping successful",
                    summary.transmitted, summary.success_pct
                ),
            ],
        }
    }

    fn emit(&self, lines: &[String]) {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        for line in lines {
            // stdout going away (closed pipe) must not abort the run
            if writeln!(out, "{}", line).is_err() {
                return;
            }
        }
        let _ = out.flush();
    }
}
