use std::process::ExitCode;

use serde::Serialize;

use crate::metrics;
use crate::prober::{ProbeOutcome, ProbeResult};

/// Running attempt/success counters. `succeeded <= attempted` at all times.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunTotals {
    pub attempted: u64,
    pub succeeded: u64,
}

impl RunTotals {
    /// Percentage of successful probes, 0 when nothing was attempted.
    pub fn success_rate(&self) -> f64 {
        if self.attempted == 0 {
            return 0.0;
        }
        100.0 * self.succeeded as f64 / self.attempted as f64
    }
}

/// Statistics aggregator for one run. Totals change only through
/// [`Stats::begin_probe`] and [`Stats::record`].
#[derive(Debug)]
pub struct Stats {
    target: String,
    totals: RunTotals,
}

impl Stats {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            totals: RunTotals::default(),
        }
    }

    /// Count an attempt before its connect is issued; returns its sequence number.
    pub fn begin_probe(&mut self) -> u64 {
        self.totals.attempted += 1;
        metrics::inc_attempted();
        self.totals.attempted
    }

    pub fn record(&mut self, outcome: &ProbeOutcome) {
        match outcome.result {
            ProbeResult::Connected => {
                if let Some(ms) = outcome.elapsed_ms() {
                    metrics::observe_round_trip(ms);
                }
            }
            ProbeResult::ConnectFailed => metrics::inc_connect_failure(),
        }
        if outcome.is_success() {
            self.totals.succeeded += 1;
            metrics::inc_succeeded();
        }
        debug_assert!(self.totals.succeeded <= self.totals.attempted);
    }

    pub fn totals(&self) -> RunTotals {
        self.totals
    }

    /// Consumes the aggregator so the summary is produced once.
    pub fn finalize(self) -> Summary {
        Summary {
            target: self.target,
            transmitted: self.totals.attempted,
            succeeded: self.totals.succeeded,
            success_pct: self.totals.success_rate(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub target: String,
    pub transmitted: u64,
    pub succeeded: u64,
    pub success_pct: f64,
}

impl Summary {
    /// Any success at all makes the run a success.
    pub fn is_success(&self) -> bool {
        self.succeeded > 0
    }

    pub fn exit_code(&self) -> ExitCode {
        if self.is_success() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timestamp::WallClock;

    fn connected(seq: u64, closed_cleanly: bool) -> ProbeOutcome {
        ProbeOutcome {
            seq,
            start: WallClock::from_parts(10, 0),
            end: Some(WallClock::from_parts(10, 1_200)),
            result: ProbeResult::Connected,
            closed_cleanly,
            reply: None,
        }
    }

    #[test]
    fn counts_attempts_and_clean_closes() {
        let mut stats = Stats::new("host");
        let seq = stats.begin_probe();
        stats.record(&connected(seq, true));
        let seq = stats.begin_probe();
        stats.record(&ProbeOutcome::failed(seq, WallClock::from_parts(11, 0)));
        let seq = stats.begin_probe();
        stats.record(&connected(seq, false));

        assert_eq!(seq, 3);
        assert_eq!(stats.totals(), RunTotals { attempted: 3, succeeded: 1 });
    }

    #[test]
    fn all_failures_render_zero_percent() {
        let mut stats = Stats::new("host");
        for _ in 0..4 {
            let seq = stats.begin_probe();
            stats.record(&ProbeOutcome::failed(seq, WallClock::from_parts(1, 0)));
        }
        let summary = stats.finalize();
        assert_eq!(summary.transmitted, 4);
        assert_eq!(summary.success_pct, 0.0);
        assert!(!summary.is_success());
    }

    #[test]
    fn nothing_attempted_is_not_a_division_by_zero() {
        let summary = Stats::new("host").finalize();
        assert_eq!(summary.success_pct, 0.0);
        assert!(!summary.is_success());
    }

    #[test]
    fn partial_success_keeps_full_precision() {
        let totals = RunTotals { attempted: 3, succeeded: 2 };
        assert!((totals.success_rate() - 66.666_666).abs() < 1e-3);
        let summary = Summary {
            target: "h".into(),
            transmitted: 3,
            succeeded: 2,
            success_pct: totals.success_rate(),
        };
        assert!(summary.is_success());
    }
}
