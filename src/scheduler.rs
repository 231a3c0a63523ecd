use std::future::Future;
use std::time::Duration;

use anyhow::{Result, bail};
use tokio::time::{MissedTickBehavior, interval};
use tracing::debug;

use crate::config::LoopPolicy;
use crate::interrupt::Termination;
use crate::prober::ProbeOutcome;
use crate::report::Reporter;
use crate::stats::Stats;

/// Remaining-iterations counter. Count mode decrements by one per probe,
/// endless mode never decrements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopState {
    remaining: u32,
    decrement: u32,
}

impl LoopState {
    pub fn new(policy: LoopPolicy) -> Self {
        match policy {
            LoopPolicy::Count(n) => Self {
                remaining: n,
                decrement: 1,
            },
            LoopPolicy::Endless => Self {
                remaining: 1,
                decrement: 0,
            },
        }
    }

    pub fn advance(&mut self) {
        self.remaining = self.remaining.saturating_sub(self.decrement);
    }

    pub fn exhausted(&self) -> bool {
        self.remaining == 0
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }
}

enum Event {
    Tick,
    Stop,
}

pub struct Scheduler {
    interval: Duration,
}

impl Scheduler {
    pub fn new(interval_ms: u64) -> Result<Self> {
        if interval_ms == 0 {
            bail!("probe interval must be positive");
        }
        Ok(Self {
            interval: Duration::from_millis(interval_ms),
        })
    }

    /// Drive probes until the loop policy is exhausted or `stop` resolves.
    ///
    /// Timer ticks and the stop request are handled one at a time by this
    /// single task, so totals are never touched by both. The first probe
    /// goes out immediately; later ones follow the timer, not the end of
    /// the previous probe. A probe still in flight when `stop` resolves is
    /// dropped: it stays counted as attempted and never as succeeded.
    /// An `Err` from `probe` is fatal and ends the run without a summary.
    pub async fn run<P, F, S>(
        &self,
        policy: LoopPolicy,
        stats: &mut Stats,
        reporter: &Reporter,
        mut probe: P,
        stop: S,
    ) -> Result<Termination>
    where
        P: FnMut(u64) -> F,
        F: Future<Output = Result<ProbeOutcome>>,
        S: Future<Output = ()>,
    {
        let mut loop_state = LoopState::new(policy);
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(stop);

        loop {
            let event = tokio::select! {
                biased;
                _ = &mut stop => Event::Stop,
                _ = ticker.tick() => Event::Tick,
            };

            match event {
                Event::Stop => return Ok(Termination::Interrupted),
                Event::Tick => {
                    loop_state.advance();
                    let seq = stats.begin_probe();
                    debug!(seq, remaining = loop_state.remaining(), "probe dispatched");

                    let outcome = tokio::select! {
                        biased;
                        _ = &mut stop => return Ok(Termination::Interrupted),
                        outcome = probe(seq) => outcome?,
                    };
                    stats.record(&outcome);
                    reporter.probe(&outcome);

                    if loop_state.exhausted() {
                        return Ok(Termination::Completed);
                    }
                }
            }
        }
    }
}
