use tracing::{debug, warn};

/// Why the probe loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The configured count ran out.
    Completed,
    /// A stop request arrived, possibly while a probe was in flight.
    Interrupted,
}

/// Lifecycle of a run: probing, then producing the summary, then done.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Running,
    Finalizing,
    Terminated,
}

impl RunState {
    /// Running -> Finalizing. Any other state stays put.
    pub fn finalize(self, why: Termination) -> Self {
        match self {
            RunState::Running => {
                debug!(?why, "finalizing run");
                RunState::Finalizing
            }
            other => other,
        }
    }

    /// Finalizing -> Terminated, once the summary has been rendered.
    pub fn terminate(self) -> Self {
        match self {
            RunState::Finalizing => RunState::Terminated,
            other => {
                warn!(state = ?other, "terminate requested outside of finalization");
                other
            }
        }
    }
}

/// Resolves when the user asks the run to stop (Ctrl-C).
pub async fn stop_requested() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => debug!("stop requested"),
        Err(e) => {
            // no handler could be installed, so the run can only end by count
            warn!("can not set signal handler interrupt: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
