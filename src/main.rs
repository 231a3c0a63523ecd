use std::io::IsTerminal;
use std::process::ExitCode;

use clap::Parser;
use tcping::config::{Cli, PROBE_INTERVAL_MS, ProbeOptions, RunConfig};
use tcping::interrupt::{RunState, stop_requested};
use tcping::metrics;
use tcping::prober::Prober;
use tcping::report::Reporter;
use tcping::scheduler::Scheduler;
use tcping::stats::Stats;
use tracing::{debug, info};

// One thread drives the timer, the stop request and the probes.
#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            // --help and --version print to stdout and are not errors
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };
    let quiet = cli.quiet;

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            debug!("run aborted: {:#}", e);
            if !quiet {
                eprintln!("{:#}", e);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let options = ProbeOptions::from_cli(cli)?;

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(options.log_directive().parse()?),
        )
        .init();

    if let Some(addr) = options.metrics_addr {
        tokio::spawn(metrics::serve_metrics(addr));
    }

    let config = RunConfig::resolve(&options).await?;
    info!(target_addr = %config.target.addr, policy = ?config.loop_policy, "starting");

    let reporter = Reporter::from_config(&config);
    reporter.header(&config);

    let prober = Prober::from_config(&config);
    let mut stats = Stats::new(config.target.host.clone());
    let scheduler = Scheduler::new(PROBE_INTERVAL_MS)?;

    let mut state = RunState::Running;
    let termination = scheduler
        .run(
            config.loop_policy,
            &mut stats,
            &reporter,
            |seq| prober.probe(seq),
            stop_requested(),
        )
        .await?;

    state = state.finalize(termination);
    let summary = stats.finalize();
    reporter.summary(&summary);
    state = state.terminate();
    info!(?state, ?termination, "run finished");

    Ok(summary.exit_code())
}
