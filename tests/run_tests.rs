use std::net::{SocketAddr, SocketAddrV4};

use tcping::config::{LoopPolicy, PROBE_INTERVAL_MS, RunConfig};
use tcping::interrupt::{RunState, Termination};
use tcping::prober::Prober;
use tcping::report::Reporter;
use tcping::scheduler::Scheduler;
use tcping::stats::{Stats, Summary};
use tokio::net::TcpListener;

fn v4(addr: SocketAddr) -> SocketAddrV4 {
    match addr {
        SocketAddr::V4(v4) => v4,
        SocketAddr::V6(_) => unreachable!("bound to 127.0.0.1"),
    }
}

async fn run_against(addr: SocketAddrV4, count: u32) -> (Termination, Summary) {
    let config = RunConfig::for_addr(addr, LoopPolicy::Count(count));
    let reporter = Reporter::from_config(&config);
    let prober = Prober::from_config(&config);
    let mut stats = Stats::new(config.target.host.clone());
    let scheduler = Scheduler::new(PROBE_INTERVAL_MS).unwrap();

    let state = RunState::Running;
    let termination = scheduler
        .run(
            config.loop_policy,
            &mut stats,
            &reporter,
            |seq| prober.probe(seq),
            std::future::pending(),
        )
        .await
        .unwrap();
    let state = state.finalize(termination);
    let summary = stats.finalize();
    assert_eq!(state.terminate(), RunState::Terminated);
    (termination, summary)
}

#[tokio::test]
async fn accepting_target_succeeds_every_time() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = v4(listener.local_addr().unwrap());
    tokio::spawn(async move {
        loop {
            let Ok((sock, _)) = listener.accept().await else { break };
            drop(sock);
        }
    });

    let (termination, summary) = run_against(addr, 2).await;

    assert_eq!(termination, Termination::Completed);
    assert_eq!(summary.transmitted, 2);
    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.success_pct, 100.0);
    assert!(summary.is_success());
}

#[tokio::test]
async fn unreachable_target_fails_every_time() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = v4(listener.local_addr().unwrap());
    drop(listener);

    let (termination, summary) = run_against(addr, 2).await;

    assert_eq!(termination, Termination::Completed);
    assert_eq!(summary.transmitted, 2);
    assert_eq!(summary.succeeded, 0);
    assert_eq!(format!("{:.1}", summary.success_pct), "0.0");
    assert!(!summary.is_success());
}
