use prometheus::{Encoder, Gauge, IntCounter, Registry, TEXT_FORMAT, TextEncoder};
use warp::Filter;
use std::net::SocketAddr;
use once_cell::sync::Lazy;

static REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

static ATTEMPTED: Lazy<IntCounter> = Lazy::new(|| {
    let ctr = IntCounter::new("tcping_probes_attempted_total", "Probes issued")
        .expect("valid metric");
    REGISTRY.register(Box::new(ctr.clone())).expect("metric registered once");
    ctr
});

static SUCCEEDED: Lazy<IntCounter> = Lazy::new(|| {
    let ctr = IntCounter::new(
        "tcping_probes_succeeded_total",
        "Probes that connected and closed cleanly",
    )
    .expect("valid metric");
    REGISTRY.register(Box::new(ctr.clone())).expect("metric registered once");
    ctr
});

static CONNECT_FAILURES: Lazy<IntCounter> = Lazy::new(|| {
    let ctr = IntCounter::new("tcping_connect_failures_total", "Probes that could not connect")
        .expect("valid metric");
    REGISTRY.register(Box::new(ctr.clone())).expect("metric registered once");
    ctr
});

static ROUND_TRIP_GAUGE: Lazy<Gauge> = Lazy::new(|| {
    let gauge = Gauge::new(
        "tcping_round_trip_milliseconds_current",
        "Round trip of the most recent successful probe in milliseconds",
    )
    .expect("valid metric");
    REGISTRY.register(Box::new(gauge.clone())).expect("metric registered once");
    gauge
});

pub fn inc_attempted() {
    ATTEMPTED.inc();
}

pub fn inc_succeeded() {
    SUCCEEDED.inc();
}

pub fn inc_connect_failure() {
    CONNECT_FAILURES.inc();
}

pub fn observe_round_trip(latency_ms: f64) {
    ROUND_TRIP_GAUGE.set(latency_ms);
}

/// Text exposition of everything registered so far.
pub fn render() -> Vec<u8> {
    // force registration so an idle run still exposes zeroed series
    Lazy::force(&ATTEMPTED);
    Lazy::force(&SUCCEEDED);
    Lazy::force(&CONNECT_FAILURES);
    Lazy::force(&ROUND_TRIP_GAUGE);

    let encoder = TextEncoder::new();
    let mf = REGISTRY.gather();
    let mut buf = Vec::new();
    if let Err(e) = encoder.encode(&mf, &mut buf) {
        tracing::warn!("encoding metrics failed: {}", e);
    }
    buf
}

pub async fn serve_metrics(addr: SocketAddr) {
    let metrics_route = warp::path!("metrics")
        .map(|| warp::reply::with_header(render(), "Content-Type", TEXT_FORMAT));

    tracing::info!("serving metrics on http://{}/metrics", addr);
    warp::serve(metrics_route).run(addr).await;
}
