//! Connect-based TCP ping: time the three-way handshake to a host:port,
//! once per second, and report how many attempts succeeded.
pub mod config;
pub mod interrupt;
pub mod metrics;
pub mod prober;
pub mod report;
pub mod scheduler;
pub mod stats;
pub mod timestamp;
pub mod util;
