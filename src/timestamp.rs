use std::fmt;
use std::time::{Duration, SystemTime};

use libc::{CLOCK_REALTIME, clock_gettime, timespec};
use serde::Serialize;

/// Wall-clock instant with microsecond resolution, split the way
/// `gettimeofday` reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct WallClock {
    pub secs: i64,
    pub micros: i64,
}

impl WallClock {
    pub fn now() -> Self {
        let mut ts: timespec = unsafe { std::mem::zeroed() };
        if unsafe { clock_gettime(CLOCK_REALTIME, &mut ts) } == 0 {
            Self {
                secs: ts.tv_sec as i64,
                micros: ts.tv_nsec as i64 / 1_000,
            }
        } else {
            // fallback
            let now = SystemTime::now()
                .duration_since(SystemTime::UNIX_EPOCH)
                .unwrap_or_else(|_| Duration::from_secs(0));
            Self {
                secs: now.as_secs() as i64,
                micros: now.subsec_micros() as i64,
            }
        }
    }

    pub fn from_parts(secs: i64, micros: i64) -> Self {
        Self { secs, micros }
    }

    /// Elapsed time since `earlier`, zero if the clock went backwards.
    pub fn since(&self, earlier: &WallClock) -> Duration {
        let total = (self.secs - earlier.secs) * 1_000_000 + (self.micros - earlier.micros);
        Duration::from_micros(total.max(0) as u64)
    }
}

/// Round-trip time as it is displayed: milliseconds when both stamps fall
/// in the same whole second, whole seconds otherwise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RoundTrip {
    Millis(f64),
    Seconds(i64),
}

impl RoundTrip {
    pub fn between(start: &WallClock, end: &WallClock) -> Self {
        if start.secs == end.secs {
            RoundTrip::Millis((end.micros - start.micros) as f64 / 1000.0)
        } else {
            RoundTrip::Seconds(end.secs - start.secs)
        }
    }
}

impl fmt::Display for RoundTrip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoundTrip::Millis(ms) => write!(f, "{:6.4} (ms)", ms),
            RoundTrip::Seconds(s) => write!(f, "{} (s)", s),
        }
    }
}
