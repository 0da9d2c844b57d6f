//! Monotonic timestamps for recorded events.

use std::sync::OnceLock;
use std::time::Instant;

static ANCHOR: OnceLock<Instant> = OnceLock::new();

/// Nanoseconds elapsed on the monotonic clock since the first call in this
/// process.
///
/// The zero point is arbitrary; only ordering and distances between
/// timestamps are meaningful. Wall-clock alignment is an exporter concern.
pub fn now_ns() -> u64 {
    ANCHOR.get_or_init(Instant::now).elapsed().as_nanos() as u64
}
