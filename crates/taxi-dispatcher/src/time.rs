use std::time::{SystemTime, UNIX_EPOCH};

/// Seconds since the Unix epoch, used as the monotonic-enough timestamp for
/// cooldown and assignment bookkeeping. Wall-clock time is monotonic enough for a
/// single run of this system; no leap adjustments are expected mid-simulation.
pub fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before epoch")
        .as_secs() as i64
}
