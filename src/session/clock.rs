//! Elapsed-time arithmetic over pause/resume timestamps.
//!
//! Pure functions over the published session state. Timer consumers poll at
//! a bounded cadence and recompute from absolute timestamps every time;
//! accumulating deltas across callbacks drifts.

use super::state::ActiveRecording;

/// Current wall clock in milliseconds since the Unix epoch.
pub fn now_ms() -> u64 {
    chrono::Utc::now().timestamp_millis().max(0) as u64
}

/// Active (non-paused) milliseconds elapsed for `recording` as of `now_ms`.
///
/// Time spent paused is never counted: while paused the value is frozen at
/// whatever it was when the pause began.
pub fn elapsed_ms(recording: &ActiveRecording, now_ms: u64) -> u64 {
    let base = now_ms
        .saturating_sub(recording.start_time_ms)
        .saturating_sub(recording.total_paused_duration_ms);

    match (recording.is_paused, recording.pause_start_time_ms) {
        (true, Some(pause_start)) => base.saturating_sub(now_ms.saturating_sub(pause_start)),
        _ => base,
    }
}
