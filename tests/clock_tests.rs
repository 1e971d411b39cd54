// Unit tests for elapsed-time accounting across pause/resume cycles.
//
// These are pure functions over fabricated timestamps, so every property
// holds exactly, with no sleeping or clock access.

use std::path::PathBuf;
use voxnote::session::clock::elapsed_ms;
use voxnote::ActiveRecording;

fn recording_started_at(start_time_ms: u64) -> ActiveRecording {
    ActiveRecording::new(
        "rec-1".to_string(),
        PathBuf::from("/tmp/rec-1.wav"),
        start_time_ms,
    )
}

#[test]
fn test_elapsed_while_running() {
    let rec = recording_started_at(10_000);
    assert_eq!(elapsed_ms(&rec, 10_000), 0);
    assert_eq!(elapsed_ms(&rec, 12_500), 2_500);
}

#[test]
fn test_elapsed_is_frozen_for_the_whole_pause() {
    let mut rec = recording_started_at(10_000);
    rec.is_paused = true;
    rec.pause_start_time_ms = Some(13_000);

    let at_pause = elapsed_ms(&rec, 13_000);
    assert_eq!(at_pause, 3_000);

    // However long the pause lasts, elapsed does not move.
    assert_eq!(elapsed_ms(&rec, 13_001), at_pause);
    assert_eq!(elapsed_ms(&rec, 20_000), at_pause);
    assert_eq!(elapsed_ms(&rec, 1_000_000), at_pause);
}

#[test]
fn test_elapsed_excludes_accumulated_pauses_after_resume() {
    let mut rec = recording_started_at(10_000);
    // Two earlier pauses totalling 4 seconds.
    rec.total_paused_duration_ms = 4_000;

    // 15 wall seconds in, only 11 were active.
    assert_eq!(elapsed_ms(&rec, 25_000), 11_000);
}

#[test]
fn test_elapsed_monotonic_while_not_paused() {
    let mut rec = recording_started_at(0);
    rec.total_paused_duration_ms = 1_000;

    let mut last = 0;
    for now in (2_000..10_000).step_by(137) {
        let e = elapsed_ms(&rec, now);
        assert!(e >= last, "elapsed went backwards at now={}", now);
        last = e;
    }
}

#[test]
fn test_elapsed_never_underflows() {
    let rec = recording_started_at(10_000);
    // Clock skew: "now" before the recorded start.
    assert_eq!(elapsed_ms(&rec, 9_000), 0);

    let mut rec = recording_started_at(10_000);
    rec.total_paused_duration_ms = 5_000;
    assert_eq!(elapsed_ms(&rec, 11_000), 0);
}

#[test]
fn test_pause_resume_cycle_accounting() {
    // Simulate what the controller does across one full cycle.
    let mut rec = recording_started_at(0);

    // Pause at t=5s.
    rec.is_paused = true;
    rec.pause_start_time_ms = Some(5_000);
    assert_eq!(elapsed_ms(&rec, 8_000), 5_000);

    // Resume at t=8s: 3s of pause moves into the accumulator.
    rec.total_paused_duration_ms += 8_000 - rec.pause_start_time_ms.unwrap();
    rec.pause_start_time_ms = None;
    rec.is_paused = false;

    assert_eq!(elapsed_ms(&rec, 8_000), 5_000);
    assert_eq!(elapsed_ms(&rec, 10_000), 7_000);
}
