// Tests for transcript reconciliation: ordered, non-overlapping commits,
// wholesale partial replacement, and duplicate-final rejection.

use std::sync::Arc;
use tokio::sync::watch;
use voxnote::stt::speaker::assign_speakers;
use voxnote::{HypothesisEvent, LiveTranscriptView, TranscriptReconciler, TranscriptSegment};

fn partial(text: &str, coverage_end_ms: u64) -> HypothesisEvent {
    HypothesisEvent::Partial {
        text: text.to_string(),
        coverage_end_ms,
    }
}

fn fin(text: &str, start_ms: u64, end_ms: u64) -> HypothesisEvent {
    HypothesisEvent::Final {
        text: text.to_string(),
        start_ms,
        end_ms,
        is_question: None,
    }
}

fn new_reconciler() -> (TranscriptReconciler, watch::Receiver<LiveTranscriptView>) {
    let (tx, rx) = watch::channel(LiveTranscriptView::default());
    let reconciler = TranscriptReconciler::new("rec-1".to_string(), Arc::new(tx));
    (reconciler, rx)
}

#[test]
fn test_partials_then_finals_yield_ordered_transcript() {
    let (mut reconciler, live) = new_reconciler();

    reconciler.apply(partial("hel", 100));
    assert_eq!(live.borrow().partial_text, "hel");

    reconciler.apply(partial("hello", 300));
    assert_eq!(live.borrow().partial_text, "hello");

    reconciler.apply(fin("hello", 0, 300));
    {
        let view = live.borrow();
        assert_eq!(view.committed_text, "hello");
        assert_eq!(view.partial_text, "", "partial cleared on commit");
    }

    reconciler.apply(partial("wor", 500));
    reconciler.apply(fin("world", 300, 500));

    let outcome = reconciler.into_outcome();
    assert_eq!(outcome.committed_text, "hello world");
    assert_eq!(outcome.segments.len(), 2);

    let a = &outcome.segments[0];
    let b = &outcome.segments[1];
    assert_eq!((a.start_ms, a.end_ms), (0, 300));
    assert_eq!((b.start_ms, b.end_ms), (300, 500));
    assert!(a.end_ms <= b.start_ms, "segments must not overlap");
}

#[test]
fn test_duplicate_final_is_dropped() {
    let (mut reconciler, _live) = new_reconciler();

    reconciler.apply(fin("hello", 0, 300));
    reconciler.apply(fin("hello", 0, 300)); // replayed event

    let outcome = reconciler.into_outcome();
    assert_eq!(outcome.segments.len(), 1);
    assert_eq!(outcome.committed_text, "hello");
}

#[test]
fn test_replay_of_identical_sequence_is_idempotent() {
    let events = vec![
        partial("hel", 100),
        partial("hello", 300),
        fin("hello", 0, 300),
        partial("wor", 500),
        fin("world", 300, 500),
    ];

    let run = |events: &[HypothesisEvent]| {
        let (mut reconciler, _live) = new_reconciler();
        for event in events {
            reconciler.apply(event.clone());
        }
        reconciler.into_outcome()
    };

    let first = run(&events);
    let second = run(&events);
    assert_eq!(first.committed_text, second.committed_text);
    assert_eq!(first.segments.len(), second.segments.len());
}

#[test]
fn test_overlapping_final_is_discarded() {
    let (mut reconciler, _live) = new_reconciler();

    reconciler.apply(fin("one two", 0, 1000));
    // Overlaps the committed range; must not be double-appended.
    reconciler.apply(fin("two three", 500, 1500));
    reconciler.apply(fin("three", 1000, 1500));

    let outcome = reconciler.into_outcome();
    assert_eq!(outcome.committed_text, "one two three");
    assert_eq!(outcome.segments.len(), 2);
}

#[test]
fn test_empty_final_clears_partial_without_committing() {
    let (mut reconciler, live) = new_reconciler();

    reconciler.apply(partial("mumble", 200));
    reconciler.apply(fin("   ", 0, 200));

    assert_eq!(live.borrow().partial_text, "");
    let outcome = reconciler.into_outcome();
    assert!(outcome.segments.is_empty());
}

#[test]
fn test_question_detection_prefers_engine_signal() {
    // Engine says interrogative despite missing punctuation.
    let (mut reconciler, _live) = new_reconciler();
    reconciler.apply(HypothesisEvent::Final {
        text: "is anyone there".to_string(),
        start_ms: 0,
        end_ms: 500,
        is_question: Some(true),
    });

    // No engine signal: trailing question mark decides.
    reconciler.apply(fin("what about now?", 500, 900));
    reconciler.apply(fin("that is all", 900, 1200));

    let outcome = reconciler.into_outcome();
    assert!(outcome.segments[0].is_question);
    assert!(outcome.segments[1].is_question);
    assert!(!outcome.segments[2].is_question);
}

#[test]
fn test_display_text_joins_committed_and_partial() {
    let (mut reconciler, live) = new_reconciler();

    reconciler.apply(fin("hello", 0, 300));
    reconciler.apply(partial("wor", 500));

    assert_eq!(live.borrow().display_text(), "hello wor");

    reconciler.apply(fin("world", 300, 500));
    assert_eq!(live.borrow().display_text(), "hello world");
}

// ----------------------------------------------------------------------------
// Speaker labeling pass
// ----------------------------------------------------------------------------

fn segment(text: &str, start_ms: u64, end_ms: u64, is_question: bool) -> TranscriptSegment {
    TranscriptSegment {
        id: format!("seg-{}", start_ms),
        recording_id: "rec-1".to_string(),
        start_ms,
        end_ms,
        text: text.to_string(),
        is_question,
        speaker: None,
    }
}

#[test]
fn test_single_voice_gets_no_speaker_labels() {
    let mut segments = vec![
        segment("first thought", 0, 900, false),
        segment("second thought", 1000, 1900, false),
        segment("third thought", 2000, 2900, false),
    ];

    assign_speakers(&mut segments);
    assert!(segments.iter().all(|s| s.speaker.is_none()));
}

#[test]
fn test_question_boundary_alternates_between_two_voices() {
    let mut segments = vec![
        segment("how does this work?", 0, 900, true),
        segment("let me explain", 1000, 2900, false),
        segment("does that help?", 3000, 3900, true),
        segment("yes it does", 4000, 4900, false),
    ];

    assign_speakers(&mut segments);

    let voices: Vec<_> = segments.iter().map(|s| s.speaker).collect();
    assert_eq!(
        voices,
        vec![Some(1), Some(2), Some(2), Some(1)],
        "alternates on question boundaries, capped at two voices"
    );
}

#[test]
fn test_long_gap_flips_voice() {
    let mut segments = vec![
        segment("before the silence", 0, 900, false),
        segment("after the silence", 5000, 5900, false),
    ];

    assign_speakers(&mut segments);
    assert_eq!(segments[0].speaker, Some(1));
    assert_eq!(segments[1].speaker, Some(2));
}
