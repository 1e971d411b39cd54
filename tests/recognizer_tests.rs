// Tests for the streaming recognition adapter: windowed inference,
// partial/final emission, bounded retry, and the halt-with-error contract.

mod common;

use common::{FailingEngine, ScriptedEngine, SlowEngine};
use std::time::Duration;
use tokio::sync::mpsc;
use voxnote::stt::recognizer;
use voxnote::{AudioFrame, Hypothesis, HypothesisEvent, RecognitionError, RecognizerConfig, SpeechEngine};

const SAMPLE_RATE: u32 = 16000;

fn frame_100ms(timestamp_ms: u64) -> AudioFrame {
    AudioFrame {
        samples: vec![0i16; (SAMPLE_RATE / 10) as usize],
        sample_rate: SAMPLE_RATE,
        channels: 1,
        timestamp_ms,
    }
}

fn config(window_ms: u64, max_attempts: u32) -> RecognizerConfig {
    RecognizerConfig {
        sample_rate: SAMPLE_RATE,
        window_ms,
        max_attempts,
        inference_timeout: Duration::from_secs(5),
    }
}

async fn run_recognizer(
    engine: impl SpeechEngine + 'static,
    config: RecognizerConfig,
    frames: Vec<AudioFrame>,
) -> Vec<HypothesisEvent> {
    let (frame_tx, frame_rx) = mpsc::channel(64);
    let (event_tx, mut event_rx) = mpsc::channel(64);

    let handle = recognizer::spawn(Box::new(engine), config, frame_rx, event_tx);

    for frame in frames {
        if frame_tx.send(frame).await.is_err() {
            break; // recognizer halted early
        }
    }
    drop(frame_tx);
    handle.await.expect("recognizer task panicked");

    let mut events = Vec::new();
    while let Ok(event) = event_rx.try_recv() {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn test_partials_then_finals_with_monotonic_coverage() {
    let engine = ScriptedEngine::new(vec![
        Ok(Hypothesis::partial("hel")),
        Ok(Hypothesis::partial("hello")),
        Ok(Hypothesis::fin("hello")),
        Ok(Hypothesis::partial("wor")),
        Ok(Hypothesis::fin("world")),
    ]);

    // One inference per 100ms frame.
    let frames = (0..5).map(|i| frame_100ms(i * 100)).collect();
    let events = run_recognizer(engine, config(100, 3), frames).await;

    assert_eq!(events.len(), 5);
    assert_eq!(
        events[0],
        HypothesisEvent::Partial {
            text: "hel".to_string(),
            coverage_end_ms: 100
        }
    );
    assert_eq!(
        events[1],
        HypothesisEvent::Partial {
            text: "hello".to_string(),
            coverage_end_ms: 200
        }
    );
    assert_eq!(
        events[2],
        HypothesisEvent::Final {
            text: "hello".to_string(),
            start_ms: 0,
            end_ms: 300,
            is_question: None
        }
    );
    // The window restarts after a final; coverage keeps advancing.
    assert_eq!(
        events[3],
        HypothesisEvent::Partial {
            text: "wor".to_string(),
            coverage_end_ms: 400
        }
    );
    assert_eq!(
        events[4],
        HypothesisEvent::Final {
            text: "world".to_string(),
            start_ms: 300,
            end_ms: 500,
            is_question: None
        }
    );

    // Coverage values never go backwards.
    let mut last = 0;
    for event in &events {
        let end = match event {
            HypothesisEvent::Partial {
                coverage_end_ms, ..
            } => *coverage_end_ms,
            HypothesisEvent::Final { end_ms, .. } => *end_ms,
            HypothesisEvent::Error(_) => continue,
        };
        assert!(end >= last, "coverage went backwards: {} < {}", end, last);
        last = end;
    }
}

#[tokio::test]
async fn test_transient_failures_retry_with_same_window() {
    let engine = ScriptedEngine::new(vec![
        Err(RecognitionError::EngineFailure("hiccup".into())),
        Err(RecognitionError::EngineFailure("hiccup".into())),
        Ok(Hypothesis::fin("recovered")),
    ]);

    let events = run_recognizer(engine, config(100, 3), vec![frame_100ms(0)]).await;

    assert_eq!(
        events,
        vec![HypothesisEvent::Final {
            text: "recovered".to_string(),
            start_ms: 0,
            end_ms: 100,
            is_question: None
        }]
    );
}

#[tokio::test]
async fn test_persistent_failure_emits_error_and_halts() {
    let frames = (0..3).map(|i| frame_100ms(i * 100)).collect();
    let events = run_recognizer(FailingEngine, config(100, 2), frames).await;

    // Exactly one terminal error; no stream of repeats, no silence.
    assert_eq!(events.len(), 1);
    assert!(matches!(events[0], HypothesisEvent::Error(_)));
}

#[tokio::test]
async fn test_residual_window_flushes_as_final_on_close() {
    let engine = ScriptedEngine::new(vec![Ok(Hypothesis::fin("tail words"))]);

    // 100ms of audio against a 1s window: nothing mid-stream, one flush.
    let events = run_recognizer(engine, config(1000, 3), vec![frame_100ms(0)]).await;

    assert_eq!(
        events,
        vec![HypothesisEvent::Final {
            text: "tail words".to_string(),
            start_ms: 0,
            end_ms: 100,
            is_question: None
        }]
    );
}

#[tokio::test]
async fn test_empty_flush_commits_nothing() {
    let engine = ScriptedEngine::new(vec![Ok(Hypothesis::fin("   "))]);
    let events = run_recognizer(engine, config(1000, 3), vec![frame_100ms(0)]).await;
    assert!(events.is_empty());
}

#[tokio::test]
async fn test_inference_timeout_surfaces_as_error() {
    let engine = SlowEngine {
        delay: Duration::from_millis(500),
    };
    let cfg = RecognizerConfig {
        sample_rate: SAMPLE_RATE,
        window_ms: 100,
        max_attempts: 1,
        inference_timeout: Duration::from_millis(50),
    };

    let events = run_recognizer(engine, cfg, vec![frame_100ms(0)]).await;
    assert_eq!(
        events,
        vec![HypothesisEvent::Error(RecognitionError::Timeout)]
    );
}
