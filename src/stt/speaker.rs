//! Heuristic two-speaker labeling over committed segments.

use crate::stt::reconciler::TranscriptSegment;

/// A silence this long between segments suggests the voice changed.
const SPEAKER_GAP_MS: u64 = 2000;

/// Assign speaker labels by alternating on strong boundaries: a segment
/// ending in a question, or an inter-segment gap of two seconds or more.
///
/// Distinguishes at most two speakers; that cap is a known limitation, not
/// a starting point for generalization. When no boundary fires the whole
/// transcript is treated as one voice and every label stays `None`.
pub fn assign_speakers(segments: &mut [TranscriptSegment]) {
    if segments.len() < 2 {
        return;
    }

    let mut voices = Vec::with_capacity(segments.len());
    let mut current = 0u8;
    let mut alternated = false;
    voices.push(current);

    for i in 1..segments.len() {
        let prev = &segments[i - 1];
        let gap = segments[i].start_ms.saturating_sub(prev.end_ms);
        if prev.is_question || gap >= SPEAKER_GAP_MS {
            current ^= 1;
            alternated = true;
        }
        voices.push(current);
    }

    if !alternated {
        return;
    }

    for (segment, voice) in segments.iter_mut().zip(voices) {
        segment.speaker = Some(voice + 1);
    }
}
