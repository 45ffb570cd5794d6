//! Stimulus-onset utilities
//!
//! Candidate CS onsets are detected from the tracked LED area: frames where
//! the area rises above a multiple of the whole-signal baseline are ON, and
//! the first ON frame of each burst is a candidate onset. Reviewing and
//! pruning falsely detected onsets is a human step that belongs to the
//! orchestration layer, not here.

use chrono::{DateTime, Utc};

/// Default refractory span after a detected onset (900 frames, one 30 s CS
/// at 30 fps)
pub const DEFAULT_ONSET_REFRACTORY: usize = 900;

/// Per-frame LED state: 1 where the LED area is at or above
/// `mean(led_area) * factor`.
///
/// The baseline is the mean over the whole recording, which is dominated by
/// LED-off frames in any realistic session.
pub fn led_state(led_area: &[f64], factor: f64) -> Vec<u8> {
    if led_area.is_empty() {
        return Vec::new();
    }
    let baseline = led_area.iter().sum::<f64>() / led_area.len() as f64;
    let threshold = baseline * factor;

    led_area
        .iter()
        .map(|&area| u8::from(area >= threshold))
        .collect()
}

/// Candidate stimulus-onset frame indices.
///
/// Scans the LED state mask; each time an ON frame is found its index is
/// recorded and the scan skips `refractory` frames before looking for the
/// next onset. Pure and deterministic; candidates may still include false
/// positives for a caller-side review step to remove.
pub fn detect_candidate_onsets(led_area: &[f64], factor: f64, refractory: usize) -> Vec<usize> {
    let state = led_state(led_area, factor);
    let mut onsets = Vec::new();

    let mut frame = 0;
    while frame < state.len() {
        if state[frame] == 1 {
            onsets.push(frame);
            frame += refractory.max(1);
        } else {
            frame += 1;
        }
    }
    onsets
}

/// Estimate the acquisition frame rate from per-frame timestamps.
///
/// Frames are bucketed by whole second and the mean bucket size is the
/// estimated rate, rounded to 2 decimals. Returns `None` for fewer than two
/// frames or when everything lands in a single bucket.
pub fn estimate_frame_rate(timestamps: &[DateTime<Utc>]) -> Option<f64> {
    if timestamps.len() < 2 {
        return None;
    }

    let mut buckets: Vec<(i64, usize)> = Vec::new();
    for ts in timestamps {
        let second = ts.timestamp();
        match buckets.last_mut() {
            Some((bucket, count)) if *bucket == second => *count += 1,
            _ => buckets.push((second, 1)),
        }
    }

    if buckets.len() < 2 {
        return None;
    }

    let mean = buckets.iter().map(|(_, c)| *c as f64).sum::<f64>() / buckets.len() as f64;
    Some((mean * 100.0).round() / 100.0)
}
