//! Event segmentation
//!
//! Scans boolean/threshold-derived series for maximal contiguous runs
//! ("events") and filters them by a retention gate: minimum duration for
//! freezing, cumulative displacement for darting. The output is always a
//! same-length binary mask plus the ordered list of retained events.

use crate::error::AnalysisError;
use crate::smooth::{savgol_linear, SPEED_SMOOTHING_WINDOW};

/// A maximal contiguous run of sample indices where a predicate held
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// 1-based ordinal over retained events
    pub ordinal: usize,
    /// Member sample indices, contiguous and ascending
    pub indices: Vec<usize>,
}

impl Event {
    /// Run length in samples
    pub fn duration(&self) -> usize {
        self.indices.len()
    }

    /// First sample index of the run
    pub fn start(&self) -> usize {
        self.indices[0]
    }
}

/// Segment a flag series into retained events.
///
/// Runs of consecutive non-zero flags shorter than `min_duration` are
/// discarded and zeroed in the returned mask; retained runs are numbered
/// 1..k in order of appearance. A run still open at the end of the sequence
/// is closed and gated exactly like any other run. Empty input yields an
/// empty mask and no events.
pub fn segment_events(flags: &[u8], min_duration: usize) -> (Vec<u8>, Vec<Event>) {
    segment_by(flags.len(), |i| flags[i] > 0, |run| run.len() >= min_duration)
}

/// Extract darting events from a speed series and its per-step displacement.
///
/// Runs are opened wherever `speed > threshold_speed`; there is no explicit
/// minimum duration. A run is retained only if the distance covered during
/// the run (the sum of `distance` over its indices) exceeds
/// `threshold_distance`.
///
/// # Errors
/// `LengthMismatch` if the speed and distance series differ in length.
pub fn darting_events(
    speed: &[f64],
    distance: &[f64],
    threshold_speed: f64,
    threshold_distance: f64,
) -> Result<(Vec<u8>, Vec<Event>), AnalysisError> {
    if speed.len() != distance.len() {
        return Err(AnalysisError::LengthMismatch {
            expected: speed.len(),
            actual: distance.len(),
        });
    }
    Ok(segment_by(
        speed.len(),
        |i| speed[i] > threshold_speed,
        |run| run.iter().map(|&i| distance[i]).sum::<f64>() > threshold_distance,
    ))
}

/// Linear scan shared by all segmenters: `predicate` opens/extends a run,
/// `retain` gates it when it closes.
fn segment_by<P, R>(len: usize, predicate: P, retain: R) -> (Vec<u8>, Vec<Event>)
where
    P: Fn(usize) -> bool,
    R: Fn(&[usize]) -> bool,
{
    let mut mask = vec![0u8; len];
    let mut events = Vec::new();
    let mut running: Vec<usize> = Vec::new();
    let mut ordinal = 1;

    let mut close = |running: &mut Vec<usize>, mask: &mut Vec<u8>, events: &mut Vec<Event>| {
        if !running.is_empty() && retain(running) {
            for &i in running.iter() {
                mask[i] = 1;
            }
            events.push(Event {
                ordinal,
                indices: std::mem::take(running),
            });
            ordinal += 1;
        } else {
            running.clear();
        }
    };

    for i in 0..len {
        if predicate(i) {
            running.push(i);
        } else {
            close(&mut running, &mut mask, &mut events);
        }
    }
    // A run reaching the end of the sequence is evaluated once, not dropped
    close(&mut running, &mut mask, &mut events);

    (mask, events)
}

/// Dynamic threshold for a signal: `round(mean + factor * stddev)`.
///
/// Uses the population standard deviation. Empty input yields 0.
pub fn dynamic_threshold(values: &[f64], factor: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean + factor * variance.sqrt()).round()
}

/// Per-sample freezing flags: 1 where every body part's per-step displacement
/// is below `motion_threshold`.
///
/// All series must have equal length; the caller guarantees this (the trial
/// timeline builder produces equal-length tracks). Empty `tracks` yields an
/// all-zero result of length 0.
pub fn freezing_flags(tracks: &[&[f64]], motion_threshold: f64) -> Vec<u8> {
    let Some(first) = tracks.first() else {
        return Vec::new();
    };

    (0..first.len())
        .map(|i| {
            let all_below = tracks.iter().all(|t| t[i] < motion_threshold);
            u8::from(all_below)
        })
        .collect()
}

/// Smooth a speed series for darting detection (Savitzky-Golay, window 9,
/// order 1). The cumulative-distance series is deliberately not smoothed.
pub fn smooth_speed(speed: &[f64]) -> Vec<f64> {
    savgol_linear(speed, SPEED_SMOOTHING_WINDOW)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_segment_retains_runs_at_min_duration() {
        let flags = [1, 1, 1, 0, 1, 1, 0, 0];
        let (mask, events) = segment_events(&flags, 2);

        assert_eq!(mask, vec![1, 1, 1, 0, 1, 1, 0, 0]);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].indices, vec![0, 1, 2]);
        assert_eq!(events[1].indices, vec![4, 5]);
        assert_eq!(events[0].ordinal, 1);
        assert_eq!(events[1].ordinal, 2);
    }

    #[test]
    fn test_segment_drops_short_runs() {
        let flags = [1, 1, 1, 0, 1, 1, 0, 0];
        let (mask, events) = segment_events(&flags, 3);

        assert_eq!(mask, vec![1, 1, 1, 0, 0, 0, 0, 0]);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].duration(), 3);
    }

    #[test]
    fn test_tail_run_is_closed_once() {
        let flags = [0, 0, 1, 1];
        let (mask, events) = segment_events(&flags, 2);
        assert_eq!(mask, vec![0, 0, 1, 1]);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].indices, vec![2, 3]);

        // Too short when the gate is raised
        let (mask, events) = segment_events(&flags, 3);
        assert_eq!(mask, vec![0, 0, 0, 0]);
        assert!(events.is_empty());
    }

    #[test]
    fn test_empty_input() {
        let (mask, events) = segment_events(&[], 2);
        assert!(mask.is_empty());
        assert!(events.is_empty());
    }

    #[test]
    fn test_mask_ones_equal_event_lengths() {
        let flags = [1, 0, 1, 1, 1, 0, 1, 1, 0, 1];
        let (mask, events) = segment_events(&flags, 2);
        let ones: usize = mask.iter().map(|&m| m as usize).sum();
        let total: usize = events.iter().map(Event::duration).sum();
        assert_eq!(ones, total);
        assert_eq!(mask.len(), flags.len());
    }

    #[test]
    fn test_segmenter_idempotence() {
        let flags = [1, 1, 0, 1, 1, 1, 0, 1, 0, 1, 1];
        let (mask, _) = segment_events(&flags, 2);
        let (mask_again, _) = segment_events(&mask, 2);
        assert_eq!(mask, mask_again);
    }

    #[test]
    fn test_darting_distance_gate() {
        let speed = [0.0, 10.0, 10.0, 0.0, 10.0, 10.0];
        let distance = [0.0, 3.0, 3.0, 0.0, 0.1, 0.1];
        let (mask, events) = darting_events(&speed, &distance, 5.0, 1.0).unwrap();

        // First run covers 6.0 units, second only 0.2
        assert_eq!(mask, vec![0, 1, 1, 0, 0, 0]);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].indices, vec![1, 2]);
    }

    #[test]
    fn test_darting_ordinals_count_retained_only() {
        let speed = [10.0, 0.0, 10.0, 0.0, 10.0];
        let distance = [0.1, 0.0, 5.0, 0.0, 5.0];
        let (_, events) = darting_events(&speed, &distance, 5.0, 1.0).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].ordinal, 1);
        assert_eq!(events[1].ordinal, 2);
    }

    #[test]
    fn test_darting_length_mismatch() {
        let err = darting_events(&[1.0, 2.0], &[1.0], 0.5, 0.1).unwrap_err();
        assert!(matches!(
            err,
            crate::error::AnalysisError::LengthMismatch { .. }
        ));
    }

    #[test]
    fn test_dynamic_threshold() {
        // mean 2, std 1 -> round(2 + 2*1) = 4
        let values = [1.0, 3.0, 1.0, 3.0];
        assert_eq!(dynamic_threshold(&values, 2.0), 4.0);
        assert_eq!(dynamic_threshold(&[], 2.0), 0.0);
    }

    #[test]
    fn test_freezing_flags_require_all_bodyparts_below() {
        let head = [0.1, 0.1, 0.9, 0.1];
        let tail = [0.1, 0.9, 0.9, 0.1];
        let flags = freezing_flags(&[&head, &tail], 0.5);
        assert_eq!(flags, vec![1, 0, 0, 1]);
    }
}
