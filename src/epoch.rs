//! Epoch binning and per-trial aggregation
//!
//! Partitions a trial's canonical timeline into the three named epochs and
//! computes the per-epoch summaries: freezing/darting raw sums and normalized
//! rates, darting event counts, distance covered, and mean speed.
//!
//! One boundary definition is used everywhere: relative to trial start,
//! `[0, 1800)` is pre_cs, `[1800, 2700)` is peri_cs, `[2700, 4500)` is
//! post_cs. Aggregation only reads the sub-window `[900, 3600)`, which holds
//! exactly 900 samples of each epoch; the leading and trailing 900 samples of
//! the timeline are discarded margin.

use crate::error::AnalysisError;
use crate::segment::Event;
use crate::smooth::{savgol_linear, SPEED_SMOOTHING_WINDOW};
use crate::types::{
    round2, DartingRow, DistanceRow, Epoch, FreezingRow, SpeedRow, TrialTimeline, EPOCH_SAMPLES,
    TRIAL_SAMPLES, WINDOW_END, WINDOW_START,
};
use std::ops::Range;

/// Epoch tag for a canonical sample index (0-based, relative to trial start)
pub fn epoch_of_index(index: usize) -> Result<Epoch, AnalysisError> {
    match index {
        0..=1799 => Ok(Epoch::PreCs),
        1800..=2699 => Ok(Epoch::PeriCs),
        2700..=4499 => Ok(Epoch::PostCs),
        _ => Err(AnalysisError::OutOfRange {
            start: index as i64,
            end: index as i64 + 1,
            len: TRIAL_SAMPLES,
        }),
    }
}

/// Full timeline range tagged with this epoch
pub fn epoch_range(epoch: Epoch) -> Range<usize> {
    match epoch {
        Epoch::PreCs => 0..1800,
        Epoch::PeriCs => 1800..2700,
        Epoch::PostCs => 2700..4500,
    }
}

/// The 900-sample slice of this epoch inside the aggregation window
pub fn epoch_window_range(epoch: Epoch) -> Range<usize> {
    match epoch {
        Epoch::PreCs => WINDOW_START..1800,
        Epoch::PeriCs => 1800..2700,
        Epoch::PostCs => 2700..WINDOW_END,
    }
}

fn check_trial_length(len: usize) -> Result<(), AnalysisError> {
    if len != TRIAL_SAMPLES {
        return Err(AnalysisError::LengthMismatch {
            expected: TRIAL_SAMPLES,
            actual: len,
        });
    }
    Ok(())
}

/// Per-epoch freezing summary for one trial.
///
/// `mask` is the trial's retained-freezing mask (4500 samples). Returns three
/// rows in epoch order: raw frozen-sample count and the normalized rate
/// `round(raw / 900, 2)`.
pub fn freezing_summary(cs_id: &str, mask: &[u8]) -> Result<Vec<FreezingRow>, AnalysisError> {
    check_trial_length(mask.len())?;

    Ok(Epoch::all()
        .into_iter()
        .map(|epoch| {
            let raw: f64 = mask[epoch_window_range(epoch)]
                .iter()
                .map(|&m| m as f64)
                .sum();
            FreezingRow {
                cs_id: cs_id.to_string(),
                cs_epoch: epoch,
                freezing_raw: raw,
                freezing_norm: round2(raw / EPOCH_SAMPLES as f64),
            }
        })
        .collect())
}

/// Per-epoch darting summary for one trial.
///
/// `mask` is the retained-darting mask and `events` the retained events from
/// the segmenter. An event is counted in the epoch containing its first
/// sample; events starting outside the aggregation window are not counted.
pub fn darting_summary(
    cs_id: &str,
    mask: &[u8],
    events: &[Event],
) -> Result<Vec<DartingRow>, AnalysisError> {
    check_trial_length(mask.len())?;

    Ok(Epoch::all()
        .into_iter()
        .map(|epoch| {
            let window = epoch_window_range(epoch);
            let raw: f64 = mask[window.clone()].iter().map(|&m| m as f64).sum();
            let event_count = events
                .iter()
                .filter(|event| window.contains(&event.start()))
                .count();
            DartingRow {
                cs_id: cs_id.to_string(),
                cs_epoch: epoch,
                darting_raw: raw,
                darting_norm: round2(raw / EPOCH_SAMPLES as f64),
                darting_events: event_count,
            }
        })
        .collect())
}

/// Per-epoch distance covered for one trial, from a canonical-timeline
/// per-step displacement series.
pub fn distance_summary(
    cs_id: &str,
    distance: &[f64],
    units: &str,
) -> Result<Vec<DistanceRow>, AnalysisError> {
    check_trial_length(distance.len())?;

    Ok(Epoch::all()
        .into_iter()
        .map(|epoch| {
            let total: f64 = distance[epoch_window_range(epoch)].iter().sum();
            DistanceRow {
                cs_id: cs_id.to_string(),
                cs_epoch: epoch,
                total_distance: round2(total),
                units: units.to_string(),
            }
        })
        .collect())
}

/// Per-epoch mean speed for one trial, from a canonical-timeline speed series.
pub fn speed_summary(
    cs_id: &str,
    speed: &[f64],
    units: &str,
) -> Result<Vec<SpeedRow>, AnalysisError> {
    check_trial_length(speed.len())?;

    Ok(Epoch::all()
        .into_iter()
        .map(|epoch| {
            let window = epoch_window_range(epoch);
            let mean: f64 = speed[window].iter().sum::<f64>() / EPOCH_SAMPLES as f64;
            SpeedRow {
                cs_id: cs_id.to_string(),
                cs_epoch: epoch,
                mean_speed: round2(mean),
                units: units.to_string(),
            }
        })
        .collect())
}

/// Smoothed speed and zero-referenced cumulative distance for one epoch of a
/// trial, both exactly 900 samples.
///
/// The epoch's full timeline slice is taken first (1800 samples for pre_cs
/// and post_cs, 900 for peri_cs). Speed is smoothed (Savitzky-Golay, window
/// 9, order 1) and right-truncated to the last 900 samples. The cumulative
/// distance is not smoothed; it is zero-referenced at the start of its
/// 900-sample window, falling back to the last 900 samples when the slice is
/// longer.
pub fn epoch_speed_distance(
    trial: &TrialTimeline,
    bodypart: &str,
    epoch: Epoch,
) -> Result<(Vec<f64>, Vec<f64>), AnalysisError> {
    let track = trial
        .tracks
        .get(bodypart)
        .ok_or_else(|| AnalysisError::MissingField(format!("bodypart {bodypart}")))?;
    check_trial_length(track.distance.len())?;
    check_trial_length(track.speed.len())?;

    let range = epoch_range(epoch);

    // Cumulative distance over the epoch slice, then zero-referenced over
    // the trailing 900 samples
    let mut cumulative = Vec::with_capacity(range.len());
    let mut total = 0.0;
    for &d in &track.distance[range.clone()] {
        total += d;
        cumulative.push(total);
    }
    let cumulative = if cumulative.len() == EPOCH_SAMPLES {
        let reference = cumulative[0];
        cumulative.iter().map(|v| v - reference).collect()
    } else {
        let tail = &cumulative[cumulative.len() - EPOCH_SAMPLES..];
        let reference = tail[0];
        tail.iter().map(|v| v - reference).collect::<Vec<f64>>()
    };

    let mut speed = savgol_linear(&track.speed[range], SPEED_SMOOTHING_WINDOW);
    if speed.len() != EPOCH_SAMPLES {
        speed = speed[speed.len() - EPOCH_SAMPLES..].to_vec();
    }

    Ok((speed, cumulative))
}
