//! Onset-anchored resampling to the canonical timeline
//!
//! Recordings arrive at whatever rate the acquisition hardware ran at.
//! Every trial is re-anchored to its stimulus onset and linearly interpolated
//! onto a fixed 30 Hz virtual clock so that trials from different sessions
//! and species share one timeline: 60 s before onset, 90 s after, 4500
//! samples total.

use crate::error::AnalysisError;
use crate::motion::{euclidean_distance, speed_per_frame};
use crate::types::{
    AnimalMeta, BodypartTrack, TrialTimeline, CANONICAL_RATE, POST_CS_SECONDS, PRE_CS_SECONDS,
};
use std::collections::BTreeMap;

/// Resample an onset-anchored window of a raw signal to the canonical rate.
///
/// The source window is `[onset - pre_seconds*rate, onset + post_seconds*rate)`
/// in native frames (truncated to integers). Its samples are treated as a
/// uniform grid spanning the window inclusive of both endpoints; the output is
/// `30 * (pre_seconds + post_seconds)` samples linearly interpolated over the
/// same span. No extrapolation occurs: target positions are contained in the
/// source range by construction.
///
/// # Errors
/// `OutOfRange` if the window extends beyond the recorded signal.
pub fn resample_onset_window(
    values: &[f64],
    onset: usize,
    frame_rate: f64,
    pre_seconds: usize,
    post_seconds: usize,
) -> Result<Vec<f64>, AnalysisError> {
    let start = (onset as f64 - pre_seconds as f64 * frame_rate) as i64;
    let end = (onset as f64 + post_seconds as f64 * frame_rate) as i64;

    if start < 0 || end as usize > values.len() || start >= end {
        return Err(AnalysisError::OutOfRange {
            start,
            end,
            len: values.len(),
        });
    }

    let source = &values[start as usize..end as usize];
    let target_len = CANONICAL_RATE * (pre_seconds + post_seconds);
    Ok(interp_uniform(source, target_len))
}

/// Linearly interpolate a uniform source grid onto `target_len` uniform
/// points spanning the same range (both grids include their endpoints).
fn interp_uniform(source: &[f64], target_len: usize) -> Vec<f64> {
    if source.is_empty() || target_len == 0 {
        return Vec::new();
    }
    if source.len() == 1 {
        return vec![source[0]; target_len];
    }
    if target_len == 1 {
        return vec![source[0]];
    }

    let scale = (source.len() - 1) as f64 / (target_len - 1) as f64;
    (0..target_len)
        .map(|i| {
            let position = i as f64 * scale;
            let low = position.floor() as usize;
            if low + 1 >= source.len() {
                return source[source.len() - 1];
            }
            let fraction = position - low as f64;
            source[low] * (1.0 - fraction) + source[low + 1] * fraction
        })
        .collect()
}

/// Build one trial's canonical timeline from raw body-part coordinates.
///
/// For every body part: x and y are interpolated onto the canonical grid, the
/// per-step displacement series is resampled through the same interpolation
/// (the quantity interpolated is the per-frame delta), and speed is derived
/// at the canonical rate. Each trial is constructed as its own record; no
/// accumulator is shared across trials.
///
/// # Errors
/// `MissingTrial` if `cs_id` is not in the metadata; `OutOfRange` if the
/// trial window falls outside the recording.
pub fn align_trial(
    meta: &AnimalMeta,
    bodyparts: &BTreeMap<String, Vec<(f64, f64)>>,
    cs_id: &str,
    convert_to_cm: bool,
) -> Result<TrialTimeline, AnalysisError> {
    let onset = *meta
        .cs_start
        .get(cs_id)
        .ok_or_else(|| AnalysisError::MissingTrial(cs_id.to_string()))?;

    let mut tracks = BTreeMap::new();
    for (name, points) in bodyparts {
        let xs: Vec<f64> = points.iter().map(|p| p.0).collect();
        let ys: Vec<f64> = points.iter().map(|p| p.1).collect();
        let raw_distance = euclidean_distance(points, convert_to_cm);

        let x = resample_window(&xs, onset, meta.frame_rate)?;
        let y = resample_window(&ys, onset, meta.frame_rate)?;
        let distance = resample_window(&raw_distance, onset, meta.frame_rate)?;
        let speed = speed_per_frame(&distance, CANONICAL_RATE as f64);

        tracks.insert(
            name.clone(),
            BodypartTrack {
                x,
                y,
                distance,
                speed,
            },
        );
    }

    Ok(TrialTimeline {
        cs_id: cs_id.to_string(),
        onset,
        tracks,
    })
}

fn resample_window(
    values: &[f64],
    onset: usize,
    frame_rate: f64,
) -> Result<Vec<f64>, AnalysisError> {
    resample_onset_window(values, onset, frame_rate, PRE_CS_SECONDS, POST_CS_SECONDS)
}
