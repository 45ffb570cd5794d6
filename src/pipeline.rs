//! Pipeline orchestration
//!
//! Public API for fearcond. Orchestrates the full per-trial pipeline:
//! alignment to the canonical timeline, freezing and darting segmentation,
//! and epoch aggregation. Trials are processed independently; a failing
//! trial never aborts the rest of the session.

use crate::adapter::{parse_session, TrackingSession};
use crate::align::align_trial;
use crate::epoch::{darting_summary, distance_summary, freezing_summary, speed_summary};
use crate::error::AnalysisError;
use crate::report::{SessionReport, SkippedTrial, TrialReport};
use crate::segment::{
    darting_events, dynamic_threshold, freezing_flags, segment_events, smooth_speed, Event,
};
use crate::types::{
    DartingRow, DistanceRow, FreezingRow, SpeedRow, TrialTimeline,
};

/// Tunable thresholds for one analysis run
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Convert pixel displacements to cm (28 cm = 330 px)
    pub convert_to_cm: bool,
    /// Per-step displacement below which a body part counts as immobile
    pub motion_threshold: f64,
    /// Minimum freezing run length in canonical samples (15 = 0.5 s at 30 Hz)
    pub min_freezing_samples: usize,
    /// Factor applied to the speed stddev for the darting speed threshold
    pub darting_speed_factor: f64,
    /// Minimum distance covered during a run for it to count as darting
    pub darting_distance_threshold: f64,
    /// Body part used for darting, distance, and speed summaries.
    /// `None` selects the first body part in name order.
    pub reference_bodypart: Option<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            convert_to_cm: true,
            motion_threshold: 0.1,
            min_freezing_samples: 15,
            darting_speed_factor: 2.0,
            darting_distance_threshold: 5.0,
            reference_bodypart: None,
        }
    }
}

impl AnalysisConfig {
    fn units(&self) -> (&'static str, &'static str) {
        if self.convert_to_cm {
            ("cm", "cm/sec")
        } else {
            ("px", "px/sec")
        }
    }
}

/// Everything computed for one trial
#[derive(Debug, Clone)]
pub struct TrialAnalysis {
    /// Canonical-timeline table for the trial
    pub timeline: TrialTimeline,
    /// Retained-freezing mask (4500 samples)
    pub freezing_mask: Vec<u8>,
    /// Retained freezing events
    pub freezing_events: Vec<Event>,
    /// Per-epoch freezing rows
    pub freezing: Vec<FreezingRow>,
    /// Retained-darting mask (4500 samples)
    pub darting_mask: Vec<u8>,
    /// Retained darting events
    pub darting_events: Vec<Event>,
    /// Per-epoch darting rows
    pub darting: Vec<DartingRow>,
    /// Per-epoch distance rows for the reference body part
    pub distance: Vec<DistanceRow>,
    /// Per-epoch mean-speed rows for the reference body part
    pub speed: Vec<SpeedRow>,
}

/// Run the full pipeline for a single trial.
///
/// Stages:
/// 1. Alignment - resample every body part onto the canonical timeline
/// 2. Freezing - flag samples where all body parts are immobile, segment
///    with the minimum-duration gate
/// 3. Darting - smooth the reference speed series, derive the dynamic speed
///    threshold, segment with the cumulative-distance gate
/// 4. Aggregation - per-epoch summary rows
///
/// Structural failures (window out of bounds, unknown trial) surface
/// immediately as `Err`.
pub fn analyze_trial(
    session: &TrackingSession,
    cs_id: &str,
    config: &AnalysisConfig,
) -> Result<TrialAnalysis, AnalysisError> {
    // Stage 1: Alignment
    let timeline = align_trial(&session.meta, &session.bodyparts, cs_id, config.convert_to_cm)?;

    let reference = match &config.reference_bodypart {
        Some(name) => name.clone(),
        None => timeline
            .tracks
            .keys()
            .next()
            .cloned()
            .ok_or_else(|| AnalysisError::MissingField("bodyparts".to_string()))?,
    };
    let track = timeline
        .tracks
        .get(&reference)
        .ok_or_else(|| AnalysisError::MissingField(format!("bodypart {reference}")))?;

    // Stage 2: Freezing
    let distances: Vec<&[f64]> = timeline
        .tracks
        .values()
        .map(|t| t.distance.as_slice())
        .collect();
    let flags = freezing_flags(&distances, config.motion_threshold);
    let (freezing_mask, freezing_event_list) =
        segment_events(&flags, config.min_freezing_samples);
    let freezing = freezing_summary(cs_id, &freezing_mask)?;

    // Stage 3: Darting
    let smoothed_speed = smooth_speed(&track.speed);
    let threshold_speed = dynamic_threshold(&smoothed_speed, config.darting_speed_factor);
    let (darting_mask, darting_event_list) = darting_events(
        &smoothed_speed,
        &track.distance,
        threshold_speed,
        config.darting_distance_threshold,
    )?;
    let darting = darting_summary(cs_id, &darting_mask, &darting_event_list)?;

    // Stage 4: Aggregation for the reference body part
    let (distance_units, speed_units) = config.units();
    let distance = distance_summary(cs_id, &track.distance, distance_units)?;
    let speed = speed_summary(cs_id, &track.speed, speed_units)?;

    Ok(TrialAnalysis {
        timeline,
        freezing_mask,
        freezing_events: freezing_event_list,
        freezing,
        darting_mask,
        darting_events: darting_event_list,
        darting,
        distance,
        speed,
    })
}

/// Convert tracking session JSON straight to a report JSON string
/// (stateless, one-shot, default thresholds).
pub fn session_to_report(session_json: String) -> Result<String, AnalysisError> {
    let session = parse_session(&session_json)?;
    let processor = SessionProcessor::new();
    processor.analyze(&session).to_json()
}

/// Processor applying one configuration across sessions.
///
/// Trials inside a session are independent: a trial whose alignment window
/// falls outside the recording is reported as skipped, and the remaining
/// trials still produce rows.
pub struct SessionProcessor {
    config: AnalysisConfig,
}

impl Default for SessionProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionProcessor {
    /// Create a processor with default thresholds
    pub fn new() -> Self {
        Self {
            config: AnalysisConfig::default(),
        }
    }

    /// Create a processor with explicit thresholds
    pub fn with_config(config: AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Analyze every trial of a session into a report.
    ///
    /// Per-trial failures are recorded in `skipped` with the reason; they do
    /// not abort the batch.
    pub fn analyze(&self, session: &TrackingSession) -> SessionReport {
        let mut trials = Vec::new();
        let mut skipped = Vec::new();

        for cs_id in session.meta.cs_start.keys() {
            match analyze_trial(session, cs_id, &self.config) {
                Ok(analysis) => trials.push(TrialReport::from_analysis(&analysis)),
                Err(error) => skipped.push(SkippedTrial {
                    cs_id: cs_id.clone(),
                    reason: error.to_string(),
                }),
            }
        }

        SessionReport::assemble(&session.meta, trials, skipped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Epoch, EPOCH_SAMPLES, TRIAL_SAMPLES};
    use std::collections::BTreeMap;

    /// 30 fps synthetic session: still animal except for a burst of motion
    /// shortly after the cs_01 onset.
    fn sample_session(cs_start: &[(&str, usize)]) -> TrackingSession {
        let n = 10_000;
        let mut points: Vec<(f64, f64)> = vec![(100.0, 100.0); n];

        // 2 s of fast, sustained locomotion starting 3 s after cs_01 onset
        if let Some((_, onset)) = cs_start.first() {
            for i in 0..60 {
                let frame = onset + 90 + i;
                if frame < n {
                    points[frame] = (100.0 + i as f64 * 8.0, 100.0);
                }
            }
            for p in points.iter_mut().skip((onset + 150).min(n)) {
                *p = (100.0 + 59.0 * 8.0, 100.0);
            }
        }

        let mut bodyparts = BTreeMap::new();
        bodyparts.insert("back_head".to_string(), points.clone());
        bodyparts.insert("tail_base".to_string(), points);

        TrackingSession {
            meta: crate::types::AnimalMeta {
                animal_id: "R42".to_string(),
                experiment_id: "exp03".to_string(),
                session: "ext01".to_string(),
                species: "rat".to_string(),
                user: "jcruz".to_string(),
                group: None,
                sex: None,
                date_of_birth: None,
                frame_rate: 30.0,
                cs_start: cs_start
                    .iter()
                    .map(|(k, v)| (k.to_string(), *v))
                    .collect(),
                cs_span_sec: 30.0,
            },
            bodyparts,
            led: None,
        }
    }

    #[test]
    fn test_analyze_trial_shapes() {
        let session = sample_session(&[("cs_01", 2000)]);
        let analysis = analyze_trial(&session, "cs_01", &AnalysisConfig::default()).unwrap();

        assert_eq!(analysis.freezing_mask.len(), TRIAL_SAMPLES);
        assert_eq!(analysis.darting_mask.len(), TRIAL_SAMPLES);
        assert_eq!(analysis.freezing.len(), 3);
        assert_eq!(analysis.darting.len(), 3);
        assert_eq!(analysis.distance.len(), 3);
        assert_eq!(analysis.speed.len(), 3);
        assert_eq!(analysis.freezing[0].cs_epoch, Epoch::PreCs);
        assert_eq!(analysis.timeline.cs_id, "cs_01");
    }

    #[test]
    fn test_still_animal_freezes_through_pre_cs() {
        let session = sample_session(&[("cs_01", 2000)]);
        let analysis = analyze_trial(&session, "cs_01", &AnalysisConfig::default()).unwrap();

        // No motion at all before onset: the whole pre window is frozen
        let pre = &analysis.freezing[0];
        assert_eq!(pre.freezing_raw, EPOCH_SAMPLES as f64);
        assert_eq!(pre.freezing_norm, 1.0);
    }

    #[test]
    fn test_motion_burst_detected_as_darting_in_peri() {
        let session = sample_session(&[("cs_01", 2000)]);
        let analysis = analyze_trial(&session, "cs_01", &AnalysisConfig::default()).unwrap();

        let peri = &analysis.darting[1];
        assert_eq!(peri.cs_epoch, Epoch::PeriCs);
        assert!(peri.darting_events >= 1);
        assert!(peri.darting_raw > 0.0);

        // The burst also breaks freezing during peri
        let peri_freezing = &analysis.freezing[1];
        assert!(peri_freezing.freezing_raw < EPOCH_SAMPLES as f64);
    }

    #[test]
    fn test_norm_is_raw_over_900() {
        let session = sample_session(&[("cs_01", 2000)]);
        let analysis = analyze_trial(&session, "cs_01", &AnalysisConfig::default()).unwrap();
        for row in analysis.freezing.iter() {
            let expected = (row.freezing_raw / 900.0 * 100.0).round() / 100.0;
            assert_eq!(row.freezing_norm, expected);
        }
    }

    #[test]
    fn test_out_of_bounds_trial_is_error() {
        // Onset too early: window would start before frame 0
        let session = sample_session(&[("cs_01", 100)]);
        let err = analyze_trial(&session, "cs_01", &AnalysisConfig::default()).unwrap_err();
        assert!(matches!(err, AnalysisError::OutOfRange { .. }));
    }

    #[test]
    fn test_session_processor_skips_bad_trial() {
        // cs_01 is fine, cs_02's window runs past the end of the recording
        let session = sample_session(&[("cs_01", 2000), ("cs_02", 9000)]);
        let report = SessionProcessor::new().analyze(&session);

        assert_eq!(report.trials.len(), 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].cs_id, "cs_02");
        assert!(report.skipped[0].reason.contains("bounds"));
    }

    #[test]
    fn test_session_to_report_json() {
        let session = sample_session(&[("cs_01", 2000)]);
        let json = serde_json::to_string(&session).unwrap();
        let report_json = session_to_report(json).unwrap();

        let report: serde_json::Value = serde_json::from_str(&report_json).unwrap();
        assert_eq!(report["producer"]["name"], "fearcond");
        assert_eq!(report["animal_id"], "R42");
        assert_eq!(report["trials"][0]["cs_id"], "cs_01");
        assert_eq!(
            report["trials"][0]["freezing"][0]["cs_epoch"],
            "pre_cs"
        );
    }

    #[test]
    fn test_reference_bodypart_selection() {
        let session = sample_session(&[("cs_01", 2000)]);
        let config = AnalysisConfig {
            reference_bodypart: Some("tail_base".to_string()),
            ..Default::default()
        };
        assert!(analyze_trial(&session, "cs_01", &config).is_ok());

        let config = AnalysisConfig {
            reference_bodypart: Some("nose".to_string()),
            ..Default::default()
        };
        let err = analyze_trial(&session, "cs_01", &config).unwrap_err();
        assert!(matches!(err, AnalysisError::MissingField(_)));
    }
}
