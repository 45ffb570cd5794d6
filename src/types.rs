//! Core types for the fearcond pipeline
//!
//! This module defines the data structures that flow through each stage of the
//! pipeline: animal metadata, the canonical trial timeline, and the per-epoch
//! summary rows handed to the export layer.

use crate::error::AnalysisError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Canonical sampling rate every trial is resampled to (samples/sec)
pub const CANONICAL_RATE: usize = 30;

/// Seconds of signal kept before stimulus onset
pub const PRE_CS_SECONDS: usize = 60;

/// Seconds of signal kept after stimulus onset
pub const POST_CS_SECONDS: usize = 90;

/// Samples per aligned trial: (60 + 90) seconds at 30 samples/sec
pub const TRIAL_SAMPLES: usize = (PRE_CS_SECONDS + POST_CS_SECONDS) * CANONICAL_RATE;

/// Samples per epoch window (30 seconds at 30 samples/sec)
pub const EPOCH_SAMPLES: usize = 900;

/// First sample of the aggregation window (30 s before onset)
pub const WINDOW_START: usize = 900;

/// One-past-last sample of the aggregation window (30 s after stimulus end)
pub const WINDOW_END: usize = 3600;

/// Arena calibration: 28 cm corresponds to 330 pixels
pub const ARENA_CM: f64 = 28.0;
pub const ARENA_PIXELS: f64 = 330.0;

/// Named 30-second window of the trial-relative timeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Epoch {
    PreCs,
    PeriCs,
    PostCs,
}

impl Epoch {
    pub fn as_str(&self) -> &'static str {
        match self {
            Epoch::PreCs => "pre_cs",
            Epoch::PeriCs => "peri_cs",
            Epoch::PostCs => "post_cs",
        }
    }

    /// All epochs in timeline order
    pub fn all() -> [Epoch; 3] {
        [Epoch::PreCs, Epoch::PeriCs, Epoch::PostCs]
    }
}

impl fmt::Display for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Epoch {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pre_cs" => Ok(Epoch::PreCs),
            "peri_cs" => Ok(Epoch::PeriCs),
            "post_cs" => Ok(Epoch::PostCs),
            other => Err(AnalysisError::InvalidEpoch(other.to_string())),
        }
    }
}

/// Per-animal recording metadata consumed by the core.
///
/// This is an explicit, immutable parameter bundle: the core reads
/// `frame_rate` and `cs_start` and never mutates any of it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnimalMeta {
    /// Animal identifier (e.g. "R42")
    pub animal_id: String,
    /// Experiment identifier
    pub experiment_id: String,
    /// Session label (e.g. "hab01", "ext02")
    pub session: String,
    /// Species label (e.g. "rat", "mouse")
    pub species: String,
    /// Experimenter
    pub user: String,
    /// Treatment group, if assigned
    #[serde(default)]
    pub group: Option<String>,
    /// Animal sex, if recorded
    #[serde(default)]
    pub sex: Option<String>,
    /// Date of birth, if recorded
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    /// Native acquisition rate of the recording (frames/sec)
    pub frame_rate: f64,
    /// Stimulus onset frame per trial id ("cs_01".."cs_05"), 1 to 5 entries
    pub cs_start: BTreeMap<String, usize>,
    /// Stimulus span in seconds
    pub cs_span_sec: f64,
}

/// Aligned series for one body part on the canonical trial timeline.
///
/// Every series has exactly [`TRIAL_SAMPLES`] samples.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BodypartTrack {
    /// Interpolated x coordinate
    pub x: Vec<f64>,
    /// Interpolated y coordinate
    pub y: Vec<f64>,
    /// Per-step displacement, resampled onto the canonical timeline
    pub distance: Vec<f64>,
    /// Speed at the canonical rate (distance x 30)
    pub speed: Vec<f64>,
}

/// One trial's canonical-timeline table: every tracked body part aligned to
/// the stimulus onset, plus the epoch tagging derived from the sample index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialTimeline {
    /// Trial identifier (e.g. "cs_03")
    pub cs_id: String,
    /// Stimulus onset frame in the native recording
    pub onset: usize,
    /// Aligned series per body part, keyed by body part name
    pub tracks: BTreeMap<String, BodypartTrack>,
}

impl TrialTimeline {
    /// Epoch tag for a canonical sample index
    pub fn epoch_at(&self, index: usize) -> Result<Epoch, AnalysisError> {
        crate::epoch::epoch_of_index(index)
    }
}

/// Freezing summary for one `(cs_id, cs_epoch)` combination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreezingRow {
    pub cs_id: String,
    pub cs_epoch: Epoch,
    /// Frozen samples within the epoch window
    pub freezing_raw: f64,
    /// `freezing_raw / 900`, rounded to 2 decimals
    pub freezing_norm: f64,
}

/// Darting summary for one `(cs_id, cs_epoch)` combination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DartingRow {
    pub cs_id: String,
    pub cs_epoch: Epoch,
    /// Darting samples within the epoch window
    pub darting_raw: f64,
    /// `darting_raw / 900`, rounded to 2 decimals
    pub darting_norm: f64,
    /// Retained darting events starting in this epoch
    pub darting_events: usize,
}

/// Distance summary for one `(cs_id, cs_epoch)` combination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistanceRow {
    pub cs_id: String,
    pub cs_epoch: Epoch,
    /// Total distance covered during the epoch, rounded to 2 decimals
    pub total_distance: f64,
    /// Distance units ("cm" or "px")
    pub units: String,
}

/// Mean-speed summary for one `(cs_id, cs_epoch)` combination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeedRow {
    pub cs_id: String,
    pub cs_epoch: Epoch,
    /// Mean speed during the epoch, rounded to 2 decimals
    pub mean_speed: f64,
    /// Speed units ("cm/sec" or "px/sec")
    pub units: String,
}

/// Round to two decimal places, the precision all summary rows report
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
