//! Tracking session adapter
//!
//! Parses tracking session JSON (animal metadata plus per-body-part
//! coordinate arrays and an optional LED-area series) and validates it
//! before the pipeline consumes it. CSV loading, file naming, and metadata
//! lookup live with external collaborators; this adapter only defines the
//! JSON contract they hand over.

use crate::error::AnalysisError;
use crate::types::AnimalMeta;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Maximum number of CS presentations per recording
pub const MAX_TRIALS: usize = 5;

/// One animal's recording: metadata, raw tracked coordinates per body part,
/// and the optional LED-area series used for onset detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingSession {
    /// Animal and recording metadata
    #[serde(flatten)]
    pub meta: AnimalMeta,
    /// Raw (x, y) coordinates per body part, one pair per frame
    pub bodyparts: BTreeMap<String, Vec<(f64, f64)>>,
    /// Per-frame LED area, if the session recorded one
    #[serde(default)]
    pub led: Option<Vec<f64>>,
}

/// Parse a tracking session JSON string into a validated `TrackingSession`
pub fn parse_session(json: &str) -> Result<TrackingSession, AnalysisError> {
    let session: TrackingSession = serde_json::from_str(json)
        .map_err(|e| AnalysisError::ParseError(format!("Failed to parse tracking session: {e}")))?;
    validate_session(&session)?;
    Ok(session)
}

/// Validate a tracking session.
///
/// Checks the invariants the core relies on: at least one body part with a
/// non-empty coordinate array, equal lengths across body parts, 1 to 5
/// `cs_start` entries, and a positive frame rate. Violations surface
/// immediately; nothing is coerced.
pub fn validate_session(session: &TrackingSession) -> Result<(), AnalysisError> {
    if session.bodyparts.is_empty() {
        return Err(AnalysisError::MissingField("bodyparts".to_string()));
    }

    let mut expected_len = None;
    for (name, points) in &session.bodyparts {
        if points.is_empty() {
            return Err(AnalysisError::InvalidMetadata(format!(
                "bodypart {name} has no coordinates"
            )));
        }
        match expected_len {
            None => expected_len = Some(points.len()),
            Some(len) if len != points.len() => {
                return Err(AnalysisError::LengthMismatch {
                    expected: len,
                    actual: points.len(),
                });
            }
            Some(_) => {}
        }
    }

    let trials = session.meta.cs_start.len();
    if trials == 0 || trials > MAX_TRIALS {
        return Err(AnalysisError::InvalidMetadata(format!(
            "expected 1 to {MAX_TRIALS} cs_start entries, got {trials}"
        )));
    }

    if !(session.meta.frame_rate > 0.0) {
        return Err(AnalysisError::InvalidMetadata(format!(
            "frame_rate must be positive, got {}",
            session.meta.frame_rate
        )));
    }

    Ok(())
}
