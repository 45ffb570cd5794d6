//! Report assembly and encoding
//!
//! Collects per-trial summary rows into one serializable session report with
//! producer and provenance metadata, for the export/visualization layer.

use crate::error::AnalysisError;
use crate::pipeline::TrialAnalysis;
use crate::types::{AnimalMeta, DartingRow, DistanceRow, FreezingRow, SpeedRow};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Producer metadata embedded in every report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

impl ReportProducer {
    fn new() -> Self {
        Self {
            name: crate::PRODUCER_NAME.to_string(),
            version: crate::FEARCOND_VERSION.to_string(),
            instance_id: Uuid::new_v4().to_string(),
        }
    }
}

/// Summary rows for one analyzed trial
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialReport {
    pub cs_id: String,
    pub freezing: Vec<FreezingRow>,
    pub darting: Vec<DartingRow>,
    pub distance: Vec<DistanceRow>,
    pub speed: Vec<SpeedRow>,
}

impl TrialReport {
    /// Extract the summary rows from a trial analysis
    pub fn from_analysis(analysis: &TrialAnalysis) -> Self {
        Self {
            cs_id: analysis.timeline.cs_id.clone(),
            freezing: analysis.freezing.clone(),
            darting: analysis.darting.clone(),
            distance: analysis.distance.clone(),
            speed: analysis.speed.clone(),
        }
    }
}

/// A trial that failed analysis and was skipped
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedTrial {
    pub cs_id: String,
    pub reason: String,
}

/// Complete per-session report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    pub producer: ReportProducer,
    pub animal_id: String,
    pub experiment_id: String,
    pub session: String,
    pub computed_at: DateTime<Utc>,
    pub trials: Vec<TrialReport>,
    pub skipped: Vec<SkippedTrial>,
}

impl SessionReport {
    /// Assemble a report from per-trial results
    pub fn assemble(
        meta: &AnimalMeta,
        trials: Vec<TrialReport>,
        skipped: Vec<SkippedTrial>,
    ) -> Self {
        Self {
            producer: ReportProducer::new(),
            animal_id: meta.animal_id.clone(),
            experiment_id: meta.experiment_id.clone(),
            session: meta.session.clone(),
            computed_at: Utc::now(),
            trials,
            skipped,
        }
    }

    /// Serialize the report to a JSON string
    pub fn to_json(&self) -> Result<String, AnalysisError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Epoch;
    use std::collections::BTreeMap;

    fn make_meta() -> AnimalMeta {
        AnimalMeta {
            animal_id: "M07".to_string(),
            experiment_id: "exp01".to_string(),
            session: "hab02".to_string(),
            species: "mouse".to_string(),
            user: "jcruz".to_string(),
            group: None,
            sex: None,
            date_of_birth: None,
            frame_rate: 30.0,
            cs_start: BTreeMap::new(),
            cs_span_sec: 30.0,
        }
    }

    #[test]
    fn test_report_json_shape() {
        let trial = TrialReport {
            cs_id: "cs_01".to_string(),
            freezing: vec![FreezingRow {
                cs_id: "cs_01".to_string(),
                cs_epoch: Epoch::PreCs,
                freezing_raw: 450.0,
                freezing_norm: 0.5,
            }],
            darting: vec![],
            distance: vec![],
            speed: vec![],
        };
        let report = SessionReport::assemble(&make_meta(), vec![trial], vec![]);
        let json = report.to_json().unwrap();

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["producer"]["name"], "fearcond");
        assert_eq!(value["animal_id"], "M07");
        assert_eq!(value["trials"][0]["freezing"][0]["freezing_norm"], 0.5);
        assert_eq!(value["trials"][0]["freezing"][0]["cs_epoch"], "pre_cs");
        assert!(value["computed_at"].is_string());
    }

    #[test]
    fn test_report_round_trip() {
        let report = SessionReport::assemble(&make_meta(), vec![], vec![]);
        let json = report.to_json().unwrap();
        let loaded: SessionReport = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded.animal_id, report.animal_id);
        assert_eq!(loaded.producer.instance_id, report.producer.instance_id);
    }
}
