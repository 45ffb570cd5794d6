//! Fearcond - batch compute engine for fear-conditioning behavioral metrics
//!
//! Fearcond transforms raw behavioral-tracking data (video-derived body-part
//! coordinates and an LED-based stimulus signal) into per-animal, per-trial
//! summary metrics through a deterministic pipeline: onset-anchored
//! alignment → distance/speed derivation → event segmentation → epoch
//! aggregation → report encoding.
//!
//! ## Modules
//!
//! - **align**: resampling onto the canonical 30 Hz trial timeline
//! - **segment**: freezing/darting run detection and gating
//! - **epoch**: per-epoch (pre/peri/post-CS) aggregation
//! - **onset**: LED-based stimulus-onset candidates and frame-rate estimation

pub mod adapter;
pub mod align;
pub mod epoch;
pub mod error;
pub mod motion;
pub mod onset;
pub mod pipeline;
pub mod report;
pub mod segment;
pub mod smooth;
pub mod types;

pub use adapter::{parse_session, TrackingSession};
pub use error::AnalysisError;
pub use pipeline::{analyze_trial, session_to_report, AnalysisConfig, SessionProcessor};
pub use report::SessionReport;
pub use types::{AnimalMeta, Epoch, TrialTimeline};

/// Fearcond version embedded in all reports
pub const FEARCOND_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for reports
pub const PRODUCER_NAME: &str = "fearcond";
