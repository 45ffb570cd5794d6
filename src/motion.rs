//! Distance and speed derivation
//!
//! Frame-to-frame Euclidean displacement from tracked (x, y) coordinates,
//! optional pixel-to-cm conversion, and speed at a given frame rate. These
//! feed both the darting detector and the per-epoch aggregators.

use crate::types::{ARENA_CM, ARENA_PIXELS};

/// Per-step Euclidean displacement between consecutive coordinate pairs.
///
/// Returns a sequence of length N-1. Zero- or single-sample input yields an
/// empty output, not an error.
///
/// # Arguments
/// * `points` - Tracked (x, y) coordinates, one pair per frame
/// * `convert` - Convert pixel units to cm using the arena calibration
///   (28 cm = 330 px)
pub fn euclidean_distance(points: &[(f64, f64)], convert: bool) -> Vec<f64> {
    if points.len() < 2 {
        return Vec::new();
    }

    let mut distances = Vec::with_capacity(points.len() - 1);
    for pair in points.windows(2) {
        let (x1, y1) = pair[0];
        let (x2, y2) = pair[1];
        let mut d = ((x2 - x1).powi(2) + (y2 - y1).powi(2)).sqrt();
        if convert {
            d = pixels_to_cm(d);
        }
        distances.push(d);
    }
    distances
}

/// Convert a pixel displacement to cm: 28 cm = 330 px
pub fn pixels_to_cm(pixels: f64) -> f64 {
    pixels * ARENA_CM / ARENA_PIXELS
}

/// Speed per frame: displacement divided by the frame period `1/rate`.
pub fn speed_per_frame(distance: &[f64], frame_rate: f64) -> Vec<f64> {
    distance.iter().map(|d| d * frame_rate).collect()
}
