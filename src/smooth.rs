//! Local-polynomial smoothing
//!
//! Savitzky-Golay smoothing with polynomial order 1, used to suppress
//! tracking jitter in speed series before darting detection. For an order-1
//! fit on a symmetric window the fitted value at the center equals the window
//! mean, so the interior is a centered moving average; the first and last
//! half-window samples are taken from a least-squares line fitted to the
//! terminal window, matching scipy's `savgol_filter(..., mode='interp')`.

/// Smoothing window applied to speed series (9 samples, 0.3 s at 30 Hz)
pub const SPEED_SMOOTHING_WINDOW: usize = 9;

/// Savitzky-Golay filter, polynomial order 1.
///
/// `window` must be odd. Output always has the same length as the input.
/// Series shorter than the window degrade to a single line fit; fewer than
/// two samples are returned unchanged. Constant and linear inputs are
/// preserved exactly.
pub fn savgol_linear(values: &[f64], window: usize) -> Vec<f64> {
    let n = values.len();
    if n < 2 {
        return values.to_vec();
    }

    let window = window.min(if n % 2 == 0 { n - 1 } else { n }).max(3);
    let half = window / 2;

    if n < window {
        let (intercept, slope) = linear_fit(values);
        return (0..n).map(|t| intercept + slope * t as f64).collect();
    }

    let mut smoothed = vec![0.0; n];

    // Interior: centered window mean
    for i in half..n - half {
        let sum: f64 = values[i - half..=i + half].iter().sum();
        smoothed[i] = sum / window as f64;
    }

    // Leading edge: line fit over the first window
    let (intercept, slope) = linear_fit(&values[..window]);
    for (t, slot) in smoothed.iter_mut().take(half).enumerate() {
        *slot = intercept + slope * t as f64;
    }

    // Trailing edge: line fit over the last window
    let (intercept, slope) = linear_fit(&values[n - window..]);
    for (offset, slot) in smoothed.iter_mut().skip(n - half).enumerate() {
        let t = (window - half + offset) as f64;
        *slot = intercept + slope * t;
    }

    smoothed
}

/// Least-squares line fit at positions 0..m-1, returning (intercept, slope)
fn linear_fit(values: &[f64]) -> (f64, f64) {
    let m = values.len() as f64;
    let t_mean = (m - 1.0) / 2.0;
    let y_mean = values.iter().sum::<f64>() / m;

    let mut numerator = 0.0;
    let mut denominator = 0.0;
    for (t, y) in values.iter().enumerate() {
        let dt = t as f64 - t_mean;
        numerator += dt * (y - y_mean);
        denominator += dt * dt;
    }

    if denominator == 0.0 {
        return (y_mean, 0.0);
    }
    let slope = numerator / denominator;
    (y_mean - slope * t_mean, slope)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_preserved() {
        let values = vec![3.5; 40];
        let smoothed = savgol_linear(&values, SPEED_SMOOTHING_WINDOW);
        assert_eq!(smoothed.len(), values.len());
        for v in smoothed {
            assert!((v - 3.5).abs() < 1e-12);
        }
    }

    #[test]
    fn test_linear_preserved() {
        // An order-1 smoother reproduces a linear series exactly,
        // edges included
        let values: Vec<f64> = (0..50).map(|i| 2.0 * i as f64 - 7.0).collect();
        let smoothed = savgol_linear(&values, SPEED_SMOOTHING_WINDOW);
        for (s, v) in smoothed.iter().zip(values.iter()) {
            assert!((s - v).abs() < 1e-9);
        }
    }

    #[test]
    fn test_interior_is_window_mean() {
        let values: Vec<f64> = (0..20).map(|i| (i % 3) as f64).collect();
        let smoothed = savgol_linear(&values, 9);
        let expected: f64 = values[6 - 4..=6 + 4].iter().sum::<f64>() / 9.0;
        assert!((smoothed[6] - expected).abs() < 1e-12);
    }

    #[test]
    fn test_short_series_clamps_window() {
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let smoothed = savgol_linear(&values, 9);
        assert_eq!(smoothed.len(), 5);
        for (s, v) in smoothed.iter().zip(values.iter()) {
            assert!((s - v).abs() < 1e-9);
        }
    }

    #[test]
    fn test_length_never_changes() {
        for n in 0..30 {
            let values: Vec<f64> = (0..n).map(|i| i as f64).collect();
            assert_eq!(savgol_linear(&values, 9).len(), n);
        }
    }
}
