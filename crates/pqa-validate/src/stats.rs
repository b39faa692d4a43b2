//! Robust statistics for outlier detection.

/// Scale factor relating the MAD to the standard deviation of a normal distribution.
pub const MAD_SCALE: f64 = 0.6745;

/// Median of `values`. Even-length inputs average the two middle values.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Median absolute deviation around `center`.
pub fn median_absolute_deviation(values: &[f64], center: f64) -> Option<f64> {
    let deviations: Vec<f64> = values.iter().map(|v| (v - center).abs()).collect();
    median(&deviations)
}

/// Modified z-score `0.6745 (x - m) / MAD`. `None` when `mad` is zero.
pub fn modified_z(value: f64, median: f64, mad: f64) -> Option<f64> {
    if mad == 0.0 {
        return None;
    }
    Some(MAD_SCALE * (value - median) / mad)
}
