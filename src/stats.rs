//! Statistical primitives
//!
//! Small numeric helpers shared by every analysis stage:
//! - mean / median / sample standard deviation with empty-input guards
//! - midnight-aware median for clock times
//! - exponential decay weighting for recency-biased accumulation
//! - hour wrapping and rounding

/// Minutes in one day.
pub const MINUTES_PER_DAY: f64 = 24.0 * 60.0;

/// Hours in one day.
pub const HOURS_PER_DAY: f64 = 24.0;

/// Samples earlier than this (minutes since midnight) count as the
/// early-morning side of a midnight straddle.
const STRADDLE_EARLY_MINUTES: f64 = 3.0 * 60.0;

/// Samples later than this count as the late-evening side.
const STRADDLE_LATE_MINUTES: f64 = 21.0 * 60.0;

/// Arithmetic mean. `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let sum: f64 = values.iter().sum();
    Some(sum / values.len() as f64)
}

/// Median of the values. `None` for an empty slice.
///
/// Even-length inputs return the average of the two middle values.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Sample standard deviation (n − 1 denominator). `None` below two samples.
pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let sum_sq: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some((sum_sq / (values.len() - 1) as f64).sqrt())
}

/// Median of clock times given as minutes since local midnight, aware of the
/// midnight wrap.
///
/// When the sample set straddles midnight (some values earlier than 03:00 and
/// some later than 21:00), the early-morning cluster is shifted by +24h before
/// taking the median, and the result is wrapped back into `[0, 1440)`. A naive
/// median over {23:30, 00:15, 23:45} would land near midday; this returns a
/// value in the 23:30–00:15 band.
pub fn median_clock_minutes(minutes: &[f64]) -> Option<f64> {
    if minutes.is_empty() {
        return None;
    }

    let has_early = minutes.iter().any(|&m| m < STRADDLE_EARLY_MINUTES);
    let has_late = minutes.iter().any(|&m| m > STRADDLE_LATE_MINUTES);

    let adjusted: Vec<f64> = if has_early && has_late {
        minutes
            .iter()
            .map(|&m| {
                if m < MINUTES_PER_DAY / 2.0 {
                    m + MINUTES_PER_DAY
                } else {
                    m
                }
            })
            .collect()
    } else {
        minutes.to_vec()
    };

    median(&adjusted).map(|m| m % MINUTES_PER_DAY)
}

/// Midnight-aware median over clock hours, returned in `[0, 24)`.
pub fn median_clock_hour(hours: &[f64]) -> Option<f64> {
    let minutes: Vec<f64> = hours.iter().map(|h| h * 60.0).collect();
    median_clock_minutes(&minutes).map(|m| m / 60.0)
}

/// Exponential decay weight `exp(−λ·index)` for recency-biased sums.
///
/// Index 0 (the most recent sample) has weight 1.0.
pub fn decay_weight(index: usize, lambda: f64) -> f64 {
    (-lambda * index as f64).exp()
}

/// Wrap an hour value into `[0, 24)`.
pub fn wrap_hour(hour: f64) -> f64 {
    hour.rem_euclid(HOURS_PER_DAY)
}

/// Round to one decimal place.
pub fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
