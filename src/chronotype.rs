//! Chronotype analysis
//!
//! Derives a personal circadian profile from recent sleep timing, following
//! the MCTQ approach: median wake and sleep-onset clock times over the last
//! two weeks, a nadir placed a fixed offset before habitual wake, the
//! acrophase opposite it, and a melatonin window ending at habitual sleep
//! onset.

use crate::config::{ChronotypeConfig, ExtractConfig};
use crate::extract::{sleep_onset_samples, wake_samples, ClockSample};
use crate::stats::{median_clock_hour, wrap_hour};
use crate::types::{Chronotype, ChronotypeProfile, Confidence, DailyVitalsRecord, MelatoninWindow};

/// Analyze the history into a chronotype profile.
///
/// Returns `None` when fewer than `cfg.min_days` valid wake or sleep samples
/// exist in the window — the caller should treat that as "insufficient
/// data", not as an error.
pub fn analyze_chronotype(
    history: &[DailyVitalsRecord],
    cfg: &ChronotypeConfig,
    extract: &ExtractConfig,
) -> Option<ChronotypeProfile> {
    let wake = recent_window(wake_samples(history, extract), cfg.window_days);
    let sleep = recent_window(sleep_onset_samples(history, extract), cfg.window_days);

    if wake.len() < cfg.min_days || sleep.len() < cfg.min_days {
        return None;
    }

    let wake_hours: Vec<f64> = wake.iter().map(|s| s.hour).collect();
    let sleep_hours: Vec<f64> = sleep.iter().map(|s| s.hour).collect();

    let average_wake_hour = median_clock_hour(&wake_hours)?;
    let average_sleep_hour = median_clock_hour(&sleep_hours)?;

    let circadian_nadir_hour = wrap_hour(average_wake_hour - cfg.nadir_offset_hours);
    let circadian_acrophase_hour = wrap_hour(circadian_nadir_hour + cfg.acrophase_offset_hours);
    let melatonin_window = MelatoninWindow {
        start_hour: wrap_hour(average_sleep_hour - cfg.melatonin_window_hours),
        end_hour: average_sleep_hour,
    };

    let based_on_days = wake.len().min(sleep.len());

    Some(ChronotypeProfile {
        average_wake_hour,
        average_sleep_hour,
        circadian_nadir_hour,
        circadian_acrophase_hour,
        melatonin_window,
        chronotype: classify_wake_hour(average_wake_hour, cfg),
        based_on_days,
        confidence: grade_confidence(based_on_days, cfg.min_days),
    })
}

/// Classify a median wake hour against the configured boundaries.
pub fn classify_wake_hour(wake_hour: f64, cfg: &ChronotypeConfig) -> Chronotype {
    if wake_hour < cfg.early_wake_boundary_hour {
        Chronotype::Early
    } else if wake_hour > cfg.late_wake_boundary_hour {
        Chronotype::Late
    } else {
        Chronotype::Intermediate
    }
}

/// Confidence grade from sample count.
///
/// The low branch is unreachable through `analyze_chronotype` (the null gate
/// fires first) but stays defined for callers reusing this with a lower gate.
pub fn grade_confidence(based_on_days: usize, min_days: usize) -> Confidence {
    if based_on_days >= 2 * min_days {
        Confidence::High
    } else if based_on_days >= min_days {
        Confidence::Medium
    } else {
        Confidence::Low
    }
}

fn recent_window(mut samples: Vec<ClockSample>, window_days: usize) -> Vec<ClockSample> {
    samples.truncate(window_days);
    samples
}
