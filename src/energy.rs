//! Energy-curve generation and dynamic daily need
//!
//! The terminal consumer of every upstream output: composes the chronotype
//! profile, current sleep debt, and optional naps into a 24-hour predicted
//! energy curve (96 points at 15-minute resolution), classifies each point
//! into a zone, and searches the remaining day for the next peak and dip.
//! Also decomposes today's sleep need into baseline, strain, debt and nap
//! terms.

use serde::{Deserialize, Serialize};

use crate::config::{DynamicNeedConfig, EnergyCurveConfig};
use crate::stats::round_to_tenth;
use crate::two_process::{
    apply_debt_penalty, debt_penalty_pct, energy, process_s_decay, process_s_rising,
    CircadianOscillator,
};
use crate::types::{
    ChronotypeProfile, CircadianPoint, CurveExtremum, DailyNeedContext, DailySleepNeedBreakdown,
    EnergyCurve, EnergyZone,
};

/// Points on the daily curve (24h at 15-minute spacing).
pub const CURVE_POINTS: usize = 96;

/// Spacing between curve points, in hours.
pub const CURVE_STEP_HOURS: f64 = 0.25;

/// A daytime nap to overlay on the curve.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Nap {
    /// Local clock hour the nap starts, [0, 24)
    pub start_hour: f64,
    pub duration_minutes: f64,
}

impl Nap {
    pub fn end_hour(&self) -> f64 {
        self.start_hour + self.duration_minutes / 60.0
    }
}

/// Generate the 24-hour predicted-energy curve.
///
/// `now_hour` is the local clock hour the caller considers "now"; it selects
/// the current point and anchors the peak/dip search.
pub fn generate_energy_curve(
    profile: &ChronotypeProfile,
    debt_hours: f64,
    now_hour: f64,
    naps: &[Nap],
    cfg: &EnergyCurveConfig,
) -> EnergyCurve {
    let oscillator = CircadianOscillator::new(profile.circadian_nadir_hour, &cfg.two_process);
    let s0 = cfg.two_process.initial_pressure;
    let wake = profile.average_wake_hour;

    // Baseline Process S: pressure rises from wake; pre-wake hours clamp to
    // zero time awake.
    let mut pressure: Vec<f64> = (0..CURVE_POINTS)
        .map(|i| {
            let hour = i as f64 * CURVE_STEP_HOURS;
            process_s_rising((hour - wake).max(0.0), s0, &cfg.two_process)
        })
        .collect();

    overlay_naps(&mut pressure, naps, cfg);

    let penalty_pct = debt_penalty_pct(debt_hours, &cfg.two_process);

    let points: Vec<CircadianPoint> = pressure
        .iter()
        .enumerate()
        .map(|(i, &s)| {
            let hour = i as f64 * CURVE_STEP_HOURS;
            let c = oscillator.value(hour);
            let adjusted = apply_debt_penalty(energy(s, c, &cfg.two_process), penalty_pct);
            CircadianPoint {
                hour,
                process_s: s,
                process_c: c,
                energy: adjusted,
                zone: classify_zone(hour, adjusted, profile, cfg),
            }
        })
        .collect();

    let now_index = nearest_index(now_hour);
    let current = &points[now_index];

    EnergyCurve {
        current_energy: current.energy,
        current_zone: current.zone,
        next_peak: find_next_extremum(&points, now_index, Extremum::Peak),
        next_dip: find_next_extremum(&points, now_index, Extremum::Dip),
        melatonin_window: profile.melatonin_window,
        wake_hour: wake,
        sleep_debt_penalty_pct: penalty_pct,
        points,
    }
}

/// Decompose today's sleep need into its terms.
pub fn daily_sleep_need(
    baseline_hours: f64,
    context: &DailyNeedContext,
    cfg: &DynamicNeedConfig,
) -> DailySleepNeedBreakdown {
    let strain_addition_hours = match (
        context.training_load_yesterday,
        context.training_load_average,
    ) {
        (Some(yesterday), Some(average)) => {
            let excess = (yesterday - average).max(0.0);
            (excess * cfg.strain_minutes_per_load / 60.0).min(cfg.strain_cap_hours)
        }
        _ => 0.0,
    };

    let debt_addition_hours = context
        .current_debt_hours
        .max(0.0)
        .min(cfg.debt_cap_hours);

    let nap_subtraction_hours = context.nap_minutes_today.max(0.0) / 60.0;

    let total_need_hours = round_to_tenth(
        (baseline_hours + strain_addition_hours + debt_addition_hours - nap_subtraction_hours)
            .max(cfg.min_need_hours),
    );

    DailySleepNeedBreakdown {
        baseline_hours,
        strain_addition_hours,
        debt_addition_hours,
        nap_subtraction_hours,
        total_need_hours,
        context: context.clone(),
    }
}

/// Re-walk Process S for each nap: pressure decays across the nap, then
/// wakefulness resumes from the reduced post-nap value for every later
/// point. Naps are applied in chronological order so a second nap sees the
/// relief from the first.
fn overlay_naps(pressure: &mut [f64], naps: &[Nap], cfg: &EnergyCurveConfig) {
    let mut ordered: Vec<Nap> = naps
        .iter()
        .copied()
        .filter(|n| {
            n.duration_minutes > 0.0 && (0.0..24.0).contains(&n.start_hour)
        })
        .collect();
    ordered.sort_by(|a, b| {
        a.start_hour
            .partial_cmp(&b.start_hour)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    for nap in ordered {
        let start_index = nearest_index(nap.start_hour);
        let s_at_start = pressure[start_index];
        let end_hour = nap.end_hour();
        let post_nap_s =
            process_s_decay(nap.duration_minutes / 60.0, s_at_start, &cfg.two_process);

        for (i, slot) in pressure.iter_mut().enumerate() {
            let hour = i as f64 * CURVE_STEP_HOURS;
            if hour >= nap.start_hour && hour < end_hour {
                *slot = process_s_decay(hour - nap.start_hour, s_at_start, &cfg.two_process);
            } else if hour >= end_hour {
                *slot = process_s_rising(hour - end_hour, post_nap_s, &cfg.two_process);
            }
        }
    }
}

/// Zone classification, evaluated in precedence order: sleep window, peak,
/// dip, melatonin wind-down, rising.
fn classify_zone(
    hour: f64,
    adjusted_energy: f64,
    profile: &ChronotypeProfile,
    cfg: &EnergyCurveConfig,
) -> EnergyZone {
    if in_sleep_window(hour, profile.average_sleep_hour, profile.average_wake_hour) {
        EnergyZone::Sleep
    } else if adjusted_energy >= cfg.peak_threshold {
        EnergyZone::Peak
    } else if adjusted_energy <= cfg.dip_threshold {
        EnergyZone::Dip
    } else if profile.melatonin_window.contains(hour) {
        EnergyZone::WindDown
    } else {
        EnergyZone::Rising
    }
}

/// Whether an hour falls between expected bedtime and wake, handling the
/// usual bedtime > wake midnight wrap.
fn in_sleep_window(hour: f64, bed_hour: f64, wake_hour: f64) -> bool {
    if bed_hour > wake_hour {
        hour >= bed_hour || hour < wake_hour
    } else {
        hour >= bed_hour && hour < wake_hour
    }
}

fn nearest_index(hour: f64) -> usize {
    let idx = (hour.rem_euclid(24.0) / CURVE_STEP_HOURS).round() as usize;
    idx % CURVE_POINTS
}

#[derive(Clone, Copy, PartialEq)]
enum Extremum {
    Peak,
    Dip,
}

/// First strict local extremum strictly after `now_index`; falls back to
/// the global extremum of the remaining window when the curve is monotone.
fn find_next_extremum(
    points: &[CircadianPoint],
    now_index: usize,
    kind: Extremum,
) -> Option<CurveExtremum> {
    let start = now_index + 1;
    if start >= points.len() {
        return None;
    }

    let better = |a: f64, b: f64| match kind {
        Extremum::Peak => a > b,
        Extremum::Dip => a < b,
    };

    for i in start.max(1)..points.len().saturating_sub(1) {
        let e = points[i].energy;
        if better(e, points[i - 1].energy) && better(e, points[i + 1].energy) {
            return Some(CurveExtremum {
                hour: points[i].hour,
                energy: e,
            });
        }
    }

    // No strict local extremum left: take the best of the remaining window
    points[start..]
        .iter()
        .reduce(|best, p| if better(p.energy, best.energy) { p } else { best })
        .map(|p| CurveExtremum {
            hour: p.hour,
            energy: p.energy,
        })
}
