//! Rolling sleep-debt accounting
//!
//! Exponentially-weighted deficit accumulation over a 14-day window:
//! yesterday weighs `exp(0) = 1`, each older day geometrically less. Two
//! modeling rules are deliberate and must not be "fixed":
//! - surplus nights never offset deficits (no banking sleep), they only
//!   appear in the breakdown with a zero contribution;
//! - days with no sleep data are imputed as exactly meeting need, so a sync
//!   gap is neutral rather than a phantom deficit.

use std::collections::HashMap;

use chrono::{Duration, NaiveDate};

use crate::config::{SleepDebtConfig, SleepNeedConfig};
use crate::extract::tst_entries;
use crate::stats::{decay_weight, round_to_tenth};
use crate::types::{DailyDebtEntry, DailyVitalsRecord, DebtCategory, SleepDebtResult};

/// Compute the rolling sleep debt, anchored at the most recent record date
/// (that date becomes day index 0).
///
/// An empty or all-invalid history yields a zero-debt result with an empty
/// breakdown.
pub fn sleep_debt_detailed(
    history: &[DailyVitalsRecord],
    sleep_need_hours: f64,
    cfg: &SleepDebtConfig,
) -> SleepDebtResult {
    let latest = history.iter().map(|r| r.date).max();
    match latest {
        Some(latest) => sleep_debt_as_of(history, sleep_need_hours, latest + Duration::days(1), cfg),
        None => empty_result(),
    }
}

/// Compute the rolling sleep debt as seen from `as_of` (typically "today"):
/// day index 0 is the night ending on `as_of - 1 day`.
pub fn sleep_debt_as_of(
    history: &[DailyVitalsRecord],
    sleep_need_hours: f64,
    as_of: NaiveDate,
    cfg: &SleepDebtConfig,
) -> SleepDebtResult {
    let tst_by_date: HashMap<NaiveDate, f64> = tst_entries(history).into_iter().collect();

    let mut daily_breakdown = Vec::with_capacity(cfg.window_days);
    let mut weighted_sum = 0.0;

    for day_index in 0..cfg.window_days {
        let date = as_of - Duration::days(day_index as i64 + 1);
        let recorded = tst_by_date.get(&date).copied();
        let imputed = recorded.is_none();
        // Missing nights count as exactly meeting need: zero deviation
        let tst_hours = recorded.unwrap_or(sleep_need_hours);

        let deviation_hours = sleep_need_hours - tst_hours;
        let weight = decay_weight(day_index, cfg.decay_lambda);
        // Only deficits accumulate; surpluses are recorded but contribute zero
        let weighted_debt_hours = if deviation_hours > 0.0 {
            deviation_hours * weight
        } else {
            0.0
        };
        weighted_sum += weighted_debt_hours;

        daily_breakdown.push(DailyDebtEntry {
            date,
            tst_hours,
            need_hours: sleep_need_hours,
            deviation_hours,
            weight,
            weighted_debt_hours,
            imputed,
        });
    }

    let total_debt_hours = round_to_tenth(weighted_sum).max(0.0);

    SleepDebtResult {
        total_debt_hours,
        category: categorize(total_debt_hours, cfg),
        payback_nights: total_debt_hours.ceil() as u32,
        daily_breakdown,
    }
}

/// Simplified entry point: derives the personalized need first when the
/// caller does not supply one.
pub fn sleep_debt_with_personalized_need(
    history: &[DailyVitalsRecord],
    personalized_need_hours: Option<f64>,
    cfg: &SleepDebtConfig,
    need_cfg: &SleepNeedConfig,
) -> SleepDebtResult {
    let need = personalized_need_hours.unwrap_or_else(|| {
        crate::need::personalized_sleep_need(history, need_cfg).calculated_need_hours
    });
    sleep_debt_detailed(history, need, cfg)
}

fn categorize(total_debt_hours: f64, cfg: &SleepDebtConfig) -> DebtCategory {
    if total_debt_hours <= cfg.low_max_hours {
        DebtCategory::Low
    } else if total_debt_hours <= cfg.moderate_max_hours {
        DebtCategory::Moderate
    } else if total_debt_hours <= cfg.high_max_hours {
        DebtCategory::High
    } else {
        DebtCategory::Critical
    }
}

fn empty_result() -> SleepDebtResult {
    SleepDebtResult {
        total_debt_hours: 0.0,
        category: DebtCategory::Low,
        payback_nights: 0,
        daily_breakdown: Vec::new(),
    }
}
