//! Personalized sleep-need baseline
//!
//! Three methods, attempted in a fixed order:
//! 1. Median free-day TST (alarm-free sleep is the cleanest signal of
//!    biological need). Free days default to Friday/Saturday/Sunday nights,
//!    or to the day classifier's labels when a map is supplied.
//! 2. Satiation point: the shortest TST bucket whose mean recovery score
//!    clears the threshold.
//! 3. Median TST across all valid days.
//!
//! With fewer than `min_valid_entries` valid nights the population default
//! (8.25h) is returned at low confidence. Method 1 is always tried first
//! even when method 2 could grade higher, because free-day TST is the most
//! physiologically meaningful signal.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};

use crate::config::SleepNeedConfig;
use crate::extract::{total_sleep_hours, tst_entries};
use crate::stats::{mean, median, round_to_tenth};
use crate::types::{
    Confidence, DailyVitalsRecord, DayClassificationMap, NeedMethod, SleepNeedProfile,
};

/// Calculate the personalized sleep need using the Fri/Sat/Sun free-day
/// proxy.
pub fn personalized_sleep_need(
    history: &[DailyVitalsRecord],
    cfg: &SleepNeedConfig,
) -> SleepNeedProfile {
    calculate(history, cfg, is_calendar_free_night)
}

/// Calculate the personalized sleep need with the day classifier's freeday
/// labels instead of the calendar proxy.
pub fn personalized_sleep_need_with_schedule(
    history: &[DailyVitalsRecord],
    schedule: &DayClassificationMap,
    cfg: &SleepNeedConfig,
) -> SleepNeedProfile {
    calculate(history, cfg, |date| schedule.is_free_day(date))
}

/// Friday, Saturday and Sunday nights as a proxy for alarm-free sleep.
fn is_calendar_free_night(date: NaiveDate) -> bool {
    matches!(date.weekday().num_days_from_sunday(), 0 | 5 | 6)
}

fn calculate(
    history: &[DailyVitalsRecord],
    cfg: &SleepNeedConfig,
    is_free_day: impl Fn(NaiveDate) -> bool,
) -> SleepNeedProfile {
    // Most recent valid-TST entries inside the analysis window
    let mut entries = tst_entries(history);
    entries.truncate(cfg.window_days);

    if entries.len() < cfg.min_valid_entries {
        return SleepNeedProfile {
            calculated_need_hours: cfg.default_need_hours,
            confidence: Confidence::Low,
            based_on_days: entries.len(),
            method: NeedMethod::Default,
        };
    }

    if let Some(profile) = free_day_median(&entries, cfg, &is_free_day) {
        return profile;
    }

    if let Some(profile) = satiation_point(history, cfg) {
        return profile;
    }

    // Final fallback: median TST across all valid days
    let all_tst: Vec<f64> = entries.iter().map(|(_, tst)| *tst).collect();
    let need = median(&all_tst).unwrap_or(cfg.default_need_hours);
    SleepNeedProfile {
        calculated_need_hours: clamp_need(need, cfg),
        confidence: Confidence::Low,
        based_on_days: entries.len(),
        method: NeedMethod::HistoricalMedian,
    }
}

/// Method 1: median TST over free days.
fn free_day_median(
    entries: &[(NaiveDate, f64)],
    cfg: &SleepNeedConfig,
    is_free_day: &impl Fn(NaiveDate) -> bool,
) -> Option<SleepNeedProfile> {
    let free_tst: Vec<f64> = entries
        .iter()
        .filter(|(date, _)| is_free_day(*date))
        .map(|(_, tst)| *tst)
        .collect();

    if free_tst.len() < cfg.free_day_min_samples {
        return None;
    }

    let need = median(&free_tst)?;
    let confidence = if free_tst.len() >= cfg.free_day_high_confidence {
        Confidence::High
    } else if free_tst.len() >= cfg.free_day_medium_confidence {
        Confidence::Medium
    } else {
        Confidence::Low
    };

    Some(SleepNeedProfile {
        calculated_need_hours: clamp_need(need, cfg),
        confidence,
        based_on_days: free_tst.len(),
        method: NeedMethod::HistoricalMedian,
    })
}

/// Method 2: lowest TST bucket whose mean recovery clears the threshold.
fn satiation_point(
    history: &[DailyVitalsRecord],
    cfg: &SleepNeedConfig,
) -> Option<SleepNeedProfile> {
    let pairs: Vec<(f64, f64)> = history
        .iter()
        .filter_map(|r| {
            let tst = total_sleep_hours(r)?;
            let recovery = r.recovery_score.filter(|s| s.is_finite() && *s >= 0.0)?;
            Some((tst, recovery))
        })
        .collect();

    if pairs.len() < cfg.satiation_min_entries {
        return None;
    }

    // Bucket by TST; BTreeMap keeps buckets sorted so the first qualifying
    // bucket is the lowest sleep duration that satisfies recovery.
    let mut buckets: BTreeMap<i64, Vec<f64>> = BTreeMap::new();
    for (tst, recovery) in &pairs {
        let key = (tst / cfg.satiation_bucket_hours).floor() as i64;
        buckets.entry(key).or_default().push(*recovery);
    }

    let satiation_key = buckets.iter().find_map(|(key, recoveries)| {
        if recoveries.len() < cfg.satiation_min_bucket_points {
            return None;
        }
        let avg = mean(recoveries)?;
        (avg >= cfg.satiation_recovery_threshold).then_some(*key)
    })?;

    let need = satiation_key as f64 * cfg.satiation_bucket_hours + cfg.satiation_bucket_hours / 2.0;
    let confidence = if pairs.len() >= cfg.satiation_medium_confidence {
        Confidence::Medium
    } else {
        Confidence::Low
    };

    Some(SleepNeedProfile {
        calculated_need_hours: clamp_need(need, cfg),
        confidence,
        based_on_days: pairs.len(),
        method: NeedMethod::SatiationPoint,
    })
}

fn clamp_need(need: f64, cfg: &SleepNeedConfig) -> f64 {
    round_to_tenth(need.clamp(cfg.min_need_hours, cfg.max_need_hours))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DayType;

    fn record_with_tst(date: NaiveDate, tst_hours: f64) -> DailyVitalsRecord {
        let mut record = DailyVitalsRecord::new(date);
        // Split TST across stages in a fixed ratio
        record.deep_sleep_minutes = Some(tst_hours * 60.0 * 0.2);
        record.rem_sleep_minutes = Some(tst_hours * 60.0 * 0.25);
        record.light_sleep_minutes = Some(tst_hours * 60.0 * 0.55);
        record
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_default_below_seven_entries() {
        let history: Vec<DailyVitalsRecord> = (0..5)
            .map(|i| record_with_tst(date(2024, 3, 1) + chrono::Duration::days(i), 7.5))
            .collect();
        let profile = personalized_sleep_need(&history, &SleepNeedConfig::default());
        assert_eq!(profile.method, NeedMethod::Default);
        assert_eq!(profile.calculated_need_hours, 8.25);
        assert_eq!(profile.confidence, Confidence::Low);
        assert_eq!(profile.based_on_days, 5);
    }

    #[test]
    fn test_free_day_median_preferred() {
        // 28 days: free nights 8.5h, work nights 6.5h
        let history: Vec<DailyVitalsRecord> = (0..28)
            .map(|i| {
                let d = date(2024, 3, 1) + chrono::Duration::days(i);
                let tst = if is_calendar_free_night(d) { 8.5 } else { 6.5 };
                record_with_tst(d, tst)
            })
            .collect();
        let profile = personalized_sleep_need(&history, &SleepNeedConfig::default());
        assert_eq!(profile.method, NeedMethod::HistoricalMedian);
        assert_eq!(profile.calculated_need_hours, 8.5);
        // 28 days contain 12 Fri/Sat/Sun nights -> high confidence
        assert_eq!(profile.confidence, Confidence::High);
        assert_eq!(profile.based_on_days, 12);
    }

    #[test]
    fn test_free_day_median_clamped() {
        let history: Vec<DailyVitalsRecord> = (0..28)
            .map(|i| {
                let d = date(2024, 3, 1) + chrono::Duration::days(i);
                let tst = if is_calendar_free_night(d) { 11.5 } else { 7.0 };
                record_with_tst(d, tst)
            })
            .collect();
        let profile = personalized_sleep_need(&history, &SleepNeedConfig::default());
        assert_eq!(profile.calculated_need_hours, 10.0);
    }

    #[test]
    fn test_satiation_point_fallback() {
        // Only Monday-Thursday nights (no free days), with recovery scores:
        // short nights recover poorly, nights >= 7.5h recover well.
        let mut history = Vec::new();
        let mut d = date(2024, 3, 4); // a Monday
        let mut i = 0;
        while history.len() < 20 {
            if !is_calendar_free_night(d) {
                let tst = 6.0 + f64::from(i % 5) * 0.5; // 6.0 .. 8.0
                let mut record = record_with_tst(d, tst);
                record.recovery_score = Some(if tst >= 7.5 { 82.0 } else { 55.0 });
                history.push(record);
                i += 1;
            }
            d += chrono::Duration::days(1);
        }
        let profile = personalized_sleep_need(&history, &SleepNeedConfig::default());
        assert_eq!(profile.method, NeedMethod::SatiationPoint);
        // Lowest qualifying bucket is [7.5, 8.0) -> midpoint 7.75 -> 7.8
        assert_eq!(profile.calculated_need_hours, 7.8);
        assert_eq!(profile.confidence, Confidence::Medium);
    }

    #[test]
    fn test_all_days_median_final_fallback() {
        // 10 weeknights, no recovery scores: methods 1 and 2 both unavailable
        let mut history = Vec::new();
        let mut d = date(2024, 3, 4);
        while history.len() < 10 {
            if !is_calendar_free_night(d) {
                history.push(record_with_tst(d, 7.0));
            }
            d += chrono::Duration::days(1);
        }
        let profile = personalized_sleep_need(&history, &SleepNeedConfig::default());
        assert_eq!(profile.method, NeedMethod::HistoricalMedian);
        assert_eq!(profile.confidence, Confidence::Low);
        assert_eq!(profile.calculated_need_hours, 7.0);
    }

    #[test]
    fn test_schedule_informed_free_days() {
        // Classifier says Wednesday is free (e.g. shift worker)
        let mut day_types = [DayType::Workday; 7];
        day_types[3] = DayType::Freeday;
        let schedule = DayClassificationMap::new(day_types);

        let history: Vec<DailyVitalsRecord> = (0..28)
            .map(|i| {
                let d = date(2024, 3, 1) + chrono::Duration::days(i);
                let tst = if schedule.is_free_day(d) { 9.0 } else { 6.8 };
                record_with_tst(d, tst)
            })
            .collect();

        let profile = personalized_sleep_need_with_schedule(
            &history,
            &schedule,
            &SleepNeedConfig::default(),
        );
        assert_eq!(profile.method, NeedMethod::HistoricalMedian);
        assert_eq!(profile.calculated_need_hours, 9.0);
        // Four Wednesdays in 28 days -> above the 4-sample gate, below medium
        assert_eq!(profile.confidence, Confidence::Low);
        assert_eq!(profile.based_on_days, 4);
    }
}
