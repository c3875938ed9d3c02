//! Workday/freeday inference
//!
//! Classifies each weekday as workday or freeday from wake-time variance:
//! alarm-driven mornings cluster tightly and early, alarm-free mornings
//! spread late. Weekdays without enough evidence fall back to the calendar
//! (Saturday/Sunday free).
//!
//! The weekday is always taken from the entry's calendar date, never from a
//! timestamp, so a wake instant just past local midnight cannot skew the
//! grouping.

use chrono::Datelike;

use crate::config::{DayClassifierConfig, ExtractConfig};
use crate::extract::wake_samples;
use crate::stats::{mean, sample_std_dev};
use crate::types::{
    ClassificationReadiness, DailyVitalsRecord, DayClassificationMap, DayOfWeekStats, DayType,
};

/// Infer a complete weekday classification map from wake-time patterns.
pub fn classify_days(
    history: &[DailyVitalsRecord],
    cfg: &DayClassifierConfig,
    extract: &ExtractConfig,
) -> DayClassificationMap {
    let (map, _) = classify_days_with_stats(history, cfg, extract);
    map
}

/// Infer the classification map and expose the per-weekday statistics that
/// produced it.
pub fn classify_days_with_stats(
    history: &[DailyVitalsRecord],
    cfg: &DayClassifierConfig,
    extract: &ExtractConfig,
) -> (DayClassificationMap, Vec<DayOfWeekStats>) {
    let samples = wake_samples(history, extract);

    let mut by_weekday: [Vec<f64>; 7] = Default::default();
    for sample in &samples {
        let weekday = sample.date.weekday().num_days_from_sunday() as usize;
        by_weekday[weekday].push(sample.hour);
    }

    let all_hours: Vec<f64> = samples.iter().map(|s| s.hour).collect();
    let global_mean = mean(&all_hours);

    let fallback = DayClassificationMap::calendar_fallback();
    let mut day_types = [DayType::Workday; 7];
    let mut stats = Vec::with_capacity(7);

    for weekday in 0..7u8 {
        let hours = &by_weekday[weekday as usize];
        let mean_wake_hour = mean(hours);
        let std_dev_minutes = sample_std_dev(hours).map(|sd| sd * 60.0);

        let inferred = infer_day_type(
            weekday,
            hours.len(),
            mean_wake_hour,
            std_dev_minutes,
            global_mean,
            cfg,
            &fallback,
        );
        day_types[weekday as usize] = inferred;

        stats.push(DayOfWeekStats {
            weekday,
            mean_wake_hour,
            std_dev_minutes,
            sample_count: hours.len(),
            inferred_day_type: inferred,
        });
    }

    (DayClassificationMap::new(day_types), stats)
}

fn infer_day_type(
    weekday: u8,
    sample_count: usize,
    mean_wake_hour: Option<f64>,
    std_dev_minutes: Option<f64>,
    global_mean: Option<f64>,
    cfg: &DayClassifierConfig,
    fallback: &DayClassificationMap,
) -> DayType {
    let calendar = fallback.day_type(weekday);

    if sample_count < cfg.min_samples_per_weekday {
        return calendar;
    }

    match (mean_wake_hour, std_dev_minutes, global_mean) {
        (Some(mean_hour), Some(sd_min), Some(global)) => {
            if sd_min < cfg.low_variance_minutes && mean_hour < global {
                DayType::Workday
            } else if sd_min > cfg.high_variance_minutes && mean_hour > global {
                DayType::Freeday
            } else {
                calendar
            }
        }
        _ => calendar,
    }
}

/// Advisory check: is there enough history for the variance-based
/// classification to be trustworthy?
///
/// The classifier itself always returns a complete map; this only informs
/// the caller whether to surface a "need more data" hint.
pub fn classification_readiness(
    history: &[DailyVitalsRecord],
    cfg: &DayClassifierConfig,
    extract: &ExtractConfig,
) -> ClassificationReadiness {
    let samples = wake_samples(history, extract);
    let total_samples = samples.len();

    let mut seen = [false; 7];
    for sample in &samples {
        seen[sample.date.weekday().num_days_from_sunday() as usize] = true;
    }
    let distinct_weekdays = seen.iter().filter(|s| **s).count();

    let sufficient =
        total_samples >= cfg.min_total_samples && distinct_weekdays >= cfg.min_distinct_weekdays;

    let recommendation = if sufficient {
        None
    } else {
        Some(format!(
            "Automatic day classification needs at least {} wake samples across {} different \
             weekdays; currently {} samples across {}. Keep syncing sleep data or set your \
             schedule manually.",
            cfg.min_total_samples, cfg.min_distinct_weekdays, total_samples, distinct_weekdays
        ))
    };

    ClassificationReadiness {
        sufficient,
        total_samples,
        distinct_weekdays,
        recommendation,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record_waking_at(date: NaiveDate, wake_hour: f64) -> DailyVitalsRecord {
        let midnight_ms = date
            .and_hms_opt(0, 0, 0)
            .unwrap()
            .and_utc()
            .timestamp_millis();
        let mut record = DailyVitalsRecord::new(date);
        record.sleep_end_timestamp = Some(midnight_ms + (wake_hour * 3_600_000.0) as i64);
        record
    }

    /// Four weeks of history: weekdays wake 06:30 sharp, weekends wake
    /// late and scattered.
    fn make_office_worker_history() -> Vec<DailyVitalsRecord> {
        let start = NaiveDate::from_ymd_opt(2024, 3, 3).unwrap(); // a Sunday
        let mut history = Vec::new();
        for day in 0..28 {
            let date = start + chrono::Duration::days(day);
            let weekday = date.weekday().num_days_from_sunday();
            let wake_hour = match weekday {
                0 | 6 => 9.0 + (day % 4) as f64 * 0.75, // 9:00..11:15 spread
                _ => 6.5 + (day % 3) as f64 * 0.05,     // tight 6:30 cluster
            };
            history.push(record_waking_at(date, wake_hour));
        }
        history
    }

    #[test]
    fn test_empty_history_matches_calendar_fallback() {
        let map = classify_days(
            &[],
            &DayClassifierConfig::default(),
            &ExtractConfig::default(),
        );
        assert_eq!(map, DayClassificationMap::calendar_fallback());
    }

    #[test]
    fn test_office_worker_pattern() {
        let history = make_office_worker_history();
        let (map, stats) = classify_days_with_stats(
            &history,
            &DayClassifierConfig::default(),
            &ExtractConfig::default(),
        );

        for weekday in 1..=5u8 {
            assert_eq!(map.day_type(weekday), DayType::Workday, "weekday {weekday}");
        }
        assert_eq!(map.day_type(0), DayType::Freeday);
        assert_eq!(map.day_type(6), DayType::Freeday);

        assert_eq!(stats.len(), 7);
        let monday = &stats[1];
        assert_eq!(monday.sample_count, 4);
        assert!(monday.std_dev_minutes.unwrap() < 20.0);
    }

    #[test]
    fn test_sparse_weekday_uses_calendar() {
        // Two Mondays only: below the 3-sample gate, calendar says workday
        let history = vec![
            record_waking_at(NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(), 10.0),
            record_waking_at(NaiveDate::from_ymd_opt(2024, 3, 11).unwrap(), 10.5),
        ];
        let map = classify_days(
            &history,
            &DayClassifierConfig::default(),
            &ExtractConfig::default(),
        );
        assert_eq!(map.day_type(1), DayType::Workday);
    }

    #[test]
    fn test_readiness_advisory() {
        let history = make_office_worker_history();
        let ready = classification_readiness(
            &history,
            &DayClassifierConfig::default(),
            &ExtractConfig::default(),
        );
        assert!(ready.sufficient);
        assert_eq!(ready.total_samples, 28);
        assert_eq!(ready.distinct_weekdays, 7);
        assert!(ready.recommendation.is_none());

        let sparse = classification_readiness(
            &history[..5],
            &DayClassifierConfig::default(),
            &ExtractConfig::default(),
        );
        assert!(!sparse.sufficient);
        assert!(sparse.recommendation.unwrap().contains("21"));
    }
}
