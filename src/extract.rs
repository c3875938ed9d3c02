//! Input-boundary extraction
//!
//! The sync layer supplies raw `DailyVitalsRecord` arrays in which timestamp
//! fields may be native numbers or numeric strings, and any field may be
//! missing or garbage. This module is the single place where those values
//! are coerced and validated; everything downstream sees clean local
//! clock-hours and positive durations, or nothing at all.

use chrono::{FixedOffset, NaiveDate, TimeZone, Timelike, Utc};
use serde::{Deserialize, Deserializer};

use crate::config::ExtractConfig;
use crate::error::EngineError;
use crate::types::DailyVitalsRecord;

/// Longest plausible single sleep period, in minutes.
const MAX_SLEEP_MINUTES: f64 = 24.0 * 60.0;

/// Lenient epoch-millisecond deserializer.
///
/// Accepts a JSON number, a numeric string (big-integer database columns
/// serialize this way), or anything else; non-coercible values become `None`
/// so one bad field never fails a whole batch.
pub fn lenient_millis<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(coerce_millis(&value))
}

/// Coerce a JSON value into epoch milliseconds, if possible.
pub fn coerce_millis(value: &serde_json::Value) -> Option<i64> {
    match value {
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(i)
            } else {
                n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64)
            }
        }
        serde_json::Value::String(s) => {
            let trimmed = s.trim();
            trimmed
                .parse::<i64>()
                .ok()
                .or_else(|| trimmed.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f as i64))
        }
        _ => None,
    }
}

/// A clock-time sample tied to the calendar date of its record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClockSample {
    pub date: NaiveDate,
    /// Local time of day in hours, `[0, 24)`
    pub hour: f64,
}

/// Convert an epoch-ms instant to the user's local clock hour.
///
/// Non-positive instants are invalid sensor output and filtered here.
pub fn local_clock_hour(millis: i64, cfg: &ExtractConfig) -> Option<f64> {
    if millis <= 0 {
        return None;
    }
    let offset = FixedOffset::east_opt(cfg.utc_offset_minutes * 60)?;
    let instant = Utc.timestamp_millis_opt(millis).single()?;
    let local = instant.with_timezone(&offset);
    Some(f64::from(local.hour()) + f64::from(local.minute()) / 60.0 + f64::from(local.second()) / 3600.0)
}

/// Wake-time samples (from sleep-end instants), most recent first.
pub fn wake_samples(history: &[DailyVitalsRecord], cfg: &ExtractConfig) -> Vec<ClockSample> {
    clock_samples(history, cfg, |r| r.sleep_end_timestamp)
}

/// Sleep-onset samples (from sleep-start instants), most recent first.
pub fn sleep_onset_samples(history: &[DailyVitalsRecord], cfg: &ExtractConfig) -> Vec<ClockSample> {
    clock_samples(history, cfg, |r| r.sleep_start_timestamp)
}

fn clock_samples(
    history: &[DailyVitalsRecord],
    cfg: &ExtractConfig,
    field: impl Fn(&DailyVitalsRecord) -> Option<i64>,
) -> Vec<ClockSample> {
    let mut samples: Vec<ClockSample> = history
        .iter()
        .filter_map(|record| {
            let millis = field(record)?;
            let hour = local_clock_hour(millis, cfg)?;
            Some(ClockSample {
                date: record.date,
                hour,
            })
        })
        .collect();
    samples.sort_by(|a, b| b.date.cmp(&a.date));
    samples
}

/// Total sleep time for one record, in minutes.
///
/// Prefers the sum of asleep-stage minutes (deep + REM + light; awake time
/// is in bed, not asleep). Falls back to the raw start-to-end duration when
/// no stage data exists. Negative or absurd durations are filtered, not
/// clamped.
pub fn total_sleep_minutes(record: &DailyVitalsRecord) -> Option<f64> {
    let stages: Vec<f64> = [
        record.deep_sleep_minutes,
        record.rem_sleep_minutes,
        record.light_sleep_minutes,
    ]
    .iter()
    .filter_map(|v| v.filter(|m| m.is_finite() && *m >= 0.0))
    .collect();

    if !stages.is_empty() {
        let sum: f64 = stages.iter().sum();
        if sum > 0.0 && sum <= MAX_SLEEP_MINUTES {
            return Some(sum);
        }
    }

    match (record.sleep_start_timestamp, record.sleep_end_timestamp) {
        (Some(start), Some(end)) if start > 0 && end > start => {
            let minutes = (end - start) as f64 / 60_000.0;
            if minutes > 0.0 && minutes <= MAX_SLEEP_MINUTES {
                Some(minutes)
            } else {
                None
            }
        }
        _ => None,
    }
}

/// Total sleep time in hours.
pub fn total_sleep_hours(record: &DailyVitalsRecord) -> Option<f64> {
    total_sleep_minutes(record).map(|m| m / 60.0)
}

/// Valid `(date, TST hours)` pairs, most recent first.
pub fn tst_entries(history: &[DailyVitalsRecord]) -> Vec<(NaiveDate, f64)> {
    let mut entries: Vec<(NaiveDate, f64)> = history
        .iter()
        .filter_map(|r| total_sleep_hours(r).map(|tst| (r.date, tst)))
        .collect();
    entries.sort_by(|a, b| b.0.cmp(&a.0));
    entries
}

/// Parse a JSON array of vitals records.
pub fn parse_history_json(input: &str) -> Result<Vec<DailyVitalsRecord>, EngineError> {
    let records: Vec<DailyVitalsRecord> = serde_json::from_str(input)?;
    Ok(records)
}

/// Parse newline-delimited JSON, one record per line. Blank lines are
/// skipped; a malformed line is a parse error with its line number.
pub fn parse_history_ndjson(input: &str) -> Result<Vec<DailyVitalsRecord>, EngineError> {
    let mut records = Vec::new();
    for (idx, line) in input.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let record: DailyVitalsRecord = serde_json::from_str(trimmed)
            .map_err(|e| EngineError::ParseError(format!("line {}: {}", idx + 1, e)))?;
        records.push(record);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_coerce_millis_number_and_string() {
        assert_eq!(coerce_millis(&serde_json::json!(1710057600000i64)), Some(1_710_057_600_000));
        assert_eq!(coerce_millis(&serde_json::json!("1710057600000")), Some(1_710_057_600_000));
        assert_eq!(coerce_millis(&serde_json::json!(" 1710057600000 ")), Some(1_710_057_600_000));
        assert_eq!(coerce_millis(&serde_json::json!(1.7100576e12)), Some(1_710_057_600_000));
        assert_eq!(coerce_millis(&serde_json::json!("abc")), None);
        assert_eq!(coerce_millis(&serde_json::json!(null)), None);
        assert_eq!(coerce_millis(&serde_json::json!([1, 2])), None);
    }

    #[test]
    fn test_local_clock_hour_with_offset() {
        // 2024-03-10 06:30:00 UTC
        let millis = 1_710_052_200_000;
        let utc = ExtractConfig::default();
        let hour = local_clock_hour(millis, &utc).unwrap();
        assert!((hour - 6.5).abs() < 1e-9);

        // Same instant at UTC-5 is 01:30 local
        let est = ExtractConfig {
            utc_offset_minutes: -300,
        };
        let hour = local_clock_hour(millis, &est).unwrap();
        assert!((hour - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_local_clock_hour_rejects_nonpositive() {
        let cfg = ExtractConfig::default();
        assert_eq!(local_clock_hour(0, &cfg), None);
        assert_eq!(local_clock_hour(-5, &cfg), None);
    }

    #[test]
    fn test_total_sleep_minutes_prefers_stages() {
        let mut record = DailyVitalsRecord::new(date(2024, 3, 10));
        record.deep_sleep_minutes = Some(90.0);
        record.rem_sleep_minutes = Some(100.0);
        record.light_sleep_minutes = Some(230.0);
        record.awake_minutes = Some(25.0);
        // Stage sum ignores awake minutes
        assert_eq!(total_sleep_minutes(&record), Some(420.0));
    }

    #[test]
    fn test_total_sleep_minutes_duration_fallback() {
        let mut record = DailyVitalsRecord::new(date(2024, 3, 10));
        record.sleep_start_timestamp = Some(1_710_028_800_000); // 00:00 UTC
        record.sleep_end_timestamp = Some(1_710_057_600_000); // 08:00 UTC
        assert_eq!(total_sleep_minutes(&record), Some(480.0));
    }

    #[test]
    fn test_total_sleep_minutes_filters_invalid() {
        let mut record = DailyVitalsRecord::new(date(2024, 3, 10));
        // End before start
        record.sleep_start_timestamp = Some(1_710_057_600_000);
        record.sleep_end_timestamp = Some(1_710_028_800_000);
        assert_eq!(total_sleep_minutes(&record), None);

        // Negative stage minutes are dropped, leaving the valid ones
        let mut record = DailyVitalsRecord::new(date(2024, 3, 10));
        record.deep_sleep_minutes = Some(-50.0);
        record.light_sleep_minutes = Some(300.0);
        assert_eq!(total_sleep_minutes(&record), Some(300.0));
    }

    #[test]
    fn test_samples_sorted_most_recent_first() {
        let mut older = DailyVitalsRecord::new(date(2024, 3, 9));
        older.sleep_end_timestamp = Some(1_709_971_200_000);
        let mut newer = DailyVitalsRecord::new(date(2024, 3, 10));
        newer.sleep_end_timestamp = Some(1_710_057_600_000);

        let samples = wake_samples(&[older, newer], &ExtractConfig::default());
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].date, date(2024, 3, 10));
        assert_eq!(samples[1].date, date(2024, 3, 9));
    }

    #[test]
    fn test_parse_history_ndjson() {
        let input = r#"{"date":"2024-03-10","sleepScore":80}

{"date":"2024-03-11","sleepScore":75}"#;
        let records = parse_history_ndjson(input).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].sleep_score, Some(75.0));
    }

    #[test]
    fn test_parse_history_ndjson_reports_line() {
        let input = "{\"date\":\"2024-03-10\"}\nnot json";
        let err = parse_history_ndjson(input).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }
}
