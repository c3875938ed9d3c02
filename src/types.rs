//! Core types for the Circadia engine
//!
//! This module defines the input record shape supplied by the sync layer and
//! the result types each analysis stage produces: circadian profile, day
//! classification, sleep need, sleep debt, dynamic need breakdown, and the
//! 24-hour energy curve.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::extract::lenient_millis;

/// One calendar day of wearable/manual sleep data, supplied wholesale by the
/// sync collaborator. The engine never mutates or persists it.
///
/// Timestamp fields arrive as epoch milliseconds, either native numbers or
/// numeric strings (big-integer database columns); anything unparseable
/// degrades to `None` for that field instead of failing the batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyVitalsRecord {
    /// Calendar date of the entry (user-local day)
    pub date: NaiveDate,
    /// Sleep onset instant (epoch ms)
    #[serde(default, deserialize_with = "lenient_millis")]
    pub sleep_start_timestamp: Option<i64>,
    /// Wake instant (epoch ms)
    #[serde(default, deserialize_with = "lenient_millis")]
    pub sleep_end_timestamp: Option<i64>,
    /// Deep sleep (minutes)
    #[serde(default)]
    pub deep_sleep_minutes: Option<f64>,
    /// REM sleep (minutes)
    #[serde(default)]
    pub rem_sleep_minutes: Option<f64>,
    /// Light sleep (minutes)
    #[serde(default)]
    pub light_sleep_minutes: Option<f64>,
    /// Time awake during the sleep period (minutes)
    #[serde(default)]
    pub awake_minutes: Option<f64>,
    /// Vendor sleep score (0-100)
    #[serde(default)]
    pub sleep_score: Option<f64>,
    /// Vendor recovery score (0-100)
    #[serde(default)]
    pub recovery_score: Option<f64>,
    /// Training load / strain score for the day (vendor scale)
    #[serde(default)]
    pub training_load: Option<f64>,
    /// Daytime nap minutes recorded for the day
    #[serde(default)]
    pub nap_minutes: Option<f64>,
}

impl DailyVitalsRecord {
    /// Create an empty record for the given date.
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            sleep_start_timestamp: None,
            sleep_end_timestamp: None,
            deep_sleep_minutes: None,
            rem_sleep_minutes: None,
            light_sleep_minutes: None,
            awake_minutes: None,
            sleep_score: None,
            recovery_score: None,
            training_load: None,
            nap_minutes: None,
        }
    }
}

/// Chronotype classification derived from median wake time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chronotype {
    Early,
    Intermediate,
    Late,
}

impl Chronotype {
    pub fn as_str(&self) -> &'static str {
        match self {
            Chronotype::Early => "early",
            Chronotype::Intermediate => "intermediate",
            Chronotype::Late => "late",
        }
    }
}

/// Confidence grade attached to derived profiles
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::Low => "low",
            Confidence::Medium => "medium",
            Confidence::High => "high",
        }
    }
}

/// Melatonin secretion window (local clock hours, may wrap midnight)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MelatoninWindow {
    pub start_hour: f64,
    pub end_hour: f64,
}

impl MelatoninWindow {
    /// Whether a local clock hour falls inside the window, handling the
    /// midnight wrap (start > end means the window crosses 00:00).
    pub fn contains(&self, hour: f64) -> bool {
        if self.start_hour <= self.end_hour {
            hour >= self.start_hour && hour < self.end_hour
        } else {
            hour >= self.start_hour || hour < self.end_hour
        }
    }
}

/// Personal circadian profile derived from the recent sleep history.
///
/// Clock-hour fields are local times of day in `[0, 24)`, date-agnostic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChronotypeProfile {
    /// Median wake time over the analysis window
    pub average_wake_hour: f64,
    /// Median sleep onset time over the analysis window
    pub average_sleep_hour: f64,
    /// Time of minimum alertness, ~2h before natural wake
    pub circadian_nadir_hour: f64,
    /// Time of peak alertness, 12h opposite the nadir
    pub circadian_acrophase_hour: f64,
    /// Approximated DLMO window before habitual sleep onset
    pub melatonin_window: MelatoninWindow,
    pub chronotype: Chronotype,
    /// Number of valid days the profile is based on
    pub based_on_days: usize,
    pub confidence: Confidence,
}

/// Workday/freeday label for one weekday
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayType {
    Workday,
    Freeday,
}

impl DayType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DayType::Workday => "workday",
            DayType::Freeday => "freeday",
        }
    }
}

/// Per-weekday wake-time statistics used by the day classifier.
///
/// `weekday` is 0-6 with 0 = Sunday, matching the calendar-date weekday of
/// the entry, never a timestamp-derived weekday.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayOfWeekStats {
    pub weekday: u8,
    pub mean_wake_hour: Option<f64>,
    /// Sample standard deviation of wake times, in minutes
    pub std_dev_minutes: Option<f64>,
    pub sample_count: usize,
    pub inferred_day_type: DayType,
}

/// Complete weekday -> day-type classification.
///
/// Always covers all 7 weekdays (0 = Sunday .. 6 = Saturday); weekdays
/// without enough data are filled by the calendar fallback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayClassificationMap {
    day_types: [DayType; 7],
}

impl DayClassificationMap {
    pub fn new(day_types: [DayType; 7]) -> Self {
        Self { day_types }
    }

    /// Calendar fallback: Saturday/Sunday freeday, Monday-Friday workday.
    pub fn calendar_fallback() -> Self {
        let mut day_types = [DayType::Workday; 7];
        day_types[0] = DayType::Freeday; // Sunday
        day_types[6] = DayType::Freeday; // Saturday
        Self { day_types }
    }

    /// Day type for a weekday index (0 = Sunday). Out-of-range indices fall
    /// back to workday rather than panicking.
    pub fn day_type(&self, weekday: u8) -> DayType {
        self.day_types
            .get(weekday as usize)
            .copied()
            .unwrap_or(DayType::Workday)
    }

    /// Day type for a calendar date.
    pub fn day_type_for(&self, date: NaiveDate) -> DayType {
        use chrono::Datelike;
        self.day_type(date.weekday().num_days_from_sunday() as u8)
    }

    pub fn is_free_day(&self, date: NaiveDate) -> bool {
        self.day_type_for(date) == DayType::Freeday
    }

    pub fn iter(&self) -> impl Iterator<Item = (u8, DayType)> + '_ {
        self.day_types
            .iter()
            .enumerate()
            .map(|(i, t)| (i as u8, *t))
    }
}

/// Advisory result describing whether the history is rich enough for
/// automatic day classification. Not a hard gate: the classifier always
/// produces a complete map regardless.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationReadiness {
    pub sufficient: bool,
    pub total_samples: usize,
    pub distinct_weekdays: usize,
    /// Human-readable guidance when insufficient
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
}

/// Method that produced a sleep-need figure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NeedMethod {
    HistoricalMedian,
    SatiationPoint,
    Default,
}

impl NeedMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            NeedMethod::HistoricalMedian => "historical_median",
            NeedMethod::SatiationPoint => "satiation_point",
            NeedMethod::Default => "default",
        }
    }
}

/// Personalized sleep-need baseline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SleepNeedProfile {
    /// Hours per night, clamped to [6.0, 10.0]
    pub calculated_need_hours: f64,
    pub confidence: Confidence,
    pub based_on_days: usize,
    pub method: NeedMethod,
}

/// Sleep-debt severity band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DebtCategory {
    Low,
    Moderate,
    High,
    Critical,
}

impl DebtCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            DebtCategory::Low => "low",
            DebtCategory::Moderate => "moderate",
            DebtCategory::High => "high",
            DebtCategory::Critical => "critical",
        }
    }
}

/// One day's contribution to the rolling sleep debt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyDebtEntry {
    pub date: NaiveDate,
    /// Total sleep time that night (hours); equals `need_hours` when imputed
    pub tst_hours: f64,
    pub need_hours: f64,
    /// `need - tst`; positive = deficit, negative = surplus
    pub deviation_hours: f64,
    /// Recency weight `exp(-lambda * day_index)`
    pub weight: f64,
    /// Weighted deficit contribution; surplus nights contribute zero
    pub weighted_debt_hours: f64,
    /// True when no sleep data existed and the night was imputed as exactly
    /// meeting need
    pub imputed: bool,
}

/// Rolling sleep-debt figure over the debt window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SleepDebtResult {
    /// Hours of accumulated weighted deficit, never negative
    pub total_debt_hours: f64,
    pub category: DebtCategory,
    /// Nights to repay the debt assuming +1h/night recovery capacity
    pub payback_nights: u32,
    /// Per-day breakdown, index 0 = most recent day
    pub daily_breakdown: Vec<DailyDebtEntry>,
}

/// Inputs the dynamic daily-need decomposition was computed against
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DailyNeedContext {
    pub training_load_yesterday: Option<f64>,
    pub training_load_average: Option<f64>,
    pub current_debt_hours: f64,
    pub nap_minutes_today: f64,
    pub prior_recovery_score: Option<f64>,
}

/// Per-day sleep-need decomposition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailySleepNeedBreakdown {
    pub baseline_hours: f64,
    /// Extra need from yesterday's training strain, capped at 0.75h
    pub strain_addition_hours: f64,
    /// Extra need from accumulated debt, capped at 2.0h
    pub debt_addition_hours: f64,
    /// Reduction from today's naps, uncapped
    pub nap_subtraction_hours: f64,
    /// Never below the 6h biological floor
    pub total_need_hours: f64,
    pub context: DailyNeedContext,
}

/// Energy zone classification for a point on the curve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EnergyZone {
    Peak,
    Rising,
    Dip,
    WindDown,
    Sleep,
}

impl EnergyZone {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnergyZone::Peak => "peak",
            EnergyZone::Rising => "rising",
            EnergyZone::Dip => "dip",
            EnergyZone::WindDown => "wind-down",
            EnergyZone::Sleep => "sleep",
        }
    }
}

/// One 15-minute sample of the predicted-energy curve
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircadianPoint {
    /// Local clock hour in [0, 24)
    pub hour: f64,
    /// Homeostatic sleep pressure, [0, 1]
    pub process_s: f64,
    /// Circadian oscillator output, [0, 1]
    pub process_c: f64,
    /// Debt-adjusted predicted energy, [0, 100]
    pub energy: f64,
    pub zone: EnergyZone,
}

/// A predicted local extremum on the remaining curve
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CurveExtremum {
    pub hour: f64,
    pub energy: f64,
}

/// 24-hour predicted-energy curve at 15-minute resolution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnergyCurve {
    /// Exactly 96 points starting at local midnight
    pub points: Vec<CircadianPoint>,
    pub current_energy: f64,
    pub current_zone: EnergyZone,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_peak: Option<CurveExtremum>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_dip: Option<CurveExtremum>,
    pub melatonin_window: MelatoninWindow,
    pub wake_hour: f64,
    /// Percentage knocked off the raw energy by sleep debt
    pub sleep_debt_penalty_pct: f64,
}
