//! Engine configuration
//!
//! Every tunable constant the engine uses lives here, grouped per component
//! and passed explicitly per call. There is no environment or ambient-config
//! coupling: defaults come from `Default` impls and callers override fields
//! as needed.

use serde::{Deserialize, Serialize};

/// Default window of recent days examined by the chronotype analyzer
pub const DEFAULT_CHRONOTYPE_WINDOW_DAYS: usize = 14;

/// Default minimum valid samples before a chronotype profile is produced
pub const DEFAULT_CHRONOTYPE_MIN_DAYS: usize = 7;

/// Default rolling window of the sleep-debt engine
pub const DEFAULT_DEBT_WINDOW_DAYS: usize = 14;

/// Default exponential decay rate for debt weighting
pub const DEFAULT_DEBT_DECAY_LAMBDA: f64 = 0.5;

/// Population-default sleep need in hours
pub const DEFAULT_SLEEP_NEED_HOURS: f64 = 8.25;

/// Biological floor below which total need never drops
pub const MIN_SLEEP_NEED_HOURS: f64 = 6.0;

/// Upper clamp for any computed need
pub const MAX_SLEEP_NEED_HOURS: f64 = 10.0;

/// Input-boundary settings: how absolute instants become local clock times.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ExtractConfig {
    /// User's UTC offset in minutes (e.g. -300 for EST). Records carry
    /// absolute epoch-ms instants; all clock-time math happens in this frame.
    pub utc_offset_minutes: i32,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            utc_offset_minutes: 0,
        }
    }
}

/// Chronotype analyzer settings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ChronotypeConfig {
    /// Most recent valid days examined
    pub window_days: usize,
    /// Minimum valid wake and sleep samples; below this the analyzer
    /// returns no profile
    pub min_days: usize,
    /// Hours before median wake at which the nadir is placed
    pub nadir_offset_hours: f64,
    /// Hours after the nadir at which the acrophase is placed
    pub acrophase_offset_hours: f64,
    /// Width of the melatonin window ending at habitual sleep onset
    pub melatonin_window_hours: f64,
    /// Median wake earlier than this -> early chronotype
    pub early_wake_boundary_hour: f64,
    /// Median wake later than this -> late chronotype
    pub late_wake_boundary_hour: f64,
}

impl Default for ChronotypeConfig {
    fn default() -> Self {
        Self {
            window_days: DEFAULT_CHRONOTYPE_WINDOW_DAYS,
            min_days: DEFAULT_CHRONOTYPE_MIN_DAYS,
            nadir_offset_hours: 2.0,
            acrophase_offset_hours: 12.0,
            melatonin_window_hours: 2.0,
            early_wake_boundary_hour: 6.0,
            late_wake_boundary_hour: 8.0,
        }
    }
}

/// Day classifier settings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DayClassifierConfig {
    /// Minimum wake samples per weekday before inference is attempted
    pub min_samples_per_weekday: usize,
    /// Std-dev below this (minutes) with an earlier-than-global mean
    /// suggests an alarm-driven workday
    pub low_variance_minutes: f64,
    /// Std-dev above this (minutes) with a later-than-global mean suggests
    /// an alarm-free freeday
    pub high_variance_minutes: f64,
    /// Advisory: total wake samples wanted for trustworthy classification
    pub min_total_samples: usize,
    /// Advisory: distinct weekdays wanted for trustworthy classification
    pub min_distinct_weekdays: usize,
}

impl Default for DayClassifierConfig {
    fn default() -> Self {
        Self {
            min_samples_per_weekday: 3,
            low_variance_minutes: 20.0,
            high_variance_minutes: 45.0,
            min_total_samples: 21,
            min_distinct_weekdays: 6,
        }
    }
}

/// Sleep-need calculator settings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SleepNeedConfig {
    /// Most recent valid-TST entries considered
    pub window_days: usize,
    /// Below this many valid entries the population default is returned
    pub min_valid_entries: usize,
    /// Free-day TST samples required for the historical-median method
    pub free_day_min_samples: usize,
    /// Free-day samples for high / medium confidence
    pub free_day_high_confidence: usize,
    pub free_day_medium_confidence: usize,
    /// Entries with TST + recovery required for the satiation method
    pub satiation_min_entries: usize,
    /// Entries for medium confidence from the satiation method
    pub satiation_medium_confidence: usize,
    /// TST bucket width (hours) for satiation analysis
    pub satiation_bucket_hours: f64,
    /// Minimum points per bucket before its mean recovery counts
    pub satiation_min_bucket_points: usize,
    /// Mean recovery a bucket must reach to qualify as the satiation point
    pub satiation_recovery_threshold: f64,
    pub min_need_hours: f64,
    pub max_need_hours: f64,
    pub default_need_hours: f64,
}

impl Default for SleepNeedConfig {
    fn default() -> Self {
        Self {
            window_days: 30,
            min_valid_entries: 7,
            free_day_min_samples: 4,
            free_day_high_confidence: 12,
            free_day_medium_confidence: 6,
            satiation_min_entries: 15,
            satiation_medium_confidence: 20,
            satiation_bucket_hours: 0.5,
            satiation_min_bucket_points: 2,
            satiation_recovery_threshold: 70.0,
            min_need_hours: MIN_SLEEP_NEED_HOURS,
            max_need_hours: MAX_SLEEP_NEED_HOURS,
            default_need_hours: DEFAULT_SLEEP_NEED_HOURS,
        }
    }
}

/// Sleep-debt engine settings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SleepDebtConfig {
    /// Rolling window size in days
    pub window_days: usize,
    /// Exponential decay rate; yesterday weighs exp(0)=1, older days less
    pub decay_lambda: f64,
    /// Category thresholds in hours
    pub low_max_hours: f64,
    pub moderate_max_hours: f64,
    pub high_max_hours: f64,
}

impl Default for SleepDebtConfig {
    fn default() -> Self {
        Self {
            window_days: DEFAULT_DEBT_WINDOW_DAYS,
            decay_lambda: DEFAULT_DEBT_DECAY_LAMBDA,
            low_max_hours: 2.0,
            moderate_max_hours: 5.0,
            high_max_hours: 8.0,
        }
    }
}

/// Two-process model constants.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TwoProcessConfig {
    /// Process S rise time constant during wake (hours)
    pub tau_rise: f64,
    /// Process S decay time constant during sleep (hours)
    pub tau_decay: f64,
    /// Sleep pressure remaining at wake after a full night
    pub initial_pressure: f64,
    /// Harmonic coefficients of the circadian oscillator, k = 1..=5
    pub harmonics: [f64; 5],
    /// Energy synthesis: base + gain*C - cost*S
    pub energy_base: f64,
    pub circadian_gain: f64,
    pub pressure_cost: f64,
    /// Percent energy penalty per hour of sleep debt, and its cap
    pub debt_penalty_per_hour: f64,
    pub debt_penalty_cap_pct: f64,
}

impl Default for TwoProcessConfig {
    fn default() -> Self {
        Self {
            tau_rise: 18.2,
            tau_decay: 4.2,
            initial_pressure: 0.1,
            harmonics: [0.97, 0.22, 0.07, 0.03, 0.001],
            energy_base: 40.0,
            circadian_gain: 60.0,
            pressure_cost: 35.0,
            debt_penalty_per_hour: 3.0,
            debt_penalty_cap_pct: 30.0,
        }
    }
}

/// Energy-curve generator settings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EnergyCurveConfig {
    pub two_process: TwoProcessConfig,
    /// Adjusted energy at or above this classifies as a peak zone
    pub peak_threshold: f64,
    /// Adjusted energy at or below this classifies as a dip zone
    pub dip_threshold: f64,
}

impl Default for EnergyCurveConfig {
    fn default() -> Self {
        Self {
            two_process: TwoProcessConfig::default(),
            peak_threshold: 70.0,
            dip_threshold: 40.0,
        }
    }
}

/// Dynamic daily-need settings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DynamicNeedConfig {
    /// Extra sleep minutes per excess training-load point
    pub strain_minutes_per_load: f64,
    /// Cap on the strain addition (hours)
    pub strain_cap_hours: f64,
    /// Cap on the debt addition (hours)
    pub debt_cap_hours: f64,
    /// Biological floor for total need (hours)
    pub min_need_hours: f64,
}

impl Default for DynamicNeedConfig {
    fn default() -> Self {
        Self {
            strain_minutes_per_load: 5.0,
            strain_cap_hours: 0.75,
            debt_cap_hours: 2.0,
            min_need_hours: MIN_SLEEP_NEED_HOURS,
        }
    }
}

/// Full engine configuration, one field per component.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    pub extract: ExtractConfig,
    pub chronotype: ChronotypeConfig,
    pub day_classifier: DayClassifierConfig,
    pub sleep_need: SleepNeedConfig,
    pub sleep_debt: SleepDebtConfig,
    pub energy_curve: EnergyCurveConfig,
    pub dynamic_need: DynamicNeedConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_model_constants() {
        let cfg = TwoProcessConfig::default();
        assert_eq!(cfg.tau_rise, 18.2);
        assert_eq!(cfg.tau_decay, 4.2);
        assert_eq!(cfg.harmonics[0], 0.97);

        let debt = SleepDebtConfig::default();
        assert_eq!(debt.window_days, 14);
        assert_eq!(debt.decay_lambda, 0.5);

        let need = SleepNeedConfig::default();
        assert_eq!(need.default_need_hours, 8.25);
        assert_eq!(need.min_need_hours, 6.0);
        assert_eq!(need.max_need_hours, 10.0);
    }

    #[test]
    fn test_engine_config_serializes() {
        let cfg = EngineConfig::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let back: EngineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.chronotype.min_days, cfg.chronotype.min_days);
    }
}
