//! Circadia CLI - Command-line interface for the sleep-science engine
//!
//! Commands:
//! - report: Full sleep report (chronotype + schedule + need + debt + curve)
//! - chronotype: Circadian profile only
//! - schedule: Workday/freeday classification with per-weekday stats
//! - need: Personalized sleep-need baseline
//! - debt: Rolling sleep debt
//! - curve: 24-hour predicted-energy curve

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use circadia::config::{EngineConfig, ExtractConfig};
use circadia::energy::Nap;
use circadia::engine::{ReportOptions, SleepEngine};
use circadia::extract::{parse_history_json, parse_history_ndjson};
use circadia::report::ReportEncoder;
use circadia::types::DailyVitalsRecord;
use circadia::{EngineError, ENGINE_VERSION};

/// Circadia - Deterministic sleep-science compute engine
#[derive(Parser)]
#[command(name = "circadia")]
#[command(version = ENGINE_VERSION)]
#[command(about = "Transform sleep-vitals history into circadian intelligence", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Input file with daily vitals records (use - for stdin)
    #[arg(short, long, global = true, default_value = "-")]
    input: PathBuf,

    /// Input format
    #[arg(long, global = true, default_value = "json")]
    input_format: InputFormat,

    /// User's UTC offset in minutes (e.g. -300 for EST)
    #[arg(long, global = true, default_value = "0")]
    utc_offset_minutes: i32,

    /// Force pretty-printed output (default: pretty on a TTY)
    #[arg(long, global = true)]
    pretty: bool,

    /// Force compact output
    #[arg(long, global = true, conflicts_with = "pretty")]
    compact: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Full sleep report composing every analysis
    Report {
        /// Local clock hour treated as "now" for the energy curve
        #[arg(long, default_value = "12.0")]
        now: f64,

        /// Naps as start-hour:minutes pairs (e.g. 13.5:30), repeatable
        #[arg(long = "nap")]
        naps: Vec<String>,

        /// Use classifier freeday labels for the need calculation
        #[arg(long)]
        schedule_informed_need: bool,
    },

    /// Circadian profile (chronotype, nadir, melatonin window)
    Chronotype,

    /// Workday/freeday classification with per-weekday statistics
    Schedule,

    /// Personalized sleep-need baseline
    Need {
        /// Use classifier freeday labels instead of the Fri/Sat/Sun proxy
        #[arg(long)]
        schedule_informed: bool,
    },

    /// Rolling sleep debt
    Debt {
        /// Nightly need in hours; derived from history when omitted
        #[arg(long)]
        need: Option<f64>,
    },

    /// 24-hour predicted-energy curve
    Curve {
        /// Local clock hour treated as "now"
        #[arg(long, default_value = "12.0")]
        now: f64,

        /// Naps as start-hour:minutes pairs (e.g. 13.5:30), repeatable
        #[arg(long = "nap")]
        naps: Vec<String>,
    },
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// JSON array of records
    Json,
    /// Newline-delimited JSON (one record per line)
    Ndjson,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), EngineError> {
    let history = read_history(&cli.input, &cli.input_format)?;
    let pretty = if cli.compact {
        false
    } else {
        cli.pretty || atty::is(atty::Stream::Stdout)
    };

    let config = EngineConfig {
        extract: ExtractConfig {
            utc_offset_minutes: cli.utc_offset_minutes,
        },
        ..EngineConfig::default()
    };
    let engine = SleepEngine::new(config);

    let output = match cli.command {
        Commands::Report {
            now,
            naps,
            schedule_informed_need,
        } => {
            let options = ReportOptions {
                now_hour: now,
                naps: parse_naps(&naps)?,
                schedule_informed_need,
            };
            let report = engine.report(&history, &options);
            if pretty {
                ReportEncoder::new().encode_to_json(report)?
            } else {
                serde_json::to_string(&ReportEncoder::new().encode(report))?
            }
        }

        Commands::Chronotype => match engine.analyze_chronotype(&history) {
            Some(profile) => to_json(&profile, pretty)?,
            None => {
                return Err(EngineError::InsufficientData(
                    "chronotype profile needs 7+ valid days of sleep timing".to_string(),
                ))
            }
        },

        Commands::Schedule => {
            let (map, stats) = engine.classify_days_with_stats(&history);
            let readiness = engine.classification_readiness(&history);
            to_json(
                &serde_json::json!({
                    "classification": map,
                    "weekday_stats": stats,
                    "readiness": readiness,
                }),
                pretty,
            )?
        }

        Commands::Need { schedule_informed } => {
            let profile = if schedule_informed {
                engine.personalized_sleep_need_with_schedule(&history)
            } else {
                engine.personalized_sleep_need(&history)
            };
            to_json(&profile, pretty)?
        }

        Commands::Debt { need } => {
            let result = match need {
                Some(hours) => engine.sleep_debt_with_need(&history, hours),
                None => engine.sleep_debt(&history),
            };
            to_json(&result, pretty)?
        }

        Commands::Curve { now, naps } => {
            let naps = parse_naps(&naps)?;
            match engine.energy_curve(&history, now, &naps) {
                Some(curve) => to_json(&curve, pretty)?,
                None => {
                    return Err(EngineError::InsufficientData(
                        "energy curve needs 7+ valid days of sleep timing".to_string(),
                    ))
                }
            }
        }
    };

    println!("{output}");
    Ok(())
}

fn read_history(
    input: &PathBuf,
    format: &InputFormat,
) -> Result<Vec<DailyVitalsRecord>, EngineError> {
    let data = if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .map_err(|e| EngineError::ParseError(format!("failed to read stdin: {e}")))?;
        buffer
    } else {
        fs::read_to_string(input)
            .map_err(|e| EngineError::ParseError(format!("failed to read {}: {e}", input.display())))?
    };

    match format {
        InputFormat::Json => parse_history_json(&data),
        InputFormat::Ndjson => parse_history_ndjson(&data),
    }
}

/// Parse `start-hour:minutes` nap arguments, e.g. `13.5:30`.
fn parse_naps(args: &[String]) -> Result<Vec<Nap>, EngineError> {
    args.iter()
        .map(|arg| {
            let (start, minutes) = arg.split_once(':').ok_or_else(|| {
                EngineError::ParseError(format!(
                    "invalid nap '{arg}': expected start-hour:minutes (e.g. 13.5:30)"
                ))
            })?;
            let start_hour: f64 = start
                .parse()
                .map_err(|_| EngineError::ParseError(format!("invalid nap start hour '{start}'")))?;
            let duration_minutes: f64 = minutes
                .parse()
                .map_err(|_| EngineError::ParseError(format!("invalid nap minutes '{minutes}'")))?;
            Ok(Nap {
                start_hour,
                duration_minutes,
            })
        })
        .collect()
}

fn to_json<T: serde::Serialize>(value: &T, pretty: bool) -> Result<String, EngineError> {
    if pretty {
        serde_json::to_string_pretty(value).map_err(EngineError::JsonError)
    } else {
        serde_json::to_string(value).map_err(EngineError::JsonError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_naps() {
        let naps = parse_naps(&["13.5:30".to_string(), "16:20".to_string()]).unwrap();
        assert_eq!(naps.len(), 2);
        assert_eq!(naps[0].start_hour, 13.5);
        assert_eq!(naps[0].duration_minutes, 30.0);
        assert_eq!(naps[1].start_hour, 16.0);
    }

    #[test]
    fn test_parse_naps_rejects_garbage() {
        assert!(parse_naps(&["1330".to_string()]).is_err());
        assert!(parse_naps(&["abc:30".to_string()]).is_err());
    }
}
