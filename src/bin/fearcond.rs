//! Fearcond CLI
//!
//! Commands:
//! - transform: analyze a tracking session into a summary report
//! - onsets: detect candidate stimulus onsets from an LED-area series
//! - validate: check a tracking session against the input contract

use clap::{Parser, Subcommand};
use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use fearcond::onset::{detect_candidate_onsets, DEFAULT_ONSET_REFRACTORY};
use fearcond::{parse_session, AnalysisConfig, SessionProcessor, FEARCOND_VERSION};

/// Fearcond - batch compute engine for fear-conditioning behavioral metrics
#[derive(Parser)]
#[command(name = "fearcond")]
#[command(version = FEARCOND_VERSION)]
#[command(about = "Transform behavioral tracking data into trial summaries", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a tracking session into a summary report
    Transform {
        /// Input session JSON (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output report JSON (use - for stdout)
        #[arg(short, long)]
        output: PathBuf,

        /// Keep pixel units instead of converting to cm
        #[arg(long)]
        pixels: bool,

        /// Immobility threshold on per-step displacement
        #[arg(long, default_value = "0.1")]
        motion_threshold: f64,

        /// Minimum freezing run length in canonical samples
        #[arg(long, default_value = "15")]
        min_freezing_samples: usize,

        /// Stddev factor for the darting speed threshold
        #[arg(long, default_value = "2.0")]
        darting_speed_factor: f64,

        /// Minimum distance covered for a darting run
        #[arg(long, default_value = "5.0")]
        darting_distance_threshold: f64,

        /// Body part for darting/distance/speed summaries
        #[arg(long)]
        bodypart: Option<String>,
    },

    /// Detect candidate stimulus onsets from an LED-area series
    Onsets {
        /// Input JSON array of per-frame LED areas (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Baseline multiple marking the LED as ON
        #[arg(long, default_value = "3.0")]
        factor: f64,

        /// Frames skipped after each detected onset
        #[arg(long, default_value_t = DEFAULT_ONSET_REFRACTORY)]
        refractory: usize,
    },

    /// Check a tracking session against the input contract
    Validate {
        /// Input session JSON (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Transform {
            input,
            output,
            pixels,
            motion_threshold,
            min_freezing_samples,
            darting_speed_factor,
            darting_distance_threshold,
            bodypart,
        } => {
            let config = AnalysisConfig {
                convert_to_cm: !pixels,
                motion_threshold,
                min_freezing_samples,
                darting_speed_factor,
                darting_distance_threshold,
                reference_bodypart: bodypart,
            };
            run_transform(&input, &output, config)
        }
        Commands::Onsets {
            input,
            factor,
            refractory,
        } => run_onsets(&input, factor, refractory),
        Commands::Validate { input } => run_validate(&input),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run_transform(input: &PathBuf, output: &PathBuf, config: AnalysisConfig) -> Result<(), String> {
    let json = read_input(input)?;
    let session = parse_session(&json).map_err(|e| e.to_string())?;

    let processor = SessionProcessor::with_config(config);
    let report = processor.analyze(&session);
    let report_json = report.to_json().map_err(|e| e.to_string())?;

    write_output(output, &report_json)?;

    for skipped in &report.skipped {
        eprintln!("skipped {}: {}", skipped.cs_id, skipped.reason);
    }
    Ok(())
}

fn run_onsets(input: &PathBuf, factor: f64, refractory: usize) -> Result<(), String> {
    let json = read_input(input)?;
    let led: Vec<f64> =
        serde_json::from_str(&json).map_err(|e| format!("invalid LED series: {e}"))?;

    let onsets = detect_candidate_onsets(&led, factor, refractory);
    let out = serde_json::to_string(&onsets).map_err(|e| e.to_string())?;
    println!("{out}");
    Ok(())
}

fn run_validate(input: &PathBuf) -> Result<(), String> {
    let json = read_input(input)?;
    let session = parse_session(&json).map_err(|e| e.to_string())?;

    println!(
        "ok: animal {} session {} ({} bodyparts, {} trials)",
        session.meta.animal_id,
        session.meta.session,
        session.bodyparts.len(),
        session.meta.cs_start.len()
    );
    Ok(())
}

fn read_input(path: &PathBuf) -> Result<String, String> {
    if path.as_os_str() == "-" {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .map_err(|e| format!("failed to read stdin: {e}"))?;
        Ok(buffer)
    } else {
        fs::read_to_string(path).map_err(|e| format!("failed to read {}: {e}", path.display()))
    }
}

fn write_output(path: &PathBuf, contents: &str) -> Result<(), String> {
    if path.as_os_str() == "-" {
        io::stdout()
            .write_all(contents.as_bytes())
            .map_err(|e| format!("failed to write stdout: {e}"))?;
        Ok(())
    } else {
        fs::write(path, contents).map_err(|e| format!("failed to write {}: {e}", path.display()))
    }
}
