use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod classifier;
mod error;
mod log;
mod models;
mod report;

use classifier::Classifier;
use error::TriageError;
use log::{import_csv, PredictionLog};
use models::{Symptom, SymptomRecord};

const DEFAULT_LOG_PATH: &str = "data/predictions_log.jsonl";

#[derive(Parser)]
#[command(name = "symptom-triage")]
#[command(about = "Deterministic symptom triage classifier with an auditable prediction log", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a patient and record the prediction
    Classify {
        /// Symptom intensity as NAME=INTENSITY (0-10), repeatable
        #[arg(long = "symptom", value_name = "NAME=INTENSITY", required = true)]
        symptoms: Vec<String>,
        /// Patient age, contextual only
        #[arg(long)]
        age: Option<u32>,
        #[arg(long, default_value = DEFAULT_LOG_PATH)]
        log: PathBuf,
        /// Classify without recording the prediction
        #[arg(long)]
        dry_run: bool,
    },
    /// Classify patients from a CSV file and record each prediction
    Import {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long, default_value = DEFAULT_LOG_PATH)]
        log: PathBuf,
    },
    /// Summarize the prediction log
    Report {
        #[arg(long, default_value = DEFAULT_LOG_PATH)]
        log: PathBuf,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// List the symptom vocabulary and scoring weights
    Symptoms,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let classifier = Classifier::default();

    match cli.command {
        Commands::Classify {
            symptoms,
            age,
            log,
            dry_run,
        } => {
            let record = parse_symptom_args(&symptoms)?;
            let result = classifier.classify(&record, age)?;
            println!("Diagnosis: {} (score {:.1})", result.severity, result.score);
            println!("Recommendations:");
            for advice in result.severity.recommendations() {
                println!("- {advice}");
            }

            if dry_run {
                println!("Dry run, prediction not recorded.");
            } else {
                let log = PredictionLog::new(log);
                // the diagnosis above stands even when the append fails
                log.append(&result)
                    .context("diagnosis computed, but the prediction was NOT recorded")?;
                tracing::info!(
                    severity = %result.severity,
                    score = result.score,
                    "prediction recorded"
                );
                println!("Prediction recorded to {}.", log.path().display());
            }
        }
        Commands::Import { csv, log } => {
            let log = PredictionLog::new(log);
            let (recorded, skipped) = import_csv(&classifier, &log, &csv)
                .with_context(|| format!("failed to import {}", csv.display()))?;
            println!(
                "Recorded {recorded} predictions from {} ({skipped} rows skipped).",
                csv.display()
            );
        }
        Commands::Report { log, out } => {
            let log = PredictionLog::new(log);
            let entries = log.read_entries()?;
            let rendered = report::render_markdown(&report::build_report(&entries));
            match out {
                Some(path) => {
                    std::fs::write(&path, rendered)?;
                    println!("Report written to {}.", path.display());
                }
                None => print!("{rendered}"),
            }
        }
        Commands::Symptoms => {
            println!("Known symptoms (intensity scale 0-10):");
            for symptom in Symptom::ALL {
                println!(
                    "- {} (weight {:.1})",
                    symptom,
                    classifier.config().weight(symptom) as f64 / 10.0
                );
            }
        }
    }

    Ok(())
}

fn parse_symptom_args(args: &[String]) -> Result<SymptomRecord, TriageError> {
    let mut pairs = Vec::new();
    for arg in args {
        let (name, value) = arg.split_once('=').ok_or_else(|| {
            TriageError::Validation(format!("expected NAME=INTENSITY, got {arg:?}"))
        })?;
        let intensity = value.trim().parse::<u8>().map_err(|_| {
            TriageError::Validation(format!(
                "intensity for {name} must be an integer between 0 and 10, got {:?}",
                value.trim()
            ))
        })?;
        pairs.push((name.trim(), intensity));
    }
    SymptomRecord::from_named(pairs)
}
