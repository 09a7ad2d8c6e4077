use std::collections::BTreeMap;
use std::fmt::Write;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{PredictionLogEntry, Severity};

/// How many of the latest predictions a report carries.
pub const RECENT_LIMIT: usize = 5;

/// Derived view over the full prediction log. Recomputed per query, never
/// persisted.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub total: u64,
    pub counts_by_severity: BTreeMap<Severity, u64>,
    pub recent: Vec<PredictionLogEntry>,
    pub last_prediction_at: Option<DateTime<Utc>>,
}

pub fn build_report(entries: &[PredictionLogEntry]) -> Report {
    // seed every band so zero counts still show up
    let mut counts: BTreeMap<Severity, u64> =
        Severity::ALL.iter().map(|severity| (*severity, 0)).collect();
    for entry in entries {
        *counts.entry(entry.severity).or_insert(0) += 1;
    }

    let mut recent = entries.to_vec();
    recent.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
    recent.truncate(RECENT_LIMIT);

    Report {
        total: entries.len() as u64,
        last_prediction_at: recent.first().map(|entry| entry.recorded_at),
        counts_by_severity: counts,
        recent,
    }
}

pub fn render_markdown(report: &Report) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Triage Prediction Report");
    match report.last_prediction_at {
        Some(at) => {
            let _ = writeln!(
                output,
                "{} predictions recorded, last at {}",
                report.total,
                at.to_rfc3339()
            );
        }
        None => {
            let _ = writeln!(output, "No predictions recorded yet.");
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Counts by Severity");
    for (severity, count) in &report.counts_by_severity {
        let _ = writeln!(output, "- {severity}: {count}");
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Recent Predictions");
    if report.recent.is_empty() {
        let _ = writeln!(output, "No predictions recorded yet.");
    } else {
        for entry in &report.recent {
            let symptoms = entry
                .symptoms
                .iter()
                .map(|(symptom, intensity)| format!("{symptom}={intensity}"))
                .collect::<Vec<_>>()
                .join(", ");
            let _ = writeln!(
                output,
                "- {} (score {:.1}) at {}: {}",
                entry.severity,
                entry.score,
                entry.recorded_at.to_rfc3339(),
                symptoms
            );
        }
    }

    output
}
