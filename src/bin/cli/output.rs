//! Output formatting for weave results
//!
//! Human-readable and JSON renderings of what happened to each unit.

use serde::Serialize;

/// Output format selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Human,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "human" => Ok(OutputFormat::Human),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}. Expected: human, json", s)),
        }
    }
}

/// What happened to one unit.
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum UnitOutcome {
    /// Freshly woven and stored.
    Woven { functions: usize },
    /// Served from cache; the original has not changed.
    Cached,
    /// The weave aborted; nothing was emitted for this unit.
    Failed { error: String },
}

/// One row of the weave report.
#[derive(Debug, Serialize)]
pub struct UnitReport {
    pub identity: String,
    #[serde(flatten)]
    pub outcome: UnitOutcome,
}

/// Print the report in the selected format. Returns the process exit code.
pub fn report(reports: &[UnitReport], format: OutputFormat) -> i32 {
    let failures = reports
        .iter()
        .filter(|r| matches!(r.outcome, UnitOutcome::Failed { .. }))
        .count();

    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(reports).unwrap_or_else(|_| "[]".to_string())
            );
        }
        OutputFormat::Human => {
            for r in reports {
                match &r.outcome {
                    UnitOutcome::Woven { functions } => {
                        println!("  woven   {} ({} functions)", r.identity, functions)
                    }
                    UnitOutcome::Cached => println!("  cached  {}", r.identity),
                    UnitOutcome::Failed { error } => {
                        eprintln!("  FAILED  {}: {}", r.identity, error)
                    }
                }
            }
            println!(
                "{} unit(s), {} woven, {} cached, {} failed",
                reports.len(),
                reports
                    .iter()
                    .filter(|r| matches!(r.outcome, UnitOutcome::Woven { .. }))
                    .count(),
                reports
                    .iter()
                    .filter(|r| matches!(r.outcome, UnitOutcome::Cached))
                    .count(),
                failures
            );
        }
    }

    if failures > 0 {
        1
    } else {
        0
    }
}
