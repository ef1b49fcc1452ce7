//! Per-year outcomes and run statistics

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::app::manifest::Manifest;
use crate::app::models::SelectedImageRecord;

/// Why a year produced no record
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// No rule covers the year
    NoRule,
    /// Every applicable rule returned zero candidates
    NoCandidates,
    /// The provider query failed
    QueryFailed(String),
    /// The selected image could not be exported
    ExportFailed(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoRule => write!(f, "no rule covers this year"),
            SkipReason::NoCandidates => write!(f, "no imagery found"),
            SkipReason::QueryFailed(e) => write!(f, "query failed: {}", e),
            SkipReason::ExportFailed(e) => write!(f, "export failed: {}", e),
        }
    }
}

/// Result of processing one year
#[derive(Debug, Clone, PartialEq)]
pub enum YearOutcome {
    Produced(SelectedImageRecord),
    /// Dry run: the candidate that would be exported
    Selected {
        satellite: String,
        date: String,
        cloud_cover: f64,
        path: String,
    },
    Skipped(SkipReason),
}

impl YearOutcome {
    pub fn is_skipped(&self) -> bool {
        matches!(self, YearOutcome::Skipped(_))
    }
}

/// A skipped year with its reason
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedYear {
    pub year: i32,
    pub reason: SkipReason,
}

/// Counts reported at the end of a run
#[derive(Debug, Clone, Default)]
pub struct RunStats {
    /// Years visited
    pub years_total: usize,
    /// Years with an exported (or, in dry runs, selected) image
    pub years_produced: usize,
    /// Years without an image
    pub skipped: Vec<SkippedYear>,
    /// Wall-clock duration
    pub duration: Duration,
}

impl RunStats {
    pub fn record(&mut self, year: i32, outcome: &YearOutcome) {
        self.years_total += 1;
        match outcome {
            YearOutcome::Skipped(reason) => self.skipped.push(SkippedYear {
                year,
                reason: reason.clone(),
            }),
            _ => self.years_produced += 1,
        }
    }

    pub fn years_skipped(&self) -> usize {
        self.skipped.len()
    }

    pub fn skipped_years(&self) -> Vec<i32> {
        self.skipped.iter().map(|s| s.year).collect()
    }

    /// One-line summary for the operator
    pub fn summary(&self) -> String {
        format!(
            "{} of {} years produced an image, {} skipped ({:.1}s)",
            self.years_produced,
            self.years_total,
            self.years_skipped(),
            self.duration.as_secs_f64()
        )
    }
}

/// Everything a run produced
#[derive(Debug, Clone)]
pub struct RunReport {
    pub stats: RunStats,
    /// Outcome per year, ascending
    pub outcomes: Vec<(i32, YearOutcome)>,
    /// The manifest written, `None` for dry runs
    pub manifest: Option<Manifest>,
    pub manifest_path: Option<PathBuf>,
}
