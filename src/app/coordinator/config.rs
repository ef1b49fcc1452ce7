//! Configuration structures for the yearly run
//!
//! This module defines what a run covers: the region, the year range, the
//! rule table mapping years to collections, and where outputs are written.

use std::path::PathBuf;

use crate::app::models::{default_rules, Region, RuleTable, YearRule};
use crate::constants::{defaults, files};

/// Configuration for the yearly selection run
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Area queried and cropped to
    pub region: Region,
    /// First year processed
    pub start_year: i32,
    /// Last year processed (inclusive)
    pub end_year: i32,
    /// Ordered year-to-collection rules
    pub rules: RuleTable,
    /// Directory receiving rasters and the manifest
    pub output_dir: PathBuf,
    /// Manifest file name inside `output_dir`
    pub manifest_file_name: String,
    /// Select only; export nothing and leave the manifest untouched
    pub dry_run: bool,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            region: Region::default(),
            start_year: defaults::START_YEAR,
            end_year: defaults::END_YEAR,
            rules: RuleTable::new(default_rules()),
            output_dir: PathBuf::from(defaults::OUTPUT_DIR),
            manifest_file_name: files::MANIFEST_FILE_NAME.to_string(),
            dry_run: false,
        }
    }
}

impl CoordinatorConfig {
    /// Set the year range
    pub fn with_years(mut self, start_year: i32, end_year: i32) -> Self {
        self.start_year = start_year;
        self.end_year = end_year;
        self
    }

    /// Replace the rule table
    pub fn with_rules(mut self, rules: Vec<YearRule>) -> Self {
        self.rules = RuleTable::new(rules);
        self
    }

    /// Set the output directory
    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    /// Enable or disable dry-run mode
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Years processed, ascending
    pub fn years(&self) -> std::ops::RangeInclusive<i32> {
        self.start_year..=self.end_year
    }

    /// Number of years processed
    pub fn year_count(&self) -> usize {
        if self.end_year < self.start_year {
            0
        } else {
            (self.end_year - self.start_year + 1) as usize
        }
    }

    /// Full manifest path
    pub fn manifest_path(&self) -> PathBuf {
        self.output_dir.join(&self.manifest_file_name)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.end_year < self.start_year {
            return Err(format!(
                "End year {} is before start year {}",
                self.end_year, self.start_year
            ));
        }

        if self.rules.is_empty() {
            return Err("At least one year rule is required".to_string());
        }

        let rules = self.rules.as_slice();
        for (i, rule) in rules.iter().enumerate() {
            if !rule.has_plain_file_prefix() {
                return Err(format!(
                    "Rule '{}' has an unusable file prefix '{}'",
                    rule.label, rule.file_prefix
                ));
            }
            if rules[..i].iter().any(|r| r.file_prefix == rule.file_prefix) {
                return Err(format!(
                    "File prefix '{}' is used by more than one rule",
                    rule.file_prefix
                ));
            }
        }

        if let Some(problem) = self.region.validation_errors().into_iter().next() {
            return Err(format!("Invalid region: {}", problem));
        }

        if self.manifest_file_name.is_empty() {
            return Err("Manifest file name cannot be empty".to_string());
        }

        Ok(())
    }
}
