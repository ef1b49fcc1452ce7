//! Per-year progress display for fetch runs
//!
//! Uses an indicatif bar with one tick per year when stderr is a terminal,
//! and plain lines otherwise so logs and pipes stay readable.

use indicatif::{ProgressBar, ProgressStyle};

use crate::app::YearOutcome;

/// Configuration for progress display
#[derive(Debug, Clone)]
pub struct ProgressConfig {
    /// Enable the visual progress bar
    pub enable_progress_bars: bool,
    /// Print one line per year in text mode
    pub show_year_lines: bool,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            enable_progress_bars: true,
            show_year_lines: true,
        }
    }
}

/// Progress over the years of a run
pub struct YearProgress {
    config: ProgressConfig,
    bar: Option<ProgressBar>,
    total: usize,
    done: usize,
}

impl YearProgress {
    /// Start displaying progress for `total_years`
    pub fn start(total_years: usize, config: ProgressConfig) -> Self {
        let is_terminal = atty::is(atty::Stream::Stderr);

        let bar = if config.enable_progress_bars && is_terminal {
            let bar = ProgressBar::new(total_years as u64);
            let style = ProgressStyle::with_template(
                "{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} years {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> ");
            bar.set_style(style);
            bar.enable_steady_tick(std::time::Duration::from_millis(120));
            Some(bar)
        } else {
            None
        };

        Self {
            config,
            bar,
            total: total_years,
            done: 0,
        }
    }

    /// Record a finished year
    pub fn on_year(&mut self, year: i32, outcome: &YearOutcome) {
        self.done += 1;
        let line = format_outcome(year, outcome);

        match &self.bar {
            Some(bar) => {
                bar.inc(1);
                bar.set_message(year.to_string());
                if outcome.is_skipped() {
                    bar.println(line);
                }
            }
            None if self.config.show_year_lines => {
                eprintln!("[{}/{}] {}", self.done, self.total, line);
            }
            None => {}
        }
    }

    /// Clear the bar
    pub fn finish(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }
}

/// One display line describing a year's outcome
pub fn format_outcome(year: i32, outcome: &YearOutcome) -> String {
    match outcome {
        YearOutcome::Produced(record) => format!(
            "{} ✅ {} {} ({:.1}% cloud) -> {}",
            year, record.satellite, record.date, record.cloud_cover, record.path
        ),
        YearOutcome::Selected {
            satellite,
            date,
            cloud_cover,
            path,
        } => format!(
            "{} 🔍 {} {} ({:.1}% cloud) would be saved as {}",
            year, satellite, date, cloud_cover, path
        ),
        YearOutcome::Skipped(reason) => format!("{} ⚠️  skipped: {}", year, reason),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{SelectedImageRecord, SkipReason};

    #[test]
    fn test_format_outcome() {
        let record = SelectedImageRecord {
            year: 2017,
            satellite: "Landsat 8".to_string(),
            date: "2017-06-03".to_string(),
            cloud_cover: 3.0,
            path: "landsat8_2017.png".to_string(),
            width: 1024,
            height: 1024,
            resolution_meters_per_pixel: 30.0,
        };

        let line = format_outcome(2017, &YearOutcome::Produced(record));
        assert!(line.contains("Landsat 8 2017-06-03 (3.0% cloud)"));
        assert!(line.ends_with("landsat8_2017.png"));

        let line = format_outcome(2020, &YearOutcome::Skipped(SkipReason::NoCandidates));
        assert!(line.starts_with("2020"));
        assert!(line.contains("no imagery found"));
    }

    #[test]
    fn test_text_mode_counts_years() {
        let config = ProgressConfig {
            enable_progress_bars: false,
            show_year_lines: false,
        };
        let mut progress = YearProgress::start(2, config);
        progress.on_year(2013, &YearOutcome::Skipped(SkipReason::NoRule));
        progress.on_year(2014, &YearOutcome::Skipped(SkipReason::NoRule));
        progress.finish();

        assert!(progress.bar.is_none());
        assert_eq!(progress.done, 2);
    }
}
