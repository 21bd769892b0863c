//! Operator-facing progress output for a running pool

use std::io::{self, Write};

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::processing::ProcessingResult;

/// How much the pool prints while it runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportMode {
    /// Progress bar plus one line per image
    Interactive,
    /// One line per image, no bar
    Lines,
    /// Nothing; used for quiet and JSON runs
    Silent,
}

/// Cheap to clone; every worker holds one
#[derive(Clone)]
pub struct ProgressReporter {
    bar: ProgressBar,
    echo: bool,
}

impl ProgressReporter {
    /// Create a reporter for `total` images
    pub fn new(total: u64, mode: ReportMode) -> Self {
        let bar = match mode {
            ReportMode::Interactive => {
                let style = ProgressStyle::with_template(
                    "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({per_sec}, {eta})",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-");
                ProgressBar::new(total).with_style(style)
            }
            ReportMode::Lines | ReportMode::Silent => ProgressBar::hidden(),
        };

        Self {
            bar,
            echo: mode != ReportMode::Silent,
        }
    }

    /// Reporter that prints nothing
    pub fn silent() -> Self {
        Self::new(0, ReportMode::Silent)
    }

    /// Record one finished image
    pub fn image_done(&self, result: &ProcessingResult) {
        if self.echo {
            let line = format_result_line(result);
            // A closed stdout must not take the worker down with it
            self.bar.suspend(|| {
                let _ = writeln!(io::stdout().lock(), "{}", line);
            });
        }
        self.bar.inc(1);
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

/// One progress line for a finished image
pub fn format_result_line(result: &ProcessingResult) -> String {
    match &result.error {
        None => format!(
            "{} Successfully processed {} in {:.2} seconds",
            style("✅").green(),
            result.filename,
            result.duration.as_secs_f64()
        ),
        Some(error) => format!(
            "{} Error processing {}: {}",
            style("❌").red(),
            result.filename,
            error
        ),
    }
}
