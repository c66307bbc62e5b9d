//! Progress reporting for batch runs
//!
//! Front-ends implement [`BatchObserver`] to drive a progress bar or a log
//! view. [`RunLog`] is the stock observer: it logs every event through the
//! `log` facade and keeps the lines so they can be exported afterwards.

use crate::batch::{BatchReport, FileOutcome, FileStatus};
use crate::error::{DualCryptError, Result};
use log::{error, info, warn};
use std::fs;
use std::path::Path;

/// Callbacks for a batch run, delivered in file order on the calling thread
pub trait BatchObserver {
    fn on_start(&mut self, _total: usize) {}

    /// A subset entry was turned down before the run started
    fn on_rejected(&mut self, _path: &Path, _reason: &str) {}

    /// `index` is 1-based
    fn on_file(&mut self, _index: usize, _total: usize, _outcome: &FileOutcome) {}

    fn on_finish(&mut self, _report: &BatchReport) {}
}

/// Observer that discards everything
pub struct NullObserver;

impl BatchObserver for NullObserver {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineLevel {
    Info,
    Warn,
    Error,
}

/// Captured run output, one tagged line per event
#[derive(Debug, Default)]
pub struct RunLog {
    lines: Vec<(LineLevel, String)>,
    progress: (usize, usize),
}

impl RunLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, level: LineLevel, line: String) {
        match level {
            LineLevel::Info => info!("{}", line),
            LineLevel::Warn => warn!("{}", line),
            LineLevel::Error => error!("{}", line),
        }
        self.lines.push((level, line));
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(|(_, line)| line.as_str())
    }

    pub fn count(&self, level: LineLevel) -> usize {
        self.lines.iter().filter(|(l, _)| *l == level).count()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Files finished so far and the batch size
    pub fn progress(&self) -> (usize, usize) {
        self.progress
    }

    /// Write the captured lines to a text file
    ///
    /// # Errors
    ///
    /// Fails when the log is empty or the file cannot be written.
    pub fn export(&self, path: &Path) -> Result<()> {
        if self.is_empty() {
            return Err(DualCryptError::LogExport("Log is empty.".to_string()));
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| DualCryptError::LogExport(format!("{}: {}", parent.display(), e)))?;
        }

        let mut text = self.lines().collect::<Vec<_>>().join("\n");
        text.push('\n');
        fs::write(path, text)
            .map_err(|e| DualCryptError::LogExport(format!("{}: {}", path.display(), e)))
    }
}

impl BatchObserver for RunLog {
    fn on_start(&mut self, total: usize) {
        self.progress = (0, total);
        if total == 0 {
            self.push(LineLevel::Info, "[INFO] No .html files to process.".to_string());
        } else {
            self.push(LineLevel::Info, format!("[INFO] Files to process: {}", total));
        }
    }

    fn on_rejected(&mut self, path: &Path, reason: &str) {
        self.push(
            LineLevel::Warn,
            format!("[WARN] Skipped ({}): {}", reason, path.display()),
        );
    }

    fn on_file(&mut self, index: usize, total: usize, outcome: &FileOutcome) {
        self.progress = (index, total);
        let rel = outcome.relative.display();
        match &outcome.status {
            FileStatus::Written { .. } => self.push(
                LineLevel::Info,
                format!("[OK] {} ({:.2}s)", rel, outcome.elapsed.as_secs_f64()),
            ),
            FileStatus::Failed(e) => {
                self.push(LineLevel::Error, format!("[ERR] Failed on {}: {}", rel, e))
            }
            FileStatus::Skipped => {
                self.push(LineLevel::Warn, format!("[WARN] Canceled before {}", rel))
            }
        }
    }

    fn on_finish(&mut self, report: &BatchReport) {
        let secs = report.elapsed.as_secs_f64();
        if report.cancelled {
            self.push(
                LineLevel::Warn,
                format!(
                    "[WARN] Canceled by user after {} of {} file(s).",
                    report.succeeded() + report.failed(),
                    report.total()
                ),
            );
        } else if report.failed() > 0 {
            self.push(
                LineLevel::Warn,
                format!(
                    "[WARN] Finished with {} failure(s) out of {} file(s). Total time: {:.2}s",
                    report.failed(),
                    report.total(),
                    secs
                ),
            );
        } else if !report.is_empty() {
            self.push(
                LineLevel::Info,
                format!("[OK] All files processed. Total time: {:.2}s", secs),
            );
        }
    }
}
