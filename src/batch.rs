//! Batch driver shared by the CLI and the interactive menu
//!
//! Enumerates sources, runs the transform once per file and writes each
//! wrapper under the destination with the same relative path. A file that
//! fails is reported and the batch moves on.

use crate::constants::{DEFAULT_GLOB, HTML_EXTENSIONS, OUTPUT_EXTENSION};
use crate::error::{DualCryptError, Result};
use crate::pipeline::{self, SourceDocument, TransformConfig};
use crate::report::BatchObserver;
use log::{debug, info, warn};
use rayon::prelude::*;
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

/// Shared stop flag. Once set, no new file transform is started.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Everything a front-end resolves before starting a run
#[derive(Debug, Clone)]
pub struct BatchRequest {
    pub src: PathBuf,
    pub dst: PathBuf,
    /// Glob relative to `src`, ignored when `only` is non-empty
    pub glob: String,
    /// Explicit subset of files under `src`
    pub only: Vec<PathBuf>,
    pub config: TransformConfig,
    /// Worker count; 1 runs on the calling thread
    pub jobs: usize,
}

impl BatchRequest {
    pub fn new(src: impl Into<PathBuf>, dst: impl Into<PathBuf>, config: TransformConfig) -> Self {
        Self {
            src: src.into(),
            dst: dst.into(),
            glob: DEFAULT_GLOB.to_string(),
            only: Vec::new(),
            config,
            jobs: 1,
        }
    }

    pub fn with_glob(mut self, glob: impl Into<String>) -> Self {
        self.glob = glob.into();
        self
    }

    pub fn with_only(mut self, files: Vec<PathBuf>) -> Self {
        self.only = files;
        self
    }

    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }
}

/// A source accepted for processing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    /// Path relative to the source directory
    pub relative: PathBuf,
}

/// A subset entry that was not accepted, with the reason
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejected {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug)]
pub enum FileStatus {
    Written { output: PathBuf },
    Failed(DualCryptError),
    /// Not started because the run was cancelled
    Skipped,
}

#[derive(Debug)]
pub struct FileOutcome {
    pub source: PathBuf,
    pub relative: PathBuf,
    pub status: FileStatus,
    pub elapsed: Duration,
}

impl FileOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self.status, FileStatus::Written { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, FileStatus::Failed(_))
    }
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<FileOutcome>,
    pub rejected: Vec<Rejected>,
    pub elapsed: Duration,
    pub cancelled: bool,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_failed()).count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, FileStatus::Skipped))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// True when at least one file was attempted and none succeeded
    pub fn all_failed(&self) -> bool {
        self.failed() > 0 && self.succeeded() == 0
    }
}

fn is_html(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| HTML_EXTENSIONS.iter().any(|h| ext.eq_ignore_ascii_case(h)))
}

/// Destination path for a source, `.htm` becoming `.html`
pub fn output_path(dst: &Path, relative: &Path) -> PathBuf {
    let mut out = dst.join(relative);
    let is_htm = out
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("htm"));
    if is_htm {
        out.set_extension(OUTPUT_EXTENSION);
    }
    out
}

/// Keep the first source for each destination path. `a.htm` and `a.html`
/// both land on `a.html`; later ones are rejected instead of overwriting.
fn drop_output_collisions(files: Vec<SourceFile>, dst: &Path) -> (Vec<SourceFile>, Vec<Rejected>) {
    let mut claimed: HashMap<PathBuf, PathBuf> = HashMap::new();
    let mut kept = Vec::with_capacity(files.len());
    let mut rejected = Vec::new();
    for file in files {
        let output = output_path(dst, &file.relative);
        match claimed.get(&output) {
            Some(first) => {
                debug!("{} collides with {}", file.relative.display(), first.display());
                rejected.push(Rejected {
                    reason: format!("output collides with {}", first.display()),
                    path: file.path,
                });
            }
            None => {
                claimed.insert(output, file.relative.clone());
                kept.push(file);
            }
        }
    }
    (kept, rejected)
}

/// `path` relative to `src`, tolerating a leading `./` on either side
fn relative_to(path: &Path, src: &Path) -> Option<PathBuf> {
    let strip_cur = |p: &Path| -> PathBuf {
        p.components()
            .filter(|c| !matches!(c, Component::CurDir))
            .collect()
    };
    path.strip_prefix(src)
        .ok()
        .map(Path::to_path_buf)
        .or_else(|| {
            strip_cur(path)
                .strip_prefix(strip_cur(src))
                .ok()
                .map(Path::to_path_buf)
        })
}

/// Files matching `pattern` under `src`, sorted
pub fn find_sources(src: &Path, pattern: &str) -> Result<Vec<SourceFile>> {
    if !src.is_dir() {
        return Err(DualCryptError::SourceDirMissing(src.to_path_buf()));
    }

    let root = src.to_str().ok_or_else(|| DualCryptError::InvalidGlob {
        pattern: pattern.to_string(),
        reason: format!("source path is not valid UTF-8: {}", src.display()),
    })?;
    let full = format!("{}/{}", glob::Pattern::escape(root.trim_end_matches('/')), pattern);

    let options = glob::MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: false,
    };
    let entries = glob::glob_with(&full, options).map_err(|e| DualCryptError::InvalidGlob {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })?;

    let mut files = Vec::new();
    for entry in entries {
        match entry {
            Ok(path) if path.is_file() => {
                if let Some(relative) = relative_to(&path, src) {
                    files.push(SourceFile { path, relative });
                }
            }
            Ok(_) => {}
            Err(e) => warn!("Skipping unreadable entry: {}", e),
        }
    }
    files.sort_by(|a, b| a.relative.cmp(&b.relative));
    debug!("Pattern {} matched {} file(s)", full, files.len());
    Ok(files)
}

/// Validate an explicit subset: each file must exist, be HTML and live under `src`
pub fn select_sources(src: &Path, only: &[PathBuf]) -> Result<(Vec<SourceFile>, Vec<Rejected>)> {
    if !src.is_dir() {
        return Err(DualCryptError::SourceDirMissing(src.to_path_buf()));
    }
    let root = fs::canonicalize(src).map_err(|source| DualCryptError::InputRead {
        path: src.to_path_buf(),
        source,
    })?;

    let mut files: Vec<SourceFile> = Vec::new();
    let mut rejected = Vec::new();
    for path in only {
        let reject = |reason: &str| Rejected {
            path: path.clone(),
            reason: reason.to_string(),
        };

        if !path.is_file() || !is_html(path) {
            rejected.push(reject("missing/not .html"));
            continue;
        }
        let relative = fs::canonicalize(path)
            .ok()
            .and_then(|full| full.strip_prefix(&root).ok().map(Path::to_path_buf));
        match relative {
            Some(relative) if files.iter().all(|f| f.relative != relative) => {
                files.push(SourceFile {
                    path: src.join(&relative),
                    relative,
                });
            }
            Some(_) => {}
            None => rejected.push(reject("not under src")),
        }
    }
    Ok((files, rejected))
}

/// Read, transform and write one file. Nothing is written unless the whole
/// wrapper is ready.
pub fn process_file(source: &Path, output: &Path, config: &TransformConfig) -> Result<PathBuf> {
    let bytes = fs::read(source).map_err(|e| DualCryptError::InputRead {
        path: source.to_path_buf(),
        source: e,
    })?;
    let text = String::from_utf8(bytes).map_err(|e| DualCryptError::Encoding {
        path: source.to_path_buf(),
        reason: format!(
            "not valid UTF-8 (first bad byte at offset {})",
            e.utf8_error().valid_up_to()
        ),
    })?;

    let document = SourceDocument::new(source, text);
    let encoded = pipeline::transform_document(&document, config);
    write_atomic(output, encoded.as_str())?;
    Ok(output.to_path_buf())
}

fn write_atomic(output: &Path, contents: &str) -> Result<()> {
    let write_err = |source: std::io::Error| DualCryptError::OutputWrite {
        path: output.to_path_buf(),
        source,
    };

    let parent = output
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent).map_err(write_err)?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(write_err)?;
    tmp.write_all(contents.as_bytes()).map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;

    // Temp files start out private; published pages should be world-readable
    #[cfg(unix)]
    tmp.as_file()
        .set_permissions(fs::Permissions::from_mode(0o644))
        .map_err(write_err)?;

    tmp.persist(output).map_err(|e| write_err(e.error))?;
    Ok(())
}

fn run_one(file: &SourceFile, dst: &Path, config: &TransformConfig, cancel: &CancelFlag) -> FileOutcome {
    let started = Instant::now();
    let status = if cancel.is_cancelled() {
        FileStatus::Skipped
    } else {
        match process_file(&file.path, &output_path(dst, &file.relative), config) {
            Ok(output) => FileStatus::Written { output },
            Err(e) => FileStatus::Failed(e),
        }
    };
    FileOutcome {
        source: file.path.clone(),
        relative: file.relative.clone(),
        status,
        elapsed: started.elapsed(),
    }
}

/// Run a whole batch
///
/// Observer callbacks always arrive on the calling thread and in file order,
/// also when `jobs > 1`.
///
/// # Errors
///
/// Only batch-level problems are returned (missing source directory, bad
/// glob). Per-file errors are recorded in the report.
pub fn run(
    request: &BatchRequest,
    observer: &mut dyn BatchObserver,
    cancel: &CancelFlag,
) -> Result<BatchReport> {
    let started = Instant::now();

    let (files, mut rejected) = if request.only.is_empty() {
        (find_sources(&request.src, &request.glob)?, Vec::new())
    } else {
        select_sources(&request.src, &request.only)?
    };
    let (files, collisions) = drop_output_collisions(files, &request.dst);
    rejected.extend(collisions);
    for r in &rejected {
        observer.on_rejected(&r.path, &r.reason);
    }

    let total = files.len();
    info!(
        "Processing {} file(s) from {} into {} ({}, minify={}, protect={})",
        total,
        request.src.display(),
        request.dst.display(),
        request.config.mode,
        request.config.minify,
        request.config.protect
    );
    observer.on_start(total);

    let mut outcomes = Vec::with_capacity(total);
    let pool = if request.jobs > 1 && total > 1 {
        match rayon::ThreadPoolBuilder::new().num_threads(request.jobs).build() {
            Ok(pool) => Some(pool),
            Err(e) => {
                warn!("Failed to start {} workers, running sequentially: {}", request.jobs, e);
                None
            }
        }
    } else {
        None
    };

    match pool {
        Some(pool) => {
            let results: Vec<FileOutcome> = pool.install(|| {
                files
                    .par_iter()
                    .map(|file| run_one(file, &request.dst, &request.config, cancel))
                    .collect()
            });
            for (idx, outcome) in results.into_iter().enumerate() {
                observer.on_file(idx + 1, total, &outcome);
                outcomes.push(outcome);
            }
        }
        None => {
            for (idx, file) in files.iter().enumerate() {
                let outcome = run_one(file, &request.dst, &request.config, cancel);
                observer.on_file(idx + 1, total, &outcome);
                outcomes.push(outcome);
            }
        }
    }

    let report = BatchReport {
        cancelled: outcomes.iter().any(|o| matches!(o.status, FileStatus::Skipped)),
        outcomes,
        rejected,
        elapsed: started.elapsed(),
    };
    observer.on_finish(&report);
    Ok(report)
}
