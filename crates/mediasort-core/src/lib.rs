pub mod classify;
pub mod date;
pub mod media;
pub mod patterns;
pub mod writer;

use std::cell::Cell;
use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Context;
use serde::{Deserialize, Serialize};

pub use classify::{Classifier, Scan};
pub use media::{Disposition, MediaRecord};
pub use patterns::PatternSet;
pub use writer::Planner;

/// System and indexer sidecar artifacts, dropped from the stream entirely.
pub fn default_ignored_patterns() -> Vec<String> {
    [
        r".*@eaDir.*",
        r".*SynoEAStream",
        r".*SYNOINDEX_MEDIA_INFO.*",
        r".*SYNOINDEX_VIDEO_METADATA.*",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// File types excluded from date-based sorting.
pub fn default_filtered_patterns() -> Vec<String> {
    [
        r".*\.thumbnails.*",
        r".*\.csv",
        r".*\.dmg",
        r".*\.json",
        r".*\.pdg",
        r".*\.txt",
        r".*\.swf",
        r".*\.xml",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SortOptions {
    pub source: PathBuf,
    pub destination: PathBuf,
    /// Matched against the full path; matching files are dropped entirely.
    #[serde(default = "default_ignored_patterns")]
    pub ignored_patterns: Vec<String>,
    /// Matched against the full path; matching files are placed under
    /// `filtered/` without any date resolution.
    #[serde(default = "default_filtered_patterns")]
    pub filtered_patterns: Vec<String>,
    /// Also accept `YYYY-MM-DD - ` dates from folder names as a last
    /// resort.
    #[serde(default)]
    pub match_folder_date: bool,
    /// Plan destinations without touching the filesystem.
    #[serde(default)]
    pub dry_run: bool,
}

impl SortOptions {
    /// Options with the built-in pattern lists and everything else off.
    pub fn new(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            ignored_patterns: default_ignored_patterns(),
            filtered_patterns: default_filtered_patterns(),
            match_folder_date: false,
            dry_run: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SortResult {
    pub total: u64,
    pub images: u64,
    pub videos: u64,
    /// Media whose creation time was resolved (the rest fall back to
    /// mtime at placement).
    pub dated: u64,
    pub filtered: u64,
    pub other: u64,
    pub unknown: u64,
    #[serde(default)]
    pub warnings: Vec<String>,
}

/// Type alias for progress callback: stage, files seen so far, message.
pub type ProgressCallback = dyn Fn(&str, u64, &str);

/// Throttled progress reporter — emits at most every 200ms.
pub struct ThrottledProgress<'a> {
    inner: &'a ProgressCallback,
    last_emit: Cell<Instant>,
}

impl<'a> ThrottledProgress<'a> {
    pub fn new(inner: &'a ProgressCallback) -> Self {
        Self {
            inner,
            last_emit: Cell::new(Instant::now() - Duration::from_secs(1)),
        }
    }

    pub fn report(&self, stage: &str, count: u64, message: &str) {
        if self.last_emit.get().elapsed().as_millis() < 200 {
            return;
        }
        self.last_emit.set(Instant::now());
        (self.inner)(stage, count, message);
    }
}

/// Run the full classify-and-place pipeline.
///
/// Per-file problems (vanished entries, malformed metadata, failed moves)
/// are contained as skips or warnings; only a missing source root, an
/// uncreatable destination root or an invalid pattern aborts the run.
pub fn process(options: &SortOptions, progress: &ProgressCallback) -> anyhow::Result<SortResult> {
    let source = fs::canonicalize(&options.source)
        .with_context(|| format!("source root unreadable: {}", options.source.display()))?;
    anyhow::ensure!(
        source.is_dir(),
        "source root is not a directory: {}",
        source.display()
    );

    let classifier = Classifier::new(options)?;
    let mut planner = Planner::new(&options.destination, options.dry_run)?;
    let tp = ThrottledProgress::new(progress);

    let mut result = SortResult::default();
    let mut move_warnings = Vec::new();

    let mut scan = classifier.scan(&source);
    for record in scan.by_ref() {
        result.total += 1;
        match record.disposition {
            Disposition::Image => result.images += 1,
            Disposition::Video => result.videos += 1,
            Disposition::Filtered => result.filtered += 1,
            Disposition::Other => result.other += 1,
            Disposition::Unknown => result.unknown += 1,
        }
        if record.creation_ts.is_some() {
            result.dated += 1;
        }
        match planner.place(&record) {
            Ok(dest) => tp.report(
                "place",
                result.total,
                &format!("{} --> {}", record.path.display(), dest.display()),
            ),
            // A single stuck file should not end the run.
            Err(err) => move_warnings.push(format!("{:#}", err)),
        }
    }

    result.warnings = scan.take_warnings();
    result.warnings.append(&mut move_warnings);
    Ok(result)
}
