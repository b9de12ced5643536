//! Batch sniffing of files and directory trees
//!
//! Paths are expanded with walkdir, then each file is opened as a
//! [`FileSource`] and run through one shared [`CfbfDetector`], with a
//! semaphore bounding how many files are open at once.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use serde::Serialize;
use walkdir::{DirEntry, WalkDir};

use crate::detect::{CfbfDetector, Detection};
use crate::source::FileSource;

/// Options controlling path expansion and concurrency
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Descend into directories (otherwise they are skipped with a warning)
    pub recursive: bool,
    pub follow_symlinks: bool,
    pub skip_hidden: bool,
    /// Files sniffed at once
    pub concurrency: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            recursive: false,
            follow_symlinks: false,
            skip_hidden: true,
            concurrency: num_cpus::get(),
        }
    }
}

/// Outcome for one file
#[derive(Debug, Clone, Serialize)]
pub struct SniffReport {
    pub path: PathBuf,
    pub detection: Option<Detection>,
    /// Set when the file could not be read
    pub error: Option<String>,
}

impl SniffReport {
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Open `path` and run the detector over it
pub async fn sniff_file(detector: &CfbfDetector, path: &Path) -> crate::Result<Option<Detection>> {
    let mut source = FileSource::open(path).await?;
    detector.detect(&mut source).await
}

/// Expand `paths` into the list of files to sniff, in walk order.
///
/// Paths that do not exist are kept so they surface as read errors.
pub fn collect_files(paths: &[PathBuf], options: &ScanOptions) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for path in paths {
        if !path.is_dir() {
            files.push(path.clone());
            continue;
        }

        if !options.recursive {
            tracing::warn!(path = %path.display(), "Skipping directory (use --recursive)");
            continue;
        }

        let skip_hidden = options.skip_hidden;
        let root = path.clone();
        let walker = WalkDir::new(path)
            .follow_links(options.follow_symlinks)
            .into_iter()
            .filter_entry(move |e| !skip_hidden || e.path() == root || !is_hidden(e));

        for entry in walker {
            match entry {
                Ok(entry) if entry.file_type().is_file() => files.push(entry.into_path()),
                Ok(_) => {}
                Err(e) => tracing::warn!(error = %e, "Failed to walk directory entry"),
            }
        }
    }

    files
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|s| s.starts_with('.'))
        .unwrap_or(false)
}

/// Sniff every file under `paths`. Reports come back in input order.
pub async fn sniff_paths(
    detector: Arc<CfbfDetector>,
    paths: &[PathBuf],
    options: &ScanOptions,
) -> Result<Vec<SniffReport>> {
    let files = collect_files(paths, options);

    tracing::info!(
        files = files.len(),
        concurrency = options.concurrency,
        "Starting sniff"
    );

    let semaphore = Arc::new(tokio::sync::Semaphore::new(options.concurrency.max(1)));
    let mut handles = Vec::with_capacity(files.len());

    for path in files {
        let permit = semaphore.clone().acquire_owned().await?;
        let detector = Arc::clone(&detector);

        handles.push(tokio::spawn(async move {
            let result = sniff_file(&detector, &path).await;
            drop(permit);

            match result {
                Ok(detection) => SniffReport {
                    path,
                    detection,
                    error: None,
                },
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Failed to sniff file");
                    SniffReport {
                        path,
                        detection: None,
                        error: Some(e.to_string()),
                    }
                }
            }
        }));
    }

    let mut reports = Vec::with_capacity(handles.len());
    for handle in handles {
        reports.push(handle.await?);
    }

    let matched = reports.iter().filter(|r| r.detection.is_some()).count();
    let failed = reports.iter().filter(|r| r.is_error()).count();
    tracing::info!(files = reports.len(), matched, failed, "Sniff complete");

    Ok(reports)
}
