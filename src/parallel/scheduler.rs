//! Job discovery and batch partitioning

use std::path::Path;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::Config;
use crate::error::{Result, BorderbatchError};
use crate::processing::{has_supported_extension, ImageJob};

/// An ordered group of jobs handled start to finish by one worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    /// 1-based position of the batch in submission order
    pub id: usize,
    pub jobs: Vec<ImageJob>,
}

impl Batch {
    pub(crate) fn len(&self) -> usize {
        self.jobs.len()
    }
}

/// List the images directly inside `input_folder`, sorted by file name.
///
/// Directories and files without a jpg/jpeg/png extension are skipped.
/// Each job's output is `output_folder/{prefix}{filename}`.
pub fn discover_jobs(input_folder: &Path, output_folder: &Path, config: &Config) -> Result<Vec<ImageJob>> {
    let unreadable = |source| BorderbatchError::InputDirectory {
        path: input_folder.to_path_buf(),
        source,
    };

    let metadata = std::fs::metadata(input_folder).map_err(unreadable)?;
    if !metadata.is_dir() {
        return Err(unreadable(std::io::Error::new(
            std::io::ErrorKind::Other,
            "not a directory",
        )));
    }

    let walker = WalkDir::new(input_folder)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name();

    let mut jobs = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() > 0 => {
                warn!("Skipping unreadable entry: {}", e);
                continue;
            }
            Err(e) => {
                return Err(unreadable(e.into_io_error().unwrap_or_else(|| {
                    std::io::Error::new(std::io::ErrorKind::Other, "directory walk failed")
                })))
            }
        };

        if !entry.file_type().is_file() || !has_supported_extension(entry.path()) {
            debug!("Skipping {:?}", entry.path());
            continue;
        }

        jobs.push(ImageJob::new(
            entry.path(),
            output_folder.join(config.output_name(entry.file_name())),
        ));
    }

    Ok(jobs)
}

/// Split `jobs` into consecutive batches of `batch_size`; only the last may be shorter.
///
/// A `batch_size` of zero is treated as one.
pub fn partition(jobs: Vec<ImageJob>, batch_size: usize) -> Vec<Batch> {
    let batch_size = batch_size.max(1);
    let mut batches = Vec::with_capacity(batch_count(jobs.len(), batch_size));
    let mut current = Vec::with_capacity(batch_size);

    for job in jobs {
        current.push(job);
        if current.len() == batch_size {
            batches.push(Batch {
                id: batches.len() + 1,
                jobs: std::mem::replace(&mut current, Vec::with_capacity(batch_size)),
            });
        }
    }

    if !current.is_empty() {
        batches.push(Batch {
            id: batches.len() + 1,
            jobs: current,
        });
    }

    batches
}

/// Number of batches `partition` produces for `job_count` jobs
pub fn batch_count(job_count: usize, batch_size: usize) -> usize {
    job_count.div_ceil(batch_size.max(1))
}
