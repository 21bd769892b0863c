//! BorderBatch - Concurrent Bordered Image Batches
//!
//! Scales every JPEG/PNG in a folder onto a fixed-size white canvas,
//! keeping the aspect ratio and reserving per-orientation border ratios,
//! and writes the results next to the inputs or into a subfolder.
//!
//! # Pipeline
//!
//! - [`parallel::discover_jobs`] lists the folder and builds one job per image
//! - [`parallel::partition`] groups jobs into fixed-size batches
//! - [`parallel::WorkerPool`] runs the batches on a bounded set of workers
//! - [`parallel::StatsAggregator`] folds batch results into a [`Summary`]
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use borderbatch::{process_folder, Config, ReportMode};
//! use std::path::Path;
//!
//! async fn border_photos() -> borderbatch::Result<()> {
//!     let summary = process_folder(
//!         Path::new("photos"),
//!         Config::default(),
//!         ReportMode::Lines,
//!     ).await?;
//!
//!     println!("{} processed, {} failed", summary.total_images, summary.failed_images);
//!     Ok(())
//! }
//! ```

#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod parallel;
pub mod processing;

use std::path::Path;
use std::sync::Arc;

pub use config::{BorderProfile, Config, ConfigOverrides, LoggingConfig};
pub use error::{BorderbatchError, ErrorKind, JobError, Result};
pub use parallel::{ReportMode, StatsAggregator, Summary, WorkerPool};
pub use processing::{BorderProcessor, ImageJob};

use tracing::info;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level. Logs go to stderr
/// so they never interleave with the per-image lines on stdout. Calling this
/// more than once is harmless.
pub fn init_logging(config: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let installed = if config.json_format {
        tracing::subscriber::set_global_default(builder.json().finish()).is_ok()
    } else {
        tracing::subscriber::set_global_default(builder.finish()).is_ok()
    };

    if installed {
        info!("BorderBatch v{} initialized", VERSION);
    }
}

/// Border every supported image in `input_folder`.
///
/// Fatal problems (invalid config, unreadable input folder, uncreatable
/// output folder) are returned before any worker starts. Per-image
/// failures only show up in the returned summary.
pub async fn process_folder(input_folder: &Path, config: Config, mode: ReportMode) -> Result<Summary> {
    config.validate()?;

    let output_folder = config.output_folder(input_folder);
    let jobs = parallel::discover_jobs(input_folder, &output_folder, &config)?;
    info!("Found {} images in {:?}", jobs.len(), input_folder);

    if config.separate_folder {
        std::fs::create_dir_all(&output_folder).map_err(|source| BorderbatchError::OutputDirectory {
            path: output_folder.clone(),
            source,
        })?;
    }

    let config = Arc::new(config);
    let reporter = parallel::ProgressReporter::new(jobs.len() as u64, mode);
    let pool = WorkerPool::new(Arc::new(BorderProcessor::new(Arc::clone(&config))), config.workers)
        .with_reporter(reporter);

    let stats = StatsAggregator::new();
    pool.run(jobs, config.batch_size, &stats).await?;

    Ok(stats.summary())
}
