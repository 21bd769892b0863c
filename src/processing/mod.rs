//! Per-image processing: decode, border, encode

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use image::buffer::ConvertBuffer;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder, RgbImage, RgbaImage};
use tracing::debug;

use crate::config::Config;
use crate::error::JobError;

pub mod formats;
pub mod transform;

pub use formats::*;
pub use transform::*;

/// One input file and where its bordered version goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageJob {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
}

impl ImageJob {
    pub fn new(input_path: impl Into<PathBuf>, output_path: impl Into<PathBuf>) -> Self {
        Self {
            input_path: input_path.into(),
            output_path: output_path.into(),
        }
    }

    /// Base name of the input file, used to identify the job in reports
    pub fn filename(&self) -> String {
        self.input_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.input_path.display().to_string())
    }
}

/// Outcome of a single job
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessingResult {
    pub filename: String,
    pub duration: Duration,
    pub error: Option<JobError>,
}

impl ProcessingResult {
    pub fn succeeded(filename: impl Into<String>, duration: Duration) -> Self {
        Self {
            filename: filename.into(),
            duration,
            error: None,
        }
    }

    pub fn failed(filename: impl Into<String>, duration: Duration, error: JobError) -> Self {
        Self {
            filename: filename.into(),
            duration,
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Work a pool worker runs for every job of its batch.
///
/// Called from the blocking thread pool; must not panic on bad input.
pub trait JobProcessor: Send + Sync + 'static {
    fn process(&self, job: &ImageJob) -> Result<(), JobError>;
}

/// Reads, borders and writes one image according to the shared config
#[derive(Debug, Clone)]
pub struct BorderProcessor {
    config: Arc<Config>,
}

impl BorderProcessor {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }

    fn load(&self, path: &Path) -> Result<image::DynamicImage, JobError> {
        let format = ImageFormat::from_path(path)?;
        let data = std::fs::read(path).map_err(|e| JobError::io("opening input file", e))?;

        image::load_from_memory_with_format(&data, format.into())
            .map_err(|e| JobError::Decode(e.to_string()))
    }

    fn save(&self, canvas: &RgbaImage, path: &Path) -> Result<(), JobError> {
        let output_format = ImageFormat::for_output(path);
        debug!("Saving {:?} as {:?}", path, output_format);

        let file = File::create(path).map_err(|e| JobError::io("creating output file", e))?;
        let mut writer = BufWriter::new(file);
        let (width, height) = canvas.dimensions();

        let encoded = match output_format {
            ImageFormat::Png => PngEncoder::new(&mut writer)
                .write_image(canvas.as_raw(), width, height, ColorType::Rgba8),
            ImageFormat::Jpeg => {
                let rgb: RgbImage = canvas.convert();
                JpegEncoder::new_with_quality(&mut writer, self.config.jpeg_quality)
                    .write_image(rgb.as_raw(), width, height, ColorType::Rgb8)
            }
        };
        encoded.map_err(|e| JobError::io("encoding output image", e))?;

        writer
            .flush()
            .map_err(|e| JobError::io("writing output file", e))
    }
}

impl JobProcessor for BorderProcessor {
    fn process(&self, job: &ImageJob) -> Result<(), JobError> {
        let image = self.load(&job.input_path)?;
        let canvas = apply_border(&image, &self.config);
        self.save(&canvas, &job.output_path)
    }
}
