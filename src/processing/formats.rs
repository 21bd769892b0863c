//! Image format detection and handling

use std::path::Path;
use crate::error::JobError;

/// Formats accepted as input and produced as output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
}

impl ImageFormat {
    /// Detect the format from a file extension (case-insensitive)
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_lowercase().as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            _ => None,
        }
    }

    /// Detect the format of an input file from its path
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, JobError> {
        let extension = path
            .as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("");

        Self::from_extension(extension)
            .ok_or_else(|| JobError::unsupported_format(extension))
    }

    /// Encoding used for an output path: PNG for `.png`, JPEG otherwise
    pub fn for_output<P: AsRef<Path>>(path: P) -> Self {
        let is_png = path
            .as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .map_or(false, |ext| ext.eq_ignore_ascii_case("png"));

        if is_png {
            Self::Png
        } else {
            Self::Jpeg
        }
    }
}

impl From<ImageFormat> for image::ImageFormat {
    fn from(format: ImageFormat) -> Self {
        match format {
            ImageFormat::Jpeg => image::ImageFormat::Jpeg,
            ImageFormat::Png => image::ImageFormat::Png,
        }
    }
}

/// Get supported input extensions
pub fn supported_input_formats() -> &'static [&'static str] {
    &["jpg", "jpeg", "png"]
}

/// Check if a file extension is supported for input
pub fn is_supported_input_format(extension: &str) -> bool {
    supported_input_formats()
        .iter()
        .any(|&fmt| fmt.eq_ignore_ascii_case(extension))
}

/// Check if a path names a supported input file
pub fn has_supported_extension<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, is_supported_input_format)
}
