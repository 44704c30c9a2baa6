use std::fmt;
use std::path::Path;

/// Raster formats the sanitizer knows how to decode and re-synthesize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Format {
    Png,
    Gif,
    Jpeg,
    /// No recognized raster extension; such files are always copied verbatim.
    Unknown,
}

impl Format {
    /// Detect format from a bare extension (no leading dot), ignoring case.
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Format::Png,
            "gif" => Format::Gif,
            "jpg" | "jpeg" | "jpe" | "jif" | "jfif" | "jfi" => Format::Jpeg,
            _ => Format::Unknown,
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, Format::Unknown)
    }

    /// Native extension used when naming canonical placeholders.
    pub fn extension(&self) -> Option<&'static str> {
        match self {
            Format::Png => Some("png"),
            Format::Gif => Some("gif"),
            Format::Jpeg => Some("jpg"),
            Format::Unknown => None,
        }
    }

    /// Codec selector for the `image` crate.
    pub(crate) fn codec(&self) -> Option<image::ImageFormat> {
        match self {
            Format::Png => Some(image::ImageFormat::Png),
            Format::Gif => Some(image::ImageFormat::Gif),
            Format::Jpeg => Some(image::ImageFormat::Jpeg),
            Format::Unknown => None,
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Format::Png => "png",
            Format::Gif => "gif",
            Format::Jpeg => "jpeg",
            Format::Unknown => "none",
        };
        f.write_str(name)
    }
}

/// Classify a file name by the text after its final `.`.
///
/// A name without a `.` has no extension and classifies as [`Format::Unknown`].
/// A leading dot counts as a separator, so `.png` is a PNG name.
pub fn classify(name: &str) -> Format {
    match name.rsplit_once('.') {
        Some((_, ext)) => Format::from_extension(ext),
        None => Format::Unknown,
    }
}

/// Classify the final component of `path`. Non UTF-8 names are never images.
pub fn classify_path(path: &Path) -> Format {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(classify)
        .unwrap_or(Format::Unknown)
}
