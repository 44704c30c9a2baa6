use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::format::Format;
use crate::index::GroupKey;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Source {} does not exist", .0.display())]
    SourceMissing(PathBuf),

    #[error("Source {} is not a directory", .0.display())]
    SourceNotDirectory(PathBuf),

    #[error("Target {} already exists", .0.display())]
    TargetExists(PathBuf),

    #[error("Target {} lies inside source {}", .target.display(), .root.display())]
    TargetInsideSource { target: PathBuf, root: PathBuf },

    #[error("Source entry {} collides with the staging directory", .0.display())]
    StagingCollision(PathBuf),

    #[error("Failed to {op} {}: {source}", .path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to link {} to {}: {source}", .link.display(), .original.display())]
    Link {
        link: PathBuf,
        original: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("No placeholder encoder for format {0}")]
    UnsupportedFormat(Format),

    #[error("Refusing to synthesize an empty {format} placeholder ({width}x{height})")]
    EmptyGeometry { format: Format, width: u32, height: u32 },

    #[error("Failed to encode placeholder {key}: {source}")]
    Encode {
        key: GroupKey,
        #[source]
        source: image::ImageError,
    },

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Attaches the failing operation and path to a raw I/O result.
pub(crate) trait IoResultExt<T> {
    fn at(self, op: &'static str, path: &Path) -> Result<T>;
}

impl<T> IoResultExt<T> for io::Result<T> {
    fn at(self, op: &'static str, path: &Path) -> Result<T> {
        self.map_err(|source| Error::Io {
            op,
            path: path.to_path_buf(),
            source,
        })
    }
}
