use std::fs::{self, File};
use std::io;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{IoResultExt, Result};

/// Copy `source` byte-for-byte to `target`, creating missing parents.
///
/// Bytes land in a temporary file beside `target` which is synced and then
/// renamed into place, so `target` is either absent or complete. An existing
/// `target` is never replaced. Returns the number of bytes copied.
pub fn copy_verbatim(source: &Path, target: &Path) -> Result<u64> {
    let parent = target.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent).at("create directory", parent)?;

    let mut input = File::open(source).at("open", source)?;
    let permissions = input.metadata().at("stat", source)?.permissions();

    let mut tmp = NamedTempFile::new_in(parent).at("create temporary file in", parent)?;
    let bytes = io::copy(&mut input, tmp.as_file_mut()).at("copy", source)?;
    tmp.as_file().sync_all().at("sync", target)?;
    tmp.as_file()
        .set_permissions(permissions)
        .at("set permissions on", target)?;
    tmp.persist_noclobber(target)
        .map_err(|e| e.error)
        .at("persist", target)?;

    debug!(
        "Copied non-image file {} to {} ({} bytes)",
        source.display(),
        target.display(),
        bytes
    );
    Ok(bytes)
}
