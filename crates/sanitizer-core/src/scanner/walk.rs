use image::{ImageError, ImageReader};
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::copier::copy_verbatim;
use crate::error::{Error, IoResultExt, Result};
use crate::format::classify_path;
use crate::index::{GroupKey, GroupingIndex};
use crate::progress::ProgressReporter;

/// Outcome of trying to read a file as an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    Image(GroupKey),
    /// Not decodable under its extension's format; copied verbatim.
    Opaque,
}

/// Decode `path` with the codec selected by its extension.
///
/// Decode failures are not errors, they yield [`Probe::Opaque`]. Failing to
/// open the file, or an I/O failure other than hitting end-of-file early,
/// is an error. Zero-area images are treated as opaque.
pub fn probe(path: &Path) -> Result<Probe> {
    let format = classify_path(path);
    let Some(codec) = format.codec() else {
        return Ok(Probe::Opaque);
    };

    let file = File::open(path).at("open", path)?;
    let mut reader = ImageReader::with_format(BufReader::new(file), codec);
    // Limits would let large images fall through to a verbatim copy.
    reader.no_limits();

    match reader.decode() {
        Ok(img) if img.width() == 0 || img.height() == 0 => {
            debug!("{} decoded to an empty {} image", path.display(), format);
            Ok(Probe::Opaque)
        }
        Ok(img) => Ok(Probe::Image(GroupKey::new(format, img.width(), img.height()))),
        Err(ImageError::IoError(err)) if err.kind() != io::ErrorKind::UnexpectedEof => {
            Err(Error::Io {
                op: "read",
                path: path.to_path_buf(),
                source: err,
            })
        }
        Err(err) => {
            debug!("{} is not a decodable {}: {}", path.display(), format, err);
            Ok(Probe::Opaque)
        }
    }
}

/// Map a path under `source_root` to the same relative location under `target_root`.
pub fn target_mirror(source_root: &Path, target_root: &Path, path: &Path) -> Result<PathBuf> {
    path.strip_prefix(source_root)
        .map(|rel| target_root.join(rel))
        .map_err(|_| Error::Io {
            op: "mirror",
            path: path.to_path_buf(),
            source: io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("path is outside source root {}", source_root.display()),
            ),
        })
}

#[derive(Debug, Default, Clone)]
pub struct WalkStats {
    pub directories: usize,
    pub images: usize,
    pub files_copied: usize,
    pub bytes_copied: u64,
    pub skipped: usize,
}

#[derive(Debug)]
pub struct Walk {
    pub index: GroupingIndex,
    pub stats: WalkStats,
}

/// Depth-first, pre-order traversal of `source`. Directory children are
/// visited in file-name order. Symbolic links are followed; a link back to a
/// directory already being descended is skipped.
///
/// Images are grouped into the returned index; every other file is copied to
/// its mirror under `target` as it is encountered, and every directory is
/// mirrored before its children are visited.
pub fn walk(source: &Path, target: &Path, reporter: &dyn ProgressReporter) -> Result<Walk> {
    let mut walker = Walker {
        source,
        target,
        reporter,
        index: GroupingIndex::new(),
        stats: WalkStats::default(),
        entries_seen: 0,
        ancestors: HashSet::new(),
    };
    walker.visit_dir(source)?;

    Ok(Walk {
        index: walker.index,
        stats: walker.stats,
    })
}

struct Walker<'a> {
    source: &'a Path,
    target: &'a Path,
    reporter: &'a dyn ProgressReporter,
    index: GroupingIndex,
    stats: WalkStats,
    entries_seen: usize,
    /// Canonical paths of the directories currently being descended.
    ancestors: HashSet<PathBuf>,
}

impl Walker<'_> {
    fn visit_dir(&mut self, dir: &Path) -> Result<()> {
        let canonical = fs::canonicalize(dir).at("resolve", dir)?;
        if self.ancestors.contains(&canonical) {
            warn!(
                "Skipping {} (links back to an enclosing directory)",
                dir.display()
            );
            self.stats.skipped += 1;
            return Ok(());
        }

        let mirror = target_mirror(self.source, self.target, dir)?;
        fs::create_dir_all(&mirror).at("create directory", &mirror)?;
        self.stats.directories += 1;

        self.ancestors.insert(canonical.clone());
        let result = self.visit_children(dir);
        self.ancestors.remove(&canonical);
        result
    }

    fn visit_children(&mut self, dir: &Path) -> Result<()> {
        let mut entries = fs::read_dir(dir)
            .and_then(|entries| entries.collect::<io::Result<Vec<_>>>())
            .at("read directory", dir)?;
        entries.sort_by_key(|entry| entry.file_name());

        for entry in entries {
            let path = entry.path();
            self.entries_seen += 1;
            self.reporter.on_walk_progress(self.entries_seen, &path);

            let file_type = entry.file_type().at("stat", &path)?;
            if file_type.is_dir() {
                self.visit_dir(&path)?;
            } else if file_type.is_file() {
                self.visit_file(&path)?;
            } else if file_type.is_symlink() {
                let resolved = fs::metadata(&path).at("stat", &path)?;
                if resolved.is_dir() {
                    self.visit_dir(&path)?;
                } else if resolved.is_file() {
                    self.visit_file(&path)?;
                } else {
                    warn!("Skipping symbolic link {} to a special file", path.display());
                    self.stats.skipped += 1;
                }
            } else {
                warn!("Skipping special file {}", path.display());
                self.stats.skipped += 1;
            }
        }

        Ok(())
    }

    fn visit_file(&mut self, path: &Path) -> Result<()> {
        match probe(path)? {
            Probe::Image(key) => {
                debug!("Grouped {} as {}", path.display(), key);
                self.index.insert(key, path.to_path_buf());
                self.stats.images += 1;
            }
            Probe::Opaque => {
                let mirror = target_mirror(self.source, self.target, path)?;
                self.stats.bytes_copied += copy_verbatim(path, &mirror)?;
                self.stats.files_copied += 1;
            }
        }
        Ok(())
    }
}
