use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::config::AppConfig;
use crate::error::{Error, IoResultExt, Result};
use crate::index::{GroupKey, GroupingIndex};
use crate::placeholder::Synthesizer;
use crate::progress::{ProgressReporter, SilentReporter};
use crate::scanner::{self, target_mirror};

pub struct Sanitizer {
    config: AppConfig,
    synthesizer: Synthesizer,
}

#[derive(Debug)]
pub struct SanitizeReport {
    pub source: PathBuf,
    pub target: PathBuf,
    pub walk_duration: Duration,
    pub synthesis_duration: Duration,
    pub link_duration: Duration,
    pub directories: usize,
    pub files_copied: usize,
    pub bytes_copied: u64,
    pub skipped: usize,
    pub images: usize,
    pub placeholders: usize,
    pub links: usize,
}

impl Sanitizer {
    pub fn new(config: AppConfig) -> Self {
        let synthesizer = Synthesizer::from_config(&config);
        Self {
            config,
            synthesizer,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Build a sanitized mirror of `source` at `target`:
    /// 1. Validate the configuration and check preconditions, before
    ///    touching the filesystem
    /// 2. Create the target root and its staging directory
    /// 3. Walk the source, copying non-images and grouping images
    /// 4. Write one placeholder per group into the staging directory
    /// 5. Hard-link every image's mirror path to its group's placeholder
    ///
    /// Nothing is rolled back on failure.
    pub fn sanitize(
        &self,
        source: &Path,
        target: &Path,
        reporter: &dyn ProgressReporter,
    ) -> Result<SanitizeReport> {
        self.config.validate()?;
        let (source, target) = self.check_preconditions(source, target)?;
        info!(
            "Sanitizing {} into {}",
            source.display(),
            target.display()
        );

        let staging = target.join(&self.config.staging_dir);
        create_target_root(&target, &staging)?;

        // Phase 1: Walk
        reporter.on_walk_start();
        let walk_start = Instant::now();
        let walk = scanner::walk(&source, &target, reporter)?;
        let walk_duration = walk_start.elapsed();
        reporter.on_walk_complete(
            walk.stats.images,
            walk.stats.files_copied,
            walk_duration.as_secs_f64(),
        );
        info!(
            "Walk completed in {:.2}s: {} images in {} groups, {} files copied ({} bytes)",
            walk_duration.as_secs_f64(),
            walk.stats.images,
            walk.index.len(),
            walk.stats.files_copied,
            walk.stats.bytes_copied,
        );

        // Phase 2: Synthesize
        let synthesis_start = Instant::now();
        let placeholders = self.write_placeholders(&walk.index, &staging, reporter)?;
        let synthesis_duration = synthesis_start.elapsed();
        reporter.on_synthesis_complete(placeholders.len(), synthesis_duration.as_secs_f64());
        debug!(
            "Synthesis completed in {:.2}s: {} placeholders",
            synthesis_duration.as_secs_f64(),
            placeholders.len(),
        );

        // Phase 3: Link
        let link_start = Instant::now();
        let links = link_images(walk.index, &placeholders, &source, &target, reporter)?;
        let link_duration = link_start.elapsed();
        reporter.on_link_complete(links, link_duration.as_secs_f64());
        info!(
            "Linked {} images to {} placeholders in {:.2}s",
            links,
            placeholders.len(),
            link_duration.as_secs_f64(),
        );

        Ok(SanitizeReport {
            source,
            target,
            walk_duration,
            synthesis_duration,
            link_duration,
            directories: walk.stats.directories,
            files_copied: walk.stats.files_copied,
            bytes_copied: walk.stats.bytes_copied,
            skipped: walk.stats.skipped,
            images: walk.stats.images,
            placeholders: placeholders.len(),
            links,
        })
    }

    /// Validate the run and return the canonical source and absolute target.
    fn check_preconditions(&self, source: &Path, target: &Path) -> Result<(PathBuf, PathBuf)> {
        let metadata = match fs::metadata(source) {
            Ok(metadata) => metadata,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(Error::SourceMissing(source.to_path_buf()));
            }
            Err(err) => return Err(err).at("stat", source),
        };
        if !metadata.is_dir() {
            return Err(Error::SourceNotDirectory(source.to_path_buf()));
        }

        match fs::symlink_metadata(target) {
            Ok(_) => return Err(Error::TargetExists(target.to_path_buf())),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => return Err(err).at("stat", target),
        }

        let source = fs::canonicalize(source).at("resolve", source)?;
        let target = resolve_target(target)?;
        if target.starts_with(&source) {
            return Err(Error::TargetInsideSource {
                target,
                root: source,
            });
        }

        let collision = source.join(&self.config.staging_dir);
        if fs::symlink_metadata(&collision).is_ok() {
            return Err(Error::StagingCollision(collision));
        }

        Ok((source, target))
    }

    fn write_placeholders(
        &self,
        index: &GroupingIndex,
        staging: &Path,
        reporter: &dyn ProgressReporter,
    ) -> Result<BTreeMap<GroupKey, PathBuf>> {
        let total = index.len();
        reporter.on_synthesis_start(total);

        let mut placeholders = BTreeMap::new();
        for key in index.keys() {
            let path = self.synthesizer.write_placeholder(key, staging)?;
            placeholders.insert(*key, path);
            reporter.on_synthesis_progress(placeholders.len(), total);
        }
        Ok(placeholders)
    }
}

fn create_target_root(target: &Path, staging: &Path) -> Result<()> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).at("create directory", parent)?;
    }
    // `create_dir` rather than `create_dir_all` so a target appearing after
    // the precondition check is still refused.
    fs::create_dir(target).at("create target root", target)?;
    fs::create_dir(staging).at("create staging directory", staging)?;
    Ok(())
}

fn link_images(
    index: GroupingIndex,
    placeholders: &BTreeMap<GroupKey, PathBuf>,
    source: &Path,
    target: &Path,
    reporter: &dyn ProgressReporter,
) -> Result<usize> {
    let total = index.image_count();
    reporter.on_link_start(total);

    let mut linked = 0;
    for (key, paths) in index {
        let Some(original) = placeholders.get(&key) else {
            return Err(Error::UnsupportedFormat(key.format));
        };
        for path in paths {
            let link = target_mirror(source, target, &path)?;
            if let Some(parent) = link.parent() {
                fs::create_dir_all(parent).at("create directory", parent)?;
            }
            fs::hard_link(original, &link).map_err(|source| Error::Link {
                link: link.clone(),
                original: original.clone(),
                source,
            })?;
            debug!("Linked {} to {}", link.display(), original.display());
            linked += 1;
            reporter.on_link_progress(linked, total);
        }
    }
    Ok(linked)
}

/// Make `target` absolute, canonicalizing its longest existing ancestor so it
/// can be compared against a canonical source path.
fn resolve_target(target: &Path) -> Result<PathBuf> {
    let absolute = if target.is_absolute() {
        target.to_path_buf()
    } else {
        env::current_dir().at("resolve", target)?.join(target)
    };

    let mut existing = absolute.as_path();
    let mut missing = Vec::new();
    loop {
        if let Ok(canonical) = fs::canonicalize(existing) {
            return Ok(missing
                .iter()
                .rev()
                .fold(canonical, |acc: PathBuf, name| acc.join(name)));
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name.to_os_string());
                existing = parent;
            }
            _ => return Ok(absolute),
        }
    }
}

/// Sanitize with the default configuration and no progress reporting.
pub fn sanitize(source: &Path, target: &Path) -> Result<SanitizeReport> {
    Sanitizer::new(AppConfig::default()).sanitize(source, target, &SilentReporter)
}
