use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::format::Format;

/// Images sharing a key are interchangeable once their pixels are discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupKey {
    pub format: Format,
    pub width: u32,
    pub height: u32,
}

impl GroupKey {
    pub fn new(format: Format, width: u32, height: u32) -> Self {
        Self {
            format,
            width,
            height,
        }
    }

    /// Staging file name, `<width>x<height>.<ext>`. `None` for [`Format::Unknown`].
    pub fn placeholder_name(&self) -> Option<String> {
        self.format
            .extension()
            .map(|ext| format!("{}x{}.{}", self.width, self.height, ext))
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}x{}", self.format, self.width, self.height)
    }
}

/// Maps each [`GroupKey`] to the source paths that decoded to it, in
/// traversal order. Built once by the walker and consumed by the driver.
#[derive(Debug, Default)]
pub struct GroupingIndex {
    groups: BTreeMap<GroupKey, Vec<PathBuf>>,
}

impl GroupingIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: GroupKey, path: PathBuf) {
        self.groups.entry(key).or_default().push(path);
    }

    pub fn get(&self, key: &GroupKey) -> Option<&[PathBuf]> {
        self.groups.get(key).map(Vec::as_slice)
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total number of grouped paths across all keys.
    pub fn image_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    pub fn keys(&self) -> impl Iterator<Item = &GroupKey> {
        self.groups.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&GroupKey, &[PathBuf])> {
        self.groups.iter().map(|(key, paths)| (key, paths.as_slice()))
    }

    pub fn contains_path(&self, path: &Path) -> bool {
        self.groups
            .values()
            .any(|paths| paths.iter().any(|p| p == path))
    }
}

impl IntoIterator for GroupingIndex {
    type Item = (GroupKey, Vec<PathBuf>);
    type IntoIter = std::collections::btree_map::IntoIter<GroupKey, Vec<PathBuf>>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.into_iter()
    }
}
