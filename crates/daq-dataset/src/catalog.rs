//! Scanning the cache directory into a categorized image catalog.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use daq_types::Category;

use crate::config::DatasetConfig;
use crate::error::DatasetError;

/// Two ordered lists of absolute source image paths, one per category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceCatalog {
    signal: Vec<PathBuf>,
    background: Vec<PathBuf>,
}

impl SourceCatalog {
    /// Build a catalog from explicit image lists.
    pub const fn new(signal: Vec<PathBuf>, background: Vec<PathBuf>) -> Self {
        Self { signal, background }
    }

    /// Scan the configured cache directory.
    ///
    /// Missing category directories yield empty lists; use
    /// [`require_complete`](Self::require_complete) to reject them.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::Io`] if a directory cannot be read.
    pub fn scan(config: &DatasetConfig) -> Result<Self, DatasetError> {
        let cache_dir = config.cache_dir();
        let ext = &config.image_extension;
        Ok(Self {
            signal: list_images(
                &cache_dir.join(config.category_dir_name(Category::Signal)),
                ext,
            )?,
            background: list_images(
                &cache_dir.join(config.category_dir_name(Category::Background)),
                ext,
            )?,
        })
    }

    /// Ensure both categories hold at least one image.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::EmptyCategory`] naming the first empty category.
    pub fn require_complete(self, config: &DatasetConfig) -> Result<Self, DatasetError> {
        for category in [Category::Signal, Category::Background] {
            if self.images(category).is_empty() {
                return Err(DatasetError::EmptyCategory {
                    category,
                    dir: config.cache_dir().join(config.category_dir_name(category)),
                });
            }
        }
        Ok(self)
    }

    /// The images of one category, in path order.
    pub fn images(&self, category: Category) -> &[PathBuf] {
        match category {
            Category::Signal => &self.signal,
            Category::Background => &self.background,
        }
    }

    /// Total number of images across both categories.
    pub const fn total(&self) -> usize {
        self.signal.len().saturating_add(self.background.len())
    }
}

/// Count images one level below `cache_dir` (`<cache_dir>/*/*.<ext>`).
///
/// A missing cache directory counts as zero.
///
/// # Errors
///
/// Returns [`DatasetError::Io`] if an existing directory cannot be read.
pub fn count_images(cache_dir: &Path, ext: &str) -> Result<usize, DatasetError> {
    let entries = match fs::read_dir(cache_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(DatasetError::io(cache_dir, e)),
    };

    let mut count: usize = 0;
    for entry in entries {
        let entry = entry.map_err(|e| DatasetError::io(cache_dir, e))?;
        let path = entry.path();
        if path.is_dir() {
            count = count.saturating_add(list_images(&path, ext)?.len());
        }
    }
    Ok(count)
}

/// List the images with extension `ext` directly inside `dir`, sorted.
fn list_images(dir: &Path, ext: &str) -> Result<Vec<PathBuf>, DatasetError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(DatasetError::io(dir, e)),
    };

    let mut images = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| DatasetError::io(dir, e))?;
        let path = entry.path();
        if path.is_file() && has_extension(&path, ext) {
            images.push(std::path::absolute(&path).map_err(|e| DatasetError::io(&path, e))?);
        }
    }
    images.sort();
    Ok(images)
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .is_some_and(|found| found.eq_ignore_ascii_case(ext))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"img").unwrap();
    }

    fn config_for(root: &Path) -> DatasetConfig {
        DatasetConfig::new("http://unused/archive.tar", root)
    }

    #[test]
    fn missing_cache_counts_zero() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(count_images(&dir.path().join("absent"), "png").unwrap(), 0);
    }

    #[test]
    fn counts_one_level_of_categories() {
        let dir = tempfile::tempdir().unwrap();
        let cache = dir.path().join("original");
        touch(&cache.join("NR/a.png"));
        touch(&cache.join("NR/b.PNG"));
        touch(&cache.join("ER/c.png"));
        touch(&cache.join("ER/notes.txt"));
        touch(&cache.join("loose.png"));
        touch(&cache.join("ER/nested/d.png"));

        assert_eq!(count_images(&cache, "png").unwrap(), 3);
    }

    #[test]
    fn scan_sorts_and_absolutizes() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(dir.path());
        let cache = config.cache_dir();
        touch(&cache.join("NR/b.png"));
        touch(&cache.join("NR/a.png"));
        touch(&cache.join("ER/z.png"));

        let catalog = SourceCatalog::scan(&config).unwrap();
        let signal = catalog.images(Category::Signal);
        assert_eq!(signal.len(), 2);
        assert!(signal.iter().all(|p| p.is_absolute()));
        assert!(signal[0].ends_with("NR/a.png"));
        assert!(signal[1].ends_with("NR/b.png"));
        assert_eq!(catalog.images(Category::Background).len(), 1);
        assert_eq!(catalog.total(), 3);
    }

    #[test]
    fn empty_category_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(dir.path());
        touch(&config.cache_dir().join("NR/a.png"));

        let result = SourceCatalog::scan(&config).unwrap().require_complete(&config);
        assert!(matches!(
            result,
            Err(DatasetError::EmptyCategory {
                category: Category::Background,
                ..
            })
        ));
    }
}
