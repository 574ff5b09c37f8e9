//! Dataset cache configuration.

use std::path::PathBuf;
use std::time::Duration;

use daq_types::Category;
use serde::Deserialize;

/// Where the source images come from and where they are cached.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DatasetConfig {
    /// HTTP(S) URL of the tar archive holding the source images.
    #[serde(default = "default_archive_url")]
    pub archive_url: String,

    /// Directory holding both the cache directory and the transient archive.
    #[serde(default = "default_cache_root")]
    pub cache_root: PathBuf,

    /// Extracted image cache. Defaults to `<cache_root>/original`.
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,

    /// Transient archive file. Defaults to `<cache_root>/original.tar`.
    #[serde(default)]
    pub archive_file: Option<PathBuf>,

    /// Below this many cached images a missing cache is downloaded.
    #[serde(default = "default_min_expected_images")]
    pub min_expected_images: usize,

    /// Subdirectory holding signal images.
    #[serde(default = "default_signal_dir")]
    pub signal_dir: String,

    /// Subdirectory holding background images.
    #[serde(default = "default_background_dir")]
    pub background_dir: String,

    /// File extension of source images (without the dot).
    #[serde(default = "default_image_extension")]
    pub image_extension: String,

    /// HTTP connect timeout for the archive download, in seconds.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl DatasetConfig {
    /// Configuration for an archive at `archive_url` cached under `cache_root`.
    pub fn new(archive_url: &str, cache_root: impl Into<PathBuf>) -> Self {
        Self {
            archive_url: archive_url.to_owned(),
            cache_root: cache_root.into(),
            ..Self::default()
        }
    }

    /// Set the minimum number of images a usable cache holds.
    #[must_use]
    pub const fn with_min_expected_images(mut self, count: usize) -> Self {
        self.min_expected_images = count;
        self
    }

    /// The extracted image cache directory.
    pub fn cache_dir(&self) -> PathBuf {
        self.cache_dir
            .clone()
            .unwrap_or_else(|| self.cache_root.join("original"))
    }

    /// The path the archive is downloaded to before extraction.
    pub fn archive_path(&self) -> PathBuf {
        self.archive_file
            .clone()
            .unwrap_or_else(|| self.cache_root.join("original.tar"))
    }

    /// Name of the subdirectory holding `category` images.
    pub fn category_dir_name(&self, category: Category) -> &str {
        match category {
            Category::Signal => &self.signal_dir,
            Category::Background => &self.background_dir,
        }
    }

    /// The HTTP connect timeout.
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            archive_url: default_archive_url(),
            cache_root: default_cache_root(),
            cache_dir: None,
            archive_file: None,
            min_expected_images: default_min_expected_images(),
            signal_dir: default_signal_dir(),
            background_dir: default_background_dir(),
            image_extension: default_image_extension(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

fn default_archive_url() -> String {
    "https://pandora.infn.it/public/16cf05/dl/cygno-sim.tar".to_owned()
}

fn default_cache_root() -> PathBuf {
    PathBuf::from("/tmp")
}

const fn default_min_expected_images() -> usize {
    1000
}

fn default_signal_dir() -> String {
    "NR".to_owned()
}

fn default_background_dir() -> String {
    "ER".to_owned()
}

fn default_image_extension() -> String {
    "png".to_owned()
}

const fn default_connect_timeout_secs() -> u64 {
    30
}
