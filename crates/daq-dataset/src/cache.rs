//! Dataset cache bootstrap.
//!
//! [`DatasetCache::ensure`] is called once at injector startup. The download
//! rule is deliberately conservative: the archive is fetched only when the
//! cache holds fewer than `min_expected_images` images **and** the cache
//! directory does not exist at all. An existing directory, however sparse,
//! is taken as operator intent and only rescanned.

use std::ffi::OsString;
use std::fs;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::catalog::{self, SourceCatalog};
use crate::config::DatasetConfig;
use crate::download;
use crate::error::DatasetError;

/// Guarantees a local, categorized pool of source images.
#[derive(Debug, Clone)]
pub struct DatasetCache {
    config: DatasetConfig,
    client: reqwest::Client,
}

impl DatasetCache {
    /// Create a cache manager for `config`.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::Download`] if the HTTP client cannot be built.
    pub fn new(config: DatasetConfig) -> Result<Self, DatasetError> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout())
            .build()
            .map_err(|source| DatasetError::Download {
                url: config.archive_url.clone(),
                source,
            })?;
        Ok(Self { config, client })
    }

    /// The cache configuration.
    pub const fn config(&self) -> &DatasetConfig {
        &self.config
    }

    /// Make sure the cache is populated and return its catalog.
    ///
    /// A populated cache causes no network activity, so repeated calls are
    /// cheap and return equal catalogs.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::MissingSource`] if no archive URL is
    /// configured, a download/extraction error if bootstrapping fails, and
    /// [`DatasetError::EmptyCategory`] if either category ends up empty.
    pub async fn ensure(&self) -> Result<SourceCatalog, DatasetError> {
        if self.config.archive_url.trim().is_empty() {
            return Err(DatasetError::MissingSource);
        }

        let cache_dir = self.config.cache_dir();
        let found = {
            let cache_dir = cache_dir.clone();
            let ext = self.config.image_extension.clone();
            blocking(move || catalog::count_images(&cache_dir, &ext)).await?
        };
        info!(
            cache_dir = %cache_dir.display(),
            found = found,
            min_expected = self.config.min_expected_images,
            "Scanned local dataset cache"
        );

        if found < self.config.min_expected_images {
            if cache_dir.exists() {
                warn!(
                    cache_dir = %cache_dir.display(),
                    found = found,
                    "Cache directory exists but is sparse; not downloading"
                );
            } else {
                self.populate(&cache_dir).await?;
            }
        }

        let config = self.config.clone();
        let catalog =
            blocking(move || SourceCatalog::scan(&config)?.require_complete(&config)).await?;
        info!(
            signal = catalog.images(daq_types::Category::Signal).len(),
            background = catalog.images(daq_types::Category::Background).len(),
            "Source catalog ready"
        );
        Ok(catalog)
    }

    /// Download (unless already present) and unpack the archive.
    async fn populate(&self, cache_dir: &Path) -> Result<(), DatasetError> {
        let archive = self.config.archive_path();

        if archive.exists() {
            info!(archive = %archive.display(), "Reusing previously downloaded archive");
        } else {
            if let Some(parent) = archive.parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| DatasetError::io(parent, e))?;
            }
            download::download_to_file(&self.client, &self.config.archive_url, &archive).await?;
        }

        {
            let archive = archive.clone();
            let cache_dir = cache_dir.to_path_buf();
            blocking(move || extract_archive(&archive, &cache_dir)).await?;
        }

        tokio::fs::remove_file(&archive)
            .await
            .map_err(|e| DatasetError::io(&archive, e))?;
        info!(cache_dir = %cache_dir.display(), "Dataset archive extracted");
        Ok(())
    }
}

/// Unpack `archive` into `cache_dir`.
///
/// Entries are unpacked into a sibling staging directory that is renamed
/// onto `cache_dir` only after every entry was written, so a failed
/// extraction never leaves a half-populated cache behind.
fn extract_archive(archive: &Path, cache_dir: &Path) -> Result<(), DatasetError> {
    let staging = staging_path(cache_dir);
    if staging.exists() {
        fs::remove_dir_all(&staging).map_err(|e| DatasetError::io(&staging, e))?;
    }
    fs::create_dir_all(&staging).map_err(|e| DatasetError::io(&staging, e))?;

    let file = fs::File::open(archive).map_err(|e| DatasetError::io(archive, e))?;
    let mut tarball = tar::Archive::new(BufReader::new(file));
    if let Err(source) = tarball.unpack(&staging) {
        if let Err(cleanup) = fs::remove_dir_all(&staging) {
            warn!(staging = %staging.display(), error = %cleanup, "Failed to clean staging directory");
        }
        return Err(DatasetError::Extract {
            path: archive.to_path_buf(),
            source,
        });
    }

    fs::rename(&staging, cache_dir).map_err(|e| DatasetError::io(cache_dir, e))
}

fn staging_path(cache_dir: &Path) -> PathBuf {
    let mut name = OsString::from(cache_dir.as_os_str());
    name.push(".partial");
    PathBuf::from(name)
}

/// Run filesystem work on the blocking pool.
async fn blocking<T, F>(work: F) -> Result<T, DatasetError>
where
    F: FnOnce() -> Result<T, DatasetError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| DatasetError::Task(e.to_string()))?
}
