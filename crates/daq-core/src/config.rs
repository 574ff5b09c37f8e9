//! Configuration loading and typed config structures for the DAQ injector.
//!
//! Configuration is built once at startup and passed by reference to each
//! component constructor. Values come from three layers, later layers
//! winning:
//!
//! 1. Per-field defaults.
//! 2. An optional YAML file: the path in `DAQ_CONFIG`, else
//!    `daq-injector.yaml` in the working directory when it exists.
//! 3. Environment variables, using the deployment names of the running
//!    service (`MINIO_URL`, `NATS_SERVER`, `HTTP_DATA_SOURCE`, ...).
//!
//! [`InjectorConfig::load`] applies all three and validates the result;
//! [`InjectorConfig::resolve`] stops before validation.

use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use daq_dataset::DatasetConfig;
use daq_db::LedgerConfig;
use daq_imaging::ImagingConfig;
use serde::Deserialize;

/// Environment variable naming the YAML configuration file.
pub const CONFIG_PATH_VAR: &str = "DAQ_CONFIG";

/// Configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "daq-injector.yaml";

/// Longest presigned URL lifetime S3 accepts (seven days).
const MAX_PRESIGN_TTL_SECS: u32 = 604_800;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// The file that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// An environment override could not be parsed.
    #[error("environment variable {name}={value:?} is invalid: {reason}")]
    InvalidEnv {
        /// Variable name.
        name: String,
        /// Raw value as found in the environment.
        value: String,
        /// Parser message.
        reason: String,
    },

    /// No archive URL was configured for the source dataset.
    #[error("no source dataset configured (set HTTP_DATA_SOURCE or dataset.archive_url)")]
    MissingArchiveSource,

    /// A configuration value is outside its accepted range.
    #[error("invalid configuration: {field}: {reason}")]
    Invalid {
        /// Dotted path of the offending field.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level injector configuration.
///
/// Mirrors the structure of `daq-injector.yaml`. Every section and field is
/// optional; an empty file yields [`InjectorConfig::default`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct InjectorConfig {
    /// S3-compatible object store holding rendered events.
    #[serde(default)]
    pub object_store: ObjectStoreConfig,

    /// Message bus carrying event descriptors and status lines.
    #[serde(default)]
    pub message_bus: MessageBusConfig,

    /// Source dataset download and cache.
    #[serde(default)]
    pub dataset: DatasetConfig,

    /// Signal probability and arrival-rate parameters.
    #[serde(default)]
    pub sampling: SamplingConfig,

    /// Noise and encoding parameters.
    #[serde(default)]
    pub imaging: ImagingConfig,

    /// Truth ledger database.
    #[serde(default)]
    pub ledger: LedgerConfig,

    /// Log output.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl InjectorConfig {
    /// Load the configuration the way the service does at startup.
    ///
    /// Reads the YAML file named by `DAQ_CONFIG` (or `daq-injector.yaml`
    /// when present), applies environment overrides, and validates.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed, an
    /// override is malformed, or validation fails.
    pub fn load() -> Result<Self, ConfigError> {
        let config = Self::resolve()?;
        config.validate()?;
        Ok(config)
    }

    /// Read the file and environment layers like [`load`](Self::load) but
    /// skip validation.
    ///
    /// Tools that need a single setting (the ledger path, say) use this so
    /// unrelated out-of-range values do not stop them.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed, or an
    /// override is malformed.
    pub fn resolve() -> Result<Self, ConfigError> {
        let path = std::env::var_os(CONFIG_PATH_VAR)
            .map(PathBuf::from)
            .or_else(|| {
                let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
                fallback.is_file().then_some(fallback)
            });
        Self::resolve_with(path.as_deref(), |name| std::env::var(name).ok())
    }

    /// Build a configuration from an optional YAML file and the overrides
    /// returned by `lookup`, without validating.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed, or an
    /// override is malformed.
    pub fn resolve_with<F>(path: Option<&Path>, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(lookup)?;
        Ok(config)
    }

    /// Load configuration from a YAML file without consulting the
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the YAML is malformed.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        Ok(config)
    }

    /// Apply overrides from `lookup`, which maps a variable name to its value.
    ///
    /// Unset variables leave the current value untouched.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEnv`] for values that do not parse.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("MINIO_URL") {
            self.object_store.endpoint = val;
        }
        if let Some(val) = lookup("MINIO_USER") {
            self.object_store.access_key = val;
        }
        // The deployment passes the secret under MINIO_ACCESS_KEY.
        if let Some(val) = lookup("MINIO_ACCESS_KEY") {
            self.object_store.secret_key = val;
        }
        if let Some(val) = lookup("BUCKET_NAME") {
            self.object_store.bucket = val;
        }
        if let Some(val) = lookup("MINIO_SECURE") {
            self.object_store.secure = parse_var("MINIO_SECURE", &val)?;
        }
        if let Some(val) = lookup("NATS_SERVER") {
            self.message_bus.nats_url = val;
        }
        if let Some(val) = lookup("HTTP_DATA_SOURCE") {
            self.dataset.archive_url = val;
        }
        if let Some(val) = lookup("CACHE_DIR") {
            self.dataset.cache_root = PathBuf::from(val);
        }
        if let Some(val) = lookup("ORIGINAL_DATASET_CACHE") {
            self.dataset.cache_dir = Some(PathBuf::from(val));
        }
        if let Some(val) = lookup("MIN_DATASET_IMAGES") {
            self.dataset.min_expected_images = parse_var("MIN_DATASET_IMAGES", &val)?;
        }
        if let Some(val) = lookup("MAX_SIGNAL_FRACTION") {
            self.sampling.max_signal_fraction = parse_var("MAX_SIGNAL_FRACTION", &val)?;
        }
        if let Some(val) = lookup("PERIOD_HOURS") {
            self.sampling.period_hours = parse_var("PERIOD_HOURS", &val)?;
        }
        if let Some(val) = lookup("EVENTS_PER_HOUR") {
            self.sampling.events_per_hour = parse_var("EVENTS_PER_HOUR", &val)?;
        }
        if let Some(val) = lookup("SIMULATION_EPOCH") {
            self.sampling.epoch = parse_var("SIMULATION_EPOCH", &val)?;
        }
        if let Some(val) = lookup("NOISE_LEVEL") {
            self.imaging.noise_level = parse_var("NOISE_LEVEL", &val)?;
        }
        if let Some(val) = lookup("JPEG_QUALITY") {
            self.imaging.jpeg_quality = parse_var("JPEG_QUALITY", &val)?;
        }
        if let Some(val) = lookup("SQLITE_TRUTH") {
            self.ledger.path = PathBuf::from(val);
        }
        if let Some(val) = lookup("LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Some(val) = lookup("LOG_FORMAT") {
            self.logging.format = parse_var("LOG_FORMAT", &val)?;
        }
        Ok(())
    }

    /// Check every value against its accepted range.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingArchiveSource`] when no archive URL is
    /// set and [`ConfigError::Invalid`] for the first out-of-range value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dataset.archive_url.trim().is_empty() {
            return Err(ConfigError::MissingArchiveSource);
        }

        let sampling = &self.sampling;
        if !(0.0..=1.0).contains(&sampling.max_signal_fraction) {
            return Err(invalid(
                "sampling.max_signal_fraction",
                format!("{} is outside [0, 1]", sampling.max_signal_fraction),
            ));
        }
        if !(sampling.period_hours.is_finite() && sampling.period_hours > 0.0) {
            return Err(invalid(
                "sampling.period_hours",
                format!("{} is not a positive number", sampling.period_hours),
            ));
        }
        if !(sampling.events_per_hour.is_finite() && sampling.events_per_hour > 0.0) {
            return Err(invalid(
                "sampling.events_per_hour",
                format!("{} is not a positive number", sampling.events_per_hour),
            ));
        }

        let imaging = &self.imaging;
        if !(imaging.noise_level.is_finite() && imaging.noise_level >= 0.0) {
            return Err(invalid(
                "imaging.noise_level",
                format!("{} is not a non-negative number", imaging.noise_level),
            ));
        }
        if !(1..=100).contains(&imaging.jpeg_quality) {
            return Err(invalid(
                "imaging.jpeg_quality",
                format!("{} is outside [1, 100]", imaging.jpeg_quality),
            ));
        }

        let store = &self.object_store;
        if store.endpoint.trim().is_empty() {
            return Err(invalid("object_store.endpoint", "must not be empty".to_owned()));
        }
        if store.bucket.trim().is_empty() {
            return Err(invalid("object_store.bucket", "must not be empty".to_owned()));
        }
        if !(1..=MAX_PRESIGN_TTL_SECS).contains(&store.presign_ttl_secs) {
            return Err(invalid(
                "object_store.presign_ttl_secs",
                format!("{} is outside [1, {MAX_PRESIGN_TTL_SECS}]", store.presign_ttl_secs),
            ));
        }

        let bus = &self.message_bus;
        if bus.data_topic.is_empty() || bus.info_topic.is_empty() {
            return Err(invalid("message_bus", "topics must not be empty".to_owned()));
        }
        if bus.data_topic == bus.info_topic {
            return Err(invalid(
                "message_bus",
                "data and info topics must differ".to_owned(),
            ));
        }

        Ok(())
    }
}

/// S3-compatible object store settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ObjectStoreConfig {
    /// Host and port of the store, optionally with a scheme.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Access key id.
    #[serde(default = "default_credential")]
    pub access_key: String,

    /// Secret access key.
    #[serde(default = "default_credential")]
    pub secret_key: String,

    /// Bucket receiving rendered events.
    #[serde(default = "default_bucket")]
    pub bucket: String,

    /// Region name used for request signing.
    #[serde(default = "default_region")]
    pub region: String,

    /// Use HTTPS when `endpoint` carries no scheme.
    #[serde(default)]
    pub secure: bool,

    /// Lifetime of presigned retrieval URLs, in seconds.
    #[serde(default = "default_presign_ttl_secs")]
    pub presign_ttl_secs: u32,
}

impl ObjectStoreConfig {
    /// The endpoint as a URL, adding a scheme when none is configured.
    pub fn endpoint_url(&self) -> String {
        if self.endpoint.contains("://") {
            self.endpoint.clone()
        } else if self.secure {
            format!("https://{}", self.endpoint)
        } else {
            format!("http://{}", self.endpoint)
        }
    }

    /// The presigned URL lifetime as a [`Duration`].
    pub fn presign_ttl(&self) -> Duration {
        Duration::from_secs(u64::from(self.presign_ttl_secs))
    }
}

impl Default for ObjectStoreConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            access_key: default_credential(),
            secret_key: default_credential(),
            bucket: default_bucket(),
            region: default_region(),
            secure: false,
            presign_ttl_secs: default_presign_ttl_secs(),
        }
    }
}

fn default_endpoint() -> String {
    "minio:9000".to_owned()
}

fn default_credential() -> String {
    "minioadmin".to_owned()
}

fn default_bucket() -> String {
    "cygno-daq".to_owned()
}

fn default_region() -> String {
    "us-east-1".to_owned()
}

const fn default_presign_ttl_secs() -> u32 {
    3600
}

/// NATS connection and topic names.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MessageBusConfig {
    /// NATS server URL.
    #[serde(default = "default_nats_url")]
    pub nats_url: String,

    /// Topic carrying JSON event descriptors.
    #[serde(default = "default_data_topic")]
    pub data_topic: String,

    /// Topic carrying plain-text status lines.
    #[serde(default = "default_info_topic")]
    pub info_topic: String,
}

impl Default for MessageBusConfig {
    fn default() -> Self {
        Self {
            nats_url: default_nats_url(),
            data_topic: default_data_topic(),
            info_topic: default_info_topic(),
        }
    }
}

fn default_nats_url() -> String {
    "nats://localhost:4222".to_owned()
}

fn default_data_topic() -> String {
    "daq/data".to_owned()
}

fn default_info_topic() -> String {
    "daq/info".to_owned()
}

/// Parameters of the event arrival process.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SamplingConfig {
    /// Peak signal probability reached once per period.
    #[serde(default = "default_max_signal_fraction")]
    pub max_signal_fraction: f64,

    /// Period of the signal probability oscillation, in hours.
    #[serde(default = "default_period_hours")]
    pub period_hours: f64,

    /// Mean event rate of the Poisson arrival process.
    #[serde(default = "default_events_per_hour")]
    pub events_per_hour: f64,

    /// Simulation time origin; elapsed hours are measured from here.
    #[serde(default = "default_epoch")]
    pub epoch: DateTime<Utc>,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            max_signal_fraction: default_max_signal_fraction(),
            period_hours: default_period_hours(),
            events_per_hour: default_events_per_hour(),
            epoch: default_epoch(),
        }
    }
}

const fn default_max_signal_fraction() -> f64 {
    0.1
}

const fn default_period_hours() -> f64 {
    3.0
}

const fn default_events_per_hour() -> f64 {
    300.0
}

/// 2023-10-23T00:00:00Z.
fn default_epoch() -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(2023, 10, 23)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .unwrap_or_default()
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format {other:?} (expected text or json)")),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset (trace, debug, info, warn,
    /// error, or a full filter directive).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::Text,
        }
    }
}

fn default_log_level() -> String {
    "info".to_owned()
}

fn parse_var<T>(name: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::InvalidEnv {
        name: name.to_owned(),
        value: value.to_owned(),
        reason: e.to_string(),
    })
}

fn invalid(field: &'static str, reason: String) -> ConfigError {
    ConfigError::Invalid { field, reason }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: BTreeMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn defaults_match_deployment() {
        let config = InjectorConfig::default();
        assert_eq!(config.object_store.endpoint, "minio:9000");
        assert_eq!(config.object_store.bucket, "cygno-daq");
        assert_eq!(config.object_store.presign_ttl(), Duration::from_secs(3600));
        assert_eq!(config.message_bus.nats_url, "nats://localhost:4222");
        assert_eq!(config.message_bus.data_topic, "daq/data");
        assert_eq!(config.message_bus.info_topic, "daq/info");
        assert!((config.sampling.max_signal_fraction - 0.1).abs() < f64::EPSILON);
        assert!((config.sampling.period_hours - 3.0).abs() < f64::EPSILON);
        assert!((config.sampling.events_per_hour - 300.0).abs() < f64::EPSILON);
        assert_eq!(config.sampling.epoch.timestamp(), 1_698_019_200);
        assert_eq!(config.imaging.jpeg_quality, 80);
        assert_eq!(config.ledger.path, PathBuf::from("truth.db"));
        assert_eq!(config.logging.format, LogFormat::Text);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parse_empty_yaml() {
        let config = InjectorConfig::parse("").unwrap();
        assert_eq!(config, InjectorConfig::default());
    }

    #[test]
    fn parse_partial_yaml() {
        let yaml = r"
object_store:
  bucket: test-bucket
sampling:
  events_per_hour: 60
  epoch: 2024-01-01T00:00:00Z
logging:
  format: json
";
        let config = InjectorConfig::parse(yaml).unwrap();
        assert_eq!(config.object_store.bucket, "test-bucket");
        assert_eq!(config.object_store.endpoint, "minio:9000");
        assert!((config.sampling.events_per_hour - 60.0).abs() < f64::EPSILON);
        assert_eq!(config.sampling.epoch.to_rfc3339(), "2024-01-01T00:00:00+00:00");
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn malformed_yaml_is_rejected() {
        let result = InjectorConfig::parse("sampling: [not, a, map]");
        assert!(matches!(result, Err(ConfigError::Yaml { .. })));
    }

    #[test]
    fn missing_file_reports_path() {
        let result = InjectorConfig::from_file(Path::new("/nonexistent/daq-injector.yaml"));
        match result {
            Err(ConfigError::Io { path, .. }) => {
                assert_eq!(path, PathBuf::from("/nonexistent/daq-injector.yaml"));
            }
            other => panic!("expected Io error, got {other:?}"),
        }
    }

    #[test]
    fn overrides_use_deployment_names() {
        let mut config = InjectorConfig::default();
        config
            .apply_overrides(env(&[
                ("MINIO_URL", "localhost:9000"),
                ("MINIO_USER", "daq"),
                ("MINIO_ACCESS_KEY", "s3cret"),
                ("BUCKET_NAME", "events"),
                ("NATS_SERVER", "nats://bus:4222"),
                ("HTTP_DATA_SOURCE", "https://example.org/data.tar"),
                ("CACHE_DIR", "/var/cache/daq"),
                ("ORIGINAL_DATASET_CACHE", "/data/original"),
                ("MAX_SIGNAL_FRACTION", "0.25"),
                ("PERIOD_HOURS", "6"),
                ("EVENTS_PER_HOUR", "120"),
                ("NOISE_LEVEL", "0.05"),
                ("JPEG_QUALITY", "95"),
                ("SQLITE_TRUTH", "/data/truth.db"),
                ("LOG_FORMAT", "JSON"),
            ]))
            .unwrap();

        assert_eq!(config.object_store.endpoint, "localhost:9000");
        assert_eq!(config.object_store.access_key, "daq");
        assert_eq!(config.object_store.secret_key, "s3cret");
        assert_eq!(config.object_store.bucket, "events");
        assert_eq!(config.message_bus.nats_url, "nats://bus:4222");
        assert_eq!(config.dataset.archive_url, "https://example.org/data.tar");
        assert_eq!(config.dataset.cache_root, PathBuf::from("/var/cache/daq"));
        assert_eq!(config.dataset.cache_dir(), PathBuf::from("/data/original"));
        assert!((config.sampling.max_signal_fraction - 0.25).abs() < f64::EPSILON);
        assert!((config.sampling.period_hours - 6.0).abs() < f64::EPSILON);
        assert!((config.sampling.events_per_hour - 120.0).abs() < f64::EPSILON);
        assert!((config.imaging.noise_level - 0.05).abs() < f64::EPSILON);
        assert_eq!(config.imaging.jpeg_quality, 95);
        assert_eq!(config.ledger.path, PathBuf::from("/data/truth.db"));
        assert_eq!(config.logging.format, LogFormat::Json);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn unset_variables_keep_file_values() {
        let mut config = InjectorConfig::parse("object_store:\n  bucket: from-file\n").unwrap();
        config.apply_overrides(env(&[])).unwrap();
        assert_eq!(config.object_store.bucket, "from-file");
    }

    #[test]
    fn malformed_override_names_the_variable() {
        let mut config = InjectorConfig::default();
        let result = config.apply_overrides(env(&[("EVENTS_PER_HOUR", "lots")]));
        match result {
            Err(ConfigError::InvalidEnv { name, value, .. }) => {
                assert_eq!(name, "EVENTS_PER_HOUR");
                assert_eq!(value, "lots");
            }
            other => panic!("expected InvalidEnv, got {other:?}"),
        }
    }

    #[test]
    fn epoch_override_is_rfc3339() {
        let mut config = InjectorConfig::default();
        config
            .apply_overrides(env(&[("SIMULATION_EPOCH", "2025-03-01T12:00:00Z")]))
            .unwrap();
        assert_eq!(config.sampling.epoch.to_rfc3339(), "2025-03-01T12:00:00+00:00");

        let result = config.apply_overrides(env(&[("SIMULATION_EPOCH", "yesterday")]));
        assert!(matches!(result, Err(ConfigError::InvalidEnv { .. })));
    }

    #[test]
    fn empty_archive_url_is_missing_source() {
        let mut config = InjectorConfig::default();
        config.apply_overrides(env(&[("HTTP_DATA_SOURCE", "")])).unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::MissingArchiveSource)));
    }

    #[test]
    fn out_of_range_values_are_invalid() {
        let cases: [(&str, fn(&mut InjectorConfig)); 6] = [
            ("sampling.max_signal_fraction", |c| c.sampling.max_signal_fraction = 1.5),
            ("sampling.period_hours", |c| c.sampling.period_hours = 0.0),
            ("sampling.events_per_hour", |c| c.sampling.events_per_hour = f64::NAN),
            ("imaging.noise_level", |c| c.imaging.noise_level = -0.1),
            ("imaging.jpeg_quality", |c| c.imaging.jpeg_quality = 0),
            ("object_store.presign_ttl_secs", |c| c.object_store.presign_ttl_secs = 0),
        ];
        for (expected, mutate) in cases {
            let mut config = InjectorConfig::default();
            mutate(&mut config);
            match config.validate() {
                Err(ConfigError::Invalid { field, .. }) => assert_eq!(field, expected),
                other => panic!("{expected}: expected Invalid, got {other:?}"),
            }
        }
    }

    #[test]
    fn same_topic_for_data_and_info_is_invalid() {
        let mut config = InjectorConfig::default();
        config.message_bus.info_topic = config.message_bus.data_topic.clone();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn resolve_keeps_ledger_path_despite_invalid_values() {
        let lookup = env(&[
            ("HTTP_DATA_SOURCE", ""),
            ("EVENTS_PER_HOUR", "0"),
            ("SQLITE_TRUTH", "/data/truth.db"),
        ]);
        let config = InjectorConfig::resolve_with(None, lookup).unwrap();
        assert_eq!(config.ledger.path, PathBuf::from("/data/truth.db"));
        assert!(config.validate().is_err());
    }

    #[test]
    fn resolve_reads_file_then_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("daq-injector.yaml");
        std::fs::write(&path, "ledger:\n  path: /from/file.db\nlogging:\n  level: debug\n")
            .unwrap();

        let config =
            InjectorConfig::resolve_with(Some(&path), env(&[("LOG_LEVEL", "trace")])).unwrap();
        assert_eq!(config.ledger.path, PathBuf::from("/from/file.db"));
        assert_eq!(config.logging.level, "trace");
    }

    #[test]
    fn resolve_still_rejects_malformed_overrides() {
        let result = InjectorConfig::resolve_with(None, env(&[("EVENTS_PER_HOUR", "lots")]));
        assert!(matches!(result, Err(ConfigError::InvalidEnv { .. })));
    }

    #[test]
    fn endpoint_url_adds_scheme() {
        let mut store = ObjectStoreConfig::default();
        assert_eq!(store.endpoint_url(), "http://minio:9000");
        store.secure = true;
        assert_eq!(store.endpoint_url(), "https://minio:9000");
        store.endpoint = "http://localhost:9000".to_owned();
        assert_eq!(store.endpoint_url(), "http://localhost:9000");
    }

    #[test]
    fn log_format_parses_case_insensitively() {
        assert_eq!("Text".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert!("xml".parse::<LogFormat>().is_err());
    }
}
