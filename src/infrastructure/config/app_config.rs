//! Application configuration.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::infrastructure::image::{
    DEFAULT_MAX_CACHE_SIZE, DecodeTarget, DiskFormat, ImageLoaderConfig, codec,
    loader::{DEFAULT_SCREEN_HEIGHT, DEFAULT_SCREEN_WIDTH, DEFAULT_WORKER_THREADS},
    memory_cache::default_budget_kb,
};

const APP_NAME: &str = "photogrid";
const APP_QUALIFIER: &str = "com";
const APP_ORGANIZATION: &str = "linuxmobile";

/// Default photo feed endpoint.
pub const DEFAULT_FEED_ENDPOINT: &str = "https://api.unsplash.com/photos/";
/// Default number of photos requested per feed page.
pub const DEFAULT_PER_PAGE: u32 = 30;

/// Log level configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace level.
    Trace,
    /// Debug level.
    Debug,
    /// Info level.
    #[default]
    Info,
    /// Warning level.
    Warn,
    /// Error level.
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trace => write!(f, "trace"),
            Self::Debug => write!(f, "debug"),
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Application configuration, read from `config.toml` and overridden by CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Log file path.
    #[serde(default)]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Image loader settings.
    #[serde(default)]
    pub loader: LoaderConfig,

    /// Photo feed settings.
    #[serde(default)]
    pub feed: FeedConfig,
}

/// Image loader configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Memory cache budget in KB. Derived from available memory when unset.
    #[serde(default)]
    pub memory_cache_kb: Option<usize>,

    /// Disk cache budget in bytes.
    #[serde(default = "default_disk_cache_bytes")]
    pub disk_cache_bytes: u64,

    /// Number of concurrent fetch workers.
    #[serde(default = "default_worker_threads")]
    pub worker_threads: usize,

    /// Screen width used as decode bound.
    #[serde(default = "default_screen_width")]
    pub screen_width: u32,

    /// Screen height used as decode bound.
    #[serde(default = "default_screen_height")]
    pub screen_height: u32,

    /// JPEG quality for disk re-encoding.
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,

    /// Decode against the screen or the requesting target.
    #[serde(default)]
    pub decode_to: DecodeTarget,

    /// Store re-encoded JPEG or original bytes on disk.
    #[serde(default)]
    pub disk_format: DiskFormat,

    /// HTTP request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Shared storage root; used for the disk cache when mounted.
    #[serde(default)]
    pub shared_cache_root: Option<PathBuf>,

    /// Explicit disk cache directory.
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
}

impl LoaderConfig {
    /// Builds the runtime loader configuration.
    #[must_use]
    pub fn to_loader_config(&self) -> ImageLoaderConfig {
        ImageLoaderConfig {
            memory_cache_kb: self.memory_cache_kb.unwrap_or_else(default_budget_kb),
            worker_threads: self.worker_threads.max(1),
            screen_width: self.screen_width,
            screen_height: self.screen_height,
            decode_to: self.decode_to,
            disk_format: self.disk_format,
            jpeg_quality: self.jpeg_quality,
        }
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            memory_cache_kb: None,
            disk_cache_bytes: default_disk_cache_bytes(),
            worker_threads: default_worker_threads(),
            screen_width: default_screen_width(),
            screen_height: default_screen_height(),
            jpeg_quality: default_jpeg_quality(),
            decode_to: DecodeTarget::default(),
            disk_format: DiskFormat::default(),
            timeout_secs: default_timeout_secs(),
            shared_cache_root: None,
            cache_dir: None,
        }
    }
}

/// Photo feed configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Feed endpoint URL.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// API client id sent as a query parameter.
    #[serde(default)]
    pub client_id: Option<String>,

    /// Photos per page.
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            client_id: None,
            per_page: default_per_page(),
        }
    }
}

fn default_disk_cache_bytes() -> u64 {
    DEFAULT_MAX_CACHE_SIZE
}

fn default_worker_threads() -> usize {
    DEFAULT_WORKER_THREADS
}

fn default_screen_width() -> u32 {
    DEFAULT_SCREEN_WIDTH
}

fn default_screen_height() -> u32 {
    DEFAULT_SCREEN_HEIGHT
}

fn default_jpeg_quality() -> u8 {
    codec::DEFAULT_JPEG_QUALITY
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_endpoint() -> String {
    DEFAULT_FEED_ENDPOINT.to_string()
}

fn default_per_page() -> u32 {
    DEFAULT_PER_PAGE
}

use super::args::CliArgs;

impl AppConfig {
    /// Merges CLI arguments into the configuration.
    pub fn merge_with_args(&mut self, args: &CliArgs) {
        if let Some(log_path) = &args.log_path {
            self.log_path = Some(log_path.clone());
        }
        if let Some(log_level) = args.log_level {
            self.log_level = log_level;
        }
        if let Some(client_id) = &args.client_id {
            self.feed.client_id = Some(client_id.clone());
        }
        if let Some(per_page) = args.per_page {
            self.feed.per_page = per_page;
        }
        if let Some(cache_dir) = &args.cache_dir {
            self.loader.cache_dir = Some(cache_dir.clone());
        }
    }

    /// Returns default log file path.
    #[must_use]
    pub fn default_log_path() -> Option<PathBuf> {
        ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME)
            .map(|dirs| dirs.data_dir().join("photogrid.log"))
    }

    /// Returns effective log path.
    #[must_use]
    pub fn effective_log_path(&self) -> Option<PathBuf> {
        self.log_path.clone().or_else(Self::default_log_path)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_path: None,
            log_level: LogLevel::Info,
            loader: LoaderConfig::default(),
            feed: FeedConfig::default(),
        }
    }
}
