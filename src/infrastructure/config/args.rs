use super::app_config::LogLevel;
use clap::Parser;
use std::path::PathBuf;

/// Command line arguments.
#[derive(Debug, Parser)]
#[command(
    name = "photogrid",
    version,
    about = "Photo feed grid with a memory and disk backed image loader",
    long_about = None
)]
pub struct CliArgs {
    /// Configuration file path.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log file path.
    #[arg(long, value_name = "PATH")]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Feed API client id.
    #[arg(long, env = "PHOTOGRID_CLIENT_ID")]
    pub client_id: Option<String>,

    /// Photos requested from the feed.
    #[arg(long)]
    pub per_page: Option<u32>,

    /// Disk cache directory.
    #[arg(long, value_name = "PATH")]
    pub cache_dir: Option<PathBuf>,

    /// Grid columns.
    #[arg(long, default_value_t = 3)]
    pub columns: usize,

    /// Grid rows.
    #[arg(long, default_value_t = 4)]
    pub rows: usize,

    /// Number of rows to scroll down and back up after the first page.
    #[arg(long, default_value_t = 0)]
    pub scroll: usize,

    /// Open the photo at this feed index in the full-screen preview.
    #[arg(long, value_name = "INDEX")]
    pub preview: Option<usize>,

    /// Clear memory and disk caches before loading.
    #[arg(long)]
    pub clear_cache: bool,
}
