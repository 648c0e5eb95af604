use super::app_config::LogLevel;
use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments.
#[derive(Debug, Parser)]
#[command(
    name = "avatar-picker",
    version,
    about = "Browse, filter and upload profile avatars for a media server",
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

    /// Search term matched against image URLs and names.
    #[arg(short, long, default_value = "")]
    pub search: String,

    /// Category to show.
    #[arg(long, default_value = "")]
    pub category: String,

    /// Print the available categories and exit.
    #[arg(long)]
    pub list_categories: bool,

    /// Download the shown images into this directory.
    #[arg(short, long, value_name = "DIR")]
    pub download_dir: Option<PathBuf>,

    /// Download every shown image, not only those in the first screen.
    #[arg(long, requires = "download_dir")]
    pub all: bool,

    /// Upload this image URL as the profile picture.
    #[arg(long, value_name = "URL")]
    pub select: Option<String>,

    /// Ignore the cached catalog.
    #[arg(long)]
    pub refresh: bool,

    /// Catalog URL.
    #[arg(long, value_name = "URL")]
    pub images_url: Option<String>,

    /// Category list URL.
    #[arg(long, value_name = "URL")]
    pub categories_url: Option<String>,

    /// Maximum number of concurrent image loads.
    #[arg(long)]
    pub max_concurrency: Option<usize>,

    /// Load images nearest the viewport center first.
    #[arg(long)]
    pub prioritize_viewport: Option<bool>,

    /// Viewport height in pixels.
    #[arg(long)]
    pub viewport_height: Option<f64>,

    /// Media server URL.
    #[arg(long, value_name = "URL", env = "AVATAR_PICKER_SERVER")]
    pub server_url: Option<String>,

    /// Preferred language.
    #[arg(long)]
    pub language: Option<String>,

    /// Key-value store file path.
    #[arg(long, value_name = "PATH")]
    pub store_path: Option<PathBuf>,
}
