use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::Result;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use avatar_picker::domain::services::FilterCriteria;
use avatar_picker::infrastructure::{
    AppConfig, CliArgs, FileKeyValueStore, HttpClient, StorageManager,
};
use avatar_picker::presentation::{App, PickerRequest};

fn init_logging(config: &AppConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.to_string()));

    if let Some(log_path) = config.effective_log_path() {
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)?;

        let file_layer = fmt::layer()
            .with_writer(file)
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .init();

        info!(path = %log_path.display(), "Logging initialized");
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    Ok(())
}

async fn create_app() -> Result<App> {
    let args = CliArgs::parse();

    let mut config = match StorageManager::new() {
        Ok(manager) => manager.load_config(args.config.as_deref())?,
        Err(_) => AppConfig::default(),
    };
    config.merge_with_args(&args);

    init_logging(&config)?;

    info!(
        version = avatar_picker::VERSION,
        config = ?config.effective_config_path(),
        "Starting avatar picker"
    );

    let http = HttpClient::new(config.loading.request_timeout_secs)?;
    let store = match &args.store_path {
        Some(path) => FileKeyValueStore::open(path).await?,
        None => FileKeyValueStore::open_default().await?,
    };

    let request = PickerRequest {
        criteria: FilterCriteria::new(args.search, args.category),
        list_categories: args.list_categories,
        download_dir: args.download_dir,
        download_all: args.all,
        select: args.select,
        refresh: args.refresh,
    };

    Ok(App::new(config, request, http, Arc::new(store)))
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let app = create_app().await?;

    app.run().await
}
