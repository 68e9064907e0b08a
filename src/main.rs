use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::{Result, eyre};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use photogrid::application::LoadFeedUseCase;
use photogrid::infrastructure::image::{DiskCacheHandle, LoadDispatch, resolve_cache_dir};
use photogrid::infrastructure::{
    AppConfig, CliArgs, FeedClient, HttpImageFetcher, ImageLoader, StorageManager,
};
use photogrid::presentation::{PhotoGrid, PhotoScreen, PreviewPane, SettleReport, UiDispatcher};

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
        tracing_subscriber::registry().with(filter).init();
    }

    Ok(())
}

fn load_config(args: &CliArgs) -> Result<AppConfig> {
    let storage = StorageManager::new()?;
    let mut config = storage.load_config(args.config.as_deref())?;
    config.merge_with_args(args);
    Ok(config)
}

fn print_report(label: &str, report: &SettleReport, painted_now: usize) {
    println!(
        "{label}: {} painted from memory, {} from workers (memory {}, disk {}, network {}), {} superseded, {} failed",
        painted_now,
        report.painted,
        report.from_memory,
        report.from_disk,
        report.from_network,
        report.superseded,
        report.failed,
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = CliArgs::parse();
    let config = load_config(&args)?;
    init_logging(&config)?;

    info!(version = photogrid::VERSION, "Starting {}", photogrid::NAME);

    let loader_config = config.loader.to_loader_config();
    let cache_dir = resolve_cache_dir(
        config.loader.cache_dir.as_deref(),
        config.loader.shared_cache_root.as_deref(),
    );
    let disk = DiskCacheHandle::spawn_open(cache_dir, config.loader.disk_cache_bytes);
    let fetcher = Arc::new(HttpImageFetcher::new(config.loader.timeout_secs)?);
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let loader = ImageLoader::new(loader_config.clone(), fetcher, disk, event_tx);
    let mut dispatcher = UiDispatcher::new(event_rx);

    if args.clear_cache {
        loader.clear_all().await;
    }

    let feed = Arc::new(FeedClient::new(&config.feed, config.loader.timeout_secs)?);
    let urls = LoadFeedUseCase::new(feed).execute().await?;
    println!("Feed returned {} photos", urls.len());

    let columns = args.columns.max(1);
    let cell_width = loader_config.screen_width / u32::try_from(columns)?;
    let grid = PhotoGrid::new(columns, args.rows, cell_width, cell_width);
    let preview = PreviewPane::new(loader_config.screen_width, loader_config.screen_height);
    let mut screen = PhotoScreen::new(grid, preview);
    screen.grid.set_urls(urls.clone());

    let bind = screen.grid.bind_visible(&loader);
    let report = dispatcher.settle(&loader, &mut screen, bind.queued).await;
    print_report("first page", &report, bind.painted);

    for _ in 0..args.scroll {
        let bind = screen.grid.scroll_by(1, &loader);
        let report = dispatcher.settle(&loader, &mut screen, bind.queued).await;
        print_report(&format!("row {}", screen.grid.first_row()), &report, bind.painted);
    }
    if args.scroll > 0 {
        let bind = screen.grid.scroll_to(0, &loader);
        let report = dispatcher.settle(&loader, &mut screen, bind.queued).await;
        print_report("back to top", &report, bind.painted);
    }

    if let Some(index) = args.preview {
        let url = urls
            .get(index)
            .ok_or_else(|| eyre!("preview index {index} is outside the feed"))?;
        match screen.preview.open(url, &loader)? {
            LoadDispatch::Painted => {
                println!("preview: painted from memory");
            }
            LoadDispatch::Queued(handle) => {
                let report = dispatcher.settle(&loader, &mut screen, vec![handle]).await;
                print_report("preview", &report, 0);
            }
        }
        if let Some(image) = screen.preview.painted_image() {
            println!("preview: {}x{}", image.width(), image.height());
        }
    }

    println!("memory cache: {}", loader.memory_cache_stats());
    match loader.disk_cache().await {
        Some(disk) => println!(
            "disk cache: {} entries, {} / {} bytes at {}",
            disk.len().await,
            disk.current_size().await,
            disk.max_size(),
            disk.cache_dir().display()
        ),
        None => warn!("Disk cache was unavailable for this run"),
    }

    screen.release_all(&loader);
    loader.shutdown().await;

    Ok(())
}
