use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use map_picker::{
    BaatoClient, ChannelSurface, LifecycleEvent, PickerConfig, PickerScreen, PlaceId, PlacesApi,
    SearchResultEntry, SurfaceCall,
};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "map-picker", about = "Search, pick and confirm a location via the Baato API")]
struct Args {
    #[arg(long, env = "BAATO_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    #[arg(long, env = "BAATO_BASE_URL")]
    base_url: Option<String>,

    /// JSON configuration file; command line values override it
    #[arg(long, env = "MAP_PICKER_CONFIG")]
    config: Option<PathBuf>,

    #[arg(long)]
    limit: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List places matching a query
    Search { query: String },
    /// Show the full record of one place
    Detail { place_id: PlaceId },
    /// Print the map style URL
    StyleUrl,
    /// Run the picker headlessly: search, pick a suggestion, confirm
    Pick {
        query: String,
        /// Which suggestion to pick
        #[arg(long, default_value_t = 0)]
        index: usize,
        /// Seconds to wait for each step
        #[arg(long, default_value_t = 15)]
        wait_secs: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = load_config(&args).await?;
    let client = BaatoClient::new(config.api.clone())?;

    match args.command {
        Command::Search { query } => {
            let entries = client.search(&query, config.api.search_limit).await?;
            info!("Found {} places for {:?}", entries.len(), query);
            for (i, entry) in entries.iter().enumerate() {
                println!("{}. {} [{}]", i + 1, entry.name, entry.place_id);
                println!("   {}", entry.address);
            }
        }
        Command::Detail { place_id } => {
            let detail = client.fetch_detail(place_id).await?;
            println!("{}", serde_json::to_string_pretty(&detail)?);
        }
        Command::StyleUrl => println!("{}", client.style_url()),
        Command::Pick {
            query,
            index,
            wait_secs,
        } => {
            let api: Arc<dyn PlacesApi> = Arc::new(client);
            let (surface, calls) = ChannelSurface::new();
            let (screen, handle) = PickerScreen::new(&config, api, surface);
            let screen = tokio::spawn(screen.run());

            let mut driver = Driver {
                calls,
                wait: Duration::from_secs(wait_secs),
            };

            handle.type_query(query.as_str())?;
            let suggestions = driver.suggestions().await?;
            let entry = suggestions
                .get(index)
                .cloned()
                .with_context(|| format!("Only {} suggestions for {:?}", suggestions.len(), query))?;
            info!("Picking {} ({})", entry.name, entry.address);

            handle.pick_suggestion(entry)?;
            driver.settled().await?;
            handle.confirm()?;
            handle.lifecycle(LifecycleEvent::Destroy)?;

            let confirmed = screen
                .await
                .context("Picker screen task failed")?
                .context("Picker closed without a confirmed location")?;
            println!("{}", serde_json::to_string_pretty(&confirmed)?);
        }
    }

    Ok(())
}

async fn load_config(args: &Args) -> anyhow::Result<PickerConfig> {
    let mut config = match &args.config {
        Some(path) => PickerConfig::from_json_file(path).await?,
        None => PickerConfig::default(),
    };
    if let Some(key) = &args.api_key {
        config.api.api_key = key.clone();
    }
    if let Some(url) = &args.base_url {
        config.api.base_url = url.clone();
    }
    if let Some(limit) = args.limit {
        config.api.search_limit = limit;
    }
    config.validate()?;
    Ok(config)
}

/// Follows what the headless screen asks the surface to do
struct Driver {
    calls: UnboundedReceiver<SurfaceCall>,
    wait: Duration,
}

impl Driver {
    async fn next(&mut self) -> anyhow::Result<SurfaceCall> {
        tokio::time::timeout(self.wait, self.calls.recv())
            .await
            .context("Timed out waiting for the picker")?
            .context("Picker screen stopped")
    }

    async fn suggestions(&mut self) -> anyhow::Result<Vec<SearchResultEntry>> {
        loop {
            if let SurfaceCall::ShowSuggestions { entries, visible } = self.next().await? {
                if visible && !entries.is_empty() {
                    return Ok(entries);
                }
            }
        }
    }

    /// Wait until the picked place has moved the camera
    async fn settled(&mut self) -> anyhow::Result<()> {
        loop {
            match self.next().await? {
                SurfaceCall::AnimateCamera(camera) => {
                    info!("Camera moved to {} at zoom {}", camera.target, camera.zoom);
                    return Ok(());
                }
                SurfaceCall::Notice(message) => {
                    warn!("{}", message);
                    anyhow::bail!("Picking failed: {message}");
                }
                _ => {}
            }
        }
    }
}
