// src/main.rs v4
//! Building Finder - search an address and highlight the building there

use anyhow::Context;
use building_finder::{
    config::{MapConfig, TOKEN_ENV},
    display::{build_tile_cache, build_view, terminal::TerminalDisplay},
    view::SearchOutcome,
    MapboxGeocoder,
};
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "building-finder", version, about)]
struct Cli {
    /// Mapbox access token (overrides config and MAPBOX_ACCESS_TOKEN)
    #[arg(long, global = true)]
    token: Option<String>,

    /// GeoJSON file with building footprints
    #[arg(long, global = true)]
    buildings: Option<PathBuf>,

    /// GeoJSON file with house number points
    #[arg(long, global = true)]
    house_numbers: Option<PathBuf>,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Open the map window (default)
    Gui,
    /// Geocode one address without a window and print the result
    Search {
        #[arg(required = true)]
        address: Vec<String>,
    },
    /// Show basemap tile cache usage
    Cache {
        /// Delete every cached tile
        #[arg(long)]
        clear: bool,
    },
    /// Print the effective configuration
    Config {
        /// Also write it to the config file
        #[arg(long)]
        save: bool,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,building_finder={}", level)));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

fn run_search(config: &MapConfig, address: &str) -> anyhow::Result<()> {
    let geocoder = MapboxGeocoder::new(&config.api_base, config.access_token()?)?;
    let mut view = build_view(config, 1024.0, 768.0)?;
    view.set_query(address);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    let outcome = runtime.block_on(view.search(&geocoder));

    let mut stdout = std::io::stdout().lock();
    TerminalDisplay::new().render(&mut stdout, &view, &outcome)?;

    if let SearchOutcome::Failed(reason) = outcome {
        anyhow::bail!(reason);
    }
    Ok(())
}

fn run_cache(config: &MapConfig, clear: bool) -> anyhow::Result<()> {
    let cache = build_tile_cache(config)?;
    if clear {
        cache.clear_memory_cache();
        cache.clear_disk_cache()?;
        tracing::info!("Tile cache cleared");
    }

    let stats = cache.get_stats();
    println!("Cache directory: {}", config.resolved_tile_cache_dir()?.display());
    println!("Tiles in memory: {}", stats.memory_tiles);
    println!("Tiles on disk:   {} ({:.2} MB)", stats.disk_tiles, stats.disk_size_mb);
    Ok(())
}

#[cfg(feature = "gui")]
fn run_gui(config: &MapConfig) -> anyhow::Result<()> {
    building_finder::display::gui::run(config)?;
    Ok(())
}

#[cfg(not(feature = "gui"))]
fn run_gui(_config: &MapConfig) -> anyhow::Result<()> {
    anyhow::bail!("this build has no window support; rebuild with `--features gui` or use `search`")
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = MapConfig::load().unwrap_or_else(|e| {
        tracing::warn!("Using default configuration: {}", e);
        let mut config = MapConfig::default();
        config.override_token(std::env::var(TOKEN_ENV).ok());
        config
    });
    config.override_token(cli.token);
    if cli.buildings.is_some() {
        config.buildings_path = cli.buildings;
    }
    if cli.house_numbers.is_some() {
        config.house_numbers_path = cli.house_numbers;
    }

    match cli.command.unwrap_or(Command::Gui) {
        Command::Gui => run_gui(&config),
        Command::Search { address } => run_search(&config, &address.join(" ")),
        Command::Cache { clear } => run_cache(&config, clear),
        Command::Config { save } => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            if save {
                config.save()?;
                println!("Saved to {}", MapConfig::config_path()?.display());
            }
            Ok(())
        }
    }
}
