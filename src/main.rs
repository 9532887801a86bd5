use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use haul_distance::{
    DistanceCache, DistanceEngine, EngineConfig, FileStore, MAX_PLAUSIBLE_KM,
    config::ENV_API_KEY, coords::CoordinateStore, table::PrecomputedTable,
};
use tracing_subscriber::EnvFilter;

/// Resolve haul distances between named locations
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// TOML config file (defaults to HAUL_DISTANCE_* environment variables)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the persisted distance cache
    #[arg(long, global = true, default_value = ".haul-distance")]
    cache_dir: PathBuf,

    /// Coordinate asset (JSON name -> {lat, lon}); builtin set if omitted
    #[arg(long, global = true)]
    coordinates: Option<PathBuf>,

    /// Precomputed distance asset (JSON origin -> destination -> km); builtin table if omitted
    #[arg(long, global = true)]
    table: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve a distance from local data only
    Resolve {
        from: String,
        to: String,
        /// Also print which layer answered
        #[arg(long)]
        detailed: bool,
    },
    /// Fetch an authoritative distance online and cache it
    Warm { from: String, to: String },
    /// List every known location
    Locations,
    /// Regenerate a distance table from the coordinate asset
    GenerateTable {
        #[arg(short, long)]
        output: PathBuf,
        /// Leave out pairs farther apart than this
        #[arg(long, default_value_t = MAX_PLAUSIBLE_KM)]
        max_km: f64,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<EngineConfig, Box<dyn Error>> {
    match &cli.config {
        Some(path) => {
            let mut config = EngineConfig::load(path)?;
            if config.api_key.is_none() {
                config.api_key = std::env::var(ENV_API_KEY).ok().filter(|k| !k.is_empty());
            }
            Ok(config)
        }
        None => Ok(EngineConfig::from_env()?),
    }
}

fn build_engine(cli: &Cli, coordinates: CoordinateStore) -> Result<DistanceEngine, Box<dyn Error>> {
    let table = match &cli.table {
        Some(path) => PrecomputedTable::load(path)?,
        None => PrecomputedTable::builtin()?,
    };
    let config = load_config(cli)?;
    tracing::debug!(?config, "loaded configuration");

    let cache = DistanceCache::load(Arc::new(FileStore::new(&cli.cache_dir)));
    Ok(DistanceEngine::new(config, Arc::new(coordinates), Arc::new(table), Arc::new(cache))?)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    init_logging();
    let cli = Cli::parse();

    let coordinates = match &cli.coordinates {
        Some(path) => CoordinateStore::load(path)?,
        None => CoordinateStore::builtin()?,
    };

    match &cli.command {
        Command::GenerateTable { output, max_km } => {
            let table = PrecomputedTable::from_coordinates(&coordinates, *max_km);
            table.save_to_file(output)?;
            tracing::info!(entries = table.len(), path = %output.display(), "wrote distance table");
        }
        Command::Resolve { from, to, detailed } => {
            let engine = build_engine(&cli, coordinates)?;
            match engine.resolve_detailed(from, to) {
                Some(resolution) if *detailed => println!("{} km ({:?})", resolution.km, resolution.source),
                Some(resolution) => println!("{}", resolution.km),
                None => println!("unavailable"),
            }
        }
        Command::Warm { from, to } => {
            let engine = build_engine(&cli, coordinates)?;
            match engine.warm_distance(from, to).await {
                Some(km) => println!("{}", km),
                None => {
                    tracing::warn!(%from, %to, "no online distance available");
                    println!("unavailable");
                }
            }
        }
        Command::Locations => {
            let engine = build_engine(&cli, coordinates)?;
            for name in engine.list_known_locations() {
                println!("{}", name);
            }
        }
    }

    Ok(())
}
