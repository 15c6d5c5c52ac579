use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use fretmap_core::rail::{RailGeometryCache, RailGeometryResolver, SqliteStore};
use fretmap_core::transit::{ScheduleExport, ScheduleProvider, StaticScheduleProvider};
use fretmap_core::ResolverConfig;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

mod output;

use output::write_cache_geojson;

#[derive(Parser, Debug)]
#[command(
    name = "rail-cache",
    author,
    version,
    about = "Warm and export the rail geometry cache for a freight schedule",
    long_about = "Resolves real rail paths between every origin/destination pair of a \
                  schedule export and stores them in the SQLite rail geometry cache, \
                  so the server never has to wait on the routing service.\n\n\
                  Pairs already cached in either direction are not fetched again."
)]
struct Args {
    /// SQLite database holding the rail geometry cache
    #[arg(long, env = "FRETMAP_CACHE_DB", default_value = "fretmap.sqlite", global = true)]
    db: PathBuf,

    /// Verbose output (show debug messages)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve and cache rail geometry for every route of a schedule
    Warm {
        /// Schedule export (platforms and services) as JSON
        #[arg(short, long, env = "FRETMAP_SCHEDULE")]
        schedule: PathBuf,

        /// BRouter-compatible routing endpoint
        #[arg(long, env = "FRETMAP_ROUTING_URL")]
        routing_url: Option<String>,

        /// Overpass-compatible interpreter endpoint
        #[arg(long, env = "FRETMAP_OVERPASS_URL")]
        overpass_url: Option<String>,

        /// Routing profile name
        #[arg(long, env = "FRETMAP_ROUTING_PROFILE")]
        profile: Option<String>,

        /// Stop after this many routes
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Write every cached rail path to a GeoJSON file
    Export {
        /// Output GeoJSON file
        #[arg(short, long)]
        output: PathBuf,
    },
}

#[derive(Debug, Default)]
struct WarmStats {
    cached: usize,
    resolved: usize,
    missing: Vec<String>,
}

fn load_schedule(path: &Path) -> Result<StaticScheduleProvider> {
    if !path.exists() {
        bail!("Schedule file does not exist: {}", path.display());
    }

    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let export: ScheduleExport =
        serde_json::from_reader(BufReader::new(file)).context("Failed to parse schedule export")?;
    StaticScheduleProvider::from_export(export).context("Invalid schedule export")
}

fn open_cache(db: &Path, config: &ResolverConfig) -> Result<Arc<RailGeometryCache>> {
    let store = SqliteStore::open(db)
        .with_context(|| format!("Failed to open cache {}", db.display()))?;
    Ok(Arc::new(RailGeometryCache::new(Arc::new(store), config.cache_ttl)))
}

async fn warm(
    db: &Path,
    schedule: &Path,
    config: ResolverConfig,
    limit: Option<usize>,
) -> Result<WarmStats> {
    let provider = load_schedule(schedule)?;
    let mut routes = provider.all_routes();
    if let Some(limit) = limit {
        routes.truncate(limit);
    }
    log::info!("Schedule has {} routes to resolve", routes.len());

    let cache = open_cache(db, &config)?;
    let resolver = RailGeometryResolver::from_config(&config, cache)
        .context("Failed to build resolver")?;

    let pb = ProgressBar::new(routes.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .context("Invalid progress template")?
            .progress_chars("=> "),
    );

    let mut stats = WarmStats::default();
    for route in &routes {
        pb.set_message(route.pair.to_string());

        let already_cached = resolver.cache().contains(&route.pair)?;
        let resolved = resolver
            .resolve(&route.pair, route.from.0, route.to.0)
            .await
            .with_context(|| format!("Failed to resolve {}", route.pair))?;

        match resolved {
            Some(_) if already_cached => stats.cached += 1,
            Some(_) => stats.resolved += 1,
            None => stats.missing.push(route.pair.to_string()),
        }
        pb.inc(1);
    }
    pb.finish_with_message("done");

    Ok(stats)
}

fn export(db: &Path, output_path: &Path) -> Result<()> {
    let cache = open_cache(db, &ResolverConfig::default())?;
    let entries = cache.entries().context("Failed to read rail geometry cache")?;

    if entries.is_empty() {
        log::warn!("Cache is empty; writing an empty FeatureCollection");
    }

    write_cache_geojson(&entries, output_path)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if args.verbose { "debug" } else { "info" }),
    )
    .format_timestamp(None)
    .init();

    log::info!("Cache: {}", args.db.display());

    match args.command {
        Command::Warm {
            schedule,
            routing_url,
            overpass_url,
            profile,
            limit,
        } => {
            let mut config = ResolverConfig::default();
            if let Some(url) = routing_url {
                config.routing_url = url;
            }
            if let Some(url) = overpass_url {
                config.overpass_url = url;
            }
            if let Some(profile) = profile {
                config.routing_profile = profile;
            }

            let stats = warm(&args.db, &schedule, config, limit).await?;

            log::info!("");
            log::info!("=== Summary ===");
            log::info!("Already cached: {}", stats.cached);
            log::info!("Newly resolved: {}", stats.resolved);
            log::info!("Not found:      {}", stats.missing.len());
            for pair in &stats.missing {
                log::warn!("  no rail geometry for {pair}");
            }
        }
        Command::Export { output } => {
            export(&args.db, &output)?;
            log::info!("Wrote {}", output.display());
        }
    }

    Ok(())
}
