mod error;
mod routes;
mod state;

use std::fs::File;
use std::io::BufReader;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use fretmap_core::rail::{RailGeometryCache, RailGeometryResolver, SqliteStore};
use fretmap_core::simulation::{ClockController, LocalWallClock, PathRegistry};
use fretmap_core::transit::{ScheduleExport, ScheduleProvider, StaticScheduleProvider};
use fretmap_core::{ClockConfig, ResolverConfig};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::state::AppState;

#[derive(Parser, Debug)]
#[command(name = "fretmap-server")]
#[command(about = "Serve simulated freight train positions over HTTP")]
struct Args {
    /// Schedule export (platforms and services) as JSON
    #[arg(long, env = "FRETMAP_SCHEDULE")]
    schedule: PathBuf,

    /// SQLite database holding the rail geometry cache
    #[arg(long, env = "FRETMAP_CACHE_DB", default_value = "fretmap.sqlite")]
    cache_db: PathBuf,

    #[arg(long, env = "FRETMAP_LISTEN", default_value = "127.0.0.1:8080")]
    listen: SocketAddr,

    /// BRouter-compatible routing endpoint
    #[arg(long, env = "FRETMAP_ROUTING_URL")]
    routing_url: Option<String>,

    /// Overpass-compatible interpreter endpoint
    #[arg(long, env = "FRETMAP_OVERPASS_URL")]
    overpass_url: Option<String>,

    /// Serve synthesized arcs only; never call the routing service
    #[arg(long, env = "FRETMAP_NO_WARM")]
    no_warm: bool,
}

impl Args {
    fn resolver_config(&self) -> ResolverConfig {
        let mut config = ResolverConfig::default();
        if let Some(url) = &self.routing_url {
            config.routing_url = url.clone();
        }
        if let Some(url) = &self.overpass_url {
            config.overpass_url = url.clone();
        }
        config
    }
}

fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(filter)
        .init();
}

fn load_schedule(path: &Path) -> Result<StaticScheduleProvider> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open schedule {}", path.display()))?;
    let export: ScheduleExport =
        serde_json::from_reader(BufReader::new(file)).context("Failed to parse schedule export")?;
    StaticScheduleProvider::from_export(export).context("Invalid schedule")
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_logging();
    let args = Args::parse();

    let schedule = Arc::new(load_schedule(&args.schedule)?);
    let routes = schedule.all_routes();
    info!(
        platforms = schedule.all_platforms().len(),
        services = schedule.all_services().len(),
        routes = routes.len(),
        "Loaded schedule"
    );

    let paths = Arc::new(PathRegistry::seeded(routes.iter().map(Arc::as_ref)));

    if !args.no_warm {
        let config = args.resolver_config();
        let store =
            SqliteStore::open(&args.cache_db).context("Failed to open rail geometry cache")?;
        let cache = Arc::new(RailGeometryCache::new(Arc::new(store), config.cache_ttl));
        let resolver = RailGeometryResolver::from_config(&config, cache)
            .context("Failed to build resolver")?;

        let paths = paths.clone();
        tokio::spawn(async move {
            if let Err(e) = resolver.warm(routes.iter(), &paths).await {
                error!(error = %e, "Rail geometry warm-up stopped");
            }
        });
    }

    let app_state = Arc::new(AppState {
        schedule,
        paths,
        clock: ClockController::start(Arc::new(LocalWallClock), ClockConfig::default()),
    });

    let listener = tokio::net::TcpListener::bind(args.listen)
        .await
        .with_context(|| format!("Failed to bind {}", args.listen))?;
    info!(addr = %args.listen, "Listening");

    axum::serve(listener, routes::create_router(app_state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("Server failed")
}
