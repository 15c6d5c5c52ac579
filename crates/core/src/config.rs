use std::time::Duration;

/// Tick periods of the virtual clock.
#[derive(Clone, Debug)]
pub struct ClockConfig {
    /// How often Live mode re-reads the wall clock
    pub live_poll: Duration,
    /// Real time per simulated minute while Playing
    pub play_tick: Duration,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            live_poll: Duration::from_secs(30),
            play_tick: Duration::from_millis(100),
        }
    }
}

/// External services and limits used to resolve rail geometry.
#[derive(Clone, Debug)]
pub struct ResolverConfig {
    /// BRouter-compatible point-to-point endpoint
    pub routing_url: String,
    pub routing_profile: String,
    pub routing_timeout: Duration,
    /// Overpass-compatible interpreter endpoint
    pub overpass_url: String,
    pub overpass_timeout: Duration,
    pub user_agent: String,
    /// Pause before each routing call
    pub routing_delay: Duration,
    /// Pause before each Overpass query
    pub overpass_delay: Duration,
    /// Cached paths are subsampled down to this many points
    pub max_points: usize,
    /// How long the in-memory copy of the persisted cache is trusted
    pub cache_ttl: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            routing_url: "https://brouter.de/brouter".to_string(),
            routing_profile: "rail".to_string(),
            routing_timeout: Duration::from_secs(20),
            overpass_url: "https://overpass-api.de/api/interpreter".to_string(),
            overpass_timeout: Duration::from_secs(10),
            user_agent: concat!("fretmap/", env!("CARGO_PKG_VERSION")).to_string(),
            routing_delay: Duration::from_millis(150),
            overpass_delay: Duration::from_millis(1500),
            max_points: 80,
            cache_ttl: Duration::from_secs(300),
        }
    }
}
