use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::{Duration, Instant};

use fretmap_transit::SitePair;
use geo::{Coord, LineString};
use tracing::debug;

use crate::geometry::snap_endpoints;

/// `"<from>||<to>"` -> `[lat, lon]` points
pub type PolylineMap = BTreeMap<String, Vec<[f64; 2]>>;

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cached rail geometry is malformed: {0}")]
    Malformed(String),

    #[error("cache storage failed: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("cache could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Persistence for the single record holding every cached polyline.
///
/// The record is read and rewritten whole.
pub trait PolylineStore: Send + Sync {
    fn read(&self) -> Result<Option<String>, CacheError>;
    fn write(&self, record: &str) -> Result<(), CacheError>;
}

/// Process-local store, mostly for tests and one-off tools.
#[derive(Default)]
pub struct MemoryStore {
    record: Mutex<Option<String>>,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(record: impl Into<String>) -> Self {
        Self {
            record: Mutex::new(Some(record.into())),
            writes: AtomicUsize::new(0),
        }
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl PolylineStore for MemoryStore {
    fn read(&self) -> Result<Option<String>, CacheError> {
        Ok(self.record.lock().unwrap_or_else(PoisonError::into_inner).clone())
    }

    fn write(&self, record: &str) -> Result<(), CacheError> {
        *self.record.lock().unwrap_or_else(PoisonError::into_inner) = Some(record.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct Snapshot {
    entries: Arc<PolylineMap>,
    loaded_at: Instant,
}

/// Rail geometry keyed by site pair, over a pluggable store.
///
/// Keeps an in-memory copy of the persisted record and re-reads it once
/// `ttl` has elapsed. A key, or its reverse, is authoritative once present.
pub struct RailGeometryCache {
    store: Arc<dyn PolylineStore>,
    ttl: Duration,
    snapshot: RwLock<Option<Snapshot>>,
}

impl RailGeometryCache {
    pub fn new(store: Arc<dyn PolylineStore>, ttl: Duration) -> Self {
        Self {
            store,
            ttl,
            snapshot: RwLock::new(None),
        }
    }

    pub fn key(pair: &SitePair) -> String {
        pair.to_string()
    }

    /// Cached path for `pair`, oriented from `from` to `to` with both
    /// endpoints snapped onto the platform coordinates.
    ///
    /// A path stored under the reverse key is reversed before snapping.
    pub fn lookup(
        &self,
        pair: &SitePair,
        from: Coord,
        to: Coord,
    ) -> Result<Option<LineString>, CacheError> {
        let entries = self.entries()?;

        let forward_key = Self::key(pair);
        if let Some(points) = entries.get(&forward_key) {
            let path = to_line_string(&forward_key, points)?;
            return Ok(Some(snap_endpoints(path, from, to)));
        }

        let reverse_key = Self::key(&pair.reversed());
        if let Some(points) = entries.get(&reverse_key) {
            let mut path = to_line_string(&reverse_key, points)?;
            path.0.reverse();
            debug!(%pair, "serving reversed cache entry");
            return Ok(Some(snap_endpoints(path, from, to)));
        }

        Ok(None)
    }

    /// Whether either orientation of `pair` is cached.
    pub fn contains(&self, pair: &SitePair) -> Result<bool, CacheError> {
        let entries = self.entries()?;
        Ok(entries.contains_key(&Self::key(pair))
            || entries.contains_key(&Self::key(&pair.reversed())))
    }

    /// Record a resolved path and rewrite the persisted record.
    ///
    /// Re-reads the store first so entries written by other resolvers are
    /// kept; a concurrent write of the same key wins or loses as a whole.
    pub fn insert(&self, pair: &SitePair, path: &LineString) -> Result<(), CacheError> {
        let mut entries = (*self.load()?).clone();
        entries.insert(Self::key(pair), path.0.iter().map(|c| [c.y, c.x]).collect());

        let record = serde_json::to_string(&entries)?;
        self.store.write(&record)?;
        self.remember(Arc::new(entries));
        Ok(())
    }

    /// All cached entries, re-read from the store when the copy is stale.
    pub fn entries(&self) -> Result<Arc<PolylineMap>, CacheError> {
        {
            let snapshot = self.snapshot.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(snapshot) = snapshot.as_ref() {
                if snapshot.loaded_at.elapsed() < self.ttl {
                    return Ok(snapshot.entries.clone());
                }
            }
        }

        self.load()
    }

    /// Drop the in-memory copy; the next read goes to the store.
    pub fn invalidate(&self) {
        *self.snapshot.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn load(&self) -> Result<Arc<PolylineMap>, CacheError> {
        let entries = match self.store.read()? {
            Some(record) if !record.trim().is_empty() => {
                serde_json::from_str::<PolylineMap>(&record)
                    .map_err(|e| CacheError::Malformed(e.to_string()))?
            }
            _ => PolylineMap::new(),
        };

        let entries = Arc::new(entries);
        self.remember(entries.clone());
        Ok(entries)
    }

    fn remember(&self, entries: Arc<PolylineMap>) {
        *self.snapshot.write().unwrap_or_else(PoisonError::into_inner) = Some(Snapshot {
            entries,
            loaded_at: Instant::now(),
        });
    }
}

fn to_line_string(key: &str, points: &[[f64; 2]]) -> Result<LineString, CacheError> {
    if points.is_empty() {
        return Err(CacheError::Malformed(format!("{key} has no points")));
    }

    points
        .iter()
        .map(|&[lat, lon]| {
            let valid = lat.is_finite()
                && lon.is_finite()
                && (-90.0..=90.0).contains(&lat)
                && (-180.0..=180.0).contains(&lon);
            if valid {
                Ok(Coord { x: lon, y: lat })
            } else {
                Err(CacheError::Malformed(format!("{key} has invalid point [{lat}, {lon}]")))
            }
        })
        .collect::<Result<Vec<_>, _>>()
        .map(LineString::new)
}
