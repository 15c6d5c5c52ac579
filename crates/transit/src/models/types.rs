//! Core data types and enums for freight schedule data.

use std::collections::BTreeSet;
use std::sync::Arc;

use geo::Point;

use crate::identifiers::*;
use crate::models::week::{day_time_to_minutes, DayOfWeek, WeekMinute};

// ============================================================================
// Enums
// ============================================================================

/// Three-state cargo acceptance flag as recorded by the operators
/// (`"Oui"`, `"Non"`, or free text).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum CargoFlag {
    Accepted,
    Refused,
    #[default]
    Unknown,
    Other(Arc<str>),
}

impl CargoFlag {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case("oui") {
            Self::Accepted
        } else if trimmed.eq_ignore_ascii_case("non") {
            Self::Refused
        } else if trimmed.is_empty() {
            Self::Unknown
        } else {
            Self::Other(trimmed.into())
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }
}

/// Accepted cargo types for a service
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct CargoAcceptance {
    pub containers: CargoFlag,
    pub swap_bodies: CargoFlag,
    pub semi_trailers: CargoFlag,
}

// ============================================================================
// Data Structures
// ============================================================================

/// A freight transfer site with geocoded coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct Platform {
    pub site: SiteIdentifier,
    pub name: Arc<str>,
    pub municipality: Arc<str>,
    /// Entity operating the site
    pub operator: Arc<str>,
    pub country: Arc<str>,
    /// x = longitude, y = latitude (WGS84 degrees)
    pub location: Point,
}

impl Platform {
    pub fn lat(&self) -> f64 {
        self.location.y()
    }

    pub fn lon(&self) -> f64 {
        self.location.x()
    }
}

/// One weekly scheduled departure of one operator between two platforms.
#[derive(Clone, Debug, PartialEq)]
pub struct Service {
    pub id: ServiceIdentifier,
    pub operator: OperatorIdentifier,
    pub origin: SiteIdentifier,
    pub destination: SiteIdentifier,
    pub departure: WeekMinute,
    pub arrival: WeekMinute,
    pub cargo: CargoAcceptance,
}

impl Service {
    pub fn pair(&self) -> SitePair {
        SitePair::new(self.origin.clone(), self.destination.clone())
    }
}

/// All services sharing an origin/destination pair.
///
/// Routes only decide which polylines are needed; the simulation runs on
/// individual services.
#[derive(Clone, Debug, PartialEq)]
pub struct Route {
    pub pair: SitePair,
    pub from: Point,
    pub to: Point,
    /// Number of weekly services on this pair
    pub weekly_frequency: usize,
    pub operators: BTreeSet<OperatorIdentifier>,
}

/// A service row as exported by the relational store, before validation.
///
/// Day and time fields are still the raw schedule strings.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ServiceRecord {
    pub id: String,
    pub operator: String,
    pub origin: String,
    pub destination: String,
    pub departure_day: String,
    pub departure_time: String,
    pub arrival_day: String,
    pub arrival_time: String,
    pub containers: String,
    pub swap_bodies: String,
    pub semi_trailers: String,
}

impl TryFrom<ServiceRecord> for Service {
    type Error = TransitError;

    fn try_from(record: ServiceRecord) -> Result<Self> {
        let context = |e: TransitError| match e {
            TransitError::Parse(msg) => {
                TransitError::Parse(format!("service {}: {msg}", record.id))
            }
            other => other,
        };

        let departure = DayOfWeek::parse(&record.departure_day)
            .and_then(|day| day_time_to_minutes(day, &record.departure_time))
            .map_err(context)?;
        let arrival = DayOfWeek::parse(&record.arrival_day)
            .and_then(|day| day_time_to_minutes(day, &record.arrival_time))
            .map_err(context)?;

        Ok(Self {
            id: ServiceIdentifier::new(&record.id),
            operator: OperatorIdentifier::new(record.operator.trim()),
            origin: SiteIdentifier::new(record.origin.trim()),
            destination: SiteIdentifier::new(record.destination.trim()),
            departure,
            arrival,
            cargo: CargoAcceptance {
                containers: CargoFlag::parse(&record.containers),
                swap_bodies: CargoFlag::parse(&record.swap_bodies),
                semi_trailers: CargoFlag::parse(&record.semi_trailers),
            },
        })
    }
}

/// A platform row as exported by the relational store.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PlatformRecord {
    pub site: String,
    pub name: String,
    pub municipality: String,
    pub operator: String,
    pub country: String,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

impl TryFrom<PlatformRecord> for Platform {
    type Error = TransitError;

    fn try_from(record: PlatformRecord) -> Result<Self> {
        let (Some(lat), Some(lon)) = (record.lat, record.lon) else {
            return Err(TransitError::InvalidData(format!(
                "platform {} has not been geocoded",
                record.site
            )));
        };

        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            return Err(TransitError::InvalidData(format!(
                "platform {} has out-of-range coordinates ({lat}, {lon})",
                record.site
            )));
        }

        let name = if record.name.trim().is_empty() { &record.site } else { &record.name };

        Ok(Self {
            site: SiteIdentifier::new(record.site.trim()),
            name: name.trim().into(),
            municipality: record.municipality.trim().into(),
            operator: record.operator.trim().into(),
            country: record.country.trim().into(),
            location: Point::new(lon, lat),
        })
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum TransitError {
    #[error("Platform not found: {0}")]
    PlatformNotFound(SiteIdentifier),

    #[error("Service not found: {0}")]
    ServiceNotFound(ServiceIdentifier),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

pub type Result<T> = std::result::Result<T, TransitError>;
