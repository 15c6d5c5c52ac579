//! JSON bodies of the simulated-clock HTTP API.
//!
//! Coordinates are WGS84 degrees. Point lists are `[lat, lon]`.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClockMode {
    Live,
    Playing,
    Paused,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClockSnapshot {
    /// Two-letter day label, `Lu` through `Di`
    pub day: String,
    pub minute_of_day: u32,
    /// `HH:MM`
    pub time: String,
    /// Minutes since Monday 00:00
    pub week_minute: u32,
    pub mode: ClockMode,
    pub dragging: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScrubRequest {
    pub minute_of_day: u32,
    /// Keeps the current day when absent
    #[serde(default)]
    pub day: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DayRequest {
    pub day: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrainPosition {
    pub service: String,
    pub operator: String,
    pub origin: String,
    pub destination: String,
    pub lat: f64,
    pub lon: f64,
    /// Fraction of the trip completed, 0 to 1
    pub progress: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrainsResponse {
    pub clock: ClockSnapshot,
    pub trains: Vec<TrainPosition>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeometryKind {
    Rail,
    Synthesized,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RouteSummary {
    pub from: String,
    pub to: String,
    pub from_point: [f64; 2],
    pub to_point: [f64; 2],
    pub weekly_frequency: usize,
    pub operators: Vec<String>,
    /// Absent until the pair has any path
    pub geometry: Option<GeometryKind>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RouteGeometry {
    pub kind: GeometryKind,
    pub points: Vec<[f64; 2]>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
