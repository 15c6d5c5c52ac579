//! # fretmap-transit
//!
//! Freight schedule data: platforms, weekly services, route aggregates and
//! the weekly time codec every schedule instant goes through.
//!
//! ## Example
//!
//! ```
//! use fretmap_transit::prelude::*;
//!
//! // Wednesday 08:30 is minute 3390 of the week
//! let departure = day_time_to_minutes(DayOfWeek::Me, "08:30").unwrap();
//! assert_eq!(departure.get(), 3390);
//! assert_eq!(departure.day(), DayOfWeek::Me);
//!
//! // Malformed schedule times are rejected rather than read as midnight
//! assert!(day_time_to_minutes(DayOfWeek::Me, "8h30").is_err());
//! ```

pub mod identifiers;
pub mod models;
pub mod provider;

// Re-exports for convenience
pub mod prelude {
    pub use crate::identifiers::*;
    pub use crate::models::{traits::*, types::*, week::*};
    pub use crate::provider::{ScheduleExport, StaticScheduleProvider};
}

pub use prelude::*;
