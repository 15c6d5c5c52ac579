//! Freight schedule models, types, and traits.

pub mod traits;
pub mod types;
pub mod week;

// Re-exports for convenience
pub use traits::ScheduleProvider;
pub use types::{
    CargoAcceptance, CargoFlag, Platform, PlatformRecord, Result, Route, Service, ServiceRecord,
    TransitError,
};
pub use week::{
    current_day, current_time_minutes, day_time_to_minutes, format_time_of_day,
    parse_time_of_day, DayOfWeek, WeekMinute, MINUTES_PER_DAY, MINUTES_PER_WEEK,
};
