use std::sync::Arc;

use fretmap_core::simulation::{ClockController, PathRegistry};
use fretmap_core::transit::ScheduleProvider;

/// Shared by every handler.
pub struct AppState {
    pub schedule: Arc<dyn ScheduleProvider>,
    pub paths: Arc<PathRegistry>,
    pub clock: ClockController,
}
