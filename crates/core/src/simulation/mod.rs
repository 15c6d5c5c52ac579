pub mod clock;
pub mod paths;
pub mod positions;
pub mod progress;

pub use clock::{ClockController, ClockMode, ClockState, LocalWallClock, WallClock};
pub use paths::PathRegistry;
pub use positions::{TrainPosition, positions_at, train_position};
pub use progress::{TrainProgress, train_progress};
