use std::sync::{Arc, Mutex, PoisonError};

use fretmap_transit::{DayOfWeek, MINUTES_PER_DAY, WeekMinute};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Duration, MissedTickBehavior};
use tracing::debug;

use crate::config::ClockConfig;

/// Source of the local wall-clock week position.
pub trait WallClock: Send + Sync {
    fn now(&self) -> WeekMinute;
}

pub struct LocalWallClock;

impl WallClock for LocalWallClock {
    fn now(&self) -> WeekMinute {
        WeekMinute::from_datetime(&chrono::Local::now())
    }
}

/// Which tick source drives the clock. Exactly one is active at a time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ClockMode {
    /// Follows the wall clock
    Live,
    /// One simulated minute per play tick
    Playing,
    /// Frozen where the user left it
    Paused,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClockState {
    pub now: WeekMinute,
    pub mode: ClockMode,
    /// The scrub control is being dragged; live updates are held back
    pub dragging: bool,
}

impl ClockState {
    pub fn live_at(now: WeekMinute) -> Self {
        Self {
            now,
            mode: ClockMode::Live,
            dragging: false,
        }
    }

    pub fn day(&self) -> DayOfWeek {
        self.now.day()
    }

    pub fn minute_of_day(&self) -> u32 {
        self.now.minute_of_day()
    }

    pub fn go_live(&mut self, wall: WeekMinute) {
        self.mode = ClockMode::Live;
        self.now = wall;
    }

    pub fn play(&mut self) {
        self.mode = ClockMode::Playing;
    }

    pub fn pause(&mut self) {
        self.mode = ClockMode::Paused;
    }

    /// Jump to a minute of the current (or given) day.
    pub fn scrub(&mut self, day: Option<DayOfWeek>, minute_of_day: u32) {
        let day = day.unwrap_or(self.day());
        self.now = WeekMinute::from_day_minute(day, minute_of_day.min(MINUTES_PER_DAY - 1));
        self.mode = ClockMode::Paused;
    }

    /// Keep the minute of day, move to another day.
    pub fn select_day(&mut self, day: DayOfWeek) {
        self.now = WeekMinute::from_day_minute(day, self.minute_of_day());
        self.mode = ClockMode::Paused;
    }

    /// Returns whether the state changed.
    pub fn live_tick(&mut self, wall: WeekMinute) -> bool {
        if self.mode != ClockMode::Live || self.dragging || self.now == wall {
            return false;
        }
        self.now = wall;
        true
    }

    /// Returns whether the state changed.
    pub fn play_tick(&mut self) -> bool {
        if self.mode != ClockMode::Playing {
            return false;
        }
        self.now = self.now.advance(1);
        true
    }
}

/// Owns the virtual clock state and its single tick task.
///
/// Every state change is published on a watch channel. Switching mode aborts
/// the previous tick task; dropping the controller aborts the current one.
pub struct ClockController {
    state: Arc<watch::Sender<ClockState>>,
    wall: Arc<dyn WallClock>,
    config: ClockConfig,
    ticker: Mutex<Option<JoinHandle<()>>>,
}

impl ClockController {
    /// Start in Live mode at the current wall-clock time.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(wall: Arc<dyn WallClock>, config: ClockConfig) -> Self {
        let (state, _) = watch::channel(ClockState::live_at(wall.now()));
        let mut controller = Self {
            state: Arc::new(state),
            wall,
            config,
            ticker: Mutex::new(None),
        };
        let live = controller.spawn_ticker(ClockMode::Live);
        *controller.ticker.get_mut().unwrap_or_else(PoisonError::into_inner) = live;
        controller
    }

    pub fn snapshot(&self) -> ClockState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<ClockState> {
        self.state.subscribe()
    }

    pub fn go_live(&self) {
        let wall = self.wall.now();
        self.transition(|s| s.go_live(wall));
    }

    pub fn play(&self) {
        self.transition(ClockState::play);
    }

    pub fn pause(&self) {
        self.transition(ClockState::pause);
    }

    pub fn scrub_to(&self, day: Option<DayOfWeek>, minute_of_day: u32) {
        self.transition(|s| s.scrub(day, minute_of_day));
    }

    pub fn select_day(&self, day: DayOfWeek) {
        self.transition(|s| s.select_day(day));
    }

    pub fn begin_drag(&self) {
        self.state.send_if_modified(|s| !std::mem::replace(&mut s.dragging, true));
    }

    pub fn end_drag(&self) {
        self.state.send_if_modified(|s| std::mem::replace(&mut s.dragging, false));
    }

    /// Whether a tick task is currently running.
    pub fn is_ticking(&self) -> bool {
        self.ticker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Apply a user transition and swap the tick task if the mode changed.
    fn transition(&self, change: impl FnOnce(&mut ClockState)) {
        // held across both updates so the mode and the running task agree
        let mut ticker = self.ticker.lock().unwrap_or_else(PoisonError::into_inner);

        let mut switched = None;
        self.state.send_if_modified(|state| {
            let before = *state;
            change(state);
            if state.mode != before.mode {
                switched = Some(state.mode);
            }
            *state != before
        });

        if let Some(mode) = switched {
            if let Some(previous) = ticker.take() {
                previous.abort();
            }
            *ticker = self.spawn_ticker(mode);
        }
    }

    fn spawn_ticker(&self, mode: ClockMode) -> Option<JoinHandle<()>> {
        match mode {
            ClockMode::Live => {
                debug!(period = ?self.config.live_poll, "following wall clock");
                Some(tokio::spawn(follow_wall_clock(
                    self.state.clone(),
                    self.wall.clone(),
                    self.config.live_poll,
                )))
            }
            ClockMode::Playing => {
                debug!(period = ?self.config.play_tick, "playing");
                Some(tokio::spawn(play(self.state.clone(), self.config.play_tick)))
            }
            ClockMode::Paused => None,
        }
    }
}

impl Drop for ClockController {
    fn drop(&mut self) {
        if let Some(handle) = self.ticker.get_mut().unwrap_or_else(PoisonError::into_inner).take() {
            handle.abort();
        }
    }
}

fn ticker(period: Duration) -> tokio::time::Interval {
    let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

async fn follow_wall_clock(
    state: Arc<watch::Sender<ClockState>>,
    wall: Arc<dyn WallClock>,
    period: Duration,
) {
    let mut interval = ticker(period);
    loop {
        interval.tick().await;
        let now = wall.now();
        state.send_if_modified(|s| s.live_tick(now));
    }
}

async fn play(state: Arc<watch::Sender<ClockState>>, period: Duration) {
    let mut interval = ticker(period);
    loop {
        interval.tick().await;
        state.send_if_modified(ClockState::play_tick);
    }
}
