use fretmap_transit::{MINUTES_PER_WEEK, WeekMinute};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TrainProgress {
    /// Outside the departure/arrival window
    NotRunning,
    /// Fraction of the journey covered, in `[0, 1]`
    InTransit(f64),
}

impl TrainProgress {
    pub fn fraction(self) -> Option<f64> {
        match self {
            TrainProgress::InTransit(fraction) => Some(fraction),
            TrainProgress::NotRunning => None,
        }
    }
}

/// Where a service is in its `[departure, arrival]` window at `now`.
///
/// An arrival earlier in the week than the departure means the journey runs
/// over the Sunday/Monday boundary. Zero-length windows never run.
pub fn train_progress(
    departure: WeekMinute,
    arrival: WeekMinute,
    now: WeekMinute,
) -> TrainProgress {
    let dep = departure.get();
    let mut arr = arrival.get();
    let mut current = now.get();

    if arr == dep {
        return TrainProgress::NotRunning;
    }

    if arr < dep {
        arr += MINUTES_PER_WEEK;
        if current < dep {
            current += MINUTES_PER_WEEK;
        }
    }

    if current < dep || current > arr {
        return TrainProgress::NotRunning;
    }

    let fraction = f64::from(current - dep) / f64::from(arr - dep);
    TrainProgress::InTransit(fraction.clamp(0.0, 1.0))
}
