use fretmap_transit::{OperatorIdentifier, Service, ServiceIdentifier, SitePair, WeekMinute};
use geo::Coord;

use crate::geometry::interpolate_along_path;
use crate::simulation::paths::PathRegistry;
use crate::simulation::progress::train_progress;

#[derive(Clone, Debug, PartialEq)]
pub struct TrainPosition {
    pub service: ServiceIdentifier,
    pub operator: OperatorIdentifier,
    pub pair: SitePair,
    /// x = longitude, y = latitude
    pub position: Coord,
    pub progress: f64,
}

/// Position of one service at `now`, or `None` when it is not in transit.
pub fn train_position(service: &Service, path: &[Coord], now: WeekMinute) -> Option<TrainPosition> {
    let progress = train_progress(service.departure, service.arrival, now).fraction()?;
    let position = interpolate_along_path(path, progress)?;

    Some(TrainPosition {
        service: service.id.clone(),
        operator: service.operator.clone(),
        pair: service.pair(),
        position,
        progress,
    })
}

/// Every service in transit at `now`, placed on its pair's current path.
///
/// Services whose pair has no path yet are left out.
pub fn positions_at<'a>(
    services: impl IntoIterator<Item = &'a Service>,
    paths: &PathRegistry,
    now: WeekMinute,
) -> Vec<TrainPosition> {
    services
        .into_iter()
        .filter_map(|service| {
            let geometry = paths.get(&service.pair())?;
            train_position(service, &geometry.path.0, now)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::RouteGeometry;
    use approx::assert_abs_diff_eq;
    use fretmap_transit::{CargoAcceptance, DayOfWeek};
    use geo::LineString;

    fn service(id: &str, dep: u32, arr: u32) -> Service {
        Service {
            id: ServiceIdentifier::new(id),
            operator: OperatorIdentifier::new("Op"),
            origin: "A".into(),
            destination: "B".into(),
            departure: WeekMinute::new(dep),
            arrival: WeekMinute::new(arr),
            cargo: CargoAcceptance::default(),
        }
    }

    #[test]
    fn test_positions_on_registered_path() {
        let registry = PathRegistry::new();
        registry.insert(
            SitePair::new("A".into(), "B".into()),
            RouteGeometry::rail(LineString::from(vec![(0.0, 0.0), (2.0, 0.0)])),
        );

        let services = [service("running", 3390, 3450), service("idle", 100, 200)];
        let now = WeekMinute::from_day_minute(DayOfWeek::Me, 8 * 60 + 45);

        let positions = positions_at(&services, &registry, now);
        assert_eq!(positions.len(), 1);

        let train = &positions[0];
        assert_eq!(train.service.as_str(), "running");
        assert_eq!(train.operator.as_str(), "Op");
        assert_abs_diff_eq!(train.progress, 0.25, epsilon = 1e-12);
        assert_abs_diff_eq!(train.position.x, 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(train.position.y, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_unknown_pair_is_absent() {
        let registry = PathRegistry::new();
        let services = [service("running", 3390, 3450)];
        assert!(positions_at(&services, &registry, WeekMinute::new(3400)).is_empty());
    }
}
