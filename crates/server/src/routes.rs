use std::sync::Arc;

use api_types::{
    ClockSnapshot, DayRequest, GeometryKind as ApiGeometryKind, RouteGeometry as ApiRouteGeometry,
    RouteSummary, ScrubRequest, TrainPosition as ApiTrainPosition, TrainsResponse,
};
use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use fretmap_core::geometry::{GeometryKind, RouteGeometry};
use fretmap_core::simulation::{ClockMode, ClockState, positions_at};
use fretmap_core::transit::{DayOfWeek, SitePair, format_time_of_day};
use tower_http::cors::{Any, CorsLayer};

use crate::error::ApiError;
use crate::state::AppState;

type AppResult<T> = Result<Json<T>, ApiError>;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/clock", get(clock))
        .route("/clock/live", post(go_live))
        .route("/clock/play", post(play))
        .route("/clock/pause", post(pause))
        .route("/clock/scrub", post(scrub))
        .route("/clock/day", post(select_day))
        .route("/clock/drag/begin", post(begin_drag))
        .route("/clock/drag/end", post(end_drag))
        .route("/trains", get(trains))
        .route("/routes", get(routes))
        .route("/routes/{from}/{to}/geometry", get(route_geometry))
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

fn snapshot(state: &ClockState) -> ClockSnapshot {
    ClockSnapshot {
        day: state.day().as_str().to_string(),
        minute_of_day: state.minute_of_day(),
        time: format_time_of_day(state.minute_of_day()),
        week_minute: state.now.get(),
        mode: match state.mode {
            ClockMode::Live => api_types::ClockMode::Live,
            ClockMode::Playing => api_types::ClockMode::Playing,
            ClockMode::Paused => api_types::ClockMode::Paused,
        },
        dragging: state.dragging,
    }
}

fn geometry_kind(kind: GeometryKind) -> ApiGeometryKind {
    match kind {
        GeometryKind::Rail => ApiGeometryKind::Rail,
        GeometryKind::Synthesized => ApiGeometryKind::Synthesized,
    }
}

async fn clock(State(app): State<Arc<AppState>>) -> Json<ClockSnapshot> {
    Json(snapshot(&app.clock.snapshot()))
}

async fn go_live(State(app): State<Arc<AppState>>) -> Json<ClockSnapshot> {
    app.clock.go_live();
    Json(snapshot(&app.clock.snapshot()))
}

async fn play(State(app): State<Arc<AppState>>) -> Json<ClockSnapshot> {
    app.clock.play();
    Json(snapshot(&app.clock.snapshot()))
}

async fn pause(State(app): State<Arc<AppState>>) -> Json<ClockSnapshot> {
    app.clock.pause();
    Json(snapshot(&app.clock.snapshot()))
}

async fn scrub(
    State(app): State<Arc<AppState>>,
    Json(request): Json<ScrubRequest>,
) -> AppResult<ClockSnapshot> {
    let day = request.day.as_deref().map(DayOfWeek::parse).transpose()?;
    app.clock.scrub_to(day, request.minute_of_day);
    Ok(Json(snapshot(&app.clock.snapshot())))
}

async fn select_day(
    State(app): State<Arc<AppState>>,
    Json(request): Json<DayRequest>,
) -> AppResult<ClockSnapshot> {
    app.clock.select_day(DayOfWeek::parse(&request.day)?);
    Ok(Json(snapshot(&app.clock.snapshot())))
}

async fn begin_drag(State(app): State<Arc<AppState>>) -> Json<ClockSnapshot> {
    app.clock.begin_drag();
    Json(snapshot(&app.clock.snapshot()))
}

async fn end_drag(State(app): State<Arc<AppState>>) -> Json<ClockSnapshot> {
    app.clock.end_drag();
    Json(snapshot(&app.clock.snapshot()))
}

async fn trains(State(app): State<Arc<AppState>>) -> Json<TrainsResponse> {
    let clock = app.clock.snapshot();
    let services = app.schedule.all_services();

    let trains = positions_at(services.iter().map(Arc::as_ref), &app.paths, clock.now)
        .into_iter()
        .map(|train| ApiTrainPosition {
            service: train.service.to_string(),
            operator: train.operator.to_string(),
            origin: train.pair.origin.to_string(),
            destination: train.pair.destination.to_string(),
            lat: train.position.y,
            lon: train.position.x,
            progress: train.progress,
        })
        .collect();

    Json(TrainsResponse {
        clock: snapshot(&clock),
        trains,
    })
}

async fn routes(State(app): State<Arc<AppState>>) -> Json<Vec<RouteSummary>> {
    let summaries = app
        .schedule
        .all_routes()
        .iter()
        .map(|route| RouteSummary {
            from: route.pair.origin.to_string(),
            to: route.pair.destination.to_string(),
            from_point: [route.from.y(), route.from.x()],
            to_point: [route.to.y(), route.to.x()],
            weekly_frequency: route.weekly_frequency,
            operators: route.operators.iter().map(ToString::to_string).collect(),
            geometry: app.paths.get(&route.pair).map(|geometry| geometry_kind(geometry.kind)),
        })
        .collect();

    Json(summaries)
}

async fn route_geometry(
    State(app): State<Arc<AppState>>,
    Path((from, to)): Path<(String, String)>,
) -> AppResult<ApiRouteGeometry> {
    let pair = SitePair::new(from.into(), to.into());
    let route = app
        .schedule
        .get_route(&pair)
        .ok_or_else(|| ApiError::RouteNotFound(pair.clone()))?;

    let geometry = match app.paths.get(&pair) {
        Some(geometry) => geometry,
        None => Arc::new(RouteGeometry::synthesized(route.from.0, route.to.0)),
    };

    Ok(Json(ApiRouteGeometry {
        kind: geometry_kind(geometry.kind),
        points: geometry.lat_lon(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use api_types::{ClockMode as ApiClockMode, ErrorBody};
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use fretmap_core::ClockConfig;
    use fretmap_core::simulation::{ClockController, PathRegistry, WallClock};
    use fretmap_core::transit::{
        CargoAcceptance, OperatorIdentifier, Platform, ScheduleProvider, Service, ServiceIdentifier,
        SiteIdentifier, StaticScheduleProvider, WeekMinute,
    };
    use geo::{LineString, Point};
    use serde::de::DeserializeOwned;
    use tower::ServiceExt;

    struct FixedWallClock(WeekMinute);

    impl WallClock for FixedWallClock {
        fn now(&self) -> WeekMinute {
            self.0
        }
    }

    fn platform(site: &str, lon: f64, lat: f64) -> Platform {
        Platform {
            site: SiteIdentifier::new(site),
            name: site.into(),
            municipality: "".into(),
            operator: "".into(),
            country: "FR".into(),
            location: Point::new(lon, lat),
        }
    }

    fn service(id: &str, from: &str, to: &str, departure: u32, arrival: u32) -> Service {
        Service {
            id: ServiceIdentifier::new(id),
            operator: OperatorIdentifier::new("Fret Sud"),
            origin: SiteIdentifier::new(from),
            destination: SiteIdentifier::new(to),
            departure: WeekMinute::new(departure),
            arrival: WeekMinute::new(arrival),
            cargo: CargoAcceptance::default(),
        }
    }

    /// Wall clock at Me 09:00, one service halfway along a straight rail path.
    fn app() -> Arc<AppState> {
        let schedule = StaticScheduleProvider::from_data(
            vec![platform("Lyon", 4.0, 45.0), platform("Marseille", 6.0, 45.0)],
            vec![
                service("running", "Lyon", "Marseille", 3390, 3450),
                service("idle", "Marseille", "Lyon", 100, 200),
            ],
        )
        .unwrap();

        let routes = schedule.all_routes();
        let paths = PathRegistry::seeded(routes.iter().map(Arc::as_ref));
        paths.insert(
            SitePair::new("Lyon".into(), "Marseille".into()),
            RouteGeometry::rail(LineString::from(vec![(4.0, 45.0), (6.0, 45.0)])),
        );

        Arc::new(AppState {
            schedule: Arc::new(schedule),
            paths: Arc::new(paths),
            clock: ClockController::start(
                Arc::new(FixedWallClock(WeekMinute::new(3420))),
                ClockConfig::default(),
            ),
        })
    }

    async fn call<T: DeserializeOwned>(
        app: &Arc<AppState>,
        request: Request<Body>,
    ) -> (StatusCode, T) {
        let response = create_router(app.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    fn post(uri: &str, body: &str) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = create_router(app()).oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"OK");
    }

    #[tokio::test]
    async fn test_clock_starts_live() {
        let app = app();
        let (status, clock): (_, ClockSnapshot) = call(&app, get("/clock")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(clock.day, "Me");
        assert_eq!(clock.time, "09:00");
        assert_eq!(clock.week_minute, 3420);
        assert_eq!(clock.mode, ApiClockMode::Live);
    }

    #[tokio::test]
    async fn test_scrub_pauses_and_moves_clock() {
        let app = app();
        let (status, clock): (_, ClockSnapshot) =
            call(&app, post("/clock/scrub", r#"{"minute_of_day": 510, "day": "Ve"}"#)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(clock.day, "Ve");
        assert_eq!(clock.time, "08:30");
        assert_eq!(clock.mode, ApiClockMode::Paused);
        assert!(!app.clock.is_ticking());
    }

    #[tokio::test]
    async fn test_unknown_day_is_bad_request() {
        let app = app();
        let (status, body): (_, ErrorBody) =
            call(&app, post("/clock/day", r#"{"day": "Xx"}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.error.contains("Xx"));
    }

    #[tokio::test]
    async fn test_play_then_live() {
        let app = app();
        let (_, clock): (_, ClockSnapshot) = call(&app, post("/clock/play", "")).await;
        assert_eq!(clock.mode, ApiClockMode::Playing);

        let (_, clock): (_, ClockSnapshot) = call(&app, post("/clock/live", "")).await;
        assert_eq!(clock.mode, ApiClockMode::Live);
        assert_eq!(clock.week_minute, 3420);
    }

    #[tokio::test]
    async fn test_drag_flag_round_trip() {
        let app = app();
        let (_, clock): (_, ClockSnapshot) = call(&app, post("/clock/drag/begin", "")).await;
        assert!(clock.dragging);
        let (_, clock): (_, ClockSnapshot) = call(&app, post("/clock/drag/end", "")).await;
        assert!(!clock.dragging);
    }

    #[tokio::test]
    async fn test_trains_in_transit() {
        let app = app();
        let (status, response): (_, TrainsResponse) = call(&app, get("/trains")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(response.trains.len(), 1);

        let train = &response.trains[0];
        assert_eq!(train.service, "running");
        assert_eq!(train.operator, "Fret Sud");
        assert!((train.progress - 0.5).abs() < 1e-12);
        assert!((train.lon - 5.0).abs() < 1e-12);
        assert!((train.lat - 45.0).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_routes_report_geometry_kind() {
        let app = app();
        let (_, routes): (_, Vec<RouteSummary>) = call(&app, get("/routes")).await;

        assert_eq!(routes.len(), 2);
        let outbound = routes.iter().find(|r| r.from == "Lyon").unwrap();
        assert_eq!(outbound.geometry, Some(ApiGeometryKind::Rail));
        assert_eq!(outbound.from_point, [45.0, 4.0]);

        let inbound = routes.iter().find(|r| r.from == "Marseille").unwrap();
        assert_eq!(inbound.geometry, Some(ApiGeometryKind::Synthesized));
    }

    #[tokio::test]
    async fn test_route_geometry() {
        let app = app();
        let (status, geometry): (_, ApiRouteGeometry) =
            call(&app, get("/routes/Lyon/Marseille/geometry")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(geometry.kind, ApiGeometryKind::Rail);
        assert_eq!(geometry.points, vec![[45.0, 4.0], [45.0, 6.0]]);

        let (status, geometry): (_, ApiRouteGeometry) =
            call(&app, get("/routes/Marseille/Lyon/geometry")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(geometry.kind, ApiGeometryKind::Synthesized);
        assert_eq!(geometry.points.len(), 26);
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let app = app();
        let (status, body): (_, ErrorBody) = call(&app, get("/routes/Lyon/Paris/geometry")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.error, "no route from Lyon to Paris");
    }
}
