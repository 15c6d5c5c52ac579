use api_types::ErrorBody;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use fretmap_core::transit::{SitePair, TransitError};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("no route from {} to {}", .0.origin, .0.destination)]
    RouteNotFound(SitePair),
}

impl From<TransitError> for ApiError {
    fn from(err: TransitError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::RouteNotFound(_) => StatusCode::NOT_FOUND,
        };

        (status, Json(ErrorBody { error: self.to_string() })).into_response()
    }
}
