use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    Crew(crew::CrewError),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            AppError::Crew(err) => match err {
                crew::CrewError::PhaseBusy { .. } => {
                    (StatusCode::CONFLICT, "phase_busy", err.to_string())
                }
                crew::CrewError::EngineStopped => {
                    tracing::error!("Crew error: {:?}", err);
                    (
                        StatusCode::SERVICE_UNAVAILABLE,
                        "engine_stopped",
                        err.to_string(),
                    )
                }
                _ => {
                    tracing::error!("Crew error: {:?}", err);
                    (StatusCode::INTERNAL_SERVER_ERROR, "crew_error", err.to_string())
                }
            },
        };

        let body = Json(ErrorResponse {
            error: error_type.to_string(),
            message,
        });

        (status, body).into_response()
    }
}

impl From<crew::CrewError> for AppError {
    fn from(err: crew::CrewError) -> Self {
        AppError::Crew(err)
    }
}
