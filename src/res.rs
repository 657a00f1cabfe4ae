use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// Uniform not-found answer, so guessing ids reveals nothing extra.
pub fn sorry(what: &str) -> Response {
    (StatusCode::NOT_FOUND, format!("that {what} don't exist")).into_response()
}
