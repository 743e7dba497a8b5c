//! Page and API handler modules

use std::any::Any;

use axum::{
    body::Body,
    http::{Response, StatusCode},
    response::IntoResponse,
    Json,
};
use tracing::error;

use super::errors::ErrorResponse;

pub mod forum;
pub mod v1;

/// Catch panics and return a 500 error
pub fn panic_handler(err: Box<dyn Any + Send + 'static>) -> Response<Body> {
    let details = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "Internal server error".to_string()
    };

    error!("handler panicked: {}", details);

    let error = ErrorResponse {
        error: "Internal server error".to_string(),
    };

    (StatusCode::INTERNAL_SERVER_ERROR, Json(error)).into_response()
}
