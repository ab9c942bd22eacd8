use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::error::Error;

// Tell axum how to render the error taxonomy: NotFound -> 404,
// Validation -> 422 with the messages, Database -> 500 with the cause
// logged rather than exposed.
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound { .. } => {
                (StatusCode::NOT_FOUND, Json(json!({ "error": self.to_string() }))).into_response()
            }
            Error::Validation(messages) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "error": "validation failed", "messages": messages })),
            )
                .into_response(),
            Error::Database(err) => {
                log::error!("Database error: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Something went wrong" })),
                )
                    .into_response()
            }
        }
    }
}
