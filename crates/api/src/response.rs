//! JSON response envelope.
//!
//! Every response body has the shape
//! `{"success": bool, "message": string, "data"?: any, "error"?: string}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// The standard response body.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Failure body; `message` carries the status reason phrase.
    pub fn failure(status: StatusCode, error: String) -> Self {
        Self {
            success: false,
            message: status.canonical_reason().unwrap_or("Error").to_string(),
            data: None,
            error: Some(error),
        }
    }
}

/// A successful response with its status code.
#[derive(Debug)]
pub struct Envelope<T> {
    status: StatusCode,
    body: ApiResponse<T>,
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// 200 with a data payload.
pub fn ok<T: Serialize>(message: &str, data: T) -> Envelope<T> {
    with_status(StatusCode::OK, message, Some(data))
}

/// 201 with the created resource.
pub fn created<T: Serialize>(message: &str, data: T) -> Envelope<T> {
    with_status(StatusCode::CREATED, message, Some(data))
}

/// 200 with a message and no data.
pub fn message(message: &str) -> Envelope<()> {
    with_status(StatusCode::OK, message, None)
}

fn with_status<T>(status: StatusCode, message: &str, data: Option<T>) -> Envelope<T> {
    Envelope {
        status,
        body: ApiResponse {
            success: true,
            message: message.to_string(),
            data,
            error: None,
        },
    }
}
