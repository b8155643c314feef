//! Uniform JSON response envelope
//!
//! Every response the coffee routes produce, success or failure, is rendered here:
//! a status code, `Content-Type: application/json`, and a serialized body. Error
//! bodies always have the shape `{ "message": string }`.

use aide::OperationOutput;
use axum::{
    http::{header::CONTENT_TYPE, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use schemars::JsonSchema;
use serde::Serialize;

const APPLICATION_JSON: &str = "application/json";

/// Body of every error response
#[derive(Debug, Serialize, JsonSchema)]
pub struct ErrorBody {
    /// Human-readable error message
    pub message: String,
}

/// Successful response with a JSON body
#[derive(Debug)]
pub struct Envelope<T> {
    status: StatusCode,
    body: T,
}

impl<T: Serialize> Envelope<T> {
    /// Builds a response with the given status and body
    #[must_use]
    pub const fn build(status: StatusCode, body: T) -> Self {
        Self { status, body }
    }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        match serde_json::to_vec(&self.body) {
            Ok(bytes) => json_response(self.status, bytes),
            Err(err) => {
                tracing::error!("Failed to serialize response body: {err}");
                build_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        }
    }
}

impl<T: JsonSchema> OperationOutput for Envelope<T> {
    type Inner = T;

    fn operation_response(
        ctx: &mut aide::generate::GenContext,
        operation: &mut aide::openapi::Operation,
    ) -> Option<aide::openapi::Response> {
        Json::<T>::operation_response(ctx, operation)
    }
}

/// Builds an error response with body `{ "message": <message> }`
#[must_use]
pub fn build_error(status: StatusCode, message: &str) -> Response {
    let body = ErrorBody {
        message: message.to_string(),
    };
    // A struct with a single string field always serializes.
    let bytes = serde_json::to_vec(&body).unwrap_or_default();
    json_response(status, bytes)
}

fn json_response(status: StatusCode, bytes: Vec<u8>) -> Response {
    let mut response = (status, bytes).into_response();
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
    response
}
