//! Universal error handling for the API

use std::borrow::Cow;

use aide::OperationOutput;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use coffee_storage::coffee_item::CoffeeItemStorageError;

use super::envelope::{self, ErrorBody};
use crate::{auth::AuthError, validation::ValidationError};

/// Application error rendered through the response envelope
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: Cow<'static, str>,
}

impl AppError {
    /// Create a new application error
    #[must_use]
    pub fn new(status: StatusCode, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// 401 with the fixed `Unauthorized` message
    #[must_use]
    pub const fn unauthorized() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: Cow::Borrowed("Unauthorized"),
        }
    }

    /// 404 for an unknown coffee item id
    #[must_use]
    pub const fn coffee_item_not_found() -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: Cow::Borrowed("Coffee item not found"),
        }
    }

    /// Status code of the error
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Message sent to the client
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the error based on status code
        match self.status.as_u16() {
            400..=499 => tracing::warn!("Client error: {} - {}", self.status, self.message),
            500..=599 => tracing::error!("Server error: {} - {}", self.status, self.message),
            _ => {}
        }

        envelope::build_error(self.status, &self.message)
    }
}

/// Convert payload validation errors to application errors
impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        Self::new(StatusCode::BAD_REQUEST, err.to_string())
    }
}

/// Every authentication failure looks the same to the client
impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        if err.is_provider_failure() {
            tracing::error!("Token verification unavailable: {err}");
        } else {
            tracing::debug!("Rejected bearer token: {err}");
        }
        Self::unauthorized()
    }
}

/// Convert storage errors to application errors without leaking store detail
impl From<CoffeeItemStorageError> for AppError {
    fn from(err: CoffeeItemStorageError) -> Self {
        match &err {
            CoffeeItemStorageError::ItemExists(id) => {
                tracing::debug!("Coffee item already exists: {id}");
                Self::new(
                    StatusCode::CONFLICT,
                    "Coffee item with this id already exists",
                )
            }
            _ if err.is_transient() => {
                tracing::error!("Coffee item store unavailable: {err}");
                Self::new(StatusCode::BAD_GATEWAY, "Store temporarily unavailable")
            }
            _ => {
                tracing::error!("Coffee item store error: {err}");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        }
    }
}

impl OperationOutput for AppError {
    type Inner = ErrorBody;

    fn operation_response(
        ctx: &mut aide::generate::GenContext,
        operation: &mut aide::openapi::Operation,
    ) -> Option<aide::openapi::Response> {
        Json::<ErrorBody>::operation_response(ctx, operation)
    }
}
