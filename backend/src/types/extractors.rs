//! Custom extractors for request validation

use aide::operation::OperationInput;
use axum::{
    extract::{rejection::JsonRejection, FromRequest, FromRequestParts, Path, Request},
    http::{request::Parts, StatusCode},
    Json,
};
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{types::error::AppError, validation::ValidationError};

/// JSON extractor that runs the payload through its validator
///
/// The body is read as raw JSON first so the validator sees exactly what the
/// client sent, then converted with `T::try_from`.
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: TryFrom<Value, Error = ValidationError>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(payload) = Json::<Value>::from_request(req, state)
            .await
            .map_err(|err| match err {
                JsonRejection::MissingJsonContentType(_) => {
                    ValidationError::MissingJsonContentType
                }
                _ => ValidationError::InvalidJson,
            })?;

        Ok(Self(T::try_from(payload)?))
    }
}

impl<T> OperationInput for ValidatedJson<T>
where
    T: JsonSchema,
{
    fn operation_input(
        ctx: &mut aide::generate::GenContext,
        operation: &mut aide::openapi::Operation,
    ) {
        // Same request body as Json<T>
        Json::<T>::operation_input(ctx, operation);
    }
}

/// Path extractor whose rejection is rendered like every other error
pub struct ValidatedPath<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidatedPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(params) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|err| {
                tracing::debug!("Rejected path parameters: {err}");
                AppError::new(StatusCode::BAD_REQUEST, "Invalid path parameter")
            })?;

        Ok(Self(params))
    }
}

impl<T> OperationInput for ValidatedPath<T>
where
    T: JsonSchema,
{
    fn operation_input(
        ctx: &mut aide::generate::GenContext,
        operation: &mut aide::openapi::Operation,
    ) {
        Path::<T>::operation_input(ctx, operation);
    }
}
