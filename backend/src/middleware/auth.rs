use std::sync::Arc;

use aide::OperationIo;
use axum::{
    extract::{FromRequestParts, Request},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
    Extension,
};

use crate::{
    auth::{AuthGuard, Claims},
    types::AppError,
};

/// Authenticated caller extracted from a verified bearer token
#[derive(Debug, Clone, OperationIo)]
pub struct AuthenticatedUser {
    /// The `sub` claim of the token
    pub subject: String,
}

impl From<Claims> for AuthenticatedUser {
    fn from(claims: Claims) -> Self {
        Self {
            subject: claims.sub,
        }
    }
}

/// Axum extractor for authenticated user
///
/// Only resolves on routes behind [`auth_middleware`]:
/// ```ignore
/// async fn protected_handler(
///     user: AuthenticatedUser,
///     // ... other extractors
/// ) -> Result<impl IntoResponse, AppError> {
///     Ok(user.subject)
/// }
/// ```
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .cloned()
            .ok_or_else(AppError::unauthorized)
    }
}

/// Bearer token authentication middleware
///
/// Verifies the `Authorization` header with the [`AuthGuard`] and adds
/// [`AuthenticatedUser`] to the request extensions. Any failure short-circuits
/// with 401 before the handler runs.
///
/// # Errors
///
/// - `AppError` - Missing or invalid token with 401 status code
pub async fn auth_middleware(
    Extension(guard): Extension<Arc<AuthGuard>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let authorization = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .map(ToOwned::to_owned);

    let claims = guard.authorize(authorization.as_deref()).await?;

    let user = AuthenticatedUser::from(claims);
    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}
