//! Interactive API reference; hidden in production

use aide::{axum::ApiRouter, openapi::OpenApi, scalar::Scalar};
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Extension, Json,
};

use crate::types::{AppError, Environment};

const OPENAPI_PATH: &str = "/openapi.json";

pub fn handler() -> ApiRouter {
    ApiRouter::new()
        .route("/docs", get(reference_page))
        .route(OPENAPI_PATH, get(openapi_document))
}

fn ensure_visible(environment: &Environment) -> Result<(), AppError> {
    if environment.show_api_docs() {
        Ok(())
    } else {
        Err(AppError::new(StatusCode::NOT_FOUND, "Not found"))
    }
}

#[allow(clippy::unused_async)]
async fn reference_page(
    Extension(environment): Extension<Environment>,
) -> Result<Html<String>, AppError> {
    ensure_visible(&environment)?;

    Ok(Html(
        Scalar::new(OPENAPI_PATH)
            .with_title("Coffee Catalog API Docs")
            .html(),
    ))
}

#[allow(clippy::unused_async)]
async fn openapi_document(
    Extension(environment): Extension<Environment>,
    Extension(openapi): Extension<OpenApi>,
) -> Result<Response, AppError> {
    ensure_visible(&environment)?;

    Ok(Json(openapi).into_response())
}
