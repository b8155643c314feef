use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use coffee_backend::{
    auth::{AuthGuard, JwksCache},
    server,
    types::Environment,
};
use coffee_storage::coffee_item::InMemoryCoffeeItemStorage;
use httpmock::prelude::*;
use serde_json::Value;
use tower::ServiceExt;

use super::{parse_response_body, valid_claims, TestSigningKey, TEST_AUDIENCE, TEST_KEY_ID};

/// Setup test environment variables with all the required configuration
pub fn setup_test_env() {
    // Initialize tracing for tests
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .try_init()
        .ok();
}

/// Full router backed by an in-memory store and a mock token issuer
pub struct TestSetup {
    pub router: Router,
    pub store: Arc<InMemoryCoffeeItemStorage>,
    pub signing_key: TestSigningKey,
    pub issuer: MockServer,
}

impl TestSetup {
    pub async fn new() -> Self {
        setup_test_env();

        let issuer = MockServer::start_async().await;
        let signing_key = TestSigningKey::generate(TEST_KEY_ID);
        let jwks = serde_json::json!({ "keys": [signing_key.jwk()] });
        issuer
            .mock_async(|when, then| {
                when.method(GET).path("/.well-known/jwks.json");
                then.status(200).json_body(jwks);
            })
            .await;

        let guard = Arc::new(AuthGuard::new(
            issuer.base_url(),
            TEST_AUDIENCE.to_string(),
            JwksCache::new(issuer.url("/.well-known/jwks.json")).unwrap(),
        ));

        let store = Arc::new(InMemoryCoffeeItemStorage::new());
        let router = server::router(Environment::Development, store.clone(), guard);

        Self {
            router,
            store,
            signing_key,
            issuer,
        }
    }

    /// Token that passes every check
    pub fn valid_token(&self) -> String {
        self.signing_key.sign(&valid_claims(&self.issuer.base_url()))
    }

    pub async fn send_request(
        &self,
        method: Method,
        route: &str,
        token: Option<&str>,
        payload: Option<Value>,
    ) -> Response {
        let mut builder = Request::builder().uri(route).method(method);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        let body = match payload {
            Some(payload) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(payload.to_string())
            }
            None => Body::empty(),
        };

        self.router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap()
    }

    /// Sends an authenticated request and returns status and JSON body
    pub async fn send_authorized(
        &self,
        method: Method,
        route: &str,
        payload: Option<Value>,
    ) -> (StatusCode, Value) {
        let token = self.valid_token();
        let response = self
            .send_request(method, route, Some(&token), payload)
            .await;
        let status = response.status();
        (status, parse_response_body(response).await)
    }
}
