use axum::response::Response;
use http_body_util::BodyExt;
use serde_json::{json, Value};

/// Parse response body to JSON
pub async fn parse_response_body(response: Response) -> Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

/// Create payload for a latte with the given id
pub fn latte_payload(id: &str) -> Value {
    json!({
        "id": id,
        "name": "Latte",
        "price": 4.5,
        "availability": true
    })
}
