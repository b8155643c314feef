pub mod coffee;
mod docs;
pub mod health;

use aide::axum::{routing::get, ApiRouter};
use axum::middleware;

use crate::middleware::auth_middleware;

pub use coffee::CoffeeOperation;

/// Creates the router with all handler routes
///
/// Every `/coffee` route sits behind [`auth_middleware`]; health and docs are public.
pub fn handler() -> ApiRouter {
    let public_routes = ApiRouter::new()
        .merge(docs::handler())
        .api_route("/health", get(health::handler));

    let protected_routes = ApiRouter::new()
        .api_route(
            "/coffee",
            get(coffee::list_coffee_items).post(coffee::create_coffee_item),
        )
        .api_route(
            "/coffee/{id}",
            get(coffee::get_coffee_item)
                .put(coffee::update_coffee_item)
                .delete(coffee::delete_coffee_item),
        )
        .layer(middleware::from_fn(auth_middleware));

    public_routes.merge(protected_routes)
}
