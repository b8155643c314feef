use std::sync::Arc;

use aws_sdk_dynamodb::Client as DynamoDbClient;
use coffee_backend::{
    auth::{AuthGuard, JwksCache},
    server,
    types::Environment,
};
use coffee_storage::coffee_item::{CoffeeItemStorage, CoffeeItemStore};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let environment = Environment::from_env();

    // JSON logs for staging/production, human-readable for development
    match environment {
        Environment::Production | Environment::Staging => {
            fmt()
                .json()
                .with_env_filter(EnvFilter::from_default_env())
                .init();
        }
        Environment::Development => {
            fmt().with_env_filter(EnvFilter::from_default_env()).init();
        }
    }

    let aws_config = environment.aws_config().await;
    let dynamodb_client = Arc::new(DynamoDbClient::new(&aws_config));
    let store: Arc<dyn CoffeeItemStore> = Arc::new(CoffeeItemStorage::new(
        dynamodb_client,
        environment.coffee_table_name(),
    ));

    let jwks = JwksCache::new(environment.jwks_url())?;
    let guard = Arc::new(AuthGuard::new(
        environment.auth_issuer_url(),
        environment.auth_audience(),
        jwks,
    ));

    // Warm the key cache; a failure here is retried on the first request
    if let Err(err) = guard.jwks().refresh().await {
        tracing::warn!("Initial JWKS fetch failed: {err}");
    }

    server::start(environment, store, guard).await
}
