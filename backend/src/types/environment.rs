//! Environment configuration for different deployment stages

use std::env;
use std::time::Duration;

use aws_config::{retry::RetryConfig, timeout::TimeoutConfig, BehaviorVersion};

/// Application environment configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    /// Production environment
    Production,
    /// Staging environment
    Staging,
    /// Development environment (uses `LocalStack`)
    Development,
}

impl Environment {
    /// Creates an Environment from the `APP_ENV` environment variable
    ///
    /// # Panics
    ///
    /// Panics if `APP_ENV` contains an invalid value
    #[must_use]
    pub fn from_env() -> Self {
        let env = env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string())
            .trim()
            .to_lowercase();

        match env.as_str() {
            "production" => Self::Production,
            "staging" => Self::Staging,
            "development" => Self::Development,
            _ => panic!("Invalid environment: {env}"),
        }
    }

    /// Returns the `DynamoDB` table holding the coffee items
    ///
    /// # Panics
    ///
    /// Panics if the `COFFEE_TABLE_NAME` environment variable is not set outside development
    #[must_use]
    pub fn coffee_table_name(&self) -> String {
        self.required_var("COFFEE_TABLE_NAME", "coffee-items")
    }

    /// Returns the token issuer URL, without a trailing slash
    ///
    /// # Panics
    ///
    /// Panics if the `AUTH_ISSUER_URL` environment variable is not set outside development
    #[must_use]
    pub fn auth_issuer_url(&self) -> String {
        self.required_var("AUTH_ISSUER_URL", "http://localhost:9000")
            .trim_end_matches('/')
            .to_string()
    }

    /// Returns the audience tokens must be issued for
    ///
    /// # Panics
    ///
    /// Panics if the `AUTH_AUDIENCE` environment variable is not set outside development
    #[must_use]
    pub fn auth_audience(&self) -> String {
        self.required_var("AUTH_AUDIENCE", "coffee-shop")
    }

    /// Returns the URL of the issuer's published signing keys
    #[must_use]
    pub fn jwks_url(&self) -> String {
        format!("{}/.well-known/jwks.json", self.auth_issuer_url())
    }

    /// Whether to show API docs
    #[must_use]
    pub const fn show_api_docs(&self) -> bool {
        matches!(self, Self::Development | Self::Staging)
    }

    /// Returns the endpoint URL to use for AWS services
    #[must_use]
    pub const fn override_aws_endpoint_url(&self) -> Option<&str> {
        match self {
            // Regular AWS endpoints for production and staging
            Self::Production | Self::Staging => None,
            // LocalStack endpoint for development
            Self::Development => Some("http://localhost:4566"),
        }
    }

    /// AWS configuration with retry and timeout settings
    pub async fn aws_config(&self) -> aws_config::SdkConfig {
        let retry_config = RetryConfig::standard()
            .with_max_attempts(3)
            .with_initial_backoff(Duration::from_millis(50));

        let timeout_config = TimeoutConfig::builder()
            .operation_timeout(Duration::from_secs(30))
            .build();

        let mut config_builder = aws_config::load_defaults(BehaviorVersion::latest())
            .await
            .to_builder()
            .retry_config(retry_config)
            .timeout_config(timeout_config);

        if let Some(endpoint_url) = self.override_aws_endpoint_url() {
            config_builder = config_builder.endpoint_url(endpoint_url);
        }

        config_builder.build()
    }

    fn required_var(&self, name: &str, development_default: &str) -> String {
        match self {
            Self::Production | Self::Staging => {
                env::var(name).unwrap_or_else(|_| panic!("{name} environment variable is not set"))
            }
            Self::Development => env::var(name).unwrap_or_else(|_| development_default.to_string()),
        }
    }
}
