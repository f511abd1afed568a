//! Cross-origin policy for the dashboard API.
//!
//! A configured allow-list is honoured exactly. With no list, development
//! mirrors whatever origin asks and production allows none. Credentials are
//! always allowed, so a wildcard origin is never used.

use axum::http::{HeaderValue, Method, header};
use binwatch_core::config::{Environment, ServerConfig};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::warn;

/// Which origins may call the API from a browser.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CorsPolicy {
    /// Echo back any requesting origin.
    #[default]
    MirrorAny,
    /// Only these exact origins.
    AllowList(Vec<HeaderValue>),
}

impl CorsPolicy {
    /// Derive the policy from server configuration.
    ///
    /// Origins that are not valid header values are dropped with a warning.
    pub fn from_config(config: &ServerConfig) -> Self {
        if config.allowed_origins.is_empty() {
            return match config.environment {
                Environment::Development => Self::MirrorAny,
                Environment::Production => Self::AllowList(Vec::new()),
            };
        }

        let origins = config
            .allowed_origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!(origin, error = %e, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        Self::AllowList(origins)
    }

    /// Build the tower-http layer for this policy.
    pub fn layer(&self) -> CorsLayer {
        let origin = match self {
            Self::MirrorAny => AllowOrigin::mirror_request(),
            Self::AllowList(origins) => AllowOrigin::list(origins.iter().cloned()),
        };

        CorsLayer::new()
            .allow_origin(origin)
            .allow_credentials(true)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_list_depends_on_environment() {
        let mut config = ServerConfig::default();
        assert_eq!(CorsPolicy::from_config(&config), CorsPolicy::MirrorAny);

        config.environment = Environment::Production;
        assert_eq!(
            CorsPolicy::from_config(&config),
            CorsPolicy::AllowList(Vec::new())
        );
    }

    #[test]
    fn configured_origins_are_exact() {
        let config = ServerConfig {
            allowed_origins: vec!["https://dash.example.com".to_owned()],
            ..ServerConfig::default()
        };
        assert_eq!(
            CorsPolicy::from_config(&config),
            CorsPolicy::AllowList(vec![HeaderValue::from_static("https://dash.example.com")])
        );
    }
}
