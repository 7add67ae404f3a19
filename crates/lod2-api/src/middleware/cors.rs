//! CORS layer configuration.

use axum::http::{HeaderValue, Method, header};
use tower_http::cors::CorsLayer;

use lod2_core::config::CorsConfig;

/// Builds a CORS tower layer from configuration.
///
/// Token cookies require credentialed requests, so origins are always an
/// explicit list. An empty list allows no cross-origin access.
pub fn build_cors_layer(config: &CorsConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();

    let methods: Vec<Method> = config
        .allowed_methods
        .iter()
        .filter_map(|m| m.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(methods)
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(config.max_age_seconds))
}
