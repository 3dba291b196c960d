//! Mock Auth API Entry Point
//!
//! Serves the mock auth backend over `/api/auth/*` for local development
//! of the shell applications.
//! Uses `anyhow` for startup errors, but application-level
//! errors should use `kernel::error::AppError`.

use auth::{MockAuthBackend, MockBackendConfig, auth_router};
use axum::{
    Router, http,
    http::{Method, header},
};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api=info,auth=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Token secret: stable across restarts when configured
    let mock_config = match env::var("MOCK_TOKEN_SECRET") {
        Ok(secret_b64) => {
            let secret_bytes = platform::crypto::from_base64url(secret_b64.trim())?;
            let Ok(secret) = <[u8; 32]>::try_from(secret_bytes.as_slice()) else {
                anyhow::bail!("MOCK_TOKEN_SECRET must decode to 32 bytes");
            };
            MockBackendConfig {
                token_secret: secret,
                ..MockBackendConfig::default()
            }
        }
        Err(_) => {
            tracing::warn!("MOCK_TOKEN_SECRET not set, tokens will not survive a restart");
            MockBackendConfig::with_random_secret()
        }
    };

    let backend = Arc::new(MockAuthBackend::new(mock_config)?);
    tracing::info!("Mock auth backend ready");

    // CORS configuration
    let frontend_origins = env::var("FRONTEND_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:3000,http://localhost:3002".to_string());

    let allowed_origins: Vec<http::HeaderValue> = frontend_origins
        .split(',')
        .filter_map(|origin| origin.trim().parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
        ]));

    // Build router
    let app = Router::new()
        .nest("/api/auth", auth_router(backend))
        .fallback(|| async { AppError::new(ErrorKind::NotFound, "Not found") })
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    let addr: SocketAddr = env::var("MOCK_API_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:3001".to_string())
        .parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
