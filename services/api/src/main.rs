use std::sync::Arc;

use sea_orm::Database;
use tracing::info;

use courier_api::config::ApiConfig;
use courier_api::infra::google::{GoogleEndpoints, build_http_client};
use courier_api::infra::password::Argon2PasswordHasher;
use courier_api::router::{build_router, cors_layer};
use courier_api::state::AppState;
use courier_api::usecase::bulk::BulkSettings;
use courier_core::tracing::init_tracing;

#[tokio::main]
async fn main() {
    init_tracing();

    let config = ApiConfig::from_env().expect("invalid configuration");

    let db = Database::connect(&config.database_url)
        .await
        .expect("failed to connect to database");

    let http = build_http_client().expect("failed to build HTTP client");
    let hasher = Argon2PasswordHasher::new().expect("failed to configure password hasher");

    let cors = cors_layer(config.frontend_url.as_deref());
    let state = AppState {
        db,
        http,
        google: Arc::new(config.google),
        endpoints: Arc::new(GoogleEndpoints::default()),
        jwt_secret: config.jwt_secret,
        hasher,
        bulk: BulkSettings::default(),
    };

    let router = build_router(state, cors);
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind");

    info!("courier api listening on {addr}");
    axum::serve(listener, router).await.expect("server error");
}
