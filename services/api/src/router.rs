use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
    middleware::from_fn_with_state,
    routing::{delete, get, post},
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use courier_core::health::health;
use courier_core::middleware::{propagate_request_id_layer, request_id_layer};

use crate::handlers::{
    auth::{google_callback, google_sign_in, login, register},
    bulk::{process_csv, send_bulk},
    gmail::{auth_url, disconnect, send_email, status},
    history::{history_stats, list_history},
    profile::get_profile,
};
use crate::middleware::require_auth;
use crate::state::AppState;
use crate::usecase::csv::MAX_CSV_BYTES;

/// Body limit for the CSV upload route: the file cap plus room for multipart framing.
pub const CSV_BODY_LIMIT: usize = MAX_CSV_BYTES + 1024 * 1024;

const DEV_ORIGINS: [&str; 2] = ["http://localhost:3000", "https://localhost:3000"];

pub fn build_router(state: AppState, cors: CorsLayer) -> Router {
    let protected = Router::new()
        // Profile
        .route("/api/profile", get(get_profile))
        // Gmail link
        .route("/api/gmail/auth-url", get(auth_url))
        .route("/api/gmail/status", get(status))
        .route("/api/gmail/disconnect", delete(disconnect))
        // Sending
        .route("/api/gmail/send", post(send_email))
        .route(
            "/api/gmail/process-csv",
            post(process_csv).layer(DefaultBodyLimit::max(CSV_BODY_LIMIT)),
        )
        .route("/api/gmail/send-bulk", post(send_bulk))
        // History
        .route("/api/gmail/history", get(list_history))
        .route("/api/gmail/history/stats", get(history_stats))
        .route_layer(from_fn_with_state(state.auth_secret(), require_auth));

    Router::new()
        // Health
        .route("/health", get(health))
        // Accounts
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/google", post(google_sign_in))
        .route("/api/auth/google/callback", post(google_callback))
        .merge(protected)
        .with_state(state)
        .layer(cors)
        .layer(propagate_request_id_layer())
        .layer(TraceLayer::new_for_http())
        .layer(request_id_layer())
}

/// CORS for the local dev frontend plus `frontend_url` when configured.
pub fn cors_layer(frontend_url: Option<&str>) -> CorsLayer {
    let mut origins: Vec<HeaderValue> = DEV_ORIGINS
        .into_iter()
        .map(HeaderValue::from_static)
        .collect();
    if let Some(url) = frontend_url {
        match HeaderValue::from_str(url.trim_end_matches('/')) {
            Ok(origin) => origins.push(origin),
            Err(e) => tracing::warn!(error = %e, "ignoring invalid FRONTEND_URL"),
        }
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::ORIGIN,
            header::CONTENT_LENGTH,
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
        ])
        .allow_credentials(true)
}
