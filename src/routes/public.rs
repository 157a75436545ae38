use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints reachable without a session: the identity gateway (register, login,
/// logout) and the anonymous notice listing, which shows every active notice
/// regardless of department.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness check for load balancers.
        .route("/health", get(|| async { "ok" }))
        // POST /register
        .route("/register", post(handlers::register_user))
        // POST /login
        // Returns a bearer token backed by a server-side session record.
        .route("/login", post(handlers::login))
        // POST /logout
        // Public so that a stale or missing token still "logs out" successfully.
        .route("/logout", post(handlers::logout))
        // GET /public/notices
        .route("/public/notices", get(handlers::get_public_notices))
        // GET /public/notices/{id}
        .route("/public/notices/{id}", get(handlers::get_public_notice))
}
