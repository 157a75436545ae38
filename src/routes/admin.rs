use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, put},
};

/// Admin Router Module
///
/// Account administration, mounted under `/admin` behind the admin layer.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /admin/users
        .route("/users", get(handlers::get_users))
        // PUT /admin/users/{id}/role
        // The elevation flow: the only way to obtain an admin role, and the way to
        // obtain a teacher role when self-registration of staff is disabled.
        .route("/users/{id}/role", put(handlers::update_user_role))
        // DELETE /admin/users/{id}
        // Cascades to the user's notices and sessions.
        .route("/users/{id}", axum::routing::delete(handlers::delete_user))
}
