use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Authenticated Router Module
///
/// Routes for any logged-in user. Which notices are listed, and who may create,
/// edit or delete them, is decided by the policy functions called from the
/// notice service, never inline in the handlers.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /me
        .route("/me", get(handlers::get_me))
        // GET /me/notices
        // Every notice authored by the caller.
        .route("/me/notices", get(handlers::get_my_notices))
        // GET /notices   -> department-filtered board (admins see everything)
        // POST /notices  -> teachers and admins only
        .route(
            "/notices",
            get(handlers::get_notices).post(handlers::create_notice),
        )
        // GET/PUT/DELETE /notices/{id}
        // Edit and delete are limited to the owner or an admin.
        .route(
            "/notices/{id}",
            get(handlers::get_notice)
                .put(handlers::update_notice)
                .delete(handlers::delete_notice),
        )
}
