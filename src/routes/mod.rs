/// Router Module Index
///
/// Splits the routes by access level. Authentication and the admin role are
/// enforced by layers applied to each sub-router in `create_router`, and again
/// by the `Session` / `AdminSession` extractors inside the handlers.

/// Routes open to anonymous callers.
pub mod public;

/// Routes that require a live session.
pub mod authenticated;

/// Routes restricted to the `admin` role, nested under `/admin`.
pub mod admin;
