use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Admin Router Module
///
/// The `/admin` page family, nested under its prefix in the main router.
/// Every path is `Admin`-tier in the policy table: the edge gate turns away
/// sessions that fail the admin predicate before rendering, and each handler
/// re-checks the full profile through the client gate.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::admin_home_page))
        .route("/control", get(handlers::admin_control_page))
        .route("/charities", get(handlers::admin_charities_page))
        .route("/donations", get(handlers::admin_donations_page))
        .route("/moderation", get(handlers::admin_moderation_page))
        .route("/events", get(handlers::admin_events_page))
        .route("/blog", get(handlers::admin_blog_page))
}
