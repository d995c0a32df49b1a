use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Authenticated Router Module
///
/// Pages for any signed-in user. Each path here is `User`-tier in the route
/// policy table, so the edge gate already requires session cookies before
/// these handlers run; every handler still re-checks through the client gate
/// against the canonical store.
///
/// `/events/{id}/manage` is the exception: it is not in the policy table
/// (the edge gate applies the configured default), and its handler gates
/// with `EventOwner` plus the resource-level ownership check. That makes it
/// the reference example of the two-phase authorization contract.
pub fn authenticated_routes() -> Router<AppState> {
    Router::new()
        // GET /dashboard and its donation-history subpage.
        .route("/dashboard", get(handlers::dashboard_page))
        .route("/dashboard/donations", get(handlers::dashboard_donations_page))
        // GET /settings
        .route("/settings", get(handlers::settings_page))
        // GET /cards
        .route("/cards", get(handlers::cards_page))
        // GET /events/create
        // Protected even though /events is public; the longest-prefix rule
        // in the policy table keeps this one gated.
        .route("/events/create", get(handlers::event_create_page))
        // GET /events/{id}/manage?o=<obfuscated owner id>
        .route("/events/{id}/manage", get(handlers::event_manage_page))
}
