use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Everything reachable without a session: the marketing tree, the auth form
/// pages, the public browse pages, and the session lifecycle API. The API
/// lives under `/api`, which the edge gate bypasses; every other path here
/// is in the public prefix table, so the gate passes it through untouched.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Unauthenticated liveness probe for load balancers.
        .route("/health", get(|| async { "ok" }))
        // --- Session lifecycle (credential store writers/readers) ---
        .route("/api/auth/login", post(handlers::login))
        .route("/api/auth/callback", get(handlers::oauth_callback))
        .route("/api/auth/logout", post(handlers::logout))
        .route("/api/auth/session", get(handlers::get_session))
        // --- Landing and browse pages ---
        .route("/", get(handlers::home_page))
        .route("/events", get(handlers::events_page))
        .route("/charities", get(handlers::charities_page))
        .route("/blog", get(handlers::blog_page))
        // --- Auth form pages ---
        // The login form reads the `redirect` parameter the edge gate
        // attaches, so a successful sign-in resumes the original navigation.
        .route("/auth/login", get(handlers::login_page))
        .route("/auth/register", get(handlers::marketing_page))
        .route("/auth/forgot-password", get(handlers::marketing_page))
        .route("/auth/reset-password", get(handlers::marketing_page))
        .route("/auth/login-otp", get(handlers::marketing_page))
        // --- Marketing / informational tree ---
        .route("/about-us", get(handlers::marketing_page))
        .route("/contact", get(handlers::marketing_page))
        .route("/how-it-works", get(handlers::marketing_page))
        .route("/privacy-policy", get(handlers::marketing_page))
        .route("/terms-of-service", get(handlers::marketing_page))
        .route("/help-center", get(handlers::marketing_page))
        .route("/guide", get(handlers::marketing_page))
        .route("/tips", get(handlers::marketing_page))
        .route("/business-card", get(handlers::marketing_page))
        .route("/feedback", get(handlers::marketing_page))
        .route("/survey", get(handlers::marketing_page))
        .route("/announcements", get(handlers::marketing_page))
}
