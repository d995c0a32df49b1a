use axum::{
    Router,
    extract::FromRef,
    http::HeaderName,
    middleware,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core gating components.
pub mod config;
pub mod error;
pub mod gate;
pub mod guard;
pub mod handlers;
pub mod models;
pub mod obfuscate;
pub mod policy;
pub mod session;

// Route registration, segregated by access tier.
pub mod routes;
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

// Core state types for the binary entry point and the integration tests.
pub use config::AppConfig;
pub use policy::RoutePolicyTable;
pub use session::{CredentialState, MemoryCredentialStore};

/// ApiDoc
///
/// OpenAPI document for the session lifecycle surface, served at
/// `/api-docs/openapi.json` and browsable through the Swagger UI.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::login,
        handlers::oauth_callback,
        handlers::logout,
        handlers::get_session
    ),
    components(
        schemas(
            models::SessionUser,
            models::SessionSnapshot,
            models::LoginRequest,
            models::LoginResponse,
        )
    ),
    tags(
        (name = "giving-portal", description = "Donation platform session gateway")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single shared container for everything a request needs: the canonical
/// credential store, the outbound HTTP client for the identity provider, the
/// immutable configuration, and the route policy table. There is no ambient
/// session state anywhere else.
#[derive(Clone)]
pub struct AppState {
    pub store: CredentialState,
    pub http: reqwest::Client,
    pub config: AppConfig,
    pub routes: RoutePolicyTable,
}

// --- Axum FromRef Extractor Implementations ---

// Let handlers and middleware pull individual components out of the shared
// state without threading the whole struct around.

impl FromRef<AppState> for CredentialState {
    fn from_ref(app_state: &AppState) -> CredentialState {
        app_state.store.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

impl FromRef<AppState> for RoutePolicyTable {
    fn from_ref(app_state: &AppState) -> RoutePolicyTable {
        app_state.routes
    }
}

/// create_router
///
/// Assembles the page tree, layers the edge gate over all of it, and wraps
/// the result in the observability stack.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    // Header name constant for request correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Base Router Assembly
    let base_router = Router::new()
        // Documentation: auto-generated Swagger UI for the auth API.
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // The three access tiers of the page tree.
        .merge(public::public_routes())
        .merge(authenticated::authenticated_routes())
        .nest("/admin", admin::admin_routes())
        // The edge gate runs before every handler above. Which paths it
        // actually guards is decided by the route policy table, not by
        // which module registered them; the module split and the table are
        // kept in agreement by the integration tests.
        .layer(middleware::from_fn_with_state(state.clone(), gate::edge_gate))
        .with_state(state);

    // 3. Observability and Correlation Layers (applied outermost)
    base_router
        .layer(
            ServiceBuilder::new()
                // 3a. Request ID generation for every incoming request.
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                // 3b. Request tracing with the request id in the span.
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // 3c. Return the generated id to the client.
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        // 4. CORS layer.
        .layer(cors)
}

/// trace_span_logger
///
/// Span maker for `TraceLayer`: includes the `x-request-id` header so every
/// log line for one request correlates on a single id.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
