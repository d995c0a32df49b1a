use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// GateError
///
/// Why a session check did not authorize. Nothing here is fatal: every
/// variant degrades to a denied outcome, a redirect, or both.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GateError {
    /// Expected case: no token, or no record behind it. Routed to login.
    #[error("no active session; sign in to continue")]
    MissingCredentials,
    /// The stored profile did not parse. Treated as absent credentials.
    #[error("stored profile could not be read: {0}")]
    MalformedProfile(String),
    /// Authenticated, but the route demands a role the user does not hold.
    #[error("your account does not have access to this page")]
    InsufficientRole,
    /// Anything unexpected during the check. Caught and surfaced, never
    /// left unresolved.
    #[error("session check failed: {0}")]
    CheckFailed(String),
}

/// AuthError
///
/// Failures of the session lifecycle surface (login, callback, logout).
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("identity provider rejected the credentials")]
    Rejected,
    #[error("identity provider unreachable: {0}")]
    Upstream(String),
    #[error("malformed request: {0}")]
    BadRequest(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match &self {
            AuthError::Rejected => StatusCode::UNAUTHORIZED,
            AuthError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AuthError::BadRequest(_) => StatusCode::BAD_REQUEST,
        };
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gate_errors_render_reader_facing_messages() {
        assert_eq!(
            GateError::MissingCredentials.to_string(),
            "no active session; sign in to continue"
        );
        assert!(
            GateError::MalformedProfile("expected value".to_string())
                .to_string()
                .contains("expected value")
        );
    }

    #[test]
    fn auth_error_maps_to_status() {
        assert_eq!(
            AuthError::Rejected.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::Upstream("timeout".to_string())
                .into_response()
                .status(),
            StatusCode::BAD_GATEWAY
        );
    }
}
