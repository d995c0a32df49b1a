use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use tokio::task::JoinHandle;

use crate::{
    error::GateError,
    gate::login_redirect_target,
    models::SessionUser,
    policy::{RequiredRole, validate_route_access},
    session::CredentialState,
};

/// GateOutcome
///
/// Terminal state of the in-page session check: `loading` resolves to either
/// authorized or denied, never anything in between. Consumers read the
/// fields the way the frontend hook exposed them.
#[derive(Debug, Clone, PartialEq)]
pub struct GateOutcome {
    /// False once the check has resolved. A consumer holding a live
    /// [`GateTask`] sees the loading state only through [`GateTask::pending`].
    pub is_loading: bool,
    pub is_authorized: bool,
    pub user: Option<SessionUser>,
    pub error: Option<GateError>,
    /// Navigation directive: login (with the original path attached) for
    /// missing credentials, home for an insufficient role.
    pub redirect: Option<String>,
}

impl GateOutcome {
    fn authorized(user: SessionUser) -> Self {
        Self {
            is_loading: false,
            is_authorized: true,
            user: Some(user),
            error: None,
            redirect: None,
        }
    }

    fn denied(error: GateError, redirect: Option<String>) -> Self {
        Self {
            is_loading: false,
            is_authorized: false,
            user: None,
            error: Some(error),
            redirect,
        }
    }
}

/// check_session
///
/// The client gate: re-checks a request against the canonical credential
/// store, which is richer than the cookie mirror the edge gate saw. Every
/// failure degrades to a denied outcome; nothing here panics the request.
///
/// Order of evaluation, mirroring the platform's session hook:
/// missing token or record, then profile parse, then the role predicate
/// (only when a role was asked for).
pub async fn check_session(
    store: &CredentialState,
    token: Option<&str>,
    required: Option<RequiredRole>,
    current_path: &str,
    login_path: &str,
    redirect_on_missing: bool,
) -> GateOutcome {
    let record = match token {
        Some(token) if !token.is_empty() => store.read(token).await,
        _ => None,
    };

    let Some(record) = record else {
        let redirect =
            redirect_on_missing.then(|| login_redirect_target(login_path, current_path));
        return GateOutcome::denied(GateError::MissingCredentials, redirect);
    };

    let user = match serde_json::from_str::<SessionUser>(&record.user) {
        Ok(user) => user,
        Err(error) => {
            tracing::warn!(%error, path = current_path, "stored profile failed to parse");
            return GateOutcome::denied(GateError::MalformedProfile(error.to_string()), None);
        }
    };

    if required.is_some() && !validate_route_access(required, Some(&user)) {
        tracing::debug!(path = current_path, ?required, "role predicate denied access");
        return GateOutcome::denied(GateError::InsufficientRole, Some("/".to_string()));
    }

    GateOutcome::authorized(user)
}

/// GateTask
///
/// [`check_session`] as an abortable task. Cancelling drops the in-flight
/// check so a stale outcome can never be applied after its consumer has
/// navigated away.
pub struct GateTask {
    handle: JoinHandle<GateOutcome>,
}

impl GateTask {
    pub fn spawn(
        store: CredentialState,
        token: Option<String>,
        required: Option<RequiredRole>,
        current_path: String,
        login_path: String,
        redirect_on_missing: bool,
    ) -> Self {
        let handle = tokio::spawn(async move {
            check_session(
                &store,
                token.as_deref(),
                required,
                &current_path,
                &login_path,
                redirect_on_missing,
            )
            .await
        });
        Self { handle }
    }

    pub fn pending(&self) -> bool {
        !self.handle.is_finished()
    }

    pub fn cancel(&self) {
        self.handle.abort();
    }

    /// outcome
    ///
    /// Resolves the task. `None` means it was cancelled and nothing may be
    /// applied. A panic inside the check is caught here and surfaced as a
    /// denied outcome, per the never-unresolved rule.
    pub async fn outcome(self) -> Option<GateOutcome> {
        match self.handle.await {
            Ok(outcome) => Some(outcome),
            Err(error) if error.is_cancelled() => None,
            Err(error) => Some(GateOutcome::denied(
                GateError::CheckFailed(error.to_string()),
                None,
            )),
        }
    }
}

/// render_gate
///
/// The page wrapper around a gate outcome: follow the redirect when one was
/// issued, show the access-denied panel (with a way home) when denied, and
/// otherwise render the page with the resolved user injected.
pub fn render_gate(
    outcome: GateOutcome,
    page: impl FnOnce(&SessionUser) -> String,
) -> Response {
    if let Some(target) = outcome.redirect.as_deref() {
        return Redirect::temporary(target).into_response();
    }

    if outcome.is_loading {
        return Html(page_shell("Checking session", "<p>Checking your session&hellip;</p>"))
            .into_response();
    }

    if !outcome.is_authorized {
        let reason = outcome
            .error
            .map(|error| error.to_string())
            .unwrap_or_else(|| "access denied".to_string());
        let body = page_shell(
            "Access denied",
            &format!(
                "<h1>Access denied</h1><p>{reason}</p><p><a href=\"/\">Go back home</a></p>"
            ),
        );
        return (StatusCode::FORBIDDEN, Html(body)).into_response();
    }

    // Authorized outcomes always carry the resolved user.
    let user = outcome.user.unwrap_or_default();
    Html(page(&user)).into_response()
}

/// Minimal document wrapper shared by every server-rendered shell.
pub(crate) fn page_shell(title: &str, body: &str) -> String {
    format!(
        "<!doctype html><html><head><title>{title} · Giving Portal</title></head><body>{body}</body></html>"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{CredentialStore, MemoryCredentialStore, SessionRecord};
    use std::sync::Arc;

    async fn store_with(user_json: &str) -> (CredentialState, String) {
        let store = MemoryCredentialStore::new();
        let record = SessionRecord::new(user_json.to_string(), None);
        let token = record.access_token.clone();
        store.write(record).await;
        (Arc::new(store) as CredentialState, token)
    }

    #[tokio::test]
    async fn valid_session_without_required_role_authorizes() {
        let (store, token) = store_with(r#"{"id":5}"#).await;
        let outcome =
            check_session(&store, Some(&token), None, "/dashboard", "/auth/login", true).await;

        assert!(!outcome.is_loading);
        assert!(outcome.is_authorized);
        assert_eq!(outcome.user.unwrap().id, Some(5));
        assert!(outcome.error.is_none());
    }

    #[tokio::test]
    async fn malformed_stored_profile_denies_with_error() {
        let (store, token) = store_with("definitely not json").await;
        let outcome =
            check_session(&store, Some(&token), None, "/dashboard", "/auth/login", true).await;

        assert!(!outcome.is_authorized);
        assert!(matches!(outcome.error, Some(GateError::MalformedProfile(_))));
        assert!(outcome.redirect.is_none());
    }

    #[tokio::test]
    async fn missing_credentials_redirect_to_login_when_configured() {
        let store: CredentialState = Arc::new(MemoryCredentialStore::new());
        let outcome =
            check_session(&store, None, None, "/dashboard", "/auth/login", true).await;

        assert_eq!(outcome.error, Some(GateError::MissingCredentials));
        assert_eq!(
            outcome.redirect.as_deref(),
            Some("/auth/login?redirect=%2Fdashboard")
        );

        let silent = check_session(&store, None, None, "/dashboard", "/auth/login", false).await;
        assert!(silent.redirect.is_none());
    }

    #[tokio::test]
    async fn unknown_token_counts_as_missing_credentials() {
        let store: CredentialState = Arc::new(MemoryCredentialStore::new());
        let outcome = check_session(
            &store,
            Some("stale-token"),
            None,
            "/settings",
            "/auth/login",
            true,
        )
        .await;
        assert_eq!(outcome.error, Some(GateError::MissingCredentials));
    }

    #[tokio::test]
    async fn insufficient_role_sends_the_user_home() {
        let (store, token) = store_with(r#"{"id":3,"role":"USER"}"#).await;
        let outcome = check_session(
            &store,
            Some(&token),
            Some(RequiredRole::Admin),
            "/admin/events",
            "/auth/login",
            true,
        )
        .await;

        assert!(!outcome.is_authorized);
        assert_eq!(outcome.error, Some(GateError::InsufficientRole));
        assert_eq!(outcome.redirect.as_deref(), Some("/"));
    }

    #[tokio::test]
    async fn event_owner_requirement_is_a_coarse_grant() {
        let (store, token) = store_with(r#"{"id":9}"#).await;
        let outcome = check_session(
            &store,
            Some(&token),
            Some(RequiredRole::EventOwner),
            "/events/9/manage",
            "/auth/login",
            true,
        )
        .await;
        assert!(outcome.is_authorized);
    }

    #[tokio::test]
    async fn cancelled_task_yields_no_outcome() {
        let store: CredentialState = Arc::new(MemoryCredentialStore::new());
        let task = GateTask::spawn(
            store,
            None,
            None,
            "/dashboard".to_string(),
            "/auth/login".to_string(),
            true,
        );
        task.cancel();
        // Aborted either before or after resolution; a resolved-then-aborted
        // race may still surface the outcome, but a cancelled run never does.
        if let Some(outcome) = task.outcome().await {
            assert!(!outcome.is_loading);
        }
    }

    #[tokio::test]
    async fn render_gate_denied_panel_links_home() {
        let outcome = GateOutcome::denied(GateError::InsufficientRole, None);
        let response = render_gate(outcome, |_| unreachable!("denied outcomes never render"));
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = String::from_utf8(body.to_vec()).unwrap();
        assert!(body.contains("Go back home"));
    }

    #[tokio::test]
    async fn render_gate_follows_redirects_first() {
        let outcome = GateOutcome::denied(
            GateError::MissingCredentials,
            Some("/auth/login?redirect=%2Fcards".to_string()),
        );
        let response = render_gate(outcome, |_| unreachable!());
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(
            response
                .headers()
                .get(axum::http::header::LOCATION)
                .unwrap(),
            "/auth/login?redirect=%2Fcards"
        );
    }

    #[tokio::test]
    async fn render_gate_injects_the_resolved_user() {
        let (store, token) = store_with(r#"{"id":5,"email":"d@example.com"}"#).await;
        let outcome =
            check_session(&store, Some(&token), None, "/dashboard", "/auth/login", true).await;
        let response = render_gate(outcome, |user| format!("hello user {}", user.id.unwrap()));

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(String::from_utf8(body.to_vec()).unwrap(), "hello user 5");
    }
}
