use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};

use crate::{
    AppState,
    models::SessionUser,
    policy::{AccessDecision, RequiredRole, RouteClass, is_admin_user},
    session::{ACCESS_TOKEN_COOKIE, USER_COOKIE, decode_user_cookie},
};

/// edge_gate
///
/// The pre-render check, applied as a middleware layer over the whole page
/// router. It sees only cookies (the mirror copies of the credential store)
/// and resolves every request before a handler runs: pass through, redirect
/// to login with the original path attached, or redirect home on a role
/// mismatch. It performs no I/O of its own.
pub async fn edge_gate(
    State(state): State<AppState>,
    jar: CookieJar,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_owned();

    let required = match state.routes.classify(&path) {
        RouteClass::Bypass | RouteClass::Public => return next.run(request).await,
        RouteClass::Protected(role) => role,
        RouteClass::Unmatched => match state.routes.default_decision {
            AccessDecision::Allow => {
                tracing::debug!(%path, "unlisted route allowed by table default");
                return next.run(request).await;
            }
            // A closed-world deployment treats unlisted pages like any
            // signed-in-only page.
            AccessDecision::Deny => RequiredRole::User,
        },
    };

    let token = jar
        .get(ACCESS_TOKEN_COOKIE)
        .map(|cookie| cookie.value())
        .filter(|value| !value.is_empty());
    let user = jar
        .get(USER_COOKIE)
        .and_then(|cookie| parse_user_cookie(cookie.value()));

    let (Some(_token), Some(user)) = (token, user) else {
        tracing::debug!(%path, "no usable session cookies; redirecting to login");
        return Redirect::temporary(&login_redirect_target(&state.config.login_path, &path))
            .into_response();
    };

    if required == RequiredRole::Admin && !is_admin_user(&user) {
        tracing::warn!(%path, user_id = ?user.id, "non-admin session on an admin route");
        return Redirect::temporary("/").into_response();
    }

    next.run(request).await
}

/// parse_user_cookie
///
/// Percent-decodes and parses the mirrored profile cookie. Malformed
/// encoding or JSON is logged and treated as "no user" rather than failing
/// the request.
pub fn parse_user_cookie(raw: &str) -> Option<SessionUser> {
    let decoded = decode_user_cookie(raw)?;
    match serde_json::from_str::<SessionUser>(&decoded) {
        Ok(user) => Some(user),
        Err(error) => {
            tracing::debug!(%error, "user cookie did not parse; treating as absent");
            None
        }
    }
}

/// login_redirect_target
///
/// The navigation contract for unauthenticated requests: the login path with
/// the original path attached as a percent-encoded `redirect` parameter.
pub fn login_redirect_target(login_path: &str, original_path: &str) -> String {
    format!(
        "{}?redirect={}",
        login_path,
        utf8_percent_encode(original_path, NON_ALPHANUMERIC)
    )
}
