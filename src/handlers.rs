use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, Uri, header},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

use crate::{
    AppState,
    config::Env,
    error::AuthError,
    guard::{check_session, page_shell, render_gate},
    models::{CallbackQuery, LoginRequest, LoginResponse, SessionSnapshot, SessionUser},
    obfuscate::reveal_id,
    policy::{RequiredRole, verify_event_ownership},
    session::{ACCESS_TOKEN_COOKIE, SessionRecord, mirror_cookies, removal_cookies},
};

// --- Upstream Provider Payloads ---

/// ProviderSession
///
/// Minimal shape of a successful response from the upstream identity
/// provider's token/exchange endpoints; only the profile is consumed.
#[derive(Deserialize)]
struct ProviderSession {
    user: SessionUser,
}

// --- Session Lifecycle (the credential store writers) ---

/// login
///
/// [Public API] Establishes a session from email/password credentials.
///
/// In `Env::Production` the credentials are forwarded to the upstream
/// identity provider; `Env::Local` resolves a deterministic development
/// profile instead so the flow works offline (role derived from the email
/// local-part). On success the canonical store is written and the cookie
/// mirror is attached to the response in the same handler.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session established", body = LoginResponse),
        (status = 401, description = "Credentials rejected"),
        (status = 502, description = "Identity provider unreachable")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    Json(payload): Json<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>), AuthError> {
    if payload.email.is_empty() || payload.password.is_empty() {
        return Err(AuthError::BadRequest(
            "email and password are required".to_string(),
        ));
    }

    let user = match state.config.env {
        Env::Local => local_profile(&payload.email),
        Env::Production => {
            provider_session(
                &state,
                "/auth/v1/token",
                serde_json::json!({ "email": payload.email, "password": payload.password }),
            )
            .await?
        }
    };

    let (jar, record) = establish_session(&state, jar, &user, &headers).await?;
    tracing::info!(user_id = ?user.id, "session established via login");

    Ok((
        jar,
        Json(LoginResponse {
            token: record.access_token,
            user,
        }),
    ))
}

/// oauth_callback
///
/// [Public API] Completes an OAuth flow: exchanges the provider code for a
/// profile, writes the session, and sends the browser to the `redirect`
/// parameter carried through the flow.
#[utoipa::path(
    get,
    path = "/api/auth/callback",
    params(CallbackQuery),
    responses(
        (status = 307, description = "Session written; redirecting"),
        (status = 401, description = "Code rejected by the provider")
    )
)]
pub async fn oauth_callback(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    Query(query): Query<CallbackQuery>,
) -> Result<(CookieJar, Redirect), AuthError> {
    if query.code.is_empty() {
        return Err(AuthError::BadRequest("missing authorization code".to_string()));
    }

    let user = match state.config.env {
        // The local exchange mirrors the login bypass: the code stands in
        // for the provider identity.
        Env::Local => local_profile(&format!("{}@oauth.local", query.code)),
        Env::Production => {
            provider_session(
                &state,
                "/auth/v1/exchange",
                serde_json::json!({ "code": query.code }),
            )
            .await?
        }
    };

    let (jar, _record) = establish_session(&state, jar, &user, &headers).await?;
    tracing::info!(user_id = ?user.id, "session established via oauth callback");

    let target = sanitize_redirect(query.redirect.as_deref());
    Ok((jar, Redirect::temporary(target)))
}

/// logout
///
/// [Public API] Clears the canonical session record and expires both mirror
/// cookies, then sends the browser home.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses((status = 307, description = "Session cleared; redirecting home"))
)]
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, Redirect) {
    if let Some(cookie) = jar.get(ACCESS_TOKEN_COOKIE) {
        let cleared = state.store.clear(cookie.value()).await;
        tracing::info!(cleared, "logout requested");
    }

    let (token_cookie, user_cookie) = removal_cookies();
    let jar = jar.remove(token_cookie).remove(user_cookie);
    (jar, Redirect::temporary("/"))
}

/// get_session
///
/// [Public API] Session introspection: runs the client-gate check for the
/// caller's cookie and returns the outcome in the shape the frontend
/// session hook consumes. Never errors; a broken session is reported, not
/// thrown.
#[utoipa::path(
    get,
    path = "/api/auth/session",
    responses((status = 200, description = "Current session state", body = SessionSnapshot))
)]
pub async fn get_session(State(state): State<AppState>, jar: CookieJar) -> Json<SessionSnapshot> {
    let token = jar.get(ACCESS_TOKEN_COOKIE).map(|c| c.value().to_owned());
    let outcome = check_session(
        &state.store,
        token.as_deref(),
        None,
        "/api/auth/session",
        &state.config.login_path,
        false,
    )
    .await;

    let language = match token.as_deref() {
        Some(token) => state
            .store
            .read(token)
            .await
            .and_then(|record| record.language),
        None => None,
    };

    Json(SessionSnapshot {
        is_authorized: outcome.is_authorized,
        user: outcome.user,
        error: outcome.error.map(|error| error.to_string()),
        language,
    })
}

/// establish_session
///
/// Shared tail of the two store writers: mint the record, write the
/// canonical store, and attach the cookie mirror so both copies change in
/// the same response.
async fn establish_session(
    state: &AppState,
    jar: CookieJar,
    user: &SessionUser,
    headers: &HeaderMap,
) -> Result<(CookieJar, SessionRecord), AuthError> {
    let user_json = serde_json::to_string(user)
        .map_err(|error| AuthError::BadRequest(error.to_string()))?;
    let record = SessionRecord::new(user_json, primary_language(headers));

    let (token_cookie, user_cookie) = mirror_cookies(&record, &state.config);
    state.store.write(record.clone()).await;

    Ok((jar.add(token_cookie).add(user_cookie), record))
}

/// local_profile
///
/// Development identity used when no provider is reachable: deterministic id
/// from the email, role from the local-part (`admin…` and `mod…` map onto
/// the elevated roles). Only reachable in `Env::Local`.
fn local_profile(email: &str) -> SessionUser {
    let id = (email
        .bytes()
        .fold(0u32, |acc, byte| acc.wrapping_mul(31).wrapping_add(byte as u32))
        % 900_000
        + 100_000) as i64;

    let local_part = email.split('@').next().unwrap_or_default();
    let (role, is_admin, is_moderator) = if local_part.starts_with("admin") {
        (Some("ADMIN"), Some(true), None)
    } else if local_part.starts_with("mod") {
        (Some("MODERATOR"), None, Some(true))
    } else {
        (Some("USER"), None, None)
    };

    SessionUser {
        id: Some(id),
        email: Some(email.to_string()),
        role: role.map(String::from),
        is_admin,
        is_moderator,
    }
}

async fn provider_session(
    state: &AppState,
    endpoint: &str,
    body: serde_json::Value,
) -> Result<SessionUser, AuthError> {
    let url = format!("{}{}", state.config.auth_origin, endpoint);
    let response = state
        .http
        .post(&url)
        .json(&body)
        .send()
        .await
        .map_err(|error| AuthError::Upstream(error.to_string()))?;

    if !response.status().is_success() {
        return Err(AuthError::Rejected);
    }

    let session = response
        .json::<ProviderSession>()
        .await
        .map_err(|error| AuthError::Upstream(error.to_string()))?;
    Ok(session.user)
}

/// Only same-site paths are honored; anything else falls back to home so
/// the callback cannot be used as an open redirector.
fn sanitize_redirect(raw: Option<&str>) -> &str {
    match raw {
        Some(path) if path.starts_with('/') && !path.starts_with("//") => path,
        _ => "/",
    }
}

fn primary_language(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::ACCEPT_LANGUAGE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|tag| tag.split(';').next().unwrap_or(tag).trim().to_string())
        .filter(|tag| !tag.is_empty())
}

// --- Gated Pages ---

/// gated_page
///
/// Shared path for every protected page: pull the token cookie, run the
/// client gate against the canonical store, and hand the outcome to the
/// render wrapper.
async fn gated_page(
    state: &AppState,
    jar: &CookieJar,
    required: Option<RequiredRole>,
    path: &str,
    page: impl FnOnce(&SessionUser) -> String,
) -> Response {
    let token = jar.get(ACCESS_TOKEN_COOKIE).map(|c| c.value().to_owned());
    let outcome = check_session(
        &state.store,
        token.as_deref(),
        required,
        path,
        &state.config.login_path,
        true,
    )
    .await;
    render_gate(outcome, page)
}

/// dashboard_page
///
/// [User] The donor dashboard landing page.
pub async fn dashboard_page(State(state): State<AppState>, jar: CookieJar) -> Response {
    gated_page(&state, &jar, Some(RequiredRole::User), "/dashboard", |user| {
        page_shell(
            "Dashboard",
            &format!(
                "<h1>Your giving dashboard</h1><p>Signed in as {}.</p>\
                 <p><a href=\"/dashboard/donations\">Donation history</a></p>",
                user.email.as_deref().unwrap_or("member")
            ),
        )
    })
    .await
}

/// dashboard_donations_page
///
/// [User] Donation history, a subpage of the dashboard family.
pub async fn dashboard_donations_page(State(state): State<AppState>, jar: CookieJar) -> Response {
    gated_page(
        &state,
        &jar,
        Some(RequiredRole::User),
        "/dashboard/donations",
        |user| {
            page_shell(
                "Donations",
                &format!(
                    "<h1>Donation history</h1><p>Member #{}.</p>",
                    user.id.unwrap_or_default()
                ),
            )
        },
    )
    .await
}

/// settings_page
///
/// [User] Account settings shell.
pub async fn settings_page(State(state): State<AppState>, jar: CookieJar) -> Response {
    gated_page(&state, &jar, Some(RequiredRole::User), "/settings", |user| {
        page_shell(
            "Settings",
            &format!(
                "<h1>Account settings</h1><p>{}</p>",
                user.email.as_deref().unwrap_or("member")
            ),
        )
    })
    .await
}

/// cards_page
///
/// [User] Saved payment cards shell.
pub async fn cards_page(State(state): State<AppState>, jar: CookieJar) -> Response {
    gated_page(&state, &jar, Some(RequiredRole::User), "/cards", |_user| {
        page_shell("Cards", "<h1>Saved cards</h1>")
    })
    .await
}

/// event_create_page
///
/// [User] Fundraising event creation form shell.
pub async fn event_create_page(State(state): State<AppState>, jar: CookieJar) -> Response {
    gated_page(
        &state,
        &jar,
        Some(RequiredRole::User),
        "/events/create",
        |_user| page_shell("Create event", "<h1>Create a fundraising event</h1>"),
    )
    .await
}

#[derive(Deserialize)]
pub struct ManageQuery {
    /// Obfuscated owner id embedded in manage links by the events service.
    pub o: Option<String>,
}

/// event_manage_page
///
/// [EventOwner] Event management page. The gate only grants coarse access
/// (any signed-in user); this page is the second phase of the ownership
/// contract and must verify resource-level ownership before exposing
/// mutating actions. Without a verified owner match it renders read-only.
pub async fn event_manage_page(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(event_id): Path<i64>,
    Query(query): Query<ManageQuery>,
) -> Response {
    let path = format!("/events/{event_id}/manage");
    let key = state.config.obfuscation_key.clone();

    gated_page(
        &state,
        &jar,
        Some(RequiredRole::EventOwner),
        &path,
        move |user| {
            let owner_id = query.o.as_deref().and_then(|token| reveal_id(token, &key));
            let owns = owner_id.is_some_and(|owner| verify_event_ownership(user, owner));

            if owns {
                page_shell(
                    "Manage event",
                    &format!(
                        "<h1>Manage event #{event_id}</h1>\
                         <p><a href=\"/events/{event_id}/edit\">Edit</a> · \
                         <form method=\"post\" action=\"/api/events/{event_id}/close\">\
                         <button>Close event</button></form></p>"
                    ),
                )
            } else {
                page_shell(
                    "Manage event",
                    &format!(
                        "<h1>Event #{event_id}</h1>\
                         <p>Ownership could not be verified; management actions are hidden.</p>"
                    ),
                )
            }
        },
    )
    .await
}

// --- Admin Pages ---

async fn admin_section(state: &AppState, jar: &CookieJar, path: &str, title: &str) -> Response {
    let heading = title.to_owned();
    gated_page(state, jar, Some(RequiredRole::Admin), path, move |user| {
        page_shell(
            &heading,
            &format!(
                "<h1>{heading}</h1><p>Administrator: {}.</p>",
                user.email.as_deref().unwrap_or("admin")
            ),
        )
    })
    .await
}

/// admin_home_page
///
/// [Admin] Moderation landing page; every sibling below follows the same
/// gate-then-render shape.
pub async fn admin_home_page(State(state): State<AppState>, jar: CookieJar) -> Response {
    admin_section(&state, &jar, "/admin", "Administration").await
}

pub async fn admin_control_page(State(state): State<AppState>, jar: CookieJar) -> Response {
    admin_section(&state, &jar, "/admin/control", "Platform control").await
}

pub async fn admin_charities_page(State(state): State<AppState>, jar: CookieJar) -> Response {
    admin_section(&state, &jar, "/admin/charities", "Charity review").await
}

pub async fn admin_donations_page(State(state): State<AppState>, jar: CookieJar) -> Response {
    admin_section(&state, &jar, "/admin/donations", "Donations oversight").await
}

pub async fn admin_moderation_page(State(state): State<AppState>, jar: CookieJar) -> Response {
    admin_section(&state, &jar, "/admin/moderation", "Content moderation").await
}

pub async fn admin_events_page(State(state): State<AppState>, jar: CookieJar) -> Response {
    admin_section(&state, &jar, "/admin/events", "Event moderation").await
}

pub async fn admin_blog_page(State(state): State<AppState>, jar: CookieJar) -> Response {
    admin_section(&state, &jar, "/admin/blog", "Blog management").await
}

// --- Public Pages ---

/// home_page
///
/// [Public] Landing page.
pub async fn home_page() -> Response {
    axum::response::Html(page_shell(
        "Home",
        "<h1>Giving Portal</h1><p>Find a cause. Start an event. Give.</p>\
         <p><a href=\"/events\">Browse events</a> · <a href=\"/charities\">Charities</a></p>",
    ))
    .into_response()
}

/// marketing_page
///
/// [Public] Generic shell for the static marketing tree; the title is
/// derived from the request path.
pub async fn marketing_page(uri: Uri) -> Response {
    let slug = uri.path().trim_start_matches('/');
    let title: String = slug
        .split('-')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ");

    axum::response::Html(page_shell(&title, &format!("<h1>{title}</h1>"))).into_response()
}

#[derive(Deserialize)]
pub struct LoginPageQuery {
    pub redirect: Option<String>,
}

/// login_page
///
/// [Public] The sign-in form shell. Carries the `redirect` parameter the
/// edge gate attached so a successful login can resume the original
/// navigation.
pub async fn login_page(Query(query): Query<LoginPageQuery>) -> Response {
    let redirect = query.redirect.unwrap_or_else(|| "/".to_string());
    axum::response::Html(page_shell(
        "Sign in",
        &format!(
            "<h1>Sign in</h1>\
             <form method=\"post\" action=\"/api/auth/login\">\
             <input type=\"hidden\" name=\"redirect\" value=\"{redirect}\"/>\
             <input name=\"email\" type=\"email\" placeholder=\"Email\"/>\
             <input name=\"password\" type=\"password\" placeholder=\"Password\"/>\
             <button>Sign in</button></form>"
        ),
    ))
    .into_response()
}

/// events_page
///
/// [Public] Fundraising event listing shell.
pub async fn events_page() -> Response {
    axum::response::Html(page_shell(
        "Events",
        "<h1>Fundraising events</h1><p><a href=\"/events/create\">Start your own</a></p>",
    ))
    .into_response()
}

/// charities_page
///
/// [Public] Charity directory shell.
pub async fn charities_page() -> Response {
    axum::response::Html(page_shell("Charities", "<h1>Charities</h1>")).into_response()
}

/// blog_page
///
/// [Public] Blog index shell.
pub async fn blog_page() -> Response {
    axum::response::Html(page_shell("Blog", "<h1>From the blog</h1>")).into_response()
}
