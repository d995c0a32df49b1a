use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

// --- Session Profile (Stored / Mirrored) ---

/// SessionUser
///
/// The user profile as written into the credential store at login or
/// OAuth-callback time, and mirrored (percent-encoded) into the `user` cookie.
/// The wire shape is a loose mapping: every field is optional, and a profile
/// with no role fields is treated as a plain authenticated user.
///
/// Wire keys are camelCase (`isAdmin`, `isModerator`) for compatibility with
/// the frontend that produces and consumes these documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct SessionUser {
    /// Platform user id. Presence of this field is what the access policy
    /// means by "authenticated user".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Enumerated role tag, e.g. "ADMIN" or "MODERATOR".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_admin: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_moderator: Option<bool>,
}

// --- Auth Surface Payloads ---

/// LoginRequest
///
/// Input payload for POST /api/auth/login. The password is only forwarded to
/// the upstream identity provider and never persisted or logged here.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// LoginResponse
///
/// Output of a successful login: the opaque session token (also mirrored into
/// the `accessToken` cookie) and the resolved profile.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LoginResponse {
    pub token: String,
    pub user: SessionUser,
}

/// CallbackQuery
///
/// Query parameters accepted by the OAuth completion endpoint
/// (GET /api/auth/callback).
#[derive(Debug, Clone, Deserialize, utoipa::IntoParams)]
pub struct CallbackQuery {
    /// Authorization code handed back by the provider.
    pub code: String,
    /// Where to send the browser once the session is written.
    pub redirect: Option<String>,
}

/// SessionSnapshot
///
/// Output of GET /api/auth/session: the client-gate outcome for the caller's
/// current cookies, in the shape the frontend session hook consumes.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SessionSnapshot {
    pub is_authorized: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<SessionUser>,
    /// Human-readable denial reason, when the check did not authorize.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Locale tag carried in the session record; unrelated to authorization.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}
