use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use axum_extra::extract::cookie::{Cookie, SameSite};
use chrono::{DateTime, Utc};
use percent_encoding::{NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::config::AppConfig;

// Cookie names mirrored from the credential store for edge-gate visibility.
pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";
pub const USER_COOKIE: &str = "user";

/// SessionRecord
///
/// One session in the canonical credential store, keyed by its access token.
/// The token is opaque: its presence is what the gates treat as
/// "authenticated". No signature or expiry verification happens anywhere in
/// this layer.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRecord {
    pub access_token: String,
    /// Carried for the rest of the platform; unused by the gating layer.
    pub refresh_token: Option<String>,
    /// The profile as a raw JSON document, stored exactly as written.
    /// Parsing happens at read time, so malformed content must be tolerated
    /// by every reader.
    pub user: String,
    /// Locale tag, unrelated to authorization.
    pub language: Option<String>,
    pub issued_at: DateTime<Utc>,
}

impl SessionRecord {
    /// Builds a record around a freshly minted token.
    pub fn new(user_json: String, language: Option<String>) -> Self {
        Self {
            access_token: mint_token(),
            refresh_token: Some(mint_token()),
            user: user_json,
            language,
            issued_at: Utc::now(),
        }
    }
}

/// mint_token
///
/// Opaque session token. A v4 UUID is enough entropy for a bearer handle;
/// nothing downstream inspects its structure.
pub fn mint_token() -> String {
    Uuid::new_v4().simple().to_string()
}

/// CredentialStore
///
/// The single typed accessor owning read/write/clear for session state.
/// Writers (login, OAuth callback, logout) go through this trait and attach
/// the cookie mirror in the same handler; there is no other path to session
/// mutation.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn read(&self, token: &str) -> Option<SessionRecord>;
    async fn write(&self, record: SessionRecord);
    /// Returns true when a record was actually removed.
    async fn clear(&self, token: &str) -> bool;
}

/// CredentialState
///
/// The shared handle injected into the application state.
pub type CredentialState = Arc<dyn CredentialStore>;

/// MemoryCredentialStore
///
/// In-memory implementation of the credential store. Last writer wins; the
/// lock only guards the map itself, matching the single-writer-per-session
/// model of the login/logout handlers.
#[derive(Default)]
pub struct MemoryCredentialStore {
    sessions: RwLock<HashMap<String, SessionRecord>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn read(&self, token: &str) -> Option<SessionRecord> {
        self.sessions.read().await.get(token).cloned()
    }

    async fn write(&self, record: SessionRecord) {
        self.sessions
            .write()
            .await
            .insert(record.access_token.clone(), record);
    }

    async fn clear(&self, token: &str) -> bool {
        self.sessions.write().await.remove(token).is_some()
    }
}

// --- Cookie Mirror ---

/// encode_user_cookie
///
/// Percent-encodes the profile JSON for transport in the `user` cookie,
/// compatible with the frontend's `encodeURIComponent` handling.
pub fn encode_user_cookie(user_json: &str) -> String {
    utf8_percent_encode(user_json, NON_ALPHANUMERIC).to_string()
}

/// decode_user_cookie
///
/// Reverses [`encode_user_cookie`]. Returns `None` on invalid encoding; the
/// gates treat that the same as an absent cookie.
pub fn decode_user_cookie(raw: &str) -> Option<String> {
    percent_decode_str(raw)
        .decode_utf8()
        .ok()
        .map(|value| value.into_owned())
}

/// mirror_cookies
///
/// The explicit synchronization step between the canonical store and the
/// cookie copy the edge gate reads. Every store writer attaches these to its
/// response; both cookies share `Path=/`, a bounded `Max-Age`, and
/// `SameSite=Lax`.
pub fn mirror_cookies(
    record: &SessionRecord,
    config: &AppConfig,
) -> (Cookie<'static>, Cookie<'static>) {
    let max_age = time::Duration::seconds(config.session_max_age_secs);

    let token = Cookie::build((ACCESS_TOKEN_COOKIE, record.access_token.clone()))
        .path("/")
        .max_age(max_age)
        .same_site(SameSite::Lax)
        .build();

    let user = Cookie::build((USER_COOKIE, encode_user_cookie(&record.user)))
        .path("/")
        .max_age(max_age)
        .same_site(SameSite::Lax)
        .build();

    (token, user)
}

/// removal_cookies
///
/// Path-scoped twins of the mirror cookies, handed to `CookieJar::remove`
/// at logout so the browser drops both copies.
pub fn removal_cookies() -> (Cookie<'static>, Cookie<'static>) {
    let token = Cookie::build(ACCESS_TOKEN_COOKIE).path("/").build();
    let user = Cookie::build(USER_COOKIE).path("/").build();
    (token, user)
}
