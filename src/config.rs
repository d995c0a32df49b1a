use std::env;

use crate::policy::AccessDecision;

// Mirror cookies never outlive this, whatever the deployment asks for.
const MAX_SESSION_AGE_SECS: i64 = 30 * 24 * 3600;
const DEFAULT_SESSION_AGE_SECS: i64 = 7 * 24 * 3600;

/// AppConfig
///
/// The application's entire configuration, immutable once loaded and shared
/// through the unified state. Every gate and handler reads from here rather
/// than from ambient process state.
#[derive(Clone)]
pub struct AppConfig {
    /// Runtime environment marker. Controls log format and the local login
    /// bypass.
    pub env: Env,
    pub bind_addr: String,
    /// Base URL of the upstream identity provider consulted by login and
    /// the OAuth callback in production.
    pub auth_origin: String,
    /// Where unauthenticated requests for protected pages are sent.
    pub login_path: String,
    /// Bounded lifetime for the mirror cookies, in seconds.
    pub session_max_age_secs: i64,
    /// Explicit decision for paths in neither route table.
    pub unmatched_policy: AccessDecision,
    /// Fixed key for the reversible id obfuscation helper.
    pub obfuscation_key: String,
}

/// Env
///
/// Switches between development conveniences (pretty logs, offline login
/// bypass) and production behavior (JSON logs, mandatory upstream provider).
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Default for AppConfig {
    /// Safe, non-panicking instance for test setup. No environment variables
    /// are consulted.
    fn default() -> Self {
        Self {
            env: Env::Local,
            bind_addr: "0.0.0.0:3000".to_string(),
            auth_origin: "http://localhost:9999".to_string(),
            login_path: "/auth/login".to_string(),
            session_max_age_secs: DEFAULT_SESSION_AGE_SECS,
            unmatched_policy: AccessDecision::Allow,
            obfuscation_key: "portal-dev-key".to_string(),
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Canonical startup initialization from environment variables, with
    /// fail-fast behavior for values production cannot run without.
    ///
    /// # Panics
    /// Panics when a variable required for the current environment is
    /// missing, so the service never starts half-configured.
    pub fn load() -> Self {
        let env_str = env::var("APP_ENV").unwrap_or_else(|_| "local".to_string());
        let env = match env_str.as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        };

        let auth_origin = match env {
            Env::Production => {
                env::var("AUTH_ORIGIN").expect("FATAL: AUTH_ORIGIN must be set in production.")
            }
            _ => env::var("AUTH_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:9999".to_string()),
        };

        let obfuscation_key = match env {
            Env::Production => env::var("ID_OBFUSCATION_KEY")
                .expect("FATAL: ID_OBFUSCATION_KEY must be set in production."),
            _ => env::var("ID_OBFUSCATION_KEY")
                .unwrap_or_else(|_| "portal-dev-key".to_string()),
        };

        let session_max_age_secs = env::var("SESSION_MAX_AGE_SECS")
            .ok()
            .and_then(|raw| raw.parse::<i64>().ok())
            .unwrap_or(DEFAULT_SESSION_AGE_SECS)
            .clamp(60, MAX_SESSION_AGE_SECS);

        let unmatched_policy = match env::var("UNMATCHED_ROUTE_POLICY").as_deref() {
            Ok("deny") => AccessDecision::Deny,
            _ => AccessDecision::Allow,
        };

        Self {
            env,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            auth_origin,
            login_path: env::var("LOGIN_PATH").unwrap_or_else(|_| "/auth/login".to_string()),
            session_max_age_secs,
            unmatched_policy,
            obfuscation_key,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_vars() {
        for key in [
            "APP_ENV",
            "AUTH_ORIGIN",
            "LOGIN_PATH",
            "SESSION_MAX_AGE_SECS",
            "UNMATCHED_ROUTE_POLICY",
            "ID_OBFUSCATION_KEY",
            "BIND_ADDR",
        ] {
            unsafe { env::remove_var(key) };
        }
    }

    #[test]
    #[serial]
    fn local_load_uses_fallbacks() {
        clear_vars();
        let config = AppConfig::load();
        assert_eq!(config.env, Env::Local);
        assert_eq!(config.login_path, "/auth/login");
        assert_eq!(config.session_max_age_secs, DEFAULT_SESSION_AGE_SECS);
        assert_eq!(config.unmatched_policy, AccessDecision::Allow);
    }

    #[test]
    #[serial]
    fn session_age_is_clamped() {
        clear_vars();
        unsafe { env::set_var("SESSION_MAX_AGE_SECS", "999999999") };
        let config = AppConfig::load();
        assert_eq!(config.session_max_age_secs, MAX_SESSION_AGE_SECS);
        clear_vars();
    }

    #[test]
    #[serial]
    fn unmatched_policy_can_be_closed() {
        clear_vars();
        unsafe { env::set_var("UNMATCHED_ROUTE_POLICY", "deny") };
        let config = AppConfig::load();
        assert_eq!(config.unmatched_policy, AccessDecision::Deny);
        clear_vars();
    }
}
