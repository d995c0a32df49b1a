use crate::models::SessionUser;

/// RequiredRole
///
/// The role tag a route can demand. Attached to protected entries in the
/// route policy table and consulted by both gates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredRole {
    /// Any authenticated user (a profile with an id).
    User,
    Admin,
    Moderator,
    /// Coarse grant only: the gates admit any authenticated user, and the
    /// consuming page must call [`verify_event_ownership`] before exposing
    /// mutating actions. See the two-phase contract below.
    EventOwner,
}

/// AccessDecision
///
/// The explicit decision applied to paths that match neither the public nor
/// the protected table. Carried on [`RoutePolicyTable`] instead of being an
/// implicit fall-through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Allow,
    Deny,
}

/// RouteClass
///
/// Classification of an incoming path against the route policy table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// Never evaluated by the edge gate (API, static assets, favicon).
    Bypass,
    Public,
    Protected(RequiredRole),
    /// In neither table; resolved by the table's default decision.
    Unmatched,
}

// --- Route Tables ---
// The prefix lists are load-bearing for behavioral compatibility with the
// rest of the platform; edits here change which pages the gates cover.

pub const PUBLIC_PREFIXES: &[&str] = &[
    "/",
    "/about-us",
    "/contact",
    "/how-it-works",
    "/privacy-policy",
    "/terms-of-service",
    "/auth/login",
    "/auth/register",
    "/auth/forgot-password",
    "/auth/reset-password",
    "/auth/login-otp",
    "/help-center",
    "/guide",
    "/blog",
    "/events",
    "/charities",
    "/tips",
    "/business-card",
    "/feedback",
    "/survey",
    "/announcements",
];

pub const PROTECTED_PREFIXES: &[(&str, RequiredRole)] = &[
    ("/admin", RequiredRole::Admin),
    ("/admin/control", RequiredRole::Admin),
    ("/admin/charities", RequiredRole::Admin),
    ("/admin/donations", RequiredRole::Admin),
    ("/admin/moderation", RequiredRole::Admin),
    ("/admin/events", RequiredRole::Admin),
    ("/admin/blog", RequiredRole::Admin),
    ("/dashboard", RequiredRole::User),
    ("/settings", RequiredRole::User),
    ("/cards", RequiredRole::User),
    ("/events/create", RequiredRole::User),
];

pub const BYPASS_PREFIXES: &[&str] = &["/api", "/static", "/assets"];

const FAVICON_PATH: &str = "/favicon.ico";

/// prefix_matches
///
/// An entry matches a path when the path equals the entry or continues past
/// it at a `/` boundary. `/` therefore matches only the root, and `/admin`
/// matches `/admin/events` but not `/administrator`.
fn prefix_matches(prefix: &str, path: &str) -> bool {
    path == prefix || path.strip_prefix(prefix).is_some_and(|rest| rest.starts_with('/'))
}

/// RoutePolicyTable
///
/// The path-prefix policy over the platform's page tree. Both tables are
/// consulted together and the longest matching prefix wins, so
/// `/events/create` stays protected even though `/events` is public.
#[derive(Debug, Clone, Copy)]
pub struct RoutePolicyTable {
    pub default_decision: AccessDecision,
}

impl RoutePolicyTable {
    pub fn new(default_decision: AccessDecision) -> Self {
        Self { default_decision }
    }

    /// classify
    ///
    /// Resolves a path to its route class. Bypass prefixes are checked first;
    /// after that the longest matching entry across the public and protected
    /// tables decides. A tie between a public and a protected entry of equal
    /// length resolves to the protected one.
    pub fn classify(&self, path: &str) -> RouteClass {
        if path == FAVICON_PATH
            || BYPASS_PREFIXES.iter().any(|p| prefix_matches(p, path))
        {
            return RouteClass::Bypass;
        }

        let public = PUBLIC_PREFIXES
            .iter()
            .filter(|p| prefix_matches(p, path))
            .map(|p| p.len())
            .max();
        let protected = PROTECTED_PREFIXES
            .iter()
            .filter(|(p, _)| prefix_matches(p, path))
            .max_by_key(|(p, _)| p.len());

        match (public, protected) {
            (Some(pub_len), Some((prot, role))) => {
                if pub_len > prot.len() {
                    RouteClass::Public
                } else {
                    RouteClass::Protected(*role)
                }
            }
            (Some(_), None) => RouteClass::Public,
            (None, Some((_, role))) => RouteClass::Protected(*role),
            (None, None) => RouteClass::Unmatched,
        }
    }
}

impl Default for RoutePolicyTable {
    /// The shipped default keeps unlisted routes reachable, matching the
    /// platform's historical behavior. Deployments that want a closed world
    /// set `UNMATCHED_ROUTE_POLICY=deny`.
    fn default() -> Self {
        Self::new(AccessDecision::Allow)
    }
}

// --- Access Policy ---

/// is_admin_user
///
/// The admin predicate shared by the edge gate and the access policy:
/// the `ADMIN` role tag or the `isAdmin` flag.
pub fn is_admin_user(user: &SessionUser) -> bool {
    user.role.as_deref() == Some("ADMIN") || user.is_admin == Some(true)
}

fn has_moderator_access(user: &SessionUser) -> bool {
    user.role.as_deref() == Some("MODERATOR")
        || user.is_moderator == Some(true)
        || is_admin_user(user)
}

/// validate_route_access
///
/// Pure decision function mapping (required role, user) to allow/deny.
/// Deterministic for identical inputs; performs no I/O.
///
/// An absent user is denied regardless of the requirement. With no
/// requirement (or `User`), any profile carrying an id passes. Admins
/// inherit moderator access. `EventOwner` is a coarse grant; resource-level
/// ownership is the consuming page's responsibility.
pub fn validate_route_access(
    required: Option<RequiredRole>,
    user: Option<&SessionUser>,
) -> bool {
    let Some(user) = user else {
        return false;
    };

    match required {
        None | Some(RequiredRole::User) | Some(RequiredRole::EventOwner) => user.id.is_some(),
        Some(RequiredRole::Admin) => is_admin_user(user),
        Some(RequiredRole::Moderator) => has_moderator_access(user),
    }
}

/// verify_event_ownership
///
/// Second phase of the two-phase authorization contract for `EventOwner`
/// routes: the gates grant coarse access, and each consuming page must call
/// this with the event's owner id before exposing mutating actions.
pub fn verify_event_ownership(user: &SessionUser, owner_id: i64) -> bool {
    user.id == Some(owner_id)
}
