/// Router Module Index
///
/// Organizes the page tree into the same access tiers the route policy
/// table describes, so the registration of a page and its protection level
/// stay next to each other.
///
/// Protection itself is enforced by the edge gate layered over the merged
/// router (cookie-only, pre-render) and by the client gate each protected
/// handler runs against the canonical credential store.

/// Pages open to any client, plus the session lifecycle API.
pub mod public;

/// Pages for signed-in users; `User`-tier in the policy table.
pub mod authenticated;

/// The `/admin` family; `Admin`-tier in the policy table.
pub mod admin;
