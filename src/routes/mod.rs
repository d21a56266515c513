/// Router Module Index
///
/// One module per page area. Each area is mounted in `create_router` behind
/// its own client gate, so the access rule lives next to the routes it covers.

/// Pages that need no identity (health) and the guest-only auth pages.
pub mod public;

/// Pages for any signed-in user.
pub mod authenticated;

/// Pages reserved for the `admin` role, nested under `/admin`.
pub mod admin;

/// Pages reserved for the `student` role, nested under `/student`.
pub mod student;
