/// API route handlers
///
/// Organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Login, token refresh, logout and password change
/// - `codes`: Door codes, gated by `CodeVoter`
/// - `memberships`: Memberships and their registrations
/// - `forms`: Field lists for clients
/// - `shifts`: Booking and scheduling
/// - `process_updates`: Process changelog, gated by `ProcessUpdateVoter`

pub mod auth;
pub mod codes;
pub mod forms;
pub mod health;
pub mod memberships;
pub mod process_updates;
pub mod shifts;
