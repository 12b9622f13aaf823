/// Middleware modules for the API server
///
/// - `first_password`: sends users who must choose a password to the
///   password change route
/// - `client_ip`: extractor for the address door code rules are checked
///   against

pub mod client_ip;
pub mod first_password;
