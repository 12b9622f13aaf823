/// First password guard
///
/// Runs after JWT authentication. While the current user carries
/// `ROLE_PASSWORD_TO_SET`, every request other than the password change and
/// logout is answered with `303 See Other` pointing at the password change
/// route.

use axum::{
    extract::{OriginalUri, Request},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use membres_shared::{auth::context::AuthContext, lifecycle::first_password::first_password_redirect};
use tracing::debug;

pub async fn first_password_layer(req: Request, next: Next) -> Response {
    // Nested routers see a stripped path, the original one is what the
    // redirect rules are written against
    let path = req
        .extensions()
        .get::<OriginalUri>()
        .map(|uri| uri.path().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());

    let target = req
        .extensions()
        .get::<AuthContext>()
        .and_then(|auth| first_password_redirect(&auth.roles, &path));

    match target {
        Some(target) => {
            debug!(path = %path, "Password must be set first");
            Redirect::to(target).into_response()
        }
        None => next.run(req).await,
    }
}
