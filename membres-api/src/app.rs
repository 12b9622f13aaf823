/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use membres_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config);
/// let app = membres_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{
    config::Config,
    error::ApiError,
    middleware::first_password::first_password_layer,
};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{delete, get, patch, post},
    Router,
};
use chrono::FixedOffset;
use membres_shared::{
    auth::{context::AuthContext, jwt, voters::CodeVoter},
    models::user::User,
};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{warn, Level};

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Door code rules, built once from the configuration
    pub code_voter: Arc<CodeVoter>,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config) -> Self {
        let code_voter = Arc::new(config.code_voter());

        Self {
            db,
            config: Arc::new(config),
            code_voter,
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }

    /// Offset used for "today" and "yesterday"
    pub fn offset(&self) -> FixedOffset {
        self.config.calendar.offset()
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                          # Health check (public)
/// └── /v1/
///     ├── POST /auth/login             # public
///     ├── POST /auth/refresh           # public
///     ├── POST /auth/logout
///     ├── POST /auth/password
///     ├── GET  /me
///     ├── /codes/                      # CodeVoter
///     ├── /memberships/                # admin, or own membership for reads
///     ├── /forms/                      # field lists for clients
///     ├── /shifts/
///     └── /process-updates/            # ProcessUpdateVoter
/// ```
///
/// # Middleware Stack
///
/// Outermost first:
/// 1. CORS (tower-http CorsLayer)
/// 2. Logging (tower-http TraceLayer)
/// 3. JWT authentication (authenticated routes only)
/// 4. First password redirect (authenticated routes only)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let public_routes = Router::new()
        .route("/auth/login", post(routes::auth::login))
        .route("/auth/refresh", post(routes::auth::refresh));

    let code_routes = Router::new()
        .route(
            "/",
            get(routes::codes::list_codes).post(routes::codes::generate_code),
        )
        .route(
            "/:id",
            get(routes::codes::get_code)
                .patch(routes::codes::update_code)
                .delete(routes::codes::delete_code),
        )
        .route("/:id/open", post(routes::codes::open_code))
        .route("/:id/close", post(routes::codes::close_code));

    let membership_routes = Router::new()
        .route("/", post(routes::memberships::create_membership))
        .route("/:id", get(routes::memberships::get_membership))
        .route(
            "/:id/registrations",
            get(routes::memberships::list_registrations)
                .post(routes::memberships::create_registration),
        );

    let form_routes = Router::new()
        .route("/registration", get(routes::forms::registration_form))
        .route("/membership", get(routes::forms::membership_form));

    let shift_routes = Router::new()
        .route("/upcoming", get(routes::shifts::upcoming))
        .route("/generate", post(routes::shifts::generate))
        .route("/:id", patch(routes::shifts::reschedule))
        .route("/:id/book", post(routes::shifts::book))
        .route("/:id/free", post(routes::shifts::free))
        .route("/:id/lock", post(routes::shifts::lock))
        .route("/:id/dismiss", post(routes::shifts::dismiss))
        .route("/:id/validate", post(routes::shifts::validate));

    let process_update_routes = Router::new()
        .route(
            "/",
            get(routes::process_updates::list_process_updates)
                .post(routes::process_updates::create_process_update),
        )
        .route("/:id", delete(routes::process_updates::delete_process_update));

    // Everything below requires a valid access token; the first password
    // guard runs after authentication
    let authenticated_routes = Router::new()
        .route("/auth/logout", post(routes::auth::logout))
        .route("/auth/password", post(routes::auth::change_password))
        .route("/me", get(routes::auth::me))
        .nest("/codes", code_routes)
        .nest("/memberships", membership_routes)
        .nest("/forms", form_routes)
        .nest("/shifts", shift_routes)
        .nest("/process-updates", process_update_routes)
        .route_layer(axum::middleware::from_fn(first_password_layer))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let v1_routes = Router::new()
        .merge(public_routes)
        .merge(authenticated_routes);

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.iter().any(|origin| origin == "*") {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}

/// JWT authentication middleware layer
///
/// Validates the bearer token, reloads the user so that role changes and
/// disabled accounts take effect immediately, then injects an
/// [`AuthContext`] into request extensions.
async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing authorization header".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::BadRequest("Expected Bearer token".to_string()))?;

    let claims = jwt::validate_access_token(token, state.jwt_secret())?;

    let user = User::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Unknown user".to_string()))?;

    if !user.enabled {
        warn!(user_id = %user.id, "Disabled account presented a valid token");
        return Err(ApiError::Forbidden("Account disabled".to_string()));
    }

    req.extensions_mut().insert(AuthContext::from_user(&user));

    Ok(next.run(req).await)
}
