/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use taskdeck_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config);
/// let app = taskdeck_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use axum::{
    extract::Request,
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{delete, get, post, put},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use taskdeck_shared::auth::middleware::bearer_auth_middleware;

use crate::config::Config;

/// Shared application state
///
/// Cloned per request via Axum's `State` extractor; Arc keeps the clone
/// cheap.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                                 # Public
/// ├── /v1/
/// │   ├── /auth/
/// │   │   ├── POST /register                  # Public
/// │   │   ├── POST /login                     # Public
/// │   │   └── GET  /me                        # Authenticated
/// │   ├── /orgs/:org_id/                      # Authenticated, org-scoped
/// │   │   ├── /tasks                          # CRUD + assign/activity/comments
/// │   │   ├── /templates                      # Task template CRUD
/// │   │   ├── /users                          # Admin user management
/// │   │   ├── /dashboard/summary
/// │   │   ├── /reports/...
/// │   │   └── /audit-logs
/// │   └── /notifications                      # Authenticated, per-user
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Authentication (per-route-group)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Public auth endpoints
    let public_auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login));

    // Authenticated auth endpoints
    let me_routes = Router::new()
        .route("/me", get(routes::auth::me))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_layer,
        ));

    let task_routes = Router::new()
        .route(
            "/",
            get(routes::tasks::list_tasks).post(routes::tasks::create_task),
        )
        .route(
            "/:id",
            get(routes::tasks::get_task)
                .put(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        .route("/:id/assign", put(routes::tasks::assign_task))
        .route("/:id/activity", get(routes::tasks::list_activity))
        .route("/:id/comments", post(routes::tasks::add_comment))
        .route(
            "/from-template",
            post(routes::tasks::create_task_from_template),
        );

    let template_routes = Router::new()
        .route(
            "/",
            get(routes::templates::list_templates).post(routes::templates::create_template),
        )
        .route(
            "/:id",
            get(routes::templates::get_template)
                .put(routes::templates::update_template)
                .delete(routes::templates::delete_template),
        );

    let user_routes = Router::new()
        .route(
            "/",
            get(routes::users::list_users).post(routes::users::create_user),
        )
        .route("/:user_id/role", put(routes::users::update_role))
        .route("/:user_id", delete(routes::users::delete_user));

    let report_routes = Router::new()
        .route(
            "/distribution/status",
            get(routes::reports::status_distribution),
        )
        .route(
            "/distribution/priority",
            get(routes::reports::priority_distribution),
        )
        .route(
            "/completed-over-time",
            get(routes::reports::completed_over_time),
        )
        .route("/export/csv", get(routes::reports::export_csv));

    // Org-scoped routes; every handler re-checks that the path org matches
    // the identity's org.
    let org_routes = Router::new()
        .nest("/tasks", task_routes)
        .nest("/templates", template_routes)
        .nest("/users", user_routes)
        .nest("/reports", report_routes)
        .route(
            "/dashboard/summary",
            get(routes::dashboard::dashboard_summary),
        )
        .route("/audit-logs", get(routes::audit_logs::list_audit_logs))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_layer,
        ));

    let notification_routes = Router::new()
        .route("/", get(routes::notifications::list_notifications))
        .route(
            "/unread-count",
            get(routes::notifications::unread_count),
        )
        .route("/:id/read", put(routes::notifications::mark_read))
        .route("/read-all", put(routes::notifications::mark_all_read))
        .route(
            "/preferences",
            get(routes::notifications::get_preferences)
                .put(routes::notifications::update_preferences),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_layer,
        ));

    let v1_routes = Router::new()
        .nest("/auth", public_auth_routes.merge(me_routes))
        .nest("/orgs/:org_id", org_routes)
        .nest("/notifications", notification_routes);

    let cors = if state.config.api.cors_origins.contains(&"*".to_string()) {
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
                Method::PUT,
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

/// Bearer authentication layer
///
/// Delegates to the shared middleware, which validates the token and
/// resolves the acting user into an `Identity` request extension.
async fn auth_layer(
    state: axum::extract::State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let secret = state.jwt_secret().to_string();

    match bearer_auth_middleware(state.db.clone(), secret, req, next).await {
        Ok(response) => response,
        Err(err) => axum::response::IntoResponse::into_response(err),
    }
}
