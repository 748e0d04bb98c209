use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{delete, get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::db::Store;
use crate::services::{
    PasswordHasher, RecipeService, SeaOrmRecipeService, SeaOrmTokenService, SeaOrmUserService,
    TokenService, UserService,
};

mod assets;
pub mod auth;
mod error;
mod observability;
mod recipes;
mod system;
mod types;
mod users;
mod validation;

pub use error::ApiError;
pub use types::*;

use metrics_exporter_prometheus::PrometheusHandle;

pub struct AppState {
    pub config: Config,

    pub store: Store,

    pub user_service: Arc<dyn UserService>,

    pub token_service: Arc<dyn TokenService>,

    pub recipe_service: Arc<dyn RecipeService>,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub const fn store(&self) -> &Store {
        &self.store
    }

    #[must_use]
    pub fn users(&self) -> &dyn UserService {
        self.user_service.as_ref()
    }

    #[must_use]
    pub fn tokens(&self) -> &dyn TokenService {
        self.token_service.as_ref()
    }

    #[must_use]
    pub fn recipes(&self) -> &dyn RecipeService {
        self.recipe_service.as_ref()
    }
}

/// Wires the services around an already connected store.
pub fn create_app_state(
    config: Config,
    store: Store,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let hasher = PasswordHasher::new(&config.security)?;

    let token_service: Arc<dyn TokenService> = Arc::new(SeaOrmTokenService::new(
        store.clone(),
        config.security.session_ttl()?,
    ));

    let user_service: Arc<dyn UserService> = Arc::new(SeaOrmUserService::new(
        store.clone(),
        hasher,
        Arc::clone(&token_service),
    ));

    let recipe_service: Arc<dyn RecipeService> =
        Arc::new(SeaOrmRecipeService::new(store.clone()));

    Ok(Arc::new(AppState {
        config,
        store,
        user_service,
        token_service,
        recipe_service,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    }))
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let store = Store::with_pool_options(
        &config.general.database_path,
        config.general.max_db_connections,
        config.general.min_db_connections,
    )
    .await?;

    create_app_state(config, store, prometheus_handle)
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors_origins = state.config().server.cors_allowed_origins.clone();

    let protected_routes = create_protected_router(Arc::clone(&state));

    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/system/health/live", get(system::health_live))
        .route("/system/health/ready", get(system::health_ready))
        .route("/metrics", get(observability::get_metrics));

    let cors_layer = if cors_origins.iter().any(|o| o == "*") {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
        .fallback(assets::serve_asset)
        .layer(middleware::from_fn(observability::logging_middleware))
        .layer(middleware::from_fn(observability::security_headers_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
}

fn create_protected_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/logout", post(auth::logout))
        .route(
            "/auth/sessions",
            get(auth::list_sessions).delete(auth::revoke_all_sessions),
        )
        .route("/auth/sessions/{id}", delete(auth::revoke_session))
        .route("/users/me", get(users::me))
        .route("/users/{id}", get(users::profile))
        .route(
            "/recipes",
            get(recipes::list_recipes).post(recipes::create_recipe),
        )
        .route(
            "/recipes/{id}",
            get(recipes::get_recipe)
                .put(recipes::update_recipe)
                .delete(recipes::delete_recipe),
        )
        .route_layer(middleware::from_fn_with_state(state, auth::auth_middleware))
}
