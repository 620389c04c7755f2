pub mod auth;
pub mod error;
pub mod middleware;
pub mod protocol;
pub mod rest;
pub mod state;
pub mod token;

use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub use middleware::require_auth;
pub use state::AppState;

use auth::{login_handler, profile_handler, register_handler};
use rest::{
    create_recipe_handler, delete_recipe_handler, generate_recipe_handler, get_recipe_handler,
    list_categories_handler, list_recipes_handler, recipes_by_category_handler,
    save_recipe_handler, update_categories_handler, update_recipe_handler,
};

const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Builds every `/api` route. CORS and the Swagger UI are added by the binary.
pub fn router(state: Arc<AppState>) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/auth/register", post(register_handler))
        .route("/auth/login", post(login_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/auth/profile", get(profile_handler))
        .route("/recipes/generate", post(generate_recipe_handler))
        .route("/recipes/save", post(save_recipe_handler))
        .route("/recipes/categories/all", get(list_categories_handler))
        .route("/recipes/category/{name}", get(recipes_by_category_handler))
        .route(
            "/recipes",
            get(list_recipes_handler).post(create_recipe_handler),
        )
        .route(
            "/recipes/{id}",
            get(get_recipe_handler)
                .put(update_recipe_handler)
                .delete(delete_recipe_handler),
        )
        .route("/recipes/{id}/categories", patch(update_categories_handler))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    let api_router = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state);

    Router::new()
        .nest("/api", api_router)
        .layer(TraceLayer::new_for_http())
}
