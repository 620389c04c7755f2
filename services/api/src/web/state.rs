//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use crate::web::token::TokenKeys;
use recipe_core::ports::{DatabaseService, RecipeGenerationService};
use recipe_core::RecipeGenerator;
use std::sync::Arc;
use uuid::Uuid;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
    pub config: Arc<Config>,
    pub generator: RecipeGenerator,
    pub tokens: TokenKeys,
}

impl AppState {
    pub fn new(
        db: Arc<dyn DatabaseService>,
        generation: Arc<dyn RecipeGenerationService>,
        config: Arc<Config>,
    ) -> Self {
        let tokens = TokenKeys::new(&config.jwt_secret, config.token_ttl);
        Self {
            db,
            generator: RecipeGenerator::new(generation),
            tokens,
            config,
        }
    }
}

//=========================================================================================
// AuthUser (Per Request)
//=========================================================================================

/// The caller, as established by `require_auth` from a verified token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
}
