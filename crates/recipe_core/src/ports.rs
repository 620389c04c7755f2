//! crates/recipe_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or APIs.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{NewRecipe, Recipe, RecipeChanges, User, UserCredentials};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    /// A uniqueness rule was violated (email, or recipe title per user).
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Storage for users and their recipes.
///
/// Every recipe method is scoped to `user_id`: a recipe owned by someone else
/// behaves exactly like one that does not exist (`PortError::NotFound`).
/// Ingredient, tag and category rows are find-or-create by name.
#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- User Management ---
    /// Fails with `Conflict` when the email is taken.
    async fn create_user(
        &self,
        email: &str,
        hashed_password: &str,
        name: Option<&str>,
    ) -> PortResult<User>;

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials>;

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User>;

    // --- Recipe Management ---
    /// Fails with `Conflict` when the user already has a recipe with this title
    /// (compared case-insensitively).
    async fn create_recipe(&self, user_id: Uuid, recipe: &NewRecipe) -> PortResult<Recipe>;

    /// Case-insensitive title lookup within one user's recipes.
    async fn find_recipe_by_title(&self, user_id: Uuid, title: &str)
        -> PortResult<Option<Recipe>>;

    async fn get_recipe(&self, user_id: Uuid, recipe_id: Uuid) -> PortResult<Recipe>;

    /// Newest first.
    async fn list_recipes(&self, user_id: Uuid) -> PortResult<Vec<Recipe>>;

    async fn list_recipes_in_category(
        &self,
        user_id: Uuid,
        category: &str,
    ) -> PortResult<Vec<Recipe>>;

    async fn update_recipe(
        &self,
        user_id: Uuid,
        recipe_id: Uuid,
        changes: &RecipeChanges,
    ) -> PortResult<Recipe>;

    /// Replaces the recipe's categories wholesale.
    async fn set_recipe_categories(
        &self,
        user_id: Uuid,
        recipe_id: Uuid,
        categories: &[String],
    ) -> PortResult<Recipe>;

    async fn delete_recipe(&self, user_id: Uuid, recipe_id: Uuid) -> PortResult<()>;
}

#[async_trait]
pub trait RecipeGenerationService: Send + Sync {
    /// Sends the prompt to a generative model and returns the text of its first candidate.
    async fn generate(&self, prompt_text: &str) -> PortResult<String>;
}
