//! services/api/src/adapters/memory.rs
//!
//! An in-process implementation of the `DatabaseService` port. Used when
//! `DATABASE_URL` is `memory://` and by the HTTP tests; nothing survives a restart.

use async_trait::async_trait;
use chrono::Utc;
use recipe_core::domain::{NewRecipe, Recipe, RecipeChanges, User, UserCredentials};
use recipe_core::ports::{DatabaseService, PortError, PortResult};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    users: Vec<UserCredentials>,
    recipes: Vec<Recipe>,
}

impl Tables {
    fn title_taken(&self, user_id: Uuid, title: &str, except: Option<Uuid>) -> bool {
        self.recipes.iter().any(|r| {
            r.user_id == user_id
                && Some(r.id) != except
                && r.title.trim().eq_ignore_ascii_case(title.trim())
        })
    }

    fn owned_mut(&mut self, user_id: Uuid, recipe_id: Uuid) -> PortResult<&mut Recipe> {
        self.recipes
            .iter_mut()
            .find(|r| r.id == recipe_id && r.user_id == user_id)
            .ok_or_else(|| PortError::NotFound(format!("Recipe {} not found", recipe_id)))
    }
}

/// Keeps every table in memory behind a single lock.
#[derive(Default)]
pub struct InMemoryDb {
    tables: RwLock<Tables>,
}

impl InMemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recipes stored across all users.
    pub async fn recipe_count(&self) -> usize {
        self.tables.read().await.recipes.len()
    }
}

/// Tags and categories come back sorted by name, as Postgres returns them.
fn sorted(names: &[String]) -> Vec<String> {
    let mut names = names.to_vec();
    names.sort();
    names
}

/// Recipes are kept in insertion order, so reversing first breaks timestamp ties.
fn newest_first(mut recipes: Vec<Recipe>) -> Vec<Recipe> {
    recipes.reverse();
    recipes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    recipes
}

#[async_trait]
impl DatabaseService for InMemoryDb {
    async fn create_user(
        &self,
        email: &str,
        hashed_password: &str,
        name: Option<&str>,
    ) -> PortResult<User> {
        let mut tables = self.tables.write().await;
        if tables.users.iter().any(|u| u.user.email == email) {
            return Err(PortError::Conflict(format!("email {} already exists", email)));
        }

        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            name: name.map(str::to_string),
            created_at: Utc::now(),
        };
        tables.users.push(UserCredentials {
            user: user.clone(),
            hashed_password: hashed_password.to_string(),
        });
        Ok(user)
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let tables = self.tables.read().await;
        tables
            .users
            .iter()
            .find(|u| u.user.email == email)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", email)))
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User> {
        let tables = self.tables.read().await;
        tables
            .users
            .iter()
            .find(|u| u.user.id == user_id)
            .map(|u| u.user.clone())
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", user_id)))
    }

    async fn create_recipe(&self, user_id: Uuid, recipe: &NewRecipe) -> PortResult<Recipe> {
        let mut tables = self.tables.write().await;
        if tables.title_taken(user_id, &recipe.title, None) {
            return Err(PortError::Conflict(format!(
                "recipe titled '{}' already exists",
                recipe.title
            )));
        }

        let now = Utc::now();
        let stored = Recipe {
            id: Uuid::new_v4(),
            user_id,
            title: recipe.title.clone(),
            instructions: recipe.instructions.clone(),
            ingredients: recipe.ingredients.clone(),
            tags: sorted(&recipe.tags),
            categories: sorted(&recipe.categories),
            prep_time: recipe.prep_time.clone(),
            cook_time: recipe.cook_time.clone(),
            servings: recipe.servings.clone(),
            difficulty: recipe.difficulty.clone(),
            created_at: now,
            updated_at: now,
        };
        tables.recipes.push(stored.clone());
        Ok(stored)
    }

    async fn find_recipe_by_title(
        &self,
        user_id: Uuid,
        title: &str,
    ) -> PortResult<Option<Recipe>> {
        let tables = self.tables.read().await;
        Ok(tables
            .recipes
            .iter()
            .find(|r| r.user_id == user_id && r.title.trim().eq_ignore_ascii_case(title.trim()))
            .cloned())
    }

    async fn get_recipe(&self, user_id: Uuid, recipe_id: Uuid) -> PortResult<Recipe> {
        let tables = self.tables.read().await;
        tables
            .recipes
            .iter()
            .find(|r| r.id == recipe_id && r.user_id == user_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Recipe {} not found", recipe_id)))
    }

    async fn list_recipes(&self, user_id: Uuid) -> PortResult<Vec<Recipe>> {
        let tables = self.tables.read().await;
        Ok(newest_first(
            tables
                .recipes
                .iter()
                .filter(|r| r.user_id == user_id)
                .cloned()
                .collect(),
        ))
    }

    async fn list_recipes_in_category(
        &self,
        user_id: Uuid,
        category: &str,
    ) -> PortResult<Vec<Recipe>> {
        let tables = self.tables.read().await;
        Ok(newest_first(
            tables
                .recipes
                .iter()
                .filter(|r| r.user_id == user_id && r.categories.iter().any(|c| c == category))
                .cloned()
                .collect(),
        ))
    }

    async fn update_recipe(
        &self,
        user_id: Uuid,
        recipe_id: Uuid,
        changes: &RecipeChanges,
    ) -> PortResult<Recipe> {
        let mut tables = self.tables.write().await;
        // existence first so a foreign recipe never reports a conflict
        tables.owned_mut(user_id, recipe_id)?;
        if let Some(title) = &changes.title {
            if tables.title_taken(user_id, title, Some(recipe_id)) {
                return Err(PortError::Conflict(format!(
                    "recipe titled '{}' already exists",
                    title
                )));
            }
        }

        let recipe = tables.owned_mut(user_id, recipe_id)?;
        if let Some(title) = &changes.title {
            recipe.title = title.clone();
        }
        if let Some(instructions) = &changes.instructions {
            recipe.instructions = instructions.clone();
        }
        if let Some(ingredients) = &changes.ingredients {
            recipe.ingredients = ingredients.clone();
        }
        if let Some(tags) = &changes.tags {
            recipe.tags = sorted(tags);
        }
        if let Some(categories) = &changes.categories {
            recipe.categories = sorted(categories);
        }
        if let Some(prep_time) = &changes.prep_time {
            recipe.prep_time = prep_time.clone();
        }
        if let Some(cook_time) = &changes.cook_time {
            recipe.cook_time = cook_time.clone();
        }
        if let Some(servings) = &changes.servings {
            recipe.servings = servings.clone();
        }
        if let Some(difficulty) = &changes.difficulty {
            recipe.difficulty = difficulty.clone();
        }
        recipe.updated_at = Utc::now();
        Ok(recipe.clone())
    }

    async fn set_recipe_categories(
        &self,
        user_id: Uuid,
        recipe_id: Uuid,
        categories: &[String],
    ) -> PortResult<Recipe> {
        let mut tables = self.tables.write().await;
        let recipe = tables.owned_mut(user_id, recipe_id)?;
        recipe.categories = sorted(categories);
        recipe.updated_at = Utc::now();
        Ok(recipe.clone())
    }

    async fn delete_recipe(&self, user_id: Uuid, recipe_id: Uuid) -> PortResult<()> {
        let mut tables = self.tables.write().await;
        let before = tables.recipes.len();
        tables
            .recipes
            .retain(|r| !(r.id == recipe_id && r.user_id == user_id));
        if tables.recipes.len() == before {
            return Err(PortError::NotFound(format!("Recipe {} not found", recipe_id)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recipe_core::domain::ParsedIngredient;

    fn soup(title: &str) -> NewRecipe {
        NewRecipe {
            title: title.to_string(),
            instructions: vec!["Simmer".to_string()],
            ingredients: vec![ParsedIngredient {
                name: "water".to_string(),
                amount: "1".to_string(),
                unit: "l".to_string(),
            }],
            tags: vec![],
            categories: vec!["Dinner".to_string()],
            prep_time: "0".to_string(),
            cook_time: "0".to_string(),
            servings: "1".to_string(),
            difficulty: "EASY".to_string(),
        }
    }

    #[tokio::test]
    async fn test_titles_are_unique_per_user_ignoring_case() {
        let db = InMemoryDb::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        db.create_recipe(alice, &soup("Soup")).await.unwrap();
        let dup = db.create_recipe(alice, &soup("SOUP")).await;
        assert!(matches!(dup, Err(PortError::Conflict(_))));
        assert!(db.create_recipe(bob, &soup("Soup")).await.is_ok());
    }

    #[tokio::test]
    async fn test_foreign_recipes_are_not_found() {
        let db = InMemoryDb::new();
        let alice = Uuid::new_v4();
        let mallory = Uuid::new_v4();
        let recipe = db.create_recipe(alice, &soup("Soup")).await.unwrap();

        assert!(matches!(
            db.get_recipe(mallory, recipe.id).await,
            Err(PortError::NotFound(_))
        ));
        assert!(matches!(
            db.delete_recipe(mallory, recipe.id).await,
            Err(PortError::NotFound(_))
        ));
        assert!(db.get_recipe(alice, recipe.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_category_listing() {
        let db = InMemoryDb::new();
        let alice = Uuid::new_v4();
        let recipe = db.create_recipe(alice, &soup("Soup")).await.unwrap();

        assert_eq!(db.list_recipes_in_category(alice, "Dinner").await.unwrap().len(), 1);
        db.set_recipe_categories(alice, recipe.id, &["Lunch".to_string()])
            .await
            .unwrap();
        assert!(db.list_recipes_in_category(alice, "Dinner").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_tags_and_categories_come_back_sorted() {
        let db = InMemoryDb::new();
        let alice = Uuid::new_v4();
        let mut recipe = soup("Soup");
        recipe.tags = vec!["warm".to_string(), "easy".to_string()];
        recipe.categories = vec!["Vegan".to_string(), "Dinner".to_string()];
        let stored = db.create_recipe(alice, &recipe).await.unwrap();

        assert_eq!(stored.tags, vec!["easy", "warm"]);
        assert_eq!(stored.categories, vec!["Dinner", "Vegan"]);

        let updated = db
            .set_recipe_categories(alice, stored.id, &["Lunch".to_string(), "Asian".to_string()])
            .await
            .unwrap();
        assert_eq!(updated.categories, vec!["Asian", "Lunch"]);
    }
}
