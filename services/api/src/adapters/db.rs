//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use recipe_core::domain::{NewRecipe, ParsedIngredient, Recipe, RecipeChanges, User, UserCredentials};
use recipe_core::ports::{DatabaseService, PortError, PortResult};
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

const RECIPE_COLUMNS: &str = "id, user_id, title, instructions, prep_time, cook_time, servings, difficulty, created_at, updated_at";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

/// Unique violations become conflicts; everything else is unexpected.
fn map_sqlx_error(e: sqlx::Error) -> PortError {
    match &e {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            PortError::Conflict(db_err.message().to_string())
        }
        _ => PortError::Unexpected(e.to_string()),
    }
}

fn recipe_not_found(recipe_id: Uuid) -> PortError {
    PortError::NotFound(format!("Recipe {} not found", recipe_id))
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    id: Uuid,
    email: String,
    name: Option<String>,
    hashed_password: String,
    created_at: DateTime<Utc>,
}
impl UserRecord {
    fn to_domain(self) -> User {
        User {
            id: self.id,
            email: self.email,
            name: self.name,
            created_at: self.created_at,
        }
    }

    fn to_credentials(self) -> UserCredentials {
        let hashed_password = self.hashed_password.clone();
        UserCredentials {
            user: self.to_domain(),
            hashed_password,
        }
    }
}

#[derive(FromRow)]
struct RecipeRecord {
    id: Uuid,
    user_id: Uuid,
    title: String,
    instructions: Vec<String>,
    prep_time: String,
    cook_time: String,
    servings: String,
    difficulty: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl RecipeRecord {
    fn to_domain(self, links: &mut RecipeLinks) -> Recipe {
        Recipe {
            ingredients: links.ingredients.remove(&self.id).unwrap_or_default(),
            tags: links.tags.remove(&self.id).unwrap_or_default(),
            categories: links.categories.remove(&self.id).unwrap_or_default(),
            id: self.id,
            user_id: self.user_id,
            title: self.title,
            instructions: self.instructions,
            prep_time: self.prep_time,
            cook_time: self.cook_time,
            servings: self.servings,
            difficulty: self.difficulty,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(FromRow)]
struct RecipeIngredientRecord {
    recipe_id: Uuid,
    name: String,
    amount: String,
    unit: String,
}

#[derive(FromRow)]
struct RecipeNameRecord {
    recipe_id: Uuid,
    name: String,
}

/// Ingredients, tags and categories for a batch of recipes, keyed by recipe id.
#[derive(Default)]
struct RecipeLinks {
    ingredients: HashMap<Uuid, Vec<ParsedIngredient>>,
    tags: HashMap<Uuid, Vec<String>>,
    categories: HashMap<Uuid, Vec<String>>,
}

//=========================================================================================
// Query Helpers
//=========================================================================================

impl DbAdapter {
    /// Resolves the related rows for every record with one query per relation.
    async fn hydrate(&self, records: Vec<RecipeRecord>) -> PortResult<Vec<Recipe>> {
        if records.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Uuid> = records.iter().map(|r| r.id).collect();
        let mut links = RecipeLinks::default();

        let ingredient_rows = sqlx::query_as::<_, RecipeIngredientRecord>(
            "SELECT ri.recipe_id, i.name, ri.amount, ri.unit
             FROM recipe_ingredients ri JOIN ingredients i ON i.id = ri.ingredient_id
             WHERE ri.recipe_id = ANY($1) ORDER BY ri.recipe_id, ri.position",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        for row in ingredient_rows {
            links.ingredients.entry(row.recipe_id).or_default().push(ParsedIngredient {
                name: row.name,
                amount: row.amount,
                unit: row.unit,
            });
        }

        let tag_rows = sqlx::query_as::<_, RecipeNameRecord>(
            "SELECT rt.recipe_id, t.name
             FROM recipe_tags rt JOIN tags t ON t.id = rt.tag_id
             WHERE rt.recipe_id = ANY($1) ORDER BY t.name COLLATE \"C\"",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        for row in tag_rows {
            links.tags.entry(row.recipe_id).or_default().push(row.name);
        }

        let category_rows = sqlx::query_as::<_, RecipeNameRecord>(
            "SELECT rc.recipe_id, c.name
             FROM recipe_categories rc JOIN categories c ON c.id = rc.category_id
             WHERE rc.recipe_id = ANY($1) ORDER BY c.name COLLATE \"C\"",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        for row in category_rows {
            links.categories.entry(row.recipe_id).or_default().push(row.name);
        }

        Ok(records.into_iter().map(|r| r.to_domain(&mut links)).collect())
    }

    async fn hydrate_one(&self, record: RecipeRecord) -> PortResult<Recipe> {
        let id = record.id;
        self.hydrate(vec![record])
            .await?
            .pop()
            .ok_or_else(|| recipe_not_found(id))
    }
}

/// Find-or-create a row in one of the name-keyed lookup tables.
/// The no-op update makes `RETURNING` yield the id of an existing row as well.
async fn upsert_name(conn: &mut PgConnection, table: &str, name: &str) -> Result<Uuid, sqlx::Error> {
    let sql = format!(
        "INSERT INTO {table} (name) VALUES ($1)
         ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
         RETURNING id"
    );
    sqlx::query_scalar::<_, Uuid>(&sql)
        .bind(name)
        .fetch_one(conn)
        .await
}

async fn link_ingredients(
    conn: &mut PgConnection,
    recipe_id: Uuid,
    ingredients: &[ParsedIngredient],
) -> Result<(), sqlx::Error> {
    for (position, ingredient) in ingredients.iter().enumerate() {
        let ingredient_id = upsert_name(&mut *conn, "ingredients", &ingredient.name).await?;
        sqlx::query(
            "INSERT INTO recipe_ingredients (recipe_id, position, ingredient_id, amount, unit)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(recipe_id)
        .bind(position as i32)
        .bind(ingredient_id)
        .bind(&ingredient.amount)
        .bind(&ingredient.unit)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

async fn link_tags(conn: &mut PgConnection, recipe_id: Uuid, tags: &[String]) -> Result<(), sqlx::Error> {
    for tag in tags {
        let tag_id = upsert_name(&mut *conn, "tags", tag).await?;
        sqlx::query("INSERT INTO recipe_tags (recipe_id, tag_id) VALUES ($1, $2) ON CONFLICT DO NOTHING")
            .bind(recipe_id)
            .bind(tag_id)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

async fn link_categories(
    conn: &mut PgConnection,
    recipe_id: Uuid,
    categories: &[String],
) -> Result<(), sqlx::Error> {
    for category in categories {
        let category_id = upsert_name(&mut *conn, "categories", category).await?;
        sqlx::query(
            "INSERT INTO recipe_categories (recipe_id, category_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(recipe_id)
        .bind(category_id)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

/// Row-locks a recipe inside a transaction, scoped to its owner.
async fn lock_owned_recipe(
    conn: &mut PgConnection,
    user_id: Uuid,
    recipe_id: Uuid,
) -> PortResult<()> {
    let found = sqlx::query_scalar::<_, Uuid>(
        "SELECT id FROM recipes WHERE id = $1 AND user_id = $2 FOR UPDATE",
    )
    .bind(recipe_id)
    .bind(user_id)
    .fetch_optional(conn)
    .await
    .map_err(map_sqlx_error)?;
    found.map(|_| ()).ok_or_else(|| recipe_not_found(recipe_id))
}

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    async fn create_user(
        &self,
        email: &str,
        hashed_password: &str,
        name: Option<&str>,
    ) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "INSERT INTO users (email, hashed_password, name) VALUES ($1, $2, $3)
             RETURNING id, email, name, hashed_password, created_at",
        )
        .bind(email)
        .bind(hashed_password)
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        Ok(record.to_domain())
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT id, email, name, hashed_password, created_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("User {} not found", email)),
            _ => map_sqlx_error(e),
        })?;
        Ok(record.to_credentials())
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT id, email, name, hashed_password, created_at FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("User {} not found", user_id)),
            _ => map_sqlx_error(e),
        })?;
        Ok(record.to_domain())
    }

    async fn create_recipe(&self, user_id: Uuid, recipe: &NewRecipe) -> PortResult<Recipe> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        let recipe_id = sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO recipes (user_id, title, instructions, prep_time, cook_time, servings, difficulty)
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING id",
        )
        .bind(user_id)
        .bind(&recipe.title)
        .bind(&recipe.instructions)
        .bind(&recipe.prep_time)
        .bind(&recipe.cook_time)
        .bind(&recipe.servings)
        .bind(&recipe.difficulty)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        link_ingredients(&mut *tx, recipe_id, &recipe.ingredients)
            .await
            .map_err(map_sqlx_error)?;
        link_tags(&mut *tx, recipe_id, &recipe.tags)
            .await
            .map_err(map_sqlx_error)?;
        link_categories(&mut *tx, recipe_id, &recipe.categories)
            .await
            .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;
        self.get_recipe(user_id, recipe_id).await
    }

    async fn find_recipe_by_title(
        &self,
        user_id: Uuid,
        title: &str,
    ) -> PortResult<Option<Recipe>> {
        let record = sqlx::query_as::<_, RecipeRecord>(&format!(
            "SELECT {RECIPE_COLUMNS} FROM recipes WHERE user_id = $1 AND lower(title) = lower($2)"
        ))
        .bind(user_id)
        .bind(title.trim())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        match record {
            Some(record) => Ok(Some(self.hydrate_one(record).await?)),
            None => Ok(None),
        }
    }

    async fn get_recipe(&self, user_id: Uuid, recipe_id: Uuid) -> PortResult<Recipe> {
        let record = sqlx::query_as::<_, RecipeRecord>(&format!(
            "SELECT {RECIPE_COLUMNS} FROM recipes WHERE id = $1 AND user_id = $2"
        ))
        .bind(recipe_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?
        .ok_or_else(|| recipe_not_found(recipe_id))?;

        self.hydrate_one(record).await
    }

    async fn list_recipes(&self, user_id: Uuid) -> PortResult<Vec<Recipe>> {
        let records = sqlx::query_as::<_, RecipeRecord>(&format!(
            "SELECT {RECIPE_COLUMNS} FROM recipes WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        self.hydrate(records).await
    }

    async fn list_recipes_in_category(
        &self,
        user_id: Uuid,
        category: &str,
    ) -> PortResult<Vec<Recipe>> {
        let records = sqlx::query_as::<_, RecipeRecord>(
            "SELECT r.id, r.user_id, r.title, r.instructions, r.prep_time, r.cook_time,
                    r.servings, r.difficulty, r.created_at, r.updated_at
             FROM recipes r
             JOIN recipe_categories rc ON rc.recipe_id = r.id
             JOIN categories c ON c.id = rc.category_id
             WHERE r.user_id = $1 AND c.name = $2
             ORDER BY r.created_at DESC",
        )
        .bind(user_id)
        .bind(category)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        self.hydrate(records).await
    }

    async fn update_recipe(
        &self,
        user_id: Uuid,
        recipe_id: Uuid,
        changes: &RecipeChanges,
    ) -> PortResult<Recipe> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        lock_owned_recipe(&mut *tx, user_id, recipe_id).await?;

        sqlx::query(
            "UPDATE recipes SET
                title = COALESCE($2, title),
                instructions = COALESCE($3, instructions),
                prep_time = COALESCE($4, prep_time),
                cook_time = COALESCE($5, cook_time),
                servings = COALESCE($6, servings),
                difficulty = COALESCE($7, difficulty),
                updated_at = now()
             WHERE id = $1",
        )
        .bind(recipe_id)
        .bind(changes.title.as_deref())
        .bind(changes.instructions.as_ref())
        .bind(changes.prep_time.as_deref())
        .bind(changes.cook_time.as_deref())
        .bind(changes.servings.as_deref())
        .bind(changes.difficulty.as_deref())
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        if let Some(ingredients) = &changes.ingredients {
            sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = $1")
                .bind(recipe_id)
                .execute(&mut *tx)
                .await
                .map_err(map_sqlx_error)?;
            link_ingredients(&mut *tx, recipe_id, ingredients)
                .await
                .map_err(map_sqlx_error)?;
        }
        if let Some(tags) = &changes.tags {
            sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = $1")
                .bind(recipe_id)
                .execute(&mut *tx)
                .await
                .map_err(map_sqlx_error)?;
            link_tags(&mut *tx, recipe_id, tags)
                .await
                .map_err(map_sqlx_error)?;
        }
        if let Some(categories) = &changes.categories {
            sqlx::query("DELETE FROM recipe_categories WHERE recipe_id = $1")
                .bind(recipe_id)
                .execute(&mut *tx)
                .await
                .map_err(map_sqlx_error)?;
            link_categories(&mut *tx, recipe_id, categories)
                .await
                .map_err(map_sqlx_error)?;
        }

        tx.commit().await.map_err(map_sqlx_error)?;
        self.get_recipe(user_id, recipe_id).await
    }

    async fn set_recipe_categories(
        &self,
        user_id: Uuid,
        recipe_id: Uuid,
        categories: &[String],
    ) -> PortResult<Recipe> {
        let changes = RecipeChanges {
            categories: Some(categories.to_vec()),
            ..Default::default()
        };
        self.update_recipe(user_id, recipe_id, &changes).await
    }

    async fn delete_recipe(&self, user_id: Uuid, recipe_id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM recipes WHERE id = $1 AND user_id = $2")
            .bind(recipe_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(recipe_not_found(recipe_id));
        }
        Ok(())
    }
}
