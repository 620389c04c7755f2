//! services/api/src/web/protocol.rs
//!
//! Request and response bodies for the recipe endpoints. Everything on the
//! wire is camelCase; conversion into core types happens here so handlers
//! only see validated values.

use chrono::{DateTime, Utc};
use recipe_core::{
    categories::resolve_categories,
    generation::{clean_lines, normalize_difficulty, text_or, DEFAULT_SERVINGS, DEFAULT_TIME},
    ingredients::normalize_entry,
    validation::{validate_changes, validate_new_recipe},
    Difficulty, IngredientEntry, NewRecipe, ParsedIngredient, Recipe, RecipeChanges,
    RecipePreview, RecipePrompt, Servings, ValidationError,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

//=========================================================================================
// Responses
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct IngredientResponse {
    pub name: String,
    pub amount: String,
    pub unit: String,
}

impl From<ParsedIngredient> for IngredientResponse {
    fn from(i: ParsedIngredient) -> Self {
        Self {
            name: i.name,
            amount: i.amount,
            unit: i.unit,
        }
    }
}

/// A stored recipe as returned to its owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecipeResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub instructions: Vec<String>,
    pub prep_time: String,
    pub cook_time: String,
    pub servings: String,
    pub difficulty: String,
    pub ingredients: Vec<IngredientResponse>,
    pub tags: Vec<String>,
    pub categories: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Recipe> for RecipeResponse {
    fn from(r: Recipe) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            title: r.title,
            instructions: r.instructions,
            prep_time: r.prep_time,
            cook_time: r.cook_time,
            servings: r.servings,
            difficulty: r.difficulty,
            ingredients: r.ingredients.into_iter().map(Into::into).collect(),
            tags: r.tags,
            categories: r.categories,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// A generated recipe that has not been saved yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PreviewResponse {
    pub title: String,
    pub ingredients: Vec<IngredientResponse>,
    pub instructions: Vec<String>,
    pub prep_time: String,
    pub cook_time: String,
    pub servings: String,
    pub difficulty: String,
    pub tags: Vec<String>,
    pub is_preview: bool,
}

impl From<RecipePreview> for PreviewResponse {
    fn from(p: RecipePreview) -> Self {
        Self {
            title: p.title,
            ingredients: p.ingredients.into_iter().map(Into::into).collect(),
            instructions: p.instructions,
            prep_time: p.prep_time,
            cook_time: p.cook_time,
            servings: p.servings,
            difficulty: p.difficulty,
            tags: p.tags,
            is_preview: p.is_preview,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GenerateRecipeResponse {
    pub preview: PreviewResponse,
}

/// The body of every error response. The recipe fields are only set on 409.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub existing_recipe: Option<RecipeResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<PreviewResponse>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            existing_recipe: None,
            preview: None,
        }
    }
}

//=========================================================================================
// Requests
//=========================================================================================

/// What the user wants a recipe for. At least one field must be filled in.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecipePromptRequest {
    #[serde(default)]
    pub ingredients: Option<Vec<String>>,
    #[serde(default)]
    pub dietary: Option<Vec<String>>,
    #[serde(default)]
    pub cuisine: Option<String>,
    #[serde(default)]
    pub meal_type: Option<String>,
    #[serde(default)]
    #[schema(value_type = Option<String>, example = "medium")]
    pub difficulty: Option<Difficulty>,
}

impl From<RecipePromptRequest> for RecipePrompt {
    fn from(r: RecipePromptRequest) -> Self {
        RecipePrompt {
            ingredients: r.ingredients,
            dietary: r.dietary,
            cuisine: r.cuisine,
            meal_type: r.meal_type,
            difficulty: r.difficulty,
        }
    }
}

/// Body of `POST /recipes` and `POST /recipes/save`. A preview can be sent
/// back as-is; `isPreview` is ignored.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecipeRequest {
    #[serde(default)]
    pub title: String,
    /// Free-text lines ("2 cups flour") or `{name, amount?, unit?}` objects.
    #[serde(default)]
    #[schema(value_type = Vec<Object>)]
    pub ingredients: Vec<IngredientEntry>,
    #[serde(default)]
    pub instructions: Vec<String>,
    #[serde(default)]
    pub prep_time: Option<String>,
    #[serde(default)]
    pub cook_time: Option<String>,
    /// A number or a string such as "4-6".
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub servings: Option<Servings>,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub categories: Vec<String>,
}

impl RecipeRequest {
    pub fn into_new_recipe(self) -> Result<NewRecipe, ValidationError> {
        let recipe = NewRecipe {
            title: self.title.trim().to_string(),
            instructions: clean_lines(&self.instructions),
            ingredients: parse_entries(&self.ingredients),
            tags: distinct(clean_lines(&self.tags)),
            categories: Vec::new(),
            prep_time: text_or(self.prep_time.as_deref(), DEFAULT_TIME),
            cook_time: text_or(self.cook_time.as_deref(), DEFAULT_TIME),
            servings: servings_text(self.servings.as_ref()),
            difficulty: normalize_difficulty(self.difficulty.as_deref()),
        };
        validate_new_recipe(&recipe)?;

        Ok(NewRecipe {
            categories: resolve_categories(&self.categories)?,
            ..recipe
        })
    }
}

/// Body of `PUT /recipes/{id}`. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRecipeRequest {
    pub title: Option<String>,
    #[schema(value_type = Option<Vec<Object>>)]
    pub ingredients: Option<Vec<IngredientEntry>>,
    pub instructions: Option<Vec<String>>,
    pub prep_time: Option<String>,
    pub cook_time: Option<String>,
    #[schema(value_type = Option<String>)]
    pub servings: Option<Servings>,
    pub difficulty: Option<String>,
    pub tags: Option<Vec<String>>,
    pub categories: Option<Vec<String>>,
}

impl UpdateRecipeRequest {
    pub fn into_changes(self) -> Result<RecipeChanges, ValidationError> {
        let changes = RecipeChanges {
            title: self.title.map(|t| t.trim().to_string()),
            instructions: self.instructions.as_deref().map(clean_lines),
            ingredients: self.ingredients.as_deref().map(parse_entries),
            tags: self.tags.as_deref().map(|t| distinct(clean_lines(t))),
            categories: None,
            prep_time: self.prep_time.as_deref().map(|t| text_or(Some(t), DEFAULT_TIME)),
            cook_time: self.cook_time.as_deref().map(|t| text_or(Some(t), DEFAULT_TIME)),
            servings: self.servings.as_ref().map(|s| servings_text(Some(s))),
            difficulty: self.difficulty.as_deref().map(|d| normalize_difficulty(Some(d))),
        };
        validate_changes(&changes)?;

        let categories = self
            .categories
            .as_deref()
            .map(resolve_categories)
            .transpose()?;
        Ok(RecipeChanges {
            categories,
            ..changes
        })
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateCategoriesRequest {
    pub categories: Option<Vec<String>>,
}

//=========================================================================================
// Helpers
//=========================================================================================

fn parse_entries(entries: &[IngredientEntry]) -> Vec<ParsedIngredient> {
    entries
        .iter()
        .map(normalize_entry)
        .filter(|i| !i.name.trim().is_empty())
        .collect()
}

fn servings_text(servings: Option<&Servings>) -> String {
    servings
        .and_then(Servings::to_text)
        .unwrap_or_else(|| DEFAULT_SERVINGS.to_string())
}

/// Drops repeated values, keeping the first occurrence.
fn distinct(values: Vec<String>) -> Vec<String> {
    let mut seen = Vec::with_capacity(values.len());
    for value in values {
        if !seen.contains(&value) {
            seen.push(value);
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(json: serde_json::Value) -> RecipeRequest {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_preview_body_becomes_new_recipe() {
        let recipe = request(serde_json::json!({
            "title": "  Pancakes ",
            "ingredients": ["2 cups flour", {"name": "egg"}],
            "instructions": ["Mix.", " ", "Fry."],
            "servings": 4,
            "difficulty": "medium",
            "tags": ["breakfast", "breakfast"],
            "categories": ["breakfast"],
            "isPreview": true
        }))
        .into_new_recipe()
        .unwrap();

        assert_eq!(recipe.title, "Pancakes");
        assert_eq!(recipe.instructions, vec!["Mix.", "Fry."]);
        assert_eq!(recipe.ingredients[0].unit, "cups");
        assert_eq!(recipe.ingredients[1].amount, "1");
        assert_eq!(recipe.servings, "4");
        assert_eq!(recipe.difficulty, "MEDIUM");
        assert_eq!(recipe.tags, vec!["breakfast"]);
        assert_eq!(recipe.categories, vec!["Breakfast"]);
        assert_eq!(recipe.prep_time, "0");
    }

    #[test]
    fn test_missing_fields_are_reported_in_order() {
        let err = request(serde_json::json!({"ingredients": ["1 egg"]}))
            .into_new_recipe()
            .unwrap_err();
        assert_eq!(err, ValidationError::MissingTitle);

        let err = request(serde_json::json!({"title": "Toast", "ingredients": ["1 slice bread"]}))
            .into_new_recipe()
            .unwrap_err();
        assert_eq!(err, ValidationError::MissingInstructions);

        let err = request(serde_json::json!({"title": "Toast", "instructions": ["Toast it."]}))
            .into_new_recipe()
            .unwrap_err();
        assert_eq!(err, ValidationError::MissingIngredients);
    }

    #[test]
    fn test_unknown_category_rejected() {
        let err = request(serde_json::json!({
            "title": "Toast",
            "ingredients": ["1 slice bread"],
            "instructions": ["Toast it."],
            "categories": ["Brunchtime"]
        }))
        .into_new_recipe()
        .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidCategory(_)));
    }

    #[test]
    fn test_update_keeps_absent_fields_absent() {
        let changes = UpdateRecipeRequest {
            difficulty: Some("hard".to_string()),
            ..Default::default()
        }
        .into_changes()
        .unwrap();

        assert_eq!(changes.difficulty.as_deref(), Some("HARD"));
        assert!(changes.title.is_none());
        assert!(changes.ingredients.is_none());
        assert!(changes.categories.is_none());
    }

    #[test]
    fn test_update_rejects_emptied_lists() {
        let err = UpdateRecipeRequest {
            instructions: Some(vec!["  ".to_string()]),
            ..Default::default()
        }
        .into_changes()
        .unwrap_err();
        assert_eq!(err, ValidationError::MissingInstructions);
    }
}
