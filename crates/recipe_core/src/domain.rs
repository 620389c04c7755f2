//! crates/recipe_core/src/domain.rs
//!
//! Defines the core data structures for the application.
//! These structs are independent of any database; only the types that cross
//! the generation boundary carry serde derives.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

// Represents a user - used throughout app
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
}

// Only used internally for login/signup - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    pub hashed_password: String,
}

/// The difficulty a caller may ask the generator for. Parsed ignoring case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard]
            .into_iter()
            .find(|d| d.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown difficulty '{}'", s))
    }
}

impl<'de> Deserialize<'de> for Difficulty {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        label.parse().map_err(serde::de::Error::custom)
    }
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

/// What the user asked the generator for. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipePrompt {
    #[serde(default)]
    pub ingredients: Option<Vec<String>>,
    #[serde(default)]
    pub dietary: Option<Vec<String>>,
    #[serde(default)]
    pub cuisine: Option<String>,
    #[serde(default)]
    pub meal_type: Option<String>,
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
}

impl RecipePrompt {
    /// Ingredient names, ignoring blank entries.
    pub fn ingredient_names(&self) -> Vec<&str> {
        non_blank_items(self.ingredients.as_deref())
    }

    /// Dietary restrictions, ignoring blank entries.
    pub fn dietary_restrictions(&self) -> Vec<&str> {
        non_blank_items(self.dietary.as_deref())
    }

    pub fn cuisine(&self) -> Option<&str> {
        non_blank(self.cuisine.as_deref())
    }

    pub fn meal_type(&self) -> Option<&str> {
        non_blank(self.meal_type.as_deref())
    }

    /// True when no field carries a usable value.
    pub fn is_empty(&self) -> bool {
        self.ingredient_names().is_empty()
            && self.dietary_restrictions().is_empty()
            && self.cuisine().is_none()
            && self.meal_type().is_none()
            && self.difficulty.is_none()
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn non_blank_items(values: Option<&[String]>) -> Vec<&str> {
    values
        .unwrap_or_default()
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .collect()
}

/// An ingredient broken into its parts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedIngredient {
    pub name: String,
    pub amount: String,
    pub unit: String,
}

/// An ingredient as it arrives from the model or a client: either a free-text
/// line or an already structured entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IngredientEntry {
    Line(String),
    Structured {
        name: String,
        #[serde(default)]
        amount: Option<String>,
        #[serde(default)]
        unit: Option<String>,
    },
}

/// Servings may come back as a number or as a numeric string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Servings {
    Count(u32),
    Text(String),
}

impl Servings {
    /// The servings as a string, `None` when it carries no usable value.
    pub fn to_text(&self) -> Option<String> {
        match self {
            Servings::Count(0) => None,
            Servings::Count(n) => Some(n.to_string()),
            Servings::Text(s) => non_blank(Some(s)).map(str::to_string),
        }
    }
}

/// The recipe shape the generator is asked to reply with.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedRecipe {
    pub title: String,
    #[serde(default)]
    pub ingredients: Vec<IngredientEntry>,
    #[serde(default)]
    pub instructions: Vec<String>,
    #[serde(default)]
    pub prep_time: Option<String>,
    #[serde(default)]
    pub cook_time: Option<String>,
    #[serde(default)]
    pub servings: Option<Servings>,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

/// A generated recipe, normalized and ready for the user to review.
#[derive(Debug, Clone, PartialEq)]
pub struct RecipePreview {
    pub title: String,
    pub ingredients: Vec<ParsedIngredient>,
    pub instructions: Vec<String>,
    pub prep_time: String,
    pub cook_time: String,
    pub servings: String,
    pub difficulty: String,
    pub tags: Vec<String>,
    pub is_preview: bool,
}

/// A validated recipe about to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRecipe {
    pub title: String,
    pub instructions: Vec<String>,
    pub ingredients: Vec<ParsedIngredient>,
    pub tags: Vec<String>,
    pub categories: Vec<String>,
    pub prep_time: String,
    pub cook_time: String,
    pub servings: String,
    pub difficulty: String,
}

/// A partial update; `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecipeChanges {
    pub title: Option<String>,
    pub instructions: Option<Vec<String>>,
    pub ingredients: Option<Vec<ParsedIngredient>>,
    pub tags: Option<Vec<String>>,
    pub categories: Option<Vec<String>>,
    pub prep_time: Option<String>,
    pub cook_time: Option<String>,
    pub servings: Option<String>,
    pub difficulty: Option<String>,
}

/// A persisted recipe with its related lookup rows resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct Recipe {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub instructions: Vec<String>,
    pub ingredients: Vec<ParsedIngredient>,
    pub tags: Vec<String>,
    pub categories: Vec<String>,
    pub prep_time: String,
    pub cook_time: String,
    pub servings: String,
    pub difficulty: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_is_an_empty_prompt() {
        let prompt: RecipePrompt = serde_json::from_str("{}").unwrap();
        assert!(prompt.is_empty());
    }

    #[test]
    fn blank_fields_do_not_count() {
        let prompt: RecipePrompt =
            serde_json::from_str(r#"{"ingredients": ["  "], "cuisine": " "}"#).unwrap();
        assert!(prompt.is_empty());
    }

    #[test]
    fn difficulty_accepts_any_case() {
        let prompt: RecipePrompt =
            serde_json::from_str(r#"{"difficulty": "HARD", "mealType": "dinner"}"#).unwrap();
        assert_eq!(prompt.difficulty, Some(Difficulty::Hard));
        assert_eq!(prompt.meal_type(), Some("dinner"));
        assert!(!prompt.is_empty());

        let mixed: RecipePrompt = serde_json::from_str(r#"{"difficulty": "mEdium"}"#).unwrap();
        assert_eq!(mixed.difficulty, Some(Difficulty::Medium));
        assert!(serde_json::from_str::<RecipePrompt>(r#"{"difficulty": "extreme"}"#).is_err());
    }

    #[test]
    fn servings_from_number_or_string() {
        let n: Servings = serde_json::from_str("4").unwrap();
        let s: Servings = serde_json::from_str(r#""6""#).unwrap();
        assert_eq!(n.to_text().as_deref(), Some("4"));
        assert_eq!(s.to_text().as_deref(), Some("6"));
        assert_eq!(Servings::Count(0).to_text(), None);
    }

    #[test]
    fn ingredient_entries_accept_lines_and_objects() {
        let entries: Vec<IngredientEntry> =
            serde_json::from_str(r#"["2 cups flour", {"name": "salt"}]"#).unwrap();
        assert_eq!(entries[0], IngredientEntry::Line("2 cups flour".to_string()));
        assert_eq!(
            entries[1],
            IngredientEntry::Structured {
                name: "salt".to_string(),
                amount: None,
                unit: None
            }
        );
    }
}
