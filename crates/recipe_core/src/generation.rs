//! crates/recipe_core/src/generation.rs
//!
//! Turns a `RecipePrompt` into a reviewed-before-save `RecipePreview`:
//! build the prompt text, call the generation port, parse its JSON reply and
//! normalize the result. Nothing here touches storage.

use std::sync::Arc;

use tracing::debug;

use crate::domain::{GeneratedRecipe, RecipePreview, RecipePrompt};
use crate::ingredients::normalize_entry;
use crate::ports::{PortError, RecipeGenerationService};

/// Sampling settings every adapter sends with a generation request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingParams {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
}

pub const SAMPLING: SamplingParams = SamplingParams {
    temperature: 0.7,
    top_p: 0.8,
    top_k: 40,
};

pub const DEFAULT_TIME: &str = "0";
pub const DEFAULT_SERVINGS: &str = "1";
pub const DEFAULT_DIFFICULTY: &str = "EASY";

const RESPONSE_FORMAT: &str = r#"Please provide the recipe in the following JSON format:
{
  "title": "Recipe Title",
  "ingredients": ["ingredient 1", "ingredient 2"],
  "instructions": ["step 1", "step 2"],
  "prepTime": "30 minutes",
  "cookTime": "45 minutes",
  "servings": 4,
  "difficulty": "medium",
  "tags": ["tag1", "tag2"]
}
Write every ingredient as "<amount> <unit> <name>" where possible.
Respond with the JSON object only."#;

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("Recipe prompt is required")]
    EmptyPrompt,
    #[error("Generation service failed: {0}")]
    Upstream(#[from] PortError),
    #[error("Generation service returned no text")]
    EmptyResponse,
    #[error("Generated recipe could not be used: {0}")]
    MalformedResponse(String),
}

/// Builds the instruction text, mentioning only the fields the user filled in.
pub fn build_prompt(prompt: &RecipePrompt) -> String {
    let mut lines = vec!["Generate a recipe with the following requirements:".to_string()];

    let ingredients = prompt.ingredient_names();
    if !ingredients.is_empty() {
        lines.push(format!("Must use these ingredients: {}", ingredients.join(", ")));
    }
    let dietary = prompt.dietary_restrictions();
    if !dietary.is_empty() {
        lines.push(format!("Dietary restrictions: {}", dietary.join(", ")));
    }
    if let Some(cuisine) = prompt.cuisine() {
        lines.push(format!("Cuisine type: {}", cuisine));
    }
    if let Some(meal_type) = prompt.meal_type() {
        lines.push(format!("Meal type: {}", meal_type));
    }
    if let Some(difficulty) = prompt.difficulty {
        lines.push(format!("Difficulty level: {}", difficulty.as_str()));
    }

    lines.push(String::new());
    lines.push(RESPONSE_FORMAT.to_string());
    lines.join("\n")
}

/// Models like to wrap JSON in a Markdown fence; peel one off if present.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // drop the language tag line
    let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Parses the model's reply. Anything short of a usable recipe is an error.
pub fn parse_generated_recipe(text: &str) -> Result<GeneratedRecipe, GenerationError> {
    let json = strip_code_fence(text);
    if json.is_empty() {
        return Err(GenerationError::EmptyResponse);
    }

    let recipe: GeneratedRecipe = serde_json::from_str(json)
        .map_err(|e| GenerationError::MalformedResponse(e.to_string()))?;

    if recipe.title.trim().is_empty() {
        return Err(GenerationError::MalformedResponse("title is empty".to_string()));
    }
    if recipe
        .ingredients
        .iter()
        .map(normalize_entry)
        .all(|i| i.name.trim().is_empty())
    {
        return Err(GenerationError::MalformedResponse("no ingredients".to_string()));
    }
    if recipe.instructions.iter().all(|s| s.trim().is_empty()) {
        return Err(GenerationError::MalformedResponse("no instructions".to_string()));
    }
    Ok(recipe)
}

/// Uppercases a difficulty label, falling back to the default when blank.
pub fn normalize_difficulty(difficulty: Option<&str>) -> String {
    difficulty
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_uppercase)
        .unwrap_or_else(|| DEFAULT_DIFFICULTY.to_string())
}

pub fn text_or(value: Option<&str>, default: &str) -> String {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(default)
        .to_string()
}

pub fn clean_lines(lines: &[String]) -> Vec<String> {
    lines
        .iter()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

/// Shapes a parsed reply into a preview.
pub fn normalize(recipe: GeneratedRecipe) -> RecipePreview {
    RecipePreview {
        title: recipe.title.trim().to_string(),
        ingredients: recipe
            .ingredients
            .iter()
            .map(normalize_entry)
            .filter(|i| !i.name.trim().is_empty())
            .collect(),
        instructions: clean_lines(&recipe.instructions),
        prep_time: text_or(recipe.prep_time.as_deref(), DEFAULT_TIME),
        cook_time: text_or(recipe.cook_time.as_deref(), DEFAULT_TIME),
        servings: recipe
            .servings
            .as_ref()
            .and_then(|s| s.to_text())
            .unwrap_or_else(|| DEFAULT_SERVINGS.to_string()),
        difficulty: normalize_difficulty(recipe.difficulty.as_deref()),
        tags: clean_lines(recipe.tags.as_deref().unwrap_or_default()),
        is_preview: true,
    }
}

/// Runs the whole prompt-to-preview pipeline against an injected generation service.
#[derive(Clone)]
pub struct RecipeGenerator {
    service: Arc<dyn RecipeGenerationService>,
}

impl RecipeGenerator {
    pub fn new(service: Arc<dyn RecipeGenerationService>) -> Self {
        Self { service }
    }

    pub async fn generate(&self, prompt: &RecipePrompt) -> Result<RecipePreview, GenerationError> {
        if prompt.is_empty() {
            return Err(GenerationError::EmptyPrompt);
        }

        let prompt_text = build_prompt(prompt);
        debug!(prompt_len = prompt_text.len(), "Requesting recipe generation");

        let reply = self.service.generate(&prompt_text).await?;
        let generated = parse_generated_recipe(&reply)?;
        Ok(normalize(generated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Difficulty, ParsedIngredient};
    use crate::ports::PortResult;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const CHICKEN_REPLY: &str = r#"{
        "title": "Garlic Chicken",
        "ingredients": ["2 lbs chicken", "salt to taste"],
        "instructions": ["Season", "Roast"],
        "prepTime": "10 minutes",
        "cookTime": "",
        "servings": 4,
        "difficulty": "medium",
        "tags": ["easy", " "]
    }"#;

    struct Scripted {
        reply: PortResult<String>,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn ok(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(reply.to_string()),
                calls: AtomicUsize::new(0),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                reply: Err(PortError::Unexpected("network down".to_string())),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl RecipeGenerationService for Scripted {
        async fn generate(&self, _prompt_text: &str) -> PortResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(e) => Err(PortError::Unexpected(e.to_string())),
            }
        }
    }

    fn chicken_prompt() -> RecipePrompt {
        RecipePrompt {
            ingredients: Some(vec!["chicken".to_string()]),
            ..Default::default()
        }
    }

    #[test]
    fn test_prompt_mentions_only_present_fields() {
        let text = build_prompt(&chicken_prompt());
        assert!(text.contains("Must use these ingredients: chicken"));
        assert!(!text.contains("Dietary restrictions"));
        assert!(!text.contains("Cuisine type"));
        assert!(!text.contains("undefined"));
        assert!(!text.contains("None"));
    }

    #[test]
    fn test_prompt_with_every_field() {
        let prompt = RecipePrompt {
            ingredients: Some(vec!["chicken".to_string(), "rice".to_string()]),
            dietary: Some(vec!["gluten-free".to_string()]),
            cuisine: Some("Asian".to_string()),
            meal_type: Some("dinner".to_string()),
            difficulty: Some(Difficulty::Medium),
        };
        let text = build_prompt(&prompt);
        assert!(text.contains("Must use these ingredients: chicken, rice"));
        assert!(text.contains("Dietary restrictions: gluten-free"));
        assert!(text.contains("Cuisine type: Asian"));
        assert!(text.contains("Meal type: dinner"));
        assert!(text.contains("Difficulty level: medium"));
    }

    #[test]
    fn test_fenced_reply_is_parsed() {
        let fenced = format!("```json\n{}\n```", CHICKEN_REPLY);
        let recipe = parse_generated_recipe(&fenced).unwrap();
        assert_eq!(recipe.title, "Garlic Chicken");
    }

    #[test]
    fn test_bad_replies_are_errors() {
        assert!(matches!(
            parse_generated_recipe("   "),
            Err(GenerationError::EmptyResponse)
        ));
        assert!(matches!(
            parse_generated_recipe("Sure! Here is a recipe"),
            Err(GenerationError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_generated_recipe(r#"{"title": "", "ingredients": ["x"], "instructions": ["y"]}"#),
            Err(GenerationError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_generated_recipe(r#"{"title": "Toast", "ingredients": [], "instructions": ["y"]}"#),
            Err(GenerationError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_blank_ingredients_are_no_ingredients() {
        assert!(matches!(
            parse_generated_recipe(
                r#"{"title": "Ghost", "ingredients": ["  ", ""], "instructions": ["Stir"]}"#
            ),
            Err(GenerationError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_generated_recipe(
                r#"{"title": "Ghost", "ingredients": [{"name": " "}], "instructions": ["Stir"]}"#
            ),
            Err(GenerationError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_null_tags_are_no_tags() {
        let recipe = parse_generated_recipe(
            r#"{"title": "Toast", "ingredients": ["1 slice bread"], "instructions": ["Toast it"], "tags": null}"#,
        )
        .unwrap();
        assert!(normalize(recipe).tags.is_empty());
    }

    #[test]
    fn test_normalize_fills_defaults() {
        let recipe = parse_generated_recipe(CHICKEN_REPLY).unwrap();
        let preview = normalize(recipe);

        assert_eq!(
            preview.ingredients,
            vec![
                ParsedIngredient {
                    name: "chicken".to_string(),
                    amount: "2".to_string(),
                    unit: "lbs".to_string()
                },
                ParsedIngredient {
                    name: "salt to taste".to_string(),
                    amount: "1".to_string(),
                    unit: "unit".to_string()
                },
            ]
        );
        assert_eq!(preview.difficulty, "MEDIUM");
        assert_eq!(preview.prep_time, "10 minutes");
        assert_eq!(preview.cook_time, "0");
        assert_eq!(preview.servings, "4");
        assert_eq!(preview.tags, vec!["easy".to_string()]);
        assert!(preview.is_preview);
    }

    #[test]
    fn test_missing_difficulty_and_servings() {
        let recipe = parse_generated_recipe(
            r#"{"title": "Toast", "ingredients": ["1 slice bread"], "instructions": ["Toast it"]}"#,
        )
        .unwrap();
        let preview = normalize(recipe);
        assert_eq!(preview.difficulty, "EASY");
        assert_eq!(preview.servings, "1");
        assert_eq!(preview.prep_time, "0");
    }

    #[tokio::test]
    async fn test_generator_produces_preview() {
        let service = Scripted::ok(CHICKEN_REPLY);
        let generator = RecipeGenerator::new(service.clone());

        let preview = generator.generate(&chicken_prompt()).await.unwrap();
        assert!(!preview.title.is_empty());
        assert!(!preview.ingredients.is_empty());
        assert!(!preview.instructions.is_empty());
        assert_eq!(service.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_prompt_skips_service() {
        let service = Scripted::ok(CHICKEN_REPLY);
        let generator = RecipeGenerator::new(service.clone());

        let result = generator.generate(&RecipePrompt::default()).await;
        assert!(matches!(result, Err(GenerationError::EmptyPrompt)));
        assert_eq!(service.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_service_failure_surfaces_as_upstream() {
        let generator = RecipeGenerator::new(Scripted::failing());
        let result = generator.generate(&chicken_prompt()).await;
        assert!(matches!(result, Err(GenerationError::Upstream(_))));
    }
}
