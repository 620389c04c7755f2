//! services/api/src/adapters/fake_llm.rs
//!
//! A scripted `RecipeGenerationService` for local development and tests.
//! It never touches the network and records every prompt it receives.

use std::sync::Mutex;

use async_trait::async_trait;
use recipe_core::ports::{PortError, PortResult, RecipeGenerationService};

/// A recipe reply shaped the way real models answer.
pub const SAMPLE_RECIPE_REPLY: &str = r#"{
  "title": "Weeknight Garlic Chicken",
  "ingredients": ["2 lbs chicken thighs", "4 cloves garlic", "salt to taste"],
  "instructions": ["Season the chicken.", "Sear skin side down.", "Add garlic and roast until done."],
  "prepTime": "10 minutes",
  "cookTime": "35 minutes",
  "servings": 4,
  "difficulty": "easy",
  "tags": ["chicken", "weeknight"]
}"#;

#[derive(Debug)]
enum Script {
    Reply(String),
    Fail(String),
}

#[derive(Debug)]
pub struct FakeRecipeAdapter {
    script: Script,
    prompts: Mutex<Vec<String>>,
}

impl Default for FakeRecipeAdapter {
    fn default() -> Self {
        Self::with_reply(SAMPLE_RECIPE_REPLY)
    }
}

impl FakeRecipeAdapter {
    /// Answers every prompt with `reply`.
    pub fn with_reply(reply: &str) -> Self {
        Self {
            script: Script::Reply(reply.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Fails every call, as an unreachable provider would.
    pub fn failing(message: &str) -> Self {
        Self {
            script: Script::Fail(message.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// How many times `generate` has been called.
    pub fn calls(&self) -> usize {
        self.prompts.lock().map(|p| p.len()).unwrap_or(0)
    }

    /// The most recent prompt text, if any.
    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().ok().and_then(|p| p.last().cloned())
    }
}

#[async_trait]
impl RecipeGenerationService for FakeRecipeAdapter {
    async fn generate(&self, prompt_text: &str) -> PortResult<String> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt_text.to_string());
        }

        match &self.script {
            Script::Reply(reply) => Ok(reply.clone()),
            Script::Fail(message) => Err(PortError::Unexpected(message.clone())),
        }
    }
}
