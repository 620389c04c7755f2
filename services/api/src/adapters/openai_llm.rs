//! services/api/src/adapters/openai_llm.rs
//!
//! This module contains the adapter for generating recipes with an
//! OpenAI-compatible chat model. It implements the `RecipeGenerationService`
//! port from the `core` crate.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs, ResponseFormat,
    },
    Client,
};
use async_trait::async_trait;
use recipe_core::generation::SAMPLING;
use recipe_core::ports::{PortError, PortResult, RecipeGenerationService};

const SYSTEM_INSTRUCTIONS: &str = "You are a recipe writer. Reply with a single JSON object describing one recipe and nothing else.";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `RecipeGenerationService` using an OpenAI-compatible LLM.
///
/// The chat API has no top-k setting, so only temperature and top-p are sent.
#[derive(Clone)]
pub struct OpenAiRecipeAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiRecipeAdapter {
    /// Creates a new `OpenAiRecipeAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }
}

//=========================================================================================
// `RecipeGenerationService` Trait Implementation
//=========================================================================================

#[async_trait]
impl RecipeGenerationService for OpenAiRecipeAdapter {
    async fn generate(&self, prompt_text: &str) -> PortResult<String> {
        let messages = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(SYSTEM_INSTRUCTIONS)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(prompt_text)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .n(1)
            .temperature(SAMPLING.temperature)
            .top_p(SAMPLING.top_p)
            .response_format(ResponseFormat::JsonObject)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        // Call the API and manually map the error if it occurs, which respects the orphan rule.
        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::Unexpected(e.to_string()))?;

        // Extract the text content from the first choice in the response.
        if let Some(choice) = response.choices.into_iter().next() {
            if let Some(content) = choice.message.content {
                Ok(content)
            } else {
                Err(PortError::Unexpected(
                    "Recipe LLM response contained no text content.".to_string(),
                ))
            }
        } else {
            Err(PortError::Unexpected(
                "Recipe LLM returned no choices in its response.".to_string(),
            ))
        }
    }
}
