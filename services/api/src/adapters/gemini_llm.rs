//! services/api/src/adapters/gemini_llm.rs
//!
//! Recipe generation backed by Google's Gemini models, reachable either through
//! the public Generative Language API (API key) or a Vertex AI project
//! (OAuth access token). Both speak the same `generateContent` JSON.

use std::time::Duration;

use async_trait::async_trait;
use recipe_core::generation::SAMPLING;
use recipe_core::ports::{PortError, PortResult, RecipeGenerationService};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Where requests are sent and how they authenticate.
#[derive(Clone, Debug)]
pub enum GeminiEndpoint {
    ApiKey {
        api_key: String,
    },
    Vertex {
        project: String,
        location: String,
        access_token: String,
    },
}

impl GeminiEndpoint {
    fn url(&self, model: &str) -> String {
        match self {
            GeminiEndpoint::ApiKey { .. } => format!(
                "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent",
                model
            ),
            GeminiEndpoint::Vertex {
                project, location, ..
            } => format!(
                "https://{location}-aiplatform.googleapis.com/v1/projects/{project}/locations/{location}/publishers/google/models/{model}:generateContent"
            ),
        }
    }
}

//=========================================================================================
// Wire Types
//=========================================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
    top_k: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

fn build_request(prompt_text: &str) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![Content {
            role: Some("user".to_string()),
            parts: vec![Part {
                text: Some(prompt_text.to_string()),
            }],
        }],
        generation_config: GenerationConfig {
            temperature: SAMPLING.temperature,
            top_p: SAMPLING.top_p,
            top_k: SAMPLING.top_k,
        },
    }
}

/// The text of the first part of the first candidate.
fn first_candidate_text(response: GenerateContentResponse) -> Option<String> {
    response
        .candidates
        .into_iter()
        .next()?
        .content?
        .parts
        .into_iter()
        .next()?
        .text
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `RecipeGenerationService` using a Gemini model.
#[derive(Clone)]
pub struct GeminiRecipeAdapter {
    client: reqwest::Client,
    endpoint: GeminiEndpoint,
    model: String,
}

impl GeminiRecipeAdapter {
    /// Creates a new `GeminiRecipeAdapter` whose requests give up after `timeout`.
    pub fn new(endpoint: GeminiEndpoint, model: String, timeout: Duration) -> PortResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(Self {
            client,
            endpoint,
            model,
        })
    }
}

#[async_trait]
impl RecipeGenerationService for GeminiRecipeAdapter {
    async fn generate(&self, prompt_text: &str) -> PortResult<String> {
        let request = self
            .client
            .post(self.endpoint.url(&self.model))
            .json(&build_request(prompt_text));

        let request = match &self.endpoint {
            GeminiEndpoint::ApiKey { api_key } => request.header("x-goog-api-key", api_key),
            GeminiEndpoint::Vertex { access_token, .. } => request.bearer_auth(access_token),
        };

        debug!(model = %self.model, "Calling Gemini generateContent");
        let response = request
            .send()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PortError::Unexpected(format!(
                "Gemini returned {}: {}",
                status, body
            )));
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        first_candidate_text(body).ok_or_else(|| {
            PortError::Unexpected("Gemini response contained no candidate text.".to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_carries_fixed_sampling() {
        let json = serde_json::to_value(build_request("make soup")).unwrap();
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["contents"][0]["parts"][0]["text"], "make soup");
        assert_eq!(json["generationConfig"]["topK"], 40);
        assert!((json["generationConfig"]["topP"].as_f64().unwrap() - 0.8).abs() < 1e-6);
        assert!((json["generationConfig"]["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_first_candidate_text() {
        let response: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates": [{"content": {"role": "model", "parts": [{"text": "{}"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(first_candidate_text(response).as_deref(), Some("{}"));

        let empty: GenerateContentResponse = serde_json::from_str(r#"{"candidates": []}"#).unwrap();
        assert_eq!(first_candidate_text(empty), None);

        let blocked: GenerateContentResponse =
            serde_json::from_str(r#"{"candidates": [{"finishReason": "SAFETY"}]}"#).unwrap();
        assert_eq!(first_candidate_text(blocked), None);
    }

    #[test]
    fn test_vertex_url() {
        let endpoint = GeminiEndpoint::Vertex {
            project: "kitchen".to_string(),
            location: "us-west1".to_string(),
            access_token: "t".to_string(),
        };
        assert_eq!(
            endpoint.url("gemini-1.5-pro"),
            "https://us-west1-aiplatform.googleapis.com/v1/projects/kitchen/locations/us-west1/publishers/google/models/gemini-1.5-pro:generateContent"
        );
    }
}
