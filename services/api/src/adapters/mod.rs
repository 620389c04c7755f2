pub mod db;
pub mod fake_llm;
pub mod gemini_llm;
pub mod memory;
pub mod openai_llm;
pub mod retry;

pub use db::DbAdapter;
pub use fake_llm::FakeRecipeAdapter;
pub use gemini_llm::{GeminiEndpoint, GeminiRecipeAdapter};
pub use memory::InMemoryDb;
pub use openai_llm::OpenAiRecipeAdapter;
pub use retry::RetryingGenerationService;
