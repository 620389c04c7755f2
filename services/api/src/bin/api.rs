//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{
        DbAdapter, FakeRecipeAdapter, GeminiEndpoint, GeminiRecipeAdapter, InMemoryDb,
        OpenAiRecipeAdapter, RetryingGenerationService,
    },
    config::{AiProvider, Config},
    error::ApiError,
    web::{rest::ApiDoc, router, state::AppState},
};
use async_openai::{config::OpenAIConfig, Client};
use axum::http::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    HeaderValue, Method,
};
use axum::Router;
use recipe_core::ports::{DatabaseService, RecipeGenerationService};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

const MEMORY_DATABASE_URL: &str = "memory://";

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Database & Run Migrations ---
    let db = connect_database(&config).await?;

    // --- 3. Initialize the Recipe Generation Adapter ---
    let generation = generation_service(&config)?;

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState::new(db, generation, config.clone()));

    // --- 5. Create the Web Router ---
    let origin = config
        .cors_origin
        .parse::<HeaderValue>()
        .map_err(|_| ApiError::InvalidCorsOrigin(config.cors_origin.clone()))?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(router(app_state))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors);

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn connect_database(config: &Config) -> Result<Arc<dyn DatabaseService>, ApiError> {
    if config.database_url == MEMORY_DATABASE_URL {
        warn!("Using the in-memory database; nothing will survive a restart.");
        return Ok(Arc::new(InMemoryDb::new()));
    }

    info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    let db_adapter = DbAdapter::new(db_pool);
    info!("Running database migrations...");
    db_adapter.run_migrations().await?;
    info!("Database migrations complete.");

    Ok(Arc::new(db_adapter))
}

fn generation_service(config: &Config) -> Result<Arc<dyn RecipeGenerationService>, ApiError> {
    let inner: Arc<dyn RecipeGenerationService> = match config.ai_provider {
        AiProvider::Gemini => {
            let endpoint = match (
                &config.google_cloud_project,
                &config.google_access_token,
                &config.gemini_api_key,
            ) {
                (Some(project), Some(access_token), _) => GeminiEndpoint::Vertex {
                    project: project.clone(),
                    location: config.google_cloud_location.clone(),
                    access_token: access_token.clone(),
                },
                (_, _, Some(api_key)) => GeminiEndpoint::ApiKey {
                    api_key: api_key.clone(),
                },
                _ => {
                    return Err(ApiError::MissingCredential {
                        credential: "GEMINI_API_KEY (or GOOGLE_CLOUD_PROJECT with GOOGLE_ACCESS_TOKEN)",
                        provider: "gemini",
                    })
                }
            };
            info!(model = %config.google_ai_model, "Generating recipes with Gemini");
            Arc::new(GeminiRecipeAdapter::new(
                endpoint,
                config.google_ai_model.clone(),
                config.ai_timeout,
            )?)
        }
        AiProvider::OpenAi => {
            let openai_config = OpenAIConfig::new().with_api_key(
                config
                    .openai_api_key
                    .as_ref()
                    .ok_or(ApiError::MissingCredential {
                        credential: "OPENAI_API_KEY",
                        provider: "openai",
                    })?,
            );
            info!(model = %config.openai_model, "Generating recipes with OpenAI");
            Arc::new(OpenAiRecipeAdapter::new(
                Client::with_config(openai_config),
                config.openai_model.clone(),
            ))
        }
        AiProvider::Fake => {
            warn!("Using the fake recipe generator; every prompt gets the same recipe.");
            Arc::new(FakeRecipeAdapter::default())
        }
    };

    Ok(Arc::new(RetryingGenerationService::new(
        inner,
        config.ai_timeout,
        config.ai_max_attempts,
    )))
}
